//! The model: one region, its economy and the sector being simulated.
use crate::dependency::DependencyFinder;
use crate::economy::{AccountType, Gdp, NationalAccount};
use crate::id::RegionID;
use crate::period::Horizon;
use crate::sector::Sector;
use crate::technology_database::GlobalTechnologyDatabase;
use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::ModelParameters;

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// The model periods
    pub horizon: Horizon,
    /// GDP for the modelled region
    pub gdp: Gdp,
    /// National accounts for the modelled region
    pub national_account: NationalAccount,
    /// The sector being simulated
    pub sector: Sector,
    ordering: Vec<String>,
}

impl Model {
    /// Assemble a model from its parts
    pub fn new(
        model_dir: &Path,
        parameters: ModelParameters,
        horizon: Horizon,
        sector: Sector,
    ) -> Result<Self> {
        let gdp = parameters
            .gdp(&horizon)
            .with_context(|| format!("Invalid economy for region {}", parameters.region))?;
        let mut national_account = NationalAccount::new();
        national_account.set(
            AccountType::CorporateIncomeTaxRate,
            parameters.corporate_income_tax_rate,
        );

        Ok(Self {
            model_path: model_dir.to_path_buf(),
            parameters,
            horizon,
            gdp,
            national_account,
            sector,
            ordering: Vec::new(),
        })
    }

    /// Resolve technology templates and work out the order in which sectors must be calculated
    pub fn complete_init(&mut self, database: &GlobalTechnologyDatabase) -> Result<()> {
        let mut dependencies = DependencyFinder::new();
        self.sector.complete_init(database, &mut dependencies)?;
        self.ordering = dependencies.ordering()?;
        debug!("Sector ordering: {}", self.ordering.join(", "));

        Ok(())
    }

    /// The region being modelled
    pub fn region(&self) -> &RegionID {
        &self.parameters.region
    }

    /// Model years
    pub fn years(&self) -> &[u32] {
        self.horizon.years()
    }

    /// The order in which sectors must be calculated, dependencies first
    pub fn ordering(&self) -> &[String] {
        &self.ordering
    }
}
