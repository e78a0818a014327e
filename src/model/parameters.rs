//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::economy::{Demographic, Gdp};
use crate::id::RegionID;
use crate::input::{
    YearValue, dense_series, deserialise_proportion, input_err_msg, is_sorted_and_unique,
    read_toml,
};
use crate::investment::{
    Distributor, DistributorKind, OutputShareDistributor, ProfitRateLogitDistributor,
    ReturnOnCapitalCalculator,
};
use crate::period::Horizon;
use crate::units::Money;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_profit_rate_logit_exponent, f64, 1.0);

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Model years, one per period
    pub years: Vec<u32>,
    /// The region being modelled
    pub region: RegionID,
    /// Gross domestic product
    pub gdp: Vec<YearValue>,
    /// Population
    pub population: Vec<YearValue>,
    /// Tax rate applied to corporate profits
    #[serde(default)]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub corporate_income_tax_rate: f64,
    /// How new investment is split between alternatives
    #[serde(default)]
    pub distributor: DistributorKind,
    /// Sensitivity of investment shares to differences in expected profit rates
    #[serde(default = "default_profit_rate_logit_exponent")]
    pub profit_rate_logit_exponent: f64,
    /// Risk premium subtracted from profit rates when calculating shares
    #[serde(default)]
    pub share_risk_premium: f64,
    /// Risk premium subtracted from profit rates when placing investment
    #[serde(default)]
    pub distribution_risk_premium: f64,
}

/// Check that the `years` parameter is valid
fn check_years(years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "`years` is empty");

    ensure!(
        is_sorted_and_unique(years),
        "`years` must be composed of unique values in order"
    );

    Ok(())
}

/// Check that the `profit_rate_logit_exponent` parameter is valid
fn check_profit_rate_logit_exponent(value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "profit_rate_logit_exponent must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that a risk premium is valid
fn check_risk_premium(name: &str, value: f64) -> Result<()> {
    ensure!(value.is_finite(), "{name} must be a finite number");

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_years(&self.years)?;

        // corporate_income_tax_rate already validated with deserialise_proportion

        check_profit_rate_logit_exponent(self.profit_rate_logit_exponent)?;
        check_risk_premium("share_risk_premium", self.share_risk_premium)?;
        check_risk_premium("distribution_risk_premium", self.distribution_risk_premium)?;

        Ok(())
    }

    /// GDP for each period, derived from the GDP and population series
    pub fn gdp(&self, horizon: &Horizon) -> Result<Gdp> {
        let population = dense_series("population", &self.population, horizon)?;
        let demographic = Demographic::new(population)?;
        let gdp = dense_series("GDP", &self.gdp, horizon)?
            .iter()
            .map(|&gdp| Money(gdp))
            .collect::<Vec<_>>();

        Gdp::new(gdp.into(), &demographic)
    }

    /// The configured investment distributor
    pub fn distributor(&self) -> Box<dyn Distributor> {
        match self.distributor {
            DistributorKind::ProfitRateLogit => Box::new(ProfitRateLogitDistributor {
                logit_exponent: self.profit_rate_logit_exponent,
            }),
            DistributorKind::OutputShare => Box::new(OutputShareDistributor),
        }
    }

    /// The configured expected profit rate calculator
    pub fn profit_rate_calculator(&self) -> ReturnOnCapitalCalculator {
        ReturnOnCapitalCalculator {
            share_risk_premium: self.share_risk_premium,
            distribution_risk_premium: self.distribution_risk_premium,
        }
    }
}
