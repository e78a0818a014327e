//! Code for reading technologies and technology templates.
use super::{
    InterpolationRuleInput, YearValue, dense_series, dense_series_or, dense_to_input,
    interpolation_rules, read_toml, sparse_series, sparse_to_input,
};
use crate::id::{SubsectorID, TechnologyID};
use crate::period::Horizon;
use crate::technology::{TechnologyConfig, TechnologyParameters, TechnologyTemplate};
use crate::technology_database::GlobalTechnologyDatabase;
use crate::units::{Energy, MoneyPerEnergy};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

const TECHNOLOGY_TEMPLATES_FILE_NAME: &str = "technologies.toml";

/// The contents of the technology templates file
#[derive(Debug, Default, Deserialize)]
struct TechnologyTemplatesFile {
    #[serde(default)]
    templates: Vec<TechnologyTemplate>,
}

/// Read technology templates from the model directory.
///
/// The file is optional: if it is absent, the database is empty.
pub fn read_technology_templates(model_dir: &Path) -> Result<GlobalTechnologyDatabase> {
    let file_path = model_dir.join(TECHNOLOGY_TEMPLATES_FILE_NAME);
    let file: TechnologyTemplatesFile = if file_path.is_file() {
        read_toml(&file_path)?
    } else {
        debug!("No technology templates file found");
        TechnologyTemplatesFile::default()
    };

    GlobalTechnologyDatabase::new(file.templates)
        .with_context(|| super::input_err_msg(&file_path))
}

/// A technology as given in input files
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TechnologyInput {
    /// The technology's name
    pub name: TechnologyID,
    /// Template to take missing parameters from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TechnologyID>,
    /// Parameters which override the template's
    #[serde(flatten)]
    pub parameters: TechnologyParameters,
    /// Levelised cost of output
    pub cost: Vec<YearValue>,
    /// Price of the fuel consumed
    #[serde(default)]
    pub fuel_price: Vec<YearValue>,
    /// Share weights
    #[serde(default)]
    pub share_weights: Vec<YearValue>,
    /// Share-weight interpolation rules
    #[serde(default)]
    pub interpolation_rules: Vec<InterpolationRuleInput>,
    /// Exogenously fixed output
    #[serde(default)]
    pub fixed_output: Vec<YearValue>,
    /// Observed output to calibrate to
    #[serde(default)]
    pub calibration_output: Vec<YearValue>,
    /// First model year in which the technology can be built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_from: Option<u32>,
    /// Last model year in which the technology can be built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_to: Option<u32>,
}

impl TechnologyInput {
    /// Convert into a [`TechnologyConfig`], checking years against the horizon
    pub fn into_config(
        self,
        subsector: &SubsectorID,
        horizon: &Horizon,
    ) -> Result<TechnologyConfig> {
        let what = format!("technology {} in subsector {subsector}", self.name);
        let first = match self.available_from {
            Some(year) => horizon
                .period_of(year)
                .with_context(|| format!("Invalid availability for {what}"))?,
            None => 0,
        };
        let last = match self.available_to {
            Some(year) => horizon
                .period_of(year)
                .with_context(|| format!("Invalid availability for {what}"))?,
            None => horizon.len() - 1,
        };

        Ok(TechnologyConfig {
            template: self.template,
            parameters: self.parameters,
            cost: dense_series(&format!("cost of {what}"), &self.cost, horizon)?
                .iter()
                .map(|&cost| MoneyPerEnergy(cost))
                .collect::<Vec<_>>()
                .into(),
            fuel_price: dense_series_or(
                &format!("fuel price of {what}"),
                &self.fuel_price,
                horizon,
                0.0,
            )?
            .iter()
            .map(|&price| MoneyPerEnergy(price))
            .collect::<Vec<_>>()
            .into(),
            share_weights: sparse_series(
                &format!("share weights of {what}"),
                &self.share_weights,
                horizon,
            )?,
            interpolation_rules: interpolation_rules(&what, self.interpolation_rules, horizon)?,
            fixed_output: sparse_series(
                &format!("fixed output of {what}"),
                &self.fixed_output,
                horizon,
            )?
            .iter()
            .map(|output| output.map(Energy))
            .collect::<Vec<_>>()
            .into(),
            calibration_output: sparse_series(
                &format!("calibration output of {what}"),
                &self.calibration_output,
                horizon,
            )?
            .iter()
            .map(|output| output.map(Energy))
            .collect::<Vec<_>>()
            .into(),
            available: first..=last,
            id: self.name,
        })
    }

    /// Write a [`TechnologyConfig`] back out in input form
    pub fn from_config(config: &TechnologyConfig, horizon: &Horizon) -> Self {
        let year = |period| horizon.years()[period];
        let first = *config.available.start();
        let last = *config.available.end();

        Self {
            name: config.id.clone(),
            template: config.template.clone(),
            parameters: config.parameters.clone(),
            cost: dense_to_input(config.cost.iter().map(|cost| cost.value()), horizon),
            fuel_price: dense_to_input(
                config.fuel_price.iter().map(|price| price.value()),
                horizon,
            ),
            share_weights: sparse_to_input(config.share_weights.iter().copied(), horizon),
            interpolation_rules: config
                .interpolation_rules
                .iter()
                .map(|rule| InterpolationRuleInput::from_rule(rule, horizon))
                .collect(),
            fixed_output: sparse_to_input(
                config.fixed_output.iter().map(|output| output.map(Energy::value)),
                horizon,
            ),
            calibration_output: sparse_to_input(
                config
                    .calibration_output
                    .iter()
                    .map(|output| output.map(Energy::value)),
                horizon,
            ),
            available_from: (first > 0).then(|| year(first)),
            available_to: (last + 1 < horizon.len()).then(|| year(last)),
        }
    }
}
