//! Code for reading subsectors.
use super::technology::TechnologyInput;
use super::{
    InterpolationRuleInput, YearValue, dense_series, dense_series_or, dense_to_input,
    interpolation_rules, sparse_series, sparse_to_input,
};
use crate::competition::LogitConvention;
use crate::id::{RegionID, SectorID, SubsectorID};
use crate::period::Horizon;
use crate::subsector::SubsectorConfig;
use crate::units::Money;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A subsector as given in input files
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubsectorInput {
    /// The subsector's name
    pub name: SubsectorID,
    /// Share weights
    #[serde(default)]
    pub share_weights: Vec<YearValue>,
    /// Share-weight interpolation rules
    #[serde(default)]
    pub interpolation_rules: Vec<InterpolationRuleInput>,
    /// Logit exponent for competition between technologies
    pub logit_exponent: Vec<YearValue>,
    /// How the logit exponent is written
    #[serde(default)]
    pub logit_convention: LogitConvention,
    /// Elasticity with respect to GDP per capita
    #[serde(default)]
    pub fuel_preference_elasticity: Vec<YearValue>,
    /// Exogenously fixed investment
    #[serde(default)]
    pub fixed_investment: Vec<YearValue>,
    /// Whether the subsector may have no technologies
    #[serde(default)]
    pub allow_empty: bool,
    /// The competing technologies
    #[serde(default)]
    pub technologies: Vec<TechnologyInput>,
}

impl SubsectorInput {
    /// Convert into a [`SubsectorConfig`], checking years against the horizon
    pub fn into_config(
        self,
        region: &RegionID,
        sector: &SectorID,
        horizon: &Horizon,
    ) -> Result<SubsectorConfig> {
        let id = self.name;
        let what = format!("subsector {id}");

        Ok(SubsectorConfig {
            region: region.clone(),
            sector: sector.clone(),
            share_weights: sparse_series(
                &format!("share weights of {what}"),
                &self.share_weights,
                horizon,
            )?,
            interpolation_rules: interpolation_rules(&what, self.interpolation_rules, horizon)?,
            logit_exponent: dense_series(
                &format!("logit exponent of {what}"),
                &self.logit_exponent,
                horizon,
            )?,
            logit_convention: self.logit_convention,
            fuel_preference_elasticity: dense_series_or(
                &format!("fuel preference elasticity of {what}"),
                &self.fuel_preference_elasticity,
                horizon,
                0.0,
            )?,
            fixed_investment: sparse_series(
                &format!("fixed investment of {what}"),
                &self.fixed_investment,
                horizon,
            )?
            .iter()
            .map(|investment| investment.map(Money))
            .collect::<Vec<_>>()
            .into(),
            allow_empty: self.allow_empty,
            technologies: self
                .technologies
                .into_iter()
                .map(|tech| tech.into_config(&id, horizon))
                .collect::<Result<_>>()?,
            id,
        })
    }

    /// Write a [`SubsectorConfig`] back out in input form
    pub fn from_config(config: &SubsectorConfig, horizon: &Horizon) -> Self {
        Self {
            name: config.id.clone(),
            share_weights: sparse_to_input(config.share_weights.iter().copied(), horizon),
            interpolation_rules: config
                .interpolation_rules
                .iter()
                .map(|rule| InterpolationRuleInput::from_rule(rule, horizon))
                .collect(),
            logit_exponent: dense_to_input(config.logit_exponent.iter().copied(), horizon),
            logit_convention: config.logit_convention,
            fuel_preference_elasticity: dense_to_input(
                config.fuel_preference_elasticity.iter().copied(),
                horizon,
            ),
            fixed_investment: sparse_to_input(
                config
                    .fixed_investment
                    .iter()
                    .map(|investment| investment.map(Money::value)),
                horizon,
            ),
            allow_empty: config.allow_empty,
            technologies: config
                .technologies
                .iter()
                .map(|tech| TechnologyInput::from_config(tech, horizon))
                .collect(),
        }
    }
}
