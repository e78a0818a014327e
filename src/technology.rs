//! Technologies are the competing alternatives within a subsector.
//!
//! Each [`Technology`] represents one vintage (cohort) of a technology in one period: the "same"
//! technology built in different years gives rise to different vintages. Vintages built in earlier
//! periods are carried forward as [`VintageStatus::Existing`] with a fixed output equal to the
//! capacity they established when they were first operated.
use crate::id::{FuelID, TechnologyID, define_id_getter};
use crate::interpolation::InterpolationRule;
use crate::period::{Period, PeriodVector};
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Default conversion efficiency of input to output
const DEFAULT_EFFICIENCY: f64 = 1.0;

/// Default capital required per unit of annual output
const DEFAULT_CAPITAL_OUTPUT_RATIO: f64 = 1.0;

/// Technology parameters, any of which may be left to a shared template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TechnologyParameters {
    /// The fuel consumed by the technology, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel: Option<FuelID>,
    /// Output per unit of input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
    /// Emissions per unit of input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissions_coefficient: Option<f64>,
    /// Capital required per unit of annual output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_output_ratio: Option<f64>,
    /// Lifetime of a vintage in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<u32>,
}

impl TechnologyParameters {
    /// Fill in parameters missing from `self` with those from `template`, if present
    pub fn merged(&self, template: Option<&TechnologyTemplate>) -> TechnologyParameters {
        let Some(template) = template else {
            return self.clone();
        };
        let base = &template.parameters;

        TechnologyParameters {
            fuel: self.fuel.clone().or_else(|| base.fuel.clone()),
            efficiency: self.efficiency.or(base.efficiency),
            emissions_coefficient: self.emissions_coefficient.or(base.emissions_coefficient),
            capital_output_ratio: self.capital_output_ratio.or(base.capital_output_ratio),
            lifetime: self.lifetime.or(base.lifetime),
        }
    }

    /// Resolve into concrete parameters, applying defaults and checking values
    pub fn resolve(&self, id: &TechnologyID) -> Result<ResolvedParameters> {
        let lifetime = self
            .lifetime
            .with_context(|| format!("No lifetime given for technology {id}"))?;
        ensure!(
            lifetime > 0,
            "Lifetime for technology {id} must be greater than zero"
        );

        let efficiency = self.efficiency.unwrap_or(DEFAULT_EFFICIENCY);
        ensure!(
            efficiency.is_finite() && efficiency > 0.0,
            "Efficiency for technology {id} must be a finite number greater than zero"
        );

        let emissions_coefficient = self.emissions_coefficient.unwrap_or(0.0);
        ensure!(
            emissions_coefficient.is_finite() && emissions_coefficient >= 0.0,
            "Emissions coefficient for technology {id} must be finite and non-negative"
        );

        let capital_output_ratio = self
            .capital_output_ratio
            .unwrap_or(DEFAULT_CAPITAL_OUTPUT_RATIO);
        ensure!(
            capital_output_ratio.is_finite() && capital_output_ratio > 0.0,
            "Capital-output ratio for technology {id} must be a finite number greater than zero"
        );

        Ok(ResolvedParameters {
            fuel: self.fuel.clone(),
            efficiency,
            emissions_coefficient,
            capital_output_ratio,
            lifetime,
        })
    }
}

/// A shared technology definition, looked up by name in the global technology database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyTemplate {
    /// The template's name
    #[serde(rename = "name")]
    pub id: TechnologyID,
    /// Default parameters for technologies using this template
    #[serde(flatten)]
    pub parameters: TechnologyParameters,
}
define_id_getter! {TechnologyTemplate, TechnologyID}

/// Technology parameters after merging with any template and applying defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameters {
    /// The fuel consumed by the technology, if any
    pub fuel: Option<FuelID>,
    /// Output per unit of input
    pub efficiency: f64,
    /// Emissions per unit of input
    pub emissions_coefficient: f64,
    /// Capital required per unit of annual output
    pub capital_output_ratio: f64,
    /// Lifetime of a vintage in years
    pub lifetime: u32,
}

/// The validated definition of a technology within a subsector, from which vintages are built
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyConfig {
    /// The technology's name
    pub id: TechnologyID,
    /// The name of the template in the global technology database, if any
    pub template: Option<TechnologyID>,
    /// Parameters given for this technology (override the template's)
    pub parameters: TechnologyParameters,
    /// Levelised cost of output for vintages built in each period
    pub cost: PeriodVector<MoneyPerEnergy>,
    /// Price of the technology's fuel in each period
    pub fuel_price: PeriodVector<MoneyPerEnergy>,
    /// Parsed share weights
    pub share_weights: PeriodVector<Option<f64>>,
    /// Share-weight interpolation rules, applied in order
    pub interpolation_rules: Vec<InterpolationRule>,
    /// Exogenously fixed output for new vintages
    pub fixed_output: PeriodVector<Option<Energy>>,
    /// Observed output to calibrate to
    pub calibration_output: PeriodVector<Option<Energy>>,
    /// Periods in which new vintages can be built
    pub available: RangeInclusive<Period>,
}

/// Whether a vintage was built in the current period or carried forward from an earlier one
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum VintageStatus {
    /// Built in the current period and competing for variable demand
    #[strum(serialize = "new")]
    New,
    /// Built in an earlier period
    #[strum(serialize = "existing")]
    Existing,
}

/// One vintage of a technology in one period
#[derive(Debug, Clone, PartialEq)]
pub struct Technology {
    /// The technology's name, shared by all of its vintages
    pub id: TechnologyID,
    /// The model year in which the vintage was built
    pub build_year: u32,
    /// New or existing vintage
    pub status: VintageStatus,
    /// Levelised cost of output
    pub cost: MoneyPerEnergy,
    /// Price of the fuel consumed
    pub fuel_price: MoneyPerEnergy,
    /// Physical and financial parameters
    pub parameters: ResolvedParameters,
    /// Logit share weight
    pub share_weight: f64,
    /// Exogenously fixed output, which excludes the vintage from logit competition
    pub fixed_output: Option<Energy>,
    /// Observed output to calibrate to
    pub calibration_output: Option<Energy>,
    output: Energy,
    investment: Money,
    capacity: Energy,
    operated: bool,
}
define_id_getter! {Technology, TechnologyID}

impl Technology {
    /// Build a new vintage of a technology for the given period
    pub fn new_vintage(
        config: &TechnologyConfig,
        parameters: ResolvedParameters,
        period: Period,
        build_year: u32,
        share_weight: f64,
    ) -> Self {
        Self {
            id: config.id.clone(),
            build_year,
            status: VintageStatus::New,
            cost: config.cost[period],
            fuel_price: config.fuel_price[period],
            parameters,
            share_weight,
            fixed_output: config.fixed_output[period],
            calibration_output: config.calibration_output[period],
            output: Energy(0.0),
            investment: Money(0.0),
            capacity: Energy(0.0),
            operated: false,
        }
    }

    /// Whether this vintage still operates in `year`
    pub fn is_active_in(&self, year: u32) -> bool {
        year >= self.build_year && year - self.build_year < self.parameters.lifetime
    }

    /// Carry this vintage into a later period as an existing vintage.
    ///
    /// The carried vintage produces a fixed output equal to the capacity established in its
    /// build period and pays the later period's fuel price.
    pub fn carry_forward(&self, fuel_price: MoneyPerEnergy) -> Self {
        Self {
            status: VintageStatus::Existing,
            fuel_price,
            fixed_output: Some(self.capacity),
            calibration_output: None,
            output: Energy(0.0),
            investment: Money(0.0),
            operated: false,
            ..self.clone()
        }
    }

    /// Whether output is fixed exogenously (or by an earlier build decision)
    pub fn is_fixed_output(&self) -> bool {
        self.fixed_output.is_some()
    }

    /// Whether the vintage takes part in logit competition for variable demand
    pub fn is_competitive(&self) -> bool {
        !self.is_fixed_output()
    }

    /// Set the output for the current period
    pub fn set_output(&mut self, output: Energy) -> Result<()> {
        ensure!(
            !self.operated,
            "Cannot change output of technology {} after it has operated",
            self.id
        );
        ensure!(
            output.is_finite() && output >= Energy(0.0),
            "Output for technology {} must be finite and non-negative",
            self.id
        );
        self.output = output;

        Ok(())
    }

    /// Output for the current period
    pub fn output(&self) -> Energy {
        self.output
    }

    /// Fuel input required for the current output
    pub fn input(&self) -> Energy {
        self.output / Dimensionless(self.parameters.efficiency)
    }

    /// Emissions from the current fuel input
    pub fn emissions(&self) -> f64 {
        self.input().value() * self.parameters.emissions_coefficient
    }

    /// Total cost of producing the current output
    pub fn production_cost(&self) -> Money {
        self.cost * self.output
    }

    /// Record investment placed in this vintage
    pub fn add_investment(&mut self, investment: Money) {
        self.investment += investment;
    }

    /// Investment placed in this vintage in the current period
    pub fn investment(&self) -> Money {
        self.investment
    }

    /// Capacity established in the build period
    pub fn capacity(&self) -> Energy {
        self.capacity
    }

    /// Whether the vintage has operated in the current period
    pub fn has_operated(&self) -> bool {
        self.operated
    }

    /// Finalise production for the current period.
    ///
    /// A new vintage establishes its capacity from the output it was given.
    pub fn operate(&mut self) -> Result<()> {
        ensure!(
            !self.operated,
            "Technology {} has already operated this period",
            self.id
        );
        if self.status == VintageStatus::New {
            self.capacity = self.output;
        }
        self.operated = true;

        Ok(())
    }
}
