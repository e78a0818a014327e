//! The subsector aggregate, which runs logit competition between its technologies.
//!
//! A subsector passes through a fixed sequence of [`Stage`]s every period. Calling an operation
//! out of order is an error, as is starting a period before the previous one is finished.
use crate::calibration::{CalibrationToken, ShareWeightHandle};
use crate::competition::{
    LogitConvention, check_costs, logit_cost_index, logit_shares, logit_term, weighted_average,
};
use crate::dependency::DependencyFinder;
use crate::economy::{AccountType, Gdp, NationalAccount};
use crate::id::{FuelID, HasID, RegionID, SectorID, SubsectorID, TechnologyID};
use crate::input::subsector::SubsectorInput;
use crate::interpolation::InterpolationRule;
use crate::investment::{
    Distributor, ExpectedProfitRateCalculator, Investable, InvestmentOutcome, ProfitContext,
    ProfitRateMode, RoundTrippable,
};
use crate::period::{Horizon, Period, PeriodVector};
use crate::share_weight::{ShareWeightCalibrator, ShareWeightSeries};
use crate::technology::{ResolvedParameters, Technology, TechnologyConfig, VintageStatus};
use crate::technology_database::GlobalTechnologyDatabase;
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use crate::vintage::VintageRegistry;
use crate::visitor::Visitor;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

/// The stages a subsector passes through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum::Display)]
pub enum Stage {
    /// Read from input
    #[strum(serialize = "parsed")]
    Parsed,
    /// Collaborators wired up and parameters resolved
    #[strum(serialize = "completed-init")]
    CompletedInit,
    /// Technologies for the current period created
    #[strum(serialize = "init-calc")]
    InitCalc,
    /// Cost index calculated
    #[strum(serialize = "cost-calc")]
    CostCalc,
    /// Share term calculated
    #[strum(serialize = "share-calc")]
    ShareCalc,
    /// Output pushed down to technologies
    #[strum(serialize = "output-set")]
    OutputSet,
    /// Production finalised
    #[strum(serialize = "operated")]
    Operated,
    /// Period complete
    #[strum(serialize = "post-calc")]
    PostCalc,
}

/// The validated input for a subsector
#[derive(Debug, Clone, PartialEq)]
pub struct SubsectorConfig {
    /// The subsector's name
    pub id: SubsectorID,
    /// The region the subsector belongs to
    pub region: RegionID,
    /// The sector the subsector belongs to
    pub sector: SectorID,
    /// Parsed share weights
    pub share_weights: PeriodVector<Option<f64>>,
    /// Share-weight interpolation rules, applied in order
    pub interpolation_rules: Vec<InterpolationRule>,
    /// Logit exponent for competition between technologies, as configured
    pub logit_exponent: PeriodVector<f64>,
    /// How the logit exponent is written
    pub logit_convention: LogitConvention,
    /// Elasticity of demand for the subsector with respect to GDP per capita
    pub fuel_preference_elasticity: PeriodVector<f64>,
    /// Exogenously fixed investment
    pub fixed_investment: PeriodVector<Option<Money>>,
    /// Whether the subsector may have no technologies
    pub allow_empty: bool,
    /// The technologies competing within the subsector
    pub technologies: Vec<TechnologyConfig>,
}

/// Shares of a subsector's variable output for each of its technologies in one period
#[derive(Debug, Clone, PartialEq)]
pub struct TechShares {
    /// Share for each technology, in order. Fixed-output technologies have a share of zero.
    pub shares: Vec<f64>,
    /// Whether each technology has fixed output
    pub fixed: Vec<bool>,
    /// Whether there were competitive technologies but none could be given a share
    pub degenerate: bool,
}

/// Summary of a subsector's results for one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsectorSummary {
    /// Cost index
    pub cost: MoneyPerEnergy,
    /// Effective share weight
    pub share_weight: f64,
    /// Total output
    pub output: Energy,
    /// Total fuel input
    pub input: Energy,
    /// Investment placed
    pub investment: Money,
    /// Total emissions
    pub emissions: f64,
}

/// A group of competing technologies within a sector
#[derive(Debug, Clone)]
pub struct Subsector {
    horizon: Horizon,
    config: SubsectorConfig,
    calibrator: ShareWeightCalibrator,
    parameters: Vec<ResolvedParameters>,
    tech_logit_exponent: PeriodVector<f64>,
    techs: PeriodVector<Vec<Technology>>,
    tech_shares: PeriodVector<Option<TechShares>>,
    cost: PeriodVector<MoneyPerEnergy>,
    annual_investment: PeriodVector<Money>,
    summary: PeriodVector<Option<SubsectorSummary>>,
    vintages: VintageRegistry,
    stage: Stage,
    period: Period,
}

impl HasID<SubsectorID> for Subsector {
    fn get_id(&self) -> &SubsectorID {
        &self.config.id
    }
}

/// Check that a series covers every period of the horizon
fn check_series_len<T>(what: &str, series: &PeriodVector<T>, horizon: &Horizon) -> Result<()> {
    ensure!(
        series.len() == horizon.len(),
        "{what} must have a value for each of the {} model years (got {})",
        horizon.len(),
        series.len()
    );

    Ok(())
}

/// Check that every value in a series of quantities is finite and non-negative
fn check_non_negative<'a, I>(what: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a f64>,
{
    for (period, value) in values.into_iter().enumerate() {
        ensure!(
            value.is_finite() && *value >= 0.0,
            "{what} in period {period} must be finite and non-negative (got {value})"
        );
    }

    Ok(())
}

/// Check a technology's series against the horizon
fn check_technology(
    subsector: &SubsectorID,
    tech: &TechnologyConfig,
    horizon: &Horizon,
) -> Result<()> {
    let context = format!("technology {} in subsector {subsector}", tech.id);
    check_series_len(&format!("Cost for {context}"), &tech.cost, horizon)?;
    check_series_len(&format!("Fuel price for {context}"), &tech.fuel_price, horizon)?;
    check_series_len(&format!("Share weights for {context}"), &tech.share_weights, horizon)?;
    check_series_len(&format!("Fixed output for {context}"), &tech.fixed_output, horizon)?;
    check_series_len(
        &format!("Calibration output for {context}"),
        &tech.calibration_output,
        horizon,
    )?;

    let costs: Vec<_> = tech.cost.iter().map(|cost| cost.value()).collect();
    check_costs(&context, &costs)?;
    check_non_negative(
        &format!("Fuel price for {context}"),
        &tech.fuel_price.iter().map(|price| price.value()).collect::<Vec<_>>(),
    )?;
    check_non_negative(
        &format!("Fixed output for {context}"),
        &tech.fixed_output.iter().flatten().map(|output| output.value()).collect::<Vec<_>>(),
    )?;
    check_non_negative(
        &format!("Calibration output for {context}"),
        &tech
            .calibration_output
            .iter()
            .flatten()
            .map(|output| output.value())
            .collect::<Vec<_>>(),
    )?;
    ensure!(
        tech.available.start() <= tech.available.end() && *tech.available.end() < horizon.len(),
        "Availability of {context} must be a non-empty range of model years"
    );

    Ok(())
}

impl Subsector {
    /// Create a new [`Subsector`] from its input, checking it for consistency.
    ///
    /// Templates are not resolved until [`Subsector::complete_init`].
    pub fn new(config: SubsectorConfig, horizon: Horizon) -> Result<Self> {
        let id = &config.id;
        check_series_len(
            &format!("Share weights for subsector {id}"),
            &config.share_weights,
            &horizon,
        )?;
        check_series_len(
            &format!("Logit exponent for subsector {id}"),
            &config.logit_exponent,
            &horizon,
        )?;
        check_series_len(
            &format!("Fuel preference elasticity for subsector {id}"),
            &config.fuel_preference_elasticity,
            &horizon,
        )?;
        check_series_len(
            &format!("Fixed investment for subsector {id}"),
            &config.fixed_investment,
            &horizon,
        )?;
        check_non_negative(
            &format!("Fixed investment for subsector {id}"),
            &config
                .fixed_investment
                .iter()
                .flatten()
                .map(|investment| investment.value())
                .collect::<Vec<_>>(),
        )?;

        let mut calibrator = ShareWeightCalibrator::new(ShareWeightSeries::new(
            &format!("subsector {id}"),
            config.share_weights.clone(),
            config.interpolation_rules.clone(),
        )?);
        for tech in &config.technologies {
            check_technology(id, tech, &horizon)?;
            calibrator.add_technology(
                tech.id.clone(),
                ShareWeightSeries::new(
                    &format!("technology {} in subsector {id}", tech.id),
                    tech.share_weights.clone(),
                    tech.interpolation_rules.clone(),
                )?,
            )?;
        }

        let len = horizon.len();
        Ok(Self {
            calibrator,
            parameters: Vec::new(),
            tech_logit_exponent: PeriodVector::filled(len, 0.0),
            techs: PeriodVector::filled(len, Vec::new()),
            tech_shares: PeriodVector::filled(len, None),
            cost: PeriodVector::filled(len, MoneyPerEnergy(0.0)),
            annual_investment: PeriodVector::filled(len, Money(0.0)),
            summary: PeriodVector::filled(len, None),
            vintages: VintageRegistry::new(),
            stage: Stage::Parsed,
            period: 0,
            horizon,
            config,
        })
    }

    /// Resolve technology templates and register dependencies. This can only be done once.
    ///
    /// # Arguments
    ///
    /// * `database` - Shared technology templates
    /// * `dependencies` - Collects which fuels the subsector's sector consumes
    pub fn complete_init(
        &mut self,
        database: &GlobalTechnologyDatabase,
        dependencies: &mut DependencyFinder,
    ) -> Result<()> {
        let id = self.config.id.clone();
        ensure!(
            self.stage == Stage::Parsed,
            "Initialisation has already been completed for subsector {id}"
        );

        self.vintages
            .initialize_tech_vector(&id, &self.config.technologies, self.config.allow_empty)?;

        self.parameters = self
            .config
            .technologies
            .iter()
            .map(|tech| {
                let template = tech
                    .template
                    .as_ref()
                    .map(|name| database.get_template(&name.0))
                    .transpose()
                    .with_context(|| format!("Invalid template for technology {}", tech.id))?;
                tech.parameters.merged(template).resolve(&tech.id)
            })
            .collect::<Result<_>>()
            .with_context(|| format!("Invalid technology in subsector {id}"))?;

        for fuel in self.parameters.iter().filter_map(|params| params.fuel.as_ref()) {
            dependencies.add_dependency(&self.config.sector.0, &fuel.0);
        }

        self.tech_logit_exponent = self
            .config
            .logit_convention
            .check_exponents(&format!("subsector {id}"), self.config.logit_exponent.as_slice())
            .into();

        self.stage = Stage::CompletedInit;
        debug!("Completed initialisation of subsector {id}");

        Ok(())
    }

    /// Check that `period` is the current period and the subsector is in one of the given stages
    fn ensure_stage(
        &self,
        period: Period,
        operation: &str,
        earliest: Stage,
        latest: Stage,
    ) -> Result<()> {
        ensure!(
            self.stage >= Stage::InitCalc && period == self.period,
            "Cannot {operation} for subsector {} in period {period}: period {} is in progress",
            self.config.id,
            self.period
        );
        ensure!(
            (earliest..=latest).contains(&self.stage),
            "Cannot {operation} for subsector {} while in the {} stage",
            self.config.id,
            self.stage
        );

        Ok(())
    }

    fn technology_config(&self, id: &TechnologyID) -> Result<&TechnologyConfig> {
        self.config
            .technologies
            .iter()
            .find(|tech| tech.id == *id)
            .with_context(|| format!("Unknown technology {id} in subsector {}", self.config.id))
    }

    /// Start a new period: interpolate share weights and create its technologies.
    ///
    /// Vintages from the previous period that are still within their lifetime are carried forward
    /// as existing vintages with fixed output. A new vintage is created for every technology
    /// available in the period.
    pub fn init_calc(&mut self, period: Period) -> Result<()> {
        let id = self.config.id.clone();
        if period == 0 {
            ensure!(
                self.stage == Stage::CompletedInit,
                "Subsector {id} must complete initialisation before the first period (stage: {})",
                self.stage
            );
        } else {
            ensure!(
                self.stage == Stage::PostCalc && self.period + 1 == period,
                "Subsector {id} cannot start period {period} before period {} is complete",
                period - 1
            );
        }
        let year = self
            .horizon
            .year(period)
            .with_context(|| format!("Period {period} is outside the model horizon"))?;

        self.calibrator
            .interpolate_share_weights(&self.horizon, period)
            .with_context(|| format!("Failed to interpolate share weights for subsector {id}"))?;
        self.calibrator
            .normalize_tech_share_weights(&self.horizon, period)
            .with_context(|| format!("Failed to interpolate share weights for subsector {id}"))?;

        let mut techs = Vec::new();
        if let Some(previous) = period.checked_sub(1) {
            for tech in &self.techs[previous] {
                if tech.is_active_in(year) && tech.capacity() > Energy(0.0) {
                    let fuel_price = self.technology_config(&tech.id)?.fuel_price[period];
                    techs.push(tech.carry_forward(fuel_price));
                }
            }
        }
        for (config, parameters) in self.config.technologies.iter().zip(&self.parameters) {
            if config.available.contains(&period) {
                let share_weight = self.calibrator.tech_share_weight(&config.id.0, period);
                techs.push(Technology::new_vintage(
                    config,
                    parameters.clone(),
                    period,
                    year,
                    share_weight,
                ));
            }
        }

        self.vintages.register_period(period, &techs)?;
        self.techs[period] = techs;
        self.tech_shares[period] = None;
        self.period = period;
        self.stage = Stage::InitCalc;

        Ok(())
    }

    /// Calculate the subsector's cost index for the period.
    ///
    /// This is the logit power mean of the costs of competitive technologies, or the
    /// output-weighted mean cost if all technologies have fixed output.
    pub fn calc_cost(&mut self, period: Period) -> Result<MoneyPerEnergy> {
        self.ensure_stage(period, "calculate cost", Stage::InitCalc, Stage::OutputSet)?;

        let techs = &self.techs[period];
        let (weights, costs): (Vec<f64>, Vec<f64>) = techs
            .iter()
            .filter(|tech| tech.is_competitive())
            .map(|tech| (tech.share_weight, tech.cost.value()))
            .unzip();
        let cost = if weights.is_empty() {
            let (costs, outputs): (Vec<f64>, Vec<f64>) = techs
                .iter()
                .filter_map(|tech| Some((tech.cost.value(), tech.fixed_output?.value())))
                .unzip();
            weighted_average(&costs, &outputs)
        } else {
            logit_cost_index(&weights, &costs, self.tech_logit_exponent[period])
        };

        self.cost[period] = MoneyPerEnergy(cost);
        self.stage = Stage::CostCalc;

        Ok(self.cost[period])
    }

    /// The subsector's unnormalised logit term for competition against its siblings.
    ///
    /// Sibling terms are normalised by the caller.
    pub fn calc_share(&mut self, period: Period, gdp: &Gdp, logit_exponent: f64) -> Result<f64> {
        self.ensure_stage(period, "calculate share", Stage::CostCalc, Stage::OutputSet)?;
        let term = self.share_term(period, gdp, logit_exponent, self.share_weight(period));
        self.stage = Stage::ShareCalc;

        Ok(term)
    }

    /// The logit term for the subsector with the given share weight
    pub(crate) fn share_term(
        &self,
        period: Period,
        gdp: &Gdp,
        logit_exponent: f64,
        weight: f64,
    ) -> f64 {
        if self.techs[period].iter().all(Technology::is_fixed_output) {
            return 0.0;
        }

        let preference = gdp
            .scaled_gdp_per_capita(period)
            .powf(self.config.fuel_preference_elasticity[period]);
        logit_term(weight, self.cost[period].value(), logit_exponent) * preference
    }

    /// Shares of variable output for each technology in a period
    pub fn calc_tech_shares(&self, period: Period) -> Result<TechShares> {
        ensure!(
            self.stage >= Stage::InitCalc && period <= self.period,
            "Technologies for subsector {} have not been created for period {period}",
            self.config.id
        );

        let techs = &self.techs[period];
        let fixed: Vec<bool> = techs.iter().map(Technology::is_fixed_output).collect();
        let (weights, costs): (Vec<f64>, Vec<f64>) = techs
            .iter()
            .filter(|tech| tech.is_competitive())
            .map(|tech| (tech.share_weight, tech.cost.value()))
            .unzip();

        let competition = logit_shares(&weights, &costs, self.tech_logit_exponent[period]);
        let degenerate = !weights.is_empty() && competition.is_degenerate();
        let mut competitive_shares = competition.into_shares(weights.len()).into_iter();
        let shares = fixed
            .iter()
            .map(|&is_fixed| {
                if is_fixed {
                    0.0
                } else {
                    competitive_shares.next().unwrap_or(0.0)
                }
            })
            .collect();

        Ok(TechShares {
            shares,
            fixed,
            degenerate,
        })
    }

    /// Push the subsector's output for the period down to its technologies.
    ///
    /// # Arguments
    ///
    /// * `variable_demand` - Demand to split between competitive technologies
    /// * `fixed_output_scale` - Factor applied to the output of fixed-output technologies
    /// * `period` - The current period
    pub fn set_output(
        &mut self,
        variable_demand: Energy,
        fixed_output_scale: f64,
        period: Period,
    ) -> Result<()> {
        self.ensure_stage(period, "set output", Stage::CostCalc, Stage::OutputSet)?;
        ensure!(
            variable_demand.is_finite() && variable_demand >= Energy(0.0),
            "Demand for subsector {} must be finite and non-negative",
            self.config.id
        );
        ensure!(
            fixed_output_scale.is_finite() && fixed_output_scale >= 0.0,
            "Fixed output scale factor must be finite and non-negative"
        );

        let tech_shares = self.calc_tech_shares(period)?;
        if tech_shares.degenerate && variable_demand > Energy(0.0) {
            warn!(
                "Technology competition in subsector {} is degenerate in period {period}: demand \
                of {variable_demand} could not be allocated",
                self.config.id
            );
        }

        for ((tech, share), is_fixed) in self.techs[period]
            .iter_mut()
            .zip(&tech_shares.shares)
            .zip(&tech_shares.fixed)
        {
            let output = if *is_fixed {
                tech.fixed_output.unwrap_or_default() * Dimensionless(fixed_output_scale)
            } else {
                variable_demand * Dimensionless(*share)
            };
            tech.set_output(output)?;
        }

        self.tech_shares[period] = Some(tech_shares);
        self.stage = Stage::OutputSet;

        Ok(())
    }

    /// Finalise production for the period. Output cannot be changed afterwards.
    pub fn operate(&mut self, period: Period) -> Result<()> {
        self.ensure_stage(period, "operate", Stage::OutputSet, Stage::OutputSet)?;
        for tech in &mut self.techs[period] {
            tech.operate()?;
        }
        self.stage = Stage::Operated;

        Ok(())
    }

    /// Record the period's summary and finish the period.
    ///
    /// Calling this again for the same period has no further effect.
    pub fn post_calc(&mut self, period: Period) -> Result<()> {
        ensure!(
            self.stage >= Stage::Operated && period == self.period,
            "Subsector {} must operate in period {period} before it is completed",
            self.config.id
        );
        if self.stage == Stage::PostCalc {
            return Ok(());
        }

        self.update_summary(period);
        self.stage = Stage::PostCalc;

        Ok(())
    }

    /// Whether the output of every calibrated technology is within `accuracy` of its target.
    ///
    /// The difference is relative to the target, or absolute if the target is zero. Mismatches are
    /// logged if `print_warnings` is set.
    pub fn is_all_calibrated(&self, period: Period, accuracy: f64, print_warnings: bool) -> bool {
        let mut calibrated = true;
        for tech in self.techs[period].iter().filter(|tech| tech.is_competitive()) {
            let Some(target) = tech.calibration_output else {
                continue;
            };

            let output = tech.output();
            let difference = if target > Energy(0.0) {
                ((output - target) / target).0.abs()
            } else {
                output.value().abs()
            };
            if difference > accuracy {
                calibrated = false;
                if print_warnings {
                    warn!(
                        "Technology {} in subsector {} is not calibrated in period {period}: \
                        output {output} differs from calibration value {target}",
                        tech.id, self.config.id
                    );
                }
            }
        }

        calibrated
    }

    /// Whether a calibration target is in effect for `period`
    pub fn get_calibration_status(&self, period: Period) -> bool {
        self.has_calibration_market(period)
    }

    /// Whether the calibration step switched calibration on for the subsector
    pub fn is_calibrating(&self) -> bool {
        self.calibrator.is_calibrating()
    }

    /// Switch calibration on or off
    pub fn set_calibration(&mut self, token: &CalibrationToken, calibrating: bool) {
        self.calibrator.set_calibration(token, calibrating);
    }

    /// Set the subsector's share weight directly
    pub fn set_share_weight_direct(
        &mut self,
        handle: &ShareWeightHandle,
        period: Period,
        value: f64,
    ) {
        self.calibrator.set_share_weight_direct(handle, period, value);
    }

    /// Set a technology's share weight directly, including on its new vintage in the period
    pub fn set_tech_share_weight_direct(
        &mut self,
        handle: &ShareWeightHandle,
        id: &TechnologyID,
        period: Period,
        value: f64,
    ) -> Result<()> {
        self.calibrator
            .set_tech_share_weight_direct(handle, id, period, value)?;
        for tech in &mut self.techs[period] {
            if tech.id == *id && tech.status == VintageStatus::New {
                tech.share_weight = value;
            }
        }

        Ok(())
    }

    /// Shares of new investment for each new vintage: their technology shares, or equal shares
    /// if those are all zero or not yet calculated
    fn new_vintage_shares(&self, period: Period) -> Vec<f64> {
        let shares: Vec<f64> = self.techs[period]
            .iter()
            .enumerate()
            .filter(|(_, tech)| tech.status == VintageStatus::New)
            .map(|(index, _)| {
                self.tech_shares[period]
                    .as_ref()
                    .map_or(0.0, |shares| shares.shares[index])
            })
            .collect();

        let total: f64 = shares.iter().sum();
        if total > 0.0 {
            shares.into_iter().map(|share| share / total).collect()
        } else {
            let len = shares.len();
            vec![1.0 / len as f64; len]
        }
    }

    /// Spread `amount` over the period's new vintages by their technology shares
    fn spread_investment(&mut self, amount: Money, period: Period) -> Money {
        let shares = self.new_vintage_shares(period);
        let new_vintages = self.techs[period]
            .iter_mut()
            .filter(|tech| tech.status == VintageStatus::New);
        let mut placed = Money(0.0);
        for (tech, share) in new_vintages.zip(shares) {
            let allotment = amount * Dimensionless(share);
            tech.add_investment(allotment);
            placed += allotment;
        }

        placed
    }

    /// The expected profit rate of investing in the subsector
    pub fn expected_profit_rate(
        &self,
        national_account: &NationalAccount,
        calculator: &dyn ExpectedProfitRateCalculator,
        price: MoneyPerEnergy,
        mode: ProfitRateMode,
    ) -> Option<f64> {
        calculator.calc_rate(self, national_account, price, mode)
    }

    /// Split new investment across the period's new vintages.
    ///
    /// If a nonzero fixed investment is given for the period, it replaces the requested amount and
    /// is spread by technology share over any new vintages. Otherwise `distributor` decides. The
    /// amount placed is added to the national account's annual investment.
    pub fn distribute_investment(
        &mut self,
        distributor: &dyn Distributor,
        national_account: &mut NationalAccount,
        calculator: &dyn ExpectedProfitRateCalculator,
        price: MoneyPerEnergy,
        new_investment: Money,
        period: Period,
    ) -> Result<InvestmentOutcome> {
        self.ensure_stage(period, "distribute investment", Stage::OutputSet, Stage::OutputSet)?;
        ensure!(
            new_investment.is_finite() && new_investment >= Money(0.0),
            "Investment for subsector {} must be finite and non-negative (got {new_investment})",
            self.config.id
        );

        let fixed_investment = self.config.fixed_investment[period];
        let outcome = match fixed_investment {
            Some(fixed) if fixed > Money(0.0) => {
                debug!(
                    "Fixed investment of {fixed} replaces {new_investment} requested for \
                    subsector {} in period {period}",
                    self.config.id
                );
                let has_new_vintages = self.techs[period]
                    .iter()
                    .any(|tech| tech.status == VintageStatus::New);
                if has_new_vintages {
                    self.spread_investment(fixed, period);
                } else {
                    // Recorded against the subsector only
                    warn!(
                        "Subsector {} has no new technologies in period {period} to take its \
                        fixed investment of {fixed}",
                        self.config.id
                    );
                }
                InvestmentOutcome {
                    placed: fixed,
                    shortfall: Money(0.0),
                }
            }
            _ => {
                let context = ProfitContext {
                    national_account,
                    calculator,
                    price,
                };
                let mut candidates: Vec<&mut dyn Investable> = self.techs[period]
                    .iter_mut()
                    .filter(|tech| tech.status == VintageStatus::New)
                    .map(|tech| tech as &mut dyn Investable)
                    .collect();
                distributor.distribute(&mut candidates, new_investment, &context)
            }
        };

        national_account.add_to(AccountType::AnnualInvestment, outcome.placed.value());
        self.annual_investment[period] += outcome.placed;
        if outcome.shortfall > Money(0.0) {
            warn!(
                "Only {} of {new_investment} investment could be placed in subsector {} in \
                period {period}",
                outcome.placed, self.config.id
            );
        }

        Ok(outcome)
    }

    /// Capital-output ratio of the period's new vintages, weighted by how `distributor` would
    /// split investment between them (equally, if it cannot)
    pub fn distributed_capital_output_ratio(
        &self,
        distributor: &dyn Distributor,
        context: &ProfitContext,
        period: Period,
    ) -> f64 {
        let candidates: Vec<&dyn Investable> = self.techs[period]
            .iter()
            .filter(|tech| tech.status == VintageStatus::New)
            .map(|tech| tech as &dyn Investable)
            .collect();
        let ratios: Vec<f64> = candidates
            .iter()
            .map(|candidate| candidate.capital_output_ratio())
            .collect();
        let weights = distributor
            .calc_shares(&candidates, context)
            .unwrap_or_else(|| vec![1.0; candidates.len()]);

        weighted_average(&ratios, &weights)
    }

    /// The subsector's name
    pub fn name(&self) -> &SubsectorID {
        &self.config.id
    }

    /// The region the subsector belongs to
    pub fn region(&self) -> &RegionID {
        &self.config.region
    }

    /// The sector the subsector belongs to
    pub fn sector(&self) -> &SectorID {
        &self.config.sector
    }

    /// The current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The period in progress
    pub fn current_period(&self) -> Period {
        self.period
    }

    /// The subsector's cost index, as last calculated for the period
    pub fn price(&self, period: Period) -> MoneyPerEnergy {
        self.cost[period]
    }

    /// The effective share weight
    pub fn share_weight(&self, period: Period) -> f64 {
        self.calibrator.share_weight(period)
    }

    /// Multiply the effective share weight by `scale`
    pub fn scale_share_weight(&mut self, scale: f64, period: Period) -> Result<()> {
        self.calibrator.scale_share_weight(scale, period)
    }

    /// The logit exponent used for competition between technologies
    pub fn tech_logit_exponent(&self, period: Period) -> f64 {
        self.tech_logit_exponent[period]
    }

    /// The technology vintages present in a period
    pub fn techs(&self, period: Period) -> &[Technology] {
        &self.techs[period]
    }

    /// Technology shares from the last time output was set for the period
    pub fn tech_shares(&self, period: Period) -> Option<&TechShares> {
        self.tech_shares[period].as_ref()
    }

    /// The registry of technology vintages
    pub fn vintage_registry(&self) -> &VintageRegistry {
        &self.vintages
    }

    /// Whether the subsector has no output to compete for: its share weight is zero or all of
    /// its technologies have fixed output
    #[allow(clippy::float_cmp)]
    pub fn all_output_fixed(&self, period: Period) -> bool {
        self.share_weight(period) == 0.0
            || self.techs[period].iter().all(Technology::is_fixed_output)
    }

    /// Whether the subsector has technologies and all of them have fixed output
    pub fn contains_only_fixed_output_technologies(&self, period: Period) -> bool {
        let techs = &self.techs[period];
        !techs.is_empty() && techs.iter().all(Technology::is_fixed_output)
    }

    /// Total output of fixed-output technologies, before scaling
    pub fn fixed_output(&self, period: Period) -> Energy {
        self.techs[period]
            .iter()
            .filter_map(|tech| tech.fixed_output)
            .sum()
    }

    /// Total calibration output of competitive technologies, if every one of them has one
    pub fn total_calibration_output(&self, period: Period) -> Option<Energy> {
        let mut competitive = self.techs[period]
            .iter()
            .filter(|tech| tech.is_competitive())
            .peekable();
        competitive.peek()?;

        competitive.map(|tech| tech.calibration_output).sum()
    }

    /// Whether calibration data is given for the period
    pub fn has_calibration_market(&self, period: Period) -> bool {
        self.total_calibration_output(period).is_some()
    }

    /// Total output
    pub fn output(&self, period: Period) -> Energy {
        self.techs[period].iter().map(Technology::output).sum()
    }

    /// Total input of all technologies
    pub fn input(&self, period: Period) -> Energy {
        self.techs[period].iter().map(Technology::input).sum()
    }

    /// Total input of technologies which consume a fuel
    pub fn energy_input(&self, period: Period) -> Energy {
        self.techs[period]
            .iter()
            .filter(|tech| tech.parameters.fuel.is_some())
            .map(Technology::input)
            .sum()
    }

    /// Investment placed in the period
    pub fn annual_investment(&self, period: Period) -> Money {
        self.annual_investment[period]
    }

    /// The fixed investment for the period, if any
    pub fn fixed_investment(&self, period: Period) -> Option<Money> {
        self.config.fixed_investment[period]
    }

    /// Input of each fuel
    pub fn fuel_consumption(&self, period: Period) -> IndexMap<FuelID, Energy> {
        let mut consumption = IndexMap::new();
        for tech in &self.techs[period] {
            if let Some(fuel) = &tech.parameters.fuel {
                *consumption.entry(fuel.clone()).or_insert(Energy(0.0)) += tech.input();
            }
        }

        consumption
    }

    /// Emissions from each fuel
    pub fn emissions(&self, period: Period) -> IndexMap<FuelID, f64> {
        let mut emissions = IndexMap::new();
        for tech in &self.techs[period] {
            if let Some(fuel) = &tech.parameters.fuel {
                *emissions.entry(fuel.clone()).or_insert(0.0) += tech.emissions();
            }
        }

        emissions
    }

    /// Fuel price averaged over technologies by their calculated shares
    pub fn average_fuel_price(&self, period: Period) -> Result<MoneyPerEnergy> {
        let tech_shares = self.tech_shares[period].as_ref().with_context(|| {
            format!(
                "Technology shares for subsector {} have not been calculated for period {period}",
                self.config.id
            )
        })?;
        let prices: Vec<f64> = self.techs[period]
            .iter()
            .map(|tech| tech.fuel_price.value())
            .collect();

        Ok(MoneyPerEnergy(weighted_average(&prices, &tech_shares.shares)))
    }

    /// Store a summary of the period's results
    pub fn update_summary(&mut self, period: Period) {
        self.summary[period] = Some(SubsectorSummary {
            cost: self.price(period),
            share_weight: self.share_weight(period),
            output: self.output(period),
            input: self.input(period),
            investment: self.annual_investment(period),
            emissions: self.emissions(period).values().sum(),
        });
    }

    /// The stored summary for a period, if it is complete
    pub fn summary(&self, period: Period) -> Option<&SubsectorSummary> {
        self.summary[period].as_ref()
    }

    /// Walk `visitor` over the subsector and its technologies in `period`
    pub fn accept(&self, visitor: &mut dyn Visitor, period: Period) {
        visitor.start_visit_subsector(self, period);
        for tech in self.techs(period) {
            visitor.visit_technology(self, tech, period);
        }
        visitor.end_visit_subsector(self, period);
    }

    /// The horizon the subsector is simulated over
    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    /// The subsector's validated input
    pub fn config(&self) -> &SubsectorConfig {
        &self.config
    }
}

impl Investable for Subsector {
    fn investable_id(&self) -> &str {
        &self.config.id.0
    }

    fn current_output(&self) -> Energy {
        self.output(self.period)
    }

    fn unit_cost(&self) -> MoneyPerEnergy {
        self.price(self.period)
    }

    fn capital_output_ratio(&self) -> f64 {
        let (ratios, outputs): (Vec<f64>, Vec<f64>) = self.techs[self.period]
            .iter()
            .filter(|tech| tech.status == VintageStatus::New)
            .map(|tech| (tech.parameters.capital_output_ratio, tech.output().value()))
            .unzip();
        if outputs.iter().sum::<f64>() > 0.0 {
            weighted_average(&ratios, &outputs)
        } else {
            weighted_average(&ratios, &vec![1.0; ratios.len()])
        }
    }

    fn place_investment(&mut self, amount: Money) {
        let period = self.period;
        let placed = self.spread_investment(amount, period);
        self.annual_investment[period] += placed;
    }

    fn placed_investment(&self) -> Money {
        self.annual_investment[self.period]
    }
}

impl RoundTrippable for Subsector {
    type Input = SubsectorInput;

    fn to_input(&self) -> SubsectorInput {
        SubsectorInput::from_config(&self.config, &self.horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{
        assert_error, gdp, horizon, subsector, subsector_config, technology_config,
        technology_database,
    };
    use crate::investment::{
        OutputShareDistributor, ProfitRateLogitDistributor, ReturnOnCapitalCalculator,
    };
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    /// A subsector which has completed initialisation
    fn initialised(mut subsector: Subsector, database: &GlobalTechnologyDatabase) -> Subsector {
        subsector
            .complete_init(database, &mut DependencyFinder::new())
            .unwrap();
        subsector
    }

    /// Run one period through to `set_output`
    fn run_to_output(subsector: &mut Subsector, period: Period, gdp: &Gdp, demand: f64) {
        subsector.init_calc(period).unwrap();
        subsector.calc_cost(period).unwrap();
        subsector.calc_share(period, gdp, -3.0).unwrap();
        subsector.set_output(Energy(demand), 1.0, period).unwrap();
    }

    /// Finish a period started with [`run_to_output`]
    fn finish(subsector: &mut Subsector, period: Period) {
        subsector.operate(period).unwrap();
        subsector.post_calc(period).unwrap();
    }

    #[rstest]
    fn test_complete_init_twice(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
    ) {
        let mut subsector = initialised(subsector, &technology_database);
        assert_error!(
            subsector.complete_init(&technology_database, &mut DependencyFinder::new()),
            "Initialisation has already been completed for subsector fossil"
        );
    }

    #[rstest]
    fn test_complete_init_unknown_template(
        mut subsector_config: SubsectorConfig,
        horizon: Horizon,
        technology_database: GlobalTechnologyDatabase,
    ) {
        subsector_config.technologies[0].template = Some("fusion".into());
        let mut subsector = Subsector::new(subsector_config, horizon).unwrap();
        assert!(
            subsector
                .complete_init(&technology_database, &mut DependencyFinder::new())
                .is_err()
        );
    }

    #[rstest]
    fn test_complete_init_registers_fuel(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
    ) {
        let mut dependencies = DependencyFinder::new();
        let mut subsector = subsector;
        subsector
            .complete_init(&technology_database, &mut dependencies)
            .unwrap();
        let ordering = dependencies.ordering().unwrap();
        assert_eq!(ordering.len(), 3);
        assert_eq!(ordering.last().unwrap(), "electricity");
    }

    #[rstest]
    fn test_new_negative_cost(mut subsector_config: SubsectorConfig, horizon: Horizon) {
        subsector_config.technologies[0].cost[2] = MoneyPerEnergy(-1.0);
        assert!(Subsector::new(subsector_config, horizon).is_err());
    }

    #[rstest]
    fn test_calls_out_of_order(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        let mut subsector = subsector;
        assert!(subsector.init_calc(0).is_err());

        let mut subsector = initialised(subsector, &technology_database);
        assert!(subsector.calc_cost(0).is_err());
        subsector.init_calc(0).unwrap();
        assert!(subsector.calc_share(0, &gdp, -3.0).is_err());
        assert!(subsector.operate(0).is_err());
        subsector.calc_cost(0).unwrap();
        assert!(subsector.init_calc(1).is_err());
        subsector.set_output(Energy(10.0), 1.0, 0).unwrap();
        subsector.operate(0).unwrap();
        assert!(subsector.set_output(Energy(5.0), 1.0, 0).is_err());
        assert!(subsector.init_calc(1).is_err());
        subsector.post_calc(0).unwrap();
        subsector.post_calc(0).unwrap();
        subsector.init_calc(1).unwrap();
    }

    #[rstest]
    fn test_tech_shares_sum_to_one(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        let mut subsector = initialised(subsector, &technology_database);
        run_to_output(&mut subsector, 0, &gdp, 100.0);
        let shares = subsector.calc_tech_shares(0).unwrap();
        assert!(!shares.degenerate);
        assert_approx_eq!(f64, shares.shares.iter().sum(), 1.0, epsilon = 1e-9);

        // Coal (cost 10) beats gas (cost 20)
        assert!(shares.shares[0] > shares.shares[1]);
        assert_approx_eq!(Energy, subsector.output(0), Energy(100.0), epsilon = 1e-9);
    }

    #[rstest]
    fn test_single_technology_share(
        mut subsector_config: SubsectorConfig,
        horizon: Horizon,
        technology_database: GlobalTechnologyDatabase,
    ) {
        subsector_config.technologies.truncate(1);
        subsector_config.technologies[0].cost = PeriodVector::filled(4, MoneyPerEnergy(1234.0));
        let subsector = Subsector::new(subsector_config, horizon).unwrap();
        let mut subsector = initialised(subsector, &technology_database);
        subsector.init_calc(0).unwrap();
        assert_eq!(subsector.calc_tech_shares(0).unwrap().shares, [1.0]);
    }

    #[rstest]
    fn test_zero_share_weight_gives_zero_share(
        mut subsector_config: SubsectorConfig,
        horizon: Horizon,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        subsector_config.share_weights = vec![Some(0.0), None, None, None].into();
        let subsector = Subsector::new(subsector_config, horizon).unwrap();
        let mut subsector = initialised(subsector, &technology_database);
        subsector.init_calc(0).unwrap();
        subsector.calc_cost(0).unwrap();
        assert_eq!(subsector.calc_share(0, &gdp, -3.0).unwrap(), 0.0);
        assert!(subsector.all_output_fixed(0));
    }

    #[rstest]
    fn test_no_technologies(
        mut subsector_config: SubsectorConfig,
        horizon: Horizon,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        subsector_config.technologies.clear();
        subsector_config.allow_empty = true;
        let subsector = Subsector::new(subsector_config, horizon).unwrap();
        let mut subsector = initialised(subsector, &technology_database);
        subsector.init_calc(0).unwrap();
        assert_eq!(subsector.calc_cost(0).unwrap(), MoneyPerEnergy(0.0));
        assert_eq!(subsector.calc_share(0, &gdp, -3.0).unwrap(), 0.0);
        subsector.set_output(Energy(0.0), 1.0, 0).unwrap();
        assert_eq!(subsector.output(0), Energy(0.0));
    }

    #[rstest]
    fn test_cost_is_between_technology_costs(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
    ) {
        let mut subsector = initialised(subsector, &technology_database);
        subsector.init_calc(0).unwrap();
        let cost = subsector.calc_cost(0).unwrap();
        assert!(cost > MoneyPerEnergy(10.0) && cost < MoneyPerEnergy(20.0));
        assert_eq!(subsector.price(0), cost);
    }

    #[rstest]
    fn test_vintages_carried_forward(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        let mut subsector = initialised(subsector, &technology_database);
        run_to_output(&mut subsector, 0, &gdp, 100.0);
        let coal_output = subsector.techs(0)[0].output();
        finish(&mut subsector, 0);

        subsector.init_calc(1).unwrap();
        let techs = subsector.techs(1);
        assert_eq!(techs.len(), 4);
        let existing: Vec<_> = techs
            .iter()
            .filter(|tech| tech.status == VintageStatus::Existing)
            .collect();
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].build_year, 2005);
        assert_eq!(existing[0].fixed_output, Some(coal_output));

        let coal = subsector.vintage_registry().get("coal").unwrap();
        assert_eq!(coal.vintages().len(), 2);
    }

    #[rstest]
    fn test_fixed_output_scaled(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        let mut subsector = initialised(subsector, &technology_database);
        run_to_output(&mut subsector, 0, &gdp, 100.0);
        finish(&mut subsector, 0);

        subsector.init_calc(1).unwrap();
        let fixed = subsector.fixed_output(1);
        assert_approx_eq!(Energy, fixed, Energy(100.0), epsilon = 1e-9);
        subsector.calc_cost(1).unwrap();
        subsector.set_output(Energy(50.0), 0.5, 1).unwrap();
        assert_approx_eq!(Energy, subsector.output(1), Energy(100.0), epsilon = 1e-9);
    }

    #[rstest]
    fn test_is_all_calibrated(
        mut subsector_config: SubsectorConfig,
        horizon: Horizon,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        subsector_config.technologies[0].calibration_output[0] = Some(Energy(60.0));
        subsector_config.technologies[1].calibration_output[0] = Some(Energy(40.0));
        let subsector = Subsector::new(subsector_config, horizon).unwrap();
        let mut subsector = initialised(subsector, &technology_database);
        run_to_output(&mut subsector, 0, &gdp, 100.0);

        assert!(subsector.has_calibration_market(0));
        assert_eq!(subsector.total_calibration_output(0), Some(Energy(100.0)));
        // With equal weights coal gets far more than 60% of the market
        assert!(!subsector.is_all_calibrated(0, 1e-3, false));
        assert!(subsector.is_all_calibrated(0, 10.0, false));
    }

    #[rstest]
    fn test_calibration_status_follows_targets(
        mut subsector_config: SubsectorConfig,
        horizon: Horizon,
        technology_database: GlobalTechnologyDatabase,
    ) {
        subsector_config.technologies[0].calibration_output[0] = Some(Energy(60.0));
        subsector_config.technologies[1].calibration_output[0] = Some(Energy(40.0));
        let subsector = Subsector::new(subsector_config, horizon).unwrap();
        let mut subsector = initialised(subsector, &technology_database);
        subsector.init_calc(0).unwrap();

        assert!(subsector.get_calibration_status(0));
        assert!(!subsector.get_calibration_status(1));
        assert!(!subsector.is_calibrating());
    }

    #[rstest]
    fn test_distribute_fixed_investment(
        mut subsector_config: SubsectorConfig,
        horizon: Horizon,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        subsector_config.fixed_investment[0] = Some(Money(30.0));
        let subsector = Subsector::new(subsector_config, horizon).unwrap();
        let mut subsector = initialised(subsector, &technology_database);
        run_to_output(&mut subsector, 0, &gdp, 100.0);

        let mut national_account = NationalAccount::new();
        let outcome = subsector
            .distribute_investment(
                &OutputShareDistributor,
                &mut national_account,
                &ReturnOnCapitalCalculator::default(),
                MoneyPerEnergy(30.0),
                Money(100.0),
                0,
            )
            .unwrap();
        assert_eq!(outcome.placed, Money(30.0));
        assert_eq!(outcome.shortfall, Money(0.0));
        assert_eq!(national_account.get(AccountType::AnnualInvestment), 30.0);
        let total: Money = subsector.techs(0).iter().map(Technology::investment).sum();
        assert_approx_eq!(Money, total, Money(30.0), epsilon = 1e-9);
    }

    #[rstest]
    fn test_fixed_investment_without_new_vintages(
        mut subsector_config: SubsectorConfig,
        horizon: Horizon,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        for tech in &mut subsector_config.technologies {
            tech.available = 0..=0;
        }
        subsector_config.fixed_investment[1] = Some(Money(30.0));
        let subsector = Subsector::new(subsector_config, horizon).unwrap();
        let mut subsector = initialised(subsector, &technology_database);
        run_to_output(&mut subsector, 0, &gdp, 100.0);
        finish(&mut subsector, 0);
        run_to_output(&mut subsector, 1, &gdp, 100.0);
        assert!(
            subsector
                .techs(1)
                .iter()
                .all(|tech| tech.status != VintageStatus::New)
        );

        let mut national_account = NationalAccount::new();
        let outcome = subsector
            .distribute_investment(
                &OutputShareDistributor,
                &mut national_account,
                &ReturnOnCapitalCalculator::default(),
                MoneyPerEnergy(30.0),
                Money(50.0),
                1,
            )
            .unwrap();
        assert_eq!(outcome.placed, Money(30.0));
        assert_eq!(outcome.shortfall, Money(0.0));
        assert_eq!(subsector.annual_investment(1), Money(30.0));
        assert_eq!(national_account.get(AccountType::AnnualInvestment), 30.0);
    }

    #[rstest]
    fn test_distribute_investment_never_exceeds_request(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        let mut subsector = initialised(subsector, &technology_database);
        run_to_output(&mut subsector, 0, &gdp, 100.0);

        let mut national_account = NationalAccount::new();
        let outcome = subsector
            .distribute_investment(
                &OutputShareDistributor,
                &mut national_account,
                &ReturnOnCapitalCalculator::default(),
                MoneyPerEnergy(30.0),
                Money(50.0),
                0,
            )
            .unwrap();
        assert!(outcome.placed <= Money(50.0));
        assert_approx_eq!(Money, outcome.placed, Money(50.0), epsilon = 1e-9);
        assert_eq!(subsector.annual_investment(0), outcome.placed);

        assert!(
            subsector
                .distribute_investment(
                    &OutputShareDistributor,
                    &mut national_account,
                    &ReturnOnCapitalCalculator::default(),
                    MoneyPerEnergy(30.0),
                    Money(-1.0),
                    0,
                )
                .is_err()
        );
    }

    #[rstest]
    fn test_expected_profit_rate_and_capital_output_ratio(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        let mut subsector = initialised(subsector, &technology_database);
        run_to_output(&mut subsector, 0, &gdp, 100.0);

        let national_account = NationalAccount::new();
        let calculator = ReturnOnCapitalCalculator {
            share_risk_premium: 0.0,
            distribution_risk_premium: 1.0,
        };
        let price = MoneyPerEnergy(30.0);
        let share_rate = subsector
            .expected_profit_rate(
                &national_account,
                &calculator,
                price,
                ProfitRateMode::ShareCalculation,
            )
            .unwrap();
        let distribution_rate = subsector
            .expected_profit_rate(
                &national_account,
                &calculator,
                price,
                ProfitRateMode::Distribution,
            )
            .unwrap();
        assert!(share_rate > 0.0);
        assert_approx_eq!(f64, share_rate - distribution_rate, 1.0, epsilon = 1e-9);

        // Both technologies need the same capital per unit of output
        let context = ProfitContext {
            national_account: &national_account,
            calculator: &calculator,
            price,
        };
        let distributor = ProfitRateLogitDistributor { logit_exponent: 1.0 };
        assert_approx_eq!(
            f64,
            subsector.distributed_capital_output_ratio(&distributor, &context, 0),
            2.0,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_average_fuel_price(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        let mut subsector = initialised(subsector, &technology_database);
        subsector.init_calc(0).unwrap();
        assert!(subsector.average_fuel_price(0).is_err());
        subsector.calc_cost(0).unwrap();
        subsector.calc_share(0, &gdp, -3.0).unwrap();
        subsector.set_output(Energy(10.0), 1.0, 0).unwrap();

        // Fuel prices are 2 and 4
        let price = subsector.average_fuel_price(0).unwrap();
        assert!(price > MoneyPerEnergy(2.0) && price < MoneyPerEnergy(4.0));
    }

    #[rstest]
    fn test_summary_and_accessors(
        subsector: Subsector,
        technology_database: GlobalTechnologyDatabase,
        gdp: Gdp,
    ) {
        let mut subsector = initialised(subsector, &technology_database);
        run_to_output(&mut subsector, 0, &gdp, 10.0);
        finish(&mut subsector, 0);

        let summary = subsector.summary(0).unwrap();
        assert_eq!(summary.output, subsector.output(0));
        // Both technologies have an efficiency of 0.5
        assert_approx_eq!(Energy, subsector.input(0), Energy(20.0), epsilon = 1e-9);
        assert_approx_eq!(Energy, subsector.energy_input(0), Energy(20.0), epsilon = 1e-9);
        assert_eq!(subsector.fuel_consumption(0).len(), 2);
        assert!(subsector.emissions(0)["coal"] > 0.0);
        assert!(subsector.summary(1).is_none());
    }

    #[rstest]
    fn test_round_trip(subsector: Subsector, horizon: Horizon) {
        let input = subsector.to_input();
        let config = input
            .into_config(subsector.region(), subsector.sector(), &horizon)
            .unwrap();
        assert_eq!(&config, subsector.config());
    }

    #[rstest]
    fn test_technology_config_fixture(technology_config: TechnologyConfig) {
        assert_eq!(technology_config.available, 0..=3);
    }
}
