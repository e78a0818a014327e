//! A sector meets demand for one good by running logit competition between its subsectors.
use crate::calibration::{CalibrationCheck, calibrate_period};
use crate::competition::{Competition, LogitConvention, normalise_terms, weighted_average};
use crate::dependency::DependencyFinder;
use crate::economy::{Gdp, NationalAccount};
use crate::id::{RegionID, SectorID, SubsectorID};
use crate::investment::{
    Distributor, ExpectedProfitRateCalculator, Investable, InvestmentOutcome, ProfitContext,
};
use crate::period::{Horizon, Period, PeriodVector};
use crate::subsector::Subsector;
use crate::technology_database::GlobalTechnologyDatabase;
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use crate::visitor::SummaryCollector;
use anyhow::{Context, Result, bail, ensure};
use itertools::Itertools;
use log::{debug, info, warn};
use rayon::prelude::*;

/// The validated input for a sector
#[derive(Debug, Clone, PartialEq)]
pub struct SectorConfig {
    /// The sector's name
    pub id: SectorID,
    /// The region the sector belongs to
    pub region: RegionID,
    /// Logit exponent for competition between subsectors, as configured
    pub logit_exponent: PeriodVector<f64>,
    /// How the logit exponent is written
    pub logit_convention: LogitConvention,
    /// Demand for the sector's output
    pub demand: PeriodVector<Energy>,
    /// Market price of the sector's output
    pub price: PeriodVector<MoneyPerEnergy>,
}

/// Everything from outside the sector needed to solve one period
pub struct PeriodContext<'a> {
    /// Regional GDP
    pub gdp: &'a Gdp,
    /// Regional national accounts
    pub national_account: &'a mut NationalAccount,
    /// How new investment is split
    pub distributor: &'a dyn Distributor,
    /// How expected profit rates are estimated
    pub calculator: &'a dyn ExpectedProfitRateCalculator,
    /// How strictly calibration is checked
    pub calibration: &'a CalibrationCheck,
}

/// A sector and its subsectors
#[derive(Debug, Clone)]
pub struct Sector {
    config: SectorConfig,
    horizon: Horizon,
    logit_exponent: PeriodVector<f64>,
    subsectors: Vec<Subsector>,
}

/// Normalise the subsectors' logit terms into shares of variable demand
pub fn calc_subsector_shares(
    subsectors: &mut [Subsector],
    period: Period,
    gdp: &Gdp,
    logit_exponent: f64,
) -> Result<Competition> {
    let terms = subsectors
        .iter_mut()
        .map(|subsector| subsector.calc_share(period, gdp, logit_exponent))
        .collect::<Result<Vec<_>>>()?;

    Ok(normalise_terms(&terms))
}

impl Sector {
    /// Create a new [`Sector`], checking its input against the horizon
    pub fn new(config: SectorConfig, horizon: Horizon, subsectors: Vec<Subsector>) -> Result<Self> {
        let id = &config.id;
        for (what, len) in [
            ("Logit exponent", config.logit_exponent.len()),
            ("Demand", config.demand.len()),
            ("Price", config.price.len()),
        ] {
            ensure!(
                len == horizon.len(),
                "{what} for sector {id} must have a value for each of the {} model years",
                horizon.len()
            );
        }
        ensure!(
            config.demand.iter().all(|demand| demand.is_finite() && *demand >= Energy(0.0)),
            "Demand for sector {id} must be finite and non-negative"
        );
        ensure!(
            config.price.iter().all(|price| price.is_finite()),
            "Price for sector {id} must be finite"
        );
        if let Some(duplicate) = subsectors.iter().map(Subsector::name).duplicates().next() {
            bail!("Subsector {duplicate} is defined more than once in sector {id}");
        }

        let logit_exponent = config
            .logit_convention
            .check_exponents(&format!("sector {id}"), config.logit_exponent.as_slice())
            .into();

        Ok(Self {
            config,
            horizon,
            logit_exponent,
            subsectors,
        })
    }

    /// Complete initialisation of every subsector
    pub fn complete_init(
        &mut self,
        database: &GlobalTechnologyDatabase,
        dependencies: &mut DependencyFinder,
    ) -> Result<()> {
        for subsector in &mut self.subsectors {
            subsector
                .complete_init(database, dependencies)
                .with_context(|| format!("Failed to initialise sector {}", self.config.id))?;
        }

        Ok(())
    }

    /// The sector's name
    pub fn id(&self) -> &SectorID {
        &self.config.id
    }

    /// The region the sector belongs to
    pub fn region(&self) -> &RegionID {
        &self.config.region
    }

    /// The subsectors, in input order
    pub fn subsectors(&self) -> &[Subsector] {
        &self.subsectors
    }

    /// Look up a subsector by name
    pub fn subsector(&self, id: &str) -> Option<&Subsector> {
        self.subsectors.iter().find(|subsector| subsector.name().0.as_ref() == id)
    }

    /// Demand in a period
    pub fn demand(&self, period: Period) -> Energy {
        self.config.demand[period]
    }

    /// The effective logit exponent for competition between subsectors
    pub fn logit_exponent(&self, period: Period) -> f64 {
        self.logit_exponent[period]
    }

    /// Total output of all subsectors
    pub fn output(&self, period: Period) -> Energy {
        self.subsectors.iter().map(|subsector| subsector.output(period)).sum()
    }

    /// The validated input for the sector
    pub fn config(&self) -> &SectorConfig {
        &self.config
    }

    /// Calculate every subsector's cost in parallel
    pub fn calc_costs(&mut self, period: Period) -> Result<()> {
        self.subsectors
            .par_iter_mut()
            .try_for_each(|subsector| subsector.calc_cost(period).map(|_| ()))
    }

    /// Solve one period: create technologies, calibrate, compete, set output and invest.
    ///
    /// Fixed output is met first, scaled down if it exceeds demand. The remaining variable
    /// demand is split between subsectors by logit shares.
    pub fn run_period(
        &mut self,
        period: Period,
        context: &mut PeriodContext,
    ) -> Result<InvestmentOutcome> {
        let id = self.config.id.clone();
        let year = self
            .horizon
            .year(period)
            .with_context(|| format!("Period {period} is outside the model horizon"))?;
        let exponent = self.logit_exponent[period];

        for subsector in &mut self.subsectors {
            subsector.init_calc(period)?;
        }

        if self
            .subsectors
            .iter()
            .any(|subsector| subsector.has_calibration_market(period))
        {
            calibrate_period(&mut self.subsectors, period, context.gdp, exponent)
                .with_context(|| format!("Calibration failed for sector {id}"))?;
        }
        self.calc_costs(period)?;

        let competition =
            calc_subsector_shares(&mut self.subsectors, period, context.gdp, exponent)?;
        let demand = self.config.demand[period];
        let total_fixed: Energy = self
            .subsectors
            .iter()
            .map(|subsector| subsector.fixed_output(period))
            .sum();
        let fixed_output_scale = if total_fixed > Energy(0.0) {
            (demand / total_fixed).0.min(1.0)
        } else {
            1.0
        };
        let variable_demand =
            (demand - total_fixed * Dimensionless(fixed_output_scale)).max(Energy(0.0));
        if competition.is_degenerate() && variable_demand > Energy(0.0) {
            warn!(
                "No subsector of sector {id} can compete for variable demand of {variable_demand} \
                in {year}"
            );
        }
        if fixed_output_scale < 1.0 {
            debug!("Fixed output in sector {id} scaled by {fixed_output_scale} in {year}");
        }

        let shares = competition.into_shares(self.subsectors.len());
        for (subsector, share) in self.subsectors.iter_mut().zip(shares) {
            subsector.set_output(
                variable_demand * Dimensionless(share),
                fixed_output_scale,
                period,
            )?;
        }

        let outcome = self.invest(period, context)?;

        for subsector in &mut self.subsectors {
            subsector.operate(period)?;
        }
        self.check_calibration(period, context.calibration)?;
        for subsector in &mut self.subsectors {
            subsector.post_calc(period)?;
        }

        let mut collector = SummaryCollector::default();
        for subsector in &self.subsectors {
            subsector.accept(&mut collector, period);
        }
        collector.log(year);
        info!(
            "Sector {id} produced {} against demand of {demand} in {year}",
            self.output(period)
        );

        Ok(outcome)
    }

    /// Split investment for the period between subsectors, and within them between technologies
    fn invest(&mut self, period: Period, context: &mut PeriodContext) -> Result<InvestmentOutcome> {
        let price = self.config.price[period];
        let (new_investment, shares) = {
            let profit_context = ProfitContext {
                national_account: &*context.national_account,
                calculator: context.calculator,
                price,
            };
            let new_investment =
                self.required_investment(period, &profit_context, context.distributor);
            let candidates: Vec<&dyn Investable> = self
                .subsectors
                .iter()
                .map(|subsector| subsector as &dyn Investable)
                .collect();
            let shares = context
                .distributor
                .calc_shares(&candidates, &profit_context)
                .unwrap_or_else(|| {
                    let outputs: Vec<f64> = self
                        .subsectors
                        .iter()
                        .map(|subsector| subsector.output(period).value())
                        .collect();
                    let total: f64 = outputs.iter().sum();
                    if total > 0.0 {
                        outputs.into_iter().map(|output| output / total).collect()
                    } else {
                        vec![0.0; outputs.len()]
                    }
                });

            (new_investment, shares)
        };

        let mut outcome = InvestmentOutcome::default();
        for (subsector, share) in self.subsectors.iter_mut().zip(shares) {
            outcome += subsector.distribute_investment(
                context.distributor,
                context.national_account,
                context.calculator,
                price,
                new_investment * Dimensionless(share),
                period,
            )?;
        }
        debug!(
            "Placed {} of {new_investment} investment required by sector {} in period {period}",
            outcome.placed, self.config.id
        );

        Ok(outcome)
    }

    /// Investment needed to meet growth in demand, which for the first period is all of demand
    fn required_investment(
        &self,
        period: Period,
        context: &ProfitContext,
        distributor: &dyn Distributor,
    ) -> Money {
        let growth = match period.checked_sub(1) {
            None => self.config.demand[period],
            Some(previous) => {
                (self.config.demand[period] - self.config.demand[previous]).max(Energy(0.0))
            }
        };

        let (ratios, outputs): (Vec<f64>, Vec<f64>) = self
            .subsectors
            .iter()
            .map(|subsector| {
                (
                    subsector.distributed_capital_output_ratio(distributor, context, period),
                    subsector.output(period).value(),
                )
            })
            .unzip();

        Money(growth.value() * weighted_average(&ratios, &outputs))
    }

    /// Check calibrated subsectors against their targets
    fn check_calibration(&self, period: Period, check: &CalibrationCheck) -> Result<()> {
        let calibrating: Vec<_> = self
            .subsectors
            .iter()
            .filter(|subsector| {
                subsector.is_calibrating() && subsector.get_calibration_status(period)
            })
            .collect();
        if calibrating.is_empty() {
            return Ok(());
        }

        let failed: Vec<&SubsectorID> = calibrating
            .into_iter()
            .filter(|subsector| {
                !subsector.is_all_calibrated(period, check.accuracy, check.print_warnings)
            })
            .map(Subsector::name)
            .collect();
        if failed.is_empty() {
            return Ok(());
        }

        ensure!(
            !check.required,
            "Calibration failed for sector {} in period {period}: subsectors {} are not calibrated",
            self.config.id,
            failed.iter().join(", ")
        );
        warn!(
            "Calibration not achieved for sector {} in period {period}",
            self.config.id
        );

        Ok(())
    }
}
