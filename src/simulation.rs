//! Functionality for running the simulation.
use crate::calibration::CalibrationCheck;
use crate::investment::InvestmentOutcome;
use crate::model::Model;
use crate::sector::PeriodContext;
use crate::settings::Settings;
use crate::units::Money;
use anyhow::{Context, Result};
use log::{info, warn};

/// Run the simulation.
///
/// # Arguments:
///
/// * `model` - The model to run, which must have completed initialisation
/// * `settings` - Program settings
///
/// # Returns
///
/// The investment outcome for each period
pub fn run(model: &mut Model, settings: &Settings) -> Result<Vec<InvestmentOutcome>> {
    let calibration = CalibrationCheck::from(settings);
    let distributor = model.parameters.distributor();
    let calculator = model.parameters.profit_rate_calculator();

    let mut outcomes = Vec::with_capacity(model.horizon.len());
    for period in model.horizon.iter_periods() {
        let year = model.horizon.years()[period];
        info!("Model year: {year}");

        model.national_account.reset_period_accounts();
        let mut context = PeriodContext {
            gdp: &model.gdp,
            national_account: &mut model.national_account,
            distributor: distributor.as_ref(),
            calculator: &calculator,
            calibration: &calibration,
        };
        let outcome = model
            .sector
            .run_period(period, &mut context)
            .with_context(|| format!("Simulation failed in {year}"))?;

        if outcome.shortfall > Money(0.0) {
            warn!(
                "Investment of {} could not be placed in {year}",
                outcome.shortfall
            );
        }
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
