//! Calibration of share weights to observed outputs.
//!
//! Share weights can only be overwritten directly by code holding a [`ShareWeightHandle`], and
//! calibration can only be switched on or off with a [`CalibrationToken`]. Neither can be created
//! outside this module.
use crate::competition::{calibrated_share_weights, logit_term};
use crate::economy::Gdp;
use crate::period::Period;
use crate::settings::Settings;
use crate::subsector::Subsector;
use crate::technology::Technology;
use anyhow::Result;
use log::{debug, warn};

/// Permission to switch calibration on or off
#[derive(Debug)]
pub struct CalibrationToken {
    _private: (),
}

impl CalibrationToken {
    fn new() -> Self {
        Self { _private: () }
    }
}

/// Permission to overwrite share weights directly
#[derive(Debug)]
pub struct ShareWeightHandle {
    _private: (),
}

impl ShareWeightHandle {
    fn new() -> Self {
        Self { _private: () }
    }
}

/// How calibrated results are checked against their targets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationCheck {
    /// Largest acceptable relative difference between output and calibration value
    pub accuracy: f64,
    /// Whether failing to calibrate is an error
    pub required: bool,
    /// Whether to log each technology which misses its target
    pub print_warnings: bool,
}

impl From<&Settings> for CalibrationCheck {
    fn from(settings: &Settings) -> Self {
        Self {
            accuracy: settings.calibration_accuracy,
            required: settings.require_calibration,
            print_warnings: settings.print_calibration_warnings,
        }
    }
}

/// Back-solve technology share weights within one subsector.
///
/// Only done if every competitive technology has a calibration output.
fn calibrate_technologies(
    subsector: &mut Subsector,
    handle: &ShareWeightHandle,
    period: Period,
) -> Result<bool> {
    let exponent = subsector.tech_logit_exponent(period);
    let competitive: Vec<&Technology> = subsector
        .techs(period)
        .iter()
        .filter(|tech| tech.is_competitive())
        .collect();
    let Some(targets) = competitive
        .iter()
        .map(|tech| tech.calibration_output.map(|output| output.value()))
        .collect::<Option<Vec<_>>>()
    else {
        return Ok(false);
    };
    if targets.is_empty() {
        return Ok(false);
    }

    let unit_terms: Vec<_> = competitive
        .iter()
        .map(|tech| logit_term(1.0, tech.cost.value(), exponent))
        .collect();
    let Some(weights) = calibrated_share_weights(&targets, &unit_terms) else {
        warn!(
            "Cannot calibrate technology share weights in subsector {} for period {period}",
            subsector.name()
        );
        return Ok(false);
    };

    let ids: Vec<_> = competitive.iter().map(|tech| tech.id.clone()).collect();
    for (id, weight) in ids.iter().zip(weights) {
        subsector.set_tech_share_weight_direct(handle, id, period, weight)?;
    }

    Ok(true)
}

/// Calibrate share weights for one sector's subsectors in `period`.
///
/// Technology share weights are solved within each subsector first, after which subsector costs
/// are recalculated. Subsector share weights are then solved so that sibling shares reproduce the
/// subsectors' total calibration outputs, provided that every subsector competing for variable
/// demand has calibration data.
///
/// # Returns
///
/// Whether any share weights were changed.
pub fn calibrate_period(
    subsectors: &mut [Subsector],
    period: Period,
    gdp: &Gdp,
    sector_logit_exponent: f64,
) -> Result<bool> {
    let handle = ShareWeightHandle::new();
    let token = CalibrationToken::new();
    let mut changed = false;

    for subsector in subsectors.iter_mut() {
        let has_market = subsector.has_calibration_market(period);
        subsector.set_calibration(&token, has_market);
        changed |= calibrate_technologies(subsector, &handle, period)?;
        subsector.calc_cost(period)?;
    }

    let competing: Vec<usize> = (0..subsectors.len())
        .filter(|&index| !subsectors[index].all_output_fixed(period))
        .collect();
    let Some(targets) = competing
        .iter()
        .map(|&index| {
            subsectors[index]
                .total_calibration_output(period)
                .map(|output| output.value())
        })
        .collect::<Option<Vec<_>>>()
    else {
        debug!("Not every subsector has calibration data for period {period}");
        return Ok(changed);
    };
    if targets.is_empty() {
        return Ok(changed);
    }

    let unit_terms: Vec<_> = competing
        .iter()
        .map(|&index| subsectors[index].share_term(period, gdp, sector_logit_exponent, 1.0))
        .collect();
    let Some(weights) = calibrated_share_weights(&targets, &unit_terms) else {
        warn!("Cannot calibrate subsector share weights for period {period}");
        return Ok(changed);
    };
    for (&index, weight) in competing.iter().zip(weights) {
        subsectors[index].set_share_weight_direct(&handle, period, weight);
    }

    Ok(true)
}
