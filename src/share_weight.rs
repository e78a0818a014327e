//! Share-weight series and their interpolation.
//!
//! A subsector keeps the share weights parsed from its input alongside the effective weights used
//! in competition. Each period, interpolation rules turn the parsed series (and any values fixed
//! by calibration in earlier periods) into an effective weight. The same is done for the share
//! weights of each technology, keyed by technology name.
use crate::calibration::{CalibrationToken, ShareWeightHandle};
use crate::id::TechnologyID;
use crate::interpolation::InterpolationRule;
use crate::period::{Horizon, Period, PeriodVector};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::debug;

/// The weight used for the first period when none is given
pub const DEFAULT_SHARE_WEIGHT: f64 = 1.0;

/// One share-weight time series together with the rules that fill it in
#[derive(Debug, Clone, PartialEq)]
pub struct ShareWeightSeries {
    parsed: PeriodVector<Option<f64>>,
    effective: PeriodVector<f64>,
    rules: Vec<InterpolationRule>,
}

impl ShareWeightSeries {
    /// Create a new series, checking the parsed values and rules against each other.
    ///
    /// # Arguments
    ///
    /// * `context` - Description of the owner of the series, for error messages
    /// * `parsed` - Share weights given in the input
    /// * `rules` - Interpolation rules, in input order
    pub fn new(
        context: &str,
        parsed: PeriodVector<Option<f64>>,
        rules: Vec<InterpolationRule>,
    ) -> Result<Self> {
        for (period, value) in parsed.iter().enumerate() {
            if let Some(value) = value {
                ensure!(
                    value.is_finite() && *value >= 0.0,
                    "Share weight for {context} in period {period} must be finite and \
                    non-negative (got {value})"
                );
            }
        }

        for rule in &rules {
            rule.validate()
                .with_context(|| format!("Invalid interpolation rule for {context}"))?;
            ensure!(
                rule.to_period < parsed.len(),
                "Interpolation rule for {context} ends in period {}, which is outside the model \
                horizon",
                rule.to_period
            );
            ensure!(
                rule.to_value.is_some() || parsed[rule.to_period].is_some(),
                "Interpolation rule for {context} ending in period {} has no end value and no \
                share weight is given for that period",
                rule.to_period
            );
        }

        // Seed the effective series so that every period has a value before it is interpolated
        let mut previous = DEFAULT_SHARE_WEIGHT;
        let effective = parsed
            .iter()
            .map(|value| {
                previous = value.unwrap_or(previous);
                previous
            })
            .collect::<Vec<_>>()
            .into();

        Ok(Self {
            parsed,
            effective,
            rules,
        })
    }

    /// The parsed share weights
    pub fn parsed(&self) -> &PeriodVector<Option<f64>> {
        &self.parsed
    }

    /// The interpolation rules, in input order
    pub fn rules(&self) -> &[InterpolationRule] {
        &self.rules
    }

    /// The effective share weight for a period
    pub fn get(&self, period: Period) -> f64 {
        self.effective[period]
    }

    /// Overwrite the effective share weight for a period
    fn set(&mut self, period: Period, value: f64) {
        self.effective[period] = value;
    }

    /// Compute and store the effective share weight for a period.
    ///
    /// The last rule covering the period wins. Without a covering rule, the parsed value is used,
    /// falling back to the previous period's effective weight.
    pub fn interpolate(&mut self, horizon: &Horizon, period: Period) -> Result<f64> {
        let has_parsed = self.parsed[period].is_some();
        let rule = self
            .rules
            .iter()
            .rev()
            .find(|rule| rule.applies_to(period, has_parsed));

        let value = match rule {
            Some(rule) => {
                let from_value = rule.from_value.unwrap_or(self.effective[rule.from_period]);
                let to_value = rule
                    .to_value
                    .or(self.parsed[rule.to_period])
                    .context("Interpolation rule has no end value")?;
                rule.value_at(horizon, period, from_value, to_value)?
            }
            None => match (self.parsed[period], period.checked_sub(1)) {
                (Some(value), _) => value,
                (None, Some(previous)) => self.effective[previous],
                (None, None) => DEFAULT_SHARE_WEIGHT,
            },
        };
        self.effective[period] = value;

        Ok(value)
    }
}

/// Produces the effective share weights for a subsector and its technologies
#[derive(Debug, Clone, PartialEq)]
pub struct ShareWeightCalibrator {
    subsector: ShareWeightSeries,
    technologies: IndexMap<TechnologyID, ShareWeightSeries>,
    calibrating: bool,
}

impl ShareWeightCalibrator {
    /// Create a calibrator for a subsector's own share weights
    pub fn new(series: ShareWeightSeries) -> Self {
        Self {
            subsector: series,
            technologies: IndexMap::new(),
            calibrating: false,
        }
    }

    /// Add the share-weight series for a technology
    pub fn add_technology(&mut self, id: TechnologyID, series: ShareWeightSeries) -> Result<()> {
        ensure!(
            !self.technologies.contains_key(&id),
            "Share weights for technology {id} were given more than once"
        );
        self.technologies.insert(id, series);

        Ok(())
    }

    /// The subsector's own share-weight series
    pub fn series(&self) -> &ShareWeightSeries {
        &self.subsector
    }

    /// The share-weight series for a technology, if it has one
    pub fn tech_series(&self, id: &str) -> Option<&ShareWeightSeries> {
        self.technologies.get(id)
    }

    /// Apply interpolation rules to produce the subsector's share weight for `period`.
    ///
    /// Calling this repeatedly for the same period gives the same result.
    pub fn interpolate_share_weights(&mut self, horizon: &Horizon, period: Period) -> Result<f64> {
        self.subsector
            .interpolate(horizon, period)
            .context("Failed to interpolate subsector share weights")
    }

    /// Interpolate the share weight of every technology for `period`, then scale them so that the
    /// largest is one.
    ///
    /// Scaling does not change technology shares, which depend only on the weights' ratios.
    pub fn normalize_tech_share_weights(
        &mut self,
        horizon: &Horizon,
        period: Period,
    ) -> Result<()> {
        for (id, series) in &mut self.technologies {
            series
                .interpolate(horizon, period)
                .with_context(|| format!("Failed to interpolate share weights for {id}"))?;
        }

        let max = self
            .technologies
            .values()
            .map(|series| series.get(period))
            .fold(0.0, f64::max);
        if max > 0.0 {
            for series in self.technologies.values_mut() {
                let value = series.get(period);
                series.set(period, value / max);
            }
        }

        Ok(())
    }

    /// The effective share weight of the subsector
    pub fn share_weight(&self, period: Period) -> f64 {
        self.subsector.get(period)
    }

    /// The effective share weight of a technology, or the default weight if it has no series
    pub fn tech_share_weight(&self, id: &str, period: Period) -> f64 {
        self.technologies
            .get(id)
            .map_or(DEFAULT_SHARE_WEIGHT, |series| series.get(period))
    }

    /// Multiply the subsector's share weight for a period by `scale`
    pub fn scale_share_weight(&mut self, scale: f64, period: Period) -> Result<()> {
        ensure!(
            scale.is_finite() && scale >= 0.0,
            "Share-weight scale factor must be finite and non-negative (got {scale})"
        );
        let value = self.subsector.get(period) * scale;
        self.subsector.set(period, value);

        Ok(())
    }

    /// Set the subsector's share weight for a period, bypassing interpolation
    pub fn set_share_weight_direct(
        &mut self,
        _handle: &ShareWeightHandle,
        period: Period,
        value: f64,
    ) {
        debug!("Share weight for period {period} set directly to {value}");
        self.subsector.set(period, value);
    }

    /// Set a technology's share weight for a period, bypassing interpolation
    pub fn set_tech_share_weight_direct(
        &mut self,
        _handle: &ShareWeightHandle,
        id: &TechnologyID,
        period: Period,
        value: f64,
    ) -> Result<()> {
        let series = self
            .technologies
            .get_mut(id)
            .with_context(|| format!("Technology {id} has no share-weight series"))?;
        series.set(period, value);

        Ok(())
    }

    /// Turn calibration on or off for the subsector
    pub fn set_calibration(&mut self, _token: &CalibrationToken, calibrating: bool) {
        self.calibrating = calibrating;
    }

    /// Whether calibration is switched on
    pub fn is_calibrating(&self) -> bool {
        self.calibrating
    }
}
