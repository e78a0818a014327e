//! Interpolation rules describe how a share-weight value moves between two anchor periods.
//!
//! A rule covers an inclusive range of periods. Within that range the value follows a transition
//! function evaluated over model years, so that unevenly spaced periods are handled correctly.
use crate::period::{Horizon, Period};
use anyhow::{Context, Result, ensure};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// The default steepness of an S-curve transition
pub const DEFAULT_STEEPNESS: f64 = 10.0;

/// The shape of the transition between the two anchor values of a rule
#[derive(
    Debug, Clone, Copy, PartialEq, DeserializeLabeledStringEnum, SerializeLabeledStringEnum,
)]
pub enum InterpolationFunction {
    /// Hold the starting value constant over the whole range
    #[string = "fixed"]
    Fixed,
    /// Straight line between the two anchors
    #[string = "linear"]
    Linear,
    /// Logistic curve which converges on the end value, passing exactly through both anchors
    #[string = "s-curve"]
    SCurve,
}

/// Whether a rule may replace values which were given explicitly in the input
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Default,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum OverwritePolicy {
    /// Replace every value in range
    #[default]
    #[string = "always"]
    Always,
    /// Only fill in periods which have no parsed value
    #[string = "never"]
    Never,
}

/// A transition rule for a share-weight series
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationRule {
    /// First period covered by the rule
    pub from_period: Period,
    /// Last period covered by the rule
    pub to_period: Period,
    /// Starting value. If absent, the effective value at `from_period` is used.
    pub from_value: Option<f64>,
    /// End value. If absent, the parsed value at `to_period` is used.
    pub to_value: Option<f64>,
    /// The transition function
    pub function: InterpolationFunction,
    /// Steepness parameter (only used by [`InterpolationFunction::SCurve`])
    pub steepness: f64,
    /// Whether explicitly parsed values may be replaced
    pub overwrite: OverwritePolicy,
}

impl InterpolationRule {
    /// Create a new [`InterpolationRule`], checking that it is well formed
    pub fn new(
        from_period: Period,
        to_period: Period,
        from_value: Option<f64>,
        to_value: Option<f64>,
        function: InterpolationFunction,
    ) -> Result<Self> {
        let rule = Self {
            from_period,
            to_period,
            from_value,
            to_value,
            function,
            steepness: DEFAULT_STEEPNESS,
            overwrite: OverwritePolicy::default(),
        };
        rule.validate()?;

        Ok(rule)
    }

    /// Check that the rule's range and values are valid
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.from_period <= self.to_period,
            "Interpolation rule range is malformed: start period {} is after end period {}",
            self.from_period,
            self.to_period
        );
        for value in self.from_value.iter().chain(self.to_value.iter()) {
            ensure!(
                value.is_finite() && *value >= 0.0,
                "Interpolation rule values must be finite and non-negative (got {value})"
            );
        }
        ensure!(
            self.steepness.is_finite() && self.steepness > 0.0,
            "S-curve steepness must be a finite number greater than zero"
        );

        Ok(())
    }

    /// Whether the rule's range includes the given period
    pub fn covers(&self, period: Period) -> bool {
        (self.from_period..=self.to_period).contains(&period)
    }

    /// Whether the rule should set the value for `period`, given whether a parsed value exists
    pub fn applies_to(&self, period: Period, has_parsed_value: bool) -> bool {
        self.covers(period)
            && (self.overwrite == OverwritePolicy::Always || !has_parsed_value)
    }

    /// Evaluate the rule at `period` using the resolved anchor values
    pub fn value_at(
        &self,
        horizon: &Horizon,
        period: Period,
        from_value: f64,
        to_value: f64,
    ) -> Result<f64> {
        let year = |period| {
            horizon
                .year(period)
                .map(f64::from)
                .with_context(|| format!("Period {period} is outside the model horizon"))
        };

        Ok(interpolate(
            self.function,
            self.steepness,
            (year(self.from_period)?, from_value),
            (year(self.to_period)?, to_value),
            year(period)?,
        ))
    }
}

/// Evaluate a transition function between two anchor points.
///
/// # Arguments
///
/// * `function` - The transition function
/// * `steepness` - Steepness of the S-curve (ignored by other functions)
/// * `start` - The (x, y) coordinates of the first anchor
/// * `end` - The (x, y) coordinates of the second anchor
/// * `x` - The point at which to evaluate
#[allow(clippy::float_cmp)]
pub fn interpolate(
    function: InterpolationFunction,
    steepness: f64,
    start: (f64, f64),
    end: (f64, f64),
    x: f64,
) -> f64 {
    let (x0, y0) = start;
    let (x1, y1) = end;

    // Degenerate range: the rule sets a single point
    if x1 == x0 && function != InterpolationFunction::Fixed {
        return y1;
    }

    let t = (x - x0) / (x1 - x0);
    match function {
        InterpolationFunction::Fixed => y0,
        InterpolationFunction::Linear => y0 + (y1 - y0) * t,
        InterpolationFunction::SCurve => {
            let logistic = |t: f64| 1.0 / (1.0 + (-steepness * (t - 0.5)).exp());
            let lo = logistic(0.0);
            let hi = logistic(1.0);
            y0 + (y1 - y0) * (logistic(t) - lo) / (hi - lo)
        }
    }
}

/// Fill a value for every model year from sparse `(year, value)` anchors.
///
/// Values between anchors are linearly interpolated; values outside the anchored range take the
/// value of the nearest anchor. Anchors must be sorted by year and there must be at least one.
pub fn fill_series(anchors: &[(u32, f64)], years: &[u32]) -> Vec<f64> {
    years
        .iter()
        .map(|&year| {
            let idx = anchors.partition_point(|(y, _)| *y < year);
            match (idx.checked_sub(1).map(|i| anchors[i]), anchors.get(idx)) {
                (_, Some(&(y, value))) if y == year => value,
                (Some((y0, v0)), Some(&(y1, v1))) => interpolate(
                    InterpolationFunction::Linear,
                    DEFAULT_STEEPNESS,
                    (f64::from(y0), v0),
                    (f64::from(y1), v1),
                    f64::from(year),
                ),
                (None, Some(&(_, value))) | (Some((_, value)), None) => value,
                (None, None) => f64::NAN,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[test]
    fn test_linear_ramp_midpoint_is_exact() {
        let value = interpolate(
            InterpolationFunction::Linear,
            DEFAULT_STEEPNESS,
            (0.0, 1.0),
            (10.0, 0.0),
            5.0,
        );
        assert_eq!(value, 0.5);
    }

    #[rstest]
    #[case(InterpolationFunction::Fixed, 0.0, 2.0)]
    #[case(InterpolationFunction::Fixed, 7.0, 2.0)]
    #[case(InterpolationFunction::Linear, 0.0, 2.0)]
    #[case(InterpolationFunction::Linear, 10.0, 4.0)]
    #[case(InterpolationFunction::SCurve, 0.0, 2.0)]
    #[case(InterpolationFunction::SCurve, 5.0, 3.0)]
    #[case(InterpolationFunction::SCurve, 10.0, 4.0)]
    fn test_interpolate(
        #[case] function: InterpolationFunction,
        #[case] x: f64,
        #[case] expected: f64,
    ) {
        let value = interpolate(function, DEFAULT_STEEPNESS, (0.0, 2.0), (10.0, 4.0), x);
        assert_approx_eq!(f64, value, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_s_curve_is_slow_at_the_edges() {
        let s_curve = interpolate(
            InterpolationFunction::SCurve,
            DEFAULT_STEEPNESS,
            (0.0, 0.0),
            (10.0, 1.0),
            1.0,
        );
        assert!(s_curve < 0.1);
    }

    #[test]
    fn test_rule_new_malformed_range() {
        assert_error!(
            InterpolationRule::new(3, 1, None, Some(1.0), InterpolationFunction::Linear),
            "Interpolation rule range is malformed: start period 3 is after end period 1"
        );
    }

    #[test]
    fn test_rule_new_negative_value() {
        assert!(
            InterpolationRule::new(0, 1, Some(-1.0), None, InterpolationFunction::Linear).is_err()
        );
    }

    #[test]
    fn test_rule_applies_to() {
        let mut rule =
            InterpolationRule::new(1, 3, None, Some(1.0), InterpolationFunction::Linear).unwrap();
        assert!(!rule.applies_to(0, false));
        assert!(rule.applies_to(1, true));
        assert!(rule.applies_to(3, false));
        assert!(!rule.applies_to(4, false));

        rule.overwrite = OverwritePolicy::Never;
        assert!(!rule.applies_to(2, true));
        assert!(rule.applies_to(2, false));
    }

    #[test]
    fn test_rule_value_at_uses_years() {
        // Unevenly spaced periods
        let horizon = Horizon::new(vec![2000, 2005, 2020]).unwrap();
        let rule =
            InterpolationRule::new(0, 2, None, None, InterpolationFunction::Linear).unwrap();
        let value = rule.value_at(&horizon, 1, 0.0, 2.0).unwrap();
        assert_approx_eq!(f64, value, 0.5);
    }

    #[rstest]
    #[case(&[(2010, 1.0)], &[2005, 2010, 2015], &[1.0, 1.0, 1.0])]
    #[case(&[(2005, 1.0), (2015, 3.0)], &[2005, 2010, 2015], &[1.0, 2.0, 3.0])]
    #[case(&[(2010, 1.0), (2020, 3.0)], &[2005, 2015, 2025], &[1.0, 2.0, 3.0])]
    fn test_fill_series(
        #[case] anchors: &[(u32, f64)],
        #[case] years: &[u32],
        #[case] expected: &[f64],
    ) {
        assert_eq!(fill_series(anchors, years), expected);
    }
}
