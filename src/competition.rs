//! Logit discrete-choice maths shared by subsector-level and technology-level competition.
//!
//! The share of alternative `i` is proportional to `w_i * c_i^e`, where `w_i` is its share weight,
//! `c_i` its cost and `e` the logit exponent. With the conventional negative exponent, cheaper
//! alternatives win more of the market.
use anyhow::{Result, ensure};
use log::warn;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// How logit exponents are written in the input
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Default,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum LogitConvention {
    /// Exponents are used as given and are expected to be negative
    #[default]
    #[string = "negative"]
    Negative,
    /// Exponents are magnitudes and are negated before use
    #[string = "positive"]
    Positive,
}

impl LogitConvention {
    /// The exponent to use in the logit formula for a configured value
    pub fn effective_exponent(self, exponent: f64) -> f64 {
        match self {
            Self::Negative => exponent,
            Self::Positive => -exponent,
        }
    }

    /// Whether the configured exponent has the opposite sign to that expected.
    ///
    /// Such an exponent makes more expensive alternatives more attractive.
    pub fn is_divergent(self, exponent: f64) -> bool {
        match self {
            Self::Negative => exponent > 0.0,
            Self::Positive => exponent < 0.0,
        }
    }

    /// Convert configured exponents, logging any whose sign disagrees with the convention
    pub fn check_exponents(self, context: &str, exponents: &[f64]) -> Vec<f64> {
        exponents
            .iter()
            .enumerate()
            .map(|(period, &exponent)| {
                if self.is_divergent(exponent) {
                    warn!(
                        "Logit exponent {exponent} for {context} in period {period} has the \
                        opposite sign to the {:?} convention: more expensive options will \
                        gain share",
                        self
                    );
                }
                self.effective_exponent(exponent)
            })
            .collect()
    }
}

/// The result of normalising logit terms into shares
#[derive(Debug, Clone, PartialEq)]
pub enum Competition {
    /// Shares for each alternative, summing to one
    Shares(Vec<f64>),
    /// The terms summed to zero, so no shares can be assigned
    Degenerate,
}

impl Competition {
    /// Whether no shares could be assigned
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Self::Degenerate)
    }

    /// The shares, with every alternative given zero if competition was degenerate
    pub fn into_shares(self, len: usize) -> Vec<f64> {
        match self {
            Self::Shares(shares) => shares,
            Self::Degenerate => vec![0.0; len],
        }
    }
}

/// The unnormalised logit term for one alternative.
///
/// A zero weight always gives a zero term, even for a zero cost. A zero cost with a negative
/// exponent gives an infinite term.
#[allow(clippy::float_cmp)]
pub fn logit_term(weight: f64, cost: f64, exponent: f64) -> f64 {
    if weight == 0.0 {
        return 0.0;
    }

    weight * cost.powf(exponent)
}

/// Normalise logit terms into shares.
///
/// If any terms are infinite, they split the whole market equally between them.
pub fn normalise_terms(terms: &[f64]) -> Competition {
    let infinite = terms.iter().filter(|term| term.is_infinite()).count();
    if infinite > 0 {
        let share = 1.0 / infinite as f64;
        return Competition::Shares(
            terms
                .iter()
                .map(|term| if term.is_infinite() { share } else { 0.0 })
                .collect(),
        );
    }

    let total: f64 = terms.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return Competition::Degenerate;
    }

    Competition::Shares(terms.iter().map(|term| term / total).collect())
}

/// Logit shares for alternatives with the given weights and costs
pub fn logit_shares(weights: &[f64], costs: &[f64], exponent: f64) -> Competition {
    let terms: Vec<_> = weights
        .iter()
        .zip(costs)
        .map(|(&weight, &cost)| logit_term(weight, cost, exponent))
        .collect();

    normalise_terms(&terms)
}

/// The logit-consistent cost index of a set of alternatives.
///
/// This is the weighted power mean `(sum(w_i * c_i^e))^(1/e)` with weights normalised to sum to
/// one, or the weighted geometric mean when `e == 0`. Alternatives with zero weight are ignored;
/// if every weight is zero, all alternatives count equally. Returns zero for no alternatives.
#[allow(clippy::float_cmp)]
pub fn logit_cost_index(weights: &[f64], costs: &[f64], exponent: f64) -> f64 {
    let mut pairs: Vec<(f64, f64)> = weights
        .iter()
        .zip(costs)
        .filter(|(weight, _)| **weight > 0.0)
        .map(|(&weight, &cost)| (weight, cost))
        .collect();
    if pairs.is_empty() {
        pairs = costs.iter().map(|&cost| (1.0, cost)).collect();
    }
    if pairs.is_empty() {
        return 0.0;
    }

    let total_weight: f64 = pairs.iter().map(|(weight, _)| weight).sum();
    if exponent == 0.0 {
        let log_mean: f64 = pairs
            .iter()
            .map(|(weight, cost)| weight / total_weight * cost.ln())
            .sum();
        return log_mean.exp();
    }

    let mean: f64 = pairs
        .iter()
        .map(|(weight, cost)| weight / total_weight * cost.powf(exponent))
        .sum();
    mean.powf(1.0 / exponent)
}

/// Back-solve share weights so that logit shares reproduce the target quantities exactly.
///
/// `unit_terms` are the logit terms each alternative would have with a share weight of one. The
/// resulting weights are scaled so that the largest is one.
///
/// # Returns
///
/// The weights, or `None` if the targets are all zero or a unit term is zero or non-finite.
pub fn calibrated_share_weights(targets: &[f64], unit_terms: &[f64]) -> Option<Vec<f64>> {
    if unit_terms
        .iter()
        .any(|term| !term.is_finite() || *term <= 0.0)
    {
        return None;
    }

    let raw: Vec<_> = targets
        .iter()
        .zip(unit_terms)
        .map(|(target, term)| target / term)
        .collect();
    let max = raw.iter().copied().fold(0.0, f64::max);
    if !max.is_finite() || max <= 0.0 {
        return None;
    }

    Some(raw.into_iter().map(|weight| weight / max).collect())
}

/// The average of `values` weighted by `weights`, or zero if the weights sum to zero
pub fn weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / total
}

/// Check that every cost is finite and non-negative
pub fn check_costs(context: &str, costs: &[f64]) -> Result<()> {
    for (period, cost) in costs.iter().enumerate() {
        ensure!(
            cost.is_finite() && *cost >= 0.0,
            "Cost for {context} in period {period} must be finite and non-negative (got {cost})"
        );
    }

    Ok(())
}
