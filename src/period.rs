//! Code for working with model periods.
//!
//! The engine works in terms of period indices; model years are only needed at the edges (for
//! reading input and for working out vintage ages).
use crate::input::is_sorted_and_unique;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::ops::{Index, IndexMut, Range};

/// The index of a model period, starting at zero
pub type Period = usize;

/// The years simulated by the model, one per period
#[derive(Debug, Clone, PartialEq)]
pub struct Horizon {
    years: Vec<u32>,
}

impl Horizon {
    /// Create a new [`Horizon`] from the model years.
    ///
    /// Years must be non-empty, unique and in increasing order.
    pub fn new(years: Vec<u32>) -> Result<Self> {
        ensure!(!years.is_empty(), "No model years provided");
        ensure!(
            is_sorted_and_unique(&years),
            "Model years must be composed of unique values in order"
        );

        Ok(Self { years })
    }

    /// The number of periods
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Whether there are no periods (never true for a validly constructed horizon)
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// The model year for the given period
    pub fn year(&self, period: Period) -> Option<u32> {
        self.years.get(period).copied()
    }

    /// The period for the given model year
    pub fn period_of(&self, year: u32) -> Result<Period> {
        self.years
            .binary_search(&year)
            .ok()
            .with_context(|| format!("{year} is not a model year"))
    }

    /// All model years
    pub fn years(&self) -> &[u32] {
        &self.years
    }

    /// Iterate over all periods
    pub fn iter_periods(&self) -> Range<Period> {
        0..self.years.len()
    }
}

/// A value for each period of the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodVector<T>(Vec<T>);

impl<T: Clone> PeriodVector<T> {
    /// Create a vector with `len` periods, all set to `value`
    pub fn filled(len: usize, value: T) -> Self {
        Self(vec![value; len])
    }
}

impl<T> PeriodVector<T> {
    /// The number of periods covered
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no periods are covered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the value for a period, if it is in range
    pub fn get(&self, period: Period) -> Option<&T> {
        self.0.get(period)
    }

    /// The values as a slice, in period order
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Iterate over values in period order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T> From<Vec<T>> for PeriodVector<T> {
    fn from(values: Vec<T>) -> Self {
        Self(values)
    }
}

impl<T> Index<Period> for PeriodVector<T> {
    type Output = T;

    fn index(&self, period: Period) -> &T {
        &self.0[period]
    }
}

impl<T> IndexMut<Period> for PeriodVector<T> {
    fn index_mut(&mut self, period: Period) -> &mut T {
        &mut self.0[period]
    }
}
