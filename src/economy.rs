//! Economic context supplied to subsectors on each call: GDP, population and national accounts.
//!
//! Subsectors only read these, with the exception of [`NationalAccount`], which is updated when
//! investment is distributed.
use crate::period::{Period, PeriodVector};
use crate::units::Money;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use strum::IntoEnumIterator;

/// Population by period
#[derive(Debug, Clone, PartialEq)]
pub struct Demographic {
    population: PeriodVector<f64>,
}

impl Demographic {
    /// Create a new [`Demographic`], checking that population is always positive
    pub fn new(population: PeriodVector<f64>) -> Result<Self> {
        ensure!(
            population.iter().all(|p| p.is_finite() && *p > 0.0),
            "Population must be a finite number greater than zero in every period"
        );

        Ok(Self { population })
    }

    /// Total population in the given period
    pub fn total(&self, period: Period) -> f64 {
        self.population[period]
    }

    /// The number of periods covered
    pub fn len(&self) -> usize {
        self.population.len()
    }

    /// Whether no periods are covered
    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }
}

/// Gross domestic product by period
#[derive(Debug, Clone, PartialEq)]
pub struct Gdp {
    gdp: PeriodVector<Money>,
    per_capita: PeriodVector<f64>,
}

impl Gdp {
    /// Create a new [`Gdp`] from GDP in each period and the population
    pub fn new(gdp: PeriodVector<Money>, demographic: &Demographic) -> Result<Self> {
        ensure!(
            gdp.len() == demographic.len(),
            "GDP and population must cover the same periods"
        );
        ensure!(
            gdp.iter().all(|g| g.is_finite() && *g > Money(0.0)),
            "GDP must be a finite number greater than zero in every period"
        );

        let per_capita = gdp
            .iter()
            .enumerate()
            .map(|(period, gdp)| gdp.value() / demographic.total(period))
            .collect::<Vec<_>>()
            .into();

        Ok(Self { gdp, per_capita })
    }

    /// GDP in the given period
    pub fn gdp(&self, period: Period) -> Money {
        self.gdp[period]
    }

    /// GDP per capita in the given period
    pub fn gdp_per_capita(&self, period: Period) -> f64 {
        self.per_capita[period]
    }

    /// GDP per capita relative to the first period
    pub fn scaled_gdp_per_capita(&self, period: Period) -> f64 {
        self.per_capita[period] / self.per_capita[0]
    }
}

/// The accounts kept in a [`NationalAccount`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum AccountType {
    /// Investment made in the current period
    #[strum(serialize = "annual-investment")]
    AnnualInvestment,
    /// Tax rate applied to corporate profits
    #[strum(serialize = "corporate-income-tax-rate")]
    CorporateIncomeTaxRate,
}

/// National-account bookkeeping for a region
#[derive(Debug, Clone, PartialEq)]
pub struct NationalAccount {
    accounts: IndexMap<AccountType, f64>,
}

impl Default for NationalAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl NationalAccount {
    /// Create a national account with every account set to zero
    pub fn new() -> Self {
        Self {
            accounts: AccountType::iter().map(|account| (account, 0.0)).collect(),
        }
    }

    /// The value of an account
    pub fn get(&self, account: AccountType) -> f64 {
        self.accounts[&account]
    }

    /// Set the value of an account
    pub fn set(&mut self, account: AccountType, value: f64) {
        self.accounts.insert(account, value);
    }

    /// Add to the value of an account
    pub fn add_to(&mut self, account: AccountType, value: f64) {
        *self.accounts.entry(account).or_insert(0.0) += value;
    }

    /// Reset the per-period accounts at the start of a new period
    pub fn reset_period_accounts(&mut self) {
        self.set(AccountType::AnnualInvestment, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_gdp_per_capita() {
        let demographic = Demographic::new(vec![10.0, 20.0].into()).unwrap();
        let gdp = Gdp::new(vec![Money(100.0), Money(300.0)].into(), &demographic).unwrap();
        assert_approx_eq!(f64, gdp.gdp_per_capita(1), 15.0);
        assert_approx_eq!(f64, gdp.scaled_gdp_per_capita(0), 1.0);
        assert_approx_eq!(f64, gdp.scaled_gdp_per_capita(1), 1.5);
    }

    #[test]
    fn test_gdp_mismatched_periods() {
        let demographic = Demographic::new(vec![10.0].into()).unwrap();
        assert!(Gdp::new(vec![Money(1.0), Money(2.0)].into(), &demographic).is_err());
    }

    #[test]
    fn test_demographic_non_positive() {
        assert!(Demographic::new(vec![1.0, 0.0].into()).is_err());
    }

    #[test]
    fn test_national_account() {
        let mut account = NationalAccount::new();
        assert_eq!(account.get(AccountType::AnnualInvestment), 0.0);
        account.add_to(AccountType::AnnualInvestment, 2.0);
        account.add_to(AccountType::AnnualInvestment, 3.0);
        account.set(AccountType::CorporateIncomeTaxRate, 0.3);
        assert_eq!(account.get(AccountType::AnnualInvestment), 5.0);

        account.reset_period_accounts();
        assert_eq!(account.get(AccountType::AnnualInvestment), 0.0);
        assert_eq!(account.get(AccountType::CorporateIncomeTaxRate), 0.3);
    }
}
