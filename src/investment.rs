//! Allocation of new investment across competing alternatives.
//!
//! Investment follows expected profit rates rather than current output shares. The way rates are
//! estimated ([`ExpectedProfitRateCalculator`]) and the way they are turned into an allocation
//! ([`Distributor`]) are both pluggable.
use crate::economy::{AccountType, NationalAccount};
use crate::technology::Technology;
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// Something which can receive a share of new investment
pub trait Investable {
    /// Name used in log messages
    fn investable_id(&self) -> &str;

    /// Output in the current period
    fn current_output(&self) -> Energy;

    /// Cost per unit of output in the current period
    fn unit_cost(&self) -> MoneyPerEnergy;

    /// Capital required per unit of annual output
    fn capital_output_ratio(&self) -> f64;

    /// Add investment placed in the current period
    fn place_investment(&mut self, amount: Money);

    /// Investment placed in the current period
    fn placed_investment(&self) -> Money;
}

/// Something whose state can be written back out in its input format
pub trait RoundTrippable {
    /// The input representation
    type Input: serde::Serialize;

    /// Convert the current state into its input representation
    fn to_input(&self) -> Self::Input;
}

/// What an expected profit rate is being used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfitRateMode {
    /// Comparing alternatives to work out shares
    ShareCalculation,
    /// Placing investment
    Distribution,
}

/// Estimates the profit rate an investment in an [`Investable`] is expected to earn
pub trait ExpectedProfitRateCalculator: Send + Sync {
    /// The expected profit rate, or `None` if one cannot be calculated
    fn calc_rate(
        &self,
        investable: &dyn Investable,
        national_account: &NationalAccount,
        price: MoneyPerEnergy,
        mode: ProfitRateMode,
    ) -> Option<f64>;
}

/// Expected after-tax return on capital, less a risk premium
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReturnOnCapitalCalculator {
    /// Premium subtracted when calculating shares
    pub share_risk_premium: f64,
    /// Premium subtracted when placing investment
    pub distribution_risk_premium: f64,
}

impl ExpectedProfitRateCalculator for ReturnOnCapitalCalculator {
    fn calc_rate(
        &self,
        investable: &dyn Investable,
        national_account: &NationalAccount,
        price: MoneyPerEnergy,
        mode: ProfitRateMode,
    ) -> Option<f64> {
        let capital_output_ratio = investable.capital_output_ratio();
        if !capital_output_ratio.is_finite() || capital_output_ratio <= 0.0 {
            return None;
        }

        let margin = price - investable.unit_cost();
        let tax_rate = national_account.get(AccountType::CorporateIncomeTaxRate);
        let premium = match mode {
            ProfitRateMode::ShareCalculation => self.share_risk_premium,
            ProfitRateMode::Distribution => self.distribution_risk_premium,
        };
        let rate = margin.value() / capital_output_ratio * (1.0 - tax_rate) - premium;

        rate.is_finite().then_some(rate)
    }
}

/// Everything a [`Distributor`] may need to know besides the candidates themselves
pub struct ProfitContext<'a> {
    /// National accounts of the region
    pub national_account: &'a NationalAccount,
    /// How to estimate profit rates
    pub calculator: &'a dyn ExpectedProfitRateCalculator,
    /// The market price of the output
    pub price: MoneyPerEnergy,
}

impl ProfitContext<'_> {
    /// The expected profit rate for one candidate
    pub fn rate(&self, investable: &dyn Investable, mode: ProfitRateMode) -> Option<f64> {
        self.calculator
            .calc_rate(investable, self.national_account, self.price, mode)
    }
}

/// The result of distributing investment
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InvestmentOutcome {
    /// Investment actually placed
    pub placed: Money,
    /// Requested investment which could not be placed
    pub shortfall: Money,
}

impl std::ops::AddAssign for InvestmentOutcome {
    fn add_assign(&mut self, rhs: Self) {
        self.placed += rhs.placed;
        self.shortfall += rhs.shortfall;
    }
}

/// A strategy for splitting investment between candidates
pub trait Distributor: Send + Sync {
    /// Shares of investment for each candidate, summing to one, or `None` if nothing can be placed
    fn calc_shares(
        &self,
        investables: &[&dyn Investable],
        context: &ProfitContext,
    ) -> Option<Vec<f64>>;

    /// Split `amount` between candidates.
    ///
    /// Never places more than `amount`. Whatever cannot be placed is returned as a shortfall.
    fn distribute(
        &self,
        investables: &mut [&mut dyn Investable],
        amount: Money,
        context: &ProfitContext,
    ) -> InvestmentOutcome {
        if amount <= Money(0.0) {
            return InvestmentOutcome::default();
        }

        let shares = {
            let view: Vec<&dyn Investable> = investables.iter().map(|i| &**i).collect();
            self.calc_shares(&view, context)
        };
        let Some(shares) = shares else {
            return InvestmentOutcome {
                placed: Money(0.0),
                shortfall: amount,
            };
        };

        let mut placed = Money(0.0);
        for (investable, share) in investables.iter_mut().zip(shares) {
            let allotment = amount * Dimensionless(share.max(0.0));
            investable.place_investment(allotment);
            placed += allotment;
        }
        let placed = placed.min(amount);

        InvestmentOutcome {
            placed,
            shortfall: (amount - placed).max(Money(0.0)),
        }
    }
}

/// Normalise non-negative weights to shares, or `None` if they sum to zero
fn normalise(weights: Vec<f64>) -> Option<Vec<f64>> {
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    Some(weights.into_iter().map(|w| w / total).collect())
}

/// Shares proportional to a power of each candidate's (positive) expected profit rate.
///
/// Candidates without a positive rate receive nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitRateLogitDistributor {
    /// Sensitivity of shares to differences in profit rates
    pub logit_exponent: f64,
}

impl Distributor for ProfitRateLogitDistributor {
    fn calc_shares(
        &self,
        investables: &[&dyn Investable],
        context: &ProfitContext,
    ) -> Option<Vec<f64>> {
        let weights = investables
            .iter()
            .map(|investable| {
                match context.rate(*investable, ProfitRateMode::Distribution) {
                    Some(rate) if rate > 0.0 => rate.powf(self.logit_exponent),
                    _ => 0.0,
                }
            })
            .collect();

        normalise(weights)
    }
}

/// Shares proportional to each candidate's current output
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OutputShareDistributor;

impl Distributor for OutputShareDistributor {
    fn calc_shares(
        &self,
        investables: &[&dyn Investable],
        _context: &ProfitContext,
    ) -> Option<Vec<f64>> {
        normalise(
            investables
                .iter()
                .map(|investable| investable.current_output().value().max(0.0))
                .collect(),
        )
    }
}

/// The kind of [`Distributor`] to use
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Default,
    DeserializeLabeledStringEnum,
    SerializeLabeledStringEnum,
)]
pub enum DistributorKind {
    /// See [`ProfitRateLogitDistributor`]
    #[default]
    #[string = "profit-rate-logit"]
    ProfitRateLogit,
    /// See [`OutputShareDistributor`]
    #[string = "output-share"]
    OutputShare,
}

impl Investable for Technology {
    fn investable_id(&self) -> &str {
        &self.id.0
    }

    fn current_output(&self) -> Energy {
        self.output()
    }

    fn unit_cost(&self) -> MoneyPerEnergy {
        self.cost
    }

    fn capital_output_ratio(&self) -> f64 {
        self.parameters.capital_output_ratio
    }

    fn place_investment(&mut self, amount: Money) {
        self.add_investment(amount);
    }

    fn placed_investment(&self) -> Money {
        self.investment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    /// A minimal investment candidate
    struct Candidate {
        output: Energy,
        cost: MoneyPerEnergy,
        ratio: f64,
        investment: Money,
    }

    impl Investable for Candidate {
        fn investable_id(&self) -> &str {
            "candidate"
        }
        fn current_output(&self) -> Energy {
            self.output
        }
        fn unit_cost(&self) -> MoneyPerEnergy {
            self.cost
        }
        fn capital_output_ratio(&self) -> f64 {
            self.ratio
        }
        fn place_investment(&mut self, amount: Money) {
            self.investment += amount;
        }
        fn placed_investment(&self) -> Money {
            self.investment
        }
    }

    fn candidate(output: f64, cost: f64) -> Candidate {
        Candidate {
            output: Energy(output),
            cost: MoneyPerEnergy(cost),
            ratio: 2.0,
            investment: Money(0.0),
        }
    }

    #[fixture]
    fn national_account() -> NationalAccount {
        let mut account = NationalAccount::new();
        account.set(AccountType::CorporateIncomeTaxRate, 0.5);
        account
    }

    #[rstest]
    #[case(ProfitRateMode::ShareCalculation, 2.0)]
    #[case(ProfitRateMode::Distribution, 1.5)]
    fn test_return_on_capital(
        national_account: NationalAccount,
        #[case] mode: ProfitRateMode,
        #[case] expected: f64,
    ) {
        let calculator = ReturnOnCapitalCalculator {
            share_risk_premium: 0.0,
            distribution_risk_premium: 0.5,
        };
        // (18 - 10) / 2 * (1 - 0.5) - premium
        let rate = calculator.calc_rate(
            &candidate(1.0, 10.0),
            &national_account,
            MoneyPerEnergy(18.0),
            mode,
        );
        assert_approx_eq!(f64, rate.unwrap(), expected);
    }

    #[rstest]
    fn test_return_on_capital_no_capital(national_account: NationalAccount) {
        let mut investable = candidate(1.0, 10.0);
        investable.ratio = 0.0;
        let rate = ReturnOnCapitalCalculator::default().calc_rate(
            &investable,
            &national_account,
            MoneyPerEnergy(18.0),
            ProfitRateMode::Distribution,
        );
        assert_eq!(rate, None);
    }

    #[rstest]
    fn test_profit_rate_logit_prefers_profitable(national_account: NationalAccount) {
        let calculator = ReturnOnCapitalCalculator::default();
        let context = ProfitContext {
            national_account: &national_account,
            calculator: &calculator,
            price: MoneyPerEnergy(20.0),
        };
        let mut a = candidate(1.0, 10.0);
        let mut b = candidate(1.0, 16.0);
        let mut c = candidate(1.0, 25.0);
        let mut investables: Vec<&mut dyn Investable> = vec![&mut a, &mut b, &mut c];

        let distributor = ProfitRateLogitDistributor {
            logit_exponent: 1.0,
        };
        let outcome = distributor.distribute(&mut investables, Money(70.0), &context);
        assert_approx_eq!(Money, outcome.placed, Money(70.0));
        assert_approx_eq!(Money, outcome.shortfall, Money(0.0));

        // Rates are 2.5, 1 and negative
        assert_approx_eq!(Money, a.investment, Money(50.0));
        assert_approx_eq!(Money, b.investment, Money(20.0));
        assert_eq!(c.investment, Money(0.0));
    }

    #[rstest]
    fn test_nothing_profitable_is_shortfall(national_account: NationalAccount) {
        let calculator = ReturnOnCapitalCalculator::default();
        let context = ProfitContext {
            national_account: &national_account,
            calculator: &calculator,
            price: MoneyPerEnergy(5.0),
        };
        let mut a = candidate(1.0, 10.0);
        let mut investables: Vec<&mut dyn Investable> = vec![&mut a];

        let distributor = ProfitRateLogitDistributor {
            logit_exponent: 2.0,
        };
        let outcome = distributor.distribute(&mut investables, Money(10.0), &context);
        assert_eq!(outcome.placed, Money(0.0));
        assert_eq!(outcome.shortfall, Money(10.0));
    }

    #[rstest]
    fn test_output_share_distributor(national_account: NationalAccount) {
        let calculator = ReturnOnCapitalCalculator::default();
        let context = ProfitContext {
            national_account: &national_account,
            calculator: &calculator,
            price: MoneyPerEnergy(0.0),
        };
        let mut a = candidate(3.0, 10.0);
        let mut b = candidate(1.0, 10.0);
        let mut investables: Vec<&mut dyn Investable> = vec![&mut a, &mut b];

        let outcome = OutputShareDistributor.distribute(&mut investables, Money(8.0), &context);
        assert!(outcome.placed <= Money(8.0));
        assert_approx_eq!(Money, a.investment, Money(6.0));
        assert_approx_eq!(Money, b.investment, Money(2.0));
    }

    #[rstest]
    fn test_distribute_nothing(national_account: NationalAccount) {
        let calculator = ReturnOnCapitalCalculator::default();
        let context = ProfitContext {
            national_account: &national_account,
            calculator: &calculator,
            price: MoneyPerEnergy(0.0),
        };
        let mut a = candidate(3.0, 10.0);
        let mut investables: Vec<&mut dyn Investable> = vec![&mut a];
        let outcome = OutputShareDistributor.distribute(&mut investables, Money(0.0), &context);
        assert_eq!(outcome, InvestmentOutcome::default());
        assert_eq!(a.investment, Money(0.0));
    }
}
