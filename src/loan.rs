use crate::error::{LoanError, Result};
use log::{debug, trace, warn};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Payment periods per year. Installments are always monthly.
pub const PERIODS_PER_YEAR: u32 = 12;

/// Longest term accepted, in years.
pub const MAX_TERM_YEARS: u32 = 100;

/// Drift in the final period's principal beyond which a warning is logged.
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// Validated input to a calculation. Fields are only reachable through
/// accessors, so a `LoanParameters` value always satisfies its constraints.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LoanParameters {
    principal: f64,
    annual_rate: f64,
    term_years: u32,
}

impl LoanParameters {
    pub fn new(principal: f64, annual_rate: f64, term_years: u32) -> Result<Self> {
        if !principal.is_finite() || principal <= 0. {
            return Err(LoanError::invalid(
                "principal",
                format!("must be a positive amount, got {}", principal),
            ));
        }
        if !(0.0..=100.0).contains(&annual_rate) {
            return Err(LoanError::invalid(
                "annual_rate",
                format!("must be between 0 and 100 percent, got {}", annual_rate),
            ));
        }
        if term_years == 0 || term_years > MAX_TERM_YEARS {
            return Err(LoanError::invalid(
                "term_years",
                format!(
                    "must be between 1 and {} years, got {}",
                    MAX_TERM_YEARS, term_years
                ),
            ));
        }
        Ok(Self {
            principal,
            annual_rate,
            term_years,
        })
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    /// Annual rate as a percentage (i.e., 8.5 for 8.5%).
    pub fn annual_rate(&self) -> f64 {
        self.annual_rate
    }

    pub fn term_years(&self) -> u32 {
        self.term_years
    }

    pub fn periods(&self) -> u32 {
        self.term_years * PERIODS_PER_YEAR
    }

    /// Monthly rate as a decimal.
    pub fn period_rate(&self) -> f64 {
        self.annual_rate / PERIODS_PER_YEAR as f64 / 100.
    }
}

impl Default for LoanParameters {
    fn default() -> Self {
        Self {
            principal: 100000.,
            annual_rate: 8.5,
            term_years: 5,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeriodEntry {
    pub period: u32,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub remaining_balance: f64,
    pub payment_amount: f64,
}

impl fmt::Display for PeriodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "period {}, payment ${:.2}, principal ${:.2}, interest ${:.2}, balance ${:.2}",
            self.period,
            self.payment_amount,
            self.principal_portion,
            self.interest_portion,
            self.remaining_balance
        )
    }
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LoanSummary {
    periodic_payment: f64,
    total_payment: f64,
    total_interest: f64,
    schedule: Vec<PeriodEntry>,
    interest_share: f64,
    principal_share: f64,
}

impl LoanSummary {
    pub fn periodic_payment(&self) -> f64 {
        self.periodic_payment
    }

    pub fn total_payment(&self) -> f64 {
        self.total_payment
    }

    pub fn total_interest(&self) -> f64 {
        self.total_interest
    }

    pub fn schedule(&self) -> &[PeriodEntry] {
        &self.schedule
    }

    /// Share of the total repaid that is interest, in [0, 1].
    pub fn interest_share(&self) -> f64 {
        self.interest_share
    }

    pub fn principal_share(&self) -> f64 {
        self.principal_share
    }

    pub fn periods(&self) -> usize {
        self.schedule.len()
    }

    /// Entry for a 1-based period number.
    pub fn entry(&self, period: usize) -> Option<&PeriodEntry> {
        period
            .checked_sub(1)
            .and_then(|index| self.schedule.get(index))
    }

    pub fn show_amortization(&self) {
        for entry in &self.schedule {
            println!("{}", entry);
        }
    }
}

/// Computes the installment, totals and full monthly schedule for a loan.
pub fn compute(params: &LoanParameters) -> Result<LoanSummary> {
    let principal = params.principal();
    let period_rate = params.period_rate();
    let periods = params.periods();

    let payment = get_pmt_amount(principal, period_rate, periods)?;
    debug!(
        "principal {}, period rate {}, periods {}, payment {}",
        principal, period_rate, periods, payment
    );

    let schedule = add_scheduled_pmts(principal, period_rate, periods, payment);

    let total_payment = payment * periods as f64;
    let total_interest = total_payment - principal;
    let interest_share = total_interest / total_payment;
    let principal_share = principal / total_payment;

    if ![total_payment, total_interest, interest_share, principal_share]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(LoanError::NumericDegenerate(format!(
            "totals for principal {} over {} periods overflow (total payment {})",
            principal, periods, total_payment
        )));
    }

    Ok(LoanSummary {
        periodic_payment: payment,
        total_payment,
        total_interest,
        schedule,
        interest_share,
        principal_share,
    })
}

fn get_pmt_amount(principal: f64, period_rate: f64, periods: u32) -> Result<f64> {
    let payment = if period_rate == 0. {
        // no interest accrues: straight-line repayment
        principal / periods as f64
    } else {
        let factor = (1. + period_rate).powi(periods as i32);
        (principal * period_rate * factor) / (factor - 1.)
    };

    if payment.is_finite() && payment > 0. {
        Ok(payment)
    } else {
        Err(LoanError::NumericDegenerate(format!(
            "installment for principal {} at period rate {} over {} periods is {}",
            principal, period_rate, periods, payment
        )))
    }
}

fn add_scheduled_pmts(
    principal: f64,
    period_rate: f64,
    periods: u32,
    payment: f64,
) -> Vec<PeriodEntry> {
    let mut schedule = Vec::with_capacity(periods as usize);
    let mut balance = principal;

    for period in 1..=periods {
        let interest = balance * period_rate;
        let principal_portion = if period == periods {
            // the last payment retires whatever balance is left
            let drift = balance - (payment - interest);
            if drift.abs() >= BALANCE_TOLERANCE {
                warn!(
                    "final period absorbs {} of drift after {} periods",
                    drift, periods
                );
            }
            balance
        } else {
            (payment - interest).max(0.).min(balance)
        };
        balance = if period == periods {
            0.
        } else {
            balance - principal_portion
        };
        trace!(
            "period {}, interest {}, principal {}, balance {}",
            period,
            interest,
            principal_portion,
            balance
        );

        schedule.push(PeriodEntry {
            period,
            principal_portion,
            interest_portion: interest,
            remaining_balance: balance,
            payment_amount: payment,
        });
    }
    schedule
}
