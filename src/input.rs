//! Validation of raw form input into [`LoanParameters`].
//!
//! Each field is checked independently so every problem can be reported
//! back to the user in one pass.

use crate::loan::LoanParameters;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

pub const AMOUNT_SLIDER: SliderRange = SliderRange {
    min: 1000.,
    max: 1000000.,
    step: 1000.,
};

pub const RATE_SLIDER: SliderRange = SliderRange {
    min: 0.1,
    max: 30.,
    step: 0.1,
};

pub const TERM_SLIDER: SliderRange = SliderRange {
    min: 1.,
    max: 30.,
    step: 1.,
};

impl SliderRange {
    /// Snaps `value` onto the slider grid, clamped to its bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        let steps = ((value - self.min) / self.step).round();
        let snapped = self.min + steps * self.step;
        // round to the step's precision
        let scale = 10_f64.powi(decimals(self.step) as i32);
        ((snapped * scale).round() / scale).clamp(self.min, self.max)
    }
}

fn decimals(step: f64) -> u32 {
    let mut places = 0;
    let mut scaled = step;
    while places < 6 && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.;
        places += 1;
    }
    places
}

/// Per-field validation messages. A `None` field passed validation.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct FormErrors {
    pub amount: Option<String>,
    pub rate: Option<String>,
    pub term: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.rate.is_none() && self.term.is_none()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("amount", &self.amount),
            ("rate", &self.rate),
            ("term", &self.term),
        ];
        let mut first = true;
        for (name, message) in fields {
            if let Some(message) = message {
                if !first {
                    writeln!(f)?;
                }
                write!(f, "{}: {}", name, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

pub fn parse_loan_input(
    amount: &str,
    rate: &str,
    term: &str,
) -> Result<LoanParameters, FormErrors> {
    let amount = parse_amount(amount);
    let rate = parse_rate(rate);
    let term = parse_term(term);

    match (amount, rate, term) {
        (Ok(amount), Ok(rate), Ok(term)) => {
            // only a term above MAX_TERM_YEARS can still fail here
            LoanParameters::new(amount, rate, term).map_err(|e| FormErrors {
                term: Some(e.to_string()),
                ..FormErrors::default()
            })
        }
        (amount, rate, term) => Err(FormErrors {
            amount: amount.err(),
            rate: rate.err(),
            term: term.err(),
        }),
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_amount(value: &str) -> Result<f64, String> {
    if value.trim().is_empty() {
        return Err("Amount is required".to_string());
    }
    match parse_number(value) {
        Some(amount) if amount > 0. => Ok(amount),
        _ => Err("Please enter a valid amount".to_string()),
    }
}

fn parse_rate(value: &str) -> Result<f64, String> {
    if value.trim().is_empty() {
        return Err("Interest rate is required".to_string());
    }
    match parse_number(value) {
        Some(rate) if (0.0..=100.0).contains(&rate) => Ok(rate),
        _ => Err("Please enter a valid interest rate (0-100%)".to_string()),
    }
}

fn parse_term(value: &str) -> Result<u32, String> {
    if value.trim().is_empty() {
        return Err("Loan term is required".to_string());
    }
    match parse_number(value) {
        Some(term) if term > 0. && term.fract() == 0. && term <= u32::MAX as f64 => {
            Ok(term as u32)
        }
        _ => Err("Please enter a valid number of years".to_string()),
    }
}
