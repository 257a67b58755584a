pub mod currency;
pub mod error;
pub mod input;
pub mod loan;
pub mod report;

pub use error::{LoanError, Result};
pub use loan::{compute, LoanParameters, LoanSummary, PeriodEntry};
