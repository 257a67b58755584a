use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LoanError {
    #[error("Invalid parameter: {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Numeric degenerate: {0}")]
    NumericDegenerate(String),

    #[error("No exchange rate for currency {0}")]
    UnknownCurrency(String),

    #[error("Rate response error: {0}")]
    RateResponse(String),
}

impl LoanError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanError::InvalidParameter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for LoanError {
    fn from(e: serde_json::Error) -> Self {
        LoanError::RateResponse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
