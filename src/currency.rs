//! Currency conversion of loan results.
//!
//! The engine works in the loan's native unit. Everything here scales its
//! output by a multiplier looked up through a [`RateProvider`].

use crate::error::{LoanError, Result};
use crate::loan::{LoanSummary, PeriodEntry};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source of exchange multipliers relative to a base currency.
pub trait RateProvider {
    fn base(&self) -> &str;

    /// Units of `code` per one unit of the base currency.
    fn multiplier(&self, code: &str) -> Option<f64>;
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RateTable {
    base: String,
    rates: BTreeMap<String, f64>,
    fetched_at: DateTime<Utc>,
}

impl RateTable {
    pub fn new(base: &str, fetched_at: DateTime<Utc>) -> Self {
        let base = base.to_uppercase();
        let mut rates = BTreeMap::new();
        rates.insert(base.clone(), 1.);
        Self {
            base,
            rates,
            fetched_at,
        }
    }

    /// Adds or replaces the multiplier for `code`. The base always stays at 1.
    pub fn insert(&mut self, code: &str, multiplier: f64) -> Result<()> {
        let code = code.to_uppercase();
        if !multiplier.is_finite() || multiplier <= 0. {
            return Err(LoanError::invalid(
                "multiplier",
                format!("{} rate must be positive, got {}", code, multiplier),
            ));
        }
        if code != self.base {
            self.rates.insert(code, multiplier);
        }
        Ok(())
    }

    /// Decodes an exchange-rate API payload.
    #[cfg(feature = "serde")]
    pub fn from_response(json: &str, fetched_at: DateTime<Utc>) -> Result<Self> {
        let response: RateResponse = serde_json::from_str(json)?;
        if response.result != "success" {
            return Err(LoanError::RateResponse(format!(
                "rate source returned result \"{}\"",
                response.result
            )));
        }
        if response.base_code.trim().is_empty() {
            return Err(LoanError::RateResponse(
                "success payload has no base_code".to_string(),
            ));
        }

        let mut table = RateTable::new(response.base_code.trim(), fetched_at);
        for (code, multiplier) in &response.conversion_rates {
            table
                .insert(code, *multiplier)
                .map_err(|e| LoanError::RateResponse(e.to_string()))?;
        }
        debug!(
            "decoded {} rates against {}",
            table.rates.len(),
            table.base
        );
        Ok(table)
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CurrencyRate> + '_ {
        self.rates.iter().map(|(code, rate)| CurrencyRate {
            code: code.clone(),
            name: currency_name(code).to_string(),
            rate: *rate,
        })
    }

    /// Rates whose code or display name contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<CurrencyRate> {
        let query = query.trim().to_lowercase();
        self.iter()
            .filter(|c| {
                query.is_empty()
                    || c.code.to_lowercase().contains(&query)
                    || c.name.to_lowercase().contains(&query)
            })
            .collect()
    }
}

impl RateProvider for RateTable {
    fn base(&self) -> &str {
        &self.base
    }

    fn multiplier(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.to_uppercase()).copied()
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RateResponse {
    result: String,
    #[serde(default)]
    base_code: String,
    #[serde(default)]
    conversion_rates: BTreeMap<String, f64>,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurrencyRate {
    pub code: String,
    pub name: String,
    pub rate: f64,
}

pub fn currency_name(code: &str) -> &str {
    match code {
        "USD" => "US Dollar",
        "EUR" => "Euro",
        "GBP" => "British Pound",
        "JPY" => "Japanese Yen",
        "AUD" => "Australian Dollar",
        "CAD" => "Canadian Dollar",
        "CHF" => "Swiss Franc",
        "CNY" => "Chinese Yuan",
        "INR" => "Indian Rupee",
        _ => code,
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        "CNY" => Some("CN¥"),
        _ => None,
    }
}

/// A [`LoanSummary`] with every monetary field expressed in `currency`.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConvertedSummary {
    pub currency: String,
    pub multiplier: f64,
    pub periodic_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub schedule: Vec<PeriodEntry>,
    pub interest_share: f64,
    pub principal_share: f64,
}

pub fn convert(
    summary: &LoanSummary,
    provider: &impl RateProvider,
    code: &str,
) -> Result<ConvertedSummary> {
    let multiplier = provider
        .multiplier(code)
        .ok_or_else(|| LoanError::UnknownCurrency(code.to_string()))?;
    debug!(
        "converting {} periods from {} to {} at {}",
        summary.periods(),
        provider.base(),
        code,
        multiplier
    );

    let schedule = summary
        .schedule()
        .iter()
        .map(|entry| PeriodEntry {
            period: entry.period,
            principal_portion: entry.principal_portion * multiplier,
            interest_portion: entry.interest_portion * multiplier,
            remaining_balance: entry.remaining_balance * multiplier,
            payment_amount: entry.payment_amount * multiplier,
        })
        .collect();

    Ok(ConvertedSummary {
        currency: code.to_uppercase(),
        multiplier,
        periodic_payment: summary.periodic_payment() * multiplier,
        total_payment: summary.total_payment() * multiplier,
        total_interest: summary.total_interest() * multiplier,
        schedule,
        interest_share: summary.interest_share(),
        principal_share: summary.principal_share(),
    })
}

fn round(amt: f64, dec: i32) -> f64 {
    if amt == 0. {
        0.
    } else {
        (amt * 10_f64.powi(dec)).round() / 10_f64.powi(dec)
    }
}

/// Formats `amount` en-US style with two decimals, e.g. `$1,234.56`.
pub fn format_currency(amount: f64, code: &str) -> String {
    let code = code.to_uppercase();
    let rounded = round(amount, 2);
    let sign = if rounded < 0. { "-" } else { "" };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match currency_symbol(&code) {
        Some(symbol) => format!("{}{}{}.{}", sign, symbol, grouped, cents),
        None => format!("{}{} {}.{}", sign, code, grouped, cents),
    }
}

/// Age of a rate snapshot, e.g. "42 seconds ago" or "3 hours ago".
pub fn time_since_update(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(fetched_at).num_seconds().max(0);
    if secs < 60 {
        format!("{} seconds ago", secs)
    } else if secs < 3600 {
        format!("{} minutes ago", secs / 60)
    } else {
        format!("{} hours ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        convert, currency_name, format_currency, time_since_update, RateProvider, RateTable,
    };
    use crate::error::LoanError;
    use crate::loan::{compute, LoanParameters};
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, TimeZone, Utc};
    use test_log::test;

    fn sample_table() -> RateTable {
        let fetched = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut table = RateTable::new("usd", fetched);
        table.insert("EUR", 0.92).unwrap();
        table.insert("gbp", 0.79).unwrap();
        table.insert("JPY", 150.25).unwrap();
        table.insert("USD", 3.).unwrap();
        table
    }

    #[test]
    fn test_rate_table_lookup() {
        let table = sample_table();
        assert_eq!(table.base(), "USD");
        assert_eq!(table.multiplier("USD"), Some(1.));
        assert_eq!(table.multiplier("eur"), Some(0.92));
        assert_eq!(table.multiplier("GBP"), Some(0.79));
        assert_eq!(table.multiplier("XYZ"), None);
        assert_eq!(table.len(), 4);

        let mut table = table;
        assert!(matches!(
            table.insert("CHF", 0.),
            Err(LoanError::InvalidParameter { .. })
        ));
        assert!(table.insert("CHF", f64::NAN).is_err());
    }

    #[test]
    fn test_search() {
        let table = sample_table();
        let codes: Vec<String> = table.search("").into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["EUR", "GBP", "JPY", "USD"]);

        let found = table.search("pound");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "GBP");
        assert_eq!(found[0].name, "British Pound");

        let found = table.search(" jp");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rate, 150.25);

        assert!(table.search("peso").is_empty());
    }

    #[test]
    fn test_convert_summary() {
        let summary = compute(&LoanParameters::default()).unwrap();
        let table = sample_table();

        let eur = convert(&summary, &table, "eur").unwrap();
        assert_eq!(eur.currency, "EUR");
        assert_abs_diff_eq!(
            eur.periodic_payment,
            summary.periodic_payment() * 0.92,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            eur.total_interest,
            summary.total_interest() * 0.92,
            epsilon = 1e-9
        );
        assert_eq!(eur.schedule.len(), 60);
        assert_abs_diff_eq!(
            eur.schedule[0].interest_portion,
            708.3333 * 0.92,
            epsilon = 0.001
        );
        assert_eq!(eur.schedule[59].remaining_balance, 0.);
        assert_eq!(eur.interest_share, summary.interest_share());

        let usd = convert(&summary, &table, "USD").unwrap();
        assert_eq!(usd.periodic_payment, summary.periodic_payment());
        assert_eq!(usd.schedule, summary.schedule());

        assert_eq!(
            convert(&summary, &table, "XYZ").unwrap_err(),
            LoanError::UnknownCurrency("XYZ".to_string())
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_response() {
        let fetched = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let json = r#"{
            "result": "success",
            "base_code": "USD",
            "time_last_update_unix": 1709251201,
            "conversion_rates": {"USD": 1, "EUR": 0.9221, "INR": 82.9}
        }"#;
        let table = RateTable::from_response(json, fetched).unwrap();
        assert_eq!(table.base(), "USD");
        assert_eq!(table.multiplier("INR"), Some(82.9));
        assert_eq!(table.len(), 3);
        assert_eq!(table.fetched_at(), fetched);

        let json = r#"{"result": "error", "error-type": "invalid-key"}"#;
        assert!(matches!(
            RateTable::from_response(json, fetched),
            Err(LoanError::RateResponse(_))
        ));

        assert!(matches!(
            RateTable::from_response("not json", fetched),
            Err(LoanError::RateResponse(_))
        ));

        let json = r#"{"result": "success", "conversion_rates": {"EUR": 0.92}}"#;
        assert!(matches!(
            RateTable::from_response(json, fetched),
            Err(LoanError::RateResponse(_))
        ));

        let json = r#"{"result": "success", "base_code": "", "conversion_rates": {"EUR": 0.92}}"#;
        assert!(matches!(
            RateTable::from_response(json, fetched),
            Err(LoanError::RateResponse(_))
        ));

        let json = r#"{"result": "success", "base_code": "USD", "conversion_rates": {"EUR": -1}}"#;
        assert!(matches!(
            RateTable::from_response(json, fetched),
            Err(LoanError::RateResponse(_))
        ));
    }

    #[test]
    fn test_currency_name() {
        assert_eq!(currency_name("CHF"), "Swiss Franc");
        assert_eq!(currency_name("INR"), "Indian Rupee");
        assert_eq!(currency_name("SEK"), "SEK");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(2051.653132, "USD"), "$2,051.65");
        assert_eq!(format_currency(1000000., "eur"), "€1,000,000.00");
        assert_eq!(format_currency(0., "GBP"), "£0.00");
        assert_eq!(format_currency(999.999, "USD"), "$1,000.00");
        assert_eq!(format_currency(-1234.5, "USD"), "-$1,234.50");
        assert_eq!(format_currency(123.456, "SEK"), "SEK 123.46");
        assert_eq!(format_currency(308254.1, "JPY"), "¥308,254.10");
    }

    #[test]
    fn test_time_since_update() {
        let fetched = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            time_since_update(fetched, fetched + Duration::seconds(42)),
            "42 seconds ago"
        );
        assert_eq!(
            time_since_update(fetched, fetched + Duration::seconds(150)),
            "2 minutes ago"
        );
        assert_eq!(
            time_since_update(fetched, fetched + Duration::hours(3) + Duration::minutes(59)),
            "3 hours ago"
        );
        assert_eq!(
            time_since_update(fetched, fetched - Duration::seconds(5)),
            "0 seconds ago"
        );
    }
}
