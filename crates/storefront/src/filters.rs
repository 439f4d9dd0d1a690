//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

/// Formats a decimal amount with exactly two fraction digits.
///
/// Values that are not decimals are rendered unchanged.
///
/// Usage in templates: `{{ subtotal|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(format_money(&raw).unwrap_or(raw))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

fn format_money(raw: &str) -> Option<String> {
    raw.parse::<Decimal>().ok().map(|amount| format!("{:.2}", amount.round_dp(2)))
}
