use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Splits a comma-separated tag string, trimming whitespace and dropping
/// empty entries.
pub fn tags_from_str(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Accepts tags either as a JSON array of strings or as a comma-separated
/// string, matching what clients actually send on the update path.
pub fn tags_from_value(value: Option<&JsonValue>) -> Vec<String> {
    match value {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(JsonValue::String(s)) => tags_from_str(s),
        _ => Vec::new(),
    }
}

/// Skills arrive as a JSON array (profile form) or a comma-separated string
/// (signup form). Entries are trimmed and empties dropped either way.
pub fn skills_from_str(raw: &str) -> Vec<String> {
    if let Ok(JsonValue::Array(items)) = serde_json::from_str::<JsonValue>(raw) {
        return items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    tags_from_str(raw)
}

/// Coerces a salary from a JSON number or numeric string; anything that does
/// not parse becomes zero.
pub fn coerce_salary(value: Option<&JsonValue>) -> Decimal {
    match value {
        Some(JsonValue::Number(n)) => n
            .to_string()
            .parse::<Decimal>()
            .unwrap_or(Decimal::ZERO),
        Some(JsonValue::String(s)) => Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Parses a deadline from RFC 3339 or the date / datetime-local formats the
/// posting form submits.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));
    }
    None
}
