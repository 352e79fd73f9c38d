//! Identifier generation and free-text measurement parsing.

use crate::domain::Moisture;

/// Prefix of processing event ids.
pub const PROCESSING_PREFIX: &str = "PROC";

/// Prefix of laboratory event ids.
pub const LAB_PREFIX: &str = "LAB";

/// Batch id for a new harvest: the species' first three characters,
/// upper-cased, followed by the last six digits of `now_ms`.
///
/// ```
/// use herb_ledger::algorithms::generate_herb_id;
/// assert_eq!(generate_herb_id("Ashwagandha", 1_710_000_123_456), "ASH123456");
/// ```
pub fn generate_herb_id(species: &str, now_ms: u64) -> String {
    let prefix: String = species.chars().take(3).collect::<String>().to_uppercase();
    let digits = now_ms.to_string();
    let tail = &digits[digits.len().saturating_sub(6)..];
    format!("{prefix}{tail}")
}

/// `PROC-<ms>`
pub fn processing_event_id(now_ms: u64) -> String {
    format!("{PROCESSING_PREFIX}-{now_ms}")
}

/// `LAB-<ms>`
pub fn lab_event_id(now_ms: u64) -> String {
    format!("{LAB_PREFIX}-{now_ms}")
}

/// Measurement to submit with a quality test.
///
/// Only moisture tests carry a value: the first decimal number in
/// `result_text`. Every other test, and a moisture result without a number,
/// yields zero.
pub fn parse_moisture(test_type: &str, result_text: &str) -> Moisture {
    if !test_type.to_lowercase().contains("moisture") {
        return Moisture(0.0);
    }
    first_decimal(result_text)
        .and_then(|n| n.parse().ok())
        .map(Moisture)
        .unwrap_or_default()
}

/// First run of digits, optionally followed by `.` and more digits.
fn first_decimal(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    Some(&text[start..end])
}
