//! Field-level cleaning rules shared by the per-dataset cleaners.
//!
//! Every rule is a pure function from a raw field value to its canonical
//! form, returning None when the value cannot be made canonical.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::pipeline::extract::RawRecord;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D+").unwrap());

/// Strips every non-digit from a decorated id ("CUST-0042" -> 42).
pub fn id_digits(raw: &str) -> Option<i64> {
    let digits = NON_DIGITS.replace_all(raw, "");
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok()
}

/// Canonicalizes an Indian phone number to "+91-XXXXXXXXXX".
///
/// Accepts the 10-digit national number with optional "+91", "91", "0091"
/// or trunk-"0" prefixes and arbitrary punctuation. Mobile numbers start
/// with 6-9; anything else is not canonicalizable.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits = NON_DIGITS.replace_all(raw, "").to_string();

    if let Some(stripped) = digits.strip_prefix("00") {
        digits = stripped.to_string();
    }
    if digits.len() == 12 {
        digits = digits.strip_prefix("91")?.to_string();
    }
    if digits.len() == 11 {
        digits = digits.strip_prefix('0')?.to_string();
    }

    if digits.len() != 10 || !matches!(digits.as_bytes()[0], b'6'..=b'9') {
        return None;
    }

    Some(format!("+91-{}", digits))
}

/// Parses a date in any of the accepted source formats to a canonical
/// `NaiveDate`. On ambiguous numeric dates the `day_first` flag decides
/// which side wins.
pub fn normalize_date(raw: &str, day_first: bool) -> Option<NaiveDate> {
    let iso_formats = ["%Y-%m-%d", "%Y/%m/%d"];
    let day_first_formats = ["%d/%m/%Y", "%d-%m-%Y"];
    let month_first_formats = ["%m/%d/%Y", "%m-%d-%Y"];

    let mut formats: Vec<&str> = iso_formats.to_vec();
    if day_first {
        formats.extend(day_first_formats);
        formats.extend(month_first_formats);
    } else {
        formats.extend(month_first_formats);
        formats.extend(day_first_formats);
    }

    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Title-cases a category name ("ELECTRONICS" -> "Electronics").
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a strictly positive integer quantity.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|q| *q > 0)
}

/// Parses a non-negative price.
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|p| p.is_finite() && *p >= 0.0)
}

/// Content fingerprint of a raw row, used to drop exact duplicates within
/// a run. Header names participate so column order does not matter.
pub fn row_fingerprint(record: &RawRecord) -> String {
    let mut hasher = Sha256::new();
    for (column, value) in &record.fields {
        hasher.update(column.as_bytes());
        hasher.update([0x1f]);
        hasher.update(value.trim().as_bytes());
        hasher.update([0x1e]);
    }
    hex::encode(hasher.finalize())
}
