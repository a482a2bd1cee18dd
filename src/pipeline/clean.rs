//! Per-dataset cleaning: raw rows in, typed records or rejections out.
//!
//! Cleaning is pure per row and never touches the target store. Duplicate
//! detection is the only stateful part and lives in [`Deduper`] so the
//! per-row functions stay referentially transparent.

use std::collections::HashSet;

use crate::config::Rules;
use crate::domain::{Customer, Product, SaleRow};
use crate::pipeline::extract::RawRecord;
use crate::pipeline::fields;
use crate::report::{RejectReason, Rejection};

/// A record that passed every cleaning rule, plus the columns whose
/// missing values were filled with a default along the way.
#[derive(Debug, Clone)]
pub struct Cleaned<T> {
    pub record: T,
    pub filled: Vec<String>,
}

pub type CleanOutcome<T> = std::result::Result<Cleaned<T>, Rejection>;

/// Tracks raw-row fingerprints so exact duplicates within a run are
/// rejected before cleaning.
#[derive(Debug, Default)]
pub struct Deduper {
    seen: HashSet<String>,
}

impl Deduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a rejection when the row is an exact duplicate of one
    /// already seen this run.
    pub fn check(&mut self, record: &RawRecord) -> Option<Rejection> {
        let fingerprint = fields::row_fingerprint(record);
        if self.seen.insert(fingerprint) {
            None
        } else {
            Some(Rejection::new(
                record.line,
                RejectReason::DuplicateRow,
                None,
                "Exact duplicate of an earlier row".to_string(),
            ))
        }
    }
}

pub fn clean_customer(raw: &RawRecord, rules: &Rules) -> CleanOutcome<Customer> {
    let mut filled = Vec::new();

    let customer_id = required_id(raw, "customer_id")?;
    let name = text_field(raw, "name", rules, &mut filled)?;
    let email = optional_text(raw, "email", &mut filled);
    let city = optional_text(raw, "city", &mut filled);

    let phone_raw = required(raw, "phone")?;
    let phone = fields::normalize_phone(phone_raw).ok_or_else(|| {
        invalid_format(raw, "phone", format!("'{}' is not a valid phone number", phone_raw))
    })?;

    // An unparseable optional date is coerced to null, not rejected
    let signup_date = match raw.get("signup_date") {
        Some(value) => {
            let parsed = fields::normalize_date(value, rules.date_day_first);
            if parsed.is_none() {
                filled.push("signup_date".to_string());
            }
            parsed
        }
        None => {
            filled.push("signup_date".to_string());
            None
        }
    };

    Ok(Cleaned {
        record: Customer {
            customer_id,
            name,
            email,
            phone,
            city,
            signup_date,
        },
        filled,
    })
}

pub fn clean_product(raw: &RawRecord, rules: &Rules) -> CleanOutcome<Product> {
    let mut filled = Vec::new();

    let product_id = required_id(raw, "product_id")?;
    let product_name = text_field(raw, "product_name", rules, &mut filled)?;
    let category = fields::title_case(&optional_text(raw, "category", &mut filled));

    let price_raw = required(raw, "unit_price")?;
    let unit_price = fields::parse_price(price_raw).ok_or_else(|| {
        invalid_format(raw, "unit_price", format!("'{}' is not a valid price", price_raw))
    })?;

    Ok(Cleaned {
        record: Product {
            product_id,
            product_name,
            category,
            unit_price,
        },
        filled,
    })
}

/// Sales rows feed two target tables, so every column is required; a row
/// with any hole is rejected rather than partially defaulted.
pub fn clean_sale(raw: &RawRecord, rules: &Rules) -> CleanOutcome<SaleRow> {
    let order_id = required_id(raw, "transaction_id")?;
    let customer_id = required_id(raw, "customer_id")?;
    let product_id = required_id(raw, "product_id")?;

    let quantity_raw = required(raw, "quantity")?;
    let quantity = fields::parse_quantity(quantity_raw).ok_or_else(|| {
        invalid_format(
            raw,
            "quantity",
            format!("'{}' is not a positive quantity", quantity_raw),
        )
    })?;

    let price_raw = required(raw, "unit_price")?;
    let unit_price = fields::parse_price(price_raw).ok_or_else(|| {
        invalid_format(raw, "unit_price", format!("'{}' is not a valid price", price_raw))
    })?;

    let date_raw = required(raw, "transaction_date")?;
    let order_date = fields::normalize_date(date_raw, rules.date_day_first).ok_or_else(|| {
        invalid_format(
            raw,
            "transaction_date",
            format!("'{}' is not a recognized date", date_raw),
        )
    })?;

    let status = required(raw, "status")?.to_string();

    Ok(Cleaned {
        record: SaleRow {
            order_id,
            customer_id,
            product_id,
            quantity,
            unit_price,
            order_date,
            status,
        },
        filled: Vec::new(),
    })
}

fn required<'a>(raw: &'a RawRecord, column: &str) -> std::result::Result<&'a str, Rejection> {
    raw.get(column).ok_or_else(|| {
        Rejection::new(
            raw.line,
            RejectReason::MissingRequiredField,
            Some(column),
            format!("Required column '{}' is missing or blank", column),
        )
    })
}

fn required_id(raw: &RawRecord, column: &str) -> std::result::Result<i64, Rejection> {
    let value = required(raw, column)?;
    fields::id_digits(value)
        .ok_or_else(|| invalid_format(raw, column, format!("'{}' contains no usable id", value)))
}

/// Required text under `reject_on_missing_required`; filled with
/// "Unknown" otherwise.
fn text_field(
    raw: &RawRecord,
    column: &str,
    rules: &Rules,
    filled: &mut Vec<String>,
) -> std::result::Result<String, Rejection> {
    match raw.get(column) {
        Some(value) => Ok(value.to_string()),
        None if rules.reject_on_missing_required => Err(Rejection::new(
            raw.line,
            RejectReason::MissingRequiredField,
            Some(column),
            format!("Required column '{}' is missing or blank", column),
        )),
        None => {
            filled.push(column.to_string());
            Ok("Unknown".to_string())
        }
    }
}

fn optional_text(raw: &RawRecord, column: &str, filled: &mut Vec<String>) -> String {
    match raw.get(column) {
        Some(value) => value.to_string(),
        None => {
            filled.push(column.to_string());
            "Unknown".to_string()
        }
    }
}

fn invalid_format(raw: &RawRecord, column: &str, detail: String) -> Rejection {
    Rejection::new(raw.line, RejectReason::InvalidFormat, Some(column), detail)
}
