//! # Upstream Payloads
//!
//! The inventory API is not consistent about how it wraps a page of
//! records. Every shape below is accepted:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  [ {...}, {...} ]                                   bare array          │
//! │  { "data": [ {...} ] }                              wrapped array       │
//! │  { "data": { "items": [ {...} ], "total": 7 } }     wrapped listing     │
//! │  { "items": [ {...} ], "quantTotal": "7" }          root listing        │
//! │  anything else                                      empty page + warn   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The total may be called `total`, `quantTotal` or `qtdRegistro`, and may
//! arrive as a number or a numeric string.
//!
//! Records are then read field by field. A record that is not an object,
//! has no usable code, or (for products) has no name or an unreadable
//! price, becomes a [`MalformedRecord`] and is skipped.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use vitrine_core::validation::{validate_product_code, validate_product_name};
use vitrine_core::{Money, Product, ProductGroup};

use crate::error::SyncResult;

// =============================================================================
// Upstream Field Names
// =============================================================================

pub const FIELD_PRODUCT_NAME: &str = "NOMEFANTASIA";
pub const FIELD_PRICE_REGULAR: &str = "PRECO2";
pub const FIELD_PRICE_CASH: &str = "PRECO1";
pub const FIELD_GROUP_CODE: &str = "CODGRUPO";
pub const FIELD_BARCODE: &str = "CODBARRAS";
pub const FIELD_GROUP_DESCRIPTION: &str = "DESCRICAO";

// =============================================================================
// Page Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Bare(Vec<Value>),
    Wrapped {
        data: Data,
        #[serde(flatten)]
        totals: Totals,
    },
    Listing(Listing),
    Unrecognized(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Data {
    Items(Vec<Value>),
    Listing(Listing),
}

#[derive(Debug, Deserialize)]
struct Listing {
    items: Vec<Value>,
    #[serde(flatten)]
    totals: Totals,
}

#[derive(Debug, Default, Deserialize)]
struct Totals {
    #[serde(default)]
    total: Option<Value>,
    #[serde(default, rename = "quantTotal")]
    quant_total: Option<Value>,
    #[serde(default, rename = "qtdRegistro")]
    qtd_registro: Option<Value>,
}

impl Totals {
    fn count(&self) -> Option<u64> {
        [&self.total, &self.quant_total, &self.qtd_registro]
            .into_iter()
            .flatten()
            .find_map(count_from)
    }
}

fn count_from(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One decoded page: raw records plus the upstream's total, if it sent one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    pub records: Vec<Value>,
    pub total: Option<u64>,
}

impl RawPage {
    /// Decodes a response body.
    ///
    /// Fails only when the body is not JSON. A JSON value of an unknown
    /// shape is logged and read as an empty page.
    pub fn parse(body: &[u8]) -> SyncResult<RawPage> {
        let payload: Payload = serde_json::from_slice(body)?;

        let page = match payload {
            Payload::Bare(records) => RawPage {
                records,
                total: None,
            },
            Payload::Wrapped {
                data: Data::Items(records),
                totals,
            } => RawPage {
                records,
                total: totals.count(),
            },
            Payload::Wrapped {
                data: Data::Listing(listing),
                totals,
            } => RawPage {
                records: listing.items,
                total: listing.totals.count().or_else(|| totals.count()),
            },
            Payload::Listing(listing) => RawPage {
                records: listing.items,
                total: listing.totals.count(),
            },
            Payload::Unrecognized(value) => {
                warn!(kind = json_kind(&value), "Unrecognized upstream payload, treating as empty page");
                RawPage::default()
            }
        };

        Ok(page)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Malformed Records
// =============================================================================

/// A record that could not be turned into a catalog row.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRecord {
    /// Position within its page.
    pub index: usize,
    pub reason: String,
}

impl MalformedRecord {
    fn new(index: usize, reason: impl Into<String>) -> Self {
        MalformedRecord {
            index,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {}: {}", self.index, self.reason)
    }
}

// =============================================================================
// Field Access
// =============================================================================

/// Looks a field up by its upstream name, then by the lower-case alias.
fn field<'a>(record: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    record
        .get(name)
        .or_else(|| record.get(&name.to_lowercase()))
        .filter(|v| !v.is_null())
}

/// Text field; numbers are accepted and rendered as text. Blank is absent.
fn text(record: &Map<String, Value>, name: &str) -> Option<String> {
    let raw = match field(record, name)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!raw.is_empty()).then_some(raw)
}

/// Price field as a decimal. Missing or blank reads as zero.
fn decimal(record: &Map<String, Value>, name: &str) -> Result<f64, String> {
    match field(record, name) {
        None => Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| format!("{name} is not a number")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(Value::String(s)) => s
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| format!("{name} is not a number: {s:?}")),
        Some(_) => Err(format!("{name} is not a number")),
    }
}

fn as_object(index: usize, value: &Value) -> Result<&Map<String, Value>, MalformedRecord> {
    value
        .as_object()
        .ok_or_else(|| MalformedRecord::new(index, format!("expected object, got {}", json_kind(value))))
}

/// Extracts just the code, for the enumeration pass.
pub fn record_code(index: usize, value: &Value, code_field: &str) -> Result<String, MalformedRecord> {
    let record = as_object(index, value)?;
    let code = text(record, code_field)
        .ok_or_else(|| MalformedRecord::new(index, format!("missing {code_field}")))?;
    validate_product_code(&code).map_err(|e| MalformedRecord::new(index, e.to_string()))?;
    Ok(code)
}

// =============================================================================
// Typed Records
// =============================================================================

/// Product as sent by the upstream, before group denormalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub code: String,
    pub name: String,
    pub price_regular: Money,
    pub price_cash: Money,
    pub group_code: Option<String>,
    pub barcode: Option<String>,
}

impl ProductRecord {
    pub fn from_value(index: usize, value: &Value, code_field: &str) -> Result<Self, MalformedRecord> {
        let code = record_code(index, value, code_field)?;
        let record = as_object(index, value)?;

        let name = text(record, FIELD_PRODUCT_NAME).unwrap_or_default();
        validate_product_name(&name).map_err(|e| MalformedRecord::new(index, e.to_string()))?;

        let price = |field_name: &str| -> Result<Money, MalformedRecord> {
            let amount = decimal(record, field_name).map_err(|e| MalformedRecord::new(index, e))?;
            Money::from_decimal(amount).map_err(|e| MalformedRecord::new(index, e.to_string()))
        };

        Ok(ProductRecord {
            code,
            name,
            price_regular: price(FIELD_PRICE_REGULAR)?,
            price_cash: price(FIELD_PRICE_CASH)?,
            group_code: text(record, FIELD_GROUP_CODE),
            barcode: text(record, FIELD_BARCODE),
        })
    }

    /// Builds the catalog row, resolving the group description from `groups`.
    ///
    /// Unknown or missing group codes give an empty description.
    pub fn into_product(self, groups: &HashMap<String, String>) -> Product {
        let group_description = self
            .group_code
            .as_ref()
            .and_then(|code| groups.get(code))
            .cloned()
            .unwrap_or_default();

        Product {
            code: self.code,
            name: self.name,
            price_regular_cents: self.price_regular.cents(),
            price_cash_cents: self.price_cash.cents(),
            group_code: self.group_code,
            group_description,
            barcode: self.barcode,
        }
    }
}

/// Reads a group record (`CODGRUPO`, `DESCRICAO`).
pub fn group_from_value(index: usize, value: &Value) -> Result<ProductGroup, MalformedRecord> {
    let record = as_object(index, value)?;
    let code = text(record, FIELD_GROUP_CODE)
        .ok_or_else(|| MalformedRecord::new(index, format!("missing {FIELD_GROUP_CODE}")))?;
    let description = text(record, FIELD_GROUP_DESCRIPTION).unwrap_or_default();
    Ok(ProductGroup::new(code, description))
}
