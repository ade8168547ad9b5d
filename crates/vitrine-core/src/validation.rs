//! # Validation Module
//!
//! Input validation for values entering Vitrine from outside.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Upstream payload / HTTP request (serde)                      │
//! │  ├── Shape and type checks (deserialization)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Product codes and names from upstream records                     │
//! │  ├── Search query length                                               │
//! │  └── Tunables from config (fuzzy threshold)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── PRIMARY KEY on code                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vitrine_core::validation::{validate_product_code, validate_search_query};
//!
//! validate_product_code("12345").unwrap();
//! assert_eq!(validate_search_query("  toalha ").unwrap(), "toalha");
//! ```

use crate::error::ValidationError;
use crate::MAX_QUERY_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product or group code.
pub const MAX_CODE_LENGTH: usize = 64;

/// Longest accepted product name.
pub const MAX_NAME_LENGTH: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an upstream product or group code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
/// - No control characters
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::validate_product_code;
///
/// assert!(validate_product_code("7891234").is_ok());
/// assert!(validate_product_code("  ").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LENGTH,
        });
    }

    if code.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 500 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (yields an empty page)
/// - Maximum 200 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LENGTH,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the fuzzy similarity threshold (`0.15..=0.3`).
pub fn validate_fuzzy_threshold(threshold: f64) -> ValidationResult<()> {
    const MIN: f64 = 0.15;
    const MAX: f64 = 0.3;

    if !(MIN..=MAX).contains(&threshold) {
        return Err(ValidationError::OutOfRange {
            field: "fuzzy_threshold".to_string(),
            min: MIN,
            max: MAX,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_code() {
        assert!(validate_product_code("123").is_ok());
        assert!(validate_product_code("TB-01").is_ok());
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code(&"9".repeat(65)).is_err());
        assert!(validate_product_code("12\n3").is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Toalha de Banho").is_ok());
        assert!(validate_product_name("   ").is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  toalha ").unwrap(), "toalha");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"a".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_fuzzy_threshold() {
        assert!(validate_fuzzy_threshold(0.15).is_ok());
        assert!(validate_fuzzy_threshold(0.3).is_ok());
        assert!(validate_fuzzy_threshold(0.31).is_err());
        assert!(validate_fuzzy_threshold(f64::NAN).is_err());
    }
}
