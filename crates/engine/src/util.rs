//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! parsing and caliber matching so the engine enforces consistent rules.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Corrupted(format!("invalid {label} id")))
}

/// Canonical form of a caliber designation: NFC, surrounding whitespace
/// stripped. The entered casing is preserved for display.
pub(crate) fn normalize_caliber(value: &str) -> String {
    value.trim().nfc().collect()
}

/// Caliber comparison: canonical forms matched ASCII case-insensitively, so
/// "9MM" draws from "9mm" stock.
pub(crate) fn same_caliber(a: &str, b: &str) -> bool {
    normalize_caliber(a).eq_ignore_ascii_case(&normalize_caliber(b))
}
