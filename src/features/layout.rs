//! Feature Layout - Canonical column order for the classifier
//!
//! **This file controls the feature schema the model was trained on.**
//!
//! ## Rules:
//! 1. Add or remove a column → increment FEATURE_VERSION
//! 2. Change column order → increment FEATURE_VERSION
//! 3. Change the category set → increment FEATURE_VERSION
//!
//! Reordering columns silently changes predictions with no error signal,
//! so every consumer reads the order from here.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::category::Category;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Column names in the exact order the classifier consumes them
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "amt",        // 0: Transaction amount
    "city_pop",   // 1: Population of the cardholder's city
    "lat",        // 2: Transaction origin latitude
    "long",       // 3: Transaction origin longitude
    "merch_lat",  // 4: Merchant latitude
    "merch_long", // 5: Merchant longitude
    "unix_time",  // 6: Transaction time, seconds since epoch
    "category",   // 7: Merchant category (categorical)
];

/// Total number of columns, numeric and categorical
pub const FEATURE_COUNT: usize = 8;

/// Number of leading numeric columns
pub const NUMERIC_FEATURE_COUNT: usize = 7;

/// Width of the dense encoding: numeric columns followed by a one-hot category block
pub const ENCODED_WIDTH: usize = NUMERIC_FEATURE_COUNT + Category::COUNT;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 of the version, the column names and the category labels
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    // The one-hot block depends on the category order too
    for category in Category::ALL {
        hasher.update(category.as_str().as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout description exposed on the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: String,
    pub columns: Vec<String>,
    pub categories: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: format!("{:08x}", layout_hash()),
            columns: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            categories: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
        }
    }
}

/// Check that an artifact's declared columns match the canonical layout exactly
pub fn matches_layout<S: AsRef<str>>(columns: &[S]) -> bool {
    columns.len() == FEATURE_COUNT
        && columns
            .iter()
            .zip(FEATURE_LAYOUT.iter())
            .all(|(found, expected)| found.as_ref() == *expected)
}

// ============================================================================
// TESTS
// ============================================================================
