//! Fixed label encodings for the categorical columns.
//!
//! The tables are the ones the model was fit against. Codes are positions in
//! these arrays, so reordering an entry changes every prediction silently.

use serde::Serialize;
use std::fmt;

use crate::error::{PipelineError, Result};

pub const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

pub const DAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Month,
    Day,
}

impl CategoryKind {
    /// Vocabulary in code order.
    pub fn vocabulary(self) -> &'static [&'static str] {
        match self {
            CategoryKind::Month => &MONTHS,
            CategoryKind::Day => &DAYS,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Month => f.write_str("month"),
            CategoryKind::Day => f.write_str("day"),
        }
    }
}

pub struct CategoryEncoder;

impl CategoryEncoder {
    /// Look up the integer code for `label`.
    ///
    /// Matching is exact: `"Jan"`, `"january"` and `" jan"` are all rejected.
    pub fn encode(kind: CategoryKind, label: &str) -> Result<u8> {
        kind.vocabulary()
            .iter()
            .position(|v| *v == label)
            .map(|i| i as u8)
            .ok_or_else(|| PipelineError::UnknownCategory {
                kind,
                label: label.to_string(),
            })
    }

    pub fn decode(kind: CategoryKind, code: u8) -> Result<&'static str> {
        kind.vocabulary()
            .get(code as usize)
            .copied()
            .ok_or_else(|| PipelineError::UnknownCategory {
                kind,
                label: code.to_string(),
            })
    }
}
