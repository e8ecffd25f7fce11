//! Parameter validation for table operations.
//!
//! Tables and lists are typed, so the only runtime checks left are on
//! values: paired lists must have equal lengths, numeric parameters must
//! stay within their thresholds, and enumerated options must be one of a
//! known set. Enumerated options are modelled as enums whose [`FromStr`]
//! implementation reports the accepted values on failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{TableError, TableResult};

// =============================================================================
// Enumerated options
// =============================================================================

/// Direction of an operation: along rows or along columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Axis 0: act on rows (stack vertically, drop rows).
    #[default]
    #[serde(alias = "index", alias = "0")]
    Rows,
    /// Axis 1: act on columns (side by side, drop columns).
    #[serde(alias = "1")]
    Columns,
}

impl FromStr for Axis {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "rows" | "row" | "index" => Ok(Axis::Rows),
            "1" | "columns" | "column" | "cols" => Ok(Axis::Columns),
            other => Err(invalid("axis", other, "0, rows, index, 1, columns")),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Rows => write!(f, "rows"),
            Axis::Columns => write!(f, "columns"),
        }
    }
}

/// How the non-concatenated axis is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Join {
    /// Keep only labels present in both tables.
    #[default]
    Inner,
    /// Keep every label, filling gaps with missing cells.
    Outer,
}

impl FromStr for Join {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Ok(Join::Inner),
            "outer" => Ok(Join::Outer),
            other => Err(invalid("join", other, "inner, outer")),
        }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Join::Inner => write!(f, "inner"),
            Join::Outer => write!(f, "outer"),
        }
    }
}

/// When a row or column counts as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DropHow {
    /// Drop if any cell is missing.
    #[default]
    Any,
    /// Drop only if every cell is missing.
    All,
}

impl FromStr for DropHow {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" => Ok(DropHow::Any),
            "all" => Ok(DropHow::All),
            other => Err(invalid("how", other, "any, all")),
        }
    }
}

impl fmt::Display for DropHow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropHow::Any => write!(f, "any"),
            DropHow::All => write!(f, "all"),
        }
    }
}

fn invalid(parameter: &str, value: &str, expected: &str) -> TableError {
    TableError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

// =============================================================================
// Value checks
// =============================================================================

/// Which side of a threshold a value must stay on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Value must be less than or equal to the limit.
    AtMost,
    /// Value must be greater than or equal to the limit.
    AtLeast,
}

/// Check that every length is the same.
///
/// `what` names the paired lists in the error message.
pub fn check_equal_lengths(lengths: &[usize], what: &str) -> TableResult<()> {
    match lengths.first() {
        Some(first) if lengths.iter().any(|l| l != first) => Err(TableError::LengthMismatch {
            what: what.to_string(),
            lengths: lengths.to_vec(),
        }),
        _ => Ok(()),
    }
}

/// Check a numeric parameter against a threshold.
pub fn check_threshold(parameter: &str, value: f64, limit: f64, bound: Bound) -> TableResult<()> {
    let ok = match bound {
        Bound::AtMost => value <= limit,
        Bound::AtLeast => value >= limit,
    };
    if ok {
        Ok(())
    } else {
        let message = match bound {
            Bound::AtMost => format!("must be at most {}", limit),
            Bound::AtLeast => format!("must be at least {}", limit),
        };
        Err(TableError::OutOfRange {
            parameter: parameter.to_string(),
            value,
            message,
        })
    }
}

/// Check that a quantile lies in `[0, 1]`.
pub fn check_unit_interval(parameter: &str, value: f64) -> TableResult<()> {
    if value.is_nan() {
        return Err(TableError::OutOfRange {
            parameter: parameter.to_string(),
            value,
            message: "must be a number".to_string(),
        });
    }
    check_threshold(parameter, value, 0.0, Bound::AtLeast)?;
    check_threshold(parameter, value, 1.0, Bound::AtMost)
}
