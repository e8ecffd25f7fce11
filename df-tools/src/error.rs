//! Error types for df-tools.
//!
//! The hierarchy mirrors the layers of the crate:
//!
//! - [`CsvError`] - CSV loading and writing errors
//! - [`TableError`] - Errors raised by table and table-list operations
//! - [`RecipeError`] - Recipe parsing and step execution errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use polars::prelude::PolarsError;
use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing CSV tables.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write a file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the raw bytes.
    #[error("Failed to decode content as {encoding}: {message}")]
    Encoding { encoding: String, message: String },

    /// Malformed CSV record.
    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// Empty file.
    #[error("CSV content is empty")]
    EmptyFile,

    /// The polars CSV reader or writer failed.
    #[error("CSV error: {0}")]
    Polars(#[from] PolarsError),

    /// The parsed rows do not form a valid table.
    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

impl CsvError {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }
}

// =============================================================================
// Table Errors
// =============================================================================

/// Errors raised by operations on tables and lists of tables.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    /// Two lists that must be paired have different lengths.
    #[error("Length mismatch between {what}: {lengths:?}")]
    LengthMismatch { what: String, lengths: Vec<usize> },

    /// A referenced column does not exist.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A numeric operation met a text cell.
    #[error("Non-numeric value '{value}' in column '{column}' at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    /// A numeric index operation met a text label.
    #[error("Index label '{label}' at position {position} is not numeric")]
    NonNumericIndex { position: usize, label: String },

    /// More series were requested than the table holds.
    #[error("Requested {requested} series but the table only has {available} columns")]
    NotEnoughColumns { requested: usize, available: usize },

    /// A parameter is outside its accepted set of values.
    #[error("Invalid value '{value}' for {parameter}; expected one of: {expected}")]
    InvalidParameter {
        parameter: String,
        value: String,
        expected: String,
    },

    /// A numeric parameter crossed its threshold.
    #[error("{parameter} = {value} is out of range: {message}")]
    OutOfRange {
        parameter: String,
        value: f64,
        message: String,
    },

    /// A DataFrame operation failed inside polars.
    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<PolarsError> for TableError {
    fn from(err: PolarsError) -> Self {
        TableError::Polars(err.to_string())
    }
}

// =============================================================================
// Recipe Errors
// =============================================================================

/// Errors while loading or executing a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// JSON serialization/deserialization error.
    #[error("Recipe JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A step failed on the table list.
    #[error("Step {index} ({step}) failed: {source}")]
    StepFailed {
        index: usize,
        step: String,
        #[source]
        source: TableError,
    },

    /// The recipe has no steps.
    #[error("Recipe has no steps")]
    Empty,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline`]. It wraps
/// the lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Table operation error.
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Recipe error.
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// None of the input files could be loaded.
    #[error("No tables were loaded from {0} input file(s)")]
    NoTables(usize),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for recipe operations.
pub type RecipeResult<T> = Result<T, RecipeError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError
        let pipeline_err: PipelineError = CsvError::EmptyFile.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // TableError -> PipelineError
        let table_err = TableError::ColumnNotFound("Col3".into());
        let pipeline_err: PipelineError = table_err.into();
        assert!(pipeline_err.to_string().contains("Col3"));
    }

    #[test]
    fn test_step_failed_format() {
        let err = RecipeError::StepFailed {
            index: 2,
            step: "top_series_mean".into(),
            source: TableError::NotEnoughColumns {
                requested: 10,
                available: 5,
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("Step 2"));
        assert!(msg.contains("top_series_mean"));
        assert!(msg.contains("10 series"));
    }

    #[test]
    fn test_invalid_parameter_lists_choices() {
        let err = TableError::InvalidParameter {
            parameter: "join".into(),
            value: "left".into(),
            expected: "inner, outer".into(),
        };
        assert!(err.to_string().contains("inner, outer"));
    }

    #[test]
    fn test_polars_error_conversion() {
        let err: TableError = PolarsError::ComputeError("bad shape".into()).into();
        assert!(matches!(&err, TableError::Polars(msg) if msg.contains("bad shape")));

        let csv_err: CsvError = PolarsError::NoData("no rows".into()).into();
        assert!(matches!(csv_err, CsvError::Polars(_)));
    }
}
