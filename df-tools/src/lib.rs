//! # df-tools - Batch operations on lists of numeric tables
//!
//! df-tools loads sets of related CSV tables (for example repeated runs of
//! the same time-series measurement) and applies the same processing to each
//! of them: index offsetting, column dropping, normalization, truncation to a
//! common length, top-series selection, and pairwise concatenation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV Files  │────▶│   Parser    │────▶│ Table list  │────▶│  CSV Files  │
//! │  (any enc.) │     │  (auto-det) │     │  (recipe)   │     │ (processed) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use df_tools::{list, CsvOptions};
//!
//! let tables = list::load_tables(&["run1.csv", "run2.csv"], "data", &CsvOptions::default())?;
//! let rows = list::find_min_rows(&tables, usize::MAX);
//! let (top, names) = list::top_series_mean_all(&tables, 3)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Tables (polars frames with a row index) and index labels
//! - [`parser`] - CSV reading and writing with auto-detection
//! - [`transform`] - Table operations, recipes, and the file pipeline
//! - [`validation`] - Parameter enums and argument checks

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

pub use transform::{concat, dsl, frame, list, pipeline};

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, CsvResult, PipelineError, PipelineResult, RecipeError, RecipeResult, TableError,
    TableResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{default_index, label_series, Label, Table, TableList};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    check_equal_lengths, check_threshold, check_unit_interval, Axis, Bound, DropHow, Join,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, decode_detected, detect_delimiter, detect_encoding, parse_bytes, parse_table,
    read_table, table_to_string, write_table, write_table_file, CsvOptions, ParseResult,
};

// =============================================================================
// Re-exports - Concatenation
// =============================================================================

pub use transform::concat::{concat_pairs, concat_transposed_pairs, TransposedConcat};

// =============================================================================
// Re-exports - Recipes
// =============================================================================

pub use transform::dsl::{
    example_recipe, execute, operations_description, Recipe, RecipeRun, Step, StepReport,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    concat_files, inspect_files, run_files, summarize_files, ConcatOptions, RunOptions,
    RunOutcome, TableInfo,
};
