//! Recipe steps
//!
//! Each step takes the whole table list and returns the next one. Steps that
//! pair tables with other values (such as `normalize_by_factors`) check that
//! the lengths agree.

use serde::{Deserialize, Serialize};

use crate::error::TableResult;
use crate::models::TableList;
use crate::transform::list;
use crate::validation::{Axis, DropHow};

/// All available recipe steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Offset each index so that it starts at zero
    Idx0,

    /// Remove the named columns where present
    DropColumns { columns: Vec<String> },

    /// Divide table i by factor i
    NormalizeByFactors { factors: Vec<f64> },

    /// Keep the first `rows` rows of each table
    Truncate {
        #[serde(default = "default_truncate_rows")]
        rows: usize,
    },

    /// Truncate every table to the shortest one, optionally capped
    TruncateToShortest {
        #[serde(default)]
        max_len: Option<usize>,
    },

    /// Drop rows or columns holding missing values
    DropMissing {
        #[serde(default)]
        axis: Axis,
        #[serde(default)]
        how: DropHow,
    },

    /// Move a column into the index
    SetIndex { column: String },

    /// Keep the `n` columns with the highest mean
    TopSeriesMean { n: usize },

    /// Keep the `n` columns with the highest maximum
    TopSeriesMax { n: usize },

    /// Keep the columns whose mean is above the given quantile of column means
    TopSeriesQuantile { quantile: f64 },

    /// Scale each column by its own largest absolute value
    NormalizeEach,

    /// Scale each table by its largest absolute value
    NormalizeAll,

    /// Swap rows and columns
    Transpose,
}

fn default_truncate_rows() -> usize {
    1000
}

impl Step {
    /// The step's `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            Step::Idx0 => "idx0",
            Step::DropColumns { .. } => "drop_columns",
            Step::NormalizeByFactors { .. } => "normalize_by_factors",
            Step::Truncate { .. } => "truncate",
            Step::TruncateToShortest { .. } => "truncate_to_shortest",
            Step::DropMissing { .. } => "drop_missing",
            Step::SetIndex { .. } => "set_index",
            Step::TopSeriesMean { .. } => "top_series_mean",
            Step::TopSeriesMax { .. } => "top_series_max",
            Step::TopSeriesQuantile { .. } => "top_series_quantile",
            Step::NormalizeEach => "normalize_each",
            Step::NormalizeAll => "normalize_all",
            Step::Transpose => "transpose",
        }
    }

    /// Apply this step to a table list
    pub fn apply(&self, mut tables: TableList) -> TableResult<TableList> {
        match self {
            Step::Idx0 => list::idx0_all(&tables),
            Step::DropColumns { columns } => {
                list::drop_columns(&mut tables, columns);
                Ok(tables)
            }
            Step::NormalizeByFactors { factors } => list::normalize_by_factors(&tables, factors),
            Step::Truncate { rows } => {
                list::truncate_all(&mut tables, *rows);
                Ok(tables)
            }
            Step::TruncateToShortest { max_len } => {
                let rows = list::find_min_rows(&tables, max_len.unwrap_or(usize::MAX));
                log::info!("Truncating {} tables to {} rows", tables.len(), rows);
                list::truncate_all(&mut tables, rows);
                Ok(tables)
            }
            Step::DropMissing { axis, how } => {
                list::dropna_all(&mut tables, *axis, *how)?;
                Ok(tables)
            }
            Step::SetIndex { column } => {
                list::set_indices(&mut tables, column);
                Ok(tables)
            }
            Step::TopSeriesMean { n } => {
                let (picked, names) = list::top_series_mean_all(&tables, *n)?;
                log_picked(&names);
                Ok(picked)
            }
            Step::TopSeriesMax { n } => {
                let (picked, names) = list::top_series_max_all(&tables, *n)?;
                log_picked(&names);
                Ok(picked)
            }
            Step::TopSeriesQuantile { quantile } => list::top_series_quantile_all(&tables, *quantile),
            Step::NormalizeEach => list::norm_cols_each_all(&tables),
            Step::NormalizeAll => {
                let (normed, divisors) = list::norm_cols_all_each(&tables)?;
                log::debug!("Normalization divisors: {:?}", divisors);
                Ok(normed)
            }
            Step::Transpose => list::transpose_all(&tables),
        }
    }
}

fn log_picked(names: &[Vec<String>]) {
    for (i, picked) in names.iter().enumerate() {
        log::info!("Table #{}: kept {}", i, picked.join(", "));
    }
}

/// Get the description of all available steps (for documentation)
pub fn operations_description() -> String {
    r#"Available recipe steps:

| Step | Description | Parameters |
|------|-------------|------------|
| idx0 | Offset each index to start at zero (dates become elapsed seconds) | - |
| drop_columns | Remove columns where present | columns: list of names |
| normalize_by_factors | Divide table i by factor i | factors: one number per table |
| truncate | Keep the first rows of each table | rows: row count (default 1000) |
| truncate_to_shortest | Truncate to the shortest table | max_len: optional cap |
| drop_missing | Drop rows or columns with missing values | axis: rows/columns, how: any/all |
| set_index | Move a column into the index | column: column name |
| top_series_mean | Keep the n columns with the highest mean | n: column count |
| top_series_max | Keep the n columns with the highest maximum | n: column count |
| top_series_quantile | Keep columns whose mean is above a quantile of column means | quantile: 0 to 1 |
| normalize_each | Divide each column by its largest absolute value | - |
| normalize_all | Divide each table by its largest absolute value | - |
| transpose | Swap rows and columns | - |

Example steps in JSON:
[
  {"type": "drop_columns", "columns": ["Comment"]},
  {"type": "idx0"},
  {"type": "truncate_to_shortest", "max_len": 500},
  {"type": "top_series_quantile", "quantile": 0.9},
  {"type": "normalize_each"}
]"#
    .to_string()
}
