//! Operations on lists of tables.
//!
//! Most functions apply a [`super::frame`] operation to each table and
//! return new tables. The `&mut` variants (`drop_columns`, `truncate_all`,
//! `dropna_all`, `set_indices`) modify the tables in place. Paired inputs,
//! such as tables with factors or tables with names, must have equal lengths.

use std::path::Path;

use polars::prelude::*;

use crate::error::{CsvResult, TableResult};
use crate::models::{numeric, Table, TableList};
use crate::parser::{read_table, CsvOptions};
use crate::validation::{check_equal_lengths, Axis, DropHow};

use super::frame;

/// Column names of the table built by [`column_avg_sum`].
pub const DATASET_NAME_COLUMN: &str = "Dataset Name";
pub const MEAN_OF_SUMS_COLUMN: &str = "Mean of Column Sums";

/// Load one table per CSV file.
///
/// Each path is joined onto `base_dir` (pass `""` for paths that are already
/// complete). Files that do not exist are skipped with a warning; files that
/// exist but cannot be parsed are an error.
pub fn load_tables<P: AsRef<Path>>(
    paths: &[P],
    base_dir: impl AsRef<Path>,
    options: &CsvOptions,
) -> CsvResult<TableList> {
    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        let full = base_dir.as_ref().join(path.as_ref());
        if !full.is_file() {
            log::warn!("File '{}' not found; not included in table list", full.display());
            continue;
        }
        let result = read_table(&full, options)?;
        log::info!(
            "File '{}' added to list ({} rows x {} columns)",
            path.as_ref().display(),
            result.table.n_rows(),
            result.table.n_cols()
        );
        tables.push(result.table);
    }
    Ok(tables)
}

/// Offset every table's index so that it starts at zero.
pub fn idx0_all(tables: &[Table]) -> TableResult<TableList> {
    tables.iter().map(frame::idx0).collect()
}

/// Drop the listed columns from every table in place.
///
/// Returns the number of columns dropped from each table.
pub fn drop_columns<S: AsRef<str>>(tables: &mut [Table], names: &[S]) -> Vec<usize> {
    tables
        .iter_mut()
        .enumerate()
        .map(|(i, table)| {
            let dropped = frame::drop_cols(table, names);
            log::debug!("Columns dropped from table #{}: {}", i, dropped);
            dropped
        })
        .collect()
}

/// Copies of the tables without the listed columns; the inputs are untouched.
pub fn without_columns<S: AsRef<str>>(tables: &[Table], names: &[S]) -> TableList {
    let mut copies = tables.to_vec();
    drop_columns(&mut copies, names);
    copies
}

/// Divide table *i* by factor *i*.
pub fn normalize_by_factors(tables: &[Table], factors: &[f64]) -> TableResult<TableList> {
    check_equal_lengths(&[tables.len(), factors.len()], "tables and factors")?;
    tables
        .iter()
        .zip(factors)
        .map(|(table, &factor)| frame::divide_by(table, factor))
        .collect()
}

/// One "average column sum" per table.
///
/// Each table's columns are summed (nulls skipped, an all-null column sums
/// to 0) and the sums are averaged. The result has one row per table, with
/// the dataset name in the first column and the averaged sum in the second.
pub fn column_avg_sum<S: AsRef<str>>(tables: &[Table], names: &[S]) -> TableResult<Table> {
    check_equal_lengths(&[tables.len(), names.len()], "tables and dataset names")?;

    let mut avg_sums = Vec::with_capacity(tables.len());
    for table in tables {
        let sums = table
            .data()
            .get_columns()
            .iter()
            .map(|c| numeric(c).map(|values| values.sum().unwrap_or(0.0)))
            .collect::<TableResult<Vec<f64>>>()?;
        avg_sums.push(Float64Chunked::from_vec(PlSmallStr::EMPTY, sums).mean());
    }

    let names: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();
    let data = DataFrame::new(vec![
        Series::new(DATASET_NAME_COLUMN.into(), names).into_column(),
        Series::new(MEAN_OF_SUMS_COLUMN.into(), avg_sums).into_column(),
    ])?;
    Table::from_frame(data)
}

/// Smallest row count among the tables, capped at `max_len`.
pub fn find_min_rows(tables: &[Table], max_len: usize) -> usize {
    tables
        .iter()
        .map(Table::n_rows)
        .fold(max_len, usize::min)
}

/// Keep at most the first `rows` rows of each table, in place.
pub fn truncate_all(tables: &mut [Table], rows: usize) {
    for table in tables.iter_mut() {
        table.truncate(rows);
    }
}

/// Drop missing values from every table in place.
pub fn dropna_all(tables: &mut [Table], axis: Axis, how: DropHow) -> TableResult<()> {
    for table in tables.iter_mut() {
        let before = table.shape();
        *table = frame::dropna(table, axis, how)?;
        log::debug!("Shape before dropna: {:?}, after: {:?}", before, table.shape());
    }
    Ok(())
}

/// Copies of the tables with missing values dropped.
pub fn dropna_copies(tables: &[Table], axis: Axis, how: DropHow) -> TableResult<TableList> {
    let mut copies = tables.to_vec();
    dropna_all(&mut copies, axis, how)?;
    Ok(copies)
}

/// Move `column` into the index of every table that has it.
///
/// Returns how many tables were re-indexed. Tables without the column are
/// skipped with a warning.
pub fn set_indices(tables: &mut [Table], column: &str) -> usize {
    let mut reindexed = 0;
    for (i, table) in tables.iter_mut().enumerate() {
        match table.set_index(column) {
            Ok(()) => reindexed += 1,
            Err(_) => log::warn!(
                "Target index '{}' not found in table #{}; skipping re-indexing",
                column,
                i
            ),
        }
    }
    reindexed
}

/// [`frame::top_series_mean`] for every table.
pub fn top_series_mean_all(
    tables: &[Table],
    n: usize,
) -> TableResult<(TableList, Vec<Vec<String>>)> {
    log::info!(
        "Picking the top {} series by mean column value for {} tables",
        n,
        tables.len()
    );
    let picked = tables
        .iter()
        .map(|t| frame::top_series_mean(t, n))
        .collect::<TableResult<Vec<_>>>()?;
    Ok(picked.into_iter().unzip())
}

/// [`frame::top_series_max`] for every table.
pub fn top_series_max_all(
    tables: &[Table],
    n: usize,
) -> TableResult<(TableList, Vec<Vec<String>>)> {
    log::info!(
        "Picking the top {} series by maximum column value for {} tables",
        n,
        tables.len()
    );
    let picked = tables
        .iter()
        .map(|t| frame::top_series_max(t, n))
        .collect::<TableResult<Vec<_>>>()?;
    Ok(picked.into_iter().unzip())
}

/// [`frame::top_series_quantile`] for every table; the threshold is computed
/// separately for each table.
pub fn top_series_quantile_all(tables: &[Table], quant: f64) -> TableResult<TableList> {
    tables
        .iter()
        .map(|t| frame::top_series_quantile(t, quant))
        .collect()
}

/// [`frame::norm_cols_each`] for every table.
pub fn norm_cols_each_all(tables: &[Table]) -> TableResult<TableList> {
    tables.iter().map(frame::norm_cols_each).collect()
}

/// [`frame::norm_cols_all`] for every table, with each table's divisor.
pub fn norm_cols_all_each(tables: &[Table]) -> TableResult<(TableList, Vec<f64>)> {
    let normed = tables
        .iter()
        .map(frame::norm_cols_all)
        .collect::<TableResult<Vec<_>>>()?;
    Ok(normed.into_iter().unzip())
}

/// Transpose every table.
pub fn transpose_all(tables: &[Table]) -> TableResult<TableList> {
    tables.iter().map(Table::transpose).collect()
}

/// Kind of a table's index, for summaries.
pub fn index_kind(table: &Table) -> &'static str {
    if table.is_empty() {
        return "empty";
    }
    match table.index().dtype() {
        DataType::Float64 => "number",
        DataType::Datetime(_, _) => "time",
        _ => "text",
    }
}
