//! Concatenation of tables, singly and pairwise over two lists.
//!
//! Along [`Axis::Rows`] the second table is stacked below the first with
//! `vstack`, and the columns are combined according to the [`Join`]. Along
//! [`Axis::Columns`] the tables are joined side by side on their index
//! labels with a polars join.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::TableResult;
use crate::models::{label_series, Label, Table, TableList};
use crate::validation::{check_equal_lengths, Axis, Join};

/// Scratch column names used while joining on the index.
const KEY: &str = "__df_tools_key";
const LEFT_ROW: &str = "__df_tools_left_row";
const RIGHT_ROW: &str = "__df_tools_right_row";

/// Concatenate two tables.
pub fn concat(a: &Table, b: &Table, axis: Axis, join: Join) -> TableResult<Table> {
    match axis {
        Axis::Rows => concat_rows(a, b, join),
        Axis::Columns => concat_columns(a, b, join),
    }
}

/// Type both halves of a stacked column share.
///
/// Numbers of different widths meet at `Float64`; anything else mixed falls
/// back to `String`, like an object column.
fn common_dtype(upper: Option<&DataType>, lower: Option<&DataType>) -> DataType {
    match (upper, lower) {
        (Some(x), Some(y)) if x == y => x.clone(),
        (Some(d), None) | (None, Some(d)) => d.clone(),
        (Some(DataType::Null), Some(d)) | (Some(d), Some(DataType::Null)) => d.clone(),
        (Some(x), Some(y)) if x.is_numeric() && y.is_numeric() => DataType::Float64,
        (Some(_), Some(_)) => DataType::String,
        (None, None) => DataType::Null,
    }
}

fn conform(column: Option<&Column>, name: &str, rows: usize, dtype: &DataType) -> TableResult<Column> {
    Ok(match column {
        Some(c) if c.dtype() == dtype => c.clone(),
        Some(c) => c.cast(dtype)?,
        None => Series::full_null(name.into(), rows, dtype).into_column(),
    })
}

fn concat_rows(a: &Table, b: &Table, join: Join) -> TableResult<Table> {
    let mut names: Vec<&str> = a
        .column_names()
        .into_iter()
        .filter(|n| join == Join::Outer || b.has_column(n))
        .collect();
    if join == Join::Outer {
        names.extend(b.column_names().into_iter().filter(|n| !a.has_column(n)));
    }

    let mut upper = Vec::with_capacity(names.len());
    let mut lower = Vec::with_capacity(names.len());
    for name in &names {
        let top = a.data().column(name).ok();
        let bottom = b.data().column(name).ok();
        let dtype = common_dtype(top.map(Column::dtype), bottom.map(Column::dtype));
        upper.push(conform(top, name, a.n_rows(), &dtype)?);
        lower.push(conform(bottom, name, b.n_rows(), &dtype)?);
    }

    let data = if names.is_empty() {
        DataFrame::empty()
    } else {
        DataFrame::new(upper)?.vstack(&DataFrame::new(lower)?)?
    };

    let mut labels = a.labels();
    labels.extend(b.labels());
    Table::new(label_series(&labels)?, data)
}

/// Index labels as a join key. Indexes of different kinds are compared as
/// rendered text.
fn join_keys(a: &Table, b: &Table) -> (Series, Series) {
    if a.index().dtype() == b.index().dtype() {
        return (a.index().clone(), b.index().clone());
    }
    let text = |t: &Table| {
        let labels: Vec<String> = t.labels().iter().map(Label::to_string).collect();
        Series::new(PlSmallStr::EMPTY, labels)
    };
    (text(a), text(b))
}

fn keyed(table: &Table, key: Series) -> TableResult<DataFrame> {
    let mut frame = table.data().clone();
    frame.insert_column(0, key.with_name(KEY.into()))?;
    Ok(frame)
}

/// Rows are matched on the first occurrence of each label in `b`. Inner
/// keeps the left table's order; outer appends labels only `b` has, in `b`'s
/// order. Columns `b` shares with `a` get polars' `_right` suffix.
fn concat_columns(a: &Table, b: &Table, join: Join) -> TableResult<Table> {
    let (left_key, right_key) = join_keys(a, b);

    let mut seen = HashSet::new();
    let first: Vec<bool> = b.labels().iter().map(|l| seen.insert(l.to_string())).collect();
    let first = BooleanChunked::from_slice(PlSmallStr::EMPTY, &first);

    let left = keyed(a, left_key)?;
    let right = keyed(b, right_key)?.filter(&first)?;

    let how = match join {
        Join::Inner => JoinType::Inner,
        Join::Outer => JoinType::Full,
    };
    let mut joined = left
        .lazy()
        .with_row_index(LEFT_ROW, None)
        .join(
            right.lazy().with_row_index(RIGHT_ROW, None),
            [col(KEY)],
            [col(KEY)],
            JoinArgs::new(how).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .sort(
            [LEFT_ROW, RIGHT_ROW],
            SortMultipleOptions::default().with_nulls_last(true),
        )
        .collect()?;

    let index = joined.drop_in_place(KEY)?.as_materialized_series().clone();
    let data = joined.drop_many([LEFT_ROW, RIGHT_ROW]);
    Table::new(index, data)
}

fn warn_on_shape_mismatch(a: &Table, b: &Table, axis: Axis, pair: usize) {
    match axis {
        Axis::Rows if a.n_cols() != b.n_cols() => log::warn!(
            "Pair #{}: stacking rows, but the tables have {} and {} columns; proceeding",
            pair,
            a.n_cols(),
            b.n_cols()
        ),
        Axis::Columns if a.n_rows() != b.n_rows() => log::warn!(
            "Pair #{}: concatenating side by side, but the tables have {} and {} rows; proceeding",
            pair,
            a.n_rows(),
            b.n_rows()
        ),
        _ => {}
    }
}

/// Concatenate `left[i]` with `right[i]` for every pair.
///
/// Shape mismatches on the non-concatenated axis are logged, not rejected.
pub fn concat_pairs(
    left: &[Table],
    right: &[Table],
    axis: Axis,
    join: Join,
) -> TableResult<TableList> {
    check_equal_lengths(&[left.len(), right.len()], "left and right table lists")?;

    left.iter()
        .zip(right)
        .enumerate()
        .map(|(i, (a, b))| {
            warn_on_shape_mismatch(a, b, axis, i);
            concat(a, b, axis, join)
        })
        .collect()
}

/// Options for [`concat_transposed_pairs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransposedConcat {
    #[serde(default)]
    pub axis: Axis,

    #[serde(default)]
    pub join: Join,

    /// Insert two padding rows between the tables
    #[serde(default = "default_true")]
    pub pad: bool,

    /// Label of the second padding row
    #[serde(default)]
    pub pad_name: String,

    /// Write the left table's column names into the second padding row
    #[serde(default = "default_true")]
    pub repeat_column_names: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TransposedConcat {
    fn default() -> Self {
        Self {
            axis: Axis::Rows,
            join: Join::Inner,
            pad: true,
            pad_name: String::new(),
            repeat_column_names: true,
        }
    }
}

/// Two rows labelled `""` and `pad_name`, with the left table's columns.
///
/// The first row is all null. The second holds the column names as text, or
/// nulls of the column's own type when names are not repeated.
fn padding(left: &Table, options: &TransposedConcat) -> TableResult<Table> {
    let columns = left
        .data()
        .get_columns()
        .iter()
        .map(|c| {
            if options.repeat_column_names {
                Series::new(c.name().clone(), [None, Some(c.name().as_str())]).into_column()
            } else {
                Series::full_null(c.name().clone(), 2, c.dtype()).into_column()
            }
        })
        .collect();
    let labels = [Label::Text(String::new()), Label::Text(options.pad_name.clone())];
    Table::new(label_series(&labels)?, DataFrame::new(columns)?)
}

/// Transpose `right[i]` and concatenate it onto `left[i]` for every pair.
///
/// Useful for appending a per-series summary (one row per column of the left
/// table) below the data itself.
pub fn concat_transposed_pairs(
    left: &[Table],
    right: &[Table],
    options: &TransposedConcat,
) -> TableResult<TableList> {
    check_equal_lengths(&[left.len(), right.len()], "left and right table lists")?;

    left.iter()
        .zip(right)
        .enumerate()
        .map(|(i, (a, b))| {
            let flipped = b.transpose()?;
            warn_on_shape_mismatch(a, &flipped, options.axis, i);

            let first = if options.pad {
                concat(a, &padding(a, options)?, options.axis, options.join)?
            } else {
                a.clone()
            };
            concat(&first, &flipped, options.axis, options.join)
        })
        .collect()
}
