//! Domain models for df-tools.
//!
//! This module contains the in-memory table representation shared by every
//! operation in the crate:
//!
//! - [`Label`] - A row label of a table index (number, timestamp or text)
//! - [`Table`] - A polars `DataFrame` plus an ordered row index `Series`
//! - [`TableList`] - An ordered collection of tables
//!
//! Values live in polars columns. Missing values are nulls, numeric columns
//! are `Float64` with NaN normalized to null, and timestamp indexes are
//! microsecond `Datetime` series.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TableError, TableResult};

/// An ordered collection of tables, e.g. several related time series.
pub type TableList = Vec<Table>;

/// Datetime layouts tried, in order, when parsing index labels.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];

/// Date-only layouts, interpreted as midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Tokens read as a missing value.
pub(crate) const MISSING_TOKENS: &[&str] =
    &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Layout used when a timestamp label is rendered as text.
const LABEL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

fn time_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Microseconds, None)
}

// =============================================================================
// Label
// =============================================================================

/// A row label in a table index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// Numeric label (sample number, elapsed time, ...).
    Number(f64),
    /// Timestamp label.
    Time(NaiveDateTime),
    /// Free-form label.
    Text(String),
}

impl Label {
    /// Parse a raw label: number first, then datetime or date, then text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Label::Number(n);
            }
        }
        parse_datetime(trimmed)
            .map(Label::Time)
            .unwrap_or_else(|| Label::Text(trimmed.to_string()))
    }

    /// Numeric value of the label, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Label::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Label for one index value. Nulls become empty text.
    fn from_any(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Label::Text(String::new()),
            AnyValue::Float64(v) => Label::Number(v),
            AnyValue::Datetime(v, unit, _) => timestamp(v, unit)
                .map(Label::Time)
                .unwrap_or(Label::Number(v as f64)),
            AnyValue::String(s) => Label::Text(s.to_string()),
            AnyValue::StringOwned(s) => Label::Text(s.to_string()),
            other => match other.extract::<f64>() {
                Some(v) => Label::Number(v),
                None => Label::Text(other.to_string()),
            },
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(n) => write!(f, "{}", n),
            Label::Time(t) => write!(f, "{}", t.format(LABEL_TIME_FORMAT)),
            Label::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Label {
    fn from(value: f64) -> Self {
        Label::Number(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn timestamp(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let utc = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    };
    utc.map(|t| t.naive_utc())
}

/// Build an index series from labels.
///
/// All-number labels give a `Float64` series, all-timestamp labels a
/// microsecond `Datetime` series, anything else a `String` series of the
/// rendered labels.
pub fn label_series(labels: &[Label]) -> TableResult<Series> {
    if labels.iter().all(|l| matches!(l, Label::Number(_))) {
        let values: Vec<f64> = labels.iter().filter_map(Label::as_f64).collect();
        return Ok(Series::new(PlSmallStr::EMPTY, values));
    }
    if labels.iter().all(|l| matches!(l, Label::Time(_))) {
        let micros: Vec<i64> = labels
            .iter()
            .filter_map(|l| match l {
                Label::Time(t) => Some(t.and_utc().timestamp_micros()),
                _ => None,
            })
            .collect();
        return Ok(Series::new(PlSmallStr::EMPTY, micros).cast(&time_dtype())?);
    }
    let text: Vec<String> = labels.iter().map(Label::to_string).collect();
    Ok(Series::new(PlSmallStr::EMPTY, text))
}

/// Default `0..n` numeric index.
pub fn default_index(rows: usize) -> Series {
    let values: Vec<f64> = (0..rows).map(|i| i as f64).collect();
    Series::new(PlSmallStr::EMPTY, values)
}

// =============================================================================
// Column normalization
// =============================================================================

fn nan_to_null(values: &Float64Chunked) -> Float64Chunked {
    values
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect::<Float64Chunked>()
        .with_name(values.name().clone())
}

fn normalize_index(index: Series) -> TableResult<Series> {
    let index = index.with_name(PlSmallStr::EMPTY);
    let dtype = index.dtype().clone();
    let normalized = match &dtype {
        DataType::Float64 | DataType::String => index,
        DataType::Datetime(TimeUnit::Microseconds, _) => index,
        DataType::Date | DataType::Datetime(_, _) => index.cast(&time_dtype())?,
        d if d.is_numeric() => index.cast(&DataType::Float64)?,
        _ => index.cast(&DataType::String)?,
    };
    Ok(normalized)
}

fn normalize_column(column: &Column) -> TableResult<Column> {
    let series = column.as_materialized_series();
    let normalized = match series.dtype() {
        DataType::Float64 => nan_to_null(series.f64()?).into_series(),
        DataType::Date => series.cast(&time_dtype())?,
        d if d.is_numeric() => nan_to_null(series.cast(&DataType::Float64)?.f64()?).into_series(),
        _ => series.clone(),
    };
    Ok(normalized.into_column())
}

/// Numeric view of a column.
///
/// Numeric and all-null columns are cast to `Float64`. Any other column
/// fails on its first non-null value.
pub(crate) fn numeric(column: &Column) -> TableResult<Float64Chunked> {
    let series = column.as_materialized_series();
    match series.dtype() {
        DataType::Float64 => Ok(series.f64()?.clone()),
        d if d.is_numeric() || *d == DataType::Null => {
            Ok(series.cast(&DataType::Float64)?.f64()?.clone())
        }
        _ if series.null_count() == series.len() => Ok(Float64Chunked::full_null(
            series.name().clone(),
            series.len(),
        )),
        _ => Err(first_non_numeric(series)),
    }
}

fn first_non_numeric(series: &Series) -> TableError {
    let (row, value) = (0..series.len())
        .find_map(|row| match series.get(row) {
            Ok(AnyValue::Null) | Err(_) => None,
            Ok(AnyValue::String(s)) => Some((row, s.to_string())),
            Ok(other) => Some((row, other.to_string())),
        })
        .unwrap_or((0, String::new()));
    TableError::NonNumeric {
        column: series.name().to_string(),
        row,
        value,
    }
}

// =============================================================================
// Table
// =============================================================================

/// A table: an ordered row index and a frame of equally long columns.
///
/// The index is kept beside the frame so row operations can filter both
/// with the same mask. Column names are unique, as polars requires.
#[derive(Debug, Clone)]
pub struct Table {
    index: Series,
    data: DataFrame,
}

impl Table {
    /// Create a table, checking that the frame height matches the index.
    ///
    /// Numeric columns become `Float64` with NaN as null, dates become
    /// microsecond timestamps.
    pub fn new(index: Series, data: DataFrame) -> TableResult<Self> {
        if data.width() > 0 && data.height() != index.len() {
            return Err(TableError::LengthMismatch {
                what: "index and columns".into(),
                lengths: vec![index.len(), data.height()],
            });
        }
        let columns = data
            .get_columns()
            .iter()
            .map(normalize_column)
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Self {
            index: normalize_index(index)?,
            data: DataFrame::new(columns)?,
        })
    }

    /// Wrap a frame with a default `0..n` index.
    pub fn from_frame(data: DataFrame) -> TableResult<Self> {
        Self::new(default_index(data.height()), data)
    }

    /// Create a numeric table with a default `0..n` index.
    ///
    /// # Example
    /// ```
    /// use df_tools::Table;
    ///
    /// let table = Table::from_numeric(vec![
    ///     ("a", vec![1.0, 2.0]),
    ///     ("b", vec![3.0, 4.0]),
    /// ]).unwrap();
    /// assert_eq!(table.shape(), (2, 2));
    /// ```
    pub fn from_numeric<S: AsRef<str>>(columns: Vec<(S, Vec<f64>)>) -> TableResult<Self> {
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Series::new(name.as_ref().into(), values).into_column())
            .collect();
        Self::from_frame(DataFrame::new(columns)?)
    }

    /// Replace the index, keeping the columns.
    pub fn with_index(self, labels: Vec<Label>) -> TableResult<Self> {
        Self::new(label_series(&labels)?, self.data)
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.data.width()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The index series (unnamed).
    pub fn index(&self) -> &Series {
        &self.index
    }

    /// The index as labels.
    pub fn labels(&self) -> Vec<Label> {
        (0..self.index.len()).filter_map(|i| self.label(i)).collect()
    }

    pub fn label(&self, row: usize) -> Option<Label> {
        self.index.get(row).ok().map(Label::from_any)
    }

    /// The column frame, without the index.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|n| n.as_str())
            .collect()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.data.get_column_index(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_position(name).is_some()
    }

    pub fn column(&self, name: &str) -> TableResult<&Column> {
        self.data
            .column(name)
            .map_err(|_| TableError::ColumnNotFound(name.to_string()))
    }

    /// Value at `(row, column position)`.
    pub fn value(&self, row: usize, col: usize) -> Option<AnyValue<'_>> {
        self.data.get_columns().get(col)?.get(row).ok()
    }

    /// Numeric view of a named column; nulls become NaN.
    pub fn numeric_column(&self, name: &str) -> TableResult<Vec<f64>> {
        let values = numeric(self.column(name)?)?;
        Ok(values
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Replace a column with new numeric values of the same name.
    pub(crate) fn replace_column(&mut self, values: Float64Chunked) -> TableResult<()> {
        self.data.with_column(nan_to_null(&values).into_series())?;
        Ok(())
    }

    /// New table with the named columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> TableResult<Table> {
        let positions = names
            .iter()
            .map(|name| {
                self.column_position(name.as_ref())
                    .ok_or_else(|| TableError::ColumnNotFound(name.as_ref().to_string()))
            })
            .collect::<TableResult<Vec<_>>>()?;
        self.select_positions(&positions)
    }

    /// New table with the columns at the given positions.
    pub fn select_positions(&self, positions: &[usize]) -> TableResult<Table> {
        let columns = positions
            .iter()
            .filter_map(|&p| self.data.get_columns().get(p).cloned())
            .collect();
        Ok(Table {
            index: self.index.clone(),
            data: DataFrame::new(columns)?,
        })
    }

    /// Remove the column with this name. Returns whether it existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        self.data.drop_in_place(name).is_ok()
    }

    /// Keep only the rows whose mask entry is `true`.
    pub fn filter_rows(&self, keep: &BooleanChunked) -> TableResult<Table> {
        let data = if self.data.width() == 0 {
            DataFrame::empty()
        } else {
            self.data.filter(keep)?
        };
        Ok(Table {
            index: self.index.filter(keep)?,
            data,
        })
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            index: self.index.head(Some(n)),
            data: self.data.head(Some(n)),
        }
    }

    /// Keep at most the first `n` rows, in place.
    pub fn truncate(&mut self, n: usize) {
        *self = self.head(n);
    }

    /// Move a column into the index.
    ///
    /// Numeric columns become numeric labels; text is parsed like a CSV index
    /// label (datetime if possible). Nulls become empty text labels.
    pub fn set_index(&mut self, name: &str) -> TableResult<()> {
        let column = self
            .data
            .drop_in_place(name)
            .map_err(|_| TableError::ColumnNotFound(name.to_string()))?;
        let series = column.as_materialized_series();
        self.index = match series.dtype() {
            DataType::String => {
                let labels: Vec<Label> = series
                    .str()?
                    .into_iter()
                    .map(|v| v.map(Label::parse).unwrap_or(Label::Text(String::new())))
                    .collect();
                label_series(&labels)?
            }
            _ => normalize_index(series.clone())?,
        };
        Ok(())
    }

    /// Swap rows and columns.
    ///
    /// Index labels become column names and column names become text labels.
    /// Mixed column types are unified by polars to their common supertype.
    pub fn transpose(&self) -> TableResult<Table> {
        let names: Vec<String> = self.labels().iter().map(Label::to_string).collect();
        let index = Series::new(PlSmallStr::EMPTY, self.column_names());
        if self.n_cols() == 0 {
            let columns = names
                .iter()
                .map(|n| Series::new_empty(n.as_str().into(), &DataType::Float64).into_column())
                .collect();
            return Table::new(index, DataFrame::new(columns)?);
        }
        let mut data = self.data.clone();
        let mut flipped = data.transpose(None, None)?;
        flipped.set_column_names(names)?;
        Table::new(index, flipped)
    }
}

impl Default for Table {
    fn default() -> Self {
        Self {
            index: Series::new_empty(PlSmallStr::EMPTY, &DataType::Float64),
            data: DataFrame::empty(),
        }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.column_names() == other.column_names()
            && self.index.equals_missing(&other.index)
            && self.data.equals_missing(&other.data)
    }
}
