//! Operations on a single table.
//!
//! Index offsetting, row and column averages, column dropping, top-series
//! selection, normalization and missing-value removal. Reductions are polars
//! aggregations over `Float64` columns, so nulls are skipped. The list-level
//! functions in [`super::list`] apply these to every table of a collection.

use polars::prelude::*;
use std::cmp::Ordering;

use crate::error::{TableError, TableResult};
use crate::models::{numeric, Label, Table};
use crate::validation::{check_unit_interval, Axis, DropHow};

/// Name of the single column produced by [`avg_cols`] and [`avg_rows`].
pub const AVERAGES_COLUMN: &str = "Averages";

/// Subtract the first index label from every label.
///
/// Turns a time series into "time elapsed" form where the first row is at 0.
/// Units are not interpreted: numeric labels are subtracted as-is, and
/// timestamp labels become elapsed seconds.
pub fn idx0(table: &Table) -> TableResult<Table> {
    if table.is_empty() {
        return Ok(table.clone());
    }

    let index = table.index();
    let shifted: Float64Chunked = match index.dtype() {
        DataType::Float64 => {
            let labels = index.f64()?;
            let first = labels.get(0).ok_or_else(|| non_numeric_label(table, 0))?;
            labels - first
        }
        DataType::Datetime(_, _) => {
            let micros = index.cast(&DataType::Int64)?;
            let micros = micros.i64()?;
            let first = micros.get(0).ok_or_else(|| non_numeric_label(table, 0))?;
            micros
                .into_iter()
                .map(|v| v.map(|v| (v - first) as f64 / 1e6))
                .collect()
        }
        _ => {
            let position = table
                .labels()
                .iter()
                .position(|l| !matches!(Label::parse(&l.to_string()), Label::Number(_)))
                .unwrap_or(0);
            return Err(non_numeric_label(table, position));
        }
    };

    Table::new(shifted.into_series(), table.data().clone())
}

fn non_numeric_label(table: &Table, position: usize) -> TableError {
    TableError::NonNumericIndex {
        position,
        label: table.label(position).map(|l| l.to_string()).unwrap_or_default(),
    }
}

/// Mean of every column, as a one-column table indexed by column name.
pub fn avg_cols(table: &Table) -> TableResult<Table> {
    let means = column_scores(table, |values| values.mean())?;
    let index = Series::new(PlSmallStr::EMPTY, table.column_names());
    let data = DataFrame::new(vec![
        Series::new(AVERAGES_COLUMN.into(), means).into_column()
    ])?;
    Table::new(index, data)
}

/// Mean of every row, as a one-column table with the original index.
///
/// The numeric columns are transposed so each row becomes a column and the
/// per-row means are ordinary column means.
pub fn avg_rows(table: &Table) -> TableResult<Table> {
    let means: Vec<Option<f64>> = if table.n_cols() == 0 {
        vec![None; table.n_rows()]
    } else {
        let columns = table
            .data()
            .get_columns()
            .iter()
            .map(|c| numeric(c).map(|values| values.into_series().into_column()))
            .collect::<TableResult<Vec<_>>>()?;
        let mut numbers = DataFrame::new(columns)?;
        numbers
            .transpose(None, None)?
            .get_columns()
            .iter()
            .map(|row| numeric(row).map(|values| values.mean()))
            .collect::<TableResult<Vec<_>>>()?
    };
    let data = DataFrame::new(vec![
        Series::new(AVERAGES_COLUMN.into(), means).into_column()
    ])?;
    Table::new(table.index().clone(), data)
}

/// Drop every listed column present in the table; returns how many were dropped.
///
/// Absent names are logged and skipped.
pub fn drop_cols<S: AsRef<str>>(table: &mut Table, names: &[S]) -> usize {
    let mut dropped = 0;
    for name in names {
        let name = name.as_ref();
        if table.has_column(name) && table.drop_column(name) {
            dropped += 1;
        } else {
            log::warn!("Column '{}' not present; skipping", name);
        }
    }
    dropped
}

/// The `n` columns with the highest means, best first, and their names.
pub fn top_series_mean(table: &Table, n: usize) -> TableResult<(Table, Vec<String>)> {
    top_series_by(table, n, |values| values.mean())
}

/// The `n` columns with the highest maxima, best first, and their names.
pub fn top_series_max(table: &Table, n: usize) -> TableResult<(Table, Vec<String>)> {
    top_series_by(table, n, |values| values.max())
}

fn column_scores(
    table: &Table,
    score: fn(&Float64Chunked) -> Option<f64>,
) -> TableResult<Vec<Option<f64>>> {
    table
        .data()
        .get_columns()
        .iter()
        .map(|c| numeric(c).map(|values| score(&values)))
        .collect()
}

/// Descending order with undefined scores last.
fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => b.total_cmp(&a),
    }
}

fn top_series_by(
    table: &Table,
    n: usize,
    score: fn(&Float64Chunked) -> Option<f64>,
) -> TableResult<(Table, Vec<String>)> {
    if n > table.n_cols() {
        return Err(TableError::NotEnoughColumns {
            requested: n,
            available: table.n_cols(),
        });
    }

    let scores = column_scores(table, score)?;
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable sort: ties keep the earlier column first
    order.sort_by(|&a, &b| descending(scores[a], scores[b]));
    order.truncate(n);

    let names = table.column_names();
    let picked = order.iter().map(|&p| names[p].to_string()).collect();
    Ok((table.select_positions(&order)?, picked))
}

/// Columns whose mean is strictly above the `quant` quantile of all column
/// means, in their original order.
///
/// The threshold is the linearly interpolated quantile of the means.
pub fn top_series_quantile(table: &Table, quant: f64) -> TableResult<Table> {
    check_unit_interval("quantile", quant)?;

    let means = column_scores(table, |values| values.mean())?;
    let threshold = means
        .iter()
        .copied()
        .collect::<Float64Chunked>()
        .quantile(quant, QuantileMethod::Linear)?;

    let keep: Vec<usize> = means
        .iter()
        .enumerate()
        .filter(|(_, m)| matches!((m, threshold), (Some(m), Some(t)) if *m > t))
        .map(|(p, _)| p)
        .collect();

    log::debug!(
        "Quantile {} threshold {:?}: kept {} of {} columns",
        quant,
        threshold,
        keep.len(),
        table.n_cols()
    );
    table.select_positions(&keep)
}

/// Largest absolute value of a column, ignoring nulls.
fn max_abs(values: &Float64Chunked) -> Option<f64> {
    match (values.max(), values.min()) {
        (Some(hi), Some(lo)) => Some(hi.abs().max(lo.abs())),
        _ => None,
    }
}

fn usable_divisor(divisor: Option<f64>) -> Option<f64> {
    divisor.filter(|d| *d != 0.0 && d.is_finite())
}

/// Divide each column by its own largest absolute value.
///
/// Values end up in `[-1, 1]`. Columns that are all zero or all missing are
/// left unchanged.
pub fn norm_cols_each(table: &Table) -> TableResult<Table> {
    let mut out = table.clone();
    for column in table.data().get_columns() {
        let values = numeric(column)?;
        match usable_divisor(max_abs(&values)) {
            Some(divisor) => out.replace_column(&values / divisor)?,
            None => log::warn!(
                "Column '{}' has no non-zero values; left unnormalized",
                column.name()
            ),
        }
    }
    Ok(out)
}

/// Divide every column by the largest absolute value in the whole table.
///
/// Returns the normalized table and the divisor (NaN when the table holds no
/// values). When the divisor is zero or undefined the table is returned
/// unchanged.
pub fn norm_cols_all(table: &Table) -> TableResult<(Table, f64)> {
    let columns = table
        .data()
        .get_columns()
        .iter()
        .map(numeric)
        .collect::<TableResult<Vec<_>>>()?;
    let divisor = columns
        .iter()
        .filter_map(max_abs)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));

    let Some(divisor) = usable_divisor(divisor) else {
        log::warn!("Table has no non-zero values; left unnormalized");
        return Ok((table.clone(), divisor.unwrap_or(f64::NAN)));
    };

    let mut out = table.clone();
    for values in &columns {
        out.replace_column(values / divisor)?;
    }
    Ok((out, divisor))
}

/// Divide every value by `factor`.
pub fn divide_by(table: &Table, factor: f64) -> TableResult<Table> {
    if factor == 0.0 || !factor.is_finite() {
        return Err(TableError::InvalidParameter {
            parameter: "factor".to_string(),
            value: factor.to_string(),
            expected: "a finite, non-zero number".to_string(),
        });
    }
    let mut out = table.clone();
    for column in table.data().get_columns() {
        out.replace_column(&numeric(column)? / factor)?;
    }
    Ok(out)
}

/// Drop rows or columns holding nulls.
///
/// [`DropHow::Any`] drops on the first null, [`DropHow::All`] only when no
/// value is present. As in pandas, `All` drops every row of a table without
/// columns and every column of a table without rows.
pub fn dropna(table: &Table, axis: Axis, how: DropHow) -> TableResult<Table> {
    let columns = table.data().get_columns();
    match axis {
        Axis::Rows => {
            let keep = match how {
                DropHow::Any => columns.iter().fold(
                    BooleanChunked::full(PlSmallStr::EMPTY, true, table.n_rows()),
                    |keep, c| &keep & &c.is_not_null(),
                ),
                DropHow::All => columns.iter().fold(
                    BooleanChunked::full(PlSmallStr::EMPTY, false, table.n_rows()),
                    |keep, c| &keep | &c.is_not_null(),
                ),
            };
            table.filter_rows(&keep)
        }
        Axis::Columns => {
            let keep: Vec<usize> = columns
                .iter()
                .enumerate()
                .filter(|(_, c)| match how {
                    DropHow::Any => c.null_count() == 0,
                    DropHow::All => c.null_count() < c.len(),
                })
                .map(|(p, _)| p)
                .collect();
            table.select_positions(&keep)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Table {
        Table::from_numeric(vec![
            ("low", vec![1.0, 2.0, 3.0]),
            ("high", vec![10.0, 20.0, 30.0]),
            ("peak", vec![0.0, 100.0, -5.0]),
            ("neg", vec![-4.0, -2.0, -6.0]),
        ])
        .unwrap()
    }

    fn with_nulls() -> Table {
        let frame = df!(
            "a" => [Some(1.0), None, None],
            "b" => [Some(2.0), Some(3.0), None],
            "c" => [None::<f64>, None, None]
        )
        .unwrap();
        Table::from_frame(frame).unwrap()
    }

    #[test]
    fn test_idx0_numeric() {
        let table = sample()
            .with_index(vec![5.0.into(), 7.5.into(), 10.0.into()])
            .unwrap();
        let shifted = idx0(&table).unwrap();
        assert_eq!(
            shifted.labels(),
            vec![Label::Number(0.0), Label::Number(2.5), Label::Number(5.0)]
        );
        assert!(shifted.data().equals_missing(table.data()));
    }

    #[test]
    fn test_idx0_time() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let index = vec![
            Label::Time(day.and_hms_opt(0, 0, 0).unwrap()),
            Label::Time(day.and_hms_opt(0, 1, 30).unwrap()),
            Label::Time(day.and_hms_opt(1, 0, 0).unwrap()),
        ];
        let table = sample().with_index(index).unwrap();
        let shifted = idx0(&table).unwrap();
        assert_eq!(
            shifted.labels(),
            vec![Label::Number(0.0), Label::Number(90.0), Label::Number(3600.0)]
        );
    }

    #[test]
    fn test_idx0_rejects_text_index() {
        let table = sample()
            .with_index(vec![0.0.into(), "x".into(), 2.0.into()])
            .unwrap();
        assert!(matches!(
            idx0(&table),
            Err(TableError::NonNumericIndex { position: 1, .. })
        ));
    }

    #[test]
    fn test_idx0_empty() {
        let table = Table::default();
        assert_eq!(idx0(&table).unwrap(), table);
    }

    #[test]
    fn test_avg_cols() {
        let avgs = avg_cols(&sample()).unwrap();
        assert_eq!(avgs.column_names(), vec![AVERAGES_COLUMN]);
        assert_eq!(avgs.label(1), Some(Label::Text("high".into())));
        assert_eq!(
            avgs.numeric_column(AVERAGES_COLUMN).unwrap(),
            vec![2.0, 20.0, 95.0 / 3.0, -4.0]
        );
    }

    #[test]
    fn test_avg_rows_skips_missing() {
        let frame = df!("a" => [Some(1.0), None], "b" => [3.0, 4.0]).unwrap();
        let table = Table::from_frame(frame).unwrap();
        let avgs = avg_rows(&table).unwrap();
        assert_eq!(avgs.numeric_column(AVERAGES_COLUMN).unwrap(), vec![2.0, 4.0]);
        assert_eq!(avgs.labels(), table.labels());
    }

    #[test]
    fn test_drop_cols_counts_present_only() {
        let mut table = sample();
        assert_eq!(drop_cols(&mut table, &["low", "absent", "neg"]), 2);
        assert_eq!(table.column_names(), vec!["high", "peak"]);
    }

    #[test]
    fn test_top_series_mean() {
        let (top, names) = top_series_mean(&sample(), 2).unwrap();
        assert_eq!(names, vec!["peak", "high"]);
        assert_eq!(top.column_names(), vec!["peak", "high"]);
    }

    #[test]
    fn test_top_series_max() {
        let (_, names) = top_series_max(&sample(), 3).unwrap();
        assert_eq!(names, vec!["peak", "high", "low"]);
    }

    #[test]
    fn test_top_series_ties_and_nan() {
        let table = Table::from_numeric(vec![
            ("empty", vec![f64::NAN, f64::NAN]),
            ("a", vec![1.0, 1.0]),
            ("b", vec![1.0, 1.0]),
        ])
        .unwrap();
        let (_, names) = top_series_mean(&table, 3).unwrap();
        assert_eq!(names, vec!["a", "b", "empty"]);
    }

    #[test]
    fn test_top_series_too_many() {
        assert_eq!(
            top_series_mean(&sample(), 5).unwrap_err(),
            TableError::NotEnoughColumns {
                requested: 5,
                available: 4
            }
        );
    }

    #[test]
    fn test_top_series_quantile() {
        // Means: 2, 20, 31.67, -4; median threshold 11
        let top = top_series_quantile(&sample(), 0.5).unwrap();
        assert_eq!(top.column_names(), vec!["high", "peak"]);

        let none = top_series_quantile(&sample(), 1.0).unwrap();
        assert_eq!(none.n_cols(), 0);

        assert!(top_series_quantile(&sample(), 1.5).is_err());
    }

    #[test]
    fn test_norm_cols_each() {
        let normed = norm_cols_each(&sample()).unwrap();
        assert_eq!(normed.numeric_column("low").unwrap(), vec![1.0 / 3.0, 2.0 / 3.0, 1.0]);
        assert_eq!(normed.numeric_column("neg").unwrap(), vec![-4.0 / 6.0, -2.0 / 6.0, -1.0]);
        assert_eq!(normed.numeric_column("peak").unwrap(), vec![0.0, 1.0, -0.05]);
    }

    #[test]
    fn test_norm_cols_each_leaves_zero_column() {
        let table = Table::from_numeric(vec![("z", vec![0.0, 0.0]), ("a", vec![2.0, -4.0])]).unwrap();
        let normed = norm_cols_each(&table).unwrap();
        assert_eq!(normed.numeric_column("z").unwrap(), vec![0.0, 0.0]);
        assert_eq!(normed.numeric_column("a").unwrap(), vec![0.5, -1.0]);
        assert_eq!(normed.column_names(), vec!["z", "a"]);
    }

    #[test]
    fn test_norm_cols_all() {
        let (normed, divisor) = norm_cols_all(&sample()).unwrap();
        assert_eq!(divisor, 100.0);
        assert_eq!(normed.numeric_column("high").unwrap(), vec![0.1, 0.2, 0.3]);
        assert_eq!(normed.numeric_column("neg").unwrap(), vec![-0.04, -0.02, -0.06]);
    }

    #[test]
    fn test_norm_cols_all_without_values() {
        let table = Table::from_numeric(vec![("a", vec![f64::NAN])]).unwrap();
        let (normed, divisor) = norm_cols_all(&table).unwrap();
        assert!(divisor.is_nan());
        assert_eq!(normed, table);
    }

    #[test]
    fn test_norm_rejects_text() {
        let table = Table::from_frame(df!("a" => ["x"]).unwrap()).unwrap();
        assert!(norm_cols_each(&table).is_err());
        assert!(norm_cols_all(&table).is_err());
    }

    #[test]
    fn test_divide_by() {
        let halved = divide_by(&sample(), 2.0).unwrap();
        assert_eq!(halved.numeric_column("high").unwrap(), vec![5.0, 10.0, 15.0]);
        assert!(divide_by(&sample(), 0.0).is_err());
    }

    #[test]
    fn test_dropna() {
        let table = with_nulls();

        assert_eq!(dropna(&table, Axis::Rows, DropHow::Any).unwrap().n_rows(), 0);
        let rows_all = dropna(&table, Axis::Rows, DropHow::All).unwrap();
        assert_eq!(rows_all.labels(), vec![Label::Number(0.0), Label::Number(1.0)]);

        assert_eq!(dropna(&table, Axis::Columns, DropHow::Any).unwrap().n_cols(), 0);
        assert_eq!(
            dropna(&table, Axis::Columns, DropHow::All).unwrap().column_names(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_dropna_all_on_empty_dimensions() {
        // No columns: every row is all-missing
        let no_columns = with_nulls().select_positions(&[]).unwrap();
        assert_eq!(no_columns.n_rows(), 3);
        assert_eq!(dropna(&no_columns, Axis::Rows, DropHow::All).unwrap().n_rows(), 0);
        assert_eq!(dropna(&no_columns, Axis::Rows, DropHow::Any).unwrap().n_rows(), 3);

        // No rows: every column is all-missing
        let no_rows = sample().head(0);
        assert_eq!(dropna(&no_rows, Axis::Columns, DropHow::All).unwrap().n_cols(), 0);
        assert_eq!(dropna(&no_rows, Axis::Columns, DropHow::Any).unwrap().n_cols(), 4);
    }
}
