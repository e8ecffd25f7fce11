//! High-level pipeline API: load CSV files, process them, write the results.
//!
//! These functions combine the lower layers (parser, list operations, recipe
//! executor) into the steps the CLI exposes.
//!
//! # Example
//!
//! ```rust,ignore
//! use df_tools::pipeline::{run_files, RunOptions};
//! use df_tools::dsl::Recipe;
//!
//! let recipe = Recipe::from_json(&std::fs::read_to_string("recipe.json")?)?;
//! let outcome = run_files(&["a.csv", "b.csv"], &recipe, &RunOptions::new("out"))?;
//! eprintln!("{}", outcome.run.summary());
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{Table, TableList};
use crate::parser::{read_table, write_table_file, CsvOptions};
use crate::transform::concat::{concat_pairs, concat_transposed_pairs, TransposedConcat};
use crate::transform::dsl::{execute, Recipe, RecipeRun};
use crate::transform::list::{column_avg_sum, index_kind, load_tables};
use crate::validation::{check_equal_lengths, Axis, Join};

/// Where and how results are written
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Output directory (created if missing)
    pub out_dir: PathBuf,
    /// Appended to each input file stem
    pub suffix: String,
    /// Output delimiter
    pub delimiter: char,
}

impl RunOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            suffix: "_processed".to_string(),
            delimiter: ',',
        }
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{}{}.csv", name, self.suffix))
    }
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub encoding: String,
    pub delimiter: char,
    pub rows: usize,
    pub columns: Vec<String>,
    pub index_kind: String,
}

/// Result of running a recipe over files
#[derive(Debug)]
pub struct RunOutcome {
    pub run: RecipeRun,
    /// Files written, one per surviving table
    pub written: Vec<PathBuf>,
}

/// File stem used to name a dataset.
pub fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load the files that exist, with their dataset names.
///
/// Missing files are skipped with a warning; finding none at all is an error.
fn load_named<P: AsRef<Path>>(
    paths: &[P],
    options: &CsvOptions,
) -> PipelineResult<(Vec<String>, TableList)> {
    let names: Vec<String> = paths
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| p.is_file())
        .map(dataset_name)
        .collect();
    let tables = load_tables(paths, "", options)?;

    if tables.is_empty() {
        return Err(PipelineError::NoTables(paths.len()));
    }
    Ok((names, tables))
}

fn write_all(
    names: &[String],
    tables: &[Table],
    options: &RunOptions,
) -> PipelineResult<Vec<PathBuf>> {
    std::fs::create_dir_all(&options.out_dir)?;

    let mut written = Vec::with_capacity(tables.len());
    for (name, table) in names.iter().zip(tables) {
        let path = options.output_path(name);
        write_table_file(table, &path, options.delimiter)?;
        log::info!(
            "Wrote '{}' ({} rows x {} columns)",
            path.display(),
            table.n_rows(),
            table.n_cols()
        );
        written.push(path);
    }
    Ok(written)
}

/// Read each file and describe it.
pub fn inspect_files<P: AsRef<Path>>(
    paths: &[P],
    options: &CsvOptions,
) -> PipelineResult<Vec<TableInfo>> {
    paths
        .iter()
        .map(|path| {
            let parsed = read_table(path, options)?;
            Ok(TableInfo {
                name: dataset_name(path.as_ref()),
                encoding: parsed.encoding,
                delimiter: parsed.delimiter,
                rows: parsed.table.n_rows(),
                columns: parsed
                    .table
                    .column_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                index_kind: index_kind(&parsed.table).to_string(),
            })
        })
        .collect()
}

/// Load the files, execute the recipe, and write one CSV per resulting table.
pub fn run_files<P: AsRef<Path>>(
    paths: &[P],
    recipe: &Recipe,
    options: &RunOptions,
) -> PipelineResult<RunOutcome> {
    let (names, tables) = load_named(paths, &recipe.csv)?;
    log::info!("Loaded {} of {} files", tables.len(), paths.len());

    let run = execute(tables, recipe)?;
    let written = write_all(&names, &run.tables, options)?;
    Ok(RunOutcome { run, written })
}

/// The "mean of column sums" table for a set of files.
///
/// `names` label the datasets; when empty, the file stems are used.
pub fn summarize_files<P: AsRef<Path>>(
    paths: &[P],
    names: &[String],
    options: &CsvOptions,
) -> PipelineResult<Table> {
    let (stems, tables) = load_named(paths, options)?;
    let names = if names.is_empty() { &stems[..] } else { names };
    Ok(column_avg_sum(&tables, names)?)
}

/// How `concat_files` combines each pair
#[derive(Debug, Clone, Default)]
pub struct ConcatOptions {
    pub axis: Axis,
    pub join: Join,
    /// Transpose the right-hand table first, with optional padding rows
    pub transposed: Option<TransposedConcat>,
}

/// File pairs whose two sides both exist.
///
/// A pair with a missing side is dropped as a whole, so every later pair keeps
/// its partner.
fn existing_pairs<'a, P: AsRef<Path>>(
    left: &'a [P],
    right: &'a [P],
) -> PipelineResult<(Vec<&'a Path>, Vec<&'a Path>)> {
    check_equal_lengths(&[left.len(), right.len()], "left and right file lists")?;

    Ok(left
        .iter()
        .zip(right)
        .map(|(l, r)| (l.as_ref(), r.as_ref()))
        .enumerate()
        .filter(|(i, (l, r))| {
            let missing: Vec<String> = [l, r]
                .iter()
                .filter(|p| !p.is_file())
                .map(|p| p.display().to_string())
                .collect();
            if !missing.is_empty() {
                log::warn!(
                    "Pair #{} skipped; file(s) not found: {}",
                    i,
                    missing.join(", ")
                );
            }
            missing.is_empty()
        })
        .map(|(_, pair)| pair)
        .unzip())
}

/// Concatenate `left[i]` with `right[i]` and write the results, named after
/// the left-hand files.
///
/// The lists must have the same length. Pairs with a missing file are skipped
/// with a warning.
pub fn concat_files<P: AsRef<Path>>(
    left: &[P],
    right: &[P],
    concat: &ConcatOptions,
    csv: &CsvOptions,
    options: &RunOptions,
) -> PipelineResult<Vec<PathBuf>> {
    let (left, right) = existing_pairs(left, right)?;
    if left.is_empty() {
        return Err(PipelineError::NoTables(0));
    }
    let (names, left) = load_named(&left, csv)?;
    let (_, right) = load_named(&right, csv)?;

    let tables = match &concat.transposed {
        Some(transposed) => concat_transposed_pairs(&left, &right, transposed)?,
        None => concat_pairs(&left, &right, concat.axis, concat.join)?,
    };
    write_all(&names, &tables, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::dsl::Step;
    use polars::prelude::AnyValue;
    use std::fs;
    use tempfile::TempDir;

    fn write_inputs(dir: &Path) -> Vec<PathBuf> {
        let a = dir.join("run_a.csv");
        let b = dir.join("run_b.csv");
        fs::write(&a, ",x,y\n0,1,10\n1,2,20\n2,3,30\n").unwrap();
        fs::write(&b, ",x,y\n5,4,1\n6,8,1\n").unwrap();
        vec![a, b]
    }

    #[test]
    fn test_run_files_writes_outputs() {
        let dir = TempDir::new().unwrap();
        let inputs = write_inputs(dir.path());
        let recipe = Recipe::new()
            .with_step(Step::Idx0)
            .with_step(Step::TruncateToShortest { max_len: None });

        let options = RunOptions::new(dir.path().join("out"));
        let outcome = run_files(&inputs, &recipe, &options).unwrap();

        assert_eq!(outcome.written.len(), 2);
        assert!(outcome.written[1].ends_with("run_b_processed.csv"));

        let back = read_table(&outcome.written[1], &CsvOptions::default()).unwrap();
        assert_eq!(back.table.shape(), (2, 2));
        assert_eq!(back.table.label(1).and_then(|l| l.as_f64()), Some(1.0));
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let mut inputs = write_inputs(dir.path());
        inputs.insert(0, dir.path().join("absent.csv"));

        let table = summarize_files(&inputs, &[], &CsvOptions::default()).unwrap();
        assert_eq!(table.n_rows(), 2);
        // run_b: column sums 12 and 2
        assert_eq!(table.numeric_column("Mean of Column Sums").unwrap()[1], 7.0);
        assert_eq!(table.value(0, 0), Some(AnyValue::String("run_a")));

        let none = summarize_files(&[dir.path().join("absent.csv")], &[], &CsvOptions::default());
        assert!(matches!(none, Err(PipelineError::NoTables(1))));
    }

    #[test]
    fn test_inspect_files() {
        let dir = TempDir::new().unwrap();
        let inputs = write_inputs(dir.path());
        let info = inspect_files(&inputs, &CsvOptions::default()).unwrap();
        assert_eq!(info[0].name, "run_a");
        assert_eq!(info[0].rows, 3);
        assert_eq!(info[0].columns, vec!["x", "y"]);
        assert_eq!(info[0].index_kind, "number");
        assert_eq!(info[0].delimiter, ',');
    }

    #[test]
    fn test_concat_files() {
        let dir = TempDir::new().unwrap();
        let inputs = write_inputs(dir.path());
        let options = RunOptions {
            suffix: "_concat".into(),
            ..RunOptions::new(dir.path().join("out"))
        };

        let written = concat_files(
            &inputs[..1],
            &inputs[1..],
            &ConcatOptions::default(),
            &CsvOptions::default(),
            &options,
        )
        .unwrap();

        let back = read_table(&written[0], &CsvOptions::default()).unwrap();
        assert!(written[0].ends_with("run_a_concat.csv"));
        assert_eq!(back.table.shape(), (5, 2));
    }

    #[test]
    fn test_concat_files_keeps_pairs_aligned_when_files_missing() {
        let dir = TempDir::new().unwrap();
        let path = |name: &str| dir.path().join(name);
        fs::write(path("a.csv"), ",v\n0,1\n1,2\n2,3\n").unwrap();
        fs::write(path("c.csv"), ",v\n0,7\n1,8\n").unwrap();
        fs::write(path("x.csv"), ",v\n9,100\n").unwrap();
        fs::write(path("y.csv"), ",v\n0,5\n1,5\n2,5\n3,5\n4,5\n").unwrap();

        let left = vec![path("a.csv"), path("b.csv"), path("c.csv")];
        let right = vec![path("x.csv"), path("y.csv"), path("z.csv")];
        let options = RunOptions::new(path("out"));

        let written = concat_files(
            &left,
            &right,
            &ConcatOptions::default(),
            &CsvOptions::default(),
            &options,
        )
        .unwrap();

        // (a, x) is the only complete pair; c must not be paired with y
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("a_processed.csv"));
        let back = read_table(&written[0], &CsvOptions::default()).unwrap();
        assert_eq!(
            back.table.numeric_column("v").unwrap(),
            vec![1.0, 2.0, 3.0, 100.0]
        );

        let uneven = concat_files(
            &left[..2],
            &right,
            &ConcatOptions::default(),
            &CsvOptions::default(),
            &options,
        );
        assert!(matches!(uneven, Err(PipelineError::Table(_))));

        let none = concat_files(
            &left[1..2],
            &right[2..],
            &ConcatOptions::default(),
            &CsvOptions::default(),
            &options,
        );
        assert!(matches!(none, Err(PipelineError::NoTables(0))));
    }
}
