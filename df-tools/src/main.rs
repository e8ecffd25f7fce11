//! df-tools CLI - Batch processing of CSV table lists
//!
//! # Main Commands
//!
//! ```bash
//! df-tools run a.csv b.csv --recipe recipe.json    # Apply a recipe to every file
//! df-tools concat --left a.csv --right a_stats.csv # Pairwise concatenation
//! df-tools summary a.csv b.csv                     # Mean of column sums per file
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! df-tools info a.csv b.csv      # Shape, columns and index kind per file
//! df-tools operations            # Show available recipe steps
//! df-tools example-recipe        # Show example recipe
//! ```

use clap::{ArgAction, Parser, Subcommand};
use df_tools::{
    concat_files, example_recipe, inspect_files, operations_description, run_files,
    summarize_files, table_to_string, Axis, ConcatOptions, CsvOptions, Join, Recipe, RunOptions,
    TransposedConcat,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "df-tools")]
#[command(about = "Batch operations on lists of CSV tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// How input files are read
#[derive(clap::Args)]
struct ReadArgs {
    /// CSV delimiter (auto-detect if not specified)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Text encoding (auto-detect if not specified)
    #[arg(short, long)]
    encoding: Option<String>,

    /// Do not read the first column as the row index
    #[arg(long)]
    no_index: bool,
}

impl ReadArgs {
    fn options(&self) -> CsvOptions {
        CsvOptions {
            delimiter: self.delimiter,
            encoding: self.encoding.clone(),
            index_column: !self.no_index,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show shape, columns and index kind of each file
    Info {
        /// Input CSV files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Apply a recipe to every file and write the results
    Run {
        /// Input CSV files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Recipe JSON file
        #[arg(short, long)]
        recipe: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "processed")]
        out_dir: PathBuf,

        /// Appended to each output file name
        #[arg(short, long, default_value = "_processed")]
        suffix: String,
    },

    /// Print the mean of column sums of each file
    Summary {
        /// Input CSV files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Dataset names, one per file (default: file names)
        #[arg(short, long, num_args = 1..)]
        names: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Concatenate left[i] with right[i] for every pair of files
    Concat {
        /// Left-hand CSV files
        #[arg(long, required = true, num_args = 1..)]
        left: Vec<PathBuf>,

        /// Right-hand CSV files
        #[arg(long, required = true, num_args = 1..)]
        right: Vec<PathBuf>,

        /// rows (0) to stack, columns (1) to place side by side
        #[arg(long, default_value = "rows")]
        axis: Axis,

        /// inner or outer
        #[arg(long, default_value = "inner")]
        join: Join,

        /// Transpose the right-hand tables first
        #[arg(long)]
        transpose: bool,

        /// Insert padding rows between the tables (with --transpose)
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        pad: bool,

        /// Label of the second padding row
        #[arg(long, default_value = "")]
        pad_name: String,

        /// Repeat the column names in the second padding row
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        repeat_columns: bool,

        /// Output directory
        #[arg(short, long, default_value = "concatenated")]
        out_dir: PathBuf,

        /// Appended to each output file name
        #[arg(short, long, default_value = "_concat")]
        suffix: String,
    },

    /// Show available recipe steps
    Operations,

    /// Show example recipe
    ExampleRecipe,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Info { files, read } => cmd_info(&files, &read.options()),

        Commands::Run {
            files,
            recipe,
            out_dir,
            suffix,
        } => cmd_run(&files, &recipe, out_dir, suffix),

        Commands::Summary {
            files,
            names,
            output,
            read,
        } => cmd_summary(&files, &names, output.as_deref(), &read.options()),

        Commands::Concat {
            left,
            right,
            axis,
            join,
            transpose,
            pad,
            pad_name,
            repeat_columns,
            out_dir,
            suffix,
        } => {
            let transposed = transpose.then(|| TransposedConcat {
                axis,
                join,
                pad,
                pad_name,
                repeat_column_names: repeat_columns,
            });
            let concat = ConcatOptions {
                axis,
                join,
                transposed,
            };
            cmd_concat(&left, &right, &concat, out_dir, suffix)
        }

        Commands::Operations => cmd_operations(),

        Commands::ExampleRecipe => cmd_example_recipe(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Level from `RUST_LOG`, `info` when unset.
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    let _ = builder.try_init();
}

fn cmd_info(files: &[PathBuf], options: &CsvOptions) -> Result<(), Box<dyn std::error::Error>> {
    for info in inspect_files(files, options)? {
        println!("📄 {}", info.name);
        println!("   Encoding: {}", info.encoding);
        println!("   Delimiter: '{}'", format_delimiter(info.delimiter));
        println!("   Shape: {} rows x {} columns", info.rows, info.columns.len());
        println!("   Index: {}", info.index_kind);
        println!("   Columns: {}", info.columns.join(", "));
        println!();
    }
    Ok(())
}

fn cmd_run(
    files: &[PathBuf],
    recipe_path: &Path,
    out_dir: PathBuf,
    suffix: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let recipe = Recipe::from_json(&fs::read_to_string(recipe_path)?)?;
    eprintln!(
        "📋 Recipe: {} ({} steps)",
        recipe_path.display(),
        recipe.steps.len()
    );
    if !recipe.description.is_empty() {
        eprintln!("   {}", recipe.description);
    }

    let options = RunOptions {
        out_dir,
        suffix,
        delimiter: recipe.csv.delimiter.unwrap_or(','),
    };
    let outcome = run_files(files, &recipe, &options)?;

    for report in &outcome.run.reports {
        eprintln!("   [{}] {} → {:?}", report.index, report.step, report.shapes);
    }
    eprintln!("\n⚙️  {}", outcome.run.summary());
    for path in &outcome.written {
        eprintln!("   💾 {}", path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_summary(
    files: &[PathBuf],
    names: &[String],
    output: Option<&Path>,
    options: &CsvOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = summarize_files(files, names, options)?;
    eprintln!("📊 Summarized {} datasets", table.n_rows());

    let csv = table_to_string(&table, options.delimiter.unwrap_or(','))?;
    write_output(&csv, output)?;
    Ok(())
}

fn cmd_concat(
    left: &[PathBuf],
    right: &[PathBuf],
    concat: &ConcatOptions,
    out_dir: PathBuf,
    suffix: String,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!(
        "🔗 Concatenating {} pairs along {} ({} join){}",
        left.len(),
        concat.axis,
        concat.join,
        if concat.transposed.is_some() { ", right side transposed" } else { "" }
    );

    let options = RunOptions {
        out_dir,
        suffix,
        delimiter: ',',
    };
    let written = concat_files(left, right, concat, &CsvOptions::default(), &options)?;
    for path in &written {
        eprintln!("   💾 {}", path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_operations() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", operations_description());
    Ok(())
}

fn cmd_example_recipe() -> Result<(), Box<dyn std::error::Error>> {
    let recipe = example_recipe();
    println!("{}", recipe.to_json()?);
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
