//! Recipe DSL for table-list processing
//!
//! This module provides:
//! - `recipe`: Recipe definition (the JSON document)
//! - `steps`: Available steps and what they do to a table list
//! - `executor`: Run a recipe on loaded tables
//!
//! ## Usage Flow
//!
//! ```text
//! CSV files → list::load_tables → Recipe::from_json → executor::execute → CSV files
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use df_tools::dsl::{execute, Recipe};
//! use df_tools::list::load_tables;
//!
//! // 1. Load the recipe
//! let recipe = Recipe::from_json(recipe_json)?;
//!
//! // 2. Load the tables with the recipe's CSV options
//! let tables = load_tables(&["run1.csv", "run2.csv"], "data", &recipe.csv)?;
//!
//! // 3. Execute
//! let run = execute(tables, &recipe)?;
//! eprintln!("{}", run.summary());
//! ```

pub mod executor;
pub mod recipe;
pub mod steps;

// Re-exports for convenience
pub use executor::{execute, RecipeRun, StepReport};
pub use recipe::{example_recipe, Recipe};
pub use steps::{operations_description, Step};
