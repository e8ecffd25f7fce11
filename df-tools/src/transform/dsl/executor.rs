//! Recipe executor
//!
//! Runs a recipe's steps over a table list, recording the shapes after each
//! step.

use crate::error::{RecipeError, RecipeResult};
use crate::models::TableList;

use super::recipe::Recipe;

/// What one step left behind
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Position of the step in the recipe
    pub index: usize,
    /// The step's `type` tag
    pub step: String,
    /// (rows, columns) of every table after the step
    pub shapes: Vec<(usize, usize)>,
}

/// Result of executing a recipe
#[derive(Debug)]
pub struct RecipeRun {
    /// Tables after the last step
    pub tables: TableList,
    /// One report per executed step
    pub reports: Vec<StepReport>,
}

impl RecipeRun {
    /// Get summary statistics
    pub fn summary(&self) -> String {
        let (rows, cols) = self
            .tables
            .iter()
            .fold((0, 0), |(r, c), t| (r + t.n_rows(), c + t.n_cols()));
        format!(
            "Executed: {} steps, {} tables, {} rows and {} columns in total",
            self.reports.len(),
            self.tables.len(),
            rows,
            cols
        )
    }
}

/// Execute a recipe on a table list
///
/// Steps run in order; the first failing step aborts the run with
/// [`RecipeError::StepFailed`].
pub fn execute(tables: TableList, recipe: &Recipe) -> RecipeResult<RecipeRun> {
    if recipe.steps.is_empty() {
        return Err(RecipeError::Empty);
    }

    let mut tables = tables;
    let mut reports = Vec::with_capacity(recipe.steps.len());

    for (index, step) in recipe.steps.iter().enumerate() {
        log::info!("Step {}: {}", index, step.name());
        tables = step.apply(tables).map_err(|source| RecipeError::StepFailed {
            index,
            step: step.name().to_string(),
            source,
        })?;

        let shapes: Vec<(usize, usize)> = tables.iter().map(|t| t.shape()).collect();
        log::debug!("Shapes after step {}: {:?}", index, shapes);
        reports.push(StepReport {
            index,
            step: step.name().to_string(),
            shapes,
        });
    }

    Ok(RecipeRun { tables, reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TableError;
    use crate::models::Table;
    use crate::transform::dsl::Step;

    fn tables() -> TableList {
        vec![
            Table::from_numeric(vec![("a", vec![1.0, 2.0, 3.0]), ("b", vec![4.0, 5.0, 6.0])])
                .unwrap(),
            Table::from_numeric(vec![("a", vec![1.0, 2.0]), ("b", vec![0.0, 0.0])]).unwrap(),
        ]
    }

    #[test]
    fn test_execute_records_shapes() {
        let recipe = Recipe::new()
            .with_step(Step::TruncateToShortest { max_len: None })
            .with_step(Step::DropColumns {
                columns: vec!["b".into()],
            })
            .with_step(Step::Transpose);

        let run = execute(tables(), &recipe).unwrap();
        assert_eq!(run.reports.len(), 3);
        assert_eq!(run.reports[0].shapes, vec![(2, 2), (2, 2)]);
        assert_eq!(run.reports[1].shapes, vec![(2, 1), (2, 1)]);
        assert_eq!(run.reports[2].step, "transpose");
        assert_eq!(run.tables[0].shape(), (1, 2));
        assert!(run.summary().contains("3 steps"));
    }

    #[test]
    fn test_execute_stops_at_failing_step() {
        let recipe = Recipe::new()
            .with_step(Step::Idx0)
            .with_step(Step::TopSeriesQuantile { quantile: 1.5 })
            .with_step(Step::Transpose);

        match execute(tables(), &recipe) {
            Err(RecipeError::StepFailed { index, step, source }) => {
                assert_eq!(index, 1);
                assert_eq!(step, "top_series_quantile");
                assert!(matches!(source, TableError::OutOfRange { .. }));
            }
            other => panic!("expected a step failure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_recipe_is_rejected() {
        assert!(matches!(
            execute(tables(), &Recipe::new()),
            Err(RecipeError::Empty)
        ));
    }
}
