//! Recipe definition
//!
//! A recipe names the CSV options used to load the inputs and the ordered
//! steps applied to the resulting table list.

use serde::{Deserialize, Serialize};

use super::steps::Step;
use crate::parser::CsvOptions;
use crate::validation::{Axis, DropHow};

/// A complete processing recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Version of the recipe format
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// How the input files are read
    #[serde(default)]
    pub csv: CsvOptions,

    /// Steps, applied in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Recipe {
    /// Create an empty recipe
    pub fn new() -> Self {
        Self {
            version: default_version(),
            description: String::new(),
            csv: CsvOptions::default(),
            steps: Vec::new(),
        }
    }

    /// Parse a recipe from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Append a step
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Names of the steps, in order
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(Step::name).collect()
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::new()
    }
}

/// A small recipe showing the common steps
pub fn example_recipe() -> Recipe {
    Recipe {
        description: "Align runs to a common length and keep the strongest series".to_string(),
        ..Recipe::new()
    }
    .with_step(Step::DropColumns {
        columns: vec!["Comment".to_string()],
    })
    .with_step(Step::Idx0)
    .with_step(Step::DropMissing {
        axis: Axis::Rows,
        how: DropHow::Any,
    })
    .with_step(Step::TruncateToShortest { max_len: None })
    .with_step(Step::TopSeriesMean { n: 5 })
    .with_step(Step::NormalizeEach)
}
