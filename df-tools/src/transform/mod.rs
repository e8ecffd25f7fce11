//! Table processing.
//!
//! - `frame`: Operations on a single table
//! - `list`: The same operations over lists of tables
//! - `concat`: Pairwise concatenation
//! - `dsl`: Recipes of list operations
//! - `pipeline`: File-to-file processing

pub mod concat;
pub mod dsl;
pub mod frame;
pub mod list;
pub mod pipeline;

pub use concat::{concat, concat_pairs, concat_transposed_pairs, TransposedConcat};
pub use dsl::*;
pub use pipeline::*;
