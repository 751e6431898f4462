pub mod clean;
pub mod extract;

pub use extract::{extract_rows, Taxon};
