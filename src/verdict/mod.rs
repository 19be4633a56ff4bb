//! Result comparison
//!
//! Turns one harness execution into a case outcome by re-parsing its output.

pub mod comparator;

pub use comparator::{classify, compare, ListOrder};
