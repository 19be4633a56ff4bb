//! Per-language adapter implementations

pub mod javascript;
pub mod python;
pub mod typescript;
