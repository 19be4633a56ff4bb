//! Configuration
//!
//! Error taxonomy and shared types, JSON settings, and settings validation.

pub mod settings;
pub mod types;
pub mod validator;

pub use settings::{LanguageSettings, VerifierSettings};
pub use validator::{validate_settings, ValidationResult};
