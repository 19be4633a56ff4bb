// Settings validation
// Fail fast with actionable errors before any process is spawned

use crate::config::settings::VerifierSettings;
use crate::config::types::{Result, VerifyError};
use crate::judge::LanguageTag;

/// Validation result with detailed errors
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validate settings before use; errors are fatal, warnings are logged.
pub fn validate_settings(settings: &VerifierSettings) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_timeouts(settings, &mut result);
    validate_limits(settings, &mut result);
    validate_workers(settings, &mut result);
    validate_paths(settings, &mut result);
    validate_languages(settings, &mut result);

    for warning in &result.warnings {
        log::warn!("Settings: {}", warning);
    }

    if !result.is_valid() {
        return Err(VerifyError::Config(format!(
            "Settings validation failed:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

fn validate_timeouts(settings: &VerifierSettings, result: &mut ValidationResult) {
    if settings.execution_timeout_ms == 0 {
        result.add_error("execution_timeout_ms cannot be zero".to_string());
    }
    if settings.syntax_timeout_ms == 0 {
        result.add_error("syntax_timeout_ms cannot be zero".to_string());
    }
    if settings.collection_timeout_ms == 0 {
        result.add_error("collection_timeout_ms cannot be zero".to_string());
    }

    if settings.execution_timeout_ms > 60_000 {
        result.add_warning(format!(
            "execution_timeout_ms {} is above one minute per case",
            settings.execution_timeout_ms
        ));
    }
    if settings.kill_grace_ms > 5000 {
        result.add_warning(format!(
            "kill_grace_ms {} delays every timeout verdict by over 5s",
            settings.kill_grace_ms
        ));
    }
}

fn validate_limits(settings: &VerifierSettings, result: &mut ValidationResult) {
    if settings.stdout_limit_bytes == 0 {
        result.add_error("stdout_limit_bytes cannot be zero".to_string());
    } else if settings.stdout_limit_bytes < 1024 {
        result.add_warning(format!(
            "stdout_limit_bytes {} is very low, large results will be truncated",
            settings.stdout_limit_bytes
        ));
    }
    if settings.stderr_limit_bytes == 0 {
        result.add_error("stderr_limit_bytes cannot be zero".to_string());
    }
}

fn validate_workers(settings: &VerifierSettings, result: &mut ValidationResult) {
    if settings.case_workers == 0 {
        result.add_error("case_workers must be at least 1".to_string());
    }
    if settings.call_workers == 0 {
        result.add_error("call_workers must be at least 1".to_string());
    }
}

fn validate_paths(settings: &VerifierSettings, result: &mut ValidationResult) {
    if let Some(root) = &settings.workspace_root {
        if !root.is_absolute() {
            result.add_error(format!("workspace_root must be absolute path: {:?}", root));
        } else if !root.exists() {
            result.add_warning(format!(
                "workspace_root does not exist and will be created: {:?}",
                root
            ));
        }
    }
}

fn validate_languages(settings: &VerifierSettings, result: &mut ValidationResult) {
    for (key, language) in &settings.languages {
        match LanguageTag::from_slug(key) {
            None => {
                result.add_warning(format!("settings for unknown language `{}` are ignored", key))
            }
            Some(tag) if tag.slug() != key => result.add_warning(format!(
                "settings key `{}` is not a canonical slug and is ignored; use `{}`",
                key,
                tag.slug()
            )),
            Some(_) => {}
        }
        if matches!(language.interpreter.as_deref(), Some(i) if i.trim().is_empty()) {
            result.add_error(format!("languages.{}.interpreter cannot be empty", key));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::LanguageSettings;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_are_valid() {
        let result = validate_settings(&VerifierSettings::default()).unwrap();
        assert!(result.is_valid());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_zero_timeout_is_fatal() {
        let settings = VerifierSettings {
            execution_timeout_ms: 0,
            ..VerifierSettings::default()
        };
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("execution_timeout_ms"));
    }

    #[test]
    fn test_zero_workers_is_fatal() {
        let settings = VerifierSettings {
            case_workers: 0,
            ..VerifierSettings::default()
        };
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_relative_workspace_root_is_fatal() {
        let settings = VerifierSettings {
            workspace_root: Some(PathBuf::from("relative/dir")),
            ..VerifierSettings::default()
        };
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_unknown_language_is_warning() {
        let mut settings = VerifierSettings::default();
        settings
            .languages
            .insert("cobol".to_string(), LanguageSettings::default());
        let result = validate_settings(&settings).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_alias_language_key_is_warning() {
        let mut settings = VerifierSettings::default();
        settings
            .languages
            .insert("py".to_string(), LanguageSettings::default());
        let result = validate_settings(&settings).unwrap();
        assert!(result.warnings[0].contains("python3"));
    }

    #[test]
    fn test_empty_interpreter_is_fatal() {
        let mut settings = VerifierSettings::default();
        settings.languages.insert(
            "python3".to_string(),
            LanguageSettings {
                interpreter: Some(" ".to_string()),
                extra_args: Vec::new(),
            },
        );
        assert!(validate_settings(&settings).is_err());
    }
}
