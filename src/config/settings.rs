//! Verifier settings loaded from JSON

use crate::config::types::{Result, VerifyError};
use crate::exec::SandboxRunner;
use crate::utils::output::OutputLimits;
use crate::verdict::ListOrder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV_VAR: &str = "SOLVEBOX_CONFIG";

/// Per-language overrides, keyed by canonical slug in `VerifierSettings::languages`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSettings {
    /// Interpreter binary used instead of the adapter's default
    pub interpreter: Option<String>,
    /// Extra arguments placed before the harness path
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierSettings {
    /// Wall-clock limit for one test case harness
    pub execution_timeout_ms: u64,
    /// Wall-clock limit for a toolchain syntax check
    pub syntax_timeout_ms: u64,
    /// Delay between SIGTERM and SIGKILL for a timed-out process group
    pub kill_grace_ms: u64,
    pub collection_timeout_ms: u64,
    pub stdout_limit_bytes: usize,
    pub stderr_limit_bytes: usize,
    pub list_order: ListOrder,
    /// Skip cases whose canonical input repeats an earlier case
    pub dedupe_inputs: bool,
    /// Parallel cases within one call (1 = sequential)
    pub case_workers: usize,
    /// Parallel calls in `Verifier::verify_many`
    pub call_workers: usize,
    /// Parent directory for run workspaces (system temp dir when unset)
    pub workspace_root: Option<PathBuf>,
    pub languages: HashMap<String, LanguageSettings>,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        let limits = OutputLimits::default();
        Self {
            execution_timeout_ms: 5000,
            syntax_timeout_ms: 10_000,
            kill_grace_ms: 200,
            collection_timeout_ms: limits.collection_timeout_ms,
            stdout_limit_bytes: limits.stdout_limit,
            stderr_limit_bytes: limits.stderr_limit,
            list_order: ListOrder::Strict,
            dedupe_inputs: false,
            case_workers: 1,
            call_workers: 4,
            workspace_root: None,
            languages: HashMap::new(),
        }
    }
}

impl VerifierSettings {
    /// Load settings from a JSON file; absent keys take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VerifyError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let settings: VerifierSettings = serde_json::from_str(&content).map_err(|e| {
            VerifyError::Config(format!("Failed to parse config JSON {}: {}", path.display(), e))
        })?;

        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from the first existing search path, or defaults when none exists.
    ///
    /// A path named by `$SOLVEBOX_CONFIG` must exist.
    pub fn load_default() -> Result<Self> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load_from_file(PathBuf::from(explicit));
        }

        match Self::search_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from_file(path),
            None => {
                log::debug!("No settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Explicit path if given, else the default search.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => Self::load_default(),
        }
    }

    /// `./solvebox.json`, then the XDG and home config locations
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("solvebox.json")];
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("solvebox").join("config.json"));
        }
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("solvebox")
                    .join("config.json"),
            );
        }
        paths
    }

    pub fn get_language_config(&self, slug: &str) -> Option<&LanguageSettings> {
        self.languages.get(&slug.to_lowercase())
    }

    /// Interpreter override for a language, if configured
    pub fn interpreter_for(&self, slug: &str) -> Option<&str> {
        self.get_language_config(slug)
            .and_then(|l| l.interpreter.as_deref())
    }

    pub fn extra_args_for(&self, slug: &str) -> &[String] {
        self.get_language_config(slug)
            .map(|l| l.extra_args.as_slice())
            .unwrap_or(&[])
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }

    pub fn syntax_timeout(&self) -> Duration {
        Duration::from_millis(self.syntax_timeout_ms)
    }

    pub fn output_limits(&self) -> OutputLimits {
        OutputLimits {
            stdout_limit: self.stdout_limit_bytes,
            stderr_limit: self.stderr_limit_bytes,
            collection_timeout_ms: self.collection_timeout_ms,
        }
    }

    pub fn runner(&self) -> SandboxRunner {
        SandboxRunner::new(self.output_limits(), Duration::from_millis(self.kill_grace_ms))
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
