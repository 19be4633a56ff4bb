//! Language adapters.
//!
//! The verification pipeline stays language-agnostic. Adapters define how a
//! language checks syntax, locates the callable under test, and wraps it in
//! a runnable harness.

pub mod languages;
pub mod registry;

pub use registry::{adapter_for, adapter_for_extension, supported_languages};

use crate::config::types::{
    CallableSignature, CommandSpec, ExecutionResult, Result, SyntaxDiagnostic, VerifyError,
};
use crate::literal::CaseInputs;
use crate::safety::Sandbox;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Supported target languages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageTag {
    Python,
    JavaScript,
    TypeScript,
}

/// Static description of a language
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub display_name: &'static str,
    pub slug: &'static str,
    pub aliases: &'static [&'static str],
    /// File extension without the dot
    pub extension: &'static str,
    pub solution_file: &'static str,
    pub code_fence: &'static str,
}

impl LanguageTag {
    pub const ALL: [LanguageTag; 3] = [
        LanguageTag::Python,
        LanguageTag::JavaScript,
        LanguageTag::TypeScript,
    ];

    pub fn info(&self) -> LanguageInfo {
        match self {
            LanguageTag::Python => LanguageInfo {
                display_name: "Python 3",
                slug: "python3",
                aliases: &["python3", "python", "py"],
                extension: "py",
                solution_file: "solution.py",
                code_fence: "python",
            },
            LanguageTag::JavaScript => LanguageInfo {
                display_name: "JavaScript",
                slug: "javascript",
                aliases: &["javascript", "js", "node"],
                extension: "js",
                solution_file: "solution.js",
                code_fence: "javascript",
            },
            LanguageTag::TypeScript => LanguageInfo {
                display_name: "TypeScript",
                slug: "typescript",
                aliases: &["typescript", "ts"],
                extension: "ts",
                solution_file: "solution.ts",
                code_fence: "typescript",
            },
        }
    }

    pub fn slug(&self) -> &'static str {
        self.info().slug
    }

    /// Resolve a slug or alias, case-insensitively
    pub fn from_slug(slug: &str) -> Option<Self> {
        let wanted = slug.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.info().aliases.contains(&wanted.as_str()))
    }

    /// Resolve a file extension, with or without the leading dot
    pub fn from_extension(ext: &str) -> Option<Self> {
        let wanted = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tag| tag.info().extension == wanted)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Language adapter contract for syntax, introspection and harness stages.
pub trait LanguageAdapter: Send + Sync {
    fn language(&self) -> LanguageTag;

    fn info(&self) -> LanguageInfo {
        self.language().info()
    }

    /// Command that checks the staged source without running solution logic
    fn syntax_check_command(&self, source_path: &str) -> CommandSpec;

    /// Interpret a failed syntax check.
    ///
    /// `None` means the check failed for a reason other than syntax.
    fn syntax_diagnostic(
        &self,
        execution: &ExecutionResult,
        source_path: &str,
    ) -> Option<SyntaxDiagnostic>;

    /// Validate well-formedness in a checker process.
    fn check_syntax(&self, source: &str, sandbox: &Sandbox) -> Result<()> {
        let staged = sandbox.stage(&format!("syntax_check.{}", self.info().extension), source)?;
        let path = staged.path_string();
        let execution = sandbox.run_check(&self.syntax_check_command(&path))?;

        if execution.timed_out {
            return Err(VerifyError::Process(format!(
                "{} syntax check timed out after {:?}",
                self.info().display_name,
                sandbox.syntax_timeout()
            )));
        }
        if execution.success() {
            return Ok(());
        }

        match self.syntax_diagnostic(&execution, &path) {
            Some(diag) => Err(VerifyError::Syntax {
                message: diag.message,
                line: diag.line,
            }),
            None => {
                log::debug!(
                    "{} check exited with {:?} without a syntax diagnostic",
                    self.info().display_name,
                    execution.exit_code
                );
                Ok(())
            }
        }
    }

    /// Locate the callable under test and count its parameters.
    fn extract_signature(&self, source: &str) -> Result<CallableSignature>;

    /// Self-contained program that calls the callable once and prints the result.
    fn build_harness(
        &self,
        source: &str,
        signature: &CallableSignature,
        inputs: &CaseInputs,
    ) -> Result<String>;

    fn run_command(&self, harness_path: &str) -> CommandSpec;

    /// Programs this adapter launches
    fn toolchain(&self) -> Vec<String>;

    fn runtime_available(&self) -> bool {
        self.toolchain().iter().all(|p| find_on_path(p).is_some())
    }
}

/// Resolve `program` like a shell would: paths as-is, bare names via `$PATH`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = Path::new(program);
        return path.is_file().then(|| path.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Reject an input set whose size differs from the callable's arity.
pub(crate) fn check_arity(signature: &CallableSignature, inputs: &CaseInputs) -> Result<()> {
    if inputs.len() != signature.parameter_count {
        return Err(VerifyError::Extraction(format!(
            "`{}` takes {} parameter(s) but the test case supplies {}",
            signature.name,
            signature.parameter_count,
            inputs.len()
        )));
    }
    Ok(())
}

/// Last non-empty line of a stream
pub(crate) fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs_and_aliases_resolve() {
        assert_eq!(LanguageTag::from_slug("python3"), Some(LanguageTag::Python));
        assert_eq!(LanguageTag::from_slug("PY"), Some(LanguageTag::Python));
        assert_eq!(LanguageTag::from_slug("node"), Some(LanguageTag::JavaScript));
        assert_eq!(LanguageTag::from_slug("ts"), Some(LanguageTag::TypeScript));
        assert_eq!(LanguageTag::from_slug("cobol"), None);
    }

    #[test]
    fn test_extensions_resolve() {
        assert_eq!(LanguageTag::from_extension(".py"), Some(LanguageTag::Python));
        assert_eq!(LanguageTag::from_extension("ts"), Some(LanguageTag::TypeScript));
        assert_eq!(LanguageTag::from_extension("rs"), None);
    }

    #[test]
    fn test_slug_is_first_alias() {
        for tag in LanguageTag::ALL {
            assert_eq!(tag.info().aliases[0], tag.slug());
            assert_eq!(tag.to_string(), tag.slug());
        }
    }

    #[test]
    fn test_find_on_path_rejects_missing() {
        assert!(find_on_path("solvebox-no-such-program").is_none());
        assert!(find_on_path("sh").is_some());
    }

    #[test]
    fn test_last_line_skips_blank_lines() {
        assert_eq!(last_line("a\nb\n\n  \n"), Some("b"));
        assert_eq!(last_line("\n"), None);
    }
}
