use crate::config::types::{
    CallableSignature, CommandSpec, ExecutionResult, Result, SyntaxDiagnostic,
};
use crate::judge::languages::javascript::{build_js_harness, extract_js_signature};
use crate::judge::{find_on_path, LanguageAdapter, LanguageTag};
use crate::literal::CaseInputs;

/// TypeScript through `tsx` (esbuild strips types, no type checking)
#[derive(Debug, Clone)]
pub struct TypeScriptAdapter {
    /// Program plus leading arguments, e.g. `["npx", "--yes", "tsx"]`
    launcher: Vec<String>,
    extra_args: Vec<String>,
}

impl Default for TypeScriptAdapter {
    fn default() -> Self {
        Self::new(None, Vec::new())
    }
}

impl TypeScriptAdapter {
    pub fn new(interpreter: Option<String>, extra_args: Vec<String>) -> Self {
        let launcher = match interpreter {
            Some(program) => vec![program],
            None => default_launcher(),
        };
        Self {
            launcher,
            extra_args,
        }
    }

    fn command(&self) -> CommandSpec {
        let (program, leading) = match self.launcher.split_first() {
            Some((program, rest)) => (program.as_str(), rest),
            None => ("tsx", &[][..]),
        };
        CommandSpec::new(program).args(leading.iter().cloned())
    }
}

/// Prefer an installed `tsx`, fall back to `npx --yes tsx`.
fn default_launcher() -> Vec<String> {
    if find_on_path("tsx").is_some() {
        return vec!["tsx".to_string()];
    }
    if find_on_path("npx").is_some() {
        return vec!["npx".to_string(), "--yes".to_string(), "tsx".to_string()];
    }
    vec!["tsx".to_string()]
}

impl LanguageAdapter for TypeScriptAdapter {
    fn language(&self) -> LanguageTag {
        LanguageTag::TypeScript
    }

    // tsx has no check-only mode; loading the file transforms it with esbuild.
    fn syntax_check_command(&self, source_path: &str) -> CommandSpec {
        self.command().arg(source_path)
    }

    fn syntax_diagnostic(
        &self,
        execution: &ExecutionResult,
        _source_path: &str,
    ) -> Option<SyntaxDiagnostic> {
        esbuild_diagnostic(&execution.stderr)
    }

    fn extract_signature(&self, source: &str) -> Result<CallableSignature> {
        extract_js_signature(source)
    }

    fn build_harness(
        &self,
        source: &str,
        signature: &CallableSignature,
        inputs: &CaseInputs,
    ) -> Result<String> {
        build_js_harness(source, signature, inputs)
    }

    fn run_command(&self, harness_path: &str) -> CommandSpec {
        self.command()
            .args(self.extra_args.iter().cloned())
            .arg(harness_path)
    }

    fn toolchain(&self) -> Vec<String> {
        self.launcher.first().cloned().into_iter().collect()
    }
}

/// esbuild reports `<file>:<line>:<col>: ERROR: <message>`; anything else
/// (a top-level exception, say) is not a syntax failure.
fn esbuild_diagnostic(stderr: &str) -> Option<SyntaxDiagnostic> {
    let line = stderr.lines().find(|l| l.contains(": ERROR: "))?;
    let (location, message) = line.split_once(": ERROR: ")?;
    let mut parts = location.rsplitn(3, ':');
    let _column = parts.next();
    let line_number = parts.next().and_then(|n| n.trim().parse().ok());
    Some(SyntaxDiagnostic {
        message: message.trim().to_string(),
        line: line_number,
    })
}
