use crate::config::types::{
    CallableSignature, CommandSpec, ExecutionResult, Result, SyntaxDiagnostic, VerifyError,
};
use crate::judge::languages::python::balanced_parens;
use crate::judge::{check_arity, last_line, LanguageAdapter, LanguageTag};
use crate::literal::{split_nested, CaseInputs, LiteralValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;

const DEFAULT_INTERPRETER: &str = "node";

/// Sends console output to stderr before any candidate code runs, so
/// top-level logging cannot reach the result line.
const CONSOLE_GUARD: &str = r#";(function () {
  const __sbLog = (...a) => console.error(...a);
  console.log = __sbLog;
  console.info = __sbLog;
  console.debug = __sbLog;
})();
"#;

/// Canonical printer plus guarded call; `{CALL}` is substituted per case.
/// Thenables are awaited so async solutions are judged on their value.
const HARNESS_TAIL: &str = r#"

;(function () {
  const __sbEncode = (v) => {
    if (v === null || v === undefined) return "null";
    if (typeof v === "boolean") return v ? "true" : "false";
    if (typeof v === "number") {
      if (!Number.isFinite(v)) throw new RangeError("result contains a non-finite number");
      return String(v);
    }
    if (typeof v === "bigint") return v.toString();
    if (typeof v === "string") return JSON.stringify(v);
    if (Array.isArray(v) || ArrayBuffer.isView(v)) return "[" + Array.from(v, __sbEncode).join(",") + "]";
    if (v instanceof Set) return "[" + Array.from(v, __sbEncode).join(",") + "]";
    if (v instanceof Map) {
      return "{" + Array.from(v, ([k, x]) => JSON.stringify(String(k)) + ":" + __sbEncode(x)).join(",") + "}";
    }
    if (typeof v === "object") {
      return "{" + Object.keys(v).map((k) => JSON.stringify(k) + ":" + __sbEncode(v[k])).join(",") + "}";
    }
    throw new TypeError("cannot encode result of type " + typeof v);
  };
  const __sbFail = (e) => {
    const name = e && e.name ? e.name : "Error";
    const message = e && e.message !== undefined ? e.message : String(e);
    process.stderr.write(name + ": " + String(message).replace(/\n/g, " ") + "\n");
    process.exit(1);
  };
  const __sbEmit = (v) => {
    let text;
    try {
      text = __sbEncode(v);
    } catch (e) {
      __sbFail(e);
    }
    process.stdout.write(text + "\n");
  };
  let __sbResult;
  try {
    __sbResult = {CALL};
  } catch (e) {
    __sbFail(e);
  }
  if (__sbResult && typeof __sbResult.then === "function") {
    __sbResult.then(__sbEmit, __sbFail);
  } else {
    __sbEmit(__sbResult);
  }
})();
"#;

const IDENT: &str = r"[A-Za-z_$][\w$]*";

/// Declaration forms, each ending right after the opening `(` of the
/// parameter list, except the bare single-parameter arrow.
static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\bfunction\s*\*?\s+({IDENT})\s*(?:<[^()]*?>)?\s*\(")).expect("valid regex")
});
static FUNCTION_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:var|let|const)\s+({IDENT})\s*(?::[^=;]+)?=\s*(?:async\s+)?function\b\s*\*?\s*(?:{IDENT})?\s*(?:<[^()]*?>)?\s*\("
    ))
    .expect("valid regex")
});
static ARROW_PARENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:var|let|const)\s+({IDENT})\s*(?::[^=;]+)?=\s*(?:async\s*)?(?:<[^()]*?>)?\s*\("
    ))
    .expect("valid regex")
});
static ARROW_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:var|let|const)\s+({IDENT})\s*=\s*(?:async\s+)?({IDENT})\s*=>"
    ))
    .expect("valid regex")
});

#[derive(Debug, Clone)]
pub struct JavaScriptAdapter {
    interpreter: String,
    extra_args: Vec<String>,
}

impl Default for JavaScriptAdapter {
    fn default() -> Self {
        Self::new(None, Vec::new())
    }
}

impl JavaScriptAdapter {
    pub fn new(interpreter: Option<String>, extra_args: Vec<String>) -> Self {
        Self {
            interpreter: interpreter.unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            extra_args,
        }
    }
}

impl LanguageAdapter for JavaScriptAdapter {
    fn language(&self) -> LanguageTag {
        LanguageTag::JavaScript
    }

    fn syntax_check_command(&self, source_path: &str) -> CommandSpec {
        CommandSpec::new(&self.interpreter).args(["--check", source_path])
    }

    fn syntax_diagnostic(
        &self,
        execution: &ExecutionResult,
        source_path: &str,
    ) -> Option<SyntaxDiagnostic> {
        Some(node_syntax_diagnostic(&execution.stderr, source_path))
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
        CommandSpec::new(&self.interpreter)
            .args(self.extra_args.iter().cloned())
            .arg(harness_path)
    }

    fn toolchain(&self) -> Vec<String> {
        vec![self.interpreter.clone()]
    }
}

/// node reports `<path>:<line>` first and `SyntaxError: ...` further down.
fn node_syntax_diagnostic(stderr: &str, source_path: &str) -> SyntaxDiagnostic {
    let line = stderr
        .lines()
        .find_map(|l| l.trim().strip_prefix(source_path)?.strip_prefix(':')?.parse().ok());
    let message = stderr
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("SyntaxError"))
        .or_else(|| last_line(stderr))
        .unwrap_or("syntax check failed without output");
    SyntaxDiagnostic {
        message: message.to_string(),
        line,
    }
}

/// Harness shared by the JavaScript and TypeScript adapters
pub(crate) fn build_js_harness(
    source: &str,
    signature: &CallableSignature,
    inputs: &CaseInputs,
) -> Result<String> {
    check_arity(signature, inputs)?;

    let args = inputs
        .arrange_for(&signature.parameter_names)
        .into_iter()
        .map(js_literal)
        .collect::<Vec<_>>()
        .join(", ");
    let call = match &signature.container {
        Some(class) => format!("new {}().{}({})", class, signature.name, args),
        None => format!("{}({})", signature.name, args),
    };

    let mut harness =
        String::with_capacity(CONSOLE_GUARD.len() + source.len() + HARNESS_TAIL.len());
    harness.push_str(CONSOLE_GUARD);
    harness.push_str(source);
    harness.push_str(&HARNESS_TAIL.replace("{CALL}", &call));
    Ok(harness)
}

/// JavaScript source text for a literal value
pub fn js_literal(value: &LiteralValue) -> String {
    let mut out = String::new();
    write_js(&mut out, value);
    out
}

fn write_js(out: &mut String, value: &LiteralValue) {
    match value {
        LiteralValue::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_js(out, item);
            }
            out.push(']');
        }
        LiteralValue::Map(entries) => {
            out.push('{');
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}: ", LiteralValue::String(key.clone()));
                write_js(out, item);
            }
            out.push('}');
        }
        LiteralValue::BigInteger(digits) => {
            let _ = write!(out, "{}n", digits);
        }
        // Scalars share the canonical notation
        scalar => {
            let _ = write!(out, "{}", scalar);
        }
    }
}

/// Earliest function declaration in the source, comments ignored.
pub fn extract_js_signature(source: &str) -> Result<CallableSignature> {
    let code = strip_comments(source);

    let mut best: Option<(usize, String, Vec<String>)> = None;
    let mut consider = |start: usize, name: String, params: Vec<String>| {
        if best.as_ref().map_or(true, |(s, _, _)| start < *s) {
            best = Some((start, name, params));
        }
    };

    for pattern in [&*FUNCTION_DECL, &*FUNCTION_EXPR] {
        for caps in pattern.captures_iter(&code) {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
            if let Some(params) = balanced_parens(&code, whole.1 - 1) {
                consider(whole.0, caps[1].to_string(), parameter_names(params)?);
                break;
            }
        }
    }

    for caps in ARROW_PARENS.captures_iter(&code) {
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        let Some(params) = balanced_parens(&code, whole.1 - 1) else {
            continue;
        };
        let after = whole.1 + params.len() + 1;
        if is_arrow_tail(&code[after..]) {
            consider(whole.0, caps[1].to_string(), parameter_names(params)?);
            break;
        }
    }

    if let Some(caps) = ARROW_BARE.captures(&code) {
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
        consider(start, caps[1].to_string(), vec![caps[2].to_string()]);
    }

    best.map(|(_, name, params)| CallableSignature::function(name, params))
        .ok_or_else(|| VerifyError::Extraction("no function declaration found".to_string()))
}

/// After `(params)`: `=>` directly, or a return annotation followed by `=>`.
fn is_arrow_tail(rest: &str) -> bool {
    let rest = rest.trim_start();
    if rest.starts_with("=>") {
        return true;
    }
    if let Some(annotation) = rest.strip_prefix(':') {
        let head = annotation
            .split(|c| c == '{' || c == '\n' || c == ';')
            .next()
            .unwrap_or("");
        return head.contains("=>");
    }
    false
}

fn parameter_names(params: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for (index, raw) in split_nested(params, ',', "([{<", ")]}>").into_iter().enumerate() {
        let param = raw.trim();
        if param.is_empty() {
            continue;
        }
        if param.starts_with("...") {
            return Err(VerifyError::Extraction(format!(
                "rest parameter `{}` makes the arity ambiguous",
                param
            )));
        }
        let name = param
            .split(|c| c == ':' || c == '=' || c == '?')
            .next()
            .unwrap_or(param)
            .trim();
        if crate::literal::parser::is_identifier(name) {
            names.push(name.to_string());
        } else {
            // Destructuring patterns bind no single name.
            names.push(format!("arg{}", index));
        }
    }
    Ok(names)
}

/// Blank out `//` and `/* */` comments, leaving strings and offsets intact.
pub(crate) fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('/', Some('/')) => {
                out.push(' ');
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                    out.push(' ');
                }
            }
            ('/', Some('*')) => {
                chars.next();
                out.push_str("  ");
                let mut prev = '\0';
                for next in chars.by_ref() {
                    out.push(if next == '\n' { '\n' } else { ' ' });
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            ('"' | '\'' | '`', _) => {
                quote = Some(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
