use crate::config::types::{
    CallableSignature, CommandSpec, ExecutionResult, Result, SyntaxDiagnostic, VerifyError,
};
use crate::judge::{check_arity, last_line, LanguageAdapter, LanguageTag};
use crate::literal::{split_top_level, CaseInputs, LiteralValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;

const DEFAULT_INTERPRETER: &str = "python3";

/// Imports solution authors take for granted. Standard output is swapped
/// for stderr before the candidate loads; only the harness writes results.
const PRELUDE: &str = "\
from typing import *
import bisect
import collections
import functools
import heapq
import itertools
import math
import string
from collections import Counter, OrderedDict, defaultdict, deque
from functools import lru_cache, reduce
from heapq import heapify, heappop, heappush
from math import inf
import sys as __sb_sys
__sb_stdout = __sb_sys.stdout
__sb_sys.stdout = __sb_sys.stderr
";

/// Compiles the file named by argv[1]; reports `LINE:message` on stderr.
const CHECKER: &str = "\
import sys
try:
    with open(sys.argv[1], encoding='utf-8') as f:
        compile(f.read(), 'solution.py', 'exec')
except SyntaxError as e:
    sys.stderr.write('%d:%s\\n' % (e.lineno or 0, e.msg))
    sys.exit(1)
except ValueError as e:
    sys.stderr.write('0:%s\\n' % e)
    sys.exit(1)
";

/// Canonical printer plus guarded call; `{CALL}` is substituted per case.
const HARNESS_TAIL: &str = r#"

import json as __sb_json


def __sb_encode(v):
    if v is None:
        return "null"
    if isinstance(v, bool):
        return "true" if v else "false"
    if isinstance(v, int):
        return str(v)
    if isinstance(v, float):
        if v != v or v in (float("inf"), float("-inf")):
            raise ValueError("result contains a non-finite float")
        return repr(v)
    if isinstance(v, str):
        return __sb_json.dumps(v, ensure_ascii=False)
    if isinstance(v, (set, frozenset)):
        if all(isinstance(x, (int, float)) and not isinstance(x, bool) for x in v):
            return "[" + ",".join(__sb_encode(x) for x in sorted(v)) + "]"
        return "[" + ",".join(sorted(__sb_encode(x) for x in v)) + "]"
    if isinstance(v, dict):
        return "{" + ",".join(
            __sb_json.dumps(str(k), ensure_ascii=False) + ":" + __sb_encode(x)
            for k, x in v.items()
        ) + "}"
    if isinstance(v, (list, tuple, collections.deque)):
        return "[" + ",".join(__sb_encode(x) for x in v) + "]"
    raise TypeError("cannot encode result of type " + type(v).__name__)


def __sb_main():
    try:
        __sb_text = __sb_encode({CALL})
    except Exception as __sb_err:
        __sb_msg = str(__sb_err).replace("\n", " ")
        __sb_sys.stderr.write(type(__sb_err).__name__ + ": " + __sb_msg + "\n")
        __sb_sys.exit(1)
    __sb_stdout.write(__sb_text + "\n")
    __sb_stdout.flush()


__sb_main()
"#;

static CLASS_SOLUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^class[ \t]+Solution\b").expect("valid regex"));

static DEF_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([ \t]*)(?:async[ \t]+)?def[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]*\(")
        .expect("valid regex")
});

#[derive(Debug, Clone)]
pub struct PythonAdapter {
    interpreter: String,
    extra_args: Vec<String>,
}

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new(None, Vec::new())
    }
}

impl PythonAdapter {
    pub fn new(interpreter: Option<String>, extra_args: Vec<String>) -> Self {
        Self {
            interpreter: interpreter.unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()),
            extra_args,
        }
    }
}

impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> LanguageTag {
        LanguageTag::Python
    }

    fn syntax_check_command(&self, source_path: &str) -> CommandSpec {
        CommandSpec::new(&self.interpreter)
            .args(["-B", "-c", CHECKER, source_path])
    }

    fn syntax_diagnostic(
        &self,
        execution: &ExecutionResult,
        _source_path: &str,
    ) -> Option<SyntaxDiagnostic> {
        let line = last_line(&execution.stderr).unwrap_or("checker failed without output");
        let diag = match line.split_once(':') {
            Some((number, message)) if number.chars().all(|c| c.is_ascii_digit()) => {
                SyntaxDiagnostic {
                    message: message.trim().to_string(),
                    line: number.parse().ok().filter(|n| *n > 0),
                }
            }
            _ => SyntaxDiagnostic {
                message: line.to_string(),
                line: None,
            },
        };
        Some(diag)
    }

    fn extract_signature(&self, source: &str) -> Result<CallableSignature> {
        extract_python_signature(source)
    }

    fn build_harness(
        &self,
        source: &str,
        signature: &CallableSignature,
        inputs: &CaseInputs,
    ) -> Result<String> {
        check_arity(signature, inputs)?;

        let args = inputs
            .arrange_for(&signature.parameter_names)
            .into_iter()
            .map(python_literal)
            .collect::<Vec<_>>()
            .join(", ");
        let call = match &signature.container {
            Some(class) => format!("{}().{}({})", class, signature.name, args),
            None => format!("{}({})", signature.name, args),
        };

        let mut harness = String::with_capacity(PRELUDE.len() + source.len() + HARNESS_TAIL.len());
        harness.push_str(PRELUDE);
        harness.push('\n');
        harness.push_str(source);
        harness.push_str(&HARNESS_TAIL.replace("{CALL}", &call));
        Ok(harness)
    }

    fn run_command(&self, harness_path: &str) -> CommandSpec {
        CommandSpec::new(&self.interpreter)
            .arg("-B")
            .args(self.extra_args.iter().cloned())
            .arg(harness_path)
            .env("PYTHONIOENCODING", "utf-8")
    }

    fn toolchain(&self) -> Vec<String> {
        vec![self.interpreter.clone()]
    }
}

/// Python source text for a literal value
pub fn python_literal(value: &LiteralValue) -> String {
    let mut out = String::new();
    write_python(&mut out, value);
    out
}

fn write_python(out: &mut String, value: &LiteralValue) {
    match value {
        LiteralValue::Integer(i) => {
            let _ = write!(out, "{}", i);
        }
        LiteralValue::BigInteger(digits) => out.push_str(digits),
        LiteralValue::Float(x) => {
            let _ = write!(out, "{:?}", x);
        }
        LiteralValue::Boolean(true) => out.push_str("True"),
        LiteralValue::Boolean(false) => out.push_str("False"),
        LiteralValue::Null => out.push_str("None"),
        LiteralValue::String(_) => {
            let _ = write!(out, "{}", value);
        }
        LiteralValue::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_python(out, item);
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
                write_python(out, item);
            }
            out.push('}');
        }
    }
}

/// First public method of `class Solution`, else the first public top-level def.
pub fn extract_python_signature(source: &str) -> Result<CallableSignature> {
    if let Some(class) = CLASS_SOLUTION.find(source) {
        let body_start = source[class.end()..]
            .find('\n')
            .map(|i| class.end() + i + 1)
            .unwrap_or(source.len());
        if let Some((name, params, is_static)) = find_def(source, body_start, true) {
            let mut names = parameter_names(&params)?;
            if !is_static {
                if names.is_empty() {
                    return Err(VerifyError::Extraction(format!(
                        "method `{}` has no receiver parameter",
                        name
                    )));
                }
                names.remove(0);
            }
            return Ok(CallableSignature::method("Solution", name, names));
        }
        log::debug!("class Solution has no public method, trying top-level functions");
    }

    match find_def(source, 0, false) {
        Some((name, params, _)) => Ok(CallableSignature::function(name, parameter_names(&params)?)),
        None => Err(VerifyError::Extraction(
            "no public method on class Solution and no public top-level function".to_string(),
        )),
    }
}

/// Scan lines from `start` for a public `def`.
///
/// In class mode the scan stops at the first dedent back to column zero and
/// only accepts defs one level inside the class; otherwise only column-zero
/// defs are accepted. Lines inside triple-quoted strings are skipped.
/// Returns (name, raw parameter text, is_staticmethod).
fn find_def(source: &str, start: usize, in_class: bool) -> Option<(String, String, bool)> {
    let mut offset = start;
    let mut body_indent: Option<String> = None;
    let mut pending_static = false;
    let mut open_string: Option<&'static str> = None;

    for line in source[start..].split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        let in_string = open_string.is_some();
        open_string = triple_quote_after(line, open_string);
        if in_string {
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];

        if in_class {
            if indent.is_empty() {
                break;
            }
            let level = body_indent.get_or_insert_with(|| indent.to_string());
            if indent != level.as_str() {
                continue;
            }
        } else if !indent.is_empty() {
            continue;
        }

        if trimmed.starts_with('@') {
            pending_static |= trimmed == "@staticmethod";
            continue;
        }

        if let Some(caps) = DEF_LINE.captures(line) {
            let name = caps[2].to_string();
            if !name.starts_with('_') {
                let open = line_start + caps.get(0).map(|m| m.end()).unwrap_or(0) - 1;
                let params = balanced_parens(source, open)?;
                return Some((name, params.to_string(), pending_static));
            }
        }
        pending_static = false;
    }
    None
}

/// Triple-quoted string still open at the end of `line`, given the one
/// open at its start. Comments and single-line strings are stepped over.
fn triple_quote_after(line: &str, mut open: Option<&'static str>) -> Option<&'static str> {
    let mut rest = line;
    loop {
        if let Some(delim) = open {
            match rest.find(delim) {
                Some(end) => rest = &rest[end + delim.len()..],
                None => return open,
            }
            open = None;
        }

        let at = rest.find(|c| c == '#' || c == '"' || c == '\'')?;
        rest = &rest[at..];
        if rest.starts_with('#') {
            return None;
        }
        if let Some(delim) = ["\"\"\"", "'''"].into_iter().find(|d| rest.starts_with(d)) {
            open = Some(delim);
            rest = &rest[delim.len()..];
            continue;
        }

        let quote = if rest.starts_with('"') { '"' } else { '\'' };
        let mut escaped = false;
        let (close, _) = rest[1..].char_indices().find(|&(_, c)| {
            let done = !escaped && c == quote;
            escaped = !escaped && c == '\\';
            done
        })?;
        rest = &rest[close + 2..];
    }
}

/// Text between the `(` at `open` and its matching `)`
pub(crate) fn balanced_parens(text: &str, open: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parameter_names(params: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for raw in split_top_level(params, ',') {
        let param = raw.trim();
        if param.is_empty() || param == "/" || param == "*" {
            continue;
        }
        if param.starts_with('*') {
            return Err(VerifyError::Extraction(format!(
                "variadic parameter `{}` makes the arity ambiguous",
                param
            )));
        }
        let name = param
            .split(|c| c == ':' || c == '=')
            .next()
            .unwrap_or(param)
            .trim();
        names.push(name.to_string());
    }
    Ok(names)
}
