//! Recursive-descent parser for the literal notation
//!
//! Grammar (whitespace allowed between tokens):
//!   value  := int | float | bool | null | string | list | map
//!   int    := -?[0-9]+
//!   float  := -?[0-9]+ ( '.' [0-9]+ )? ( [eE] [+-]? [0-9]+ )?   (dot or exponent required)
//!   bool   := true | false | True | False
//!   null   := null | None
//!   string := '"' chars '"' | '\'' chars '\''
//!   list   := '[' ( value ( ',' value )* )? ']'
//!   map    := '{' ( string ':' value ( ',' string ':' value )* )? '}'

use super::{integer_from_digits, CaseInputs, LiteralValue};
use crate::config::types::{Result, VerifyError};
use std::collections::BTreeMap;

/// Nesting bound; deeper input is rejected instead of overflowing the stack
const MAX_DEPTH: usize = 256;

/// Parse a single literal value; the whole text must be consumed.
pub fn parse(text: &str) -> Result<LiteralValue> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    let value = parser.value(0)?;
    parser.skip_ws();
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected trailing input starting with `{}`", c)));
    }
    Ok(value)
}

/// Parse `name1 = literal1, name2 = literal2` into ordered named inputs.
///
/// Assignments are separated by commas or newlines outside brackets.
pub fn parse_assignments(text: &str) -> Result<CaseInputs> {
    let mut inputs = CaseInputs::new();
    if text.trim().is_empty() {
        return Ok(inputs);
    }

    let parts = split_top_level(text, '\n')
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .flat_map(|line| split_top_level(line, ','));
    for part in parts {
        let base = offset_in(text, part);
        let (name, value_text) = part.split_once('=').ok_or_else(|| {
            VerifyError::literal(base, format!("expected `name = value`, found `{}`", part.trim()))
        })?;

        let name = name.trim();
        if !is_identifier(name) {
            return Err(VerifyError::literal(
                base,
                format!("invalid parameter name `{}`", name),
            ));
        }

        let value_base = offset_in(text, value_text);
        let value = parse(value_text).map_err(|e| e.shifted(value_base))?;
        inputs.push(name, value).map_err(|e| e.shifted(base))?;
    }

    Ok(inputs)
}

/// Parse one case's input text in either accepted form.
///
/// Assignment form: `nums = [1,2], k = 3`.
/// Positional form: one literal per non-blank line, named `arg0`, `arg1`, ...
pub fn parse_case_input(text: &str) -> Result<CaseInputs> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(CaseInputs::new());
    }
    if starts_with_assignment(trimmed) {
        return parse_assignments(text);
    }

    let mut values = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let base = offset_in(text, line);
        values.push(parse(line).map_err(|e| e.shifted(base))?);
    }
    Ok(CaseInputs::positional(values))
}

/// Split on `sep` where it is outside brackets and quotes.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    split_nested(text, sep, "([{", ")]}")
}

/// Split on `sep` outside quotes and outside the given opener/closer pairs.
///
/// A `>` directly preceded by `=` (an arrow) never closes a `<` group.
pub fn split_nested<'a>(text: &'a str, sep: char, openers: &str, closers: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = '\0';
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            prev = c;
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            _ if openers.contains(c) => depth += 1,
            '>' if prev == '=' => {}
            _ if closers.contains(c) => depth = depth.saturating_sub(1),
            _ if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
        prev = c;
    }

    parts.push(&text[start..]);
    parts
}

fn offset_in(outer: &str, inner: &str) -> usize {
    (inner.as_ptr() as usize).saturating_sub(outer.as_ptr() as usize)
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn starts_with_assignment(text: &str) -> bool {
    let ident_len = text
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    if ident_len == 0 || !is_identifier(&text[..ident_len]) {
        return false;
    }
    let rest = text[ident_len..].trim_start();
    rest.starts_with('=') && !rest.starts_with("==")
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> VerifyError {
        VerifyError::literal(self.pos, message)
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn value(&mut self, depth: usize) -> Result<LiteralValue> {
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => self.list(depth),
            Some('{') => self.map(depth),
            Some(q @ ('"' | '\'')) => self.string(q).map(LiteralValue::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_alphabetic() => self.keyword(),
            Some(c) => Err(self.error(format!("unexpected character `{}`", c))),
        }
    }

    fn list(&mut self, depth: usize) -> Result<LiteralValue> {
        self.bump();
        let mut items = Vec::new();
        self.skip_ws();
        if self.eat(']') {
            return Ok(LiteralValue::List(items));
        }
        loop {
            self.skip_ws();
            items.push(self.value(depth + 1)?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                return Ok(LiteralValue::List(items));
            }
            return Err(self.error("expected `,` or `]` in list"));
        }
    }

    fn map(&mut self, depth: usize) -> Result<LiteralValue> {
        self.bump();
        let mut entries = BTreeMap::new();
        self.skip_ws();
        if self.eat('}') {
            return Ok(LiteralValue::Map(entries));
        }
        loop {
            self.skip_ws();
            let key = match self.peek() {
                Some(q @ ('"' | '\'')) => self.string(q)?,
                _ => return Err(self.error("expected string key in map")),
            };
            self.skip_ws();
            if !self.eat(':') {
                return Err(self.error("expected `:` after map key"));
            }
            self.skip_ws();
            let value = self.value(depth + 1)?;
            if entries.insert(key.clone(), value).is_some() {
                return Err(self.error(format!("duplicate map key \"{}\"", key)));
            }
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                return Ok(LiteralValue::Map(entries));
            }
            return Err(self.error("expected `,` or `}` in map"));
        }
    }

    fn string(&mut self, quote: char) -> Result<String> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => {
                    return Err(VerifyError::literal(start, "unterminated string literal"));
                }
            };
            match c {
                c if c == quote => return Ok(out),
                '\\' => out.push(self.escape()?),
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        let c = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape sequence"))?;
        Ok(match c {
            '"' => '"',
            '\'' => '\'',
            '\\' => '\\',
            '/' => '/',
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '0' => '\0',
            'u' => return self.unicode_escape(),
            other => return Err(self.error(format!("unknown escape `\\{}`", other))),
        })
    }

    fn hex4(&mut self) -> Result<u32> {
        let end = self.pos + 4;
        let digits = self
            .text
            .get(self.pos..end)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("expected four hex digits after `\\u`"))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| self.error("expected four hex digits after `\\u`"))?;
        self.pos = end;
        Ok(code)
    }

    fn unicode_escape(&mut self) -> Result<char> {
        let high = self.hex4()?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if !(self.eat('\\') && self.eat('u')) {
                return Err(self.error("unpaired surrogate in `\\u` escape"));
            }
            let low = self.hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(self.error("invalid low surrogate in `\\u` escape"));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code).ok_or_else(|| self.error("invalid unicode scalar in `\\u` escape"))
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        self.pos - start
    }

    fn number(&mut self) -> Result<LiteralValue> {
        let start = self.pos;
        self.eat('-');
        if self.digits() == 0 {
            return Err(self.error("expected digits in number"));
        }

        let mut is_float = false;
        if self.eat('.') {
            if self.digits() == 0 {
                return Err(self.error("expected digits after decimal point"));
            }
            is_float = true;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if !self.eat('+') {
                self.eat('-');
            }
            if self.digits() == 0 {
                return Err(self.error("expected digits in exponent"));
            }
            is_float = true;
        }

        let token = &self.text[start..self.pos];
        if is_float {
            let value: f64 = token
                .parse()
                .map_err(|_| VerifyError::literal(start, format!("invalid float `{}`", token)))?;
            if !value.is_finite() {
                return Err(VerifyError::literal(
                    start,
                    format!("float `{}` is out of range", token),
                ));
            }
            Ok(LiteralValue::Float(value))
        } else {
            integer_from_digits(token)
                .ok_or_else(|| VerifyError::literal(start, format!("invalid integer `{}`", token)))
        }
    }

    fn keyword(&mut self) -> Result<LiteralValue> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.text[start..self.pos] {
            "true" | "True" => Ok(LiteralValue::Boolean(true)),
            "false" | "False" => Ok(LiteralValue::Boolean(false)),
            "null" | "None" => Ok(LiteralValue::Null),
            word => Err(VerifyError::literal(
                start,
                format!("unexpected token `{}`", word),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> LiteralValue {
        LiteralValue::Integer(v)
    }

    fn list(items: Vec<LiteralValue>) -> LiteralValue {
        LiteralValue::List(items)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse("42").unwrap(), int(42));
        assert_eq!(parse("  -7 ").unwrap(), int(-7));
        assert!(matches!(parse("2.5").unwrap(), LiteralValue::Float(f) if f == 2.5));
        assert!(matches!(parse("1e-7").unwrap(), LiteralValue::Float(f) if f == 1e-7));
        assert!(matches!(parse("3.0E+2").unwrap(), LiteralValue::Float(f) if f == 300.0));
        assert!(matches!(parse("true").unwrap(), LiteralValue::Boolean(true)));
        assert!(matches!(parse("False").unwrap(), LiteralValue::Boolean(false)));
        assert!(matches!(parse("null").unwrap(), LiteralValue::Null));
        assert!(matches!(parse("None").unwrap(), LiteralValue::Null));
    }

    #[test]
    fn test_integer_and_float_tags_are_distinct_after_parse() {
        assert!(matches!(parse("1").unwrap(), LiteralValue::Integer(1)));
        assert!(matches!(parse("1.0").unwrap(), LiteralValue::Float(_)));
    }

    #[test]
    fn test_integers_beyond_i64_parse_exactly() {
        assert_eq!(
            parse("[99999999999999999999, -9223372036854775809]").unwrap(),
            list(vec![
                LiteralValue::BigInteger("99999999999999999999".to_string()),
                LiteralValue::BigInteger("-9223372036854775809".to_string()),
            ])
        );
        assert_eq!(parse("9223372036854775807").unwrap(), int(i64::MAX));
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            parse(r#""a\"b\\c\nd""#).unwrap(),
            LiteralValue::String("a\"b\\c\nd".to_string())
        );
        assert_eq!(
            parse(r"'it\'s'").unwrap(),
            LiteralValue::String("it's".to_string())
        );
        assert_eq!(
            parse(r#""é😀""#).unwrap(),
            LiteralValue::String("é😀".to_string())
        );
        assert_eq!(
            parse(r#""[1,2]""#).unwrap(),
            LiteralValue::String("[1,2]".to_string())
        );
    }

    #[test]
    fn test_nested_lists_and_maps() {
        assert_eq!(
            parse("[[1,2],[3,4]]").unwrap(),
            list(vec![list(vec![int(1), int(2)]), list(vec![int(3), int(4)])])
        );
        assert_eq!(parse("[ ]").unwrap(), list(Vec::new()));

        let value = parse(r#"{"a": [1], 'b': {"c": null}}"#).unwrap();
        let LiteralValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map.get("a"), Some(&list(vec![int(1)])));
        assert!(matches!(map.get("b"), Some(LiteralValue::Map(_))));
    }

    #[test]
    fn test_rejects_malformed_text() {
        for text in [
            "", "[1,2", "[1,,2]", "1.", "-", "\"open", "[1] 2", "{1: 2}", "abc", "1e999",
            r#""\q""#, r#""\ud83d""#, "{\"a\":1,\"a\":2}",
        ] {
            assert!(parse(text).is_err(), "expected `{}` to be rejected", text);
        }
    }

    #[test]
    fn test_error_offsets_point_at_problem() {
        match parse("[1, 2, x]") {
            Err(VerifyError::Literal { offset, .. }) => assert_eq!(offset, 7),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}{}", "[".repeat(MAX_DEPTH + 2), "]".repeat(MAX_DEPTH + 2));
        assert!(parse(&deep).is_err());
    }

    #[test]
    fn test_canonical_round_trip() {
        for text in [
            "[2, 7, 11, 15]",
            "[[1,2],[3, 4], []]",
            "\"héllo\\tworld\"",
            "{'k': [1.5, -0.25, 1e-7], \"z\": None}",
            "[true, False, null]",
            "-0.0",
        ] {
            let value = parse(text).unwrap();
            let again = parse(&value.to_string()).unwrap();
            assert_eq!(again, value, "round trip of `{}`", text);
        }
    }

    #[test]
    fn test_assignments_split_on_top_level_commas_only() {
        let inputs = parse_assignments(r#"nums = [2,7,11,15], s = "a,b", target = 9"#).unwrap();
        assert_eq!(inputs.names().collect::<Vec<_>>(), vec!["nums", "s", "target"]);
        assert_eq!(
            inputs.get("nums"),
            Some(&list(vec![int(2), int(7), int(11), int(15)]))
        );
        assert_eq!(inputs.get("s"), Some(&LiteralValue::String("a,b".to_string())));
        assert_eq!(inputs.get("target"), Some(&int(9)));
    }

    #[test]
    fn test_assignment_errors() {
        assert!(parse_assignments("nums [1]").is_err());
        assert!(parse_assignments("1x = 2").is_err());
        assert!(parse_assignments("a = 1, a = 2").is_err());
        assert!(parse_assignments("a = 1,").is_err());
        match parse_assignments("a = 1, b = [1,") {
            Err(VerifyError::Literal { offset, .. }) => assert!(offset >= 10),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_assignments_on_separate_lines() {
        let inputs = parse_assignments("grid = [\n  [1, 2],\n  [3, 4]\n]\nk = 2\n").unwrap();
        assert_eq!(inputs.names().collect::<Vec<_>>(), vec!["grid", "k"]);
        assert_eq!(inputs.get("k"), Some(&int(2)));
    }

    #[test]
    fn test_empty_assignment_text_is_zero_arguments() {
        assert!(parse_assignments("   ").unwrap().is_empty());
        assert!(parse_case_input("").unwrap().is_empty());
    }

    #[test]
    fn test_case_input_positional_lines() {
        let inputs = parse_case_input("[2,7,11,15]\n\n9\n").unwrap();
        assert_eq!(inputs.names().collect::<Vec<_>>(), vec!["arg0", "arg1"]);
        assert_eq!(inputs.get("arg1"), Some(&int(9)));
    }

    #[test]
    fn test_case_input_detects_assignment_form() {
        let inputs = parse_case_input("s = \"x == y\"").unwrap();
        assert_eq!(inputs.get("s"), Some(&LiteralValue::String("x == y".to_string())));
        // A bare string value is positional, not an assignment.
        let inputs = parse_case_input("\"a = b\"").unwrap();
        assert_eq!(inputs.get("arg0"), Some(&LiteralValue::String("a = b".to_string())));
    }

    #[test]
    fn test_split_nested_handles_generics_and_arrows() {
        let parts = split_nested(
            "a: Map<string, number>, cb: (x: number) => void, c",
            ',',
            "([{<",
            ")]}>",
        );
        let parts: Vec<&str> = parts.iter().map(|p| p.trim()).collect();
        assert_eq!(
            parts,
            vec!["a: Map<string, number>", "cb: (x: number) => void", "c"]
        );
    }
}
