//! Prop/Value Parser
//!
//! Single left-to-right scan over the attribute text of a tag (everything
//! between the tag name and `>` or `/>`). No backtracking.

use crate::catalog::ComponentCatalog;
use crate::ir::{PropValue, Props};

/// Result of scanning an attribute string.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScannedProps {
    pub props: Props,
    /// Attributes whose quoted or braced value ran to end of input.
    pub unterminated: Vec<String>,
}

/// Parse attributes, discarding scan anomalies.
pub fn parse_props(input: &str, catalog: &ComponentCatalog) -> Props {
    parse_props_scanned(input, catalog).props
}

pub fn parse_props_scanned(input: &str, catalog: &ComponentCatalog) -> ScannedProps {
    let mut scanned = ScannedProps::default();
    let chars: Vec<char> = input.trim().chars().collect();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let name_start = i;
        while i < chars.len() && is_name_char(chars[i]) {
            i += 1;
        }
        if i == name_start {
            // Stray punctuation (a lone `/`, a comma); drop it.
            i += 1;
            continue;
        }
        let name: String = chars[name_start..i].iter().collect();

        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        if j >= chars.len() || chars[j] != '=' {
            scanned.props.insert(name, PropValue::Bool(true));
            continue;
        }
        i = j + 1;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            scanned.props.insert(name, PropValue::String(String::new()));
            break;
        }

        match chars[i] {
            '{' => {
                let (inner, next, closed) = scan_braced(&chars, i);
                i = next;
                if !closed {
                    scanned.unterminated.push(name.clone());
                }
                scanned.props.insert(name, classify_braced(&inner));
            }
            quote @ ('"' | '\'') => {
                let (inner, next, closed) = scan_quoted(&chars, i, quote);
                i = next;
                if !closed {
                    scanned.unterminated.push(name.clone());
                }
                let value = classify_quoted(&name, &inner, catalog);
                scanned.props.insert(name, value);
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                scanned.props.insert(name, coerce_literal(&raw));
            }
        }
    }

    scanned
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Scan `{...}` starting at the opening brace.
///
/// Depth starts at 1 after the opening brace and the scan stops when it
/// returns to 0. Returns the inner text, the index after the closing brace,
/// and whether a closing brace was found at all.
fn scan_braced(chars: &[char], open: usize) -> (String, usize, bool) {
    let mut depth = 1usize;
    let mut i = open + 1;
    let mut inner = String::new();
    while i < chars.len() {
        let c = chars[i];
        if c == '{' {
            depth += 1;
        } else if c == '}' {
            depth -= 1;
            if depth == 0 {
                return (inner, i + 1, true);
            }
        }
        inner.push(c);
        i += 1;
    }
    (inner, i, false)
}

/// Scan a quoted value starting at the opening quote. No escape handling.
fn scan_quoted(chars: &[char], open: usize, quote: char) -> (String, usize, bool) {
    let mut i = open + 1;
    let mut inner = String::new();
    while i < chars.len() {
        if chars[i] == quote {
            return (inner, i + 1, true);
        }
        inner.push(chars[i]);
        i += 1;
    }
    (inner, i, false)
}

fn classify_braced(inner: &str) -> PropValue {
    match inner.trim() {
        "true" => PropValue::Bool(true),
        "false" => PropValue::Bool(false),
        trimmed => match parse_number(trimmed) {
            Some(n) => PropValue::Number(n),
            None => PropValue::Expression(inner.to_string()),
        },
    }
}

fn classify_quoted(name: &str, value: &str, catalog: &ComponentCatalog) -> PropValue {
    match name {
        "onPress" => {
            if let Some(path) = navigation_target(value) {
                return PropValue::Navigation(path.to_string());
            }
        }
        "bind" if !value.is_empty() => return PropValue::State(value.to_string()),
        "keyboardType" => return PropValue::String(catalog.keyboard_type(value).to_string()),
        "autoCapitalize" => return PropValue::String(catalog.auto_capitalize(value).to_string()),
        _ => {}
    }
    coerce_literal(value)
}

/// `go('/path')` or `go("/path")` → `/path`.
pub fn navigation_target(value: &str) -> Option<&str> {
    let inner = value.strip_prefix("go(")?.strip_suffix(')')?;
    inner
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
}

/// `true`/`false` → bool, numeric → number, anything else stays a string.
pub fn coerce_literal(value: &str) -> PropValue {
    match value {
        "true" => PropValue::Bool(true),
        "false" => PropValue::Bool(false),
        _ => match parse_number(value) {
            Some(n) => PropValue::Number(n),
            None => PropValue::String(value.to_string()),
        },
    }
}

/// Decimal numeric literal. `inf`, `nan` and empty text are not numbers.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
