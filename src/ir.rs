use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// PROP VALUES
// ═══════════════════════════════════════════════════════════════════════════════

/// A parsed attribute value.
///
/// `Navigation` only ever appears under `onPress` and `State` only under `bind`;
/// the prop parser is the single producer of both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PropValue {
    String(String),
    Number(f64),
    Bool(bool),
    /// Raw inline code from `attr={...}`, opaque to the compiler.
    Expression(String),
    /// Target route path from `onPress="go('/path')"`.
    Navigation(String),
    /// Bound state variable from `bind="name"`.
    State(String),
}

/// Attribute map that keeps source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(Vec<(String, PropValue)>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A repeated attribute keeps its first position.
    pub fn insert(&mut self, name: impl Into<String>, value: PropValue) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, PropValue)> for Props {
    fn from_iter<I: IntoIterator<Item = (String, PropValue)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    pub props: Props,
    pub children: Vec<Node>,
    #[serde(default)]
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub text: String,
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode { text: text.into() })
    }

    pub fn element(tag: impl Into<String>, props: Props, children: Vec<Node>) -> Self {
        Node::Element(ElementNode {
            tag: tag.into(),
            props,
            children,
            line: 0,
        })
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIDE-CHANNEL METADATA
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenMetadata {
    pub title: Option<String>,
    pub header_shown: bool,
    pub is_tab_screen: bool,
    pub tab_order: Option<i64>,
    pub tab_icon: Option<String>,
    /// Keys on the screen line that the compiler does not interpret.
    #[serde(default)]
    pub extra: Props,
}

impl Default for ScreenMetadata {
    fn default() -> Self {
        Self {
            title: None,
            header_shown: true,
            is_tab_screen: false,
            tab_order: None,
            tab_icon: None,
            extra: Props::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDeclaration {
    pub name: String,
    pub initial_value: serde_json::Value,
    pub inferred_type: StateType,
    /// Literal text after `=`, kept for array and object values that are not JSON.
    #[serde(default)]
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,
    pub is_async: bool,
    pub params: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ImportDeclaration {
    Default { local: String, source: String },
    Named { names: Vec<String>, source: String },
    Namespace { alias: String, source: String },
}

impl ImportDeclaration {
    pub fn source(&self) -> &str {
        match self {
            ImportDeclaration::Default { source, .. }
            | ImportDeclaration::Named { source, .. }
            | ImportDeclaration::Namespace { source, .. } => source,
        }
    }

    /// Local names this import brings into scope.
    pub fn bound_names(&self) -> Vec<&str> {
        match self {
            ImportDeclaration::Default { local, .. } => vec![local.as_str()],
            ImportDeclaration::Named { names, .. } => names
                .iter()
                .map(|n| match n.split_once(" as ") {
                    Some((_, alias)) => alias.trim(),
                    None => n.as_str(),
                })
                .collect(),
            ImportDeclaration::Namespace { alias, .. } => vec![alias.as_str()],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Best-effort parse anomalies. The parser never fails; it records these instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParseDiagnostic {
    UnterminatedTag { tag: String, line: usize },
    UnterminatedFunction { name: String, line: usize },
    UnterminatedStylesheet { line: usize },
    UnterminatedValue { attribute: String, line: usize },
    UnmatchedClosingTag { tag: String, line: usize },
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseDiagnostic::UnterminatedTag { tag, line } => {
                write!(f, "line {}: <{}> is never closed", line, tag)
            }
            ParseDiagnostic::UnterminatedFunction { name, line } => {
                write!(f, "line {}: body of {}() is never closed", line, name)
            }
            ParseDiagnostic::UnterminatedStylesheet { line } => {
                write!(f, "line {}: stylesheet block is never closed", line)
            }
            ParseDiagnostic::UnterminatedValue { attribute, line } => {
                write!(f, "line {}: value of `{}` is never closed", line, attribute)
            }
            ParseDiagnostic::UnmatchedClosingTag { tag, line } => {
                write!(f, "line {}: </{}> closes nothing", line, tag)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSED FILE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    pub screen: Option<ScreenMetadata>,
    pub imports: Vec<ImportDeclaration>,
    pub states: Vec<StateDeclaration>,
    pub functions: Vec<FunctionDeclaration>,
    pub nodes: Vec<Node>,
    /// Stylesheet block exactly as written.
    pub stylesheet: Option<String>,
    #[serde(default)]
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParsedFile {
    /// Screen metadata, or the defaults when the file has no `screen` line.
    pub fn screen_or_default(&self) -> ScreenMetadata {
        self.screen.clone().unwrap_or_default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    pub title: Option<String>,
    pub header_shown: bool,
    pub is_tab_screen: bool,
    pub tab_order: Option<i64>,
    pub tab_icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    /// Route path used by `go('/...')`, e.g. `settings` or `profile/edit`.
    pub logical_path: String,
    pub component_name: String,
    /// Source path relative to the screens directory, `/`-separated.
    pub source_file: String,
    /// Generated module relative to `<output>/screens`, without extension.
    pub module_path: String,
    pub options: RouteOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_keep_first_position_on_replace() {
        let mut props = Props::new();
        props.insert("style", PropValue::String("a".into()));
        props.insert("onPress", PropValue::Navigation("/home".into()));
        props.insert("style", PropValue::String("b".into()));

        let keys: Vec<&str> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["style", "onPress"]);
        assert_eq!(props.get("style"), Some(&PropValue::String("b".into())));
    }

    #[test]
    fn test_prop_value_serializes_tagged() {
        let json = serde_json::to_value(PropValue::Navigation("/settings".into())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "navigation", "value": "/settings" })
        );
    }

    #[test]
    fn test_named_import_bound_names_follow_aliases() {
        let import = ImportDeclaration::Named {
            names: vec!["View".into(), "Text as Label".into()],
            source: "react-native".into(),
        };
        assert_eq!(import.bound_names(), vec!["View", "Label"]);
    }

    #[test]
    fn test_screen_defaults_show_header() {
        let parsed = ParsedFile::default();
        let screen = parsed.screen_or_default();
        assert!(screen.header_shown);
        assert!(!screen.is_tab_screen);
    }
}
