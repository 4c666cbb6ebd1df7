//! Codegen module for the Ignite compiler
//!
//! Turns a [`ParsedFile`] into one React Native function-component module.
//! Generation is pure: identical IR, routes and catalog give identical text.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::catalog::{ComponentCatalog, ImportKind};
use crate::discovery::component_name_for;
use crate::emit::{write_if_changed, WriteOutcome};
use crate::error::Result;
use crate::ir::{
    ElementNode, ImportDeclaration, Node, ParsedFile, PropValue, RouteRecord, StateDeclaration,
    StateType,
};

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap();
}

const INDENT: &str = "  ";
const EMPTY_STYLESHEET: &str = "const styles = StyleSheet.create({});";
const NUMERIC_KEYBOARDS: &[&str] = &["numeric", "number-pad", "decimal-pad", "phone-pad"];

// ═══════════════════════════════════════════════════════════════════════════════
// LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Shortest decimal form: `0`, `42`, `1.5`, `-0.25`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Single-quoted JavaScript string literal.
pub fn js_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "");
    format!("'{}'", escaped)
}

/// `useState` initializer for a declared state.
pub fn state_literal(state: &StateDeclaration) -> String {
    match state.inferred_type {
        StateType::Boolean => match state.initial_value.as_bool() {
            Some(b) => b.to_string(),
            None => "false".to_string(),
        },
        StateType::Number => match state.initial_value.as_f64() {
            Some(n) => format_number(n),
            None => "0".to_string(),
        },
        StateType::String => match state.initial_value.as_str() {
            Some(s) => js_string(s),
            None => js_string(&state.literal),
        },
        StateType::Array | StateType::Object => {
            let is_json = serde_json::from_str::<serde_json::Value>(&state.literal).is_ok();
            if is_json || state.literal.is_empty() {
                state.initial_value.to_string()
            } else {
                state.literal.clone()
            }
        }
    }
}

fn setter_name(state: &str) -> String {
    let mut chars = state.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

struct Generator<'a> {
    catalog: &'a ComponentCatalog,
    routes: &'a [RouteRecord],
    state_types: HashMap<String, StateType>,
}

impl Generator<'_> {
    fn navigation_target(&self, path: &str) -> String {
        let clean = path.trim().trim_start_matches('/').trim_end_matches('/');
        self.routes
            .iter()
            .find(|r| r.logical_path == clean)
            .map(|r| r.component_name.clone())
            .unwrap_or_else(|| component_name_for(clean))
    }

    fn render_props(&self, el: &ElementNode) -> Vec<String> {
        let mut out = Vec::new();
        for (key, value) in el.props.iter() {
            self.render_prop(el, key, value, &mut out);
        }
        out
    }

    fn render_prop(&self, el: &ElementNode, key: &str, value: &PropValue, out: &mut Vec<String>) {
        let tag = el.tag.as_str();
        match (key, value) {
            ("onPress", PropValue::Navigation(path)) => out.push(format!(
                "onPress={{() => navigation.navigate({})}}",
                js_string(&self.navigation_target(path))
            )),
            ("onPress", PropValue::String(handler)) => {
                out.push(format!("onPress={{() => {}}}", handler))
            }
            ("bind", PropValue::State(name)) => self.render_bind(el, name, out),
            // `bind` without a state name wires nothing.
            ("bind", _) => {}
            ("style", PropValue::String(style)) => {
                out.push(format!("style={{{}}}", style_reference(style)))
            }
            ("source", PropValue::String(src)) if self.catalog.is_image(tag) => {
                if src.starts_with("http://") || src.starts_with("https://") {
                    out.push(format!("source={{{{ uri: {} }}}}", js_string(src)));
                } else {
                    out.push(format!("source={{require({})}}", js_string(src)));
                }
            }
            ("placeholder" | "label", other) => {
                let text = match other {
                    PropValue::String(s) => s.clone(),
                    PropValue::Number(n) => format_number(*n),
                    PropValue::Bool(b) => b.to_string(),
                    PropValue::Expression(e) => {
                        out.push(format!("{}={{{}}}", key, e));
                        return;
                    }
                    PropValue::Navigation(p) | PropValue::State(p) => p.clone(),
                };
                out.push(string_attribute(key, &text));
            }
            (_, PropValue::String(s)) => out.push(string_attribute(key, s)),
            (_, PropValue::Number(n)) => out.push(format!("{}={{{}}}", key, format_number(*n))),
            (_, PropValue::Bool(b)) => out.push(format!("{}={{{}}}", key, b)),
            (_, PropValue::Expression(e)) => out.push(format!("{}={{{}}}", key, e)),
            (_, PropValue::Navigation(path)) => out.push(format!(
                "{}={{() => navigation.navigate({})}}",
                key,
                js_string(&self.navigation_target(path))
            )),
            (_, PropValue::State(name)) => out.push(format!("{}={{{}}}", key, name)),
        }
    }

    fn render_bind(&self, el: &ElementNode, name: &str, out: &mut Vec<String>) {
        let setter = setter_name(name);
        let state_type = self.state_types.get(name).copied();

        if self.catalog.is_toggle(&el.tag) {
            if name == "theme" && matches!(state_type, Some(StateType::String) | None) {
                out.push(format!("value={{{} === 'dark'}}", name));
                out.push(format!(
                    "onValueChange={{(value) => {}(value ? 'dark' : 'light')}}",
                    setter
                ));
            } else {
                out.push(format!("value={{{}}}", name));
                out.push(format!("onValueChange={{(value) => {}(value)}}", setter));
            }
        } else if self.catalog.is_text_input(&el.tag) {
            if state_type == Some(StateType::Number) {
                out.push(format!("value={{String({})}}", name));
                out.push(format!(
                    "onChangeText={{(text) => {}(Number(text) || 0)}}",
                    setter
                ));
            } else {
                out.push(format!("value={{{}}}", name));
                out.push(format!("onChangeText={{(text) => {}(text)}}", setter));
            }
        } else {
            out.push(format!("value={{{}}}", name));
            out.push(format!("onChange={{(value) => {}(value)}}", setter));
        }
    }

    fn render_node(&self, node: &Node, depth: usize) -> String {
        let pad = INDENT.repeat(depth);
        match node {
            Node::Text(text) => format!("{}{}", pad, text.text),
            Node::Element(el) => self.render_element(el, depth),
        }
    }

    fn render_element(&self, el: &ElementNode, depth: usize) -> String {
        let pad = INDENT.repeat(depth);
        let target = self.catalog.resolve_tag(&el.tag);
        let props = self.render_props(el);
        let open = if props.is_empty() {
            target.to_string()
        } else {
            format!("{} {}", target, props.join(" "))
        };

        if el.children.is_empty() {
            return format!("{}<{} />", pad, open);
        }

        if self.catalog.is_text(&el.tag) && el.children.iter().all(|c| matches!(c, Node::Text(_))) {
            let inline: Vec<&str> = el
                .children
                .iter()
                .filter_map(|c| match c {
                    Node::Text(t) => Some(t.text.as_str()),
                    Node::Element(_) => None,
                })
                .collect();
            return format!("{}<{}>{}</{}>", pad, open, inline.join(" "), target);
        }

        let wrap_text = self.catalog.is_button(&el.tag);
        let children: Vec<String> = el
            .children
            .iter()
            .map(|child| match child {
                Node::Text(t) if wrap_text => format!(
                    "{}{}<Text style={{styles.buttonText}}>{}</Text>",
                    pad, INDENT, t.text
                ),
                other => self.render_node(other, depth + 1),
            })
            .collect();

        format!("{}<{}>\n{}\n{}</{}>", pad, open, children.join("\n"), pad, target)
    }
}

fn string_attribute(key: &str, value: &str) -> String {
    if value.contains('"') {
        format!("{}={{{}}}", key, js_string(value))
    } else {
        format!("{}=\"{}\"", key, value)
    }
}

/// `container` → `styles.container`; `a b` → `[styles.a, styles.b]`;
/// anything else is already an expression.
fn style_reference(style: &str) -> String {
    let style = style.trim();
    if style.is_empty() {
        return "undefined".to_string();
    }
    if style.starts_with("styles.") {
        return style.to_string();
    }
    if IDENTIFIER_RE.is_match(style) {
        return format!("styles.{}", style);
    }
    let names: Vec<&str> = style.split_whitespace().collect();
    if names.len() > 1 && names.iter().all(|n| IDENTIFIER_RE.is_match(n)) {
        let refs: Vec<String> = names.iter().map(|n| format!("styles.{}", n)).collect();
        return format!("[{}]", refs.join(", "));
    }
    style.to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TREE SCANS
// ═══════════════════════════════════════════════════════════════════════════════

fn walk<'a>(nodes: &'a [Node], visit: &mut impl FnMut(&'a ElementNode)) {
    for node in nodes {
        if let Node::Element(el) = node {
            visit(el);
            walk(&el.children, visit);
        }
    }
}

/// Declarations for state that is bound but never declared, in first-use order.
pub fn implicit_states(parsed: &ParsedFile, catalog: &ComponentCatalog) -> Vec<StateDeclaration> {
    let mut implicit: Vec<StateDeclaration> = Vec::new();

    walk(&parsed.nodes, &mut |el| {
        let Some(PropValue::State(name)) = el.props.get("bind") else {
            return;
        };
        let declared = parsed.states.iter().any(|s| &s.name == name);
        if declared || implicit.iter().any(|s| &s.name == name) {
            return;
        }

        let numeric_keyboard = matches!(
            el.props.get("keyboardType"),
            Some(PropValue::String(k)) if NUMERIC_KEYBOARDS.contains(&k.as_str())
        );
        let (value, inferred_type) = if catalog.is_toggle(&el.tag) && name == "theme" {
            (serde_json::json!("light"), StateType::String)
        } else if catalog.is_toggle(&el.tag) || catalog.looks_boolean(name) {
            (serde_json::json!(false), StateType::Boolean)
        } else if catalog.is_text_input(&el.tag) && (numeric_keyboard || catalog.looks_numeric(name)) {
            (serde_json::json!(0), StateType::Number)
        } else {
            (serde_json::json!(""), StateType::String)
        };

        implicit.push(StateDeclaration {
            name: name.clone(),
            initial_value: value,
            inferred_type,
            literal: String::new(),
        });
    });

    implicit
}

fn mentions_linking(parsed: &ParsedFile) -> bool {
    const NEEDLE: &str = "Linking.";
    if parsed.functions.iter().any(|f| f.body.contains(NEEDLE)) {
        return true;
    }
    fn scan(nodes: &[Node]) -> bool {
        nodes.iter().any(|node| match node {
            Node::Text(t) => t.text.contains(NEEDLE),
            Node::Element(el) => {
                el.props.iter().any(|(_, v)| match v {
                    PropValue::String(s) | PropValue::Expression(s) => s.contains(NEEDLE),
                    _ => false,
                }) || scan(&el.children)
            }
        })
    }
    scan(&parsed.nodes)
}

/// Whether any button in the tree wraps bare text in a `<Text>`.
fn wraps_button_text(nodes: &[Node], catalog: &ComponentCatalog) -> bool {
    let mut found = false;
    walk(nodes, &mut |el| {
        if catalog.is_button(&el.tag) && el.children.iter().any(|c| matches!(c, Node::Text(_))) {
            found = true;
        }
    });
    found
}

// ═══════════════════════════════════════════════════════════════════════════════
// CATALOG CHECKS
// ═══════════════════════════════════════════════════════════════════════════════

/// A prop the catalog does not list for its component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProp {
    pub tag: String,
    pub prop: String,
    pub line: usize,
}

/// Props missing from the catalog on components it describes. Custom
/// components accept anything and style shorthands are valid everywhere.
/// Unknown props are still emitted as written.
pub fn unknown_props(parsed: &ParsedFile, catalog: &ComponentCatalog) -> Vec<UnknownProp> {
    let mut unknown = Vec::new();
    walk(&parsed.nodes, &mut |el| {
        let target = catalog.resolve_tag(&el.tag);
        if catalog.is_custom_component(&el.tag) || !catalog.component_props.contains_key(target) {
            return;
        }
        for (prop, _) in el.props.iter() {
            if !catalog.is_prop_known(target, prop) && !catalog.is_style_prop(prop) {
                unknown.push(UnknownProp {
                    tag: el.tag.clone(),
                    prop: prop.to_string(),
                    line: el.line,
                });
            }
        }
    });
    unknown
}

/// Tags that resolve to no known component; they get no generated import.
pub fn custom_components(parsed: &ParsedFile, catalog: &ComponentCatalog) -> Vec<String> {
    let mut tags: Vec<&str> = Vec::new();
    walk(&parsed.nodes, &mut |el| tags.push(el.tag.as_str()));
    catalog.required_imports(tags).custom
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORTS
// ═══════════════════════════════════════════════════════════════════════════════

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

fn render_user_import(import: &ImportDeclaration) -> String {
    match import {
        ImportDeclaration::Default { local, source } => {
            format!("import {} from {};", local, js_string(source))
        }
        ImportDeclaration::Named { names, source } => {
            format!("import {{ {} }} from {};", names.join(", "), js_string(source))
        }
        ImportDeclaration::Namespace { alias, source } => {
            format!("import * as {} from {};", alias, js_string(source))
        }
    }
}

/// `import` without the names `bound` already covers; `None` if nothing is left.
fn unbound_import(import: &ImportDeclaration, bound: &[&str]) -> Option<ImportDeclaration> {
    match import {
        ImportDeclaration::Named { names, source } => {
            let names: Vec<String> = names
                .iter()
                .zip(import.bound_names())
                .filter(|(_, local)| !bound.contains(local))
                .map(|(name, _)| name.clone())
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(ImportDeclaration::Named {
                    names,
                    source: source.clone(),
                })
            }
        }
        other if other.bound_names().iter().any(|n| bound.contains(n)) => None,
        other => Some(other.clone()),
    }
}

fn render_imports(parsed: &ParsedFile, catalog: &ComponentCatalog) -> Vec<String> {
    let mut tags: Vec<&str> = Vec::new();
    walk(&parsed.nodes, &mut |el| tags.push(el.tag.as_str()));
    let required = catalog.required_imports(tags);

    let mut react_names = vec!["useState".to_string()];
    let mut core: Vec<String> = required.core.clone();
    if wraps_button_text(&parsed.nodes, catalog) && !core.iter().any(|c| c == "Text") {
        core.push("Text".to_string());
        core.sort();
    }
    core.push("StyleSheet".to_string());
    if mentions_linking(parsed) {
        core.push("Linking".to_string());
    }

    let mut rest = Vec::new();
    for import in &parsed.imports {
        match (import, import.source()) {
            (ImportDeclaration::Named { names, .. }, "react") => {
                names.iter().for_each(|n| push_unique(&mut react_names, n))
            }
            (ImportDeclaration::Named { names, .. }, "react-native") => {
                names.iter().for_each(|n| push_unique(&mut core, n))
            }
            _ => rest.push(import),
        }
    }

    let mut baseline: Vec<&str> = vec!["React", "useNavigation"];
    baseline.extend(react_names.iter().map(String::as_str));
    baseline.extend(core.iter().map(String::as_str));
    let user_lines: Vec<String> = rest
        .into_iter()
        .filter_map(|import| unbound_import(import, &baseline))
        .map(|import| render_user_import(&import))
        .collect();

    let user_bound: Vec<&str> = parsed.imports.iter().flat_map(|i| i.bound_names()).collect();

    let mut lines = vec![
        format!("import React, {{ {} }} from 'react';", react_names.join(", ")),
        format!("import {{ {} }} from 'react-native';", core.join(", ")),
        "import { useNavigation } from '@react-navigation/native';".to_string(),
    ];

    for (package, (kind, names)) in &required.packages {
        let names: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|n| !user_bound.contains(n))
            .collect();
        if names.is_empty() {
            continue;
        }
        match kind {
            ImportKind::Named => {
                lines.push(format!("import {{ {} }} from {};", names.join(", "), js_string(package)))
            }
            ImportKind::Default => {
                for name in names {
                    lines.push(format!("import {} from {};", name, js_string(package)));
                }
            }
        }
    }

    lines.extend(user_lines);
    lines
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODULE ASSEMBLY
// ═══════════════════════════════════════════════════════════════════════════════

fn render_function(func: &crate::ir::FunctionDeclaration) -> String {
    let mut out = format!(
        "{}const {} = {}({}) => {{\n",
        INDENT,
        func.name,
        if func.is_async { "async " } else { "" },
        func.params
    );
    for line in func.body.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("{}{}{}\n", INDENT, INDENT, line));
        }
    }
    out.push_str(&format!("{}}};", INDENT));
    out
}

/// Generate the component module for one parsed file.
pub fn generate_component(
    parsed: &ParsedFile,
    component_name: &str,
    routes: &[RouteRecord],
    catalog: &ComponentCatalog,
) -> String {
    let implicit = implicit_states(parsed, catalog);
    let states: Vec<&StateDeclaration> = parsed.states.iter().chain(implicit.iter()).collect();
    let generator = Generator {
        catalog,
        routes,
        state_types: states
            .iter()
            .map(|s| (s.name.clone(), s.inferred_type))
            .collect(),
    };

    let mut out = render_imports(parsed, catalog).join("\n");
    out.push_str("\n\n");
    out.push_str(&format!("export default function {}() {{\n", component_name));
    out.push_str(&format!("{}const navigation = useNavigation();\n", INDENT));

    for state in &states {
        out.push_str(&format!(
            "{}const [{}, {}] = useState({});\n",
            INDENT,
            state.name,
            setter_name(&state.name),
            state_literal(state)
        ));
    }
    for func in &parsed.functions {
        out.push('\n');
        out.push_str(&render_function(func));
        out.push('\n');
    }

    out.push_str(&format!("\n{}return (\n", INDENT));
    match parsed.nodes.as_slice() {
        [] => out.push_str(&format!("{}{}null\n", INDENT, INDENT)),
        [single] => {
            out.push_str(&generator.render_node(single, 2));
            out.push('\n');
        }
        many => {
            out.push_str(&format!("{}{}<>\n", INDENT, INDENT));
            for node in many {
                out.push_str(&generator.render_node(node, 3));
                out.push('\n');
            }
            out.push_str(&format!("{}{}</>\n", INDENT, INDENT));
        }
    }
    out.push_str(&format!("{});\n}}\n\n", INDENT));

    out.push_str(parsed.stylesheet.as_deref().unwrap_or(EMPTY_STYLESHEET));
    out.push('\n');
    out
}

/// Generate and write `<out_dir>/<base_name>.js`, creating directories.
pub fn write_component(
    parsed: &ParsedFile,
    component_name: &str,
    out_dir: &Path,
    base_name: &str,
    routes: &[RouteRecord],
    catalog: &ComponentCatalog,
) -> Result<(PathBuf, WriteOutcome)> {
    let code = generate_component(parsed, component_name, routes, catalog);
    let path = out_dir.join(format!("{}.js", base_name));
    let outcome = write_if_changed(&path, &code)?;
    Ok((path, outcome))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
