//! Parse Module for the Ignite Compiler
//!
//! Line-oriented parser for `.ignite` source files. The stylesheet block is cut
//! out first; every remaining trimmed, non-blank line is dispatched in priority
//! order: import → screen → state → function → markup → freestanding text.
//!
//! Markup is parsed by recursive descent over a [`LineCursor`]. A line holding
//! more than one tag is split into segments (one tag or text run each) which are
//! spliced back into the cursor, so `<Text>Hi</Text>` on one line parses the
//! same as the three-line form.
//!
//! Declaration lines (import, screen, state, function) are recognized wherever
//! they appear, nested inside markup included; they never become text nodes.
//!
//! The parser never fails. Unterminated blocks consume to end of input, while a
//! tag head left open by a bad quote stops at the next line that starts new
//! structure. Either way a [`ParseDiagnostic`] is left on the result.

use lazy_static::lazy_static;
use regex::Regex;

use crate::catalog::ComponentCatalog;
use crate::ir::{
    ElementNode, FunctionDeclaration, ImportDeclaration, Node, ParseDiagnostic, ParsedFile,
    PropValue, Props, ScreenMetadata, StateDeclaration, StateType,
};
use crate::props::{parse_number, parse_props, parse_props_scanned};

lazy_static! {
    static ref STYLESHEET_RE: Regex =
        Regex::new(r"const\s+styles\s*=\s*StyleSheet\.create\s*\(").unwrap();

    static ref DEFAULT_IMPORT_RE: Regex =
        Regex::new(r#"^import\s+([A-Za-z_$][\w$]*)\s+from\s+['"]([^'"]+)['"]\s*;?$"#).unwrap();
    static ref NAMED_IMPORT_RE: Regex =
        Regex::new(r#"^import\s+\{([^}]*)\}\s+from\s+['"]([^'"]+)['"]\s*;?$"#).unwrap();
    static ref MIXED_IMPORT_RE: Regex = Regex::new(
        r#"^import\s+([A-Za-z_$][\w$]*)\s*,\s*\{([^}]*)\}\s+from\s+['"]([^'"]+)['"]\s*;?$"#
    )
    .unwrap();
    static ref NAMESPACE_IMPORT_RE: Regex =
        Regex::new(r#"^import\s+\*\s+as\s+([A-Za-z_$][\w$]*)\s+from\s+['"]([^'"]+)['"]\s*;?$"#)
            .unwrap();
    static ref SIMPLE_IMPORT_RE: Regex =
        Regex::new(r"^[a-z][a-z0-9-]*(\.[a-z][a-z0-9-]*)*$").unwrap();

    static ref SCREEN_RE: Regex = Regex::new(r"^screen(?:\s+(.*))?$").unwrap();
    static ref STATE_RE: Regex = Regex::new(r"^state\s+([A-Za-z_$][\w$]*)\s*=\s*(.+)$").unwrap();
    static ref FUNCTION_RE: Regex = Regex::new(
        r"^(async\s+)?(?:function\s+)?([A-Za-z_$][\w$]*)\s*\(([^)]*)\)\s*(\{.*)?$"
    )
    .unwrap();
}

/// Words that look like calls but open control flow, never a handler.
const NON_FUNCTION_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "with",
];

/// Words reserved by the DSL; never read as bare-module imports.
const RESERVED_LINES: &[&str] = &["screen", "state"];

// ═══════════════════════════════════════════════════════════════════════════════
// LINE CURSOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
struct Line {
    /// 1-based line number in the original file.
    number: usize,
    text: String,
    raw: String,
    /// Produced by splitting a markup line; never an import/state/function line.
    spliced: bool,
}

#[derive(Debug)]
struct LineCursor {
    lines: Vec<Line>,
    pos: usize,
}

impl LineCursor {
    fn new(source: &str) -> Self {
        let lines = source
            .lines()
            .enumerate()
            .filter_map(|(idx, raw)| {
                let text = raw.trim();
                if text.is_empty() {
                    None
                } else {
                    Some(Line {
                        number: idx + 1,
                        text: text.to_string(),
                        raw: raw.to_string(),
                        spliced: false,
                    })
                }
            })
            .collect();
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Line> {
        self.lines.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Line> {
        let line = self.lines.get(self.pos).cloned();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    fn advance(&mut self) {
        if self.pos < self.lines.len() {
            self.pos += 1;
        }
    }

    /// Insert segments at the cursor; they are read next.
    fn insert(&mut self, number: usize, segments: Vec<String>) {
        let lines: Vec<Line> = segments
            .into_iter()
            .map(|text| Line {
                number,
                raw: text.clone(),
                text,
                spliced: true,
            })
            .collect();
        self.lines.splice(self.pos..self.pos, lines);
    }

    /// Replace the current line with its markup segments when it holds more
    /// than one tag or a tag mixed with text.
    fn expand(&mut self) {
        let Some(line) = self.lines.get(self.pos) else {
            return;
        };
        let segments = split_segments(&line.text);
        if segments.len() > 1 {
            let number = line.number;
            self.lines.remove(self.pos);
            self.insert(number, segments);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BALANCED SCANNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Find the byte index just past the delimiter that closes the one at
/// `open_index`, skipping string and template literals. `None` if unbalanced.
fn find_balanced_end(text: &str, open_index: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in text[open_index..].char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => in_string = Some(c),
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open_index + idx + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Brace counter fed one character at a time across lines.
///
/// `depth` counts unmatched `{` outside string literals; [`BraceScanner::feed`]
/// reports the moment it returns to zero.
#[derive(Debug, Default)]
struct BraceScanner {
    depth: usize,
    in_string: Option<char>,
    escaped: bool,
}

impl BraceScanner {
    fn opened() -> Self {
        Self {
            depth: 1,
            ..Self::default()
        }
    }

    fn feed(&mut self, c: char) -> bool {
        if let Some(quote) = self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.in_string = None;
            }
            return false;
        }
        match c {
            '"' | '\'' | '`' => self.in_string = Some(c),
            '{' => self.depth += 1,
            '}' => {
                self.depth = self.depth.saturating_sub(1);
                return self.depth == 0;
            }
            _ => {}
        }
        false
    }

    /// Feed a whole segment; returns the byte offset of the closing brace.
    fn feed_str(&mut self, s: &str) -> Option<usize> {
        for (idx, c) in s.char_indices() {
            if self.feed(c) {
                return Some(idx);
            }
        }
        // A string literal never spans lines in handler bodies.
        self.in_string = None;
        self.escaped = false;
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STYLESHEET EXTRACTION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct StylesheetExtraction {
    pub stylesheet: Option<String>,
    /// Source with the block replaced by blank lines, so line numbers hold.
    pub remaining: String,
    pub unterminated_at: Option<usize>,
}

/// Cut the `const styles = StyleSheet.create(...)` block out of the source.
pub fn extract_stylesheet(content: &str) -> StylesheetExtraction {
    let Some(m) = STYLESHEET_RE.find(content) else {
        return StylesheetExtraction {
            stylesheet: None,
            remaining: content.to_string(),
            unterminated_at: None,
        };
    };

    let paren = m.end() - 1;
    let start_line = content[..m.start()].matches('\n').count() + 1;
    let (end, unterminated_at) = match find_balanced_end(content, paren, '(', ')') {
        Some(end) => {
            let tail = &content[end..];
            let after_ws = tail.trim_start_matches([' ', '\t']);
            let end = if after_ws.starts_with(';') {
                end + (tail.len() - after_ws.len()) + 1
            } else {
                end
            };
            (end, None)
        }
        None => (content.len(), Some(start_line)),
    };

    let block = &content[m.start()..end];
    let mut remaining = String::with_capacity(content.len());
    remaining.push_str(&content[..m.start()]);
    remaining.push_str(&"\n".repeat(block.matches('\n').count()));
    remaining.push_str(&content[end..]);

    StylesheetExtraction {
        stylesheet: Some(block.to_string()),
        remaining,
        unterminated_at,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP SEGMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Index just past the `>` ending the tag head that starts at `start`.
/// Quotes and `{}` expressions are skipped, so `onPress={() => go()}` is safe.
fn scan_head_end(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
        } else {
            match c {
                '"' | '\'' | '`' => quote = Some(c),
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => return Some(i + 1),
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn starts_tag(chars: &[char], i: usize) -> bool {
    chars[i] == '<'
        && chars
            .get(i + 1)
            .is_some_and(|c| c.is_ascii_alphabetic() || *c == '/')
}

/// Split a markup line into tag heads, closing tags and text runs.
///
/// Text inside `{...}` is never split, so inline JSX in expressions survives.
fn split_segments(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut depth = 0usize;
    let mut i = 0;

    fn flush(buf: &mut String, segments: &mut Vec<String>) {
        let trimmed = buf.trim();
        if !trimmed.is_empty() {
            segments.push(trimmed.to_string());
        }
        buf.clear();
    }

    while i < chars.len() {
        let c = chars[i];
        if depth == 0 && starts_tag(&chars, i) {
            flush(&mut buf, &mut segments);
            match scan_head_end(&chars, i) {
                Some(end) => {
                    segments.push(chars[i..end].iter().collect());
                    i = end;
                    continue;
                }
                None => {
                    segments.push(chars[i..].iter().collect());
                    return segments;
                }
            }
        }
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        buf.push(c);
        i += 1;
    }
    flush(&mut buf, &mut segments);
    segments
}

#[derive(Debug, Clone, PartialEq)]
struct TagHead {
    name: String,
    attrs: String,
    self_closing: bool,
    rest: String,
}

#[derive(Debug, Clone, PartialEq)]
enum HeadScan {
    NotATag,
    Incomplete,
    Complete(TagHead),
}

fn tag_name_len(chars: &[char]) -> usize {
    chars
        .iter()
        .skip(1)
        .take_while(|c| c.is_ascii_alphanumeric() || **c == '_' || **c == '.' || **c == '$')
        .count()
}

fn scan_tag_head(text: &str) -> HeadScan {
    let chars: Vec<char> = text.chars().collect();
    if chars.first() != Some(&'<') || !chars.get(1).is_some_and(|c| c.is_ascii_alphabetic()) {
        return HeadScan::NotATag;
    }
    let name_len = tag_name_len(&chars);
    let Some(end) = scan_head_end(&chars, 0) else {
        return HeadScan::Incomplete;
    };

    let name: String = chars[1..1 + name_len].iter().collect();
    let inner: String = chars[1 + name_len..end - 1].iter().collect();
    let inner = inner.trim_end();
    let (attrs, self_closing) = match inner.strip_suffix('/') {
        Some(attrs) => (attrs.to_string(), true),
        None => (inner.to_string(), false),
    };
    let rest: String = chars[end..].iter().collect();

    HeadScan::Complete(TagHead {
        name,
        attrs,
        self_closing,
        rest: rest.trim().to_string(),
    })
}

/// Head of a tag whose `>` is hidden inside an unterminated value. The line
/// still ends like a tag (`/>` or `>`), so it is closed where it stands.
fn recover_head(text: &str) -> Option<TagHead> {
    let chars: Vec<char> = text.chars().collect();
    let name_len = tag_name_len(&chars);
    let attrs_start = 1 + name_len;
    let (attrs_end, self_closing) = if text.ends_with("/>") {
        (chars.len().checked_sub(2)?, true)
    } else if text.ends_with('>') {
        (chars.len() - 1, false)
    } else {
        return None;
    };
    if attrs_end < attrs_start {
        return None;
    }

    Some(TagHead {
        name: chars[1..attrs_start].iter().collect(),
        attrs: chars[attrs_start..attrs_end].iter().collect(),
        self_closing,
        rest: String::new(),
    })
}

/// Whether `text` ends inside a quoted value that is not within `{}`.
fn ends_in_open_quote(text: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in text.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    quote.is_some() && depth == 0
}

/// A line that opens new structure. An unfinished tag head stops joining here.
fn starts_structure(line: &Line) -> bool {
    let text = line.text.as_str();
    text.starts_with('<')
        || text.starts_with("import ")
        || SCREEN_RE.is_match(text)
        || STATE_RE.is_match(text)
        || FUNCTION_RE.captures(text).is_some_and(|caps| {
            caps.get(4).is_some() && !NON_FUNCTION_NAMES.contains(&&caps[2])
        })
}

/// `</View>` → `View`.
fn closing_tag_name(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("</")?.strip_suffix('>')?;
    Some(inner.trim())
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSE CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

struct ParseContext<'a> {
    catalog: &'a ComponentCatalog,
    diagnostics: Vec<ParseDiagnostic>,
    imports: Vec<ImportDeclaration>,
    screen: Option<ScreenMetadata>,
    states: Vec<StateDeclaration>,
    functions: Vec<FunctionDeclaration>,
}

impl<'a> ParseContext<'a> {
    fn new(catalog: &'a ComponentCatalog) -> Self {
        Self {
            catalog,
            diagnostics: Vec::new(),
            imports: Vec::new(),
            screen: None,
            states: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Consume the declaration at the cursor, if there is one.
    ///
    /// Inside markup a bare lowercase word is text content, not a module name.
    fn declaration(&mut self, cursor: &mut LineCursor, in_markup: bool) -> bool {
        let Some(line) = cursor.peek() else {
            return false;
        };
        if line.spliced {
            return false;
        }
        let text = line.text.clone();

        if text.starts_with("import ") || (!in_markup && is_simple_import(&text)) {
            let imports = parse_import_line(&text);
            if !imports.is_empty() {
                self.imports.extend(imports);
                cursor.advance();
                return true;
            }
        }

        if let Some(caps) = SCREEN_RE.captures(&text) {
            let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            self.screen = Some(parse_screen(attrs, self.catalog));
            cursor.advance();
            return true;
        }

        if let Some(caps) = STATE_RE.captures(&text) {
            let decl = infer_state(&caps[1], &caps[2]);
            match self.states.iter_mut().find(|s| s.name == decl.name) {
                Some(existing) => *existing = decl,
                None => self.states.push(decl),
            }
            cursor.advance();
            return true;
        }

        if let Some((is_async, name, params)) = function_signature(cursor) {
            let func = parse_function(cursor, self, is_async, name, params);
            self.functions.push(func);
            return true;
        }

        false
    }

    fn props(&mut self, attrs: &str, line: usize) -> Props {
        let scanned = parse_props_scanned(attrs, self.catalog);
        for attribute in scanned.unterminated {
            self.diagnostics
                .push(ParseDiagnostic::UnterminatedValue { attribute, line });
        }
        scanned.props
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse the tag at the cursor. The current line must start with `<`.
fn parse_tag(
    cursor: &mut LineCursor,
    ctx: &mut ParseContext<'_>,
    open: &mut Vec<String>,
) -> Node {
    let Some(first) = cursor.next() else {
        return Node::text("");
    };
    let number = first.number;
    let mut text = first.text;

    let head = loop {
        match scan_tag_head(&text) {
            HeadScan::Complete(head) => break head,
            HeadScan::NotATag => return Node::text(text),
            HeadScan::Incomplete => {
                // A bad quote hides the `>` of a line that already ends like a tag.
                if ends_in_open_quote(&text) {
                    if let Some(head) = recover_head(&text) {
                        break head;
                    }
                }
                match cursor.peek() {
                    // Attributes spread over several lines.
                    Some(next) if !starts_structure(next) => {
                        text.push(' ');
                        text.push_str(&next.text);
                        cursor.advance();
                    }
                    _ => {
                        if let Some(head) = recover_head(&text) {
                            break head;
                        }
                        let chars: Vec<char> = text.chars().collect();
                        let name_len = tag_name_len(&chars);
                        let name: String = chars[1..1 + name_len].iter().collect();
                        let attrs: String = chars[1 + name_len..].iter().collect();
                        ctx.diagnostics.push(ParseDiagnostic::UnterminatedTag {
                            tag: name.clone(),
                            line: number,
                        });
                        let props = ctx.props(attrs.trim_end_matches('/'), number);
                        return element(name, props, Vec::new(), number);
                    }
                }
            }
        }
    };

    let props = ctx.props(&head.attrs, number);
    if !head.rest.is_empty() {
        cursor.insert(number, split_segments(&head.rest));
    }
    if head.self_closing {
        return element(head.name, props, Vec::new(), number);
    }

    let mut children = Vec::new();
    let mut closed = false;
    open.push(head.name.clone());

    loop {
        if ctx.declaration(cursor, true) {
            continue;
        }
        cursor.expand();
        let Some(current) = cursor.peek() else {
            break;
        };

        if let Some(name) = closing_tag_name(&current.text) {
            if name == head.name {
                cursor.advance();
                closed = true;
                break;
            }
            if open.iter().any(|o| o == name) {
                // An ancestor closes first; leave its tag for the caller.
                break;
            }
            ctx.diagnostics.push(ParseDiagnostic::UnmatchedClosingTag {
                tag: name.to_string(),
                line: current.number,
            });
            cursor.advance();
            continue;
        }

        if current.text.starts_with('<') {
            children.push(parse_tag(cursor, ctx, open));
        } else {
            children.push(Node::text(current.text.clone()));
            cursor.advance();
        }
    }

    open.pop();
    if !closed {
        ctx.diagnostics.push(ParseDiagnostic::UnterminatedTag {
            tag: head.name.clone(),
            line: number,
        });
    }

    element(head.name, props, children, number)
}

fn element(tag: String, props: Props, children: Vec<Node>, line: usize) -> Node {
    Node::Element(ElementNode {
        tag,
        props,
        children,
        line,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIDE-CHANNEL SCANS
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse an `import` statement or a bare module-name line.
pub fn parse_import_line(line: &str) -> Vec<ImportDeclaration> {
    if let Some(caps) = DEFAULT_IMPORT_RE.captures(line) {
        return vec![ImportDeclaration::Default {
            local: caps[1].to_string(),
            source: caps[2].to_string(),
        }];
    }
    if let Some(caps) = NAMED_IMPORT_RE.captures(line) {
        return vec![ImportDeclaration::Named {
            names: split_names(&caps[1]),
            source: caps[2].to_string(),
        }];
    }
    if let Some(caps) = MIXED_IMPORT_RE.captures(line) {
        return vec![
            ImportDeclaration::Default {
                local: caps[1].to_string(),
                source: caps[3].to_string(),
            },
            ImportDeclaration::Named {
                names: split_names(&caps[2]),
                source: caps[3].to_string(),
            },
        ];
    }
    if let Some(caps) = NAMESPACE_IMPORT_RE.captures(line) {
        return vec![ImportDeclaration::Namespace {
            alias: caps[1].to_string(),
            source: caps[2].to_string(),
        }];
    }
    if is_simple_import(line) {
        return vec![ImportDeclaration::Default {
            local: module_binding_name(line),
            source: line.to_string(),
        }];
    }
    Vec::new()
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|n| !n.is_empty())
        .collect()
}

fn is_simple_import(line: &str) -> bool {
    SIMPLE_IMPORT_RE.is_match(line) && !RESERVED_LINES.contains(&line)
}

/// `expo-haptics` → `expoHaptics`, `lodash.debounce` → `lodashDebounce`.
fn module_binding_name(module: &str) -> String {
    let mut out = String::new();
    let mut upper = false;
    for c in module.chars() {
        if c == '-' || c == '.' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_screen(attrs: &str, catalog: &ComponentCatalog) -> ScreenMetadata {
    let props = parse_props(attrs, catalog);
    let mut screen = ScreenMetadata::default();

    for (key, value) in props.iter() {
        match key {
            "title" => screen.title = Some(value_text(value)),
            "isTabScreen" => {
                screen.is_tab_screen = matches!(value, PropValue::Bool(true))
                    || matches!(value, PropValue::String(s) if s == "true");
            }
            "tabOrder" => screen.tab_order = value_integer(value),
            "tabIcon" => screen.tab_icon = Some(value_text(value)),
            "headerShown" => screen.header_shown = value_truthy(value),
            _ => screen.extra.insert(key, value.clone()),
        }
    }

    screen
}

fn value_text(value: &PropValue) -> String {
    match value {
        PropValue::String(s)
        | PropValue::Expression(s)
        | PropValue::Navigation(s)
        | PropValue::State(s) => s.clone(),
        PropValue::Number(n) => crate::codegen::format_number(*n),
        PropValue::Bool(b) => b.to_string(),
    }
}

/// Integer with `parseInt` leniency: `"2"`, `2`, `"3rd"` all give a number.
fn value_integer(value: &PropValue) -> Option<i64> {
    match value {
        PropValue::Number(n) => Some(n.trunc() as i64),
        PropValue::String(s) => {
            let s = s.trim();
            let sign_len = usize::from(s.starts_with('-') || s.starts_with('+'));
            let digits: String = s[sign_len..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() {
                return None;
            }
            let n: i64 = digits.parse().ok()?;
            Some(if s.starts_with('-') { -n } else { n })
        }
        _ => None,
    }
}

fn value_truthy(value: &PropValue) -> bool {
    match value {
        PropValue::Bool(b) => *b,
        PropValue::Number(n) => *n != 0.0,
        PropValue::String(s) => !s.is_empty() && s != "false",
        PropValue::Expression(e) => e.trim() != "false",
        PropValue::Navigation(_) | PropValue::State(_) => true,
    }
}

/// Infer a state declaration from `name` and the literal after `=`.
pub fn infer_state(name: &str, literal: &str) -> StateDeclaration {
    let literal = literal.trim().trim_end_matches(';').trim_end();
    let (initial_value, inferred_type) = match literal {
        "true" => (serde_json::Value::Bool(true), StateType::Boolean),
        "false" => (serde_json::Value::Bool(false), StateType::Boolean),
        _ => {
            if let Some(n) = parse_number(literal) {
                (json_number(n), StateType::Number)
            } else if is_quoted(literal) {
                let inner = &literal[1..literal.len() - 1];
                (serde_json::Value::String(inner.to_string()), StateType::String)
            } else if literal.starts_with('[') && literal.ends_with(']') {
                let value = serde_json::from_str::<serde_json::Value>(literal)
                    .ok()
                    .filter(|v| v.is_array())
                    .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
                (value, StateType::Array)
            } else if literal.starts_with('{') && literal.ends_with('}') {
                let value = serde_json::from_str::<serde_json::Value>(literal)
                    .ok()
                    .filter(|v| v.is_object())
                    .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
                (value, StateType::Object)
            } else {
                (serde_json::Value::String(literal.to_string()), StateType::String)
            }
        }
    };

    StateDeclaration {
        name: name.to_string(),
        initial_value,
        inferred_type,
        literal: literal.to_string(),
    }
}

fn is_quoted(literal: &str) -> bool {
    literal.len() >= 2
        && ((literal.starts_with('"') && literal.ends_with('"'))
            || (literal.starts_with('\'') && literal.ends_with('\'')))
}

fn json_number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Whether the cursor sits on a function signature whose body opens on this
/// line or the next.
fn function_signature(cursor: &LineCursor) -> Option<(bool, String, String)> {
    let line = cursor.peek()?;
    let caps = FUNCTION_RE.captures(&line.text)?;
    let name = caps[2].to_string();
    if NON_FUNCTION_NAMES.contains(&name.as_str()) {
        return None;
    }
    let opens_here = caps.get(4).is_some();
    let opens_next = cursor
        .peek_at(1)
        .is_some_and(|next| !next.spliced && next.text.starts_with('{'));
    if !opens_here && !opens_next {
        return None;
    }
    Some((caps.get(1).is_some(), name, caps[3].trim().to_string()))
}

fn parse_function(
    cursor: &mut LineCursor,
    ctx: &mut ParseContext<'_>,
    is_async: bool,
    name: String,
    params: String,
) -> FunctionDeclaration {
    let Some(signature) = cursor.next() else {
        return FunctionDeclaration {
            name,
            is_async,
            params,
            body: String::new(),
        };
    };

    let opening = if signature.text.contains('{') {
        signature.text.clone()
    } else {
        cursor.next().map(|l| l.text).unwrap_or_default()
    };
    let brace = opening.find('{').unwrap_or(0);
    let head_tail = &opening[(brace + 1).min(opening.len())..];

    let mut scanner = BraceScanner::opened();
    let mut inline = None;
    let mut lines: Vec<String> = Vec::new();
    let mut closed = false;

    match scanner.feed_str(head_tail) {
        Some(end) => {
            closed = true;
            inline = Some(head_tail[..end].trim().to_string());
        }
        None if !head_tail.trim().is_empty() => inline = Some(head_tail.trim().to_string()),
        None => {}
    }

    while !closed {
        let Some(line) = cursor.next() else {
            break;
        };
        match scanner.feed_str(&line.raw) {
            Some(end) => {
                let before = &line.raw[..end];
                if !before.trim().is_empty() {
                    lines.push(before.trim_end().to_string());
                }
                closed = true;
            }
            None => lines.push(line.raw.trim_end().to_string()),
        }
    }

    if !closed {
        ctx.diagnostics.push(ParseDiagnostic::UnterminatedFunction {
            name: name.clone(),
            line: signature.number,
        });
    }

    let mut body_lines: Vec<String> = inline.into_iter().filter(|s| !s.is_empty()).collect();
    body_lines.extend(dedent(&lines));

    FunctionDeclaration {
        name,
        is_async,
        params,
        body: body_lines.join("\n"),
    }
}

/// Strip the indentation shared by every non-blank line.
fn dedent(lines: &[String]) -> Vec<String> {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.len() >= indent && l.is_char_boundary(indent) {
                l[indent..].to_string()
            } else {
                l.trim_start().to_string()
            }
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN PARSING FUNCTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a whole `.ignite` file.
pub fn parse_ignite_content(content: &str, catalog: &ComponentCatalog) -> ParsedFile {
    let extraction = extract_stylesheet(content);
    let mut ctx = ParseContext::new(catalog);
    if let Some(line) = extraction.unterminated_at {
        ctx.diagnostics
            .push(ParseDiagnostic::UnterminatedStylesheet { line });
    }

    let mut nodes = Vec::new();
    let mut cursor = LineCursor::new(&extraction.remaining);
    let mut open = Vec::new();

    while cursor.peek().is_some() {
        if ctx.declaration(&mut cursor, false) {
            continue;
        }

        cursor.expand();
        let Some(line) = cursor.peek() else {
            break;
        };
        if let Some(name) = closing_tag_name(&line.text) {
            ctx.diagnostics.push(ParseDiagnostic::UnmatchedClosingTag {
                tag: name.to_string(),
                line: line.number,
            });
            cursor.advance();
        } else if line.text.starts_with('<') {
            let node = parse_tag(&mut cursor, &mut ctx, &mut open);
            nodes.push(node);
        } else {
            nodes.push(Node::text(line.text.clone()));
            cursor.advance();
        }
    }

    ParsedFile {
        screen: ctx.screen,
        states: ctx.states,
        functions: ctx.functions,
        imports: ctx.imports,
        nodes,
        stylesheet: extraction.stylesheet,
        diagnostics: ctx.diagnostics,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedFile {
        parse_ignite_content(source, &ComponentCatalog::default())
    }

    fn el(node: &Node) -> &ElementNode {
        node.as_element().expect("element node")
    }

    #[test]
    fn test_find_balanced_end() {
        assert_eq!(find_balanced_end("(a(b)c)", 0, '(', ')'), Some(7));
        assert_eq!(find_balanced_end("({ x: ')' })", 0, '(', ')'), Some(12));
        assert_eq!(find_balanced_end("(never", 0, '(', ')'), None);
    }

    #[test]
    fn test_split_segments() {
        assert_eq!(
            split_segments("<Text>Hello {name}!</Text>"),
            vec!["<Text>", "Hello {name}!", "</Text>"]
        );
        assert_eq!(
            split_segments("<Button onPress={() => setOpen(true)}>Open</Button>"),
            vec!["<Button onPress={() => setOpen(true)}>", "Open", "</Button>"]
        );
        assert_eq!(
            split_segments("{items.map(i => <Text>{i}</Text>)}"),
            vec!["{items.map(i => <Text>{i}</Text>)}"]
        );
        assert_eq!(split_segments("a < b"), vec!["a < b"]);
    }

    #[test]
    fn test_scan_tag_head() {
        match scan_tag_head(r#"<Input placeholder="Email" />"#) {
            HeadScan::Complete(head) => {
                assert_eq!(head.name, "Input");
                assert!(head.self_closing);
                assert_eq!(head.attrs.trim(), r#"placeholder="Email""#);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(scan_tag_head("<Input"), HeadScan::Incomplete);
        assert_eq!(scan_tag_head("</View>"), HeadScan::NotATag);
    }

    #[test]
    fn test_stylesheet_is_extracted_verbatim() {
        let source = "<View style=\"container\"/>\nconst styles = StyleSheet.create({\n  container: { flex: 1 },\n});\n<Text>after</Text>";
        let extraction = extract_stylesheet(source);
        assert_eq!(
            extraction.stylesheet.as_deref(),
            Some("const styles = StyleSheet.create({\n  container: { flex: 1 },\n});")
        );
        assert_eq!(extraction.remaining.lines().count(), source.lines().count());
        assert!(!extraction.remaining.contains("StyleSheet"));

        let parsed = parse(source);
        assert_eq!(parsed.nodes.len(), 2);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_stylesheet_is_reported() {
        let parsed = parse("<View/>\nconst styles = StyleSheet.create({\n  a: { flex: 1 },\n");
        assert!(parsed.stylesheet.is_some());
        assert_eq!(
            parsed.diagnostics,
            vec![ParseDiagnostic::UnterminatedStylesheet { line: 2 }]
        );
        assert_eq!(parsed.nodes.len(), 1);
    }

    #[test]
    fn test_imports() {
        let parsed = parse(
            "import axios from 'axios'\nimport { useEffect, useRef as ref } from 'react';\nimport * as Haptics from \"expo-haptics\"\nimport React, { memo } from 'react'\nlodash.debounce",
        );
        assert_eq!(
            parsed.imports,
            vec![
                ImportDeclaration::Default {
                    local: "axios".into(),
                    source: "axios".into()
                },
                ImportDeclaration::Named {
                    names: vec!["useEffect".into(), "useRef as ref".into()],
                    source: "react".into()
                },
                ImportDeclaration::Namespace {
                    alias: "Haptics".into(),
                    source: "expo-haptics".into()
                },
                ImportDeclaration::Default {
                    local: "React".into(),
                    source: "react".into()
                },
                ImportDeclaration::Named {
                    names: vec!["memo".into()],
                    source: "react".into()
                },
                ImportDeclaration::Default {
                    local: "lodashDebounce".into(),
                    source: "lodash.debounce".into()
                },
            ]
        );
    }

    #[test]
    fn test_screen_metadata() {
        let parsed =
            parse(r#"screen title="Home" isTabScreen="true" tabOrder="2" tabIcon="home" theme=dark"#);
        let screen = parsed.screen.unwrap();
        assert_eq!(screen.title.as_deref(), Some("Home"));
        assert!(screen.is_tab_screen);
        assert_eq!(screen.tab_order, Some(2));
        assert_eq!(screen.tab_icon.as_deref(), Some("home"));
        assert!(screen.header_shown);
        assert_eq!(
            screen.extra.get("theme"),
            Some(&PropValue::String("dark".into()))
        );

        let parsed = parse(r#"screen title="Modal" headerShown="false""#);
        assert!(!parsed.screen.unwrap().header_shown);
    }

    #[test]
    fn test_state_type_inference() {
        let parsed = parse(
            "state n=0\nstate s=\"x\"\nstate b=true\nstate a=[]\nstate o={}\nstate f=1.5\nstate raw=hello\nstate q='single'",
        );
        let types: Vec<(String, StateType)> = parsed
            .states
            .iter()
            .map(|s| (s.name.clone(), s.inferred_type))
            .collect();
        assert_eq!(
            types,
            vec![
                ("n".to_string(), StateType::Number),
                ("s".to_string(), StateType::String),
                ("b".to_string(), StateType::Boolean),
                ("a".to_string(), StateType::Array),
                ("o".to_string(), StateType::Object),
                ("f".to_string(), StateType::Number),
                ("raw".to_string(), StateType::String),
                ("q".to_string(), StateType::String),
            ]
        );
        assert_eq!(parsed.states[0].initial_value, serde_json::json!(0));
        assert_eq!(parsed.states[1].initial_value, serde_json::json!("x"));
        assert_eq!(parsed.states[7].initial_value, serde_json::json!("single"));
    }

    #[test]
    fn test_state_redeclaration_replaces_in_place() {
        let parsed = parse("state a=1\nstate b=2\nstate a=3");
        assert_eq!(parsed.states.len(), 2);
        assert_eq!(parsed.states[0].name, "a");
        assert_eq!(parsed.states[0].initial_value, serde_json::json!(3));
    }

    #[test]
    fn test_unparsable_array_keeps_type() {
        let decl = infer_state("items", "['a', 'b']");
        assert_eq!(decl.inferred_type, StateType::Array);
        assert_eq!(decl.initial_value, serde_json::json!([]));
        assert_eq!(decl.literal, "['a', 'b']");
    }

    #[test]
    fn test_functions() {
        let parsed = parse(
            "async fetchUser(id) {\n  const res = await fetch(url + id);\n  if (res.ok) {\n    setUser(await res.json());\n  }\n}\nincrement() { setCount(count + 1) }\nreset()\n{\n  setCount(0);\n}",
        );
        assert_eq!(parsed.functions.len(), 3);

        let fetch = &parsed.functions[0];
        assert_eq!(fetch.name, "fetchUser");
        assert!(fetch.is_async);
        assert_eq!(fetch.params, "id");
        assert_eq!(
            fetch.body,
            "const res = await fetch(url + id);\nif (res.ok) {\n  setUser(await res.json());\n}"
        );

        assert_eq!(parsed.functions[1].name, "increment");
        assert_eq!(parsed.functions[1].body, "setCount(count + 1)");
        assert_eq!(parsed.functions[2].name, "reset");
        assert_eq!(parsed.functions[2].body, "setCount(0);");
        assert!(parsed.nodes.is_empty());
    }

    #[test]
    fn test_function_body_ignores_braces_in_strings() {
        let parsed = parse("log() {\n  console.log('}');\n}\n<View/>");
        assert_eq!(parsed.functions[0].body, "console.log('}');");
        assert_eq!(parsed.nodes.len(), 1);
    }

    #[test]
    fn test_unterminated_function() {
        let parsed = parse("save() {\n  persist();\n");
        assert_eq!(parsed.functions[0].body, "persist();");
        assert_eq!(
            parsed.diagnostics,
            vec![ParseDiagnostic::UnterminatedFunction {
                name: "save".into(),
                line: 1
            }]
        );
    }

    #[test]
    fn test_call_without_body_is_text() {
        let parsed = parse("Welcome(back)");
        assert!(parsed.functions.is_empty());
        assert_eq!(parsed.nodes, vec![Node::text("Welcome(back)")]);
    }

    #[test]
    fn test_nested_markup() {
        let parsed = parse(
            "<View style=\"container\">\n  <Text>Title</Text>\n  <Input placeholder=\"Email\" bind=\"email\" />\n  <Button onPress=\"go('/settings')\">\n    Settings\n  </Button>\n</View>",
        );
        assert_eq!(parsed.nodes.len(), 1);
        let view = el(&parsed.nodes[0]);
        assert_eq!(view.tag, "View");
        assert_eq!(view.children.len(), 3);

        let text = el(&view.children[0]);
        assert_eq!(text.children, vec![Node::text("Title")]);

        let input = el(&view.children[1]);
        assert!(input.children.is_empty());
        assert_eq!(input.props.get("bind"), Some(&PropValue::State("email".into())));

        let button = el(&view.children[2]);
        assert_eq!(button.children, vec![Node::text("Settings")]);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_single_line_round_trip_shape() {
        let parsed = parse(
            "screen title=\"Home\" isTabScreen=\"true\" tabOrder=\"1\"\nstate count=0\n<View><Text>{count}</Text></View>",
        );
        assert_eq!(parsed.nodes.len(), 1);
        let view = el(&parsed.nodes[0]);
        assert_eq!(view.tag, "View");
        assert_eq!(view.children.len(), 1);
        let text = el(&view.children[0]);
        assert_eq!(text.tag, "Text");
        assert_eq!(text.children, vec![Node::text("{count}")]);
    }

    #[test]
    fn test_same_named_nesting_pairs_correctly() {
        let parsed = parse("<View>\n<View>\n<Text>inner</Text>\n</View>\n<Text>outer</Text>\n</View>");
        let outer = el(&parsed.nodes[0]);
        assert_eq!(outer.children.len(), 2);
        assert_eq!(el(&outer.children[0]).tag, "View");
        assert_eq!(el(&outer.children[1]).tag, "Text");
    }

    #[test]
    fn test_closing_tag_as_line_suffix() {
        let parsed = parse("<Text>\nHello there</Text>\n<View/>");
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(el(&parsed.nodes[0]).children, vec![Node::text("Hello there")]);
    }

    #[test]
    fn test_multiline_tag_head() {
        let parsed = parse("<Input\n  placeholder=\"Password\"\n  secureTextEntry\n/>\n<Text>next</Text>");
        assert_eq!(parsed.nodes.len(), 2);
        let input = el(&parsed.nodes[0]);
        assert_eq!(input.tag, "Input");
        assert_eq!(
            input.props.get("secureTextEntry"),
            Some(&PropValue::Bool(true))
        );
    }

    #[test]
    fn test_arrow_function_in_attribute() {
        let parsed = parse("<Button onPress={() => setCount(count + 1)}>+</Button>");
        let button = el(&parsed.nodes[0]);
        assert_eq!(
            button.props.get("onPress"),
            Some(&PropValue::Expression("() => setCount(count + 1)".into()))
        );
        assert_eq!(button.children, vec![Node::text("+")]);
    }

    #[test]
    fn test_unterminated_tag_consumes_to_end() {
        let parsed = parse("<View>\n<Text>a</Text>\n<Text>b</Text>");
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(el(&parsed.nodes[0]).children.len(), 2);
        assert_eq!(
            parsed.diagnostics,
            vec![ParseDiagnostic::UnterminatedTag {
                tag: "View".into(),
                line: 1
            }]
        );
    }

    #[test]
    fn test_ancestor_close_ends_unclosed_child() {
        let parsed = parse("<View>\n<Text>oops\n</View>\n<Image/>");
        assert_eq!(parsed.nodes.len(), 2);
        let view = el(&parsed.nodes[0]);
        assert_eq!(el(&view.children[0]).children, vec![Node::text("oops")]);
        assert_eq!(
            parsed.diagnostics,
            vec![ParseDiagnostic::UnterminatedTag {
                tag: "Text".into(),
                line: 2
            }]
        );
    }

    #[test]
    fn test_stray_closing_tag_is_dropped() {
        let parsed = parse("</Text>\n<View/>");
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(
            parsed.diagnostics,
            vec![ParseDiagnostic::UnmatchedClosingTag {
                tag: "Text".into(),
                line: 1
            }]
        );
    }

    #[test]
    fn test_freestanding_text() {
        let parsed = parse("Hello World");
        assert_eq!(parsed.nodes, vec![Node::text("Hello World")]);
    }

    #[test]
    fn test_screen_word_is_not_an_import() {
        let parsed = parse("screen");
        assert!(parsed.imports.is_empty());
        assert!(parsed.screen.is_some());
    }

    #[test]
    fn test_state_inside_markup_is_a_declaration() {
        let parsed = parse("<View>\nstate count=0\n<Text>{count}</Text>\n</View>");
        assert_eq!(parsed.states.len(), 1);
        assert_eq!(parsed.states[0].name, "count");
        assert_eq!(parsed.states[0].inferred_type, StateType::Number);

        let view = el(&parsed.nodes[0]);
        assert_eq!(view.children.len(), 1);
        assert_eq!(el(&view.children[0]).tag, "Text");
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_function_inside_markup_is_a_declaration() {
        let parsed = parse(
            "<View>\n  increment() {\n    setCount(count + 1);\n  }\n  <Button onPress={increment}>+</Button>\n</View>",
        );
        assert_eq!(parsed.functions.len(), 1);
        assert_eq!(parsed.functions[0].name, "increment");
        assert_eq!(parsed.functions[0].body, "setCount(count + 1);");

        let view = el(&parsed.nodes[0]);
        assert_eq!(view.children.len(), 1);
        assert_eq!(el(&view.children[0]).tag, "Button");
    }

    #[test]
    fn test_import_inside_markup_is_a_declaration_but_bare_words_are_text() {
        let parsed = parse("<View>\nimport axios from 'axios'\n<Text>\nloading\n</Text>\n</View>");
        assert_eq!(
            parsed.imports,
            vec![ImportDeclaration::Default {
                local: "axios".into(),
                source: "axios".into()
            }]
        );
        let text = el(&el(&parsed.nodes[0]).children[0]);
        assert_eq!(text.children, vec![Node::text("loading")]);
    }

    #[test]
    fn test_unterminated_quote_stays_on_its_line() {
        let parsed = parse(
            "<View>\n<Input placeholder=\"abc />\n<Text>Hello</Text>\n</View>\nstate count=0\n<Text>after</Text>",
        );
        assert_eq!(parsed.nodes.len(), 2);

        let view = el(&parsed.nodes[0]);
        assert_eq!(view.children.len(), 2);
        let input = el(&view.children[0]);
        assert_eq!(input.tag, "Input");
        assert!(input.children.is_empty());
        assert_eq!(
            input.props.get("placeholder"),
            Some(&PropValue::String("abc".into()))
        );
        assert_eq!(el(&view.children[1]).children, vec![Node::text("Hello")]);

        assert_eq!(parsed.states.len(), 1);
        assert_eq!(el(&parsed.nodes[1]).children, vec![Node::text("after")]);
        assert_eq!(
            parsed.diagnostics,
            vec![ParseDiagnostic::UnterminatedValue {
                attribute: "placeholder".into(),
                line: 2
            }]
        );
    }

    #[test]
    fn test_unterminated_quote_on_open_tag_keeps_children() {
        let parsed = parse("<Text style=\"title>\nHi\n</Text>");
        let text = el(&parsed.nodes[0]);
        assert_eq!(text.tag, "Text");
        assert_eq!(text.children, vec![Node::text("Hi")]);
        assert_eq!(
            parsed.diagnostics,
            vec![ParseDiagnostic::UnterminatedValue {
                attribute: "style".into(),
                line: 1
            }]
        );
    }

    #[test]
    fn test_header_shown_spellings() {
        for source in [
            "screen headerShown=\"false\"",
            "screen headerShown='false'",
            "screen headerShown=false",
            "screen headerShown={false}",
        ] {
            assert!(!parse(source).screen.unwrap().header_shown, "{}", source);
        }
        assert!(parse("screen headerShown=\"true\"").screen.unwrap().header_shown);
        assert!(parse("screen title=\"x\"").screen.unwrap().header_shown);
    }
}
