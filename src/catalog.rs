//! Component Catalog
//!
//! Maps DSL tag names to React Native component names and records which props
//! and style shorthands each component understands. The catalog is plain data;
//! callers build one (usually `ComponentCatalog::default()`) and pass it by
//! reference into the parser and the generator.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportKind {
    Default,
    Named,
}

/// A third-party component that needs its own import line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageComponent {
    pub package: String,
    pub import: String,
    pub kind: ImportKind,
}

/// Imports required by a set of used components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredImports {
    /// Core UI library components, sorted.
    pub core: Vec<String>,
    /// Package → (kind, component names), sorted by package.
    pub packages: BTreeMap<String, (ImportKind, BTreeSet<String>)>,
    /// Tags the catalog knows nothing about.
    pub custom: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ComponentCatalog {
    pub components: HashMap<String, String>,
    pub core_components: HashSet<String>,
    pub package_components: HashMap<String, PackageComponent>,
    pub component_props: HashMap<String, HashSet<String>>,
    pub style_props: HashSet<String>,
    pub button_tags: HashSet<String>,
    pub text_tags: HashSet<String>,
    pub toggle_tags: HashSet<String>,
    pub text_input_tags: HashSet<String>,
    pub image_tags: HashSet<String>,
    pub keyboard_types: Vec<String>,
    pub auto_capitalize: Vec<String>,
    pub boolean_state_hints: Vec<String>,
    /// Case-insensitive fragments marking a bound input state as numeric.
    pub numeric_state_hints: Vec<String>,
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ComponentCatalog {
    fn default() -> Self {
        let mut components = HashMap::new();
        for name in [
            "View",
            "Text",
            "Image",
            "ScrollView",
            "FlatList",
            "TextInput",
            "TouchableOpacity",
            "Switch",
            "ActivityIndicator",
            "Modal",
            "SafeAreaView",
            "Pressable",
        ] {
            components.insert(name.to_string(), name.to_string());
        }
        for (alias, target) in [
            ("Button", "TouchableOpacity"),
            ("Stack", "View"),
            ("Scroll", "ScrollView"),
            ("List", "FlatList"),
            ("Input", "TextInput"),
            ("Loading", "ActivityIndicator"),
            ("Safe", "SafeAreaView"),
        ] {
            components.insert(alias.to_string(), target.to_string());
        }

        let core_components = set(&[
            "View",
            "Text",
            "Image",
            "ScrollView",
            "FlatList",
            "TextInput",
            "TouchableOpacity",
            "Switch",
            "Button",
            "ActivityIndicator",
            "Modal",
            "SafeAreaView",
            "Pressable",
        ]);

        let mut package_components = HashMap::new();
        for (name, package, import, kind) in [
            ("NavigationContainer", "@react-navigation/native", "NavigationContainer", ImportKind::Named),
            ("LinearGradient", "expo-linear-gradient", "LinearGradient", ImportKind::Named),
            ("Camera", "expo-camera", "Camera", ImportKind::Named),
            ("MapView", "react-native-maps", "MapView", ImportKind::Default),
            ("Icon", "react-native-vector-icons/Ionicons", "Icon", ImportKind::Default),
            ("Ionicons", "@expo/vector-icons", "Ionicons", ImportKind::Named),
            ("FAB", "react-native-paper", "FAB", ImportKind::Named),
            ("Card", "react-native-paper", "Card", ImportKind::Named),
            ("PanGestureHandler", "react-native-gesture-handler", "PanGestureHandler", ImportKind::Named),
            ("TapGestureHandler", "react-native-gesture-handler", "TapGestureHandler", ImportKind::Named),
        ] {
            package_components.insert(
                name.to_string(),
                PackageComponent {
                    package: package.to_string(),
                    import: import.to_string(),
                    kind,
                },
            );
        }

        let mut component_props = HashMap::new();
        component_props.insert("View".to_string(), set(&["onPress", "onLongPress", "onLayout"]));
        component_props.insert(
            "Text".to_string(),
            set(&["numberOfLines", "ellipsizeMode", "selectable"]),
        );
        component_props.insert(
            "TextInput".to_string(),
            set(&[
                "value",
                "onChangeText",
                "placeholder",
                "secureTextEntry",
                "keyboardType",
                "autoCapitalize",
                "autoCorrect",
                "multiline",
                "maxLength",
                "editable",
                "onFocus",
                "onBlur",
                "onSubmit",
                "bind",
            ]),
        );
        component_props.insert(
            "TouchableOpacity".to_string(),
            set(&["onPress", "onLongPress", "disabled", "activeOpacity"]),
        );
        component_props.insert(
            "Image".to_string(),
            set(&[
                "source",
                "resizeMode",
                "onLoad",
                "onError",
                "fadeDuration",
                "progressiveRenderingEnabled",
            ]),
        );
        component_props.insert(
            "FlatList".to_string(),
            set(&[
                "data",
                "renderItem",
                "keyExtractor",
                "onRefresh",
                "refreshing",
                "onEndReached",
                "onEndReachedThreshold",
            ]),
        );
        component_props.insert("Switch".to_string(), set(&["value", "onValueChange", "bind", "disabled"]));
        component_props.insert(
            "*".to_string(),
            set(&[
                "style",
                "testID",
                "accessibilityLabel",
                "accessibilityHint",
                "accessible",
                "onPress",
                "onLongPress",
                "children",
            ]),
        );

        let style_props = set(&[
            // Layout
            "flex", "flexGrow", "flexShrink", "flexBasis", "row", "col", "wrap", "nowrap",
            "center", "start", "end", "between", "around", "full", "half", "third", "quarter",
            // Spacing
            "p", "px", "py", "pt", "pr", "pb", "pl", "m", "mx", "my", "mt", "mr", "mb", "ml",
            "gap", "gapX", "gapY",
            // Sizing
            "w", "h", "minW", "minH", "maxW", "maxH", "aspectRatio",
            // Position
            "absolute", "relative", "top", "right", "bottom", "left", "zIndex",
            // Background and border
            "bg", "bgImage", "bgSize", "bgPosition", "border", "borderTop", "borderRight",
            "borderBottom", "borderLeft", "borderColor", "borderWidth", "borderStyle",
            "rounded", "roundedTop", "roundedRight", "roundedBottom", "roundedLeft",
            // Shadow
            "shadow", "shadowColor", "shadowOffset", "shadowOpacity", "shadowRadius", "elevation",
            // Text
            "font", "fontSize", "fontWeight", "fontStyle", "color", "textAlign", "textTransform",
            "lineHeight", "letterSpacing",
            // Transform, opacity, overflow, display, animation
            "scale", "rotate", "translateX", "translateY", "opacity", "overflow", "overflowX",
            "overflowY", "display", "hidden", "animated", "duration", "delay", "easing",
        ]);

        Self {
            components,
            core_components,
            package_components,
            component_props,
            style_props,
            button_tags: set(&["Button"]),
            text_tags: set(&["Text"]),
            toggle_tags: set(&["Switch"]),
            text_input_tags: set(&["Input", "TextInput"]),
            image_tags: set(&["Image"]),
            keyboard_types: list(&[
                "default",
                "email-address",
                "numeric",
                "phone-pad",
                "number-pad",
                "decimal-pad",
                "visible-password",
                "ascii-capable",
                "numbers-and-punctuation",
                "url",
                "name-phone-pad",
                "twitter",
                "web-search",
            ]),
            auto_capitalize: list(&["none", "sentences", "words", "characters"]),
            boolean_state_hints: list(&["is", "has", "show", "enabled", "Mode", "Enabled", "Services"]),
            numeric_state_hints: list(&["count", "interval"]),
        }
    }
}

impl ComponentCatalog {
    /// Target component for a DSL tag. Unknown tags pass through unchanged so
    /// custom and third-party components work without registration.
    pub fn resolve_tag<'a>(&'a self, tag: &'a str) -> &'a str {
        self.components.get(tag).map(String::as_str).unwrap_or(tag)
    }

    pub fn is_custom_component(&self, tag: &str) -> bool {
        !self.components.contains_key(tag) && !self.package_components.contains_key(tag)
    }

    /// Whether `prop` is declared for `target`, either directly or via `*`.
    pub fn is_prop_known(&self, target: &str, prop: &str) -> bool {
        let direct = self
            .component_props
            .get(target)
            .is_some_and(|props| props.contains(prop));
        let wildcard = self
            .component_props
            .get("*")
            .is_some_and(|props| props.contains(prop));
        direct || wildcard
    }

    pub fn is_style_prop(&self, name: &str) -> bool {
        self.style_props.contains(name)
    }

    pub fn is_button(&self, tag: &str) -> bool {
        self.button_tags.contains(tag)
    }

    pub fn is_text(&self, tag: &str) -> bool {
        self.text_tags.contains(tag)
    }

    pub fn is_toggle(&self, tag: &str) -> bool {
        self.toggle_tags.contains(tag)
    }

    pub fn is_text_input(&self, tag: &str) -> bool {
        self.text_input_tags.contains(tag)
    }

    pub fn is_image(&self, tag: &str) -> bool {
        self.image_tags.contains(tag)
    }

    /// Validate a `keyboardType` value, falling back to `default`.
    pub fn keyboard_type<'a>(&'a self, value: &'a str) -> &'a str {
        if self.keyboard_types.iter().any(|k| k == value) {
            value
        } else {
            "default"
        }
    }

    /// Validate an `autoCapitalize` value, falling back to `sentences`.
    pub fn auto_capitalize<'a>(&'a self, value: &'a str) -> &'a str {
        if self.auto_capitalize.iter().any(|k| k == value) {
            value
        } else {
            "sentences"
        }
    }

    /// Whether a state name reads like a boolean flag (`isOpen`, `darkMode`).
    pub fn looks_boolean(&self, state_name: &str) -> bool {
        self.boolean_state_hints.iter().any(|hint| {
            let starts_lowercase_hint = hint
                .chars()
                .next()
                .is_some_and(|c| c.is_lowercase());
            if starts_lowercase_hint {
                // `is` must be a prefix followed by an uppercase letter: `isOpen`, not `issue`.
                state_name
                    .strip_prefix(hint.as_str())
                    .and_then(|rest| rest.chars().next())
                    .is_some_and(|c| c.is_uppercase())
            } else {
                state_name.contains(hint.as_str())
            }
        })
    }

    /// Whether a bound input state reads like a number (`count`, `refreshInterval`).
    pub fn looks_numeric(&self, state_name: &str) -> bool {
        let lower = state_name.to_lowercase();
        self.numeric_state_hints
            .iter()
            .any(|hint| lower.contains(&hint.to_lowercase()))
    }

    /// Group the tags used in a file by where their import comes from.
    pub fn required_imports<'a, I>(&self, tags: I) -> RequiredImports
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut core = BTreeSet::new();
        let mut custom = BTreeSet::new();
        let mut packages: BTreeMap<String, (ImportKind, BTreeSet<String>)> = BTreeMap::new();

        for tag in tags {
            if let Some(pkg) = self.package_components.get(tag) {
                packages
                    .entry(pkg.package.clone())
                    .or_insert_with(|| (pkg.kind, BTreeSet::new()))
                    .1
                    .insert(pkg.import.clone());
                continue;
            }
            let target = self.resolve_tag(tag);
            if self.core_components.contains(target) {
                core.insert(target.to_string());
            } else {
                custom.insert(tag.to_string());
            }
        }

        RequiredImports {
            core: core.into_iter().collect(),
            packages,
            custom: custom.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_tag_aliases_and_passthrough() {
        let catalog = ComponentCatalog::default();
        assert_eq!(catalog.resolve_tag("Button"), "TouchableOpacity");
        assert_eq!(catalog.resolve_tag("Stack"), "View");
        assert_eq!(catalog.resolve_tag("Input"), "TextInput");
        assert_eq!(catalog.resolve_tag("LottieView"), "LottieView");
        assert!(catalog.is_custom_component("LottieView"));
        assert!(!catalog.is_custom_component("MapView"));
    }

    #[test]
    fn test_prop_lookup_uses_wildcard() {
        let catalog = ComponentCatalog::default();
        assert!(catalog.is_prop_known("TextInput", "placeholder"));
        assert!(catalog.is_prop_known("Image", "style"));
        assert!(!catalog.is_prop_known("Image", "placeholder"));
        assert!(catalog.is_style_prop("bg"));
    }

    #[test]
    fn test_validated_vocabularies_fall_back() {
        let catalog = ComponentCatalog::default();
        assert_eq!(catalog.keyboard_type("email-address"), "email-address");
        assert_eq!(catalog.keyboard_type("emoji"), "default");
        assert_eq!(catalog.auto_capitalize("words"), "words");
        assert_eq!(catalog.auto_capitalize("shout"), "sentences");
    }

    #[test]
    fn test_boolean_naming_convention() {
        let catalog = ComponentCatalog::default();
        assert!(catalog.looks_boolean("isOpen"));
        assert!(catalog.looks_boolean("darkMode"));
        assert!(catalog.looks_boolean("notificationsEnabled"));
        assert!(!catalog.looks_boolean("issue"));
        assert!(!catalog.looks_boolean("email"));
        assert!(catalog.looks_boolean("enabledSync"));
    }

    #[test]
    fn test_numeric_naming_convention() {
        let catalog = ComponentCatalog::default();
        assert!(catalog.looks_numeric("count"));
        assert!(catalog.looks_numeric("retryCount"));
        assert!(catalog.looks_numeric("refreshInterval"));
        assert!(!catalog.looks_numeric("email"));
    }

    #[test]
    fn test_required_imports_groups_by_origin() {
        let catalog = ComponentCatalog::default();
        let imports = catalog.required_imports(["View", "Button", "Card", "FAB", "Fancy", "View"]);
        assert_eq!(imports.core, vec!["TouchableOpacity", "View"]);
        let paper = imports.packages.get("react-native-paper").unwrap();
        assert_eq!(paper.0, ImportKind::Named);
        assert_eq!(paper.1.iter().cloned().collect::<Vec<_>>(), vec!["Card", "FAB"]);
        assert_eq!(imports.custom, vec!["Fancy"]);
    }

    #[test]
    fn test_custom_catalog_can_remap_tags() {
        let mut catalog = ComponentCatalog::default();
        catalog
            .components
            .insert("Row".to_string(), "View".to_string());
        assert_eq!(catalog.resolve_tag("Row"), "View");
    }
}
