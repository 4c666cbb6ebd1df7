//! Router generation.
//!
//! Aggregates every route of a compile pass into a single navigation module:
//! a bottom-tab navigator for tab screens nested as `MainTabs` inside a stack
//! navigator that also holds every other screen.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::codegen::js_string;
use crate::emit::{write_if_changed, WriteOutcome};
use crate::error::Result;
use crate::ir::RouteRecord;

pub const ROUTER_FILE: &str = "router.js";
const DEFAULT_TAB_ICON: &str = "ellipse";

/// Display name: `SettingsIndex` → `Settings`. A bare `Index` is kept.
pub fn clean_component_name(name: &str) -> &str {
    match name.strip_suffix("Index") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}

fn compare_routes(a: &RouteRecord, b: &RouteRecord) -> Ordering {
    let (a_tab, b_tab) = (a.options.is_tab_screen, b.options.is_tab_screen);
    b_tab
        .cmp(&a_tab)
        .then_with(|| {
            if a_tab {
                let order = |r: &RouteRecord| r.options.tab_order.unwrap_or(i64::MAX);
                order(a).cmp(&order(b))
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| a.logical_path.cmp(&b.logical_path))
        .then_with(|| a.component_name.cmp(&b.component_name))
}

/// Tabs first by `tab_order` (missing last), then stack screens by path.
pub fn sort_routes(routes: &[RouteRecord]) -> Vec<RouteRecord> {
    let mut sorted = routes.to_vec();
    sorted.sort_by(compare_routes);
    sorted
}

fn title_of(route: &RouteRecord) -> String {
    route
        .options
        .title
        .clone()
        .unwrap_or_else(|| clean_component_name(&route.component_name).to_string())
}

/// Screens register under their full component name, the same name generated
/// `navigation.navigate` calls use. The cleaned name is only the title.
fn push_screen(out: &mut String, navigator: &str, route: &RouteRecord) {
    out.push_str(&format!("      <{}.Screen\n", navigator));
    out.push_str(&format!("        name=\"{}\"\n", route.component_name));
    out.push_str(&format!("        component={{{}}}\n", route.component_name));
    out.push_str(&format!(
        "        options={{{{ title: {}, headerShown: {} }}}}\n",
        js_string(&title_of(route)),
        route.options.header_shown
    ));
    out.push_str("      />\n");
}

/// Render the navigation module for a complete route table.
pub fn generate_router(routes: &[RouteRecord]) -> String {
    let sorted = sort_routes(routes);
    let (tabs, stack): (Vec<&RouteRecord>, Vec<&RouteRecord>) =
        sorted.iter().partition(|r| r.options.is_tab_screen);

    let mut out = String::new();
    out.push_str("import React from 'react';\n");
    if !tabs.is_empty() {
        out.push_str("import { createBottomTabNavigator } from '@react-navigation/bottom-tabs';\n");
    }
    out.push_str("import { createStackNavigator } from '@react-navigation/stack';\n");
    if !tabs.is_empty() {
        out.push_str("import { Ionicons } from '@expo/vector-icons';\n");
    }
    out.push('\n');

    for route in &sorted {
        out.push_str(&format!(
            "import {} from {};\n",
            route.component_name,
            js_string(&format!("./screens/{}", route.module_path))
        ));
    }
    if !sorted.is_empty() {
        out.push('\n');
    }

    if !tabs.is_empty() {
        out.push_str("const Tab = createBottomTabNavigator();\n");
    }
    out.push_str("const Stack = createStackNavigator();\n\n");

    if !tabs.is_empty() {
        out.push_str("const TAB_ICONS = {\n");
        for route in &tabs {
            let icon = route.options.tab_icon.as_deref().unwrap_or(DEFAULT_TAB_ICON);
            out.push_str(&format!("  {}: {},\n", route.component_name, js_string(icon)));
        }
        out.push_str("};\n\n");

        out.push_str("function TabNavigator() {\n");
        out.push_str("  return (\n");
        out.push_str("    <Tab.Navigator\n");
        out.push_str("      screenOptions={({ route }) => ({\n");
        out.push_str("        tabBarIcon: ({ focused, color, size }) => {\n");
        out.push_str(&format!(
            "          const iconName = TAB_ICONS[route.name] || '{}';\n",
            DEFAULT_TAB_ICON
        ));
        out.push_str(
            "          return <Ionicons name={focused ? iconName : `${iconName}-outline`} size={size} color={color} />;\n",
        );
        out.push_str("        },\n");
        out.push_str("        tabBarActiveTintColor: '#007AFF',\n");
        out.push_str("        tabBarInactiveTintColor: 'gray',\n");
        out.push_str("        headerShown: false,\n");
        out.push_str("      })}\n");
        out.push_str("    >\n");
        for route in &tabs {
            push_screen(&mut out, "Tab", route);
        }
        out.push_str("    </Tab.Navigator>\n");
        out.push_str("  );\n");
        out.push_str("}\n\n");
    }

    out.push_str("export default function Router() {\n");
    out.push_str("  return (\n");
    out.push_str("    <Stack.Navigator screenOptions={{ headerShown: false }}>\n");
    if !tabs.is_empty() {
        out.push_str("      <Stack.Screen name=\"MainTabs\" component={TabNavigator} />\n");
    }
    for route in &stack {
        push_screen(&mut out, "Stack", route);
    }
    out.push_str("    </Stack.Navigator>\n");
    out.push_str("  );\n");
    out.push_str("}\n");
    out
}

/// Write `<out_dir>/router.js`.
pub fn write_router(out_dir: &Path, routes: &[RouteRecord]) -> Result<(PathBuf, WriteOutcome)> {
    let path = out_dir.join(ROUTER_FILE);
    let outcome = write_if_changed(&path, &generate_router(routes))?;
    Ok((path, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::RouteOptions;

    fn route(logical_path: &str, component: &str, tab: bool, order: Option<i64>) -> RouteRecord {
        RouteRecord {
            logical_path: logical_path.to_string(),
            component_name: component.to_string(),
            source_file: format!("{}.ignite", logical_path),
            module_path: if tab {
                format!("(tabs)/{}", logical_path)
            } else {
                logical_path.to_string()
            },
            options: RouteOptions {
                title: None,
                header_shown: true,
                is_tab_screen: tab,
                tab_order: order,
                tab_icon: None,
            },
        }
    }

    #[test]
    fn test_clean_component_name() {
        assert_eq!(clean_component_name("SettingsIndex"), "Settings");
        assert_eq!(clean_component_name("Index"), "Index");
        assert_eq!(clean_component_name("Profile"), "Profile");
    }

    #[test]
    fn test_sort_routes_tabs_first_by_order() {
        let routes = vec![
            route("zeta", "Zeta", false, None),
            route("profile", "Profile", true, None),
            route("alpha", "Alpha", false, None),
            route("home", "Home", true, Some(1)),
            route("feed", "Feed", true, Some(2)),
            route("about", "About", true, None),
        ];
        let names: Vec<String> = sort_routes(&routes)
            .into_iter()
            .map(|r| r.component_name)
            .collect();
        assert_eq!(names, vec!["Home", "Feed", "About", "Profile", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_sort_is_independent_of_input_order() {
        let mut routes = vec![
            route("b", "B", true, Some(1)),
            route("a", "A", true, Some(1)),
            route("c", "C", false, None),
        ];
        let first = sort_routes(&routes);
        routes.reverse();
        assert_eq!(sort_routes(&routes), first);
        assert_eq!(first[0].component_name, "A");
    }

    #[test]
    fn test_router_wires_tabs_and_stack() {
        let mut home = route("home", "Home", true, Some(1));
        home.options.tab_icon = Some("home".into());
        let mut settings = route("settings", "SettingsIndex", false, None);
        settings.module_path = "settings/index".into();
        settings.options.header_shown = false;

        let code = generate_router(&[settings, home]);
        assert!(code.contains("import Home from './screens/(tabs)/home';"));
        assert!(code.contains("import SettingsIndex from './screens/settings/index';"));
        assert!(code.contains("  Home: 'home',"));
        assert!(code.contains("<Stack.Screen name=\"MainTabs\" component={TabNavigator} />"));
        assert!(code.contains("        name=\"SettingsIndex\"\n        component={SettingsIndex}\n        options={{ title: 'Settings', headerShown: false }}"));

        let tab_pos = code.find("<Tab.Screen").unwrap();
        let main_tabs_pos = code.find("MainTabs").unwrap();
        let settings_pos = code.find("name=\"SettingsIndex\"").unwrap();
        assert!(tab_pos < main_tabs_pos && main_tabs_pos < settings_pos);
    }

    #[test]
    fn test_router_without_tabs_has_no_main_tabs() {
        let code = generate_router(&[route("about", "About", false, None)]);
        assert!(!code.contains("MainTabs"));
        assert!(!code.contains("TabNavigator"));
        assert!(code.contains("<Stack.Screen\n        name=\"About\""));
    }

    #[test]
    fn test_write_router_overwrites_stale_output() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(ROUTER_FILE), "stale").unwrap();

        let (path, outcome) = write_router(tmp.path(), &[route("about", "About", false, None)]).unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        assert!(std::fs::read_to_string(path).unwrap().contains("import About from './screens/about';"));

        let (_, outcome) = write_router(tmp.path(), &[route("about", "About", false, None)]).unwrap();
        assert_eq!(outcome, WriteOutcome::Unchanged);
    }

    #[test]
    fn test_explicit_title_wins() {
        let mut r = route("about", "About", false, None);
        r.options.title = Some("About us".into());
        let code = generate_router(&[r]);
        assert!(code.contains("title: 'About us'"));
    }

    #[test]
    fn test_navigation_targets_are_registered_screen_names() {
        let catalog = crate::catalog::ComponentCatalog::default();
        let mut settings = route("settings", "SettingsIndex", false, None);
        settings.module_path = "settings/index".into();
        let routes = vec![route("home", "Home", true, Some(1)), settings];

        let parsed = crate::parse::parse_ignite_content(
            "<Button onPress=\"go('/settings')\">Settings</Button>",
            &catalog,
        );
        let screen = crate::codegen::generate_component(&parsed, "Home", &routes, &catalog);
        assert!(screen.contains("navigation.navigate('SettingsIndex')"));

        let router = generate_router(&routes);
        assert!(router.contains("name=\"SettingsIndex\"\n        component={SettingsIndex}"));
        assert!(router.contains("  Home: 'ellipse',"));
        assert!(!router.contains("name=\"Settings\""));
    }
}
