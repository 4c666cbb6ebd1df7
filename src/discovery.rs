//! Discovery Module for the Ignite compiler
//!
//! Finds screen sources under the screens directory and derives each file's
//! route identity (component name, logical path, output location) from its
//! relative path.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;
use crate::ir::{RouteOptions, RouteRecord, ScreenMetadata};

/// Directory segment that groups tab screens.
pub const TAB_GROUP: &str = "(tabs)";

// ═══════════════════════════════════════════════════════════════════════════════
// FILE DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

fn is_skipped(entry: &DirEntry, ignore: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || ignore.iter().any(|i| *i == name)
}

/// Recursively find every `*.<extension>` file below `dir`, sorted by path.
///
/// Hidden entries and names on the ignore list are skipped along with
/// everything below them.
pub fn find_source_files(dir: &Path, extension: &str, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e, ignore));

    for entry in walker {
        let entry = entry?;
        let matches_ext = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == extension);
        if entry.file_type().is_file() && matches_ext {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Path of `file` relative to `root`, with `/` separators.
pub fn relative_slash_path(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAMING
// ═══════════════════════════════════════════════════════════════════════════════

fn upper_camel(segment: &str) -> String {
    segment
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Component name for a group-free route path: `settings/index` →
/// `SettingsIndex`, `profile/edit-name` → `ProfileEditName`.
pub fn component_name_for(path: &str) -> String {
    let name: String = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != TAB_GROUP)
        .map(upper_camel)
        .collect();

    if name.is_empty() {
        "Index".to_string()
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Screen{}", name)
    } else {
        name
    }
}

/// Route path used by `go('/...')`: a trailing `index` segment is dropped.
pub fn logical_path_for(path: &str) -> String {
    let mut segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != TAB_GROUP)
        .collect();
    if segments.last() == Some(&"index") {
        segments.pop();
    }
    segments.join("/")
}

// ═══════════════════════════════════════════════════════════════════════════════
// ROUTE IDENTITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything derived from a screen's location in the screens directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteIdentity {
    /// Relative path including extension, e.g. `(tabs)/home.ignite`.
    pub source_file: String,
    /// Relative path without extension, e.g. `(tabs)/home`.
    pub screen_path: String,
    /// `screen_path` with every tab-group segment removed.
    pub path_without_group: String,
    pub component_name: String,
    pub logical_path: String,
    pub in_tab_group: bool,
}

impl RouteIdentity {
    pub fn from_relative(source_file: &str) -> Self {
        let screen_path = match source_file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() && !stem.ends_with('/') => stem.to_string(),
            _ => source_file.to_string(),
        };
        let segments: Vec<&str> = screen_path.split('/').collect();
        let in_tab_group = segments.contains(&TAB_GROUP);
        let path_without_group = segments
            .iter()
            .filter(|s| **s != TAB_GROUP)
            .copied()
            .collect::<Vec<_>>()
            .join("/");

        Self {
            source_file: source_file.to_string(),
            component_name: component_name_for(&path_without_group),
            logical_path: logical_path_for(&path_without_group),
            screen_path,
            path_without_group,
            in_tab_group,
        }
    }

    /// Tab placement comes from the directory group or the `screen` line.
    pub fn is_tab(&self, screen: &ScreenMetadata) -> bool {
        self.in_tab_group || screen.is_tab_screen
    }

    fn base_name(&self) -> &str {
        self.screen_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.screen_path)
    }

    /// Directory of the generated module, relative to `<output>/screens`.
    ///
    /// Tab screens are collected under `(tabs)/`; everything else mirrors
    /// its source directory.
    pub fn output_subdir(&self, is_tab: bool) -> String {
        let parent = |path: &str| path.rsplit_once('/').map(|(dir, _)| dir.to_string());
        if is_tab {
            match parent(&self.path_without_group) {
                Some(dir) => format!("{}/{}", TAB_GROUP, dir),
                None => TAB_GROUP.to_string(),
            }
        } else {
            parent(&self.screen_path).unwrap_or_default()
        }
    }

    /// Generated module path relative to `<output>/screens`, no extension.
    pub fn module_path(&self, is_tab: bool) -> String {
        let dir = self.output_subdir(is_tab);
        if dir.is_empty() {
            self.base_name().to_string()
        } else {
            format!("{}/{}", dir, self.base_name())
        }
    }

    /// Absolute directory and file stem of the generated module.
    pub fn output_location(&self, screens_out: &Path, is_tab: bool) -> (PathBuf, String) {
        let mut dir = screens_out.to_path_buf();
        for segment in self.output_subdir(is_tab).split('/').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        (dir, self.base_name().to_string())
    }

    pub fn route_record(&self, screen: &ScreenMetadata) -> RouteRecord {
        let is_tab = self.is_tab(screen);
        RouteRecord {
            logical_path: self.logical_path.clone(),
            component_name: self.component_name.clone(),
            source_file: self.source_file.clone(),
            module_path: self.module_path(is_tab),
            options: RouteOptions {
                title: screen.title.clone(),
                header_shown: screen.header_shown,
                is_tab_screen: is_tab,
                tab_order: screen.tab_order,
                tab_icon: screen.tab_icon.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_component_names() {
        assert_eq!(component_name_for("settings/index"), "SettingsIndex");
        assert_eq!(component_name_for("index"), "Index");
        assert_eq!(component_name_for("profile/edit-name"), "ProfileEditName");
        assert_eq!(component_name_for("user_settings"), "UserSettings");
        assert_eq!(component_name_for("404"), "Screen404");
        assert_eq!(component_name_for(""), "Index");
    }

    #[test]
    fn test_logical_paths() {
        assert_eq!(logical_path_for("settings/index"), "settings");
        assert_eq!(logical_path_for("index"), "");
        assert_eq!(logical_path_for("profile/edit"), "profile/edit");
    }

    #[test]
    fn test_tab_group_identity() {
        let id = RouteIdentity::from_relative("(tabs)/home.ignite");
        assert_eq!(id.screen_path, "(tabs)/home");
        assert_eq!(id.path_without_group, "home");
        assert_eq!(id.component_name, "Home");
        assert_eq!(id.logical_path, "home");
        assert!(id.in_tab_group);
        assert_eq!(id.module_path(true), "(tabs)/home");

        let id = RouteIdentity::from_relative("(tabs)/index.ignite");
        assert_eq!(id.component_name, "Index");
        assert_eq!(id.logical_path, "");
        assert_eq!(id.module_path(true), "(tabs)/index");
    }

    #[test]
    fn test_stack_identity() {
        let id = RouteIdentity::from_relative("settings/index.ignite");
        assert!(!id.in_tab_group);
        assert_eq!(id.component_name, "SettingsIndex");
        assert_eq!(id.logical_path, "settings");
        assert_eq!(id.output_subdir(false), "settings");
        assert_eq!(id.module_path(false), "settings/index");

        // Declared tab outside the group still lands under (tabs).
        assert_eq!(id.module_path(true), "(tabs)/settings/index");
    }

    #[test]
    fn test_route_record_uses_metadata() {
        let id = RouteIdentity::from_relative("profile.ignite");
        let screen = ScreenMetadata {
            title: Some("Profile".into()),
            is_tab_screen: true,
            tab_order: Some(3),
            ..ScreenMetadata::default()
        };
        let record = id.route_record(&screen);
        assert!(record.options.is_tab_screen);
        assert_eq!(record.options.tab_order, Some(3));
        assert_eq!(record.module_path, "(tabs)/profile");
        assert_eq!(record.source_file, "profile.ignite");
    }

    #[test]
    fn test_output_location() {
        let id = RouteIdentity::from_relative("(tabs)/feed/latest.ignite");
        let (dir, stem) = id.output_location(Path::new("/out/screens"), true);
        assert_eq!(dir, PathBuf::from("/out/screens/(tabs)/feed"));
        assert_eq!(stem, "latest");
    }

    #[test]
    fn test_find_source_files_skips_hidden_and_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("(tabs)")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("(tabs)/home.ignite"), "<View/>").unwrap();
        fs::write(root.join("about.ignite"), "<View/>").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("node_modules/pkg/x.ignite"), "").unwrap();
        fs::write(root.join(".cache/y.ignite"), "").unwrap();

        let files = find_source_files(root, "ignite", &["node_modules".to_string()]).unwrap();
        let rel: Vec<String> = files.iter().map(|f| relative_slash_path(root, f)).collect();
        assert_eq!(rel, vec!["(tabs)/home.ignite", "about.ignite"]);
    }
}
