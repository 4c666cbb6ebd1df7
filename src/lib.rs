//! # Ignite Compiler
//!
//! Compiles `.ignite` screen files into React Native components plus a single
//! navigation router.
//!
//! ## Pipeline
//!
//! 1. **Discovery** walks the screens directory; file paths define routes.
//! 2. **Parse** turns each file into a [`ParsedFile`]: screen metadata, state,
//!    functions, imports, a stylesheet and a markup tree.
//! 3. **Codegen** emits one component module per screen against the full route
//!    table, so navigation targets resolve regardless of discovery order.
//! 4. **Router** aggregates all routes into `router.js`.
//!
//! Outputs are written only when their content changes. [`Watcher`] reruns the
//! pipeline on debounced source changes.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod catalog;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod discovery;
pub mod emit;
pub mod error;
pub mod ir;
pub mod parse;
pub mod props;
pub mod router;
pub mod validate;
pub mod watcher;

pub use catalog::ComponentCatalog;
pub use codegen::{generate_component, write_component};
pub use compiler::{CompileReport, CompiledFile, Compiler};
pub use config::CompilerConfig;
pub use emit::WriteOutcome;
pub use error::{IgniteError, Result};
pub use ir::{ParseDiagnostic, ParsedFile, RouteRecord};
pub use parse::parse_ignite_content;
pub use router::{generate_router, write_router};
pub use validate::OutputDiagnostic;
pub use watcher::{WatchHandle, Watcher};

/// Load the project config under `root` and run one compile pass.
pub fn compile_project(root: impl AsRef<std::path::Path>) -> Result<CompileReport> {
    let config = CompilerConfig::load(root)?;
    Compiler::new(config).compile()
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI BRIDGE
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi(object)]
pub struct CompileSummary {
    pub files: u32,
    pub written: u32,
    pub router_written: bool,
    pub diagnostics: Vec<String>,
    pub duration_ms: u32,
}

#[cfg(feature = "napi")]
#[napi]
pub fn compile_project_native(root: String) -> napi::Result<CompileSummary> {
    let report = compile_project(&root).map_err(|e| napi::Error::from_reason(e.to_string()))?;

    let mut diagnostics = Vec::new();
    for file in &report.files {
        for diag in &file.parse_diagnostics {
            diagnostics.push(format!("{}: {}", file.source.display(), diag));
        }
        diagnostics.extend(file.output_diagnostics.iter().map(|d| d.to_string()));
    }
    diagnostics.extend(report.router_diagnostics.iter().map(|d| d.to_string()));

    Ok(CompileSummary {
        files: report.files.len() as u32,
        written: report.written() as u32,
        router_written: report.router_outcome == WriteOutcome::Written,
        diagnostics,
        duration_ms: report.duration.as_millis() as u32,
    })
}

/// Parse one source file and return the [`ParsedFile`] as JSON.
#[cfg(feature = "napi")]
#[napi]
pub fn parse_ignite_native(source: String) -> napi::Result<String> {
    let parsed = parse_ignite_content(&source, &ComponentCatalog::default());
    serde_json::to_string(&parsed)
        .map_err(|e| napi::Error::from_reason(format!("Serialize error: {}", e)))
}

#[cfg(feature = "napi")]
#[napi]
pub fn generate_component_native(
    source: String,
    component_name: String,
    routes_json: Option<String>,
) -> napi::Result<String> {
    let routes: Vec<RouteRecord> = match routes_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| napi::Error::from_reason(format!("Routes parse error: {}", e)))?,
        None => Vec::new(),
    };
    let catalog = ComponentCatalog::default();
    let parsed = parse_ignite_content(&source, &catalog);
    Ok(generate_component(&parsed, &component_name, &routes, &catalog))
}
