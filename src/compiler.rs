//! Compile pass over a whole project.
//!
//! A pass runs in two phases. First every source file is parsed and its route
//! record computed; then each component is generated against the complete
//! route table and the router is written last.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::catalog::ComponentCatalog;
use crate::codegen::{custom_components, generate_component, unknown_props};
use crate::config::CompilerConfig;
use crate::discovery::{find_source_files, relative_slash_path, RouteIdentity};
use crate::emit::{content_hash, write_if_changed, WriteOutcome};
use crate::error::{IgniteError, Result};
use crate::ir::{ParseDiagnostic, ParsedFile, RouteRecord};
use crate::parse::parse_ignite_content;
use crate::router::{generate_router, ROUTER_FILE};
use crate::validate::{check_module, OutputDiagnostic};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledFile {
    pub source: PathBuf,
    pub output: PathBuf,
    pub component_name: String,
    /// SHA-256 of the generated module.
    pub hash: String,
    pub outcome: WriteOutcome,
    pub parse_diagnostics: Vec<ParseDiagnostic>,
    pub output_diagnostics: Vec<OutputDiagnostic>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileReport {
    pub files: Vec<CompiledFile>,
    pub routes: Vec<RouteRecord>,
    pub router_path: PathBuf,
    pub router_outcome: WriteOutcome,
    pub router_diagnostics: Vec<OutputDiagnostic>,
    pub duration: Duration,
}

impl CompileReport {
    pub fn written(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.outcome == WriteOutcome::Written)
            .count()
    }

    pub fn diagnostic_count(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.parse_diagnostics.len() + f.output_diagnostics.len())
            .sum::<usize>()
            + self.router_diagnostics.len()
    }
}

/// A file parsed in the first phase, waiting for generation.
struct ParsedScreen {
    source: PathBuf,
    identity: RouteIdentity,
    parsed: ParsedFile,
    is_tab: bool,
}

pub struct Compiler {
    config: CompilerConfig,
    catalog: ComponentCatalog,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self::with_catalog(config, ComponentCatalog::default())
    }

    pub fn with_catalog(config: CompilerConfig, catalog: ComponentCatalog) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    fn parse_all(&self) -> Result<(Vec<ParsedScreen>, Vec<RouteRecord>)> {
        let screens_dir = self.config.screens_path();
        if !screens_dir.is_dir() {
            return Err(IgniteError::ScreensDirMissing(screens_dir));
        }

        let files = find_source_files(&screens_dir, &self.config.extension, &self.config.ignore)?;
        debug!(count = files.len(), dir = %screens_dir.display(), "discovered sources");

        let mut screens = Vec::with_capacity(files.len());
        let mut routes = Vec::with_capacity(files.len());
        let mut owners: HashMap<String, String> = HashMap::new();

        for source in files {
            let rel = relative_slash_path(&screens_dir, &source);
            let content = fs::read_to_string(&source).map_err(|e| IgniteError::io(&source, e))?;
            let parsed = parse_ignite_content(&content, &self.catalog);
            for diag in &parsed.diagnostics {
                warn!(file = %rel, "{}", diag);
            }

            let identity = RouteIdentity::from_relative(&rel);
            if let Some(previous) = owners.insert(identity.component_name.clone(), rel.clone()) {
                return Err(IgniteError::Generate {
                    file: rel,
                    message: format!(
                        "component name {} is already used by {}",
                        identity.component_name, previous
                    ),
                });
            }

            let screen = parsed.screen_or_default();
            let is_tab = identity.is_tab(&screen);
            routes.push(identity.route_record(&screen));
            screens.push(ParsedScreen {
                source,
                identity,
                parsed,
                is_tab,
            });
        }

        Ok((screens, routes))
    }

    fn check(&self, code: &str, file: &str) -> Vec<OutputDiagnostic> {
        if !self.config.validate_output {
            return Vec::new();
        }
        let diagnostics = check_module(code, file);
        for diag in &diagnostics {
            warn!("generated code does not parse: {}", diag);
        }
        diagnostics
    }

    /// Run one full compile pass.
    pub fn compile(&self) -> Result<CompileReport> {
        let start = Instant::now();
        let (screens, routes) = self.parse_all()?;

        let output_root = self.config.output_path();
        let screens_out = self.config.screens_output_path();
        let mut files = Vec::with_capacity(screens.len());

        for screen in screens {
            let ParsedScreen {
                source,
                identity,
                parsed,
                is_tab,
            } = screen;
            let (dir, stem) = identity.output_location(&screens_out, is_tab);
            let output = dir.join(format!("{}.js", stem));
            let code = generate_component(&parsed, &identity.component_name, &routes, &self.catalog);

            for unknown in unknown_props(&parsed, &self.catalog) {
                debug!(
                    source = %identity.source_file,
                    tag = %unknown.tag,
                    prop = %unknown.prop,
                    line = unknown.line,
                    "prop not in catalog, passed through"
                );
            }
            let custom = custom_components(&parsed, &self.catalog);
            if !custom.is_empty() {
                debug!(source = %identity.source_file, components = ?custom, "custom components need user imports");
            }

            let shown = relative_slash_path(&output_root, &output);
            let output_diagnostics = self.check(&code, &shown);
            let outcome = write_if_changed(&output, &code)?;
            debug!(
                source = %identity.source_file,
                output = %shown,
                ?outcome,
                "compiled screen"
            );

            files.push(CompiledFile {
                source,
                output,
                component_name: identity.component_name,
                hash: content_hash(&code),
                outcome,
                parse_diagnostics: parsed.diagnostics,
                output_diagnostics,
            });
        }

        let router_code = generate_router(&routes);
        let router_diagnostics = self.check(&router_code, ROUTER_FILE);
        let router_path = output_root.join(ROUTER_FILE);
        let router_outcome = write_if_changed(&router_path, &router_code)?;

        let report = CompileReport {
            files,
            routes,
            router_path,
            router_outcome,
            router_diagnostics,
            duration: start.elapsed(),
        };
        info!(
            files = report.files.len(),
            written = report.written(),
            diagnostics = report.diagnostic_count(),
            elapsed_ms = report.duration.as_millis() as u64,
            "compile finished"
        );
        Ok(report)
    }
}
