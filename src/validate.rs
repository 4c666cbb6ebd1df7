//! Syntax check of generated output.
//!
//! Every generated module is parsed back with oxc as JSX. Errors are reported
//! as [`OutputDiagnostic`]s; they never fail a compile pass.

#[cfg(feature = "napi")]
use napi_derive::napi;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct OutputDiagnostic {
    /// Generated file the message refers to.
    pub file: String,
    pub message: String,
}

impl fmt::Display for OutputDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

/// Parse `source` as a JSX module and collect syntax errors.
pub fn check_module(source: &str, file: &str) -> Vec<OutputDiagnostic> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true).with_jsx(true);
    let ret = Parser::new(&allocator, source, source_type).parse();

    ret.errors
        .iter()
        .map(|err| OutputDiagnostic {
            file: file.to_string(),
            message: err.to_string(),
        })
        .collect()
}
