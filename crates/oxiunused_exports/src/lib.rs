//! Unused export detection for convention-driven JavaScript/TypeScript web apps.
//!
//! Every export in the project is classified as used or unused. An export is used when a
//! resolved import names it, or when a framework convention consumes it without an import
//! (route handlers, page components, server actions, special config exports). Imports that
//! cannot be tied to an export are reported as missing.
//!
//! # Examples
//!
//! ```no_run
//! use oxiunused_exports::{Config, Session};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut cfg = Config::for_root("/path/to/project");
//! cfg.initialize()?;
//!
//! let session = Session::new();
//! if let Some(report) = session.run_full_analysis(&cfg)? {
//!     println!("{} unused exports", report.result.unused_exports.len());
//! }
//! # Ok(())
//! # }
//! ```

mod checker;
mod config;
mod graph;
mod interfaces;
mod reporter;
mod rules;
mod types;
mod usage;
mod watch;

// Re-export public API
pub use checker::{RunGuard, Session, run_unused_exports_check};
pub use config::Config;
pub use graph::{Analyzer, ExportGraph, binding_matches, resolve_imports};
pub use interfaces::aggregate_interface_usage;
pub use reporter::{
    INTERFACES_DOC, JSON_DOC, MISSING_IMPORTS_DOC, ROUTES_DOC, UNUSED_EXPORTS_DOC,
    USED_EXPORTS_DOC, print_summary, print_unused_tree, write_documents,
};
pub use rules::{
    ActionsDirectoryRule, HookEvidenceRule, LivenessRule, PageComponentRule, RouteHandlerRule,
    RuleContext, ServerActionRule, SpecialExportRule, default_rules,
};
pub use types::{
    AnalysisResult, AnalyzedExport, AnalyzedInterface, FailureReason, MissingImport,
    ResolutionFailure, RunReport,
};
pub use usage::{attach_dynamic_usages, normalize_target, route_matches, route_pattern};
pub use watch::{SourceWatcher, is_watched_path, watch};
