use oxiunused_core::{
    Export, ExportKey, Hook, Import, Interface, ResolveError, Route, ServerAction, UsageSite,
};
use log::debug;
use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt, path::PathBuf, time::Duration};

/// Why an imported name could not be tied to an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    RelativeNotFound,
    NoExportsParsed,
    ExportNotFound,
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::RelativeNotFound => "relative-not-found",
            FailureReason::NoExportsParsed => "no-exports-parsed",
            FailureReason::ExportNotFound => "export-not-found",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureReason::RelativeNotFound => "relative path resolution failed",
            FailureReason::NoExportsParsed => "target resolved but no exports parsed",
            FailureReason::ExportNotFound => "export not found in target module",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionFailure {
    pub source_module: String,
    pub importing_file: PathBuf,
    pub reason: FailureReason,
    pub detail: String,
}

impl ResolutionFailure {
    pub fn new(import: &Import, reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            source_module: import.source.clone(),
            importing_file: import.file.clone(),
            reason,
            detail: detail.into(),
        }
    }

    /// Maps a resolver error onto a reportable failure.
    ///
    /// External references and aliases whose targets do not exist map to `None`.
    pub fn from_resolve_error(import: &Import, err: &ResolveError) -> Option<Self> {
        match err {
            ResolveError::RelativeNotFound { .. } => {
                Some(Self::new(import, FailureReason::RelativeNotFound, err.detail()))
            }
            ResolveError::AliasNotFound { .. } => {
                debug!("Skipping unresolved alias '{}': {}", import.source, err.detail());
                None
            }
            ResolveError::NodeModules { .. } | ResolveError::External => None,
        }
    }
}

/// One imported name that did not resolve to an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingImport {
    pub name: String,
    pub line: u32,
    pub failure: ResolutionFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzedExport {
    pub export: Export,
    pub used_by: Vec<UsageSite>,
}

impl AnalyzedExport {
    pub fn is_used(&self) -> bool {
        !self.used_by.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzedInterface {
    pub interface: Interface,
    pub used_by: Vec<UsageSite>,
}

/// Everything one analysis run produces, sorted for stable reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    #[serde(serialize_with = "values_only")]
    pub used_exports: BTreeMap<ExportKey, AnalyzedExport>,
    pub unused_exports: Vec<Export>,
    pub missing_imports: Vec<MissingImport>,
    pub interfaces: BTreeMap<String, Vec<AnalyzedInterface>>,
    pub routes: Vec<Route>,
    pub server_actions: Vec<ServerAction>,
    pub hooks: Vec<Hook>,
    pub errors: Vec<String>,
}

impl AnalysisResult {
    pub fn total_exports(&self) -> usize {
        self.used_exports.len() + self.unused_exports.len()
    }

    /// Non-fatal problems worth a look: missing imports plus extraction errors
    pub fn issue_count(&self) -> usize {
        self.missing_imports.len() + self.errors.len()
    }
}

fn values_only<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_seq(map.values())
}

/// Outcome of one full run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: AnalysisResult,
    pub files_analyzed: usize,
    pub documents: Vec<PathBuf>,
    pub elapsed: Duration,
}
