use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use std::{
    ffi::OsString,
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

use crate::{
    config::AliasTable,
    constants::{INDEX_FILES, RESOLVE_EXTENSIONS, VENDOR_DIR},
};

/// Why a module reference could not be mapped to a project file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("external via node_modules")]
    NodeModules { path: PathBuf },
    #[error("relative path resolution failed")]
    RelativeNotFound { candidate: PathBuf },
    #[error("alias resolution failed")]
    AliasNotFound { pattern: String, tried: Vec<PathBuf> },
    #[error("not relative, not aliased")]
    External,
}

impl ResolveError {
    /// External references are never reported as missing imports.
    pub fn is_external(&self) -> bool {
        matches!(self, ResolveError::NodeModules { .. } | ResolveError::External)
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            ResolveError::NodeModules { .. } => "node-modules",
            ResolveError::RelativeNotFound { .. } => "relative-not-found",
            ResolveError::AliasNotFound { .. } => "alias-not-found",
            ResolveError::External => "external",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ResolveError::NodeModules { path } => format!("resolved into {}", path.display()),
            ResolveError::RelativeNotFound { candidate } => {
                format!("no file matches {}", candidate.display())
            }
            ResolveError::AliasNotFound { pattern, tried } => {
                let tried: Vec<String> = tried.iter().map(|p| p.display().to_string()).collect();
                format!("alias '{}' matched but none of [{}] exist", pattern, tried.join(", "))
            }
            ResolveError::External => "package import".to_string(),
        }
    }
}

/// Module resolver for one analysis run.
///
/// Results are memoized per (reference, importing file). Build a new resolver for every
/// run so that filesystem changes between runs are observed.
#[derive(Debug)]
pub struct Resolver {
    root: PathBuf,
    aliases: Option<Arc<AliasTable>>,
    cache: DashMap<(String, PathBuf), Result<PathBuf, ResolveError>>,
}

impl Resolver {
    pub fn new(root: &Path, aliases: Option<Arc<AliasTable>>) -> Self {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        Self { root, aliases, cache: DashMap::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of distinct (reference, importing file) pairs resolved so far
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn resolve(&self, request: &str, from_file: &Path) -> Result<PathBuf, ResolveError> {
        let key = (request.to_string(), from_file.to_path_buf());
        if let Some(v) = self.cache.get(&key) {
            trace!("Cache hit for resolve: '{}' from {}", request, from_file.display());
            return v.clone();
        }
        trace!("Resolving: '{}' from {}", request, from_file.display());

        let resolved = if is_relative(request) {
            self.resolve_relative(request, from_file)
        } else {
            self.resolve_alias(request)
        };

        match &resolved {
            Ok(p) => {
                debug!("Resolved '{}' from {} to {}", request, from_file.display(), p.display())
            }
            Err(e) => trace!("Could not resolve '{}' from {}: {}", request, from_file.display(), e),
        }
        self.cache.insert(key, resolved.clone());
        resolved
    }

    fn resolve_relative(&self, request: &str, from_file: &Path) -> Result<PathBuf, ResolveError> {
        let base = from_file.parent().unwrap_or(&self.root);
        let candidate = if request.starts_with('/') {
            clean(self.root.join(request.trim_start_matches('/')))
        } else {
            clean(base.join(request))
        };
        match probe(&candidate) {
            Some(found) => self.reject_vendored(found),
            None => Err(ResolveError::RelativeNotFound { candidate }),
        }
    }

    fn resolve_alias(&self, request: &str) -> Result<PathBuf, ResolveError> {
        let Some(aliases) = &self.aliases else {
            return Err(ResolveError::External);
        };
        let Some(alias) = aliases.lookup(request) else {
            return Err(ResolveError::External);
        };

        for candidate in &alias.candidates {
            if let Some(found) = probe(candidate) {
                trace!("Resolved alias '{}' to {:?}", alias.pattern, found);
                return self.reject_vendored(found);
            }
        }
        Err(ResolveError::AliasNotFound { pattern: alias.pattern, tried: alias.candidates })
    }

    fn reject_vendored(&self, found: PathBuf) -> Result<PathBuf, ResolveError> {
        let inside = found.strip_prefix(&self.root).unwrap_or(&found);
        let vendored = inside.components().any(|c| match c {
            Component::Normal(name) => name == VENDOR_DIR,
            _ => false,
        });
        if vendored { Err(ResolveError::NodeModules { path: found }) } else { Ok(found) }
    }
}

fn is_relative(request: &str) -> bool {
    request == "."
        || request == ".."
        || request.starts_with("./")
        || request.starts_with("../")
        || request.starts_with('/')
}

/// Probes a candidate path: exact file, appended extensions, then directory index files.
fn probe(p: &Path) -> Option<PathBuf> {
    if p.is_file() {
        return Some(canonical(p.to_path_buf()));
    }

    // `./foo.js` written against a `foo.ts` source (TypeScript ESM convention)
    if let Some(ext) = p.extension().and_then(|e| e.to_str()) {
        let replacements: &[&str] = match ext {
            "js" => &["ts", "tsx"],
            "jsx" => &["tsx"],
            _ => &[],
        };
        for replacement in replacements {
            let candidate = p.with_extension(replacement);
            if candidate.is_file() {
                return Some(canonical(candidate));
            }
        }
    }

    for ext in RESOLVE_EXTENSIONS {
        let mut name = OsString::from(p.as_os_str());
        name.push(".");
        name.push(ext);
        let candidate = PathBuf::from(name);
        if candidate.is_file() {
            return Some(canonical(candidate));
        }
    }

    if p.is_dir() {
        for index_file in INDEX_FILES {
            let candidate = p.join(index_file);
            if candidate.is_file() {
                return Some(canonical(candidate));
            }
        }
    }

    None
}

fn canonical(p: PathBuf) -> PathBuf {
    p.canonicalize().unwrap_or(p)
}
