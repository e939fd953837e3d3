use ignore::WalkBuilder;
use log::{debug, trace};
use rayon::prelude::*;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::constants::{DEFAULT_EXCLUDED_FOLDERS, JS_TS_EXTENSIONS};

pub struct CollectorConfig {
    pub root: PathBuf,
    /// Directory names skipped anywhere in the tree
    pub excluded_folders: Vec<String>,
    pub max_files: usize,
    /// Largest accepted source file, in bytes
    pub max_file_size: u64,
}

impl CollectorConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded_folders: DEFAULT_EXCLUDED_FOLDERS.iter().map(|s| s.to_string()).collect(),
            max_files: 20_000,
            max_file_size: 1024 * 1024,
        }
    }
}

/// Discovery failures abort the whole run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },
    #[error("found more than {limit} source files, narrow the root or add exclusions")]
    TooManyFiles { limit: usize },
    #[error("{} is {size} bytes, above the {limit} byte limit", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Enumerates every JS/TS source file under the root, sorted by path.
pub fn collect_source_files(cfg: &CollectorConfig) -> Result<Vec<PathBuf>, DiscoveryError> {
    debug!("Walking directory tree from root: {}", cfg.root.display());
    let excluded = cfg.excluded_folders.clone();
    let walker = WalkBuilder::new(&cfg.root)
        .hidden(false)
        .git_ignore(true)
        .filter_entry(move |dent| {
            let is_dir = dent.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && excluded.iter().any(|name| dent.file_name() == name.as_str()))
        })
        .build();

    let mut files: Vec<PathBuf> = Vec::new();
    for res in walker {
        let dent =
            res.map_err(|source| DiscoveryError::Walk { root: cfg.root.clone(), source })?;
        let p = dent.path();
        if !dent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if is_source_file(p) {
            trace!("Found source file: {}", p.display());
            files.push(p.to_path_buf());
            if files.len() > cfg.max_files {
                return Err(DiscoveryError::TooManyFiles { limit: cfg.max_files });
            }
        }
    }

    // Stat calls are independent; completion order does not matter because of the sort below.
    let sizes: Vec<Result<(PathBuf, u64), DiscoveryError>> = files
        .into_par_iter()
        .map(|path| match fs::metadata(&path) {
            Ok(meta) => Ok((path, meta.len())),
            Err(source) => Err(DiscoveryError::Stat { path, source }),
        })
        .collect();

    let mut files = Vec::with_capacity(sizes.len());
    for entry in sizes {
        let (path, size) = entry?;
        if size > cfg.max_file_size {
            return Err(DiscoveryError::FileTooLarge { path, size, limit: cfg.max_file_size });
        }
        files.push(path);
    }
    files.sort();

    debug!("Collected {} source files", files.len());
    Ok(files)
}

fn is_source_file(p: &Path) -> bool {
    p.extension().and_then(|e| e.to_str()).is_some_and(|ext| JS_TS_EXTENSIONS.contains(&ext))
}
