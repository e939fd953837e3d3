use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::debug;
use std::path::{Path, PathBuf};

use oxiunused_core::{CollectorConfig, DEFAULT_EXCLUDED_FOLDERS, find_git_root};

#[derive(Debug, Clone, Parser)]
#[command(name = "unused-exports")]
#[command(about = "Find unused exports, missing imports and framework entry points")]
pub struct Config {
    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Directory the reports are written to, relative to the root unless absolute
    #[arg(long, default_value = ".oxiunused")]
    pub output_dir: PathBuf,

    /// Folder name to skip during discovery (repeatable, replaces the defaults)
    #[arg(long = "exclude", value_name = "DIR")]
    pub exclude: Vec<String>,

    /// Abort when more source files than this are found
    #[arg(long, default_value = "20000")]
    pub max_files: usize,

    /// Abort when a source file is larger than this many bytes
    #[arg(long, default_value = "1048576")]
    pub max_file_size: u64,

    /// Keep running and re-analyze when files change
    #[arg(long)]
    pub watch: bool,

    /// Seconds between periodic re-runs in watch mode, 0 re-runs on file changes only
    #[arg(long, default_value = "0")]
    pub poll_interval: u64,

    /// Milliseconds without file changes before a watch re-run
    #[arg(long, default_value = "300")]
    pub debounce_ms: u64,

    /// Also write analysis.json
    #[arg(long)]
    pub json: bool,

    /// Exit with status 1 when unused exports are found
    #[arg(long)]
    pub fail_on_unused: bool,

    #[clap(skip)]
    resolved_root: Option<PathBuf>,
}

impl Config {
    /// Config for `root` with every flag at its default.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            output_dir: PathBuf::from(".oxiunused"),
            exclude: Vec::new(),
            max_files: 20_000,
            max_file_size: 1024 * 1024,
            watch: false,
            poll_interval: 0,
            debounce_ms: 300,
            json: false,
            fail_on_unused: false,
            resolved_root: None,
        }
    }

    /// Resolves the project root to a canonical path. Safe to call more than once.
    pub fn initialize(&mut self) -> Result<&Path> {
        if self.resolved_root.is_none() {
            let root = match &self.root {
                Some(r) => {
                    debug!("Using provided root directory: {:?}", r);
                    r.canonicalize()
                        .with_context(|| format!("Root directory {} not found", r.display()))?
                }
                None => {
                    debug!("No root provided, searching for git root");
                    find_git_root()?.canonicalize()?
                }
            };
            self.resolved_root = Some(root);
        }
        self.root()
    }

    pub fn root(&self) -> Result<&Path> {
        self.resolved_root.as_deref().ok_or_else(|| anyhow!("Config used before initialize()"))
    }

    pub fn excluded_folders(&self) -> Vec<String> {
        if self.exclude.is_empty() {
            DEFAULT_EXCLUDED_FOLDERS.iter().map(|s| s.to_string()).collect()
        } else {
            self.exclude.clone()
        }
    }

    pub fn collector_config(&self) -> Result<CollectorConfig> {
        let mut cfg = CollectorConfig::new(self.root()?);
        cfg.excluded_folders = self.excluded_folders();
        cfg.max_files = self.max_files;
        cfg.max_file_size = self.max_file_size;
        Ok(cfg)
    }

    pub fn output_path(&self) -> Result<PathBuf> {
        if self.output_dir.is_absolute() {
            return Ok(self.output_dir.clone());
        }
        Ok(self.root()?.join(&self.output_dir))
    }
}
