use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use oxiunused_core::{Facts, Resolver, TsconfigCache, collect_source_files, facts_for};

use crate::{
    config::Config,
    graph::Analyzer,
    reporter::write_documents,
    types::RunReport,
};

/// State shared by consecutive runs: the single-run guard and the compiler config cache.
#[derive(Default)]
pub struct Session {
    running: AtomicBool,
    tsconfig_cache: TsconfigCache,
    analyzer: Analyzer,
}

/// Held while a run is in progress. Dropping it lets the next run start.
pub struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        trace!("Run guard released");
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_analyzer(analyzer: Analyzer) -> Self {
        Self { analyzer, ..Self::default() }
    }

    /// `None` when another run holds the guard.
    pub fn try_begin_run(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { flag: &self.running })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Discovers, extracts, analyzes and writes the reports.
    ///
    /// Returns `Ok(None)` when a run is already in progress; the trigger is dropped.
    pub fn run_full_analysis(&self, cfg: &Config) -> Result<Option<RunReport>> {
        let Some(_guard) = self.try_begin_run() else {
            warn!("Analysis already running, skipping this trigger");
            return Ok(None);
        };

        let start = Instant::now();
        let root = cfg.root()?.to_path_buf();
        info!("Starting unused export analysis in {}", root.display());
        self.tsconfig_cache.invalidate();

        let files = collect_source_files(&cfg.collector_config()?)
            .with_context(|| format!("Failed to discover source files under {}", root.display()))?;
        info!("Found {} source files", files.len());

        let facts = extract_all(&root, &files);
        if !facts.errors.is_empty() {
            warn!("{} files could not be analyzed", facts.errors.len());
        }

        let resolver = Resolver::new(&root, self.tsconfig_cache.get_or_load(&root));
        let result = self.analyzer.analyze(facts, &resolver);
        let documents = write_documents(&result, &root, &cfg.output_path()?, cfg.json)?;

        if result.issue_count() > 0 {
            info!("{} non-fatal issues found", result.issue_count());
        }
        Ok(Some(RunReport {
            result,
            files_analyzed: files.len(),
            documents,
            elapsed: start.elapsed(),
        }))
    }
}

/// Per-file facts in discovery order. Files that fail to read or parse are recorded as errors.
fn extract_all(root: &Path, files: &[PathBuf]) -> Facts {
    let mut facts = Facts::default();
    for file in files {
        let file = file.canonicalize().unwrap_or_else(|_| file.clone());
        match facts_for(root, &file) {
            Ok(file_facts) => {
                trace!(
                    "{}: {} exports, {} imports",
                    file.display(),
                    file_facts.exports.len(),
                    file_facts.imports.len()
                );
                facts.push_file(file_facts);
            }
            Err(e) => {
                debug!("Skipping {}: {:#}", file.display(), e);
                facts.errors.push(format!("{}: {:#}", file.display(), e));
            }
        }
    }
    facts
}

/// One-shot analysis with a fresh session.
pub fn run_unused_exports_check(mut cfg: Config) -> Result<RunReport> {
    cfg.initialize()?;
    Session::new()
        .run_full_analysis(&cfg)?
        .context("A fresh session cannot already be running")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{MISSING_IMPORTS_DOC, ROUTES_DOC, UNUSED_EXPORTS_DOC, USED_EXPORTS_DOC};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            root,
            "tsconfig.json",
            r#"{
                // path aliases
                "compilerOptions": { "baseUrl": ".", "paths": { "@/*": ["src/*"] } }
            }"#,
        );
        write(
            root,
            "src/lib/format.ts",
            "export function formatDate(d: Date) { return d.toISOString(); }\n\
             export function unusedHelper() { return 1; }\n",
        );
        write(
            root,
            "src/components/Card.tsx",
            "import { formatDate } from '@/lib/format';\n\
             import { Ghost } from './ghost';\n\
             export interface CardProps { title: string }\n\
             export default function Card(props: CardProps) { return formatDate(new Date()); }\n",
        );
        write(
            root,
            "app/page.tsx",
            "import Card from '../src/components/Card';\n\
             export const metadata = { title: 'Home' };\n\
             export default function Home() { return Card({ title: 'x' }); }\n",
        );
        write(
            root,
            "app/api/users/route.ts",
            "export async function GET() { return new Response('[]'); }\n\
             export function notAHandler() {}\n",
        );
        write(
            root,
            "src/client.ts",
            "export async function load() { return fetch('/api/users/1'); }\n",
        );
        tmp
    }

    fn config(root: &Path) -> Config {
        let mut cfg = Config::for_root(root);
        cfg.initialize().unwrap();
        cfg
    }

    fn unused_names(report: &RunReport) -> Vec<String> {
        report.result.unused_exports.iter().map(|e| e.exported_name.clone()).collect()
    }

    #[test]
    fn test_end_to_end_classification() {
        let tmp = project();
        let report = run_unused_exports_check(Config::for_root(tmp.path())).unwrap();

        assert_eq!(report.files_analyzed, 5);
        let unused = unused_names(&report);
        assert!(unused.contains(&"unusedHelper".to_string()));
        assert!(unused.contains(&"notAHandler".to_string()));
        assert!(unused.contains(&"load".to_string()));
        assert!(!unused.contains(&"formatDate".to_string()));
        assert!(!unused.contains(&"GET".to_string()));
        assert!(!unused.contains(&"metadata".to_string()));

        assert_eq!(report.result.missing_imports.len(), 1);
        assert_eq!(report.result.missing_imports[0].name, "Ghost");

        let api = report.result.routes.iter().find(|r| r.route_path == "/api/users").unwrap();
        assert_eq!(api.used_by.len(), 1);
        assert_eq!(report.result.interfaces["CardProps"][0].used_by.len(), 1);
    }

    #[test]
    fn test_writes_all_documents() {
        let tmp = project();
        let report = run_unused_exports_check(Config::for_root(tmp.path())).unwrap();
        let out = tmp.path().canonicalize().unwrap().join(".oxiunused");
        for doc in [USED_EXPORTS_DOC, UNUSED_EXPORTS_DOC, ROUTES_DOC, MISSING_IMPORTS_DOC] {
            assert!(out.join(doc).is_file(), "{} missing", doc);
        }
        assert_eq!(report.documents.len(), 5);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let tmp = project();
        let cfg = config(tmp.path());
        let session = Session::new();

        let first = session.run_full_analysis(&cfg).unwrap().unwrap();
        let first_doc = fs::read_to_string(&first.documents[1]).unwrap();
        let second = session.run_full_analysis(&cfg).unwrap().unwrap();
        let second_doc = fs::read_to_string(&second.documents[1]).unwrap();

        assert_eq!(first.result, second.result);
        assert_eq!(first_doc, second_doc);
        assert!(!session.is_running());
    }

    #[test]
    fn test_guard_drops_concurrent_trigger() {
        let tmp = project();
        let cfg = config(tmp.path());
        let session = Session::new();

        let guard = session.try_begin_run().unwrap();
        assert!(session.try_begin_run().is_none());
        assert!(session.run_full_analysis(&cfg).unwrap().is_none());
        drop(guard);
        assert!(session.run_full_analysis(&cfg).unwrap().is_some());
    }

    #[test]
    fn test_guard_released_after_failure() {
        let tmp = project();
        let mut cfg = config(tmp.path());
        cfg.max_files = 1;
        let session = Session::new();

        assert!(session.run_full_analysis(&cfg).is_err());
        assert!(!session.is_running());
    }

    #[test]
    fn test_commented_tsconfig_keeps_aliases() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            root,
            "tsconfig.json",
            r#"{
  "compilerOptions": {
    "paths": {
      "@/*": ["src/*"], // app alias
    },
  }
}
"#,
        );
        write(root, "src/lib/format.ts", "export function formatDate() {}\n");
        write(
            root,
            "src/main.ts",
            "import { formatDate } from '@/lib/format';\nimport { x } from '@/generated/client';\n",
        );

        let report = run_unused_exports_check(Config::for_root(root)).unwrap();
        assert!(unused_names(&report).is_empty());
        assert!(report.result.missing_imports.is_empty());
    }

    #[test]
    fn test_unreadable_file_is_collected_as_error() {
        let tmp = project();
        fs::write(tmp.path().join("src/binary.ts"), [0xff, 0xfe, 0x00, 0x01]).unwrap();
        let report = run_unused_exports_check(Config::for_root(tmp.path())).unwrap();

        assert_eq!(report.files_analyzed, 6);
        assert_eq!(report.result.errors.len(), 1);
        assert!(report.result.errors[0].contains("binary.ts"));
        assert!(unused_names(&report).contains(&"unusedHelper".to_string()));
    }
}
