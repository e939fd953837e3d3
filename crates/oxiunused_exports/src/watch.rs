//! Watch mode: re-run the analysis once source files change and the changes settle.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, trace, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError},
    },
    time::{Duration, Instant},
};

use oxiunused_core::{COMPILER_CONFIG_FILES, JS_TS_EXTENSIONS};

use crate::{checker::Session, config::Config, types::RunReport};

/// Longest time the loop blocks before looking at the stop flag again
const STOP_CHECK: Duration = Duration::from_millis(50);

/// Source files and compiler configs under `root`, outside any excluded folder.
pub fn is_watched_path(path: &Path, root: &Path, excluded: &[String]) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return false;
    };
    let in_excluded = rel
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .any(|c| c.as_os_str().to_str().is_some_and(|name| excluded.iter().any(|e| e == name)));
    if in_excluded {
        return false;
    }

    let is_config = rel.parent() == Some(Path::new(""))
        && rel.to_str().is_some_and(|name| COMPILER_CONFIG_FILES.contains(&name));
    let is_source = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| JS_TS_EXTENSIONS.contains(&ext));
    is_config || is_source
}

/// Recursive watcher over the project root that forwards relevant changed paths.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    changes: Receiver<PathBuf>,
}

impl SourceWatcher {
    pub fn new(root: &Path, excluded: Vec<String>) -> Result<Self> {
        let (tx, changes) = mpsc::channel();
        let watched_root = root.to_path_buf();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!("File watcher error: {}", e);
                    return;
                }
            };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                if is_watched_path(&path, &watched_root, &excluded) {
                    // Receiver gone means the watch loop has ended
                    let _ = tx.send(path);
                }
            }
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;
        debug!("Watching {} recursively", root.display());

        Ok(Self { _watcher: watcher, changes })
    }

    /// Waits up to `timeout` for the next changed path.
    pub fn next_change(&self, timeout: Duration) -> Result<Option<PathBuf>> {
        match self.changes.recv_timeout(timeout) {
            Ok(path) => Ok(Some(path)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(anyhow!("File watcher stopped unexpectedly"))
            }
        }
    }
}

/// Runs once, then re-runs after every settled change until `stop` is set.
///
/// A change schedules a run `debounce_ms` after the last change seen. With a non-zero
/// `poll_interval` the analysis also re-runs on that period. Each run outcome is handed to
/// `on_report`, and a run that fails does not end the loop.
pub fn watch<F>(
    session: &Session,
    cfg: &Config,
    stop: &AtomicBool,
    mut on_report: F,
) -> Result<()>
where
    F: FnMut(Result<RunReport>),
{
    let root = cfg.root()?;
    let watcher = SourceWatcher::new(root, cfg.excluded_folders())?;
    let debounce = Duration::from_millis(cfg.debounce_ms);
    let period = (cfg.poll_interval > 0).then(|| Duration::from_secs(cfg.poll_interval));
    info!("Watching {} (debounce {:?}, periodic re-run {:?})", root.display(), debounce, period);

    let mut trigger = || match session.run_full_analysis(cfg) {
        Ok(Some(report)) => on_report(Ok(report)),
        Ok(None) => debug!("Trigger dropped, a run is in progress"),
        Err(e) => on_report(Err(e)),
    };
    trigger();

    let mut pending: Option<Instant> = None;
    let mut next_tick = period.map(|p| Instant::now() + p);

    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        let settled = pending.is_some_and(|deadline| now >= deadline);
        let ticked = next_tick.is_some_and(|tick| now >= tick);
        if settled || ticked {
            if settled {
                info!("Source files changed, re-running analysis");
            } else {
                debug!("Periodic re-run");
            }
            pending = None;
            trigger();
            next_tick = period.map(|p| Instant::now() + p);
            continue;
        }

        let wait = [pending, next_tick]
            .into_iter()
            .flatten()
            .map(|deadline| deadline.saturating_duration_since(now))
            .fold(STOP_CHECK, Duration::min);
        if let Some(path) = watcher.next_change(wait)? {
            trace!("Changed: {}", path.display());
            pending = Some(Instant::now() + debounce);
        }
    }

    info!("Watch stopped");
    Ok(())
}
