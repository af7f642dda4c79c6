//! Regenerate dev output when watched sources change

use super::{DevBuilder, WatchTarget};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// One async lock per output file, so a file is never regenerated twice at once
#[derive(Default)]
struct FileLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl FileLocks {
    fn get(&self, output: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(output.to_string()).or_default())
    }
}

/// Watch the project root until the notification channel closes.
///
/// Regeneration failures are logged and never stop the watcher.
pub async fn watch(builder: Arc<DevBuilder>) -> Result<()> {
    let root = resolve(&builder.options().root);
    let (_watcher, mut events) = start_fs_watcher(&root)?;
    let locks = Arc::new(FileLocks::default());
    info!("watching {} for changes", root.display());

    while let Some(paths) = events.recv().await {
        let targets: HashMap<PathBuf, WatchTarget> = builder
            .watch_targets()
            .into_iter()
            .map(|target| (resolve(&root.join(target.source())), target))
            .collect();

        for path in paths {
            let Some(target) = targets.get(&resolve(&path)) else {
                continue;
            };
            debug!(source = target.source(), "source changed");
            spawn_regeneration(Arc::clone(&builder), target.clone(), locks.get(target.output()));
        }
    }

    Ok(())
}

fn spawn_regeneration(builder: Arc<DevBuilder>, target: WatchTarget, lock: Arc<tokio::sync::Mutex<()>>) {
    tokio::spawn(async move {
        let _guard = lock.lock_owned().await;
        let output = target.output().to_string();

        match tokio::task::spawn_blocking(move || builder.regenerate(&target)).await {
            Ok(Ok(())) => info!(output = %output, "regenerated"),
            Ok(Err(err)) => error!(output = %output, "failed to regenerate: {:#}", err),
            Err(err) => error!(output = %output, "regeneration task failed: {}", err),
        }
    });
}

fn start_fs_watcher(root: &Path) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<Vec<PathBuf>>)> {
    let (tx, rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) => {
            let _ = tx.send(event.paths);
        }
        Ok(_) => {}
        Err(err) => error!("file watcher error: {}", err),
    })
    .context("Failed to initialize file watcher")?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    Ok((watcher, rx))
}

fn resolve(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
