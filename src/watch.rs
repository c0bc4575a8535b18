//! File system watcher for live rebuilds.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  filter   ┌──────────────┐  mpsc   ┌──────────────────┐
//! │ notify event │ ────────▶ │ trigger path │ ──────▶ │ RebuildScheduler │ ──▶ build_site()
//! └──────────────┘           └──────────────┘         └──────────────────┘
//! ```
//!
//! Every relevant change triggers a full rebuild; bursts are coalesced by
//! the scheduler, so there is no debounce timer here.

use crate::{
    build::build_site,
    config::SiteConfig,
    debug, log,
    logger::WatchStatus,
    scheduler::RebuildScheduler,
    utils::category::{FileCategory, categorize_path},
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::{
    path::{Path, PathBuf},
    time::Instant,
};
use tokio::sync::mpsc;

/// Events beyond this many queued are dropped; a rebuild is pending anyway.
const EVENT_BUFFER: usize = 64;

const WATCH_CATEGORIES: &[FileCategory] =
    &[FileCategory::Garden, FileCategory::Content, FileCategory::Config];

/// Watch the source roots and rebuild on change. Blocks forever.
///
/// `reload` produces the configuration for each rebuild, so edits to the
/// config file apply to the next build. Watched paths and the server address
/// keep their startup values.
pub fn watch_for_changes_blocking<R>(config: &'static SiteConfig, reload: R) -> Result<()>
where
    R: Fn() -> Result<SiteConfig> + Send + Sync + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start watch runtime")?;

    runtime.block_on(async move {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for path in rebuild_triggers(event, config) {
                    debug!("watch"; "{}", path.display());
                    // Full means a rebuild is already queued.
                    let _ = tx.try_send(path);
                }
            }
            Err(e) => log!("watch"; "error: {e}"),
        })
        .context("Failed to create file watcher")?;
        setup_watchers(&mut watcher, config)?;

        let status = Mutex::new(WatchStatus::new());
        let scheduler = RebuildScheduler::new(move || {
            let started = Instant::now();
            let stats = build_site(&reload()?)?;
            status.lock().success(&format!(
                "rebuilt {} pages in {:.0?}",
                stats.published,
                started.elapsed()
            ));
            Ok(())
        });

        let builds = scheduler.run(rx).await;
        log!("watch"; "stopped after {builds} rebuilds");
        Ok::<_, anyhow::Error>(())
    })
}

/// Changed paths in `event` that should start a rebuild.
fn rebuild_triggers(event: Event, config: &SiteConfig) -> Vec<PathBuf> {
    if !is_relevant(&event) {
        return Vec::new();
    }
    event
        .paths
        .into_iter()
        .filter(|path| categorize_path(path, config).triggers_rebuild())
        .collect()
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Format absolute path as relative to root, with trailing slash for directories.
fn format_rel(path: &Path, root: &Path, is_dir: bool) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let suffix = if is_dir { "/" } else { "" };
    format!("{}{}", rel.display(), suffix)
}

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    let root = config.get_root();
    let mut watched = Vec::new();

    for &cat in WATCH_CATEGORIES {
        if let Some(path) = cat.path(config)
            && path.exists()
        {
            let mode = if cat.is_directory() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };

            watcher
                .watch(&path, mode)
                .with_context(|| format!("Failed to watch {}: {}", cat.name(), path.display()))?;
            watched.push(format_rel(&path, root, cat.is_directory()));
        }
    }

    log!("watch"; "{}", watched.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.config_path = PathBuf::from("/site/grove.toml");
        config.build.content = PathBuf::from("/site/content");
        config.build.output = PathBuf::from("/site/public");
        config.build.garden.root = PathBuf::from("/notes");
        config
    }

    fn modify(path: &str) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_source_changes_trigger() {
        let config = config();
        assert_eq!(rebuild_triggers(modify("/notes/A.md"), &config).len(), 1);
        assert_eq!(rebuild_triggers(modify("/site/content/about.md"), &config).len(), 1);
        assert_eq!(rebuild_triggers(modify("/site/grove.toml"), &config).len(), 1);
    }

    #[test]
    fn test_output_and_temp_files_ignored() {
        let config = config();
        assert!(rebuild_triggers(modify("/site/public/garden/a/index.html"), &config).is_empty());
        assert!(rebuild_triggers(modify("/notes/.A.md.swp"), &config).is_empty());
        assert!(rebuild_triggers(modify("/elsewhere/x.md"), &config).is_empty());
    }

    #[test]
    fn test_access_events_ignored() {
        let config = config();
        let event = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/notes/A.md"));
        assert!(rebuild_triggers(event, &config).is_empty());

        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/notes/New.md"));
        assert_eq!(rebuild_triggers(event, &config).len(), 1);
    }

    #[test]
    fn test_format_rel() {
        let root = Path::new("/site");
        assert_eq!(format_rel(Path::new("/site/content"), root, true), "content/");
        assert_eq!(format_rel(Path::new("/site/grove.toml"), root, false), "grove.toml");
        assert_eq!(format_rel(Path::new("/notes"), root, true), "/notes/");
    }
}
