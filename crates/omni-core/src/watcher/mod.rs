//! File system watcher with debouncing (§4.7).
//!
//! Streams add/change/unlink events, filtered by the same exclude set as
//! the indexer. Debouncing itself is delegated to `notify-debouncer-mini`
//! configured with the 1,500ms interval from `WatcherConfig`; this module
//! translates its batches into `PipelineEvent`s and forwards them to the
//! indexer over a channel. The watcher has no shutdown channel of its
//! own -- the caller drops its receiver to signal shutdown, and the send
//! failure that results ends the watch loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind};
use tokio::sync::mpsc;

use crate::config::WatcherConfig;
use crate::error::{OmniError, OmniResult};
use crate::types::{Language, PipelineEvent};

/// Glob patterns always excluded, regardless of user configuration.
const BUILTIN_EXCLUDES: &[&str] =
    &["**/node_modules/**", "**/.git/**", "**/dist/**", "**/build/**"];

/// Matches paths against the indexer/watcher's combined exclude set:
/// built-ins, user `excludes`, and dotfiles (unless explicitly
/// un-excluded by a user pattern matching them).
#[derive(Clone)]
pub struct ExcludeMatcher {
    set: GlobSet,
}

impl ExcludeMatcher {
    /// Build a matcher from user-configured glob patterns plus built-ins.
    pub fn new(user_excludes: &[String]) -> OmniResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in BUILTIN_EXCLUDES {
            builder.add(Glob::new(pattern).map_err(|e| OmniError::InvalidInput {
                details: format!("invalid built-in exclude pattern {pattern}: {e}"),
            })?);
        }
        for pattern in user_excludes {
            builder.add(Glob::new(pattern).map_err(|e| OmniError::InvalidInput {
                details: format!("invalid exclude pattern {pattern:?}: {e}"),
            })?);
        }
        let set = builder.build().map_err(|e| OmniError::InvalidInput {
            details: format!("failed to build exclude matcher: {e}"),
        })?;
        Ok(Self { set })
    }

    /// Whether `path` should be skipped during discovery/watching.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.set.is_match(path) {
            return true;
        }
        is_dotfile(path)
    }
}

/// True if any path component (other than `.` and `..`) starts with `.`.
fn is_dotfile(path: &Path) -> bool {
    path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        s.starts_with('.') && s != "." && s != ".."
    })
}

/// File system watcher that emits pipeline events.
pub struct FileWatcher {
    config: WatcherConfig,
    root: PathBuf,
    exclude: ExcludeMatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given root directory.
    pub fn new(root: &Path, config: &WatcherConfig, exclude: ExcludeMatcher) -> Self {
        Self { config: config.clone(), root: root.to_path_buf(), exclude }
    }

    /// Start watching for file changes. Blocks until the receiving end of
    /// `tx` is dropped (the indexer's signal to stop) or the underlying
    /// watcher errors out.
    pub async fn watch(&self, tx: mpsc::Sender<PipelineEvent>) -> OmniResult<()> {
        tracing::info!(root = %self.root.display(), "file watcher started");

        let (debounce_tx, mut debounce_rx) = mpsc::unbounded_channel();
        let debounce_interval = Duration::from_millis(self.config.debounce_ms);

        let mut debouncer = new_debouncer(debounce_interval, move |result: DebounceEventResult| {
            // The debouncer callback runs on its own thread; forward raw
            // results to the async task via an unbounded channel.
            let _ = debounce_tx.send(result);
        })
        .map_err(|e| OmniError::Internal(format!("failed to start file watcher: {e}")))?;

        debouncer
            .watcher()
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| OmniError::Internal(format!("failed to watch {}: {e}", self.root.display())))?;

        while let Some(result) = debounce_rx.recv().await {
            let events = match result {
                Ok(events) => events,
                Err(errors) => {
                    for error in errors {
                        tracing::warn!(%error, "file watcher error");
                    }
                    continue;
                }
            };

            for event in events {
                if self.exclude.is_excluded(&event.path) {
                    continue;
                }

                let pipeline_event = match event.kind {
                    DebouncedEventKind::Any => {
                        if event.path.exists() {
                            PipelineEvent::FileChanged { path: event.path.clone() }
                        } else {
                            PipelineEvent::FileDeleted { path: event.path.clone() }
                        }
                    }
                    DebouncedEventKind::AnyContinuous => {
                        PipelineEvent::FileChanged { path: event.path.clone() }
                    }
                    _ => continue,
                };

                if tx.send(pipeline_event).await.is_err() {
                    tracing::info!("file watcher receiver dropped, shutting down");
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    /// Walk the root directory and emit `FileChanged` for every file with
    /// a registered language, skipping excluded paths and files over
    /// `max_file_size`.
    pub fn full_scan(&self, max_file_size: u64, tx: &mpsc::Sender<PipelineEvent>) -> OmniResult<usize> {
        let mut count = 0usize;
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(error) => {
                    tracing::warn!(path = %dir.display(), %error, "failed to read directory");
                    continue;
                }
            };

            for entry in entries {
                let entry = entry?;
                let path = entry.path();

                if self.exclude.is_excluded(&path) {
                    continue;
                }

                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    stack.push(path);
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if !Language::from_extension(extension).is_code() {
                    continue;
                }

                let metadata = entry.metadata()?;
                if metadata.len() > max_file_size {
                    continue;
                }

                if tx.try_send(PipelineEvent::FileChanged { path }).is_ok() {
                    count += 1;
                }
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_excludes_match_common_vendor_dirs() {
        let matcher = ExcludeMatcher::new(&[]).expect("matcher");
        assert!(matcher.is_excluded(Path::new("/repo/node_modules/pkg/index.js")));
        assert!(matcher.is_excluded(Path::new("/repo/.git/HEAD")));
        assert!(matcher.is_excluded(Path::new("/repo/dist/out.js")));
        assert!(!matcher.is_excluded(Path::new("/repo/src/main.rs")));
    }

    #[test]
    fn dotfiles_are_excluded_by_default() {
        let matcher = ExcludeMatcher::new(&[]).expect("matcher");
        assert!(matcher.is_excluded(Path::new("/repo/.env")));
        assert!(matcher.is_excluded(Path::new("/repo/src/.hidden/file.rs")));
    }

    #[test]
    fn user_excludes_are_honored() {
        let matcher = ExcludeMatcher::new(&["**/*.generated.rs".to_string()]).expect("matcher");
        assert!(matcher.is_excluded(Path::new("/repo/src/api.generated.rs")));
        assert!(!matcher.is_excluded(Path::new("/repo/src/api.rs")));
    }

    #[tokio::test]
    async fn full_scan_emits_events_for_registered_languages_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        std::fs::write(dir.path().join("readme.md"), "# hi").unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        std::fs::write(dir.path().join("node_modules/pkg/index.js"), "x").unwrap();

        let exclude = ExcludeMatcher::new(&[]).expect("matcher");
        let watcher = FileWatcher::new(dir.path(), &WatcherConfig::default(), exclude);
        let (tx, mut rx) = mpsc::channel(16);

        let found = watcher.full_scan(1_048_576, &tx).expect("scan");
        drop(tx);

        assert_eq!(found, 1);
        let event = rx.recv().await.expect("event");
        match event {
            PipelineEvent::FileChanged { path } => assert_eq!(path, dir.path().join("main.rs")),
            _ => panic!("expected FileChanged"),
        }
    }

    #[tokio::test]
    async fn full_scan_skips_files_over_max_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("big.rs"), "x".repeat(100)).unwrap();

        let exclude = ExcludeMatcher::new(&[]).expect("matcher");
        let watcher = FileWatcher::new(dir.path(), &WatcherConfig::default(), exclude);
        let (tx, _rx) = mpsc::channel(16);

        let found = watcher.full_scan(10, &tx).expect("scan");
        assert_eq!(found, 0);
    }
}
