//! RON file loading and directory hot-reload.
//!
//! `load_ron_files` reads every `.ron` file of a directory in name order.
//! `RonWatcher` raises a flag whenever notify reports a modification inside
//! the watched directory; systems poll it with `take_changed`.

use bevy::log::error;
use bevy::prelude::Resource;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Errors produced while reading a single RON file.
#[derive(Debug, thiserror::Error)]
pub enum RonError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Dirty flag fed by a notify watcher.
#[derive(Resource)]
pub struct RonWatcher {
    changed: Arc<AtomicBool>,
    _handle: Option<RecommendedWatcher>,
}

impl RonWatcher {
    /// A watcher with no OS handle; its flag only changes through `mark_changed`.
    #[must_use]
    pub fn stub() -> Self {
        Self { changed: Arc::new(AtomicBool::new(false)), _handle: None }
    }

    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::Release);
    }

    /// Read and clear the change flag.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}

/// Read and deserialize one RON file.
///
/// # Errors
/// Returns [`RonError::Io`] when the file cannot be read and
/// [`RonError::Parse`] when its content is not a valid `T`.
pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T, RonError> {
    let content = std::fs::read_to_string(path).map_err(|source| RonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str::<T>(&content).map_err(|source| RonError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Every `.ron` file directly inside `path` that parses as `T`, in file
/// name order. Unreadable or invalid files are logged and skipped; a missing
/// directory yields an empty list.
#[must_use]
pub fn load_ron_files<T: DeserializeOwned>(path: &str) -> Vec<T> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    files
        .iter()
        .filter_map(|file| load_ron_file::<T>(file).map_err(|e| error!("{e}")).ok())
        .collect()
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Watch `path` (non-recursive) and flag any modification below it.
///
/// # Errors
/// Returns the `notify::Error` when the OS watcher cannot be created or the
/// directory cannot be registered.
pub fn setup_ron_watcher(path: &str) -> Result<RonWatcher, notify::Error> {
    let changed = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&changed);
    let root = canonical(Path::new(path));

    let mut handle = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) if matches!(event.kind, EventKind::Modify(_)) => {
                if event.paths.iter().any(|p| canonical(p).starts_with(&root)) {
                    flag.store(true, Ordering::Release);
                }
            }
            Ok(_) => {}
            Err(e) => error!("settings watch error: {e:?}"),
        },
        Config::default(),
    )?;
    handle.watch(Path::new(path), RecursiveMode::NonRecursive)?;

    Ok(RonWatcher { changed, _handle: Some(handle) })
}
