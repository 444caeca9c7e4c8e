//! Modification-time helpers for picking the freshest directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Return the most recently modified of the given candidates.
///
/// Candidates that do not exist (or whose mtime cannot be read) are
/// skipped. On equal mtimes the earlier candidate wins. Returns `None`
/// when no candidate exists.
pub fn newest_subdirectory<I, P>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let Some(mtime) = modified(candidate) else {
            continue;
        };
        let replace = match &newest {
            Some((best, _)) => mtime > *best,
            None => true,
        };
        if replace {
            newest = Some((mtime, candidate.to_path_buf()));
        }
    }
    newest.map(|(_, path)| path)
}

/// Return the most recently modified subdirectory of `dir`.
///
/// Children are considered in name order so ties resolve the same way on
/// every call.
pub fn newest_child(dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::debug!("Cannot list {}: {}", dir.display(), e);
            }
            return None;
        }
    };

    let mut children: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    newest_subdirectory(children)
}
