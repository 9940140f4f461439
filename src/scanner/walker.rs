use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AuditError;

const BIN_DIR: &str = ".bin";

/// Entries of `dir`, sorted by name. Any access failure yields an empty list.
pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => collect_sorted(dir, entries),
        Err(err) => {
            debug!(dir = %dir.display(), %err, "cannot list directory");
            Vec::new()
        }
    }
}

fn collect_sorted(dir: &Path, entries: std::fs::ReadDir) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                debug!(dir = %dir.display(), %err, "skipping unreadable entry");
                None
            }
        })
        .collect();
    paths.sort();
    paths
}

/// Follows symlinks, so linked package directories count.
fn is_dir(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_dir(),
        Err(err) => {
            debug!(path = %path.display(), %err, "cannot stat entry");
            false
        }
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Enumerate the package directories of an install directory.
///
/// Immediate children are packages, except `.bin` and `@scope` namespaces,
/// whose own children are the packages. A missing install directory is an
/// empty install; any other failure to read it is an error.
pub fn walk(install_dir: &Path) -> Result<Vec<PathBuf>, AuditError> {
    let entries = match std::fs::read_dir(install_dir) {
        Ok(entries) => collect_sorted(install_dir, entries),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(dir = %install_dir.display(), "install directory missing; nothing to scan");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(AuditError::InstallRootUnreadable {
                path: install_dir.to_path_buf(),
                source,
            })
        }
    };

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut packages = Vec::new();
    let mut push = |dir: PathBuf| {
        let key = std::fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if seen.insert(key) {
            packages.push(dir);
        } else {
            debug!(dir = %dir.display(), "duplicate package directory");
        }
    };

    for entry in entries {
        let name = file_name(&entry);
        if name == BIN_DIR {
            continue;
        }
        if name.starts_with('@') {
            for scoped in list_dir(&entry) {
                if is_dir(&scoped) {
                    push(scoped);
                }
            }
        } else if is_dir(&entry) {
            push(entry);
        }
    }

    Ok(packages)
}
