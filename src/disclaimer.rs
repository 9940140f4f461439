//! Provenance disclaimer for the project's markdown files.
//!
//! A file "has" the disclaimer when the marker regex matches somewhere in
//! its first [`HEAD_LINES`] lines. `add` prepends the disclaimer partial to
//! every file that lacks it; `verify` only reports them.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::DisclaimerConfig;
use crate::error::AuditError;

pub const HEAD_LINES: usize = 30;

#[derive(Debug, Clone)]
pub struct DisclaimerOptions {
    /// Disclaimer partial, relative to the project root.
    pub disclaimer_path: PathBuf,
    pub marker: Regex,
    /// Directory names skipped anywhere in the tree.
    pub exclude: Vec<String>,
    /// Report what `add` would change without writing.
    pub dry_run: bool,
    /// Ask `git ls-files` first; walk the tree when it is unavailable.
    pub use_git: bool,
}

impl DisclaimerOptions {
    pub fn from_config(config: &DisclaimerConfig) -> Result<Self, AuditError> {
        let marker = Regex::new(&config.marker).map_err(|e| AuditError::Config {
            path: PathBuf::from("[disclaimer].marker"),
            details: e.to_string(),
        })?;
        Ok(Self {
            disclaimer_path: config.path.clone(),
            marker,
            exclude: config.exclude.clone(),
            dry_run: false,
            use_git: true,
        })
    }

    fn is_excluded(&self, rel: &Path) -> bool {
        rel == self.disclaimer_path
            || rel.parent().is_some_and(|parent| {
                parent.components().any(|c| {
                    let name = c.as_os_str().to_string_lossy();
                    self.exclude.iter().any(|ex| ex.eq_ignore_ascii_case(&name))
                })
            })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AddOutcome {
    pub updated_files: Vec<PathBuf>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct VerifyOutcome {
    pub missing: Vec<PathBuf>,
}

impl VerifyOutcome {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn has_marker(content: &str, marker: &Regex) -> bool {
    let head: Vec<&str> = content.lines().take(HEAD_LINES).collect();
    marker.is_match(&head.join("\n"))
}

/// Markdown files tracked by git, or `None` outside a usable git checkout.
fn git_markdown(root: &Path) -> Option<Vec<PathBuf>> {
    let output = Command::new("git")
        .args(["ls-files", "*.md"])
        .current_dir(root)
        .output()
        .ok()?;
    if !output.status.success() {
        debug!(root = %root.display(), "git ls-files failed; walking the tree");
        return None;
    }
    Some(
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect(),
    )
}

/// Walk `root` for `*.md` files, pruning excluded directories.
pub fn walk_markdown(root: &Path, exclude: &[String]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && exclude.iter().any(|ex| ex.eq_ignore_ascii_case(&name)))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(%err, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        })
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}

/// Markdown files the disclaimer applies to, relative to `root`.
pub fn list_markdown(root: &Path, options: &DisclaimerOptions) -> Vec<PathBuf> {
    let tracked = if options.use_git { git_markdown(root) } else { None };
    let files = tracked.unwrap_or_else(|| walk_markdown(root, &options.exclude));
    files
        .into_iter()
        .filter(|rel| !options.is_excluded(rel))
        .filter(|rel| root.join(rel).is_file())
        .collect()
}

fn read_markdown(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Prepend the disclaimer to every markdown file that does not carry it.
pub fn add(root: &Path, options: &DisclaimerOptions) -> Result<AddOutcome> {
    let disclaimer_file = root.join(&options.disclaimer_path);
    if !disclaimer_file.is_file() {
        return Err(AuditError::DisclaimerNotFound {
            path: options.disclaimer_path.clone(),
        }
        .into());
    }
    let disclaimer = read_markdown(&disclaimer_file)?;
    let disclaimer = disclaimer.trim_end();

    let mut outcome = AddOutcome::default();
    for rel in list_markdown(root, options) {
        let path = root.join(&rel);
        let content = read_markdown(&path)?;
        if has_marker(&content, &options.marker) {
            continue;
        }

        if !options.dry_run {
            let updated = format!("{}\n\n{}\n", disclaimer, content.trim_start().trim_end_matches('\n'));
            std::fs::write(&path, updated)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        debug!(file = %rel.display(), dry_run = options.dry_run, "disclaimer added");
        outcome.updated_files.push(rel);
    }
    Ok(outcome)
}

/// List markdown files whose head lacks the marker.
pub fn verify(root: &Path, options: &DisclaimerOptions) -> Result<VerifyOutcome> {
    let mut outcome = VerifyOutcome::default();
    for rel in list_markdown(root, options) {
        let content = read_markdown(&root.join(&rel))?;
        if !has_marker(&content, &options.marker) {
            outcome.missing.push(rel);
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PARTIAL: &str = "> **Provenance and Authorship**: maintained by the project team.\n";

    fn options() -> DisclaimerOptions {
        DisclaimerOptions {
            use_git: false,
            ..DisclaimerOptions::from_config(&DisclaimerConfig::default()).unwrap()
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "docs/partials/PROVENANCE.md", PARTIAL);
        write(tmp.path(), "README.md", "# Title\n\nBody\n");
        write(tmp.path(), "docs/guide.MD", "Guide\n");
        write(tmp.path(), "docs/signed.md", "# Signed\n\n> Proveniência e Autoria: equipe\n");
        write(tmp.path(), "node_modules/pkg/README.md", "dependency readme\n");
        write(tmp.path(), "notes.txt", "not markdown\n");
        tmp
    }

    #[test]
    fn test_marker_only_in_head() {
        let marker = options().marker;
        assert!(has_marker("PROVENANCE AND AUTHORSHIP\nrest", &marker));
        assert!(has_marker("x\nProveniencia e Autoria", &marker));

        let late = format!("{}Provenance and Authorship\n", "line\n".repeat(HEAD_LINES));
        assert!(!has_marker(&late, &marker));
    }

    #[test]
    fn test_walk_prunes_excluded_dirs() {
        let tmp = project();
        let files = walk_markdown(tmp.path(), &options().exclude);
        assert_eq!(
            files,
            vec![
                PathBuf::from("README.md"),
                PathBuf::from("docs/guide.MD"),
                PathBuf::from("docs/partials/PROVENANCE.md"),
                PathBuf::from("docs/signed.md"),
            ]
        );
    }

    #[test]
    fn test_excluded_paths() {
        let opts = options();
        assert!(opts.is_excluded(Path::new("docs/partials/PROVENANCE.md")));
        assert!(opts.is_excluded(Path::new("node_modules/a/README.md")));
        assert!(opts.is_excluded(Path::new("Coverage/report.md")));
        assert!(!opts.is_excluded(Path::new("README.md")));
    }

    #[test]
    fn test_verify_then_add() {
        let tmp = project();
        let opts = options();

        let before = verify(tmp.path(), &opts).unwrap();
        assert!(before.missing.contains(&PathBuf::from("README.md")));
        assert!(before.missing.contains(&PathBuf::from("docs/guide.MD")));
        assert!(!before.missing.contains(&PathBuf::from("docs/signed.md")));
        assert!(!before.is_clean());

        let dry = add(tmp.path(), &DisclaimerOptions { dry_run: true, ..opts.clone() }).unwrap();
        assert_eq!(dry.updated_files.len(), before.missing.len());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("README.md")).unwrap(),
            "# Title\n\nBody\n"
        );

        let added = add(tmp.path(), &opts).unwrap();
        assert_eq!(added.updated_files, dry.updated_files);
        let readme = std::fs::read_to_string(tmp.path().join("README.md")).unwrap();
        assert_eq!(
            readme,
            "> **Provenance and Authorship**: maintained by the project team.\n\n# Title\n\nBody\n"
        );

        assert!(verify(tmp.path(), &opts).unwrap().is_clean());
        assert!(add(tmp.path(), &opts).unwrap().updated_files.is_empty());
    }

    #[test]
    fn test_add_requires_partial() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "README.md", "# Title\n");
        let err = add(tmp.path(), &options()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuditError>(),
            Some(AuditError::DisclaimerNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_marker_is_config_error() {
        let config = DisclaimerConfig {
            marker: "(unclosed".to_string(),
            ..DisclaimerConfig::default()
        };
        assert!(matches!(
            DisclaimerOptions::from_config(&config),
            Err(AuditError::Config { .. })
        ));
    }
}
