//! Recursive candidate discovery under the configured scan roots
//!
//! Every regular file is a candidate; validity is decided at decode time.
//! A bad root or an unreadable entry is logged and skipped without
//! aborting the rest of the walk.

use crate::domain::{IndexerError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome of enumerating all roots
#[derive(Debug, Clone, Default)]
pub struct EnumerationResult {
    /// Candidate files, in walk order, without duplicates
    pub files: Vec<PathBuf>,
    /// Roots that could not be walked at all, with the reason
    pub failed_roots: Vec<(PathBuf, String)>,
    /// Entries below a root that could not be read
    pub entry_errors: usize,
}

/// Directory walker
#[derive(Debug, Clone, Default)]
pub struct DirectoryEnumerator {
    follow_symlinks: bool,
}

impl DirectoryEnumerator {
    pub fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }

    /// Walk every root and collect the full candidate list
    ///
    /// Blocking; call from `spawn_blocking` in async code.
    pub fn enumerate(&self, roots: &[PathBuf]) -> EnumerationResult {
        let mut result = EnumerationResult::default();
        let mut seen = HashSet::new();

        for root in roots {
            tracing::info!(root = %root.display(), "Scanning directory");

            match self.enumerate_root(root, &mut result, &mut seen) {
                Ok(found) => {
                    tracing::info!(root = %root.display(), files = found, "Directory scanned");
                }
                Err(e) => {
                    tracing::error!(root = %root.display(), error = %e, "Skipping scan root");
                    result.failed_roots.push((root.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            files = result.files.len(),
            failed_roots = result.failed_roots.len(),
            entry_errors = result.entry_errors,
            "Enumeration complete"
        );

        result
    }

    fn enumerate_root(
        &self,
        root: &Path,
        result: &mut EnumerationResult,
        seen: &mut HashSet<PathBuf>,
    ) -> Result<usize> {
        if !root.exists() {
            return Err(IndexerError::Scan(format!(
                "Path not found: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(IndexerError::Scan(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        let walker = WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();

        let mut found = 0;
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && seen.insert(entry.path().to_path_buf()) {
                        result.files.push(entry.into_path());
                        found += 1;
                    }
                }
                Err(e) => {
                    // A failure on the root itself (e.g. permission denied) fails the root
                    if e.depth() == 0 {
                        return Err(IndexerError::Scan(e.to_string()));
                    }
                    tracing::warn!(error = %e, "Error accessing entry");
                    result.entry_errors += 1;
                }
            }
        }

        Ok(found)
    }
}
