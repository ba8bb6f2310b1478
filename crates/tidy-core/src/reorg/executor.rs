use super::model::{Diagnostic, LinkUpdates, MoveOperation, ReorgPlan};
use crate::error::{Result, TidyError};
use crate::parser::replace_link_paths;
use crate::vfs::FileSystem;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct ExecutionReport {
    pub folders_created: usize,
    pub moves_performed: usize,
    /// Moves whose source had disappeared.
    pub moves_skipped: usize,
    /// Where the index document lives after the rename.
    pub index_path: PathBuf,
    /// Where the content root lives after the rename.
    pub content_root: PathBuf,
    pub index_rewritten: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Applies a [`ReorgPlan`] to disk.
///
/// Every step checks the current state first so that running it again over
/// a half-finished tree is harmless. Filesystem errors abort the remaining
/// steps.
pub struct Executor<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> Executor<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Folders, moves, renames, then the index link rewrite.
    pub fn execute(&self, plan: &ReorgPlan) -> Result<ExecutionReport> {
        let mut report = ExecutionReport {
            folders_created: self.create_folders(&plan.operations)?,
            ..ExecutionReport::default()
        };

        let (performed, skipped) = self.apply_moves(&plan.operations)?;
        report.moves_performed = performed;
        report.moves_skipped = skipped;

        report.index_path =
            self.rename_index(&plan.index_path, &plan.index_name, &mut report.diagnostics)?;
        report.content_root = self.rename_content_root(&plan.content_root, &plan.content_name)?;
        report.index_rewritten = self.rewrite_index(&report.index_path, &plan.link_updates)?;

        Ok(report)
    }

    /// Create each destination folder once. Returns how many were new.
    pub fn create_folders(&self, operations: &[MoveOperation]) -> Result<usize> {
        let mut seen = HashSet::new();
        let mut created = 0;

        for op in operations {
            let Some(folder) = op.destination.parent() else {
                continue;
            };
            if !seen.insert(folder.to_path_buf()) {
                continue;
            }
            if !self.fs.is_dir(folder) {
                self.fs
                    .create_dir_all(folder)
                    .map_err(TidyError::io(folder))?;
                log::info!("Created folder: {}", folder.display());
                created += 1;
            }
        }

        Ok(created)
    }

    /// Returns (performed, skipped).
    pub fn apply_moves(&self, operations: &[MoveOperation]) -> Result<(usize, usize)> {
        let mut performed = 0;
        let mut skipped = 0;

        for op in operations {
            if op.source == op.destination {
                continue;
            }
            if !self.fs.exists(&op.source) {
                log::warn!("Source vanished, skipping: {}", op.source.display());
                skipped += 1;
                continue;
            }

            self.fs
                .rename(&op.source, &op.destination)
                .map_err(TidyError::io(&op.source))?;
            log::info!(
                "Moved: {} -> {}/{}",
                display_name(&op.source),
                op.section,
                display_name(&op.destination)
            );
            performed += 1;
        }

        Ok((performed, skipped))
    }

    /// Rename the index document to `<canonical>.md` next to where it is.
    ///
    /// An existing file under that name is replaced, and a warning is
    /// pushed onto `diagnostics`.
    pub fn rename_index(
        &self,
        index_path: &Path,
        canonical: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<PathBuf> {
        let parent = index_path.parent().unwrap_or(Path::new(""));
        let target = parent.join(format!("{}.md", canonical));

        if target == index_path || !self.fs.exists(index_path) {
            return Ok(target);
        }
        if self.fs.exists(&target) {
            log::warn!("Replacing existing index document: {}", target.display());
            diagnostics.push(
                Diagnostic::warning(format!(
                    "Replaced existing document {} with the renamed index",
                    display_name(&target)
                ))
                .with_path(&target),
            );
        }

        self.fs
            .rename(index_path, &target)
            .map_err(TidyError::io(index_path))?;
        log::info!(
            "Renamed index: {} -> {}",
            display_name(index_path),
            display_name(&target)
        );

        Ok(target)
    }

    /// Rename the content root to its canonical name, merging into an
    /// existing canonical folder if there is one.
    pub fn rename_content_root(&self, content_root: &Path, canonical: &str) -> Result<PathBuf> {
        let parent = content_root.parent().unwrap_or(Path::new(""));
        let target = parent.join(canonical);

        if target == content_root || !self.fs.is_dir(content_root) {
            return Ok(target);
        }

        if self.fs.is_dir(&target) {
            self.merge_dir(content_root, &target)?;
            self.remove_dir_if_empty(content_root);
        } else {
            self.fs
                .rename(content_root, &target)
                .map_err(TidyError::io(content_root))?;
        }
        log::info!(
            "Renamed content dir: {} -> {}",
            display_name(content_root),
            display_name(&target)
        );

        Ok(target)
    }

    /// Move everything in `from` into `into`. Files already present in `into`
    /// win and the duplicate in `from` is dropped.
    fn merge_dir(&self, from: &Path, into: &Path) -> Result<()> {
        for child in self.fs.read_dir(from).map_err(TidyError::io(from))? {
            let Some(name) = child.file_name() else {
                continue;
            };
            let dest = into.join(name);

            if self.fs.is_dir(&child) {
                if self.fs.is_dir(&dest) {
                    self.merge_dir(&child, &dest)?;
                    self.remove_dir_if_empty(&child);
                } else if self.fs.exists(&dest) {
                    log::warn!(
                        "Cannot merge folder over file, leaving in place: {}",
                        child.display()
                    );
                } else {
                    self.fs.rename(&child, &dest).map_err(TidyError::io(&child))?;
                }
            } else if self.fs.exists(&dest) {
                self.fs.remove_file(&child).map_err(TidyError::io(&child))?;
            } else {
                self.fs.rename(&child, &dest).map_err(TidyError::io(&child))?;
            }
        }

        Ok(())
    }

    fn remove_dir_if_empty(&self, dir: &Path) {
        if let Err(e) = self.fs.remove_dir(dir) {
            log::warn!("Could not remove {}: {}", dir.display(), e);
        }
    }

    /// Apply the link table to the index text. Returns whether it changed.
    pub fn rewrite_index(&self, index_path: &Path, updates: &LinkUpdates) -> Result<bool> {
        let content = self
            .fs
            .read_to_string(index_path)
            .map_err(TidyError::io(index_path))?;
        let updated = replace_link_paths(&content, updates);

        if updated == content {
            return Ok(false);
        }

        self.fs
            .write(index_path, &updated)
            .map_err(TidyError::io(index_path))?;
        log::info!("Updated links in: {}", display_name(index_path));

        Ok(true)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
