//! Passes over the whole content root that do not depend on the section plan.

use super::model::Diagnostic;
use crate::error::{Result, TidyError};
use crate::parser::rewrite_link_targets;
use crate::utils::encoding::{decode_link_path, replace_last_segment};
use crate::utils::{lowercase_file_name, strip_hash_suffix, unique_filename};
use crate::vfs::FileSystem;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct PropagationReport {
    /// Documents whose links were rewritten.
    pub rewritten: Vec<PathBuf>,
    /// Documents that could not be read.
    pub diagnostics: Vec<Diagnostic>,
}

/// Strip the hash from the last segment of an encoded link target, if any.
///
/// ```
/// use tidy_core::reorg::propagate::dehash_link_target;
///
/// assert_eq!(
///     dehash_link_target("Export/Sub/Task%20deadbeefdeadbeefdeadbeefdeadbeef.md"),
///     Some("Export/Sub/Task.md".to_string())
/// );
/// assert_eq!(dehash_link_target("Export/Task.md"), None);
/// ```
pub fn dehash_link_target(encoded_path: &str) -> Option<String> {
    let decoded = decode_link_path(encoded_path);
    let filename = decoded.rsplit('/').next().unwrap_or(decoded.as_str());
    let (canonical, hash) = strip_hash_suffix(filename);
    hash.map(|_| replace_last_segment(encoded_path, &format!("{}.md", canonical)))
}

/// Rewrite hashed link targets in every markdown document under `root`.
///
/// Unreadable documents are reported and skipped; write failures abort.
pub fn dehash_nested_links(fs: &dyn FileSystem, root: &Path) -> Result<PropagationReport> {
    let mut report = PropagationReport::default();

    for path in fs.list_files(root, "md") {
        let content = match fs.read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Could not process {}: {}", path.display(), e);
                report.diagnostics.push(
                    Diagnostic::warning(format!("Could not read document: {}", e)).with_path(&path),
                );
                continue;
            }
        };

        let updated = rewrite_link_targets(&content, dehash_link_target);
        if updated != content {
            fs.write(&path, &updated).map_err(TidyError::io(&path))?;
            log::info!("Updated links in: {}", path.display());
            report.rewritten.push(path);
        }
    }

    Ok(report)
}

/// Rename every hashed `.md` file under `root` to its canonical name.
///
/// Collisions are resolved per folder against the files present at the time
/// of each rename, independently of the section planner. Returns the
/// (old, new) pairs.
pub fn rename_hashed_files(fs: &dyn FileSystem, root: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut renames = Vec::new();

    for path in fs.list_files(root, "md") {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let (canonical, Some(_)) = strip_hash_suffix(&name) else {
            continue;
        };
        let Some(parent) = path.parent() else {
            continue;
        };

        let existing: HashSet<String> = fs
            .read_dir(parent)
            .map_err(TidyError::io(parent))?
            .into_iter()
            .filter(|p| *p != path && fs.is_file(p))
            .filter_map(|p| lowercase_file_name(&p))
            .collect();
        let new_name = unique_filename(&canonical, &existing);
        let new_path = parent.join(&new_name);

        fs.rename(&path, &new_path).map_err(TidyError::io(&path))?;
        log::info!("Renamed: {} -> {}", name, new_name);
        renames.push((path, new_path));
    }

    Ok(renames)
}
