use crate::vfs::FileSystem;
use std::path::{Path, PathBuf};

/// Remove every directory under `root` left with no entries, deepest first.
/// `root` itself is kept. Failures are logged and skipped.
pub fn remove_empty_dirs(fs: &dyn FileSystem, root: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for dir in fs.list_dirs_bottom_up(root) {
        let is_empty = matches!(fs.read_dir(&dir), Ok(children) if children.is_empty());
        if !is_empty {
            continue;
        }

        match fs.remove_dir(&dir) {
            Ok(()) => {
                log::info!("Removed empty folder: {}", dir.display());
                removed.push(dir);
            }
            Err(e) => log::warn!("Could not remove {}: {}", dir.display(), e),
        }
    }

    removed
}
