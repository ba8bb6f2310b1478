use crate::config::TidyConfig;
use crate::error::{Result, TidyError};
use crate::parser::{extract_links, parse_sections};
use crate::reorg::cleanup::remove_empty_dirs;
use crate::reorg::propagate::{dehash_nested_links, rename_hashed_files};
use crate::reorg::{
    assign_links_to_sections, Executor, MovePlanner, NameRegistry, ReorgPlan, RunSummary,
};
use crate::utils::{canonical_name, normalize_lexically, strip_hash_suffix};
use crate::vfs::FileSystem;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;


/// The Export acts as the high-level Facade for one cleanup run.
///
/// *   **Planning**: `plan()` reads the index and the tree but changes
///     nothing. Dry runs stop here.
/// *   **Applying**: `apply()` executes a plan, then runs the tree-wide
///     passes (orphan renames, nested link de-hashing, empty folder removal).
pub struct NotionExport {
    pub index_path: PathBuf,
    pub content_root: PathBuf,
    pub config: TidyConfig,
    pub fs: Arc<dyn FileSystem>,
}

impl NotionExport {
    /// Locate the index document and its content directory.
    ///
    /// A relative index path is taken from the current directory. Fails
    /// before anything is touched if either is missing.
    pub fn open(
        index_path: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        config: TidyConfig,
    ) -> Result<Self> {
        let index_path = index_path.into();
        let index_path = std::path::absolute(&index_path)
            .map(|p| normalize_lexically(&p))
            .map_err(TidyError::io(&index_path))?;
        if !fs.is_file(&index_path) {
            return Err(TidyError::IndexNotFound(index_path));
        }

        let content_root = find_content_directory(&*fs, &index_path);
        if !fs.is_dir(&content_root) {
            return Err(TidyError::MissingContentDirectory(content_root));
        }

        log::info!("Index file: {}", index_path.display());
        log::info!("Content directory: {}", content_root.display());

        Ok(Self {
            index_path,
            content_root,
            config,
            fs,
        })
    }

    /// Stages 1-4: extract, parse, assign, plan. No side effects.
    pub fn plan(&self) -> Result<ReorgPlan> {
        let content = self
            .fs
            .read_to_string(&self.index_path)
            .map_err(TidyError::io(&self.index_path))?;

        let index_name = canonical_name(&file_name(&self.index_path));
        let content_name = canonical_name(&file_name(&self.content_root));

        let mut sections = parse_sections(&content);
        let links = extract_links(&content);
        log::info!("Found {} sections, {} links", sections.len(), links.len());

        let hash_mappings: BTreeMap<String, String> = links
            .iter()
            .filter_map(|l| l.hash.clone().map(|h| (h, l.canonical_name.clone())))
            .collect();

        let unassigned = assign_links_to_sections(&mut sections, links);

        let document_dir = self.index_path.parent().unwrap_or(Path::new(""));
        let planner = MovePlanner::new(&*self.fs, &self.content_root, &content_name, document_dir);
        let moves = planner.plan(&mut sections, &mut NameRegistry::new());

        if self.config.logging.show_plan {
            for op in &moves.operations {
                log::info!(
                    "{} -> {}/{}",
                    file_name(&op.source),
                    op.section,
                    file_name(&op.destination)
                );
            }
        }

        Ok(ReorgPlan {
            index_path: self.index_path.clone(),
            content_root: self.content_root.clone(),
            index_name,
            content_name,
            sections,
            unassigned,
            operations: moves.operations,
            link_updates: moves.link_updates,
            hash_mappings,
            diagnostics: moves.diagnostics,
        })
    }

    /// Stage 5 and the tree-wide passes.
    pub fn apply(&self, plan: &ReorgPlan) -> Result<RunSummary> {
        let fs = &*self.fs;
        let mut summary = RunSummary {
            dry_run: false,
            ..RunSummary::from_plan(plan)
        };

        let report = Executor::new(fs).execute(plan)?;
        summary.moves_performed = report.moves_performed;
        summary.moves_skipped = report.moves_skipped;
        summary.warnings += report.moves_skipped + report.diagnostics.len();
        summary.diagnostics.extend(report.diagnostics);

        if self.config.rename_orphans {
            summary.orphans_renamed = rename_hashed_files(fs, &report.content_root)?.len();
        }

        let propagation = dehash_nested_links(fs, &report.content_root)?;
        summary.documents_rewritten =
            propagation.rewritten.len() + usize::from(report.index_rewritten);
        summary.warnings += propagation.diagnostics.len();
        summary.diagnostics.extend(propagation.diagnostics);

        if self.config.remove_empty_dirs {
            summary.folders_removed = remove_empty_dirs(fs, &report.content_root).len();
        }

        Ok(summary)
    }

    /// Plan, then apply unless this is a dry run.
    pub fn run(&self) -> Result<RunSummary> {
        let plan = self.plan()?;
        if self.config.dry_run {
            return Ok(RunSummary::from_plan(&plan));
        }
        self.apply(&plan)
    }
}

/// Find the folder holding an index document's content.
///
/// It is the sibling directory whose canonical name matches the index's.
/// A still-hashed match wins over an already-clean one, so an interrupted
/// merge is finished on the next run. Falls back to the index stem.
pub fn find_content_directory(fs: &dyn FileSystem, index_path: &Path) -> PathBuf {
    let index_name = canonical_name(&file_name(index_path));
    let parent = index_path.parent().unwrap_or(Path::new(""));
    let listed = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let mut clean_match = None;
    for child in fs.read_dir(listed).unwrap_or_default() {
        if !fs.is_dir(&child) {
            continue;
        }
        let (name, hash) = strip_hash_suffix(&file_name(&child));
        if name != index_name {
            continue;
        }
        if hash.is_some() {
            return child;
        }
        clean_match.get_or_insert(child);
    }

    clean_match.unwrap_or_else(|| {
        let stem = index_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        parent.join(stem)
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
