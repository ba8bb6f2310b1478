use super::model::{Diagnostic, LinkUpdates, MoveOperation};
use crate::model::{Link, Section};
use crate::utils::encoding::encode_link_path;
use crate::utils::{lowercase_file_name, normalize_lexically, strip_hash_suffix, unique_filename};
use crate::vfs::FileSystem;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Filenames already taken in each destination folder (lowercased).
///
/// Passed explicitly through planning so that every name choice is visible
/// to later links, and so tests can start from any pre-seeded state.
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    folders: HashMap<PathBuf, HashSet<String>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `names` as taken in `folder`. Marks the folder as seeded even if
    /// `names` is empty.
    pub fn seed<I, S>(&mut self, folder: &Path, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let taken = self.folders.entry(folder.to_path_buf()).or_default();
        taken.extend(names.into_iter().map(|n| n.as_ref().to_lowercase()));
    }

    pub fn is_seeded(&self, folder: &Path) -> bool {
        self.folders.contains_key(folder)
    }

    pub fn contains(&self, folder: &Path, filename: &str) -> bool {
        self.folders
            .get(folder)
            .is_some_and(|taken| taken.contains(&filename.to_lowercase()))
    }

    pub fn insert(&mut self, folder: &Path, filename: &str) {
        self.seed(folder, [filename]);
    }

    /// Choose a free `.md` filename for `base_name` in `folder` and take it.
    pub fn claim(&mut self, folder: &Path, base_name: &str) -> String {
        let taken = self.folders.entry(folder.to_path_buf()).or_default();
        let filename = unique_filename(base_name, taken);
        taken.insert(filename.to_lowercase());
        filename
    }
}

/// Places a link target may live, tried in [`RESOLUTION_ORDER`].
///
/// Export links are rooted inconsistently, so each quirk gets its own
/// candidate. New quirks go at the end of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCandidate {
    /// Relative to the content root, its on-disk folder name stripped.
    ContentRelative,
    /// Relative to the content root, its canonical folder name stripped.
    CanonicalContentRelative,
    /// Relative to the index document's directory.
    DocumentRelative,
    /// The bare filename directly inside the content root.
    ContentRootFilename,
}

pub const RESOLUTION_ORDER: [SourceCandidate; 4] = [
    SourceCandidate::ContentRelative,
    SourceCandidate::CanonicalContentRelative,
    SourceCandidate::DocumentRelative,
    SourceCandidate::ContentRootFilename,
];

/// Output of the planning stage.
#[derive(Debug, Default, Clone)]
pub struct MovePlan {
    pub operations: Vec<MoveOperation>,
    pub link_updates: LinkUpdates,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decides where every section link's document goes. Never touches the disk
/// except to look.
pub struct MovePlanner<'a> {
    fs: &'a dyn FileSystem,
    content_root: PathBuf,
    /// Canonical content root name, used when building new link targets.
    content_name: &'a str,
    document_dir: PathBuf,
}

impl<'a> MovePlanner<'a> {
    /// # Arguments
    /// * `content_root` - The content folder as it is on disk right now
    /// * `content_name` - Its canonical (hash-free) name
    /// * `document_dir` - Directory of the document the links come from
    pub fn new(
        fs: &'a dyn FileSystem,
        content_root: &Path,
        content_name: &'a str,
        document_dir: &Path,
    ) -> Self {
        Self {
            fs,
            content_root: normalize_lexically(content_root),
            content_name,
            document_dir: normalize_lexically(document_dir),
        }
    }

    fn candidate_path(&self, candidate: SourceCandidate, link: &Link) -> PathBuf {
        let decoded = link.decoded_path.as_str();
        let path = match candidate {
            SourceCandidate::ContentRelative => {
                let root_name = self
                    .content_root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.content_root.join(strip_folder_prefix(decoded, &root_name))
            }
            SourceCandidate::CanonicalContentRelative => self
                .content_root
                .join(strip_folder_prefix(decoded, self.content_name)),
            SourceCandidate::DocumentRelative => self.document_dir.join(decoded),
            SourceCandidate::ContentRootFilename => self.content_root.join(&link.filename),
        };
        normalize_lexically(&path)
    }

    /// First candidate in [`RESOLUTION_ORDER`] that is an existing file.
    pub fn resolve_source(&self, link: &Link) -> Option<PathBuf> {
        RESOLUTION_ORDER
            .iter()
            .map(|&candidate| self.candidate_path(candidate, link))
            .find(|path| self.fs.is_file(path))
    }

    fn existing_file_names(&self, folder: &Path) -> Vec<String> {
        if !self.fs.is_dir(folder) {
            return Vec::new();
        }
        self.fs
            .read_dir(folder)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| self.fs.is_file(p))
            .filter_map(|p| lowercase_file_name(&p))
            .collect()
    }

    /// Plan moves for every section that owns links.
    ///
    /// Sets `new_path` on each resolved link. Unresolved links get a warning
    /// and keep their original target.
    pub fn plan(&self, sections: &mut [Section], names: &mut NameRegistry) -> MovePlan {
        let mut result = MovePlan::default();
        // source -> (folder name, filename) chosen for it earlier in this run
        let mut planned: HashMap<PathBuf, (String, String)> = HashMap::new();

        for section in sections.iter_mut() {
            if section.links.is_empty() {
                continue;
            }

            let folder = self.content_root.join(&section.folder_name);
            if !names.is_seeded(&folder) {
                let existing = self.existing_file_names(&folder);
                names.seed(&folder, existing);
            }

            log::debug!(
                "Planning section '{}' ({} links) into {}",
                section.title,
                section.links.len(),
                folder.display()
            );

            for link in section.links.iter_mut() {
                let Some(source) = self.resolve_source(link) else {
                    log::warn!("Source not found: {} (line {})", link.filename, link.line + 1);
                    result.diagnostics.push(
                        Diagnostic::warning(format!(
                            "Source not found for link '{}': {}",
                            link.text, link.decoded_path
                        ))
                        .with_path(self.candidate_path(SourceCandidate::ContentRelative, link))
                        .with_line(link.line),
                    );
                    continue;
                };

                let (folder_name, filename) = match planned.get(&source) {
                    Some(previous) => previous.clone(),
                    None => {
                        let filename = match placed_file_name(&source, &folder) {
                            Some(current) => {
                                names.insert(&folder, &current);
                                current
                            }
                            None => names.claim(&folder, &link.canonical_name),
                        };

                        let destination = folder.join(&filename);
                        if destination != source {
                            result.operations.push(MoveOperation {
                                source: source.clone(),
                                destination,
                                section: section.title.clone(),
                            });
                        }

                        let choice = (section.folder_name.clone(), filename);
                        planned.insert(source, choice.clone());
                        choice
                    }
                };

                let new_path = encode_link_path(&[self.content_name, &folder_name, &filename]);
                if new_path != link.raw_path {
                    result
                        .link_updates
                        .insert(link.raw_path.clone(), new_path.clone());
                }
                link.new_path = Some(new_path);
            }
        }

        result
    }
}

fn strip_folder_prefix<'p>(path: &'p str, folder: &str) -> &'p str {
    if folder.is_empty() {
        return path;
    }
    path.strip_prefix(folder)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
}

/// The current filename of `source` when it already sits in `folder` under a
/// hash-free name, i.e. an earlier run already moved it.
fn placed_file_name(source: &Path, folder: &Path) -> Option<String> {
    if source.parent() != Some(folder) {
        return None;
    }
    let name = source.file_name()?.to_string_lossy().into_owned();
    match strip_hash_suffix(&name) {
        (_, None) => Some(name),
        (_, Some(_)) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{extract_links, parse_sections};
    use crate::reorg::assign::assign_links_to_sections;
    use crate::vfs::PhysicalFileSystem;
    use std::fs;
    use tempfile::TempDir;

    const HASH: &str = "deadbeefdeadbeefdeadbeefdeadbeef";
    const HASH2: &str = "0123456789abcdef0123456789abcdef";

    /// Lays out `<tmp>/Export abc/` and returns (tmp, content_root).
    fn create_export() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let content_root = temp_dir.path().join("Export abc");
        fs::create_dir_all(&content_root).unwrap();
        (temp_dir, content_root)
    }

    fn sections_for(content: &str) -> Vec<Section> {
        let mut sections = parse_sections(content);
        assign_links_to_sections(&mut sections, extract_links(content));
        sections
    }

    fn plan_for(content: &str, temp_dir: &TempDir, content_root: &Path) -> (Vec<Section>, MovePlan) {
        let fs = PhysicalFileSystem;
        let mut sections = sections_for(content);
        let planner = MovePlanner::new(&fs, content_root, "Export abc", temp_dir.path());
        let plan = planner.plan(&mut sections, &mut NameRegistry::new());
        (sections, plan)
    }

    #[test]
    fn test_plan_basic_move() {
        let (temp_dir, content_root) = create_export();
        fs::write(content_root.join(format!("Plan {}.md", HASH)), "plan").unwrap();

        let content = format!(
            "# Export abc\n\n## Projects\n- [Plan](Export%20abc/Plan%20{}.md)\n",
            HASH
        );
        let (sections, plan) = plan_for(&content, &temp_dir, &content_root);

        assert_eq!(plan.operations.len(), 1);
        let op = &plan.operations[0];
        assert_eq!(op.source, content_root.join(format!("Plan {}.md", HASH)));
        assert_eq!(op.destination, content_root.join("Projects").join("Plan.md"));
        assert_eq!(op.section, "Projects");

        assert_eq!(
            plan.link_updates.get(&format!("Export%20abc/Plan%20{}.md", HASH)),
            Some(&"Export%20abc/Projects/Plan.md".to_string())
        );
        assert_eq!(
            sections[0].links[0].new_path.as_deref(),
            Some("Export%20abc/Projects/Plan.md")
        );
        assert!(plan.diagnostics.is_empty());
    }

    #[test]
    fn test_plan_collision_gets_counter() {
        let (temp_dir, content_root) = create_export();
        fs::create_dir_all(content_root.join("a")).unwrap();
        fs::write(content_root.join(format!("Notes {}.md", HASH)), "1").unwrap();
        fs::write(content_root.join("a").join(format!("Notes {}.md", HASH2)), "2").unwrap();

        let content = format!(
            "## Docs\n[N1](Notes%20{}.md)\n[N2](a/Notes%20{}.md)",
            HASH, HASH2
        );
        let (_, plan) = plan_for(&content, &temp_dir, &content_root);

        let names: Vec<_> = plan
            .operations
            .iter()
            .map(|op| op.destination.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Notes.md", "Notes (1).md"]);
        assert_eq!(
            plan.link_updates.get(&format!("a/Notes%20{}.md", HASH2)),
            Some(&"Export%20abc/Docs/Notes%20%281%29.md".to_string())
        );
    }

    #[test]
    fn test_plan_unresolved_link_warns_and_skips() {
        let (temp_dir, content_root) = create_export();

        let content = format!("## Projects\n[Gone](Export%20abc/Gone%20{}.md)", HASH);
        let (sections, plan) = plan_for(&content, &temp_dir, &content_root);

        assert!(plan.operations.is_empty());
        assert!(plan.link_updates.is_empty());
        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(plan.diagnostics[0].line, Some(1));
        assert!(plan.diagnostics[0].message.contains("Gone"));
        assert_eq!(sections[0].links[0].new_path, None);
    }

    #[test]
    fn test_resolution_ladder_order() {
        let (temp_dir, content_root) = create_export();
        let fs = PhysicalFileSystem;
        let planner = MovePlanner::new(&fs, &content_root, "Export", temp_dir.path());

        // (ii) hashed root on disk, link rooted at the canonical name
        fs::write(content_root.join("Doc.md"), "").unwrap();
        let link = &extract_links("[d](Export/Doc.md)")[0];
        assert_eq!(planner.resolve_source(link), Some(content_root.join("Doc.md")));

        // (iii) relative to the index document's directory
        fs::create_dir_all(temp_dir.path().join("Elsewhere")).unwrap();
        fs::write(temp_dir.path().join("Elsewhere/Side.md"), "").unwrap();
        let link = &extract_links("[s](Elsewhere/Side.md)")[0];
        assert_eq!(
            planner.resolve_source(link),
            Some(temp_dir.path().join("Elsewhere/Side.md"))
        );

        // (iv) bare filename in the content root, whatever the link's folders say
        fs::write(content_root.join("Loose.md"), "").unwrap();
        let link = &extract_links("[l](Some%20Folder/Loose.md)")[0];
        assert_eq!(planner.resolve_source(link), Some(content_root.join("Loose.md")));

        // (i) wins over (iv) when both exist
        fs::create_dir_all(content_root.join("Sub")).unwrap();
        fs::write(content_root.join("Sub/Loose.md"), "").unwrap();
        let link = &extract_links("[l](Export%20abc/Sub/Loose.md)")[0];
        assert_eq!(planner.resolve_source(link), Some(content_root.join("Sub/Loose.md")));
    }

    #[test]
    fn test_preseeded_registry_is_respected() {
        let (temp_dir, content_root) = create_export();
        fs::write(content_root.join(format!("Plan {}.md", HASH)), "").unwrap();

        let fs = PhysicalFileSystem;
        let mut sections = sections_for(&format!("## Projects\n[P](Plan%20{}.md)", HASH));
        let mut names = NameRegistry::new();
        names.seed(&content_root.join("Projects"), ["PLAN.md", "plan (1).md"]);

        let planner = MovePlanner::new(&fs, &content_root, "Export abc", temp_dir.path());
        let plan = planner.plan(&mut sections, &mut names);

        assert_eq!(
            plan.operations[0].destination,
            content_root.join("Projects/Plan (2).md")
        );
        assert!(names.contains(&content_root.join("Projects"), "plan (2).md"));
    }

    #[test]
    fn test_existing_folder_contents_seed_registry() {
        let (temp_dir, content_root) = create_export();
        fs::create_dir_all(content_root.join("Projects")).unwrap();
        fs::write(content_root.join("Projects/plan.md"), "already here").unwrap();
        fs::write(content_root.join(format!("Plan {}.md", HASH)), "").unwrap();

        let content = format!("## Projects\n[P](Plan%20{}.md)", HASH);
        let (_, plan) = plan_for(&content, &temp_dir, &content_root);

        assert_eq!(
            plan.operations[0].destination,
            content_root.join("Projects/Plan (1).md")
        );
    }

    #[test]
    fn test_already_placed_file_is_not_moved() {
        let (temp_dir, content_root) = create_export();
        fs::create_dir_all(content_root.join("Projects")).unwrap();
        fs::write(content_root.join("Projects/Plan.md"), "").unwrap();
        fs::write(content_root.join("Projects/Plan (1).md"), "").unwrap();

        let content =
            "## Projects\n[P](Export%20abc/Projects/Plan.md)\n[Q](Export%20abc/Projects/Plan%20%281%29.md)";
        let (sections, plan) = plan_for(content, &temp_dir, &content_root);

        assert!(plan.operations.is_empty());
        assert!(plan.link_updates.is_empty());
        assert_eq!(
            sections[0].links[1].new_path.as_deref(),
            Some("Export%20abc/Projects/Plan%20%281%29.md")
        );
    }

    #[test]
    fn test_same_source_linked_twice_is_planned_once() {
        let (temp_dir, content_root) = create_export();
        fs::write(content_root.join(format!("Plan {}.md", HASH)), "").unwrap();

        let content = format!(
            "## Projects\n[P](Plan%20{h}.md)\n## Later\n[Again](Export%20abc/Plan%20{h}.md)",
            h = HASH
        );
        let (sections, plan) = plan_for(&content, &temp_dir, &content_root);

        assert_eq!(plan.operations.len(), 1);
        assert_eq!(
            sections[1].links[0].new_path.as_deref(),
            Some("Export%20abc/Projects/Plan.md")
        );
    }

    #[test]
    fn test_same_titled_sections_share_a_folder() {
        let (temp_dir, content_root) = create_export();
        fs::write(content_root.join(format!("Notes {}.md", HASH)), "").unwrap();
        fs::write(content_root.join(format!("Notes {}.md", HASH2)), "").unwrap();

        let content = format!(
            "## Misc\n[A](Notes%20{}.md)\n## Misc\n[B](Notes%20{}.md)",
            HASH, HASH2
        );
        let (_, plan) = plan_for(&content, &temp_dir, &content_root);

        assert_eq!(plan.operations.len(), 2);
        assert_ne!(plan.operations[0].destination, plan.operations[1].destination);
    }

    #[test]
    fn test_destinations_unique_per_folder() {
        let (temp_dir, content_root) = create_export();
        let mut content = String::from("## One\n");
        for i in 0..6 {
            let hash = format!("{:032x}", i + 1);
            let name = if i % 2 == 0 { "Task" } else { "TASK" };
            fs::write(content_root.join(format!("{} {}.md", name, hash)), "").unwrap();
            content.push_str(&format!("[t](Export%20abc/{}%20{}.md)\n", name, hash));
        }
        content.push_str("## Two\n");
        let hash = format!("{:032x}", 99);
        fs::write(content_root.join(format!("Task {}.md", hash)), "").unwrap();
        content.push_str(&format!("[t](Task%20{}.md)\n", hash));

        let (_, plan) = plan_for(&content, &temp_dir, &content_root);
        assert_eq!(plan.operations.len(), 7);

        let mut seen = HashSet::new();
        for op in &plan.operations {
            let key = op.destination.to_string_lossy().to_lowercase();
            assert!(seen.insert(key), "duplicate destination {:?}", op.destination);
        }
        assert!(plan
            .operations
            .iter()
            .any(|op| op.destination == content_root.join("Two/Task.md")));
    }
}
