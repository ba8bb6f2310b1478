use crate::model::{Link, Section};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Old encoded link target -> new encoded link target.
pub type LinkUpdates = BTreeMap<String, String>;

/// Everything stages 1-4 decide, before any file is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorgPlan {
    pub index_path: PathBuf,
    pub content_root: PathBuf,
    /// Canonical file stem of the index document.
    pub index_name: String,
    /// Canonical name of the content root folder.
    pub content_name: String,
    pub sections: Vec<Section>,
    /// Links that fell outside every section.
    pub unassigned: Vec<Link>,
    pub operations: Vec<MoveOperation>,
    pub link_updates: LinkUpdates,
    /// Export hash -> canonical name, for every hashed link in the index.
    pub hash_mappings: BTreeMap<String, String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReorgPlan {
    pub fn link_count(&self) -> usize {
        self.unassigned.len() + self.sections.iter().map(|s| s.links.len()).sum::<usize>()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.sections
            .iter()
            .flat_map(|s| s.links.iter())
            .chain(self.unassigned.iter())
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity != DiagnosticSeverity::Info)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOperation {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Title of the section that owns the moved document.
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub path: Option<PathBuf>,
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
            path: None,
            line: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    Info,
    Warning,
    Error,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub sections: usize,
    pub links: usize,
    pub operations: usize,
    pub hash_mappings: usize,
    pub warnings: usize,
    pub moves_performed: usize,
    pub moves_skipped: usize,
    pub orphans_renamed: usize,
    pub documents_rewritten: usize,
    pub folders_removed: usize,
    /// Planning warnings, followed by any raised while applying.
    pub diagnostics: Vec<Diagnostic>,
}

impl RunSummary {
    pub fn from_plan(plan: &ReorgPlan) -> Self {
        Self {
            dry_run: true,
            sections: plan.sections.len(),
            links: plan.link_count(),
            operations: plan.operations.len(),
            hash_mappings: plan.hash_mappings.len(),
            warnings: plan.warning_count(),
            diagnostics: plan.diagnostics.clone(),
            ..Self::default()
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sections processed: {}", self.sections)?;
        writeln!(f, "Links processed: {}", self.links)?;
        writeln!(f, "File operations: {}", self.operations)?;
        writeln!(f, "Hash mappings extracted: {}", self.hash_mappings)?;
        write!(f, "Warnings: {}", self.warnings)?;

        if self.dry_run {
            return write!(f, "\nDry run: no changes were made");
        }

        writeln!(f)?;
        writeln!(f, "Moves performed: {}", self.moves_performed)?;
        writeln!(f, "Moves skipped: {}", self.moves_skipped)?;
        writeln!(f, "Orphans renamed: {}", self.orphans_renamed)?;
        writeln!(f, "Documents rewritten: {}", self.documents_rewritten)?;
        write!(f, "Empty folders removed: {}", self.folders_removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display_dry_run() {
        let summary = RunSummary {
            dry_run: true,
            sections: 2,
            links: 5,
            operations: 4,
            hash_mappings: 3,
            warnings: 1,
            ..RunSummary::default()
        };

        let text = summary.to_string();
        assert!(text.contains("Sections processed: 2"));
        assert!(text.contains("Links processed: 5"));
        assert!(text.contains("File operations: 4"));
        assert!(text.contains("Hash mappings extracted: 3"));
        assert!(text.ends_with("Dry run: no changes were made"));
        assert!(!text.contains("Moves performed"));
    }

    #[test]
    fn test_summary_display_applied() {
        let summary = RunSummary {
            moves_performed: 7,
            folders_removed: 2,
            ..RunSummary::default()
        };

        let text = summary.to_string();
        assert!(text.contains("Moves performed: 7"));
        assert!(text.ends_with("Empty folders removed: 2"));
    }
}
