use serde::{Deserialize, Serialize};

/// One occurrence of a markdown link to a `.md` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Display text between the brackets.
    pub text: String,
    /// Target exactly as written in the document (percent-encoded).
    pub raw_path: String,
    pub decoded_path: String,
    /// Last segment of the decoded path.
    pub filename: String,
    pub hash: Option<String>,
    /// `filename` without extension and hash suffix.
    pub canonical_name: String,
    /// 0-based line of the occurrence.
    pub line: usize,
    /// Title of the enclosing section, once assigned.
    pub section: Option<String>,
    /// Rewritten, encoded target, once planned.
    pub new_path: Option<String>,
}

/// Lines under one `##` heading, up to the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub start_line: usize,
    /// Inclusive.
    pub end_line: usize,
    /// Destination folder name. The raw title, no slugification.
    pub folder_name: String,
    pub links: Vec<Link>,
}

impl Section {
    pub fn new(title: String, start_line: usize, end_line: usize) -> Self {
        Self {
            folder_name: title.clone(),
            title,
            start_line,
            end_line,
            links: Vec::new(),
        }
    }

    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}
