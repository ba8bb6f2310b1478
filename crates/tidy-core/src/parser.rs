use crate::model::{Link, Section};
use crate::utils::encoding::decode_link_path;
use crate::utils::strip_hash_suffix;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

// Group 1 is the image marker, so image links can be told apart without lookbehind.
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[([^\]]+)\]\(([^)]+\.md)\)").unwrap());

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^##\s+(.+)$").unwrap());

/// Extract every `[text](path.md)` link, line by line, in reading order.
///
/// Image links are skipped. Targets with an anchor or without a `.md`
/// extension do not match at all.
pub fn extract_links(text: &str) -> Vec<Link> {
    let mut links = Vec::new();

    for (line_number, line) in text.split('\n').enumerate() {
        for caps in MD_LINK_RE.captures_iter(line) {
            if &caps[1] == "!" {
                continue;
            }

            let raw_path = caps[3].to_string();
            let decoded_path = decode_link_path(&raw_path);
            let filename = decoded_path
                .rsplit('/')
                .next()
                .unwrap_or(decoded_path.as_str())
                .to_string();
            let (canonical_name, hash) = strip_hash_suffix(&filename);

            links.push(Link {
                text: caps[2].to_string(),
                raw_path,
                decoded_path,
                filename,
                hash,
                canonical_name,
                line: line_number,
                section: None,
                new_path: None,
            });
        }
    }

    links
}

/// Split a document into `##` sections.
///
/// Deeper headings are not boundaries. Lines before the first section belong
/// to none. A heading with an empty title is ignored.
pub fn parse_sections(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.split('\n').collect();
    let last_line = lines.len().saturating_sub(1);

    let mut sections: Vec<Section> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = SECTION_RE.captures(line) else {
            continue;
        };
        let title = caps[1].trim();
        if title.is_empty() {
            continue;
        }

        if let Some(previous) = sections.last_mut() {
            previous.end_line = i - 1;
        }
        sections.push(Section::new(title.to_string(), i, last_line));
    }

    sections
}

/// Rewrite the target of every non-image `.md` link for which `rewrite`
/// returns a new path. Everything else is left byte-for-byte intact.
pub fn rewrite_link_targets<F>(text: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    MD_LINK_RE
        .replace_all(text, |caps: &Captures| {
            if &caps[1] == "!" {
                return caps[0].to_string();
            }
            match rewrite(&caps[3]) {
                Some(new_path) => format!("[{}]({})", &caps[2], new_path),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Replace the target of every non-image `.md` link found in `updates`.
///
/// All replacements happen in one left-to-right scan, so a new path that
/// happens to equal another entry's old path is never rewritten twice.
/// Image links keep their target even when it matches an entry.
pub fn replace_link_paths(text: &str, updates: &BTreeMap<String, String>) -> String {
    if updates.is_empty() {
        return text.to_string();
    }
    rewrite_link_targets(text, |old| updates.get(old).cloned())
}
