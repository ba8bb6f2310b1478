pub mod encoding;

use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

// The exporter appends a 32-char hex id; older exports use shorter ones.
static HASH_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+([a-f0-9]{32})$").unwrap());

static LOOSE_HASH_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+([a-f0-9]{20,})$").unwrap());

/// Split an exported file or folder name into its canonical name and hash.
///
/// A trailing `.md` extension is removed first, then a whitespace-separated
/// run of hex characters at the end of the name is taken as the hash.
/// Names without a hash come back unchanged (minus the extension).
///
/// # Examples
///
/// ```
/// use tidy_core::strip_hash_suffix;
///
/// let (name, hash) = strip_hash_suffix("Plan deadbeefdeadbeefdeadbeefdeadbeef.md");
/// assert_eq!(name, "Plan");
/// assert_eq!(hash.as_deref(), Some("deadbeefdeadbeefdeadbeefdeadbeef"));
///
/// // Folders carry the same suffix without an extension
/// let (name, _) = strip_hash_suffix("Export 2c942c9038be80c2b26ee86a5ea677c5");
/// assert_eq!(name, "Export");
///
/// // Shorter ids are accepted from 20 characters up
/// let (name, hash) = strip_hash_suffix("Notes 0123456789abcdef0123.md");
/// assert_eq!(name, "Notes");
/// assert_eq!(hash.as_deref(), Some("0123456789abcdef0123"));
///
/// // Already canonical
/// assert_eq!(strip_hash_suffix("Plan"), ("Plan".to_string(), None));
/// ```
pub fn strip_hash_suffix(name: &str) -> (String, Option<String>) {
    let base = name.strip_suffix(".md").unwrap_or(name);

    for re in [&*HASH_SUFFIX_RE, &*LOOSE_HASH_SUFFIX_RE] {
        if let Some(caps) = re.captures(base) {
            return (caps[1].to_string(), Some(caps[2].to_string()));
        }
    }

    (base.to_string(), None)
}

/// Canonical (hash-free) form of a name, dropping the hash itself.
pub fn canonical_name(name: &str) -> String {
    strip_hash_suffix(name).0
}

/// Pick a `.md` filename for `base_name` that is not in `existing`.
///
/// `existing` holds lowercased filenames. Collisions get a ` (n)` counter
/// starting at 1.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use tidy_core::unique_filename;
///
/// let mut taken = HashSet::new();
/// assert_eq!(unique_filename("Notes", &taken), "Notes.md");
///
/// taken.insert("notes.md".to_string());
/// taken.insert("notes (1).md".to_string());
/// assert_eq!(unique_filename("NOTES", &taken), "NOTES (2).md");
/// ```
pub fn unique_filename(base_name: &str, existing: &HashSet<String>) -> String {
    let candidate = format!("{}.md", base_name);
    if !existing.contains(&candidate.to_lowercase()) {
        return candidate;
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{} ({}).md", base_name, counter);
        if !existing.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Resolve `.` and `..` components without touching the disk.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Lowercased file name of `path`, used as a key in name sets.
pub(crate) fn lowercase_file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "deadbeefdeadbeefdeadbeefdeadbeef";

    #[test]
    fn test_strip_hash_suffix() {
        assert_eq!(
            strip_hash_suffix(&format!("Plan {}.md", HASH)),
            ("Plan".to_string(), Some(HASH.to_string()))
        );
        assert_eq!(
            strip_hash_suffix(&format!("My Big Plan {}", HASH)),
            ("My Big Plan".to_string(), Some(HASH.to_string()))
        );
        // Multiple separating spaces are all dropped
        assert_eq!(
            strip_hash_suffix(&format!("Plan   {}.md", HASH)).0,
            "Plan"
        );
        // Hash must be separated by whitespace
        assert_eq!(
            strip_hash_suffix(&format!("Plan{}.md", HASH)),
            (format!("Plan{}", HASH), None)
        );
        // Uppercase hex is not an export hash
        assert_eq!(
            strip_hash_suffix("Plan DEADBEEFDEADBEEFDEADBEEFDEADBEEF.md").1,
            None
        );
        // Too short
        assert_eq!(strip_hash_suffix("Plan abc123.md"), ("Plan abc123".to_string(), None));
        // A lone hash has no base name to keep
        assert_eq!(strip_hash_suffix(HASH).1, None);
    }

    #[test]
    fn test_long_hash_falls_back_to_loose_match() {
        let long = "0123456789abcdef0123456789abcdef01234567";
        let (name, hash) = strip_hash_suffix(&format!("Notes {}.md", long));
        assert_eq!(name, "Notes");
        assert_eq!(hash.as_deref(), Some(long));
    }

    #[test]
    fn test_strip_hash_suffix_idempotent() {
        let names = [
            format!("Plan {}.md", HASH),
            format!("Meeting Notes 2024 {}", HASH),
            "Notes (1).md".to_string(),
            "README".to_string(),
            "Export abc".to_string(),
        ];
        for name in names {
            let (once, _) = strip_hash_suffix(&name);
            let (twice, hash) = strip_hash_suffix(&once);
            assert_eq!(once, twice, "normalizing '{}' twice changed it", name);
            assert_eq!(hash, None);
        }
    }

    #[test]
    fn test_unique_filename_case_insensitive() {
        let mut taken = HashSet::new();
        taken.insert("plan.md".to_string());
        assert_eq!(unique_filename("Plan", &taken), "Plan (1).md");
        assert_eq!(unique_filename("Other", &taken), "Other.md");
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/./c/../d.md")),
            PathBuf::from("/a/b/d.md")
        );
        assert_eq!(
            normalize_lexically(Path::new("../x.md")),
            PathBuf::from("../x.md")
        );
    }
}
