//! Percent-encoding helpers for link targets.
//!
//! Exported links are percent-encoded relative paths. Decoding is lossy on
//! invalid UTF-8 so that a malformed link never aborts a run.

/// Decode a percent-encoded link target.
///
/// ```
/// use tidy_core::utils::encoding::decode_link_path;
///
/// assert_eq!(decode_link_path("Export%20abc/Plan.md"), "Export abc/Plan.md");
/// assert_eq!(decode_link_path("plain.md"), "plain.md");
/// ```
pub fn decode_link_path(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

/// Percent-encode a single path segment. `/` is encoded too.
///
/// ```
/// use tidy_core::utils::encoding::encode_segment;
///
/// assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
/// ```
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Encode each segment and join them with `/`.
///
/// A `/` inside a segment is kept as a separator, so a folder name such as
/// `Q1/Q2` produces two path levels.
///
/// ```
/// use tidy_core::utils::encoding::encode_link_path;
///
/// assert_eq!(
///     encode_link_path(&["Export abc", "Projects", "Plan (1).md"]),
///     "Export%20abc/Projects/Plan%20%281%29.md"
/// );
/// ```
pub fn encode_link_path(segments: &[&str]) -> String {
    segments
        .iter()
        .flat_map(|segment| segment.split('/'))
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace the final `/`-separated segment of an encoded link target.
pub fn replace_last_segment(encoded_path: &str, new_segment: &str) -> String {
    match encoded_path.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, encode_segment(new_segment)),
        None => encode_segment(new_segment),
    }
}
