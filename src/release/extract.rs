//! Release-note extraction from pull request descriptions.
//!
//! A description carries a note when a line mentions "release note"; the
//! first meaningful line after it is the note. Contributors write "N/A" and
//! similar phrasing to opt out.

use std::sync::LazyLock;

use regex::Regex;

#[expect(clippy::expect_used, reason = "static pattern is known to be valid")]
static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment pattern"));

#[expect(clippy::expect_used, reason = "static pattern is known to be valid")]
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)release[\s[:punct:]]*note").expect("valid marker pattern"));

#[expect(clippy::expect_used, reason = "static pattern is known to be valid")]
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:-\s*|[*+](?:\s+|$))").expect("valid list pattern"));

#[expect(clippy::expect_used, reason = "static pattern is known to be valid")]
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:```|~~~)[\w+-]*$").expect("valid fence pattern"));

#[expect(clippy::expect_used, reason = "static pattern is known to be valid")]
static NOT_APPLICABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\(?(?:n/?a|no|none|no need|not needed|no release note|trivial(?: change)?)\)?\.?$",
    )
    .expect("valid opt-out pattern")
});

#[expect(clippy::expect_used, reason = "static pattern is known to be valid")]
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,3}\s").expect("valid heading pattern"));

/// Extracts the release note from a pull request body.
///
/// Returns `None` when the body has no release-note marker, when the author
/// opted out, or when only a heading follows the marker.
///
/// # Example
///
/// ```
/// use releaser::release::extract_release_note;
///
/// let body = "### Release note\n\n- - * fixed the bug";
/// assert_eq!(extract_release_note(body).as_deref(), Some("fixed the bug"));
/// assert_eq!(extract_release_note("Release note\n- N/A."), None);
/// ```
#[must_use]
pub fn extract_release_note(body: &str) -> Option<String> {
    let uncommented = HTML_COMMENT.replace_all(body, "");
    let normalised = uncommented.replace('\r', "");

    let candidates = normalised
        .lines()
        .skip_while(|line| !MARKER.is_match(line))
        .skip(1);

    for line in candidates {
        let text = strip_list_markers(line.trim());
        if text.is_empty() || CODE_FENCE.is_match(text) {
            continue;
        }
        if NOT_APPLICABLE.is_match(text) || HEADING.is_match(text) {
            return None;
        }
        return Some(text.to_owned());
    }
    None
}

/// Whether the body carries a release note.
#[must_use]
pub fn has_release_note(body: &str) -> bool {
    extract_release_note(body).is_some()
}

fn strip_list_markers(line: &str) -> &str {
    let mut text = line;
    while let Some(found) = LIST_MARKER.find(text) {
        text = text.get(found.end()..).unwrap_or_default().trim_start();
    }
    text
}
