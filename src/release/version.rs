//! Version string conventions shared by the pipeline.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ReleaseError;

#[expect(clippy::expect_used, reason = "static pattern is known to be valid")]
static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)$").expect("valid trailing number pattern"));

/// Name of the release branch pull requests for `version` target.
///
/// The major component is the trailing number of everything before the
/// first dot, so `v5.0.0` maps to `release-5.0` and `tidb-v4.1` to
/// `release-4.0`.
///
/// # Errors
///
/// Returns [`ReleaseError::MalformedInput`] when the part before the first
/// dot does not end in digits.
///
/// # Example
///
/// ```
/// use releaser::release::version::release_branch;
///
/// assert_eq!(release_branch("v5.0.0").ok().as_deref(), Some("release-5.0"));
/// assert!(release_branch("next").is_err());
/// ```
pub fn release_branch(version: &str) -> Result<String, ReleaseError> {
    let major_part = version.split('.').next().unwrap_or_default();
    TRAILING_NUMBER
        .captures(major_part)
        .and_then(|captures| captures.get(1))
        .map(|major| format!("release-{}.0", major.as_str()))
        .ok_or_else(|| {
            ReleaseError::malformed(version, "version must start with a numeric major component")
        })
}

/// File name of the document for `version`, without a leading `v`.
#[must_use]
pub fn document_file_name(version: &str) -> String {
    format!("{}.md", version.trim_start_matches('v'))
}
