//! Data models for milestones, issues, pull requests and repository
//! contents.
//!
//! Types prefixed with `Api` are internal deserialisation targets that
//! convert into public domain types.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReleaseError;

/// Milestone state filter accepted by the milestones endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MilestoneState {
    /// Open milestones only.
    #[default]
    Open,
    /// Closed milestones only.
    Closed,
    /// Open and closed milestones.
    All,
}

impl MilestoneState {
    /// Query-string value for the filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// A repository milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    /// Global identifier; zero marks an unusable record.
    pub id: u64,
    /// Repository-scoped number used to filter issues.
    pub number: u64,
    /// Title, usually the version string.
    pub title: String,
    /// `open` or `closed`.
    pub state: String,
}

/// Pull request as seen through a milestone listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Title of the pull request.
    pub title: String,
    /// Description body, if any.
    pub body: Option<String>,
    /// State (e.g. open, closed).
    pub state: String,
    /// Label names in the order GitHub returned them.
    pub labels: Vec<String>,
    /// Author login if present.
    pub author: Option<String>,
    /// Merge timestamp when merged.
    pub merged_at: Option<DateTime<Utc>>,
    /// Target branch when known.
    pub base_ref: Option<String>,
    /// HTML URL for displaying to a user.
    pub html_url: Option<String>,
}

impl PullRequest {
    /// Whether the pull request has been merged.
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

/// Link from an issue record to the pull request it represents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestLink {
    /// Merge timestamp when merged.
    pub merged_at: Option<DateTime<Utc>>,
    /// HTML URL of the pull request.
    pub html_url: Option<String>,
}

/// Issue record returned by the issues endpoint.
///
/// GitHub lists pull requests as issues; those carry a [`PullRequestLink`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issue {
    /// Issue number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Body text, if any.
    pub body: Option<String>,
    /// State (e.g. open, closed).
    pub state: String,
    /// Label names.
    pub labels: Vec<String>,
    /// Author login if present.
    pub author: Option<String>,
    /// HTML URL.
    pub html_url: Option<String>,
    /// Present when the issue is a pull request.
    pub pull_request: Option<PullRequestLink>,
}

impl Issue {
    /// Converts the record into a pull request, or gives it back when it is
    /// a plain issue.
    ///
    /// The base branch is not part of issue records, so it stays unknown.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the issue has no pull request link.
    pub fn into_pull_request(self) -> Result<PullRequest, Self> {
        let Some(link) = self.pull_request else {
            return Err(self);
        };
        Ok(PullRequest {
            number: self.number,
            title: self.title,
            body: self.body,
            state: self.state,
            labels: self.labels,
            author: self.author,
            merged_at: link.merged_at,
            base_ref: None,
            html_url: link.html_url.or(self.html_url),
        })
    }
}

/// Kind of a directory entry in a contents listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Dir,
    /// Symlink, submodule or anything else.
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name.
    pub name: String,
    /// Path from the repository root.
    pub path: String,
    /// Entry kind.
    pub kind: EntryKind,
}

/// Result of the repository contents endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// A single decoded file.
    File {
        /// Path from the repository root.
        path: String,
        /// UTF-8 file content.
        text: String,
    },
    /// A directory listing.
    Directory(Vec<DirEntry>),
}

/// Request body for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    /// Pull request title.
    pub title: String,
    /// Source branch, `owner:branch` for cross-repository requests.
    pub head: String,
    /// Target branch.
    pub base: String,
    /// Description.
    pub body: String,
}

/// A pull request GitHub has just created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPullRequest {
    /// Pull request number.
    pub number: u64,
    /// HTML URL, if returned.
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiMilestone {
    #[serde(default)]
    pub(crate) id: u64,
    pub(crate) number: u64,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiUser {
    pub(crate) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiLabel {
    pub(crate) name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiPullRequestLink {
    pub(crate) merged_at: Option<DateTime<Utc>>,
    pub(crate) html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiIssue {
    pub(crate) number: u64,
    pub(crate) title: String,
    pub(crate) body: Option<String>,
    #[serde(default)]
    pub(crate) state: String,
    #[serde(default)]
    pub(crate) labels: Vec<ApiLabel>,
    pub(crate) user: Option<ApiUser>,
    pub(crate) html_url: Option<String>,
    pub(crate) pull_request: Option<ApiPullRequestLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiContentEntry {
    pub(crate) name: String,
    pub(crate) path: String,
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) content: Option<String>,
    pub(crate) encoding: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiContents {
    Directory(Vec<ApiContentEntry>),
    File(ApiContentEntry),
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiGitRef {
    #[serde(rename = "ref")]
    pub(crate) reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiCreatedPullRequest {
    pub(crate) number: u64,
    pub(crate) html_url: Option<String>,
}

impl From<ApiMilestone> for Milestone {
    fn from(value: ApiMilestone) -> Self {
        Self {
            id: value.id,
            number: value.number,
            title: value.title,
            state: value.state,
        }
    }
}

impl From<ApiIssue> for Issue {
    fn from(value: ApiIssue) -> Self {
        Self {
            number: value.number,
            title: value.title,
            body: value.body,
            state: value.state,
            labels: value.labels.into_iter().map(|label| label.name).collect(),
            author: value.user.and_then(|user| user.login),
            html_url: value.html_url,
            pull_request: value.pull_request.map(|link| PullRequestLink {
                merged_at: link.merged_at,
                html_url: link.html_url,
            }),
        }
    }
}

impl From<ApiCreatedPullRequest> for CreatedPullRequest {
    fn from(value: ApiCreatedPullRequest) -> Self {
        Self {
            number: value.number,
            html_url: value.html_url,
        }
    }
}

impl ApiGitRef {
    pub(crate) fn tag_name(&self) -> &str {
        self.reference
            .strip_prefix("refs/tags/")
            .unwrap_or(&self.reference)
    }
}

impl From<ApiContentEntry> for DirEntry {
    fn from(value: ApiContentEntry) -> Self {
        let kind = match value.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            _ => EntryKind::Other,
        };
        Self {
            name: value.name,
            path: value.path,
            kind,
        }
    }
}

impl TryFrom<ApiContents> for Contents {
    type Error = ReleaseError;

    fn try_from(value: ApiContents) -> Result<Self, Self::Error> {
        match value {
            ApiContents::Directory(entries) => Ok(Self::Directory(
                entries.into_iter().map(DirEntry::from).collect(),
            )),
            ApiContents::File(entry) => {
                let text = decode_content(&entry)?;
                Ok(Self::File {
                    path: entry.path,
                    text,
                })
            }
        }
    }
}

fn decode_content(entry: &ApiContentEntry) -> Result<String, ReleaseError> {
    let raw = entry.content.as_deref().unwrap_or_default();
    match entry.encoding.as_deref() {
        Some("base64") => {
            let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            let bytes = STANDARD
                .decode(compact)
                .map_err(|error| ReleaseError::malformed(&entry.path, error.to_string()))?;
            String::from_utf8(bytes)
                .map_err(|_| ReleaseError::malformed(&entry.path, "file is not valid UTF-8"))
        }
        Some("") | None => Ok(raw.to_owned()),
        Some(other) => Err(ReleaseError::malformed(
            &entry.path,
            format!("unsupported content encoding `{other}`"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::{ApiContents, ApiGitRef, ApiIssue, Contents, EntryKind, Issue};
    use crate::error::ReleaseError;

    #[test]
    fn issue_with_pull_link_converts_into_merged_pull_request() {
        let value = json!({
            "number": 123,
            "title": "Fix panic",
            "body": "Release note\n- fixed a panic",
            "state": "closed",
            "labels": [{ "name": "type/bugfix" }, { "name": "sig/planner" }],
            "user": { "login": "octocat" },
            "html_url": "https://github.com/pingcap/tidb/pull/123",
            "pull_request": {
                "merged_at": "2021-04-07T10:00:00Z",
                "html_url": "https://github.com/pingcap/tidb/pull/123"
            }
        });
        let api: ApiIssue = serde_json::from_value(value).expect("ApiIssue should deserialise");
        let pull = Issue::from(api)
            .into_pull_request()
            .expect("issue should be a pull request");

        assert_eq!(pull.number, 123);
        assert_eq!(pull.labels, vec!["type/bugfix", "sig/planner"]);
        assert_eq!(pull.author.as_deref(), Some("octocat"));
        assert!(pull.is_merged());
        assert_eq!(pull.base_ref, None);
    }

    #[test]
    fn unmerged_pull_link_is_not_merged() {
        let value = json!({
            "number": 5,
            "title": "WIP",
            "pull_request": { "merged_at": null, "html_url": null }
        });
        let api: ApiIssue = serde_json::from_value(value).expect("ApiIssue should deserialise");
        let pull = Issue::from(api)
            .into_pull_request()
            .expect("issue should be a pull request");
        assert!(!pull.is_merged());
    }

    #[test]
    fn plain_issue_is_returned_unchanged() {
        let issue = Issue {
            number: 9,
            title: "Bug".to_owned(),
            ..Issue::default()
        };
        let result = issue.clone().into_pull_request();
        assert_eq!(result, Err(issue));
    }

    #[test]
    fn decodes_base64_file_contents() {
        let value = json!({
            "name": "v5.0.0.md",
            "path": "releases/v5.0.0.md",
            "type": "file",
            "content": "IyBUaURC\nIGNoYW5n\nZXM=\n",
            "encoding": "base64"
        });
        let api: ApiContents = serde_json::from_value(value).expect("contents should deserialise");
        let contents = Contents::try_from(api).expect("contents should decode");
        assert_eq!(
            contents,
            Contents::File {
                path: "releases/v5.0.0.md".to_owned(),
                text: "# TiDB changes".to_owned(),
            }
        );
    }

    #[test]
    fn directory_listing_maps_entry_kinds() {
        let value = json!([
            { "name": "go.mod", "path": "go.mod", "type": "file" },
            { "name": "cmd", "path": "cmd", "type": "dir" },
            { "name": "docs", "path": "docs", "type": "submodule" }
        ]);
        let api: ApiContents = serde_json::from_value(value).expect("contents should deserialise");
        let Ok(Contents::Directory(entries)) = Contents::try_from(api) else {
            panic!("expected a directory listing");
        };
        let kinds: Vec<EntryKind> = entries.iter().map(|entry| entry.kind).collect();
        assert_eq!(kinds, vec![EntryKind::File, EntryKind::Dir, EntryKind::Other]);
    }

    #[rstest]
    #[case::bad_base64("!!!", "base64")]
    #[case::unknown_encoding("abc", "rot13")]
    fn rejects_undecodable_contents(#[case] content: &str, #[case] encoding: &str) {
        let value = json!({
            "name": "a.md",
            "path": "a.md",
            "type": "file",
            "content": content,
            "encoding": encoding
        });
        let api: ApiContents = serde_json::from_value(value).expect("contents should deserialise");
        assert!(matches!(
            Contents::try_from(api),
            Err(ReleaseError::MalformedInput { .. })
        ));
    }

    #[rstest]
    #[case("refs/tags/v5.0.0", "v5.0.0")]
    #[case("refs/heads/master", "refs/heads/master")]
    fn strips_tag_ref_prefix(#[case] reference: &str, #[case] expected: &str) {
        let git_ref = ApiGitRef {
            reference: reference.to_owned(),
        };
        assert_eq!(git_ref.tag_name(), expected);
    }
}
