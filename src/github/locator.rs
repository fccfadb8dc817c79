//! Repository identity and authentication wrappers.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::ReleaseError;

/// Default public GitHub API endpoint.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// An `owner/name` GitHub repository pair.
///
/// Equality and hashing are structural so the type can key renames and
/// note collections.
///
/// # Example
///
/// ```
/// use releaser::github::RepoRef;
///
/// let repo = RepoRef::parse("pingcap/tidb").expect("slug should parse");
/// assert_eq!(repo.owner(), "pingcap");
/// assert_eq!(repo.name(), "tidb");
/// assert_eq!(repo.pull_url(42), "https://github.com/pingcap/tidb/pull/42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoRef {
    owner: String,
    name: String,
}

impl RepoRef {
    /// Builds a repository reference from its two halves.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MalformedInput`] when either half is empty or
    /// contains a `/`.
    pub fn new(owner: &str, name: &str) -> Result<Self, ReleaseError> {
        let owner = owner.trim();
        let name = name.trim();
        let valid = |part: &str| !part.is_empty() && !part.contains('/');
        if !valid(owner) || !valid(name) {
            return Err(ReleaseError::malformed(
                format!("{owner}/{name}"),
                "repository must be written as owner/name",
            ));
        }
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }

    /// Parses an `owner/name` slug.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MalformedInput`] unless the slug contains
    /// exactly one `/` separating two non-empty halves.
    pub fn parse(slug: &str) -> Result<Self, ReleaseError> {
        let mut parts = slug.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Self::new(owner, name).map_err(|_| {
                ReleaseError::malformed(slug, "repository must be written as owner/name")
            }),
            _ => Err(ReleaseError::malformed(
                slug,
                "repository must be written as owner/name",
            )),
        }
    }

    /// Repository owner (user or organisation).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Browser URL of the repository.
    #[must_use]
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }

    /// Browser URL of a pull request in this repository.
    #[must_use]
    pub fn pull_url(&self, number: u64) -> String {
        format!("{}/pull/{number}", self.html_url())
    }

    /// Same repository name under a different owner, e.g. a fork.
    #[must_use]
    pub fn with_owner(&self, owner: &str) -> Self {
        Self {
            owner: owner.to_owned(),
            name: self.name.clone(),
        }
    }

    pub(crate) fn api_path(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{suffix}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = ReleaseError;

    fn from_str(slug: &str) -> Result<Self, Self::Err> {
        Self::parse(slug)
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MissingToken`] when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, ReleaseError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ReleaseError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PersonalAccessToken(***)")
    }
}

/// Parses and normalises a GitHub API base URL.
///
/// A `github.com` host maps to the public API; any other host without a
/// path is treated as GitHub Enterprise and gets `/api/v3` appended.
///
/// # Errors
///
/// Returns [`ReleaseError::InvalidUrl`] when the value is not an absolute URL
/// with a host.
pub fn parse_api_base(input: &str) -> Result<Url, ReleaseError> {
    let parsed = Url::parse(input).map_err(|error| ReleaseError::InvalidUrl(error.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ReleaseError::InvalidUrl("URL must include a host".to_owned()))?;

    if host.eq_ignore_ascii_case("github.com") {
        return Url::parse(GITHUB_API_BASE)
            .map_err(|error| ReleaseError::InvalidUrl(error.to_string()));
    }

    if parsed.path() == "/" && !host.eq_ignore_ascii_case("api.github.com") && !is_loopback(host)
    {
        let mut enterprise = parsed.clone();
        enterprise.set_path("api/v3");
        return Ok(enterprise);
    }

    Ok(parsed)
}

fn is_loopback(host: &str) -> bool {
    host == "localhost" || host == "127.0.0.1" || host == "[::1]"
}
