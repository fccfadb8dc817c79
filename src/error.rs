//! Error types shared by every layer of the release-note pipeline.

use thiserror::Error;

/// Errors surfaced while loading configuration, talking to GitHub, parsing
/// published documents or driving the local working tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReleaseError {
    /// A milestone, document or repository does not exist.
    #[error("not found: {resource}")]
    NotFound {
        /// Human-readable description of the missing resource.
        resource: String,
    },

    /// GitHub returned a milestone without an identifier.
    #[error("milestone `{title}` in {repo} has id 0")]
    InvalidMilestone {
        /// Repository slug the milestone belongs to.
        repo: String,
        /// Milestone title.
        title: String,
    },

    /// Configuration text or a published document could not be parsed.
    #[error("malformed input `{input}`: {reason}")]
    MalformedInput {
        /// The offending text.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No GitHub token was supplied.
    #[error("GitHub token is required")]
    MissingToken,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// A GitHub call did not complete within the configured timeout.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// The operation that was cancelled.
        operation: String,
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// A URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid pagination parameters.
    #[error("invalid pagination: {message}")]
    InvalidPagination {
        /// Description of the invalid parameter.
        message: String,
    },

    /// A git operation on the scratch clone failed.
    #[error("git error: {message}")]
    Git {
        /// Error detail from git2.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// Another error annotated with the repository, version or stage it
    /// happened in.
    #[error("{context}: {source}")]
    Context {
        /// Where the error happened, e.g. `pingcap/tidb v5.0.0: list issues`.
        context: String,
        /// The underlying failure.
        source: Box<ReleaseError>,
    },
}

impl ReleaseError {
    /// Wraps the error with a description of where it happened.
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through context layers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error means the requested resource is absent.
    ///
    /// Milestones with id 0 count as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            Self::NotFound { .. } | Self::InvalidMilestone { .. }
        )
    }

    pub(crate) fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(error: &std::io::Error, what: &str) -> Self {
        Self::Io {
            message: format!("{what}: {error}"),
        }
    }
}

impl From<git2::Error> for ReleaseError {
    fn from(error: git2::Error) -> Self {
        Self::Git {
            message: error.message().to_owned(),
        }
    }
}

/// Extension for attaching context to fallible results.
pub trait ResultExt<T> {
    /// Wraps the error, if any, with the context produced by `context`.
    ///
    /// # Errors
    ///
    /// Returns the original error wrapped in [`ReleaseError::Context`].
    fn with_context<F, S>(self, context: F) -> Result<T, ReleaseError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T, ReleaseError> {
    fn with_context<F, S>(self, context: F) -> Result<T, ReleaseError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|error| error.context(context()))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ReleaseError, ResultExt};

    #[rstest]
    #[case::not_found(ReleaseError::NotFound { resource: "milestone".to_owned() }, true)]
    #[case::invalid_milestone(
        ReleaseError::InvalidMilestone { repo: "o/r".to_owned(), title: "v1".to_owned() },
        true
    )]
    #[case::api(ReleaseError::Api { message: "boom".to_owned() }, false)]
    fn classifies_not_found(#[case] error: ReleaseError, #[case] expected: bool) {
        assert_eq!(error.is_not_found(), expected);
        assert_eq!(error.context("outer").is_not_found(), expected);
    }

    #[test]
    fn context_is_rendered_before_the_cause() {
        let result: Result<(), ReleaseError> = Err(ReleaseError::Timeout {
            operation: "list milestones".to_owned(),
            seconds: 5,
        });
        let error = result
            .with_context(|| "pingcap/tidb v5.0.0")
            .expect_err("error should be preserved");

        assert_eq!(
            error.to_string(),
            "pingcap/tidb v5.0.0: list milestones timed out after 5s"
        );
    }
}
