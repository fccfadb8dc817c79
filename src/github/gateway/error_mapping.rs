//! Error mapping helpers for the Octocrab GitHub gateway.

use http::StatusCode;

use crate::error::ReleaseError;

/// Checks if a GitHub error status indicates an authentication failure.
pub(super) const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks for the 422 GitHub returns when a pull request for the same head
/// and base is already open.
pub(super) fn is_pull_request_exists(error: &octocrab::Error) -> bool {
    let octocrab::Error::GitHub { source, .. } = error else {
        return false;
    };
    if source.status_code != StatusCode::UNPROCESSABLE_ENTITY {
        return false;
    }
    let mentions_existing = |text: &str| text.contains("already exists");
    mentions_existing(&source.message)
        || source.errors.as_ref().is_some_and(|errors| {
            errors.iter().any(|value| {
                value
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(mentions_existing)
            })
        })
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> ReleaseError {
    if let octocrab::Error::GitHub { source, .. } = error {
        let status = source.status_code;
        let message = &source.message;
        return if status == StatusCode::NOT_FOUND {
            ReleaseError::NotFound {
                resource: operation.to_owned(),
            }
        } else if is_auth_failure(status) {
            ReleaseError::Authentication {
                message: format!("{operation} failed: GitHub returned {status} {message}"),
            }
        } else {
            ReleaseError::Api {
                message: format!("{operation} failed with status {status}: {message}"),
            }
        };
    }

    if is_network_error(error) {
        return ReleaseError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    ReleaseError::Api {
        message: format!("{operation} failed: {error}"),
    }
}
