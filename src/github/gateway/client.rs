//! Octocrab client construction and the timeout-bounded call wrapper shared
//! by every gateway operation.

use std::future::Future;
use std::time::Duration;

use http::Uri;
use octocrab::Octocrab;

use crate::error::ReleaseError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds an Octocrab client for the given token and API base URL.
///
/// # Errors
///
/// Returns `ReleaseError::InvalidUrl` when the base URI cannot be parsed or
/// `ReleaseError::Api` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, ReleaseError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| ReleaseError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(base_uri)
        .map_err(|error| ReleaseError::Api {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}

/// Octocrab-backed implementation of every GitHub gateway trait.
#[derive(Clone)]
pub struct OctocrabGateway {
    pub(super) client: Octocrab,
    timeout: Duration,
}

impl OctocrabGateway {
    /// Creates a gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Builds an authenticated gateway for the given API base.
    ///
    /// # Errors
    ///
    /// Returns `ReleaseError::InvalidUrl` when the base URI cannot be parsed or
    /// `ReleaseError::Api` when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, ReleaseError> {
        let client = build_octocrab_client(token, api_base)?;
        Ok(Self::new(client, timeout))
    }

    /// Runs `request` under the configured timeout without mapping the
    /// Octocrab error, for callers that need to inspect it.
    pub(super) async fn timed<T, F>(
        &self,
        operation: &str,
        request: F,
    ) -> Result<Result<T, octocrab::Error>, ReleaseError>
    where
        F: Future<Output = Result<T, octocrab::Error>> + Send,
    {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| ReleaseError::Timeout {
                operation: operation.to_owned(),
                seconds: self.timeout.as_secs(),
            })
    }

    /// Runs `request` under the configured timeout and maps failures.
    pub(super) async fn call<T, F>(&self, operation: &str, request: F) -> Result<T, ReleaseError>
    where
        F: Future<Output = Result<T, octocrab::Error>> + Send,
    {
        self.timed(operation, request)
            .await?
            .map_err(|error| map_octocrab_error(operation, &error))
    }
}

impl std::fmt::Debug for OctocrabGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabGateway")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
