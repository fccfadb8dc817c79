//! Gateways for talking to GitHub through Octocrab.
//!
//! The traits are the seams the release pipeline depends on; tests swap in
//! mocks while [`OctocrabGateway`] performs real HTTP requests. Every call is
//! bounded by the gateway timeout.

mod client;
mod contents;
mod error_mapping;
mod issues;
mod repository;

pub use client::{DEFAULT_TIMEOUT, OctocrabGateway};

use async_trait::async_trait;

use crate::error::ReleaseError;
use crate::github::locator::RepoRef;
use crate::github::models::{
    Contents, CreatedPullRequest, Issue, Milestone, MilestoneState, NewPullRequest,
};
use crate::github::pagination::PageRequest;

/// Gateway for milestone and issue listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueGateway: Send + Sync {
    /// List one page of milestones in the given state.
    async fn list_milestones(
        &self,
        repo: &RepoRef,
        state: MilestoneState,
        page: PageRequest,
    ) -> Result<Vec<Milestone>, ReleaseError>;

    /// List one page of issues and pull requests attached to a milestone.
    async fn list_milestone_issues(
        &self,
        repo: &RepoRef,
        milestone: u64,
        page: PageRequest,
    ) -> Result<Vec<Issue>, ReleaseError>;
}

/// Gateway for repository file contents and tags.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Fetch a file or directory listing; `None` when the path does not
    /// exist at `reference`.
    async fn contents(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Option<Contents>, ReleaseError>;

    /// Tag names starting with `prefix`.
    async fn matching_tags(&self, repo: &RepoRef, prefix: &str)
    -> Result<Vec<String>, ReleaseError>;
}

/// Gateway for account, fork and pull request operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryGateway: Send + Sync {
    /// Login of the user owning the token.
    async fn authenticated_login(&self) -> Result<String, ReleaseError>;

    /// Whether the repository exists and is visible to the token.
    async fn repository_exists(&self, repo: &RepoRef) -> Result<bool, ReleaseError>;

    /// Fork the repository into the authenticated account.
    async fn fork(&self, repo: &RepoRef) -> Result<(), ReleaseError>;

    /// Open a pull request; `None` when an equivalent one is already open.
    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<Option<CreatedPullRequest>, ReleaseError>;
}
