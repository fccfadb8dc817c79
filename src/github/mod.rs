//! GitHub access for the release pipeline.
//!
//! This module wraps Octocrab behind small gateway traits for milestones,
//! issues, repository contents and pull requests. Errors are mapped into
//! [`crate::ReleaseError`] variants so callers never see Octocrab internals.

pub mod gateway;
pub mod locator;
pub mod models;
pub mod pagination;

pub use gateway::{ContentGateway, IssueGateway, OctocrabGateway, RepositoryGateway};
pub use locator::{PersonalAccessToken, RepoRef};
pub use models::{
    Contents, CreatedPullRequest, DirEntry, EntryKind, Issue, Milestone, MilestoneState,
    NewPullRequest, PullRequest,
};
pub use pagination::PageRequest;

#[cfg(test)]
pub use gateway::{MockIssueGateway, MockRepositoryGateway};
