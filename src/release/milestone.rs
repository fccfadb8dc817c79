//! Milestone lookup and merged pull request listing.

use tracing::debug;

use crate::error::{ReleaseError, ResultExt};
use crate::github::pagination::{MAX_PER_PAGE, collect_pages};
use crate::github::{IssueGateway, Issue, Milestone, MilestoneState, PullRequest, RepoRef};

/// Version value selecting every open milestone.
pub const ALL_MILESTONES: &str = "all";

/// Which milestones a run processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MilestoneTarget {
    /// Every open milestone of the primary repository.
    All,
    /// The milestone whose title contains the version.
    Version(String),
}

impl MilestoneTarget {
    /// Interprets the user-supplied version string.
    #[must_use]
    pub fn from_version(version: &str) -> Self {
        let trimmed = version.trim();
        if trimmed == ALL_MILESTONES {
            Self::All
        } else {
            Self::Version(trimmed.to_owned())
        }
    }

    /// The concrete version, or `None` for every open milestone.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Version(version) => Some(version.as_str()),
            Self::All => None,
        }
    }
}

/// Issues and pull requests attached to a milestone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneContents {
    /// Plain issues.
    pub issues: Vec<Issue>,
    /// Pull requests rebuilt from their issue records.
    pub pulls: Vec<PullRequest>,
}

/// Resolves milestones and their pull requests through an [`IssueGateway`].
pub struct MilestoneResolver<'client, Gateway>
where
    Gateway: IssueGateway + ?Sized,
{
    client: &'client Gateway,
}

impl<'client, Gateway> MilestoneResolver<'client, Gateway>
where
    Gateway: IssueGateway + ?Sized,
{
    /// Create a resolver using the provided gateway.
    #[must_use]
    pub const fn new(client: &'client Gateway) -> Self {
        Self { client }
    }

    /// Every milestone of `repo` in `state`, across all pages.
    ///
    /// # Errors
    ///
    /// Propagates gateway failures.
    pub async fn milestones(
        &self,
        repo: &RepoRef,
        state: MilestoneState,
    ) -> Result<Vec<Milestone>, ReleaseError> {
        let client = self.client;
        collect_pages(MAX_PER_PAGE, move |page| {
            client.list_milestones(repo, state, page)
        })
        .await
        .with_context(|| format!("{repo}: list milestones"))
    }

    /// First milestone whose title contains `version`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::NotFound`] when no title matches and
    /// propagates gateway failures.
    pub async fn resolve(&self, repo: &RepoRef, version: &str) -> Result<Milestone, ReleaseError> {
        let needle = version.to_lowercase();
        self.milestones(repo, MilestoneState::All)
            .await?
            .into_iter()
            .find(|milestone| milestone.title.to_lowercase().contains(&needle))
            .ok_or_else(|| ReleaseError::NotFound {
                resource: format!("milestone {version} in {repo}"),
            })
    }

    /// Milestones selected by `target`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve`] and [`Self::milestones`].
    pub async fn resolve_target(
        &self,
        repo: &RepoRef,
        target: &MilestoneTarget,
    ) -> Result<Vec<Milestone>, ReleaseError> {
        match target {
            MilestoneTarget::All => self.milestones(repo, MilestoneState::Open).await,
            MilestoneTarget::Version(version) => Ok(vec![self.resolve(repo, version).await?]),
        }
    }

    /// Issues and pull requests in `milestone`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::InvalidMilestone`] when the milestone has id
    /// 0 and propagates gateway failures.
    pub async fn milestone_contents(
        &self,
        repo: &RepoRef,
        milestone: &Milestone,
    ) -> Result<MilestoneContents, ReleaseError> {
        if milestone.id == 0 {
            return Err(ReleaseError::InvalidMilestone {
                repo: repo.to_string(),
                title: milestone.title.clone(),
            });
        }

        let client = self.client;
        let number = milestone.number;
        let records = collect_pages(MAX_PER_PAGE, move |page| {
            client.list_milestone_issues(repo, number, page)
        })
        .await
        .with_context(|| format!("{repo} {}: list issues", milestone.title))?;

        let mut contents = MilestoneContents::default();
        for record in records {
            match record.into_pull_request() {
                Ok(pull) => contents.pulls.push(pull),
                Err(issue) => contents.issues.push(issue),
            }
        }
        debug!(
            %repo,
            milestone = %milestone.title,
            issues = contents.issues.len(),
            pulls = contents.pulls.len(),
            "loaded milestone contents"
        );
        Ok(contents)
    }

    /// Merged pull requests in `milestone` targeting `base_ref`.
    ///
    /// Pull requests whose base branch is unknown are kept.
    ///
    /// # Errors
    ///
    /// Same as [`Self::milestone_contents`].
    pub async fn merged_pulls(
        &self,
        repo: &RepoRef,
        milestone: &Milestone,
        base_ref: &str,
    ) -> Result<Vec<PullRequest>, ReleaseError> {
        let contents = self.milestone_contents(repo, milestone).await?;
        Ok(contents
            .pulls
            .into_iter()
            .filter(|pull| targets_branch(pull, base_ref))
            .collect())
    }
}

fn targets_branch(pull: &PullRequest, base_ref: &str) -> bool {
    pull.is_merged() && pull.base_ref.as_deref().is_none_or(|base| base == base_ref)
}
