//! Merging extracted release notes into a document.

use tracing::{debug, info, warn};

use crate::error::ReleaseError;
use crate::github::{IssueGateway, PullRequest, RepoRef};

use super::document::{MergeOutcome, ReleaseNote, ReleaseNoteDocument};
use super::extract::extract_release_note;
use super::milestone::MilestoneResolver;
use super::product::Product;
use super::version::release_branch;

/// What one assembly pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Notes that were not in the document before.
    pub added: usize,
    /// Notes whose text or category was refreshed.
    pub updated: usize,
    /// Repositories without a usable milestone for the version.
    pub skipped: Vec<RepoRef>,
}

/// Pulls merged pull requests of every product repository and merges their
/// notes into a document.
pub struct ReleaseNoteAssembler<'client, Gateway>
where
    Gateway: IssueGateway + ?Sized,
{
    resolver: MilestoneResolver<'client, Gateway>,
}

impl<'client, Gateway> ReleaseNoteAssembler<'client, Gateway>
where
    Gateway: IssueGateway + ?Sized,
{
    /// Creates an assembler using the provided gateway.
    #[must_use]
    pub const fn new(client: &'client Gateway) -> Self {
        Self {
            resolver: MilestoneResolver::new(client),
        }
    }

    /// Adds or refreshes the notes of `product` at `version` in `document`.
    ///
    /// Only merged pull requests targeting the release branch of `version`
    /// contribute. Repositories lacking the milestone are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MalformedInput`] when `version` has no
    /// numeric major component and propagates gateway failures other than
    /// a missing milestone.
    pub async fn assemble(
        &self,
        product: &Product,
        version: &str,
        document: &mut ReleaseNoteDocument,
    ) -> Result<AssemblyReport, ReleaseError> {
        let mut report = AssemblyReport::default();
        if product.repos().is_empty() {
            return Ok(report);
        }
        let base_ref = release_branch(version)?;

        for repo in product.repos() {
            let pulls = match self.release_pulls(repo, version, &base_ref).await {
                Ok(pulls) => pulls,
                Err(error) if error.is_not_found() => {
                    warn!(%repo, version, %error, "skipping repository without milestone");
                    report.skipped.push(repo.clone());
                    continue;
                }
                Err(error) => return Err(error),
            };
            merge_pulls(product, repo, pulls, document, &mut report);
        }

        for repo in document.unplaced_repos() {
            warn!(%repo, product = product.name(), "notes are not placed in the product structure");
        }
        info!(
            product = product.name(),
            version,
            added = report.added,
            updated = report.updated,
            skipped = report.skipped.len(),
            "assembled release notes"
        );
        Ok(report)
    }

    async fn release_pulls(
        &self,
        repo: &RepoRef,
        version: &str,
        base_ref: &str,
    ) -> Result<Vec<PullRequest>, ReleaseError> {
        let milestone = self.resolver.resolve(repo, version).await?;
        self.resolver.merged_pulls(repo, &milestone, base_ref).await
    }
}

fn merge_pulls(
    product: &Product,
    repo: &RepoRef,
    pulls: Vec<PullRequest>,
    document: &mut ReleaseNoteDocument,
    report: &mut AssemblyReport,
) {
    for pull in pulls {
        let Some(text) = pull.body.as_deref().and_then(extract_release_note) else {
            debug!(%repo, pull = pull.number, "no release note");
            continue;
        };
        let category = product.category_for(&pull.labels);
        let note = ReleaseNote {
            repo: repo.clone(),
            pull_number: pull.number,
            text,
        };
        match document.upsert(category, note, product.rename_of(repo).cloned()) {
            MergeOutcome::Added => report.added += 1,
            MergeOutcome::Updated => report.updated += 1,
        }
    }
}
