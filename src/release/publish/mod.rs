//! Proposing assembled release notes to the documentation repository.
//!
//! For each product the publisher resolves the milestones on the primary
//! repository, then for every milestone loads the published document,
//! assembles fresh notes, renders the result and either returns it (dry
//! run) or commits it on a branch of the fork and opens a pull request.

use camino::Utf8Path;
use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::{ReleaseError, ResultExt};
use crate::github::{
    ContentGateway, CreatedPullRequest, IssueGateway, Milestone, NewPullRequest, RepoRef,
    RepositoryGateway,
};
use crate::local::{WorkingTree, WorkingTreeProvider};

use super::assembler::{AssemblyReport, ReleaseNoteAssembler};
use super::collector::{DocsLocation, NoteCollector};
use super::document::ReleaseNoteDocument;
use super::milestone::{MilestoneResolver, MilestoneTarget};
use super::product::Product;
use super::render::render;

const COMMIT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Settings shared by every product of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    /// Where documents are read from and written to.
    pub docs: DocsLocation,
    /// Language of the document that receives new notes.
    pub pull_language: String,
    /// Branch pull requests are opened against.
    pub base_branch: String,
    /// Render only; no commits, pushes or pull requests.
    pub dry_run: bool,
}

/// How a milestone's document was published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Rendered without touching git.
    DryRun {
        /// Document path inside the documentation repository.
        path: String,
        /// Rendered Markdown.
        text: String,
    },
    /// The branch already holds the rendered document.
    Unchanged {
        /// Branch that was checked.
        branch: String,
    },
    /// Changes were pushed and a pull request requested.
    Proposed {
        /// Branch that was pushed.
        branch: String,
        /// The new pull request; `None` when one was already open.
        pull: Option<CreatedPullRequest>,
    },
}

/// Result of publishing one product milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneReport {
    /// Product name.
    pub product: String,
    /// Milestone title.
    pub milestone: String,
    /// Notes added, updated and repositories skipped.
    pub assembly: AssemblyReport,
    /// What happened to the document.
    pub outcome: PublishOutcome,
}

/// Makes sure the authenticated user owns a fork of `upstream`.
///
/// Returns the fork, creating it when it does not exist yet.
///
/// # Errors
///
/// Propagates gateway failures.
pub async fn ensure_fork<Gateway>(
    client: &Gateway,
    upstream: &RepoRef,
) -> Result<RepoRef, ReleaseError>
where
    Gateway: RepositoryGateway + ?Sized,
{
    let login = client.authenticated_login().await?;
    let fork = upstream.with_owner(&login);
    if client.repository_exists(&fork).await? {
        debug!(%fork, "fork already exists");
    } else {
        info!(%upstream, %fork, "forking documentation repository");
        client.fork(upstream).await.with_context(|| format!("fork {upstream}"))?;
    }
    Ok(fork)
}

/// Branch and scratch directory name for a product milestone.
///
/// ```
/// use releaser::release::branch_name;
///
/// assert_eq!(branch_name("TiDB", "v5.0.0"), "TiDB-v5.0.0");
/// assert_eq!(branch_name("TiDB Tools", "v5.0 GA"), "TiDB-Tools-v5.0-GA");
/// ```
#[must_use]
pub fn branch_name(product: &str, milestone: &str) -> String {
    format!("{product}-{milestone}")
        .chars()
        .map(|c| if c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '~' | '^') { '-' } else { c })
        .collect()
}

/// Drives the publication of release notes for products and milestones.
pub struct ReleasePublisher<'a, Gateway, Trees>
where
    Gateway: IssueGateway + ContentGateway + RepositoryGateway + ?Sized,
    Trees: WorkingTreeProvider,
{
    client: &'a Gateway,
    trees: &'a Trees,
    settings: &'a PublishSettings,
    fork: RepoRef,
    now: NaiveDateTime,
}

impl<'a, Gateway, Trees> ReleasePublisher<'a, Gateway, Trees>
where
    Gateway: IssueGateway + ContentGateway + RepositoryGateway + ?Sized,
    Trees: WorkingTreeProvider,
{
    /// Creates a publisher pushing branches to `fork`.
    #[must_use]
    pub fn new(
        client: &'a Gateway,
        trees: &'a Trees,
        settings: &'a PublishSettings,
        fork: RepoRef,
    ) -> Self {
        Self {
            client,
            trees,
            settings,
            fork,
            now: Local::now().naive_local(),
        }
    }

    /// Uses `now` for release dates and commit messages.
    #[must_use]
    pub const fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// Publishes every product in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first product failure.
    pub async fn publish_all(
        &self,
        products: &[Product],
        target: &MilestoneTarget,
    ) -> Result<Vec<MilestoneReport>, ReleaseError> {
        let mut reports = Vec::new();
        for product in products {
            reports.extend(self.publish_product(product, target).await?);
        }
        Ok(reports)
    }

    /// Publishes every milestone `target` selects for `product`.
    ///
    /// All milestones are attempted; the first failure is returned
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Fails when the milestones of the primary repository cannot be
    /// resolved, or with the first milestone failure.
    pub async fn publish_product(
        &self,
        product: &Product,
        target: &MilestoneTarget,
    ) -> Result<Vec<MilestoneReport>, ReleaseError> {
        let Some(primary) = product.primary_repo() else {
            debug!(product = product.name(), "product has no repositories");
            return Ok(Vec::new());
        };
        let milestones = MilestoneResolver::new(self.client)
            .resolve_target(primary, target)
            .await
            .with_context(|| format!("{}: resolve milestones", product.name()))?;

        let mut reports = Vec::new();
        let mut first_error = None;
        for milestone in &milestones {
            let version = target.version().unwrap_or(milestone.title.as_str());
            match self.publish_milestone(product, milestone, version).await {
                Ok(report) => reports.push(report),
                Err(error) => {
                    warn!(product = product.name(), milestone = %milestone.title, %error, "milestone failed");
                    first_error.get_or_insert(error);
                }
            }
        }
        first_error.map_or(Ok(reports), Err)
    }

    /// Assembles, renders and proposes the document of one milestone.
    ///
    /// `version` names the document and selects the milestone of every
    /// product repository; the primary `milestone` title names the branch
    /// and the pull request.
    ///
    /// # Errors
    ///
    /// Propagates gateway, rendering and git failures, annotated with the
    /// product and milestone.
    pub async fn publish_milestone(
        &self,
        product: &Product,
        milestone: &Milestone,
        version: &str,
    ) -> Result<MilestoneReport, ReleaseError> {
        let title = milestone.title.as_str();
        let context = || format!("{} {title}", product.name());

        let mut document = self.load_document(product, version).await.with_context(context)?;
        document.refresh(product);
        let assembly = ReleaseNoteAssembler::new(self.client)
            .assemble(product, version, &mut document)
            .await
            .with_context(context)?;
        let text = render(&document, self.now.date())?;

        let outcome = if self.settings.dry_run {
            PublishOutcome::DryRun {
                path: document.path,
                text,
            }
        } else {
            self.propose(product, title, &document.path, &text)
                .await
                .with_context(context)?
        };

        Ok(MilestoneReport {
            product: product.name().to_owned(),
            milestone: title.to_owned(),
            assembly,
            outcome,
        })
    }

    async fn load_document(
        &self,
        product: &Product,
        version: &str,
    ) -> Result<ReleaseNoteDocument, ReleaseError> {
        let docs = &self.settings.docs;
        let language = self.settings.pull_language.as_str();
        let mut published = NoteCollector::new(self.client, docs)
            .published(product.name(), version)
            .await?;
        Ok(published.remove(language).unwrap_or_else(|| {
            let path = docs.document_path(product.name(), language, version);
            debug!(%path, "starting a new document");
            ReleaseNoteDocument::new(product.name(), language, path, version)
        }))
    }

    async fn propose(
        &self,
        product: &Product,
        title: &str,
        path: &str,
        text: &str,
    ) -> Result<PublishOutcome, ReleaseError> {
        let branch = branch_name(product.name(), title);
        if !self.commit_document(&branch, title, path, text)? {
            info!(%branch, "document unchanged");
            return Ok(PublishOutcome::Unchanged { branch });
        }

        let request = NewPullRequest {
            title: format!("update {} {title} release notes", product.name()),
            head: format!("{}:{branch}", self.fork.owner()),
            base: self.settings.base_branch.clone(),
            body: title.to_owned(),
        };
        let pull = self
            .client
            .create_pull_request(&self.settings.docs.repo, &request)
            .await?;
        let number = pull.as_ref().map(|created| created.number);
        info!(%branch, ?number, "requested pull request");
        Ok(PublishOutcome::Proposed { branch, pull })
    }

    fn commit_document(
        &self,
        branch: &str,
        title: &str,
        path: &str,
        text: &str,
    ) -> Result<bool, ReleaseError> {
        let mut tree = self.trees.open(branch)?;
        if let Err(error) = tree.checkout_existing(branch) {
            debug!(branch, %error, "creating branch");
            tree.checkout_new(branch)?;
        }
        tree.write_file(Utf8Path::new(path), text)?;

        let message = format!(
            "update {title} release notes at {}",
            self.now.format(COMMIT_TIME_FORMAT)
        );
        let changed = tree.commit(&message)?;
        if changed {
            tree.push(branch)?;
        }
        tree.clear()?;
        Ok(changed)
    }
}
