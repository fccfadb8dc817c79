//! Fetching manifests from repository roots.

use tracing::debug;

use crate::error::{ReleaseError, ResultExt};
use crate::github::{ContentGateway, Contents, DirEntry, EntryKind, RepoRef};

use super::{ManifestKind, Package, parse_manifest};

/// Reads the manifests of a repository at a release through a
/// [`ContentGateway`].
pub struct ManifestCollector<'client, Gateway>
where
    Gateway: ContentGateway + ?Sized,
{
    client: &'client Gateway,
}

impl<'client, Gateway> ManifestCollector<'client, Gateway>
where
    Gateway: ContentGateway + ?Sized,
{
    /// Creates a collector using the provided gateway.
    #[must_use]
    pub const fn new(client: &'client Gateway) -> Self {
        Self { client }
    }

    /// Manifests in the root of `repo` at `version`.
    ///
    /// `version` is used as the ref directly; when no such ref exists the
    /// first tag matching the version without its `v` is used, then the
    /// first tag matching the version without its last component.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::NotFound`] when no ref matches,
    /// [`ReleaseError::MalformedInput`] for unparseable manifests, and
    /// propagates gateway failures.
    pub async fn packages(
        &self,
        repo: &RepoRef,
        version: &str,
    ) -> Result<Vec<Package>, ReleaseError> {
        let (reference, entries) = self.root_listing(repo, version).await?;

        let mut packages = Vec::new();
        for entry in entries.iter().filter(|entry| entry.kind == EntryKind::File) {
            let Some(kind) = ManifestKind::from_file_name(&entry.name) else {
                continue;
            };
            let fetched = self
                .client
                .contents(repo, &entry.path, Some(&reference))
                .await
                .with_context(|| format!("{repo}@{reference}: fetch {}", entry.path))?;
            let Some(Contents::File { text, .. }) = fetched else {
                return Err(ReleaseError::NotFound {
                    resource: format!("{} in {repo}@{reference}", entry.path),
                });
            };
            packages.push(
                parse_manifest(kind, repo, &text)
                    .with_context(|| format!("{repo}@{reference}: {}", entry.path))?,
            );
        }
        debug!(%repo, %reference, manifests = packages.len(), "collected manifests");
        Ok(packages)
    }

    async fn root_listing(
        &self,
        repo: &RepoRef,
        version: &str,
    ) -> Result<(String, Vec<DirEntry>), ReleaseError> {
        if let Some(entries) = self.directory(repo, version).await? {
            return Ok((version.to_owned(), entries));
        }
        let tag = self.tag_for(repo, version).await?;
        debug!(%repo, version, %tag, "using matching tag");
        let entries = self
            .directory(repo, &tag)
            .await?
            .ok_or_else(|| ReleaseError::NotFound {
                resource: format!("root of {repo}@{tag}"),
            })?;
        Ok((tag, entries))
    }

    async fn directory(
        &self,
        repo: &RepoRef,
        reference: &str,
    ) -> Result<Option<Vec<DirEntry>>, ReleaseError> {
        let listing = self
            .client
            .contents(repo, "", Some(reference))
            .await
            .with_context(|| format!("{repo}@{reference}: list root"))?;
        match listing {
            None => Ok(None),
            Some(Contents::Directory(entries)) => Ok(Some(entries)),
            Some(Contents::File { path, .. }) => Err(ReleaseError::malformed(
                path,
                "repository root is not a directory",
            )),
        }
    }

    async fn tag_for(&self, repo: &RepoRef, version: &str) -> Result<String, ReleaseError> {
        let bare = version.trim_start_matches('v');
        let shortened = bare.rsplit_once('.').map(|(head, _)| head);
        for candidate in std::iter::once(bare).chain(shortened) {
            for prefix in [candidate.to_owned(), format!("v{candidate}")] {
                let tags = self
                    .client
                    .matching_tags(repo, &prefix)
                    .await
                    .with_context(|| format!("{repo}: list tags {prefix}"))?;
                if let Some(tag) = tags.into_iter().next() {
                    return Ok(tag);
                }
            }
        }
        Err(ReleaseError::NotFound {
            resource: format!("tag matching {version} in {repo}"),
        })
    }
}
