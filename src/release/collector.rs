//! Loading previously published release notes from the documentation
//! repository.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use tracing::{debug, info};

use crate::error::{ReleaseError, ResultExt};
use crate::github::{ContentGateway, Contents, RepoRef};

use super::document::ReleaseNoteDocument;
use super::version::document_file_name;

/// Where release-note documents live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsLocation {
    /// Documentation repository.
    pub repo: RepoRef,
    /// Directory template with `{product}` and optional `{lang}`
    /// placeholders.
    pub path_template: String,
    /// Languages to load, in report order.
    pub languages: Vec<String>,
    /// Branch or tag to read from; the default branch when `None`.
    pub reference: Option<String>,
}

impl DocsLocation {
    /// Path of the document for `product` in `language` at `version`.
    ///
    /// ```
    /// use releaser::github::RepoRef;
    /// use releaser::release::DocsLocation;
    ///
    /// let docs = DocsLocation {
    ///     repo: RepoRef::parse("pingcap/docs").expect("valid slug"),
    ///     path_template: "{lang}/releases/{product}".to_owned(),
    ///     languages: vec!["en".to_owned()],
    ///     reference: None,
    /// };
    /// assert_eq!(docs.document_path("tidb", "en", "v5.0.0"), "en/releases/tidb/5.0.0.md");
    /// ```
    #[must_use]
    pub fn document_path(&self, product: &str, language: &str, version: &str) -> String {
        let directory = self
            .path_template
            .replace("{product}", product)
            .replace("{lang}", language);
        Utf8PathBuf::from(directory)
            .join(document_file_name(version))
            .into_string()
    }
}

/// Reads published documents through a [`ContentGateway`].
pub struct NoteCollector<'client, Gateway>
where
    Gateway: ContentGateway + ?Sized,
{
    client: &'client Gateway,
    docs: &'client DocsLocation,
}

impl<'client, Gateway> NoteCollector<'client, Gateway>
where
    Gateway: ContentGateway + ?Sized,
{
    /// Creates a collector reading from `docs`.
    #[must_use]
    pub const fn new(client: &'client Gateway, docs: &'client DocsLocation) -> Self {
        Self { client, docs }
    }

    /// Published documents of `product` at `version`, keyed by language.
    ///
    /// Languages without a published document are left out.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MalformedInput`] when a document path names a
    /// directory or its content cannot be parsed, and propagates gateway
    /// failures.
    pub async fn published(
        &self,
        product: &str,
        version: &str,
    ) -> Result<BTreeMap<String, ReleaseNoteDocument>, ReleaseError> {
        let mut documents = BTreeMap::new();
        for language in &self.docs.languages {
            let path = self.docs.document_path(product, language, version);
            let fetched = self
                .client
                .contents(&self.docs.repo, &path, self.docs.reference.as_deref())
                .await
                .with_context(|| format!("{}: fetch {path}", self.docs.repo))?;

            let text = match fetched {
                None => {
                    debug!(%path, language, "no published document");
                    continue;
                }
                Some(Contents::Directory(_)) => {
                    return Err(ReleaseError::malformed(path, "expected a file, found a directory"));
                }
                Some(Contents::File { text, .. }) => text,
            };

            let document = ReleaseNoteDocument::new(product, language.as_str(), path.as_str(), version)
                .parse(&text)
                .with_context(|| format!("parse {path}"))?;
            info!(%path, notes = document.note_count(), "loaded published document");
            documents.insert(language.clone(), document);
        }
        Ok(documents)
    }
}
