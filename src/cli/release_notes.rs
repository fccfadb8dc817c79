//! `release-notes`: which pull requests carry a note, and which notes are
//! already published.

use std::collections::BTreeMap;
use std::io::Write;

use comfy_table::Table;
use tracing::warn;

use crate::error::ReleaseError;
use crate::github::{ContentGateway, IssueGateway, PullRequest, RepoRef};
use crate::release::{
    DocsLocation, MilestoneResolver, NoteCollector, Product, ReleaseNoteDocument,
    has_release_note,
};

use super::output::{flag, io_error, status_table, write_table};

/// Writes one table per product repository with a row per pull request in
/// the `version` milestone.
///
/// The `Release Note` column flags whether the description carries a note;
/// each language column flags whether that language's published document
/// already lists the pull request. Published documents that fail to load
/// are reported and treated as absent.
///
/// # Errors
///
/// Propagates gateway failures other than a missing or invalid milestone,
/// and returns [`ReleaseError::Io`] if writing fails.
pub async fn write_release_notes<G, W>(
    client: &G,
    products: &[Product],
    docs: &DocsLocation,
    version: &str,
    writer: &mut W,
) -> Result<(), ReleaseError>
where
    G: IssueGateway + ContentGateway + ?Sized,
    W: Write,
{
    let resolver = MilestoneResolver::new(client);
    let collector = NoteCollector::new(client, docs);

    for product in products {
        let documents = match collector.published(product.name(), version).await {
            Ok(documents) => documents,
            Err(error) => {
                warn!(product = product.name(), %error, "published documents unavailable");
                writeln!(writer, "get release notes error {error}").map_err(|e| io_error(&e))?;
                BTreeMap::new()
            }
        };

        for repo in product.repos() {
            let milestone = match resolver.resolve(repo, version).await {
                Ok(milestone) => milestone,
                Err(error) if error.is_not_found() => {
                    writeln!(writer, "can not find milestone {version} in {repo}")
                        .map_err(|e| io_error(&e))?;
                    continue;
                }
                Err(error) => return Err(error),
            };
            let contents = resolver.milestone_contents(repo, &milestone).await?;

            let table = note_table(repo, &contents.pulls, &documents);
            write_table(&table, writer)?;
            writeln!(writer).map_err(|e| io_error(&e))?;
        }
    }
    Ok(())
}

fn note_table(
    repo: &RepoRef,
    pulls: &[PullRequest],
    documents: &BTreeMap<String, ReleaseNoteDocument>,
) -> Table {
    let header = ["Repo", "PR", "Author", "Title", "Release Note"]
        .into_iter()
        .map(str::to_owned)
        .chain(documents.keys().cloned());
    let mut table = status_table(header);

    for pull in pulls {
        let mut row = vec![
            repo.to_string(),
            pull.number.to_string(),
            pull.author.clone().unwrap_or_default(),
            pull.title.clone(),
            flag(pull.body.as_deref().is_some_and(has_release_note)).to_owned(),
        ];
        row.extend(
            documents
                .values()
                .map(|document| flag(document.contains_pull(repo, pull.number)).to_owned()),
        );
        table.add_row(row);
    }
    table
}
