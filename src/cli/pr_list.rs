//! `pr-list`: pull requests in a milestone across repositories.

use std::io::Write;

use tracing::warn;

use crate::error::ReleaseError;
use crate::github::{IssueGateway, PullRequest, RepoRef};
use crate::release::MilestoneResolver;

use super::output::{io_error, status_table, write_table};

/// Writes one table row per pull request in the `version` milestone of
/// every repository, then the repositories without that milestone.
///
/// # Errors
///
/// Propagates gateway failures other than a missing or invalid milestone,
/// and returns [`ReleaseError::Io`] if writing fails.
pub async fn write_pr_list<G, W>(
    client: &G,
    repos: &[RepoRef],
    version: &str,
    writer: &mut W,
) -> Result<(), ReleaseError>
where
    G: IssueGateway + ?Sized,
    W: Write,
{
    let resolver = MilestoneResolver::new(client);
    let mut table = status_table(["Repo", "PR", "Author", "Title"]);
    let mut missing = Vec::new();

    for repo in repos {
        let pulls = match milestone_pulls(&resolver, repo, version).await {
            Ok(pulls) => pulls,
            Err(error) if error.is_not_found() => {
                warn!(%repo, version, "milestone not found");
                missing.push(repo.to_string());
                continue;
            }
            Err(error) => return Err(error),
        };

        for pull in pulls {
            table.add_row(vec![
                repo.to_string(),
                pull.number.to_string(),
                pull.author.unwrap_or_default(),
                pull.title,
            ]);
        }
    }

    write_table(&table, writer)?;
    if !missing.is_empty() {
        writeln!(writer, "No milestone repos: {}", missing.join(", ")).map_err(|e| io_error(&e))?;
    }
    Ok(())
}

async fn milestone_pulls<G>(
    resolver: &MilestoneResolver<'_, G>,
    repo: &RepoRef,
    version: &str,
) -> Result<Vec<PullRequest>, ReleaseError>
where
    G: IssueGateway + ?Sized,
{
    let milestone = resolver.resolve(repo, version).await?;
    Ok(resolver.milestone_contents(repo, &milestone).await?.pulls)
}
