//! `generate-release-note`: assemble documents and propose them upstream.

use std::io::Write;

use camino::Utf8Path;

use crate::config::Catalogue;
use crate::error::ReleaseError;
use crate::github::{ContentGateway, IssueGateway, PersonalAccessToken, RepoRef, RepositoryGateway};
use crate::local::{Git2Provider, GitAuthor, GitCredentials};
use crate::release::{
    MilestoneReport, MilestoneTarget, PublishOutcome, ReleasePublisher, ensure_fork,
};

use super::output::io_error;

/// Publishes every catalogue product for `target` and writes one line per
/// milestone, or the rendered documents in dry-run mode.
///
/// Outside dry-run mode the authenticated user's fork of the documentation
/// repository is created first when missing.
///
/// # Errors
///
/// Returns [`ReleaseError::Configuration`] when the catalogue names no
/// documentation repository, propagates the first product failure, and
/// returns [`ReleaseError::Io`] if writing fails.
pub async fn run<G, W>(
    client: &G,
    catalogue: &Catalogue,
    token: &PersonalAccessToken,
    target: &MilestoneTarget,
    dry_run: bool,
    writer: &mut W,
) -> Result<(), ReleaseError>
where
    G: IssueGateway + ContentGateway + RepositoryGateway + ?Sized,
    W: Write,
{
    let settings = catalogue.publish_settings(dry_run)?;
    let upstream = settings.docs.repo.clone();
    let fork = if dry_run {
        upstream.clone()
    } else {
        ensure_fork(client, &upstream).await?
    };

    let trees = git_provider(&catalogue.git_dir, &upstream, &fork, token);
    let reports = ReleasePublisher::new(client, &trees, &settings, fork)
        .publish_all(&catalogue.products, target)
        .await?;
    write_reports(writer, &reports)
}

/// Clones from the upstream documentation repository and pushes to the
/// fork, authenticating as the fork owner.
#[must_use]
pub fn git_provider(
    git_dir: &Utf8Path,
    upstream: &RepoRef,
    fork: &RepoRef,
    token: &PersonalAccessToken,
) -> Git2Provider {
    Git2Provider::new(
        git_dir,
        format!("{}.git", upstream.html_url()),
        format!("{}.git", fork.html_url()),
        GitAuthor::for_login(fork.owner()),
    )
    .with_credentials(GitCredentials::new(fork.owner(), token.clone()))
}

/// Writes what happened to each milestone.
///
/// # Errors
///
/// Returns [`ReleaseError::Io`] if writing fails.
pub fn write_reports<W: Write>(
    writer: &mut W,
    reports: &[MilestoneReport],
) -> Result<(), ReleaseError> {
    for report in reports {
        let label = format!("{} {}", report.product, report.milestone);
        match &report.outcome {
            PublishOutcome::DryRun { text, .. } => writeln!(writer, "{text}"),
            PublishOutcome::Unchanged { branch } => {
                writeln!(writer, "{label}: {branch} is up to date")
            }
            PublishOutcome::Proposed { branch, pull: None } => {
                writeln!(writer, "{label}: pushed {branch}, pull request already open")
            }
            PublishOutcome::Proposed {
                branch,
                pull: Some(pull),
            } => writeln!(
                writer,
                "{label}: pushed {branch}, opened #{} {}",
                pull.number,
                pull.html_url.as_deref().unwrap_or_default()
            ),
        }
        .map_err(|e| io_error(&e))?;

        if !report.assembly.skipped.is_empty() {
            let skipped: Vec<String> = report
                .assembly
                .skipped
                .iter()
                .map(ToString::to_string)
                .collect();
            writeln!(writer, "{label}: no milestone in {}", skipped.join(", "))
                .map_err(|e| io_error(&e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;
    use rstest::rstest;

    use super::{run, write_reports};
    use crate::config::Catalogue;
    use crate::github::{CreatedPullRequest, PersonalAccessToken};
    use crate::release::{AssemblyReport, MilestoneReport, MilestoneTarget, PublishOutcome};
    use crate::test_support::{FakeGitHub, merged_pull, milestone, repo};

    fn report(outcome: PublishOutcome) -> MilestoneReport {
        MilestoneReport {
            product: "TiDB".to_owned(),
            milestone: "v5.0.0".to_owned(),
            assembly: AssemblyReport::default(),
            outcome,
        }
    }

    fn written(reports: &[MilestoneReport]) -> String {
        let mut buffer = Vec::new();
        write_reports(&mut buffer, reports).expect("reports should write");
        String::from_utf8(buffer).expect("output should be valid UTF-8")
    }

    #[rstest]
    #[case::dry_run(
        PublishOutcome::DryRun { path: "a.md".to_owned(), text: "# notes".to_owned() },
        "# notes\n"
    )]
    #[case::unchanged(
        PublishOutcome::Unchanged { branch: "TiDB-v5.0.0".to_owned() },
        "TiDB v5.0.0: TiDB-v5.0.0 is up to date\n"
    )]
    #[case::already_open(
        PublishOutcome::Proposed { branch: "TiDB-v5.0.0".to_owned(), pull: None },
        "TiDB v5.0.0: pushed TiDB-v5.0.0, pull request already open\n"
    )]
    #[case::opened(
        PublishOutcome::Proposed {
            branch: "TiDB-v5.0.0".to_owned(),
            pull: Some(CreatedPullRequest {
                number: 9,
                html_url: Some("https://github.com/pingcap/docs/pull/9".to_owned()),
            }),
        },
        "TiDB v5.0.0: pushed TiDB-v5.0.0, opened #9 https://github.com/pingcap/docs/pull/9\n"
    )]
    fn describes_outcomes(#[case] outcome: PublishOutcome, #[case] expected: &str) {
        assert_eq!(written(&[report(outcome)]), expected);
    }

    #[test]
    fn lists_skipped_repositories() {
        let mut skipped = report(PublishOutcome::Unchanged {
            branch: "b".to_owned(),
        });
        skipped.assembly.skipped = vec![repo("pingcap/pd"), repo("pingcap/br")];

        assert!(written(&[skipped]).ends_with("TiDB v5.0.0: no milestone in pingcap/pd, pingcap/br\n"));
    }

    #[tokio::test]
    async fn dry_run_prints_documents_without_forking() {
        let tidb = repo("pingcap/tidb");
        let client = FakeGitHub::new("bot")
            .with_milestone(&tidb, milestone(11, 3, "v5.0.0"))
            .with_issue(&tidb, 3, merged_pull(101, "Release note\n- fix a panic", &["type/bug"]));
        let catalogue = Catalogue::parse(
            r#"
release-note-repo = "pingcap/docs"
release-note-path = "releases/{product}"
git-dir = "/nonexistent"

[[product]]
name = "TiDB"
repos = ["pingcap/tidb"]
labels = { "type/bug" = "Bug Fixes" }
"#,
        )
        .expect("catalogue should parse");
        let token = PersonalAccessToken::new("ghp_test").expect("token should be valid");

        let mut buffer = Vec::new();
        run(
            &client,
            &catalogue,
            &token,
            &MilestoneTarget::from_version("v5.0.0"),
            true,
            &mut buffer,
        )
        .await
        .expect("dry run should succeed");

        let output = String::from_utf8(buffer).expect("output should be valid UTF-8");
        assert!(output.contains("title: TiDB v5.0.0 Release Notes"));
        assert!(output.contains("    - Fix a panic [#101](https://github.com/pingcap/tidb/pull/101)"));
        assert!(client.recorded_forks().is_empty());
        assert!(!Utf8Path::new("/nonexistent").exists());
    }
}
