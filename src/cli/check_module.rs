//! `check-module`: dependency versions that disagree across repositories.

use std::io::Write;

use crate::error::ReleaseError;
use crate::github::{ContentGateway, RepoRef};
use crate::manifest::{ManifestCollector, find_conflicts};

use super::output::io_error;

const SEPARATOR: &str = "-----------------------";

/// Writes every manifest found at `version`, a separator, then one line per
/// conflicting dependency: `name | first-repo: v1, repo: v2`.
///
/// # Errors
///
/// Propagates manifest collection failures, including a repository with no
/// ref matching `version`, and returns [`ReleaseError::Io`] if writing fails.
pub async fn write_module_check<G, W>(
    client: &G,
    repos: &[RepoRef],
    version: &str,
    writer: &mut W,
) -> Result<(), ReleaseError>
where
    G: ContentGateway + ?Sized,
    W: Write,
{
    let collector = ManifestCollector::new(client);
    let mut packages = Vec::new();
    for repo in repos {
        packages.extend(collector.packages(repo, version).await?);
    }

    for package in &packages {
        writeln!(
            writer,
            "{} {}: {}",
            package.repo,
            package.kind.file_name(),
            package.name
        )
        .map_err(|e| io_error(&e))?;
    }
    writeln!(writer, "{SEPARATOR}").map_err(|e| io_error(&e))?;

    for conflict in find_conflicts(&packages) {
        writeln!(
            writer,
            "{} | {}: {}, {}: {}",
            conflict.name, conflict.first_repo, conflict.first_version, conflict.repo, conflict.version
        )
        .map_err(|e| io_error(&e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::ReleaseError;
    use crate::test_support::{FakeGitHub, repo};

    use super::write_module_check;

    const TIDB_GO_MOD: &str = "\
module github.com/pingcap/tidb

require (
\tgithub.com/pingcap/kvproto v0.0.0-20210402
\tgithub.com/pingcap/errors v0.11.4
)
";

    const PD_GO_MOD: &str = "\
module github.com/tikv/pd

require github.com/pingcap/kvproto v0.0.0-20210331 // indirect
";

    #[tokio::test]
    async fn lists_manifests_then_conflicts() {
        let client = FakeGitHub::new("bot")
            .with_file(&repo("pingcap/tidb"), "v5.0.0", "go.mod", TIDB_GO_MOD)
            .with_file(&repo("pingcap/tidb"), "v5.0.0", "README.md", "# TiDB")
            .with_file(&repo("tikv/pd"), "v5.0.0", "go.mod", PD_GO_MOD);
        let repos = [repo("pingcap/tidb"), repo("tikv/pd")];

        let mut buffer = Vec::new();
        write_module_check(&client, &repos, "v5.0.0", &mut buffer)
            .await
            .expect("check should succeed");

        let output = String::from_utf8(buffer).expect("output should be valid UTF-8");
        assert_eq!(
            output,
            "\
pingcap/tidb go.mod: github.com/pingcap/tidb
tikv/pd go.mod: github.com/tikv/pd
-----------------------
github.com/pingcap/kvproto | pingcap/tidb: v0.0.0-20210402, tikv/pd: v0.0.0-20210331
"
        );
    }

    #[tokio::test]
    async fn missing_release_ref_fails_the_check() {
        let client = FakeGitHub::new("bot");
        let repos = [repo("pingcap/tidb")];

        let mut buffer = Vec::new();
        let error = write_module_check(&client, &repos, "v5.0.0", &mut buffer)
            .await
            .expect_err("check should fail");

        assert!(matches!(error.root(), ReleaseError::NotFound { .. }));
        assert!(buffer.is_empty());
    }
}
