//! Invocation settings and the product catalogue.
//!
//! Two sources configure a run. [`ReleaserConfig`] holds the invocation
//! settings, merged by ortho-config from (lowest to highest precedence)
//! defaults, `.releaser.toml`, `RELEASER_*` environment variables and
//! command-line flags. The [`Catalogue`] is the TOML file named by
//! `catalogue`; it describes the repositories, the documentation
//! repository and the products.
//!
//! ```toml
//! command = "generate-release-note"
//! catalogue = "releaser.toml"
//! milestone = "v5.0.0"
//! dry_run = true
//! ```

mod catalogue;

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use catalogue::Catalogue;

use crate::error::ReleaseError;
use crate::github::PersonalAccessToken;
use crate::github::gateway::DEFAULT_TIMEOUT;
use crate::release::MilestoneTarget;

/// Subcommands the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Assemble, render and propose release-note documents.
    GenerateReleaseNote,
    /// Report which pull requests carry and publish release notes.
    ReleaseNotes,
    /// List pull requests in a milestone.
    PrList,
    /// Report dependency versions that disagree across repositories.
    CheckModule,
}

impl Command {
    /// Every command, in help order.
    pub const ALL: [Self; 4] = [
        Self::GenerateReleaseNote,
        Self::ReleaseNotes,
        Self::PrList,
        Self::CheckModule,
    ];

    /// Name used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GenerateReleaseNote => "generate-release-note",
            Self::ReleaseNotes => "release-notes",
            Self::PrList => "pr-list",
            Self::CheckModule => "check-module",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ReleaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str() == value.trim())
            .ok_or_else(|| ReleaseError::Configuration {
                message: format!(
                    "unknown command `{value}` (expected one of {})",
                    Self::ALL.map(Self::as_str).join(", ")
                ),
            })
    }
}

/// Invocation settings supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `RELEASER_COMMAND` or `--command`: subcommand to run
/// - `RELEASER_CATALOGUE` or `--catalogue`: catalogue file
/// - `RELEASER_TOKEN`, `GITHUB_TOKEN`, or `--token`: authentication token
/// - `RELEASER_MILESTONE` or `--milestone`: version or `all`
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use releaser::config::ReleaserConfig;
///
/// let config = ReleaserConfig::load().expect("failed to load configuration");
/// let command = config.require_command().expect("command required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "RELEASER",
    discovery(
        dotfile_name = ".releaser.toml",
        config_file_name = "releaser-cli.toml",
        app_name = "releaser"
    )
)]
pub struct ReleaserConfig {
    /// Subcommand: `generate-release-note`, `release-notes`, `pr-list` or
    /// `check-module`.
    ///
    /// Can be provided via:
    /// - CLI: `--command <NAME>` or `-c <NAME>`
    /// - Environment: `RELEASER_COMMAND`
    #[ortho_config(cli_short = 'c')]
    pub command: Option<String>,

    /// Path of the product catalogue.
    ///
    /// Defaults to `releaser.toml`.
    #[ortho_config(cli_short = 'f')]
    pub catalogue: String,

    /// Personal access token for GitHub API authentication.
    ///
    /// Falls back to the catalogue's `github-token`, then `GITHUB_TOKEN`.
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Milestone version, or `all` for every open milestone.
    #[ortho_config(cli_short = 'm')]
    pub milestone: Option<String>,

    /// Print rendered documents instead of committing them.
    ///
    /// Note: `RELEASER_DRY_RUN` is not read because `ortho_config` does not
    /// load boolean values from the environment.
    #[ortho_config(cli_short = 'n')]
    pub dry_run: bool,

    /// Timeout for each GitHub call, in seconds.
    #[ortho_config()]
    pub request_timeout_seconds: u64,

    /// GitHub API base URL, for GitHub Enterprise or a local stub.
    #[ortho_config()]
    pub api_base: Option<String>,
}

/// Catalogue file name used when none is configured.
pub const DEFAULT_CATALOGUE_PATH: &str = "releaser.toml";

impl Default for ReleaserConfig {
    fn default() -> Self {
        Self {
            command: None,
            catalogue: DEFAULT_CATALOGUE_PATH.to_owned(),
            token: None,
            milestone: None,
            dry_run: false,
            request_timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            api_base: None,
        }
    }
}

impl ReleaserConfig {
    /// The subcommand to run.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] when no command is set or it
    /// is not recognised.
    pub fn require_command(&self) -> Result<Command, ReleaseError> {
        self.command
            .as_deref()
            .ok_or_else(|| ReleaseError::Configuration {
                message: "a command is required (use --command or -c)".to_owned(),
            })?
            .parse()
    }

    /// The milestone selection.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] when no milestone is set.
    pub fn require_milestone(&self) -> Result<MilestoneTarget, ReleaseError> {
        self.milestone
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(MilestoneTarget::from_version)
            .ok_or_else(|| ReleaseError::Configuration {
                message: "a milestone is required (use --milestone or -m)".to_owned(),
            })
    }

    /// Resolves the token from the configuration, the catalogue, or the
    /// `GITHUB_TOKEN` environment variable, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MissingToken`] when no source provides a
    /// non-blank value.
    pub fn resolve_token(&self, catalogue: &Catalogue) -> Result<PersonalAccessToken, ReleaseError> {
        let token = self
            .token
            .clone()
            .or_else(|| catalogue.github_token.clone())
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(ReleaseError::MissingToken)?;
        PersonalAccessToken::new(token)
    }

    /// Per-call GitHub timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] when the timeout is zero.
    pub fn request_timeout(&self) -> Result<Duration, ReleaseError> {
        if self.request_timeout_seconds == 0 {
            return Err(ReleaseError::Configuration {
                message: "request_timeout_seconds must be at least 1".to_owned(),
            });
        }
        Ok(Duration::from_secs(self.request_timeout_seconds))
    }
}
