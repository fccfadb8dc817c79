//! Subcommand handlers.
//!
//! - [`generate`]: assemble release notes and propose them upstream
//! - [`release_notes`]: report note presence per pull request and language
//! - [`pr_list`]: list pull requests in a milestone
//! - [`check_module`]: report disagreeing dependency versions
//!
//! Table formatting is in [`output`]. Each handler writes to a caller-chosen
//! writer; [`run`] wires them to stdout.

use std::io::{self, Write};

use camino::Utf8Path;
use tracing::info;

use crate::config::{Catalogue, Command, ReleaserConfig};
use crate::error::ReleaseError;
use crate::github::locator::{GITHUB_API_BASE, parse_api_base};
use crate::github::{OctocrabGateway, PersonalAccessToken};
use crate::release::MilestoneTarget;

pub mod check_module;
pub mod generate;
pub mod output;
pub mod pr_list;
pub mod release_notes;

/// Runs the configured subcommand against GitHub, writing to stdout.
///
/// # Errors
///
/// Returns [`ReleaseError::Configuration`] for missing or invalid settings,
/// [`ReleaseError::MissingToken`] when no token is available, and whatever
/// the subcommand fails with.
pub async fn run(config: &ReleaserConfig) -> Result<(), ReleaseError> {
    let command = config.require_command()?;
    let target = config.require_milestone()?;
    let catalogue = Catalogue::load(Utf8Path::new(&config.catalogue))?;
    let token = config.resolve_token(&catalogue)?;
    let gateway = build_gateway(config, &token)?;

    info!(%command, catalogue = %config.catalogue, "running");
    let mut stdout = io::stdout().lock();
    run_command(&gateway, command, &catalogue, &token, &target, config.dry_run, &mut stdout).await
}

/// Runs `command` against an already-built gateway.
///
/// # Errors
///
/// Returns [`ReleaseError::Configuration`] when a status subcommand is given
/// `all` instead of a version, and whatever the subcommand fails with.
pub async fn run_command<W: Write>(
    gateway: &OctocrabGateway,
    command: Command,
    catalogue: &Catalogue,
    token: &PersonalAccessToken,
    target: &MilestoneTarget,
    dry_run: bool,
    writer: &mut W,
) -> Result<(), ReleaseError> {
    match command {
        Command::GenerateReleaseNote => {
            generate::run(gateway, catalogue, token, target, dry_run, writer).await
        }
        Command::ReleaseNotes => {
            let version = single_version(command, target)?;
            let docs = catalogue.docs_location()?;
            release_notes::write_release_notes(gateway, &catalogue.products, &docs, version, writer)
                .await
        }
        Command::PrList => {
            let version = single_version(command, target)?;
            pr_list::write_pr_list(gateway, &catalogue.repos, version, writer).await
        }
        Command::CheckModule => {
            let version = single_version(command, target)?;
            check_module::write_module_check(gateway, &catalogue.repos, version, writer).await
        }
    }
}

fn build_gateway(
    config: &ReleaserConfig,
    token: &PersonalAccessToken,
) -> Result<OctocrabGateway, ReleaseError> {
    let api_base = parse_api_base(config.api_base.as_deref().unwrap_or(GITHUB_API_BASE))?;
    OctocrabGateway::for_token(token, api_base.as_str(), config.request_timeout()?)
}

fn single_version(command: Command, target: &MilestoneTarget) -> Result<&str, ReleaseError> {
    target.version().ok_or_else(|| ReleaseError::Configuration {
        message: format!("`{command}` needs a milestone version, not `all`"),
    })
}
