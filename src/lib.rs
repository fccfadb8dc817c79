//! Release-note aggregation for multi-repository products.
//!
//! The library finds the milestone of a release in every repository of a
//! product, extracts the release note from each merged pull request, merges
//! the notes into the published Markdown document and proposes the result to
//! the documentation repository as a pull request from the user's fork.
//!
//! - [`github`]: Octocrab-backed gateways for milestones, contents and pull
//!   requests
//! - [`release`]: extraction, document model, rendering and publication
//! - [`local`]: scratch clones of the documentation repository
//! - [`manifest`]: `go.mod` and `Cargo.toml` dependency checks
//! - [`config`]: invocation settings and the product catalogue
//! - [`cli`]: subcommand handlers used by the binary

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod local;
pub mod manifest;
pub mod release;

#[cfg(test)]
mod test_support;

pub use config::{Catalogue, ReleaserConfig};
pub use error::ReleaseError;
pub use github::{OctocrabGateway, PersonalAccessToken, RepoRef};
pub use release::{Product, ReleaseNoteDocument, ReleasePublisher};
