//! Dependency manifests and cross-repository version checks.
//!
//! `check-module` fetches the `go.mod` and `Cargo.toml` files of every
//! configured repository at a release and reports dependencies whose
//! versions disagree between repositories.

mod cargo;
mod collector;
mod gomod;

use std::collections::HashMap;

pub use cargo::DependencySpec;
pub use collector::ManifestCollector;

use crate::error::ReleaseError;
use crate::github::RepoRef;

/// Supported manifest formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    /// Go module file.
    GoMod,
    /// Cargo manifest.
    Cargo,
}

impl ManifestKind {
    /// Manifest kind for a file name in a repository root.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "go.mod" => Some(Self::GoMod),
            "Cargo.toml" => Some(Self::Cargo),
            _ => None,
        }
    }

    /// Canonical file name.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::GoMod => "go.mod",
            Self::Cargo => "Cargo.toml",
        }
    }
}

/// A dependency requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Module path or crate name.
    pub name: String,
    /// Version requirement as written.
    pub version: String,
}

/// One parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Module or package name; empty when the manifest declares none.
    pub name: String,
    /// Repository the manifest was read from.
    pub repo: RepoRef,
    /// Manifest format.
    pub kind: ManifestKind,
    /// Declared dependencies in file order.
    pub dependencies: Vec<Dependency>,
}

/// A dependency required at different versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Dependency name.
    pub name: String,
    /// Repository that first required the dependency.
    pub first_repo: RepoRef,
    /// Version that repository requires.
    pub first_version: String,
    /// Repository requiring a different version.
    pub repo: RepoRef,
    /// The differing version.
    pub version: String,
}

/// Parses manifest `text` of the given kind.
///
/// # Errors
///
/// Returns [`ReleaseError::MalformedInput`] when a Cargo manifest is not
/// valid TOML.
pub fn parse_manifest(
    kind: ManifestKind,
    repo: &RepoRef,
    text: &str,
) -> Result<Package, ReleaseError> {
    let (name, dependencies) = match kind {
        ManifestKind::GoMod => gomod::parse(text),
        ManifestKind::Cargo => cargo::parse(text)?,
    };
    Ok(Package {
        name,
        repo: repo.clone(),
        kind,
        dependencies,
    })
}

/// Every dependency version that differs from the first one seen.
///
/// Packages are scanned in order; each later disagreement is one conflict.
#[must_use]
pub fn find_conflicts(packages: &[Package]) -> Vec<Conflict> {
    let mut first_seen: HashMap<&str, (&RepoRef, &str)> = HashMap::new();
    let mut conflicts = Vec::new();
    for package in packages {
        for dependency in &package.dependencies {
            let (first_repo, first_version) = *first_seen
                .entry(dependency.name.as_str())
                .or_insert((&package.repo, dependency.version.as_str()));
            if first_version != dependency.version {
                conflicts.push(Conflict {
                    name: dependency.name.clone(),
                    first_repo: first_repo.clone(),
                    first_version: first_version.to_owned(),
                    repo: package.repo.clone(),
                    version: dependency.version.clone(),
                });
            }
        }
    }
    conflicts
}
