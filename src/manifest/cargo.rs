//! `Cargo.toml` parsing.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::Dependency;
use crate::error::ReleaseError;

/// A dependency entry of a Cargo manifest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// `name = "1.2"`.
    Simple(String),
    /// `name = { version = "1.2", features = [...] }` or a path or git
    /// dependency.
    Detailed(toml::Table),
}

impl DependencySpec {
    /// Version requirement, when the entry declares one.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Simple(version) => Some(version.as_str()),
            Self::Detailed(table) => table.get("version").and_then(toml::Value::as_str),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
    #[serde(default)]
    dependencies: BTreeMap<String, DependencySpec>,
}

#[derive(Debug, Deserialize)]
struct CargoPackage {
    name: String,
}

/// Package name and versioned dependencies of a Cargo manifest.
pub(super) fn parse(text: &str) -> Result<(String, Vec<Dependency>), ReleaseError> {
    let manifest: CargoManifest = toml::from_str(text)
        .map_err(|e| ReleaseError::malformed("Cargo.toml", e.message().to_owned()))?;
    let dependencies = manifest
        .dependencies
        .iter()
        .filter_map(|(name, spec)| {
            spec.version().map(|version| Dependency {
                name: name.clone(),
                version: version.to_owned(),
            })
        })
        .collect();
    let name = manifest.package.map(|package| package.name).unwrap_or_default();
    Ok((name, dependencies))
}
