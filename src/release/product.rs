//! Products: named sets of repositories released together.

use std::collections::HashMap;

use crate::github::RepoRef;

use super::structure::{StructureNode, flat_structure};

/// Category used when no pull request label maps to one.
pub const OTHERS: &str = "Others";

/// A named collection of repositories sharing one version and one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    name: String,
    repos: Vec<RepoRef>,
    renames: HashMap<RepoRef, RepoRef>,
    structure: Vec<StructureNode>,
    labels: HashMap<String, String>,
}

impl Product {
    /// Creates a product whose outline lists every repository in order.
    #[must_use]
    pub fn new(name: impl Into<String>, repos: Vec<RepoRef>) -> Self {
        let structure = flat_structure(&repos);
        Self {
            name: name.into(),
            repos,
            renames: HashMap::new(),
            structure,
            labels: HashMap::new(),
        }
    }

    /// Replaces the outline; an empty outline keeps the default one.
    #[must_use]
    pub fn with_structure(mut self, structure: Vec<StructureNode>) -> Self {
        if !structure.is_empty() {
            self.structure = structure;
        }
        self
    }

    /// Sets display overrides for repositories.
    #[must_use]
    pub fn with_renames(mut self, renames: HashMap<RepoRef, RepoRef>) -> Self {
        self.renames = renames;
        self
    }

    /// Sets the label to category mapping.
    #[must_use]
    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    /// Product name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Repositories in declaration order.
    #[must_use]
    pub fn repos(&self) -> &[RepoRef] {
        &self.repos
    }

    /// The repository milestones are resolved on.
    #[must_use]
    pub fn primary_repo(&self) -> Option<&RepoRef> {
        self.repos.first()
    }

    /// Document outline.
    #[must_use]
    pub fn structure(&self) -> &[StructureNode] {
        &self.structure
    }

    /// Display overrides.
    #[must_use]
    pub const fn renames(&self) -> &HashMap<RepoRef, RepoRef> {
        &self.renames
    }

    /// Display override for `repo`, if configured.
    #[must_use]
    pub fn rename_of(&self, repo: &RepoRef) -> Option<&RepoRef> {
        self.renames.get(repo)
    }

    /// Category for a pull request: the first label with a mapping wins,
    /// otherwise [`OTHERS`].
    #[must_use]
    pub fn category_for<S: AsRef<str>>(&self, labels: &[S]) -> &str {
        labels
            .iter()
            .find_map(|label| self.labels.get(label.as_ref()))
            .map_or(OTHERS, String::as_str)
    }
}
