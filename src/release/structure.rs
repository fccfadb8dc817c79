//! Declarative document outline for a product.
//!
//! Each configuration line is either a bare `owner/repo` leaf or a titled
//! group `Title: owner/a, owner/b`. Declaration order is the order the
//! rendered document follows.

use crate::error::ReleaseError;
use crate::github::RepoRef;

/// One node of a product's document outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureNode {
    /// A single repository.
    Repository(RepoRef),
    /// A titled section grouping other nodes.
    Group {
        /// Section title printed in the document.
        title: String,
        /// Nodes rendered one level deeper.
        children: Vec<StructureNode>,
    },
}

impl StructureNode {
    /// Parses one declaration line.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MalformedInput`] for an empty group title, a
    /// group without repositories, or an invalid repository slug.
    pub fn parse_line(line: &str) -> Result<Self, ReleaseError> {
        let Some((title, members)) = line.split_once(':') else {
            return RepoRef::parse(line).map(Self::Repository);
        };

        let title = title.trim();
        if title.is_empty() {
            return Err(ReleaseError::malformed(line, "group title must not be empty"));
        }

        let children = members
            .split(',')
            .map(str::trim)
            .filter(|member| !member.is_empty())
            .map(|member| RepoRef::parse(member).map(Self::Repository))
            .collect::<Result<Vec<_>, _>>()?;
        if children.is_empty() {
            return Err(ReleaseError::malformed(
                line,
                "group must list at least one repository",
            ));
        }

        Ok(Self::Group {
            title: title.to_owned(),
            children,
        })
    }

    /// Whether `repo` appears anywhere in this subtree.
    #[must_use]
    pub fn contains(&self, repo: &RepoRef) -> bool {
        match self {
            Self::Repository(own) => own == repo,
            Self::Group { children, .. } => children.iter().any(|child| child.contains(repo)),
        }
    }

    /// Whether any leaf of this subtree satisfies `predicate`.
    pub fn any_leaf<F>(&self, predicate: &F) -> bool
    where
        F: Fn(&RepoRef) -> bool,
    {
        match self {
            Self::Repository(repo) => predicate(repo),
            Self::Group { children, .. } => children.iter().any(|child| child.any_leaf(predicate)),
        }
    }
}

/// Parses every declaration line in order.
///
/// # Errors
///
/// Returns the first [`ReleaseError::MalformedInput`] encountered.
pub fn parse_structure<S: AsRef<str>>(lines: &[S]) -> Result<Vec<StructureNode>, ReleaseError> {
    lines
        .iter()
        .map(|line| StructureNode::parse_line(line.as_ref()))
        .collect()
}

/// One leaf per repository, in the given order.
#[must_use]
pub fn flat_structure(repos: &[RepoRef]) -> Vec<StructureNode> {
    repos.iter().cloned().map(StructureNode::Repository).collect()
}
