//! Per-language release-note documents.
//!
//! A document is loaded from the Markdown previously published to the
//! documentation repository (or created empty), merged with freshly
//! extracted notes and rendered back. Notes are identified by repository and
//! pull request number; categories keep first-seen order.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ReleaseError;
use crate::github::RepoRef;

use super::product::{OTHERS, Product};
use super::structure::StructureNode;

#[expect(clippy::expect_used, reason = "static pattern is known to be valid")]
static NOTE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[-*+]\s+(.*?)\s*\[#\d+\]\(https://github\.com/([^/\s]+)/([^/\s]+)/pull/(\d+)\)\s*$",
    )
    .expect("valid note line pattern")
});

/// One pull request's note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNote {
    /// Repository the pull request belongs to.
    pub repo: RepoRef,
    /// Pull request number.
    pub pull_number: u64,
    /// Note text as written by the author.
    pub text: String,
}

/// Notes of one repository within one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReleaseNotes {
    /// Source repository.
    pub repo: RepoRef,
    /// Display override.
    pub rename: Option<RepoRef>,
    /// Notes in insertion order; pull numbers are unique.
    pub notes: Vec<ReleaseNote>,
}

impl RepoReleaseNotes {
    /// Name printed in the document.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.rename.as_ref().unwrap_or(&self.repo).name()
    }
}

/// A named group of notes, e.g. "Bug Fixes".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Category heading.
    pub name: String,
    /// Repositories with notes in this category.
    pub repos: Vec<RepoReleaseNotes>,
}

impl Category {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            repos: Vec::new(),
        }
    }

    /// Notes of `repo` in this category.
    #[must_use]
    pub fn notes_for(&self, repo: &RepoRef) -> Option<&RepoReleaseNotes> {
        self.repos.iter().find(|entry| &entry.repo == repo)
    }
}

/// What [`ReleaseNoteDocument::upsert`] did with a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The pull request had no note yet.
    Added,
    /// An existing note was replaced, possibly in another category.
    Updated,
}

/// The release notes of one product version in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNoteDocument {
    /// Product name.
    pub product: String,
    /// Language code, e.g. `en`.
    pub language: String,
    /// Path inside the documentation repository.
    pub path: String,
    /// Version the document describes.
    pub version: String,
    /// Outline used for rendering.
    pub structure: Vec<StructureNode>,
    categories: Vec<Category>,
}

impl ReleaseNoteDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new(
        product: impl Into<String>,
        language: impl Into<String>,
        path: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            language: language.into(),
            path: path.into(),
            version: version.into(),
            structure: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Loads notes from previously published Markdown.
    ///
    /// `## Heading` lines open a category; list lines ending in a pull
    /// request link are notes. Notes before any heading belong to
    /// [`OTHERS`]. Everything else is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::MalformedInput`] when a pull request number
    /// does not fit in a `u64` or a repository slug is invalid.
    pub fn parse(mut self, content: &str) -> Result<Self, ReleaseError> {
        let mut category = OTHERS.to_owned();
        for raw in content.lines() {
            let line = raw.trim();
            if let Some(heading) = line.strip_prefix("## ") {
                heading.trim().clone_into(&mut category);
                continue;
            }
            let Some(captures) = NOTE_LINE.captures(line) else {
                continue;
            };
            let field = |index: usize| captures.get(index).map_or("", |found| found.as_str());
            let repo = RepoRef::new(field(2), field(3))?;
            let pull_number = field(4)
                .parse::<u64>()
                .map_err(|error| ReleaseError::malformed(line, error.to_string()))?;
            self.upsert(
                &category,
                ReleaseNote {
                    repo,
                    pull_number,
                    text: field(1).to_owned(),
                },
                None,
            );
        }
        Ok(self)
    }

    /// Categories in first-seen order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Looks up a category by name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    /// Whether any category holds a note for the pull request.
    #[must_use]
    pub fn contains_pull(&self, repo: &RepoRef, pull_number: u64) -> bool {
        self.locate(repo, pull_number).is_some()
    }

    /// Total number of notes.
    #[must_use]
    pub fn note_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|category| &category.repos)
            .map(|entry| entry.notes.len())
            .sum()
    }

    /// Applies the product's outline and display overrides.
    pub fn refresh(&mut self, product: &Product) {
        product.structure().clone_into(&mut self.structure);
        for entry in self
            .categories
            .iter_mut()
            .flat_map(|category| category.repos.iter_mut())
        {
            entry.rename = product.rename_of(&entry.repo).cloned();
        }
    }

    /// Repositories holding notes that the outline never renders.
    #[must_use]
    pub fn unplaced_repos(&self) -> Vec<&RepoRef> {
        let mut unplaced: Vec<&RepoRef> = Vec::new();
        for entry in self.categories.iter().flat_map(|category| &category.repos) {
            let placed = self.structure.iter().any(|node| node.contains(&entry.repo));
            if !placed && !entry.notes.is_empty() && !unplaced.contains(&&entry.repo) {
                unplaced.push(&entry.repo);
            }
        }
        unplaced
    }

    /// Adds a note, or replaces the text of the note already recorded for
    /// the same pull request.
    ///
    /// A pull request whose category changed is moved to the new category.
    pub fn upsert(
        &mut self,
        category: &str,
        note: ReleaseNote,
        rename: Option<RepoRef>,
    ) -> MergeOutcome {
        let Some((category_index, repo_index, note_index)) =
            self.locate(&note.repo, note.pull_number)
        else {
            self.insert(category, note, rename);
            return MergeOutcome::Added;
        };

        let Some(owner) = self.categories.get_mut(category_index) else {
            self.insert(category, note, rename);
            return MergeOutcome::Added;
        };

        if owner.name == category {
            if let Some(existing) = owner
                .repos
                .get_mut(repo_index)
                .and_then(|entry| entry.notes.get_mut(note_index))
            {
                existing.text = note.text;
            }
            return MergeOutcome::Updated;
        }

        if let Some(entry) = owner.repos.get_mut(repo_index) {
            entry.notes.remove(note_index);
            if entry.notes.is_empty() {
                owner.repos.remove(repo_index);
            }
        }
        self.insert(category, note, rename);
        MergeOutcome::Updated
    }

    fn insert(&mut self, category: &str, note: ReleaseNote, rename: Option<RepoRef>) {
        let index = self
            .categories
            .iter()
            .position(|existing| existing.name == category)
            .unwrap_or_else(|| {
                self.categories.push(Category::new(category));
                self.categories.len().saturating_sub(1)
            });
        let Some(target) = self.categories.get_mut(index) else {
            return;
        };
        if let Some(entry) = target.repos.iter_mut().find(|entry| entry.repo == note.repo) {
            entry.notes.push(note);
            return;
        }
        target.repos.push(RepoReleaseNotes {
            repo: note.repo.clone(),
            rename,
            notes: vec![note],
        });
    }

    fn locate(&self, repo: &RepoRef, pull_number: u64) -> Option<(usize, usize, usize)> {
        self.categories
            .iter()
            .enumerate()
            .find_map(|(category_index, category)| {
                category
                    .repos
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| &entry.repo == repo)
                    .find_map(|(repo_index, entry)| {
                        entry
                            .notes
                            .iter()
                            .position(|note| note.pull_number == pull_number)
                            .map(|note_index| (category_index, repo_index, note_index))
                    })
            })
    }
}
