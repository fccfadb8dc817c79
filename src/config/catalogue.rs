//! The product catalogue: repositories, documentation target and products.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use serde::Deserialize;

use crate::error::ReleaseError;
use crate::github::RepoRef;
use crate::release::{DocsLocation, Product, PublishSettings, parse_structure};

const DEFAULT_PULL_LANGUAGE: &str = "en";
const DEFAULT_GIT_DIR: &str = "/tmp";
const DEFAULT_BASE_BRANCH: &str = "master";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawCatalogue {
    github_token: Option<String>,
    repos: Vec<String>,
    release_note_repo: Option<String>,
    release_note_path: String,
    pull_language: Option<String>,
    languages: Vec<String>,
    git_dir: Option<String>,
    base_branch: Option<String>,
    #[serde(rename = "product")]
    products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawProduct {
    name: String,
    #[serde(default)]
    repos: Vec<String>,
    #[serde(default)]
    rename: HashMap<String, String>,
    #[serde(default)]
    structure: Vec<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
}

/// Validated catalogue contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogue {
    /// Token used when none is given on the command line.
    pub github_token: Option<String>,
    /// Repositories inspected by `pr-list` and `check-module`.
    pub repos: Vec<RepoRef>,
    /// Documentation repository receiving release notes.
    pub release_note_repo: Option<RepoRef>,
    /// Directory template for documents.
    pub release_note_path: String,
    /// Language of the document new notes go into.
    pub pull_language: String,
    /// Every language with published documents.
    pub languages: Vec<String>,
    /// Parent directory for scratch clones.
    pub git_dir: Utf8PathBuf,
    /// Branch pull requests target.
    pub base_branch: String,
    /// Products in declaration order.
    pub products: Vec<Product>,
}

impl Catalogue {
    /// Reads and validates the catalogue at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Io`] when the file cannot be read and the
    /// errors of [`Self::parse`] otherwise.
    pub fn load(path: &Utf8Path) -> Result<Self, ReleaseError> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let file_name = path.file_name().ok_or_else(|| ReleaseError::Configuration {
            message: format!("catalogue path `{path}` has no file name"),
        })?;
        let dir = Dir::open_ambient_dir(parent, cap_std::ambient_authority())
            .map_err(|e| ReleaseError::io(&e, &format!("open {parent}")))?;
        let text = dir
            .read_to_string(file_name)
            .map_err(|e| ReleaseError::io(&e, &format!("read {path}")))?;
        Self::parse(&text)
    }

    /// Parses and validates catalogue text.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] when the TOML is invalid and
    /// [`ReleaseError::MalformedInput`] when a repository slug or structure
    /// line is invalid.
    pub fn parse(text: &str) -> Result<Self, ReleaseError> {
        let raw: RawCatalogue = toml::from_str(text).map_err(|e| ReleaseError::Configuration {
            message: format!("invalid catalogue: {}", e.message()),
        })?;

        let pull_language = raw
            .pull_language
            .filter(|language| !language.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PULL_LANGUAGE.to_owned());
        let mut languages = raw.languages;
        if !languages.contains(&pull_language) {
            languages.push(pull_language.clone());
        }

        Ok(Self {
            github_token: raw.github_token.filter(|token| !token.trim().is_empty()),
            repos: parse_repos(&raw.repos)?,
            release_note_repo: raw
                .release_note_repo
                .as_deref()
                .map(RepoRef::parse)
                .transpose()?,
            release_note_path: raw.release_note_path,
            pull_language,
            languages,
            git_dir: Utf8PathBuf::from(raw.git_dir.unwrap_or_else(|| DEFAULT_GIT_DIR.to_owned())),
            base_branch: raw
                .base_branch
                .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_owned()),
            products: raw
                .products
                .into_iter()
                .map(build_product)
                .collect::<Result<_, _>>()?,
        })
    }

    /// The documentation repository.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Configuration`] when `release-note-repo` is
    /// not set.
    pub fn require_docs_repo(&self) -> Result<&RepoRef, ReleaseError> {
        self.release_note_repo
            .as_ref()
            .ok_or_else(|| ReleaseError::Configuration {
                message: "release-note-repo is required".to_owned(),
            })
    }

    /// Where documents are read from, at the base branch.
    ///
    /// # Errors
    ///
    /// Same as [`Self::require_docs_repo`].
    pub fn docs_location(&self) -> Result<DocsLocation, ReleaseError> {
        Ok(DocsLocation {
            repo: self.require_docs_repo()?.clone(),
            path_template: self.release_note_path.clone(),
            languages: self.languages.clone(),
            reference: Some(self.base_branch.clone()),
        })
    }

    /// Publication settings for a run.
    ///
    /// # Errors
    ///
    /// Same as [`Self::require_docs_repo`].
    pub fn publish_settings(&self, dry_run: bool) -> Result<PublishSettings, ReleaseError> {
        Ok(PublishSettings {
            docs: self.docs_location()?,
            pull_language: self.pull_language.clone(),
            base_branch: self.base_branch.clone(),
            dry_run,
        })
    }
}

fn parse_repos(slugs: &[String]) -> Result<Vec<RepoRef>, ReleaseError> {
    slugs.iter().map(|slug| RepoRef::parse(slug)).collect()
}

fn build_product(raw: RawProduct) -> Result<Product, ReleaseError> {
    if raw.name.trim().is_empty() {
        return Err(ReleaseError::Configuration {
            message: "every product needs a name".to_owned(),
        });
    }
    let repos = parse_repos(&raw.repos)?;
    let renames = raw
        .rename
        .iter()
        .map(|(from, to)| Ok((RepoRef::parse(from)?, RepoRef::parse(to)?)))
        .collect::<Result<HashMap<_, _>, ReleaseError>>()?;
    let structure = parse_structure(&raw.structure)?;

    Ok(Product::new(raw.name, repos)
        .with_structure(structure)
        .with_renames(renames)
        .with_labels(raw.labels))
}
