//! In-memory GitHub used by pipeline tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ReleaseError;
use crate::github::{
    ContentGateway, Contents, CreatedPullRequest, DirEntry, EntryKind, Issue, IssueGateway,
    Milestone, MilestoneState, NewPullRequest, PageRequest, RepoRef, RepositoryGateway,
};

/// Pull request opened through [`FakeGitHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedPull {
    pub repo: RepoRef,
    pub request: NewPullRequest,
}

/// Serves milestones, issues, files and tags from memory and records forks
/// and pull requests.
#[derive(Debug, Default)]
pub(crate) struct FakeGitHub {
    milestones: HashMap<RepoRef, Vec<Milestone>>,
    issues: HashMap<(RepoRef, u64), Vec<Issue>>,
    files: BTreeMap<(RepoRef, String, String), String>,
    tags: HashMap<RepoRef, Vec<String>>,
    existing: BTreeSet<RepoRef>,
    login: String,
    pull_exists: bool,
    pub forks: Mutex<Vec<RepoRef>>,
    pub pulls: Mutex<Vec<RecordedPull>>,
}

/// Reference files are stored under when no ref is requested.
pub(crate) const DEFAULT_REF: &str = "HEAD";

pub(crate) fn repo(slug: &str) -> RepoRef {
    RepoRef::parse(slug).expect("repo should parse")
}

pub(crate) fn milestone(id: u64, number: u64, title: &str) -> Milestone {
    Milestone {
        id,
        number,
        title: title.to_owned(),
        state: "open".to_owned(),
    }
}

/// A merged pull request record as the issues endpoint lists it.
pub(crate) fn merged_pull(number: u64, body: &str, labels: &[&str]) -> Issue {
    Issue {
        number,
        title: format!("pull {number}"),
        body: Some(body.to_owned()),
        state: "closed".to_owned(),
        labels: labels.iter().map(|label| (*label).to_owned()).collect(),
        author: Some("contributor".to_owned()),
        html_url: None,
        pull_request: Some(crate::github::models::PullRequestLink {
            merged_at: chrono::DateTime::from_timestamp(1_617_753_600, 0),
            html_url: None,
        }),
    }
}

impl FakeGitHub {
    pub(crate) fn new(login: &str) -> Self {
        Self {
            login: login.to_owned(),
            ..Self::default()
        }
    }

    pub(crate) fn with_milestone(mut self, repo: &RepoRef, milestone: Milestone) -> Self {
        self.milestones.entry(repo.clone()).or_default().push(milestone);
        self
    }

    pub(crate) fn with_issue(mut self, repo: &RepoRef, milestone: u64, issue: Issue) -> Self {
        self.issues
            .entry((repo.clone(), milestone))
            .or_default()
            .push(issue);
        self
    }

    pub(crate) fn with_file(
        mut self,
        repo: &RepoRef,
        reference: &str,
        path: &str,
        text: &str,
    ) -> Self {
        self.files.insert(
            (repo.clone(), reference.to_owned(), path.to_owned()),
            text.to_owned(),
        );
        self
    }

    pub(crate) fn with_tag(mut self, repo: &RepoRef, tag: &str) -> Self {
        self.tags.entry(repo.clone()).or_default().push(tag.to_owned());
        self
    }

    pub(crate) fn with_repository(mut self, repo: &RepoRef) -> Self {
        self.existing.insert(repo.clone());
        self
    }

    pub(crate) const fn with_existing_pull(mut self) -> Self {
        self.pull_exists = true;
        self
    }

    pub(crate) fn recorded_pulls(&self) -> Vec<RecordedPull> {
        self.pulls.lock().expect("pulls lock").clone()
    }

    pub(crate) fn recorded_forks(&self) -> Vec<RepoRef> {
        self.forks.lock().expect("forks lock").clone()
    }

    fn page_of<T: Clone>(items: Option<&Vec<T>>, page: PageRequest) -> Result<Vec<T>, ReleaseError> {
        page.validate()?;
        let per_page = usize::from(page.per_page());
        let skip = usize::try_from(page.page().saturating_sub(1))
            .unwrap_or(usize::MAX)
            .saturating_mul(per_page);
        Ok(items
            .map(|all| all.iter().skip(skip).take(per_page).cloned().collect())
            .unwrap_or_default())
    }

    fn directory(&self, repo: &RepoRef, reference: &str, path: &str) -> Vec<DirEntry> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path.trim_end_matches('/'))
        };
        let mut seen = BTreeSet::new();
        self.files
            .keys()
            .filter(|(file_repo, file_ref, _)| file_repo == repo && file_ref == reference)
            .filter_map(|(_, _, file)| file.strip_prefix(prefix.as_str()))
            .filter_map(|rest| {
                let (name, kind) = rest
                    .split_once('/')
                    .map_or((rest, EntryKind::File), |(dir, _)| (dir, EntryKind::Dir));
                seen.insert(name.to_owned()).then(|| DirEntry {
                    name: name.to_owned(),
                    path: format!("{prefix}{name}"),
                    kind,
                })
            })
            .collect()
    }
}

#[async_trait]
impl IssueGateway for FakeGitHub {
    async fn list_milestones(
        &self,
        repo: &RepoRef,
        state: MilestoneState,
        page: PageRequest,
    ) -> Result<Vec<Milestone>, ReleaseError> {
        let filtered: Option<Vec<Milestone>> = self.milestones.get(repo).map(|all| {
            all.iter()
                .filter(|m| state == MilestoneState::All || m.state == state.as_str())
                .cloned()
                .collect()
        });
        Self::page_of(filtered.as_ref(), page)
    }

    async fn list_milestone_issues(
        &self,
        repo: &RepoRef,
        milestone: u64,
        page: PageRequest,
    ) -> Result<Vec<Issue>, ReleaseError> {
        Self::page_of(self.issues.get(&(repo.clone(), milestone)), page)
    }
}

#[async_trait]
impl ContentGateway for FakeGitHub {
    async fn contents(
        &self,
        repo: &RepoRef,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Option<Contents>, ReleaseError> {
        let reference = reference.unwrap_or(DEFAULT_REF);
        if let Some(text) = self
            .files
            .get(&(repo.clone(), reference.to_owned(), path.to_owned()))
        {
            return Ok(Some(Contents::File {
                path: path.to_owned(),
                text: text.clone(),
            }));
        }
        let listing = self.directory(repo, reference, path);
        Ok((!listing.is_empty()).then_some(Contents::Directory(listing)))
    }

    async fn matching_tags(
        &self,
        repo: &RepoRef,
        prefix: &str,
    ) -> Result<Vec<String>, ReleaseError> {
        Ok(self
            .tags
            .get(repo)
            .map(|tags| tags.iter().filter(|t| t.starts_with(prefix)).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl RepositoryGateway for FakeGitHub {
    async fn authenticated_login(&self) -> Result<String, ReleaseError> {
        Ok(self.login.clone())
    }

    async fn repository_exists(&self, repo: &RepoRef) -> Result<bool, ReleaseError> {
        let forked = self.forks.lock().expect("forks lock").contains(repo);
        Ok(forked || self.existing.contains(repo))
    }

    async fn fork(&self, repo: &RepoRef) -> Result<(), ReleaseError> {
        self.forks
            .lock()
            .expect("forks lock")
            .push(repo.with_owner(&self.login));
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<Option<CreatedPullRequest>, ReleaseError> {
        let mut pulls = self.pulls.lock().expect("pulls lock");
        pulls.push(RecordedPull {
            repo: repo.clone(),
            request: request.clone(),
        });
        if self.pull_exists {
            return Ok(None);
        }
        let number = u64::try_from(pulls.len()).expect("pull count fits");
        Ok(Some(CreatedPullRequest {
            number,
            html_url: Some(repo.pull_url(number)),
        }))
    }
}
