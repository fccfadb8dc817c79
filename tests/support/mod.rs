//! Shared test utilities: a stubbed GitHub API and local git remotes.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use git2::{ErrorCode, Repository, Signature};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a temporary directory.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"))
}

/// A documentation repository with a working copy upstream and a bare fork.
pub struct GitRemotes {
    _dir: TempDir,
    /// Non-bare upstream repository with one commit on `master`.
    pub upstream: Utf8PathBuf,
    /// Bare repository pushes land in.
    pub fork: Utf8PathBuf,
    /// Parent directory for scratch clones.
    pub scratch: Utf8PathBuf,
}

/// Creates the upstream and fork repositories.
///
/// # Panics
///
/// Panics if either repository cannot be created.
pub fn git_remotes() -> GitRemotes {
    let dir = create_temp_dir();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("temporary path is not UTF-8: {}", path.display()));
    let upstream = root.join("docs");
    let fork = root.join("fork.git");

    let repo = Repository::init(&upstream)
        .unwrap_or_else(|error| panic!("failed to init upstream: {error}"));
    repo.set_head("refs/heads/master")
        .unwrap_or_else(|error| panic!("failed to set upstream HEAD: {error}"));
    commit_file(&upstream, "README.md", "# docs\n");
    Repository::init_bare(&fork).unwrap_or_else(|error| panic!("failed to init fork: {error}"));

    GitRemotes {
        _dir: dir,
        upstream,
        fork,
        scratch: root.join("scratch"),
    }
}

/// Writes `content` to `file` in the upstream working copy and commits it
/// on the current branch.
///
/// # Panics
///
/// Panics if any git or filesystem step fails.
pub fn commit_file(upstream: &Utf8Path, file: &str, content: &str) {
    let repo =
        Repository::open(upstream).unwrap_or_else(|error| panic!("failed to open upstream: {error}"));
    let workdir = Dir::open_ambient_dir(upstream, cap_std::ambient_authority())
        .unwrap_or_else(|error| panic!("failed to open working copy: {error}"));
    let file_path = Utf8Path::new(file);
    if let Some(parent) = file_path.parent()
        && !parent.as_str().is_empty()
    {
        workdir
            .create_dir_all(parent)
            .unwrap_or_else(|error| panic!("failed to create {parent}: {error}"));
    }
    workdir
        .write(file_path, content)
        .unwrap_or_else(|error| panic!("failed to write {file}: {error}"));

    commit_index(&repo, file_path, &format!("add {file}"))
        .unwrap_or_else(|error| panic!("failed to commit {file}: {error}"));
}

fn commit_index(repo: &Repository, file: &Utf8Path, message: &str) -> Result<(), git2::Error> {
    let mut index = repo.index()?;
    index.add_path(file.as_std_path())?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let signature = Signature::now("Docs Maintainer", "docs@example.com")?;
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(error) if error.code() == ErrorCode::UnbornBranch => None,
        Err(error) => return Err(error),
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
    Ok(())
}

/// The message of the tip commit of `branch` in the fork and the content of
/// `file` in it, or `None` when the branch was never pushed.
///
/// # Panics
///
/// Panics if the fork cannot be read.
pub fn pushed_file(fork: &Utf8Path, branch: &str, file: &str) -> Option<(String, String)> {
    let repo = Repository::open_bare(fork).unwrap_or_else(|error| panic!("failed to open fork: {error}"));
    let commit = repo
        .find_reference(&format!("refs/heads/{branch}"))
        .ok()?
        .peel_to_commit()
        .unwrap_or_else(|error| panic!("branch tip is not a commit: {error}"));
    let entry = commit
        .tree()
        .unwrap_or_else(|error| panic!("commit has no tree: {error}"))
        .get_path(Utf8Path::new(file).as_std_path())
        .unwrap_or_else(|error| panic!("{file} missing from {branch}: {error}"));
    let blob = repo
        .find_blob(entry.id())
        .unwrap_or_else(|error| panic!("{file} is not a blob: {error}"));
    let content = String::from_utf8(blob.content().to_vec())
        .unwrap_or_else(|error| panic!("{file} is not UTF-8: {error}"));
    Some((commit.message().unwrap_or_default().to_owned(), content))
}

/// A merged pull request as the issues endpoint lists it.
pub fn merged_pull(number: u64, body: &str, labels: &[&str]) -> Value {
    json!({
        "number": number,
        "title": format!("pull {number}"),
        "body": body,
        "state": "closed",
        "labels": labels.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
        "user": { "login": "contributor" },
        "pull_request": { "merged_at": "2021-04-01T08:00:00Z" }
    })
}

/// Serves one milestone for `repo` and `issues` inside it.
pub async fn mount_milestone(server: &MockServer, repo: &str, title: &str, issues: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{repo}/milestones")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 11, "number": 3, "title": title, "state": "open" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/repos/{repo}/issues")))
        .and(query_param("milestone", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(issues)))
        .mount(server)
        .await;
}

/// Answers every contents request under `repo` with 404.
pub async fn mount_no_published_documents(server: &MockServer, repo: &str) {
    Mock::given(method("GET"))
        .and(path_regex(format!("^/repos/{repo}/contents/.*$")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(server)
        .await;
}
