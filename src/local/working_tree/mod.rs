//! Scratch clones of the documentation fork.
//!
//! The publisher edits the documentation through a [`WorkingTree`] obtained
//! from a [`WorkingTreeProvider`]. The git2 implementation clones the
//! upstream documentation repository into a scratch directory, commits on a
//! dedicated branch and force-pushes that branch to the fork. The scratch
//! directory is removed by [`WorkingTree::clear`], or when the tree is
//! dropped without being cleared.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Cred, FetchOptions, IndexAddOption, PushOptions, RemoteCallbacks, Repository, Signature};
use tracing::{debug, warn};

use crate::error::ReleaseError;
use crate::github::PersonalAccessToken;

/// A checked-out clone the publisher writes the document into.
pub trait WorkingTree {
    /// Checks out `branch` as it exists on the cloned remote.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Git`] when the remote has no such branch.
    fn checkout_existing(&mut self, branch: &str) -> Result<(), ReleaseError>;

    /// Creates `branch` at the current head and checks it out.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Git`] when the branch cannot be created.
    fn checkout_new(&mut self, branch: &str) -> Result<(), ReleaseError>;

    /// Writes `content` to `path`, relative to the clone root.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Io`] when the file cannot be written.
    fn write_file(&mut self, path: &Utf8Path, content: &str) -> Result<(), ReleaseError>;

    /// Stages every change and commits it with a sign-off line.
    ///
    /// Returns `false` without committing when the tree is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Git`] when staging or committing fails.
    fn commit(&mut self, message: &str) -> Result<bool, ReleaseError>;

    /// Force-pushes `branch` to the fork.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Git`] when the push is rejected.
    fn push(&mut self, branch: &str) -> Result<(), ReleaseError>;

    /// Removes the scratch directory.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Io`] when the directory cannot be removed.
    fn clear(self) -> Result<(), ReleaseError>;
}

/// Opens fresh working trees.
pub trait WorkingTreeProvider {
    /// Tree type handed out by this provider.
    type Tree: WorkingTree;

    /// Clones into the scratch directory `dir_name`, replacing any stale
    /// copy left by an earlier run.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Git`] when cloning fails and
    /// [`ReleaseError::Io`] when the scratch directory cannot be prepared.
    fn open(&self, dir_name: &str) -> Result<Self::Tree, ReleaseError>;
}

/// Credentials used for clone and push over HTTPS.
#[derive(Debug, Clone)]
pub struct GitCredentials {
    username: String,
    token: PersonalAccessToken,
}

impl GitCredentials {
    /// Creates credentials for `username` authenticated by `token`.
    #[must_use]
    pub fn new(username: impl Into<String>, token: PersonalAccessToken) -> Self {
        Self {
            username: username.into(),
            token,
        }
    }

    fn callbacks(&self) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|_url, _username, _allowed| {
            Cred::userpass_plaintext(&self.username, self.token.value())
        });
        callbacks
    }
}

/// Commit author and sign-off identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitAuthor {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl GitAuthor {
    /// Author derived from a GitHub login, using its no-reply address.
    #[must_use]
    pub fn for_login(login: &str) -> Self {
        Self {
            name: login.to_owned(),
            email: format!("{login}@users.noreply.github.com"),
        }
    }

    fn sign_off(&self, message: &str) -> String {
        format!("{message}\n\nSigned-off-by: {} <{}>\n", self.name, self.email)
    }
}

/// [`WorkingTreeProvider`] backed by git2.
#[derive(Debug, Clone)]
pub struct Git2Provider {
    git_dir: Utf8PathBuf,
    clone_url: String,
    push_url: String,
    credentials: Option<GitCredentials>,
    author: GitAuthor,
}

impl Git2Provider {
    /// Clones from `clone_url` into directories below `git_dir` and pushes
    /// to `push_url`.
    #[must_use]
    pub fn new(
        git_dir: impl Into<Utf8PathBuf>,
        clone_url: impl Into<String>,
        push_url: impl Into<String>,
        author: GitAuthor,
    ) -> Self {
        Self {
            git_dir: git_dir.into(),
            clone_url: clone_url.into(),
            push_url: push_url.into(),
            credentials: None,
            author,
        }
    }

    /// Authenticates clone and push with `credentials`.
    #[must_use]
    pub fn with_credentials(mut self, credentials: GitCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn prepare_scratch(&self, dir_name: &str) -> Result<Utf8PathBuf, ReleaseError> {
        if dir_name.is_empty() || dir_name.contains(['/', '\\']) || dir_name == ".." {
            return Err(ReleaseError::malformed(
                dir_name,
                "scratch directory must be a single path component",
            ));
        }
        Dir::create_ambient_dir_all(&self.git_dir, cap_std::ambient_authority())
            .map_err(|e| ReleaseError::io(&e, "create git directory"))?;
        let base = Dir::open_ambient_dir(&self.git_dir, cap_std::ambient_authority())
            .map_err(|e| ReleaseError::io(&e, "open git directory"))?;
        if base.exists(dir_name) {
            debug!(dir = dir_name, "removing stale scratch clone");
            base.remove_dir_all(dir_name)
                .map_err(|e| ReleaseError::io(&e, "remove stale scratch clone"))?;
        }
        Ok(self.git_dir.join(dir_name))
    }
}

impl WorkingTreeProvider for Git2Provider {
    type Tree = Git2WorkingTree;

    fn open(&self, dir_name: &str) -> Result<Self::Tree, ReleaseError> {
        let path = self.prepare_scratch(dir_name)?;

        let mut fetch = FetchOptions::new();
        if let Some(credentials) = &self.credentials {
            fetch.remote_callbacks(credentials.callbacks());
        }
        let repo = RepoBuilder::new()
            .fetch_options(fetch)
            .clone(&self.clone_url, path.as_std_path())?;
        debug!(path = %path, "cloned documentation repository");

        Ok(Git2WorkingTree {
            repo,
            root: path,
            push_url: self.push_url.clone(),
            credentials: self.credentials.clone(),
            author: self.author.clone(),
            cleared: false,
        })
    }
}

/// A scratch clone driven through git2.
pub struct Git2WorkingTree {
    repo: Repository,
    root: Utf8PathBuf,
    push_url: String,
    credentials: Option<GitCredentials>,
    author: GitAuthor,
    cleared: bool,
}

impl std::fmt::Debug for Git2WorkingTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git2WorkingTree")
            .field("root", &self.root)
            .field("push_url", &self.push_url)
            .field("repo", &"<git2::Repository>")
            .finish_non_exhaustive()
    }
}

impl Git2WorkingTree {
    /// Root of the scratch clone.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn switch_to(&self, branch: &str) -> Result<(), ReleaseError> {
        self.repo.set_head(&format!("refs/heads/{branch}"))?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))?;
        Ok(())
    }

    fn remove_scratch(&self) -> Result<(), ReleaseError> {
        let (Some(parent), Some(name)) = (self.root.parent(), self.root.file_name()) else {
            return Ok(());
        };
        let base = Dir::open_ambient_dir(parent, cap_std::ambient_authority())
            .map_err(|e| ReleaseError::io(&e, "open git directory"))?;
        base.remove_dir_all(name)
            .map_err(|e| ReleaseError::io(&e, "remove scratch clone"))
    }
}

impl WorkingTree for Git2WorkingTree {
    fn checkout_existing(&mut self, branch: &str) -> Result<(), ReleaseError> {
        let remote = self
            .repo
            .find_reference(&format!("refs/remotes/origin/{branch}"))?;
        let commit = remote.peel_to_commit()?;
        self.repo.branch(branch, &commit, true)?;
        self.switch_to(branch)
    }

    fn checkout_new(&mut self, branch: &str) -> Result<(), ReleaseError> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.branch(branch, &head, false)?;
        self.switch_to(branch)
    }

    fn write_file(&mut self, path: &Utf8Path, content: &str) -> Result<(), ReleaseError> {
        let root = Dir::open_ambient_dir(&self.root, cap_std::ambient_authority())
            .map_err(|e| ReleaseError::io(&e, "open scratch clone"))?;
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            root.create_dir_all(parent)
                .map_err(|e| ReleaseError::io(&e, "create document directory"))?;
        }
        root.write(path, content)
            .map_err(|e| ReleaseError::io(&e, "write document"))
    }

    fn commit(&mut self, message: &str) -> Result<bool, ReleaseError> {
        let mut index = self.repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = self.repo.head()?.peel_to_commit()?;
        if parent.tree_id() == tree_id {
            return Ok(false);
        }

        let tree = self.repo.find_tree(tree_id)?;
        let signature = Signature::now(&self.author.name, &self.author.email)?;
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &self.author.sign_off(message),
            &tree,
            &[&parent],
        )?;
        Ok(true)
    }

    fn push(&mut self, branch: &str) -> Result<(), ReleaseError> {
        let mut remote = self.repo.remote_anonymous(&self.push_url)?;
        let mut callbacks = self
            .credentials
            .as_ref()
            .map_or_else(RemoteCallbacks::new, GitCredentials::callbacks);
        callbacks.push_update_reference(|reference, status| {
            status.map_or(Ok(()), |message| {
                Err(git2::Error::from_str(&format!(
                    "{reference} rejected: {message}"
                )))
            })
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);
        let refspec = format!("+refs/heads/{branch}:refs/heads/{branch}");
        remote.push(&[refspec.as_str()], Some(&mut options))?;
        debug!(branch, "pushed branch to fork");
        Ok(())
    }

    fn clear(mut self) -> Result<(), ReleaseError> {
        self.cleared = true;
        self.remove_scratch()
    }
}

impl Drop for Git2WorkingTree {
    fn drop(&mut self) {
        if self.cleared {
            return;
        }
        if let Err(error) = self.remove_scratch() {
            warn!(root = %self.root, %error, "failed to remove scratch clone");
        }
    }
}
