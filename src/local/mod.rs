//! Local git working trees used to publish release notes.

mod working_tree;

pub use working_tree::{
    Git2Provider, Git2WorkingTree, GitAuthor, GitCredentials, WorkingTree, WorkingTreeProvider,
};
