//! Release-note assembly: extraction, document merging, rendering and
//! publication.
//!
//! A [`Product`] names the repositories whose merged pull requests feed one
//! [`ReleaseNoteDocument`]. The [`ReleasePublisher`] drives a run: it loads
//! the published document, lets the [`ReleaseNoteAssembler`] merge fresh
//! notes, renders the result and proposes it to the documentation
//! repository.

pub mod assembler;
pub mod collector;
pub mod document;
pub mod extract;
pub mod milestone;
pub mod product;
pub mod publish;
pub mod render;
pub mod structure;
pub mod version;

pub use assembler::{AssemblyReport, ReleaseNoteAssembler};
pub use collector::{DocsLocation, NoteCollector};
pub use document::{Category, MergeOutcome, ReleaseNote, ReleaseNoteDocument, RepoReleaseNotes};
pub use extract::{extract_release_note, has_release_note};
pub use milestone::{ALL_MILESTONES, MilestoneContents, MilestoneResolver, MilestoneTarget};
pub use product::{OTHERS, Product};
pub use publish::{
    MilestoneReport, PublishOutcome, PublishSettings, ReleasePublisher, branch_name, ensure_fork,
};
pub use render::render;
pub use structure::{StructureNode, flat_structure, parse_structure};
pub use version::release_branch;
