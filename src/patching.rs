//! Merge-only structured patch engine for append-only record files.
//!
//! Proposals come from an untrusted upstream step. Each one passes, in order:
//! shape validation, the path sandbox, the content scanner, a fresh read of
//! the target, unique-anchor lookup, planning and the invariant checks. Preview
//! stops there and renders a diff; Apply re-runs everything and swaps the file
//! in atomically.
mod anchor;
mod diff;
mod error;
mod filesystem;
mod invariants;
mod model;
mod orchestrator;
mod planning;
mod safety;
mod sandbox;

pub use error::{PatchError, RequestError};
pub use model::{
    ApplyReport, ApplyRequest, PatchPreview, PatchProposal, PatchResult, PreviewReport,
    PreviewRequest,
};
pub use orchestrator::Engine;
