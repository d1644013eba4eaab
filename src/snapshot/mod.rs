//! Snapshots of the state: deep copies and structural comparison.
//!
//! The store captures a snapshot before every mutation and compares the
//! addressed parts of it with the mutated state to decide which listeners to
//! notify. Both halves live here:
//! - [`deep_clone`] produces an independent copy of the typed state
//! - [`Differ`] compares two JSON documents structurally

mod cloner;
mod diff;

pub use cloner::{deep_clone, to_document, CloneStrategy};
pub use diff::{Change, ChangeKind, Differ};
