//! Diff collection and file categorization.
//!
//! Retrieves per-file diffs for a pull request through a [`source::DiffSource`]
//! (the `git` CLI in production) and sorts the changed paths into models,
//! migrations, and everything else.

pub mod classify;
pub mod collect;
pub mod source;
