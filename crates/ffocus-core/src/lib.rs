#![forbid(unsafe_code)]

//! FrankenFocus Core
//!
//! Pure building blocks for post-mutation reconciliation: immutable
//! collection snapshots, the pagination mapper, mutation intents, the target
//! resolver, and the delete successor selector.
//!
//! # Role in FrankenFocus
//! `ffocus-core` has no clock, no I/O, and no notion of a rendering surface.
//! Everything here is a function of its inputs, which keeps the interesting
//! edge cases (stale snapshots, concurrent deletes, unknown ids) testable in
//! isolation. `ffocus-runtime` composes these pieces into the message-driven
//! engine.

pub mod intent;
pub mod pagination;
pub mod record;
pub mod resolver;
pub mod snapshot;
pub mod successor;

pub use intent::{Intent, MutationKind};
pub use pagination::{PagePosition, ViewportCursor, absolute_index, page_count, page_position};
pub use record::Record;
pub use resolver::{Resolution, locate, resolve};
pub use snapshot::{QueryParams, SortDirection, SortSpec, Snapshot};
pub use successor::{Successor, select_successor};
