#![forbid(unsafe_code)]

//! FrankenFocus Runtime
//!
//! This crate turns the pure pieces of `ffocus-core` into a message-driven
//! engine that keeps a paginated list view focused on the record a mutation
//! touched, across asynchronous refetches.
//!
//! # Key Components
//!
//! - [`Engine`] - Single entry point; consumes [`Msg`]s
//! - [`RequestQueue`] - One pending intent per mutation kind, with budget
//! - [`RetryScheduler`] - Capped deferred re-checks while the view settles
//! - [`NavigationDriver`] - Page change, acknowledgment wait, select, scroll
//! - [`HighlightTimer`] - Transient emphasis, one per kind, with change listeners
//! - [`ViewSurface`] - Trait the list view implements
//! - [`ReconcileConfig`] - Policy-as-data for every budget and timeout
//!
//! # How it fits in the system
//! The data layer sends snapshots and mutation results in, the list view
//! sends page acknowledgments in, and the host delivers [`Msg::Tick`] at
//! the instant [`Engine::update`] returns. Nothing here spawns threads or
//! blocks.

pub mod config;
pub mod engine;
pub mod highlight;
pub mod navigation;
pub mod queue;
pub mod scheduler;
pub mod surface;

pub use config::{ConfigError, ReconcileConfig};
pub use engine::{Engine, Msg, MutationOutcome, ReconcileStats};
pub use highlight::{HighlightChange, HighlightEntry, HighlightSubscription, HighlightTimer};
pub use navigation::{NavStep, NavigationDriver, PageWaitEnd};
pub use queue::{ExpireReason, Observation, RequestQueue, RequestState};
pub use scheduler::{DueRecheck, ParkOutcome, RetryScheduler};
pub use surface::{SurfaceCommand, ViewSurface};
