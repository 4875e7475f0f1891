#![forbid(unsafe_code)]

//! Test harness and reference fixtures for FrankenFocus.
//!
//! - [`RecordingSurface`] - a list view that records engine commands
//! - [`Scenario`] - engine + surface + virtual clock, playing the host
//! - [`fixtures`] - country and file-manager records and snapshot builders

pub mod fixtures;
pub mod scenario;
pub mod surface;

pub use fixtures::{Country, FileEntry};
pub use scenario::Scenario;
pub use surface::{AckMode, RecordingSurface};
