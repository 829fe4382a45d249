//! Metric fetching from external services
//!
//! This module gathers point-in-time measurements for catalog entities from two
//! sources: the GitHub CLI (`gh`) for repository and fork data, and the PyPI /
//! PyPI Stats HTTP APIs for package download data.
//!
//! # Implementation Model
//!
//! Every fetch operation is read-only and failure-tolerant: a transport or decode
//! failure for one entity is logged and surfaces as "no data" for the affected
//! fields, never aborting the overall run. Snapshots are created fully populated
//! with zero/null defaults and fields are overwritten only when the corresponding
//! remote field is present.

pub mod forks;
mod gh;
pub mod hosting;
pub mod package_index;

pub use gh::GhClient;
