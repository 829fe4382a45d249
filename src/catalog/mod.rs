//! Repository descriptor handling
//!
//! The catalog is described by a directory of YAML files, one per tracked repository.
//! Each descriptor carries identifying metadata (`repo_id`, `name`, `type`, `year`) plus
//! optional fields such as `package_name` for repositories that publish to PyPI.
//!
//! Descriptors are loaded in two shapes: as typed [`Descriptor`] records for the metric
//! collection paths, and as raw JSON values for the sync path, which round-trips the
//! full YAML content (including fields this tool doesn't interpret) into the site's
//! `repositories.json`.

mod descriptor;
mod repo_id;

pub use descriptor::{Descriptor, PackageEntry, has_required_fields, load_descriptors, load_raw_descriptors, package_entries};
pub use repo_id::RepoId;
