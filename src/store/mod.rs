//! Bounded per-entity snapshot histories
//!
//! Each collection kind persists one history document: a map from entity identifier
//! to its metadata plus an ordered snapshot log, most-recent-last. Histories are
//! read at the start of a run, updated in memory, and written back at the end; no
//! state is shared between runs beyond these files.

use crate::Result;
use crate::fetch::hosting::RepoSnapshot;
use crate::fetch::package_index::PackageSnapshot;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use ohno::IntoAppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs;
use std::io;

/// Cap on per-entity history length; roughly two years of weekly snapshots.
/// Eviction is FIFO by insertion order, not by timestamp, so two runs on the
/// same day both count toward the cap.
pub const MAX_SNAPSHOTS: usize = 400;

/// One entity's identifying metadata plus its bounded snapshot log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry<M, S> {
    #[serde(flatten)]
    pub meta: M,
    pub snapshots: Vec<S>,
}

/// History metadata for a tracked repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMeta {
    pub name: String,
}

/// History metadata for a tracked package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMeta {
    pub name: String,
    pub repo_id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The persisted GitHub metrics history document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RepoHistory {
    #[serde(default)]
    pub repos: BTreeMap<String, HistoryEntry<RepoMeta, RepoSnapshot>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// The persisted PyPI metrics history document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PackageHistory {
    #[serde(default)]
    pub packages: BTreeMap<String, HistoryEntry<PackageMeta, PackageSnapshot>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Merge a freshly collected snapshot into the history map.
///
/// Looks up or creates the entity's entry, refreshes its metadata (it may drift
/// between runs, e.g. a descriptor's `type` changing), appends the snapshot, and
/// truncates to the newest [`MAX_SNAPSHOTS`] entries. Snapshots are never
/// deduplicated by content: two runs with identical inputs yield two entries.
pub fn record<M, S>(entries: &mut BTreeMap<String, HistoryEntry<M, S>>, key: &str, meta: M, snapshot: S) {
    let entry = match entries.entry(key.to_owned()) {
        Entry::Vacant(slot) => slot.insert(HistoryEntry { meta, snapshots: Vec::new() }),
        Entry::Occupied(slot) => {
            let entry = slot.into_mut();
            entry.meta = meta;
            entry
        }
    };

    entry.snapshots.push(snapshot);

    if entry.snapshots.len() > MAX_SNAPSHOTS {
        let excess = entry.snapshots.len() - MAX_SNAPSHOTS;
        let _ = entry.snapshots.drain(..excess);
    }
}

/// Load a persisted history document, or its empty default when the file does not
/// exist yet.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_or_default<T>(path: &Utf8Path) -> Result<T>
where
    T: Default + DeserializeOwned,
{
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).into_app_err_with(|| format!("unable to parse history file '{path}'")),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e).into_app_err_with(|| format!("unable to read history file '{path}'")),
    }
}
