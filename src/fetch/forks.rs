use crate::catalog::RepoId;
use crate::fetch::GhClient;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "     forks";

/// One fork from the `repos/{owner}/{repo}/forks` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Fork {
    pub name: String,
    pub full_name: String,
    pub owner: ForkOwner,
    pub html_url: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForkOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Comparison {
    #[serde(default)]
    ahead_by: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct UserProfile {
    #[serde(default)]
    location: Option<String>,
}

/// An active fork (at least one commit ahead of its parent) with the collected
/// ownership and geography data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkRecord {
    pub fork_owner: String,
    pub fork_name: String,
    pub fork_url: String,
    pub parent_repo: String,
    pub commits_ahead: u64,
    pub location: Option<String>,
    pub country: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Fetch every fork of `repo_id`. A listing failure yields an empty list.
pub async fn fetch_forks(gh: &GhClient, repo_id: &RepoId) -> Vec<Fork> {
    println!("  Fetching forks for {repo_id}...");

    match gh.api_paginated(&format!("repos/{repo_id}/forks")).await {
        Some(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Fork>(item) {
                Ok(fork) => Some(fork),
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Skipping malformed fork entry for '{repo_id}': {e}");
                    None
                }
            })
            .collect(),
        None => Vec::new(),
    }
}

/// Count the commits a fork is ahead of its parent's default branch.
///
/// Returns 0 when the comparison fails or reports no divergence; a count of zero
/// means "inactive", not an error.
pub async fn commits_ahead(gh: &GhClient, parent: &RepoId, fork: &Fork) -> u64 {
    let basehead = format!("{}:main...{}:main", parent.owner(), fork.full_name.replace('/', ":"));
    let path = format!("repos/{parent}/compare/{basehead}");

    gh.api_as::<Comparison>(&[&path, "-X", "GET"])
        .await
        .and_then(|comparison| comparison.ahead_by)
        .unwrap_or(0)
}

/// Look up a fork owner's free-text profile location.
pub async fn owner_location(gh: &GhClient, login: &str) -> Option<String> {
    gh.api_as::<UserProfile>(&[&format!("users/{login}"), "-X", "GET"])
        .await
        .and_then(|profile| profile.location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fork_listing_decodes() {
        let fork: Fork = serde_json::from_str(
            r#"{
                "name": "cyclops",
                "full_name": "someone/cyclops",
                "owner": {"login": "someone"},
                "html_url": "https://github.com/someone/cyclops",
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-02-01T00:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(fork.owner.login, "someone");
        assert_eq!(fork.full_name, "someone/cyclops");
    }

    #[test]
    fn test_comparison_tolerates_missing_ahead_by() {
        let comparison: Comparison = serde_json::from_str(r#"{"status": "identical"}"#).unwrap();
        assert_eq!(comparison.ahead_by, None);

        let comparison: Comparison = serde_json::from_str(r#"{"ahead_by": 3, "behind_by": 1}"#).unwrap();
        assert_eq!(comparison.ahead_by, Some(3));
    }
}
