use crate::catalog::RepoId;
use crate::fetch::GhClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "   hosting";

/// One point-in-time measurement of a repository.
///
/// Counters default to zero and nullable fields to `null`; both are overwritten only
/// when the corresponding remote field is present. Traffic fields require push access
/// to the repository and stay `null` when that access is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub repo_id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub size: u64,
    pub views_14d: Option<u64>,
    pub unique_visitors_14d: Option<u64>,
    pub clones_14d: Option<u64>,
    pub unique_cloners_14d: Option<u64>,
    pub language: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub topics: Vec<String>,
}

/// The subset of the `repos/{owner}/{repo}` response this tool consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RepoInfo {
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub subscribers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// The 14-day rollup shape shared by the traffic views and clones endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TrafficStats {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub uniques: Option<u64>,
}

/// An entry of the `orgs/{org}/repos` listing.
#[derive(Debug, Clone, Deserialize)]
struct OrgRepo {
    name: String,
    full_name: String,
}

/// Fetch a metric snapshot for one repository.
///
/// Never fails: when the basic repository query yields no data, the snapshot is
/// recorded anyway with zeroed counters and `null` fields, so the entity keeps its
/// place in the current document and history. Traffic query failures likewise leave
/// the corresponding fields `null`.
pub async fn fetch_repo_snapshot(gh: &GhClient, repo_id: &RepoId) -> RepoSnapshot {
    println!("Fetching metrics for {repo_id}...");

    let Some(info) = gh.api_as::<RepoInfo>(&[&format!("repos/{repo_id}")]).await else {
        log::error!(target: LOG_TARGET, "Could not fetch repository info for '{repo_id}'; recording an empty snapshot");
        return assemble_snapshot(repo_id, &RepoInfo::default(), None, None, Utc::now());
    };

    let views = gh.api_as::<TrafficStats>(&[&format!("repos/{repo_id}/traffic/views")]).await;
    let clones = gh.api_as::<TrafficStats>(&[&format!("repos/{repo_id}/traffic/clones")]).await;

    assemble_snapshot(repo_id, &info, views.as_ref(), clones.as_ref(), Utc::now())
}

fn assemble_snapshot(
    repo_id: &RepoId,
    info: &RepoInfo,
    views: Option<&TrafficStats>,
    clones: Option<&TrafficStats>,
    timestamp: DateTime<Utc>,
) -> RepoSnapshot {
    RepoSnapshot {
        repo_id: repo_id.to_string(),
        name: repo_id.name().to_string(),
        timestamp,
        stars: info.stargazers_count,
        forks: info.forks_count,
        watchers: info.subscribers_count,
        open_issues: info.open_issues_count,
        size: info.size,
        views_14d: views.and_then(|traffic| traffic.count),
        unique_visitors_14d: views.and_then(|traffic| traffic.uniques),
        clones_14d: clones.and_then(|traffic| traffic.count),
        unique_cloners_14d: clones.and_then(|traffic| traffic.uniques),
        language: info.language.clone(),
        created_at: info.created_at.clone(),
        updated_at: info.updated_at.clone(),
        topics: info.topics.clone(),
    }
}

/// Discover repositories in `org` whose names start with `prefix`.
///
/// Discovery failure is non-fatal: a warning is logged and an empty list returned,
/// since template repositories only supplement the descriptor-derived set.
pub async fn discover_template_repos(gh: &GhClient, org: &str, prefix: &str) -> Vec<String> {
    println!("Discovering template repositories...");

    let Some(items) = gh.api_paginated(&format!("orgs/{org}/repos")).await else {
        log::warn!(target: LOG_TARGET, "Could not fetch template repos for organization '{org}'");
        return Vec::new();
    };

    let repos: Vec<String> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<OrgRepo>(item).ok())
        .filter(|repo| repo.name.starts_with(prefix))
        .map(|repo| repo.full_name)
        .collect();

    println!("Found {} template repositories", repos.len());
    repos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_id() -> RepoId {
        RepoId::parse("VectorInstitute/cyclops").unwrap()
    }

    #[test]
    fn test_assemble_snapshot_defaults() {
        let snapshot = assemble_snapshot(&repo_id(), &RepoInfo::default(), None, None, Utc::now());

        assert_eq!(snapshot.repo_id, "VectorInstitute/cyclops");
        assert_eq!(snapshot.name, "cyclops");
        assert_eq!(snapshot.stars, 0);
        assert_eq!(snapshot.views_14d, None);
        assert_eq!(snapshot.unique_cloners_14d, None);
        assert_eq!(snapshot.language, None);
        assert!(snapshot.topics.is_empty());
    }

    #[test]
    fn test_assemble_snapshot_overwrites_present_fields() {
        let info: RepoInfo = serde_json::from_str(
            r#"{
                "stargazers_count": 120,
                "forks_count": 30,
                "subscribers_count": 8,
                "open_issues_count": 4,
                "size": 2048,
                "language": "Python",
                "created_at": "2022-01-01T00:00:00Z",
                "updated_at": "2024-06-01T00:00:00Z",
                "topics": ["ml", "health"]
            }"#,
        )
        .unwrap();
        let views = TrafficStats {
            count: Some(55),
            uniques: Some(21),
        };

        let snapshot = assemble_snapshot(&repo_id(), &info, Some(&views), None, Utc::now());

        assert_eq!(snapshot.stars, 120);
        assert_eq!(snapshot.watchers, 8);
        assert_eq!(snapshot.views_14d, Some(55));
        assert_eq!(snapshot.unique_visitors_14d, Some(21));
        assert_eq!(snapshot.clones_14d, None);
        assert_eq!(snapshot.language.as_deref(), Some("Python"));
        assert_eq!(snapshot.topics, vec!["ml".to_string(), "health".to_string()]);
    }

    #[test]
    fn test_repo_info_tolerates_missing_fields() {
        // GitHub omits fields we don't have permission to see; all must default.
        let info: RepoInfo = serde_json::from_str(r#"{"stargazers_count": 3}"#).unwrap();
        assert_eq!(info.stargazers_count, 3);
        assert_eq!(info.forks_count, 0);
        assert_eq!(info.language, None);
    }

    #[tokio::test]
    async fn test_unreachable_repo_still_yields_empty_snapshot() {
        // A failing base query must not drop the entity; it gets a zeroed snapshot.
        let gh = GhClient::with_program("gh-missing-binary-for-tests");
        let snapshot = fetch_repo_snapshot(&gh, &repo_id()).await;

        assert_eq!(snapshot.repo_id, "VectorInstitute/cyclops");
        assert_eq!(snapshot.stars, 0);
        assert_eq!(snapshot.forks, 0);
        assert_eq!(snapshot.views_14d, None);
        assert_eq!(snapshot.language, None);
    }

    #[test]
    fn test_snapshot_serializes_nulls_not_absent_keys() {
        let snapshot = assemble_snapshot(&repo_id(), &RepoInfo::default(), None, None, Utc::now());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert!(json.get("views_14d").is_some_and(serde_json::Value::is_null));
        assert!(json.get("language").is_some_and(serde_json::Value::is_null));
    }
}
