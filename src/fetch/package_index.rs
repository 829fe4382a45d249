use crate::Result;
use crate::catalog::PackageEntry;
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use core::time::Duration;
use ohno::IntoAppError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LOG_TARGET: &str = "      pypi";

const PYPISTATS_URL: &str = "https://pypistats.org/api/packages";
const PYPI_URL: &str = "https://pypi.org/pypi";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Download rows are filtered to this category; the mirror-inclusive series
/// double-counts automated mirror traffic.
const WITHOUT_MIRRORS: &str = "without_mirrors";

/// Fixed delay observed between package lookups to respect the PyPI Stats rate limit.
pub const INTER_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// One point-in-time measurement of a PyPI package. All measured fields are nullable;
/// a failed or empty upstream response leaves them `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSnapshot {
    pub repo_id: String,
    pub name: String,
    pub package_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub downloads_last_day: Option<u64>,
    pub downloads_last_week: Option<u64>,
    pub downloads_last_month: Option<u64>,
    pub total_downloads: Option<u64>,
    pub version: Option<String>,
    pub release_date: Option<String>,
}

impl PackageSnapshot {
    /// True when neither the stats nor the metadata query produced any data.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_downloads.is_none() && self.version.is_none()
    }
}

/// One day of the PyPI Stats `overall` time series.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRow {
    pub category: String,
    pub date: NaiveDate,
    pub downloads: u64,
}

#[derive(Debug, Deserialize)]
struct OverallResponse {
    #[serde(default)]
    data: Vec<DownloadRow>,
}

#[derive(Debug, Deserialize)]
struct PackageMetadata {
    info: PackageInfo,
    #[serde(default)]
    releases: BTreeMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Deserialize)]
struct PackageInfo {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    #[serde(default)]
    upload_time: Option<String>,
}

/// Trailing download sums computed from the raw daily time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadWindows {
    pub last_day: Option<u64>,
    pub last_week: Option<u64>,
    pub last_month: Option<u64>,
    pub total: Option<u64>,
}

/// Build the shared HTTP client for package-index queries.
///
/// # Errors
///
/// Fails when the TLS backend cannot be initialized.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent("catalog-metrics")
        .timeout(REQUEST_TIMEOUT)
        .build()
        .into_app_err("unable to build HTTP client")
}

/// Fetch a metric snapshot for one package.
///
/// Transport and decode failures are logged and leave the affected fields `null`;
/// this function never aborts the batch.
pub async fn fetch_package_snapshot(client: &Client, entry: &PackageEntry) -> PackageSnapshot {
    let package_name = &entry.package_name;
    println!("Fetching metrics for {package_name}...");

    let mut snapshot = PackageSnapshot {
        repo_id: entry.repo_id.clone(),
        name: entry.name.clone(),
        package_name: package_name.clone(),
        kind: entry.kind.clone(),
        timestamp: Utc::now(),
        downloads_last_day: None,
        downloads_last_week: None,
        downloads_last_month: None,
        total_downloads: None,
        version: None,
        release_date: None,
    };

    // The raw time series is more accurate than the aggregate "recent" endpoint,
    // which includes mirror traffic.
    let overall_url = format!("{PYPISTATS_URL}/{package_name}/overall");
    if let Some(overall) = get_json::<OverallResponse>(client, &overall_url).await {
        let windows = window_sums(&overall.data, Local::now().date_naive());
        snapshot.downloads_last_day = windows.last_day;
        snapshot.downloads_last_week = windows.last_week;
        snapshot.downloads_last_month = windows.last_month;
        snapshot.total_downloads = windows.total;
    }

    let metadata_url = format!("{PYPI_URL}/{package_name}/json");
    if let Some(metadata) = get_json::<PackageMetadata>(client, &metadata_url).await {
        snapshot.version = metadata.info.version;

        if let Some(version) = &snapshot.version {
            snapshot.release_date = metadata
                .releases
                .get(version)
                .and_then(|files| files.first())
                .and_then(|file| file.upload_time.clone());
        }
    }

    snapshot
}

/// Compute trailing 1/7/30-day and total download sums from the daily series.
///
/// Only `without_mirrors` rows count. The "last day" window resolves to the most
/// recently complete calendar day (yesterday relative to `today`), never the partial
/// current day, to avoid undercounting in-flight data. The 7- and 30-day windows are
/// inclusive of their boundary. Zero sums map to `None` ("no data").
#[must_use]
pub fn window_sums(rows: &[DownloadRow], today: NaiveDate) -> DownloadWindows {
    let yesterday = today - Days::new(1);

    let mut last_day = 0_u64;
    let mut last_week = 0_u64;
    let mut last_month = 0_u64;
    let mut total = 0_u64;

    for row in rows.iter().filter(|row| row.category == WITHOUT_MIRRORS) {
        total += row.downloads;

        if row.date == yesterday {
            last_day += row.downloads;
        }

        let age_days = (today - row.date).num_days();
        if age_days <= 7 {
            last_week += row.downloads;
        }
        if age_days <= 30 {
            last_month += row.downloads;
        }
    }

    DownloadWindows {
        last_day: (last_day > 0).then_some(last_day),
        last_week: (last_week > 0).then_some(last_week),
        last_month: (last_month > 0).then_some(last_month),
        total: (total > 0).then_some(total),
    }
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Option<T> {
    let response = match client.get(url).send().await.and_then(reqwest::Response::error_for_status) {
        Ok(response) => response,
        Err(e) => {
            log::error!(target: LOG_TARGET, "Error fetching '{url}': {e}");
            return None;
        }
    };

    match response.json::<T>().await {
        Ok(data) => Some(data),
        Err(e) => {
            log::error!(target: LOG_TARGET, "Error decoding response from '{url}': {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(today: NaiveDate, age: u64) -> NaiveDate {
        today - Days::new(age)
    }

    fn row(date: NaiveDate, category: &str, downloads: u64) -> DownloadRow {
        DownloadRow {
            category: category.to_string(),
            date,
            downloads,
        }
    }

    #[test]
    fn test_windows_over_dense_series() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();

        // One download per day for every day in [today-40, today].
        let rows: Vec<DownloadRow> = (0..=40).map(|age| row(day(today, age), WITHOUT_MIRRORS, 1)).collect();

        let windows = window_sums(&rows, today);

        // Only the entry dated yesterday.
        assert_eq!(windows.last_day, Some(1));
        // Ages 0..=7, boundary inclusive.
        assert_eq!(windows.last_week, Some(8));
        // Ages 0..=30, boundary inclusive.
        assert_eq!(windows.last_month, Some(31));
        assert_eq!(windows.total, Some(41));
    }

    #[test]
    fn test_mirror_rows_excluded() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let rows = vec![
            row(day(today, 1), WITHOUT_MIRRORS, 10),
            row(day(today, 1), "with_mirrors", 1000),
        ];

        let windows = window_sums(&rows, today);
        assert_eq!(windows.last_day, Some(10));
        assert_eq!(windows.total, Some(10));
    }

    #[test]
    fn test_zero_sums_are_no_data() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();

        let windows = window_sums(&[], today);
        assert_eq!(windows.last_day, None);
        assert_eq!(windows.last_week, None);
        assert_eq!(windows.last_month, None);
        assert_eq!(windows.total, None);

        // Old rows contribute to the total but not to any trailing window.
        let rows = vec![row(day(today, 200), WITHOUT_MIRRORS, 7)];
        let windows = window_sums(&rows, today);
        assert_eq!(windows.last_month, None);
        assert_eq!(windows.total, Some(7));
    }

    #[test]
    fn test_overall_response_decodes() {
        let overall: OverallResponse = serde_json::from_str(
            r#"{"data": [{"category": "without_mirrors", "date": "2026-08-29", "downloads": 12}], "package": "pycyclops", "type": "overall_downloads"}"#,
        )
        .unwrap();

        assert_eq!(overall.data.len(), 1);
        assert_eq!(overall.data[0].downloads, 12);
    }

    #[test]
    fn test_release_date_lookup() {
        let metadata: PackageMetadata = serde_json::from_str(
            r#"{
                "info": {"version": "0.2.0"},
                "releases": {
                    "0.1.0": [{"upload_time": "2023-01-01T00:00:00"}],
                    "0.2.0": [{"upload_time": "2024-03-05T12:00:00"}]
                }
            }"#,
        )
        .unwrap();

        let version = metadata.info.version.as_deref().unwrap();
        let release_date = metadata.releases.get(version).and_then(|files| files.first()).and_then(|file| file.upload_time.clone());

        assert_eq!(version, "0.2.0");
        assert_eq!(release_date.as_deref(), Some("2024-03-05T12:00:00"));
    }
}
