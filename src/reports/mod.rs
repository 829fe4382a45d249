//! JSON report documents consumed by the static site
//!
//! All documents are written as UTF-8 JSON with 2-space indentation. Current-metrics
//! documents are fully overwritten each run; history documents are the read-modify-write
//! output of the snapshot store. Failure to persist a report is the only fatal condition
//! in normal operation besides total fetch failure.

use crate::Result;
use crate::fetch::forks::ForkRecord;
use crate::fetch::hosting::RepoSnapshot;
use crate::fetch::package_index::PackageSnapshot;
use camino::Utf8Path;
use chrono::{DateTime, Datelike, Utc};
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};

/// First year of the research program, used for the `yearsOfResearch` rollup.
const START_YEAR: i32 = 2019;

/// Current GitHub metrics: entity id to latest snapshot, fully replaced every run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RepoCurrent {
    pub repos: BTreeMap<String, RepoSnapshot>,
    pub last_updated: DateTime<Utc>,
}

/// Current PyPI metrics: package name to latest snapshot, fully replaced every run.
#[derive(Debug, Serialize, Deserialize)]
pub struct PackageCurrent {
    pub packages: BTreeMap<String, PackageSnapshot>,
    pub last_updated: DateTime<Utc>,
}

/// The fork-analysis document.
#[derive(Debug, Serialize, Deserialize)]
pub struct ForkReport {
    pub summary: ForkSummary,
    pub geographic_distribution: Vec<CountryCount>,
    pub active_forks: Vec<ForkRecord>,
    pub last_updated: DateTime<Utc>,
}

/// Aggregate fork counts.
///
/// The file-change counters are stubs carried from the original analysis and are
/// always zero until real change classification exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkSummary {
    pub total_forks: u64,
    pub active_forks: u64,
    pub meaningful_forks: u64,
    pub not_meaningful_forks: u64,
    pub meaningful_rate: f64,
    pub total_files_changed: u64,
    pub code_files: u64,
    pub config_files: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

/// The repository listing consumed by the site at build time.
#[derive(Debug, Serialize, Deserialize)]
pub struct RepositoriesDoc {
    pub repositories: Vec<Value>,

    #[serde(rename = "totalImplementations")]
    pub total_implementations: u64,

    #[serde(rename = "yearsOfResearch")]
    pub years_of_research: i32,

    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

/// Serialize a document to `path` as UTF-8 JSON with 2-space indentation, creating
/// parent directories as needed.
///
/// # Errors
///
/// Fails when the destination directory cannot be created or the file cannot be
/// written; callers treat this as fatal.
pub fn write_json<T: Serialize>(path: &Utf8Path, doc: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_app_err_with(|| format!("unable to create output directory '{parent}'"))?;
    }

    let file = File::create(path).into_app_err_with(|| format!("unable to create output file '{path}'"))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, doc).into_app_err_with(|| format!("unable to write output file '{path}'"))?;
    writer.flush().into_app_err_with(|| format!("unable to flush output file '{path}'"))
}

/// Compute the fork summary block.
///
/// `meaningful_ratio` is a placeholder not derived from real signal; it is threaded
/// through from the CLI pending product clarification of what "meaningful" means.
/// The rate is a percentage rounded to one decimal, 0 when there are no active forks.
#[must_use]
pub fn fork_summary(total_forks: u64, active_forks: u64, meaningful_ratio: f64) -> ForkSummary {
    #[expect(clippy::cast_precision_loss, reason = "fork counts are far below 2^52")]
    #[expect(clippy::cast_possible_truncation, reason = "product of count and ratio in [0, 1]")]
    #[expect(clippy::cast_sign_loss, reason = "ratio is non-negative")]
    let meaningful_forks = (active_forks as f64 * meaningful_ratio) as u64;

    #[expect(clippy::cast_precision_loss, reason = "fork counts are far below 2^52")]
    let meaningful_rate = if active_forks > 0 {
        (meaningful_forks as f64 / active_forks as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    ForkSummary {
        total_forks,
        active_forks,
        meaningful_forks,
        not_meaningful_forks: active_forks - meaningful_forks,
        meaningful_rate,
        total_files_changed: 0,
        code_files: 0,
        config_files: 0,
    }
}

/// Tally country labels into a distribution sorted descending by count
/// (ties broken by country name for stable output).
#[must_use]
pub fn geographic_distribution(countries: &[String]) -> Vec<CountryCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for country in countries {
        *counts.entry(country.as_str()).or_insert(0) += 1;
    }

    let mut distribution: Vec<CountryCount> = counts
        .into_iter()
        .map(|(country, count)| CountryCount {
            country: country.to_string(),
            count,
        })
        .collect();

    distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.country.cmp(&b.country)));
    distribution
}

/// Assemble the repository listing document from pre-validated raw descriptors.
///
/// Repositories are sorted by year descending, then name ascending.
/// `totalImplementations` counts every element of every descriptor's
/// `implementations` list.
#[must_use]
pub fn repositories_doc(mut repositories: Vec<Value>, now: DateTime<Utc>) -> RepositoriesDoc {
    repositories.sort_by(|a, b| {
        let year_a = a.get("year").and_then(Value::as_i64).unwrap_or(0);
        let year_b = b.get("year").and_then(Value::as_i64).unwrap_or(0);
        let name_a = a.get("name").and_then(Value::as_str).unwrap_or("");
        let name_b = b.get("name").and_then(Value::as_str).unwrap_or("");
        year_b.cmp(&year_a).then_with(|| name_a.cmp(name_b))
    });

    let total_implementations = repositories
        .iter()
        .filter_map(|repo| repo.get("implementations").and_then(Value::as_array))
        .map(|implementations| implementations.len() as u64)
        .sum();

    RepositoriesDoc {
        repositories,
        total_implementations,
        years_of_research: now.year() - START_YEAR + 1,
        last_updated: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::env;

    #[test]
    fn test_fork_summary_ratio() {
        let summary = fork_summary(250, 100, 0.42);

        assert_eq!(summary.active_forks, 100);
        assert_eq!(summary.meaningful_forks, 42);
        assert_eq!(summary.not_meaningful_forks, 58);
        assert!((summary.meaningful_rate - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fork_summary_no_active_forks() {
        let summary = fork_summary(10, 0, 0.42);
        assert_eq!(summary.meaningful_forks, 0);
        assert!((summary.meaningful_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fork_summary_rate_rounds_to_one_decimal() {
        // 2 of 3 forks: 66.666...% rounds to 66.7.
        let summary = fork_summary(3, 3, 0.67);
        assert_eq!(summary.meaningful_forks, 2);
        assert!((summary.meaningful_rate - 66.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_geographic_distribution_sorted_descending() {
        let countries = vec![
            "Canada".to_string(),
            "Germany".to_string(),
            "Canada".to_string(),
            "Other".to_string(),
            "Canada".to_string(),
            "Germany".to_string(),
        ];

        let distribution = geographic_distribution(&countries);

        assert_eq!(distribution.len(), 3);
        assert_eq!(distribution[0].country, "Canada");
        assert_eq!(distribution[0].count, 3);
        assert_eq!(distribution[1].country, "Germany");
        assert_eq!(distribution[2].country, "Other");
        assert_eq!(distribution[2].count, 1);
    }

    #[test]
    fn test_repositories_doc_sorting_and_counts() {
        let repositories: Vec<Value> = vec![
            serde_json::json!({"name": "Beta", "year": 2022, "implementations": [1, 2]}),
            serde_json::json!({"name": "Alpha", "year": 2024}),
            serde_json::json!({"name": "Gamma", "year": 2024, "implementations": [1, 2, 3]}),
        ];

        let now = "2026-08-30T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let doc = repositories_doc(repositories, now);

        let names: Vec<&str> = doc.repositories.iter().map(|repo| repo["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Alpha", "Gamma", "Beta"]);
        assert_eq!(doc.total_implementations, 5);
        assert_eq!(doc.years_of_research, 2026 - 2019 + 1);
    }

    #[test]
    fn test_write_json_creates_parents_and_indents() {
        let dir = Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap().join("catalog_metrics_reports_test");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("out.json");

        let doc = serde_json::json!({"outer": {"inner": 1}});
        write_json(&path, &doc).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"outer\""));
        assert!(text.contains("\n    \"inner\": 1"));

        let _ = fs::remove_dir_all(&dir);
    }
}
