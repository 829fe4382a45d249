use super::common::{CommonArgs, init_logging, print_banner, print_summary, validate_outputs};
use camino::{Utf8Path, Utf8PathBuf};
use catalog_metrics::Result;
use catalog_metrics::catalog;
use catalog_metrics::fetch::package_index::{self, PackageSnapshot};
use catalog_metrics::reports::{self, PackageCurrent};
use catalog_metrics::store::{self, PackageHistory, PackageMeta};
use chrono::Utc;
use clap::Parser;
use std::collections::BTreeMap;

#[derive(Parser, Debug)]
pub struct PackagesArgs {
    /// Directory where the JSON documents are written
    #[arg(long, value_name = "PATH", default_value = "catalog/public/data")]
    pub output_dir: Utf8PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn collect_packages(args: &PackagesArgs) -> Result<()> {
    init_logging(args.common.log_level);
    print_banner("Implementation Catalog - PyPI Metrics Collection");

    println!("Reading repository configurations...");
    let descriptors = catalog::load_descriptors(&args.common.repos_dir)?;
    let packages = catalog::package_entries(&descriptors);

    let current_path = args.output_dir.join("pypi_metrics.json");
    let history_path = args.output_dir.join("pypi_metrics_history.json");
    let mut history: PackageHistory = store::load_or_default(&history_path)?;

    if packages.is_empty() {
        // Still emit valid empty documents so the site build doesn't break.
        println!("No packages with package_name field found in YAML files.");
        println!("This is expected if no tools have PyPI packages yet.");
        write_documents(&current_path, &history_path, BTreeMap::new(), &history)?;
        println!("✓ Created empty PyPI metrics files (no packages to track)");
        return Ok(());
    }

    println!("Found {} packages to track\n", packages.len());
    println!("Loaded historical data (tracking {} packages)\n", history.packages.len());

    let client = package_index::http_client()?;
    let mut current = BTreeMap::new();
    let mut failed = Vec::new();

    for entry in &packages {
        let snapshot = package_index::fetch_package_snapshot(&client, entry).await;

        // Entities whose every query came back empty are still recorded (with null
        // fields) but counted as failures in the summary.
        if snapshot.is_empty() {
            failed.push(entry.package_name.clone());
        }

        println!(
            "  v{} | last day: {} | last week: {} | last month: {}\n",
            snapshot.version.as_deref().unwrap_or("N/A"),
            format_count(snapshot.downloads_last_day),
            format_count(snapshot.downloads_last_week),
            format_count(snapshot.downloads_last_month),
        );

        store::record(
            &mut history.packages,
            &entry.package_name,
            PackageMeta {
                name: entry.name.clone(),
                repo_id: entry.repo_id.clone(),
                kind: entry.kind.clone(),
            },
            snapshot.clone(),
        );
        history.last_updated = Some(snapshot.timestamp);
        let _ = current.insert(entry.package_name.clone(), snapshot);

        // Be nice to the API.
        tokio::time::sleep(package_index::INTER_REQUEST_DELAY).await;
    }

    println!("Saving metrics data...");
    let succeeded = success_count(&current);
    write_documents(&current_path, &history_path, current, &history)?;

    validate_outputs(&[&current_path, &history_path])?;
    print_summary("PyPI metrics collection complete!", "packages", succeeded, &failed);

    Ok(())
}

/// Count the recorded snapshots that carry actual data. Counting over the keyed map
/// (rather than subtracting failures from attempts) keeps the number correct when two
/// descriptors share a `package_name`.
fn success_count(current: &BTreeMap<String, PackageSnapshot>) -> usize {
    current.values().filter(|snapshot| !snapshot.is_empty()).count()
}

fn write_documents(
    current_path: &Utf8Path,
    history_path: &Utf8Path,
    current: BTreeMap<String, PackageSnapshot>,
    history: &PackageHistory,
) -> Result<()> {
    let report = PackageCurrent {
        packages: current,
        last_updated: Utc::now(),
    };
    reports::write_json(current_path, &report)?;
    println!("✓ Saved current metrics to {current_path}");

    reports::write_json(history_path, history)?;
    println!("✓ Saved historical data to {history_path}");

    Ok(())
}

fn format_count(count: Option<u64>) -> String {
    count.map_or_else(|| "N/A".to_string(), |count| count.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(package_name: &str, version: Option<&str>) -> PackageSnapshot {
        PackageSnapshot {
            repo_id: "org/repo".to_string(),
            name: "Repo".to_string(),
            package_name: package_name.to_string(),
            kind: "tool".to_string(),
            timestamp: Utc::now(),
            downloads_last_day: None,
            downloads_last_week: None,
            downloads_last_month: None,
            total_downloads: None,
            version: version.map(str::to_string),
            release_date: None,
        }
    }

    #[test]
    fn test_success_count_tallies_non_empty_snapshots() {
        let mut current = BTreeMap::new();
        let _ = current.insert("good".to_string(), snapshot("good", Some("1.0.0")));
        let _ = current.insert("empty".to_string(), snapshot("empty", None));

        assert_eq!(success_count(&current), 1);
    }

    #[test]
    fn test_success_count_with_shared_package_name() {
        // Two descriptors sharing a package_name collapse to one map entry while the
        // failure list gets two pushes; the success count must stay non-negative.
        let mut current = BTreeMap::new();
        let _ = current.insert("shared".to_string(), snapshot("shared", None));
        let _ = current.insert("shared".to_string(), snapshot("shared", None));
        let failed = vec!["shared".to_string(), "shared".to_string()];

        assert_eq!(current.len(), 1);
        assert_eq!(failed.len(), 2);
        assert_eq!(success_count(&current), 0);
    }
}
