use super::common::{CommonArgs, init_logging, print_banner, print_summary, validate_outputs};
use camino::Utf8PathBuf;
use catalog_metrics::Result;
use catalog_metrics::catalog::{self, RepoId};
use catalog_metrics::fetch::{GhClient, hosting};
use catalog_metrics::reports::{self, RepoCurrent};
use catalog_metrics::store::{self, RepoHistory, RepoMeta};
use chrono::Utc;
use clap::Parser;
use ohno::bail;
use std::collections::BTreeMap;

const LOG_TARGET: &str = "    github";

#[derive(Parser, Debug)]
pub struct GithubArgs {
    /// Directory where the JSON documents are written
    #[arg(long, value_name = "PATH", default_value = "catalog/public/data")]
    pub output_dir: Utf8PathBuf,

    /// Organization to scan for template repositories (discovery skipped when omitted)
    #[arg(long, value_name = "ORG")]
    pub org: Option<String>,

    /// Name prefix identifying template repositories
    #[arg(long, value_name = "PREFIX", default_value = "aieng-template-")]
    pub template_prefix: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn collect_github(args: &GithubArgs) -> Result<()> {
    init_logging(args.common.log_level);
    print_banner("Implementation Catalog - GitHub Metrics Collection");

    let gh = GhClient::new();
    gh.check_auth().await?;

    println!("Reading repository configurations...");
    let descriptors = catalog::load_descriptors(&args.common.repos_dir)?;
    let mut repo_ids: Vec<String> = descriptors.into_iter().map(|descriptor| descriptor.repo_id).collect();
    if repo_ids.is_empty() {
        bail!("no repository ids found in descriptor files");
    }
    println!("Found {} catalog repositories", repo_ids.len());

    if let Some(org) = &args.org {
        for template in hosting::discover_template_repos(&gh, org, &args.template_prefix).await {
            if !repo_ids.contains(&template) {
                repo_ids.push(template);
            }
        }
    }
    println!("Total repositories to track: {}\n", repo_ids.len());

    let history_path = args.output_dir.join("github_metrics_history.json");
    let mut history: RepoHistory = store::load_or_default(&history_path)?;
    println!("Loaded historical data (tracking {} repos)\n", history.repos.len());

    let mut current = BTreeMap::new();
    let mut failed = Vec::new();

    for raw_id in &repo_ids {
        let repo_id = match RepoId::parse(raw_id) {
            Ok(repo_id) => repo_id,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Skipping '{raw_id}': {e}");
                failed.push(raw_id.clone());
                continue;
            }
        };

        // Fetch failures still yield a zeroed snapshot, so the entity keeps its
        // place in the documents; only unparseable ids count as failed.
        let snapshot = hosting::fetch_repo_snapshot(&gh, &repo_id).await;
        println!(
            "  stars {} | forks {} | views {}\n",
            snapshot.stars,
            snapshot.forks,
            snapshot.views_14d.map_or_else(|| "N/A".to_string(), |views| views.to_string())
        );

        store::record(
            &mut history.repos,
            raw_id,
            RepoMeta {
                name: snapshot.name.clone(),
            },
            snapshot.clone(),
        );
        history.last_updated = Some(snapshot.timestamp);
        let _ = current.insert(raw_id.clone(), snapshot);
    }

    // With fetch failures degraded to empty snapshots, an empty map means every
    // id failed to parse.
    if current.is_empty() {
        bail!("no usable repository ids found in descriptor files");
    }

    println!("Saving metrics data...");
    let current_path = args.output_dir.join("github_metrics.json");
    let report = RepoCurrent {
        repos: current,
        last_updated: Utc::now(),
    };
    reports::write_json(&current_path, &report)?;
    println!("✓ Saved current metrics to {current_path}");

    reports::write_json(&history_path, &history)?;
    println!("✓ Saved historical data to {history_path}");

    validate_outputs(&[&current_path, &history_path])?;
    print_summary("Metrics collection complete!", "repositories", report.repos.len(), &failed);

    Ok(())
}
