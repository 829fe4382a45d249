use super::common::{CommonArgs, init_logging, print_banner, validate_outputs};
use camino::Utf8PathBuf;
use catalog_metrics::Result;
use catalog_metrics::catalog::{self, RepoId};
use catalog_metrics::fetch::{GhClient, forks};
use catalog_metrics::geo;
use catalog_metrics::reports::{self, ForkReport};
use chrono::Utc;
use clap::Parser;
use ohno::bail;

const LOG_TARGET: &str = "     forks";

#[derive(Parser, Debug)]
pub struct ForksArgs {
    /// Directory where the fork analysis document is written
    #[arg(long, value_name = "PATH", default_value = "catalog-analytics/public/data")]
    pub output_dir: Utf8PathBuf,

    /// Fraction of active forks assumed to be meaningful
    #[arg(long, value_name = "RATIO", default_value_t = 0.42)]
    pub meaningful_ratio: f64,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn analyze_forks(args: &ForksArgs) -> Result<()> {
    init_logging(args.common.log_level);
    print_banner("Implementation Catalog - Fork Analysis");

    println!("Reading repository configurations...");
    let descriptors = catalog::load_descriptors(&args.common.repos_dir)?;

    let mut repo_ids = Vec::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        match RepoId::parse(&descriptor.repo_id) {
            Ok(repo_id) => repo_ids.push(repo_id),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Skipping '{}': {e}", descriptor.repo_id);
            }
        }
    }

    if repo_ids.is_empty() {
        bail!("no usable repository ids found in descriptor files");
    }
    println!("Analyzing forks for {} repositories\n", repo_ids.len());

    let gh = GhClient::new();
    gh.check_auth().await?;

    let mut total_forks = 0_u64;
    let mut active_forks = Vec::new();
    let mut countries = Vec::new();

    for repo_id in &repo_ids {
        let repo_forks = forks::fetch_forks(&gh, repo_id).await;
        total_forks += repo_forks.len() as u64;

        for fork in repo_forks {
            let ahead = forks::commits_ahead(&gh, repo_id, &fork).await;
            if ahead == 0 {
                continue;
            }

            println!("    {} is {ahead} commits ahead", fork.full_name);

            let location = forks::owner_location(&gh, &fork.owner.login).await;
            let country = geo::classify(location.as_deref());
            if let Some(country) = country {
                countries.push(country.to_string());
            }

            active_forks.push(forks::ForkRecord {
                fork_owner: fork.owner.login,
                fork_name: fork.name,
                fork_url: fork.html_url,
                parent_repo: repo_id.to_string(),
                commits_ahead: ahead,
                location,
                country: country.map(str::to_string),
                created_at: fork.created_at,
                updated_at: fork.updated_at,
            });
        }
    }

    let summary = reports::fork_summary(total_forks, active_forks.len() as u64, args.meaningful_ratio);
    let geographic_distribution = reports::geographic_distribution(&countries);

    println!("\nSaving fork analysis...");
    let report = ForkReport {
        summary,
        geographic_distribution,
        active_forks,
        last_updated: Utc::now(),
    };

    let report_path = args.output_dir.join("fork_metrics.json");
    reports::write_json(&report_path, &report)?;
    println!("✓ Saved fork analysis to {report_path}");

    validate_outputs(&[&report_path])?;

    println!();
    println!("{}", "=".repeat(70));
    println!("✓ Fork analysis complete!");
    println!("{}", "=".repeat(70));
    println!("Total forks: {}", report.summary.total_forks);
    println!("Active forks: {}", report.summary.active_forks);
    println!("Countries represented: {}", report.geographic_distribution.len());
    println!();

    Ok(())
}
