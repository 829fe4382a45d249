use super::common::{CommonArgs, init_logging, print_banner, validate_outputs};
use camino::Utf8PathBuf;
use catalog_metrics::Result;
use catalog_metrics::catalog;
use catalog_metrics::reports;
use chrono::Utc;
use clap::Parser;

const LOG_TARGET: &str = "      sync";

#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Directory where the repository listing is written
    #[arg(long, value_name = "PATH", default_value = "catalog/public/data")]
    pub output_dir: Utf8PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn sync_repositories(args: &SyncArgs) -> Result<()> {
    init_logging(args.common.log_level);
    print_banner("Implementation Catalog - Repository Sync");

    println!("Reading repository configurations...");
    let raw = catalog::load_raw_descriptors(&args.common.repos_dir)?;

    let mut repositories = Vec::with_capacity(raw.len());
    for (file_name, value) in raw {
        if catalog::has_required_fields(&value) {
            repositories.push(value);
        } else {
            log::warn!(target: LOG_TARGET, "Skipping {file_name}: missing required fields");
        }
    }

    if repositories.is_empty() {
        println!("Nothing to update: no complete repository descriptors found.");
        return Ok(());
    }

    println!("Syncing {} repositories\n", repositories.len());

    let doc = reports::repositories_doc(repositories, Utc::now());

    let listing_path = args.output_dir.join("repositories.json");
    reports::write_json(&listing_path, &doc)?;
    println!("✓ Saved repository listing to {listing_path}");

    validate_outputs(&[&listing_path])?;

    println!();
    println!("{}", "=".repeat(70));
    println!("✓ Repository sync complete!");
    println!("{}", "=".repeat(70));
    println!("Repositories listed: {}", doc.repositories.len());
    println!("Total implementations: {}", doc.total_implementations);
    println!();

    Ok(())
}
