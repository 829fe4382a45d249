//! Shared plumbing for the collection subcommands.

use camino::Utf8Path;
use catalog_metrics::Result;
use clap::Args;
use clap::ValueEnum;
use ohno::bail;

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages
    Info,
    /// Debug and above messages
    Debug,
    /// All messages including trace
    Trace,
}

/// Arguments shared by every subcommand
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Directory containing repository descriptor YAML files
    #[arg(long, value_name = "PATH", default_value = "repositories")]
    pub repos_dir: camino::Utf8PathBuf,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,
}

/// Initialize logger based on log level
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug) || matches!(log_level, LogLevel::Trace))
        .init();
}

pub fn print_banner(title: &str) {
    println!("{}", "=".repeat(70));
    println!("{title}");
    println!("{}", "=".repeat(70));
    println!();
}

/// Print the end-of-run summary block with success/failure counts.
pub fn print_summary(message: &str, noun: &str, succeeded: usize, failed: &[String]) {
    println!();
    println!("{}", "=".repeat(70));
    println!("✓ {message}");
    println!("{}", "=".repeat(70));
    println!("Successfully collected: {succeeded} {noun}");
    if !failed.is_empty() {
        println!("Failed: {} {noun}", failed.len());
        println!("  Failed {noun}: {}", failed.join(", "));
    }
    println!();
}

/// Verify that every output document landed on disk.
///
/// # Errors
///
/// Returns an error naming the first missing file.
pub fn validate_outputs(paths: &[&Utf8Path]) -> Result<()> {
    for path in paths {
        if !path.is_file() {
            bail!("failed to create output file '{path}'");
        }
    }
    Ok(())
}
