mod common;
mod forks;
mod github;
mod packages;
mod sync;

pub use forks::{ForksArgs, analyze_forks};
pub use github::{GithubArgs, collect_github};
pub use packages::{PackagesArgs, collect_packages};
pub use sync::{SyncArgs, sync_repositories};
