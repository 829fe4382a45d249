use crate::Result;
use ohno::bail;
use serde::de::DeserializeOwned;
use serde_json::{Deserializer, Value};
use tokio::process::Command;

const LOG_TARGET: &str = "        gh";

/// Thin client around the GitHub CLI.
///
/// All queries go through `gh api`, which handles authentication and host selection
/// on our behalf. Failures are swallowed into `None` so that one entity's trouble
/// never aborts a collection run; only [`GhClient::check_auth`] is fatal.
#[derive(Debug, Clone)]
pub struct GhClient {
    program: String,
}

impl Default for GhClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GhClient {
    #[must_use]
    pub fn new() -> Self {
        Self { program: "gh".to_string() }
    }

    #[cfg(test)]
    pub(crate) fn with_program(program: &str) -> Self {
        Self { program: program.to_string() }
    }

    /// Verify that the GitHub CLI is installed and authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error when `gh` cannot be spawned or reports itself unauthenticated.
    /// This is a precondition for all source-hosting collection and must be checked
    /// before any other work proceeds.
    pub async fn check_auth(&self) -> Result<()> {
        match Command::new(&self.program).args(["auth", "status"]).output().await {
            Ok(output) if output.status.success() => Ok(()),
            Ok(_) => bail!("GitHub CLI (gh) is not authenticated; run 'gh auth login' first"),
            Err(e) => bail!("GitHub CLI (gh) is not installed or not runnable: {e}"),
        }
    }

    /// Run `gh api` with the given arguments and parse the output as one JSON value.
    ///
    /// Returns `None` on spawn failure, non-zero exit, empty output, or malformed
    /// JSON; each case is logged to the error stream.
    pub async fn api(&self, args: &[&str]) -> Option<Value> {
        let stdout = self.api_raw(args).await?;
        match serde_json::from_slice(&stdout) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!(target: LOG_TARGET, "Error parsing JSON from gh: {e}");
                None
            }
        }
    }

    /// Run `gh api` and deserialize the output into `T`.
    ///
    /// Decode failures are treated the same as transport failures: logged, `None`.
    pub async fn api_as<T: DeserializeOwned>(&self, args: &[&str]) -> Option<T> {
        let value = self.api(args).await?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                log::error!(target: LOG_TARGET, "Unexpected response shape from gh: {e}");
                None
            }
        }
    }

    /// Run a paginated `gh api` query and collect every element across all pages.
    ///
    /// With `--paginate`, gh concatenates one JSON document per page onto stdout, so
    /// the output is parsed as a stream of documents; array documents are flattened
    /// into their elements.
    pub async fn api_paginated(&self, path: &str) -> Option<Vec<Value>> {
        let stdout = self.api_raw(&[path, "--paginate", "-X", "GET"]).await?;

        let mut items = Vec::new();
        for document in Deserializer::from_slice(&stdout).into_iter::<Value>() {
            match document {
                Ok(Value::Array(elements)) => items.extend(elements),
                Ok(value) => items.push(value),
                Err(e) => {
                    log::error!(target: LOG_TARGET, "Error parsing JSON from gh: {e}");
                    return None;
                }
            }
        }

        Some(items)
    }

    async fn api_raw(&self, args: &[&str]) -> Option<Vec<u8>> {
        let output = match Command::new(&self.program).arg("api").args(args).output().await {
            Ok(output) => output,
            Err(e) => {
                log::error!(target: LOG_TARGET, "Error running gh command: {e}");
                return None;
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!(target: LOG_TARGET, "Error running gh command: {}", stderr.trim());
            return None;
        }

        if output.stdout.is_empty() {
            return None;
        }

        Some(output.stdout)
    }
}
