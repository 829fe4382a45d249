use crate::Result;
use camino::Utf8Path;
use ohno::{IntoAppError, bail};
use serde::Deserialize;
use serde_json::Value;
use std::fs;

const LOG_TARGET: &str = "   catalog";

/// Descriptor types that may publish a package to PyPI.
const PACKAGE_KINDS: &[&str] = &["tool", "bootcamp", "applied-research"];

/// Fields every descriptor must carry to appear in the site's repository listing.
const REQUIRED_FIELDS: &[&str] = &["name", "repo_id", "description", "type", "year"];

/// A typed view of one repository descriptor.
///
/// Only `repo_id` is required here; the metric collection paths tolerate partial
/// descriptors and derive display names from the repository id when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct Descriptor {
    pub repo_id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    #[serde(default)]
    pub package_name: Option<String>,

    #[serde(default)]
    pub implementations: Vec<Value>,
}

/// A descriptor that publishes a PyPI package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub repo_id: String,
    pub name: String,
    pub package_name: String,
    pub kind: String,
}

/// Load every descriptor file in `dir` as a raw JSON value, paired with its file name.
///
/// Enumeration is non-recursive and follows filesystem order; callers must sort by an
/// explicit field when ordering matters. Files that fail to parse are skipped with a
/// logged warning.
///
/// # Errors
///
/// Fails when the directory does not exist, contains no YAML files, or none of them parse.
pub fn load_raw_descriptors(dir: &Utf8Path) -> Result<Vec<(String, Value)>> {
    if !dir.is_dir() {
        bail!("repository descriptor directory not found at '{dir}'");
    }

    let entries = fs::read_dir(dir).into_app_err_with(|| format!("unable to read descriptor directory '{dir}'"))?;

    let mut descriptors = Vec::new();
    let mut yaml_files = 0_usize;

    for entry in entries {
        let entry = entry.into_app_err_with(|| format!("unable to read descriptor directory '{dir}'"))?;
        let path = entry.path();

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if !is_yaml || !path.is_file() {
            continue;
        }

        yaml_files += 1;
        let file_name = entry.file_name().to_string_lossy().into_owned();

        let text = fs::read_to_string(&path).into_app_err_with(|| format!("unable to read descriptor file '{}'", path.display()))?;

        match serde_yaml::from_str::<Value>(&text) {
            Ok(value) if value.is_object() => descriptors.push((file_name, value)),
            Ok(_) => {
                log::warn!(target: LOG_TARGET, "Skipping {file_name}: not a key-value document");
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Skipping {file_name}: {e}");
            }
        }
    }

    if yaml_files == 0 {
        bail!("no YAML descriptor files found in '{dir}'");
    }

    if descriptors.is_empty() {
        bail!("no parseable descriptor files found in '{dir}'");
    }

    Ok(descriptors)
}

/// Load the typed descriptors from `dir`.
///
/// Descriptors missing the `repo_id` identifying field are skipped with a logged
/// warning; the returned list may be empty.
///
/// # Errors
///
/// Fails under the same conditions as [`load_raw_descriptors`].
pub fn load_descriptors(dir: &Utf8Path) -> Result<Vec<Descriptor>> {
    let raw = load_raw_descriptors(dir)?;

    let mut descriptors = Vec::with_capacity(raw.len());
    for (file_name, value) in raw {
        match serde_json::from_value::<Descriptor>(value) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Skipping {file_name}: {e}");
            }
        }
    }

    Ok(descriptors)
}

/// Select the descriptors that publish a PyPI package.
///
/// A descriptor qualifies when it carries `package_name` and its `type` is one of
/// `tool`, `bootcamp`, or `applied-research`.
#[must_use]
pub fn package_entries(descriptors: &[Descriptor]) -> Vec<PackageEntry> {
    descriptors
        .iter()
        .filter_map(|descriptor| {
            let package_name = descriptor.package_name.clone()?;
            let kind = descriptor.kind.clone().filter(|kind| PACKAGE_KINDS.contains(&kind.as_str()))?;

            let Some(name) = descriptor.name.clone() else {
                log::warn!(target: LOG_TARGET, "Skipping package '{package_name}': descriptor missing 'name' field");
                return None;
            };

            Some(PackageEntry {
                repo_id: descriptor.repo_id.clone(),
                name,
                package_name,
                kind,
            })
        })
        .collect()
}

/// Check that a raw descriptor carries every field the repository listing requires.
#[must_use]
pub fn has_required_fields(value: &Value) -> bool {
    REQUIRED_FIELDS.iter().all(|field| value.get(field).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::env;

    fn temp_repos_dir(tag: &str) -> Utf8PathBuf {
        let dir = Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap().join(format!("catalog_metrics_descriptors_{tag}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_directory() {
        let result = load_descriptors(Utf8Path::new("/nonexistent/repositories"));
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_empty_directory() {
        let dir = temp_repos_dir("empty");
        fs::write(dir.join("notes.txt"), "not a descriptor").unwrap();

        let result = load_descriptors(&dir);
        assert!(result.unwrap_err().to_string().contains("no YAML descriptor files"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_and_skip_missing_repo_id() {
        let dir = temp_repos_dir("load");
        fs::write(
            dir.join("cyclops.yaml"),
            "name: CyclOps\nrepo_id: VectorInstitute/cyclops\ndescription: Clinical ML toolkit\ntype: tool\nyear: 2022\npackage_name: pycyclops\n",
        )
        .unwrap();
        fs::write(dir.join("broken.yml"), "name: No Id\ntype: tool\n").unwrap();

        let descriptors = load_descriptors(&dir).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].repo_id, "VectorInstitute/cyclops");
        assert_eq!(descriptors[0].package_name.as_deref(), Some("pycyclops"));
        assert_eq!(descriptors[0].year, Some(2022));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_package_entries_filtering() {
        let dir = temp_repos_dir("packages");
        fs::write(
            dir.join("tool.yaml"),
            "name: CyclOps\nrepo_id: org/cyclops\ndescription: d\ntype: tool\nyear: 2022\npackage_name: pycyclops\n",
        )
        .unwrap();
        fs::write(
            dir.join("model.yaml"),
            "name: Model\nrepo_id: org/model\ndescription: d\ntype: model\nyear: 2023\npackage_name: some-model\n",
        )
        .unwrap();
        fs::write(
            dir.join("no-package.yaml"),
            "name: Plain\nrepo_id: org/plain\ndescription: d\ntype: tool\nyear: 2021\n",
        )
        .unwrap();

        let descriptors = load_descriptors(&dir).unwrap();
        let packages = package_entries(&descriptors);

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].package_name, "pycyclops");
        assert_eq!(packages[0].kind, "tool");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_has_required_fields() {
        let complete: Value =
            serde_yaml::from_str("name: n\nrepo_id: o/r\ndescription: d\ntype: tool\nyear: 2024\n").unwrap();
        assert!(has_required_fields(&complete));

        let partial: Value = serde_yaml::from_str("name: n\nrepo_id: o/r\n").unwrap();
        assert!(!has_required_fields(&partial));
    }
}
