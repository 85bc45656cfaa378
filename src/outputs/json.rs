//! JSON data files.
//!
//! Every pipeline writes its result as `{data_dir}/{name}.json`, replacing
//! whatever the previous run left there:
//!
//! ```text
//! data_dir/
//! ├── content_extractor1.json
//! ├── url_extractor2.json
//! ├── domain.json
//! ├── country_metrics.json
//! └── top3_links.json
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the data file called `name`.
pub fn data_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.json"))
}

/// Serialize `value` as pretty JSON to `{data_dir}/{name}.json`.
///
/// Creates `data_dir` if needed and overwrites any existing file.
#[instrument(level = "info", skip(data_dir, value), fields(data_dir = %data_dir.display()))]
pub async fn write_json<T>(data_dir: &Path, name: &str, value: &T) -> Result<PathBuf, Box<dyn Error>>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string_pretty(value)?;

    if let Err(e) = fs::create_dir_all(data_dir).await {
        error!(error = %e, "Failed to create data dir");
        return Err(e.into());
    }

    let path = data_path(data_dir, name);
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote data file");
    Ok(path)
}

/// Read and deserialize `{data_dir}/{name}.json`.
///
/// # Errors
///
/// Fails if the file is missing or its contents do not match `T`; the error
/// names the file.
pub async fn read_json<T>(data_dir: &Path, name: &str) -> Result<T, Box<dyn Error>>
where
    T: DeserializeOwned,
{
    let path = data_path(data_dir, name);
    let raw = fs::read_to_string(&path)
        .await
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&raw).map_err(|e| format!("invalid JSON in {}: {e}", path.display()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_write_then_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");

        let first = BTreeMap::from([("spark".to_string(), 4u64)]);
        let path = write_json(&dir, "content_extractor1", &first).await.unwrap();
        assert_eq!(path, dir.join("content_extractor1.json"));

        let second = BTreeMap::from([("flink".to_string(), 3u64)]);
        write_json(&dir, "content_extractor1", &second).await.unwrap();

        let read: BTreeMap<String, u64> = read_json(&dir, "content_extractor1").await.unwrap();
        assert_eq!(read, second);
    }

    #[tokio::test]
    async fn test_read_missing_file_names_it() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_json::<BTreeMap<String, u64>>(tmp.path(), "domain")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("domain.json"));
    }
}
