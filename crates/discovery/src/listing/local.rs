//! LocalListing - lists a directory on the local filesystem

use contracts::{ContractError, ListingClient};
use tracing::{debug, instrument};

/// Local directory listing.
///
/// Returns full entry paths, like `hdfs dfs -ls -C`. Entries are sorted by
/// path since local directory order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct LocalListing;

impl LocalListing {
    pub fn new() -> Self {
        Self
    }
}

impl ListingClient for LocalListing {
    fn name(&self) -> &str {
        "local"
    }

    #[instrument(name = "local_listing_list", skip(self), fields(path = %path))]
    async fn list(&self, path: &str) -> Result<Vec<String>, ContractError> {
        let mut dir = tokio::fs::read_dir(path)
            .await
            .map_err(|e| ContractError::listing(path, e.to_string()))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ContractError::listing(path, e.to_string()))?
        {
            entries.push(entry.path().to_string_lossy().into_owned());
        }
        entries.sort();

        debug!(entries = entries.len(), "Local listing completed");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lists_full_paths_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("2020-02-15")).unwrap();
        std::fs::create_dir(dir.path().join("2019-12-31")).unwrap();

        let root = dir.path().to_str().unwrap();
        let entries = LocalListing::new().list(root).await.unwrap();

        assert_eq!(
            entries,
            vec![format!("{root}/2019-12-31"), format!("{root}/2020-02-15")]
        );
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = LocalListing::new()
            .list(missing.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Listing { .. }));
    }
}
