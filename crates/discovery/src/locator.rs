//! PartitionLocator - picks the partition to dispatch
//!
//! Ordering policy: the greatest entry under plain lexicographic string
//! comparison. Partition names are expected to start with an ISO-ordered
//! timestamp; a naming scheme that does not sort by recency breaks this.

use contracts::{
    CollectionId, ContractError, ListingClient, Partition, StorageConfig, TEMPLATE_PLACEHOLDER,
};
use tracing::{debug, info, instrument};

/// Locates the most recent partition of a collection
#[derive(Debug, Clone)]
pub struct PartitionLocator<L> {
    listing: L,
    output_root_template: String,
}

impl<L: ListingClient> PartitionLocator<L> {
    /// Create a locator over the configured output root
    pub fn new(listing: L, storage: &StorageConfig) -> Self {
        Self::with_template(listing, &storage.output_root_template)
    }

    pub fn with_template(listing: L, output_root_template: &str) -> Self {
        Self {
            listing,
            output_root_template: output_root_template.to_string(),
        }
    }

    /// Output root holding the partitions of `collection`
    pub fn root_for(&self, collection: &CollectionId) -> String {
        self.output_root_template
            .replacen(TEMPLATE_PLACEHOLDER, collection.as_str(), 1)
    }

    /// Locate the latest partition
    ///
    /// # Errors
    /// - `NoPartitionsFound` when the root lists nothing
    /// - `Listing` when the listing backend fails
    #[instrument(
        name = "partition_locator_locate",
        skip(self),
        fields(collection = %collection, listing = self.listing.name())
    )]
    pub async fn locate(&self, collection: &CollectionId) -> Result<Partition, ContractError> {
        let root = self.root_for(collection);
        let entries = self.listing.list(&root).await?;
        debug!(root = %root, candidates = entries.len(), "Partition candidates listed");

        let latest = select_latest(&entries).ok_or_else(|| ContractError::NoPartitionsFound {
            collection: collection.to_string(),
            root: root.clone(),
        })?;

        let partition = Partition::from_entry(&root, latest);
        info!(partition = %partition.name, path = %partition.path, "Partition located");
        Ok(partition)
    }
}

/// Lexicographic maximum of the non-blank entries
pub fn select_latest(entries: &[String]) -> Option<&str> {
    entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryListing;

    fn collection() -> CollectionId {
        CollectionId::new("foo").unwrap()
    }

    #[tokio::test]
    async fn test_locate_picks_lexicographic_max() {
        let listing = InMemoryListing::new().with_entries(
            "/output/foo",
            ["2019-12-31", "2020-02-15", "2020-01-01"],
        );
        let locator = PartitionLocator::with_template(listing, "/output/{}");

        let partition = locator.locate(&collection()).await.unwrap();
        assert_eq!(partition.name, "2020-02-15");
        assert_eq!(partition.path, "/output/foo/2020-02-15");
    }

    #[tokio::test]
    async fn test_locate_keeps_full_path_entries() {
        let listing = InMemoryListing::new().with_entries(
            "/output/foo",
            ["/output/foo/20200101-run", "/output/foo/20200301-run"],
        );
        let locator = PartitionLocator::with_template(listing, "/output/{}");

        let partition = locator.locate(&collection()).await.unwrap();
        assert_eq!(partition.path, "/output/foo/20200301-run");
    }

    #[tokio::test]
    async fn test_empty_listing_is_no_partitions_found() {
        let listing = InMemoryListing::new().with_entries("/output/foo", Vec::<String>::new());
        let locator = PartitionLocator::with_template(listing, "/output/{}");

        let err = locator.locate(&collection()).await.unwrap_err();
        match err {
            ContractError::NoPartitionsFound { collection, root } => {
                assert_eq!(collection, "foo");
                assert_eq!(root, "/output/foo");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_listing_error_propagates() {
        let listing = InMemoryListing::new().with_failure("/output/foo", "exit status 1");
        let locator = PartitionLocator::with_template(listing.clone(), "/output/{}");

        let err = locator.locate(&collection()).await.unwrap_err();
        assert!(matches!(err, ContractError::Listing { .. }));
        assert_eq!(listing.calls("/output/foo"), 1);
    }

    #[test]
    fn test_select_latest_ignores_blank_entries() {
        let entries = vec!["".to_string(), "  ".to_string(), "a".to_string()];
        assert_eq!(select_latest(&entries), Some("a"));
        assert_eq!(select_latest(&["   ".to_string()]), None);
    }

    #[test]
    fn test_select_latest_is_string_order_not_numeric() {
        let entries = vec!["9".to_string(), "10".to_string()];
        assert_eq!(select_latest(&entries), Some("9"));
    }
}
