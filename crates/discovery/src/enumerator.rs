//! PartFileEnumerator - data files of a partition

use contracts::{file_name, ContractError, ListingClient, PartFile, Partition, StorageConfig};
use tracing::{debug, info, instrument};

/// Lists a partition and keeps its part files, in listing order
#[derive(Debug, Clone)]
pub struct PartFileEnumerator<L> {
    listing: L,
    marker: String,
}

impl<L: ListingClient> PartFileEnumerator<L> {
    /// Create an enumerator using the configured part marker
    pub fn new(listing: L, storage: &StorageConfig) -> Self {
        Self::with_marker(listing, &storage.part_marker)
    }

    pub fn with_marker(listing: L, marker: &str) -> Self {
        Self {
            listing,
            marker: marker.to_string(),
        }
    }

    /// Enumerate part files; an empty result is not an error
    #[instrument(
        name = "part_file_enumerator_enumerate",
        skip(self, partition),
        fields(partition = %partition.name, marker = %self.marker)
    )]
    pub async fn enumerate(&self, partition: &Partition) -> Result<Vec<PartFile>, ContractError> {
        let entries = self.listing.list(&partition.path).await?;
        let total = entries.len();

        let part_files: Vec<PartFile> = entries
            .iter()
            .map(|entry| entry.trim())
            .filter(|entry| is_part_file(entry, &self.marker))
            .map(PartFile::from)
            .collect();

        debug!(
            skipped = total - part_files.len(),
            "Non-data entries excluded"
        );
        info!(part_files = part_files.len(), "Partition enumerated");
        Ok(part_files)
    }
}

/// Whether `entry` is a data file: its final path segment carries the part
/// marker and is not hidden (Hadoop treats `.` and `_` prefixes as hidden,
/// e.g. `.part-00000.crc` checksums)
pub fn is_part_file(entry: &str, marker: &str) -> bool {
    let name = file_name(entry);
    !name.is_empty() && !name.starts_with(['.', '_']) && name.contains(marker)
}
