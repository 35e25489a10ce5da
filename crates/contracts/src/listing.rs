//! ListingClient trait - storage listing interface
//!
//! Abstracts the command that enumerates entries under a storage path so the
//! locator and enumerator can run against HDFS, a local directory or a fake.

use crate::ContractError;

/// Storage listing trait
///
/// Implementations return entries in the order the backing store yields
/// them. Callers never re-sort.
#[trait_variant::make(ListingClient: Send)]
pub trait LocalListingClient {
    /// Backend name (used for logging)
    fn name(&self) -> &str;

    /// List the entries reachable under `path`
    ///
    /// # Errors
    /// Returns `ContractError::Listing` when the backend fails
    async fn list(&self, path: &str) -> Result<Vec<String>, ContractError>;
}
