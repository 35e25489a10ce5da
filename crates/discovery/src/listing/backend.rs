//! ListingBackend - listing implementation chosen from configuration

use contracts::{ContractError, ListingClient, ListingKind, StorageConfig};
use tracing::instrument;

use super::{CommandListing, LocalListing};

/// Config-selected listing backend
#[derive(Debug, Clone)]
pub enum ListingBackend {
    Command(CommandListing),
    Local(LocalListing),
}

impl ListingBackend {
    /// Create from storage configuration
    #[instrument(name = "listing_backend_from_config", skip(storage), fields(kind = ?storage.listing))]
    pub fn from_config(storage: &StorageConfig) -> Result<Self, ContractError> {
        match storage.listing {
            ListingKind::Command => Ok(Self::Command(CommandListing::from_template(
                &storage.listing_command_template,
            )?)),
            ListingKind::Local => Ok(Self::Local(LocalListing::new())),
        }
    }
}

impl ListingClient for ListingBackend {
    fn name(&self) -> &str {
        match self {
            Self::Command(inner) => inner.name(),
            Self::Local(inner) => inner.name(),
        }
    }

    async fn list(&self, path: &str) -> Result<Vec<String>, ContractError> {
        match self {
            Self::Command(inner) => inner.list(path).await,
            Self::Local(inner) => inner.list(path).await,
        }
    }
}
