use crate::models::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which slice of `land_listings` a caller may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    /// Every listing regardless of status (admin console)
    All,
    /// Only listings an admin has verified (beekeeper view)
    Verified,
    /// Listings created by one landowner
    OwnedBy(Uuid),
}

/// Parameters for fetching listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingQuery {
    pub scope: ListingScope,
    /// Sort by `created_at` descending
    pub newest_first: bool,
}

impl ListingQuery {
    pub fn verified() -> Self {
        Self {
            scope: ListingScope::Verified,
            ..Self::default()
        }
    }

    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            scope: ListingScope::OwnedBy(owner_id),
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self::default()
    }
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            scope: ListingScope::All,
            newest_first: true,
        }
    }
}

/// Signed-in session handed back by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: User,
}
