use crate::backend::types::{AuthSession, ListingQuery};
use crate::error::Result;
use crate::models::{Booking, Favorite, Listing, NewListing, Profile, Role, User, VerificationStatus};
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

/// Hosted identity provider
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new account; the role travels as sign-up metadata and
    /// seeds the profile row
    async fn sign_up(&self, email: &str, password: &str, role: Role) -> Result<User>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn sign_out(&self) -> Result<()>;

    /// Get the name of the backend
    fn backend_name(&self) -> &'static str;
}

/// Remote table store holding profiles, listings, favorites and bookings
///
/// Every write is atomic for a single row only.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn listings(&self, query: &ListingQuery) -> Result<Vec<Listing>>;

    /// `Ok(None)` when no row has this id
    async fn listing(&self, id: Uuid) -> Result<Option<Listing>>;

    async fn insert_listing(&self, listing: &NewListing) -> Result<Listing>;

    async fn set_verification_status(&self, id: Uuid, status: VerificationStatus) -> Result<()>;

    async fn delete_listing(&self, id: Uuid) -> Result<()>;

    async fn profile(&self, id: Uuid) -> Result<Option<Profile>>;

    async fn profiles(&self) -> Result<Vec<Profile>>;

    async fn update_full_name(&self, id: Uuid, full_name: &str) -> Result<()>;

    async fn favorite_ids(&self, beekeeper_id: Uuid) -> Result<HashSet<Uuid>>;

    /// Inserting an existing pair is not an error
    async fn insert_favorite(&self, favorite: &Favorite) -> Result<()>;

    /// Deleting a missing pair is not an error
    async fn delete_favorite(&self, favorite: &Favorite) -> Result<()>;

    async fn bookings(&self) -> Result<Vec<Booking>>;
}

/// Remote blob storage for listing images
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    fn public_url(&self, bucket: &str, key: &str) -> String;
}
