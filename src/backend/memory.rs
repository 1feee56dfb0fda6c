use crate::backend::traits::{AuthService, Datastore, ObjectStorage};
use crate::backend::types::{AuthSession, ListingQuery, ListingScope};
use crate::error::{Error, Result};
use crate::models::{Booking, Favorite, Listing, NewListing, Profile, Role, User, VerificationStatus};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct State {
    accounts: HashMap<String, (String, User)>,
    profiles: Vec<Profile>,
    listings: Vec<Listing>,
    favorites: HashSet<Favorite>,
    bookings: Vec<Booking>,
    objects: HashMap<String, Vec<u8>>,
    session: Option<User>,
    rejected_payloads: Vec<Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-process stand-in for the hosted backend
///
/// Keeps every table in memory and can be told to fail reads, writes or
/// specific uploads.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an account and its profile without signing in
    pub fn create_account(&self, email: &str, password: &str, role: Role) -> Result<User> {
        let mut state = self.state();
        if state.accounts.contains_key(email) {
            return Err(Error::Remote {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
        };
        state
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        state.profiles.push(Profile {
            id: user.id,
            email: user.email.clone(),
            full_name: None,
            role,
            created_at: Utc::now(),
        });
        debug!("memory: registered {} as {}", email, role);
        Ok(user)
    }

    /// Uploads carrying exactly these bytes will be rejected
    pub fn reject_payload(&self, bytes: impl Into<Vec<u8>>) {
        self.state().rejected_payloads.push(bytes.into());
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.state().profiles.push(profile);
    }

    pub fn insert_booking(&self, booking: Booking) {
        self.state().bookings.push(booking);
    }

    /// Store a listing as-is, bypassing the pending default
    pub fn seed_listing(&self, listing: Listing) {
        self.state().listings.push(listing);
    }

    pub fn object_count(&self) -> usize {
        self.state().objects.len()
    }

    /// Account the fake auth service currently considers signed in
    pub fn signed_in_user(&self) -> Option<User> {
        self.state().session.clone()
    }

    pub fn favorite_count(&self) -> usize {
        self.state().favorites.len()
    }

    fn check_read(&self) -> Result<()> {
        if self.state().fail_reads {
            return Err(unavailable());
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.state().fail_writes {
            return Err(unavailable());
        }
        Ok(())
    }
}

fn unavailable() -> Error {
    Error::Remote {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn sign_up(&self, email: &str, password: &str, role: Role) -> Result<User> {
        self.check_write()?;
        let user = self.create_account(email, password, role)?;
        self.state().session = Some(user.clone());
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let mut state = self.state();
        let user = match state.accounts.get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => {
                return Err(Error::Remote {
                    status: 400,
                    message: "Invalid login credentials".to_string(),
                })
            }
        };
        state.session = Some(user.clone());
        Ok(AuthSession {
            access_token: format!("memory-{}", user.id),
            user,
        })
    }

    async fn sign_out(&self) -> Result<()> {
        self.state().session = None;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl Datastore for MemoryBackend {
    async fn listings(&self, query: &ListingQuery) -> Result<Vec<Listing>> {
        self.check_read()?;
        let state = self.state();
        let mut rows: Vec<Listing> = state
            .listings
            .iter()
            .filter(|l| match query.scope {
                ListingScope::All => true,
                ListingScope::Verified => l.verification_status == VerificationStatus::Verified,
                ListingScope::OwnedBy(owner) => l.owner_id == owner,
            })
            .cloned()
            .collect();
        if query.newest_first {
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        Ok(rows)
    }

    async fn listing(&self, id: Uuid) -> Result<Option<Listing>> {
        self.check_read()?;
        Ok(self.state().listings.iter().find(|l| l.id == id).cloned())
    }

    async fn insert_listing(&self, listing: &NewListing) -> Result<Listing> {
        self.check_write()?;
        let mut state = self.state();
        // Keep created_at strictly increasing so newest-first ordering is stable
        let created_at = state
            .listings
            .iter()
            .map(|l| l.created_at + Duration::milliseconds(1))
            .max()
            .map_or_else(Utc::now, |next| next.max(Utc::now()));

        let row = Listing {
            id: Uuid::new_v4(),
            owner_id: listing.owner_id,
            title: listing.title.clone(),
            description: listing.description.clone(),
            location: listing.location.clone(),
            flowers: listing.flowers.clone(),
            space_hectares: listing.space_hectares,
            price_per_month: listing.price_per_month,
            available_from: listing.available_from,
            available_until: listing.available_until,
            image_urls: listing.image_urls.clone(),
            verification_status: listing.verification_status(),
            created_at,
        };
        state.listings.push(row.clone());
        Ok(row)
    }

    async fn set_verification_status(&self, id: Uuid, status: VerificationStatus) -> Result<()> {
        self.check_write()?;
        if let Some(listing) = self.state().listings.iter_mut().find(|l| l.id == id) {
            listing.verification_status = status;
        }
        Ok(())
    }

    async fn delete_listing(&self, id: Uuid) -> Result<()> {
        self.check_write()?;
        let mut state = self.state();
        state.listings.retain(|l| l.id != id);
        state.favorites.retain(|f| f.land_id != id);
        Ok(())
    }

    async fn profile(&self, id: Uuid) -> Result<Option<Profile>> {
        self.check_read()?;
        Ok(self.state().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn profiles(&self) -> Result<Vec<Profile>> {
        self.check_read()?;
        let mut rows = self.state().profiles.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_full_name(&self, id: Uuid, full_name: &str) -> Result<()> {
        self.check_write()?;
        if let Some(profile) = self.state().profiles.iter_mut().find(|p| p.id == id) {
            profile.full_name = Some(full_name.to_string());
        }
        Ok(())
    }

    async fn favorite_ids(&self, beekeeper_id: Uuid) -> Result<HashSet<Uuid>> {
        self.check_read()?;
        Ok(self
            .state()
            .favorites
            .iter()
            .filter(|f| f.beekeeper_id == beekeeper_id)
            .map(|f| f.land_id)
            .collect())
    }

    async fn insert_favorite(&self, favorite: &Favorite) -> Result<()> {
        self.check_write()?;
        let mut state = self.state();
        if !state.listings.iter().any(|l| l.id == favorite.land_id) {
            return Err(Error::Remote {
                status: 409,
                message: "insert or update on table \"favorites\" violates foreign key constraint"
                    .to_string(),
            });
        }
        state.favorites.insert(favorite.clone());
        Ok(())
    }

    async fn delete_favorite(&self, favorite: &Favorite) -> Result<()> {
        self.check_write()?;
        self.state().favorites.remove(favorite);
        Ok(())
    }

    async fn bookings(&self) -> Result<Vec<Booking>> {
        self.check_read()?;
        let mut rows = self.state().bookings.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[async_trait]
impl ObjectStorage for MemoryBackend {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        let mut state = self.state();
        if state.rejected_payloads.iter().any(|rejected| *rejected == bytes) {
            return Err(Error::Remote {
                status: 413,
                message: "Payload too large".to_string(),
            });
        }
        state.objects.insert(format!("{}/{}", bucket, key), bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("memory://{}/{}", bucket, key)
    }
}
