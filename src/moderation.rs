use crate::backend::{Datastore, ListingQuery};
use crate::error::{Error, Result};
use crate::models::{Booking, Listing, Profile, VerificationStatus};
use crate::notify::Notifier;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Verify,
    Deny,
    Delete,
}

/// Actions the console offers for a listing: verify/deny only while pending
pub fn available_actions(listing: &Listing) -> Vec<ModerationAction> {
    match listing.verification_status {
        VerificationStatus::Pending => vec![
            ModerationAction::Verify,
            ModerationAction::Deny,
            ModerationAction::Delete,
        ],
        VerificationStatus::Verified | VerificationStatus::Denied => {
            vec![ModerationAction::Delete]
        }
    }
}

/// Headline counters on the admin console
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminStats {
    pub users: usize,
    pub listings: usize,
    pub bookings: usize,
    pub pending_listings: usize,
}

/// Everything the admin console shows, as last fetched
#[derive(Debug, Clone, Default)]
pub struct AdminSnapshot {
    pub listings: Vec<Listing>,
    pub profiles: Vec<Profile>,
    pub bookings: Vec<Booking>,
    pub stats: AdminStats,
}

impl AdminSnapshot {
    pub fn listing(&self, id: Uuid) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    fn recount(&mut self) {
        self.stats = AdminStats {
            users: self.profiles.len(),
            listings: self.listings.len(),
            bookings: self.bookings.len(),
            pending_listings: self
                .listings
                .iter()
                .filter(|l| l.verification_status == VerificationStatus::Pending)
                .count(),
        };
    }
}

/// Verification workflow over every listing; each mutation is followed by a
/// full resync of listings, users and bookings
pub struct Moderation {
    store: Arc<dyn Datastore>,
    notifier: Notifier,
    snapshot: AdminSnapshot,
}

impl Moderation {
    pub fn new(store: Arc<dyn Datastore>, notifier: Notifier) -> Self {
        Self {
            store,
            notifier,
            snapshot: AdminSnapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &AdminSnapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> AdminStats {
        self.snapshot.stats
    }

    /// Refetch all three collections concurrently; each one that loads replaces
    /// its local copy even if another fails
    pub async fn resync(&mut self) -> Result<()> {
        let listing_query = ListingQuery::all();
        let (listings, profiles, bookings) = tokio::join!(
            self.store.listings(&listing_query),
            self.store.profiles(),
            self.store.bookings(),
        );

        let mut first_error = None;
        match listings {
            Ok(rows) => self.snapshot.listings = rows,
            Err(err) => first_error = first_error.or(Some(err)),
        }
        match profiles {
            Ok(rows) => self.snapshot.profiles = rows,
            Err(err) => first_error = first_error.or(Some(err)),
        }
        match bookings {
            Ok(rows) => self.snapshot.bookings = rows,
            Err(err) => first_error = first_error.or(Some(err)),
        }
        self.snapshot.recount();

        match first_error {
            Some(err) => {
                warn!("Admin resync failed: {}", err);
                self.notifier.error("Failed to load data");
                Err(err)
            }
            None => Ok(()),
        }
    }

    pub async fn verify(&mut self, id: Uuid) -> Result<()> {
        self.transition(id, VerificationStatus::Verified).await
    }

    pub async fn deny(&mut self, id: Uuid) -> Result<()> {
        self.transition(id, VerificationStatus::Denied).await
    }

    /// Move a pending listing to its final status
    async fn transition(&mut self, id: Uuid, target: VerificationStatus) -> Result<()> {
        let listing = self.snapshot.listing(id).ok_or_else(|| Error::NotFound {
            what: format!("listing {}", id),
        })?;
        if listing.verification_status != VerificationStatus::Pending {
            return Err(Error::InvalidTransition {
                id,
                status: listing.verification_status,
            });
        }

        if let Err(err) = self.store.set_verification_status(id, target).await {
            self.notifier.error("Failed to update listing");
            return Err(err);
        }
        info!("Listing {} moved to {}", id, target);
        self.notifier.success(format!("Listing {}", target));
        self.refresh_after_write().await;
        Ok(())
    }

    /// Permanently remove a listing once `confirm` agrees
    ///
    /// Returns `Ok(false)` when the admin backs out.
    pub async fn delete<F>(&mut self, id: Uuid, confirm: F) -> Result<bool>
    where
        F: FnOnce(&Listing) -> bool,
    {
        let listing = self.snapshot.listing(id).ok_or_else(|| Error::NotFound {
            what: format!("listing {}", id),
        })?;
        if !confirm(listing) {
            return Ok(false);
        }

        if let Err(err) = self.store.delete_listing(id).await {
            self.notifier.error("Failed to delete listing");
            return Err(err);
        }
        info!("Listing {} deleted", id);
        self.notifier.success("Listing deleted");
        self.refresh_after_write().await;
        Ok(true)
    }

    /// The write already landed; a failed reload only leaves stale rows
    async fn refresh_after_write(&mut self) {
        if let Err(err) = self.resync().await {
            debug!("Keeping previous admin data after reload error: {}", err);
        }
    }
}
