use crate::app::AppContext;
use crate::backend::ListingQuery;
use crate::error::{Error, Result};
use crate::listing_form::{ListingComposer, ListingForm};
use crate::models::{Listing, Role, User, VerificationStatus};
use crate::scope::ViewScope;
use tracing::info;

pub const LOAD_FAILED: &str = "Failed to load your land listings";

/// A landowner's own listings plus the "add land" dialog
pub struct LandownerDashboard {
    ctx: AppContext,
    scope: ViewScope,
    user: User,
    listings: Vec<Listing>,
    composer: ListingComposer,
    loading: bool,
}

impl LandownerDashboard {
    pub fn mount(ctx: AppContext) -> Result<Self> {
        let user = ctx.session.require_user(Some(Role::Landowner))?;
        let composer = ctx.composer();
        Ok(Self {
            ctx,
            scope: ViewScope::mount(),
            user,
            listings: Vec::new(),
            composer,
            loading: true,
        })
    }

    pub async fn load(&mut self) -> Result<()> {
        let query = ListingQuery::owned_by(self.user.id);
        let result = self.scope.run(self.ctx.store.listings(&query)).await;
        if let Err(Error::Cancelled) = result {
            return Err(Error::Cancelled);
        }
        self.loading = false;

        match result {
            Ok(rows) => {
                self.listings = rows;
                Ok(())
            }
            Err(err) => {
                self.ctx.notifier.error(LOAD_FAILED);
                Err(err)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn count_with_status(&self, status: VerificationStatus) -> usize {
        self.listings
            .iter()
            .filter(|l| l.verification_status == status)
            .count()
    }

    pub fn form(&mut self) -> &mut ListingForm {
        &mut self.composer.form
    }

    pub fn can_submit(&self) -> bool {
        self.composer.can_submit()
    }

    /// Create a listing from the dialog, then refetch the owner's listings
    pub async fn submit(&mut self) -> Result<Listing> {
        let created = self.scope.run(self.composer.submit(self.user.id)).await?;
        info!("{} now awaits verification", created.title);
        // A refetch failure is already surfaced by load(); the listing exists
        let _ = self.load().await;
        Ok(created)
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}
