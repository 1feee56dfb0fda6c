use crate::app::AppContext;
use crate::error::{Error, Result};
use crate::models::Listing;
use crate::scope::ViewScope;
use uuid::Uuid;

/// `/land/:id`
pub struct LandDetail {
    scope: ViewScope,
    ctx: AppContext,
    pub id: Uuid,
    listing: Option<Listing>,
    loading: bool,
}

impl LandDetail {
    pub fn mount(ctx: AppContext, id: Uuid) -> Self {
        Self {
            scope: ViewScope::mount(),
            ctx,
            id,
            listing: None,
            loading: true,
        }
    }

    /// A missing row leaves the view in its not-found state rather than failing
    pub async fn load(&mut self) -> Result<Option<&Listing>> {
        let fetched = self.scope.run(self.ctx.store.listing(self.id)).await;
        if let Err(Error::Cancelled) = fetched {
            return Err(Error::Cancelled);
        }
        self.loading = false;
        self.listing = fetched?;
        Ok(self.listing.as_ref())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn listing(&self) -> Option<&Listing> {
        self.listing.as_ref()
    }

    /// Availability line, e.g. "De la: 01.04.2026 · Până la: 30.09.2026"
    pub fn availability(&self) -> Option<String> {
        let listing = self.listing.as_ref()?;
        let parts: Vec<String> = [
            listing
                .available_from
                .map(|d| format!("De la: {}", d.format("%d.%m.%Y"))),
            listing
                .available_until
                .map(|d| format!("Până la: {}", d.format("%d.%m.%Y"))),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!parts.is_empty()).then(|| parts.join(" · "))
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerificationStatus;
    use crate::views::testing;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn loads_listing_with_availability() {
        let (backend, ctx) = testing::context();
        let mut listing = testing::listing("Livadă", VerificationStatus::Verified, 1);
        listing.available_from = NaiveDate::from_ymd_opt(2026, 4, 1);
        listing.available_until = NaiveDate::from_ymd_opt(2026, 9, 30);
        backend.seed_listing(listing.clone());

        let mut view = LandDetail::mount(ctx, listing.id);
        assert_eq!(view.load().await.unwrap().map(|l| l.id), Some(listing.id));
        assert_eq!(
            view.availability().as_deref(),
            Some("De la: 01.04.2026 · Până la: 30.09.2026")
        );
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_state() {
        let (_, ctx) = testing::context();
        let mut view = LandDetail::mount(ctx, Uuid::new_v4());
        assert!(view.load().await.unwrap().is_none());
        assert!(!view.is_loading());
        assert!(view.availability().is_none());
    }
}
