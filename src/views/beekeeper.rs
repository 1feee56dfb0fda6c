use crate::app::AppContext;
use crate::backend::ListingQuery;
use crate::error::{Error, Result};
use crate::favorites::FavoritesStore;
use crate::filter::ListingFilter;
use crate::models::{Listing, Role, User};
use crate::scope::ViewScope;
use tracing::{info, warn};
use uuid::Uuid;

pub const LOAD_FAILED: &str = "Eroare la încărcarea terenurilor";

/// Verified listings with search, filters and favorites
pub struct BeekeeperDashboard {
    ctx: AppContext,
    scope: ViewScope,
    user: User,
    listings: Vec<Listing>,
    favorites: FavoritesStore,
    pub filter: ListingFilter,
    loading: bool,
}

impl BeekeeperDashboard {
    pub fn mount(ctx: AppContext) -> Result<Self> {
        let user = ctx.session.require_user(Some(Role::Beekeeper))?;
        let favorites = FavoritesStore::new(ctx.store.clone(), ctx.notifier.clone(), user.id);
        Ok(Self {
            ctx,
            scope: ViewScope::mount(),
            user,
            listings: Vec::new(),
            favorites,
            filter: ListingFilter::default(),
            loading: true,
        })
    }

    /// Fetch verified listings and this user's favorites
    pub async fn load(&mut self) -> Result<()> {
        let query = ListingQuery::verified();
        let (listings, favorites) = tokio::join!(
            self.scope.run(self.ctx.store.listings(&query)),
            self.scope.run(self.favorites.load()),
        );

        if let Err(Error::Cancelled) = listings {
            return Err(Error::Cancelled);
        }
        self.loading = false;

        if let Err(err) = favorites {
            warn!("Favorites unavailable for {}: {}", self.user.email, err);
        }
        match listings {
            Ok(rows) => {
                info!("{} verified listings available", rows.len());
                self.listings = rows;
                Ok(())
            }
            Err(err) => {
                self.listings.clear();
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

    /// Listings passing the current filter, in fetch order
    pub fn visible(&self) -> Vec<&Listing> {
        self.filter.apply(&self.listings, self.favorites.ids())
    }

    pub fn is_favorite(&self, land_id: Uuid) -> bool {
        self.favorites.contains(land_id)
    }

    pub async fn toggle_favorite(&mut self, land_id: Uuid) -> Result<bool> {
        self.scope.run(self.favorites.toggle(land_id)).await
    }

    /// Message shown when nothing passes the filter
    pub fn empty_message(&self) -> &'static str {
        if self.filter.favorites_only {
            "Nu ai favorite încă"
        } else {
            "Nu s-au găsit terenuri"
        }
    }

    pub fn heading(&self) -> &'static str {
        if self.filter.favorites_only {
            "Favoritele Tale"
        } else {
            "Găsește Teren Perfect pentru Stupii Tăi"
        }
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FlowerFilter;
    use crate::models::VerificationStatus;
    use crate::routes::Route;
    use crate::views::testing;

    #[tokio::test]
    async fn requires_sign_in() {
        let (_, ctx) = testing::context();
        match BeekeeperDashboard::mount(ctx) {
            Err(Error::NotAuthenticated { redirect }) => {
                assert_eq!(redirect, Route::sign_in_as(Role::Beekeeper))
            }
            _ => panic!("expected redirect to sign-in"),
        }
    }

    #[tokio::test]
    async fn shows_only_verified_newest_first() {
        let (backend, ctx) = testing::context();
        backend.seed_listing(testing::listing("Veche", VerificationStatus::Verified, 10));
        backend.seed_listing(testing::listing("Nouă", VerificationStatus::Verified, 1));
        backend.seed_listing(testing::listing("În așteptare", VerificationStatus::Pending, 0));
        backend.seed_listing(testing::listing("Respinsă", VerificationStatus::Denied, 0));
        testing::signed_in(&backend, &ctx, Role::Beekeeper).await;

        let mut view = BeekeeperDashboard::mount(ctx).unwrap();
        assert!(view.is_loading());
        view.load().await.unwrap();
        assert!(!view.is_loading());

        let titles: Vec<_> = view.visible().iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["Nouă", "Veche"]);
    }

    #[tokio::test]
    async fn favorites_toggle_feeds_filter() {
        let (backend, ctx) = testing::context();
        let first = testing::listing("Salcâmi", VerificationStatus::Verified, 2);
        let second = testing::listing("Tei bătrâni", VerificationStatus::Verified, 1);
        backend.seed_listing(first.clone());
        backend.seed_listing(second.clone());
        testing::signed_in(&backend, &ctx, Role::Beekeeper).await;

        let mut view = BeekeeperDashboard::mount(ctx).unwrap();
        view.load().await.unwrap();

        view.filter.favorites_only = true;
        assert!(view.visible().is_empty());
        assert_eq!(view.empty_message(), "Nu ai favorite încă");

        assert!(view.toggle_favorite(first.id).await.unwrap());
        assert!(view.is_favorite(first.id));
        let visible: Vec<_> = view.visible().iter().map(|l| l.id).collect();
        assert_eq!(visible, [first.id]);

        view.filter = ListingFilter {
            flower: FlowerFilter::Tag("Lavandă".into()),
            ..Default::default()
        };
        assert!(view.visible().is_empty());
        assert_eq!(view.empty_message(), "Nu s-au găsit terenuri");
    }

    #[tokio::test]
    async fn load_failure_clears_and_notifies() {
        let (backend, ctx) = testing::context();
        testing::signed_in(&backend, &ctx, Role::Beekeeper).await;
        backend.set_fail_reads(true);

        let mut view = BeekeeperDashboard::mount(ctx.clone()).unwrap();
        assert!(view.load().await.is_err());
        assert!(!view.is_loading());
        assert!(view.listings().is_empty());
        assert!(ctx
            .notifier
            .drain()
            .iter()
            .any(|n| n.message == LOAD_FAILED));
    }

    #[tokio::test]
    async fn torn_down_view_keeps_state() {
        let (backend, ctx) = testing::context();
        backend.seed_listing(testing::listing("Câmp", VerificationStatus::Verified, 1));
        testing::signed_in(&backend, &ctx, Role::Beekeeper).await;

        let mut view = BeekeeperDashboard::mount(ctx).unwrap();
        view.teardown();
        assert!(matches!(view.load().await, Err(Error::Cancelled)));
        assert!(view.listings().is_empty());
        assert!(view.is_loading());
    }
}
