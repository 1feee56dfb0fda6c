use crate::app::AppContext;
use crate::error::Result;
use crate::models::Listing;
use crate::moderation::{available_actions, AdminSnapshot, AdminStats, ModerationAction, Moderation};
use crate::roles::RoleState;
use crate::scope::ViewScope;
use tracing::debug;
use uuid::Uuid;

/// Moderation console, only reachable by admins
pub struct AdminDashboard {
    scope: ViewScope,
    role: RoleState,
    moderation: Moderation,
}

impl AdminDashboard {
    /// Re-resolve the caller's role and load the console
    ///
    /// Non-admins get `AccessDenied` pointing home; signed-out callers get
    /// `NotAuthenticated` pointing to the sign-in page.
    pub async fn mount(ctx: AppContext) -> Result<Self> {
        let user = ctx.session.require_user(None)?;
        let scope = ViewScope::mount();
        let roles = ctx.roles();

        let role = scope.run(roles.resolve(user.id)).await?;
        roles.require_admin(role)?;

        let moderation = Moderation::new(ctx.store.clone(), ctx.notifier.clone());
        let mut view = Self {
            scope,
            role,
            moderation,
        };
        if let Err(err) = view.refresh().await {
            debug!("Admin console opened without data: {}", err);
        }
        Ok(view)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.scope.run(self.moderation.resync()).await
    }

    pub fn snapshot(&self) -> &AdminSnapshot {
        self.moderation.snapshot()
    }

    pub fn stats(&self) -> AdminStats {
        self.moderation.stats()
    }

    pub fn actions_for(&self, listing: &Listing) -> Vec<ModerationAction> {
        available_actions(listing)
    }

    pub async fn verify(&mut self, id: Uuid) -> Result<()> {
        self.scope.run(self.moderation.verify(id)).await
    }

    pub async fn deny(&mut self, id: Uuid) -> Result<()> {
        self.scope.run(self.moderation.deny(id)).await
    }

    pub async fn delete<F>(&mut self, id: Uuid, confirm: F) -> Result<bool>
    where
        F: FnOnce(&Listing) -> bool,
    {
        self.scope.run(self.moderation.delete(id, confirm)).await
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}
