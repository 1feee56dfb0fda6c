use crate::app::AppContext;
use crate::error::Result;
use crate::models::{Role, User};
use crate::roles::RoleState;
use crate::routes::Route;
use crate::scope::ViewScope;
use tracing::debug;

/// Sign-in / sign-up page
pub struct AuthView {
    ctx: AppContext,
    scope: ViewScope,
    /// Role chosen on the sign-up tab, preselected from `?role=`
    pub role: Role,
}

impl AuthView {
    pub fn mount(ctx: AppContext, role: Option<Role>) -> Self {
        Self {
            ctx,
            scope: ViewScope::mount(),
            role: role.unwrap_or(Role::Beekeeper),
        }
    }

    /// Where to go if someone is already signed in
    pub async fn redirect_if_signed_in(&self) -> Result<Option<Route>> {
        match self.ctx.session.current_user() {
            Some(user) => Ok(Some(self.landing_for(&user).await?)),
            None => Ok(None),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Route> {
        let user = self
            .scope
            .run(self.ctx.session.sign_up(email, password, self.role))
            .await?;
        self.ctx.notifier.success("Account created!");
        self.landing_for(&user).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Route> {
        let user = self.scope.run(self.ctx.session.sign_in(email, password)).await?;
        self.landing_for(&user).await
    }

    /// Dashboard for the user's stored role, falling back to the selected one
    async fn landing_for(&self, user: &User) -> Result<Route> {
        let state = self.scope.run(self.ctx.roles().resolve(user.id)).await?;
        let role = match state {
            RoleState::Resolved { role } => role,
            RoleState::Loading | RoleState::Missing => self.role,
        };
        debug!("Routing {} to the {} dashboard", user.email, role);
        Ok(Route::dashboard(role))
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::views::testing;

    #[tokio::test]
    async fn sign_up_routes_to_selected_role_dashboard() {
        let (_, ctx) = testing::context();
        let view = AuthView::mount(ctx.clone(), Some(Role::Landowner));

        let route = view.sign_up("maria@livada.ro", "albine123").await.unwrap();
        assert_eq!(route, Route::Landowner);
        assert!(ctx.session.current_user().is_some());
    }

    #[tokio::test]
    async fn sign_in_uses_stored_role() {
        let (backend, ctx) = testing::context();
        backend
            .create_account("admin@nectaris.ro", "secret-admin", Role::Admin)
            .unwrap();
        let view = AuthView::mount(ctx, None);

        let route = view.sign_in("admin@nectaris.ro", "secret-admin").await.unwrap();
        assert_eq!(route, Route::Admin);
        assert_eq!(view.redirect_if_signed_in().await.unwrap(), Some(Route::Admin));
    }

    #[tokio::test]
    async fn closed_view_ignores_sign_in() {
        let (backend, ctx) = testing::context();
        backend.create_account("a@b.ro", "secret1", Role::Beekeeper).unwrap();
        let view = AuthView::mount(ctx.clone(), None);
        view.teardown();

        assert!(matches!(
            view.sign_in("a@b.ro", "secret1").await,
            Err(Error::Cancelled)
        ));
        assert!(ctx.session.current_user().is_none());
    }
}
