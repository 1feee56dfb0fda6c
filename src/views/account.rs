use crate::app::AppContext;
use crate::error::{Error, Result};
use crate::models::{Profile, User};
use crate::routes::Route;
use crate::scope::ViewScope;

/// Account settings: currently just the display name
pub struct AccountView {
    ctx: AppContext,
    scope: ViewScope,
    user: User,
    profile: Option<Profile>,
    pub full_name: String,
}

impl AccountView {
    pub fn mount(ctx: AppContext) -> Result<Self> {
        let user = ctx.session.current_user().ok_or(Error::NotAuthenticated {
            redirect: Route::Home,
        })?;
        Ok(Self {
            ctx,
            scope: ViewScope::mount(),
            user,
            profile: None,
            full_name: String::new(),
        })
    }

    pub async fn load(&mut self) -> Result<Option<&Profile>> {
        let profile = self.scope.run(self.ctx.store.profile(self.user.id)).await?;
        self.full_name = profile
            .as_ref()
            .and_then(|p| p.full_name.clone())
            .unwrap_or_default();
        self.profile = profile;
        Ok(self.profile.as_ref())
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub async fn save(&mut self) -> Result<()> {
        let name = self.full_name.trim().to_string();
        let result = self
            .scope
            .run(self.ctx.store.update_full_name(self.user.id, &name))
            .await;

        match result {
            Ok(()) => {
                if let Some(profile) = self.profile.as_mut() {
                    profile.full_name = Some(name);
                }
                self.ctx.notifier.success("Profile updated!");
                Ok(())
            }
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(err) => {
                self.ctx.notifier.error("Failed to update profile");
                Err(err)
            }
        }
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::views::testing;

    #[tokio::test]
    async fn updates_full_name() {
        let (backend, ctx) = testing::context();
        let user = testing::signed_in(&backend, &ctx, Role::Beekeeper).await;

        let mut view = AccountView::mount(ctx.clone()).unwrap();
        let profile = view.load().await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Beekeeper);
        assert_eq!(view.full_name, "");

        view.full_name = "  Ion Albinaru ".into();
        view.save().await.unwrap();

        let stored = ctx.store.profile(user.id).await.unwrap().unwrap();
        assert_eq!(stored.full_name.as_deref(), Some("Ion Albinaru"));
        assert_eq!(ctx.notifier.drain()[0].message, "Profile updated!");
    }

    #[tokio::test]
    async fn signed_out_goes_home() {
        let (_, ctx) = testing::context();
        assert!(matches!(
            AccountView::mount(ctx),
            Err(Error::NotAuthenticated {
                redirect: Route::Home
            })
        ));
    }

    #[tokio::test]
    async fn failed_save_notifies() {
        let (backend, ctx) = testing::context();
        testing::signed_in(&backend, &ctx, Role::Landowner).await;
        let mut view = AccountView::mount(ctx.clone()).unwrap();
        backend.set_fail_writes(true);

        view.full_name = "Maria".into();
        assert!(view.save().await.is_err());
        assert_eq!(ctx.notifier.drain()[0].message, "Failed to update profile");
    }
}
