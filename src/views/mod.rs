//! One view per page; each is mounted with an [`AppContext`](crate::app::AppContext)
//! and owns a [`ViewScope`](crate::scope::ViewScope) for its requests.

pub mod account;
pub mod admin;
pub mod auth;
pub mod beekeeper;
pub mod land_detail;
pub mod landowner;

pub use account::AccountView;
pub use admin::AdminDashboard;
pub use auth::AuthView;
pub use beekeeper::BeekeeperDashboard;
pub use land_detail::LandDetail;
pub use landowner::LandownerDashboard;

#[cfg(test)]
pub(crate) mod testing {
    use crate::app::AppContext;
    use crate::backend::MemoryBackend;
    use crate::models::{Listing, Role, User, VerificationStatus};
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use uuid::Uuid;

    pub fn context() -> (Arc<MemoryBackend>, AppContext) {
        let backend = Arc::new(MemoryBackend::new());
        let ctx = AppContext::in_memory(backend.clone());
        (backend, ctx)
    }

    pub async fn signed_in(backend: &MemoryBackend, ctx: &AppContext, role: Role) -> User {
        let email = format!("{}-{}@nectaris.ro", role, Uuid::new_v4());
        backend.create_account(&email, "parola-buna", role).unwrap();
        ctx.session.sign_in(&email, "parola-buna").await.unwrap()
    }

    pub fn listing(title: &str, status: VerificationStatus, age_days: i64) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            location: "Argeș".into(),
            flowers: vec!["Salcâm".into(), "Tei".into()],
            space_hectares: 2.0,
            price_per_month: 200.0,
            available_from: None,
            available_until: None,
            image_urls: vec![],
            verification_status: status,
            created_at: Utc::now() - Duration::days(age_days),
        }
    }
}
