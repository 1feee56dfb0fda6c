use crate::backend::{Datastore, MemoryBackend, ObjectStorage, SupabaseClient};
use crate::config::{Config, DEFAULT_IMAGE_BUCKET};
use crate::error::Result;
use crate::listing_form::{ImageUploader, ListingComposer};
use crate::notify::Notifier;
use crate::roles::RoleResolver;
use crate::session::SessionContext;
use std::sync::Arc;
use tracing::info;

/// Dependencies shared by every view, built once at startup
#[derive(Clone)]
pub struct AppContext {
    pub session: SessionContext,
    pub store: Arc<dyn Datastore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub notifier: Notifier,
    pub image_bucket: String,
}

impl AppContext {
    /// Wire everything to the hosted backend
    pub fn connect(config: Config) -> Result<Self> {
        let bucket = config.image_bucket.clone();
        info!("Connecting to {}", config.supabase_url);
        let client = Arc::new(SupabaseClient::new(config)?);

        Ok(Self {
            session: SessionContext::new(client.clone()),
            store: client.clone(),
            storage: client,
            notifier: Notifier::new(),
            image_bucket: bucket,
        })
    }

    /// Wire everything to an in-process backend
    pub fn in_memory(backend: Arc<MemoryBackend>) -> Self {
        Self {
            session: SessionContext::new(backend.clone()),
            store: backend.clone(),
            storage: backend,
            notifier: Notifier::new(),
            image_bucket: DEFAULT_IMAGE_BUCKET.to_string(),
        }
    }

    pub fn roles(&self) -> RoleResolver {
        RoleResolver::new(self.store.clone(), self.notifier.clone())
    }

    pub fn composer(&self) -> ListingComposer {
        let uploader = ImageUploader::new(self.storage.clone(), self.image_bucket.clone());
        ListingComposer::new(self.store.clone(), uploader, self.notifier.clone())
    }
}
