use crate::backend::Datastore;
use crate::error::Result;
use crate::models::Favorite;
use crate::notify::Notifier;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// One beekeeper's favorite listings, mirrored from the `favorites` table
///
/// Mutations apply locally first and are rolled back if the remote write
/// fails, so the local set never claims a membership the table lacks.
pub struct FavoritesStore {
    store: Arc<dyn Datastore>,
    notifier: Notifier,
    beekeeper_id: Uuid,
    ids: HashSet<Uuid>,
}

impl FavoritesStore {
    pub fn new(store: Arc<dyn Datastore>, notifier: Notifier, beekeeper_id: Uuid) -> Self {
        Self {
            store,
            notifier,
            beekeeper_id,
            ids: HashSet::new(),
        }
    }

    pub fn ids(&self) -> &HashSet<Uuid> {
        &self.ids
    }

    pub fn contains(&self, land_id: Uuid) -> bool {
        self.ids.contains(&land_id)
    }

    /// Replace the local set with the remote one
    pub async fn load(&mut self) -> Result<&HashSet<Uuid>> {
        match self.store.favorite_ids(self.beekeeper_id).await {
            Ok(ids) => {
                debug!("Loaded {} favorites", ids.len());
                self.ids = ids;
                Ok(&self.ids)
            }
            Err(err) => {
                warn!("Eroare la încărcarea favoritelor: {}", err);
                Err(err)
            }
        }
    }

    fn pair(&self, land_id: Uuid) -> Favorite {
        Favorite {
            beekeeper_id: self.beekeeper_id,
            land_id,
        }
    }

    pub async fn add(&mut self, land_id: Uuid) -> Result<()> {
        let inserted = self.ids.insert(land_id);
        if let Err(err) = self.store.insert_favorite(&self.pair(land_id)).await {
            if inserted {
                self.ids.remove(&land_id);
            }
            return Err(err);
        }
        Ok(())
    }

    pub async fn remove(&mut self, land_id: Uuid) -> Result<()> {
        let removed = self.ids.remove(&land_id);
        if let Err(err) = self.store.delete_favorite(&self.pair(land_id)).await {
            if removed {
                self.ids.insert(land_id);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Flip membership and tell the user; returns whether it is now a favorite
    pub async fn toggle(&mut self, land_id: Uuid) -> Result<bool> {
        let was_favorite = self.contains(land_id);
        let outcome = if was_favorite {
            self.remove(land_id).await
        } else {
            self.add(land_id).await
        };

        match outcome {
            Ok(()) if was_favorite => {
                self.notifier.success("Eliminat din favorite");
                Ok(false)
            }
            Ok(()) => {
                self.notifier.success("Adăugat la favorite");
                Ok(true)
            }
            Err(err) => {
                self.notifier.error("Eroare la actualizarea favoritelor");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::{Listing, VerificationStatus};
    use crate::notify::Level;
    use chrono::Utc;

    fn seeded() -> (Arc<MemoryBackend>, Uuid) {
        let backend = Arc::new(MemoryBackend::new());
        let id = Uuid::new_v4();
        backend.seed_listing(Listing {
            id,
            owner_id: Uuid::new_v4(),
            title: "Stupină la deal".into(),
            description: None,
            location: "Vâlcea".into(),
            flowers: vec!["Salcâm".into()],
            space_hectares: 3.0,
            price_per_month: 250.0,
            available_from: None,
            available_until: None,
            image_urls: vec![],
            verification_status: VerificationStatus::Verified,
            created_at: Utc::now(),
        });
        (backend, id)
    }

    #[tokio::test]
    async fn add_twice_equals_add_once() {
        let (backend, land) = seeded();
        let mut favorites = FavoritesStore::new(backend.clone(), Notifier::new(), Uuid::new_v4());

        favorites.add(land).await.unwrap();
        favorites.add(land).await.unwrap();

        assert_eq!(favorites.ids().len(), 1);
        assert_eq!(backend.favorite_count(), 1);
        favorites.load().await.unwrap();
        assert!(favorites.contains(land));
    }

    #[tokio::test]
    async fn removing_non_member_is_a_no_op() {
        let (backend, land) = seeded();
        let mut favorites = FavoritesStore::new(backend.clone(), Notifier::new(), Uuid::new_v4());

        favorites.remove(land).await.unwrap();
        assert!(favorites.ids().is_empty());
        assert_eq!(backend.favorite_count(), 0);
    }

    #[tokio::test]
    async fn toggle_flips_and_notifies() {
        let (backend, land) = seeded();
        let notifier = Notifier::new();
        let mut favorites = FavoritesStore::new(backend, notifier.clone(), Uuid::new_v4());

        assert!(favorites.toggle(land).await.unwrap());
        assert!(!favorites.toggle(land).await.unwrap());

        let messages: Vec<_> = notifier.drain().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, ["Adăugat la favorite", "Eliminat din favorite"]);
    }

    #[tokio::test]
    async fn failed_write_rolls_back_local_set() {
        let (backend, land) = seeded();
        let notifier = Notifier::new();
        let mut favorites = FavoritesStore::new(backend.clone(), notifier.clone(), Uuid::new_v4());

        backend.set_fail_writes(true);
        assert!(favorites.toggle(land).await.is_err());
        assert!(!favorites.contains(land));

        backend.set_fail_writes(false);
        favorites.add(land).await.unwrap();
        backend.set_fail_writes(true);
        assert!(favorites.remove(land).await.is_err());
        assert!(favorites.contains(land));

        let notes = notifier.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Error);
    }
}
