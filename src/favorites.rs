use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::models::{CatalogItem, FavoriteEntry, FavoritesCollection, FAVORITES_VERSION};
use crate::storage::KeyValueStore;

pub const FAVORITES_KEY: &str = "favorites";

/// Shapes the favorites key has held over time.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFavorites {
    Versioned(FavoritesCollection),
    Legacy(Vec<FavoriteEntry>),
}

/// Persisted favorites, read and written as a single document.
///
/// Every mutation holds `write_lock` for its whole read-modify-write, so two
/// overlapping toggles are applied one after the other and neither is lost.
#[derive(Clone)]
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl FavoritesStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn is_favorite(&self, id: i64) -> bool {
        match self.load().await {
            Ok(collection) => collection.contains(id),
            Err(e) => {
                warn!(id, "Failed to read favorites, treating as empty: {}", e);
                false
            }
        }
    }

    pub async fn list_favorites(&self) -> Vec<FavoriteEntry> {
        match self.load().await {
            Ok(collection) => collection.entries,
            Err(e) => {
                warn!("Failed to read favorites, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Adds `item` if absent, removes it if present. Returns the new state.
    pub async fn toggle_favorite(&self, item: &CatalogItem) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load_for_update().await?;
        let now_favorite = if collection.contains(item.id) {
            collection.entries.retain(|e| e.id != item.id);
            false
        } else {
            collection.entries.push(FavoriteEntry::from(item));
            true
        };
        self.save(&collection).await?;
        info!(id = item.id, title = %item.title, favorite = now_favorite, "Toggled favorite");
        Ok(now_favorite)
    }

    /// Returns whether an entry was removed.
    pub async fn remove(&self, id: i64) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load_for_update().await?;
        let before = collection.entries.len();
        collection.entries.retain(|e| e.id != id);
        if collection.entries.len() == before {
            return Ok(false);
        }
        self.save(&collection).await?;
        info!(id, "Removed favorite");
        Ok(true)
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.storage.remove(FAVORITES_KEY).await?;
        info!("Cleared favorites");
        Ok(())
    }

    async fn load(&self) -> Result<FavoritesCollection, StorageError> {
        match self.storage.get(FAVORITES_KEY).await? {
            Some(raw) => decode(&raw),
            None => Ok(FavoritesCollection::default()),
        }
    }

    /// An unreadable blob is replaced rather than blocking every later write.
    async fn load_for_update(&self) -> Result<FavoritesCollection, StorageError> {
        match self.load().await {
            Ok(c) => Ok(c),
            Err(e) if e.is_unreadable() => {
                warn!("Discarding unreadable favorites before write: {}", e);
                Ok(FavoritesCollection::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, collection: &FavoritesCollection) -> Result<(), StorageError> {
        let raw = serde_json::to_string(collection).map_err(StorageError::Serialize)?;
        self.storage.set(FAVORITES_KEY, &raw).await
    }
}

fn decode(raw: &str) -> Result<FavoritesCollection, StorageError> {
    let stored: StoredFavorites = serde_json::from_str(raw).map_err(StorageError::Parse)?;
    let mut collection = match stored {
        StoredFavorites::Versioned(c) if c.version > FAVORITES_VERSION => {
            return Err(StorageError::UnsupportedVersion(c.version));
        }
        StoredFavorites::Versioned(c) => c,
        StoredFavorites::Legacy(entries) => {
            debug!(count = entries.len(), "Migrating unversioned favorites");
            FavoritesCollection {
                version: FAVORITES_VERSION,
                entries,
            }
        }
    };
    let mut seen = HashSet::new();
    collection.entries.retain(|e| seen.insert(e.id));
    collection.version = FAVORITES_VERSION;
    Ok(collection)
}
