use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{FetchError, StorageError};
use crate::favorites::FavoritesStore;
use crate::models::{CatalogItem, CatalogItemDetail};
use crate::notify::Notifier;
use crate::tmdb::{CatalogApi, MovieList};

pub const LOAD_FAILED_MESSAGE: &str = "No se pudieron cargar las películas";
pub const DETAIL_FAILED_MESSAGE: &str = "No se pudieron cargar los detalles de la película";

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("screen was closed before the operation finished")]
    Closed,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("nothing loaded yet")]
    NotLoaded,
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Lifetime of one screen. Work started through [`Screen::run`] is dropped
/// once the screen closes, and so is any result that lands afterwards.
#[derive(Debug, Clone, Default)]
pub struct Screen {
    token: CancellationToken,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    /// A screen that also closes when `parent` is cancelled.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
        }
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn run<F, T>(&self, fut: F) -> Result<T, ScreenError>
    where
        F: Future<Output = T>,
    {
        if self.is_closed() {
            return Err(ScreenError::Closed);
        }
        let out = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(ScreenError::Closed),
            out = fut => out,
        };
        if self.is_closed() {
            return Err(ScreenError::Closed);
        }
        Ok(out)
    }
}

/// A paginated movie list: first page, load-more, retry, and a title filter.
pub struct Feed {
    catalog: Arc<dyn CatalogApi>,
    notifier: Option<Arc<dyn Notifier>>,
    list: MovieList,
    screen: Screen,
    items: Vec<CatalogItem>,
    page: u32,
    failed_page: Option<u32>,
    error: Option<String>,
}

impl Feed {
    pub fn new(catalog: Arc<dyn CatalogApi>, list: MovieList, screen: Screen) -> Self {
        Self {
            catalog,
            notifier: None,
            list,
            screen,
            items: Vec::new(),
            page: 0,
            failed_page: None,
            error: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Last page successfully loaded; 0 before the first load.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replaces the list with page 1.
    pub async fn refresh(&mut self) -> Result<usize, ScreenError> {
        self.load(1).await
    }

    pub async fn load_more(&mut self) -> Result<usize, ScreenError> {
        self.load(self.page + 1).await
    }

    /// Re-issues the request that last failed, or page 1 if none did.
    pub async fn retry(&mut self) -> Result<usize, ScreenError> {
        let page = self.failed_page.unwrap_or(1);
        self.load(page).await
    }

    /// Loaded items whose title contains `query`, ignoring case.
    pub fn filter(&self, query: &str) -> Vec<&CatalogItem> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.items.iter().collect();
        }
        self.items
            .iter()
            .filter(|i| i.title.to_lowercase().contains(&needle))
            .collect()
    }

    async fn load(&mut self, page: u32) -> Result<usize, ScreenError> {
        let result = self
            .screen
            .run(self.catalog.list(self.list, page))
            .await?;
        match result {
            Ok(batch) => {
                let count = batch.len();
                if page == 1 {
                    self.items = batch;
                } else {
                    self.items.extend(batch);
                }
                self.page = page;
                self.failed_page = None;
                self.error = None;
                debug!(list = ?self.list, page, count, total = self.items.len(), "Feed page applied");
                if page > 1 {
                    if let Some(notifier) = &self.notifier {
                        notifier.notify_new_movies(count).await;
                    }
                }
                Ok(count)
            }
            Err(e) => {
                warn!(list = ?self.list, page, "Failed to load feed page: {}", e);
                self.failed_page = Some(page);
                self.error = Some(LOAD_FAILED_MESSAGE.to_string());
                Err(e.into())
            }
        }
    }
}

/// One movie opened from a feed, with its favorite toggle.
pub struct DetailView {
    catalog: Arc<dyn CatalogApi>,
    favorites: FavoritesStore,
    notifier: Option<Arc<dyn Notifier>>,
    screen: Screen,
    detail: Option<CatalogItemDetail>,
    favorite: bool,
    error: Option<String>,
}

impl DetailView {
    pub fn new(catalog: Arc<dyn CatalogApi>, favorites: FavoritesStore, screen: Screen) -> Self {
        Self {
            catalog,
            favorites,
            notifier: None,
            screen,
            detail: None,
            favorite: false,
            error: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn detail(&self) -> Option<&CatalogItemDetail> {
        self.detail.as_ref()
    }

    pub fn is_favorite(&self) -> bool {
        self.favorite
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetches the detail record and the favorite flag together. The detail
    /// is never cached, so opening the same id again hits the network again.
    pub async fn open(&mut self, id: i64) -> Result<&CatalogItemDetail, ScreenError> {
        let (detail, favorite) = self
            .screen
            .run(async {
                tokio::join!(self.catalog.get_detail(id), self.favorites.is_favorite(id))
            })
            .await?;
        match detail {
            Ok(detail) => {
                self.favorite = favorite;
                self.error = None;
                Ok(&*self.detail.insert(detail))
            }
            Err(e) => {
                warn!(id, "Failed to load detail: {}", e);
                self.error = Some(DETAIL_FAILED_MESSAGE.to_string());
                Err(e.into())
            }
        }
    }

    /// Flips the favorite flag of the open movie. The write runs to
    /// completion on its own task, so closing the screen mid-toggle only
    /// drops the view update, never half of a save.
    pub async fn toggle_favorite(&mut self) -> Result<bool, ScreenError> {
        let item = self
            .detail
            .as_ref()
            .map(|d| d.item.clone())
            .ok_or(ScreenError::NotLoaded)?;
        if self.screen.is_closed() {
            return Err(ScreenError::Closed);
        }
        let favorites = self.favorites.clone();
        let notifier = self.notifier.clone();
        let write = tokio::spawn(async move {
            let now_favorite = favorites.toggle_favorite(&item).await?;
            if let Some(notifier) = notifier {
                notifier
                    .notify_favorite_changed(&item.title, now_favorite)
                    .await;
            }
            Ok::<_, StorageError>(now_favorite)
        });
        let now_favorite = self.screen.run(write).await???;
        self.favorite = now_favorite;
        Ok(now_favorite)
    }
}
