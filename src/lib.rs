pub mod auth;
pub mod config;
pub mod error;
pub mod favorites;
pub mod format;
pub mod models;
pub mod notify;
pub mod screen;
pub mod storage;
pub mod tmdb;

pub use error::{FetchError, StorageError};
pub use favorites::FavoritesStore;
pub use models::{CatalogItem, CatalogItemDetail, FavoriteEntry, FavoritesCollection, Genre};
pub use tmdb::{CatalogApi, MovieList, TmdbClient};
