use serde::{Deserialize, Deserializer, Serialize};

/// One movie as returned by the TMDB list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    #[serde(rename = "poster_path", default)]
    pub image_path: Option<String>,
    #[serde(rename = "overview", default)]
    pub synopsis: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub release_date: Option<String>,
    #[serde(rename = "vote_average", default)]
    pub rating_average: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

impl CatalogItem {
    /// Pins wire values into the ranges the rest of the crate relies on.
    pub(crate) fn normalize(mut self) -> Self {
        self.rating_average = if self.rating_average.is_finite() {
            self.rating_average.clamp(0.0, 10.0)
        } else {
            0.0
        };
        if self.image_path.as_deref() == Some("") {
            self.image_path = None;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Extended record fetched from `/movie/{id}` when a single item is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemDetail {
    #[serde(flatten)]
    pub item: CatalogItem,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(rename = "runtime", default)]
    pub runtime_minutes: Option<i64>,
    #[serde(default)]
    pub budget: Option<i64>,
    #[serde(default)]
    pub revenue: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub tagline: Option<String>,
}

/// The reduced projection of a [`CatalogItem`] kept in local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub id: i64,
    pub title: String,
    #[serde(default, alias = "imagePath", alias = "poster_path")]
    pub image_path: Option<String>,
    #[serde(default, alias = "overview")]
    pub synopsis: String,
}

impl From<&CatalogItem> for FavoriteEntry {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            image_path: item.image_path.clone(),
            synopsis: item.synopsis.clone(),
        }
    }
}

pub const FAVORITES_VERSION: u32 = 1;

/// Everything stored under the favorites key, written as one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritesCollection {
    pub version: u32,
    pub entries: Vec<FavoriteEntry>,
}

impl Default for FavoritesCollection {
    fn default() -> Self {
        Self {
            version: FAVORITES_VERSION,
            entries: Vec::new(),
        }
    }
}

impl FavoritesCollection {
    pub fn contains(&self, id: i64) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
