use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{CatalogItem, CatalogItemDetail};

/// Which of the paginated TMDB movie lists to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieList {
    Popular,
    Upcoming,
    TopRated,
}

impl MovieList {
    fn path(&self) -> &'static str {
        match self {
            MovieList::Popular => "movie/popular",
            MovieList::Upcoming => "movie/upcoming",
            MovieList::TopRated => "movie/top_rated",
        }
    }
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list(&self, list: MovieList, page: u32) -> Result<Vec<CatalogItem>, FetchError>;
    async fn get_detail(&self, id: i64) -> Result<CatalogItemDetail, FetchError>;

    async fn list_popular(&self, page: u32) -> Result<Vec<CatalogItem>, FetchError> {
        self.list(MovieList::Popular, page).await
    }

    async fn list_upcoming(&self, page: u32) -> Result<Vec<CatalogItem>, FetchError> {
        self.list(MovieList::Upcoming, page).await
    }

    async fn list_top_rated(&self, page: u32) -> Result<Vec<CatalogItem>, FetchError> {
        self.list(MovieList::TopRated, page).await
    }
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let user_agent = format!("cinefav/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.http_timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base: config.api_base.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    fn list_url(&self, list: MovieList, page: u32) -> String {
        format!(
            "{}/{}?api_key={}&page={page}&language={}",
            self.base,
            list.path(),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.language)
        )
    }

    fn detail_url(&self, id: i64) -> String {
        format!(
            "{}/movie/{id}?api_key={}&language={}",
            self.base,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.language)
        )
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, FetchError> {
        // reqwest errors carry the request URL, api key included
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.without_url()))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| FetchError::Request(e.without_url()))?;
        if !status.is_success() {
            let redacted = redact_key(url);
            warn!(status = status.as_u16(), url = %redacted, "catalog request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: redacted,
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn list(&self, list: MovieList, page: u32) -> Result<Vec<CatalogItem>, FetchError> {
        #[derive(Deserialize)]
        struct ListResponse {
            #[serde(default)]
            results: Option<Vec<CatalogItem>>,
        }

        if page == 0 {
            return Err(FetchError::InvalidPage);
        }
        let data: ListResponse = self.get_json(&self.list_url(list, page)).await?;
        let items: Vec<CatalogItem> = data
            .results
            .unwrap_or_default()
            .into_iter()
            .map(CatalogItem::normalize)
            .collect();
        debug!(?list, page, count = items.len(), "fetched catalog page");
        Ok(items)
    }

    async fn get_detail(&self, id: i64) -> Result<CatalogItemDetail, FetchError> {
        let mut detail: CatalogItemDetail = self.get_json(&self.detail_url(id)).await?;
        detail.item = detail.item.normalize();
        debug!(id, title = %detail.item.title, "fetched catalog detail");
        Ok(detail)
    }
}

/// Strips the api key from a URL before it lands in logs or errors.
fn redact_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let query = query
        .split('&')
        .map(|pair| {
            if pair.starts_with("api_key=") {
                "api_key=***"
            } else {
                pair
            }
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{query}")
}
