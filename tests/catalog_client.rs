use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cinefav::config::Config;
use cinefav::{CatalogApi, FetchError, MovieList, TmdbClient};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockTmdb {
    hits: Mutex<Vec<String>>,
    fail_with: Mutex<Option<u16>>,
}

impl MockTmdb {
    fn record(&self, path: &str, query: Option<String>) -> Option<Response> {
        self.hits
            .lock()
            .unwrap()
            .push(format!("{path}?{}", query.unwrap_or_default()));
        let status = (*self.fail_with.lock().unwrap())?;
        let status = StatusCode::from_u16(status).unwrap();
        Some(
            (
                status,
                Json(json!({ "status_message": "Internal error", "success": false })),
            )
                .into_response(),
        )
    }

    fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

fn movie(id: i64, title: &str, vote: f64) -> Value {
    json!({
        "id": id,
        "title": title,
        "poster_path": format!("/{id}.jpg"),
        "overview": format!("Sinopsis de {title}"),
        "release_date": "1994-09-23",
        "vote_average": vote,
        "popularity": 42.0,
        "genre_ids": [18, 80]
    })
}

fn page_query(query: &Option<String>) -> u32 {
    query
        .as_deref()
        .unwrap_or("")
        .split('&')
        .find_map(|p| p.strip_prefix("page="))
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
}

async fn list_handler(mock: Arc<MockTmdb>, path: &str, query: Option<String>) -> Response {
    let page = page_query(&query);
    if let Some(failure) = mock.record(path, query) {
        return failure;
    }
    if page > 2 {
        return Json(json!({ "page": page, "total_pages": 2 })).into_response();
    }
    let base = (page as i64) * 100;
    Json(json!({
        "page": page,
        "results": [
            movie(base + 1, "Cadena perpetua", 8.7),
            movie(base + 2, "El padrino", 8.69),
            movie(base + 3, "Fuera de escala", 11.0),
        ],
        "total_pages": 2
    }))
    .into_response()
}

async fn popular(State(mock): State<Arc<MockTmdb>>, RawQuery(q): RawQuery) -> Response {
    list_handler(mock, "/movie/popular", q).await
}

async fn upcoming(State(mock): State<Arc<MockTmdb>>, RawQuery(q): RawQuery) -> Response {
    list_handler(mock, "/movie/upcoming", q).await
}

async fn top_rated(State(mock): State<Arc<MockTmdb>>, RawQuery(q): RawQuery) -> Response {
    list_handler(mock, "/movie/top_rated", q).await
}

async fn detail(
    State(mock): State<Arc<MockTmdb>>,
    Path(id): Path<i64>,
    RawQuery(q): RawQuery,
) -> Response {
    if let Some(failure) = mock.record(&format!("/movie/{id}"), q) {
        return failure;
    }
    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "status_code": 34, "status_message": "The resource you requested could not be found." })),
        )
            .into_response();
    }
    let mut body = movie(id, "Forrest Gump", 8.5);
    let obj = body.as_object_mut().unwrap();
    obj.remove("genre_ids");
    obj.insert(
        "genres".to_string(),
        json!([{ "id": 35, "name": "Comedia" }, { "id": 18, "name": "Drama" }]),
    );
    obj.insert("runtime".to_string(), json!(142));
    obj.insert("budget".to_string(), json!(55000000));
    obj.insert("revenue".to_string(), json!(677387716));
    obj.insert("status".to_string(), json!("Released"));
    obj.insert("tagline".to_string(), json!("El mundo nunca será el mismo."));
    Json(body).into_response()
}

async fn spawn_tmdb() -> (TmdbClient, Arc<MockTmdb>) {
    let mock = Arc::new(MockTmdb::default());
    let app = Router::new()
        .route("/3/movie/popular", get(popular))
        .route("/3/movie/upcoming", get(upcoming))
        .route("/3/movie/top_rated", get(top_rated))
        .route("/3/movie/:id", get(detail))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let config = Config::new("test-key").with_api_base(format!("http://{addr}/3"));
    (TmdbClient::new(&config).unwrap(), mock)
}

#[tokio::test]
async fn lists_popular_page_with_ratings_in_range() {
    let (client, mock) = spawn_tmdb().await;
    let items = client.list_popular(1).await.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].id, 101);
    assert_eq!(items[0].image_path.as_deref(), Some("/101.jpg"));
    assert_eq!(items[0].genre_ids, vec![18, 80]);
    assert!(items
        .iter()
        .all(|i| (0.0..=10.0).contains(&i.rating_average)));
    assert_eq!(
        mock.hits(),
        vec!["/movie/popular?api_key=test-key&page=1&language=es-ES".to_string()]
    );
}

#[tokio::test]
async fn pages_are_independent() {
    let (client, _mock) = spawn_tmdb().await;
    let first = client.list_popular(1).await.unwrap();
    let second = client.list_popular(2).await.unwrap();
    assert_eq!(second[0].id, 201);
    assert!(first.iter().all(|a| second.iter().all(|b| a.id != b.id)));
}

#[tokio::test]
async fn missing_results_is_empty_page() {
    let (client, _mock) = spawn_tmdb().await;
    let items = client.list_popular(3).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn other_lists_use_their_endpoints() {
    let (client, mock) = spawn_tmdb().await;
    client.list_upcoming(1).await.unwrap();
    client.list_top_rated(2).await.unwrap();
    client.list(MovieList::Popular, 1).await.unwrap();
    let hits = mock.hits();
    assert!(hits[0].starts_with("/movie/upcoming?"));
    assert!(hits[1].starts_with("/movie/top_rated?"));
    assert!(hits[1].contains("page=2"));
    assert!(hits[2].starts_with("/movie/popular?"));
}

#[tokio::test]
async fn page_zero_is_rejected_without_request() {
    let (client, mock) = spawn_tmdb().await;
    let err = client.list_popular(0).await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidPage));
    assert!(mock.hits().is_empty());
}

#[tokio::test]
async fn server_error_surfaces_and_retry_repeats_request() {
    let (client, mock) = spawn_tmdb().await;
    *mock.fail_with.lock().unwrap() = Some(500);

    let err = client.list_popular(2).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    match &err {
        FetchError::Status { url, body, .. } => {
            assert!(!url.contains("test-key"));
            assert!(body.contains("Internal error"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
    // no automatic retry
    assert_eq!(mock.hits().len(), 1);

    *mock.fail_with.lock().unwrap() = None;
    let items = client.list_popular(2).await.unwrap();
    assert_eq!(items.len(), 3);
    let hits = mock.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0], hits[1]);
}

#[tokio::test]
async fn detail_is_fetched_every_time() {
    let (client, mock) = spawn_tmdb().await;
    let detail = client.get_detail(13).await.unwrap();
    assert_eq!(detail.item.id, 13);
    assert_eq!(detail.item.title, "Forrest Gump");
    assert_eq!(detail.genres.len(), 2);
    assert_eq!(detail.runtime_minutes, Some(142));
    assert_eq!(detail.budget, Some(55_000_000));
    assert_eq!(detail.status.as_deref(), Some("Released"));
    assert!(detail.tagline.is_some());

    client.get_detail(13).await.unwrap();
    let hits = mock.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0], "/movie/13?api_key=test-key&language=es-ES");
}

#[tokio::test]
async fn missing_detail_is_fetch_error() {
    let (client, _mock) = spawn_tmdb().await;
    let err = client.get_detail(404).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn unreachable_host_is_request_error() {
    let config = Config::new("k").with_api_base("http://127.0.0.1:1/3");
    let client = TmdbClient::new(&config).unwrap();
    let err = client.list_popular(1).await.unwrap_err();
    assert!(matches!(err, FetchError::Request(_)));
}

#[tokio::test]
async fn transport_errors_do_not_leak_api_key() {
    let config = Config::new("SUPERSECRETKEY").with_api_base("http://127.0.0.1:1/3");
    let client = TmdbClient::new(&config).unwrap();

    let err = client.list_popular(1).await.unwrap_err();
    assert!(matches!(err, FetchError::Request(_)));
    assert!(!err.to_string().contains("SUPERSECRETKEY"));
    assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));

    let err = client.get_detail(13).await.unwrap_err();
    assert!(!err.to_string().contains("SUPERSECRETKEY"));
}
