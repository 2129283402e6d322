use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const QUICK_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_REMINDER_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    pub fn favorite_saved(movie_title: &str) -> Self {
        Self::new(
            "Película guardada",
            format!("\"{movie_title}\" ha sido añadida a favoritos"),
        )
    }

    pub fn favorite_removed(movie_title: &str) -> Self {
        Self::new(
            "Película removida",
            format!("\"{movie_title}\" ha sido removida de favoritos"),
        )
    }

    pub fn reminder(movie_title: &str) -> Self {
        Self::new(
            "Recordatorio de película",
            format!("No olvides ver: \"{movie_title}\""),
        )
    }

    pub fn new_movies(count: usize) -> Self {
        Self::new(
            "Nuevas películas",
            format!("Se cargaron {count} nuevas películas populares"),
        )
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("¡Éxito!", message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }
}

/// Where a fired notification ends up.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: Notification);
}

/// Logs each notification.
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn deliver(&self, notification: Notification) {
        info!(title = %notification.title, "{}", notification.body);
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fire-and-forget; delivery is not acknowledged.
    async fn schedule(&self, notification: Notification, delay: Duration);
    async fn cancel_all(&self);

    async fn notify_favorite_changed(&self, movie_title: &str, now_favorite: bool) {
        let n = if now_favorite {
            Notification::favorite_saved(movie_title)
        } else {
            Notification::favorite_removed(movie_title)
        };
        self.schedule(n, QUICK_DELAY).await;
    }

    async fn schedule_reminder(&self, movie_title: &str, delay: Duration) {
        self.schedule(Notification::reminder(movie_title), delay)
            .await;
    }

    async fn notify_new_movies(&self, count: usize) {
        self.schedule(Notification::new_movies(count), QUICK_DELAY)
            .await;
    }
}

/// Runs each scheduled notification as a timer task on the current runtime.
pub struct LocalNotifier {
    sink: Arc<dyn NotificationSink>,
    pending: Mutex<Pending>,
}

struct Pending {
    token: CancellationToken,
    tasks: JoinSet<()>,
}

impl LocalNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            pending: Mutex::new(Pending {
                token: CancellationToken::new(),
                tasks: JoinSet::new(),
            }),
        }
    }

    /// Number of notifications not yet delivered or cancelled.
    pub async fn pending_count(&self) -> usize {
        let mut pending = self.pending.lock().await;
        while pending.tasks.try_join_next().is_some() {}
        pending.tasks.len()
    }

    /// Waits until every pending notification has been delivered. Cancelling
    /// `shutdown` drops whatever is still pending instead.
    pub async fn flush(&self, shutdown: &CancellationToken) {
        loop {
            if self.pending_count().await == 0 {
                return;
            }
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.cancel_all().await;
                    return;
                }
                _ = tokio::time::sleep(Duration::from_millis(25)) => {}
            }
        }
    }
}

#[async_trait]
impl Notifier for LocalNotifier {
    async fn schedule(&self, notification: Notification, delay: Duration) {
        let mut pending = self.pending.lock().await;
        while pending.tasks.try_join_next().is_some() {}
        let token = pending.token.clone();
        let sink = self.sink.clone();
        debug!(title = %notification.title, ?delay, "Scheduling notification");
        pending.tasks.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => sink.deliver(notification).await,
            }
        });
    }

    async fn cancel_all(&self) {
        let mut pending = self.pending.lock().await;
        while pending.tasks.try_join_next().is_some() {}
        pending.token.cancel();
        pending.token = CancellationToken::new();
        let cancelled = pending.tasks.len();
        while pending.tasks.join_next().await.is_some() {}
        info!(cancelled, "Cancelled scheduled notifications");
    }
}
