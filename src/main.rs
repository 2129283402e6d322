use anyhow::{bail, Context, Result};
use cinefav::auth::{validate_credentials, FormMode};
use cinefav::config::Config;
use cinefav::format::{format_date, format_rating, image_url_from};
use cinefav::notify::{LocalNotifier, Notification, Notifier, TracingSink, DEFAULT_REMINDER_SECS};
use cinefav::screen::{DetailView, Feed, Screen};
use cinefav::storage::FileStore;
use cinefav::{CatalogApi, CatalogItem, FavoritesStore, MovieList, TmdbClient};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: cinefav <popular|upcoming|top-rated> [pages]
       cinefav search <text> [pages]
       cinefav detail <id>
       cinefav toggle <id>
       cinefav remind <id> [seconds]
       cinefav favorites
       cinefav check-login <email> <password> [confirm]";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

struct App {
    config: Config,
    catalog: Arc<dyn CatalogApi>,
    favorites: FavoritesStore,
    notifier: Arc<LocalNotifier>,
    shutdown: CancellationToken,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let catalog: Arc<dyn CatalogApi> =
            Arc::new(TmdbClient::new(&config).context("Failed to build TMDB HTTP client")?);
        let favorites = FavoritesStore::new(Arc::new(FileStore::new(config.data_dir.clone())));
        let notifier = Arc::new(LocalNotifier::new(Arc::new(TracingSink)));
        Ok(Self {
            config,
            catalog,
            favorites,
            notifier,
            shutdown: CancellationToken::new(),
        })
    }

    fn screen(&self) -> Screen {
        Screen::child_of(&self.shutdown)
    }

    fn print_item(&self, item: &CatalogItem) {
        println!(
            "{:>8}  {}  ★ {}  {}",
            item.id,
            item.title,
            format_rating(item.rating_average),
            format_date(item.release_date.as_deref())
        );
    }

    async fn feed(&self, list: MovieList, pages: u32, query: Option<&str>) -> Result<()> {
        let notifier: Arc<dyn Notifier> = self.notifier.clone();
        let mut feed = Feed::new(self.catalog.clone(), list, self.screen()).with_notifier(notifier);
        feed.refresh().await.context("Failed to load first page")?;
        while feed.page() < pages.max(1) {
            if let Err(e) = feed.load_more().await {
                warn!("Stopping at page {}: {}", feed.page(), e);
                break;
            }
        }
        let shown = feed.filter(query.unwrap_or(""));
        for item in &shown {
            self.print_item(item);
        }
        info!(pages = feed.page(), shown = shown.len(), total = feed.items().len(), "Listed movies");
        self.notifier.flush(&self.shutdown).await;
        Ok(())
    }

    async fn detail(&self, id: i64) -> Result<()> {
        let mut view = DetailView::new(self.catalog.clone(), self.favorites.clone(), self.screen());
        let detail = view.open(id).await.context("Failed to load movie")?;
        let item = &detail.item;
        println!("{} ({})", item.title, item.id);
        if let Some(tagline) = &detail.tagline {
            println!("  \"{tagline}\"");
        }
        println!("  Estreno:     {}", format_date(item.release_date.as_deref()));
        println!("  Valoración:  {}", format_rating(item.rating_average));
        if !detail.genres.is_empty() {
            let genres: Vec<&str> = detail.genres.iter().map(|g| g.name.as_str()).collect();
            println!("  Géneros:     {}", genres.join(", "));
        }
        if let Some(runtime) = detail.runtime_minutes {
            println!("  Duración:    {runtime} min");
        }
        if let Some(status) = &detail.status {
            println!("  Estado:      {status}");
        }
        if let Some(url) = image_url_from(&self.config.image_base, item.image_path.as_deref()) {
            println!("  Póster:      {url}");
        }
        println!();
        println!("{}", item.synopsis);
        println!();
        println!(
            "{}",
            if view.is_favorite() {
                "★ En favoritos"
            } else {
                "☆ No está en favoritos"
            }
        );
        Ok(())
    }

    async fn toggle(&self, id: i64) -> Result<()> {
        let notifier: Arc<dyn Notifier> = self.notifier.clone();
        let mut view = DetailView::new(self.catalog.clone(), self.favorites.clone(), self.screen())
            .with_notifier(notifier);
        view.open(id).await.context("Failed to load movie")?;
        match view.toggle_favorite().await {
            Ok(now) => {
                println!("{}", if now { "añadida" } else { "removida" });
            }
            Err(e) => {
                self.notifier
                    .schedule(Notification::error(e.to_string()), Duration::ZERO)
                    .await;
                self.notifier.flush(&self.shutdown).await;
                return Err(e).context("Failed to update favorites");
            }
        }
        self.notifier.flush(&self.shutdown).await;
        Ok(())
    }

    async fn remind(&self, id: i64, delay: Duration) -> Result<()> {
        let mut view = DetailView::new(self.catalog.clone(), self.favorites.clone(), self.screen());
        let detail = view.open(id).await.context("Failed to load movie")?;
        self.notifier
            .schedule_reminder(&detail.item.title, delay)
            .await;
        println!("Recordatorio programado en {}s (Ctrl+C para cancelar)", delay.as_secs());
        self.notifier.flush(&self.shutdown).await;
        Ok(())
    }

    async fn list_favorites(&self) {
        let entries = self.favorites.list_favorites().await;
        if entries.is_empty() {
            println!("No hay favoritos");
        }
        for e in entries {
            println!("{:>8}  {}", e.id, e.title);
        }
    }
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    let raw = arg.context(USAGE)?;
    raw.trim()
        .parse()
        .with_context(|| format!("'{raw}' is not a movie id"))
}

fn parse_pages(arg: Option<&String>) -> Result<u32> {
    match arg {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("'{raw}' is not a page count")),
        None => Ok(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("");

    if command == "check-login" {
        let email = args.get(1).map(String::as_str).unwrap_or("");
        let password = args.get(2).map(String::as_str).unwrap_or("");
        let (mode, confirm) = match args.get(3) {
            Some(c) => (FormMode::Register, c.as_str()),
            None => (FormMode::Login, ""),
        };
        match validate_credentials(mode, email, password, confirm) {
            Ok(()) => println!("{}", Notification::success("Datos válidos").body),
            Err(e) => bail!("{e}"),
        }
        return Ok(());
    }

    let app = App::new(Config::from_env()?)?;
    let shutdown = app.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received (Ctrl+C)");
            shutdown.cancel();
        }
    });

    match command {
        "popular" => app.feed(MovieList::Popular, parse_pages(args.get(1))?, None).await,
        "upcoming" => app.feed(MovieList::Upcoming, parse_pages(args.get(1))?, None).await,
        "top-rated" => app.feed(MovieList::TopRated, parse_pages(args.get(1))?, None).await,
        "search" => {
            let query = args.get(1).context(USAGE)?;
            app.feed(MovieList::Popular, parse_pages(args.get(2))?, Some(query))
                .await
        }
        "detail" => app.detail(parse_id(args.get(1))?).await,
        "toggle" => app.toggle(parse_id(args.get(1))?).await,
        "remind" => {
            let id = parse_id(args.get(1))?;
            let secs = match args.get(2) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("'{raw}' is not a number of seconds"))?,
                None => DEFAULT_REMINDER_SECS,
            };
            app.remind(id, Duration::from_secs(secs)).await
        }
        "favorites" => {
            app.list_favorites().await;
            Ok(())
        }
        _ => bail!("{USAGE}"),
    }
}
