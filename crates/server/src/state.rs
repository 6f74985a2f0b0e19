use std::sync::Arc;

use seasongate_metadata::cache::SeasonCache;
use seasongate_metadata::extract::SeasonFetcher;
use seasongate_metadata::fetcher::PageFetcher;
use seasongate_metadata::metrics::Metrics;
use sqlx::SqlitePool;

use crate::config::ServerConfig;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<ServerConfig>,
    pub cache: SeasonCache,
    /// Client for the player proxy. Never follows redirects, so upstream
    /// redirects reach the caller untouched.
    pub proxy_client: reqwest::Client,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: ServerConfig,
        pages: Arc<dyn PageFetcher>,
        metrics: Metrics,
    ) -> Result<Self, reqwest::Error> {
        let proxy_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let cache = SeasonCache::new(db.clone(), SeasonFetcher::new(pages, metrics));

        Ok(Self {
            db,
            config: Arc::new(config),
            cache,
            proxy_client,
        })
    }

    pub fn metrics(&self) -> &Metrics {
        self.cache.fetcher().metrics()
    }

    pub fn pages(&self) -> &Arc<dyn PageFetcher> {
        self.cache.fetcher().pages()
    }
}
