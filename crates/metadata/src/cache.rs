//! Get-or-fetch cache for season metadata.
//!
//! Records are keyed by the identity parsed from the page link, while the
//! record's own `id` comes from the page body. The two usually agree but are
//! never reconciled. Lookups and writes are separate store calls, so two cold
//! resolutions of the same link may both fetch; the later write wins.

use seasongate_core::types::SeasonMeta;
use seasongate_db::StoreError;
use seasongate_db::repo::meta;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::MetadataError;
use crate::extract::SeasonFetcher;
use crate::link::resolve_link_identity;

#[derive(Clone)]
pub struct SeasonCache {
    db: SqlitePool,
    fetcher: SeasonFetcher,
}

impl SeasonCache {
    pub fn new(db: SqlitePool, fetcher: SeasonFetcher) -> Self {
        Self { db, fetcher }
    }

    pub fn fetcher(&self) -> &SeasonFetcher {
        &self.fetcher
    }

    /// Resolve `link` to its season metadata, fetching the page on first use.
    pub async fn resolve(&self, link: &str) -> Result<SeasonMeta, MetadataError> {
        let id = resolve_link_identity(link)?;

        match meta::get_season_meta(&self.db, id).await {
            Ok(cached) => {
                debug!(id, "season meta cache hit");
                return Ok(cached);
            }
            Err(StoreError::NotFound) => {}
            Err(StoreError::Codec(e)) => {
                warn!(id, error = %e, "unreadable season meta, refetching");
            }
            Err(e) => return Err(e.into()),
        }

        let fetched = self.fetcher.fetch(link).await?;
        meta::put_season_meta(&self.db, id, &fetched).await?;
        info!(id, season = fetched.id, serial = fetched.serial, "season meta cached");

        Ok(fetched)
    }
}
