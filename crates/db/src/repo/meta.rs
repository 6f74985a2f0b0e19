use seasongate_core::types::{Namespace, SeasonMeta};
use sqlx::SqlitePool;

use crate::StoreError;
use crate::repo::kv;

/// Store season metadata under the given identity.
///
/// The key is supplied by the caller and is not derived from `meta.id`.
pub async fn put_season_meta(
    pool: &SqlitePool,
    id: u64,
    meta: &SeasonMeta,
) -> Result<(), StoreError> {
    kv::put(pool, Namespace::Meta, &id.to_string(), meta).await
}

/// Load season metadata by identity.
pub async fn get_season_meta(pool: &SqlitePool, id: u64) -> Result<SeasonMeta, StoreError> {
    kv::get(pool, Namespace::Meta, &id.to_string()).await
}
