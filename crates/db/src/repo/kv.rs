//! Namespaced key-value access. Every call is a single statement, so each
//! `get` and `put` is atomic on its own and nothing spans two calls.

use seasongate_core::types::Namespace;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

use crate::StoreError;

/// Fetch the raw encoded value for a key.
pub async fn get_raw(
    pool: &SqlitePool,
    ns: Namespace,
    key: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as(&format!("SELECT value FROM {ns} WHERE key = ?"))
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(v,)| v))
}

/// Write the raw encoded value for a key (upsert).
pub async fn put_raw(
    pool: &SqlitePool,
    ns: Namespace,
    key: &str,
    value: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO {ns} (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value"
    ))
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Encode a record as JSON and store it under `key`, replacing any prior value.
pub async fn put<T: Serialize>(
    pool: &SqlitePool,
    ns: Namespace,
    key: &str,
    record: &T,
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(record)?;
    put_raw(pool, ns, key, &encoded).await?;
    Ok(())
}

/// Load and decode the record under `key`. Absent and empty values are both
/// reported as [`StoreError::NotFound`].
pub async fn get<T: DeserializeOwned>(
    pool: &SqlitePool,
    ns: Namespace,
    key: &str,
) -> Result<T, StoreError> {
    match get_raw(pool, ns, key).await? {
        Some(v) if !v.is_empty() => Ok(serde_json::from_str(&v)?),
        _ => Err(StoreError::NotFound),
    }
}
