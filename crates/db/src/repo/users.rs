use seasongate_core::types::{Namespace, User};
use sqlx::SqlitePool;

use crate::StoreError;
use crate::repo::kv;

/// Create or replace the record for `user.ip`.
pub async fn put_user(pool: &SqlitePool, user: &User) -> Result<(), StoreError> {
    kv::put(pool, Namespace::Users, &user.ip, user).await
}

/// Find the record reported from `ip`.
pub async fn get_user(pool: &SqlitePool, ip: &str) -> Result<User, StoreError> {
    kv::get(pool, Namespace::Users, ip).await
}
