//! Catalog page handling: season pages resolve their cached metadata, every
//! other path is sent to the upstream site.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use seasongate_core::error::ApiError;
use seasongate_core::types::{SeasonMeta, User};
use seasongate_db::StoreError;
use seasongate_metadata::metrics::Diagnostic;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::ClientIp;
use crate::error::AppError;
use crate::rewrite::rewrite_script;
use crate::state::AppState;

/// Which page template the context is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageVariant {
    Standard,
    Secured,
}

/// Everything a page template needs.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub variant: PageVariant,
    pub user: Option<User>,
    pub meta: SeasonMeta,
}

fn request_uri(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

/// Fallback handler for catalog paths.
pub async fn season_page(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    uri: Uri,
) -> Result<Response, AppError> {
    let request_uri = request_uri(&uri);
    let link = state.config.absolute_link(request_uri);

    if !request_uri.contains(".html") {
        return Ok((StatusCode::FOUND, [(header::LOCATION, link)]).into_response());
    }

    let user = match seasongate_db::repo::users::get_user(&state.db, &ip).await {
        Ok(user) => Some(user),
        Err(StoreError::NotFound) => None,
        Err(e) => {
            warn!(ip = %ip, error = %e, "user lookup failed, rendering anonymous page");
            None
        }
    };

    let meta = state.cache.resolve(&link).await?;

    let variant = match &user {
        Some(u) if u.is_secured() => PageVariant::Secured,
        _ => PageVariant::Standard,
    };
    debug!(link = %link, ?variant, "rendering season page");

    let context = PageContext {
        variant,
        user,
        meta,
    };
    let body = serde_json::to_vec(&context).map_err(|e| {
        state.metrics().incr(Diagnostic::RenderFailure);
        ApiError::Internal(format!("render page: {e}"))
    })?;

    Ok((
        [(header::CONTENT_TYPE, "application/json;charset=utf-8")],
        body,
    )
        .into_response())
}

/// GET /js/{*path}: upstream player script, re-pointed at this host.
/// Counted as a page fetch like season pages.
pub async fn player_script(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, AppError> {
    let link = state.config.absolute_link(request_uri(&uri));
    state.metrics().record_fetch();
    let script = state.pages().get(&link, &[]).await.inspect_err(|e| {
        state.metrics().incr(Diagnostic::FetchFailure);
        warn!(link = %link, error = %e, "player script fetch failed");
    })?;

    let public_host = headers.get("x-hostname").and_then(|v| v.to_str().ok());
    let body = rewrite_script(&script, &state.config.upstream_host, public_host);

    Ok((
        [(header::CONTENT_TYPE, "application/javascript;charset=utf-8")],
        body,
    )
        .into_response())
}
