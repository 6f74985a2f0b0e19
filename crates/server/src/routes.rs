use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use seasongate_core::error::ApiError;
use seasongate_core::types::User;
use seasongate_db::StoreError;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::client::{ClientIp, clean_text};
use crate::error::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .nest("/api/v1", api_router())
        .route("/player/{*path}", any(crate::proxy::forward_player))
        .route("/js/{*path}", get(crate::pages::player_script))
        .fallback(crate::pages::season_page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).post(report_me))
        .layer(CorsLayer::permissive())
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("store check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let text = state
        .metrics()
        .encode()
        .map_err(|e| ApiError::Internal(format!("encode metrics: {e}")))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text))
}

// ---------------------------------------------------------------------------
// Client self-report
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SelfReport {
    #[serde(default)]
    secure_mark: String,
}

async fn get_me(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
) -> Result<Json<User>, AppError> {
    match seasongate_db::repo::users::get_user(&state.db, &ip).await {
        Ok(user) => Ok(Json(user)),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("user not found".into()).into()),
        Err(e) => Err(e.into()),
    }
}

async fn report_me(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Json(body): Json<SelfReport>,
) -> Result<Json<User>, AppError> {
    let user = User {
        ip,
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        secure_mark: clean_text(&body.secure_mark),
    };

    seasongate_db::repo::users::put_user(&state.db, &user).await?;
    info!(ip = %user.ip, secured = user.is_secured(), "client self-report stored");

    Ok(Json(user))
}
