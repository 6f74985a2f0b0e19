//! Reverse proxy for the upstream video player.
//!
//! The request goes to the fixed upstream origin with the same path and
//! query. The upstream body is buffered whole, stripped of promotional
//! fragments and returned with a recomputed `Content-Length`.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::response::Response;
use seasongate_core::error::ApiError;
use seasongate_metadata::agent::random_user_agent;
use tracing::{debug, warn};

use crate::client::ClientIp;
use crate::error::AppError;
use crate::rewrite::strip_promotions;
use crate::state::AppState;

const MAX_REQUEST_BODY: usize = 16 * 1024 * 1024;

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Extra per-hop headers named by the `Connection` header itself.
fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// Headers sent upstream: the caller's headers minus hop-by-hop headers,
/// `Host`, `Content-Length` and `Accept-Encoding`, with a rotated user-agent
/// and the caller appended to `X-Forwarded-For`.
pub fn outbound_headers(inbound: &HeaderMap, client_ip: &str) -> HeaderMap {
    let listed = connection_listed(inbound);
    let mut out = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if is_hop_by_hop(name)
            || listed.contains(name)
            || name == header::HOST
            || name == header::CONTENT_LENGTH
            || name == header::ACCEPT_ENCODING
            || name == header::USER_AGENT
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }

    out.insert(
        header::USER_AGENT,
        HeaderValue::from_static(random_user_agent()),
    );

    let forwarded_for = match inbound
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        Some(prior) => format!("{prior}, {client_ip}"),
        None => client_ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        out.insert("x-forwarded-for", value);
    }

    out
}

/// Headers returned to the caller: the upstream's headers minus hop-by-hop
/// headers and `Content-Length`.
pub fn returned_headers(upstream: &HeaderMap) -> HeaderMap {
    let listed = connection_listed(upstream);
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_hop_by_hop(name) || listed.contains(name) || name == header::CONTENT_LENGTH {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Forward a player request upstream and strip promotions from the reply.
pub async fn forward_player(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = state.config.absolute_link(path);

    let body = axum::body::to_bytes(body, MAX_REQUEST_BODY)
        .await
        .map_err(|e| ApiError::BadRequest(format!("read request body: {e}")))?;

    debug!(method = %parts.method, url = %url, "proxying player request");
    let upstream = state
        .proxy_client
        .request(parts.method, &url)
        .headers(outbound_headers(&parts.headers, &ip))
        .body(body)
        .send()
        .await
        .map_err(|e| {
            warn!(url = %url, error = %e, "player upstream unreachable");
            ApiError::BadGateway(format!("upstream request failed: {e}"))
        })?;

    let status = upstream.status();
    let headers = returned_headers(upstream.headers());
    let raw = upstream
        .bytes()
        .await
        .map_err(|e| ApiError::BadGateway(format!("read upstream body: {e}")))?;

    let filtered = strip_promotions(&raw);
    let len = filtered.len();
    debug!(
        status = status.as_u16(),
        upstream_len = raw.len(),
        filtered_len = len,
        "player response rewritten"
    );

    let mut response = Response::new(Body::from(filtered));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    Ok(response)
}
