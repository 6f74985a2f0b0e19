use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum_test::TestServer;
use seasongate_metadata::fetcher::HttpPageFetcher;
use seasongate_metadata::metrics::Metrics;
use seasongate_server::config::ServerConfig;
use seasongate_server::routes::build_router;
use seasongate_server::state::AppState;
use serde_json::{Value, json};

const PREROLL: &str =
    r#"<script type="text/javascript">var pr = new Preroll({id: 7});</script>"#;
const POPULAR: &str =
    r#"<li class="label"><span data-help-tr="tr" class="svico-help">Popular</span></li>"#;

// ---------------------------------------------------------------------------
// Fake catalog site
// ---------------------------------------------------------------------------

async fn season_482(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    r#"<html><head><title>My Show</title></head>
<body><div data-id-season="55" data-id-serial="482"></div></body></html>"#
}

async fn season_broken(State(hits): State<Arc<AtomicUsize>>) -> &'static str {
    hits.fetch_add(1, Ordering::SeqCst);
    r#"<html><head><title>Broken</title></head><body data-id-season="9"></body></html>"#
}

async fn player(
    State(hits): State<Arc<AtomicUsize>>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: String,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    let seen = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none")
            .to_string()
    };
    let status = if uri.path().ends_with("/missing") {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    let page = format!(
        "<html>\n{POPULAR}\n<p>{method} {} {body}</p>\n{PREROLL}\n</html>",
        uri.query().unwrap_or("")
    );
    (
        status,
        [
            ("x-seen-accept-encoding", seen(header::ACCEPT_ENCODING)),
            ("x-seen-user-agent", seen(header::USER_AGENT)),
            ("x-upstream", "1".to_string()),
        ],
        page,
    )
        .into_response()
}

async fn script(State(hits): State<Arc<AtomicUsize>>, headers: HeaderMap) -> String {
    hits.fetch_add(1, Ordering::SeqCst);
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    format!("var cfg={{host:'{host}',swichHD:1,swichHDno:0}};")
}

async fn not_found(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND
}

/// Start the fake catalog on an ephemeral port; returns its `host:port`.
async fn spawn_upstream(hits: Arc<AtomicUsize>) -> String {
    let app = Router::new()
        .route("/serial-482-show/season-1.html", get(season_482))
        .route("/serial-900-broken/season-1.html", get(season_broken))
        .route("/player/{*path}", any(player))
        .route("/js/player.js", get(script))
        .fallback(not_found)
        .with_state(hits);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    server: TestServer,
    state: AppState,
    upstream_hits: Arc<AtomicUsize>,
    upstream_host: String,
}

impl Harness {
    fn hits(&self) -> usize {
        self.upstream_hits.load(Ordering::SeqCst)
    }
}

async fn app_for(upstream_host: String) -> (TestServer, AppState) {
    let pool = seasongate_db::open(":memory:").await.unwrap();
    let config = ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        db_path: ":memory:".to_string(),
        upstream_host,
    };
    let state = AppState::new(
        pool,
        config,
        Arc::new(HttpPageFetcher::new(reqwest::Client::new())),
        Metrics::new().unwrap(),
    )
    .unwrap();
    let server = TestServer::new(build_router(state.clone())).unwrap();
    (server, state)
}

async fn harness() -> Harness {
    let upstream_hits = Arc::new(AtomicUsize::new(0));
    let upstream_host = spawn_upstream(upstream_hits.clone()).await;
    let (server, state) = app_for(upstream_host.clone()).await;
    Harness {
        server,
        state,
        upstream_hits,
        upstream_host,
    }
}

fn real_ip(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-real-ip"),
        HeaderValue::from_static(ip),
    )
}

// ---------------------------------------------------------------------------
// Health + metrics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let h = harness().await;
    let resp = h.server.get("/health").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn metrics_endpoint_exposes_fetch_counter() {
    let h = harness().await;
    h.server
        .get("/serial-482-show/season-1.html")
        .await
        .assert_status_ok();

    let resp = h.server.get("/metrics").await;
    resp.assert_status_ok();
    assert!(resp.text().contains("seasongate_page_fetches_total 1"));
}

// ---------------------------------------------------------------------------
// Season pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn season_page_fetches_once_then_serves_cache() {
    let h = harness().await;
    let (name, value) = real_ip("10.0.0.1");

    let first = h
        .server
        .get("/serial-482-show/season-1.html")
        .add_header(name.clone(), value.clone())
        .await;
    first.assert_status_ok();
    let first: Value = first.json();
    assert_eq!(first["variant"], "standard");
    assert_eq!(first["user"], Value::Null);
    assert_eq!(
        first["meta"],
        json!({
            "title": "My Show",
            "id": 55,
            "serial": 482,
            "keywords": "",
            "description": ""
        })
    );

    let second: Value = h
        .server
        .get("/serial-482-show/season-1.html")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(second["meta"], first["meta"]);
    assert_eq!(h.hits(), 1);

    let stored = seasongate_db::repo::meta::get_season_meta(&h.state.db, 482)
        .await
        .unwrap();
    assert_eq!(stored.id, 55);
    assert_eq!(stored.title, "My Show");
}

#[tokio::test]
async fn page_without_identity_fails_without_fetching() {
    let h = harness().await;
    let resp = h.server.get("/about.html").await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "internal_error");
    assert_eq!(h.hits(), 0);
}

#[tokio::test]
async fn extraction_failure_is_not_cached() {
    let h = harness().await;

    for _ in 0..2 {
        h.server
            .get("/serial-900-broken/season-1.html")
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
    assert_eq!(h.hits(), 2);

    let metrics = h.server.get("/metrics").await.text();
    assert!(metrics.contains(r#"seasongate_diagnostics_total{event="serial_id_missing"} 2"#));
}

#[tokio::test]
async fn non_page_paths_redirect_upstream() {
    let h = harness().await;
    let resp = h.server.get("/serial-482-show?sort=new").await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(
        resp.headers()[header::LOCATION],
        format!("http://{}/serial-482-show?sort=new", h.upstream_host)
    );
    assert_eq!(h.hits(), 0);
}

// ---------------------------------------------------------------------------
// Client self-report
// ---------------------------------------------------------------------------

#[tokio::test]
async fn me_is_404_before_any_report() {
    let h = harness().await;
    let (name, value) = real_ip("10.0.0.2");
    let resp = h.server.get("/api/v1/me").add_header(name, value).await;
    resp.assert_status(StatusCode::NOT_FOUND);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn self_report_is_sanitized_and_selects_secured_page() {
    let h = harness().await;
    let (name, value) = real_ip("10.0.0.3");

    let resp = h
        .server
        .post("/api/v1/me")
        .add_header(name.clone(), value.clone())
        .add_header(header::USER_AGENT, HeaderValue::from_static("test-agent/1.0"))
        .json(&json!({ "secure_mark": "  <b>vip</b>  " }))
        .await;
    resp.assert_status_ok();
    let user: Value = resp.json();
    assert_eq!(
        user,
        json!({ "ip": "10.0.0.3", "user_agent": "test-agent/1.0", "secure_mark": "bvip/b" })
    );

    let me: Value = h
        .server
        .get("/api/v1/me")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(me, user);

    let page: Value = h
        .server
        .get("/serial-482-show/season-1.html")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(page["variant"], "secured");
    assert_eq!(page["user"]["ip"], "10.0.0.3");
}

// ---------------------------------------------------------------------------
// Player proxy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn player_proxy_strips_promotions_and_fixes_length() {
    let h = harness().await;
    let resp = h
        .server
        .get("/player/embed")
        .add_query_param("id", "7")
        .add_header(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, br"))
        .add_header(header::USER_AGENT, HeaderValue::from_static("test-agent/1.0"))
        .await;
    resp.assert_status_ok();

    let body = resp.text();
    assert_eq!(body, "<html>\n\n<p>GET id=7 </p>\n\n</html>");
    assert_eq!(
        resp.headers()[header::CONTENT_LENGTH],
        body.len().to_string()
    );
    assert_eq!(resp.headers()["x-seen-accept-encoding"], "none");
    assert_ne!(resp.headers()["x-seen-user-agent"], "test-agent/1.0");
    assert_eq!(resp.headers()["x-upstream"], "1");
}

#[tokio::test]
async fn player_proxy_keeps_upstream_status() {
    let h = harness().await;
    let resp = h.server.get("/player/missing").await;
    resp.assert_status(StatusCode::NOT_FOUND);
    assert!(!resp.text().contains("Preroll"));
}

#[tokio::test]
async fn player_proxy_forwards_method_and_body() {
    let h = harness().await;
    let resp = h.server.post("/player/echo").text("hello").await;
    resp.assert_status_ok();
    assert!(resp.text().contains("<p>POST  hello</p>"));
    assert_eq!(h.hits(), 1);
}

#[tokio::test]
async fn player_proxy_reports_unreachable_upstream() {
    let (server, _state) = app_for("127.0.0.1:1".to_string()).await;
    let resp = server.get("/player/embed").await;
    resp.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "bad_gateway");
}

// ---------------------------------------------------------------------------
// Player script
// ---------------------------------------------------------------------------

#[tokio::test]
async fn player_script_is_repointed_and_hd_disabled() {
    let h = harness().await;
    let resp = h
        .server
        .get("/js/player.js")
        .add_header(
            HeaderName::from_static("x-hostname"),
            HeaderValue::from_static("mirror.test"),
        )
        .await;
    resp.assert_status_ok();
    assert_eq!(
        resp.text(),
        "var cfg={host:'mirror.test',swichHDno:1,swichHDdisabled:0};"
    );
}

#[tokio::test]
async fn player_script_fetches_are_counted() {
    let h = harness().await;
    h.server.get("/js/player.js").await.assert_status_ok();
    h.server
        .get("/js/missing.js")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let metrics = h.server.get("/metrics").await.text();
    assert!(metrics.contains("seasongate_page_fetches_total 2"));
    assert!(metrics.contains(r#"seasongate_diagnostics_total{event="fetch_failure"} 1"#));
}
