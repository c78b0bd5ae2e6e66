//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the single mirror handler
//! - Wire up middleware (tracing, request ID, timeout, panic isolation)
//! - Dispatch each request to static assets, raw passthrough, or the
//!   fetch-and-rewrite pipeline
//! - Serve until the shutdown signal fires

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{header::InvalidHeaderValue, HeaderMap, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use bytes::Bytes;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::assets::StaticAssets;
use crate::config::{validate_config, MirrorConfig, ValidationError};
use crate::http::request;
use crate::http::response::{self, MirrorError};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::rewrite::{RewriteEngine, RewriteError};
use crate::routing::{self, Dispatch};
use crate::upstream::{HttpTransport, Transport, UpstreamError, UpstreamFetcher};

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0:?}")]
    Config(Vec<ValidationError>),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("invalid server name: {0}")]
    ServerName(#[from] InvalidHeaderValue),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<UpstreamFetcher>,
    pub engine: Arc<RewriteEngine>,
    pub assets: Arc<StaticAssets>,
    pub server_name: HeaderValue,
}

/// HTTP server for the mirror.
pub struct HttpServer {
    router: Router,
    config: MirrorConfig,
}

impl HttpServer {
    /// Create a server that fetches through the shared HTTP client.
    pub fn new(config: MirrorConfig) -> Result<Self, ServerError> {
        let transport = HttpTransport::new(&config.upstream, &config.timeouts)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a server over an explicit upstream transport.
    pub fn with_transport(
        config: MirrorConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ServerError::Config)?;

        let state = AppState {
            fetcher: Arc::new(UpstreamFetcher::new(&config.upstream.origin_base_url, transport)),
            engine: Arc::new(RewriteEngine::from_config(&config.upstream)?),
            assets: Arc::new(StaticAssets::new(&config.static_assets)),
            server_name: HeaderValue::from_str(&config.listener.server_name)?,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &MirrorConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(mirror_handler))
            .route("/{*path}", any(mirror_handler))
            .with_state(state)
            .layer(CatchPanicLayer::new())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(request::propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(request::set_request_id_layer())
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Serve on `listener` until `signal` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        signal: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let upstream = &self.config().upstream;
        tracing::info!(
            address = %addr,
            origin = %upstream.origin_base_url,
            mirror = %upstream.mirror_base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(signal))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Single entry point: method gate, dispatch, error mapping.
async fn mirror_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let request_id = request::request_id(&headers);
    let path = uri.path();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Received request"
    );

    let route = match routing::dispatch(&method, path) {
        Ok(route) => route,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Rejected request");
            let response = response::method_not_allowed();
            metrics::record_request(method.as_str(), response.status().as_u16(), "rejected", start_time);
            return response;
        }
    };

    // Upstream sees the query string too.
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or(path);

    let result = match route {
        Dispatch::StaticAsset(name) => serve_static(&state, name).await,
        Dispatch::Resource => serve_resource(&state, target, path).await,
        Dispatch::Document => serve_document(&state, target).await,
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(request_id = %request_id, route = route.label(), path = %path, error = %e, "Request failed");
            } else {
                tracing::warn!(request_id = %request_id, route = route.label(), path = %path, error = %e, "Request failed");
            }
            e.into_response()
        }
    };

    tracing::debug!(
        request_id = %request_id,
        route = route.label(),
        status = response.status().as_u16(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request complete"
    );
    metrics::record_request(method.as_str(), response.status().as_u16(), route.label(), start_time);
    response
}

async fn serve_static(state: &AppState, name: &str) -> Result<Response, MirrorError> {
    let asset = state.assets.serve(name).await?;
    response::static_asset(asset, state.assets.cache_control())
}

async fn serve_resource(state: &AppState, target: &str, path: &str) -> Result<Response, MirrorError> {
    let resource = state.fetcher.fetch(target).await?;
    let content_type = match &resource.content_type {
        Some(content_type) => content_type.clone(),
        None => mime_guess::from_path(path).first_or_octet_stream().to_string(),
    };
    response::resource(resource, &content_type)
}

async fn serve_document(state: &AppState, target: &str) -> Result<Response, MirrorError> {
    let resource = state.fetcher.fetch(target).await?;
    let body = match state.engine.rewrite(&resource.body, resource.content_type()) {
        Cow::Borrowed(_) => resource.body.clone(),
        Cow::Owned(rewritten) => Bytes::from(rewritten),
    };
    response::document(&resource, body, &state.server_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{FetchedResource, UpstreamResult};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Mutex;
    use tower::ServiceExt;

    const PAGE: &str = concat!(
        "<html><head><title>Cat</title></head><body>",
        "<a href=\"/wiki/Dog\">Dog</a> <a href=\"/w/index.php?title=Cat\">edit</a>",
        "</body></html>"
    );

    #[derive(Default)]
    struct StubOrigin {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Transport for StubOrigin {
        async fn get(&self, url: &str) -> UpstreamResult<FetchedResource> {
            self.seen.lock().unwrap().push(url.to_string());
            let path = url.trim_start_matches("https://wikipedia.org");
            let (content_type, body): (Option<&str>, &'static [u8]) = match path {
                "/wiki/Broken" => {
                    return Err(UpstreamError::Fetch {
                        url: url.to_string(),
                        source: "connection reset".into(),
                    })
                }
                "/w/skins/logo.png" => (None, &b"\x89PNG"[..]),
                "/w/load.php?only=styles" => {
                    (Some("text/css"), &b"a{background:url(//x/y.png)}"[..])
                }
                _ => (Some("text/html; charset=UTF-8"), PAGE.as_bytes()),
            };
            Ok(FetchedResource {
                status: StatusCode::OK,
                content_type: content_type.map(str::to_owned),
                body: Bytes::from_static(body),
            })
        }
    }

    fn server() -> (Router, Arc<StubOrigin>) {
        let mut config = MirrorConfig::default();
        config.static_assets.dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string();
        let origin = Arc::new(StubOrigin::default());
        let server = HttpServer::with_transport(config, origin.clone()).unwrap();
        (server.router(), origin)
    }

    async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, HeaderMap, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn test_non_read_methods_get_405_everywhere() {
        for uri in ["/wiki/Cat", "/static/custom.css", "/w/load.php", "/"] {
            let (router, origin) = server();
            let (status, headers, _) = send(router, Method::POST, uri).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "POST {uri}");
            assert_eq!(headers[header::ALLOW], "GET, HEAD");
            assert!(origin.seen.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_static_assets() {
        let (router, _) = server();
        let (status, headers, body) = send(router, Method::GET, "/static/custom.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/css");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=86400");
        assert!(!body.is_empty());

        let (router, origin) = server();
        let (status, _, _) = send(router, Method::GET, "/static/unknown.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(origin.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_is_rewritten() {
        let (router, origin) = server();
        let (status, headers, body) = send(router, Method::GET, "/wiki/Cat").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=UTF-8");
        assert_eq!(headers[header::SERVER], "WikiProxy/1.0");
        assert_eq!(headers[header::CONTENT_LENGTH], body.len().to_string().as_str());
        assert!(headers.contains_key(request::X_REQUEST_ID));

        assert!(body.contains(r#"href="https://m-wikipedia.org/wiki/Dog""#));
        assert!(body.contains(r#"href="https://wikipedia.org/w/index.php?title=Cat""#));
        assert_eq!(body.matches(r#"<link rel="stylesheet" href="/static/custom.css">"#).count(), 1);
        assert_eq!(
            *origin.seen.lock().unwrap(),
            vec!["https://wikipedia.org/wiki/Cat".to_string()]
        );
    }

    #[tokio::test]
    async fn test_resource_passthrough_is_verbatim() {
        let (router, origin) = server();
        let (status, headers, body) = send(router, Method::GET, "/w/load.php?only=styles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/css");
        assert_eq!(body, "a{background:url(//x/y.png)}");
        assert_eq!(
            *origin.seen.lock().unwrap(),
            vec!["https://wikipedia.org/w/load.php?only=styles".to_string()]
        );
    }

    #[tokio::test]
    async fn test_resource_content_type_inferred_from_extension() {
        let (router, _) = server();
        let (status, headers, _) = send(router, Method::GET, "/w/skins/logo.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_500() {
        let (router, origin) = server();
        let (status, _, body) = send(router, Method::GET, "/wiki/Broken").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Error fetching content");
        assert_eq!(origin.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_client_request_id_is_echoed() {
        let (router, _) = server();
        let request = Request::builder()
            .uri("/static/custom.js")
            .header(request::X_REQUEST_ID, "trace-me")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[request::X_REQUEST_ID], "trace-me");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");
    }

    #[tokio::test]
    async fn test_run_serves_until_shutdown() {
        let mut config = MirrorConfig::default();
        config.upstream.origin_base_url = "https://example.org".into();
        let server = HttpServer::with_transport(config, Arc::new(StubOrigin::default())).unwrap();
        assert_eq!(server.config().upstream.origin_base_url, "https://example.org");

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = crate::lifecycle::Shutdown::new();
        let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server should stop after shutdown");
        assert!(result.unwrap().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = MirrorConfig::default();
        config.upstream.mirror_base_url = "mirror".into();
        let result = HttpServer::with_transport(config, Arc::new(StubOrigin::default()));
        assert!(matches!(result, Err(ServerError::Config(_))));
    }
}
