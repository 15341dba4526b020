//! HTTP front end.
//!
//! A `tiny_http` listener accepts connections on the calling thread and hands
//! each request to a `rayon` pool, so slow raster reads never block accepts.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /image` | face-aware crop ([`Mode::FaceAware`]) |
//! | `GET /` | slice-only framing ([`Mode::Slice`]) |
//! | `GET /health` | `{"ok":true}` |
//!
//! `HEAD` is accepted wherever `GET` is; `tiny_http` drops the body.
//!
//! SVG responses carry an `ETag` derived from the body, so a client that
//! revalidates and happens to draw the same image gets a `304`.
//!
//! Routing is a pure function ([`route`]) from request parts to a [`Reply`],
//! which keeps it testable without sockets.

use crate::catalog::CatalogSource;
use crate::config::{ServiceConfig, effective_threads};
use crate::request::{ImageQuery, split_target};
use crate::service::{Mode, Service};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, StatusCode};

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml; charset=UTF-8";
const JSON_CONTENT_TYPE: &str = "application/json";
const PLAIN_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A fully-formed response, before it is handed to `tiny_http`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", content_type.to_string())],
            body: body.into(),
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self::new(status, PLAIN_CONTENT_TYPE, body)
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// First header value with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn into_response(self) -> Response<std::io::Cursor<Vec<u8>>> {
        let mut response = Response::from_data(self.body).with_status_code(StatusCode(self.status));
        for (name, value) in &self.headers {
            if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }
        response
    }
}

/// Strong ETag for a response body: first 128 bits of its SHA-256, quoted.
pub fn etag(body: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(body));
    format!("\"{}\"", &digest[..32])
}

/// Whether an `If-None-Match` header value matches `tag`.
fn etag_matches(if_none_match: &str, tag: &str) -> bool {
    if_none_match
        .split(',')
        .map(|t| t.trim().trim_start_matches("W/"))
        .any(|t| t == "*" || t == tag)
}

/// Map one request to a reply.
pub fn route<S: CatalogSource, R: Rng + ?Sized>(
    method: &Method,
    target: &str,
    if_none_match: Option<&str>,
    service: &Service<S>,
    cache_control: &str,
    rng: &mut R,
) -> Reply {
    if !matches!(method, Method::Get | Method::Head) {
        return Reply::text(405, "Method Not Allowed").with_header("Allow", "GET, HEAD");
    }

    let (path, query) = split_target(target);
    let mode = match path {
        "/health" => return Reply::new(200, JSON_CONTENT_TYPE, r#"{"ok":true}"#),
        "/image" => Mode::FaceAware,
        "/" => Mode::Slice,
        _ => return Reply::text(404, "Not Found"),
    };

    match service.render(mode, &ImageQuery::parse(query), rng) {
        Ok(svg) => {
            log::debug!("{} → {} ({})", target, svg.image, svg.source);
            let tag = etag(svg.body.as_bytes());
            if if_none_match.is_some_and(|inm| etag_matches(inm, &tag)) {
                return Reply {
                    status: 304,
                    headers: vec![
                        ("Cache-Control", cache_control.to_string()),
                        ("ETag", tag),
                    ],
                    body: Vec::new(),
                };
            }
            Reply::new(200, SVG_CONTENT_TYPE, svg.body)
                .with_header("Cache-Control", cache_control)
                .with_header("ETag", tag)
        }
        Err(err) => {
            if err.status() >= 500 {
                log::error!("{target}: {err}");
            } else {
                log::debug!("{target}: {err}");
            }
            Reply::text(err.status(), err.public_message())
        }
    }
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

/// Answer a single request and log it.
fn handle<S: CatalogSource>(request: Request, service: &Service<S>, cache_control: &str) {
    let started = Instant::now();
    let method = request.method().clone();
    let target = request.url().to_string();
    let if_none_match = header_value(&request, "If-None-Match");

    let reply = route(
        &method,
        &target,
        if_none_match.as_deref(),
        service,
        cache_control,
        &mut rand::thread_rng(),
    );
    let status = reply.status;

    if let Err(err) = request.respond(reply.into_response()) {
        log::warn!("{method} {target}: failed to send response: {err}");
    }
    log::info!(
        "{method} {target} {status} {:.1}ms",
        started.elapsed().as_secs_f64() * 1000.0
    );
}

/// Accept requests forever, dispatching each onto `pool`.
pub fn serve<S: CatalogSource + 'static>(
    server: tiny_http::Server,
    pool: rayon::ThreadPool,
    service: Arc<Service<S>>,
    cache_control: Arc<str>,
) {
    for request in server.incoming_requests() {
        let service = Arc::clone(&service);
        let cache_control = Arc::clone(&cache_control);
        pool.spawn(move || handle(request, &service, &cache_control));
    }
}

/// Build the worker pool for a config.
pub fn worker_pool(config: &ServiceConfig) -> Result<rayon::ThreadPool, ServerError> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(effective_threads(&config.server))
        .thread_name(|i| format!("facecrop-worker-{i}"))
        .build()?)
}

/// Bind, warm the catalog, and serve until the process exits.
pub fn run(config: &ServiceConfig) -> Result<(), ServerError> {
    let service = Arc::new(Service::from_config(config));

    // Load eagerly so a broken catalog shows up at startup; requests retry
    // on their own if this fails.
    if let Err(err) = service.catalog().get() {
        log::warn!("Catalog not loaded at startup: {err}");
    }

    let server = tiny_http::Server::http(&config.server.bind).map_err(|source| ServerError::Bind {
        addr: config.server.bind.clone(),
        source,
    })?;
    let pool = worker_pool(config)?;
    log::info!(
        "Listening on http://{} ({} workers)",
        config.server.bind,
        pool.current_num_threads()
    );

    serve(server, pool, service, Arc::from(config.response.cache_control.as_str()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogCache;
    use crate::catalog::tests::MockSource;
    use crate::embed::RasterStore;
    use crate::test_helpers::{entry, entry_with_face};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";
    const CACHE: &str = "public, no-cache, must-revalidate";

    fn service(entries: Vec<crate::catalog::CatalogEntry>) -> Service<MockSource> {
        Service::new(
            CatalogCache::new(MockSource::new(entries)),
            RasterStore::new("/unused", true),
        )
    }

    fn get(service: &Service<MockSource>, target: &str) -> Reply {
        route(&Method::Get, target, None, service, CACHE, &mut StdRng::seed_from_u64(3))
    }

    // =========================================================================
    // Routing
    // =========================================================================

    #[test]
    fn health_is_ok_json() {
        let reply = get(&service(vec![]), "/health");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.header("content-type"), Some("application/json"));
        assert_eq!(reply.body, br#"{"ok":true}"#);
    }

    #[test]
    fn image_route_serves_cropped_svg() {
        let svc = service(vec![entry_with_face(PIXEL, 1000, 500, (450.0, 200.0, 100.0, 100.0))]);
        let reply = get(&svc, "/image?w=200&h=200&filter=greyscale");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.header("Content-Type"), Some(SVG_CONTENT_TYPE));
        assert_eq!(reply.header("Cache-Control"), Some(CACHE));
        let body = String::from_utf8(reply.body.clone()).unwrap();
        assert!(body.contains("viewBox=\"250 0 500 500\""));
        assert!(body.contains("type=\"saturate\""));
        assert_eq!(reply.header("ETag"), Some(etag(body.as_bytes()).as_str()));
    }

    #[test]
    fn root_route_serves_slice_svg() {
        let svc = service(vec![entry(PIXEL, 1000, 500)]);
        let reply = get(&svc, "/?w=120");
        assert_eq!(reply.status, 200);
        let body = String::from_utf8(reply.body).unwrap();
        assert!(!body.contains("viewBox"));
        assert!(body.contains("<image width=\"120\" height=\"120\""));
    }

    #[test]
    fn unknown_path_is_not_found() {
        assert_eq!(get(&service(vec![]), "/favicon.ico").status, 404);
    }

    #[test]
    fn non_get_is_method_not_allowed() {
        let svc = service(vec![]);
        let reply = route(&Method::Post, "/image", None, &svc, CACHE, &mut StdRng::seed_from_u64(1));
        assert_eq!(reply.status, 405);
        assert_eq!(reply.header("Allow"), Some("GET, HEAD"));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn invalid_dimensions_is_bad_request() {
        let svc = service(vec![entry(PIXEL, 10, 10)]);
        for target in ["/image?w=0", "/image?w=abc", "/?h=-3", "/image?w=10&h=Infinity"] {
            let reply = get(&svc, target);
            assert_eq!(reply.status, 400, "{target}");
            assert_eq!(reply.body, b"Invalid dimensions");
        }
    }

    #[test]
    fn empty_catalog_is_service_unavailable() {
        let reply = get(&service(vec![]), "/image");
        assert_eq!(reply.status, 503);
        assert_eq!(reply.body, b"No image available");
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let reply = get(&service(vec![entry("/secret/path.jpg", 10, 10)]), "/");
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body, b"Internal server error");
    }

    // =========================================================================
    // ETag revalidation
    // =========================================================================

    #[test]
    fn matching_if_none_match_is_not_modified() {
        let svc = service(vec![entry(PIXEL, 100, 100)]);
        let first = get(&svc, "/image?w=10");
        let tag = first.header("ETag").unwrap().to_string();

        let reply = route(
            &Method::Get,
            "/image?w=10",
            Some(&format!("\"other\", W/{tag}")),
            &svc,
            CACHE,
            &mut StdRng::seed_from_u64(3),
        );
        assert_eq!(reply.status, 304);
        assert!(reply.body.is_empty());
        assert_eq!(reply.header("ETag"), Some(tag.as_str()));
    }

    #[test]
    fn stale_if_none_match_gets_full_body() {
        let svc = service(vec![entry(PIXEL, 100, 100)]);
        let reply = route(
            &Method::Get,
            "/image?w=10",
            Some("\"stale\""),
            &svc,
            CACHE,
            &mut StdRng::seed_from_u64(3),
        );
        assert_eq!(reply.status, 200);
        assert!(!reply.body.is_empty());
    }

    #[test]
    fn etag_is_quoted_and_stable() {
        let tag = etag(b"hello");
        assert_eq!(tag.len(), 34);
        assert!(tag.starts_with('"') && tag.ends_with('"'));
        assert_eq!(tag, etag(b"hello"));
        assert_ne!(tag, etag(b"hello!"));
    }
}
