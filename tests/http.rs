//! End-to-end test: real `tiny_http` listener on a loopback port, plain
//! HTTP/1.1 over a `TcpStream`.
//!
//! Run with: cargo test --test http

use facecrop::config::ServiceConfig;
use facecrop::server::{SVG_CONTENT_TYPE, serve, worker_pool};
use facecrop::service::Service;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use tempfile::TempDir;

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Start a server over a one-entry catalog and return its address.
///
/// The `TempDir` must outlive the test: the catalog is loaded lazily.
fn start(catalog_json: &str) -> (SocketAddr, TempDir) {
    let tmp = TempDir::new().unwrap();
    let meta = tmp.path().join("meta.json");
    std::fs::write(&meta, catalog_json).unwrap();

    let mut config = ServiceConfig::default();
    config.catalog.path = meta.display().to_string();
    config.catalog.static_root = tmp.path().display().to_string();
    config.server.workers = Some(2);

    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let pool = worker_pool(&config).unwrap();
    let service = Arc::new(Service::from_config(&config));
    let cache_control: Arc<str> = Arc::from(config.response.cache_control.as_str());
    std::thread::spawn(move || serve(server, pool, service, cache_control));
    (addr, tmp)
}

fn request(addr: SocketAddr, method: &str, target: &str, extra: &[(&str, &str)]) -> Reply {
    let mut stream = TcpStream::connect(addr).unwrap();
    let mut head = format!("{method} {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in extra {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();
    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let mut lines = head.lines();
    let status = lines
        .next()
        .unwrap()
        .split_whitespace()
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();
    let headers = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();
    Reply {
        status,
        headers,
        body: body.to_string(),
    }
}

fn get(addr: SocketAddr, target: &str) -> Reply {
    request(addr, "GET", target, &[])
}

fn one_face_catalog() -> String {
    format!(
        r#"[{{"data": "{PIXEL}", "source": "test", "width": 1000, "height": 500,
             "face": {{"x": 450, "y": 200, "w": 100, "h": 100}}}}]"#
    )
}

#[test]
fn health_endpoint() {
    let (addr, _tmp) = start("[]");
    let reply = get(addr, "/health");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, r#"{"ok":true}"#);
}

#[test]
fn face_aware_svg_over_http() {
    let (addr, _tmp) = start(&one_face_catalog());
    let reply = get(addr, "/image?w=200&h=200&filter=blur,greyscale");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some(SVG_CONTENT_TYPE));
    assert_eq!(
        reply.header("Cache-Control"),
        Some("public, no-cache, must-revalidate")
    );
    assert!(reply.body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(reply.body.contains("viewBox=\"250 0 500 500\""));
    assert!(reply.body.contains("<feColorMatrix in=\"blurred\""));
    assert!(reply.body.contains(PIXEL));
}

#[test]
fn slice_svg_over_http() {
    let (addr, _tmp) = start(&one_face_catalog());
    let reply = get(addr, "/?w=300&h=100");
    assert_eq!(reply.status, 200);
    assert!(!reply.body.contains("viewBox"));
    assert!(!reply.body.contains("<filter"));
}

#[test]
fn revalidation_with_etag() {
    let (addr, _tmp) = start(&one_face_catalog());
    let first = get(addr, "/image?w=64");
    let tag = first.header("ETag").unwrap().to_string();

    let second = request(addr, "GET", "/image?w=64", &[("If-None-Match", &tag)]);
    assert_eq!(second.status, 304);
    assert!(second.body.is_empty());
}

#[test]
fn error_statuses() {
    let (addr, _tmp) = start(&one_face_catalog());
    let bad = get(addr, "/image?w=0.5");
    assert_eq!(bad.status, 400);
    assert_eq!(bad.body, "Invalid dimensions");
    assert_eq!(get(addr, "/nope").status, 404);
    assert_eq!(request(addr, "DELETE", "/image", &[]).status, 405);

    let (empty, _tmp2) = start("[]");
    let unavailable = get(empty, "/image");
    assert_eq!(unavailable.status, 503);
    assert_eq!(unavailable.body, "No image available");
}
