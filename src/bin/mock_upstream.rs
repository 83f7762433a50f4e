//! Mock upstream services for local end-to-end runs
//!
//! Serves, on one port:
//! - `GET  /devices` - device directory (fixtures/devices.json)
//! - `POST /session/login` - returns a fixed token
//! - `POST /session/location` - accepts any coordinates
//! - `GET  /session/inventory` - fixtures/inventory.json
//! - `GET  /session/heartbeat` - fixtures/heartbeat.json
//! - `POST /webhook` - prints the message, answers with `--webhook-status`
//!
//! Usage:
//!   cargo run --bin mock_upstream -- --port 9200 --fixtures fixtures --webhook-status 200
//!   RADAR_WEBHOOK=http://localhost:9200/webhook@me cargo run --bin species-radar

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

const MOCK_TOKEN: &str = "mock-session-token";

#[derive(Parser, Debug)]
#[command(name = "mock_upstream")]
#[command(about = "Mock device directory, game session gateway and webhook")]
struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value = "9200")]
    port: u16,

    /// Directory holding devices.json, inventory.json and heartbeat.json
    #[arg(short, long, default_value = "fixtures")]
    fixtures: PathBuf,

    /// Status code the webhook answers with
    #[arg(long, default_value = "200")]
    webhook_status: u16,
}

struct MockState {
    fixtures: PathBuf,
    webhook_status: StatusCode,
    webhook_count: AtomicU64,
}

fn response(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .body(Full::new(body.into()))
        .expect("static response should not fail")
}

fn json(body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    response(StatusCode::OK, "application/json", body)
}

async fn fixture(state: &MockState, name: &str) -> Response<Full<Bytes>> {
    let path = state.fixtures.join(name);
    match tokio::fs::read(&path).await {
        Ok(content) => json(content),
        Err(e) => {
            eprintln!("[MOCK] Failed to read fixture {}: {}", path.display(), e);
            response(StatusCode::NOT_FOUND, "text/plain", format!("missing fixture {}", name))
        }
    }
}

fn has_token(req: &Request<hyper::body::Incoming>) -> bool {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", MOCK_TOKEN))
}

async fn read_body(req: Request<hyper::body::Incoming>) -> Bytes {
    match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            eprintln!("[MOCK] Failed to read request body: {}", e);
            Bytes::new()
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<MockState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if path.starts_with("/session/") && path != "/session/login" && !has_token(&req) {
        println!("[MOCK] {} {} -> 401 (missing token)", method, path);
        return Ok(response(StatusCode::UNAUTHORIZED, "text/plain", "missing token"));
    }

    let resp = match (&method, path.as_str()) {
        (&Method::GET, "/devices") => fixture(&state, "devices.json").await,
        (&Method::POST, "/session/login") => {
            let body = read_body(req).await;
            let login: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();
            println!(
                "[MOCK] Login user={} provider={} start={}",
                login["username"], login["provider"], login["location"]
            );
            json(format!(r#"{{"token":"{}"}}"#, MOCK_TOKEN))
        }
        (&Method::POST, "/session/location") => {
            let body = read_body(req).await;
            println!("[MOCK] Location set: {}", String::from_utf8_lossy(&body));
            response(StatusCode::NO_CONTENT, "text/plain", Bytes::new())
        }
        (&Method::GET, "/session/inventory") => fixture(&state, "inventory.json").await,
        (&Method::GET, "/session/heartbeat") => fixture(&state, "heartbeat.json").await,
        (&Method::POST, "/webhook") => {
            let body = read_body(req).await;
            let n = state.webhook_count.fetch_add(1, Ordering::Relaxed) + 1;
            match serde_json::from_slice::<serde_json::Value>(&body) {
                Ok(message) => println!(
                    "[MOCK] Webhook #{} -> {} channel={} text={} image={}",
                    n,
                    state.webhook_status.as_u16(),
                    message["channel"],
                    message["text"],
                    message["attachments"][0]["image_url"]
                ),
                Err(e) => println!("[MOCK] Webhook #{} with invalid JSON: {}", n, e),
            }
            response(state.webhook_status, "text/plain", "ok")
        }
        _ => response(StatusCode::NOT_FOUND, "text/plain", "Not Found"),
    };

    println!("[MOCK] {} {} -> {}", method, path, resp.status().as_u16());
    Ok(resp)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let webhook_status = StatusCode::from_u16(args.webhook_status)?;

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = TcpListener::bind(addr).await?;
    let state = Arc::new(MockState {
        fixtures: args.fixtures.clone(),
        webhook_status,
        webhook_count: AtomicU64::new(0),
    });

    println!(
        "[MOCK] Listening on {} (fixtures={}, webhook_status={})",
        addr,
        args.fixtures.display(),
        webhook_status.as_u16()
    );

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, state).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                eprintln!("[MOCK] Connection error: {}", e);
            }
        });
    }
}
