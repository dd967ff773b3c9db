// HTTP front-end: one controller per request, stage outcome mapped to status

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use tracing::{error, info};

use portico_core::application::{BootOutcome, Halt, JsonInputReader};
use portico_core::domain::{RequestEnv, RunMode, Stage};
use portico_core::port::BufferedResponse;

use crate::gateway::Gateway;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

pub fn router(gateway: Gateway) -> Router {
    Router::new().fallback(handle).with_state(gateway)
}

/// Serve until Ctrl+C
pub async fn serve(gateway: Gateway, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(addr = %bind, "HTTP gateway listening");

    axum::serve(
        listener,
        router(gateway).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received. Exiting gracefully...");
    })
    .await
    .context("HTTP server error")
}

async fn handle(
    State(gateway): State<Gateway>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let env = request_env(&method, &headers, peer);
    let fields: Map<String, Value> = query
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    let input = JsonInputReader::new(fields).with_body(body.to_vec());

    let mut controller = gateway.controller(env, input, BufferedResponse::embedded());
    let outcome = controller.boot(Stage::Flush).await;
    let (_, sink) = controller.into_parts();
    respond(outcome, sink)
}

fn respond(outcome: BootOutcome, sink: BufferedResponse) -> Response {
    let status = match outcome {
        // Denied origins get a bare status: no body, no CORS headers
        BootOutcome::Halted(Halt::CorsDenied) => return StatusCode::FORBIDDEN.into_response(),
        BootOutcome::Halted(Halt::Preflight) => StatusCode::NO_CONTENT,
        _ => StatusCode::OK,
    };
    render(status, sink)
}

/// Transport facts for the controller, named after the CGI variables
fn request_env(method: &Method, headers: &HeaderMap, peer: SocketAddr) -> RequestEnv {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    RequestEnv {
        run_mode: RunMode::Http,
        https: None,
        forwarded_proto: header("x-forwarded-proto"),
        forwarded_for: header("x-forwarded-for"),
        remote_addr: Some(peer.ip().to_string()),
        host: header("host"),
        origin: header("origin"),
        method: Some(method.as_str().to_string()),
    }
}

fn render(status: StatusCode, sink: BufferedResponse) -> Response {
    let (headers, body) = sink.into_parts();

    let mut builder = Response::builder().status(status);
    for (name, value) in headers {
        builder = builder.header(name, value);
    }

    let body = if status == StatusCode::NO_CONTENT {
        Body::empty()
    } else {
        Body::from(body)
    };

    builder.body(body).unwrap_or_else(|e| {
        error!(error = %e, "Invalid response header");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}
