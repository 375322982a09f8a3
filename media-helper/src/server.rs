//! HTTP server implementation
//!
//! A single catch-all warp filter handles every request so that the JSON
//! envelope and CORS headers are identical for successes, errors and unknown
//! routes. Each connection is served on its own tokio task.

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures_util::{pin_mut, Stream, TryStreamExt};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;
use warp::http::{Method, StatusCode};
use warp::hyper::body::Buf;
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

use crate::config::HelperConfig;
use crate::download;
use crate::error::HelperError;
use crate::merge;
use crate::process::CommandRunner;
use crate::protocol::{encode, encode_result, Operation, Request, Response};

/// Server configuration
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// State shared by all connections; read-only after startup
pub struct AppState {
    pub config: HelperConfig,
    pub runner: Arc<dyn CommandRunner>,
}

impl AppState {
    pub fn new(config: HelperConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }
}

/// Run the HTTP server until Ctrl-C
pub async fn run(server: ServerConfig, state: Arc<AppState>) -> Result<()> {
    let addr = tokio::net::lookup_host((server.host.as_str(), server.port))
        .await?
        .next()
        .ok_or_else(|| anyhow!("Cannot resolve {}:{}", server.host, server.port))?;

    let (bound, serving) = warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested, stopping server...");
        }
    })?;

    info!(
        "Media helper listening on http://{} (endpoints: {})",
        bound,
        Operation::ALL.map(|op| op.path()).join(", ")
    );

    serving.await;
    Ok(())
}

/// The complete request pipeline as a warp filter
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static {
    let state = warp::any().map(move || state.clone());
    let query = warp::query::raw().or(warp::any().map(String::new)).unify();

    warp::method()
        .and(warp::path::full())
        .and(query)
        .and(warp::body::stream())
        .and(state)
        .then(handle_request)
        .recover(handle_rejection)
}

async fn handle_request<S, B>(
    method: Method,
    path: FullPath,
    query: String,
    body: S,
    state: Arc<AppState>,
) -> warp::reply::Response
where
    S: Stream<Item = Result<B, warp::Error>>,
    B: Buf,
{
    // Routes match the full request target, so any query string is a miss
    let target = if query.is_empty() {
        path.as_str().to_string()
    } else {
        format!("{}?{}", path.as_str(), query)
    };
    let request_id = Uuid::new_v4();
    let span = info_span!("request", id = %request_id, path = target.as_str());

    async move {
        info!("Incoming request: {} {}", method, target);
        encode_result(route(&method, &target, body, &state).await)
    }
    .instrument(span)
    .await
}

async fn route<S, B>(
    method: &Method,
    path: &str,
    body: S,
    state: &AppState,
) -> Result<Response, HelperError>
where
    S: Stream<Item = Result<B, warp::Error>>,
    B: Buf,
{
    if method == Method::OPTIONS {
        return Ok(Response::empty());
    }

    let op = if method == Method::POST { Operation::from_path(path) } else { None };
    let Some(op) = op else {
        warn!("Rejected request: unsupported {} {}", method, path);
        return Err(HelperError::RouteNotFound);
    };

    let body = read_body(body)
        .await
        .map_err(|e| HelperError::InvalidRequest(format!("Invalid JSON: {}", e)))?;

    let request = Request::parse(op, &body).map_err(|e| {
        warn!("Request rejected on {}: {}", path, e);
        e
    })?;

    dispatch(request, state).await
}

/// Hand a validated request to its operation
pub async fn dispatch(request: Request, state: &AppState) -> Result<Response, HelperError> {
    let config = &state.config;
    let runner = state.runner.as_ref();

    match &request {
        Request::Merge(req) => merge::handle_merge(req, config, runner).await,
        Request::DownloadManifest(req) => download::handle_manifest(req, config, runner).await,
        Request::DownloadPage(req) => download::handle_page(req, config, runner).await,
        Request::DownloadYoutube(req) => download::handle_youtube(req, config, runner).await,
    }
}

/// Collect the whole request body
async fn read_body<S, B>(body: S) -> Result<Vec<u8>, warp::Error>
where
    S: Stream<Item = Result<B, warp::Error>>,
    B: Buf,
{
    pin_mut!(body);
    let mut bytes = Vec::new();

    while let Some(mut chunk) = body.try_next().await? {
        while chunk.has_remaining() {
            let part = chunk.chunk();
            let len = part.len();
            bytes.extend_from_slice(part);
            chunk.advance(len);
        }
    }

    Ok(bytes)
}

async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    if err.is_not_found() {
        return Ok(encode(StatusCode::NOT_FOUND, &Response::error("Not found")));
    }

    warn!("Unhandled rejection: {:?}", err);
    Ok(encode(
        StatusCode::INTERNAL_SERVER_ERROR,
        &Response::error("Internal error"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Unexpected;

    impl warp::reject::Reject for Unexpected {}

    #[tokio::test]
    async fn test_unexpected_rejection_hides_details() {
        let reply = handle_rejection(warp::reject::custom(Unexpected)).await.unwrap();
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = warp::hyper::body::to_bytes(reply.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "ok": false, "error": "Internal error" }));
    }

    #[tokio::test]
    async fn test_not_found_rejection() {
        let reply = handle_rejection(warp::reject::not_found()).await.unwrap();
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
    }
}
