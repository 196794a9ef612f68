//! Request handlers.

use std::net::SocketAddr;

use axum::extract::rejection::FormRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use corelib::{HexToken, Server};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::ApiError;
use crate::metrics;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct AdmitForm {
    #[serde(default)]
    addr: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RingEntry {
    key: HexToken,
    server: Server,
}

/// Body of `GET /ring`.
#[derive(Debug, Serialize)]
pub(crate) struct RingSnapshot {
    vnodes_per_server: usize,
    entries: Vec<RingEntry>,
}

pub(crate) async fn ping() -> &'static str {
    "pong"
}

pub(crate) async fn list_servers(State(state): State<AppState>) -> Json<Vec<Server>> {
    Json(state.balancer.list())
}

/// `POST /servers`: probe and admit the candidate in form field `addr`.
///
/// A body that is not a form counts as a missing address.
pub(crate) async fn admit_server(
    State(state): State<AppState>,
    form: Result<Form<AdmitForm>, FormRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let candidate = match form {
        Ok(Form(form)) => form.addr,
        Err(rejection) => {
            debug!(%rejection, "unreadable admission form");
            String::new()
        }
    };

    let result = state.balancer.admit(&candidate).await;
    metrics::record_admission(&result);
    let server = result?;
    Ok(Json(json!({ "status": "ok", "server": server.as_str() })))
}

pub(crate) async fn ring_snapshot(State(state): State<AppState>) -> Json<RingSnapshot> {
    let entries = state
        .balancer
        .ring_entries()
        .into_iter()
        .map(|(key, server)| RingEntry { key, server })
        .collect();
    Json(RingSnapshot {
        vnodes_per_server: state.balancer.vnodes_per_server(),
        entries,
    })
}

pub(crate) async fn render_metrics(handle: PrometheusHandle) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response()
}

/// Redirect the request to the server owning `client_ip + path`.
///
/// The query string is kept on the redirect but is not part of the key.
pub(crate) async fn route_request(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
) -> Result<Redirect, ApiError> {
    let key = format!("{}{}", peer.ip(), uri.path());

    let result = state.balancer.route(&key);
    metrics::record_route(&result);
    let server = result?;

    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let location = server.join(path_and_query);
    debug!(%key, %location, "redirecting");
    Ok(Redirect::temporary(&location))
}
