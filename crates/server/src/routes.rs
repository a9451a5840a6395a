//! HTTP routes served to the Mattermost host.
//!
//! Endpoints:
//! - `POST /hooks/message_will_be_posted` - intercept hook, bearer-guarded
//! - `GET  /plugins/resub/status`         - plugin status for logged-in users
//! - `GET  /health`                       - liveness and host reachability

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use resub_core::{ApplicationError, HostApi, InterfaceError, Post, ReplaceMode};
use resub_mattermost::{HookContext, HookVerdict, Plugin};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bootstrap::Application;
use crate::health;

pub const USER_ID_HEADER: &str = "Mattermost-User-Id";
pub const PLUGIN_ROUTE_PREFIX: &str = "/plugins/resub";

#[derive(Clone)]
pub struct RouteState {
    plugin: Arc<Plugin>,
    plugin_id: String,
    hook_secret: SecretString,
    server_version: String,
}

impl RouteState {
    pub fn new(
        plugin: Arc<Plugin>,
        plugin_id: impl Into<String>,
        hook_secret: SecretString,
        server_version: impl Into<String>,
    ) -> Self {
        Self {
            plugin,
            plugin_id: plugin_id.into(),
            hook_secret,
            server_version: server_version.into(),
        }
    }

    pub fn from_application(app: &Application) -> Self {
        Self::new(
            app.plugin.clone(),
            app.config.plugin.id.clone(),
            app.config.plugin.hook_secret.clone(),
            app.server_version.clone(),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginStatus {
    pub plugin_id: String,
    pub version: String,
    pub min_server_version: String,
    pub server_version: String,
    pub literal_match: bool,
}

type RouteError = (StatusCode, Json<ErrorBody>);

pub fn router(state: RouteState, host: Arc<dyn HostApi>) -> Router {
    let plugin_routes = Router::new()
        .route("/status", get(plugin_status))
        .fallback(plugin_not_found)
        .layer(middleware::from_fn(require_user));

    Router::new()
        .route("/hooks/message_will_be_posted", post(message_will_be_posted))
        .nest(PLUGIN_ROUTE_PREFIX, plugin_routes)
        .with_state(state)
        .merge(health::router(host))
}

/// Rejects plugin requests that the host did not attribute to a user.
async fn require_user(request: Request, next: Next) -> Response {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if user_id.is_empty() {
        return (StatusCode::FORBIDDEN, "please log in").into_response();
    }
    next.run(request).await
}

async fn plugin_status(State(state): State<RouteState>) -> Json<PluginStatus> {
    Json(PluginStatus {
        plugin_id: state.plugin_id.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        min_server_version: state.plugin.min_server_version().to_string(),
        server_version: state.server_version.clone(),
        literal_match: state.plugin.policy().mode == ReplaceMode::Literal,
    })
}

async fn plugin_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 page not found")
}

async fn message_will_be_posted(
    State(state): State<RouteState>,
    headers: HeaderMap,
    payload: Result<Json<Post>, JsonRejection>,
) -> Result<Json<HookVerdict>, RouteError> {
    let ctx = HookContext::generate();

    if !bearer_matches(&headers, &state.hook_secret) {
        warn!(
            event_name = "hook.request.unauthorized",
            correlation_id = %ctx.correlation_id,
            "hook request rejected"
        );
        return Err(interface_error(
            ApplicationError::Unauthorized.into_interface(ctx.correlation_id),
        ));
    }

    let Json(post) = payload.map_err(|rejection| {
        interface_error(
            ApplicationError::MalformedPayload(rejection.body_text())
                .into_interface(ctx.correlation_id.clone()),
        )
    })?;

    let result = state.plugin.message_will_be_posted(&post, &ctx).await;
    let verdict = result.verdict();
    info!(
        event_name = "hook.request.completed",
        correlation_id = %ctx.correlation_id,
        dismissed = matches!(verdict, HookVerdict::Dismiss { .. }),
        "hook request completed"
    );
    Ok(Json(verdict))
}

fn bearer_matches(headers: &HeaderMap, secret: &SecretString) -> bool {
    let expected = secret.expose_secret();
    if expected.is_empty() {
        return false;
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token.trim() == expected)
}

pub fn interface_error(error: InterfaceError) -> RouteError {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
    };
    let body = ErrorBody {
        error: error.to_string(),
        message: error.user_message().to_string(),
        correlation_id: error.correlation_id().to_string(),
    };
    (status, Json(body))
}
