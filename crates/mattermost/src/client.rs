//! REST v4 implementation of [`HostApi`] for a running Mattermost server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use resub_core::config::HostConfig;
use resub_core::{Channel, HostApi, HostError, Post, PostList, User};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const VERSION_HEADER: &str = "X-Version-Id";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid host url `{0}`: expected http:// or https://")]
    InvalidUrl(String),
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct MattermostClient {
    http: Client,
    base_url: String,
    token: SecretString,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    terms: &'a str,
    is_or_search: bool,
}

#[derive(Serialize)]
struct EphemeralRequest<'a> {
    user_id: &'a str,
    post: &'a Post,
}

impl MattermostClient {
    pub fn new(
        base_url: impl Into<String>,
        token: SecretString,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl(base_url));
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url, token })
    }

    pub fn from_config(config: &HostConfig) -> Result<Self, ClientError> {
        Self::new(
            config.url.clone(),
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        resource: &'static str,
        id: &str,
    ) -> Result<Response, HostError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|error| HostError::Transport(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            event_name = "host.request.rejected",
            resource,
            id,
            status = status.as_u16(),
            "host rejected request"
        );
        Err(status_error(status, resource, id, &body))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &'static str,
        id: &str,
    ) -> Result<T, HostError> {
        let response = self.send(request, resource, id).await?;
        response.json::<T>().await.map_err(|error| HostError::Decode(error.to_string()))
    }
}

#[async_trait]
impl HostApi for MattermostClient {
    async fn get_user(&self, user_id: &str) -> Result<User, HostError> {
        let request = self.http.get(self.endpoint(&format!("users/{user_id}")));
        self.fetch(request, "user", user_id).await
    }

    async fn get_channel(&self, channel_id: &str) -> Result<Channel, HostError> {
        let request = self.http.get(self.endpoint(&format!("channels/{channel_id}")));
        self.fetch(request, "channel", channel_id).await
    }

    async fn get_post_thread(&self, root_id: &str) -> Result<PostList, HostError> {
        let request = self.http.get(self.endpoint(&format!("posts/{root_id}/thread")));
        self.fetch(request, "post", root_id).await
    }

    async fn search_posts_in_team(
        &self,
        team_id: &str,
        terms: &str,
    ) -> Result<Vec<Post>, HostError> {
        let request = self
            .http
            .post(self.endpoint(&format!("teams/{team_id}/posts/search")))
            .json(&SearchRequest { terms, is_or_search: false });
        let list: PostList = self.fetch(request, "team", team_id).await?;
        debug!(
            event_name = "host.search.completed",
            team_id,
            results = list.len(),
            "team search completed"
        );
        Ok(ranked(list))
    }

    async fn update_post(&self, post: Post) -> Result<Post, HostError> {
        let id = post.id.clone();
        let request = self.http.put(self.endpoint(&format!("posts/{id}"))).json(&post);
        self.fetch(request, "post", &id).await
    }

    async fn send_ephemeral_post(&self, user_id: &str, post: Post) -> Result<(), HostError> {
        let request = self
            .http
            .post(self.endpoint("posts/ephemeral"))
            .json(&EphemeralRequest { user_id, post: &post });
        self.send(request, "user", user_id).await.map(|_| ())
    }

    async fn server_version(&self) -> Result<String, HostError> {
        let request = self.http.get(self.endpoint("system/ping"));
        let response = self.send(request, "system", "ping").await?;

        let header = response
            .headers()
            .get(VERSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(version_from_header);
        if let Some(version) = header {
            return Ok(version);
        }

        let body: Value =
            response.json().await.map_err(|error| HostError::Decode(error.to_string()))?;
        body.get("version")
            .and_then(Value::as_str)
            .filter(|version| !version.trim().is_empty())
            .map(|version| version.trim().to_owned())
            .ok_or_else(|| HostError::Decode("server did not report a version".to_owned()))
    }
}

/// `X-Version-Id` carries the release followed by build metadata
/// (`5.10.0.5.10.0.abc123.false`); only the first three segments are the
/// server version.
pub fn version_from_header(raw: &str) -> Option<String> {
    let segments: Vec<&str> = raw.trim().split('.').take(3).collect();
    if segments.len() < 3 || segments.iter().any(|segment| segment.is_empty()) {
        return None;
    }
    Some(segments.join("."))
}

/// Search results in host ranking order. Entries in `order` without a
/// matching post are skipped; an empty `order` falls back to chronology.
pub fn ranked(mut list: PostList) -> Vec<Post> {
    if list.order.is_empty() {
        return list.newest_first().into_iter().cloned().collect();
    }

    let order = std::mem::take(&mut list.order);
    order.iter().filter_map(|id| list.posts.remove(id)).collect()
}

fn status_error(status: StatusCode, resource: &'static str, id: &str, body: &str) -> HostError {
    if status == StatusCode::NOT_FOUND {
        return HostError::NotFound { resource, id: id.to_owned() };
    }

    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| payload.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned());
    HostError::Rejected { status: status.as_u16(), message }
}
