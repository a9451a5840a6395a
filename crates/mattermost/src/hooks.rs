use std::sync::Arc;

use chrono::Utc;
use resub_core::{
    ensure_compatible, is_command, parse_command, ActivationError, HostApi, Outcome, Post,
    SubstitutionPolicy, SubstitutionResolver,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notices::outcome_notice;

pub const DISMISS_POST: &str = "plugin.message_will_be_posted.dismiss_post";

/// What the host should do with the intercepted post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum HookVerdict {
    Allow,
    Dismiss { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookResult {
    /// Not a substitution command; the post goes through untouched.
    Ignored,
    /// A command was recognised and processed to a terminal outcome.
    Handled(Outcome),
}

impl HookResult {
    pub fn verdict(&self) -> HookVerdict {
        match self {
            Self::Ignored => HookVerdict::Allow,
            Self::Handled(_) => HookVerdict::Dismiss { reason: DISMISS_POST.to_owned() },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookContext {
    pub correlation_id: String,
}

impl HookContext {
    pub fn generate() -> Self {
        Self { correlation_id: Uuid::new_v4().to_string() }
    }
}

impl Default for HookContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

pub struct Plugin {
    host: Arc<dyn HostApi>,
    policy: SubstitutionPolicy,
    min_server_version: String,
}

impl Plugin {
    pub fn new(
        host: Arc<dyn HostApi>,
        policy: SubstitutionPolicy,
        min_server_version: impl Into<String>,
    ) -> Self {
        Self { host, policy, min_server_version: min_server_version.into() }
    }

    pub fn policy(&self) -> SubstitutionPolicy {
        self.policy
    }

    pub fn min_server_version(&self) -> &str {
        &self.min_server_version
    }

    /// Fails when the host is older than the configured minimum version.
    pub async fn on_activate(&self) -> Result<String, ActivationError> {
        let server_version = ensure_compatible(self.host.as_ref(), &self.min_server_version).await?;
        info!(
            event_name = "plugin.activated",
            server_version = %server_version,
            min_server_version = %self.min_server_version,
            "plugin activated"
        );
        Ok(server_version)
    }

    /// Intercepts a post before the host stores it. Any post starting with
    /// `s/` is consumed: the verdict is always a dismissal once the prefix
    /// matched, whatever happened downstream.
    pub async fn message_will_be_posted(&self, post: &Post, ctx: &HookContext) -> HookResult {
        let trimmed = post.message.trim();
        if !is_command(trimmed) {
            return HookResult::Ignored;
        }

        debug!(
            event_name = "hook.message_will_be_posted.command",
            correlation_id = %ctx.correlation_id,
            user_id = %post.user_id,
            channel_id = %post.channel_id,
            root_id = %post.root_id,
            "substitution command received"
        );

        let outcome = match parse_command(trimmed) {
            Ok(substitution) => {
                SubstitutionResolver::new(self.host.as_ref(), self.policy)
                    .resolve(post, &substitution)
                    .await
            }
            Err(error) => Outcome::invalid_format(&error),
        };

        self.notify(post, &outcome, ctx).await;

        info!(
            event_name = "hook.message_will_be_posted.handled",
            correlation_id = %ctx.correlation_id,
            user_id = %post.user_id,
            outcome = outcome.label(),
            "substitution command handled"
        );

        HookResult::Handled(outcome)
    }

    async fn notify(&self, post: &Post, outcome: &Outcome, ctx: &HookContext) {
        let Some(notice) =
            outcome_notice(post, outcome, &self.policy, Utc::now().timestamp_millis())
        else {
            return;
        };

        if let Err(error) = self.host.send_ephemeral_post(&post.user_id, notice).await {
            warn!(
                event_name = "hook.notice.failed",
                correlation_id = %ctx.correlation_id,
                user_id = %post.user_id,
                outcome = outcome.label(),
                error = %error,
                "failed to send ephemeral notice"
            );
        }
    }
}
