//! Locates the invoking user's last post, rewrites it and classifies the
//! result.
//!
//! ```text
//! command post ──► user ──► channel ──► scope ──► target ──► replace ──► update
//!                   │         │                    │          │           │
//!                   └─────────┴── LookupFailed ────┘          │           │
//!                                     NoMatchFound ◄──────────┘           │
//!                                     InvalidFormat ◄── (pattern mode)    │
//!                                     PersistFailed ◄─────────────────────┘
//! ```

use std::fmt;

use tracing::{debug, info, warn};

use crate::command::{CommandError, Substitution, USAGE};
use crate::domain::{Post, User};
use crate::host::{HostApi, HostError};
use crate::replace::{replace_whole_word, ReplaceMode};

pub const NO_POSTS_FOUND_NOTICE: &str = "`s/ Command: No previous post to be replaced.`";
pub const HOST_FAILURE_NOTICE: &str =
    "`s/ Command: Could not complete the replacement. Please try again later.`";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Thread { root_id: String },
    Team { team_id: String, username: String },
}

impl Scope {
    pub fn for_post(post: &Post, user: &User, team_id: &str) -> Self {
        if post.is_thread_reply() {
            Self::Thread { root_id: post.root_id.clone() }
        } else {
            Self::Team { team_id: team_id.to_owned(), username: user.username.clone() }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Thread { .. } => "thread",
            Self::Team { .. } => "team",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupStage {
    User,
    Channel,
    Thread,
    Search,
}

impl fmt::Display for LookupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Channel => "channel",
            Self::Thread => "thread",
            Self::Search => "search",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Replaced { post_id: String, old: String, new: String },
    NoMatchFound,
    InvalidFormat { reason: String },
    LookupFailed { stage: LookupStage, error: HostError },
    PersistFailed { post_id: String, error: HostError },
}

impl Outcome {
    pub fn invalid_format(error: &CommandError) -> Self {
        Self::InvalidFormat { reason: error.to_string() }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Replaced { .. } => "replaced",
            Self::NoMatchFound => "no_match_found",
            Self::InvalidFormat { .. } => "invalid_format",
            Self::LookupFailed { .. } => "lookup_failed",
            Self::PersistFailed { .. } => "persist_failed",
        }
    }

    /// Text of the ephemeral notice shown to the author, if any.
    pub fn notice_text(&self, policy: &SubstitutionPolicy) -> Option<String> {
        match self {
            Self::Replaced { old, new, .. } => Some(format!("s/ Replaced \"{old}\" for \"{new}\"")),
            Self::NoMatchFound => Some(NO_POSTS_FOUND_NOTICE.to_owned()),
            Self::InvalidFormat { .. } => Some(format!("Invalid command format. {USAGE}")),
            Self::LookupFailed { .. } | Self::PersistFailed { .. } => {
                policy.notify_on_host_failure.then(|| HOST_FAILURE_NOTICE.to_owned())
            }
        }
    }
}

/// Per-invocation settings, derived from configuration at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubstitutionPolicy {
    pub mode: ReplaceMode,
    pub notify_on_host_failure: bool,
}

impl Default for SubstitutionPolicy {
    fn default() -> Self {
        Self { mode: ReplaceMode::Literal, notify_on_host_failure: false }
    }
}

pub struct SubstitutionResolver<'a> {
    host: &'a dyn HostApi,
    policy: SubstitutionPolicy,
}

impl<'a> SubstitutionResolver<'a> {
    pub fn new(host: &'a dyn HostApi, policy: SubstitutionPolicy) -> Self {
        Self { host, policy }
    }

    /// Applies `substitution` to the last post of the author of `command`.
    pub async fn resolve(&self, command: &Post, substitution: &Substitution) -> Outcome {
        let user = match self.host.get_user(&command.user_id).await {
            Ok(user) => user,
            Err(error) => return lookup_failed(LookupStage::User, error),
        };
        let channel = match self.host.get_channel(&command.channel_id).await {
            Ok(channel) => channel,
            Err(error) => return lookup_failed(LookupStage::Channel, error),
        };

        let scope = Scope::for_post(command, &user, &channel.team_id);
        let target = match self.last_post(&user, &scope, &command.id).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                debug!(
                    event_name = "substitution.target.missing",
                    user_id = %user.id,
                    scope = scope.label(),
                    "no previous post in scope"
                );
                return Outcome::NoMatchFound;
            }
            Err((stage, error)) => return lookup_failed(stage, error),
        };

        debug!(
            event_name = "substitution.target.resolved",
            user_id = %user.id,
            post_id = %target.id,
            scope = scope.label(),
            "resolved substitution target"
        );

        self.rewrite(target, substitution).await
    }

    /// The most recent post by `user` within `scope`, skipping `exclude_id`.
    pub async fn last_post(
        &self,
        user: &User,
        scope: &Scope,
        exclude_id: &str,
    ) -> Result<Option<Post>, (LookupStage, HostError)> {
        match scope {
            Scope::Thread { root_id } => {
                let thread = self
                    .host
                    .get_post_thread(root_id)
                    .await
                    .map_err(|error| (LookupStage::Thread, error))?;

                Ok(thread
                    .newest_first()
                    .into_iter()
                    .filter(|post| exclude_id.is_empty() || post.id != exclude_id)
                    .find(|post| post.user_id == user.id)
                    .cloned())
            }
            Scope::Team { team_id, username } => {
                let terms = format!("from:{username}");
                let posts = self
                    .host
                    .search_posts_in_team(team_id, &terms)
                    .await
                    .map_err(|error| (LookupStage::Search, error))?;

                Ok(posts
                    .into_iter()
                    .find(|post| exclude_id.is_empty() || post.id != exclude_id))
            }
        }
    }

    async fn rewrite(&self, mut target: Post, substitution: &Substitution) -> Outcome {
        let replaced = match replace_whole_word(
            &target.message,
            &substitution.old,
            &substitution.new,
            self.policy.mode,
        ) {
            Ok(replaced) => replaced,
            Err(error) => return Outcome::InvalidFormat { reason: error.to_string() },
        };

        if replaced == target.message {
            debug!(
                event_name = "substitution.replace.unchanged",
                post_id = %target.id,
                "substitution matched no whole word"
            );
        }

        target.message = replaced;
        let post_id = target.id.clone();
        match self.host.update_post(target).await {
            Ok(_) => {
                info!(
                    event_name = "substitution.replace.applied",
                    post_id = %post_id,
                    "updated target post"
                );
                Outcome::Replaced {
                    post_id,
                    old: substitution.old.clone(),
                    new: substitution.new.clone(),
                }
            }
            Err(error) => {
                warn!(
                    event_name = "substitution.replace.persist_failed",
                    post_id = %post_id,
                    error = %error,
                    "failed to update target post"
                );
                Outcome::PersistFailed { post_id, error }
            }
        }
    }
}

fn lookup_failed(stage: LookupStage, error: HostError) -> Outcome {
    warn!(
        event_name = "substitution.lookup_failed",
        stage = %stage,
        error = %error,
        "host lookup failed"
    );
    Outcome::LookupFailed { stage, error }
}
