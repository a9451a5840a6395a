//! `resub try`: runs the intercept hook against an in-memory host seeded
//! with a single previous message, so operators can see what a command
//! would do without touching a server.

use std::sync::Arc;

use resub_core::{InMemoryHost, Outcome, Post, ReplaceMode, SubstitutionPolicy};
use resub_mattermost::{HookContext, HookResult, HookVerdict, Plugin};
use serde::Serialize;

use super::{serialize_payload, CommandResult};

const USER_ID: &str = "dry-run-user";
const CHANNEL_ID: &str = "dry-run-channel";
const TARGET_ID: &str = "dry-run-target";

#[derive(Debug, Serialize)]
struct TryReport {
    command: &'static str,
    status: &'static str,
    verdict: HookVerdict,
    outcome: Option<&'static str>,
    original: String,
    result: String,
    notice: Option<String>,
}

pub fn run(command: &str, message: &str, pattern: bool) -> CommandResult {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "try",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let policy = SubstitutionPolicy {
        mode: if pattern { ReplaceMode::Pattern } else { ReplaceMode::Literal },
        ..SubstitutionPolicy::default()
    };
    let host = Arc::new(seeded_host(message));
    let plugin = Plugin::new(host.clone(), policy, "0.0.0");
    let trigger = Post {
        user_id: USER_ID.to_string(),
        channel_id: CHANNEL_ID.to_string(),
        message: command.to_string(),
        create_at: 2,
        ..Post::default()
    };

    let result = runtime.block_on(plugin.message_will_be_posted(&trigger, &HookContext::generate()));

    let (status, outcome, exit_code) = match &result {
        HookResult::Ignored => ("ok", None, 0),
        HookResult::Handled(outcome @ Outcome::InvalidFormat { .. }) => {
            ("error", Some(outcome.label()), 2)
        }
        HookResult::Handled(outcome) => ("ok", Some(outcome.label()), 0),
    };

    let report = TryReport {
        command: "try",
        status,
        verdict: result.verdict(),
        outcome,
        original: message.to_string(),
        result: host.post(TARGET_ID).map(|post| post.message).unwrap_or_default(),
        notice: host.ephemeral_posts().into_iter().next().map(|(_, notice)| notice.message),
    };

    CommandResult { exit_code, output: serialize_payload(&report) }
}

fn seeded_host(message: &str) -> InMemoryHost {
    InMemoryHost::new("0.0.0")
        .with_user(USER_ID, "operator")
        .with_channel(CHANNEL_ID, "dry-run-team")
        .with_post(Post {
            id: TARGET_ID.to_string(),
            user_id: USER_ID.to_string(),
            channel_id: CHANNEL_ID.to_string(),
            message: message.to_string(),
            create_at: 1,
            ..Post::default()
        })
}
