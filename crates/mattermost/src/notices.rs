use resub_core::{Outcome, Post, SubstitutionPolicy};
use serde_json::{Map, Value};

/// Prop set on every notice so clients and tests can tell which terminal
/// state produced it.
pub const OUTCOME_PROP: &str = "resub_outcome";

pub struct NoticeBuilder {
    channel_id: String,
    root_id: String,
    message: String,
    props: Map<String, Value>,
}

impl NoticeBuilder {
    /// A notice shown in the same channel and thread as `source`.
    pub fn reply_to(source: &Post) -> Self {
        Self {
            channel_id: source.channel_id.clone(),
            root_id: source.root_id.clone(),
            message: String::new(),
            props: Map::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn build(self, create_at: i64) -> Post {
        let mut extra = Map::new();
        if !self.props.is_empty() {
            extra.insert("props".to_owned(), Value::Object(self.props));
        }

        Post {
            channel_id: self.channel_id,
            root_id: self.root_id,
            message: self.message,
            create_at,
            extra,
            ..Post::default()
        }
    }
}

/// The ephemeral notice for `outcome`, or `None` when the policy keeps it
/// silent.
pub fn outcome_notice(
    source: &Post,
    outcome: &Outcome,
    policy: &SubstitutionPolicy,
    create_at: i64,
) -> Option<Post> {
    let text = outcome.notice_text(policy)?;
    Some(
        NoticeBuilder::reply_to(source)
            .message(text)
            .prop(OUTCOME_PROP, outcome.label())
            .build(create_at),
    )
}
