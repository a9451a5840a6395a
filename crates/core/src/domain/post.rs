use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub root_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub create_at: i64,
    /// Fields the plugin does not interpret (props, file ids, edit timestamps).
    /// Carried through so an update does not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    pub fn is_thread_reply(&self) -> bool {
        !self.root_id.trim().is_empty()
    }
}

/// A set of posts as returned by the host. `order` is not guaranteed to be
/// populated or sorted, so callers that need chronology go through
/// [`PostList::newest_first`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PostList {
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub posts: HashMap<String, Post>,
}

impl PostList {
    pub fn from_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let posts: HashMap<String, Post> =
            posts.into_iter().map(|post| (post.id.clone(), post)).collect();
        Self { order: Vec::new(), posts }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Every post, sorted by creation time descending. Equal timestamps fall
    /// back to id order so the result does not depend on map iteration.
    pub fn newest_first(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.values().collect();
        posts.sort_by(|left, right| {
            right.create_at.cmp(&left.create_at).then_with(|| right.id.cmp(&left.id))
        });
        posts
    }
}
