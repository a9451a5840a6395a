//! The narrow slice of the chat host the plugin depends on.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Channel, Post, PostList, User};

pub mod memory;

pub use memory::{HostOperation, InMemoryHost};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("{resource} `{id}` was not found")]
    NotFound { resource: &'static str, id: String },
    #[error("host rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("host request failed: {0}")]
    Transport(String),
    #[error("host response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait HostApi: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<User, HostError>;

    async fn get_channel(&self, channel_id: &str) -> Result<Channel, HostError>;

    /// Every post in the thread rooted at `root_id`, in no guaranteed order.
    async fn get_post_thread(&self, root_id: &str) -> Result<PostList, HostError>;

    /// Posts matching `terms` within a team, in the host's ranking order.
    async fn search_posts_in_team(
        &self,
        team_id: &str,
        terms: &str,
    ) -> Result<Vec<Post>, HostError>;

    async fn update_post(&self, post: Post) -> Result<Post, HostError>;

    async fn send_ephemeral_post(&self, user_id: &str, post: Post) -> Result<(), HostError>;

    async fn server_version(&self) -> Result<String, HostError>;
}
