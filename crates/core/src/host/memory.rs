//! An in-process host holding users, channels and posts in memory.
//!
//! Backs dry runs from the CLI and every test that needs a host. Individual
//! operations can be scripted to fail, and every call is recorded.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{HostApi, HostError};
use crate::domain::{Channel, Post, PostList, User};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostOperation {
    GetUser,
    GetChannel,
    GetPostThread,
    SearchPostsInTeam,
    UpdatePost,
    SendEphemeralPost,
    ServerVersion,
}

#[derive(Default)]
struct HostState {
    users: HashMap<String, User>,
    channels: HashMap<String, Channel>,
    posts: Vec<Post>,
    ephemeral: Vec<(String, Post)>,
    failing: HashSet<HostOperation>,
    calls: Vec<HostOperation>,
}

pub struct InMemoryHost {
    server_version: String,
    state: Mutex<HostState>,
}

impl InMemoryHost {
    pub fn new(server_version: impl Into<String>) -> Self {
        Self { server_version: server_version.into(), state: Mutex::new(HostState::default()) }
    }

    pub fn with_user(self, id: &str, username: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state
                .users
                .insert(id.to_owned(), User { id: id.to_owned(), username: username.to_owned() });
        }
        self
    }

    pub fn with_channel(self, id: &str, team_id: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state
                .channels
                .insert(id.to_owned(), Channel { id: id.to_owned(), team_id: team_id.to_owned() });
        }
        self
    }

    pub fn with_post(self, post: Post) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.posts.push(post);
        }
        self
    }

    /// Makes every later call to `operation` fail with a transport error.
    pub fn failing(self, operation: HostOperation) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.failing.insert(operation);
        }
        self
    }

    pub fn post(&self, id: &str) -> Option<Post> {
        self.state.lock().ok()?.posts.iter().find(|post| post.id == id).cloned()
    }

    pub fn ephemeral_posts(&self) -> Vec<(String, Post)> {
        self.state.lock().map(|state| state.ephemeral.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<HostOperation> {
        self.state.lock().map(|state| state.calls.clone()).unwrap_or_default()
    }

    fn enter(&self, operation: HostOperation) -> Result<MutexGuard<'_, HostState>, HostError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| HostError::Transport("in-memory host state is poisoned".to_owned()))?;
        state.calls.push(operation);
        if state.failing.contains(&operation) {
            return Err(HostError::Transport(format!("scripted failure for {operation:?}")));
        }
        Ok(state)
    }
}

#[async_trait]
impl HostApi for InMemoryHost {
    async fn get_user(&self, user_id: &str) -> Result<User, HostError> {
        let state = self.enter(HostOperation::GetUser)?;
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| HostError::NotFound { resource: "user", id: user_id.to_owned() })
    }

    async fn get_channel(&self, channel_id: &str) -> Result<Channel, HostError> {
        let state = self.enter(HostOperation::GetChannel)?;
        state
            .channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| HostError::NotFound { resource: "channel", id: channel_id.to_owned() })
    }

    async fn get_post_thread(&self, root_id: &str) -> Result<PostList, HostError> {
        let state = self.enter(HostOperation::GetPostThread)?;
        if !state.posts.iter().any(|post| post.id == root_id) {
            return Err(HostError::NotFound { resource: "post", id: root_id.to_owned() });
        }

        let thread = state
            .posts
            .iter()
            .filter(|post| post.id == root_id || post.root_id == root_id)
            .cloned();
        Ok(PostList::from_posts(thread))
    }

    async fn search_posts_in_team(
        &self,
        team_id: &str,
        terms: &str,
    ) -> Result<Vec<Post>, HostError> {
        let state = self.enter(HostOperation::SearchPostsInTeam)?;
        let author = terms.strip_prefix("from:").map(str::trim);

        let mut matches: Vec<Post> = state
            .posts
            .iter()
            .filter(|post| {
                state.channels.get(&post.channel_id).is_some_and(|channel| channel.team_id == team_id)
            })
            .filter(|post| match author {
                Some(username) => state
                    .users
                    .get(&post.user_id)
                    .is_some_and(|user| user.username == username),
                None => post.message.contains(terms),
            })
            .cloned()
            .collect();
        matches.sort_by(|left, right| right.create_at.cmp(&left.create_at));
        Ok(matches)
    }

    async fn update_post(&self, post: Post) -> Result<Post, HostError> {
        let mut state = self.enter(HostOperation::UpdatePost)?;
        let stored = state
            .posts
            .iter_mut()
            .find(|stored| stored.id == post.id)
            .ok_or_else(|| HostError::NotFound { resource: "post", id: post.id.clone() })?;
        *stored = post.clone();
        Ok(post)
    }

    async fn send_ephemeral_post(&self, user_id: &str, post: Post) -> Result<(), HostError> {
        let mut state = self.enter(HostOperation::SendEphemeralPost)?;
        state.ephemeral.push((user_id.to_owned(), post));
        Ok(())
    }

    async fn server_version(&self) -> Result<String, HostError> {
        let _state = self.enter(HostOperation::ServerVersion)?;
        Ok(self.server_version.clone())
    }
}
