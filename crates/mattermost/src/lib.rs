//! Mattermost integration for resub
//!
//! This crate connects the substitution engine to a Mattermost server:
//! - **Client** (`client`) - REST v4 implementation of `HostApi`
//! - **Hooks** (`hooks`) - `on_activate` and the `MessageWillBePosted` intercept
//! - **Notices** (`notices`) - ephemeral feedback posts for each outcome
//!
//! # Architecture
//!
//! ```text
//! Host hook → Plugin::message_will_be_posted → SubstitutionResolver → HostApi
//!                    ↓
//!             HookVerdict + ephemeral notice
//! ```
//!
//! # Key Types
//!
//! - `Plugin` - owns the host handle and the substitution policy
//! - `HookVerdict` - allow or dismiss, as returned to the host
//! - `MattermostClient` - bearer-authenticated REST client

pub mod client;
pub mod hooks;
pub mod notices;

pub use client::{ClientError, MattermostClient};
pub use hooks::{HookContext, HookResult, HookVerdict, Plugin, DISMISS_POST};
pub use notices::{outcome_notice, NoticeBuilder};
