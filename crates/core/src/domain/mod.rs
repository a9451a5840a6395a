pub mod channel;
pub mod post;
pub mod user;

pub use channel::Channel;
pub use post::{Post, PostList};
pub use user::User;
