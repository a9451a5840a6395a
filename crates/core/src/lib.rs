pub mod command;
pub mod compat;
pub mod config;
pub mod domain;
pub mod errors;
pub mod host;
pub mod replace;
pub mod resolver;

pub use command::{is_command, parse_command, CommandError, Substitution};
pub use compat::{check_server_version, ensure_compatible, ActivationError};
pub use domain::{Channel, Post, PostList, User};
pub use errors::{ApplicationError, InterfaceError};
pub use host::{HostApi, HostError, HostOperation, InMemoryHost};
pub use replace::{replace_whole_word, ReplaceError, ReplaceMode};
pub use resolver::{LookupStage, Outcome, Scope, SubstitutionPolicy, SubstitutionResolver};
