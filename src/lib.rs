pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod schema;
pub mod session;

pub use config::ClientConfig;
pub use error::{AuthError, StatusClass};
pub use flow::{LoginFlow, LoginState};
pub use gateway::{ApiRequest, AuthRedirect, Gateway, LoginOutcome};
pub use notify::{Notifier, Severity};
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, SessionStore};

use std::sync::LazyLock;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

/// `idgate/<version> (<git sha>)`, sent with every API request.
pub static APP_USER_AGENT: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{}/{} ({GIT_COMMIT_HASH})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
});
