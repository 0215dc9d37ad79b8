pub mod account;
pub mod social;
pub mod status;
pub mod two_fa;

use crate::{
    cli::globals::GlobalArgs,
    flow::LoginFlow,
    gateway::{Gateway, ResetSession},
    notify::{Notifier, Severity, DEFAULT_DURATION},
    session::{FileStore, SessionStore},
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;

#[derive(Debug)]
pub enum Action {
    Register {
        username: String,
        email: String,
        avatar: Option<String>,
        password: SecretString,
        confirm_password: SecretString,
    },
    Login {
        identifier: String,
        password: SecretString,
    },
    Code {
        session_token: SecretString,
        code: String,
    },
    Logout,
    Me,
    UpdateProfile {
        username: Option<String>,
        email: Option<String>,
        avatar: Option<String>,
        clear_avatar: bool,
    },
    Password {
        old_password: SecretString,
        new_password: SecretString,
        confirm_password: SecretString,
    },
    DeleteAccount,
    TwoFaSetup,
    TwoFaConfirm {
        setup_token: SecretString,
        code: String,
    },
    TwoFaDisable {
        password: SecretString,
    },
    Users,
    Friends,
    AddFriend {
        username: String,
    },
    Validate,
    Health,
}

/// Everything an action needs: the hydrated session, the gateway and the
/// notification sink.
pub struct Context {
    pub session: Arc<SessionStore>,
    pub gateway: Arc<Gateway>,
    pub flow: LoginFlow,
    pub notifier: Notifier,
}

impl Context {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        let storage = Arc::new(FileStore::new(globals.config.state_dir.clone()));
        let session = Arc::new(SessionStore::open(storage));
        let redirect = Arc::new(ResetSession::new(Arc::clone(&session)));
        let gateway = Arc::new(Gateway::new(
            &globals.config,
            Arc::clone(&session),
            redirect,
        )?);

        Ok(Self {
            flow: LoginFlow::new(Arc::clone(&gateway)),
            session,
            gateway,
            notifier: Notifier::new(),
        })
    }

    /// Shows `message` through the notifier and echoes it on stderr.
    pub fn announce(&self, message: impl Into<String>, severity: Severity) {
        self.notifier.show(message, severity, DEFAULT_DURATION);
        if let Some(notification) = self.notifier.current() {
            eprintln!("[{}] {}", notification.severity, notification.message);
        }
    }
}

/// Handle the action
///
/// # Errors
/// Returns an error if the action fails; the notifier has already shown it.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let context = match Context::new(globals) {
        Ok(context) => context,
        Err(err) => {
            eprintln!("[{}] {err:#}", Severity::Error);
            return Err(err);
        }
    };

    let result = match action {
        Action::Register { .. }
        | Action::Login { .. }
        | Action::Code { .. }
        | Action::Logout
        | Action::Me
        | Action::UpdateProfile { .. }
        | Action::Password { .. }
        | Action::DeleteAccount => account::handle(action, &context).await,
        Action::TwoFaSetup | Action::TwoFaConfirm { .. } | Action::TwoFaDisable { .. } => {
            two_fa::handle(action, &context).await
        }
        Action::Users | Action::Friends | Action::AddFriend { .. } => {
            social::handle(action, &context).await
        }
        Action::Validate | Action::Health => status::handle(action, &context).await,
    };

    if let Err(err) = &result {
        context.announce(format!("{err:#}"), Severity::Error);
    }
    context.notifier.clear();
    result
}
