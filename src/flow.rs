//! Three-state login protocol on top of the gateway.
//!
//! `Anonymous -> CredentialsAccepted -> Authenticated`. The pending state is
//! never stored: its session token lives only in the [`LoginState`] handed
//! back to the caller, who threads it into [`LoginFlow::submit_code`].

use crate::{
    error::AuthError,
    gateway::{Gateway, LoginOutcome},
    models::{
        LoginByIdentifier, TwoFaChallenge, TwoFaConfirm, TwoFaDisable, TwoFaSetup,
        UpdatePassword, UserProfile, UserWithToken,
    },
    session::SessionStore,
};
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, sync::Arc};
use tracing::{info, instrument, warn};

pub enum LoginState {
    Anonymous,
    CredentialsAccepted { session_token: SecretString },
    Authenticated(UserProfile),
}

impl fmt::Debug for LoginState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginState::Anonymous => formatter.write_str("Anonymous"),
            LoginState::CredentialsAccepted { .. } => formatter
                .debug_struct("CredentialsAccepted")
                .field("session_token", &"[REDACTED]")
                .finish(),
            LoginState::Authenticated(user) => {
                formatter.debug_tuple("Authenticated").field(user).finish()
            }
        }
    }
}

impl LoginState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginState::Authenticated(_))
    }
}

pub struct LoginFlow {
    gateway: Arc<Gateway>,
}

impl LoginFlow {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    /// `Anonymous` or `Authenticated`, as held by the session store.
    #[must_use]
    pub fn state(&self) -> LoginState {
        self.session()
            .user()
            .map_or(LoginState::Anonymous, LoginState::Authenticated)
    }

    fn establish(&self, user: UserWithToken) -> LoginState {
        let profile = user.profile.clone();
        self.session().login(user);
        LoginState::Authenticated(profile)
    }

    /// Submits credentials without the held token. A full token replaces the
    /// held session; a pending second factor clears it. A refused attempt
    /// leaves it untouched.
    ///
    /// # Errors
    /// Returns `AuthError` when the credentials are malformed or refused.
    #[instrument(name = "idgate.flow.login", skip_all)]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginState, AuthError> {
        let credentials = LoginByIdentifier {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        match self.gateway.login(&credentials).await? {
            LoginOutcome::Authenticated(user) => {
                info!(user_id = user.profile.id, "Logged in");
                Ok(self.establish(user))
            }
            LoginOutcome::SecondFactorRequired(pending) => {
                if self.session().is_active() {
                    info!("Dropping the held session for a pending login");
                    self.session().logout();
                }
                Ok(LoginState::CredentialsAccepted {
                    session_token: SecretString::from(pending.session_token),
                })
            }
        }
    }

    /// Completes a pending login. On error the caller stays in
    /// `CredentialsAccepted` and may retry with the same session token.
    ///
    /// # Errors
    /// Returns `AuthError` when the code is malformed or rejected.
    #[instrument(name = "idgate.flow.submit_code", skip_all)]
    pub async fn submit_code(
        &self,
        session_token: &SecretString,
        code: &str,
    ) -> Result<LoginState, AuthError> {
        let challenge = TwoFaChallenge {
            two_fa_code: code.to_string(),
            session_token: session_token.expose_secret().to_owned(),
        };
        let user = self.gateway.two_fa_challenge(&challenge).await?;
        info!(user_id = user.profile.id, "Logged in with second factor");
        Ok(self.establish(user))
    }

    /// Ends the session on the server, then locally whatever the server said.
    ///
    /// # Errors
    /// Returns the server-side failure, after the local session is cleared.
    #[instrument(name = "idgate.flow.logout", skip_all)]
    pub async fn logout(&self) -> Result<LoginState, AuthError> {
        let remote = self.gateway.logout().await;
        self.session().logout();
        if let Err(err) = &remote {
            warn!("Server logout failed: {}", err.message());
        }
        remote.map(|()| LoginState::Anonymous)
    }

    /// Starts a two-factor enrollment for the current user.
    ///
    /// # Errors
    /// Returns `AuthError` on any gateway failure.
    pub async fn request_setup(&self) -> Result<TwoFaSetup, AuthError> {
        self.gateway.two_fa_setup().await
    }

    /// Confirms an enrollment and refreshes the session with `twoFa = true`.
    ///
    /// # Errors
    /// Returns `AuthError` when the code is malformed or rejected.
    #[instrument(name = "idgate.flow.confirm_setup", skip_all)]
    pub async fn confirm_setup(
        &self,
        setup_token: &str,
        code: &str,
    ) -> Result<LoginState, AuthError> {
        let confirm = TwoFaConfirm {
            two_fa_code: code.to_string(),
            setup_token: setup_token.to_string(),
        };
        let user = self.gateway.two_fa_confirm(&confirm).await?;
        Ok(self.establish(user))
    }

    /// # Errors
    /// Returns `AuthError` when the password is malformed or rejected.
    #[instrument(name = "idgate.flow.disable_two_factor", skip_all)]
    pub async fn disable_two_factor(&self, password: &str) -> Result<LoginState, AuthError> {
        let disable = TwoFaDisable {
            password: password.to_string(),
        };
        let user = self.gateway.two_fa_disable(&disable).await?;
        Ok(self.establish(user))
    }

    /// # Errors
    /// Returns `AuthError` when the passwords are malformed or refused.
    #[instrument(name = "idgate.flow.change_password", skip_all)]
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<LoginState, AuthError> {
        let passwords = UpdatePassword {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        let user = self.gateway.update_password(&passwords).await?;
        Ok(self.establish(user))
    }

    /// Deletes the account, then drops the local session.
    ///
    /// # Errors
    /// Returns `AuthError` if the server refuses; the session is kept then.
    #[instrument(name = "idgate.flow.delete_account", skip_all)]
    pub async fn delete_account(&self) -> Result<LoginState, AuthError> {
        self.gateway.delete_account().await?;
        self.session().logout();
        Ok(LoginState::Anonymous)
    }
}
