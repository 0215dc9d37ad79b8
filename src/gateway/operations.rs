//! Named operations of the users API.

use super::{ApiRequest, Gateway};
use crate::{
    error::AuthError,
    models::{
        AddFriend, CreateUser, Friend, LoginByIdentifier, SessionCheck, TwoFaChallenge,
        TwoFaConfirm, TwoFaDisable, TwoFaPending, TwoFaSetup, UpdatePassword, UpdateUser,
        UserProfile, UserSummary, UserWithToken,
    },
    schema::registry,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

/// Result of submitting credentials.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(UserWithToken),
    /// Credentials were accepted; a two-factor code must follow.
    SecondFactorRequired(TwoFaPending),
}

fn decode<T: DeserializeOwned>(value: Option<Value>) -> Result<T, AuthError> {
    let value = value.ok_or_else(|| AuthError::server("Invalid response format: empty body"))?;
    serde_json::from_value(value)
        .map_err(|err| AuthError::server(format!("Invalid response format: {err}")))
}

impl Gateway {
    /// `POST /` creates an account. It does not log in.
    ///
    /// # Errors
    /// Returns `AuthError` if the payload is invalid or the server refuses it.
    #[instrument(name = "idgate.gateway.register", skip_all)]
    pub async fn register(&self, user: &CreateUser) -> Result<UserProfile, AuthError> {
        let request = ApiRequest::post("/")
            .json(user)?
            .request_schema(registry::create_user())
            .response_schema(registry::user_without_token());
        decode(self.call(request).await?)
    }

    /// `POST /loginByIdentifier`, sent without any held token. A 428 answer
    /// carrying the pending-login body becomes
    /// [`LoginOutcome::SecondFactorRequired`]; a 428 without it, JSON or not,
    /// is a `TwoFactorRequired` error.
    ///
    /// # Errors
    /// Returns `AuthError` for invalid credentials or any gateway failure.
    #[instrument(name = "idgate.gateway.login", skip_all)]
    pub async fn login(&self, credentials: &LoginByIdentifier) -> Result<LoginOutcome, AuthError> {
        let request = ApiRequest::post("/loginByIdentifier")
            .json(credentials)?
            .request_schema(registry::login_by_identifier())
            .response_schema(registry::user_with_token())
            .suppress_auth_redirect()
            .anonymous();

        let reply = self.exchange(&request).await?;
        if reply.status == StatusCode::PRECONDITION_REQUIRED {
            match serde_json::from_str::<Value>(&reply.body)
                .ok()
                .map(|value| registry::two_fa_pending().parse::<TwoFaPending>(&value))
            {
                Some(Ok(pending)) => {
                    debug!("Second factor required");
                    return Ok(LoginOutcome::SecondFactorRequired(pending));
                }
                Some(Err(issues)) => debug!("428 without a pending-login body: {issues}"),
                None => debug!("428 with a non-JSON body"),
            }
        }

        decode(self.settle(&request, &reply)?).map(LoginOutcome::Authenticated)
    }

    /// `DELETE /logout` ends the session on the server.
    ///
    /// # Errors
    /// Returns `AuthError` on any gateway failure.
    #[instrument(name = "idgate.gateway.logout", skip_all)]
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.call(ApiRequest::delete("/logout")).await.map(drop)
    }

    /// `GET /me`
    ///
    /// # Errors
    /// Returns `AuthError` on any gateway failure.
    #[instrument(name = "idgate.gateway.profile", skip_all)]
    pub async fn profile(&self) -> Result<UserProfile, AuthError> {
        let request = ApiRequest::get("/me").response_schema(registry::user_without_token());
        decode(self.call(request).await?)
    }

    /// `PUT /me`
    ///
    /// # Errors
    /// Returns `AuthError` if the payload is invalid or the server refuses it.
    #[instrument(name = "idgate.gateway.update_profile", skip_all)]
    pub async fn update_profile(&self, update: &UpdateUser) -> Result<UserProfile, AuthError> {
        let request = ApiRequest::put("/me")
            .json(update)?
            .request_schema(registry::update_user())
            .response_schema(registry::user_without_token());
        decode(self.call(request).await?)
    }

    /// `DELETE /me`
    ///
    /// # Errors
    /// Returns `AuthError` on any gateway failure.
    #[instrument(name = "idgate.gateway.delete_account", skip_all)]
    pub async fn delete_account(&self) -> Result<(), AuthError> {
        self.call(ApiRequest::delete("/me")).await.map(drop)
    }

    /// `PUT /password` returns a fresh token. A wrong old password must not
    /// force re-authentication, so the 401 redirect is suppressed.
    ///
    /// # Errors
    /// Returns `AuthError` if the payload is invalid or the server refuses it.
    #[instrument(name = "idgate.gateway.update_password", skip_all)]
    pub async fn update_password(
        &self,
        passwords: &UpdatePassword,
    ) -> Result<UserWithToken, AuthError> {
        let request = ApiRequest::put("/password")
            .json(passwords)?
            .request_schema(registry::update_password())
            .response_schema(registry::user_with_token())
            .suppress_auth_redirect();
        decode(self.call(request).await?)
    }

    /// `POST /2fa/setup` starts an enrollment.
    ///
    /// # Errors
    /// Returns `AuthError` on any gateway failure.
    #[instrument(name = "idgate.gateway.two_fa_setup", skip_all)]
    pub async fn two_fa_setup(&self) -> Result<TwoFaSetup, AuthError> {
        let request = ApiRequest::post("/2fa/setup").response_schema(registry::two_fa_setup());
        decode(self.call(request).await?)
    }

    /// `POST /2fa/confirm`
    ///
    /// # Errors
    /// Returns `AuthError` if the code is malformed or rejected.
    #[instrument(name = "idgate.gateway.two_fa_confirm", skip_all)]
    pub async fn two_fa_confirm(&self, confirm: &TwoFaConfirm) -> Result<UserWithToken, AuthError> {
        let request = ApiRequest::post("/2fa/confirm")
            .json(confirm)?
            .request_schema(registry::two_fa_confirm())
            .response_schema(registry::user_with_token());
        decode(self.call(request).await?)
    }

    /// `PUT /2fa/disable`
    ///
    /// # Errors
    /// Returns `AuthError` if the password is malformed or rejected.
    #[instrument(name = "idgate.gateway.two_fa_disable", skip_all)]
    pub async fn two_fa_disable(&self, disable: &TwoFaDisable) -> Result<UserWithToken, AuthError> {
        let request = ApiRequest::put("/2fa/disable")
            .json(disable)?
            .request_schema(registry::two_fa_disable())
            .response_schema(registry::user_with_token())
            .suppress_auth_redirect();
        decode(self.call(request).await?)
    }

    /// `POST /2fa` completes a login that required a second factor.
    ///
    /// # Errors
    /// Returns `AuthError` if the code is malformed or rejected.
    #[instrument(name = "idgate.gateway.two_fa_challenge", skip_all)]
    pub async fn two_fa_challenge(
        &self,
        challenge: &TwoFaChallenge,
    ) -> Result<UserWithToken, AuthError> {
        let request = ApiRequest::post("/2fa")
            .json(challenge)?
            .request_schema(registry::two_fa_challenge())
            .response_schema(registry::user_with_token())
            .suppress_auth_redirect()
            .anonymous();
        decode(self.call(request).await?)
    }

    /// `GET /`
    ///
    /// # Errors
    /// Returns `AuthError` on any gateway failure.
    #[instrument(name = "idgate.gateway.users", skip_all)]
    pub async fn users(&self) -> Result<Vec<UserSummary>, AuthError> {
        let request = ApiRequest::get("/").response_schema(registry::users());
        decode(self.call(request).await?)
    }

    /// `GET /friends`
    ///
    /// # Errors
    /// Returns `AuthError` on any gateway failure.
    #[instrument(name = "idgate.gateway.friends", skip_all)]
    pub async fn friends(&self) -> Result<Vec<Friend>, AuthError> {
        let request = ApiRequest::get("/friends").response_schema(registry::friends());
        decode(self.call(request).await?)
    }

    /// `POST /friends`
    ///
    /// # Errors
    /// Returns `AuthError` on any gateway failure.
    #[instrument(name = "idgate.gateway.add_friend", skip_all, fields(user_id = friend.user_id))]
    pub async fn add_friend(&self, friend: &AddFriend) -> Result<(), AuthError> {
        let request = ApiRequest::post("/friends")
            .json(friend)?
            .request_schema(registry::add_friend());
        self.call(request).await.map(drop)
    }

    /// `POST /validate` asks the server which user the held token belongs to.
    ///
    /// # Errors
    /// Returns `AuthError` on any gateway failure.
    #[instrument(name = "idgate.gateway.validate_session", skip_all)]
    pub async fn validate_session(&self) -> Result<SessionCheck, AuthError> {
        let request = ApiRequest::post("/validate").response_schema(registry::validate_session());
        decode(self.call(request).await?)
    }
}
