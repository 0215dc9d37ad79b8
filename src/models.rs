//! Request and response payloads of the users API. Responses are only built
//! from values that already passed their schema. Request payloads carry
//! passwords and two-factor codes, so they must never be logged.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = i64;

/// Public profile of a user. Never carries the session token.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub two_fa: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_oauth_id: Option<String>,
    pub created_at: i64,
}

/// Profile plus the bearer token, as returned by every call that (re)issues a session.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserWithToken {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub token: String,
}

impl UserWithToken {
    /// Splits the token off the profile.
    #[must_use]
    pub fn into_parts(self) -> (UserProfile, SecretString) {
        (self.profile, SecretString::from(self.token))
    }
}

impl fmt::Debug for UserWithToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UserWithToken")
            .field("profile", &self.profile)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginByIdentifier {
    pub identifier: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateUser {
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePassword {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFaSetup {
    pub two_fa_secret: String,
    pub setup_token: String,
    pub two_fa_uri: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFaConfirm {
    pub two_fa_code: String,
    pub setup_token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TwoFaDisable {
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFaChallenge {
    pub two_fa_code: String,
    pub session_token: String,
}

/// Body of the 428 answer to a login that needs a second factor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFaPending {
    pub message: String,
    pub session_token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friend {
    #[serde(flatten)]
    pub user: UserSummary,
    pub online: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFriend {
    pub user_id: UserId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCheck {
    pub user_id: UserId,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;

    #[test]
    fn user_with_token_splits_and_redacts() {
        let user: UserWithToken = serde_json::from_value(json!({
            "id": 1,
            "username": "alice",
            "email": "alice@example.com",
            "twoFa": true,
            "createdAt": 5,
            "token": "bearer-abc"
        }))
        .expect("Failed to deserialize");

        assert!(!format!("{user:?}").contains("bearer-abc"));

        let (profile, token) = user.into_parts();
        assert_eq!(profile.avatar, None);
        assert!(profile.two_fa);
        assert_eq!(token.expose_secret(), "bearer-abc");

        let stored = serde_json::to_value(&profile).expect("Failed to serialize");
        assert!(stored.get("token").is_none());
    }

    #[test]
    fn request_payloads_use_camel_case() {
        let body = serde_json::to_value(UpdatePassword {
            old_password: "a".to_string(),
            new_password: "b".to_string(),
        })
        .expect("Failed to serialize");
        assert_eq!(body, json!({ "oldPassword": "a", "newPassword": "b" }));
    }
}
