//! Authenticated, schema-validated access to the users API.
//!
//! Every call runs the same pipeline: check the request against its schema,
//! attach the bearer token held by the session store, send, classify the HTTP
//! outcome and validate the response. Failures of any step come back as an
//! [`AuthError`]; nothing from `reqwest` or `serde` leaks to callers.
//!
//! The gateway reads the session but never mutates it. Only the login flow
//! does, and only through the session store.

mod operations;
mod redirect;
mod request;

pub use operations::LoginOutcome;
pub use redirect::{AuthRedirect, LogRedirect, ResetSession};
pub use request::ApiRequest;

use crate::{
    config::ClientConfig,
    error::{AuthError, StatusClass},
    models::ErrorBody,
    schema::registry,
    session::SessionStore,
    APP_USER_AGENT,
};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Maximum number of server error characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;
const UNKNOWN_ERROR: &str = "Unknown error occurred";
const INVALID_JSON: &str = "Invalid JSON response from server";

/// Raw HTTP outcome of a call, before classification.
#[derive(Debug)]
pub(crate) struct Reply {
    pub(crate) status: StatusCode,
    pub(crate) body: String,
}

pub struct Gateway {
    client: Client,
    api_base_url: String,
    health_url: String,
    reauth_path: String,
    session: Arc<SessionStore>,
    redirect: Arc<dyn AuthRedirect>,
}

impl Gateway {
    /// # Errors
    /// Returns a server error if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionStore>,
        redirect: Arc<dyn AuthRedirect>,
    ) -> Result<Self, AuthError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|err| AuthError::server(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            health_url: config.health_url.clone(),
            reauth_path: config.reauth_path.clone(),
            session,
            redirect,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Runs `request` through the full pipeline.
    ///
    /// Returns the validated response body, or `None` when the request has
    /// no response schema.
    ///
    /// # Errors
    /// Returns `AuthError` on a contract violation, invalid payload, transport
    /// failure, non-2xx status or a response that fails its schema.
    #[instrument(
        name = "idgate.gateway.call",
        skip_all,
        fields(method = %request.method, path = %request.path)
    )]
    pub async fn call(&self, request: ApiRequest) -> Result<Option<Value>, AuthError> {
        let reply = self.exchange(&request).await?;
        self.settle(&request, &reply)
    }

    /// Validates and sends `request`, returning the raw status and body.
    pub(crate) async fn exchange(&self, request: &ApiRequest) -> Result<Reply, AuthError> {
        let body = match (&request.payload, request.request_schema) {
            (Some(_), None) => {
                return Err(AuthError::client_validation(format!(
                    "Payload for {} {} has no request schema",
                    request.method, request.path
                )));
            }
            (Some(payload), Some(schema)) => Some(schema.validate(payload).map_err(|issues| {
                debug!("Request rejected before sending: {issues}");
                AuthError::invalid_request(issues)
            })?),
            (None, _) => None,
        };

        let url = build_url(&self.api_base_url, &request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(token) = self.session.token().filter(|_| !request.anonymous) {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_request_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_request_error)?;
        debug!(status = status.as_u16(), "Received response");

        Ok(Reply { status, body })
    }

    /// Classifies a reply and validates its body against the response schema.
    pub(crate) fn settle(
        &self,
        request: &ApiRequest,
        reply: &Reply,
    ) -> Result<Option<Value>, AuthError> {
        if !reply.status.is_success() {
            return Err(self.reject(request, reply));
        }

        let Some(schema) = request.response_schema else {
            return Ok(None);
        };
        let value = parse_json(&reply.body)?;
        schema.validate(&value).map(Some).map_err(|issues| {
            warn!("Response failed validation: {issues}");
            AuthError::invalid_response(issues)
        })
    }

    fn reject(&self, request: &ApiRequest, reply: &Reply) -> AuthError {
        let err = AuthError::from_status(reply.status.as_u16(), error_message(&reply.body));
        warn!(
            status = err.status(),
            class = %err.class(),
            "Request failed: {}",
            err.message()
        );

        if err.is(StatusClass::Unauthenticated) && !request.suppress_auth_redirect {
            self.redirect.redirect(&self.reauth_path);
        }
        err
    }

    /// Reports whether the health endpoint answers with a 2xx status.
    /// Unauthenticated; every failure is `false`.
    pub async fn health(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!("Health check failed: {err}");
                false
            }
        }
    }
}

/// Builds a URL from a base URL and a path relative to it.
fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport errors into user-facing server errors with timeout detection.
fn map_request_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::server("Request timed out. Please try again.")
    } else {
        AuthError::server(format!("Unable to reach the server: {err}"))
    }
}

pub(crate) fn parse_json(body: &str) -> Result<Value, AuthError> {
    serde_json::from_str(body).map_err(|err| {
        warn!("Response is not JSON: {err}");
        AuthError::server(INVALID_JSON)
    })
}

/// Extracts the `error` field of an error body, trimmed and truncated.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| registry::error_body().parse::<ErrorBody>(&value).ok())
        .map(|body| body.error.trim().chars().take(MAX_ERROR_CHARS).collect::<String>());

    match message {
        Some(message) if !message.is_empty() => message,
        _ => UNKNOWN_ERROR.to_string(),
    }
}
