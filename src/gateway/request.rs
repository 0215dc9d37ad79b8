use crate::{error::AuthError, schema::Schema};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// One gateway call: where it goes, what it sends and what it must get back.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) payload: Option<Value>,
    pub(crate) request_schema: Option<&'static Schema>,
    pub(crate) response_schema: Option<&'static Schema>,
    pub(crate) suppress_auth_redirect: bool,
    pub(crate) anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload: None,
            request_schema: None,
            response_schema: None,
            suppress_auth_redirect: false,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Raw JSON payload. Must be paired with [`ApiRequest::request_schema`].
    #[must_use]
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Serializes `body` as the payload.
    ///
    /// # Errors
    /// Returns a client-validation error if `body` cannot be encoded as JSON.
    pub fn json<T: Serialize>(self, body: &T) -> Result<Self, AuthError> {
        let payload = serde_json::to_value(body).map_err(|err| {
            AuthError::client_validation(format!("Failed to encode request: {err}"))
        })?;
        Ok(self.payload(payload))
    }

    #[must_use]
    pub fn request_schema(mut self, schema: &'static Schema) -> Self {
        self.request_schema = Some(schema);
        self
    }

    #[must_use]
    pub fn response_schema(mut self, schema: &'static Schema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// A 401 answer is returned as an error without triggering re-authentication.
    #[must_use]
    pub fn suppress_auth_redirect(mut self) -> Self {
        self.suppress_auth_redirect = true;
        self
    }

    /// Sent without the held bearer token, even when a session is active.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}
