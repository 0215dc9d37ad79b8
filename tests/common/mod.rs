#![allow(dead_code)]

use idgate::{
    config::ClientConfig,
    gateway::{AuthRedirect, Gateway},
    session::{MemoryStore, SessionStore},
};
use serde_json::{json, Value};
use std::{
    net::TcpListener,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

pub const API_PATH: &str = "/api/users";

pub fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Remembers every re-authentication path it was sent to.
#[derive(Default)]
pub struct RecordingRedirect {
    paths: Mutex<Vec<String>>,
}

impl RecordingRedirect {
    pub fn paths(&self) -> Vec<String> {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuthRedirect for RecordingRedirect {
    fn redirect(&self, path: &str) {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}

pub struct Harness {
    pub storage: Arc<MemoryStore>,
    pub session: Arc<SessionStore>,
    pub redirect: Arc<RecordingRedirect>,
    pub gateway: Arc<Gateway>,
}

pub fn harness(server_uri: &str) -> Harness {
    let config = ClientConfig {
        api_base_url: format!("{server_uri}{API_PATH}"),
        health_url: format!("{server_uri}/api/ping"),
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    };
    let storage = Arc::new(MemoryStore::new());
    let session = Arc::new(SessionStore::new(storage.clone()));
    let redirect = Arc::new(RecordingRedirect::default());
    let gateway = Arc::new(
        Gateway::new(&config, Arc::clone(&session), redirect.clone()).expect("gateway"),
    );

    Harness {
        storage,
        session,
        redirect,
        gateway,
    }
}

pub fn endpoint(path: &str) -> String {
    format!("{API_PATH}{path}")
}

pub fn profile_json(id: i64, two_fa: bool) -> Value {
    json!({
        "id": id,
        "username": "alice",
        "email": "alice@example.com",
        "avatar": null,
        "twoFa": two_fa,
        "createdAt": 1_700_000_000
    })
}

pub fn user_with_token_json(id: i64, two_fa: bool, token: &str) -> Value {
    let mut body = profile_json(id, two_fa);
    body["token"] = json!(token);
    body
}
