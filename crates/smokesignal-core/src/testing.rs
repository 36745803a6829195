//! Fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};
use crate::auth::{Identity, MemoryStorage, Role, SessionStore};
use crate::navigation::Navigator;

pub fn admin_identity() -> Identity {
    Identity {
        id: "1".to_string(),
        name: "Pit Boss".to_string(),
        email: "a@b.com".to_string(),
        role: Role::Admin,
    }
}

#[derive(Default)]
pub struct CountingNavigator {
    redirects: AtomicUsize,
}

impl CountingNavigator {
    pub fn count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Store over fresh in-memory storage plus its navigator
pub fn memory_store() -> (Arc<SessionStore>, Arc<CountingNavigator>) {
    let navigator = Arc::new(CountingNavigator::default());
    let store = SessionStore::new(Arc::new(MemoryStorage::new()), navigator.clone());
    (Arc::new(store), navigator)
}

pub enum Scripted {
    Respond(StatusCode, String),
    Fail(ApiError),
}

/// Transport that replays scripted outcomes and records what it was sent.
///
/// When the script runs out every request gets `200 {}`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.push(Scripted::Respond(status, body.to_string()))
    }

    pub fn fail(self, error: ApiError) -> Self {
        self.push(Scripted::Fail(error))
    }

    fn push(self, outcome: Scripted) -> Self {
        self.script.lock().expect("script lock").push_back(outcome);
        self
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn last_sent(&self) -> ApiRequest {
        self.sent().pop().expect("no request was sent")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.sent.lock().expect("sent lock").push(request.clone());
        let next = self.script.lock().expect("script lock").pop_front();
        match next {
            Some(Scripted::Respond(status, body)) => Ok(ApiResponse::new(status, body)),
            Some(Scripted::Fail(error)) => Err(error),
            None => Ok(ApiResponse::new(StatusCode::OK, "{}")),
        }
    }
}

/// A real `reqwest::Error`, for exercising transport-failure paths
pub fn network_error() -> ApiError {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("invalid url must fail to build");
    ApiError::NetworkError(err)
}
