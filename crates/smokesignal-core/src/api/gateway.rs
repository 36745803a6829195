use std::sync::Arc;

use tracing::debug;

use super::middleware::{BearerAuth, Middleware, SessionTeardown};
use super::{ApiError, ApiRequest, ApiResponse, Transport};
use crate::auth::SessionStore;

/// Runs every outbound call through an ordered middleware pipeline.
///
/// For each call: `on_request` hooks in order, one send, non-2xx statuses
/// mapped to [`ApiError`], then `on_response` hooks in the same order.
/// There is no retry; a fired request runs to completion.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Gateway {
    /// Gateway with an empty pipeline
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            middleware: Vec::new(),
        }
    }

    /// Standard pipeline: attach the credential, tear down on 401
    pub fn authorized(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self::new(transport)
            .with_middleware(Arc::new(BearerAuth::new(session.clone())))
            .with_middleware(Arc::new(SessionTeardown::new(session)))
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        for middleware in &self.middleware {
            middleware.on_request(&mut request)?;
        }

        debug!(method = %request.method, path = %request.path, "Sending request");
        let result = match self.transport.send(&request).await {
            Ok(response) => Self::check_response(response),
            Err(e) => Err(e),
        };

        self.middleware
            .iter()
            .fold(result, |result, middleware| middleware.on_response(&request, result))
    }

    /// Check if response is successful, returning a typed error if not.
    fn check_response(response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::auth::Credential;
    use crate::testing::{admin_identity, memory_store, network_error, ScriptedTransport};

    #[tokio::test]
    async fn test_attaches_bearer_when_signed_in() {
        let (store, _) = memory_store();
        store.set_session(admin_identity(), Credential::new("T1"));
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = Gateway::authorized(transport.clone(), store);

        gateway.execute(ApiRequest::get("/orders")).await.expect("ok");

        let sent = transport.last_sent();
        assert_eq!(sent.bearer_token(), Some("T1"));
        assert_eq!(
            sent.headers.get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer T1")
        );
    }

    #[tokio::test]
    async fn test_no_header_when_signed_out() {
        let (store, _) = memory_store();
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = Gateway::authorized(transport.clone(), store);

        gateway.execute(ApiRequest::get("/orders")).await.expect("ok");

        assert!(transport.last_sent().headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_anonymous_requests_skip_credential() {
        let (store, _) = memory_store();
        store.set_session(admin_identity(), Credential::new("T1"));
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = Gateway::authorized(transport.clone(), store);

        gateway.execute(ApiRequest::post("/auth/login").anonymous()).await.expect("ok");

        assert_eq!(transport.last_sent().bearer_token(), None);
    }

    #[tokio::test]
    async fn test_header_reflects_credential_at_send_time() {
        let (store, _) = memory_store();
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = Gateway::authorized(transport.clone(), store.clone());

        store.set_session(admin_identity(), Credential::new("T1"));
        gateway.execute(ApiRequest::get("/products")).await.expect("ok");
        store.set_session(admin_identity(), Credential::new("T2"));
        gateway.execute(ApiRequest::get("/products")).await.expect("ok");

        let tokens: Vec<_> = transport
            .sent()
            .iter()
            .map(|r| r.bearer_token().map(str::to_string))
            .collect();
        assert_eq!(tokens, vec![Some("T1".to_string()), Some("T2".to_string())]);
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session_and_propagates() {
        let (store, navigator) = memory_store();
        store.set_session(admin_identity(), Credential::new("T1"));
        let transport = Arc::new(
            ScriptedTransport::new().respond(401, r#"{"error":"Access token invalid or expired"}"#),
        );
        let gateway = Gateway::authorized(transport, store.clone());

        let err = gateway
            .execute(ApiRequest::get("/discounts"))
            .await
            .expect_err("401 must reach the caller");

        assert!(err.is_unauthorized());
        assert_eq!(store.credential(), None);
        assert_eq!(navigator.count(), 1);
    }

    #[tokio::test]
    async fn test_non_auth_failures_keep_session() {
        for status in [403u16, 404, 429, 500, 503] {
            let (store, navigator) = memory_store();
            store.set_session(admin_identity(), Credential::new("T1"));
            let transport = Arc::new(ScriptedTransport::new().respond(status, r#"{"error":"nope"}"#));
            let gateway = Gateway::authorized(transport, store.clone());

            let err = gateway.execute(ApiRequest::get("/analytics/stats")).await.expect_err("error");

            assert_eq!(err.status().map(|s| s.as_u16()), Some(status));
            assert_eq!(store.credential(), Some(Credential::new("T1")), "status {}", status);
            assert_eq!(navigator.count(), 0);
        }
    }

    #[tokio::test]
    async fn test_transport_failure_passes_through() {
        let (store, navigator) = memory_store();
        store.set_session(admin_identity(), Credential::new("T1"));
        let transport = Arc::new(ScriptedTransport::new().fail(network_error()));
        let gateway = Gateway::authorized(transport, store.clone());

        let err = gateway.execute(ApiRequest::get("/orders")).await.expect_err("error");

        assert!(matches!(err, ApiError::NetworkError(_)));
        assert!(store.is_authenticated());
        assert_eq!(navigator.count(), 0);
    }

    #[tokio::test]
    async fn test_anonymous_unauthorized_keeps_session() {
        let (store, navigator) = memory_store();
        store.set_session(admin_identity(), Credential::new("T1"));
        let transport = Arc::new(ScriptedTransport::new().respond(401, "{}"));
        let gateway = Gateway::authorized(transport, store.clone());

        let result = gateway.execute(ApiRequest::post("/auth/login").anonymous()).await;

        assert!(result.is_err());
        assert!(store.is_authenticated());
        assert_eq!(navigator.count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_redirects_once() {
        let (store, navigator) = memory_store();
        store.set_session(admin_identity(), Credential::new("T1"));
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(401, "{}")
                .respond(401, "{}")
                .respond(401, "{}"),
        );
        let gateway = Gateway::authorized(transport, store.clone());

        let results = futures::future::join_all([
            gateway.execute(ApiRequest::get("/orders")),
            gateway.execute(ApiRequest::get("/customers")),
            gateway.execute(ApiRequest::get("/reviews")),
        ])
        .await;

        assert!(results.iter().all(|r| matches!(r, Err(ApiError::Unauthorized(_)))));
        assert_eq!(store.credential(), None);
        assert_eq!(navigator.count(), 1);
    }

    /// Records what it observes so ordering can be asserted.
    struct OrderRecorder {
        session: Arc<SessionStore>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for OrderRecorder {
        fn name(&self) -> &'static str {
            "order-recorder"
        }

        fn on_request(&self, request: &mut ApiRequest) -> Result<(), ApiError> {
            let header = request.bearer_token().unwrap_or("-").to_string();
            self.log.lock().expect("log").push(format!("request:{}", header));
            Ok(())
        }

        fn on_response(
            &self,
            _request: &ApiRequest,
            result: Result<ApiResponse, ApiError>,
        ) -> Result<ApiResponse, ApiError> {
            let signed_in = self.session.is_authenticated();
            self.log.lock().expect("log").push(format!("response:signed_in={}", signed_in));
            result
        }
    }

    #[tokio::test]
    async fn test_pipeline_runs_in_registration_order() {
        let (store, _) = memory_store();
        store.set_session(admin_identity(), Credential::new("T1"));
        let log = Arc::new(Mutex::new(Vec::new()));
        let transport = Arc::new(ScriptedTransport::new().respond(401, "{}"));
        let gateway = Gateway::authorized(transport, store.clone()).with_middleware(Arc::new(OrderRecorder {
            session: store.clone(),
            log: log.clone(),
        }));

        assert_eq!(
            gateway.middleware_names(),
            vec!["bearer-auth", "session-teardown", "order-recorder"]
        );
        let _ = gateway.execute(ApiRequest::get("/orders")).await;

        // The recorder runs after bearer-auth on the way out and after
        // session-teardown on the way back.
        let log = log.lock().expect("log").clone();
        assert_eq!(log, vec!["request:T1", "response:signed_in=false"]);
    }

    #[tokio::test]
    async fn test_rejecting_middleware_aborts_before_send() {
        struct Reject;
        impl Middleware for Reject {
            fn name(&self) -> &'static str {
                "reject"
            }
            fn on_request(&self, _request: &mut ApiRequest) -> Result<(), ApiError> {
                Err(ApiError::InvalidRequest("blocked".to_string()))
            }
        }

        let transport = Arc::new(ScriptedTransport::new());
        let gateway = Gateway::new(transport.clone()).with_middleware(Arc::new(Reject));

        let err = gateway.execute(ApiRequest::get("/orders")).await.expect_err("error");
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert!(transport.sent().is_empty());
    }
}
