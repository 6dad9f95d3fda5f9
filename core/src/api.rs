//! Client facade: credential probe plus the two tracking operations.
//!
//! # Design
//! `TrackingApi` is the capability surface callers depend on. `Aftership`
//! implements it on top of a `TrackingClient` and a `Transport`; each call is
//! one blocking round-trip with no retries and no caching. The client holds
//! no mutable state, so a single instance can be shared across threads.

use crate::client::TrackingClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, AuthFailure};
use crate::http::{Transport, UreqTransport};
use crate::types::{NewTracking, TrackingQuery, TrackingResponse};

/// Operations exposed by a connected tracking client.
pub trait TrackingApi: Send + Sync {
    /// Create a tracking record. The tracking number must be non-empty.
    fn create_tracking(&self, input: &NewTracking) -> Result<TrackingResponse, ApiError>;

    /// Fetch one tracking, optionally asking for extra fields.
    fn get_tracking(
        &self,
        slug: &str,
        tracking_number: &str,
        included_fields: &[&str],
    ) -> Result<TrackingResponse, ApiError>;
}

/// Connected client for the tracking service.
#[derive(Debug, Clone)]
pub struct Aftership<T = UreqTransport> {
    client: TrackingClient,
    transport: T,
}

impl Aftership<UreqTransport> {
    /// Build the pooled HTTP transport from `config` and check the API key
    /// against the service root.
    pub fn connect(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = UreqTransport::new(config.timeout(), config.max_idle_connections_per_host());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Aftership<T> {
    /// Check the API key with one GET on the service root over `transport`.
    ///
    /// Any answer other than 200, or no answer at all, fails with
    /// `ApiError::Authentication` and no client is returned.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        if config.api_key().is_empty() {
            return Err(ApiError::Authentication(AuthFailure::EmptyKey));
        }
        let client = TrackingClient::new(config.base_url(), config.api_key().clone())?;

        let probe = client.build_probe();
        match transport.execute(&probe) {
            Ok(response) if client.parse_probe(&response) => {}
            Ok(response) => {
                tracing::warn!(status = response.status, url = %probe.url, "API key rejected by service");
                return Err(ApiError::Authentication(AuthFailure::Rejected {
                    status: response.status,
                }));
            }
            Err(err) => {
                tracing::warn!(error = %err, url = %probe.url, "could not reach service");
                return Err(ApiError::Authentication(AuthFailure::Unreachable(err.to_string())));
            }
        }

        Ok(Self { client, transport })
    }

    /// `get_tracking` for a prepared query.
    pub fn fetch(&self, query: &TrackingQuery) -> Result<TrackingResponse, ApiError> {
        let request = self.client.build_get_tracking(query)?;
        let response = self.transport.execute(&request)?;
        self.client.parse_get_tracking(response)
    }
}

impl<T: Transport> TrackingApi for Aftership<T> {
    fn create_tracking(&self, input: &NewTracking) -> Result<TrackingResponse, ApiError> {
        let request = self.client.build_create_tracking(input)?;
        let response = self.transport.execute(&request)?;
        self.client.parse_create_tracking(response)
    }

    fn get_tracking(
        &self,
        slug: &str,
        tracking_number: &str,
        included_fields: &[&str],
    ) -> Result<TrackingResponse, ApiError> {
        let query = TrackingQuery::new(slug, tracking_number).with_fields(included_fields.iter().copied());
        self.fetch(&query)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Replays canned outcomes and records every request it sees.
    #[derive(Debug, Default)]
    struct StubTransport {
        replies: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl StubTransport {
        fn replying(replies: Vec<Result<HttpResponse, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for StubTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("no reply queued".to_string())))
        }
    }

    fn ok(status: u16, body: &str) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    const PROBE_OK: &str = r#"{"meta":{"code":200},"data":{}}"#;
    const TRACKING: &str =
        r#"{"meta":{"code":200},"data":{"tracking":{"slug":"dhl","tracking_number":"1234567890","tag":"InTransit"}}}"#;

    fn config() -> ClientConfig {
        ClientConfig::new("test-key")
            .with_base_url("https://sandbox.example.com/v4")
            .unwrap()
    }

    #[test]
    fn connect_probes_root_with_key() {
        let stub = StubTransport::replying(vec![ok(200, PROBE_OK)]);
        Aftership::with_transport(config(), stub.clone()).unwrap();

        let seen = stub.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert_eq!(seen[0].url, "https://sandbox.example.com/v4");
        assert_eq!(seen[0].header("aftership-api-key"), Some("test-key"));
        assert_eq!(seen[0].header("content-type"), Some("application/json"));
    }

    #[test]
    fn probe_refused_fails_authentication() {
        let stub = StubTransport::replying(vec![Err(ApiError::Transport("connection refused".to_string()))]);
        let err = Aftership::with_transport(config(), stub).unwrap_err();
        assert!(matches!(err, ApiError::Authentication(AuthFailure::Unreachable(_))));
    }

    #[test]
    fn probe_non_200_fails_authentication() {
        let stub = StubTransport::replying(vec![ok(401, r#"{"meta":{"code":401}}"#)]);
        let err = Aftership::with_transport(config(), stub).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Authentication(AuthFailure::Rejected { status: 401 })
        ));
    }

    #[test]
    fn empty_key_fails_without_network() {
        let stub = StubTransport::replying(vec![ok(200, PROBE_OK)]);
        let err = Aftership::with_transport(ClientConfig::new(""), stub.clone()).unwrap_err();
        assert!(matches!(err, ApiError::Authentication(AuthFailure::EmptyKey)));
        assert!(stub.seen().is_empty());
    }

    #[test]
    fn create_tracking_posts_wrapped_body() {
        let stub = StubTransport::replying(vec![ok(200, PROBE_OK), ok(201, TRACKING)]);
        let api = Aftership::with_transport(config(), stub.clone()).unwrap();

        let resp = api.create_tracking(&NewTracking::new("dhl", "1234567890")).unwrap();
        assert_eq!(resp.data.tracking.tracking_number, "1234567890");

        let seen = stub.seen();
        assert_eq!(seen[1].method, HttpMethod::Post);
        assert_eq!(seen[1].url, "https://sandbox.example.com/v4/trackings");
        let body: serde_json::Value = serde_json::from_str(seen[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["tracking"]["tracking_number"], "1234567890");
    }

    #[test]
    fn create_tracking_validation_happens_before_io() {
        let stub = StubTransport::replying(vec![ok(200, PROBE_OK)]);
        let api = Aftership::with_transport(config(), stub.clone()).unwrap();

        let err = api.create_tracking(&NewTracking::new("dhl", "")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(stub.seen().len(), 1, "only the probe should have been sent");
    }

    #[test]
    fn get_tracking_without_fields_sends_no_body() {
        let stub = StubTransport::replying(vec![ok(200, PROBE_OK), ok(200, TRACKING)]);
        let api = Aftership::with_transport(config(), stub.clone()).unwrap();

        let resp = api.get_tracking("dhl", "1234567890", &[]).unwrap();
        assert_eq!(resp.data.tracking.tag, "InTransit");

        let seen = stub.seen();
        assert_eq!(seen[1].method, HttpMethod::Get);
        assert_eq!(seen[1].url, "https://sandbox.example.com/v4/trackings/dhl/1234567890");
        assert!(seen[1].body.is_none());
    }

    #[test]
    fn get_tracking_with_fields_sends_array_body() {
        let stub = StubTransport::replying(vec![ok(200, PROBE_OK), ok(200, TRACKING)]);
        let api = Aftership::with_transport(config(), stub.clone()).unwrap();

        api.get_tracking("dhl", "1234567890", &["tag", "fields"]).unwrap();
        assert_eq!(stub.seen()[1].body.as_deref(), Some(r#"["tag","fields"]"#));
    }

    #[test]
    fn malformed_body_yields_decode_error_for_both_operations() {
        let stub = StubTransport::replying(vec![
            ok(200, PROBE_OK),
            ok(201, "{\"meta\": {\"code\": 201}, \"data\": "),
            ok(200, "<html>oops</html>"),
        ]);
        let api = Aftership::with_transport(config(), stub).unwrap();

        let err = api.create_tracking(&NewTracking::new("dhl", "1")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        let err = api.get_tracking("dhl", "1", &[]).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn transport_failure_is_surfaced_unchanged() {
        let stub = StubTransport::replying(vec![
            ok(200, PROBE_OK),
            Err(ApiError::Transport("timed out".to_string())),
        ]);
        let api = Aftership::with_transport(config(), stub.clone()).unwrap();

        let err = api.get_tracking("dhl", "1", &[]).unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref m) if m == "timed out"));
        assert_eq!(stub.seen().len(), 2, "no retry expected");
    }

    #[test]
    fn usable_as_trait_object() {
        let stub = StubTransport::replying(vec![ok(200, PROBE_OK), ok(200, TRACKING)]);
        let api: Box<dyn TrackingApi> = Box::new(Aftership::with_transport(config(), stub).unwrap());
        assert!(api.get_tracking("dhl", "1234567890", &[]).is_ok());
    }
}
