//! Stateless request builder and response parser for the tracking API.
//!
//! # Design
//! `TrackingClient` holds the service root and the API key and nothing else.
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Neither side performs I/O; `Aftership` wires them to a `Transport`.

use url::Url;

use crate::config::{parse_base_url, ApiKey, API_KEY_HEADER};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    encode_included_fields, ErrorEnvelope, NewTracking, TrackingQuery, TrackingResponse,
};

/// Builds requests for, and parses responses from, one service root.
#[derive(Debug, Clone)]
pub struct TrackingClient {
    base_url: Url,
    api_key: ApiKey,
}

impl TrackingClient {
    pub fn new(base_url: &str, api_key: ApiKey) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key,
        })
    }

    /// Service root exactly as configured, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("content-type".to_string(), "application/json".to_string()),
            (API_KEY_HEADER.to_string(), self.api_key.as_str().to_string()),
        ]
    }

    /// Append `segments` to the service root. Each segment is encoded as a
    /// single path segment, so a `/` inside a tracking number cannot change
    /// the route. `.` and `..` would be resolved away by URL normalisation
    /// and are rejected.
    fn url_for(&self, segments: &[&str]) -> Result<String, ApiError> {
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(ApiError::RequestConstruction(format!(
                "path segment {segment:?} would not address a single resource"
            )));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::RequestConstruction(format!("{} cannot carry path segments", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    /// Generic request with both mandatory headers attached.
    pub fn build_request(
        &self,
        method: HttpMethod,
        body: Option<String>,
        segments: &[&str],
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method,
            url: self.url_for(segments)?,
            headers: self.headers(),
            body,
        })
    }

    /// GET on the service root, used to check the key before first use.
    pub fn build_probe(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.base_url().to_string(),
            headers: self.headers(),
            body: None,
        }
    }

    pub fn build_create_tracking(&self, input: &NewTracking) -> Result<HttpRequest, ApiError> {
        let body = input.to_body()?;
        self.build_request(HttpMethod::Post, Some(body), &["trackings"])
    }

    /// GET `/trackings/{slug}/{tracking_number}`.
    ///
    /// Requested fields travel as a JSON array in the body of the GET. This
    /// is unusual but it is what the service reads; with no fields the
    /// request has no body at all.
    pub fn build_get_tracking(&self, query: &TrackingQuery) -> Result<HttpRequest, ApiError> {
        let body = encode_included_fields(&query.fields)?;
        self.build_request(
            HttpMethod::Get,
            body,
            &["trackings", &query.slug, &query.tracking_number],
        )
    }

    pub fn parse_probe(&self, response: &HttpResponse) -> bool {
        response.status == 200
    }

    pub fn parse_create_tracking(&self, response: HttpResponse) -> Result<TrackingResponse, ApiError> {
        parse_tracking_response(response)
    }

    pub fn parse_get_tracking(&self, response: HttpResponse) -> Result<TrackingResponse, ApiError> {
        parse_tracking_response(response)
    }
}

/// Decode a 2xx body into a `TrackingResponse`, or map anything else to
/// `ApiError::Service`.
fn parse_tracking_response(response: HttpResponse) -> Result<TrackingResponse, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(ApiError::Decode)
}

/// Map non-success status codes to `ApiError::Service`, preferring the
/// message from the service's error envelope over the raw body.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&response.body) {
        Ok(envelope) => (
            Some(envelope.meta.code),
            envelope.meta.message.unwrap_or_else(|| response.body.clone()),
        ),
        Err(_) => (None, response.body.clone()),
    };
    Err(ApiError::Service {
        status: response.status,
        code,
        message,
    })
}
