//! Error types for the tracking API client.
//!
//! # Design
//! Every failure is returned to the direct caller unchanged; nothing here is
//! retried. `Authentication` is the only error that prevents a client from
//! being constructed, and it carries an `AuthFailure` so callers can tell a
//! rejected key apart from a service that could not be reached.

use thiserror::Error;

/// Errors returned by the tracking client and its builders.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller-supplied data violates a mandatory-field rule. Raised before
    /// any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The target address could not be assembled from the service root and
    /// path segments.
    #[error("invalid request target: {0}")]
    RequestConstruction(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Network-level failure: connect, DNS, TLS, timeout, or a partial read.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body does not match the expected JSON shape.
    #[error("could not decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The service answered with a non-2xx status.
    #[error("service returned HTTP {status}: {message}")]
    Service {
        status: u16,
        /// `meta.code` from the error envelope, when the body carried one.
        code: Option<i64>,
        message: String,
    },

    /// The construction-time credential probe failed.
    #[error("authentication failed: {0}")]
    Authentication(#[source] AuthFailure),
}

/// Why the construction-time probe did not accept the credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("API key is empty")]
    EmptyKey,

    /// The probe never got a response.
    #[error("service unreachable ({0})")]
    Unreachable(String),

    /// The service answered the probe with something other than 200.
    #[error("service rejected the API key (HTTP {status})")]
    Rejected { status: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_and_message() {
        let err = ApiError::Service {
            status: 404,
            code: Some(4004),
            message: "Tracking does not exist.".to_string(),
        };
        assert_eq!(err.to_string(), "service returned HTTP 404: Tracking does not exist.");
    }

    #[test]
    fn authentication_display_names_the_reason() {
        let err = ApiError::Authentication(AuthFailure::Rejected { status: 401 });
        assert_eq!(
            err.to_string(),
            "authentication failed: service rejected the API key (HTTP 401)"
        );
    }

    #[test]
    fn decode_error_exposes_source() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::Decode(parse_err);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn authentication_keeps_reason_in_source_chain() {
        let err = ApiError::Authentication(AuthFailure::Unreachable("connection refused".to_string()));
        let source = std::error::Error::source(&err).expect("reason should be the source");
        assert_eq!(source.to_string(), "service unreachable (connection refused)");
    }
}
