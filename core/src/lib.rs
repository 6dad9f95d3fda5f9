//! Synchronous client for the AfterShip parcel-tracking API.
//!
//! # Overview
//! Authenticates with an API key, creates tracking records and fetches
//! tracking status. Every call is one blocking HTTP round-trip; nothing is
//! retried or cached.
//!
//! # Design
//! - `TrackingClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network.
//! - `Transport` executes one request; `UreqTransport` is the pooled,
//!   timeout-bounded implementation.
//! - `Aftership` ties the two together, probes the API key at construction
//!   and implements the `TrackingApi` trait.
//! - The service root lives in `ClientConfig`, so sandbox and production
//!   clients can coexist in one process.
//!
//! ```no_run
//! use aftership_core::{Aftership, ClientConfig, NewTracking, TrackingApi};
//!
//! # fn main() -> Result<(), aftership_core::ApiError> {
//! let api = Aftership::connect(ClientConfig::new("my-api-key"))?;
//! api.create_tracking(&NewTracking::new("dhl", "1234567890"))?;
//! let status = api.get_tracking("dhl", "1234567890", &["tag"])?;
//! println!("{}", status.data.tracking.tag);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use api::{Aftership, TrackingApi};
pub use client::TrackingClient;
pub use config::{ApiKey, ClientConfig, API_KEY_HEADER, DEFAULT_BASE_URL};
pub use error::{ApiError, AuthFailure};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{
    encode_included_fields, Checkpoint, CustomFields, Meta, NewTracking, Tracking, TrackingData,
    TrackingQuery, TrackingResponse,
};
