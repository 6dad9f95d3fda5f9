//! Request and response payloads exchanged with the tracking service.
//!
//! # Design
//! Carrier data is uneven: the same field may be a string for one carrier,
//! a number or an object for another, or missing entirely. Such fields are
//! kept as `serde_json::Value` and left for the caller to interpret. Every
//! response field is optional on the wire, and `null` in a list, string or
//! bool field decodes to the empty value rather than failing.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Treat an explicit `null` like an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Optional product details attached to a new tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_price: Option<String>,
}

/// Request payload for creating a tracking. `tracking_number` is mandatory;
/// everything else may be left at its default and is then omitted from the
/// body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTracking {
    pub slug: String,
    pub tracking_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub smses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<CustomFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Serialize)]
struct NewTrackingEnvelope<'a> {
    tracking: &'a NewTracking,
}

impl NewTracking {
    pub fn new(slug: impl Into<String>, tracking_number: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            tracking_number: tracking_number.into(),
            ..Self::default()
        }
    }

    /// Encode as `{"tracking": {...}}`.
    ///
    /// Fails with `ApiError::Validation` when the tracking number is empty,
    /// whatever the other fields hold.
    pub fn to_body(&self) -> Result<String, ApiError> {
        if self.tracking_number.is_empty() {
            return Err(ApiError::Validation("tracking_number cannot be empty".to_string()));
        }
        serde_json::to_string(&NewTrackingEnvelope { tracking: self })
            .map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

/// Only the string entries of a loosely typed list.
fn strings_of(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn string_of(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

impl From<&Tracking> for NewTracking {
    /// Rebuild the creation request from a stored tracking. Values the
    /// service returned in a non-string shape are dropped.
    fn from(tracking: &Tracking) -> Self {
        let custom_fields = tracking.custom_fields.as_object().map(|fields| CustomFields {
            product_name: fields.get("product_name").and_then(string_of),
            product_price: fields.get("product_price").and_then(string_of),
        });
        Self {
            slug: tracking.slug.clone(),
            tracking_number: tracking.tracking_number.clone(),
            title: tracking.title.clone(),
            smses: strings_of(&tracking.smses),
            emails: strings_of(&tracking.emails),
            order_id: string_of(&tracking.order_id),
            order_id_path: string_of(&tracking.order_id_path),
            custom_fields,
            language: string_of(&tracking.language),
        }
    }
}

/// Address of a single tracking plus the extra fields to return with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingQuery {
    pub slug: String,
    pub tracking_number: String,
    pub fields: Vec<String>,
}

impl TrackingQuery {
    pub fn new(slug: impl Into<String>, tracking_number: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            tracking_number: tracking_number.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Encode a field-inclusion list for the body of a get request.
///
/// An empty list yields `None`: no body is sent, which the service treats
/// differently from an explicit `[]`.
pub fn encode_included_fields<S: AsRef<str>>(fields: &[S]) -> Result<Option<String>, ApiError> {
    if fields.is_empty() {
        return Ok(None);
    }
    let names: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
    serde_json::to_string(&names)
        .map(Some)
        .map_err(|e| ApiError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// One scan event in a shipment's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default, deserialize_with = "nullable")]
    pub slug: String,
    #[serde(default)]
    pub city: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub location: Value,
    #[serde(default)]
    pub country_name: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub message: String,
    #[serde(default)]
    pub country_iso3: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub tag: String,
    #[serde(default, deserialize_with = "nullable")]
    pub subtag: String,
    #[serde(default, deserialize_with = "nullable")]
    pub subtag_message: String,
    /// Carrier-local time as the carrier formats it; precision varies.
    #[serde(default, deserialize_with = "nullable")]
    pub checkpoint_time: String,
    #[serde(default, deserialize_with = "nullable")]
    pub coordinates: Vec<Value>,
    #[serde(default)]
    pub state: Value,
    #[serde(default)]
    pub zip: Value,
}

/// Full shipment record as stored by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracking {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "nullable")]
    pub tracking_number: String,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: String,
    #[serde(default, deserialize_with = "nullable")]
    pub active: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub android: Vec<Value>,
    #[serde(default)]
    pub custom_fields: Value,
    #[serde(default)]
    pub customer_name: Value,
    #[serde(default)]
    pub delivery_time: Option<i64>,
    #[serde(default)]
    pub destination_country_iso3: Option<String>,
    #[serde(default)]
    pub courier_destination_country_iso3: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub emails: Vec<Value>,
    #[serde(default)]
    pub expected_delivery: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub ios: Vec<Value>,
    #[serde(default)]
    pub note: Value,
    #[serde(default)]
    pub order_id: Value,
    #[serde(default)]
    pub order_id_path: Value,
    #[serde(default)]
    pub origin_country_iso3: Option<String>,
    #[serde(default)]
    pub shipment_package_count: Option<i64>,
    #[serde(default)]
    pub shipment_pickup_date: Option<String>,
    #[serde(default)]
    pub shipment_delivery_date: Option<String>,
    #[serde(default)]
    pub shipment_type: Option<String>,
    #[serde(default)]
    pub shipment_weight: Option<f64>,
    #[serde(default)]
    pub shipment_weight_unit: Option<String>,
    #[serde(default)]
    pub signed_by: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub smses: Vec<Value>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tag: String,
    #[serde(default, deserialize_with = "nullable")]
    pub subtag: String,
    #[serde(default, deserialize_with = "nullable")]
    pub subtag_message: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tracked_count: Option<i64>,
    #[serde(default)]
    pub last_mile_tracking_supported: Value,
    #[serde(default)]
    pub language: Value,
    #[serde(default)]
    pub unique_token: Option<String>,
    /// Scan history in the order the service returned it.
    #[serde(default, deserialize_with = "nullable")]
    pub checkpoints: Vec<Checkpoint>,
    #[serde(default, deserialize_with = "nullable")]
    pub subscribed_smses: Vec<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub subscribed_emails: Vec<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub return_to_sender: bool,
    #[serde(default)]
    pub tracking_account_number: Value,
    #[serde(default)]
    pub tracking_origin_country: Value,
    #[serde(default)]
    pub tracking_destination_country: Value,
    #[serde(default)]
    pub tracking_key: Value,
    #[serde(default)]
    pub tracking_postal_code: Value,
    #[serde(default)]
    pub tracking_ship_date: Value,
    #[serde(default)]
    pub tracking_state: Value,
}

impl Tracking {
    /// Most recent checkpoint as ordered by the service.
    pub fn latest_checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoints.last()
    }
}

/// Response metadata. Error envelopes also carry `message` and `type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingData {
    pub tracking: Tracking,
}

/// Envelope returned by both create and get.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub meta: Meta,
    pub data: TrackingData,
}

/// Just the `meta` block of an error reply; `data` is ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub meta: Meta,
}
