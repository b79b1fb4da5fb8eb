// Storage event entity
// Normalized view of one object-storage upload notification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("notification body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("notification has no Records")]
    MissingRecords,
    #[error("notification does not match the storage event envelope: {0}")]
    InvalidEnvelope(String),
}

/// One upload notification, flattened from the provider envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEventDescriptor {
    pub event_name: Option<String>,
    pub bucket_name: String,
    pub object_key: String,
    pub object_size: u64,
    pub content_type: String,
    pub event_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct NotificationEnvelope {
    #[serde(rename = "EventName", default)]
    event_name: Option<String>,
    #[serde(rename = "Records", default)]
    records: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    #[serde(rename = "eventName", default)]
    event_name: Option<String>,
    #[serde(rename = "eventTime")]
    event_time: DateTime<Utc>,
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
    size: u64,
    #[serde(rename = "contentType")]
    content_type: String,
}

/// Decode a raw notification body into a [`StorageEventDescriptor`].
///
/// Only the first record is used. The top-level `EventName` wins over the
/// record's own `eventName`; both may be absent.
pub fn decode_notification(body: &[u8]) -> Result<StorageEventDescriptor, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|err| DecodeError::InvalidJson(err.to_string()))?;
    decode_notification_value(value)
}

pub fn decode_notification_value(
    value: serde_json::Value,
) -> Result<StorageEventDescriptor, DecodeError> {
    let envelope: NotificationEnvelope = serde_json::from_value(value)
        .map_err(|err| DecodeError::InvalidEnvelope(err.to_string()))?;
    let first = envelope
        .records
        .and_then(|records| records.into_iter().next())
        .ok_or(DecodeError::MissingRecords)?;
    let record: NotificationRecord = serde_json::from_value(first)
        .map_err(|err| DecodeError::InvalidEnvelope(format!("Records[0]: {}", err)))?;

    let event_name = envelope
        .event_name
        .or(record.event_name)
        .filter(|name| !name.trim().is_empty());

    Ok(StorageEventDescriptor {
        event_name,
        bucket_name: record.s3.bucket.name,
        object_key: record.s3.object.key,
        object_size: record.s3.object.size,
        content_type: record.s3.object.content_type,
        event_time: record.event_time,
    })
}
