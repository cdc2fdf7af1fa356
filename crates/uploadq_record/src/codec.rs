use rmp_serde::{decode::Error as DecodeError, encode::Error as EncodeError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::parcel::{ParcelError, ParcelReader, ParcelWriter};
use crate::policy::{CreatedBy, LocalAction, NameCollisionPolicy};
use crate::record::UploadRecord;
use crate::status::{parse_or_default, UploadResult, UploadStatus};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed parcel: {0}")]
    Parcel(#[from] ParcelError),
    #[error("failed to serialize record to JSON value: {0}")]
    JsonSerialize(#[source] serde_json::Error),
    #[error("failed to encode canonical messagepack: {0}")]
    MessagePackEncode(#[source] EncodeError),
    #[error("failed to decode messagepack payload: {0}")]
    MessagePackDecode(#[source] DecodeError),
    #[error("failed to deserialize decoded payload to target type: {0}")]
    JsonDeserialize(#[source] serde_json::Error),
}

/// Writes the transport form of `record`. `file_size` is not part of it.
pub fn encode_parcel(record: &UploadRecord) -> Vec<u8> {
    let mut out = ParcelWriter::new();
    out.write_i64(record.upload_id);
    out.write_string(Some(&record.local_path));
    out.write_string(Some(&record.remote_path));
    out.write_string(Some(&record.account_name));
    out.write_i32(record.local_action.code());
    out.write_i32(record.name_collision_policy.code());
    out.write_bool(record.create_remote_folder);
    out.write_string(Some(record.upload_status.as_wire_name()));
    out.write_i64(record.upload_end_timestamp);
    out.write_string(Some(record.last_result.as_wire_name()));
    out.write_i32(record.created_by.code());
    out.write_bool(record.use_wifi_only);
    out.write_bool(record.while_charging_only);
    out.write_string(Some(&record.folder_unlock_token));
    out.into_bytes()
}

/// Reads a record written by [`encode_parcel`].
///
/// Unrecognized status and result names degrade to `InProgress` and
/// `Unknown`. Identity fields are taken as written, without re-validation.
pub fn decode_parcel(bytes: &[u8]) -> Result<UploadRecord, CodecError> {
    let mut input = ParcelReader::new(bytes);
    let mut record = UploadRecord::blank();

    record.upload_id = input.read_i64()?;
    record.local_path = input.read_string()?.unwrap_or_default();
    record.remote_path = input.read_string()?.unwrap_or_default();
    record.account_name = input.read_string()?.unwrap_or_default();

    record.local_action = LocalAction::from_code(input.read_i32()?);
    if !record.local_action.is_known() {
        warn!(
            code = record.local_action.code(),
            "unknown local action in parcel, keeping code"
        );
    }
    record.name_collision_policy = NameCollisionPolicy::from_code(input.read_i32()?);
    record.create_remote_folder = input.read_bool()?;

    let raw_status = input.read_string()?;
    let status = parse_or_default(raw_status.as_deref(), UploadStatus::InProgress);
    if status.is_fallback() {
        warn!(raw = ?raw_status, "unknown upload status in parcel, using in-progress");
    }
    record.upload_status = status.into_inner();

    record.upload_end_timestamp = input.read_i64()?;

    let raw_result = input.read_string()?;
    let result = parse_or_default(raw_result.as_deref(), UploadResult::Unknown);
    if result.is_fallback() {
        warn!(raw = ?raw_result, "unknown upload result in parcel, using unknown");
    }
    record.last_result = result.into_inner();

    record.created_by = CreatedBy::from_code(input.read_i32()?);
    record.use_wifi_only = input.read_bool()?;
    record.while_charging_only = input.read_bool()?;
    record.folder_unlock_token = input.read_string()?.unwrap_or_default();

    Ok(record)
}

/// MessagePack with object keys in sorted order, so equal values encode to
/// identical bytes.
pub fn encode_canonical<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_value(value).map_err(CodecError::JsonSerialize)?;
    rmp_serde::to_vec_named(&sort_keys(json)).map_err(CodecError::MessagePackEncode)
}

pub fn decode_canonical<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let decoded: Value = rmp_serde::from_slice(bytes).map_err(CodecError::MessagePackDecode)?;
    serde_json::from_value(decoded).map_err(CodecError::JsonDeserialize)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut entries: Vec<(String, Value)> = obj.into_iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, item)| (key, sort_keys(item)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        primitive => primitive,
    }
}
