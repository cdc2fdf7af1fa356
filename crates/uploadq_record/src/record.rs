use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::codec::{decode_parcel, encode_parcel, CodecError};
use crate::policy::{CreatedBy, LocalAction, NameCollisionPolicy, TransferPolicy};
use crate::snapshot::{DisplaySnapshot, UploadActivity};
use crate::status::{lenient_result, lenient_status, UploadResult, UploadStatus};

pub const LOCAL_PATH_SEPARATOR: char = '/';
pub const REMOTE_PATH_SEPARATOR: char = '/';

pub const UNASSIGNED_UPLOAD_ID: i64 = -1;
pub const UNKNOWN_FILE_SIZE: i64 = -1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// A file known to the sync client that can be queued for re-upload.
pub trait MirroredFile {
    /// Path of the local copy, if the file has one.
    fn storage_path(&self) -> Option<&str>;
    fn remote_path(&self) -> &str;
}

pub trait OwningAccount {
    fn account_name(&self) -> &str;
}

/// Everything needed to start an upload operation for one file.
///
/// Identity fields are validated once, in [`UploadRecord::new`]. The upload
/// store assigns the id and drives `upload_status`, `last_result` and the end
/// timestamp as the upload progresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub(crate) upload_id: i64,
    pub(crate) local_path: String,
    pub(crate) remote_path: String,
    pub(crate) account_name: String,
    pub(crate) file_size: i64,
    pub(crate) local_action: LocalAction,
    pub(crate) name_collision_policy: NameCollisionPolicy,
    pub(crate) create_remote_folder: bool,
    #[serde(default, deserialize_with = "lenient_status")]
    pub(crate) upload_status: UploadStatus,
    #[serde(default, deserialize_with = "lenient_result")]
    pub(crate) last_result: UploadResult,
    pub(crate) created_by: CreatedBy,
    pub(crate) upload_end_timestamp: i64,
    pub(crate) use_wifi_only: bool,
    pub(crate) while_charging_only: bool,
    pub(crate) folder_unlock_token: String,
}

impl UploadRecord {
    pub fn new(
        local_path: impl Into<String>,
        remote_path: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let local_path = local_path.into();
        let remote_path = remote_path.into();
        let account_name = account_name.into();

        if !local_path.starts_with(LOCAL_PATH_SEPARATOR) {
            debug!(local_path = %local_path, "rejecting upload with relative local path");
            return Err(RecordError::InvalidArgument(
                "local path must be an absolute path in the local file system".to_string(),
            ));
        }
        if !remote_path.starts_with(REMOTE_PATH_SEPARATOR) {
            debug!(remote_path = %remote_path, "rejecting upload with relative remote path");
            return Err(RecordError::InvalidArgument(
                "remote path must be an absolute path in the remote account".to_string(),
            ));
        }
        if account_name.is_empty() {
            return Err(RecordError::InvalidArgument(
                "account name cannot be empty".to_string(),
            ));
        }

        debug!(
            local_path = %local_path,
            remote_path = %remote_path,
            account = %account_name,
            "upload record created"
        );

        Ok(Self {
            local_path,
            remote_path,
            account_name,
            ..Self::blank()
        })
    }

    /// Queues an already mirrored file again, e.g. after a local edit.
    pub fn from_file(
        file: &impl MirroredFile,
        account: &impl OwningAccount,
    ) -> Result<Self, RecordError> {
        let local_path = file.storage_path().ok_or_else(|| {
            RecordError::InvalidArgument("file has no local storage path".to_string())
        })?;
        Self::new(local_path, file.remote_path(), account.account_name())
    }

    pub(crate) fn blank() -> Self {
        Self {
            upload_id: UNASSIGNED_UPLOAD_ID,
            local_path: String::new(),
            remote_path: String::new(),
            account_name: String::new(),
            file_size: UNKNOWN_FILE_SIZE,
            local_action: LocalAction::default(),
            name_collision_policy: NameCollisionPolicy::default(),
            create_remote_folder: false,
            upload_status: UploadStatus::InProgress,
            last_result: UploadResult::Unknown,
            created_by: CreatedBy::User,
            upload_end_timestamp: 0,
            use_wifi_only: true,
            while_charging_only: false,
            folder_unlock_token: String::new(),
        }
    }

    /// Moves the record to `status`. The previous attempt's result no longer
    /// applies, so it is reset to [`UploadResult::Unknown`].
    pub fn transition(&mut self, status: UploadStatus) {
        self.upload_status = status;
        self.last_result = UploadResult::Unknown;
    }

    pub fn set_last_result(&mut self, result: Option<UploadResult>) {
        self.last_result = result.unwrap_or(UploadResult::Unknown);
    }

    pub fn record_result(&mut self, result: UploadResult) {
        self.set_last_result(Some(result));
    }

    pub fn apply_policy(&mut self, policy: &TransferPolicy) {
        self.use_wifi_only = policy.use_wifi_only;
        self.while_charging_only = policy.while_charging_only;
        self.name_collision_policy = policy.name_collision_policy;
        self.local_action = policy.local_action;
        self.create_remote_folder = policy.create_remote_folder;
    }

    pub fn snapshot(&self, activity: Option<&dyn UploadActivity>) -> DisplaySnapshot {
        DisplaySnapshot {
            upload_id: self.upload_id,
            status: self.upload_status,
            uploading_now: activity.is_some_and(|probe| probe.is_uploading_now(self)),
            end_timestamp: self.upload_end_timestamp,
        }
    }

    pub fn to_parcel(&self) -> Vec<u8> {
        encode_parcel(self)
    }

    pub fn from_parcel(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_parcel(bytes)
    }

    /// Compares everything a store or worker acts on. Size and end time are
    /// bookkeeping and do not take part.
    pub fn is_same(&self, other: &UploadRecord) -> bool {
        self.upload_id == other.upload_id
            && self.local_path == other.local_path
            && self.remote_path == other.remote_path
            && self.account_name == other.account_name
            && self.local_action == other.local_action
            && self.name_collision_policy == other.name_collision_policy
            && self.create_remote_folder == other.create_remote_folder
            && self.upload_status == other.upload_status
            && self.last_result == other.last_result
            && self.created_by == other.created_by
            && self.use_wifi_only == other.use_wifi_only
            && self.while_charging_only == other.while_charging_only
            && self.folder_unlock_token == other.folder_unlock_token
    }

    pub fn mime_type(&self) -> Mime {
        mime_guess::from_path(&self.local_path).first_or_octet_stream()
    }

    /// Checks the local file system on every call.
    pub fn exists(&self) -> bool {
        Path::new(&self.local_path).try_exists().unwrap_or(false)
    }

    pub fn mark_finished_at(&mut self, finished_at: DateTime<Utc>) {
        self.upload_end_timestamp = finished_at.timestamp_millis();
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        if self.upload_end_timestamp == 0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.upload_end_timestamp)
    }

    pub fn upload_id(&self) -> i64 {
        self.upload_id
    }

    pub fn local_path(&self) -> &str {
        &self.local_path
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn file_size(&self) -> i64 {
        self.file_size
    }

    pub fn local_action(&self) -> LocalAction {
        self.local_action
    }

    pub fn name_collision_policy(&self) -> NameCollisionPolicy {
        self.name_collision_policy
    }

    pub fn create_remote_folder(&self) -> bool {
        self.create_remote_folder
    }

    pub fn upload_status(&self) -> UploadStatus {
        self.upload_status
    }

    pub fn last_result(&self) -> UploadResult {
        self.last_result
    }

    pub fn created_by(&self) -> CreatedBy {
        self.created_by
    }

    pub fn upload_end_timestamp(&self) -> i64 {
        self.upload_end_timestamp
    }

    pub fn use_wifi_only(&self) -> bool {
        self.use_wifi_only
    }

    pub fn while_charging_only(&self) -> bool {
        self.while_charging_only
    }

    pub fn folder_unlock_token(&self) -> &str {
        &self.folder_unlock_token
    }

    pub fn set_upload_id(&mut self, upload_id: i64) {
        self.upload_id = upload_id;
    }

    // Re-targeting skips the construction-time path checks.
    pub fn set_local_path(&mut self, local_path: impl Into<String>) {
        self.local_path = local_path.into();
    }

    pub fn set_remote_path(&mut self, remote_path: impl Into<String>) {
        self.remote_path = remote_path.into();
    }

    pub fn set_file_size(&mut self, file_size: i64) {
        self.file_size = file_size;
    }

    pub fn set_local_action(&mut self, local_action: LocalAction) {
        self.local_action = local_action;
    }

    pub fn set_name_collision_policy(&mut self, policy: NameCollisionPolicy) {
        self.name_collision_policy = policy;
    }

    pub fn set_create_remote_folder(&mut self, create_remote_folder: bool) {
        self.create_remote_folder = create_remote_folder;
    }

    pub fn set_created_by(&mut self, created_by: CreatedBy) {
        self.created_by = created_by;
    }

    pub fn set_upload_end_timestamp(&mut self, upload_end_timestamp: i64) {
        self.upload_end_timestamp = upload_end_timestamp;
    }

    pub fn set_use_wifi_only(&mut self, use_wifi_only: bool) {
        self.use_wifi_only = use_wifi_only;
    }

    pub fn set_while_charging_only(&mut self, while_charging_only: bool) {
        self.while_charging_only = while_charging_only;
    }

    pub fn set_folder_unlock_token(&mut self, token: impl Into<String>) {
        self.folder_unlock_token = token.into();
    }
}

impl PartialEq for UploadRecord {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl Eq for UploadRecord {}

impl fmt::Display for UploadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} status:{} result:{}",
            self.local_path,
            self.upload_status,
            self.last_result.value()
        )
    }
}
