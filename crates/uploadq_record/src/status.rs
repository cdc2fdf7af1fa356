use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} name: {raw:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub raw: String,
}

/// Outcome of decoding an enum name that may come from untrusted storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<T> {
    Known(T),
    Fallback(T),
}

impl<T> Decoded<T> {
    pub fn into_inner(self) -> T {
        match self {
            Decoded::Known(value) | Decoded::Fallback(value) => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Decoded::Fallback(_))
    }
}

/// Parses `raw` as a wire name, substituting `default` for absent or
/// unrecognized input instead of failing.
pub fn parse_or_default<T: FromStr>(raw: Option<&str>, default: T) -> Decoded<T> {
    match raw.map(str::parse::<T>) {
        Some(Ok(value)) => Decoded::Known(value),
        _ => Decoded::Fallback(default),
    }
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => ($wire:literal, $value:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_wire_name(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn value(self) -> i32 {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        raw: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_wire_name())
            }
        }
    };
}

wire_enum! {
    /// Lifecycle state of a queued upload as tracked by the upload store.
    pub enum UploadStatus {
        #[default]
        InProgress => ("UPLOAD_IN_PROGRESS", 0),
        Failed => ("UPLOAD_FAILED", 1),
        Succeeded => ("UPLOAD_SUCCEEDED", 2),
        Cancelled => ("UPLOAD_CANCELLED", 3),
    }
}

impl UploadStatus {
    /// Position of the status group in an upload list, lowest first.
    pub fn display_rank(self) -> u8 {
        match self {
            UploadStatus::InProgress => 0,
            UploadStatus::Failed => 1,
            UploadStatus::Cancelled => 2,
            UploadStatus::Succeeded => 3,
        }
    }
}

wire_enum! {
    /// Outcome of the most recent upload attempt.
    pub enum UploadResult {
        #[default]
        Unknown => ("UNKNOWN", -1),
        Uploaded => ("UPLOADED", 0),
        NetworkConnection => ("NETWORK_CONNECTION", 1),
        CredentialError => ("CREDENTIAL_ERROR", 2),
        FolderError => ("FOLDER_ERROR", 3),
        ConflictError => ("CONFLICT_ERROR", 4),
        FileError => ("FILE_ERROR", 5),
        PrivilegesError => ("PRIVILEGES_ERROR", 6),
        Cancelled => ("CANCELLED", 7),
        FileNotFound => ("FILE_NOT_FOUND", 8),
        DelayedForWifi => ("DELAYED_FOR_WIFI", 9),
        ServiceInterrupted => ("SERVICE_INTERRUPTED", 10),
        DelayedForCharging => ("DELAYED_FOR_CHARGING", 11),
        MaintenanceMode => ("MAINTENANCE_MODE", 12),
        LockFailed => ("LOCK_FAILED", 13),
        DelayedInPowerSaveMode => ("DELAYED_IN_POWER_SAVE_MODE", 14),
        SslRecoverablePeerUnverified => ("SSL_RECOVERABLE_PEER_UNVERIFIED", 15),
        VirusDetected => ("VIRUS_DETECTED", 16),
        LocalStorageFull => ("LOCAL_STORAGE_FULL", 17),
        OldAndroidApi => ("OLD_ANDROID_API", 18),
        SyncConflict => ("SYNC_CONFLICT", 19),
        CannotCreateFile => ("CANNOT_CREATE_FILE", 20),
        LocalStorageNotCopied => ("LOCAL_STORAGE_NOT_COPIED", 21),
        QuotaExceeded => ("QUOTA_EXCEEDED", 22),
        SameFileConflict => ("SAME_FILE_CONFLICT", 23),
    }
}

pub(crate) fn lenient_status<'de, D>(deserializer: D) -> Result<UploadStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(parse_or_default(raw.as_deref(), UploadStatus::InProgress).into_inner())
}

pub(crate) fn lenient_result<'de, D>(deserializer: D) -> Result<UploadResult, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(parse_or_default(raw.as_deref(), UploadResult::Unknown).into_inner())
}
