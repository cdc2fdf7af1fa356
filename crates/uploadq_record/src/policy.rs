use serde::{Deserialize, Serialize};

/// Strategy applied when the remote destination already holds a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCollisionPolicy {
    Cancel,
    #[default]
    Rename,
    Overwrite,
    AskUser,
}

impl NameCollisionPolicy {
    pub fn code(self) -> i32 {
        match self {
            NameCollisionPolicy::Cancel => 0,
            NameCollisionPolicy::Rename => 1,
            NameCollisionPolicy::Overwrite => 2,
            NameCollisionPolicy::AskUser => 3,
        }
    }

    /// Unknown codes map to the default policy.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => NameCollisionPolicy::Cancel,
            1 => NameCollisionPolicy::Rename,
            2 => NameCollisionPolicy::Overwrite,
            3 => NameCollisionPolicy::AskUser,
            _ => NameCollisionPolicy::default(),
        }
    }
}

/// What happens to the local file once the upload finished. Codes outside
/// the known set are carried as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalAction {
    #[default]
    Copy,
    Move,
    Forget,
    Delete,
    Other(i32),
}

impl LocalAction {
    pub fn code(self) -> i32 {
        match self {
            LocalAction::Copy => 0,
            LocalAction::Move => 1,
            LocalAction::Forget => 2,
            LocalAction::Delete => 3,
            LocalAction::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => LocalAction::Copy,
            1 => LocalAction::Move,
            2 => LocalAction::Forget,
            3 => LocalAction::Delete,
            other => LocalAction::Other(other),
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, LocalAction::Other(_))
    }
}

/// Origin tag of an upload. Codes outside the known set are carried as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum CreatedBy {
    #[default]
    User,
    InstantPicture,
    InstantVideo,
    Other(i32),
}

impl CreatedBy {
    pub fn code(self) -> i32 {
        match self {
            CreatedBy::User => 0,
            CreatedBy::InstantPicture => 1,
            CreatedBy::InstantVideo => 2,
            CreatedBy::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => CreatedBy::User,
            1 => CreatedBy::InstantPicture,
            2 => CreatedBy::InstantVideo,
            other => CreatedBy::Other(other),
        }
    }

    pub fn is_automatic(self) -> bool {
        matches!(self, CreatedBy::InstantPicture | CreatedBy::InstantVideo)
    }
}

impl From<i32> for CreatedBy {
    fn from(code: i32) -> Self {
        CreatedBy::from_code(code)
    }
}

impl From<CreatedBy> for i32 {
    fn from(created_by: CreatedBy) -> Self {
        created_by.code()
    }
}

/// Transfer preferences a user picks before queueing uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferPolicy {
    pub use_wifi_only: bool,
    pub while_charging_only: bool,
    pub name_collision_policy: NameCollisionPolicy,
    pub local_action: LocalAction,
    pub create_remote_folder: bool,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            use_wifi_only: true,
            while_charging_only: false,
            name_collision_policy: NameCollisionPolicy::default(),
            local_action: LocalAction::default(),
            create_remote_folder: false,
        }
    }
}
