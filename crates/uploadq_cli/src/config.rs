use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;
use uploadq_record::TransferPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub account: AccountSection,
    pub policy: TransferPolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountSection {
    pub default_name: Option<String>,
}

impl RuntimeConfig {
    /// A missing file means defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using default transfer policy");
            return Ok(Self::default());
        }

        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&source)
            .with_context(|| format!("invalid config TOML at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;
    use uploadq_record::{LocalAction, NameCollisionPolicy};

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RuntimeConfig::load(&dir.path().join("absent.toml")).expect("defaults");

        assert!(config.account.default_name.is_none());
        assert_eq!(config.policy, TransferPolicy::default());
    }

    #[test]
    fn reads_account_and_policy_sections() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[account]
default_name = "alice@cloud.example"

[policy]
use_wifi_only = false
name_collision_policy = "overwrite"
local_action = "forget"
"#
        )
        .expect("write config");

        let config = RuntimeConfig::load(file.path()).expect("load config");
        assert_eq!(
            config.account.default_name.as_deref(),
            Some("alice@cloud.example")
        );
        assert!(!config.policy.use_wifi_only);
        assert!(!config.policy.while_charging_only);
        assert_eq!(
            config.policy.name_collision_policy,
            NameCollisionPolicy::Overwrite
        );
        assert_eq!(config.policy.local_action, LocalAction::Forget);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "[policy]\nuse_wifi_only = \"sometimes\"").expect("write config");

        let err = RuntimeConfig::load(file.path()).expect_err("bad value");
        assert!(err.to_string().contains("invalid config TOML"));
    }
}
