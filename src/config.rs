// Copyright (c) 2026 Aclinspect
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Inspector configuration.
//!
//! ```text
//! space_id = "bafyspace"
//! records_path = "acl.bin"
//! show_log = true
//! failure_policy = "skip-and-report"
//! owner_identity_hex = "01..."
//!
//! [logging]
//! level = "warn"
//! format = "compact"
//! ```
//!
//! Precedence: file, then `ACLINSPECT_*` environment variables, then command-line flags.

use crate::inspector::FailurePolicy;
use crate::monitoring::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Space id override.
pub const ENV_SPACE_ID: &str = "ACLINSPECT_SPACE_ID";
/// Records file override.
pub const ENV_RECORDS: &str = "ACLINSPECT_RECORDS";
/// Log level override.
pub const ENV_LOG_LEVEL: &str = "ACLINSPECT_LOG_LEVEL";

/// Config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("read config {}: {source}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// File is not valid TOML for this schema.
    #[error("parse config {}: {source}", path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: toml::de::Error,
    },
    /// Required field missing after all overrides.
    #[error("{0} not specified")]
    Missing(&'static str),
    /// Pinned owner is not hex.
    #[error("owner_identity_hex is not valid hex")]
    BadOwnerHex,
}

/// Inspector settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InspectConfig {
    /// Space whose ACL log is inspected.
    pub space_id: String,
    /// Record dump path.
    pub records_path: Option<PathBuf>,
    /// Print the per-record audit log before the summary.
    pub show_log: bool,
    /// Malformed-record handling for the audit log.
    pub failure_policy: FailurePolicy,
    /// Hex identity bytes the root must carry.
    pub owner_identity_hex: Option<String>,
    /// Logging settings.
    pub logging: LoggingConfig,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl InspectConfig {
    /// Parse a TOML document.
    pub fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Load from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&raw, path)
    }

    /// Apply `ACLINSPECT_*` overrides.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_nonempty(ENV_SPACE_ID) {
            self.space_id = v;
        }
        if let Some(v) = env_nonempty(ENV_RECORDS) {
            self.records_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env_nonempty(ENV_LOG_LEVEL) {
            self.logging.level = v;
        }
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.space_id.trim().is_empty() {
            return Err(ConfigError::Missing("space id"));
        }
        if self.records_path.is_none() {
            return Err(ConfigError::Missing("records file"));
        }
        self.owner_identity()?;
        Ok(())
    }

    /// Decoded pinned owner identity, if configured.
    pub fn owner_identity(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        self.owner_identity_hex
            .as_deref()
            .map(|h| hex::decode(h.trim()).map_err(|_| ConfigError::BadOwnerHex))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::logging::LogFormat;

    #[test]
    fn parses_full_document() {
        let raw = r#"
space_id = "bafyspace"
records_path = "acl.bin"
show_log = true
failure_policy = "skip-and-report"
owner_identity_hex = "0a0b"

[logging]
level = "debug"
format = "json"
"#;
        let cfg = InspectConfig::from_toml(raw, Path::new("x.toml")).unwrap();
        assert_eq!(cfg.space_id, "bafyspace");
        assert!(cfg.show_log);
        assert_eq!(cfg.failure_policy, FailurePolicy::SkipAndReport);
        assert_eq!(cfg.owner_identity().unwrap(), Some(vec![0x0a, 0x0b]));
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn defaults_and_validation() {
        let cfg = InspectConfig::from_toml("", Path::new("x.toml")).unwrap();
        assert_eq!(cfg.failure_policy, FailurePolicy::FailFast);
        assert_eq!(cfg.logging.level, "warn");
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("space id"))));

        let bad = InspectConfig {
            space_id: "s".into(),
            records_path: Some("r".into()),
            owner_identity_hex: Some("zz".into()),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::BadOwnerHex)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(InspectConfig::from_toml("spaceid = \"x\"", Path::new("x.toml")).is_err());
    }
}
