//! Panel configuration.
//!
//! Defaults match the host's action popover; a JSON file may override any
//! subset of fields.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, PanelResult};

/// Hosts whose pages are embedded with script-only sandboxing by default
pub const DEFAULT_ISOLATED_HOSTS: &[&str] = &["5esrd"];

/// Panel sizing and embedding options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    /// Panel height requested at mount.
    pub height: u32,
    /// Panel width requested at mount.
    pub width: u32,
    /// Height of embedded sheet frames.
    pub frame_height: u32,
    /// Width of embedded sheet frames.
    pub frame_width: u32,
    /// Maximum avatars shown in the tab strip.
    pub avatar_limit: usize,
    /// URL host fragments that get a restricted sandbox.
    pub isolated_hosts: Vec<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            height: 890,
            width: 470,
            frame_height: 800,
            frame_width: 450,
            avatar_limit: 20,
            isolated_hosts: DEFAULT_ISOLATED_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl PanelConfig {
    /// Load a config from a JSON file; missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> PanelResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| PanelError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| PanelError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set the panel size.
    pub fn with_panel_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the embedded frame size.
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    pub fn with_avatar_limit(mut self, limit: usize) -> Self {
        self.avatar_limit = limit;
        self
    }

    /// Add a host fragment that requires a restricted sandbox.
    pub fn with_isolated_host(mut self, host: impl Into<String>) -> Self {
        self.isolated_hosts.push(host.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PanelConfig::default();
        assert_eq!((config.width, config.height), (470, 890));
        assert_eq!((config.frame_width, config.frame_height), (450, 800));
        assert_eq!(config.avatar_limit, 20);
        assert_eq!(config.isolated_hosts, vec!["5esrd".to_string()]);
    }

    #[test]
    fn test_builder() {
        let config = PanelConfig::default()
            .with_panel_size(300, 600)
            .with_frame_size(280, 500)
            .with_avatar_limit(3)
            .with_isolated_host("dndbeyond");
        assert_eq!((config.width, config.height), (300, 600));
        assert_eq!((config.frame_width, config.frame_height), (280, 500));
        assert_eq!(config.avatar_limit, 3);
        assert_eq!(config.isolated_hosts, vec!["5esrd".to_string(), "dndbeyond".to_string()]);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "avatarLimit": 5, "isolatedHosts": [] }}"#).unwrap();

        let config = PanelConfig::from_file(file.path()).unwrap();
        assert_eq!(config.avatar_limit, 5);
        assert!(config.isolated_hosts.is_empty());
        assert_eq!(config.height, 890);
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = PanelConfig::from_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(PanelError::ConfigRead { .. })));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(PanelConfig::from_file(&bad), Err(PanelError::ConfigParse { .. })));
    }
}
