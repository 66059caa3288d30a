//! User configuration (config.yaml)
//!
//! Optional file overriding which program each entry point launches and the
//! default log filter. Looked up at `TSD_S3CMD_CONFIG` when set, otherwise
//! under the platform config directory (`~/.config/tsd-s3cmd/config.yaml`
//! on Linux).

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::error::config::{not_found, parse_failed, read_failed};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TSD_S3CMD_CONFIG";

/// Directory name under the user's config directory
const CONFIG_DIR: &str = "tsd-s3cmd";

const CONFIG_FILE: &str = "config.yaml";

/// Where the config file is expected and whether the user asked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    /// Named through `TSD_S3CMD_CONFIG`; a missing file is then an error
    pub explicit: bool,
}

impl ConfigLocation {
    /// Resolve from an explicit override or the platform config directory
    pub fn resolve(env_override: Option<OsString>) -> Option<Self> {
        if let Some(path) = env_override.filter(|value| !value.is_empty()) {
            return Some(Self {
                path: PathBuf::from(path),
                explicit: true,
            });
        }
        dirs::config_dir().map(|base| Self {
            path: base.join(CONFIG_DIR).join(CONFIG_FILE),
            explicit: false,
        })
    }

    /// Resolve using the current process environment
    pub fn from_env() -> Option<Self> {
        Self::resolve(std::env::var_os(CONFIG_ENV))
    }
}

/// Contents of config.yaml
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// Program overrides keyed by collaborator program name (`tacl`, `s3cmd`)
    #[serde(default)]
    pub programs: BTreeMap<String, String>,

    /// Default log filter when `TSD_S3CMD_LOG` is unset
    #[serde(default)]
    pub log: Option<String>,
}

impl UserConfig {
    /// Load the config file from its usual location, if any
    pub fn load() -> Result<Self> {
        match ConfigLocation::from_env() {
            Some(location) => Self::load_from(&location),
            None => Ok(Self::default()),
        }
    }

    /// Load from a resolved location
    pub fn load_from(location: &ConfigLocation) -> Result<Self> {
        let path = &location.path;
        if !path.exists() {
            if location.explicit {
                return Err(not_found(path.display().to_string()));
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| read_failed(path.display().to_string(), e.to_string()))?;
        Self::from_yaml(&content, path)
    }

    /// Parse config YAML; `path` only labels errors
    pub fn from_yaml(yaml: &str, path: &Path) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
            .map_err(|e| parse_failed(path.display().to_string(), e.to_string()))
    }

    /// Configured override for a collaborator program
    pub fn program(&self, name: &str) -> Option<&str> {
        self.programs
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TsdError;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let yaml = "programs:\n  tacl: /opt/tsd/bin/tacl\n  s3cmd: s3cmd-custom\nlog: debug\n";
        let config = UserConfig::from_yaml(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(config.program("tacl"), Some("/opt/tsd/bin/tacl"));
        assert_eq!(config.program("s3cmd"), Some("s3cmd-custom"));
        assert_eq!(config.log.as_deref(), Some("debug"));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = UserConfig::from_yaml("  \n", Path::new("config.yaml")).unwrap();
        assert_eq!(config, UserConfig::default());
    }

    #[test]
    fn test_blank_program_is_ignored() {
        let yaml = "programs:\n  s3cmd: ''\n";
        let config = UserConfig::from_yaml(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(config.program("s3cmd"), None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = UserConfig::from_yaml("endpoint: s3.example.org\n", Path::new("/etc/c.yaml"))
            .unwrap_err();
        assert!(matches!(err, TsdError::ConfigParseFailed { .. }));
        assert!(err.to_string().contains("/etc/c.yaml"));
    }

    #[test]
    fn test_explicit_location_wins() {
        let location = ConfigLocation::resolve(Some(OsString::from("/tmp/custom.yaml"))).unwrap();
        assert_eq!(location.path, PathBuf::from("/tmp/custom.yaml"));
        assert!(location.explicit);
    }

    #[test]
    fn test_empty_override_falls_back_to_default_location() {
        if let Some(location) = ConfigLocation::resolve(Some(OsString::new())) {
            assert!(!location.explicit);
            assert!(location.path.ends_with("tsd-s3cmd/config.yaml"));
        }
    }

    #[test]
    fn test_missing_default_file_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let location = ConfigLocation {
            path: temp.path().join("config.yaml"),
            explicit: false,
        };
        assert_eq!(
            UserConfig::load_from(&location).unwrap(),
            UserConfig::default()
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let location = ConfigLocation {
            path: temp.path().join("absent.yaml"),
            explicit: true,
        };
        let err = UserConfig::load_from(&location).unwrap_err();
        assert!(matches!(err, TsdError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "programs:\n  s3cmd: /usr/local/bin/s3cmd\n").unwrap();
        let config = UserConfig::load_from(&ConfigLocation {
            path,
            explicit: true,
        })
        .unwrap();
        assert_eq!(config.program("s3cmd"), Some("/usr/local/bin/s3cmd"));
    }
}
