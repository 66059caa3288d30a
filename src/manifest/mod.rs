//! Package manifest of the wrapper distribution
//!
//! The manifest records what the package installer consumes: name, version,
//! contact metadata, installed scripts, dependency requirements and the
//! supported runtime. The release history is embedded at build time from
//! `releases.yaml`; the last entry describes the running build.

pub mod install;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::manifest::{history_invalid, invalid};
use crate::error::Result;
use crate::requirement::{Requirement, normalize_name};
use crate::version::{SpecifierSet, Version};

const EMBEDDED_RELEASES: &str = include_str!("releases.yaml");

/// An installed entry point and the collaborator program behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Command name placed on the path
    pub name: String,

    /// Location of the script inside the source distribution
    pub path: String,

    /// Program the script forwards to
    pub program: String,

    /// Requirement that installs `program`
    pub provided_by: String,
}

/// Packaging metadata for one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageManifest {
    pub name: String,

    pub version: Version,

    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub scripts: Vec<Script>,

    /// Ordered dependency requirements
    #[serde(default)]
    pub install_requires: Vec<Requirement>,

    /// Supported runtime versions
    #[serde(default)]
    pub python_requires: SpecifierSet,
}

impl PackageManifest {
    /// Manifest of the running build
    pub fn current() -> Result<Self> {
        let history = ReleaseHistory::embedded()?;
        history
            .latest()
            .cloned()
            .ok_or_else(|| history_invalid("no releases recorded"))
    }

    /// Parse and validate a manifest from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate manifest
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(invalid("package name cannot be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(invalid(format!(
                "package '{}' has no description",
                self.name
            )));
        }
        if self.scripts.is_empty() {
            return Err(invalid(format!("package '{}' installs no scripts", self.name)));
        }

        let mut requirement_names = HashSet::new();
        for requirement in &self.install_requires {
            if !requirement_names.insert(requirement.normalized_name()) {
                return Err(invalid(format!(
                    "requirement '{}' is declared more than once",
                    requirement.name
                )));
            }
        }

        let mut script_names = HashSet::new();
        for script in &self.scripts {
            if script.name.trim().is_empty() || script.program.trim().is_empty() {
                return Err(invalid("script name and program cannot be empty"));
            }
            if !script_names.insert(script.name.as_str()) {
                return Err(invalid(format!(
                    "script '{}' is declared more than once",
                    script.name
                )));
            }
            if !requirement_names.contains(&normalize_name(&script.provided_by)) {
                return Err(invalid(format!(
                    "script '{}' is provided by '{}', which is not a declared requirement",
                    script.name, script.provided_by
                )));
            }
        }

        Ok(())
    }

    /// Look up an installed script by command name
    pub fn script(&self, name: &str) -> Option<&Script> {
        self.scripts.iter().find(|script| script.name == name)
    }

    /// Look up a requirement by distribution name
    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        let wanted = normalize_name(name);
        self.install_requires
            .iter()
            .find(|requirement| requirement.normalized_name() == wanted)
    }

    pub fn script_names(&self) -> Vec<&str> {
        self.scripts.iter().map(|script| script.name.as_str()).collect()
    }
}

/// Every published release of the distribution, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseHistory {
    pub releases: Vec<PackageManifest>,
}

impl ReleaseHistory {
    /// The history compiled into this binary
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_RELEASES)
    }

    /// Parse and validate a release history from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let history: Self = serde_yaml::from_str(yaml)?;
        history.validate()?;
        Ok(history)
    }

    pub fn latest(&self) -> Option<&PackageManifest> {
        self.releases.last()
    }

    pub fn find(&self, version: &Version) -> Option<&PackageManifest> {
        self.releases.iter().find(|release| &release.version == version)
    }

    /// Check every release and the invariants that hold across releases
    ///
    /// Versions strictly increase, and the package name and the set of
    /// script names never change.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.releases.first() else {
            return Err(history_invalid("no releases recorded"));
        };

        for release in &self.releases {
            release.validate()?;
        }

        let mut first_scripts = first.script_names();
        first_scripts.sort_unstable();

        for pair in self.releases.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if next.version <= previous.version {
                return Err(history_invalid(format!(
                    "version {} does not follow {}",
                    next.version, previous.version
                )));
            }
            if normalize_name(&next.name) != normalize_name(&first.name) {
                return Err(history_invalid(format!(
                    "release {} renames the package from '{}' to '{}'",
                    next.version, first.name, next.name
                )));
            }
            let mut scripts = next.script_names();
            scripts.sort_unstable();
            if scripts != first_scripts {
                return Err(history_invalid(format!(
                    "release {} installs scripts [{}] instead of [{}]",
                    next.version,
                    scripts.join(", "),
                    first_scripts.join(", ")
                )));
            }
        }

        Ok(())
    }
}
