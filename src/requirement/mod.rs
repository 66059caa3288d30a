//! Dependency requirements
//!
//! A requirement names a distribution, optional extras, either a version
//! specifier set or a direct URL, and an optional environment marker:
//!
//! ```text
//! tsd-api-client>=3.4.3
//! importlib-metadata>=1.4;python_version<"3.8"
//! s3cmd @ https://github.com/unioslo/s3cmd/archive/v2.1.0-custom-headers.tar.gz#egg=s3cmd-2.1.0-custom-headers
//! ```

pub mod marker;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::version::invalid_requirement;
use crate::error::{Result, TsdError};
use crate::version::{SpecifierSet, Version};

pub use marker::{MarkerEnvironment, MarkerTree};

/// Normalize a distribution name: lowercase, runs of `-`, `_`, `.` become `-`
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
            }
            in_separator = true;
        } else {
            normalized.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    normalized
}

fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    !bytes.is_empty()
        && bytes[0].is_ascii_alphanumeric()
        && bytes[bytes.len() - 1].is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b'.'))
}

/// `#egg=<name>-<tag>` fragment of a direct URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EggFragment {
    pub name: String,
    /// Everything after the name, kept verbatim (e.g. `2.1.0-custom-headers`)
    pub tag: Option<String>,
}

impl EggFragment {
    /// Split `value` into the distribution `name` and whatever follows it
    ///
    /// The name may itself contain `-<digit>` (`py-3to2-1.0`), so the split
    /// point is the first `-` (or the end) whose prefix normalizes to `name`.
    fn parse(value: &str, name: &str) -> std::result::Result<Self, String> {
        let wanted = normalize_name(name);
        value
            .char_indices()
            .filter(|&(_, c)| c == '-')
            .map(|(i, _)| i)
            .chain(std::iter::once(value.len()))
            .find(|&i| normalize_name(&value[..i]) == wanted)
            .map(|i| Self {
                name: value[..i].to_string(),
                tag: value.get(i + 1..).filter(|tag| !tag.is_empty()).map(str::to_string),
            })
            .ok_or_else(|| format!("egg fragment '{value}' does not name '{name}'"))
    }
}

/// A dependency pinned to an artifact URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectUrl {
    /// URL without its fragment
    pub url: String,
    pub egg: Option<EggFragment>,
    raw: String,
}

impl DirectUrl {
    fn parse(raw: &str, name: &str) -> std::result::Result<Self, String> {
        if !raw.contains("://") {
            return Err(format!("'{raw}' is not a URL"));
        }
        let (url, fragment) = match raw.split_once('#') {
            Some((url, fragment)) => (url, Some(fragment)),
            None => (raw, None),
        };
        let egg = fragment
            .and_then(|fragment| {
                fragment
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("egg="))
            })
            .map(|value| EggFragment::parse(value, name))
            .transpose()?;
        Ok(Self {
            url: url.to_string(),
            egg,
            raw: raw.to_string(),
        })
    }

    /// The URL exactly as written, fragment included
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Where a requirement may be satisfied from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementSource {
    /// Any version admitted by the specifier set
    Registry(SpecifierSet),
    /// Exactly the artifact at this URL
    Url(DirectUrl),
}

/// A parsed dependency requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    pub source: RequirementSource,
    pub marker: Option<MarkerTree>,
}

impl Requirement {
    /// Parse a requirement string
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        let name_end = text
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(text.len());
        let name = &text[..name_end];
        if !is_valid_name(name) {
            return Err(invalid_requirement(input, "missing or invalid distribution name"));
        }

        let mut rest = text[name_end..].trim_start();
        let mut extras = Vec::new();
        if let Some(after_bracket) = rest.strip_prefix('[') {
            let (inside, after) = after_bracket
                .split_once(']')
                .ok_or_else(|| invalid_requirement(input, "unclosed extras bracket"))?;
            for extra in inside.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                if !is_valid_name(extra) {
                    return Err(invalid_requirement(input, format!("invalid extra '{extra}'")));
                }
                extras.push(extra.to_string());
            }
            rest = after.trim_start();
        }

        let (source, marker_text) = if let Some(after_at) = rest.strip_prefix('@') {
            let after_at = after_at.trim_start();
            let url_end = after_at
                .find(char::is_whitespace)
                .unwrap_or(after_at.len());
            let url = DirectUrl::parse(&after_at[..url_end], name)
                .map_err(|reason| invalid_requirement(input, reason))?;
            let tail = after_at[url_end..].trim();
            let marker_text = match tail.strip_prefix(';') {
                Some(marker) => Some(marker),
                None if tail.is_empty() => None,
                None => {
                    return Err(invalid_requirement(
                        input,
                        format!("unexpected text after URL: '{tail}'"),
                    ));
                }
            };
            (RequirementSource::Url(url), marker_text)
        } else {
            let (spec_text, marker_text) = match rest.split_once(';') {
                Some((spec, marker)) => (spec, Some(marker)),
                None => (rest, None),
            };
            let spec_text = spec_text.trim();
            let spec_text = spec_text
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .unwrap_or(spec_text);
            let specifiers = SpecifierSet::parse(spec_text)
                .map_err(|e| invalid_requirement(input, e.to_string()))?;
            (RequirementSource::Registry(specifiers), marker_text)
        };

        let marker = marker_text
            .map(|text| MarkerTree::parse(text.trim()))
            .transpose()
            .map_err(|e| invalid_requirement(input, e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            extras,
            source,
            marker,
        })
    }

    /// Name in its normalized, comparable form
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// True when the requirement applies to the target environment
    pub fn applies_to(&self, env: &MarkerEnvironment) -> bool {
        self.marker.as_ref().is_none_or(|marker| marker.evaluate(env))
    }

    /// True when the version is acceptable; URL pins accept any version
    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        match &self.source {
            RequirementSource::Registry(specifiers) => specifiers.contains(version),
            RequirementSource::Url(_) => true,
        }
    }

    pub fn direct_url(&self) -> Option<&DirectUrl> {
        match &self.source {
            RequirementSource::Url(url) => Some(url),
            RequirementSource::Registry(_) => None,
        }
    }

    pub fn specifiers(&self) -> Option<&SpecifierSet> {
        match &self.source {
            RequirementSource::Registry(specifiers) => Some(specifiers),
            RequirementSource::Url(_) => None,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        match &self.source {
            RequirementSource::Registry(specifiers) => write!(f, "{specifiers}")?,
            RequirementSource::Url(url) => {
                write!(f, " @ {}", url.as_str())?;
                if self.marker.is_some() {
                    f.write_str(" ")?;
                }
            }
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

impl FromStr for Requirement {
    type Err = TsdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Requirement {
    type Error = TsdError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Requirement> for String {
    fn from(requirement: Requirement) -> Self {
        requirement.to_string()
    }
}

#[cfg(test)]
mod tests;
