//! Version specifiers (`>=3.4.3`, `==1.*`, `~=2.1`) and comma-separated sets of them

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Version;
use crate::error::version::invalid_specifier;
use crate::error::{Result, TsdError};

/// Comparison operator of a specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Compatible,
    ArbitraryEqual,
}

impl Operator {
    // Longest spellings first so "===" is not read as "==".
    const SPELLINGS: &'static [(&'static str, Operator)] = &[
        ("===", Operator::ArbitraryEqual),
        ("~=", Operator::Compatible),
        ("==", Operator::Equal),
        ("!=", Operator::NotEqual),
        ("<=", Operator::LessThanEqual),
        (">=", Operator::GreaterThanEqual),
        ("<", Operator::LessThan),
        (">", Operator::GreaterThan),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEqual => ">=",
            Operator::Compatible => "~=",
            Operator::ArbitraryEqual => "===",
        }
    }

    /// Split a leading operator off `input`
    pub fn split_prefix(input: &str) -> Option<(Operator, &str)> {
        Self::SPELLINGS
            .iter()
            .find(|(spelling, _)| input.starts_with(spelling))
            .map(|(spelling, op)| (*op, &input[spelling.len()..]))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single version specifier such as `>=3.4.3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    operator: Operator,
    text: String,
    version: Option<Version>,
    wildcard: bool,
}

impl Specifier {
    /// Parse one specifier
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (operator, rest) = Operator::split_prefix(trimmed)
            .ok_or_else(|| invalid_specifier(input, "missing comparison operator"))?;
        let text = rest.trim().to_string();
        if text.is_empty() {
            return Err(invalid_specifier(input, "missing version"));
        }

        if operator == Operator::ArbitraryEqual {
            if text.contains(char::is_whitespace) {
                return Err(invalid_specifier(input, "arbitrary version contains whitespace"));
            }
            return Ok(Self {
                operator,
                text,
                version: None,
                wildcard: false,
            });
        }

        let (version_text, wildcard) = match text.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (text.as_str(), false),
        };
        if wildcard && !matches!(operator, Operator::Equal | Operator::NotEqual) {
            return Err(invalid_specifier(
                input,
                format!("wildcard is not allowed with '{operator}'"),
            ));
        }

        let version =
            Version::parse(version_text).map_err(|e| invalid_specifier(input, e.to_string()))?;

        if wildcard
            && (version.pre.is_some()
                || version.post.is_some()
                || version.dev.is_some()
                || !version.local.is_empty())
        {
            return Err(invalid_specifier(
                input,
                "wildcard prefix must be a plain release",
            ));
        }
        if !version.local.is_empty() && !matches!(operator, Operator::Equal | Operator::NotEqual)
        {
            return Err(invalid_specifier(
                input,
                format!("local version label is not allowed with '{operator}'"),
            ));
        }
        if operator == Operator::Compatible && version.release.len() < 2 {
            return Err(invalid_specifier(
                input,
                "'~=' needs at least two release segments",
            ));
        }

        Ok(Self {
            operator,
            text,
            version: Some(version),
            wildcard,
        })
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The version text as written after the operator
    pub fn version_text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// True when the specifier opts into pre-releases by naming one
    ///
    /// An exclusion (`!=`) never opts in.
    pub fn names_prerelease(&self) -> bool {
        self.operator != Operator::NotEqual
            && self.version.as_ref().is_some_and(Version::is_prerelease)
    }

    /// Check a candidate against this specifier alone, ignoring pre-release policy
    pub fn contains(&self, candidate: &Version) -> bool {
        let Some(spec) = &self.version else {
            return candidate.to_string().eq_ignore_ascii_case(&self.text);
        };

        match self.operator {
            Operator::Equal if self.wildcard => prefix_matches(spec, candidate),
            Operator::NotEqual if self.wildcard => !prefix_matches(spec, candidate),
            Operator::Equal => exact_matches(spec, candidate),
            Operator::NotEqual => !exact_matches(spec, candidate),
            Operator::LessThanEqual => candidate.public() <= *spec,
            Operator::GreaterThanEqual => candidate.public() >= *spec,
            Operator::LessThan => {
                candidate < spec
                    && !(!spec.is_prerelease()
                        && candidate.is_prerelease()
                        && candidate.base() == spec.base())
            }
            Operator::GreaterThan => {
                let same_base = candidate.base() == spec.base();
                candidate > spec
                    && !(!spec.is_postrelease() && candidate.is_postrelease() && same_base)
                    && !(!candidate.local.is_empty() && same_base)
            }
            Operator::Compatible => {
                let prefix_len = spec.release.len() - 1;
                let prefix = Version {
                    epoch: spec.epoch,
                    ..Version::from_release(spec.release[..prefix_len].to_vec())
                };
                candidate.public() >= *spec && prefix_matches(&prefix, candidate)
            }
            Operator::ArbitraryEqual => candidate.to_string().eq_ignore_ascii_case(&self.text),
        }
    }
}

/// `==X.Y.*` matching: same epoch and candidate release starts with the prefix
fn prefix_matches(prefix: &Version, candidate: &Version) -> bool {
    if prefix.epoch != candidate.epoch {
        return false;
    }
    prefix
        .release
        .iter()
        .enumerate()
        .all(|(i, segment)| candidate.release.get(i).copied().unwrap_or(0) == *segment)
}

fn exact_matches(spec: &Version, candidate: &Version) -> bool {
    if spec.local.is_empty() {
        candidate.public() == *spec
    } else {
        candidate == spec
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.text)
    }
}

impl FromStr for Specifier {
    type Err = TsdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Conjunction of specifiers, written comma-separated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
}

impl SpecifierSet {
    /// Parse a comma-separated list; blank input is the empty set
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let specifiers = input
            .split(',')
            .map(|part| {
                if part.trim().is_empty() {
                    Err(invalid_specifier(input, "empty specifier between commas"))
                } else {
                    Specifier::parse(part)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { specifiers })
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }

    /// Check a candidate, admitting pre-releases only when a specifier names one
    pub fn contains(&self, candidate: &Version) -> bool {
        let prereleases = self.specifiers.iter().any(Specifier::names_prerelease);
        self.allows(candidate, prereleases)
    }

    /// Check a candidate with an explicit pre-release policy
    pub fn allows(&self, candidate: &Version, include_prereleases: bool) -> bool {
        if candidate.is_prerelease() && !include_prereleases {
            return false;
        }
        self.specifiers.iter().all(|spec| spec.contains(candidate))
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.specifiers.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

impl FromStr for SpecifierSet {
    type Err = TsdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SpecifierSet {
    type Error = TsdError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SpecifierSet> for String {
    fn from(set: SpecifierSet) -> Self {
        set.to_string()
    }
}
