//! PEP 440 versions
//!
//! Parses release versions such as `3.4.3`, `1.0rc1`, `2!1.0.post2.dev3+local.7`
//! into a [`Version`] with the total ordering PEP 440 defines. Trailing zero
//! release segments are insignificant, so `1.4` and `1.4.0` compare equal.

pub mod specifier;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::version::invalid_version;
use crate::error::{Result, TsdError};

pub use specifier::{Operator, Specifier, SpecifierSet};

/// Pre-release phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
    Alpha,
    Beta,
    ReleaseCandidate,
}

impl PreKind {
    fn as_str(self) -> &'static str {
        match self {
            PreKind::Alpha => "a",
            PreKind::Beta => "b",
            PreKind::ReleaseCandidate => "rc",
        }
    }
}

/// One dot-separated piece of a local version label
///
/// Alphanumeric segments sort before numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalSegment {
    Text(String),
    Number(u64),
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalSegment::Text(text) => write!(f, "{text}"),
            LocalSegment::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A parsed PEP 440 version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreKind, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

// Sort position of the pre-release part. A dev release without a pre or
// post part sorts before every pre-release of the same release.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum PreKey {
    DevOnly,
    Pre(PreKind, u64),
    Final,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum DevKey {
    Dev(u64),
    None,
}

impl Version {
    /// Create a final release from its release segments
    pub fn from_release(release: impl Into<Vec<u64>>) -> Self {
        Self {
            epoch: 0,
            release: release.into(),
            pre: None,
            post: None,
            dev: None,
            local: Vec::new(),
        }
    }

    /// Parse a version string
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn pre(&self) -> Option<(PreKind, u64)> {
        self.pre
    }

    pub fn post(&self) -> Option<u64> {
        self.post
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    pub fn local(&self) -> &[LocalSegment] {
        &self.local
    }

    /// True for pre-releases and development releases
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    /// The version without its local label
    pub fn public(&self) -> Self {
        Self {
            local: Vec::new(),
            ..self.clone()
        }
    }

    /// Epoch and release segments only
    pub fn base(&self) -> Self {
        Self {
            epoch: self.epoch,
            ..Self::from_release(self.release.clone())
        }
    }

    /// Release segments with trailing zeros removed
    fn significant_release(&self) -> &[u64] {
        let len = self
            .release
            .iter()
            .rposition(|&segment| segment != 0)
            .map_or(0, |pos| pos + 1);
        &self.release[..len]
    }

    fn pre_key(&self) -> PreKey {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PreKey::DevOnly,
            (Some((kind, n)), _, _) => PreKey::Pre(kind, n),
            (None, _, _) => PreKey::Final,
        }
    }

    fn dev_key(&self) -> DevKey {
        self.dev.map_or(DevKey::None, DevKey::Dev)
    }

    #[allow(clippy::type_complexity)]
    fn sort_key(&self) -> (u64, &[u64], PreKey, Option<u64>, DevKey, &[LocalSegment]) {
        (
            self.epoch,
            self.significant_release(),
            self.pre_key(),
            self.post,
            self.dev_key(),
            &self.local,
        )
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((kind, n)) = self.pre {
            write!(f, "{}{n}", kind.as_str())?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if !self.local.is_empty() {
            let local: Vec<String> = self.local.iter().map(ToString::to_string).collect();
            write!(f, "+{}", local.join("."))?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = TsdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = TsdError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

const PRE_SPELLINGS: &[(&str, PreKind)] = &[
    ("alpha", PreKind::Alpha),
    ("a", PreKind::Alpha),
    ("beta", PreKind::Beta),
    ("b", PreKind::Beta),
    ("preview", PreKind::ReleaseCandidate),
    ("pre", PreKind::ReleaseCandidate),
    ("rc", PreKind::ReleaseCandidate),
    ("c", PreKind::ReleaseCandidate),
];

const POST_SPELLINGS: &[&str] = &["post", "rev", "r"];

fn is_separator(c: u8) -> bool {
    matches!(c, b'.' | b'-' | b'_')
}

/// Hand-written scanner over the lowercased input
struct Parser {
    original: String,
    text: Vec<u8>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        let trimmed = input.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let text = lowered.strip_prefix('v').unwrap_or(&lowered).as_bytes().to_vec();
        Self {
            original: input.to_string(),
            text,
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> TsdError {
        invalid_version(self.original.clone(), reason)
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.text[self.pos..].starts_with(keyword.as_bytes()) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn eat_separator(&mut self) -> bool {
        match self.peek() {
            Some(c) if is_separator(c) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn number(&mut self) -> Result<Option<u64>> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        let digits = std::str::from_utf8(&self.text[start..self.pos])
            .map_err(|e| self.error(e.to_string()))?;
        digits
            .parse::<u64>()
            .map(Some)
            .map_err(|_| self.error(format!("number '{digits}' is too large")))
    }

    /// Optional separator followed by an optional number; defaults to zero
    fn implicit_number(&mut self) -> Result<u64> {
        let checkpoint = self.pos;
        let had_separator = self.eat_separator();
        match self.number()? {
            Some(n) => Ok(n),
            None => {
                if had_separator {
                    self.pos = checkpoint;
                }
                Ok(0)
            }
        }
    }

    fn parse(mut self) -> Result<Version> {
        if self.text.is_empty() {
            return Err(self.error("version is empty"));
        }

        let first = self
            .number()?
            .ok_or_else(|| self.error("expected a release number"))?;
        let mut epoch = 0;
        let mut release = vec![first];
        if self.peek() == Some(b'!') {
            self.pos += 1;
            epoch = first;
            release = vec![
                self.number()?
                    .ok_or_else(|| self.error("expected a release number after the epoch"))?,
            ];
        }
        while self.peek() == Some(b'.') {
            let checkpoint = self.pos;
            self.pos += 1;
            match self.number()? {
                Some(n) => release.push(n),
                None => {
                    self.pos = checkpoint;
                    break;
                }
            }
        }

        let pre = self.pre_release()?;
        let post = self.post_release()?;
        let dev = self.dev_release()?;
        let local = self.local_label()?;

        if !self.at_end() {
            let rest = String::from_utf8_lossy(&self.text[self.pos..]).into_owned();
            return Err(self.error(format!("unexpected trailing text '{rest}'")));
        }

        Ok(Version {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    fn pre_release(&mut self) -> Result<Option<(PreKind, u64)>> {
        let checkpoint = self.pos;
        self.eat_separator();
        for (spelling, kind) in PRE_SPELLINGS {
            if self.eat_keyword(spelling) {
                let n = self.implicit_number()?;
                return Ok(Some((*kind, n)));
            }
        }
        self.pos = checkpoint;
        Ok(None)
    }

    fn post_release(&mut self) -> Result<Option<u64>> {
        let checkpoint = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
            if let Some(n) = self.number()? {
                return Ok(Some(n));
            }
            self.pos = checkpoint;
        }
        self.eat_separator();
        for spelling in POST_SPELLINGS {
            if self.eat_keyword(spelling) {
                return self.implicit_number().map(Some);
            }
        }
        self.pos = checkpoint;
        Ok(None)
    }

    fn dev_release(&mut self) -> Result<Option<u64>> {
        let checkpoint = self.pos;
        self.eat_separator();
        if self.eat_keyword("dev") {
            return self.implicit_number().map(Some);
        }
        self.pos = checkpoint;
        Ok(None)
    }

    fn local_label(&mut self) -> Result<Vec<LocalSegment>> {
        if self.peek() != Some(b'+') {
            return Ok(Vec::new());
        }
        self.pos += 1;
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || is_separator(c))
        {
            self.pos += 1;
        }
        let label = String::from_utf8_lossy(&self.text[start..self.pos]).into_owned();
        let mut segments = Vec::new();
        for part in label.split(['.', '-', '_']) {
            if part.is_empty() {
                return Err(self.error("empty segment in local version label"));
            }
            let segment = match part.parse::<u64>() {
                Ok(n) if part.bytes().all(|c| c.is_ascii_digit()) => LocalSegment::Number(n),
                _ => LocalSegment::Text(part.to_string()),
            };
            segments.push(segment);
        }
        Ok(segments)
    }
}
