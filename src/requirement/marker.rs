//! Environment markers
//!
//! A marker such as `python_version < "3.8"` decides whether a requirement
//! applies to a target runtime. Markers combine comparisons with `and`, `or`
//! and parentheses; `and` binds tighter than `or`.

use std::fmt;

use crate::error::Result;
use crate::error::version::invalid_marker;
use crate::version::{Operator, Specifier, Version};

/// Variables a marker may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerVariable {
    PythonVersion,
    PythonFullVersion,
    OsName,
    SysPlatform,
    PlatformSystem,
    PlatformMachine,
    PlatformRelease,
    ImplementationName,
    ImplementationVersion,
    Extra,
}

impl MarkerVariable {
    const ALL: &'static [MarkerVariable] = &[
        MarkerVariable::PythonVersion,
        MarkerVariable::PythonFullVersion,
        MarkerVariable::OsName,
        MarkerVariable::SysPlatform,
        MarkerVariable::PlatformSystem,
        MarkerVariable::PlatformMachine,
        MarkerVariable::PlatformRelease,
        MarkerVariable::ImplementationName,
        MarkerVariable::ImplementationVersion,
        MarkerVariable::Extra,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MarkerVariable::PythonVersion => "python_version",
            MarkerVariable::PythonFullVersion => "python_full_version",
            MarkerVariable::OsName => "os_name",
            MarkerVariable::SysPlatform => "sys_platform",
            MarkerVariable::PlatformSystem => "platform_system",
            MarkerVariable::PlatformMachine => "platform_machine",
            MarkerVariable::PlatformRelease => "platform_release",
            MarkerVariable::ImplementationName => "implementation_name",
            MarkerVariable::ImplementationVersion => "implementation_version",
            MarkerVariable::Extra => "extra",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|var| var.as_str() == name)
    }
}

/// Description of the runtime a requirement is evaluated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerEnvironment {
    pub python_version: String,
    pub python_full_version: String,
    pub os_name: String,
    pub sys_platform: String,
    pub platform_system: String,
    pub platform_machine: String,
    pub platform_release: String,
    pub implementation_name: String,
    pub implementation_version: String,
    pub extra: Option<String>,
}

impl MarkerEnvironment {
    /// Host platform values with the given runtime version
    ///
    /// `python_version` is derived from the first two release segments.
    pub fn python(full_version: &str) -> Self {
        let python_version = Version::parse(full_version)
            .ok()
            .filter(|v| v.release().len() >= 2)
            .map_or_else(
                || full_version.to_string(),
                |v| format!("{}.{}", v.release()[0], v.release()[1]),
            );
        let (os_name, sys_platform, platform_system) = host_platform();
        Self {
            python_version,
            python_full_version: full_version.to_string(),
            os_name: os_name.to_string(),
            sys_platform: sys_platform.to_string(),
            platform_system: platform_system.to_string(),
            platform_machine: std::env::consts::ARCH.to_string(),
            platform_release: String::new(),
            implementation_name: "cpython".to_string(),
            implementation_version: full_version.to_string(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    pub fn get(&self, variable: MarkerVariable) -> &str {
        match variable {
            MarkerVariable::PythonVersion => &self.python_version,
            MarkerVariable::PythonFullVersion => &self.python_full_version,
            MarkerVariable::OsName => &self.os_name,
            MarkerVariable::SysPlatform => &self.sys_platform,
            MarkerVariable::PlatformSystem => &self.platform_system,
            MarkerVariable::PlatformMachine => &self.platform_machine,
            MarkerVariable::PlatformRelease => &self.platform_release,
            MarkerVariable::ImplementationName => &self.implementation_name,
            MarkerVariable::ImplementationVersion => &self.implementation_version,
            MarkerVariable::Extra => self.extra.as_deref().unwrap_or(""),
        }
    }
}

fn host_platform() -> (&'static str, &'static str, &'static str) {
    match std::env::consts::OS {
        "windows" => ("nt", "win32", "Windows"),
        "macos" => ("posix", "darwin", "Darwin"),
        "linux" => ("posix", "linux", "Linux"),
        other => ("posix", other, other),
    }
}

/// Comparison operator inside a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOperator {
    Compare(Operator),
    In,
    NotIn,
}

impl fmt::Display for MarkerOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerOperator::Compare(op) => write!(f, "{op}"),
            MarkerOperator::In => f.write_str("in"),
            MarkerOperator::NotIn => f.write_str("not in"),
        }
    }
}

/// Operand of a marker comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerValue {
    Variable(MarkerVariable),
    Literal(String),
}

impl MarkerValue {
    fn resolve<'a>(&'a self, env: &'a MarkerEnvironment) -> &'a str {
        match self {
            MarkerValue::Variable(var) => env.get(*var),
            MarkerValue::Literal(text) => text,
        }
    }
}

impl fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerValue::Variable(var) => f.write_str(var.as_str()),
            MarkerValue::Literal(text) if text.contains('"') => write!(f, "'{text}'"),
            MarkerValue::Literal(text) => write!(f, "\"{text}\""),
        }
    }
}

/// Parsed marker expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerTree {
    Compare {
        lhs: MarkerValue,
        op: MarkerOperator,
        rhs: MarkerValue,
    },
    And(Vec<MarkerTree>),
    Or(Vec<MarkerTree>),
}

impl MarkerTree {
    /// Parse a marker expression
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        let mut parser = MarkerParser {
            input,
            tokens,
            pos: 0,
        };
        let tree = parser.or_expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(invalid_marker(input, "unexpected trailing tokens"));
        }
        Ok(tree)
    }

    /// Evaluate against a target environment
    ///
    /// Comparisons undefined for the operands (e.g. `~=` on non-versions) are false.
    pub fn evaluate(&self, env: &MarkerEnvironment) -> bool {
        match self {
            MarkerTree::And(items) => items.iter().all(|item| item.evaluate(env)),
            MarkerTree::Or(items) => items.iter().any(|item| item.evaluate(env)),
            MarkerTree::Compare { lhs, op, rhs } => {
                compare(lhs.resolve(env), *op, rhs.resolve(env))
            }
        }
    }
}

fn compare(lhs: &str, op: MarkerOperator, rhs: &str) -> bool {
    let op = match op {
        MarkerOperator::In => return rhs.contains(lhs),
        MarkerOperator::NotIn => return !rhs.contains(lhs),
        MarkerOperator::Compare(op) => op,
    };

    if let (Ok(spec), Ok(version)) = (
        Specifier::parse(&format!("{op}{rhs}")),
        Version::parse(lhs),
    ) {
        return spec.contains(&version);
    }

    match op {
        Operator::Equal | Operator::ArbitraryEqual => lhs == rhs,
        Operator::NotEqual => lhs != rhs,
        Operator::LessThan => lhs < rhs,
        Operator::LessThanEqual => lhs <= rhs,
        Operator::GreaterThan => lhs > rhs,
        Operator::GreaterThanEqual => lhs >= rhs,
        Operator::Compatible => false,
    }
}

impl fmt::Display for MarkerTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerTree::Compare { lhs, op, rhs } => write!(f, "{lhs} {op} {rhs}"),
            MarkerTree::And(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        MarkerTree::Or(_) => format!("({item})"),
                        _ => item.to_string(),
                    })
                    .collect();
                f.write_str(&parts.join(" and "))
            }
            MarkerTree::Or(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(" or "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Op(MarkerOperator),
    Ident(String),
    Str(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '"' | '\'' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| invalid_marker(input, "unterminated string"))?;
                tokens.push(Token::Str(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            '<' | '>' | '=' | '!' | '~' => {
                let rest: String = chars[i..].iter().collect();
                let (op, remaining) = Operator::split_prefix(&rest)
                    .ok_or_else(|| invalid_marker(input, format!("unknown operator at '{rest}'")))?;
                tokens.push(Token::Op(MarkerOperator::Compare(op)));
                i += rest.chars().count() - remaining.chars().count();
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    "in" => tokens.push(Token::Op(MarkerOperator::In)),
                    "not" => {
                        if tokens.last() == Some(&Token::Op(MarkerOperator::In)) {
                            return Err(invalid_marker(input, "'in not' is not an operator"));
                        }
                        tokens.push(Token::Op(MarkerOperator::NotIn));
                        let next_word_start = chars[i..]
                            .iter()
                            .position(|ch| !ch.is_whitespace())
                            .map(|offset| i + offset);
                        match next_word_start {
                            Some(pos) if chars[pos..].starts_with(&['i', 'n']) => i = pos + 2,
                            _ => return Err(invalid_marker(input, "expected 'in' after 'not'")),
                        }
                    }
                    _ => tokens.push(Token::Ident(word)),
                }
            }
            other => {
                return Err(invalid_marker(
                    input,
                    format!("unexpected character '{other}'"),
                ));
            }
        }
    }

    Ok(tokens)
}

struct MarkerParser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl MarkerParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> Result<MarkerTree> {
        let mut items = vec![self.and_expr()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            items.push(self.and_expr()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            MarkerTree::Or(items)
        })
    }

    fn and_expr(&mut self) -> Result<MarkerTree> {
        let mut items = vec![self.atom()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            items.push(self.atom()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            MarkerTree::And(items)
        })
    }

    fn atom(&mut self) -> Result<MarkerTree> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.or_expr()?;
            if self.next() != Some(Token::RParen) {
                return Err(invalid_marker(self.input, "missing closing parenthesis"));
            }
            return Ok(inner);
        }

        let lhs = self.value()?;
        let op = match self.next() {
            Some(Token::Op(op)) => op,
            _ => return Err(invalid_marker(self.input, "expected a comparison operator")),
        };
        let rhs = self.value()?;
        if matches!(
            (&lhs, &rhs),
            (MarkerValue::Literal(_), MarkerValue::Literal(_))
        ) {
            return Err(invalid_marker(
                self.input,
                "a comparison needs at least one marker variable",
            ));
        }
        Ok(MarkerTree::Compare { lhs, op, rhs })
    }

    fn value(&mut self) -> Result<MarkerValue> {
        match self.next() {
            Some(Token::Str(text)) => Ok(MarkerValue::Literal(text)),
            Some(Token::Ident(name)) => MarkerVariable::from_name(&name)
                .map(MarkerValue::Variable)
                .ok_or_else(|| invalid_marker(self.input, format!("unknown variable '{name}'"))),
            _ => Err(invalid_marker(self.input, "expected a variable or a quoted string")),
        }
    }
}
