//! Origin allow-list matching.
//!
//! # Design Decisions
//! - Exact origins compare byte-for-byte
//! - Patterns allow a single `*` wildcard, e.g. `https://*.vercel.app`
//! - No regex to guarantee O(n) matching

use std::fmt;

use axum::http::HeaderValue;

/// Origin pattern with at most one `*` wildcard.
///
/// The wildcard matches any run of characters, including dots, so
/// `https://*.vercel.app` accepts `https://a.b.vercel.app`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPattern {
    prefix: String,
    suffix: Option<String>,
}

/// Why a pattern was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern must start with http:// or https://")]
    MissingScheme,
    #[error("pattern may contain at most one '*'")]
    TooManyWildcards,
}

impl OriginPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        if !(pattern.starts_with("http://") || pattern.starts_with("https://")) {
            return Err(PatternError::MissingScheme);
        }

        match pattern.split_once('*') {
            None => Ok(Self {
                prefix: pattern.to_string(),
                suffix: None,
            }),
            Some((_, rest)) if rest.contains('*') => Err(PatternError::TooManyWildcards),
            Some((prefix, suffix)) => Ok(Self {
                prefix: prefix.to_string(),
                suffix: Some(suffix.to_string()),
            }),
        }
    }

    pub fn matches(&self, origin: &str) -> bool {
        match &self.suffix {
            None => origin == self.prefix,
            Some(suffix) => {
                origin.len() >= self.prefix.len() + suffix.len()
                    && origin.starts_with(&self.prefix)
                    && origin.ends_with(suffix.as_str())
            }
        }
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suffix {
            None => write!(f, "{}", self.prefix),
            Some(suffix) => write!(f, "{}*{}", self.prefix, suffix),
        }
    }
}

/// Exact origins plus wildcard patterns.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    exact: Vec<HeaderValue>,
    patterns: Vec<OriginPattern>,
}

impl OriginAllowList {
    pub fn new(exact: Vec<HeaderValue>, patterns: Vec<OriginPattern>) -> Self {
        Self { exact, patterns }
    }

    pub fn is_allowed(&self, origin: &HeaderValue) -> bool {
        if self.exact.iter().any(|allowed| allowed == origin) {
            return true;
        }
        match origin.to_str() {
            Ok(origin) => self.patterns.iter().any(|p| p.matches(origin)),
            Err(_) => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty()
    }
}
