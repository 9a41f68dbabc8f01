//! Route pattern compilation.
//!
//! # Responsibilities
//! - Turn `/users/:id/posts/:postId` into an anchored path matcher
//! - Record placeholder names in left-to-right order
//! - Reject patterns that could never match a request path
//!
//! # Design Decisions
//! - Each `:name` becomes `([^/]+)`: one non-empty run of non-`/` characters
//! - Literal text is escaped, so `.` or `+` in a route match themselves
//! - Matching is anchored (`^...$`) and runs against the path only

use std::sync::Arc;

use regex::Regex;

use crate::error::Error;

/// Wildcard substituted for every placeholder.
const CAPTURE_GROUP: &str = "([^/]+)";

/// A route pattern compiled into a path matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    names: Vec<Arc<str>>,
}

impl CompiledPattern {
    /// Compile a pattern string.
    pub fn compile(pattern: &str) -> Result<Self, Error> {
        let malformed = |reason: &str| Error::MalformedPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(malformed("pattern must start with '/'"));
        }
        if pattern.contains('?') || pattern.contains('#') {
            return Err(malformed("query and fragment markers never match a path"));
        }

        let mut expr = String::with_capacity(pattern.len() + 8);
        let mut names = Vec::new();
        expr.push('^');

        let mut rest = pattern;
        while let Some(colon) = rest.find(':') {
            expr.push_str(&regex::escape(&rest[..colon]));

            let after = &rest[colon + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            if name_len == 0 {
                return Err(malformed("':' must be followed by a placeholder name"));
            }

            names.push(Arc::from(&after[..name_len]));
            expr.push_str(CAPTURE_GROUP);
            rest = &after[name_len..];
        }
        expr.push_str(&regex::escape(rest));
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| malformed(&e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            names,
        })
    }

    /// The pattern as registered.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance.
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.names
    }

    /// Match a request path, yielding one capture per placeholder.
    pub fn matches(&self, path: &str) -> Option<Captures> {
        let caps = self.regex.captures(path)?;
        let values = caps
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();

        Some(Captures {
            names: self.names.clone(),
            values,
        })
    }
}

/// Path segments captured by a matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    names: Vec<Arc<str>>,
    values: Vec<String>,
}

impl Captures {
    /// Capture at `index`, in left-to-right pattern order.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Capture for placeholder `name`. Duplicate names resolve to the last one.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .zip(&self.values)
            .rfind(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }
}
