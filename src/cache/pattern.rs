//! Invalidation Pattern Module
//!
//! Compiled rules that select cache keys for removal.

use std::fmt;

use regex::Regex;

use crate::cache::key::{caller_segment, path_prefix_segment};
use crate::error::Result;

// == Invalidation Pattern ==
/// A compiled regular expression matched anywhere inside a cache key.
#[derive(Clone)]
pub struct InvalidationPattern {
    regex: Regex,
}

impl InvalidationPattern {
    /// Compiles `pattern` as a regular expression.
    ///
    /// Plain strings are not escaped: `.` in `"/api/v1.0"` matches any character.
    /// Use [`InvalidationPattern::literal`] for exact substring matching.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Matches `text` as a literal substring.
    pub fn literal(text: &str) -> Self {
        Self::escaped(text, "", "")
    }

    /// Matches every key belonging to `caller_id`.
    pub fn caller(caller_id: &str) -> Self {
        Self::escaped(&caller_segment(caller_id), "", "$")
    }

    /// Matches every key whose request path starts with `prefix`.
    pub fn route_prefix(prefix: &str) -> Self {
        Self::escaped(&path_prefix_segment(prefix), "^[^:]*:", "")
    }

    fn escaped(text: &str, before: &str, after: &str) -> Self {
        let source = format!("{}{}{}", before, regex::escape(text), after);
        match Regex::new(&source) {
            Ok(regex) => Self { regex },
            // `regex::escape` output plus fixed anchors always compiles.
            Err(_) => unreachable!("escaped pattern failed to compile: {}", source),
        }
    }

    /// Returns true if `key` should be invalidated.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Returns the pattern source.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Debug for InvalidationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InvalidationPattern")
            .field(&self.regex.as_str())
            .finish()
    }
}
