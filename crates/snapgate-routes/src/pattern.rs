//! Parameterized path patterns.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use percent_encoding::percent_decode_str;
use snapgate_store::canonicalize;

use crate::RouteError;

/// Marker prefix for a parameter segment.
const PARAM_MARKER: char = ':';

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Segment-wise route pattern such as `/post/:id`.
///
/// A `:name` segment matches any single non-empty path segment and binds it.
/// Other segments match exactly. Segment counts must be equal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: reason.to_owned(),
        };

        if !pattern.starts_with('/') {
            return Err(RouteError::RelativePath(pattern.to_owned()));
        }
        let canonical = canonicalize(pattern);

        let mut seen = HashSet::new();
        let mut segments = Vec::new();
        for raw in split(canonical) {
            if raw.is_empty() {
                return Err(invalid("empty segment"));
            }
            if let Some(name) = raw.strip_prefix(PARAM_MARKER) {
                if name.is_empty() {
                    return Err(invalid("parameter without a name"));
                }
                if !seen.insert(name) {
                    return Err(invalid(&format!("duplicate parameter '{name}'")));
                }
                segments.push(Segment::Param(name.to_owned()));
            } else {
                segments.push(Segment::Literal(raw.to_owned()));
            }
        }

        Ok(Self {
            source: canonical.to_owned(),
            segments,
        })
    }

    /// Canonical pattern text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a canonical path, returning bound parameters on success.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = split(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.insert(name.clone(), decode(part));
                }
                _ => return None,
            }
        }
        Some(params)
    }
}

/// Segments of an absolute path; the root has none.
fn split(path: &str) -> impl Iterator<Item = &str> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    (!rest.is_empty()).then(|| rest.split('/')).into_iter().flatten()
}

/// Percent-decode a segment, keeping the raw text when it is not UTF-8.
fn decode(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8()
        .map_or_else(|_| segment.to_owned(), Cow::into_owned)
}
