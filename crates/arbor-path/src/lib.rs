//! arbor-path: Zero-dependency path matcher for nested router slots
//!
//! Compiles a route's path pattern once and tests path fragments against it.
//! A match splits the fragment into the part this slot consumed and the rest
//! that a descendant slot resolves.
//!
//! ## Features
//! - Static segments: `users`, `api/v1/health`
//! - Parameters: `users/:id`, `posts/{postId}/comments/:commentId`
//! - Wildcards: `files/*path`, `files/{*path}`, `*`
//! - Exact and fuzzy (prefix) matching on segment boundaries
//! - Zero external dependencies
//!
//! ## Path Syntax
//! - `:name` or `{name}` - Named parameter (captures one segment)
//! - `*`, `*name` or `{*name}` - Wildcard (captures the remaining path, last segment only)
//!
//! ## Matching modes
//! - Exact: the whole fragment must be matched, `rest` is empty
//! - Fuzzy: a prefix ending on a `/` boundary is enough, the remainder is `rest`
//!
//! ## Example
//! ```
//! use arbor_path::PathPattern;
//!
//! let pattern = PathPattern::compile("users/:id").unwrap();
//!
//! let m = pattern.matches("users/42/posts", true).unwrap();
//! assert_eq!(m.params, vec![("id".to_string(), "42".to_string())]);
//! assert_eq!(m.fragments.consumed, "users/42");
//! assert_eq!(m.fragments.rest, "/posts");
//!
//! assert!(pattern.matches("users/42/posts", false).is_none());
//! ```

use std::collections::HashMap;
use std::fmt;

mod fragment;

pub use fragment::{canonicalize, collapse_separators, join};

/// Path separator
pub const SEPARATOR: char = '/';

/// Split of a fragment into what a slot consumed and what remains
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFragments {
    /// Matched prefix of the input
    pub consumed: String,
    /// Remainder for descendant slots, starts with a separator unless empty
    pub rest: String,
}

/// Byte span of a named capture inside the matched input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

/// Raw match result for consumers that need offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    /// The fragment that was tested
    pub input: String,
    /// Byte offset where the consumed prefix ends
    pub end: usize,
    /// Captures in pattern order
    pub captures: Vec<Capture>,
}

impl RawMatch {
    /// The consumed prefix of the input
    pub fn matched(&self) -> &str {
        &self.input[..self.end]
    }

    /// Captured text by name
    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find(|c| c.name == name)
            .map(|c| &self.input[c.start..c.end])
    }
}

/// Successful match of a fragment against a pattern
#[derive(Debug, Clone, PartialEq)]
pub struct PathMatch {
    /// Captured path parameters as (name, value) pairs
    pub params: Vec<(String, String)>,
    /// Consumed / rest split
    pub fragments: PathFragments,
    /// Offsets of the match
    pub raw: RawMatch,
}

impl PathMatch {
    /// Get params as HashMap for convenient access
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params.iter().cloned().collect()
    }
}

/// Pattern compilation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// `:` or `{}` without a name
    EmptyParam { pattern: String },
    /// Wildcard followed by more segments
    WildcardNotLast { pattern: String },
    /// The same parameter name captured twice
    DuplicateParam { pattern: String, name: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::EmptyParam { pattern } => {
                write!(f, "empty parameter name in pattern `{}`", pattern)
            }
            PatternError::WildcardNotLast { pattern } => {
                write!(f, "wildcard must be the last segment in pattern `{}`", pattern)
            }
            PatternError::DuplicateParam { pattern, name } => {
                write!(f, "parameter `{}` appears twice in pattern `{}`", name, pattern)
            }
        }
    }
}

impl std::error::Error for PatternError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Wildcard(String),
}

impl Segment {
    fn parse(part: &str) -> Self {
        if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            return match inner.strip_prefix('*') {
                Some(name) => Segment::Wildcard(wildcard_name(name)),
                None => Segment::Param(inner.to_string()),
            };
        }
        if let Some(name) = part.strip_prefix(':') {
            Segment::Param(name.to_string())
        } else if let Some(name) = part.strip_prefix('*') {
            Segment::Wildcard(wildcard_name(name))
        } else {
            Segment::Static(part.to_string())
        }
    }
}

fn wildcard_name(name: &str) -> String {
    let name = if name.is_empty() { "*" } else { name };
    name.to_string()
}

/// Compiled path pattern
///
/// Compile once per route, then call [`PathPattern::matches`] for every
/// navigation.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern
    ///
    /// # Example
    /// ```
    /// use arbor_path::PathPattern;
    ///
    /// assert!(PathPattern::compile("users/:id").is_ok());
    /// assert!(PathPattern::compile("files/*path/edit").is_err());
    /// ```
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let parts: Vec<&str> = pattern.split(SEPARATOR).filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut names: Vec<String> = Vec::new();

        for (i, part) in parts.iter().enumerate() {
            let segment = Segment::parse(part);
            match &segment {
                Segment::Param(name) if name.is_empty() => {
                    return Err(PatternError::EmptyParam {
                        pattern: pattern.to_string(),
                    });
                }
                Segment::Wildcard(_) if i + 1 != parts.len() => {
                    return Err(PatternError::WildcardNotLast {
                        pattern: pattern.to_string(),
                    });
                }
                _ => {}
            }
            if let Segment::Param(name) | Segment::Wildcard(name) = &segment {
                if names.contains(name) {
                    return Err(PatternError::DuplicateParam {
                        pattern: pattern.to_string(),
                        name: name.clone(),
                    });
                }
                names.push(name.clone());
            }
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True for `""` and `"/"`, which only match the root fragment
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Names of parameters and wildcards, in pattern order
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) | Segment::Wildcard(name) => Some(name.as_str()),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// Match a fragment
    ///
    /// # Arguments
    /// * `fragment` - Path fragment, with or without a leading `/`
    /// * `fuzzy` - Accept a prefix match ending on a separator boundary
    ///
    /// # Returns
    /// `Some(PathMatch)` with captured params and the fragment split, or `None`
    pub fn matches(&self, fragment: &str, fuzzy: bool) -> Option<PathMatch> {
        let spans = segment_spans(fragment);

        if self.segments.is_empty() {
            return spans
                .is_empty()
                .then(|| Self::finish(fragment, fragment.len(), Vec::new()));
        }

        let mut captures = Vec::new();
        let mut end = 0;

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard(name) => {
                    // Captures everything left, possibly nothing
                    let (start, stop) = match (spans.get(i), spans.last()) {
                        (Some(&(start, _)), Some(&(_, stop))) => (start, stop),
                        _ => (end, end),
                    };
                    captures.push(Capture {
                        name: name.clone(),
                        start,
                        end: stop,
                    });
                    return Some(Self::finish(fragment, fragment.len(), captures));
                }
                Segment::Static(expected) => {
                    let &(start, stop) = spans.get(i)?;
                    if &fragment[start..stop] != expected {
                        return None;
                    }
                    end = stop;
                }
                Segment::Param(name) => {
                    let &(start, stop) = spans.get(i)?;
                    captures.push(Capture {
                        name: name.clone(),
                        start,
                        end: stop,
                    });
                    end = stop;
                }
            }
        }

        if fuzzy {
            Some(Self::finish(fragment, end, captures))
        } else if spans.len() == self.segments.len() {
            Some(Self::finish(fragment, fragment.len(), captures))
        } else {
            None
        }
    }

    fn finish(input: &str, end: usize, captures: Vec<Capture>) -> PathMatch {
        let params = captures
            .iter()
            .map(|c| (c.name.clone(), input[c.start..c.end].to_string()))
            .collect();

        PathMatch {
            params,
            fragments: PathFragments {
                consumed: input[..end].to_string(),
                rest: collapse_separators(&input[end..]),
            },
            raw: RawMatch {
                input: input.to_string(),
                end,
                captures,
            },
        }
    }
}

/// Compile `pattern` and match `fragment` in one call
///
/// Invalid patterns never match.
pub fn match_path(pattern: &str, fragment: &str, fuzzy: bool) -> Option<PathMatch> {
    PathPattern::compile(pattern).ok()?.matches(fragment, fuzzy)
}

/// Byte spans of the non-empty segments of `input`
fn segment_spans(input: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;

    for (i, b) in input.bytes().enumerate() {
        if b == SEPARATOR as u8 {
            if let Some(s) = start.take() {
                spans.push((s, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, input.len()));
    }

    spans
}
