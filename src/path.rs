//! Dotted path addressing into the JSON form of the state.
//!
//! A path such as `Address.City` or `Tags.0` is parsed once into a [`Path`]
//! and then resolved against `serde_json::Value` documents. Resolution follows
//! these rules:
//!
//! - a key segment selects an object field (struct field or map entry);
//! - a numeric segment indexes a sequence, or selects a map entry whose key is
//!   that number;
//! - `*` selects every value of an object or every element of a sequence;
//! - a key segment that meets a sequence is applied to every element, so
//!   `Friends.Name` yields the names of all friends.
//!
//! Fan-out segments produce a JSON array of the per-element results.
//!
//! `"/"` and `""` both denote the whole state.

use crate::error::{Result, StoreError};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel path addressing the whole state.
pub const ROOT_PATH: &str = "/";

/// A single path segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Seg {
    /// Object key.
    Key(String),
    /// Sequence index (or numeric map key).
    Index(usize),
    /// Every element of a sequence or every value of a map.
    Wildcard,
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, "{}", k),
            Seg::Index(i) => write!(f, "{}", i),
            Seg::Wildcard => write!(f, "*"),
        }
    }
}

/// Why a path failed to resolve.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("key '{key}' not found at segment {position}")]
    KeyNotFound { key: String, position: usize },

    #[error("index {index} out of bounds (len {len}) at segment {position}")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        position: usize,
    },

    #[error("cannot descend into {kind} at segment {position}")]
    NotTraversable { kind: &'static str, position: usize },

    #[error("segment {position} does not address a single field")]
    NotAddressable { position: usize },
}

/// A parsed path into a structured value. The empty path is the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Seg>);

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path.
    ///
    /// Segments are separated by `.`; `name[3]` is accepted as a shorthand for
    /// `name.3`.
    ///
    /// ```
    /// use statehub::path::{Path, Seg};
    ///
    /// let path = Path::parse("Users[0].Address.City").unwrap();
    /// assert_eq!(path.segments()[1], Seg::Index(0));
    /// assert!(Path::parse("/").unwrap().is_root());
    /// assert!(Path::parse("a..b").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ROOT_PATH {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in trimmed.split('.') {
            parse_part(raw, part, &mut segments)?;
        }
        Ok(Self(segments))
    }

    /// Segments of this path.
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no segments (same as [`Path::is_root`]).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve this path against a value, returning an owned copy of what it
    /// addresses. Fan-out segments collect into a JSON array.
    pub fn resolve(&self, root: &Value) -> std::result::Result<Value, ResolveError> {
        resolve_from(root, &self.0, 0)
    }

    /// Borrow the single field this path addresses.
    ///
    /// Only plain key/index paths qualify; wildcards and implicit fan-out over
    /// sequences are rejected with [`ResolveError::NotAddressable`].
    pub fn lookup<'a>(&self, root: &'a Value) -> std::result::Result<&'a Value, ResolveError> {
        let mut current = root;
        for (position, seg) in self.0.iter().enumerate() {
            current = step(current, seg, position)?;
        }
        Ok(current)
    }

    /// Mutable counterpart of [`Path::lookup`].
    pub fn lookup_mut<'a>(
        &self,
        root: &'a mut Value,
    ) -> std::result::Result<&'a mut Value, ResolveError> {
        let mut current = root;
        for (position, seg) in self.0.iter().enumerate() {
            current = step_mut(current, seg, position)?;
        }
        Ok(current)
    }
}

impl FromStr for Path {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "{}", ROOT_PATH);
        }
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

fn parse_part(raw: &str, part: &str, segments: &mut Vec<Seg>) -> Result<()> {
    let part = part.trim();
    if part.is_empty() {
        return Err(StoreError::invalid_path(raw, "empty segment"));
    }

    // name[1][2] -> name, 1, 2
    let (head, mut rest) = match part.find('[') {
        Some(pos) => (&part[..pos], &part[pos..]),
        None => (part, ""),
    };

    if !head.is_empty() {
        segments.push(parse_segment(head));
    } else if rest.is_empty() {
        return Err(StoreError::invalid_path(raw, "empty segment"));
    }

    while !rest.is_empty() {
        let close = rest
            .find(']')
            .ok_or_else(|| StoreError::invalid_path(raw, "unclosed '['"))?;
        let inner = rest[1..close].trim();
        match inner {
            "*" => segments.push(Seg::Wildcard),
            _ => {
                let index = inner.parse::<usize>().map_err(|_| {
                    StoreError::invalid_path(raw, format!("invalid index '{}'", inner))
                })?;
                segments.push(Seg::Index(index));
            }
        }
        rest = &rest[close + 1..];
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(StoreError::invalid_path(
                raw,
                format!("unexpected '{}' after index", rest),
            ));
        }
    }
    Ok(())
}

fn parse_segment(s: &str) -> Seg {
    if s == "*" {
        Seg::Wildcard
    } else if let Ok(index) = s.parse::<usize>() {
        Seg::Index(index)
    } else {
        Seg::Key(s.to_string())
    }
}

fn resolve_from(
    value: &Value,
    segs: &[Seg],
    position: usize,
) -> std::result::Result<Value, ResolveError> {
    let Some((seg, rest)) = segs.split_first() else {
        return Ok(value.clone());
    };

    match (seg, value) {
        (Seg::Wildcard, Value::Array(items)) => items
            .iter()
            .map(|item| resolve_from(item, rest, position + 1))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array),
        (Seg::Wildcard, Value::Object(map)) => map
            .values()
            .map(|item| resolve_from(item, rest, position + 1))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array),
        // A named field applied to a sequence reaches into every element.
        (Seg::Key(_), Value::Array(items)) => items
            .iter()
            .map(|item| resolve_from(item, segs, position))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array),
        _ => {
            let next = step(value, seg, position)?;
            resolve_from(next, rest, position + 1)
        }
    }
}

fn step<'a>(
    value: &'a Value,
    seg: &Seg,
    position: usize,
) -> std::result::Result<&'a Value, ResolveError> {
    match (seg, value) {
        (Seg::Key(key), Value::Object(map)) => {
            map.get(key).ok_or_else(|| ResolveError::KeyNotFound {
                key: key.clone(),
                position,
            })
        }
        (Seg::Index(index), Value::Array(items)) => {
            items.get(*index).ok_or(ResolveError::IndexOutOfBounds {
                index: *index,
                len: items.len(),
                position,
            })
        }
        (Seg::Index(index), Value::Object(map)) => {
            let key = index.to_string();
            map.get(&key)
                .ok_or(ResolveError::KeyNotFound { key, position })
        }
        (Seg::Wildcard, Value::Array(_) | Value::Object(_))
        | (Seg::Key(_), Value::Array(_)) => Err(ResolveError::NotAddressable { position }),
        (_, other) => Err(ResolveError::NotTraversable {
            kind: kind_of(other),
            position,
        }),
    }
}

fn step_mut<'a>(
    value: &'a mut Value,
    seg: &Seg,
    position: usize,
) -> std::result::Result<&'a mut Value, ResolveError> {
    match (seg, value) {
        (Seg::Key(key), Value::Object(map)) => {
            map.get_mut(key).ok_or_else(|| ResolveError::KeyNotFound {
                key: key.clone(),
                position,
            })
        }
        (Seg::Index(index), Value::Array(items)) => {
            let len = items.len();
            items.get_mut(*index).ok_or(ResolveError::IndexOutOfBounds {
                index: *index,
                len,
                position,
            })
        }
        (Seg::Index(index), Value::Object(map)) => {
            let key = index.to_string();
            match map.get_mut(&key) {
                Some(v) => Ok(v),
                None => Err(ResolveError::KeyNotFound { key, position }),
            }
        }
        (Seg::Wildcard, Value::Array(_) | Value::Object(_))
        | (Seg::Key(_), Value::Array(_)) => Err(ResolveError::NotAddressable { position }),
        (_, other) => Err(ResolveError::NotTraversable {
            kind: kind_of(other),
            position,
        }),
    }
}

/// JSON kind name of a value.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
