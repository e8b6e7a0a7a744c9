//! Typed values produced by the keyword-argument parser
//!
//! Keyword arguments have no fixed schema, so every parsed value is one
//! variant of [`Value`]. Collaborators downcast with the `as_*` accessors
//! and reject what they do not understand.
//!
//! Values print back into the same textual grammar they were parsed from:
//! `Display` quotes strings that would otherwise coerce to another type and
//! escapes delimiters, so `parse(to_string(v)) == v` for parser output.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Characters that need a backslash when written unquoted
const ESCAPED: [char; 5] = [',', ';', ':', '"', '\\'];

/// A dictionary key. Keys are hashable scalars and never booleans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

/// A parsed keyword-argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
    Dict(Dict),
}

/// Dictionary values keyed by scalar keys
pub type Dict = BTreeMap<Key, Value>;

/// Final mapping from option name to value, one entry per option name
pub type OptionMap = BTreeMap<String, Value>;

impl Key {
    pub fn str(s: impl Into<String>) -> Self {
        Key::Str(s.into())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Short type label used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Writes a string so that it parses back as the same string
fn write_str(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let coerces = (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        || s == "True"
        || s == "False";

    if coerces {
        return write!(f, "\"{}\"", s);
    }

    for c in s.chars() {
        if ESCAPED.contains(&c) {
            write!(f, "\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Str(s) => write_str(f, s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Str(s) => write_str(f, s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Dict(dict) => {
                for (i, (key, value)) in dict.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                Ok(())
            }
        }
    }
}

// JSON object keys must be strings, so integer keys serialize as their
// decimal text.
impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Int(i) => serializer.serialize_str(&i.to_string()),
            Key::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(dict) => {
                let mut map = serializer.serialize_map(Some(dict.len()))?;
                for (key, value) in dict {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
