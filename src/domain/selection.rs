//! Per-dimension selections for `dump array`
//!
//! Each selection is a point (`2`) or a slice (`3:4`, `:4`, `3:`). Bounds
//! that contain a colon themselves, like datetimes, are wrapped in single
//! or double quotes: `'2020-05-03 12:00':"2021-05-03"`.
//!
//! Bounds stay textual; the engine coerces them to each dimension's type.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("Empty selection")]
    Empty,

    #[error("Could not parse the selection '{0}'. (Did you enclose the bounds in matching quotes?)")]
    Unbalanced(String),

    #[error("Too many bounds in selection '{0}': expected <value> or <start>:<stop>")]
    TooManyBounds(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Point {
        value: String,
    },
    Slice {
        start: Option<String>,
        stop: Option<String>,
    },
}

impl Selection {
    pub fn point(value: impl Into<String>) -> Self {
        Selection::Point {
            value: value.into(),
        }
    }

    pub fn slice(start: Option<&str>, stop: Option<&str>) -> Self {
        Selection::Slice {
            start: start.map(str::to_string),
            stop: stop.map(str::to_string),
        }
    }
}

/// Parses one dimension's selection
pub fn parse_selection(text: &str) -> Result<Selection, SelectionError> {
    let parts = split_bounds(text)?;

    match parts.as_slice() {
        [point] => bound(point).map(Selection::point).ok_or(SelectionError::Empty),
        [start, stop] => Ok(Selection::Slice {
            start: bound(start),
            stop: bound(stop),
        }),
        _ => Err(SelectionError::TooManyBounds(text.to_string())),
    }
}

/// Splits on colons outside single or double quotes
fn split_bounds(text: &str) -> Result<Vec<&str>, SelectionError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ':') => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            (None, _) => {}
        }
    }

    if quote.is_some() {
        return Err(SelectionError::Unbalanced(text.to_string()));
    }

    parts.push(&text[start..]);
    Ok(parts)
}

/// Strips surrounding quotes; an empty bound is open
fn bound(part: &str) -> Option<String> {
    let part = part.trim();
    let unquoted = ['\'', '"']
        .into_iter()
        .find_map(|q| part.strip_prefix(q).and_then(|p| p.strip_suffix(q)))
        .unwrap_or(part);

    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point() {
        assert_eq!(parse_selection("2").unwrap(), Selection::point("2"));
    }

    #[test]
    fn slices() {
        assert_eq!(parse_selection("3:4").unwrap(), Selection::slice(Some("3"), Some("4")));
        assert_eq!(parse_selection(":4").unwrap(), Selection::slice(None, Some("4")));
        assert_eq!(parse_selection("3:").unwrap(), Selection::slice(Some("3"), None));
    }

    #[test]
    fn quoted_datetime_bounds() {
        assert_eq!(
            parse_selection("'5-3-2020 12:00':\"5-3-2021\"").unwrap(),
            Selection::slice(Some("5-3-2020 12:00"), Some("5-3-2021"))
        );
        assert_eq!(
            parse_selection("'2020-01-01T00:00'").unwrap(),
            Selection::point("2020-01-01T00:00")
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse_selection(""), Err(SelectionError::Empty));
        assert!(matches!(
            parse_selection("'2020-01-01"),
            Err(SelectionError::Unbalanced(_))
        ));
        assert!(matches!(
            parse_selection("1:2:3"),
            Err(SelectionError::TooManyBounds(_))
        ));
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_value(Selection::slice(None, Some("4"))).unwrap();
        assert_eq!(json, serde_json::json!({"type": "slice", "start": null, "stop": "4"}));
    }
}
