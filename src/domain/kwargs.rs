//! Keyword-argument mini-language
//!
//! Turns trailing CLI tokens into an [`OptionMap`] handed verbatim to the
//! array engine. Tokens come in `--name value` pairs:
//!
//! ```text
//! kwargs   ::= kwarg+
//! kwarg    ::= "--" key " " arg          ; dashes in key become underscores
//! arg      ::= argval | list | dict
//! argval   ::= int | bool | str
//! list     ::= argval ("," argval)+
//! dict     ::= entry (";" entry)*
//! entry    ::= dictkey ":" dictval
//! dictkey  ::= argval                    ; never a bool, never a list
//! dictval  ::= argval | list
//! ```
//!
//! Leaves coerce in order: a token wrapped in double quotes is its verbatim
//! interior; a digits-only token is an integer; `True`/`False` are booleans;
//! anything else is a string. Delimiters inside double quotes or escaped
//! with a backslash never split.
//!
//! Repeated flags accumulate: `key:value` occurrences merge into one dict
//! (last duplicate key wins), plain occurrences collect into a list.

use thiserror::Error;

use super::value::{Dict, Key, OptionMap, Value};

/// Prefix marking a flag token
pub const FLAG_PREFIX: &str = "--";

#[derive(Debug, Error, PartialEq)]
pub enum KwargsError {
    #[error("Malformed option '{0}': expected a '--<name>' flag followed by a value")]
    MalformedOption(String),

    #[error("Missing value for option '{0}'")]
    MissingValue(String),

    #[error("Type mismatch in '{token}': {reason}")]
    TypeMismatch { token: String, reason: String },
}

impl KwargsError {
    fn mismatch(token: &str, reason: impl Into<String>) -> Self {
        KwargsError::TypeMismatch {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// One `--name value` occurrence before aggregation
#[derive(Debug)]
enum Occurrence {
    Plain(Value),
    Pairs(Vec<(Key, Value)>),
}

impl Occurrence {
    fn into_value(self) -> Value {
        match self {
            Occurrence::Plain(value) => value,
            Occurrence::Pairs(pairs) => Value::Dict(pairs.into_iter().collect()),
        }
    }
}

/// Parses `--name value` token pairs into an option map
pub fn parse_kwargs<I, S>(tokens: I) -> Result<OptionMap, KwargsError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut occurrences: Vec<(String, Vec<Occurrence>)> = Vec::new();
    let mut tokens = tokens.into_iter();

    while let Some(flag) = tokens.next() {
        let flag = flag.as_ref();
        let name = option_name(flag)?;
        let value = tokens
            .next()
            .ok_or_else(|| KwargsError::MissingValue(flag.to_string()))?;
        let occurrence = parse_arg(value.as_ref())?;

        match occurrences.iter_mut().find(|(n, _)| *n == name) {
            Some((_, seen)) => seen.push(occurrence),
            None => occurrences.push((name, vec![occurrence])),
        }
    }

    Ok(occurrences
        .into_iter()
        .map(|(name, seen)| (name, fold(seen)))
        .collect())
}

/// Pulls bespoke flags out of a token tail before generic parsing
///
/// Tokens are walked as `flag value` pairs. Pairs whose flag is listed in
/// `flags` are returned in encounter order; all other tokens are returned
/// untouched for [`parse_kwargs`].
pub fn split_special<S: AsRef<str>>(
    tokens: &[S],
    flags: &[&str],
) -> Result<(Vec<String>, Vec<(String, String)>), KwargsError> {
    let mut rest = Vec::new();
    let mut special = Vec::new();
    let mut iter = tokens.iter().map(AsRef::as_ref);

    while let Some(flag) = iter.next() {
        let value = iter.next();

        if flags.contains(&flag) {
            let value = value.ok_or_else(|| KwargsError::MissingValue(flag.to_string()))?;
            special.push((flag.to_string(), value.to_string()));
        } else {
            rest.push(flag.to_string());
            rest.extend(value.map(str::to_string));
        }
    }

    Ok((rest, special))
}

/// Converts a flag token to its option name (`--cell-order` -> `cell_order`)
pub fn option_name(flag: &str) -> Result<String, KwargsError> {
    match flag.strip_prefix(FLAG_PREFIX) {
        Some(name) if !name.is_empty() => Ok(name.replace('-', "_")),
        _ => Err(KwargsError::MalformedOption(flag.to_string())),
    }
}

fn fold(occurrences: Vec<Occurrence>) -> Value {
    if occurrences
        .iter()
        .all(|o| matches!(o, Occurrence::Pairs(_)))
    {
        let mut dict = Dict::new();
        for occurrence in occurrences {
            if let Occurrence::Pairs(pairs) = occurrence {
                dict.extend(pairs);
            }
        }
        return Value::Dict(dict);
    }

    let mut values: Vec<Value> = occurrences.into_iter().map(Occurrence::into_value).collect();
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::List(values)
    }
}

fn parse_arg(token: &str) -> Result<Occurrence, KwargsError> {
    if quoted_interior(token).is_some() || !contains_top(token, ':') {
        return parse_list_or_scalar(token).map(Occurrence::Plain);
    }

    let mut pairs = Vec::new();
    for entry in split_top(token, ';') {
        if entry.is_empty() {
            continue;
        }

        let (key, value) = split_once_top(entry, ':').ok_or_else(|| {
            KwargsError::mismatch(entry, "dictionary entries must be <key>:<value> pairs")
        })?;
        pairs.push((parse_key(key)?, parse_list_or_scalar(value)?));
    }

    Ok(Occurrence::Pairs(pairs))
}

fn parse_key(token: &str) -> Result<Key, KwargsError> {
    if quoted_interior(token).is_none() && contains_top(token, ',') {
        return Err(KwargsError::mismatch(
            token,
            "dictionary keys must be scalars, not lists",
        ));
    }

    match coerce(token, false)? {
        Value::Int(i) => Ok(Key::Int(i)),
        Value::Str(s) => Ok(Key::Str(s)),
        other => Err(KwargsError::mismatch(
            token,
            format!("a {} cannot be a dictionary key", other.type_name()),
        )),
    }
}

fn parse_list_or_scalar(token: &str) -> Result<Value, KwargsError> {
    if quoted_interior(token).is_none() && contains_top(token, ',') {
        let items = split_top(token, ',')
            .into_iter()
            .map(|item| coerce(item, true))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::List(items));
    }

    coerce(token, true)
}

/// Coerces a single leaf token
///
/// `cast_bool` is off for dictionary keys so `True` stays a string key.
fn coerce(token: &str, cast_bool: bool) -> Result<Value, KwargsError> {
    if let Some(inner) = quoted_interior(token) {
        return Ok(Value::Str(inner.to_string()));
    }

    let text = unescape(token);

    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| KwargsError::mismatch(token, "integer out of range"));
    }

    if cast_bool {
        match text.as_str() {
            "True" => return Ok(Value::Bool(true)),
            "False" => return Ok(Value::Bool(false)),
            _ => {}
        }
    }

    Ok(Value::Str(text))
}

/// Returns the interior of a token wrapped in exactly one pair of quotes
fn quoted_interior(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('"')?.strip_suffix('"')?;

    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return None,
            _ => {}
        }
    }

    // A trailing backslash escapes what looked like the closing quote
    if escaped {
        None
    } else {
        Some(inner)
    }
}

/// Splits on `delim` where it is neither quoted nor escaped
fn split_top(input: &str, delim: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == delim && !in_quotes => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    parts.push(&input[start..]);
    parts
}

fn split_once_top(input: &str, delim: char) -> Option<(&str, &str)> {
    let first = split_top(input, delim).into_iter().next()?;
    if first.len() == input.len() {
        return None;
    }
    Some((first, &input[first.len() + delim.len_utf8()..]))
}

fn contains_top(input: &str, delim: char) -> bool {
    split_top(input, delim).len() > 1
}

/// Drops the backslash from escaped delimiters, quotes and backslashes
fn unescape(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, ',' | ';' | ':' | '"' | '\\') {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(tokens: &[&str]) -> OptionMap {
        parse_kwargs(tokens.iter().copied()).unwrap()
    }

    fn dict(entries: Vec<(Key, Value)>) -> Value {
        Value::Dict(entries.into_iter().collect())
    }

    #[test]
    fn scalars() {
        let kwargs = parse(&[
            "--bool", "True",
            "--str", "helloworld",
            "--num", "2",
            "--numisstr", "\"2\"",
            "--boolisstr", "\"False\"",
        ]);

        assert_eq!(kwargs["bool"], Value::Bool(true));
        assert_eq!(kwargs["str"], Value::str("helloworld"));
        assert_eq!(kwargs["num"], Value::Int(2));
        assert_eq!(kwargs["numisstr"], Value::str("2"));
        assert_eq!(kwargs["boolisstr"], Value::str("False"));
    }

    #[test]
    fn dicts() {
        let kwargs = parse(&[
            "--dictints", "hello:1;world:2",
            "--dictstrs", "hello:world;\"1\":\"2\"",
            "--dictbools", "good:True;bye:False",
        ]);

        assert_eq!(
            kwargs["dictints"],
            dict(vec![(Key::from("hello"), Value::Int(1)), (Key::from("world"), Value::Int(2))])
        );
        assert_eq!(
            kwargs["dictstrs"],
            dict(vec![(Key::from("hello"), Value::str("world")), (Key::from("1"), Value::str("2"))])
        );
        assert_eq!(
            kwargs["dictbools"],
            dict(vec![(Key::from("good"), Value::Bool(true)), (Key::from("bye"), Value::Bool(false))])
        );
    }

    #[test]
    fn mixed_dict() {
        let kwargs = parse(&[
            "--dictmix",
            "bool:False;str:\"1\";int:2;3:\"three\";list:hey,\"hi\",True,1",
        ]);

        assert_eq!(
            kwargs["dictmix"],
            dict(vec![
                (Key::from("bool"), Value::Bool(false)),
                (Key::from("str"), Value::str("1")),
                (Key::from("int"), Value::Int(2)),
                (Key::Int(3), Value::str("three")),
                (
                    Key::from("list"),
                    Value::List(vec![
                        Value::str("hey"),
                        Value::str("hi"),
                        Value::Bool(true),
                        Value::Int(1),
                    ])
                ),
            ])
        );
    }

    #[test]
    fn lists() {
        let kwargs = parse(&[
            "--listabc", "a,b,c",
            "--list123", "1,2,3",
            "--listbool", "True,True,False",
            "--listmix", "False,\"1\",2",
        ]);

        assert_eq!(kwargs["listabc"], Value::from(vec!["a", "b", "c"]));
        assert_eq!(kwargs["list123"], Value::from(vec![1_i64, 2, 3]));
        assert_eq!(kwargs["listbool"], Value::from(vec![true, true, false]));
        assert_eq!(
            kwargs["listmix"],
            Value::List(vec![Value::Bool(false), Value::str("1"), Value::Int(2)])
        );
    }

    #[test]
    fn repeated_pairs_merge_into_one_dict() {
        let repeated = parse(&["--dictints", "hello:1", "--dictints", "world:2"]);
        let single = parse(&["--dictints", "hello:1;world:2"]);

        assert_eq!(repeated, single);
    }

    #[test]
    fn last_duplicate_key_wins() {
        let kwargs = parse(&["--d", "a:1", "--d", "a:2;b:3"]);
        assert_eq!(
            kwargs["d"],
            dict(vec![(Key::from("a"), Value::Int(2)), (Key::from("b"), Value::Int(3))])
        );
    }

    #[test]
    fn repeated_plain_values_collect_in_order() {
        let kwargs = parse(&["--x", "b", "--x", "1", "--x", "a,c"]);
        assert_eq!(
            kwargs["x"],
            Value::List(vec![
                Value::str("b"),
                Value::Int(1),
                Value::from(vec!["a", "c"]),
            ])
        );
    }

    #[test]
    fn mixed_plain_and_pairs_collect_in_order() {
        let kwargs = parse(&["--x", "plain", "--x", "k:1"]);
        assert_eq!(
            kwargs["x"],
            Value::List(vec![
                Value::str("plain"),
                dict(vec![(Key::from("k"), Value::Int(1))]),
            ])
        );
    }

    #[test]
    fn dashes_become_underscores() {
        let kwargs = parse(&["--row-start-idx", "0"]);
        assert_eq!(kwargs["row_start_idx"], Value::Int(0));
    }

    #[test]
    fn quoted_tokens_are_atomic() {
        let kwargs = parse(&["--q", "\"a,b:c;d\"", "--l", "\"x,y\",z"]);
        assert_eq!(kwargs["q"], Value::str("a,b:c;d"));
        assert_eq!(kwargs["l"], Value::from(vec!["x,y", "z"]));
    }

    #[test]
    fn escaped_delimiters_do_not_split() {
        let kwargs = parse(&["--sep", "\\,", "--path", "s3\\://bucket/a"]);
        assert_eq!(kwargs["sep"], Value::str(","));
        assert_eq!(kwargs["path"], Value::str("s3://bucket/a"));
    }

    #[test]
    fn date_spec_is_a_dict() {
        let kwargs = parse(&["--date-spec", "date:%b/%d/%Y"]);
        assert_eq!(
            kwargs["date_spec"],
            dict(vec![(Key::from("date"), Value::str("%b/%d/%Y"))])
        );
    }

    #[test]
    fn dict_keys_do_not_become_bools() {
        let kwargs = parse(&["--d", "True:1"]);
        assert_eq!(kwargs["d"], dict(vec![(Key::from("True"), Value::Int(1))]));
    }

    #[test]
    fn whitespace_values_stay_strings() {
        let kwargs = parse(&["--sep", " "]);
        assert_eq!(kwargs["sep"], Value::str(" "));
    }

    #[test]
    fn value_without_flag_is_malformed() {
        let err = parse_kwargs(["value", "--x"]).unwrap_err();
        assert_eq!(err, KwargsError::MalformedOption("value".to_string()));

        let err = parse_kwargs(["--a", "1", "stray", "2"]).unwrap_err();
        assert_eq!(err, KwargsError::MalformedOption("stray".to_string()));
    }

    #[test]
    fn single_dash_and_bare_prefix_are_malformed() {
        assert!(matches!(
            parse_kwargs(["-x", "1"]),
            Err(KwargsError::MalformedOption(_))
        ));
        assert!(matches!(
            parse_kwargs(["--", "1"]),
            Err(KwargsError::MalformedOption(_))
        ));
    }

    #[test]
    fn trailing_flag_without_value() {
        let err = parse_kwargs(["--a", "1", "--b"]).unwrap_err();
        assert_eq!(err, KwargsError::MissingValue("--b".to_string()));
    }

    #[test]
    fn list_as_dict_key_is_a_type_mismatch() {
        let err = parse_kwargs(["--d", "a,b:1"]).unwrap_err();
        assert!(matches!(err, KwargsError::TypeMismatch { ref token, .. } if token == "a,b"));
    }

    #[test]
    fn integer_overflow_is_a_type_mismatch() {
        let err = parse_kwargs(["--n", "99999999999999999999"]).unwrap_err();
        assert!(matches!(err, KwargsError::TypeMismatch { .. }));
    }

    #[test]
    fn empty_input_is_empty_map() {
        let tokens: [&str; 0] = [];
        assert!(parse_kwargs(tokens).unwrap().is_empty());
    }

    #[test]
    fn split_special_extracts_pairs_in_order() {
        let tokens = [
            "--sep", " ",
            "-A", "GzipFilter",
            "--attr-filters", "a:LZ4Filter",
            "--header", "0",
        ];
        let (rest, special) = split_special(&tokens, &["--attr-filters", "-A"]).unwrap();

        assert_eq!(rest, vec!["--sep", " ", "--header", "0"]);
        assert_eq!(
            special,
            vec![
                ("-A".to_string(), "GzipFilter".to_string()),
                ("--attr-filters".to_string(), "a:LZ4Filter".to_string()),
            ]
        );
    }

    #[test]
    fn split_special_requires_a_value() {
        let err = split_special(&["--attr-filters"], &["--attr-filters"]).unwrap_err();
        assert_eq!(err, KwargsError::MissingValue("--attr-filters".to_string()));
    }

    proptest! {
        #[test]
        fn digit_strings_parse_as_ints(n in 0_i64..i64::MAX) {
            let kwargs = parse_kwargs(["--k".to_string(), n.to_string()]).unwrap();
            prop_assert_eq!(&kwargs["k"], &Value::Int(n));
        }

        #[test]
        fn quoted_values_stay_strings(s in "[a-zA-Z0-9 ,:;._/-]{0,20}") {
            let kwargs = parse_kwargs(["--k".to_string(), format!("\"{}\"", s)]).unwrap();
            prop_assert_eq!(&kwargs["k"], &Value::Str(s));
        }

        #[test]
        fn reparsing_display_is_idempotent(
            items in proptest::collection::vec("[a-z0-9,:;\"\\\\ ]{1,8}|True|False", 1..5)
        ) {
            let tokens: Vec<String> = items
                .iter()
                .enumerate()
                .flat_map(|(i, v)| [format!("--k{}", i), v.clone()])
                .collect();

            // Only inputs the grammar accepts are interesting here
            if let Ok(parsed) = parse_kwargs(&tokens) {
                let scalar_or_list: OptionMap = parsed
                    .into_iter()
                    .filter(|(_, v)| !matches!(v, Value::Dict(_)))
                    .filter(|(_, v)| match v {
                        Value::List(items) => items.iter().all(|i| !matches!(i, Value::List(_) | Value::Dict(_))),
                        _ => true,
                    })
                    .collect();

                let reserialized: Vec<String> = scalar_or_list
                    .iter()
                    .flat_map(|(k, v)| [format!("--{}", k), v.to_string()])
                    .collect();

                prop_assert_eq!(parse_kwargs(&reserialized).unwrap(), scalar_or_list);
            }
        }
    }
}
