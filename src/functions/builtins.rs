//! Builtin functions.
//!
//! These are registered on every new [`Engine`][crate::Engine] when the
//! `builtins` feature is enabled.

use std::collections::BTreeMap;

use crate::format;
use crate::Value;

/// Returns the lowercase equivalent of this string.
///
/// See [`str::to_lowercase`].
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn lower(s: String) -> String {
    s.to_lowercase()
}

/// Returns the uppercase equivalent of this string.
///
/// See [`str::to_uppercase`].
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn upper(s: String) -> String {
    s.to_uppercase()
}

/// Returns the string with leading and trailing whitespace removed.
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn trim(s: String) -> String {
    s.trim().to_owned()
}

/// Replaces all matches of a substring with another substring in a string.
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn replace(s: String, from: String, to: String) -> String {
    s.replace(&from, &to)
}

/// Returns the first element in a list.
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn first(list: Vec<Value>) -> Option<Value> {
    list.into_iter().next()
}

/// Returns the last element in a list.
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn last(list: Vec<Value>) -> Option<Value> {
    list.into_iter().last()
}

/// Returns the map keys as a list.
///
/// See [`BTreeMap::keys()`].
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn keys(map: BTreeMap<String, Value>) -> Vec<String> {
    map.into_keys().collect()
}

/// Returns the map values as a list.
///
/// See [`BTreeMap::values()`].
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn values(map: BTreeMap<String, Value>) -> Vec<Value> {
    map.into_values().collect()
}

/// Returns the number of characters in a string or elements in a list or
/// map.
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn len(value: Value) -> Result<i64, String> {
    let n = match value {
        Value::String(s) => s.chars().count(),
        Value::List(l) => l.len(),
        Value::Map(m) => m.len(),
        value => return Err(format!("unsupported value `{}`", value.human())),
    };
    i64::try_from(n).map_err(|_| String::from("length out of range"))
}

/// Formats each element and joins them using the separator.
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn join(list: Vec<Value>, sep: String) -> Result<String, String> {
    let mut s = String::new();
    for (i, value) in list.iter().enumerate() {
        if i > 0 {
            s.push_str(&sep);
        }
        format::default(&mut s, value)?;
    }
    Ok(s)
}

/// Reverses a list or string.
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn reverse(value: Value) -> Result<Value, String> {
    match value {
        Value::String(string) => Ok(Value::String(string.chars().rev().collect())),
        Value::List(list) => Ok(Value::List(list.into_iter().rev().collect())),
        _ => Err(format!("unsupported value `{}`", value.human())),
    }
}

/// If the value is `nil` returns the given default instead, otherwise returns
/// the value.
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn default(value: Value, default: Value) -> Value {
    match value {
        Value::None => default,
        value => value,
    }
}

/// Formats the value as a string, the same way it would be emitted.
#[cfg_attr(docsrs, doc(cfg(feature = "builtins")))]
pub fn to_s(value: Value) -> Result<String, String> {
    let mut s = String::new();
    format::default(&mut s, &value)?;
    Ok(s)
}
