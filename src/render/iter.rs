use std::iter;
use std::ops::RangeInclusive;
use std::vec;

use crate::render::value;
use crate::types::span::Span;
use crate::value::Map;
use crate::{Error, Result, Value};

/// The state of a running loop.
#[cfg_attr(test, derive(Debug))]
pub struct LoopState {
    vars: Vec<String>,
    items: Items,

    /// Whether an iteration scope has been pushed.
    pub started: bool,
}

/// The evaluated iterable of a loop.
pub enum Source {
    /// An integer range that has not been collected.
    Range(i64, i64),
    Value(Value),
}

/// The values for every iteration of a loop.
///
/// Lists and maps are collected when the loop starts, integer ranges are
/// produced one at a time.
#[cfg_attr(test, derive(Debug))]
pub enum Items {
    List(vec::IntoIter<Vec<Value>>),
    Range(RangeInclusive<i64>),
}

impl LoopState {
    pub fn new(vars: Vec<String>, items: Items) -> Self {
        Self {
            vars,
            items,
            started: false,
        }
    }

    /// Returns the variables for the next iteration.
    pub fn iterate(&mut self) -> Option<Map<String, Value>> {
        let values = self.items.next()?;
        self.started = true;
        Some(bind(&self.vars, values))
    }
}

impl Source {
    fn into_value(self, span: Span) -> Result<Value> {
        match self {
            Self::Range(a, b) => value::range(a, b, span),
            Self::Value(value) => Ok(value),
        }
    }
}

impl Iterator for Items {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::List(items) => items.next(),
            Self::Range(range) => range.next().map(|i| vec![Value::Integer(i)]),
        }
    }
}

impl FromIterator<Vec<Value>> for Items {
    fn from_iter<I: IntoIterator<Item = Vec<Value>>>(iter: I) -> Self {
        Self::List(iter.into_iter().collect::<Vec<_>>().into_iter())
    }
}

/// Binds the values of one iteration to the loop variables.
///
/// A single variable receives all the values as a list if there is more than
/// one, otherwise values are bound in order and missing values are `nil`.
fn bind(vars: &[String], values: Vec<Value>) -> Map<String, Value> {
    match vars {
        [] => Map::new(),
        [var] if values.len() > 1 => {
            let mut scope = Map::new();
            scope.insert(var.clone(), Value::List(values));
            scope
        }
        vars => vars
            .iter()
            .cloned()
            .zip(values.into_iter().chain(iter::repeat(Value::None)))
            .collect(),
    }
}

/// Returns the items of a `for` loop.
pub fn for_items(iterable: Source, vars: usize, span: Span) -> Result<Items> {
    match iterable {
        Source::Range(a, b) => Ok(Items::Range(a..=b)),
        Source::Value(Value::List(list)) => Ok(list_items(list, vars)),
        Source::Value(Value::Map(map)) => Ok(pairs(map)),
        Source::Value(value) => Err(Error::render(
            format!(
                "expected iterable, but expression evaluated to {}",
                value.human()
            ),
            span,
        )),
    }
}

/// Returns the items of a generic block.
pub fn block_items(method: &str, receiver: Source, params: usize, span: Span) -> Result<Items> {
    if method == "each" {
        return for_items(receiver, params, span);
    }
    let err = |value: &Value, exp: &str| {
        Error::render(
            format!("`{method}` expected {exp}, found {}", value.human()),
            span,
        )
    };
    match (method, receiver.into_value(span)?) {
        ("each_with_index", Value::List(list)) => Ok(list
            .into_iter()
            .zip(0..)
            .map(|(item, i)| vec![item, Value::Integer(i)])
            .collect()),
        ("each_with_index", Value::Map(map)) => Ok(map
            .into_iter()
            .zip(0..)
            .map(|((k, v), i)| {
                let pair = Value::List(vec![Value::String(k), v]);
                vec![pair, Value::Integer(i)]
            })
            .collect()),
        ("each_with_index", receiver) => Err(err(&receiver, "a list or map")),

        ("each_pair", Value::Map(map)) => Ok(pairs(map)),
        ("each_pair", receiver) => Err(err(&receiver, "a map")),

        ("times", Value::Integer(n)) => Ok(Items::Range(0..=n.saturating_sub(1))),
        ("times", receiver) => Err(err(&receiver, "an integer")),

        (method, _) => Err(Error::render(
            format!("unknown block method `{method}`"),
            span,
        )),
    }
}

/// List items are destructured when there is more than one loop variable.
fn list_items(list: Vec<Value>, vars: usize) -> Items {
    list.into_iter()
        .map(|item| match item {
            Value::List(inner) if vars > 1 => inner,
            item => vec![item],
        })
        .collect()
}

fn pairs(map: Map<String, Value>) -> Items {
    map.into_iter()
        .map(|(k, v)| vec![Value::String(k), v])
        .collect()
}
