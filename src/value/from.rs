use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::value::{List, Map};
use crate::Value;

macro_rules! impl_from {
    ($variant:ident($inner:ty) <= $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(<$inner>::from(v))
                }
            }
        )+
    };
}

impl_from! { Bool(bool) <= bool }
impl_from! { Integer(i64) <= i8, i16, i32, i64, u8, u16, u32 }
impl_from! { Float(f64) <= f32, f64 }
impl_from! { String(String) <= char, String, &str, &String, Box<str>, Cow<'_, str> }

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl<V> From<Option<V>> for Value
where
    V: Into<Value>,
{
    fn from(opt: Option<V>) -> Self {
        opt.map_or(Self::None, Into::into)
    }
}

fn list<V: Into<Value>>(iter: impl IntoIterator<Item = V>) -> Value {
    Value::List(iter.into_iter().map(Into::into).collect::<List<_>>())
}

fn map<K: Into<String>, V: Into<Value>>(iter: impl IntoIterator<Item = (K, V)>) -> Value {
    let entries = iter.into_iter().map(|(k, v)| (k.into(), v.into()));
    Value::Map(entries.collect::<Map<_, _>>())
}

impl<V: Into<Value>> FromIterator<V> for Value {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        list(iter)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        map(iter)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(v: Vec<V>) -> Self {
        list(v)
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for Value {
    fn from(v: [V; N]) -> Self {
        list(v)
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(m: BTreeMap<K, V>) -> Self {
        map(m)
    }
}

impl<K: Into<String>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(m: HashMap<K, V>) -> Self {
        map(m)
    }
}

/// Constructs a map from key value pairs, e.g. `Value::from([("name", "John")])`.
impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Value {
    fn from(pairs: [(K, V); N]) -> Self {
        map(pairs)
    }
}
