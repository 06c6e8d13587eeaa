use std::collections::BTreeMap;

use crate::functions::FunctionArg;
use crate::Value;

pub type Result<T> = std::result::Result<T, Mismatch>;

/// Why a value could not be used as an argument.
#[derive(Debug)]
pub enum Mismatch {
    Type {
        expected: &'static str,
        found: &'static str,
    },
    /// The integer does not fit the parameter's integer type.
    Range { ty: &'static str, value: i64 },
}

impl Mismatch {
    /// Describes the mismatch for the 1-based argument `position`.
    pub fn describe(&self, position: usize) -> String {
        match self {
            Self::Type { expected, found } => {
                format!("function expected {expected} for argument {position}, found {found}")
            }
            Self::Range { ty, value } => format!(
                "function expected {ty} for argument {position}, found out of range integer {value}"
            ),
        }
    }
}

fn mismatch(expected: &'static str, v: &Value) -> Mismatch {
    Mismatch::Type {
        expected,
        found: v.human(),
    }
}

macro_rules! impl_for_variant {
    ($($ty:ty => $variant:ident as $human:literal),+ $(,)?) => {
        $(
            impl FunctionArg for $ty {
                fn from_value(v: Value) -> Result<Self> {
                    match v {
                        Value::$variant(inner) => Ok(inner),
                        v => Err(mismatch($human, &v)),
                    }
                }
            }
        )+
    };
}

impl_for_variant! {
    bool => Bool as "bool",
    String => String as "string",
}

macro_rules! impl_for_int {
    ($($ty:ident)+) => {
        $(
            impl FunctionArg for $ty {
                fn from_value(v: Value) -> Result<Self> {
                    match v {
                        Value::Integer(value) => $ty::try_from(value).map_err(|_| Mismatch::Range {
                            ty: stringify!($ty),
                            value,
                        }),
                        v => Err(mismatch(stringify!($ty), &v)),
                    }
                }
            }
        )+
    };
}

impl_for_int! { i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize }

impl FunctionArg for f64 {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            v => Err(mismatch("f64", &v)),
        }
    }
}

impl FunctionArg for f32 {
    fn from_value(v: Value) -> Result<Self> {
        f64::from_value(v)
            .map(|f| f as f32)
            .map_err(|err| match err {
                Mismatch::Type { found, .. } => Mismatch::Type {
                    expected: "f32",
                    found,
                },
                err => err,
            })
    }
}

impl FunctionArg for () {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::None => Ok(()),
            v => Err(mismatch("nil", &v)),
        }
    }
}

/// `nil` is passed as `None`, anything else must convert to `T`.
impl<T: FunctionArg> FunctionArg for Option<T> {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::None => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

impl<T: FunctionArg> FunctionArg for Vec<T> {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::List(list) => list.into_iter().map(T::from_value).collect(),
            v => Err(mismatch("list", &v)),
        }
    }
}

impl<T: FunctionArg> FunctionArg for BTreeMap<String, T> {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| Ok((k, T::from_value(v)?)))
                .collect(),
            v => Err(mismatch("map", &v)),
        }
    }
}

impl FunctionArg for Value {
    fn from_value(v: Value) -> Result<Self> {
        Ok(v)
    }
}
