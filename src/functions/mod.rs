//! Functions that can be called from template expressions.

mod args;
#[cfg(feature = "builtins")]
pub mod builtins;

use std::fmt::Display;

use crate::Value;

pub(crate) type FunctionResult = std::result::Result<Value, String>;

pub(crate) type FunctionFn = dyn Fn(Vec<Value>) -> FunctionResult + Send + Sync + 'static;

pub(crate) fn new<F, R, A>(f: F) -> Box<FunctionFn>
where
    F: Function<R, A> + Send + Sync + 'static,
    R: FunctionReturn,
    A: FunctionArgs,
{
    Box::new(move |values: Vec<Value>| -> FunctionResult {
        let args = A::from_values(values)?;
        let result = Function::call(&f, args);
        FunctionReturn::to_value(result)
    })
}

/// Represents any function that can be called from a template.
///
/// This trait is used by the [`Engine::add_function`][crate::Engine::add_function]
/// method to abstract over a variety of function and closure types. This
/// includes functions with variable argument types, return types and arity.
/// Functions can take up to four arguments. When a function is called as a
/// method, e.g. `name.upper()`, the receiver is passed as the first argument.
/// The renderer checks the number and the type of arguments when the
/// function is called.
///
/// [`Function`] is implemented for functions that return any of the
/// following types.
///
/// - `R` where `R` implements `Into<Value>`
/// - `Result<R, E>` where `R` implements `Into<Value>` and `E` implements
///   [`Display`]
///
/// [`Function`] is implemented for functions that take any of the following
/// owned types as arguments.
/// - [`bool`]
/// - any integer type
/// - [`f32`] and [`f64`]
/// - [`String`]
/// - [`Value`]
/// - [`Option<T>`], receiving `None` for `nil`
/// - [`Vec<T>`] and [`BTreeMap<String, T>`][std::collections::BTreeMap]
///   where `T` is any of these types
///
/// ## Examples
///
/// Consider the following template.
///
/// ```text
/// = user.name.split(" ").last()
/// ```
///
/// We could implement the `split` function like this:
///
/// ```rust
/// use nonhaml::Engine;
///
/// let mut engine = Engine::new();
/// engine.add_function("split", split);
///
/// fn split(s: String, sep: String) -> Vec<String> {
///     s.split(sep.as_str()).map(String::from).collect()
/// }
/// ```
pub trait Function<R, A> {
    #[doc(hidden)]
    fn call(&self, args: A) -> R;
}

/// Converts the evaluated arguments into the argument tuple of a function.
pub trait FunctionArgs: Sized {
    #[doc(hidden)]
    fn from_values(values: Vec<Value>) -> std::result::Result<Self, String>;
}

/// A single function argument.
pub trait FunctionArg: Sized {
    #[doc(hidden)]
    fn from_value(v: Value) -> args::Result<Self>;
}

/// The return type of a function.
pub trait FunctionReturn {
    #[doc(hidden)]
    fn to_value(self) -> std::result::Result<Value, String>;
}

////////////////////////////////////////////////////////////////////////////////
// Function and FunctionArgs
////////////////////////////////////////////////////////////////////////////////

macro_rules! impl_function {
    ($n:literal $(, $arg:ident: $ty:ident)*) => {
        impl<Func, R, $($ty,)*> Function<R, ($($ty,)*)> for Func
        where
            Func: Fn($($ty),*) -> R,
            R: FunctionReturn,
            $($ty: FunctionArg,)*
        {
            #[doc(hidden)]
            fn call(&self, ($($arg,)*): ($($ty,)*)) -> R {
                self($($arg),*)
            }
        }

        impl<$($ty,)*> FunctionArgs for ($($ty,)*)
        where
            $($ty: FunctionArg,)*
        {
            fn from_values(values: Vec<Value>) -> std::result::Result<Self, String> {
                check_args(&values, $n)?;
                #[allow(unused_mut, unused_variables)]
                let mut iter = values.into_iter().enumerate();
                $(
                    let $arg = get_arg::<$ty>(&mut iter)?;
                )*
                Ok(($($arg,)*))
            }
        }
    };
}

impl_function! { 0 }
impl_function! { 1, a: A }
impl_function! { 2, a: A, b: B }
impl_function! { 3, a: A, b: B, c: C }
impl_function! { 4, a: A, b: B, c: C, d: D }

fn check_args(values: &[Value], exp: usize) -> std::result::Result<(), String> {
    if values.len() == exp {
        Ok(())
    } else {
        Err(format!(
            "function expected {} arguments, found {}",
            exp,
            values.len()
        ))
    }
}

fn get_arg<T>(iter: &mut impl Iterator<Item = (usize, Value)>) -> std::result::Result<T, String>
where
    T: FunctionArg,
{
    let (i, value) = iter
        .next()
        .ok_or_else(|| String::from("function expected more arguments"))?;
    T::from_value(value).map_err(|err| err.describe(i + 1))
}

////////////////////////////////////////////////////////////////////////////////
// FunctionReturn
////////////////////////////////////////////////////////////////////////////////

impl<T> FunctionReturn for T
where
    T: Into<Value>,
{
    fn to_value(self) -> std::result::Result<Value, String> {
        Ok(self.into())
    }
}

impl<T, E> FunctionReturn for std::result::Result<T, E>
where
    T: Into<Value>,
    E: Display,
{
    fn to_value(self) -> std::result::Result<Value, String> {
        self.map(Into::into).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call<F, R, A>(f: F, args: Vec<Value>) -> std::result::Result<Value, String>
    where
        F: Function<R, A> + Send + Sync + 'static,
        R: FunctionReturn,
        A: FunctionArgs,
    {
        new(f)(args)
    }

    #[test]
    fn function_arity_zero() {
        let result = call(|| 42, vec![]);
        assert_eq!(result, Ok(Value::Integer(42)));
    }

    #[test]
    fn function_converts_args() {
        let result = call(
            |s: String, n: usize| s.repeat(n),
            vec![Value::from("ab"), Value::from(3)],
        );
        assert_eq!(result, Ok(Value::from("ababab")));
    }

    #[test]
    fn function_err_arg_count() {
        let result = call(|s: String| s, vec![]);
        assert_eq!(
            result,
            Err(String::from("function expected 1 arguments, found 0"))
        );
    }

    #[test]
    fn function_err_arg_type() {
        let result = call(|_: String, n: i64| n, vec![Value::from("a"), Value::from(true)]);
        assert_eq!(
            result,
            Err(String::from(
                "function expected i64 for argument 2, found bool"
            ))
        );
    }

    #[test]
    fn function_err_int_range() {
        let result = call(|n: u8| n, vec![Value::from(300)]);
        assert_eq!(
            result,
            Err(String::from(
                "function expected u8 for argument 1, found out of range integer 300"
            ))
        );
    }

    #[test]
    fn function_returns_result() {
        let result = call(
            |s: String| -> Result<String, &'static str> {
                Err(if s.is_empty() { "empty" } else { "no" })
            },
            vec![Value::from("")],
        );
        assert_eq!(result, Err(String::from("empty")));
    }
}
