/// Construct a [`Value`][crate::Value] from a JSON-like literal.
///
/// Map keys are identifiers or string literals. The outermost braces may be
/// omitted, which is convenient when building a render context.
///
/// ```
/// let ctx = nonhaml::value! {
///     user: { name: "John", age: 42 },
///     tags: ["a", "b", None],
///     headers: { "content-type": "text/plain" },
/// };
/// ```
#[macro_export]
macro_rules! value {
    () => {
        $crate::Value::Map($crate::Map::new())
    };

    (None) => {
        $crate::Value::None
    };

    ({ $($tt:tt)* }) => {
        $crate::_value!(@map [] $($tt)*)
    };

    ([ $($tt:tt)* ]) => {
        $crate::Value::List($crate::_value!(@list [] $($tt)*))
    };

    ($key:tt : $($rest:tt)*) => {
        $crate::_value!(@map [] $key : $($rest)*)
    };

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! _value {
    // Lists collect finished element expressions between the brackets.
    (@list [$($done:expr),*] $(,)?) => {
        ::std::vec![$($done),*]
    };

    (@list [$($done:expr),*] None $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($done,)* $crate::Value::None] $($($rest)*)?)
    };

    (@list [$($done:expr),*] { $($map:tt)* } $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($done,)* $crate::value!({ $($map)* })] $($($rest)*)?)
    };

    (@list [$($done:expr),*] [ $($list:tt)* ] $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($done,)* $crate::value!([ $($list)* ])] $($($rest)*)?)
    };

    (@list [$($done:expr),*] $next:expr , $($rest:tt)*) => {
        $crate::_value!(@list [$($done,)* $crate::Value::from($next)] $($rest)*)
    };

    (@list [$($done:expr),*] $last:expr) => {
        $crate::_value!(@list [$($done,)* $crate::Value::from($last)])
    };

    // Maps collect `(key, value)` pairs between the brackets.
    (@map [$(($key:expr, $value:expr))*] $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::Map::new();
        $(
            map.insert(::std::string::String::from($key), $value);
        )*
        $crate::Value::Map(map)
    }};

    (@map [$($done:tt)*] $key:tt : None $(, $($rest:tt)*)?) => {
        $crate::_value!(@map [$($done)* ($crate::_value_key!($key), $crate::Value::None)] $($($rest)*)?)
    };

    (@map [$($done:tt)*] $key:tt : { $($map:tt)* } $(, $($rest:tt)*)?) => {
        $crate::_value!(@map [$($done)* ($crate::_value_key!($key), $crate::value!({ $($map)* }))] $($($rest)*)?)
    };

    (@map [$($done:tt)*] $key:tt : [ $($list:tt)* ] $(, $($rest:tt)*)?) => {
        $crate::_value!(@map [$($done)* ($crate::_value_key!($key), $crate::value!([ $($list)* ]))] $($($rest)*)?)
    };

    (@map [$($done:tt)*] $key:tt : $next:expr , $($rest:tt)*) => {
        $crate::_value!(@map [$($done)* ($crate::_value_key!($key), $crate::Value::from($next))] $($rest)*)
    };

    (@map [$($done:tt)*] $key:tt : $last:expr) => {
        $crate::_value!(@map [$($done)* ($crate::_value_key!($key), $crate::Value::from($last))])
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! _value_key {
    ($key:ident) => {
        stringify!($key)
    };
    ($key:literal) => {
        $key
    };
}
