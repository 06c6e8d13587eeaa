//! Formatting of values and indentation of rendered output.

use std::fmt::Write;

use crate::Value;

/// The value formatter.
///
/// Values are formatted as follows:
/// - [`Value::None`]: empty string
/// - [`Value::Bool`]: `true` or `false`
/// - [`Value::Integer`]: the integer formatted using [`Display`][std::fmt::Display]
/// - [`Value::Float`]: the float formatted using [`Display`][std::fmt::Display]
/// - [`Value::String`]: the string, unescaped
///
/// Errors if the value is a [`Value::List`] or [`Value::Map`].
pub fn default(buf: &mut String, value: &Value) -> Result<(), String> {
    match value {
        Value::None => {}
        Value::Bool(b) => write!(buf, "{b}").map_err(|e| e.to_string())?,
        Value::Integer(n) => write!(buf, "{n}").map_err(|e| e.to_string())?,
        Value::Float(n) => write!(buf, "{n}").map_err(|e| e.to_string())?,
        Value::String(s) => buf.push_str(s),
        value => {
            return Err(format!(
                "expression evaluated to unformattable type {}",
                value.human()
            ));
        }
    }
    Ok(())
}

/// Appends each line of the text to the output, indented by `indent` spaces
/// and without trailing whitespace.
///
/// Empty text appends nothing.
pub fn concat(out: &mut String, indent: usize, text: &str) {
    for line in text.lines() {
        out.extend(std::iter::repeat(' ').take(indent));
        out.push_str(line.trim_end());
        out.push('\n');
    }
}
