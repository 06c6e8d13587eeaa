//! Execute a compiled template.

mod core;
mod iter;
mod stack;
mod value;

use std::io;

use tracing::debug;

use crate::compile::is_variable_name;
use crate::render::core::Renderer;
use crate::render::stack::Stack;
use crate::types::program::Template;
use crate::value::Map;
use crate::{Engine, Error, Result, Value};

/// Render the template to a string.
pub fn template(engine: &Engine<'_>, template: &Template, globals: Value) -> Result<String> {
    let globals = context(globals)?;
    let mut out = String::with_capacity(template.program.files[0].source.len());
    Renderer::new(engine, template, Stack::new(globals)).render(&mut out)?;
    debug!(bytes = out.len(), "rendered template");
    Ok(out)
}

/// Render the template and write the output to the writer.
///
/// Nothing is written unless rendering succeeds.
pub fn template_to<W>(
    engine: &Engine<'_>,
    template: &Template,
    mut writer: W,
    globals: Value,
) -> Result<()>
where
    W: io::Write,
{
    let out = self::template(engine, template, globals)?;
    writer.write_all(out.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Validates the variable context, it must be a map of variable names.
fn context(globals: Value) -> Result<Map<String, Value>> {
    let map = match globals {
        Value::Map(map) => map,
        value => {
            return Err(Error::context(format!(
                "expected a map of variables, found {}",
                value.human()
            )));
        }
    };
    if let Some(key) = map.keys().find(|k| !is_variable_name(k)) {
        return Err(Error::context(format!(
            "`{key}` is not a valid variable name"
        )));
    }
    Ok(map)
}
