//! Compile the template into a program that can be executed by the renderer.
//!
//! This process has three stages:
//! - The classifier categorizes each template line.
//! - The parser tracks the open blocks, expands includes and emits the
//!   program, parsing any embedded code along the way.
//! - The linker resolves the block structure of the program into jumps.

mod classify;
mod expr;
mod lex;
mod link;
mod parse;

use tracing::debug;

use crate::types::program::Template;
use crate::{Engine, Result};

pub use crate::compile::lex::is_variable_name;

/// Compile a template into a program.
pub fn template(engine: &Engine<'_>, name: &str, source: &str) -> Result<Template> {
    let program = parse::Parser::new(engine, name, source).parse_program()?;
    let instrs = link::link(&program)?;
    debug!(
        name,
        files = program.files.len(),
        stmts = program.stmts.len(),
        instrs = instrs.len(),
        "compiled template"
    );
    debug!("program listing\n{program}");
    Ok(Template { program, instrs })
}
