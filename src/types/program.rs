//! Defines the emitted [`Program`], a flat sequence of [`Stmt`], and the
//! linked sequence of [`Instr`] that is executed by the renderer.

use std::fmt;

use crate::types::ast;

pub const FIXME: usize = !0;

/// A compiled template, both the emitted statements and the linked
/// instructions.
#[derive(Debug)]
pub struct Template {
    pub program: Program,
    pub instrs: Vec<Instr>,
}

/// The program emitted by the parser.
///
/// Files are indexed by the `PushFilename` statement, the root template is
/// always the first file.
#[derive(Debug, Clone)]
pub struct Program {
    pub files: Vec<File>,
    pub stmts: Vec<Stmt>,
}

/// A template file that contributed statements to a program.
#[derive(Debug, Clone)]
pub struct File {
    pub name: String,
    pub source: String,
}

/// Parsed code, together with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct Snippet<T> {
    pub raw: String,
    pub node: T,
}

/// A literal line with placeholders.
///
/// `%s` is a placeholder for the next substitution and `%%` is a literal `%`.
#[derive(Debug, Clone)]
pub struct Format {
    pub template: String,
    pub subs: Vec<Snippet<ast::Expr>>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// A line of code, possibly opening a block.
    RawCode(Snippet<ast::Code>),

    /// Records the source line that the following statements belong to.
    SetLastLine(usize),

    /// Evaluate and emit an expression at the given indentation.
    EmitEval(usize, Snippet<ast::Expr>),

    /// Emit a single newline.
    EmitBlank,

    /// Emit a literal line at the given indentation.
    EmitLiteral(usize, Format),

    /// Close the innermost open block.
    CloseBlock,

    /// Fail with a missing include error.
    RaiseMissingInclude(String),

    /// Enter an included file.
    PushFilename(usize),

    /// Leave an included file.
    PopFilename,
}

#[derive(Debug, Clone)]
pub enum Instr {
    /// Update the last ok line.
    Line(usize),

    /// Jump to an instruction
    Jump(usize),

    /// Jump to the instruction if the expression is falsy
    JumpIfFalse(usize, ast::Expr),

    /// Jump to the instruction if the expression is truthy
    JumpIfTrue(usize, ast::Expr),

    /// Start a loop over the iterable
    LoopStart(Iterable),

    /// Advance and bind the loop variables, or finish the loop and jump
    LoopNext(usize),

    /// Assign a value to a variable
    Assign(ast::Assign),

    /// Evaluate an expression and discard the result
    Eval(ast::Expr),

    /// Evaluate and emit an expression
    EmitEval(usize, ast::Expr),

    /// Substitute and emit a literal line
    EmitLiteral(usize, Format),

    /// Emit a newline
    EmitBlank,

    /// Enter an included file
    PushFile(usize),

    /// Leave an included file
    PopFile,

    /// Fail with a missing include error
    MissingInclude(String),
}

#[derive(Debug, Clone)]
pub enum Iterable {
    For(ast::ForLoop),
    Do(ast::DoBlock),
}

impl Format {
    /// Fills the placeholders with the given values, in order.
    pub fn substitute(&self, values: &[String]) -> String {
        let mut s = String::with_capacity(self.template.len());
        let mut values = values.iter();
        let mut chars = self.template.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                s.push(c);
                continue;
            }
            match chars.next() {
                Some('s') => {
                    if let Some(v) = values.next() {
                        s.push_str(v);
                    }
                }
                Some(c) => s.push(c),
                None => s.push('%'),
            }
        }
        s
    }
}

impl fmt::Display for Program {
    /// Writes a line numbered listing of the program.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth: usize = 0;
        for (i, stmt) in self.stmts.iter().enumerate() {
            let level = match stmt {
                Stmt::RawCode(Snippet {
                    node: ast::Code::Elsif(_) | ast::Code::Else,
                    ..
                }) => depth.saturating_sub(1),
                Stmt::CloseBlock => {
                    depth = depth.saturating_sub(1);
                    depth
                }
                _ => depth,
            };
            write!(f, "{:3}  {:indent$}", i + 1, "", indent = level * 2)?;
            match stmt {
                Stmt::RawCode(code) => write!(f, "{}", code.raw)?,
                Stmt::SetLastLine(line) => write!(f, "last_ok_line = {line}")?,
                Stmt::EmitEval(indent, expr) => write!(f, "emit {indent}, ({})", expr.raw)?,
                Stmt::EmitBlank => write!(f, "emit_blank")?,
                Stmt::EmitLiteral(indent, format) => {
                    write!(f, "emit {indent}, {:?} % [", format.template)?;
                    for (j, sub) in format.subs.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "({})", sub.raw)?;
                    }
                    write!(f, "]")?;
                }
                Stmt::CloseBlock => write!(f, "end")?,
                Stmt::RaiseMissingInclude(path) => write!(f, "raise missing_include {path:?}")?,
                Stmt::PushFilename(id) => {
                    let name = self.files.get(*id).map(|file| file.name.as_str());
                    write!(f, "push_filename {:?}", name.unwrap_or_default())?
                }
                Stmt::PopFilename => write!(f, "pop_filename")?,
            }
            writeln!(f)?;
            if let Stmt::RawCode(code) = stmt {
                if code.node.opens_block() {
                    depth += 1;
                }
            }
        }
        Ok(())
    }
}

impl ast::Code {
    /// Whether this code opens a block that must later be closed.
    ///
    /// `elsif` and `else` continue a block rather than opening one.
    pub fn opens_block(&self) -> bool {
        matches!(
            self,
            Self::If(_) | Self::Unless(_) | Self::For(_) | Self::Do(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(template: &str) -> Format {
        Format {
            template: template.into(),
            subs: Vec::new(),
        }
    }

    #[test]
    fn format_substitute() {
        let f = format("Hello %s, you are %s!");
        assert_eq!(f.substitute(&["World".into(), "42".into()]), "Hello World, you are 42!");
    }

    #[test]
    fn format_substitute_escaped_percent() {
        let f = format("100%% of %s");
        assert_eq!(f.substitute(&["tests".into()]), "100% of tests");
    }

    #[test]
    fn format_substitute_value_with_percent() {
        let f = format("%s%%");
        assert_eq!(f.substitute(&["%s".into()]), "%s%");
    }
}
