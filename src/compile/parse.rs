use tracing::{debug, trace};

use crate::compile::classify::{classify, BlockKind, LineKind};
use crate::compile::expr::Parser as ExprParser;
use crate::types::ast;
use crate::types::program::{File, Format, Program, Snippet, Stmt};
use crate::types::span::Span;
use crate::{Engine, Error, Result, Value};

/// A parser that walks the template line by line, tracks the open blocks and
/// emits the program.
pub struct Parser<'engine> {
    engine: &'engine Engine<'engine>,

    /// Every file that contributed to the program, the root file is first.
    files: Vec<File>,

    /// The emitted program.
    stmts: Vec<Stmt>,
}

/// The parsing state for a single file.
struct State {
    /// The index of the file in the program.
    file: usize,

    /// The indentation of the include directive that pulled in this file.
    base_indent: usize,

    /// The control indentation of the include directive that pulled in this
    /// file.
    base_control: usize,

    /// How many includes deep this file is.
    include_depth: usize,

    /// The blocks that are currently open, innermost last.
    blocks: Vec<Frame>,

    /// Blank lines that have not been emitted yet.
    blanks: Vec<usize>,
}

/// An open block.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// The indentation of the block header.
    depth: usize,
    kind: BlockKind,
}

impl<'engine> Parser<'engine> {
    pub fn new(engine: &'engine Engine<'engine>, name: &str, source: &str) -> Self {
        Self {
            engine,
            files: vec![File {
                name: name.to_owned(),
                source: source.to_owned(),
            }],
            stmts: Vec::new(),
        }
    }

    /// Parses the root template and any included templates.
    pub fn parse_program(mut self) -> Result<Program> {
        self.parse_file(State::new(0, 0, 0, 0))?;
        Ok(Program {
            files: self.files,
            stmts: self.stmts,
        })
    }

    fn parse_file(&mut self, mut state: State) -> Result<()> {
        let source = self.files[state.file].source.clone();
        for (i, raw) in source.lines().enumerate() {
            let line = classify(&self.engine.syntax, raw, state.base_indent);
            trace!(
                file = %self.files[state.file].name,
                line = i + 1,
                indent = line.indent,
                kind = ?line.kind,
                "classified line"
            );
            self.parse_line(&mut state, i, raw, line.indent, line.kind)
                .map_err(|err| err.locate(&self.files[state.file], i))?;
        }
        let closed = self.dedent(&mut state, 0, None);
        self.flush_blanks(&mut state, closed);
        Ok(())
    }

    fn parse_line(
        &mut self,
        state: &mut State,
        i: usize,
        raw: &str,
        indent: usize,
        kind: LineKind,
    ) -> Result<()> {
        match kind {
            LineKind::Block { kind, code } => {
                let node = ExprParser::new(raw, code).parse_header()?;
                if kind.is_continuation() {
                    self.mark(i);
                    let closed = self.dedent(state, indent, Some(kind));
                    if self.flush_blanks(state, closed) {
                        self.mark(i);
                    }
                } else {
                    let closed = self.dedent(state, indent, None);
                    self.flush_blanks(state, closed);
                    self.mark(i);
                }
                self.push(Stmt::RawCode(Snippet {
                    raw: raw[code].to_owned(),
                    node,
                }));
                state.blocks.push(Frame {
                    depth: indent,
                    kind,
                });
            }

            LineKind::Blank => {
                state.blanks.push(i);
            }

            kind => {
                let closed = self.dedent(state, indent, None);
                self.flush_blanks(state, closed);
                self.mark(i);
                self.parse_simple_line(state, raw, indent, kind)?;
            }
        }
        Ok(())
    }

    /// Parses a line that neither opens a block nor is blank.
    fn parse_simple_line(
        &mut self,
        state: &mut State,
        raw: &str,
        indent: usize,
        kind: LineKind,
    ) -> Result<()> {
        match kind {
            LineKind::Include { path, span } => {
                self.target_indent(state, indent)?;
                self.expand_include(state, path, span, indent)?;
            }

            LineKind::Statement { code } => {
                let node = ExprParser::new(raw, code).parse_statement()?;
                self.push(Stmt::RawCode(Snippet {
                    raw: raw[code].to_owned(),
                    node,
                }));
            }

            LineKind::Output { expr } => {
                let target = self.target_indent(state, indent)?;
                let snippet = if expr.m == expr.n {
                    let node = ast::Expr::Literal(ast::Literal {
                        value: Value::String(String::new()),
                        span: expr,
                    });
                    Snippet {
                        raw: String::from("\"\""),
                        node,
                    }
                } else {
                    let node = ExprParser::new(raw, expr).parse_expr_only()?;
                    Snippet {
                        raw: raw[expr].to_owned(),
                        node,
                    }
                };
                self.push(Stmt::EmitEval(target, snippet));
            }

            LineKind::Literal { text } => {
                let target = self.target_indent(state, indent)?;
                let format = self.parse_format(raw, text)?;
                self.push(Stmt::EmitLiteral(target, format));
            }

            LineKind::Block { .. } | LineKind::Blank => unreachable!(),
        }
        Ok(())
    }

    /// Parses the included file in place, inheriting the current indentation.
    ///
    /// The include line closes blocks like any other line and the included
    /// file's own blocks are closed at its end.
    ///
    /// A file that can't be read compiles to a statement that fails when it
    /// is executed.
    fn expand_include(
        &mut self,
        state: &State,
        path: String,
        span: Span,
        indent: usize,
    ) -> Result<()> {
        let max = self.engine.max_include_depth;
        if state.include_depth >= max {
            return Err(Error::include_depth(max).with_span(span));
        }
        match self.engine.loader.load(&path) {
            Ok(source) => {
                debug!(path = %path, depth = state.include_depth + 1, "expanding include");
                let id = self.files.len();
                self.files.push(File { name: path, source });
                self.push(Stmt::PushFilename(id));
                let control = self.control_indent(state);
                self.parse_file(State::new(id, indent, control, state.include_depth + 1))?;
                self.push(Stmt::PopFilename);
            }
            Err(err) => {
                debug!(path = %path, error = %err, "include missing");
                self.push(Stmt::RaiseMissingInclude(path));
            }
        }
        Ok(())
    }

    /// Closes every block whose header is indented at least `depth`.
    ///
    /// When continuing a conditional with `elsif` or `else` the conditional
    /// at exactly `depth` is popped without being closed. Returns whether
    /// any block was closed.
    fn dedent(&mut self, state: &mut State, depth: usize, next: Option<BlockKind>) -> bool {
        let mut closed = false;
        while let Some(frame) = state.blocks.last().copied() {
            if frame.depth < depth {
                break;
            }
            state.blocks.pop();
            let suppress = frame.depth == depth
                && next.map(|next| frame.kind.continues(next)).unwrap_or(false);
            if !suppress {
                self.push(Stmt::CloseBlock);
                closed = true;
            }
        }
        closed
    }

    /// Emits the deferred blank lines, dropping the first one if a block was
    /// just closed. Returns whether anything was emitted.
    fn flush_blanks(&mut self, state: &mut State, closed: bool) -> bool {
        let skip = usize::from(closed);
        let mut emitted = false;
        for i in state.blanks.drain(..).skip(skip) {
            self.stmts.push(Stmt::SetLastLine(i));
            self.stmts.push(Stmt::EmitBlank);
            emitted = true;
        }
        emitted
    }

    /// Extracts the interpolations in a literal line.
    fn parse_format(&self, raw: &str, text: Span) -> Result<Format> {
        let (begin, end) = &self.engine.syntax.interp;
        let mut template = String::with_capacity(text.n - text.m);
        let mut subs = Vec::new();
        let mut i = text.m;
        while let Some(b) = raw[i..text.n].find(begin.as_str()) {
            let m = i + b + begin.len();
            let n = match raw[m..text.n].find(end.as_str()) {
                Some(e) => m + e,
                None => break,
            };
            template.push_str(&raw[i..i + b].replace('%', "%%"));
            template.push_str("%s");
            let span = Span::from(m..n);
            let node = ExprParser::new(raw, span).parse_expr_only()?;
            subs.push(Snippet {
                raw: raw[span].trim().to_owned(),
                node,
            });
            i = n + end.len();
        }
        template.push_str(&raw[i..text.n].replace('%', "%%"));
        Ok(Format { template, subs })
    }

    /// The number of columns used by the open blocks.
    fn control_indent(&self, state: &State) -> usize {
        state.base_control + 2 * state.blocks.len()
    }

    /// The indentation of emitted output, relative to the enclosing block.
    fn target_indent(&self, state: &State, indent: usize) -> Result<usize> {
        let control = self.control_indent(state);
        indent.checked_sub(control).ok_or_else(|| {
            Error::indentation(format!(
                "line is indented {indent} spaces but the enclosing block requires {control}"
            ))
        })
    }

    /// Records the source line that the next statements belong to.
    fn mark(&mut self, i: usize) {
        self.push(Stmt::SetLastLine(i));
    }

    fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }
}

impl State {
    fn new(file: usize, base_indent: usize, base_control: usize, include_depth: usize) -> Self {
        Self {
            file,
            base_indent,
            base_control,
            include_depth,
            blocks: Vec::new(),
            blanks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::MemoryLoader;

    fn parse(source: &str) -> Result<Program> {
        let engine = Engine::new();
        Parser::new(&engine, "test", source).parse_program()
    }

    fn listing(program: &Program) -> Vec<String> {
        program
            .stmts
            .iter()
            .filter(|stmt| !matches!(stmt, Stmt::SetLastLine(_)))
            .map(|stmt| match stmt {
                Stmt::RawCode(code) => code.raw.clone(),
                Stmt::EmitEval(i, expr) => format!("emit {i} ({})", expr.raw),
                Stmt::EmitBlank => String::from("blank"),
                Stmt::EmitLiteral(i, format) => format!("emit {i} {:?}", format.template),
                Stmt::CloseBlock => String::from("end"),
                Stmt::RaiseMissingInclude(path) => format!("missing {path}"),
                Stmt::PushFilename(id) => format!("push {}", program.files[*id].name),
                Stmt::PopFilename => String::from("pop"),
                Stmt::SetLastLine(_) => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn parse_if_else_chain_closes_once() {
        let program = parse("- if a\n  x\n- elsif b\n  y\n- else\n  z\n").unwrap();
        assert_eq!(
            listing(&program),
            [
                "if a",
                "emit 0 \"x\"",
                "elsif b",
                "emit 0 \"y\"",
                "else",
                "emit 0 \"z\"",
                "end",
            ]
        );
    }

    #[test]
    fn parse_dedent_closes_innermost_first() {
        let program = parse("- for x in xs\n  - if x\n    = x\n  after\ndone").unwrap();
        assert_eq!(
            listing(&program),
            [
                "for x in xs",
                "if x",
                "emit 0 (x)",
                "end",
                "emit 0 \"after\"",
                "end",
                "emit 0 \"done\"",
            ]
        );
    }

    #[test]
    fn parse_else_closes_nested_blocks() {
        let program = parse("- if a\n  - for x in xs\n    = x\n- else\n  none").unwrap();
        assert_eq!(
            listing(&program),
            [
                "if a",
                "for x in xs",
                "emit 0 (x)",
                "end",
                "else",
                "emit 0 \"none\"",
                "end",
            ]
        );
    }

    #[test]
    fn parse_unless_else() {
        let program = parse("- unless a\n  x\n- else\n  y").unwrap();
        assert_eq!(
            listing(&program),
            ["unless a", "emit 0 \"x\"", "else", "emit 0 \"y\"", "end"]
        );
    }

    #[test]
    fn parse_blank_after_dedent_dropped_once() {
        let program = parse("- if a\n  x\n\n\ny").unwrap();
        assert_eq!(
            listing(&program),
            ["if a", "emit 0 \"x\"", "end", "blank", "emit 0 \"y\""]
        );
    }

    #[test]
    fn parse_blank_inside_block_does_not_close_it() {
        let program = parse("- if a\n  x\n\n  y").unwrap();
        assert_eq!(
            listing(&program),
            ["if a", "emit 0 \"x\"", "blank", "emit 0 \"y\"", "end"]
        );
    }

    #[test]
    fn parse_blank_without_dedent_kept() {
        let program = parse("a\n\nb\n").unwrap();
        assert_eq!(listing(&program), ["emit 0 \"a\"", "blank", "emit 0 \"b\""]);
    }

    #[test]
    fn parse_blank_before_else_stays_in_branch() {
        let program = parse("- if a\n  x\n\n- else\n  y").unwrap();
        assert_eq!(
            listing(&program),
            [
                "if a",
                "emit 0 \"x\"",
                "blank",
                "else",
                "emit 0 \"y\"",
                "end",
            ]
        );
    }

    #[test]
    fn parse_blank_before_else_after_nested_block() {
        let program = parse("- if a\n  - if b\n    x\n\n- else\n  y").unwrap();
        assert_eq!(
            listing(&program),
            [
                "if a",
                "if b",
                "emit 0 \"x\"",
                "end",
                "else",
                "emit 0 \"y\"",
                "end",
            ]
        );
    }

    #[test]
    fn parse_trailing_blank_after_block_dropped() {
        let program = parse("- if a\n  x\n\n").unwrap();
        assert_eq!(listing(&program), ["if a", "emit 0 \"x\"", "end"]);
    }

    #[test]
    fn parse_literal_interpolation_and_percent() {
        let program = parse("  100% of #{ name } and #{a + b}").unwrap();
        let Stmt::EmitLiteral(indent, format) = &program.stmts[1] else {
            panic!("expected literal, got {:?}", program.stmts[1]);
        };
        assert_eq!(*indent, 2);
        assert_eq!(format.template, "100%% of %s and %s");
        let subs: Vec<_> = format.subs.iter().map(|s| s.raw.as_str()).collect();
        assert_eq!(subs, ["name", "a + b"]);
    }

    #[test]
    fn parse_literal_unclosed_interpolation_is_text() {
        let program = parse("a #{ b").unwrap();
        assert_eq!(listing(&program), ["emit 0 \"a #{ b\""]);
    }

    #[test]
    fn parse_empty_output_is_empty_string() {
        let program = parse("=").unwrap();
        assert_eq!(listing(&program), ["emit 0 (\"\")"]);
    }

    #[test]
    fn parse_output_keeps_extra_indentation() {
        let program = parse("- if a\n      = x").unwrap();
        assert_eq!(listing(&program), ["if a", "emit 4 (x)", "end"]);
    }

    #[test]
    fn parse_err_underindented_body() {
        let err = parse("- if a\n  - if b\n   x").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Indentation);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn parse_err_located_at_line() {
        let err = parse("a\nb\n= 1 +").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Syntax);
        assert_eq!(err.file(), Some("test"));
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn parse_include_inherits_indentation() {
        let mut loader = MemoryLoader::new();
        loader.insert("row", "- for c in cells\n  <td>#{c}</td>\n");
        let mut engine = Engine::new();
        engine.set_loader(loader);
        let program = Parser::new(&engine, "test", "- if a\n    = include 'row'\n")
            .parse_program()
            .unwrap();
        assert_eq!(
            listing(&program),
            [
                "if a",
                "push row",
                "for c in cells",
                "emit 2 \"<td>%s</td>\"",
                "end",
                "pop",
                "end",
            ]
        );
    }

    #[test]
    fn parse_include_missing() {
        let engine = Engine::new();
        let program = Parser::new(&engine, "test", "= include 'nope'")
            .parse_program()
            .unwrap();
        assert_eq!(listing(&program), ["missing nope"]);
    }

    #[test]
    fn parse_include_depth_exceeded() {
        let mut loader = MemoryLoader::new();
        loader.insert("self", "= include 'self'");
        let mut engine = Engine::new();
        engine.set_loader(loader);
        engine.set_max_include_depth(3);
        let err = Parser::new(&engine, "self", "= include 'self'")
            .parse_program()
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::IncludeDepth);
        assert_eq!(err.file(), Some("self"));
    }
}
