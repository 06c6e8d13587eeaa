use crate::types::ast;
use crate::types::program::{Instr, Iterable, Program, Stmt, FIXME};
use crate::{Error, Result};

/// Resolves the block structure of the emitted program into jumps.
pub fn link(program: &Program) -> Result<Vec<Instr>> {
    Linker::new(program).link()
}

struct Linker<'a> {
    program: &'a Program,
    instrs: Vec<Instr>,

    /// The blocks that are open at the current statement.
    blocks: Vec<Block>,

    /// The active files, used to locate errors.
    files: Vec<usize>,

    /// The last source line marker.
    line: usize,
}

enum Block {
    /// An `if` or `unless` chain.
    Cond {
        /// The conditional jump of the current branch.
        next: Option<usize>,
        /// The jumps at the end of each taken branch.
        exits: Vec<usize>,
        elsif_ok: bool,
        has_else: bool,
    },

    /// A loop, `next` is the instruction that advances it.
    Loop { next: usize },

    /// The start of an included file.
    Include,
}

impl<'a> Linker<'a> {
    fn new(program: &'a Program) -> Self {
        Self {
            program,
            instrs: Vec::with_capacity(program.stmts.len()),
            blocks: Vec::new(),
            files: vec![0],
            line: 0,
        }
    }

    fn link(mut self) -> Result<Vec<Instr>> {
        let program = self.program;
        for stmt in &program.stmts {
            self.link_stmt(stmt)?;
        }
        if !self.blocks.is_empty() {
            return Err(self.err("block was never closed"));
        }
        Ok(self.instrs)
    }

    fn link_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::RawCode(code) => self.link_code(&code.node)?,

            Stmt::SetLastLine(line) => {
                self.line = *line;
                self.push(Instr::Line(*line));
            }

            Stmt::EmitEval(indent, expr) => {
                self.push(Instr::EmitEval(*indent, expr.node.clone()));
            }

            Stmt::EmitBlank => {
                self.push(Instr::EmitBlank);
            }

            Stmt::EmitLiteral(indent, format) => {
                self.push(Instr::EmitLiteral(*indent, format.clone()));
            }

            Stmt::CloseBlock => match self.blocks.pop() {
                Some(Block::Cond { next, exits, .. }) => {
                    if let Some(j) = next {
                        self.update_jump(j);
                    }
                    for j in exits {
                        self.update_jump(j);
                    }
                }
                Some(Block::Loop { next }) => {
                    self.push(Instr::Jump(next));
                    self.update_jump(next);
                }
                Some(Block::Include) | None => {
                    return Err(self.err("unexpected end of block"));
                }
            },

            Stmt::RaiseMissingInclude(path) => {
                self.push(Instr::MissingInclude(path.clone()));
            }

            Stmt::PushFilename(id) => {
                self.blocks.push(Block::Include);
                self.files.push(*id);
                self.push(Instr::PushFile(*id));
            }

            Stmt::PopFilename => {
                if !matches!(self.blocks.last(), Some(Block::Include)) {
                    return Err(self.err("block left open at the end of the included file"));
                }
                self.blocks.pop();
                self.files.pop();
                self.push(Instr::PopFile);
            }
        }
        Ok(())
    }

    fn link_code(&mut self, code: &ast::Code) -> Result<()> {
        match code {
            ast::Code::If(cond) => {
                let j = self.push(Instr::JumpIfFalse(FIXME, cond.clone()));
                self.blocks.push(Block::Cond {
                    next: Some(j),
                    exits: Vec::new(),
                    elsif_ok: true,
                    has_else: false,
                });
            }

            ast::Code::Unless(cond) => {
                let j = self.push(Instr::JumpIfTrue(FIXME, cond.clone()));
                self.blocks.push(Block::Cond {
                    next: Some(j),
                    exits: Vec::new(),
                    elsif_ok: false,
                    has_else: false,
                });
            }

            ast::Code::Elsif(cond) => {
                let next = match self.blocks.last_mut() {
                    Some(Block::Cond {
                        next,
                        elsif_ok: true,
                        has_else: false,
                        ..
                    }) => next.take(),
                    _ => return Err(self.err("`elsif` without a matching `if`")),
                };
                let marker = self.take_marker();
                let exit = self.push(Instr::Jump(FIXME));
                if let Some(j) = next {
                    self.update_jump(j);
                }
                if let Some(marker) = marker {
                    self.push(marker);
                }
                let j = self.push(Instr::JumpIfFalse(FIXME, cond.clone()));
                if let Some(Block::Cond { next, exits, .. }) = self.blocks.last_mut() {
                    exits.push(exit);
                    *next = Some(j);
                }
            }

            ast::Code::Else => {
                let next = match self.blocks.last_mut() {
                    Some(Block::Cond {
                        next,
                        has_else: false,
                        ..
                    }) => next.take(),
                    _ => return Err(self.err("`else` without a matching `if`")),
                };
                let marker = self.take_marker();
                let exit = self.push(Instr::Jump(FIXME));
                if let Some(j) = next {
                    self.update_jump(j);
                }
                if let Some(marker) = marker {
                    self.push(marker);
                }
                if let Some(Block::Cond {
                    exits, has_else, ..
                }) = self.blocks.last_mut()
                {
                    exits.push(exit);
                    *has_else = true;
                }
            }

            ast::Code::For(for_loop) => {
                self.push(Instr::LoopStart(Iterable::For(for_loop.clone())));
                let next = self.push(Instr::LoopNext(FIXME));
                self.blocks.push(Block::Loop { next });
            }

            ast::Code::Do(block) => {
                self.push(Instr::LoopStart(Iterable::Do(block.clone())));
                let next = self.push(Instr::LoopNext(FIXME));
                self.blocks.push(Block::Loop { next });
            }

            ast::Code::Assign(assign) => {
                self.push(Instr::Assign(assign.clone()));
            }

            ast::Code::Expr(expr) => {
                self.push(Instr::Eval(expr.clone()));
            }
        }
        Ok(())
    }

    /// Removes a trailing line marker so that it can be placed after the exit
    /// jump of the previous branch.
    fn take_marker(&mut self) -> Option<Instr> {
        match self.instrs.last() {
            Some(Instr::Line(_)) => self.instrs.pop(),
            _ => None,
        }
    }

    fn update_jump(&mut self, i: usize) {
        let n = self.instrs.len();
        let j = match &mut self.instrs[i] {
            Instr::Jump(j)
            | Instr::JumpIfTrue(j, _)
            | Instr::JumpIfFalse(j, _)
            | Instr::LoopNext(j) => j,
            _ => panic!("not a jump instr"),
        };
        *j = n;
    }

    fn push(&mut self, instr: Instr) -> usize {
        let i = self.instrs.len();
        self.instrs.push(instr);
        i
    }

    fn err(&self, msg: &str) -> Error {
        let file = self.files.last().copied().unwrap_or(0);
        Error::indentation(msg).locate(&self.program.files[file], self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::program::{File, Snippet};
    use crate::types::span::Span;
    use crate::Value;

    fn program(stmts: Vec<Stmt>) -> Program {
        let file = |name: &str| File {
            name: name.into(),
            source: "a\nb\nc\n".into(),
        };
        Program {
            files: vec![file("root"), file("inner")],
            stmts,
        }
    }

    fn truthy() -> ast::Expr {
        ast::Expr::Literal(ast::Literal {
            value: Value::Bool(true),
            span: Span::from(0..4),
        })
    }

    fn code(node: ast::Code) -> Stmt {
        Stmt::RawCode(Snippet {
            raw: String::new(),
            node,
        })
    }

    fn targets(instrs: &[Instr]) -> Vec<String> {
        instrs
            .iter()
            .map(|instr| match instr {
                Instr::Jump(j) => format!("jump {j}"),
                Instr::JumpIfFalse(j, _) => format!("jump_if_false {j}"),
                Instr::JumpIfTrue(j, _) => format!("jump_if_true {j}"),
                Instr::EmitBlank => String::from("blank"),
                instr => format!("{instr:?}"),
            })
            .collect()
    }

    #[test]
    fn link_if_elsif_else() {
        let program = program(vec![
            code(ast::Code::If(truthy())),
            Stmt::EmitBlank,
            code(ast::Code::Elsif(truthy())),
            Stmt::EmitBlank,
            code(ast::Code::Else),
            Stmt::EmitBlank,
            Stmt::CloseBlock,
        ]);
        let instrs = link(&program).unwrap();
        assert_eq!(
            targets(&instrs),
            [
                "jump_if_false 3",
                "blank",
                "jump 7",
                "jump_if_false 6",
                "blank",
                "jump 7",
                "blank",
            ]
        );
    }

    #[test]
    fn link_unless_else() {
        let program = program(vec![
            code(ast::Code::Unless(truthy())),
            Stmt::EmitBlank,
            code(ast::Code::Else),
            Stmt::EmitBlank,
            Stmt::CloseBlock,
        ]);
        let instrs = link(&program).unwrap();
        assert_eq!(
            targets(&instrs),
            ["jump_if_true 3", "blank", "jump 4", "blank"]
        );
    }

    #[test]
    fn link_err_elsif_after_unless() {
        let program = program(vec![
            code(ast::Code::Unless(truthy())),
            code(ast::Code::Elsif(truthy())),
            Stmt::CloseBlock,
        ]);
        let err = link(&program).unwrap_err();
        assert_eq!(err.message(), "`elsif` without a matching `if`");
    }

    #[test]
    fn link_err_else_after_else() {
        let program = program(vec![
            code(ast::Code::If(truthy())),
            code(ast::Code::Else),
            code(ast::Code::Else),
            Stmt::CloseBlock,
        ]);
        let err = link(&program).unwrap_err();
        assert_eq!(err.message(), "`else` without a matching `if`");
    }

    #[test]
    fn link_err_close_without_block() {
        let program = program(vec![Stmt::SetLastLine(1), Stmt::CloseBlock]);
        let err = link(&program).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Indentation);
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn link_err_close_crosses_include() {
        let program = program(vec![
            code(ast::Code::If(truthy())),
            Stmt::PushFilename(1),
            Stmt::SetLastLine(2),
            Stmt::CloseBlock,
            Stmt::PopFilename,
        ]);
        let err = link(&program).unwrap_err();
        assert_eq!(err.message(), "unexpected end of block");
        assert_eq!(err.file(), Some("inner"));
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn link_err_block_open_at_end_of_include() {
        let program = program(vec![
            Stmt::PushFilename(1),
            code(ast::Code::If(truthy())),
            Stmt::PopFilename,
            Stmt::CloseBlock,
        ]);
        let err = link(&program).unwrap_err();
        assert_eq!(
            err.message(),
            "block left open at the end of the included file"
        );
        assert_eq!(err.file(), Some("inner"));
    }

    #[test]
    fn link_err_unclosed() {
        let program = program(vec![code(ast::Code::If(truthy()))]);
        let err = link(&program).unwrap_err();
        assert_eq!(err.message(), "block was never closed");
    }
}
