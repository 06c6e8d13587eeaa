use crate::format;
use crate::render::iter::{self, LoopState, Source};
use crate::render::stack::Stack;
use crate::render::value;
use crate::types::ast;
use crate::types::program::{Instr, Iterable, Template};
use crate::types::span::Span;
use crate::{Engine, Error, Result, Value};

/// Executes the linked instructions of a template.
pub struct Renderer<'render> {
    engine: &'render Engine<'render>,
    template: &'render Template,
    stack: Stack,
    loops: Vec<LoopState>,

    /// The active files, the innermost last.
    files: Vec<usize>,

    /// The last line that started executing.
    line: usize,
}

impl<'render> Renderer<'render> {
    pub fn new(
        engine: &'render Engine<'render>,
        template: &'render Template,
        stack: Stack,
    ) -> Self {
        Self {
            engine,
            template,
            stack,
            loops: Vec::new(),
            files: vec![0],
            line: 0,
        }
    }

    /// Runs the template to completion, appending the output to the buffer.
    pub fn render(mut self, out: &mut String) -> Result<()> {
        self.run(out).map_err(|err| {
            let file = self.files.last().copied().unwrap_or(0);
            err.locate(&self.template.program.files[file], self.line)
        })
    }

    fn run(&mut self, out: &mut String) -> Result<()> {
        let template = self.template;
        let instrs = &template.instrs;
        let mut pc = 0;

        while let Some(instr) = instrs.get(pc) {
            match instr {
                Instr::Line(line) => {
                    self.line = *line;
                }

                Instr::Jump(j) => {
                    pc = *j;
                    continue;
                }

                Instr::JumpIfFalse(j, cond) => {
                    if !self.eval(cond)?.is_truthy() {
                        pc = *j;
                        continue;
                    }
                }

                Instr::JumpIfTrue(j, cond) => {
                    if self.eval(cond)?.is_truthy() {
                        pc = *j;
                        continue;
                    }
                }

                Instr::LoopStart(iterable) => {
                    let state = self.loop_state(iterable)?;
                    self.loops.push(state);
                }

                Instr::LoopNext(j) => {
                    let state = self
                        .loops
                        .last_mut()
                        .expect("loop state should be pushed by loop start");
                    if state.started {
                        self.stack.pop_scope();
                    }
                    match state.iterate() {
                        Some(scope) => self.stack.push_scope(scope),
                        None => {
                            self.loops.pop();
                            pc = *j;
                            continue;
                        }
                    }
                }

                Instr::Assign(assign) => {
                    let value = self.eval(&assign.value)?;
                    self.stack.assign(&assign.name.name, value);
                }

                Instr::Eval(expr) => {
                    self.eval(expr)?;
                }

                Instr::EmitEval(indent, expr) => {
                    let value = self.eval(expr)?;
                    let text = self.format(&value, expr.span())?;
                    format::concat(out, *indent, &text);
                }

                Instr::EmitLiteral(indent, literal) => {
                    let mut values = Vec::with_capacity(literal.subs.len());
                    for sub in &literal.subs {
                        let value = self.eval(&sub.node)?;
                        values.push(self.format(&value, sub.node.span())?);
                    }
                    format::concat(out, *indent, &literal.substitute(&values));
                }

                Instr::EmitBlank => {
                    out.push('\n');
                }

                Instr::PushFile(id) => {
                    self.files.push(*id);
                }

                Instr::PopFile => {
                    self.files.pop();
                }

                Instr::MissingInclude(path) => {
                    return Err(Error::missing_include(path));
                }
            }
            pc += 1;
        }

        assert!(pc == instrs.len());
        Ok(())
    }

    fn loop_state(&self, iterable: &Iterable) -> Result<LoopState> {
        match iterable {
            Iterable::For(ast::ForLoop { vars, iterable }) => {
                let source = self.eval_source(iterable)?;
                let items = iter::for_items(source, vars.len(), iterable.span())?;
                Ok(LoopState::new(names(vars), items))
            }
            Iterable::Do(block) => {
                if let Some(arg) = block.args.first() {
                    return Err(Error::render(
                        format!("`{}` takes no arguments", block.method.name),
                        arg.span(),
                    ));
                }
                let source = self.eval_source(&block.receiver)?;
                let items = iter::block_items(
                    &block.method.name,
                    source,
                    block.params.len(),
                    block.method.span,
                )?;
                Ok(LoopState::new(names(&block.params), items))
            }
        }
    }

    /// Evaluates the iterable of a loop, an integer range is left uncollected.
    fn eval_source(&self, expr: &ast::Expr) -> Result<Source> {
        if let ast::Expr::Binary(binary) = expr {
            if binary.op == ast::BinaryOp::Range {
                let lhs = self.eval(&binary.lhs)?;
                let rhs = self.eval(&binary.rhs)?;
                return match (lhs, rhs) {
                    (Value::Integer(a), Value::Integer(b)) => Ok(Source::Range(a, b)),
                    (lhs, rhs) => {
                        value::binary(binary.op, lhs, rhs, binary.span).map(Source::Value)
                    }
                };
            }
        }
        self.eval(expr).map(Source::Value)
    }

    fn format(&self, value: &Value, span: Span) -> Result<String> {
        let mut buf = String::new();
        format::default(&mut buf, value).map_err(|msg| Error::render(msg, span))?;
        Ok(buf)
    }

    fn eval(&self, expr: &ast::Expr) -> Result<Value> {
        match expr {
            ast::Expr::Literal(lit) => Ok(lit.value.clone()),

            ast::Expr::List(list) => list
                .items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<_>>()
                .map(Value::List),

            ast::Expr::Var(var) => match self.stack.lookup(&var.name) {
                Some(value) => Ok(value.clone()),
                None if self.engine.functions.contains_key(var.name.as_str()) => {
                    self.call(&var.name, Vec::new(), var.span)
                }
                None => Err(Error::render(
                    format!("`{}` not found in this scope", var.name),
                    var.span,
                )),
            },

            ast::Expr::Member(ast::Member { receiver, name }) => {
                let value = self.eval(receiver)?;
                match value {
                    Value::Map(mut map) => match map.remove(&name.name) {
                        Some(v) => Ok(v),
                        None if self.engine.functions.contains_key(name.name.as_str()) => {
                            self.call(&name.name, vec![Value::Map(map)], name.span)
                        }
                        None => Err(Error::render(
                            format!("map has no key `{}`", name.name),
                            name.span,
                        )),
                    },
                    value if self.engine.functions.contains_key(name.name.as_str()) => {
                        self.call(&name.name, vec![value], name.span)
                    }
                    value => Err(Error::render(
                        format!("cannot access `{}` on {}", name.name, value.human()),
                        name.span,
                    )),
                }
            }

            ast::Expr::Index(ast::Index {
                receiver,
                index,
                span,
            }) => {
                let value = self.eval(receiver)?;
                let index = self.eval(index)?;
                value::index(&value, &index, *span)
            }

            ast::Expr::Call(call) => {
                let mut args = Vec::with_capacity(call.args.len() + 1);
                if let Some(receiver) = &call.receiver {
                    args.push(self.eval(receiver)?);
                }
                for arg in &call.args {
                    args.push(self.eval(arg)?);
                }
                self.call(&call.name.name, args, call.span)
            }

            ast::Expr::Unary(unary) => {
                let value = self.eval(&unary.expr)?;
                value::unary(unary.op, value, unary.span)
            }

            ast::Expr::Binary(binary) => {
                let lhs = self.eval(&binary.lhs)?;
                match binary.op {
                    ast::BinaryOp::Or if lhs.is_truthy() => Ok(lhs),
                    ast::BinaryOp::And if !lhs.is_truthy() => Ok(lhs),
                    ast::BinaryOp::Or | ast::BinaryOp::And => self.eval(&binary.rhs),
                    op => {
                        let rhs = self.eval(&binary.rhs)?;
                        value::binary(op, lhs, rhs, binary.span)
                    }
                }
            }
        }
    }

    fn call(&self, name: &str, args: Vec<Value>, span: Span) -> Result<Value> {
        let f = self
            .engine
            .functions
            .get(name)
            .ok_or_else(|| Error::render(format!("unknown function `{name}`"), span))?;
        f(args).map_err(|msg| Error::render(msg, span))
    }
}

fn names(idents: &[ast::Ident]) -> Vec<String> {
    idents.iter().map(|ident| ident.name.clone()).collect()
}
