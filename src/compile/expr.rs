//! A recursive descent parser for the expressions embedded in template lines.
//!
//! Precedence from lowest to highest:
//!
//!   or ||  >  and &&  >  not !  >  == != < <= > >=  >  ..  >  + -  >  * / %
//!   >  unary -  >  postfix (member, call, index)
//!

use std::fmt::Display;

use crate::compile::lex::{Lexer, Token};
use crate::types::ast;
use crate::types::span::Span;
use crate::{Error, Result, Value};

/// The methods that can open a generic `do` block.
pub const BLOCK_METHODS: &[&str] = &["each", "each_with_index", "each_pair", "times"];

/// A parser over a region of a single template line.
pub struct Parser<'source> {
    /// A lexer that tokenizes the expression.
    tokens: Lexer<'source>,

    /// Where the region ends, used to locate EOF errors.
    end: usize,

    /// Stores a peeked token.
    peeked: Option<Option<(Token, Span)>>,
}

enum Sign {
    Neg,
    Pos,
}

impl<'source> Parser<'source> {
    /// Construct a new parser over `line[span]`.
    pub fn new(line: &'source str, span: Span) -> Self {
        Self {
            tokens: Lexer::new(line, span),
            end: span.n,
            peeked: None,
        }
    }

    /// Parses the entire region as a single expression.
    pub fn parse_expr_only(mut self) -> Result<ast::Expr> {
        let expr = self.parse_expr()?;
        self.expect_eof()?;
        Ok(expr)
    }

    /// Parses a generic statement.
    ///
    /// This is either an assignment or an expression evaluated for effect.
    ///
    ///   total = total + item.price
    ///
    ///   items.reverse()
    ///
    pub fn parse_statement(mut self) -> Result<ast::Code> {
        if let Some((Token::Ident, span)) = self.peek()? {
            let mut lookahead = Lexer::new(self.source(), Span::from(span.n..self.end));
            if let Some((Token::Assign, _)) = lookahead.next()? {
                let name = self.parse_ident()?;
                self.expect(Token::Assign)?;
                let value = self.parse_expr()?;
                self.expect_eof()?;
                return Ok(ast::Code::Assign(ast::Assign { name, value }));
            }
        }
        let expr = self.parse_expr()?;
        self.expect_eof()?;
        Ok(ast::Code::Expr(expr))
    }

    /// Parses a block header.
    ///
    ///   if user.admin
    ///
    ///   for key, value in settings
    ///
    ///   items.each_with_index do |item, i|
    ///
    pub fn parse_header(mut self) -> Result<ast::Code> {
        let keyword = match self.peek()? {
            Some((Token::Ident, span)) => &self.source()[span],
            _ => "",
        };
        let code = match keyword {
            "if" => {
                self.next()?;
                ast::Code::If(self.parse_expr()?)
            }
            "unless" => {
                self.next()?;
                ast::Code::Unless(self.parse_expr()?)
            }
            "elsif" => {
                self.next()?;
                ast::Code::Elsif(self.parse_expr()?)
            }
            "else" => {
                self.next()?;
                ast::Code::Else
            }
            "for" => {
                self.next()?;
                ast::Code::For(self.parse_for_loop()?)
            }
            _ => ast::Code::Do(self.parse_do_block()?),
        };
        self.expect_eof()?;
        Ok(code)
    }

    /// Parses the remainder of a for loop header.
    ///
    ///   item in items
    ///
    ///   key, value in map
    ///
    fn parse_for_loop(&mut self) -> Result<ast::ForLoop> {
        let mut vars = vec![self.parse_ident()?];
        while self.is_next(Token::Comma)? {
            self.expect(Token::Comma)?;
            vars.push(self.parse_ident()?);
        }
        self.expect_keyword("in")?;
        let iterable = self.parse_expr()?;
        Ok(ast::ForLoop { vars, iterable })
    }

    /// Parses a generic block header, the receiver must end in a call to one
    /// of the block methods.
    ///
    ///   3.times do
    ///
    ///   map.each_pair() do |key, value|
    ///
    fn parse_do_block(&mut self) -> Result<ast::DoBlock> {
        let expr = self.parse_postfix()?;
        let span = expr.span();
        let (receiver, method, args) = match expr {
            ast::Expr::Member(ast::Member { receiver, name }) => (*receiver, name, Vec::new()),
            ast::Expr::Call(ast::Call {
                receiver: Some(receiver),
                name,
                args,
                ..
            }) => (*receiver, name, args),
            _ => {
                return Err(Error::syntax("expected block method call", span));
            }
        };
        if !BLOCK_METHODS.contains(&method.name.as_str()) {
            return Err(Error::syntax(
                format!("unknown block method `{}`", method.name),
                method.span,
            ));
        }
        self.expect_keyword("do")?;
        let mut params = Vec::new();
        if self.is_next(Token::Pipe)? {
            self.expect(Token::Pipe)?;
            loop {
                params.push(self.parse_ident()?);
                if !self.is_next(Token::Comma)? {
                    break;
                }
                self.expect(Token::Comma)?;
            }
            self.expect(Token::Pipe)?;
        }
        Ok(ast::DoBlock {
            receiver,
            method,
            args,
            params,
        })
    }

    /// Parses an expression.
    pub fn parse_expr(&mut self) -> Result<ast::Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<ast::Expr> {
        let mut lhs = self.parse_and()?;
        while self.is_next(Token::OrOr)? || self.is_next_keyword("or")? {
            self.next()?;
            let rhs = self.parse_and()?;
            lhs = binary(ast::BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<ast::Expr> {
        let mut lhs = self.parse_not()?;
        while self.is_next(Token::AndAnd)? || self.is_next_keyword("and")? {
            self.next()?;
            let rhs = self.parse_not()?;
            lhs = binary(ast::BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<ast::Expr> {
        if self.is_next(Token::Bang)? || self.is_next_keyword("not")? {
            let (_, span) = self.parse()?;
            let expr = self.parse_not()?;
            let span = span.combine(expr.span());
            return Ok(ast::Expr::Unary(ast::Unary {
                op: ast::UnaryOp::Not,
                expr: Box::new(expr),
                span,
            }));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<ast::Expr> {
        let lhs = self.parse_range()?;
        let op = match self.peek()? {
            Some((Token::Eq, _)) => ast::BinaryOp::Eq,
            Some((Token::Ne, _)) => ast::BinaryOp::Ne,
            Some((Token::Lt, _)) => ast::BinaryOp::Lt,
            Some((Token::Le, _)) => ast::BinaryOp::Le,
            Some((Token::Gt, _)) => ast::BinaryOp::Gt,
            Some((Token::Ge, _)) => ast::BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        self.next()?;
        let rhs = self.parse_range()?;
        Ok(binary(op, lhs, rhs))
    }

    fn parse_range(&mut self) -> Result<ast::Expr> {
        let lhs = self.parse_sum()?;
        if !self.is_next(Token::DotDot)? {
            return Ok(lhs);
        }
        self.next()?;
        let rhs = self.parse_sum()?;
        Ok(binary(ast::BinaryOp::Range, lhs, rhs))
    }

    fn parse_sum(&mut self) -> Result<ast::Expr> {
        let mut lhs = self.parse_product()?;
        loop {
            let op = match self.peek()? {
                Some((Token::Plus, _)) => ast::BinaryOp::Add,
                Some((Token::Minus, _)) => ast::BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.next()?;
            let rhs = self.parse_product()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_product(&mut self) -> Result<ast::Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek()? {
                Some((Token::Star, _)) => ast::BinaryOp::Mul,
                Some((Token::Slash, _)) => ast::BinaryOp::Div,
                Some((Token::Percent, _)) => ast::BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.next()?;
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<ast::Expr> {
        if !self.is_next(Token::Minus)? {
            return self.parse_postfix();
        }
        let span = self.expect(Token::Minus)?;

        // Negative number literals are folded so that `-9223372036854775808`
        // is in range.
        if let Some((Token::Number, num)) = self.peek()? {
            if num.m == span.n {
                self.next()?;
                let raw = &self.source()[num];
                let lit = self.parse_literal_number(raw, span.combine(num), Sign::Neg)?;
                return self.parse_postfix_ops(ast::Expr::Literal(lit));
            }
        }

        let expr = self.parse_unary()?;
        let span = span.combine(expr.span());
        Ok(ast::Expr::Unary(ast::Unary {
            op: ast::UnaryOp::Neg,
            expr: Box::new(expr),
            span,
        }))
    }

    fn parse_postfix(&mut self) -> Result<ast::Expr> {
        let base = self.parse_primary()?;
        self.parse_postfix_ops(base)
    }

    /// Parses any number of member accesses, method calls and indexes.
    ///
    ///   .name
    ///
    ///   .join(", ")
    ///
    ///   [0]
    ///
    fn parse_postfix_ops(&mut self, mut expr: ast::Expr) -> Result<ast::Expr> {
        loop {
            match self.peek()? {
                Some((Token::Dot, _)) => {
                    self.next()?;
                    let name = self.parse_ident()?;
                    if self.is_next(Token::OpenParen)? {
                        let (args, close) = self.parse_args()?;
                        let span = expr.span().combine(close);
                        expr = ast::Expr::Call(ast::Call {
                            receiver: Some(Box::new(expr)),
                            name,
                            args,
                            span,
                        });
                    } else {
                        expr = ast::Expr::Member(ast::Member {
                            receiver: Box::new(expr),
                            name,
                        });
                    }
                }
                Some((Token::OpenBracket, _)) => {
                    self.next()?;
                    let index = self.parse_expr()?;
                    let close = self.expect(Token::CloseBracket)?;
                    let span = expr.span().combine(close);
                    expr = ast::Expr::Index(ast::Index {
                        receiver: Box::new(expr),
                        index: Box::new(index),
                        span,
                    });
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Parses a literal, variable, function call, list or parenthesized
    /// expression.
    fn parse_primary(&mut self) -> Result<ast::Expr> {
        let (tk, span) = self.parse()?;
        let expr = match tk {
            Token::Number => {
                let raw = &self.source()[span];
                ast::Expr::Literal(self.parse_literal_number(raw, span, Sign::Pos)?)
            }
            Token::String => ast::Expr::Literal(self.parse_literal_string(span)?),
            Token::Keyword => ast::Expr::Literal(self.parse_literal_keyword(span)?),
            Token::Ident => {
                let name = ast::Ident {
                    name: self.source()[span].to_owned(),
                    span,
                };
                if self.is_next(Token::OpenParen)? {
                    let (args, close) = self.parse_args()?;
                    ast::Expr::Call(ast::Call {
                        receiver: None,
                        name,
                        args,
                        span: span.combine(close),
                    })
                } else {
                    ast::Expr::Var(name)
                }
            }
            Token::OpenBracket => {
                let mut items = Vec::new();
                if !self.is_next(Token::CloseBracket)? {
                    loop {
                        items.push(self.parse_expr()?);
                        if !self.is_next(Token::Comma)? {
                            break;
                        }
                        self.expect(Token::Comma)?;
                    }
                }
                let close = self.expect(Token::CloseBracket)?;
                ast::Expr::List(ast::List {
                    items,
                    span: span.combine(close),
                })
            }
            Token::OpenParen => {
                let expr = self.parse_expr()?;
                self.expect(Token::CloseParen)?;
                expr
            }
            tk => {
                return Err(self.err_unexpected_token("expression", tk, span));
            }
        };
        Ok(expr)
    }

    /// Parses a parenthesized argument list, returning the arguments and the
    /// span of the closing parenthesis.
    ///
    ///   (user.name, "a string", true)
    ///
    fn parse_args(&mut self) -> Result<(Vec<ast::Expr>, Span)> {
        self.expect(Token::OpenParen)?;
        let mut args = Vec::new();
        if !self.is_next(Token::CloseParen)? {
            loop {
                args.push(self.parse_expr()?);
                if !self.is_next(Token::Comma)? {
                    break;
                }
                self.expect(Token::Comma)?;
            }
        }
        let close = self.expect(Token::CloseParen)?;
        Ok((args, close))
    }

    /// Parses `true`, `false` or `nil`.
    fn parse_literal_keyword(&mut self, span: Span) -> Result<ast::Literal> {
        let value = match &self.source()[span] {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "nil" => Value::None,
            kw => {
                return Err(self.err_unexpected_keyword(kw, span));
            }
        };
        Ok(ast::Literal { value, span })
    }

    /// Parses an integer or a float.
    fn parse_literal_number(&self, raw: &str, span: Span, sign: Sign) -> Result<ast::Literal> {
        match self.parse_literal_integer(raw, span, &sign) {
            Ok(lit) => Ok(lit),
            Err(err) => match self.parse_literal_float(raw, span, &sign) {
                Ok(lit) => Ok(lit),
                Err(err2) => {
                    if raw.contains(['.', 'e', 'E']) && !raw.starts_with("0x") {
                        Err(err2)
                    } else {
                        Err(err)
                    }
                }
            },
        }
    }

    /// Parse an integer.
    fn parse_literal_integer(&self, raw: &str, span: Span, sign: &Sign) -> Result<ast::Literal> {
        let digits = raw.as_bytes();
        let (i, radix) = match digits {
            [b'0', b'b', ..] => (2, 2),
            [b'0', b'o', ..] => (2, 8),
            [b'0', b'x', ..] => (2, 16),
            _ => (0, 10),
        };
        // The raw text excludes a folded minus sign.
        let offset = span.n - raw.len();
        let int = digits[i..]
            .iter()
            .enumerate()
            .filter(|(_, &d)| d != b'_')
            .try_fold(0i64, |acc, (j, &d)| {
                let x = (d as char).to_digit(radix).ok_or_else(|| {
                    let m = offset + i + j;
                    Error::syntax(format!("invalid digit for base {radix} literal"), m..m + 1)
                })?;
                let err = || {
                    Error::syntax(
                        format!("base {radix} literal out of range for 64-bit integer"),
                        span,
                    )
                };
                let value = acc.checked_mul(radix.into()).ok_or_else(err)?;
                match sign {
                    Sign::Pos => value.checked_add(x.into()),
                    Sign::Neg => value.checked_sub(x.into()),
                }
                .ok_or_else(err)
            })?;
        let value = Value::Integer(int);
        Ok(ast::Literal { value, span })
    }

    /// Parses a float.
    fn parse_literal_float(&self, raw: &str, span: Span, sign: &Sign) -> Result<ast::Literal> {
        let float: f64 = raw
            .replace('_', "")
            .parse()
            .map_err(|_| Error::syntax("invalid float literal", span))?;
        let value = match sign {
            Sign::Neg => Value::Float(-float),
            Sign::Pos => Value::Float(float),
        };
        Ok(ast::Literal { value, span })
    }

    /// Parses a string.
    fn parse_literal_string(&self, span: Span) -> Result<ast::Literal> {
        let value = Value::String(self.parse_string(span)?);
        Ok(ast::Literal { value, span })
    }

    /// Parses a string and handles escape characters.
    ///
    /// Single quoted strings are raw except for `\'` and `\\`.
    fn parse_string(&self, span: Span) -> Result<String> {
        let raw = &self.source()[span];
        let quote = if raw.starts_with('\'') { '\'' } else { '"' };
        let inner = &raw[1..raw.len() - 1];
        if !inner.contains('\\') {
            return Ok(inner.to_owned());
        }
        let mut iter = inner.char_indices().map(|(i, c)| (span.m + 1 + i, c));
        let mut string = String::with_capacity(inner.len());
        while let Some((i, c)) = iter.next() {
            if c != '\\' {
                string.push(c);
                continue;
            }
            // The lexer guarantees that a backslash is never the last
            // character before the closing quote.
            let (j, esc) = iter.next().unwrap_or((i + 1, '\\'));
            let c = match (quote, esc) {
                (_, '\\') => '\\',
                (q, e) if q == e => e,
                ('\'', e) => {
                    string.push('\\');
                    e
                }
                (_, 'n') => '\n',
                (_, 'r') => '\r',
                (_, 't') => '\t',
                (_, e) => {
                    return Err(Error::syntax(
                        "unknown escape character",
                        i..j + e.len_utf8(),
                    ));
                }
            };
            string.push(c);
        }
        Ok(string)
    }

    /// Expects the given keyword.
    fn expect_keyword(&mut self, exp: &str) -> Result<Span> {
        match self.next()? {
            Some((Token::Keyword, span)) if &self.source()[span] == exp => Ok(span),
            Some((tk, span)) => {
                Err(self.err_unexpected_token(format!("keyword `{exp}`"), tk, span))
            }
            None => Err(self.err_unexpected_eof(format!("keyword `{exp}`"))),
        }
    }

    /// Parses an identifier.
    fn parse_ident(&mut self) -> Result<ast::Ident> {
        let span = self.expect(Token::Ident)?;
        let name = self.source()[span].to_owned();
        Ok(ast::Ident { name, span })
    }

    /// Expects that there are no more tokens.
    fn expect_eof(&mut self) -> Result<()> {
        match self.next()? {
            Some((tk, span)) => Err(self.err_unexpected_token("end of line", tk, span)),
            None => Ok(()),
        }
    }

    /// Parses any token.
    fn parse(&mut self) -> Result<(Token, Span)> {
        match self.next()? {
            Some((tk, sp)) => Ok((tk, sp)),
            None => Err(self.err_unexpected_eof("expression")),
        }
    }

    /// Parses the specified token and returns its span.
    fn expect(&mut self, exp: Token) -> Result<Span> {
        match self.next()? {
            Some((tk, span)) if tk == exp => Ok(span),
            Some((tk, span)) => Err(self.err_unexpected_token(exp.human(), tk, span)),
            None => Err(self.err_unexpected_eof(exp.human())),
        }
    }

    /// Returns `true` if the next token is a keyword equal to the provided one.
    fn is_next_keyword(&mut self, exp: &str) -> Result<bool> {
        Ok(self
            .peek()?
            .map(|(tk, sp)| tk == Token::Keyword && &self.source()[sp] == exp)
            .unwrap_or(false))
    }

    /// Returns `true` if the next token is equal to the provided one.
    fn is_next(&mut self, token: Token) -> Result<bool> {
        Ok(self.peek()?.map(|(tk, _)| tk == token).unwrap_or(false))
    }

    /// Returns a copy of the next token without affecting the result of the
    /// following `.next()` call.
    fn peek(&mut self) -> Result<Option<(Token, Span)>> {
        match self.peeked {
            Some(peeked) => Ok(peeked),
            None => {
                let next = self.tokens.next()?;
                self.peeked = Some(next);
                Ok(next)
            }
        }
    }

    /// Returns the next token and span in the stream.
    fn next(&mut self) -> Result<Option<(Token, Span)>> {
        match self.peeked.take() {
            Some(v) => Ok(v),
            None => self.tokens.next(),
        }
    }

    fn source(&self) -> &'source str {
        self.tokens.source
    }

    fn err_unexpected_eof(&self, exp: impl Display) -> Error {
        let n = self.end;
        Error::syntax(format!("expected {exp}, found end of line"), n..n)
    }

    fn err_unexpected_token(&self, exp: impl Display, got: Token, span: Span) -> Error {
        let got = got.human();
        Error::syntax(format!("expected {exp}, found {got}"), span)
    }

    fn err_unexpected_keyword(&self, kw: impl Display, span: Span) -> Error {
        Error::syntax(format!("unexpected keyword `{kw}`"), span)
    }
}

fn binary(op: ast::BinaryOp, lhs: ast::Expr, rhs: ast::Expr) -> ast::Expr {
    let span = lhs.span().combine(rhs.span());
    ast::Expr::Binary(ast::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span,
    })
}
