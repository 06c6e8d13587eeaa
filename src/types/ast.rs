//! AST representing the expressions and code embedded in a template.
//!
//! All spans are relative to the start of the template line the expression
//! was found on.

use crate::types::span::Span;
use crate::Value;

/// A line of code from a `-` line or a block header.
#[derive(Debug, Clone)]
pub enum Code {
    If(Expr),
    Unless(Expr),
    Elsif(Expr),
    Else,
    For(ForLoop),
    Do(DoBlock),
    Assign(Assign),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct ForLoop {
    pub vars: Vec<Ident>,
    pub iterable: Expr,
}

/// A generic block, e.g. `items.each_with_index do |item, i|`.
#[derive(Debug, Clone)]
pub struct DoBlock {
    pub receiver: Expr,
    pub method: Ident,
    pub args: Vec<Expr>,
    pub params: Vec<Ident>,
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub name: Ident,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    List(List),
    Var(Ident),
    Member(Member),
    Index(Index),
    Call(Call),
    Unary(Unary),
    Binary(Binary),
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: Value,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct List {
    pub items: Vec<Expr>,
    pub span: Span,
}

/// Attribute access, e.g. `user.name`.
#[derive(Debug, Clone)]
pub struct Member {
    pub receiver: Box<Expr>,
    pub name: Ident,
}

/// Subscript access, e.g. `users[0]`.
#[derive(Debug, Clone)]
pub struct Index {
    pub receiver: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

/// A function call, e.g. `upper(name)` or `name.upper()`.
///
/// The receiver, if any, is passed as the first argument.
#[derive(Debug, Clone)]
pub struct Call {
    pub receiver: Option<Box<Expr>>,
    pub name: Ident,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Unary {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone)]
pub struct Binary {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Range,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(lit) => lit.span,
            Self::List(list) => list.span,
            Self::Var(var) => var.span,
            Self::Member(member) => member.receiver.span().combine(member.name.span),
            Self::Index(index) => index.span,
            Self::Call(call) => call.span,
            Self::Unary(unary) => unary.span,
            Self::Binary(binary) => binary.span,
        }
    }
}

impl BinaryOp {
    pub const fn human(&self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Range => "..",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}
