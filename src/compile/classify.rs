//! Categorizes template lines.
//!
//! Each category has its own matcher, they are tried in a fixed order and the
//! first match wins. Anything that no matcher claims is a literal line.

use crate::compile::lex::is_ident;
use crate::types::span::Span;
use crate::Syntax;

/// A classified template line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The indentation of the line including any base indentation inherited
    /// from an including template.
    pub indent: usize,

    pub kind: LineKind,
}

/// The category of a line.
///
/// All spans are relative to the start of the raw line and never include
/// trailing whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `- if cond`, `- for x in xs`, `- xs.each do |x|` ...
    Block { kind: BlockKind, code: Span },

    /// `= include 'path'`
    Include { path: String, span: Span },

    /// An empty or whitespace only line.
    Blank,

    /// `- code`
    Statement { code: Span },

    /// `= expr`
    Output { expr: Span },

    /// Anything else.
    Literal { text: Span },
}

/// The kind of block that a line opens or continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    Unless,
    Elsif,
    Else,
    For,
    Do,
}

impl BlockKind {
    /// Whether this continues a conditional chain instead of opening a new
    /// block.
    pub fn is_continuation(&self) -> bool {
        matches!(self, Self::Elsif | Self::Else)
    }

    /// Whether an `elsif` or `else` at the same depth continues a block of
    /// this kind.
    pub fn continues(&self, next: BlockKind) -> bool {
        match self {
            Self::If | Self::Elsif => next.is_continuation(),
            Self::Unless => next == Self::Else,
            Self::Else => true,
            Self::For | Self::Do => false,
        }
    }

    pub fn human(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Unless => "unless",
            Self::Elsif => "elsif",
            Self::Else => "else",
            Self::For => "for",
            Self::Do => "do",
        }
    }
}

/// Classify a single line.
pub fn classify(syntax: &Syntax<'_>, line: &str, base_indent: usize) -> Line {
    let line = line.trim_end();
    let spaces = line.len() - line.trim_start_matches(' ').len();
    let rest = Span::from(spaces..line.len());
    let kind = match_block(syntax, line, rest)
        .or_else(|| match_include(syntax, line, rest))
        .or_else(|| match_blank(line, rest))
        .or_else(|| match_statement(syntax, line, rest))
        .or_else(|| match_output(syntax, line, rest))
        .unwrap_or(LineKind::Literal { text: rest });
    Line {
        indent: base_indent + spaces,
        kind,
    }
}

fn match_block(syntax: &Syntax<'_>, line: &str, rest: Span) -> Option<LineKind> {
    let code = after_marker(line, rest, &syntax.statement)?;
    let text = &line[code];
    let word_len = text.find(|c| !is_ident(c)).unwrap_or(text.len());
    let kind = match &text[..word_len] {
        "if" => BlockKind::If,
        "unless" => BlockKind::Unless,
        "elsif" => BlockKind::Elsif,
        "else" => BlockKind::Else,
        "for" => BlockKind::For,
        _ if ends_with_do(text) => BlockKind::Do,
        _ => return None,
    };
    Some(LineKind::Block { kind, code })
}

/// Whether the last word of the code is `do`, optionally followed by block
/// parameters `|a, b|`.
fn ends_with_do(text: &str) -> bool {
    let head = match text.strip_suffix('|') {
        Some(params) => match params.rfind('|') {
            Some(i) => params[..i].trim_end(),
            None => return false,
        },
        None => text,
    };
    match head.strip_suffix("do") {
        Some(before) => before.ends_with(|c: char| !is_ident(c) && c != '.'),
        None => false,
    }
}

fn match_include(syntax: &Syntax<'_>, line: &str, rest: Span) -> Option<LineKind> {
    let expr = after_marker(line, rest, &syntax.output)?;
    let args = line[expr].strip_prefix(syntax.include.as_str())?;
    let args_offset = expr.n - args.len();
    let quoted = match args.strip_prefix('(') {
        Some(inner) => inner.strip_suffix(')')?.trim(),
        None if args.starts_with([' ', '\t']) => args.trim_start(),
        None => return None,
    };
    let quote = quoted.chars().next().filter(|c| matches!(c, '\'' | '"'))?;
    let path = quoted.strip_prefix(quote)?.strip_suffix(quote)?;
    if path.is_empty() || path.contains(quote) {
        return None;
    }
    let m = args_offset + args.find(quoted)?;
    Some(LineKind::Include {
        path: path.to_owned(),
        span: Span::from(m..m + quoted.len()),
    })
}

fn match_blank(line: &str, rest: Span) -> Option<LineKind> {
    line[rest].is_empty().then_some(LineKind::Blank)
}

fn match_statement(syntax: &Syntax<'_>, line: &str, rest: Span) -> Option<LineKind> {
    let code = after_marker(line, rest, &syntax.statement)?;
    Some(LineKind::Statement { code })
}

fn match_output(syntax: &Syntax<'_>, line: &str, rest: Span) -> Option<LineKind> {
    let expr = after_marker(line, rest, &syntax.output)?;
    Some(LineKind::Output { expr })
}

/// Returns the span of the text following the marker, without leading
/// whitespace.
fn after_marker(line: &str, rest: Span, marker: &str) -> Option<Span> {
    let text = line[rest].strip_prefix(marker)?;
    let trimmed = text.trim_start();
    Some(Span::from(rest.n - trimmed.len()..rest.n))
}
