use crate::types::span::Span;
use crate::{Error, Result};

/// A lexer that tokenizes an expression so that the parser doesn't have to
/// operate on raw text.
///
/// The lexer operates on a region of a single template line, all spans it
/// returns are relative to the start of that line. The parser should
/// repeatedly call the [`.next()?`][Lexer::next] method to return the next
/// non-whitespace token until [`None`] is returned.
#[derive(Debug)]
pub struct Lexer<'source> {
    /// The template line.
    pub source: &'source str,

    /// A cursor over the template line.
    cursor: usize,

    /// Where the expression ends.
    end: usize,
}

/// The unit yielded by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `,`
    Comma,
    /// `|`
    Pipe,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Bang,
    /// `=`
    Assign,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// Sequence of tab (0x09) and/or spaces (0x20)
    Whitespace,
    /// A keyword like `and` or `nil`
    Keyword,
    /// A variable or function name
    Ident,
    /// An integer or float literal, e.g. `19`, `0x7f` or `3.14`.
    Number,
    /// A string literal, e.g. `"Hello World!\n"` or `'raw'`.
    String,
}

impl<'source> Lexer<'source> {
    /// Construct a new lexer over `source[m..n]`.
    pub fn new(source: &'source str, span: Span) -> Self {
        Self {
            source,
            cursor: span.m,
            end: span.n,
        }
    }

    /// Returns the next non-whitespace token and its span.
    pub fn next(&mut self) -> Result<Option<(Token, Span)>> {
        loop {
            match self.lex()? {
                Some((tk, sp)) if !tk.is_whitespace() => return Ok(Some((tk, sp))),
                None => return Ok(None),
                _ => continue,
            }
        }
    }

    /// Returns the next token and span.
    fn lex(&mut self) -> Result<Option<(Token, Span)>> {
        let i = self.cursor;
        let rest = &self.source[i..self.end];

        // We iterate over chars because that is nicer than operating on raw
        // bytes. The map call here fixes the index to be relative to the
        // actual template line.
        let mut iter = rest.char_indices().map(|(d, c)| (i + d, c));
        let (i, c) = match iter.next() {
            Some(next) => next,
            None => return Ok(None),
        };
        let peek = iter.clone().next().map(|(_, c)| c);

        let (tk, j) = match (c, peek) {
            // Two character tokens.
            ('.', Some('.')) => (Token::DotDot, i + 2),
            ('=', Some('=')) => (Token::Eq, i + 2),
            ('!', Some('=')) => (Token::Ne, i + 2),
            ('<', Some('=')) => (Token::Le, i + 2),
            ('>', Some('=')) => (Token::Ge, i + 2),
            ('&', Some('&')) => (Token::AndAnd, i + 2),
            ('|', Some('|')) => (Token::OrOr, i + 2),

            // Single character to token mappings.
            ('.', _) => (Token::Dot, i + 1),
            (',', _) => (Token::Comma, i + 1),
            ('|', _) => (Token::Pipe, i + 1),
            ('(', _) => (Token::OpenParen, i + 1),
            (')', _) => (Token::CloseParen, i + 1),
            ('[', _) => (Token::OpenBracket, i + 1),
            (']', _) => (Token::CloseBracket, i + 1),
            ('+', _) => (Token::Plus, i + 1),
            ('-', _) => (Token::Minus, i + 1),
            ('*', _) => (Token::Star, i + 1),
            ('/', _) => (Token::Slash, i + 1),
            ('%', _) => (Token::Percent, i + 1),
            ('!', _) => (Token::Bang, i + 1),
            ('=', _) => (Token::Assign, i + 1),
            ('<', _) => (Token::Lt, i + 1),
            ('>', _) => (Token::Gt, i + 1),

            // Multi-character tokens with a distinct start character.
            ('"' | '\'', _) => self.lex_string(iter, i, c)?,
            (c, _) if c.is_ascii_digit() => self.lex_number(iter),
            (c, _) if is_whitespace(c) => (Token::Whitespace, self.lex_while(iter, is_whitespace)),
            (c, _) if is_ident_start(c) => self.lex_ident_or_keyword(iter, i),

            // Any other character...
            _ => {
                return Err(Error::syntax("unexpected character", i..(i + c.len_utf8())));
            }
        };

        // Finally, we need to update the cursor.
        self.cursor = j;

        Ok(Some((tk, Span::from(i..j))))
    }

    fn lex_string<I>(&mut self, mut iter: I, i: usize, quote: char) -> Result<(Token, usize)>
    where
        I: Iterator<Item = (usize, char)> + Clone,
    {
        let mut escaped = false;
        loop {
            match iter.next() {
                None => {
                    return Err(Error::syntax("undelimited string", i..self.end));
                }
                Some((j, c)) if c == quote && !escaped => {
                    return Ok((Token::String, j + 1));
                }
                Some((_, c)) => {
                    escaped = c == '\\' && !escaped;
                }
            }
        }
    }

    fn lex_number<I>(&mut self, iter: I) -> (Token, usize)
    where
        I: Iterator<Item = (usize, char)> + Clone,
    {
        let mut j = self.lex_while(iter, is_number);
        // A fractional part, but only if the dot is followed by a digit so
        // that ranges like `1..3` and method calls like `3.times` still work.
        let mut rest = self.source[j..self.end].chars();
        if let (Some('.'), Some(d)) = (rest.next(), rest.next()) {
            if d.is_ascii_digit() {
                let k = j + 1;
                let iter = self.source[k..self.end]
                    .char_indices()
                    .map(move |(d, c)| (k + d, c));
                j = self.lex_while(iter, is_number);
            }
        }
        (Token::Number, j)
    }

    fn lex_ident_or_keyword<I>(&mut self, iter: I, i: usize) -> (Token, usize)
    where
        I: Iterator<Item = (usize, char)> + Clone,
    {
        let j = self.lex_while(iter, is_ident);
        let tk = match KEYWORDS.contains(&&self.source[i..j]) {
            true => Token::Keyword,
            false => Token::Ident,
        };
        (tk, j)
    }

    fn lex_while<I, P>(&mut self, mut iter: I, pred: P) -> usize
    where
        I: Iterator<Item = (usize, char)> + Clone,
        P: Fn(char) -> bool,
    {
        loop {
            match iter.clone().next() {
                Some((_, c)) if pred(c) => {
                    iter.next();
                }
                Some((j, _)) => return j,
                None => return self.end,
            }
        }
    }
}

/// Words that can never be variable names.
pub const KEYWORDS: &[&str] = &["and", "or", "not", "true", "false", "nil", "in", "do"];

impl Token {
    pub fn human(&self) -> &'static str {
        match self {
            Self::Dot => "member access",
            Self::DotDot => "range operator",
            Self::Comma => "comma",
            Self::Pipe => "pipe",
            Self::OpenParen => "open parenthesis",
            Self::CloseParen => "close parenthesis",
            Self::OpenBracket => "open bracket",
            Self::CloseBracket => "close bracket",
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Star => "star",
            Self::Slash => "slash",
            Self::Percent => "percent",
            Self::Bang => "bang",
            Self::Assign => "assignment",
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge => "comparison",
            Self::AndAnd | Self::OrOr => "logical operator",
            Self::Whitespace => "whitespace",
            Self::Keyword => "keyword",
            Self::Ident => "identifier",
            Self::Number => "number",
            Self::String => "string",
        }
    }

    fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }
}

pub fn is_whitespace(c: char) -> bool {
    matches!(c, '\t' | ' ')
}

/// Whether the string can be used as a variable name.
pub fn is_variable_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident) && !KEYWORDS.contains(&s),
        _ => false,
    }
}

#[cfg(feature = "unicode")]
pub fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

#[cfg(feature = "unicode")]
pub fn is_ident(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

#[cfg(not(feature = "unicode"))]
pub fn is_ident_start(c: char) -> bool {
    matches!(c, 'A'..='Z' | 'a'..='z' | '_')
}

#[cfg(not(feature = "unicode"))]
pub fn is_ident(c: char) -> bool {
    matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_')
}

fn is_number(c: char) -> bool {
    matches!(c, '0'..='9' | 'A'..='Z' | 'a'..='z' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    use Token::*;

    fn lex(source: &str) -> Result<Vec<(Token, &str)>> {
        let mut lexer = Lexer::new(source, Span::from(0..source.len()));
        let mut tokens = Vec::new();
        while let Some((tk, span)) = lexer.next()? {
            tokens.push((tk, &source[span]));
        }
        Ok(tokens)
    }

    #[test]
    fn lex_member_call() {
        let tokens = lex("user.name.upper()").unwrap();
        assert_eq!(
            tokens,
            [
                (Ident, "user"),
                (Dot, "."),
                (Ident, "name"),
                (Dot, "."),
                (Ident, "upper"),
                (OpenParen, "("),
                (CloseParen, ")"),
            ]
        );
    }

    #[test]
    fn lex_operators() {
        let tokens = lex("a == b && !c || d != 1 <= 2").unwrap();
        assert_eq!(
            tokens,
            [
                (Ident, "a"),
                (Eq, "=="),
                (Ident, "b"),
                (AndAnd, "&&"),
                (Bang, "!"),
                (Ident, "c"),
                (OrOr, "||"),
                (Ident, "d"),
                (Ne, "!="),
                (Number, "1"),
                (Le, "<="),
                (Number, "2"),
            ]
        );
    }

    #[test]
    fn lex_numbers_and_ranges() {
        let tokens = lex("1..3 + 3.14 - 0x1f").unwrap();
        assert_eq!(
            tokens,
            [
                (Number, "1"),
                (DotDot, ".."),
                (Number, "3"),
                (Plus, "+"),
                (Number, "3.14"),
                (Minus, "-"),
                (Number, "0x1f"),
            ]
        );
    }

    #[test]
    fn lex_number_method_call() {
        let tokens = lex("3.times").unwrap();
        assert_eq!(tokens, [(Number, "3"), (Dot, "."), (Ident, "times")]);
    }

    #[test]
    fn lex_strings() {
        let tokens = lex(r#""say \"hi\"" + 'it''s'"#).unwrap();
        assert_eq!(
            tokens,
            [
                (String, r#""say \"hi\"""#),
                (Plus, "+"),
                (String, "'it'"),
                (String, "'s'"),
            ]
        );
    }

    #[test]
    fn lex_keywords() {
        let tokens = lex("not nil and true").unwrap();
        assert_eq!(
            tokens,
            [
                (Keyword, "not"),
                (Keyword, "nil"),
                (Keyword, "and"),
                (Keyword, "true"),
            ]
        );
    }

    #[test]
    fn lex_err_undelimited_string() {
        let err = lex("'abc").unwrap_err();
        assert_eq!(err.message(), "undelimited string");
    }

    #[test]
    fn lex_err_unexpected_character() {
        let err = lex("a ; b").unwrap_err();
        assert_eq!(err.message(), "unexpected character");
    }

    #[test]
    fn variable_names() {
        assert!(is_variable_name("user_name"));
        assert!(is_variable_name("_x1"));
        assert!(!is_variable_name("1x"));
        assert!(!is_variable_name("nil"));
        assert!(!is_variable_name("a-b"));
        assert!(!is_variable_name(""));
    }

    #[test]
    fn lex_region_of_line() {
        let line = "= greeting ";
        let mut lexer = Lexer::new(line, Span::from(2..line.len()));
        assert_eq!(lexer.next().unwrap(), Some((Ident, Span::from(2..10))));
        assert_eq!(lexer.next().unwrap(), None);
    }
}
