use std::cmp::max;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::types::program::File;
use crate::types::span::Span;

/// A convenient type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur during template compilation or rendering.
///
/// The alternate [`Display`][fmt::Display] form (`{:#}`) and the
/// [`Debug`][fmt::Debug] form print a diagnostic containing the active file,
/// the error and an excerpt of the template source around the failing line.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    msg: String,
    span: Option<Span>,
    report: Option<Box<Report>>,
    io: Option<Arc<io::Error>>,
}

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A malformed expression, statement or block header.
    Syntax,
    /// The block structure implied by the indentation is inconsistent.
    Indentation,
    /// An included template could not be read.
    MissingInclude,
    /// Includes were nested deeper than the engine allows.
    IncludeDepth,
    /// The variable context has an unsupported shape.
    Context,
    /// A failure while executing the template.
    Render,
    /// Reading a template or writing the output failed.
    Io,
}

/// Where in the original template source an error occurred.
#[derive(Clone)]
struct Report {
    file: String,
    source: String,
    line: usize,
}

impl Error {
    fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            span: None,
            report: None,
            io: None,
        }
    }

    pub(crate) fn syntax(msg: impl Into<String>, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::Syntax, msg).with_span(span.into())
    }

    pub(crate) fn indentation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Indentation, msg)
    }

    pub(crate) fn missing_include(path: &str) -> Self {
        Self::new(
            ErrorKind::MissingInclude,
            format!("file not found `{path}`"),
        )
    }

    pub(crate) fn include_depth(max: usize) -> Self {
        Self::new(
            ErrorKind::IncludeDepth,
            format!("reached the maximum include depth ({max})"),
        )
    }

    pub(crate) fn context(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Context, msg)
    }

    pub(crate) fn render(msg: impl Into<String>, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::Render, msg).with_span(span.into())
    }

    pub(crate) fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attaches the location of the error, unless it already has one.
    ///
    /// Errors from nested includes are located in the included file, so the
    /// innermost location must win.
    pub(crate) fn locate(mut self, file: &File, line: usize) -> Self {
        if self.report.is_none() {
            self.report = Some(Box::new(Report {
                file: file.name.clone(),
                source: file.source.clone(),
                line,
            }));
        }
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message without any location information.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the name of the template file that was active when the error
    /// occurred.
    pub fn file(&self) -> Option<&str> {
        self.report.as_ref().map(|r| r.file.as_str())
    }

    /// Returns the zero based line in [`file`][Error::file] that was last
    /// executed or being compiled when the error occurred.
    pub fn line(&self) -> Option<usize> {
        self.report.as_ref().map(|r| r.line)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let mut e = Self::new(ErrorKind::Io, err.to_string());
        e.io = Some(Arc::new(err));
        e
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::context(msg.to_string())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.io
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_pretty(self, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return fmt_pretty(self, f);
        }
        write!(f, "{}", self.msg)?;
        if let Some(report) = &self.report {
            write!(f, " at {}:{}", report.file, report.line + 1)?;
        }
        Ok(())
    }
}

impl ErrorKind {
    const fn human(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax error",
            Self::Indentation => "indentation error",
            Self::MissingInclude => "missing include file",
            Self::IncludeDepth => "include depth exceeded",
            Self::Context => "context error",
            Self::Render => "render error",
            Self::Io => "io error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.human())
    }
}

fn fmt_pretty(err: &Error, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let report = match &err.report {
        Some(report) => report,
        None => return write!(f, "{}: {}", err.kind, err.msg),
    };

    writeln!(f)?;
    writeln!(f, "in {}:", report.file)?;
    writeln!(f, " {}: {}", err.kind, err.msg)?;

    let first = report.line.saturating_sub(2);
    for (i, code) in report.source.lines().enumerate().skip(first).take(5) {
        let code = code.trim_end();
        if i != report.line {
            writeln!(f, "   {:3}  {}", i + 1, code)?;
            continue;
        }
        writeln!(f, " > {:3}  {}", i + 1, code)?;
        if let Some(span) = err.span {
            let col = code.get(..span.m).map(width).unwrap_or(0);
            let len = max(1, code.get(span.m..span.n).map(width).unwrap_or(1));
            writeln!(f, "        {:col$}{}", "", "^".repeat(len), col = col)?;
        }
    }
    Ok(())
}

#[cfg(feature = "unicode")]
fn width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(not(feature = "unicode"))]
fn width(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, source: &str) -> File {
        File {
            name: name.into(),
            source: source.into(),
        }
    }

    #[test]
    fn error_pretty_window() {
        let source = "a\nb\nc\nd\ne\nf\ng\n";
        let err = Error::render("boom", 0..1).locate(&file("test.txt", source), 3);
        assert_eq!(
            format!("{err:#}"),
            "
in test.txt:
 render error: boom
     2  b
     3  c
 >   4  d
        ^
     5  e
     6  f
"
        );
    }

    #[test]
    fn error_pretty_window_start_of_file() {
        let source = "- if x\n  = y\n";
        let err = Error::indentation("unexpected").locate(&file("test.txt", source), 0);
        assert_eq!(
            format!("{err:#}"),
            "
in test.txt:
 indentation error: unexpected
 >   1  - if x
     2    = y
"
        );
    }

    #[test]
    fn error_locate_keeps_innermost() {
        let err = Error::missing_include("x.txt")
            .locate(&file("inner.txt", "= include 'x.txt'"), 0)
            .locate(&file("outer.txt", "a\nb\nc\nd\n= include 'inner.txt'"), 4);
        assert_eq!(err.file(), Some("inner.txt"));
        assert_eq!(err.line(), Some(0));
        assert_eq!(err.to_string(), "file not found `x.txt` at inner.txt:1");
    }
}
