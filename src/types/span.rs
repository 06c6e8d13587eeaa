//! Defines a [`Span`] which is used to represent a region of a single
//! template line.

use std::cmp::{max, min};
use std::ops::{Index, Range};

/// A byte range, relative to the start of the text it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub m: usize,
    pub n: usize,
}

impl Span {
    pub fn combine(self, other: Self) -> Self {
        let m = min(self.m, other.m);
        let n = max(self.n, other.n);
        Self { m, n }
    }

    /// Moves the span right by `offset` bytes.
    ///
    /// Expressions are lexed on their own, this is used to make their spans
    /// relative to the full template line again.
    pub fn shift(self, offset: usize) -> Self {
        Self {
            m: self.m + offset,
            n: self.n + offset,
        }
    }
}

impl Index<Span> for str {
    type Output = str;

    fn index(&self, span: Span) -> &Self::Output {
        let Span { m, n } = span;
        &self[m..n]
    }
}

impl From<Range<usize>> for Span {
    fn from(r: Range<usize>) -> Self {
        Self {
            m: r.start,
            n: r.end,
        }
    }
}
