//! AST infrastructure types
//!
//! This module contains metadata types used throughout the lexer and parser:
//! - `Span` for tracking source code locations
//! - `LineColumns` for resolving token offsets to line/column in one pass
//! - `DepthTracker` for bounding expression nesting while parsing

use std::fmt;

/// Span representing a location in source code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    /// Span covering everything from the start of `self` to the end of `other`
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            col: self.col,
        }
    }

    /// Compute a span for a byte offset by scanning the source text
    pub fn at_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let mut line = 1;
        let mut col = 1;
        for (i, ch) in source.char_indices() {
            if i >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Self {
            start: offset,
            end: offset,
            line,
            col,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Resolves byte offsets to line and column by scanning forward once
///
/// Offsets are expected in non-decreasing order, as tokens come out of the
/// lexer. An earlier offset restarts the scan from the top of the source.
pub struct LineColumns<'s> {
    source: &'s str,
    offset: usize,
    line: usize,
    col: usize,
}

impl<'s> LineColumns<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn span(&mut self, span: pest::Span) -> Span {
        let target = span.start().min(self.source.len());
        if target < self.offset {
            *self = Self::new(self.source);
        }
        let Some(skipped) = self.source.get(self.offset..target) else {
            return Span {
                end: span.end(),
                ..Span::at_offset(self.source, target)
            };
        };
        for ch in skipped.chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.offset = target;
        Span {
            start: span.start(),
            end: span.end(),
            line: self.line,
            col: self.col,
        }
    }
}

/// Tracks expression nesting depth while parsing
pub struct DepthTracker {
    depth: usize,
    max_depth: usize,
}

impl DepthTracker {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    pub fn push_depth(&mut self) -> Result<(), usize> {
        self.depth += 1;
        if self.depth > self.max_depth {
            let reached = self.depth;
            self.depth -= 1;
            return Err(reached);
        }
        Ok(())
    }

    pub fn pop_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
