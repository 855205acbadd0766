// Copyright (c) 2021 Fabian Schuiki

//! Input positions for diagnostics.
//!
//! The scanner consumes a stream of characters rather than a mapped file, so
//! positions are tracked as line and column numbers directly instead of byte
//! offsets into a source table.

use std::fmt;

/// A position in the input, in lines and columns. Both are 1-based; column is
/// counted in code points within the line.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Location {
        Location { line, column }
    }

    /// The starting position of an input.
    pub fn start() -> Location {
        Location { line: 1, column: 1 }
    }

    /// Advance the location across one code point.
    pub fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
