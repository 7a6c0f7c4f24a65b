use std::ops::Range;

/// A byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The byte position of the start of the token.
    pub start: u32,
    /// The length of the token in bytes.
    pub length: u32,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            length: end.saturating_sub(start) as u32,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end()
    }

    pub fn end(&self) -> usize {
        (self.start + self.length) as usize
    }
}
