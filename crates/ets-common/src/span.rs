//! Source spans.
//!
//! The solver never reads source text; it only carries the span of the
//! expression whose conversion is being judged so diagnostics land at the
//! right place.

use serde::Serialize;

/// Half-open byte range `[start, end)` in a source file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span used when no source position is known (synthetic nodes).
    pub const fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}
