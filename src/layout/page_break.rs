//! # Page Break Planning
//!
//! Decides where pages begin, given the vertical extents of the blocks that
//! must never be divided. The walk is greedy and positional: blocks are
//! visited in document order and never reordered, and a block taller than
//! a page is placed on its own and allowed to overflow.

/// A non-splittable span of the document, in document units (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub top: f64,
    pub height: f64,
}

impl Block {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether `offset` falls strictly inside the block.
    pub fn straddles(&self, offset: f64) -> bool {
        offset > self.top && offset < self.bottom()
    }
}

/// Compute page-break offsets for `blocks` (document order) against a page
/// of `usable_height`.
///
/// Returns the top offset of every block that starts a new page. No blocks
/// means no breaks.
pub fn plan_page_breaks(blocks: &[Block], usable_height: f64) -> Vec<f64> {
    let mut breaks = Vec::new();
    let mut accumulated = 0.0;

    for block in blocks {
        if accumulated + block.height > usable_height && accumulated > 0.0 {
            breaks.push(block.top);
            accumulated = block.height;
        } else {
            accumulated += block.height;
        }
    }

    breaks
}
