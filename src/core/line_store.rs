//! Line storage for the document being edited

use std::fmt;
use std::slice;

/// A single document line tagged with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Current 1-based position of the line in the document
    pub index: usize,
    /// Line content (no embedded newline)
    pub text: String,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}> {}", self.index, self.text)
    }
}

/// Ordered collection holding every line of the document.
///
/// Lines carry an explicit index tag rather than deriving it from their
/// position: a delete leaves a gap and an insert duplicates a tag until the
/// caller runs [`renumber`](LineStore::renumber). Keeping stale tags alive
/// between mutations is what lets a ranged delete address a fixed span of
/// numbers while the store shrinks underneath it.
#[derive(Debug, Default)]
pub struct LineStore {
    lines: Vec<Line>,
}

impl LineStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Append a line at the tail carrying the given index tag.
    ///
    /// No coherence checking: the caller is responsible for passing the
    /// next contiguous number when appending during normal editing.
    pub fn add(&mut self, index: usize, text: impl Into<String>) {
        self.lines.push(Line {
            index,
            text: text.into(),
        });
    }

    /// Remove the first line whose tag equals `index`.
    ///
    /// A miss leaves the store unchanged and is logged rather than
    /// propagated. Does not renumber: removing the tail keeps the numbering
    /// contiguous on its own, anything else needs a renumber pass.
    pub fn delete(&mut self, index: usize) {
        match self.lines.iter().position(|line| line.index == index) {
            Some(pos) => {
                self.lines.remove(pos);
            }
            None => tracing::warn!("delete: no line numbered {}", index),
        }
    }

    /// Splice a new line tagged `index` immediately before the first line
    /// whose tag equals `before` (head position included). Silent no-op
    /// when `before` is not present. Does not renumber.
    pub fn insert(&mut self, before: usize, index: usize, text: impl Into<String>) {
        if let Some(pos) = self.lines.iter().position(|line| line.index == before) {
            self.lines.insert(
                pos,
                Line {
                    index,
                    text: text.into(),
                },
            );
        }
    }

    /// Number of lines currently stored
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    /// Reassign index tags 1, 2, 3, ... in traversal order, restoring the
    /// contiguous-numbering invariant after deletes or inserts
    pub fn renumber(&mut self) {
        for (pos, line) in self.lines.iter_mut().enumerate() {
            line.index = pos + 1;
        }
    }

    /// Forward iteration over the lines, head to tail
    pub fn iter(&self) -> slice::Iter<'_, Line> {
        self.lines.iter()
    }
}
