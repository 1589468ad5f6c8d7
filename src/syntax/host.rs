//! Interfaces the colorizer consumes
//!
//! A [`Host`] owns the text being displayed and stores one state integer per
//! line. An [`Outline`] owns the tree of nodes whose bodies are colored.

use super::tags::Tag;

/// The text widget being colored, seen from the line currently scanned
pub trait Host {
    /// Style `len` bytes of the current line starting at byte `start`
    ///
    /// Later calls win where ranges overlap. Zero-length ranges are never
    /// sent.
    fn set_format(&mut self, start: usize, len: usize, tag: Tag);

    /// Ending state of the previous line, or [`NO_STATE`](super::NO_STATE)
    fn previous_block_state(&self) -> i32;

    /// Record the ending state of the current line
    fn set_current_block_state(&mut self, state: i32);
}

/// Identifier of a node in an [`Outline`]
pub type NodeId = usize;

/// The document tree, as far as coloring cares about it
pub trait Outline {
    /// Body text of a node
    fn body(&self, node: NodeId) -> &str;

    /// Parent of a node, `None` for top-level nodes
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Language implied by the file the node belongs to, if any
    fn file_language(&self, _node: NodeId) -> Option<String> {
        None
    }

    /// Names of the sections a reference in this node's body can resolve to
    fn section_names(&self, _node: NodeId) -> Vec<String> {
        Vec::new()
    }
}

/// One styled range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub start: usize,
    pub len: usize,
    pub tag: Tag,
}

impl Format {
    pub fn new(start: usize, len: usize, tag: Tag) -> Self {
        Self { start, len, tag }
    }

    /// Byte offset just past the range
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}
