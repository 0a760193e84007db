//! Layout engine contract.
//!
//! The engine receives a windowgram blob and the terminal dimensions, and
//! reports either the pane map plus the ordered binary split operations
//! that reproduce it, or a parse error with an offset into the blob. It is
//! a pure function of its inputs; the compiler cross-references its
//! linkage identifiers back to the declared pane ids.

use serde::{Deserialize, Serialize};

/// The fixed pane-id alphabet. A windowgram pane is named by exactly one
/// of these 62 symbols.
pub const PANE_CHARACTERS: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Whether a character is a legal pane id.
pub fn is_pane_id(ch: char) -> bool {
    PANE_CHARACTERS.contains(ch)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

impl Orientation {
    /// The single-letter flag the executor expects.
    pub fn flag(self) -> char {
        match self {
            Orientation::Vertical => 'v',
            Orientation::Horizontal => 'h',
        }
    }
}

/// One pane as placed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPane {
    /// Declared pane id, one symbol from [`PANE_CHARACTERS`].
    pub id: char,
    /// Engine linkage identifier; 0 means the pane could not be linked.
    pub link: u64,
    /// Final pane index in executor order (0-based, before the base offset).
    pub index: u32,
}

/// One binary split, in the order the engine performed them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitOperation {
    /// Linkage identifier of the pane this split creates.
    pub link: u64,
    pub orientation: Orientation,
    /// Pane index the split is performed at, at the time of the split.
    pub at_index: u32,
    /// Resulting pane size in characters, for fixed-size placement.
    pub width: u32,
    pub height: u32,
    /// Size of the new pane relative to the split pane, for relative placement.
    pub percent: f64,
}

/// The engine's output for one window: panes ordered top-to-bottom then
/// left-to-right, and the splits that carve them out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowLayout {
    pub panes: Vec<LayoutPane>,
    pub splits: Vec<SplitOperation>,
}

impl WindowLayout {
    pub fn pane_by_id(&self, id: char) -> Option<&LayoutPane> {
        self.panes.iter().find(|p| p.id == id)
    }

    pub fn pane_by_link(&self, link: u64) -> Option<&LayoutPane> {
        self.panes.iter().find(|p| p.link == link && link != 0)
    }
}

/// A windowgram the engine could not decompose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutError {
    pub message: String,
    /// 1-based line offset into the windowgram blob.
    pub line: usize,
}

/// The geometry engine, injected by the embedder.
pub trait LayoutEngine {
    fn decompose(&self, blob: &str, width: u32, height: u32)
        -> Result<WindowLayout, LayoutError>;
}
