//! Common types used throughout the editor.

use serde::Deserialize;

/// A position in the document.
///
/// - `y`: line index (0-based)
/// - `x`: **char index** within that line (0-based). This is *not* a byte index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub y: usize,
    pub x: usize, // char index within line
}

impl Ord for Pos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Display metrics derived from the document text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub line_count: usize,
    pub word_count: usize,
    pub char_count: usize,
}

/// Colors the renderer may use for highlight spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightColor {
    Blue,
    Green,
    Grey,
    Yellow,
}

/// What a highlight span marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightCategory {
    Keyword,
    String,
    Comment,
    /// A find result (painted as a background).
    Match,
}

impl HighlightCategory {
    /// Fixed color for this category.
    pub fn color(self) -> HighlightColor {
        match self {
            Self::Keyword => HighlightColor::Blue,
            Self::String => HighlightColor::Green,
            Self::Comment => HighlightColor::Grey,
            Self::Match => HighlightColor::Yellow,
        }
    }

    /// Whether the color applies to the background instead of the glyphs.
    pub fn is_background(self) -> bool {
        matches!(self, Self::Match)
    }
}

/// A tagged range over the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan {
    pub category: HighlightCategory,
    /// Start char offset (inclusive).
    pub start: usize,
    /// End char offset (exclusive).
    pub end: usize,
}

impl HighlightSpan {
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Color scheme of the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}
