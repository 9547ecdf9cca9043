//! Enriched layout blocks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{BBox, Style};

/// Default indent applied to list items, in page units.
pub const DEFAULT_LIST_INDENT: f32 = 15.0;

/// Default bullet glyph for list items.
pub const DEFAULT_LIST_BULLET: &str = "•";

/// Line-spacing ratio used when it cannot be measured.
pub const DEFAULT_LINE_SPACING: f32 = 1.2;

/// A layout region that spans are matched into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Block id (`page{P}_bloc{NN}` or `page{P}_isolated_{span}`)
    pub id: String,

    /// Semantic type
    pub block_type: BlockType,

    /// Plain content
    pub content: String,

    /// Content with local style tags (`<s1>…</s1>`)
    pub styled_content: String,

    /// Top-left position in page units
    pub position: [f32; 2],

    /// Maximum line width in page units
    pub max_width: f32,

    /// Normalized box from the layout model
    #[serde(default)]
    pub bbox: Option<BBox>,

    /// Reference text from the layout model
    #[serde(default)]
    pub reference_text: Option<String>,

    /// Dominant style; `None` while the block has no content
    #[serde(default)]
    pub default_style: Option<Style>,

    /// Local tag name -> style for non-dominant runs
    #[serde(default)]
    pub additional_styles: BTreeMap<String, Style>,

    /// Owned span ids in reading order
    #[serde(default)]
    pub matching_spans: Vec<u32>,

    /// Merge group membership
    #[serde(default)]
    pub merge: Option<MergeInfo>,

    /// Whether the block is exported (only meaningful for isolated spans)
    #[serde(default = "default_true")]
    pub include_in_output: bool,

    /// Keep the block even though it has no spans
    #[serde(default)]
    pub preserve_empty: bool,

    /// Number of lines the block occupied in the source layout
    pub line_budget: u32,

    /// Baseline distance divided by the default font size
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,

    /// Horizontal alignment
    #[serde(default)]
    pub align: Alignment,

    /// List layout for list items
    #[serde(default)]
    pub list: Option<ListLayout>,

    /// How the spans were assigned
    #[serde(default)]
    pub match_source: MatchSource,

    /// Image aliases referenced in the content
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_line_spacing() -> f32 {
    DEFAULT_LINE_SPACING
}

impl Block {
    /// Create an empty block.
    pub fn new(id: impl Into<String>, block_type: BlockType) -> Self {
        Self {
            id: id.into(),
            block_type,
            content: String::new(),
            styled_content: String::new(),
            position: [0.0, 0.0],
            max_width: 0.0,
            bbox: None,
            reference_text: None,
            default_style: None,
            additional_styles: BTreeMap::new(),
            matching_spans: Vec::new(),
            merge: None,
            include_in_output: true,
            preserve_empty: false,
            line_budget: 1,
            line_spacing: DEFAULT_LINE_SPACING,
            align: Alignment::Left,
            list: None,
            match_source: MatchSource::Unmatched,
            images: Vec::new(),
        }
    }

    /// Set the position.
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set the maximum width.
    pub fn with_max_width(mut self, width: f32) -> Self {
        self.max_width = width;
        self
    }

    /// Set the line budget (at least one line).
    pub fn with_line_budget(mut self, lines: u32) -> Self {
        self.line_budget = lines.max(1);
        self
    }

    /// Set the content (plain and styled) and default style.
    pub fn with_content(mut self, content: impl Into<String>, style: Style) -> Self {
        let content = content.into();
        self.styled_content = content.clone();
        self.content = content;
        self.default_style = Some(style);
        self
    }

    /// Style used for layout: the default style, or the fallback for empty blocks.
    pub fn effective_style(&self) -> Style {
        self.default_style.clone().unwrap_or_default()
    }

    /// True for synthetic single-span blocks.
    pub fn is_isolated(&self) -> bool {
        self.block_type == BlockType::IsolatedSpan
    }

    /// True when no span is assigned.
    pub fn is_empty(&self) -> bool {
        self.matching_spans.is_empty()
    }

    /// Check if the block belongs to a merge group.
    pub fn is_merged(&self) -> bool {
        self.merge.is_some()
    }

    /// Whether the block takes part in export.
    pub fn is_exported(&self) -> bool {
        !self.is_isolated() || self.include_in_output
    }
}

/// Semantic block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Heading or title
    Title,
    /// Body paragraph
    #[default]
    Paragraph,
    /// Bulleted or numbered list entry
    ListItem,
    /// Synthetic block holding one unmatched span
    IsolatedSpan,
}

/// Text alignment inside the block box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

/// How a block obtained its spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Assigned by the matcher
    Auto,
    /// Linked by an operator
    Manual,
    /// No spans
    #[default]
    Unmatched,
}

/// Merge group membership of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeInfo {
    /// Group id
    pub group_id: String,
    /// 0-based position within the group
    pub order: u32,
}

/// List layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListLayout {
    /// Bullet glyph drawn before the first line
    pub bullet: String,
    /// Indent of the text after the bullet
    pub indent: f32,
    /// Whether continuation lines are indented too
    pub hang: bool,
}

impl Default for ListLayout {
    fn default() -> Self {
        Self {
            bullet: DEFAULT_LIST_BULLET.to_string(),
            indent: DEFAULT_LIST_INDENT,
            hang: true,
        }
    }
}
