//! Per-page input records: layout blocks and extracted spans.

use serde::{Deserialize, Serialize};

use crate::model::{BBox, BlockType, Span};

/// One page as delivered by the layout model and the text extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInput {
    /// Page width in pixels
    pub width: f32,

    /// Page height in pixels
    pub height: f32,

    /// Layout blocks detected on the page
    #[serde(default)]
    pub layout: Vec<LayoutBlock>,

    /// Extracted spans in extraction order
    #[serde(default)]
    pub spans: Vec<Span>,
}

impl PageInput {
    /// Create an empty page input.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            layout: Vec::new(),
            spans: Vec::new(),
        }
    }

    /// Add a layout block.
    pub fn with_block(mut self, block: LayoutBlock) -> Self {
        self.layout.push(block);
        self
    }

    /// Add a span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }
}

/// A region detected by the layout model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBlock {
    /// Id assigned by the layout model
    #[serde(default)]
    pub id: Option<String>,

    /// Layout kind ("title", "text", "image", ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Normalized bounding box
    #[serde(default)]
    pub bbox: Option<BBox>,

    /// Normalized polygon `[x, y, x, y, ...]`, used when `bbox` is absent
    #[serde(default)]
    pub poly: Option<Vec<f32>>,

    /// Text recognized by the layout model
    #[serde(default)]
    pub content: Option<String>,
}

impl LayoutBlock {
    /// Create a layout block from a normalized bbox.
    pub fn new(kind: impl Into<String>, bbox: BBox) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            bbox: Some(bbox),
            poly: None,
            content: None,
        }
    }

    /// Set the reference text.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Well-formed normalized bounds, if the block has any geometry.
    ///
    /// Inverted boxes are repaired with a warning.
    pub fn bounds(&self) -> Option<BBox> {
        let raw = self
            .bbox
            .or_else(|| self.poly.as_deref().and_then(BBox::from_polygon))?;
        if raw.is_degenerate() {
            log::warn!(
                "Repairing degenerate layout bbox {:?} ({})",
                <[f32; 4]>::from(raw),
                self.kind
            );
            return Some(raw.repaired());
        }
        Some(raw)
    }

    /// Reference text, if non-blank.
    pub fn reference_text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Block type implied by the layout kind alone.
    pub fn seed_type(&self) -> BlockType {
        if self.kind.eq_ignore_ascii_case("title") {
            BlockType::Title
        } else {
            BlockType::Paragraph
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_block_from_json() {
        let json = r#"{"type":"text","bbox":[0.1,0.1,0.9,0.2],"content":"Hello"}"#;
        let block: LayoutBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.kind, "text");
        assert_eq!(block.bounds(), Some(BBox::new(0.1, 0.1, 0.9, 0.2)));
        assert_eq!(block.reference_text(), Some("Hello"));
        assert_eq!(block.seed_type(), BlockType::Paragraph);
    }

    #[test]
    fn test_layout_block_poly_fallback() {
        let json = r#"{"type":"title","poly":[0.1,0.2,0.5,0.2,0.5,0.3,0.1,0.3]}"#;
        let block: LayoutBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.bounds(), Some(BBox::new(0.1, 0.2, 0.5, 0.3)));
        assert_eq!(block.seed_type(), BlockType::Title);
        assert_eq!(block.reference_text(), None);
    }

    #[test]
    fn test_layout_block_repairs_inverted_bbox() {
        let block = LayoutBlock::new("text", BBox::new(0.9, 0.2, 0.1, 0.1));
        assert_eq!(block.bounds(), Some(BBox::new(0.1, 0.1, 0.9, 0.2)));
    }

    #[test]
    fn test_page_input_deserialize() {
        let json = r#"{"width":600,"height":800,"spans":[{"id":0,"text":"Hi","bbox_pixels":[0,0,10,10],"bbox_normalized":[0,0,0.1,0.1],"font_name":"Arial","font_size":10.0,"color":0}]}"#;
        let page: PageInput = serde_json::from_str(json).unwrap();
        assert_eq!(page.spans.len(), 1);
        assert!(page.layout.is_empty());
    }
}
