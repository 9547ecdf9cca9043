//! Formatting records: where and how each block is laid out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{
    Alignment, Block, BlockType, Document, GlobalStyleId, ListLayout, MergeInfo, Style, StyleRef,
};
use crate::style::StyleRegistry;

/// Formatting of a whole document plus its global style table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormattingDocument {
    /// Global style table (`gsN` -> style)
    pub global_styles: StyleRegistry,

    /// Pages in order
    pub pages: Vec<FormattingPage>,
}

/// Formatting of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingPage {
    /// Page number (1-indexed)
    pub page_number: u32,

    /// Page size `[width, height]` in pixels
    pub dimensions: [f32; 2],

    /// Blocks in reading order
    pub blocks: Vec<FormattingBlock>,
}

/// Formatting of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingBlock {
    /// Block id
    pub id: String,

    /// Semantic type
    pub block_type: BlockType,

    /// Top-left position
    pub position: [f32; 2],

    /// Maximum line width
    pub max_width: f32,

    /// Lines the block used in the source layout
    pub line_budget: u32,

    /// Baseline distance divided by font size
    pub line_spacing: f32,

    /// Horizontal alignment
    #[serde(default)]
    pub align: Alignment,

    /// Style untagged text is written in
    pub default_style: StyleRef,

    /// Local tag -> style
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, StyleRef>,

    /// List layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListLayout>,

    /// Merge group membership
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeInfo>,

    /// Image aliases referenced in the content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl FormattingDocument {
    /// Find a block and its page.
    pub fn find_block(&self, id: &str) -> Option<(&FormattingPage, &FormattingBlock)> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter().map(move |block| (page, block)))
            .find(|(_, block)| block.id == id)
    }

    /// Number of blocks over all pages.
    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }

    /// Resolve a block's default style through the global table.
    pub fn default_style_of(&self, block: &FormattingBlock) -> Style {
        self.global_styles
            .resolve(&block.default_style, &Style::fallback())
    }
}

/// Style a block is exported with; empty blocks take `fallback`.
fn export_style(block: &Block, fallback: &Style) -> Style {
    block.default_style.clone().unwrap_or_else(|| fallback.clone())
}

/// Register every exported block's styles in page and reading order.
///
/// Each block contributes its default style first, then its local styles in
/// tag order. Running this again over the same document creates nothing.
pub fn register_styles(doc: &Document, registry: &mut StyleRegistry) {
    let fallback = doc.majority_style();
    for (_, block) in doc.blocks().filter(|(_, b)| b.is_exported()) {
        registry.resolve_or_create(&export_style(block, &fallback));
        for style in block.additional_styles.values() {
            registry.resolve_or_create(style);
        }
    }
}

fn named(registry: &mut StyleRegistry, style: &Style) -> StyleRef {
    StyleRef::Named(registry.resolve_or_create(style))
}

/// Build formatting records for every exported block.
pub fn build_formatting(doc: &Document, registry: &mut StyleRegistry) -> FormattingDocument {
    register_styles(doc, registry);
    let fallback = doc.majority_style();

    let pages = doc
        .pages
        .iter()
        .map(|page| FormattingPage {
            page_number: page.number,
            dimensions: [page.width, page.height],
            blocks: page
                .blocks
                .iter()
                .filter(|b| b.is_exported())
                .map(|block| FormattingBlock {
                    id: block.id.clone(),
                    block_type: block.block_type,
                    position: block.position,
                    max_width: block.max_width,
                    line_budget: block.line_budget,
                    line_spacing: block.line_spacing,
                    align: block.align,
                    default_style: named(registry, &export_style(block, &fallback)),
                    styles: block
                        .additional_styles
                        .iter()
                        .map(|(tag, style)| (tag.clone(), named(registry, style)))
                        .collect(),
                    list: block.list.clone(),
                    merge: block.merge.clone(),
                    images: block.images.clone(),
                })
                .collect(),
        })
        .collect();

    FormattingDocument {
        global_styles: registry.clone(),
        pages,
    }
}

/// Global id of a block's default style, if it is a named reference.
pub fn default_style_id(block: &FormattingBlock) -> Option<GlobalStyleId> {
    match &block.default_style {
        StyleRef::Named(id) => Some(*id),
        StyleRef::Direct(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Page, Span};

    fn doc() -> Document {
        let mut page = Page::new(1, 600.0, 800.0);
        page.spans.push(
            Span::new(0, "Title", BBox::default(), BBox::default()).with_style("Arial-Bold", 14.0, 0),
        );
        page.spans.push(
            Span::new(1, "Body", BBox::default(), BBox::default()).with_style("Arial", 10.0, 0),
        );
        let mut title = Block::new("page1_bloc01", BlockType::Title);
        title.matching_spans = vec![0];
        let mut body = Block::new("page1_bloc02", BlockType::Paragraph);
        body.matching_spans = vec![1];
        let empty = Block::new("page1_bloc03", BlockType::Paragraph);
        page.blocks = vec![title, body, empty];
        page.reindex().unwrap();
        for id in ["page1_bloc01", "page1_bloc02"] {
            page.refresh_block(id).unwrap();
        }
        let mut doc = Document::new();
        doc.add_page(page);
        doc
    }

    #[test]
    fn test_styles_registered_in_reading_order() {
        let doc = doc();
        let mut registry = StyleRegistry::new();
        let formatting = build_formatting(&doc, &mut registry);

        assert_eq!(formatting.block_count(), 3);
        let blocks = &formatting.pages[0].blocks;
        assert_eq!(default_style_id(&blocks[0]), Some(GlobalStyleId(1)));
        assert_eq!(default_style_id(&blocks[1]), Some(GlobalStyleId(2)));
        // Empty block: most common font at the average size.
        let empty_style = formatting.default_style_of(&blocks[2]);
        assert_eq!(empty_style.size, 12.0);
    }

    #[test]
    fn test_reexport_keeps_ids() {
        let doc = doc();
        let mut registry = StyleRegistry::new();
        let first = build_formatting(&doc, &mut registry);
        let before = registry.len();

        let mut seeded: StyleRegistry =
            serde_json::from_str(&serde_json::to_string(&first.global_styles).unwrap()).unwrap();
        let second = build_formatting(&doc, &mut seeded);
        assert_eq!(seeded.len(), before);
        assert_eq!(first.pages, second.pages);
    }

    #[test]
    fn test_excluded_isolated_blocks_skipped() {
        let mut doc = doc();
        let mut isolated = Block::new("page1_isolated_9", BlockType::IsolatedSpan);
        isolated.include_in_output = false;
        doc.pages[0].blocks.push(isolated);

        let formatting = build_formatting(&doc, &mut StyleRegistry::new());
        assert!(formatting.find_block("page1_isolated_9").is_none());
        assert!(formatting.find_block("page1_bloc02").is_some());
    }
}
