//! Page-level span and block arenas.
//!
//! Spans and blocks live in flat vectors keyed by id. Ownership is recorded
//! once, in each block's `matching_spans`; the span-side `matched_to_block`
//! field is derived from it by [`Page::reindex`], which every mutation calls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::geometry::round2;
use super::{Block, BlockType, MatchQuality, MatchSource, Span};
use crate::error::{Error, Result};
use crate::style::{markup, tag_runs, StyledRun};

/// A single page: its spans and the blocks they are matched into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in pixels
    pub width: f32,

    /// Page height in pixels
    pub height: f32,

    /// Extracted spans in extraction order
    pub spans: Vec<Span>,

    /// Blocks in reading order, isolated blocks last
    pub blocks: Vec<Block>,
}

/// Direction for [`Page::move_span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards the start of the block
    Up,
    /// Towards the end of the block
    Down,
}

impl Page {
    /// Create a new page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            spans: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Look up a span by id.
    pub fn span(&self, id: u32) -> Option<&Span> {
        self.spans.iter().find(|s| s.id == id)
    }

    /// Look up a block by id.
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Look up a block by id, mutably.
    pub fn block_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    fn block_index(&self, id: &str) -> Result<usize> {
        self.blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| Error::MissingBlock(id.to_string()))
    }

    /// Block owning a span, if any.
    pub fn owner_of(&self, span_id: u32) -> Option<&str> {
        self.span(span_id)
            .and_then(|s| s.matched_to_block.as_deref())
    }

    /// Spans of a block in reading order.
    pub fn spans_of<'a>(&'a self, block: &'a Block) -> impl Iterator<Item = &'a Span> + 'a {
        block.matching_spans.iter().filter_map(move |id| self.span(*id))
    }

    /// Styled runs of a block, in reading order.
    pub fn runs_of(&self, block: &Block) -> Vec<StyledRun> {
        self.spans_of(block)
            .map(|s| StyledRun::new(s.text.clone(), s.style()))
            .collect()
    }

    /// Rebuild `matched_to_block` from the blocks' span lists.
    ///
    /// Fails when a block lists an unknown span or two blocks claim the same span.
    pub fn reindex(&mut self) -> Result<()> {
        let positions: HashMap<u32, usize> = self
            .spans
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();
        let mut owners: Vec<Option<String>> = vec![None; self.spans.len()];

        for block in &self.blocks {
            for span_id in &block.matching_spans {
                let pos = *positions.get(span_id).ok_or(Error::UnknownSpan {
                    page: self.number,
                    span_id: *span_id,
                })?;
                if let Some(first) = &owners[pos] {
                    return Err(Error::DuplicateSpan {
                        span_id: *span_id,
                        first: first.clone(),
                        second: block.id.clone(),
                    });
                }
                owners[pos] = Some(block.id.clone());
            }
        }

        for (span, owner) in self.spans.iter_mut().zip(owners) {
            if owner.is_none() {
                span.match_quality = MatchQuality::Unmatched;
            }
            span.matched_to_block = owner;
        }
        Ok(())
    }

    /// Re-derive a block's content and local styles from its spans.
    ///
    /// A block without a default style adopts the dominant style of the
    /// spans it now holds; an emptied block falls back to its reference text.
    pub fn refresh_block(&mut self, block_id: &str) -> Result<()> {
        let idx = self.block_index(block_id)?;
        let runs = self.runs_of(&self.blocks[idx]);
        let block = &mut self.blocks[idx];

        if runs.is_empty() {
            let text = block.reference_text.clone().unwrap_or_default();
            block.content = text.clone();
            block.styled_content = text;
            block.additional_styles.clear();
            block.default_style = None;
            block.images = markup::image_aliases(&block.content);
            return Ok(());
        }

        let tagged = tag_runs(&runs, block.default_style.as_ref());
        block.content = tagged.content;
        block.styled_content = tagged.styled_content;
        block.additional_styles = tagged.local_styles;
        block.default_style = tagged.default_style;
        block.images = markup::image_aliases(&block.content);
        Ok(())
    }

    /// Build the synthetic block for a span that no block owns.
    pub fn isolated_block(&self, span: &Span) -> Block {
        let bbox = span.bbox_normalized.repaired();
        let mut block = Block::new(
            format!("page{}_isolated_{}", self.number, span.id),
            BlockType::IsolatedSpan,
        )
        .with_position(round2(bbox.x0 * self.width), round2(bbox.y0 * self.height))
        .with_max_width(round2(bbox.width() * self.width))
        .with_line_budget(1)
        .with_content(span.text.trim(), span.style());
        block.bbox = Some(bbox);
        block.matching_spans = vec![span.id];
        block.match_source = MatchSource::Auto;
        block.images = markup::image_aliases(&block.content);
        block
    }

    /// Move spans into a block.
    ///
    /// Spans are taken from their current owners; isolated blocks left empty
    /// are removed. The target is marked as manually matched.
    pub fn link_spans(&mut self, block_id: &str, span_ids: &[u32]) -> Result<()> {
        let target = self.block_index(block_id)?;
        for id in span_ids {
            if self.span(*id).is_none() {
                return Err(Error::UnknownSpan {
                    page: self.number,
                    span_id: *id,
                });
            }
        }

        let mut touched: Vec<String> = Vec::new();
        for block in self.blocks.iter_mut() {
            if block.id == block_id {
                continue;
            }
            let before = block.matching_spans.len();
            block.matching_spans.retain(|id| !span_ids.contains(id));
            if block.matching_spans.len() != before {
                if block.matching_spans.is_empty() {
                    block.match_source = MatchSource::Unmatched;
                }
                touched.push(block.id.clone());
            }
        }

        {
            let block = &mut self.blocks[target];
            for id in span_ids {
                if !block.matching_spans.contains(id) {
                    block.matching_spans.push(*id);
                }
            }
            block.match_source = MatchSource::Manual;
        }
        for span in self.spans.iter_mut() {
            if span_ids.contains(&span.id) {
                span.match_quality = MatchQuality::Manual;
            }
        }

        self.blocks
            .retain(|b| !(b.is_isolated() && b.matching_spans.is_empty()));
        self.reindex()?;

        for id in touched {
            if self.block(&id).is_some() {
                self.refresh_block(&id)?;
            }
        }
        log::debug!("Linked {} span(s) to {}", span_ids.len(), block_id);
        self.refresh_block(block_id)
    }

    /// Release spans from a block; each becomes an isolated block again.
    ///
    /// Isolated blocks already stand for unassigned spans, so releasing from
    /// one is a no-op.
    pub fn unlink_spans(&mut self, block_id: &str, span_ids: &[u32]) -> Result<()> {
        let idx = self.block_index(block_id)?;
        if self.blocks[idx].is_isolated() {
            return Ok(());
        }
        let released: Vec<u32> = self.blocks[idx]
            .matching_spans
            .iter()
            .copied()
            .filter(|id| span_ids.contains(id))
            .collect();
        if released.is_empty() {
            return Ok(());
        }

        {
            let block = &mut self.blocks[idx];
            block.matching_spans.retain(|id| !released.contains(id));
            if block.matching_spans.is_empty() {
                block.match_source = MatchSource::Unmatched;
            }
        }

        let isolated: Vec<Block> = released
            .iter()
            .filter_map(|id| self.span(*id))
            .map(|span| self.isolated_block(span))
            .collect();
        for block in isolated {
            if self.block(&block.id).is_none() {
                self.blocks.push(block);
            }
        }

        self.reindex()?;
        log::debug!("Released {} span(s) from {}", released.len(), block_id);
        self.refresh_block(block_id)
    }

    /// Release every span of a block.
    pub fn unlink_block(&mut self, block_id: &str) -> Result<()> {
        let spans = self.block(block_id)
            .ok_or_else(|| Error::MissingBlock(block_id.to_string()))?
            .matching_spans
            .clone();
        self.unlink_spans(block_id, &spans)
    }

    /// Move a span one position within its block.
    ///
    /// Returns `false` when the span is already at that end.
    pub fn move_span(&mut self, block_id: &str, span_id: u32, direction: MoveDirection) -> Result<bool> {
        let idx = self.block_index(block_id)?;
        let spans = &mut self.blocks[idx].matching_spans;
        let pos = spans
            .iter()
            .position(|id| *id == span_id)
            .ok_or(Error::UnknownSpan {
                page: self.number,
                span_id,
            })?;

        let other = match direction {
            MoveDirection::Up if pos > 0 => pos - 1,
            MoveDirection::Down if pos + 1 < spans.len() => pos + 1,
            _ => return Ok(false),
        };
        spans.swap(pos, other);
        self.refresh_block(block_id)?;
        Ok(true)
    }

    /// Mark an empty block to be kept in the output.
    pub fn set_preserve_empty(&mut self, block_id: &str, preserve: bool) -> Result<()> {
        let idx = self.block_index(block_id)?;
        self.blocks[idx].preserve_empty = preserve;
        Ok(())
    }

    /// Include or exclude a block from export.
    ///
    /// Merged blocks cannot be excluded; unmerge them first.
    pub fn set_include_in_output(&mut self, block_id: &str, include: bool) -> Result<()> {
        let idx = self.block_index(block_id)?;
        if !include {
            if let Some(merge) = &self.blocks[idx].merge {
                return Err(Error::InvalidMergeGroup(format!(
                    "block '{}' belongs to {} and cannot be excluded",
                    block_id, merge.group_id
                )));
            }
        }
        self.blocks[idx].include_in_output = include;
        Ok(())
    }

    /// Number of spans not owned by any block.
    pub fn unmatched_span_count(&self) -> usize {
        self.spans.iter().filter(|s| !s.is_matched()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Style};

    fn page_with_spans() -> Page {
        let mut page = Page::new(1, 1000.0, 1000.0);
        let texts = [("Hello", 0.1), ("World", 0.2), ("Stray", 0.8)];
        for (i, (text, y)) in texts.iter().enumerate() {
            let norm = BBox::new(0.1, *y, 0.3, y + 0.02);
            page.spans.push(
                Span::new(i as u32, *text, norm.scale(1000.0, 1000.0), norm)
                    .with_style("Arial", 10.0, 0),
            );
        }
        let mut block = Block::new("page1_bloc00", BlockType::Paragraph);
        block.matching_spans = vec![0, 1];
        block.match_source = MatchSource::Auto;
        page.blocks.push(block);
        let isolated = page.isolated_block(&page.spans[2]);
        page.blocks.push(isolated);
        page.reindex().unwrap();
        page.refresh_block("page1_bloc00").unwrap();
        page
    }

    #[test]
    fn test_reindex_sets_owners() {
        let page = page_with_spans();
        assert_eq!(page.owner_of(0), Some("page1_bloc00"));
        assert_eq!(page.owner_of(2), Some("page1_isolated_2"));
        assert_eq!(page.block("page1_bloc00").unwrap().content, "Hello World");
    }

    #[test]
    fn test_reindex_rejects_double_assignment() {
        let mut page = page_with_spans();
        page.blocks[1].matching_spans.push(0);
        let err = page.reindex().unwrap_err();
        assert!(matches!(err, Error::DuplicateSpan { span_id: 0, .. }));
    }

    #[test]
    fn test_reindex_rejects_unknown_span() {
        let mut page = page_with_spans();
        page.blocks[0].matching_spans.push(42);
        assert!(matches!(
            page.reindex(),
            Err(Error::UnknownSpan { span_id: 42, .. })
        ));
    }

    #[test]
    fn test_link_span_consumes_isolated_block() {
        let mut page = page_with_spans();
        page.link_spans("page1_bloc00", &[2]).unwrap();

        assert!(page.block("page1_isolated_2").is_none());
        let block = page.block("page1_bloc00").unwrap();
        assert_eq!(block.matching_spans, vec![0, 1, 2]);
        assert_eq!(block.match_source, MatchSource::Manual);
        assert_eq!(block.content, "Hello World Stray");
        assert_eq!(page.span(2).unwrap().match_quality, MatchQuality::Manual);
    }

    #[test]
    fn test_empty_block_inherits_linked_style() {
        let mut page = page_with_spans();
        page.spans[2].font_name = Some("Times".to_string());
        let empty = Block::new("page1_bloc01", BlockType::Paragraph);
        page.blocks.push(empty);

        page.link_spans("page1_bloc01", &[2]).unwrap();
        let block = page.block("page1_bloc01").unwrap();
        assert_eq!(block.default_style, Some(Style::new("Times", 10.0, 0)));
        assert_eq!(block.styled_content, "Stray");
    }

    #[test]
    fn test_unlink_creates_isolated_block() {
        let mut page = page_with_spans();
        page.unlink_spans("page1_bloc00", &[1]).unwrap();

        let isolated = page.block("page1_isolated_1").unwrap();
        assert_eq!(isolated.content, "World");
        assert_eq!(page.owner_of(1), Some("page1_isolated_1"));
        assert_eq!(page.block("page1_bloc00").unwrap().content, "Hello");
    }

    #[test]
    fn test_unlink_block_empties_it() {
        let mut page = page_with_spans();
        page.unlink_block("page1_bloc00").unwrap();
        let block = page.block("page1_bloc00").unwrap();
        assert!(block.is_empty());
        assert!(block.default_style.is_none());
        assert_eq!(block.match_source, MatchSource::Unmatched);
        assert!(page.block("page1_isolated_0").is_some());
        assert!(page.block("page1_isolated_1").is_some());
    }

    #[test]
    fn test_move_span() {
        let mut page = page_with_spans();
        assert!(page.move_span("page1_bloc00", 1, MoveDirection::Up).unwrap());
        assert_eq!(page.block("page1_bloc00").unwrap().content, "World Hello");
        assert!(!page.move_span("page1_bloc00", 1, MoveDirection::Up).unwrap());
    }

    #[test]
    fn test_merged_block_cannot_be_excluded() {
        let mut page = page_with_spans();
        page.blocks[1].merge = Some(crate::model::MergeInfo {
            group_id: "merge_x".to_string(),
            order: 1,
        });
        assert!(matches!(
            page.set_include_in_output("page1_isolated_2", false),
            Err(Error::InvalidMergeGroup(_))
        ));
        assert!(page.block("page1_isolated_2").unwrap().is_exported());
        page.set_include_in_output("page1_isolated_2", true).unwrap();
    }

    #[test]
    fn test_flags() {
        let mut page = page_with_spans();
        page.set_preserve_empty("page1_bloc00", true).unwrap();
        page.set_include_in_output("page1_isolated_2", false).unwrap();
        assert!(page.block("page1_bloc00").unwrap().preserve_empty);
        assert!(!page.block("page1_isolated_2").unwrap().is_exported());
        assert!(page.set_preserve_empty("nope", true).is_err());
    }
}
