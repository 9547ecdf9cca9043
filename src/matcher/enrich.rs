//! Page enrichment: span-to-block matching and block derivation.

use std::collections::HashSet;
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;

use super::input::{LayoutBlock, PageInput};
use super::lines::{line_spacing_ratio, reading_order};
use super::options::{ErrorMode, MatchOptions};
use super::scoring::text_score;
use crate::error::{Error, Result};
use crate::model::{
    round2, BBox, Block, BlockType, Document, ListLayout, MatchQuality, MatchSource, Page, Span,
    DEFAULT_LINE_SPACING, FALLBACK_SIZE,
};
use crate::style::{markup, tag_runs, StyledRun};

/// Line height used to estimate how many lines a layout box held.
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Matches extracted spans to layout blocks.
#[derive(Debug, Clone, Default)]
pub struct SpanMatcher {
    options: MatchOptions,
}

impl SpanMatcher {
    /// Create a matcher with the given options.
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    /// Matching options in use.
    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Enrich every page of a document.
    ///
    /// Pages are independent; they are matched in parallel unless the
    /// options ask for sequential processing.
    pub fn match_document(&self, pages: Vec<PageInput>) -> Result<Document> {
        let pages: Vec<Page> = if self.options.parallel {
            pages
                .into_par_iter()
                .enumerate()
                .map(|(i, input)| self.match_page(i as u32 + 1, input))
                .collect::<Result<Vec<_>>>()?
        } else {
            pages
                .into_iter()
                .enumerate()
                .map(|(i, input)| self.match_page(i as u32 + 1, input))
                .collect::<Result<Vec<_>>>()?
        };
        Ok(Document { pages })
    }

    /// Enrich a single page (numbered from 1).
    pub fn match_page(&self, number: u32, input: PageInput) -> Result<Page> {
        let mut page = Page::new(number, input.width, input.height);
        page.spans = self.ingest_spans(number, input.spans)?;

        let mut layout: Vec<(BBox, &LayoutBlock)> = input
            .layout
            .iter()
            .filter(|b| {
                let accepted = self.options.accepts(&b.kind);
                if !accepted {
                    log::debug!("Page {}: skipping layout block of kind '{}'", number, b.kind);
                }
                accepted
            })
            .filter_map(|b| b.bounds().map(|bbox| (bbox, b)))
            .collect();
        layout.sort_by(|a, b| {
            let y_cmp = a.0.y0.partial_cmp(&b.0.y0).unwrap_or(std::cmp::Ordering::Equal);
            if y_cmp == std::cmp::Ordering::Equal {
                a.0.x0.partial_cmp(&b.0.x0).unwrap_or(std::cmp::Ordering::Equal)
            } else {
                y_cmp
            }
        });

        let mut claimed: HashSet<u32> = HashSet::new();
        for (index, (bbox, source)) in layout.iter().enumerate() {
            let matched = self.claim_spans(&page, bbox, source.reference_text(), &claimed);
            for (span_id, score) in &matched {
                claimed.insert(*span_id);
                if let Some(span) = page.spans.iter_mut().find(|s| s.id == *span_id) {
                    span.match_quality = MatchQuality::from_score(*score);
                }
            }
            let ids: Vec<u32> = matched.into_iter().map(|(id, _)| id).collect();
            let block = self.build_block(&page, index, *bbox, source, ids);
            page.blocks.push(block);
        }

        let isolated: Vec<Block> = page
            .spans
            .iter()
            .filter(|s| !claimed.contains(&s.id))
            .map(|s| page.isolated_block(s))
            .collect();
        log::debug!(
            "Page {}: {} blocks, {} isolated spans",
            number,
            page.blocks.len(),
            isolated.len()
        );
        page.blocks.extend(isolated);

        page.reindex()?;
        Ok(page)
    }

    /// Drop blank spans, repair geometry and check id uniqueness.
    fn ingest_spans(&self, number: u32, spans: Vec<Span>) -> Result<Vec<Span>> {
        let mut seen: HashSet<u32> = HashSet::new();
        let mut kept = Vec::with_capacity(spans.len());

        for mut span in spans {
            if !span.has_text() {
                continue;
            }
            if !seen.insert(span.id) {
                match self.options.error_mode {
                    ErrorMode::Strict => {
                        return Err(Error::InvalidInput(format!(
                            "duplicate span id {} on page {}",
                            span.id, number
                        )))
                    }
                    ErrorMode::Lenient => {
                        log::warn!("Page {}: dropping duplicate span id {}", number, span.id);
                        continue;
                    }
                }
            }
            if span.bbox_normalized.is_degenerate() {
                log::warn!("Page {}: repairing bbox of span {}", number, span.id);
                span.bbox_normalized = span.bbox_normalized.repaired();
                span.bbox_pixels = span.bbox_pixels.repaired();
            }
            span.matched_to_block = None;
            span.match_quality = MatchQuality::Unmatched;
            kept.push(span);
        }
        Ok(kept)
    }

    /// Candidate spans of a block in reading order, with their text scores.
    fn claim_spans(
        &self,
        page: &Page,
        bbox: &BBox,
        reference: Option<&str>,
        claimed: &HashSet<u32>,
    ) -> Vec<(u32, f32)> {
        let candidates: Vec<&Span> = page
            .spans
            .iter()
            .filter(|s| !claimed.contains(&s.id))
            .filter(|s| bbox.contains_with_slack(&s.bbox_normalized, self.options.bbox_tolerance))
            .filter(|s| text_score(&s.text, reference) > 0.0)
            .collect();

        reading_order(&candidates, self.options.line_tolerance_px)
            .into_iter()
            .map(|s| (s.id, text_score(&s.text, reference)))
            .collect()
    }

    fn build_block(
        &self,
        page: &Page,
        index: usize,
        bbox: BBox,
        source: &LayoutBlock,
        span_ids: Vec<u32>,
    ) -> Block {
        let spans: Vec<&Span> = span_ids.iter().filter_map(|id| page.span(*id)).collect();
        let runs: Vec<StyledRun> = spans
            .iter()
            .map(|s| StyledRun::new(s.text.clone(), s.style()))
            .collect();
        let tagged = tag_runs(&runs, None);

        let mut block = Block::new(
            format!("page{}_bloc{:02}", page.number, index),
            source.seed_type(),
        )
        .with_position(round2(bbox.x0 * page.width), round2(bbox.y0 * page.height))
        .with_max_width(round2(bbox.width() * page.width));
        block.bbox = Some(bbox);
        block.reference_text = source.reference_text().map(str::to_string);

        if spans.is_empty() {
            let text = block.reference_text.clone().unwrap_or_default();
            block.styled_content = text.clone();
            block.content = text;
        } else {
            block.content = tagged.content;
            block.styled_content = tagged.styled_content;
            block.additional_styles = tagged.local_styles;
            block.default_style = tagged.default_style;
            block.match_source = MatchSource::Auto;
        }

        block.block_type = classify(source.seed_type(), &block.content);
        if block.block_type == BlockType::ListItem {
            block.list = Some(ListLayout::default());
        }
        block.images = markup::image_aliases(&block.content);

        let average_size = if spans.is_empty() {
            FALLBACK_SIZE
        } else {
            spans.iter().map(|s| s.style().size).sum::<f32>() / spans.len() as f32
        };
        block.line_budget = line_budget(bbox, average_size, page.height);

        let default_size = block.effective_style().size;
        block.line_spacing =
            line_spacing_ratio(&spans, self.options.spacing_tolerance_px, default_size)
                .map(round2)
                .unwrap_or(DEFAULT_LINE_SPACING);

        log::debug!(
            "{}: {} spans, {:?}, {} line(s)",
            block.id,
            spans.len(),
            block.block_type,
            block.line_budget
        );
        block
    }
}

/// Number of lines a normalized box held at the given font size.
pub fn line_budget(bbox: BBox, font_size: f32, page_height: f32) -> u32 {
    if page_height <= 0.0 || font_size <= 0.0 {
        return 1;
    }
    let line_height = font_size * LINE_HEIGHT_FACTOR / page_height;
    let lines = (bbox.height() / line_height).round();
    if lines.is_finite() && lines >= 1.0 {
        lines as u32
    } else {
        1
    }
}

fn list_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:[-*]\s|\d+\.\s)").expect("list pattern is valid"))
}

/// Semantic type from the layout kind and the text.
pub fn classify(seed: BlockType, content: &str) -> BlockType {
    if seed == BlockType::Title {
        return BlockType::Title;
    }
    let text = content.trim();
    if text.starts_with('•') || list_regex().is_match(text) {
        return BlockType::ListItem;
    }
    let has_upper = text.chars().any(|c| c.is_uppercase());
    let has_lower = text.chars().any(|c| c.is_lowercase());
    if has_upper && !has_lower && text.split_whitespace().count() < 10 {
        return BlockType::Title;
    }
    BlockType::Paragraph
}
