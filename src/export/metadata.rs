//! Validation metadata: operator corrections saved apart from the document.
//!
//! The metadata records which spans each block owns after manual review, so
//! the corrections can be replayed onto a freshly enriched document.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Document, MatchSource, Page};

/// Saved corrections for a whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetadata {
    /// When the metadata was captured
    pub saved_at: DateTime<Utc>,

    /// Page number -> page corrections
    pub pages: BTreeMap<u32, PageMetadata>,
}

/// Saved corrections for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Layout blocks
    #[serde(default)]
    pub blocks: Vec<BlockMetadata>,

    /// Isolated span blocks
    #[serde(default)]
    pub isolated: Vec<IsolatedMetadata>,
}

/// Span assignment of a layout block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Block id
    pub id: String,
    /// How the spans were assigned
    pub match_source: MatchSource,
    /// Keep the block even when empty
    #[serde(default)]
    pub preserve_empty: bool,
    /// Owned span ids in order
    pub span_ids: Vec<u32>,
}

/// Export flag of an isolated span block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolatedMetadata {
    /// Block id
    pub id: String,
    /// Whether the block is exported
    pub include_in_output: bool,
    /// Owned span ids
    pub span_ids: Vec<u32>,
}

impl ValidationMetadata {
    /// Capture the current assignments of a document.
    pub fn capture(doc: &Document) -> Self {
        let pages = doc
            .pages
            .iter()
            .map(|page| (page.number, capture_page(page)))
            .collect();
        Self {
            saved_at: Utc::now(),
            pages,
        }
    }

    /// Replay the saved assignments onto `doc`.
    ///
    /// Unknown blocks and spans are skipped, as are spans already claimed by
    /// an earlier block. Spans left unassigned become isolated blocks.
    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        for (number, meta) in &self.pages {
            let Ok(page) = doc.page_mut(*number) else {
                log::warn!("Metadata for page {} has no matching page", number);
                continue;
            };
            apply_page(page, meta)?;
        }
        Ok(())
    }

    /// Number of blocks marked as manually matched.
    pub fn manual_count(&self) -> usize {
        self.pages
            .values()
            .flat_map(|p| p.blocks.iter())
            .filter(|b| b.match_source == MatchSource::Manual)
            .count()
    }
}

fn capture_page(page: &Page) -> PageMetadata {
    let mut meta = PageMetadata::default();
    for block in &page.blocks {
        if block.is_isolated() {
            meta.isolated.push(IsolatedMetadata {
                id: block.id.clone(),
                include_in_output: block.include_in_output,
                span_ids: block.matching_spans.clone(),
            });
        } else {
            meta.blocks.push(BlockMetadata {
                id: block.id.clone(),
                match_source: block.match_source,
                preserve_empty: block.preserve_empty,
                span_ids: block.matching_spans.clone(),
            });
        }
    }
    meta
}

fn apply_page(page: &mut Page, meta: &PageMetadata) -> Result<()> {
    let known: HashSet<u32> = page.spans.iter().map(|s| s.id).collect();
    let mut claimed: HashSet<u32> = HashSet::new();

    page.blocks.retain(|b| !b.is_isolated());
    for saved in &meta.blocks {
        let Some(block) = page.blocks.iter_mut().find(|b| b.id == saved.id) else {
            log::warn!("Page {}: block '{}' no longer exists", page.number, saved.id);
            continue;
        };
        let mut spans = Vec::with_capacity(saved.span_ids.len());
        for id in &saved.span_ids {
            if !known.contains(id) {
                log::warn!("Page {}: span {} no longer exists", page.number, id);
            } else if !claimed.insert(*id) {
                log::warn!("Page {}: span {} assigned twice, keeping first", page.number, id);
            } else {
                spans.push(*id);
            }
        }
        if block.matching_spans != spans {
            block.default_style = None;
        }
        block.matching_spans = spans;
        block.match_source = saved.match_source;
        block.preserve_empty = saved.preserve_empty;
    }

    // Blocks the metadata does not mention must not keep claimed spans.
    let listed: HashSet<&str> = meta.blocks.iter().map(|b| b.id.as_str()).collect();
    for block in page.blocks.iter_mut().filter(|b| !listed.contains(b.id.as_str())) {
        block.matching_spans.retain(|id| claimed.insert(*id));
    }

    let isolated: Vec<_> = page
        .spans
        .iter()
        .filter(|s| s.has_text() && !claimed.contains(&s.id))
        .map(|s| page.isolated_block(s))
        .collect();
    page.blocks.extend(isolated);
    for saved in &meta.isolated {
        if let Some(block) = page.blocks.iter_mut().find(|b| b.id == saved.id) {
            block.include_in_output = saved.include_in_output;
        }
    }

    page.reindex()?;
    let ids: Vec<String> = page.blocks.iter().map(|b| b.id.clone()).collect();
    for id in ids {
        page.refresh_block(&id)?;
    }
    log::debug!(
        "Page {}: applied metadata for {} blocks",
        page.number,
        meta.blocks.len()
    );
    Ok(())
}
