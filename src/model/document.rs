//! Document-level types: pages, merge groups and statistics.

use std::collections::HashMap;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use super::{Block, MergeInfo, Page, Style};
use crate::error::{Error, Result};

/// An enriched document: every page with its spans and blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Pages in order
    pub pages: Vec<Page>,
}

/// Blocks translated and redistributed as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeGroup {
    /// Group id (content-derived)
    pub id: String,
    /// Member block ids in merge order
    pub members: Vec<String>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn page(&self, number: u32) -> Result<&Page> {
        let count = self.page_count();
        number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .ok_or(Error::PageOutOfRange(number, count))
    }

    /// Get a page by number (1-indexed), mutably.
    pub fn page_mut(&mut self, number: u32) -> Result<&mut Page> {
        let count = self.page_count();
        number
            .checked_sub(1)
            .and_then(|i| self.pages.get_mut(i as usize))
            .ok_or(Error::PageOutOfRange(number, count))
    }

    /// All blocks in page order, then reading order.
    pub fn blocks(&self) -> impl Iterator<Item = (&Page, &Block)> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter().map(move |block| (page, block)))
    }

    /// Find a block anywhere in the document.
    pub fn find_block(&self, id: &str) -> Option<(&Page, &Block)> {
        self.blocks().find(|(_, block)| block.id == id)
    }

    fn find_block_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.blocks.iter_mut())
            .find(|block| block.id == id)
    }

    /// Revalidate span ownership on every page.
    pub fn reindex(&mut self) -> Result<()> {
        for page in &mut self.pages {
            page.reindex()?;
        }
        Ok(())
    }

    /// Merge blocks into a new group, in the given order.
    ///
    /// The group id is derived from the member ids, so merging the same
    /// blocks again yields the same id.
    pub fn merge_blocks(&mut self, block_ids: &[&str]) -> Result<String> {
        if block_ids.len() < 2 {
            return Err(Error::InvalidMergeGroup(
                "at least two blocks are required".to_string(),
            ));
        }
        for (i, id) in block_ids.iter().enumerate() {
            if block_ids[..i].contains(id) {
                return Err(Error::InvalidMergeGroup(format!("block '{}' listed twice", id)));
            }
            let (_, block) = self
                .find_block(id)
                .ok_or_else(|| Error::MissingBlock(id.to_string()))?;
            if let Some(merge) = &block.merge {
                return Err(Error::InvalidMergeGroup(format!(
                    "block '{}' already belongs to {}",
                    id, merge.group_id
                )));
            }
            if !block.is_exported() {
                return Err(Error::InvalidMergeGroup(format!(
                    "block '{}' is excluded from output",
                    id
                )));
            }
        }

        let group_id = merge_group_id(block_ids);
        for (order, id) in block_ids.iter().enumerate() {
            if let Some(block) = self.find_block_mut(id) {
                block.merge = Some(MergeInfo {
                    group_id: group_id.clone(),
                    order: order as u32,
                });
            }
        }
        log::debug!("Merged {} blocks into {}", block_ids.len(), group_id);
        Ok(group_id)
    }

    /// Dissolve a merge group. Returns the number of released blocks.
    pub fn unmerge(&mut self, group_id: &str) -> Result<usize> {
        let mut released = 0;
        for page in &mut self.pages {
            for block in &mut page.blocks {
                if block.merge.as_ref().is_some_and(|m| m.group_id == group_id) {
                    block.merge = None;
                    released += 1;
                }
            }
        }
        if released == 0 {
            return Err(Error::InvalidMergeGroup(format!("unknown group '{}'", group_id)));
        }
        Ok(released)
    }

    /// All merge groups, ordered by the position of their first member.
    ///
    /// Fails when a group's orders are not exactly `0..n`.
    pub fn merge_groups(&self) -> Result<Vec<MergeGroup>> {
        let mut order: Vec<String> = Vec::new();
        let mut members: HashMap<String, Vec<(u32, String)>> = HashMap::new();

        for (_, block) in self.blocks() {
            if let Some(merge) = &block.merge {
                let entry = members.entry(merge.group_id.clone()).or_insert_with(|| {
                    order.push(merge.group_id.clone());
                    Vec::new()
                });
                entry.push((merge.order, block.id.clone()));
            }
        }

        let mut groups = Vec::with_capacity(order.len());
        for id in order {
            let mut list = members.remove(&id).unwrap_or_default();
            list.sort_by_key(|(o, _)| *o);
            validate_merge_order(&id, &list)?;
            groups.push(MergeGroup {
                id,
                members: list.into_iter().map(|(_, block)| block).collect(),
            });
        }
        Ok(groups)
    }

    /// Most common font across all spans, at the average span size.
    ///
    /// Used for blocks that never had content.
    pub fn majority_style(&self) -> Style {
        let mut fonts: Vec<(String, usize)> = Vec::new();
        let mut size_sum = 0.0f32;
        let mut count = 0usize;

        for page in &self.pages {
            for span in page.spans.iter().filter(|s| s.has_text()) {
                let style = span.style();
                size_sum += style.size;
                count += 1;
                match fonts.iter_mut().find(|(f, _)| *f == style.font) {
                    Some(entry) => entry.1 += 1,
                    None => fonts.push((style.font, 1)),
                }
            }
        }

        let mut best: Option<&(String, usize)> = None;
        for entry in &fonts {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        match best {
            Some((font, _)) => Style::new(font.clone(), size_sum / count as f32, 0),
            None => Style::fallback(),
        }
    }

    /// Block and span counts.
    pub fn statistics(&self) -> DocumentStatistics {
        let mut stats = DocumentStatistics::new();
        for page in &self.pages {
            stats.add_page(page);
        }
        stats.merge_groups = self
            .merge_groups()
            .map(|groups| groups.len() as u32)
            .unwrap_or(0);
        stats
    }
}

/// Content-derived merge group id.
pub fn merge_group_id(block_ids: &[&str]) -> String {
    let mut hasher = Md5::new();
    hasher.update(block_ids.join("|").as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
    format!("merge_{}", hex)
}

fn validate_merge_order(group_id: &str, members: &[(u32, String)]) -> Result<()> {
    for (expected, (order, block)) in members.iter().enumerate() {
        if *order != expected as u32 {
            return Err(Error::InvalidMergeGroup(format!(
                "{}: block '{}' has order {} (expected {})",
                group_id, block, order, expected
            )));
        }
    }
    Ok(())
}

/// Counts of blocks by match state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStatistics {
    /// Number of pages
    pub page_count: u32,
    /// Number of spans
    pub span_count: u32,
    /// Number of layout blocks (isolated blocks excluded)
    pub block_count: u32,
    /// Layout blocks matched automatically
    pub matched_blocks: u32,
    /// Layout blocks linked manually
    pub manual_blocks: u32,
    /// Layout blocks without spans
    pub unmatched_blocks: u32,
    /// Isolated single-span blocks
    pub isolated_blocks: u32,
    /// Isolated blocks excluded from output
    pub excluded_blocks: u32,
    /// Number of merge groups
    pub merge_groups: u32,
}

impl DocumentStatistics {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the blocks and spans of a page.
    pub fn add_page(&mut self, page: &Page) {
        use super::MatchSource;

        self.page_count += 1;
        self.span_count += page.spans.len() as u32;
        for block in &page.blocks {
            if block.is_isolated() {
                self.isolated_blocks += 1;
                if !block.include_in_output {
                    self.excluded_blocks += 1;
                }
                continue;
            }
            self.block_count += 1;
            match block.match_source {
                MatchSource::Auto => self.matched_blocks += 1,
                MatchSource::Manual => self.manual_blocks += 1,
                MatchSource::Unmatched => self.unmatched_blocks += 1,
            }
        }
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &DocumentStatistics) {
        self.page_count += other.page_count;
        self.span_count += other.span_count;
        self.block_count += other.block_count;
        self.matched_blocks += other.matched_blocks;
        self.manual_blocks += other.manual_blocks;
        self.unmatched_blocks += other.unmatched_blocks;
        self.isolated_blocks += other.isolated_blocks;
        self.excluded_blocks += other.excluded_blocks;
        self.merge_groups += other.merge_groups;
    }
}
