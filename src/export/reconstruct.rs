//! Reconstruction planning: lay out translated text in the original boxes.
//!
//! The plan tells a renderer, for every block, which lines to draw and at
//! which compression and line advance, so it reproduces the fitting decision
//! without measuring text itself.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::formatting::{FormattingBlock, FormattingDocument};
use super::translation::TranslationRecord;
use crate::error::{Error, Result};
use crate::model::{AliasTable, BlockType, ListLayout};
use crate::redistribute::{redistribute_text, split_proportional, MemberSlot};
use crate::reflow::{
    fit_lines, layout_lines, parse_tagged_text, reflow_text, split_list_items, Compression,
    FitResult, FitTarget, Line, ReflowBox, ReflowOptions, SpacingMode, TagContext,
};

/// Layout of every translated block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconstructionPlan {
    /// Pages in order
    pub pages: Vec<PlannedPage>,
}

/// Layout of one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedPage {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Page size `[width, height]`
    pub dimensions: [f32; 2],
    /// Laid-out blocks in reading order
    pub blocks: Vec<PlannedBlock>,
}

/// Layout of one block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedBlock {
    /// Block id
    pub id: String,
    /// Top-left position
    pub position: [f32; 2],
    /// Maximum line width
    pub max_width: f32,
    /// Default font size before compression
    pub font_size: f32,
    /// Wrapped lines
    pub lines: Vec<Line>,
    /// Compression the lines were laid out with
    #[serde(flatten)]
    pub compression: Compression,
    /// Line advance mode
    pub spacing_mode: SpacingMode,
    /// Distance between baselines
    pub line_advance: f32,
    /// False when the lines overflow the line budget
    pub fitted: bool,
    /// List layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListLayout>,
    /// Merge group the block was redistributed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_group: Option<String>,
}

impl ReconstructionPlan {
    /// Find a planned block.
    pub fn block(&self, id: &str) -> Option<&PlannedBlock> {
        self.pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .find(|b| b.id == id)
    }

    /// Number of blocks that overflow their budget.
    pub fn overflow_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .filter(|b| !b.fitted)
            .count()
    }
}

struct Planner<'a> {
    formatting: &'a FormattingDocument,
    aliases: &'a AliasTable,
    options: &'a ReflowOptions,
}

impl Planner<'_> {
    fn reflow_box(block: &FormattingBlock) -> ReflowBox {
        ReflowBox {
            max_width: block.max_width,
            list: block.list.clone(),
        }
    }

    fn target(&self, block: &FormattingBlock) -> FitTarget {
        let style = self.formatting.default_style_of(block);
        FitTarget::new(block.line_budget, style.size, block.line_spacing)
    }

    /// Lay out one block on its own.
    fn plan_block(&self, block: &FormattingBlock, text: &str) -> PlannedBlock {
        let style = self.formatting.default_style_of(block);
        let target = self.target(block);
        let result = reflow_text(
            text,
            &style,
            block.max_width,
            block.list.as_ref(),
            &target,
            &self.formatting.global_styles,
            self.aliases,
            self.options,
        );
        Self::planned(block, &target, result)
    }

    fn planned(block: &FormattingBlock, target: &FitTarget, result: FitResult) -> PlannedBlock {
        PlannedBlock {
            id: block.id.clone(),
            position: block.position,
            max_width: block.max_width,
            font_size: target.font_size,
            line_advance: result.line_advance(target),
            lines: result.lines,
            compression: result.compression,
            spacing_mode: result.spacing_mode,
            fitted: result.fitted,
            list: block.list.clone(),
            merge_group: None,
        }
    }

    /// Split a group's text across its members and lay each out.
    fn plan_group(&self, group_id: &str, members: &[&FormattingBlock], text: &str) -> Vec<PlannedBlock> {
        let Some(first) = members.first() else {
            return Vec::new();
        };
        let text = if first.block_type == BlockType::ListItem {
            split_list_items(text)
        } else {
            text.to_string()
        };

        // Untagged group text is written in the first member's style.
        let reference = self.formatting.default_style_of(first);

        if members.iter().any(|m| m.max_width <= 0.0) {
            log::debug!("{}: member without width, splitting proportionally", group_id);
            let budgets: Vec<u32> = members.iter().map(|m| m.line_budget).collect();
            let parts = split_proportional(&text, &budgets);
            let ctx = TagContext::new(&self.formatting.global_styles, self.aliases);
            return members
                .iter()
                .zip(parts)
                .map(|(member, part)| {
                    let segments = parse_tagged_text(&part, &reference, &ctx);
                    let target = self.target(member);
                    let result = fit_lines(
                        &segments,
                        &Self::reflow_box(member),
                        &target,
                        &self.options.ladder,
                        self.options.measurer(),
                    );
                    PlannedBlock {
                        merge_group: Some(group_id.to_string()),
                        ..Self::planned(member, &target, result)
                    }
                })
                .collect();
        }

        let slots: Vec<MemberSlot> = members
            .iter()
            .map(|m| MemberSlot::new(m.id.clone(), Self::reflow_box(m), m.line_budget))
            .collect();
        let redistribution = redistribute_text(
            &text,
            &reference,
            &slots,
            &self.formatting.global_styles,
            self.aliases,
            self.options,
        );

        members
            .iter()
            .zip(redistribution.shares)
            .map(|(member, share)| {
                let style = self.formatting.default_style_of(member);
                let lines = layout_lines(
                    &share.segments,
                    &Self::reflow_box(member),
                    redistribution.compression,
                    self.options.measurer(),
                );
                let spacing_mode = SpacingMode::Original;
                PlannedBlock {
                    id: member.id.clone(),
                    position: member.position,
                    max_width: member.max_width,
                    font_size: style.size,
                    line_advance: spacing_mode.line_advance(
                        style.size,
                        member.line_spacing,
                        redistribution.compression.font_scale,
                    ),
                    lines,
                    compression: redistribution.compression,
                    spacing_mode,
                    fitted: redistribution.fitted,
                    list: member.list.clone(),
                    merge_group: Some(group_id.to_string()),
                }
            })
            .collect()
    }
}

/// Members of each merge group in order, validated to be `0..n`.
fn collect_groups(formatting: &FormattingDocument) -> Result<BTreeMap<String, Vec<&FormattingBlock>>> {
    let mut raw: BTreeMap<String, Vec<(u32, &FormattingBlock)>> = BTreeMap::new();
    for page in &formatting.pages {
        for block in &page.blocks {
            if let Some(merge) = &block.merge {
                raw.entry(merge.group_id.clone())
                    .or_default()
                    .push((merge.order, block));
            }
        }
    }

    let mut groups = BTreeMap::new();
    for (id, mut members) in raw {
        members.sort_by_key(|(order, _)| *order);
        for (expected, (order, block)) in members.iter().enumerate() {
            if *order != expected as u32 {
                return Err(Error::InvalidMergeGroup(format!(
                    "{}: block '{}' has order {} (expected {})",
                    id, block.id, order, expected
                )));
            }
        }
        groups.insert(id, members.into_iter().map(|(_, b)| b).collect());
    }
    Ok(groups)
}

/// Build the reconstruction plan.
///
/// Each block takes its record's target text, or its source when the target
/// is empty. Merge groups are redistributed over their members. Blocks
/// without a record are left out; records matching no block are ignored.
pub fn plan_reconstruction(
    formatting: &FormattingDocument,
    translations: &[TranslationRecord],
    aliases: &AliasTable,
    options: &ReflowOptions,
) -> Result<ReconstructionPlan> {
    let records: HashMap<&str, &TranslationRecord> =
        translations.iter().map(|r| (r.id.as_str(), r)).collect();
    let groups = collect_groups(formatting)?;
    let planner = Planner {
        formatting,
        aliases,
        options,
    };

    let mut used: HashSet<&str> = HashSet::new();
    let mut planned: HashMap<String, PlannedBlock> = HashMap::new();
    for (group_id, members) in &groups {
        let Some(record) = records.get(group_id.as_str()) else {
            log::debug!("{}: no translation record", group_id);
            continue;
        };
        used.insert(record.id.as_str());
        for block in planner.plan_group(group_id, members, record.text()) {
            planned.insert(block.id.clone(), block);
        }
    }

    let mut pages = Vec::with_capacity(formatting.pages.len());
    for page in &formatting.pages {
        let mut blocks = Vec::with_capacity(page.blocks.len());
        for block in &page.blocks {
            if block.merge.is_some() {
                if let Some(planned) = planned.remove(&block.id) {
                    blocks.push(planned);
                }
                continue;
            }
            match records.get(block.id.as_str()) {
                Some(record) => {
                    used.insert(record.id.as_str());
                    blocks.push(planner.plan_block(block, record.text()));
                }
                None => log::debug!("{}: no translation record", block.id),
            }
        }
        pages.push(PlannedPage {
            page_number: page.page_number,
            dimensions: page.dimensions,
            blocks,
        });
    }

    for record in translations.iter().filter(|r| !used.contains(r.id.as_str())) {
        log::warn!("Translation '{}' matches no block or merge group", record.id);
    }

    let plan = ReconstructionPlan { pages };
    if plan.overflow_count() > 0 {
        log::warn!("{} block(s) overflow their line budget", plan.overflow_count());
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::formatting::FormattingPage;
    use crate::model::{Alignment, MergeInfo, Style, StyleRef};
    use crate::style::StyleRegistry;

    fn block(id: &str, width: f32, budget: u32) -> FormattingBlock {
        FormattingBlock {
            id: id.to_string(),
            block_type: BlockType::Paragraph,
            position: [10.0, 20.0],
            max_width: width,
            line_budget: budget,
            line_spacing: 1.2,
            align: Alignment::Left,
            default_style: StyleRef::Named(crate::model::GlobalStyleId(1)),
            styles: BTreeMap::new(),
            list: None,
            merge: None,
            images: Vec::new(),
        }
    }

    fn formatting(blocks: Vec<FormattingBlock>) -> FormattingDocument {
        let mut registry = StyleRegistry::new();
        registry.resolve_or_create(&Style::new("Helvetica", 10.0, 0));
        FormattingDocument {
            global_styles: registry,
            pages: vec![FormattingPage {
                page_number: 1,
                dimensions: [600.0, 800.0],
                blocks,
            }],
        }
    }

    #[test]
    fn test_plan_single_block() {
        let formatting = formatting(vec![block("b1", 200.0, 1)]);
        let records = vec![TranslationRecord::new("b1", "Hello World")];

        let plan = plan_reconstruction(
            &formatting,
            &records,
            &AliasTable::new(),
            &ReflowOptions::default(),
        )
        .unwrap();
        let planned = plan.block("b1").unwrap();
        assert_eq!(planned.lines.len(), 1);
        assert!(planned.fitted);
        assert!((planned.line_advance - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_plan_uses_target_when_present() {
        let formatting = formatting(vec![block("b1", 200.0, 1)]);
        let records = vec![TranslationRecord::new("b1", "Hello").with_target("Bonjour")];
        let plan = plan_reconstruction(
            &formatting,
            &records,
            &AliasTable::new(),
            &ReflowOptions::default(),
        )
        .unwrap();
        assert_eq!(plan.block("b1").unwrap().lines[0].text(), "Bonjour");
    }

    #[test]
    fn test_plan_merge_group() {
        let mut a = block("a", 45.0, 1);
        a.merge = Some(MergeInfo {
            group_id: "merge_x".to_string(),
            order: 0,
        });
        let mut b = block("b", 45.0, 1);
        b.merge = Some(MergeInfo {
            group_id: "merge_x".to_string(),
            order: 1,
        });
        let formatting = formatting(vec![a, b]);
        let records = vec![TranslationRecord::new("merge_x", "one two three four")];

        let plan = plan_reconstruction(
            &formatting,
            &records,
            &AliasTable::new(),
            &ReflowOptions::new().no_compression(),
        )
        .unwrap();
        assert_eq!(plan.block("a").unwrap().lines[0].text(), "one two");
        assert_eq!(plan.block("b").unwrap().lines[0].text(), "three four");
        assert_eq!(plan.block("b").unwrap().merge_group.as_deref(), Some("merge_x"));
    }

    #[test]
    fn test_proportional_group_keeps_reference_style() {
        let mut a = block("a", 0.0, 1);
        a.merge = Some(MergeInfo {
            group_id: "merge_x".to_string(),
            order: 0,
        });
        let mut b = block("b", 0.0, 1);
        b.default_style = StyleRef::Named(crate::model::GlobalStyleId(2));
        b.merge = Some(MergeInfo {
            group_id: "merge_x".to_string(),
            order: 1,
        });
        let mut formatting = formatting(vec![a, b]);
        formatting
            .global_styles
            .resolve_or_create(&Style::new("Helvetica-Bold", 14.0, 0));
        let records = vec![TranslationRecord::new("merge_x", "aaaa bbbb cccc dddd")];

        let plan = plan_reconstruction(
            &formatting,
            &records,
            &AliasTable::new(),
            &ReflowOptions::default(),
        )
        .unwrap();
        let second = plan.block("b").unwrap();
        assert_eq!(second.merge_group.as_deref(), Some("merge_x"));
        assert_eq!(second.font_size, 14.0);
        assert!(!second.lines.is_empty());
        for line in &second.lines {
            for item in &line.items {
                if let crate::reflow::LineItem::Text { style, .. } = item {
                    assert_eq!(*style, Style::new("Helvetica", 10.0, 0));
                }
            }
        }
    }

    #[test]
    fn test_broken_merge_order_is_error() {
        let mut a = block("a", 45.0, 1);
        a.merge = Some(MergeInfo {
            group_id: "merge_x".to_string(),
            order: 1,
        });
        let formatting = formatting(vec![a]);
        let err = plan_reconstruction(
            &formatting,
            &[],
            &AliasTable::new(),
            &ReflowOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidMergeGroup(_)));
    }
}
