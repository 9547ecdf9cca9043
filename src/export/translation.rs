//! Translation records: one source text per block or merge group.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Block, Document, GlobalStyleId, MergeGroup, Page, Style};
use crate::style::{rewrite_local_to_global, unify_group, GroupMember, StyleRegistry, StyledRun};

/// Operator-edited source texts, keyed by record id.
pub type TranslationOverrides = BTreeMap<String, String>;

/// A text to translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Block id or merge group id
    pub id: String,

    /// Source text with global style tags
    pub source: String,

    /// Translated text; empty until filled in
    #[serde(default)]
    pub target: String,
}

impl TranslationRecord {
    /// Create a record with an empty target.
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: String::new(),
        }
    }

    /// Set the target text.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Target text, or the source when nothing was translated.
    pub fn text(&self) -> &str {
        if self.target.trim().is_empty() {
            &self.source
        } else {
            &self.target
        }
    }
}

/// Rewrite a block's local tags to global ids, registering its styles.
pub fn block_source(block: &Block, registry: &mut StyleRegistry) -> String {
    let mapping: BTreeMap<String, GlobalStyleId> = block
        .additional_styles
        .iter()
        .map(|(tag, style)| (tag.clone(), registry.resolve_or_create(style)))
        .collect();
    rewrite_local_to_global(&block.styled_content, &mapping)
}

/// Runs of a merge member; blocks without spans contribute their content.
fn member_of(page: &Page, block: &Block, fallback: &Style) -> GroupMember {
    let default_style = block.default_style.clone().unwrap_or_else(|| fallback.clone());
    let mut runs = page.runs_of(block);
    if runs.is_empty() && !block.content.trim().is_empty() {
        runs.push(StyledRun::new(block.content.clone(), default_style.clone()));
    }
    GroupMember {
        block_id: block.id.clone(),
        default_style,
        runs,
    }
}

/// Build the merged source text of a group.
pub fn group_source(
    doc: &Document,
    group: &MergeGroup,
    registry: &mut StyleRegistry,
) -> Result<String> {
    let fallback = doc.majority_style();
    let mut members = Vec::with_capacity(group.members.len());
    for id in &group.members {
        let (page, block) = doc
            .find_block(id)
            .ok_or_else(|| Error::MissingBlock(id.clone()))?;
        members.push(member_of(page, block, &fallback));
    }
    Ok(unify_group(&members, registry)
        .map(|unified| unified.text)
        .unwrap_or_default())
}

/// Collect translation records in page and reading order.
///
/// Each merge group yields one record at the position of its first member.
/// Excluded isolated blocks and empty sources are skipped; overrides replace
/// the exported source of their id.
pub fn build_translations(
    doc: &Document,
    registry: &mut StyleRegistry,
    overrides: &TranslationOverrides,
) -> Result<Vec<TranslationRecord>> {
    let groups: HashMap<String, MergeGroup> = doc
        .merge_groups()?
        .into_iter()
        .map(|g| (g.id.clone(), g))
        .collect();
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut records = Vec::new();

    for (_, block) in doc.blocks() {
        if !block.is_exported() {
            continue;
        }
        let (id, source) = match &block.merge {
            Some(merge) => {
                if !emitted.insert(merge.group_id.as_str()) {
                    continue;
                }
                let group = groups
                    .get(&merge.group_id)
                    .ok_or_else(|| Error::InvalidMergeGroup(merge.group_id.clone()))?;
                (group.id.clone(), group_source(doc, group, registry)?)
            }
            None => (block.id.clone(), block_source(block, registry)),
        };

        let source = overrides.get(&id).cloned().unwrap_or(source);
        if source.trim().is_empty() {
            log::debug!("Skipping '{}': no source text", id);
            continue;
        }
        records.push(TranslationRecord::new(id, source));
    }
    Ok(records)
}

/// Index records by id.
pub fn index_translations(records: &[TranslationRecord]) -> HashMap<&str, &TranslationRecord> {
    records.iter().map(|r| (r.id.as_str(), r)).collect()
}
