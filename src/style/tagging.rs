//! Inline style tagging.
//!
//! A block's text is written against its dominant style: runs in that style
//! stay bare, every other run is wrapped in a tag. Tags are first numbered
//! per block (`s1`, `s2`, ...) and rewritten to document ids (`gs1`, ...)
//! at export.

use std::collections::BTreeMap;

use super::markup::{self, Token};
use super::registry::StyleRegistry;
use crate::model::{GlobalStyleId, Style, StyleKey};

/// A piece of text in one style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    /// Text content
    pub text: String,
    /// Style of the text
    pub style: Style,
}

impl StyledRun {
    /// Create a new run.
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Result of tagging a sequence of runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedContent {
    /// Plain text
    pub content: String,
    /// Text with local tags around non-dominant runs
    pub styled_content: String,
    /// Style the untagged text is written in
    pub default_style: Option<Style>,
    /// Local tag name -> style
    pub local_styles: BTreeMap<String, Style>,
}

/// Style covering the most characters; ties go to the first style seen.
///
/// The returned style is the first run's exact value for that identity.
pub fn dominant_style(runs: &[StyledRun]) -> Option<Style> {
    let mut totals: Vec<(StyleKey, usize, &Style)> = Vec::new();
    for run in runs {
        let key = run.style.key();
        let chars = run.text.chars().count();
        match totals.iter_mut().find(|(k, _, _)| *k == key) {
            Some(entry) => entry.1 += chars,
            None => totals.push((key, chars, &run.style)),
        }
    }

    let mut best: Option<(usize, &Style)> = None;
    for (_, chars, style) in &totals {
        if best.map_or(true, |(c, _)| *chars > c) {
            best = Some((*chars, *style));
        }
    }
    best.map(|(_, style)| style.clone())
}

/// Tag runs against `reference`, or against their dominant style when `None`.
pub fn tag_runs(runs: &[StyledRun], reference: Option<&Style>) -> TaggedContent {
    let default_style = match reference {
        Some(style) => Some(style.clone()),
        None => dominant_style(runs),
    };
    let Some(reference) = default_style.as_ref() else {
        return TaggedContent::default();
    };

    let mut builder = MarkupBuilder::default();
    let mut local_styles: BTreeMap<String, Style> = BTreeMap::new();
    let mut local_keys: Vec<(StyleKey, String)> = Vec::new();

    for run in runs {
        if run.style.same_identity(reference) {
            builder.push(&run.text, None);
            continue;
        }
        let key = run.style.key();
        let tag = match local_keys.iter().find(|(k, _)| *k == key) {
            Some((_, tag)) => tag.clone(),
            None => {
                let tag = format!("s{}", local_keys.len() + 1);
                local_styles.insert(tag.clone(), run.style.clone());
                local_keys.push((key, tag.clone()));
                tag
            }
        };
        builder.push(&run.text, Some(&tag));
    }

    let (content, styled_content) = builder.finish();
    TaggedContent {
        content,
        styled_content,
        default_style,
        local_styles,
    }
}

/// Replace local tag names with global ids.
///
/// Only properly paired tags whose name is in `mapping` are rewritten, so
/// `<s1>` never touches `<s10>`, overlapping tags are left alone, and running
/// the rewrite twice is a no-op.
pub fn rewrite_local_to_global(text: &str, mapping: &BTreeMap<String, GlobalStyleId>) -> String {
    let tokens = markup::tokenize(text);
    let partners = markup::pair_tags(&tokens);
    let mut out = String::with_capacity(text.len());

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Text(t) => out.push_str(t),
            Token::Image(alias) => out.push_str(&markup::image_tag(alias)),
            Token::Open(name) | Token::Close(name) => {
                let closing = matches!(token, Token::Close(_));
                let name = match (partners[i], mapping.get(*name)) {
                    (Some(_), Some(id)) => id.tag(),
                    (None, Some(_)) => {
                        log::warn!("Unpaired style tag '{}' left untouched", name);
                        name.to_string()
                    }
                    _ => name.to_string(),
                };
                if closing {
                    out.push_str(&format!("</{}>", name));
                } else {
                    out.push_str(&format!("<{}>", name));
                }
            }
        }
    }
    out
}

/// One member of a merge group, as runs in reading order.
#[derive(Debug, Clone)]
pub struct GroupMember {
    /// Block id
    pub block_id: String,
    /// Member default style
    pub default_style: Style,
    /// Runs of the member's content
    pub runs: Vec<StyledRun>,
}

/// Merged text of a group, written against one reference style.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedGroup {
    /// Text with global tags
    pub text: String,
    /// Style the untagged text is written in (first member's default)
    pub reference_style: Style,
    /// Global id of the reference style
    pub reference_id: GlobalStyleId,
}

/// Build the shared text of a merge group.
///
/// The first member's default style is the reference; every run in any
/// other style is tagged with its global id, so all members speak one tag
/// vocabulary. Member texts are separated by a single space.
pub fn unify_group(members: &[GroupMember], registry: &mut StyleRegistry) -> Option<UnifiedGroup> {
    let reference_style = members.first()?.default_style.clone();
    let reference_id = registry.resolve_or_create(&reference_style);
    let mut builder = MarkupBuilder::default();

    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            builder.push(" ", None);
        }
        for run in &member.runs {
            if run.style.same_identity(&reference_style) {
                builder.push(&run.text, None);
            } else {
                let id = registry.resolve_or_create(&run.style);
                builder.push(&run.text, Some(&id.tag()));
            }
        }
    }

    let (_, text) = builder.finish();
    Some(UnifiedGroup {
        text,
        reference_style,
        reference_id,
    })
}

/// Accumulates plain and tagged text side by side.
///
/// Runs are joined with a space when neither side of the boundary has
/// whitespace, and whitespace at the edge of a tagged run is moved outside
/// the tag.
#[derive(Debug, Default)]
struct MarkupBuilder {
    plain: String,
    styled: String,
}

impl MarkupBuilder {
    fn push(&mut self, text: &str, tag: Option<&str>) {
        if text.is_empty() {
            return;
        }
        let needs_space = self
            .plain
            .chars()
            .last()
            .is_some_and(|c| !c.is_whitespace())
            && text.chars().next().is_some_and(|c| !c.is_whitespace());
        if needs_space {
            self.plain.push(' ');
            self.styled.push(' ');
        }
        self.plain.push_str(text);

        let core = text.trim();
        match tag {
            Some(tag) if !core.is_empty() => {
                let lead = &text[..text.len() - text.trim_start().len()];
                let trail = &text[text.trim_end().len()..];
                self.styled.push_str(lead);
                self.styled.push_str(&format!("<{}>{}</{}>", tag, core, tag));
                self.styled.push_str(trail);
            }
            _ => self.styled.push_str(text),
        }
    }

    fn finish(self) -> (String, String) {
        (
            markup::collapse_whitespace(&self.plain),
            collapse_markup_whitespace(&self.styled),
        )
    }
}

/// Collapse whitespace in marked-up text without touching the tags.
fn collapse_markup_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}
