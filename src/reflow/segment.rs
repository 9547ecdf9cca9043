//! Parsing tagged text into styled segments.

use std::collections::BTreeMap;

use crate::model::{AliasTable, ImageAlias, Style};
use crate::style::markup::{self, Token};
use crate::style::StyleRegistry;

/// A unit of content with its resolved style.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text in one style
    Text {
        /// Text content (may contain `\n` forced breaks)
        text: String,
        /// Resolved style
        style: Style,
    },
    /// Inline image reference
    Image {
        /// Alias from the markup
        alias: String,
        /// Resolved image, `None` when the alias is unknown
        image: Option<ImageAlias>,
        /// Style in effect around the image
        style: Style,
    },
}

impl Segment {
    /// Create a text segment.
    pub fn text(text: impl Into<String>, style: Style) -> Self {
        Segment::Text {
            text: text.into(),
            style,
        }
    }

    /// Style of the segment.
    pub fn style(&self) -> &Style {
        match self {
            Segment::Text { style, .. } | Segment::Image { style, .. } => style,
        }
    }

    /// Plain text of the segment (empty for images).
    pub fn plain_text(&self) -> &str {
        match self {
            Segment::Text { text, .. } => text,
            Segment::Image { .. } => "",
        }
    }
}

/// Lookup tables used to resolve tags while parsing.
#[derive(Debug, Clone, Copy)]
pub struct TagContext<'a> {
    /// Global style table (`gsN` tags)
    pub registry: &'a StyleRegistry,
    /// Block-local styles (`sN` tags), if any
    pub local_styles: Option<&'a BTreeMap<String, Style>>,
    /// Image aliases
    pub aliases: &'a AliasTable,
}

impl<'a> TagContext<'a> {
    /// Context resolving global tags and images only.
    pub fn new(registry: &'a StyleRegistry, aliases: &'a AliasTable) -> Self {
        Self {
            registry,
            local_styles: None,
            aliases,
        }
    }

    /// Also resolve block-local tags.
    pub fn with_local_styles(mut self, styles: &'a BTreeMap<String, Style>) -> Self {
        self.local_styles = Some(styles);
        self
    }

    fn style_for(&self, tag: &str) -> Option<Style> {
        if let Some(style) = self.registry.get_by_tag(tag) {
            return Some(style.clone());
        }
        self.local_styles
            .and_then(|styles| styles.get(tag))
            .cloned()
    }
}

/// Parse tagged text into segments.
///
/// Untagged text takes `default_style`. Tags that are unpaired, overlapping
/// or unknown are ignored and their text keeps the surrounding style.
/// Unknown image aliases are kept as unresolved image segments. Runs of
/// spaces collapse to one; newlines are preserved as forced breaks.
pub fn parse_tagged_text(text: &str, default_style: &Style, ctx: &TagContext<'_>) -> Vec<Segment> {
    let tokens = markup::tokenize(text);
    let partners = markup::pair_tags(&tokens);
    let mut stack: Vec<Style> = Vec::new();
    let mut segments: Vec<Segment> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let current = stack.last().unwrap_or(default_style).clone();
        match token {
            Token::Text(t) => push_text(&mut segments, t, current),
            Token::Open(name) => {
                if partners[i].is_none() {
                    log::warn!("Ignoring unpaired tag <{}>", name);
                    continue;
                }
                let style = ctx.style_for(name).unwrap_or_else(|| {
                    log::warn!("Unknown style tag <{}>, using surrounding style", name);
                    current.clone()
                });
                stack.push(style);
            }
            Token::Close(name) => {
                if partners[i].is_some() {
                    stack.pop();
                } else {
                    log::warn!("Ignoring unpaired tag </{}>", name);
                }
            }
            Token::Image(alias) => {
                let image = ctx.aliases.get(alias).cloned();
                if image.is_none() {
                    log::warn!("Unknown image alias '{}'", alias);
                }
                segments.push(Segment::Image {
                    alias: alias.to_string(),
                    image,
                    style: current,
                });
            }
        }
    }
    segments
}

/// Append text, merging with the previous segment when the style matches.
fn push_text(segments: &mut Vec<Segment>, text: &str, style: Style) {
    let text = collapse_spaces(text);
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text {
        text: last,
        style: last_style,
    }) = segments.last_mut()
    {
        if *last_style == style {
            last.push_str(&text);
            return;
        }
    }
    segments.push(Segment::Text { text, style });
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for c in text.chars() {
        if c == ' ' || c == '\t' {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out
}

/// Plain text of a segment sequence, images dropped.
pub fn plain_text(segments: &[Segment]) -> String {
    segments.iter().map(Segment::plain_text).collect()
}
