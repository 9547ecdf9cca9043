//! Sequential fill of merged text into member blocks.

use std::collections::VecDeque;

use crate::model::Style;
use crate::reflow::{
    first_success, layout_lines, Compression, Ladder, ReflowBox, Segment, TextMeasurer,
};
use crate::style::markup;
use crate::style::StyleRegistry;

/// One member block of a merge group, in group order.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSlot {
    /// Block id
    pub block_id: String,
    /// Horizontal constraints of the block
    pub reflow_box: ReflowBox,
    /// Lines the block may use
    pub line_budget: u32,
}

impl MemberSlot {
    /// Create a slot.
    pub fn new(block_id: impl Into<String>, reflow_box: ReflowBox, line_budget: u32) -> Self {
        Self {
            block_id: block_id.into(),
            reflow_box,
            line_budget: line_budget.max(1),
        }
    }
}

/// The part of the merged text assigned to one block.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    /// Block id
    pub block_id: String,
    /// Tagged text of the share
    pub text: String,
    /// Segments of the share
    pub segments: Vec<Segment>,
}

/// Result of redistributing a merge group.
#[derive(Debug, Clone, PartialEq)]
pub struct Redistribution {
    /// One share per member, in group order
    pub shares: Vec<Share>,
    /// Compression every member is laid out with
    pub compression: Compression,
    /// False when the last member had to overflow
    pub fitted: bool,
}

struct Filler<'a> {
    slots: &'a [MemberSlot],
    compression: Compression,
    measurer: &'a dyn TextMeasurer,
}

impl Filler<'_> {
    fn fits(&self, slot: &MemberSlot, segments: &[Segment]) -> bool {
        layout_lines(segments, &slot.reflow_box, self.compression, self.measurer).len()
            <= slot.line_budget as usize
    }

    /// Assign segments to slots in order.
    ///
    /// Returns `None` when content is left over, unless `allow_overflow`
    /// is set, in which case the last slot takes everything remaining.
    fn fill(&self, segments: &[Segment], allow_overflow: bool) -> Option<Vec<Vec<Segment>>> {
        let mut queue: VecDeque<Segment> = segments.iter().cloned().collect();
        let mut assigned: Vec<Vec<Segment>> = Vec::with_capacity(self.slots.len());

        for (i, slot) in self.slots.iter().enumerate() {
            if allow_overflow && i + 1 == self.slots.len() {
                assigned.push(queue.drain(..).collect());
                break;
            }
            let mut share: Vec<Segment> = Vec::new();
            while let Some(segment) = queue.pop_front() {
                share.push(segment);
                if self.fits(slot, &share) {
                    continue;
                }
                let Some(segment) = share.pop() else {
                    break;
                };
                match &segment {
                    Segment::Text { text, style } => {
                        match self.split_text(slot, &share, text, style) {
                            Some((head, tail)) => {
                                share.push(Segment::text(head, style.clone()));
                                if !tail.is_empty() {
                                    queue.push_front(Segment::text(tail, style.clone()));
                                }
                            }
                            None => queue.push_front(segment),
                        }
                    }
                    Segment::Image { .. } => queue.push_front(segment),
                }
                break;
            }
            assigned.push(share);
        }

        if queue.is_empty() {
            Some(assigned)
        } else {
            None
        }
    }

    /// Longest whole-word prefix of `text` that still fits after `share`.
    fn split_text(
        &self,
        slot: &MemberSlot,
        share: &[Segment],
        text: &str,
        style: &Style,
    ) -> Option<(String, String)> {
        let mut trial = share.to_vec();
        let mut best = None;
        for end in word_ends(text) {
            trial.push(Segment::text(&text[..end], style.clone()));
            let fits = self.fits(slot, &trial);
            trial.pop();
            if !fits {
                break;
            }
            best = Some(end);
        }
        let end = best?;
        Some((text[..end].to_string(), text[end..].trim_start().to_string()))
    }
}

/// Byte offsets just past each word.
fn word_ends(text: &str) -> Vec<usize> {
    let mut ends = Vec::new();
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                ends.push(i);
            }
            in_word = false;
        } else {
            in_word = true;
        }
    }
    if in_word {
        ends.push(text.len());
    }
    ends
}

/// Split segments across `slots` using the first compression level at which
/// everything fits.
///
/// When no level works the least compressed level is used and the last slot
/// receives whatever remains.
pub fn fill_slots(
    segments: &[Segment],
    slots: &[MemberSlot],
    ladder: &Ladder,
    measurer: &dyn TextMeasurer,
) -> (Vec<Vec<Segment>>, Compression, bool) {
    if slots.is_empty() {
        return (Vec::new(), ladder.least_compressed(), segments.is_empty());
    }

    let found = first_success(ladder.candidates(), |compression| {
        let filler = Filler {
            slots,
            compression,
            measurer,
        };
        filler.fill(segments, false).map(|shares| (shares, compression))
    });
    if let Some((shares, compression)) = found {
        log::debug!(
            "Redistributed across {} blocks at scale {:.2} spacing {:.2}",
            slots.len(),
            compression.font_scale,
            compression.char_spacing
        );
        return (shares, compression, true);
    }

    let compression = ladder.least_compressed();
    let filler = Filler {
        slots,
        compression,
        measurer,
    };
    let shares = filler
        .fill(segments, true)
        .unwrap_or_else(|| vec![Vec::new(); slots.len()]);
    log::warn!(
        "Merged text does not fit {} blocks; last block '{}' overflows",
        slots.len(),
        slots[slots.len() - 1].block_id
    );
    (shares, compression, false)
}

/// Re-emit tagged text for a share.
///
/// Text in `reference` style stays bare; other text is wrapped in the global
/// tag of its style, with surrounding whitespace kept outside the tag.
/// Styles missing from the registry are emitted untagged.
pub fn render_segments(segments: &[Segment], reference: &Style, registry: &StyleRegistry) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text { text, style } => {
                if style.same_identity(reference) {
                    out.push_str(text);
                    continue;
                }
                let Some(id) = registry.lookup(style) else {
                    log::warn!(
                        "No global style for {} {} {}; emitting untagged text",
                        style.font,
                        style.size,
                        style.color_hex()
                    );
                    out.push_str(text);
                    continue;
                };
                let core = text.trim();
                if core.is_empty() {
                    out.push_str(text);
                    continue;
                }
                let start = text.len() - text.trim_start().len();
                let end = start + core.len();
                out.push_str(&text[..start]);
                out.push_str(&format!("<{tag}>{core}</{tag}>", tag = id.tag()));
                out.push_str(&text[end..]);
            }
            Segment::Image { alias, .. } => out.push_str(&markup::image_tag(alias)),
        }
    }
    out.trim().to_string()
}

/// Redistribute parsed merged text and render each share.
pub fn redistribute_segments(
    segments: &[Segment],
    reference: &Style,
    slots: &[MemberSlot],
    registry: &StyleRegistry,
    ladder: &Ladder,
    measurer: &dyn TextMeasurer,
) -> Redistribution {
    let (assigned, compression, fitted) = fill_slots(segments, slots, ladder, measurer);
    let shares = slots
        .iter()
        .zip(assigned)
        .map(|(slot, segments)| Share {
            block_id: slot.block_id.clone(),
            text: render_segments(&segments, reference, registry),
            segments,
        })
        .collect();
    Redistribution {
        shares,
        compression,
        fitted,
    }
}
