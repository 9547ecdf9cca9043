//! Merge-group redistribution.
//!
//! A merge group is translated as one text. These functions split that text
//! back into one share per member block, each fitting the member's box and
//! line budget, with inline tags re-emitted at run boundaries.

mod fill;
mod proportional;

pub use fill::{
    fill_slots, redistribute_segments, render_segments, MemberSlot, Redistribution, Share,
};
pub use proportional::split_proportional;

use crate::model::{AliasTable, Style};
use crate::reflow::{parse_tagged_text, ReflowOptions, TagContext};
use crate::style::StyleRegistry;

/// Split tagged merged text across `slots`.
///
/// `reference` is the first member's default style: untagged text takes it
/// and text in it is emitted untagged again.
pub fn redistribute_text(
    text: &str,
    reference: &Style,
    slots: &[MemberSlot],
    registry: &StyleRegistry,
    aliases: &AliasTable,
    options: &ReflowOptions,
) -> Redistribution {
    let ctx = TagContext::new(registry, aliases);
    let segments = parse_tagged_text(text, reference, &ctx);
    redistribute_segments(
        &segments,
        reference,
        slots,
        registry,
        &options.ladder,
        options.measurer(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflow::ReflowBox;

    #[test]
    fn test_redistribute_keeps_tags_whole() {
        let mut registry = StyleRegistry::new();
        let body = Style::new("Helvetica", 10.0, 0);
        registry.resolve_or_create(&body);
        registry.resolve_or_create(&Style::new("Helvetica-Bold", 10.0, 0));

        let slots = vec![
            MemberSlot::new("a", ReflowBox::new(60.0), 1),
            MemberSlot::new("b", ReflowBox::new(60.0), 1),
        ];
        let result = redistribute_text(
            "one <gs2>two</gs2> three four",
            &body,
            &slots,
            &registry,
            &AliasTable::new(),
            &ReflowOptions::new().no_compression(),
        );
        assert!(result.fitted);
        assert_eq!(result.shares.len(), 2);
        assert_eq!(result.shares[0].block_id, "a");
        assert_eq!(result.shares[0].text, "one <gs2>two</gs2>");
        assert_eq!(result.shares[1].text, "three four");
    }
}
