//! Style deduplication and inline tagging.
//!
//! - [`markup`]: tokenizer for `<sN>`, `<gsN>` and `<svg id="…"/>` markers
//! - [`registry`]: append-only (font, size, color) -> `gsN` map
//! - [`tagging`]: dominant-style tagging, local-to-global rewrite, merge unification

pub mod markup;
mod registry;
mod tagging;

pub use registry::StyleRegistry;
pub use tagging::{
    dominant_style, rewrite_local_to_global, tag_runs, unify_group, GroupMember, StyledRun,
    TaggedContent, UnifiedGroup,
};
