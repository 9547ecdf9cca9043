//! Span-to-block matching.
//!
//! For each page, layout blocks are visited top to bottom, left to right.
//! Each block claims the unclaimed spans that sit inside its box (with
//! slack) and agree with its reference text; claimed spans are ordered by
//! line, then by x. Spans no block claims become isolated blocks.

mod enrich;
mod input;
mod lines;
mod options;
mod scoring;

pub use enrich::{classify, line_budget, SpanMatcher};
pub use input::{LayoutBlock, PageInput};
pub use lines::{group_into_lines, line_spacing_ratio, reading_order};
pub use options::{ErrorMode, MatchOptions};
pub use scoring::text_score;
