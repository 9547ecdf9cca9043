//! Data model for matched pages.
//!
//! Spans (extracted text runs) and blocks (layout regions) are stored per
//! page in flat arenas keyed by id. Styles appear either literally or as
//! references into the document-wide style table.

mod alias;
mod block;
mod document;
mod geometry;
mod page;
mod span;
mod style;

pub use alias::{AliasTable, ImageAlias, DEFAULT_ASPECT_RATIO, DEFAULT_REFERENCE_SIZE};
pub use block::{
    Alignment, Block, BlockType, ListLayout, MatchSource, MergeInfo, DEFAULT_LINE_SPACING,
    DEFAULT_LIST_BULLET, DEFAULT_LIST_INDENT,
};
pub use document::{merge_group_id, Document, DocumentStatistics, MergeGroup};
pub use geometry::BBox;
pub(crate) use geometry::round2;
pub use page::{MoveDirection, Page};
pub use span::{MatchQuality, Span, SpanFlags};
pub use style::{
    is_placeholder_font, quantize_size, GlobalStyleId, Style, StyleKey, StyleRef, FALLBACK_FONT,
    FALLBACK_SIZE, SIZE_QUANTUM,
};
