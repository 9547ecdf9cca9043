//! Reflow engine: wrap tagged content into a block's box and compress it
//! into the block's line budget.
//!
//! The pipeline is: [`parse_tagged_text`] turns tagged text into styled
//! [`Segment`]s, [`layout_lines`] wraps them at one [`Compression`] level
//! and [`fit_lines`] searches the [`Ladder`] for the least aggressive level
//! that respects the [`FitTarget`].

mod compress;
mod layout;
pub mod markers;
mod metrics;
mod options;
mod segment;

pub use compress::{
    first_success, fit_lines, FitResult, FitTarget, Ladder, SpacingMode, DEFAULT_CHAR_SPACINGS,
    DEFAULT_FONT_SCALES,
};
pub use layout::{layout_lines, lines_text, token_width, Compression, Line, LineItem, ReflowBox};
pub use markers::split_list_items;
pub use metrics::{HelveticaMetrics, TextMeasurer};
pub use options::ReflowOptions;
pub use segment::{parse_tagged_text, plain_text, Segment, TagContext};

use crate::model::{AliasTable, ListLayout, Style};
use crate::style::StyleRegistry;

/// Lay out one block's tagged text.
///
/// List items get one line per bullet before wrapping.
#[allow(clippy::too_many_arguments)]
pub fn reflow_text(
    text: &str,
    default_style: &Style,
    max_width: f32,
    list: Option<&ListLayout>,
    target: &FitTarget,
    registry: &StyleRegistry,
    aliases: &AliasTable,
    options: &ReflowOptions,
) -> FitResult {
    let text = match list {
        Some(_) => split_list_items(text),
        None => text.to_string(),
    };
    let ctx = TagContext::new(registry, aliases);
    let segments = parse_tagged_text(&text, default_style, &ctx);
    let reflow_box = ReflowBox {
        max_width,
        list: list.cloned(),
    };
    fit_lines(
        &segments,
        &reflow_box,
        target,
        &options.ladder,
        options.measurer(),
    )
}
