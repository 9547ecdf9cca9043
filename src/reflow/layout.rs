//! Line wrapping of styled segments inside a fixed-width box.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::metrics::TextMeasurer;
use super::segment::Segment;
use crate::model::{ListLayout, Style};

/// Font scale and extra per-character spacing applied during layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Compression {
    /// Multiplier for glyph widths and font size
    pub font_scale: f32,
    /// Extra advance added after every non-whitespace character
    pub char_spacing: f32,
}

impl Compression {
    /// No compression.
    pub const NONE: Compression = Compression {
        font_scale: 1.0,
        char_spacing: 0.0,
    };

    /// Create a compression level.
    pub fn new(font_scale: f32, char_spacing: f32) -> Self {
        Self {
            font_scale,
            char_spacing,
        }
    }

    /// Whether this is the uncompressed level.
    pub fn is_none(&self) -> bool {
        (self.font_scale - 1.0).abs() < 1e-6 && self.char_spacing.abs() < 1e-6
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self::NONE
    }
}

/// Horizontal constraints for a block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReflowBox {
    /// Width available to a line
    pub max_width: f32,
    /// List indentation, when the block is a list item
    pub list: Option<ListLayout>,
}

impl ReflowBox {
    /// Plain box of the given width.
    pub fn new(max_width: f32) -> Self {
        Self {
            max_width,
            list: None,
        }
    }

    /// Apply list indentation.
    pub fn with_list(mut self, list: ListLayout) -> Self {
        self.list = Some(list);
        self
    }

    /// Width available to line `index`.
    pub fn line_width(&self, index: usize) -> f32 {
        let width = match &self.list {
            Some(list) if index == 0 || list.hang => self.max_width - list.indent,
            _ => self.max_width,
        };
        width.max(0.0)
    }
}

/// A laid-out piece of a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItem {
    /// Text in a single style
    Text {
        /// Text content
        text: String,
        /// Style before compression
        style: Style,
        /// Measured width after compression
        width: f32,
    },
    /// Inline image
    Image {
        /// Alias from the markup
        alias: String,
        /// Image file, when the alias resolved
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<String>,
        /// Width after compression
        width: f32,
        /// Height after compression
        height: f32,
        /// Vertical offset for the renderer
        vertical_adjustment: f32,
    },
}

impl LineItem {
    /// Width of the item.
    pub fn width(&self) -> f32 {
        match self {
            LineItem::Text { width, .. } | LineItem::Image { width, .. } => *width,
        }
    }
}

/// One wrapped line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Line {
    /// Items left to right
    pub items: Vec<LineItem>,
    /// Total width of the items
    pub width: f32,
}

impl Line {
    /// Plain text of the line, images as `[[alias]]`.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|item| match item {
                LineItem::Text { text, .. } => text.clone(),
                LineItem::Image { alias, .. } => format!("[[{}]]", alias),
            })
            .collect()
    }

    /// Whether the line has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn push_text(&mut self, text: &str, style: &Style, width: f32) {
        self.width += width;
        if let Some(LineItem::Text {
            text: last,
            style: last_style,
            width: last_width,
        }) = self.items.last_mut()
        {
            if last_style == style {
                last.push_str(text);
                *last_width += width;
                return;
            }
        }
        self.items.push(LineItem::Text {
            text: text.to_string(),
            style: style.clone(),
            width,
        });
    }

    /// Drop trailing whitespace left by a break.
    fn trim_end(&mut self, measurer: &dyn TextMeasurer, compression: Compression) {
        while let Some(LineItem::Text { text, style, width }) = self.items.last_mut() {
            let keep = text.trim_end().len();
            if keep == text.len() {
                break;
            }
            if keep == 0 {
                self.width -= *width;
                self.items.pop();
                continue;
            }
            let new_width = token_width(&text[..keep], style, compression, measurer);
            self.width -= *width - new_width;
            *width = new_width;
            text.truncate(keep);
            break;
        }
        self.width = self.width.max(0.0);
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n|[^\S\n]+|\S+").expect("valid token regex"))
}

/// Width of one token under `compression`.
pub fn token_width(
    token: &str,
    style: &Style,
    compression: Compression,
    measurer: &dyn TextMeasurer,
) -> f32 {
    let scaled = Style {
        size: style.size * compression.font_scale,
        ..style.clone()
    };
    let mut width = measurer.measure(token, &scaled);
    if !token.trim().is_empty() {
        width += compression.char_spacing * token.chars().count() as f32;
    }
    width.max(0.0)
}

/// Wrap segments into lines.
///
/// Whitespace never starts a break; a word that does not fit on a non-empty
/// line moves to the next one (an over-wide word on an empty line stays put).
/// `\n` forces a break. Images are placed as single unbreakable tokens.
pub fn layout_lines(
    segments: &[Segment],
    reflow_box: &ReflowBox,
    compression: Compression,
    measurer: &dyn TextMeasurer,
) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut current = Line::default();

    let break_line = |current: &mut Line, lines: &mut Vec<Line>| {
        current.trim_end(measurer, compression);
        if !current.is_empty() {
            lines.push(std::mem::take(current));
        }
    };

    for segment in segments {
        match segment {
            Segment::Text { text, style } => {
                for token in token_pattern().find_iter(text).map(|m| m.as_str()) {
                    if token == "\n" {
                        break_line(&mut current, &mut lines);
                        continue;
                    }
                    let is_space = token.trim().is_empty();
                    if is_space && current.is_empty() {
                        continue;
                    }
                    let width = token_width(token, style, compression, measurer);
                    if !is_space
                        && !current.is_empty()
                        && current.width + width > reflow_box.line_width(lines.len())
                    {
                        break_line(&mut current, &mut lines);
                    }
                    current.push_text(token, style, width);
                }
            }
            Segment::Image {
                alias,
                image,
                style,
            } => {
                let item = match image {
                    Some(image) => {
                        let (width, height) = image.dimensions(compression.font_scale);
                        LineItem::Image {
                            alias: alias.clone(),
                            file: Some(image.file.clone()),
                            width,
                            height,
                            vertical_adjustment: image.vertical_adjustment,
                        }
                    }
                    None => {
                        let placeholder = format!("[[{}]]", alias);
                        LineItem::Image {
                            alias: alias.clone(),
                            file: None,
                            width: token_width(&placeholder, style, compression, measurer),
                            height: style.size * compression.font_scale,
                            vertical_adjustment: 0.0,
                        }
                    }
                };
                if !current.is_empty()
                    && current.width + item.width() > reflow_box.line_width(lines.len())
                {
                    break_line(&mut current, &mut lines);
                }
                current.width += item.width();
                current.items.push(item);
            }
        }
    }
    break_line(&mut current, &mut lines);
    lines
}

/// Plain text of laid-out lines joined by newlines.
pub fn lines_text(lines: &[Line]) -> String {
    lines.iter().map(Line::text).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageAlias;
    use crate::reflow::metrics::HelveticaMetrics;

    fn helvetica() -> Style {
        Style::new("Helvetica", 10.0, 0)
    }

    fn layout(text: &str, width: f32) -> Vec<Line> {
        let segments = vec![Segment::text(text, helvetica())];
        layout_lines(
            &segments,
            &ReflowBox::new(width),
            Compression::NONE,
            &HelveticaMetrics::new(),
        )
    }

    #[test]
    fn test_single_line_fits() {
        let lines = layout("Hello World", 200.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Hello World");
    }

    #[test]
    fn test_wraps_on_overflow() {
        // "Hello" is 22.78 wide, "Hello World" is about 53
        let lines = layout("Hello World", 30.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "Hello");
        assert_eq!(lines[1].text(), "World");
    }

    #[test]
    fn test_overwide_word_stays_on_empty_line() {
        let lines = layout("Supercalifragilistic", 10.0);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_forced_breaks() {
        let lines = layout("one\ntwo\n\nthree", 500.0);
        let texts: Vec<String> = lines.iter().map(Line::text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert!(layout("", 100.0).is_empty());
    }

    #[test]
    fn test_compression_narrows_lines() {
        let segments = vec![Segment::text("Hello World", helvetica())];
        let measurer = HelveticaMetrics::new();
        let wide = layout_lines(&segments, &ReflowBox::new(50.0), Compression::NONE, &measurer);
        assert_eq!(wide.len(), 2);
        let narrow = layout_lines(
            &segments,
            &ReflowBox::new(50.0),
            Compression::new(0.9, -0.05),
            &measurer,
        );
        assert_eq!(narrow.len(), 1);
        assert!(narrow[0].width <= 50.0);
    }

    #[test]
    fn test_list_indent() {
        let list = ListLayout {
            indent: 30.0,
            hang: false,
            ..ListLayout::default()
        };
        let reflow_box = ReflowBox::new(60.0).with_list(list);
        assert_eq!(reflow_box.line_width(0), 30.0);
        assert_eq!(reflow_box.line_width(1), 60.0);

        let hanging = ReflowBox::new(20.0).with_list(ListLayout::default());
        assert_eq!(hanging.line_width(3), 5.0);
        assert_eq!(ReflowBox::new(10.0).with_list(ListLayout::default()).line_width(0), 0.0);
    }

    #[test]
    fn test_image_is_atomic() {
        let image = ImageAlias::new("logo.svg").with_aspect_ratio(2.0);
        let segments = vec![
            Segment::text("ab ", helvetica()),
            Segment::Image {
                alias: "logo".to_string(),
                image: Some(image),
                style: helvetica(),
            },
        ];
        let measurer = HelveticaMetrics::new();
        let lines = layout_lines(&segments, &ReflowBox::new(15.0), Compression::NONE, &measurer);
        assert_eq!(lines.len(), 2);
        match &lines[1].items[0] {
            LineItem::Image { width, height, .. } => {
                assert!((height - 10.5).abs() < 1e-4);
                assert!((width - 21.0).abs() < 1e-4);
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_same_style_items_merge() {
        let lines = layout("a b c", 500.0);
        assert_eq!(lines[0].items.len(), 1);
        let total: f32 = lines[0].items.iter().map(LineItem::width).sum();
        assert!((total - lines[0].width).abs() < 1e-4);
    }
}
