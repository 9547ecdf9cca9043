//! Extracted text runs.

use serde::{Deserialize, Serialize};

use super::{BBox, Style};

/// A contiguous extracted text run sharing one font, size and color.
///
/// Spans are produced once per page; only the matching fields change
/// afterwards, and those are owned by [`Page`](super::Page).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Per-page span id (extraction order)
    pub id: u32,

    /// Text content
    pub text: String,

    /// Bounding box in pixels
    pub bbox_pixels: BBox,

    /// Bounding box normalized to the page (0..1)
    pub bbox_normalized: BBox,

    /// Font name as reported by the extractor
    #[serde(default)]
    pub font_name: Option<String>,

    /// Font size in points
    #[serde(default)]
    pub font_size: Option<f32>,

    /// Packed 0xRRGGBB color
    #[serde(default)]
    pub color: Option<u32>,

    /// Style flags
    #[serde(default)]
    pub flags: SpanFlags,

    /// Owning block, maintained by the page index
    #[serde(default)]
    pub matched_to_block: Option<String>,

    /// Match quality label
    #[serde(default)]
    pub match_quality: MatchQuality,
}

impl Span {
    /// Create a span with the given text, boxes and typography.
    pub fn new(id: u32, text: impl Into<String>, bbox_pixels: BBox, bbox_normalized: BBox) -> Self {
        Self {
            id,
            text: text.into(),
            bbox_pixels,
            bbox_normalized,
            font_name: None,
            font_size: None,
            color: None,
            flags: SpanFlags::default(),
            matched_to_block: None,
            match_quality: MatchQuality::Unmatched,
        }
    }

    /// Set font, size and color.
    pub fn with_style(mut self, font: impl Into<String>, size: f32, color: u32) -> Self {
        self.font_name = Some(font.into());
        self.font_size = Some(size);
        self.color = Some(color);
        self
    }

    /// Set style flags.
    pub fn with_flags(mut self, flags: SpanFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Concrete style of this span, repaired when fields are missing.
    pub fn style(&self) -> Style {
        Style::repair(self.font_name.as_deref(), self.font_size, self.color)
    }

    /// True when the span carries visible text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Number of characters, used for style dominance.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the span is owned by a block.
    pub fn is_matched(&self) -> bool {
        self.matched_to_block.is_some()
    }
}

/// Bold/italic/superscript flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpanFlags {
    /// Bold weight
    #[serde(default)]
    pub bold: bool,
    /// Italic slant
    #[serde(default)]
    pub italic: bool,
    /// Superscript position
    #[serde(default)]
    pub superscript: bool,
}

impl SpanFlags {
    const SUPERSCRIPT: u32 = 1;
    const ITALIC: u32 = 2;
    const BOLD: u32 = 16;

    /// Decode the packed flag word used by common PDF text extractors.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            bold: bits & Self::BOLD != 0,
            italic: bits & Self::ITALIC != 0,
            superscript: bits & Self::SUPERSCRIPT != 0,
        }
    }

    /// Encode back into the packed flag word.
    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.bold {
            bits |= Self::BOLD;
        }
        if self.italic {
            bits |= Self::ITALIC;
        }
        if self.superscript {
            bits |= Self::SUPERSCRIPT;
        }
        bits
    }
}

/// Discretized lexical match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    /// Score >= 0.9
    Excellent,
    /// Score >= 0.7
    Good,
    /// Score >= 0.4
    Fair,
    /// Any positive score below 0.4
    Poor,
    /// Linked by an operator
    Manual,
    /// Not matched
    #[default]
    Unmatched,
}

impl MatchQuality {
    /// Label a positive text score.
    pub fn from_score(score: f32) -> Self {
        if score >= 0.9 {
            MatchQuality::Excellent
        } else if score >= 0.7 {
            MatchQuality::Good
        } else if score >= 0.4 {
            MatchQuality::Fair
        } else {
            MatchQuality::Poor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_style_repair() {
        let span = Span::new(0, "Hello", BBox::default(), BBox::default());
        assert_eq!(span.style(), Style::fallback());

        let span = span.with_style("Arial", 11.0, 0x333333);
        assert_eq!(span.style(), Style::new("Arial", 11.0, 0x333333));
    }

    #[test]
    fn test_span_flags_bits() {
        let flags = SpanFlags::from_bits(16 | 2);
        assert!(flags.bold);
        assert!(flags.italic);
        assert!(!flags.superscript);
        assert_eq!(flags.bits(), 18);
        assert!(SpanFlags::from_bits(1).superscript);
    }

    #[test]
    fn test_match_quality_labels() {
        assert_eq!(MatchQuality::from_score(1.0), MatchQuality::Excellent);
        assert_eq!(MatchQuality::from_score(0.75), MatchQuality::Good);
        assert_eq!(MatchQuality::from_score(0.4), MatchQuality::Fair);
        assert_eq!(MatchQuality::from_score(0.1), MatchQuality::Poor);
    }

    #[test]
    fn test_span_deserialize_with_missing_fields() {
        let json = r#"{"id":4,"text":"x","bbox_pixels":[0,0,10,10],"bbox_normalized":[0,0,0.1,0.1]}"#;
        let span: Span = serde_json::from_str(json).unwrap();
        assert_eq!(span.id, 4);
        assert!(span.font_name.is_none());
        assert_eq!(span.match_quality, MatchQuality::Unmatched);
        assert!(!span.is_matched());
    }
}
