//! Text width measurement.

use crate::model::Style;

/// Measures rendered text width.
///
/// Widths are in the same unit as font sizes (points for PDF pages).
pub trait TextMeasurer: Send + Sync {
    /// Width of `text` set in `style` at `style.size`.
    fn measure(&self, text: &str, style: &Style) -> f32;
}

/// Width table measurer based on the standard Helvetica metrics.
///
/// Bold faces are widened slightly, monospaced faces use a fixed advance and
/// wide (CJK) glyphs take a full em. Other non-ASCII glyphs use the average
/// lowercase advance.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaMetrics;

impl HelveticaMetrics {
    /// Create a new measurer.
    pub fn new() -> Self {
        Self
    }
}

/// Advance widths of printable ASCII (0x20..=0x7E), per 1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const DEFAULT_ADVANCE: u16 = 556;
const WIDE_ADVANCE: u16 = 1000;
const MONO_ADVANCE: u16 = 600;
const BOLD_SCALE: f32 = 1.05;

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6)
}

fn advance(c: char) -> u16 {
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) {
        HELVETICA_WIDTHS[(code - 0x20) as usize]
    } else if c == '\u{a0}' {
        HELVETICA_WIDTHS[0]
    } else if is_wide(c) {
        WIDE_ADVANCE
    } else if c.is_whitespace() || c.is_control() {
        HELVETICA_WIDTHS[0]
    } else {
        DEFAULT_ADVANCE
    }
}

impl TextMeasurer for HelveticaMetrics {
    fn measure(&self, text: &str, style: &Style) -> f32 {
        let font = style.font.to_ascii_lowercase();
        let units: u32 = if font.contains("mono") || font.contains("courier") {
            text.chars()
                .map(|c| u32::from(if is_wide(c) { WIDE_ADVANCE } else { MONO_ADVANCE }))
                .sum()
        } else {
            text.chars().map(|c| u32::from(advance(c))).sum()
        };

        let mut width = units as f32 * style.size / 1000.0;
        if font.contains("bold") || font.contains("black") || font.contains("heavy") {
            width *= BOLD_SCALE;
        }
        width
    }
}
