//! Typography values: concrete styles, global style ids and style references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Font used when a run or block carries no usable font name.
pub const FALLBACK_FONT: &str = "Helvetica";

/// Font size used when a run or block carries no usable size.
pub const FALLBACK_SIZE: f32 = 12.0;

/// Granularity of style identity, in points.
pub const SIZE_QUANTUM: f32 = 0.2;

const STEPS_PER_POINT: f64 = 5.0;

/// Concrete typography of a text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Font name (e.g., "Arial-BoldMT")
    pub font: String,
    /// Font size in points
    pub size: f32,
    /// Packed 0xRRGGBB color
    pub color: u32,
}

impl Style {
    /// Create a new style.
    pub fn new(font: impl Into<String>, size: f32, color: u32) -> Self {
        Self {
            font: font.into(),
            size,
            color,
        }
    }

    /// The safe style substituted for missing typography.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_FONT, FALLBACK_SIZE, 0)
    }

    /// Build a style from possibly missing parts.
    ///
    /// This is the single repair point for incomplete typography: placeholder
    /// font names, non-positive or non-finite sizes and missing colors are
    /// replaced with the fallback values.
    pub fn repair(font: Option<&str>, size: Option<f32>, color: Option<u32>) -> Self {
        let font = match font.map(str::trim) {
            Some(name) if !is_placeholder_font(name) => name.to_string(),
            _ => {
                log::debug!("Missing font name, using {}", FALLBACK_FONT);
                FALLBACK_FONT.to_string()
            }
        };
        let size = match size {
            Some(s) if s.is_finite() && s > 0.0 => s,
            _ => {
                log::debug!("Missing font size, using {}", FALLBACK_SIZE);
                FALLBACK_SIZE
            }
        };
        Self::new(font, size, color.unwrap_or(0) & 0x00FF_FFFF)
    }

    /// Size snapped to the nearest [`SIZE_QUANTUM`].
    pub fn quantized_size(&self) -> f32 {
        quantize_size(self.size)
    }

    /// Identity key: font, quantized size, color.
    pub fn key(&self) -> StyleKey {
        StyleKey {
            font: self.font.clone(),
            size_steps: size_steps(self.size),
            color: self.color,
        }
    }

    /// True when both styles resolve to the same identity.
    pub fn same_identity(&self, other: &Style) -> bool {
        self.font == other.font
            && self.color == other.color
            && size_steps(self.size) == size_steps(other.size)
    }

    /// Color as a `#rrggbb` string.
    pub fn color_hex(&self) -> String {
        format!("#{:06x}", self.color)
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Hashable identity of a style: the size is stored as a count of quanta.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleKey {
    /// Font name
    pub font: String,
    /// Size in multiples of [`SIZE_QUANTUM`]
    pub size_steps: i64,
    /// Packed color
    pub color: u32,
}

impl StyleKey {
    /// Concrete style for this key (size snapped to the quantum).
    pub fn to_style(&self) -> Style {
        Style::new(self.font.clone(), steps_to_size(self.size_steps), self.color)
    }
}

/// Placeholder names that extraction tools emit when the font is unknown.
pub fn is_placeholder_font(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.eq_ignore_ascii_case("unknown")
}

/// Snap a size to the nearest multiple of [`SIZE_QUANTUM`].
pub fn quantize_size(size: f32) -> f32 {
    steps_to_size(size_steps(size))
}

fn size_steps(size: f32) -> i64 {
    (f64::from(size) * STEPS_PER_POINT).round() as i64
}

fn steps_to_size(steps: i64) -> f32 {
    (steps as f64 / STEPS_PER_POINT) as f32
}

/// Document-wide style id, displayed and serialized as `gsN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GlobalStyleId(pub u32);

impl GlobalStyleId {
    /// Tag name used in inline markup.
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GlobalStyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs{}", self.0)
    }
}

impl FromStr for GlobalStyleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("gs")
            .and_then(|n| n.parse::<u32>().ok())
            .map(GlobalStyleId)
            .ok_or_else(|| Error::InvalidStyleId(s.to_string()))
    }
}

impl TryFrom<String> for GlobalStyleId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<GlobalStyleId> for String {
    fn from(id: GlobalStyleId) -> Self {
        id.to_string()
    }
}

/// A style given either literally or by reference to the global table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleRef {
    /// Reference to a global style entry
    Named(GlobalStyleId),
    /// Literal style
    Direct(Style),
}

impl From<GlobalStyleId> for StyleRef {
    fn from(id: GlobalStyleId) -> Self {
        StyleRef::Named(id)
    }
}

impl From<Style> for StyleRef {
    fn from(style: Style) -> Self {
        StyleRef::Direct(style)
    }
}
