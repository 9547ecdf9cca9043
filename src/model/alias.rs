//! Image alias table for inline `<svg id="alias"/>` references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text size an image was authored against when none is given.
pub const DEFAULT_REFERENCE_SIZE: f32 = 10.5;

/// Width/height ratio assumed when none is given.
pub const DEFAULT_ASPECT_RATIO: f32 = 0.5426;

/// An inline image resolved from an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAlias {
    /// Image file path
    pub file: String,

    /// Text size at which the image height equals the text size
    #[serde(default = "default_reference_size")]
    pub reference_text_size: f32,

    /// Width divided by height
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f32,

    /// Vertical offset applied by the renderer
    #[serde(default)]
    pub vertical_adjustment: f32,
}

fn default_reference_size() -> f32 {
    DEFAULT_REFERENCE_SIZE
}

fn default_aspect_ratio() -> f32 {
    DEFAULT_ASPECT_RATIO
}

impl ImageAlias {
    /// Create an alias entry with default metrics.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            reference_text_size: DEFAULT_REFERENCE_SIZE,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            vertical_adjustment: 0.0,
        }
    }

    /// Set the reference text size.
    pub fn with_reference_size(mut self, size: f32) -> Self {
        self.reference_text_size = size;
        self
    }

    /// Set the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: f32) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Width and height at the given font scale.
    pub fn dimensions(&self, font_scale: f32) -> (f32, f32) {
        let height = self.reference_text_size * font_scale;
        (height * self.aspect_ratio, height)
    }
}

/// Alias name -> image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: BTreeMap<String, ImageAlias>,
}

impl AliasTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias.
    pub fn insert(&mut self, alias: impl Into<String>, image: ImageAlias) {
        self.entries.insert(alias.into(), image);
    }

    /// Look up an alias.
    pub fn get(&self, alias: &str) -> Option<&ImageAlias> {
        self.entries.get(alias)
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
