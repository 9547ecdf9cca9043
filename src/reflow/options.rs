//! Reflow configuration.

use std::fmt;
use std::sync::Arc;

use super::compress::Ladder;
use super::metrics::{HelveticaMetrics, TextMeasurer};

/// Options for layout and compression search.
#[derive(Clone)]
pub struct ReflowOptions {
    /// Compression levels, least aggressive first
    pub ladder: Ladder,

    /// Text width measurer
    pub measurer: Arc<dyn TextMeasurer>,
}

impl ReflowOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compression ladder.
    pub fn with_ladder(mut self, ladder: Ladder) -> Self {
        self.ladder = ladder;
        self
    }

    /// Set the font-scale and char-spacing steps.
    pub fn with_steps(mut self, font_scales: Vec<f32>, char_spacings: Vec<f32>) -> Self {
        self.ladder = Ladder::new(font_scales, char_spacings);
        self
    }

    /// Disable compression: only the uncompressed level is tried.
    pub fn no_compression(self) -> Self {
        self.with_steps(vec![1.0], vec![0.0])
    }

    /// Set the text measurer.
    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Borrow the measurer.
    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }
}

impl Default for ReflowOptions {
    fn default() -> Self {
        Self {
            ladder: Ladder::default(),
            measurer: Arc::new(HelveticaMetrics::new()),
        }
    }
}

impl fmt::Debug for ReflowOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflowOptions")
            .field("ladder", &self.ladder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Style;

    struct FixedWidth;

    impl TextMeasurer for FixedWidth {
        fn measure(&self, text: &str, style: &Style) -> f32 {
            text.chars().count() as f32 * style.size * 0.5
        }
    }

    #[test]
    fn test_defaults() {
        let options = ReflowOptions::new();
        assert_eq!(options.ladder.len(), 40);
        assert!(format!("{:?}", options).contains("ReflowOptions"));
    }

    #[test]
    fn test_builders() {
        let options = ReflowOptions::new()
            .no_compression()
            .with_measurer(Arc::new(FixedWidth));
        assert_eq!(options.ladder.len(), 1);
        let width = options.measurer().measure("abcd", &Style::new("X", 10.0, 0));
        assert!((width - 20.0).abs() < 1e-6);
    }
}
