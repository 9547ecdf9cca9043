//! Matching options and configuration.

/// Options for matching spans to layout blocks.
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Slack around a block's normalized bbox when testing span containment
    pub bbox_tolerance: f32,

    /// Vertical tolerance in pixels for grouping spans into reading-order lines
    pub line_tolerance_px: f32,

    /// Vertical tolerance in pixels for grouping lines when measuring line spacing
    pub spacing_tolerance_px: f32,

    /// Layout kinds that produce blocks (others are skipped)
    pub accepted_kinds: Vec<String>,

    /// Error handling mode for malformed input
    pub error_mode: ErrorMode,

    /// Whether to match pages in parallel
    pub parallel: bool,
}

impl MatchOptions {
    /// Create new match options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bbox containment tolerance (normalized units).
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.bbox_tolerance = tolerance.max(0.0);
        self
    }

    /// Set the reading-order line tolerance in pixels.
    pub fn with_line_tolerance(mut self, pixels: f32) -> Self {
        self.line_tolerance_px = pixels.max(0.0);
        self
    }

    /// Set the line-spacing grouping tolerance in pixels.
    pub fn with_spacing_tolerance(mut self, pixels: f32) -> Self {
        self.spacing_tolerance_px = pixels.max(0.0);
        self
    }

    /// Accept an additional layout kind.
    pub fn accept_kind(mut self, kind: impl Into<String>) -> Self {
        let kind = kind.into().to_lowercase();
        if !self.accepted_kinds.contains(&kind) {
            self.accepted_kinds.push(kind);
        }
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (drop malformed input instead of failing).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check whether a layout kind produces a block.
    pub fn accepts(&self, kind: &str) -> bool {
        self.accepted_kinds
            .iter()
            .any(|k| k.eq_ignore_ascii_case(kind))
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            bbox_tolerance: 0.02,
            line_tolerance_px: 1.0,
            spacing_tolerance_px: 2.0,
            accepted_kinds: vec!["title".to_string(), "text".to_string()],
            error_mode: ErrorMode::Strict,
            parallel: true,
        }
    }
}

/// Error handling mode for malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on duplicate or inconsistent input records
    #[default]
    Strict,
    /// Drop offending records with a warning and continue
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_options_builder() {
        let options = MatchOptions::new()
            .with_tolerance(0.05)
            .with_line_tolerance(2.0)
            .accept_kind("List")
            .lenient()
            .sequential();

        assert_eq!(options.bbox_tolerance, 0.05);
        assert_eq!(options.line_tolerance_px, 2.0);
        assert!(options.accepts("list"));
        assert!(options.accepts("TITLE"));
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = MatchOptions::default();
        assert_eq!(options.bbox_tolerance, 0.02);
        assert_eq!(options.spacing_tolerance_px, 2.0);
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.parallel);
        assert!(!options.accepts("image"));
    }

    #[test]
    fn test_negative_tolerance_clamped() {
        let options = MatchOptions::new().with_tolerance(-1.0);
        assert_eq!(options.bbox_tolerance, 0.0);
    }
}
