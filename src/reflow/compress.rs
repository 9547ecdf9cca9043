//! Compression search: fit content into a line budget.

use serde::{Deserialize, Serialize};

use super::layout::{layout_lines, Compression, Line, ReflowBox};
use super::metrics::TextMeasurer;
use super::segment::Segment;

/// Default font-scale steps, least aggressive first.
pub const DEFAULT_FONT_SCALES: [f32; 8] = [1.0, 0.95, 0.9, 0.85, 0.8, 0.75, 0.7, 0.65];

/// Default character-spacing steps, least aggressive first.
pub const DEFAULT_CHAR_SPACINGS: [f32; 5] = [0.0, -0.05, -0.10, -0.15, -0.20];

/// How the renderer advances between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpacingMode {
    /// Advance = font size * line spacing, unaffected by font scale
    #[default]
    #[serde(rename = "original_spacing")]
    Original,
    /// Advance shrinks with the font scale
    #[serde(rename = "scaled_spacing")]
    Scaled,
}

impl SpacingMode {
    /// Vertical distance between baselines.
    pub fn line_advance(&self, font_size: f32, line_spacing: f32, font_scale: f32) -> f32 {
        match self {
            SpacingMode::Original => font_size * line_spacing,
            SpacingMode::Scaled => font_size * font_scale * line_spacing,
        }
    }
}

/// Ordered list of compression levels to try.
#[derive(Debug, Clone, PartialEq)]
pub struct Ladder {
    font_scales: Vec<f32>,
    char_spacings: Vec<f32>,
}

impl Ladder {
    /// Build a ladder from font-scale and char-spacing steps.
    ///
    /// Empty step lists fall back to a single neutral value.
    pub fn new(font_scales: Vec<f32>, char_spacings: Vec<f32>) -> Self {
        let font_scales = if font_scales.is_empty() { vec![1.0] } else { font_scales };
        let char_spacings = if char_spacings.is_empty() { vec![0.0] } else { char_spacings };
        Self {
            font_scales,
            char_spacings,
        }
    }

    /// Candidates in priority order: each font scale with every spacing.
    pub fn candidates(&self) -> impl Iterator<Item = Compression> + '_ {
        self.font_scales.iter().flat_map(move |&fs| {
            self.char_spacings
                .iter()
                .map(move |&cs| Compression::new(fs, cs))
        })
    }

    /// The first (least compressed) candidate.
    pub fn least_compressed(&self) -> Compression {
        Compression::new(self.font_scales[0], self.char_spacings[0])
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.font_scales.len() * self.char_spacings.len()
    }

    /// Always false; a ladder holds at least one candidate.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for Ladder {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_SCALES.to_vec(), DEFAULT_CHAR_SPACINGS.to_vec())
    }
}

/// Return the first candidate `attempt` accepts.
pub fn first_success<T, I, F>(candidates: I, attempt: F) -> Option<T>
where
    I: IntoIterator<Item = Compression>,
    F: FnMut(Compression) -> Option<T>,
{
    candidates.into_iter().find_map(attempt)
}

/// Vertical target of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTarget {
    /// Lines the original layout used
    pub line_budget: u32,
    /// Default font size of the block
    pub font_size: f32,
    /// Line spacing ratio of the block
    pub line_spacing: f32,
}

impl FitTarget {
    /// Create a target.
    pub fn new(line_budget: u32, font_size: f32, line_spacing: f32) -> Self {
        Self {
            line_budget: line_budget.max(1),
            font_size,
            line_spacing,
        }
    }

    /// Lines allowed at `font_scale` when line spacing shrinks with it.
    ///
    /// The box height is `budget` lines at full scale, so scaled lines fit
    /// `budget / font_scale` of them.
    pub fn scaled_capacity(&self, font_scale: f32) -> usize {
        if font_scale <= 0.0 {
            return self.line_budget as usize;
        }
        (self.line_budget as f32 / font_scale + 1e-4).floor() as usize
    }
}

/// Outcome of a compression search.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// Wrapped lines
    pub lines: Vec<Line>,
    /// Chosen compression
    pub compression: Compression,
    /// Line advance mode the renderer must use
    pub spacing_mode: SpacingMode,
    /// False when nothing fitted and the result overflows
    pub fitted: bool,
}

impl FitResult {
    /// Vertical advance between lines for `target`.
    pub fn line_advance(&self, target: &FitTarget) -> f32 {
        self.spacing_mode.line_advance(
            target.font_size,
            target.line_spacing,
            self.compression.font_scale,
        )
    }
}

/// Search the ladder for the least aggressive compression that fits.
///
/// First pass: line count within budget at original spacing. Second pass:
/// more lines allowed when they fit the box height at scaled spacing.
/// When neither pass succeeds the least compressed layout is returned with
/// `fitted == false`; content is never dropped.
pub fn fit_lines(
    segments: &[Segment],
    reflow_box: &ReflowBox,
    target: &FitTarget,
    ladder: &Ladder,
    measurer: &dyn TextMeasurer,
) -> FitResult {
    let budget = target.line_budget as usize;
    let mut attempts: Vec<(Compression, Vec<Line>)> = Vec::with_capacity(ladder.len());

    let original = first_success(ladder.candidates(), |compression| {
        let lines = layout_lines(segments, reflow_box, compression, measurer);
        if lines.len() <= budget {
            Some(FitResult {
                lines,
                compression,
                spacing_mode: SpacingMode::Original,
                fitted: true,
            })
        } else {
            attempts.push((compression, lines));
            None
        }
    });
    if let Some(result) = original {
        log::debug!(
            "Fitted at scale {:.2} spacing {:.2}",
            result.compression.font_scale,
            result.compression.char_spacing
        );
        return result;
    }

    let scaled = attempts
        .iter()
        .find(|(compression, lines)| lines.len() <= target.scaled_capacity(compression.font_scale));
    if let Some((compression, lines)) = scaled {
        log::debug!(
            "Fitted {} lines with scaled spacing at scale {:.2}",
            lines.len(),
            compression.font_scale
        );
        return FitResult {
            lines: lines.clone(),
            compression: *compression,
            spacing_mode: SpacingMode::Scaled,
            fitted: true,
        };
    }

    let compression = ladder.least_compressed();
    let lines = attempts
        .into_iter()
        .next()
        .map(|(_, lines)| lines)
        .unwrap_or_else(|| layout_lines(segments, reflow_box, compression, measurer));
    log::warn!(
        "Content needs {} lines but the budget is {}; keeping uncompressed layout",
        lines.len(),
        budget
    );
    FitResult {
        lines,
        compression,
        spacing_mode: SpacingMode::Original,
        fitted: false,
    }
}
