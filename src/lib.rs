//! # blockmatch
//!
//! Span-to-block matching, style deduplication and text reflow for
//! reconstructing translated PDF pages.
//!
//! A page arrives as layout blocks (from a layout model) and text spans
//! (from a PDF text extractor). This library assigns spans to blocks, tags
//! each block's text with inline style markers, exports translation and
//! formatting records, and finally lays translated text back into the
//! original boxes, compressing it when it no longer fits.
//!
//! ## Quick Start
//!
//! ```no_run
//! use blockmatch::{Blockmatch, JsonFormat};
//!
//! fn main() -> blockmatch::Result<()> {
//!     // Match spans to layout blocks
//!     let enriched = Blockmatch::new().enrich_file("pages.json")?;
//!
//!     // Export translation and formatting records
//!     let export = enriched.export()?;
//!     export.write_to_dir("out", JsonFormat::Pretty)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Span matching**: geometric containment plus lexical agreement, in reading order
//! - **Style registry**: document-wide `gsN` ids, stable across re-exports
//! - **Reflow**: word wrapping with inline images and list indentation
//! - **Compression search**: font scale and letter spacing ladder to honor line budgets
//! - **Merge groups**: one translation split back over several blocks
//! - **Parallel processing**: pages are matched with Rayon

pub mod error;
pub mod export;
pub mod matcher;
pub mod model;
pub mod redistribute;
pub mod reflow;
pub mod style;

// Re-export commonly used types
pub use error::{Error, Result};
pub use export::{
    export_document, plan_reconstruction, Export, ExportOptions, FormattingDocument, JsonFormat,
    ReconstructionPlan, TranslationOverrides, TranslationRecord, ValidationMetadata,
};
pub use matcher::{ErrorMode, LayoutBlock, MatchOptions, PageInput, SpanMatcher};
pub use model::{
    AliasTable, BBox, Block, BlockType, Document, GlobalStyleId, ImageAlias, Page, Span, Style,
    StyleRef,
};
pub use redistribute::{redistribute_text, MemberSlot, Redistribution};
pub use reflow::{fit_lines, Compression, FitResult, FitTarget, ReflowOptions, SpacingMode};
pub use style::StyleRegistry;

use std::path::Path;

/// Match spans to blocks on every page.
///
/// # Example
///
/// ```
/// use blockmatch::{enrich, BBox, LayoutBlock, MatchOptions, PageInput, Span};
///
/// let page = PageInput::new(1000.0, 1000.0)
///     .with_block(LayoutBlock::new("text", BBox::new(0.1, 0.1, 0.9, 0.2)))
///     .with_span(
///         Span::new(0, "Hello", BBox::new(120.0, 120.0, 200.0, 140.0), BBox::new(0.12, 0.12, 0.2, 0.14))
///             .with_style("Helvetica", 12.0, 0),
///     );
/// let doc = enrich(vec![page], &MatchOptions::default()).unwrap();
/// assert_eq!(doc.pages[0].blocks[0].content, "Hello");
/// ```
pub fn enrich(pages: Vec<PageInput>, options: &MatchOptions) -> Result<Document> {
    SpanMatcher::new(options.clone()).match_document(pages)
}

/// Read page inputs (a JSON array of [`PageInput`]) and match them.
pub fn enrich_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    enrich_file_with_options(path, &MatchOptions::default())
}

/// Read page inputs and match them with custom options.
pub fn enrich_file_with_options<P: AsRef<Path>>(path: P, options: &MatchOptions) -> Result<Document> {
    let pages: Vec<PageInput> = export::read_json(path)?;
    enrich(pages, options)
}

/// Read an enriched document (as written by [`Enriched::save`]).
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let mut doc: Document = export::read_json(path)?;
    doc.reindex()?;
    Ok(doc)
}

/// Lay out translated records read from an export directory.
pub fn plan_from_dir<P: AsRef<Path>>(
    dir: P,
    aliases: &AliasTable,
    options: &ReflowOptions,
) -> Result<ReconstructionPlan> {
    let export = Export::read_from_dir(dir)?;
    plan_reconstruction(&export.formatting, &export.translations, aliases, options)
}

/// Builder for matching and exporting documents.
///
/// # Example
///
/// ```no_run
/// use blockmatch::Blockmatch;
///
/// let export = Blockmatch::new()
///     .with_tolerance(0.03)
///     .sequential()
///     .enrich_file("pages.json")?
///     .export()?;
/// # Ok::<(), blockmatch::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Blockmatch {
    match_options: MatchOptions,
    export_options: ExportOptions,
    metadata: Option<ValidationMetadata>,
}

impl Blockmatch {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bbox containment tolerance (normalized units).
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.match_options = self.match_options.with_tolerance(tolerance);
        self
    }

    /// Keep going past malformed spans instead of failing.
    pub fn lenient(mut self) -> Self {
        self.match_options = self.match_options.lenient();
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.match_options = self.match_options.sequential();
        self
    }

    /// Set all matching options.
    pub fn with_match_options(mut self, options: MatchOptions) -> Self {
        self.match_options = options;
        self
    }

    /// Set all export options.
    pub fn with_export_options(mut self, options: ExportOptions) -> Self {
        self.export_options = options;
        self
    }

    /// Replay saved corrections after matching.
    pub fn with_metadata(mut self, metadata: ValidationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Match page inputs.
    pub fn enrich(self, pages: Vec<PageInput>) -> Result<Enriched> {
        let mut document = enrich(pages, &self.match_options)?;
        if let Some(metadata) = &self.metadata {
            metadata.apply(&mut document)?;
        }
        Ok(Enriched {
            document,
            export_options: self.export_options,
        })
    }

    /// Read and match page inputs from a JSON file.
    pub fn enrich_file<P: AsRef<Path>>(self, path: P) -> Result<Enriched> {
        let pages: Vec<PageInput> = export::read_json(path)?;
        self.enrich(pages)
    }
}

/// Result of matching a document.
#[derive(Debug, Clone)]
pub struct Enriched {
    /// The enriched document
    pub document: Document,
    /// Export options to use
    export_options: ExportOptions,
}

impl Enriched {
    /// Export translation and formatting records.
    pub fn export(&self) -> Result<Export> {
        export_document(&self.document, &self.export_options)
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        export::to_json(&self.document, format)
    }

    /// Write the document to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        export::write_json(path, &self.document, self.export_options.format)
    }

    /// Capture the current span assignments.
    pub fn metadata(&self) -> ValidationMetadata {
        ValidationMetadata::capture(&self.document)
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
