//! Export of enriched documents for translation and reconstruction.
//!
//! An export produces two records:
//!
//! - translation records: one source text per block or merge group, written
//!   with global style tags (`<gs3>...</gs3>`)
//! - formatting records: per-page block geometry, style references and list
//!   or merge metadata, plus the global style table
//!
//! Both are deterministic: exporting the same document twice yields the same
//! block ids, group ids and style ids.

pub mod formatting;
mod json;
pub mod metadata;
pub mod reconstruct;
pub mod translation;

use std::fs;
use std::path::Path;

pub use formatting::{build_formatting, register_styles, FormattingBlock, FormattingDocument, FormattingPage};
pub use json::{from_json, read_json, to_json, write_json, JsonFormat};
pub use metadata::{BlockMetadata, IsolatedMetadata, PageMetadata, ValidationMetadata};
pub use reconstruct::{plan_reconstruction, PlannedBlock, PlannedPage, ReconstructionPlan};
pub use translation::{build_translations, TranslationOverrides, TranslationRecord};

use crate::error::Result;
use crate::model::Document;
use crate::style::StyleRegistry;

/// File name of the translation records inside an export directory.
pub const TRANSLATION_FILE: &str = "translation.json";

/// File name of the formatting records inside an export directory.
pub const FORMATTING_FILE: &str = "formatting.json";

/// Options for exporting a document.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// JSON layout of written files
    pub format: JsonFormat,

    /// Replacement source texts by record id
    pub overrides: TranslationOverrides,

    /// Previously exported style table to keep ids stable
    pub seed_styles: Option<StyleRegistry>,
}

impl ExportOptions {
    /// Create export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the JSON format.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Write compact JSON.
    pub fn compact(mut self) -> Self {
        self.format = JsonFormat::Compact;
        self
    }

    /// Set source overrides.
    pub fn with_overrides(mut self, overrides: TranslationOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Seed the style table from an earlier export.
    pub fn with_seed_styles(mut self, styles: StyleRegistry) -> Self {
        self.seed_styles = Some(styles);
        self
    }
}

/// Translation and formatting records of one document.
#[derive(Debug, Clone)]
pub struct Export {
    /// Records to translate
    pub translations: Vec<TranslationRecord>,

    /// Layout records and global style table
    pub formatting: FormattingDocument,
}

impl Export {
    /// Write `translation.json` and `formatting.json` into `dir`.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P, format: JsonFormat) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        write_json(dir.join(TRANSLATION_FILE), &self.translations, format)?;
        write_json(dir.join(FORMATTING_FILE), &self.formatting, format)?;
        Ok(())
    }

    /// Read an export written by [`Export::write_to_dir`].
    pub fn read_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            translations: read_json(dir.join(TRANSLATION_FILE))?,
            formatting: read_json(dir.join(FORMATTING_FILE))?,
        })
    }
}

/// Export a document.
///
/// Styles are registered in page and reading order before any text is
/// written, so style ids only depend on the document.
pub fn export_document(doc: &Document, options: &ExportOptions) -> Result<Export> {
    let mut registry = options.seed_styles.clone().unwrap_or_default();
    let seeded = registry.len();

    register_styles(doc, &mut registry);
    let translations = build_translations(doc, &mut registry, &options.overrides)?;
    let formatting = build_formatting(doc, &mut registry);

    log::debug!(
        "Exported {} records, {} styles ({} new)",
        translations.len(),
        registry.len(),
        registry.len() - seeded
    );
    Ok(Export {
        translations,
        formatting,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, Block, BlockType, Page, Span};

    fn doc() -> Document {
        let mut page = Page::new(1, 600.0, 800.0);
        page.spans.push(
            Span::new(0, "Hello", BBox::default(), BBox::default()).with_style("Arial", 10.0, 0),
        );
        let mut block = Block::new("page1_bloc01", BlockType::Paragraph);
        block.matching_spans = vec![0];
        page.blocks.push(block);
        page.reindex().unwrap();
        page.refresh_block("page1_bloc01").unwrap();
        let mut doc = Document::new();
        doc.add_page(page);
        doc
    }

    #[test]
    fn test_export_and_read_back() {
        let export = export_document(&doc(), &ExportOptions::new()).unwrap();
        assert_eq!(export.translations.len(), 1);
        assert_eq!(export.formatting.global_styles.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        export.write_to_dir(dir.path(), JsonFormat::Compact).unwrap();
        let back = Export::read_from_dir(dir.path()).unwrap();
        assert_eq!(back.translations, export.translations);
        assert_eq!(back.formatting.pages, export.formatting.pages);
    }

    #[test]
    fn test_seeded_styles_keep_ids() {
        let mut seed = StyleRegistry::new();
        seed.resolve_or_create(&crate::model::Style::new("Times", 9.0, 0));
        let options = ExportOptions::new().with_seed_styles(seed);

        let export = export_document(&doc(), &options).unwrap();
        let styles = &export.formatting.global_styles;
        assert_eq!(styles.len(), 2);
        assert_eq!(
            styles.get(crate::model::GlobalStyleId(2)).map(|s| s.font.as_str()),
            Some("Arial")
        );
    }
}
