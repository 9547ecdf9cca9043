//! End-to-end tests: enrich, export, translate, lay out.

use blockmatch::export::{read_json, write_json};
use blockmatch::{
    load_document, plan_from_dir, AliasTable, BBox, Blockmatch, Error, Export, JsonFormat,
    LayoutBlock, PageInput, ReflowOptions, Span, TranslationRecord, ValidationMetadata,
};

fn span(id: u32, text: &str, norm: BBox, font: &str, size: f32) -> Span {
    Span::new(id, text, norm.scale(1000.0, 1000.0), norm).with_style(font, size, 0)
}

fn pages() -> Vec<PageInput> {
    vec![PageInput::new(1000.0, 1000.0)
        .with_block(LayoutBlock::new("title", BBox::new(0.1, 0.05, 0.9, 0.1)))
        .with_block(LayoutBlock::new("text", BBox::new(0.1, 0.2, 0.9, 0.25)))
        .with_block(LayoutBlock::new("text", BBox::new(0.1, 0.3, 0.9, 0.35)))
        .with_span(span(0, "Annual Report", BBox::new(0.1, 0.05, 0.4, 0.08), "Helvetica-Bold", 14.0))
        .with_span(span(1, "The first paragraph", BBox::new(0.1, 0.2, 0.5, 0.22), "Helvetica", 10.0))
        .with_span(span(2, "continues here.", BBox::new(0.1, 0.3, 0.4, 0.32), "Helvetica", 10.0))]
}

fn merged_session() -> (Blockmatch, String, blockmatch::Enriched) {
    let builder = Blockmatch::new().sequential();
    let mut enriched = builder.clone().enrich(pages()).unwrap();
    let group = enriched
        .document
        .merge_blocks(&["page1_bloc01", "page1_bloc02"])
        .unwrap();
    (builder, group, enriched)
}

#[test]
fn test_export_ids_are_stable_across_runs() {
    let (_, group_a, first) = merged_session();
    let (_, group_b, second) = merged_session();
    assert_eq!(group_a, group_b);

    let a = first.export().unwrap();
    let b = second.export().unwrap();
    assert_eq!(a.translations, b.translations);
    assert_eq!(a.formatting.pages, b.formatting.pages);

    let ids: Vec<&str> = a.translations.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["page1_bloc00", group_a.as_str()]);
    assert_eq!(a.translations[1].source, "The first paragraph continues here.");
}

#[test]
fn test_translate_and_plan_from_directory() {
    let (_, group, enriched) = merged_session();
    let dir = tempfile::tempdir().unwrap();
    enriched.export().unwrap().write_to_dir(dir.path(), JsonFormat::Pretty).unwrap();

    // Fill in targets the way a translation step would.
    let path = dir.path().join(blockmatch::export::TRANSLATION_FILE);
    let records: Vec<TranslationRecord> = read_json(&path).unwrap();
    let translated: Vec<TranslationRecord> = records
        .into_iter()
        .map(|r| {
            let target = if r.id == group {
                "Le premier paragraphe continue ici."
            } else {
                "Rapport annuel"
            };
            r.with_target(target)
        })
        .collect();
    write_json(&path, &translated, JsonFormat::Pretty).unwrap();

    let plan = plan_from_dir(dir.path(), &AliasTable::new(), &ReflowOptions::default()).unwrap();
    assert_eq!(plan.pages.len(), 1);
    assert_eq!(plan.overflow_count(), 0);

    let title = plan.block("page1_bloc00").unwrap();
    assert_eq!(title.lines.len(), 1);
    assert_eq!(title.lines[0].text(), "Rapport annuel");
    assert_eq!(title.font_size, 14.0);
    assert!(title.merge_group.is_none());

    let first = plan.block("page1_bloc01").unwrap();
    let second = plan.block("page1_bloc02").unwrap();
    assert_eq!(first.merge_group.as_deref(), Some(group.as_str()));
    assert_eq!(second.merge_group.as_deref(), Some(group.as_str()));
    let text: Vec<String> = first
        .lines
        .iter()
        .chain(&second.lines)
        .map(|l| l.text())
        .collect();
    assert_eq!(text.join(" "), "Le premier paragraphe continue ici.");
}

#[test]
fn test_empty_target_falls_back_to_source() {
    let enriched = Blockmatch::new().enrich(pages()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    enriched.export().unwrap().write_to_dir(dir.path(), JsonFormat::Compact).unwrap();

    let plan = plan_from_dir(dir.path(), &AliasTable::new(), &ReflowOptions::default()).unwrap();
    let title = plan.block("page1_bloc00").unwrap();
    assert_eq!(title.lines[0].text(), "Annual Report");
    assert_eq!(plan.pages[0].blocks.len(), 3);
}

#[test]
fn test_session_and_metadata_files() {
    let (builder, _, enriched) = merged_session();
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.json");
    enriched.save(&session).unwrap();

    let loaded = load_document(&session).unwrap();
    assert_eq!(loaded.statistics(), enriched.document().statistics());
    assert_eq!(loaded.statistics().merge_groups, 1);

    let metadata_path = dir.path().join("metadata.json");
    write_json(&metadata_path, &enriched.metadata(), JsonFormat::Pretty).unwrap();
    let metadata: ValidationMetadata = read_json(&metadata_path).unwrap();

    // Merge groups are not part of the metadata; span assignments are.
    let out = dir.path().join("original");
    Blockmatch::new()
        .enrich(pages())
        .unwrap()
        .export()
        .unwrap()
        .write_to_dir(&out, JsonFormat::Compact)
        .unwrap();
    let original = Export::read_from_dir(&out).unwrap();

    let replayed = builder.with_metadata(metadata).enrich(pages()).unwrap();
    assert_eq!(replayed.export().unwrap().translations, original.translations);
}

// ==================== Merged Isolated Blocks ====================

/// One layout block holding "World" and a stray "Hello" span outside it.
fn stray_span_page() -> Vec<PageInput> {
    vec![PageInput::new(1000.0, 1000.0)
        .with_block(LayoutBlock::new("text", BBox::new(0.1, 0.2, 0.9, 0.25)))
        .with_span(span(0, "Hello", BBox::new(0.1, 0.8, 0.3, 0.82), "Helvetica", 10.0))
        .with_span(span(1, "World", BBox::new(0.1, 0.2, 0.3, 0.22), "Helvetica", 10.0))]
}

#[test]
fn test_merged_isolated_block_stays_in_output() {
    let mut enriched = Blockmatch::new().enrich(stray_span_page()).unwrap();
    let group = enriched
        .document
        .merge_blocks(&["page1_isolated_0", "page1_bloc00"])
        .unwrap();

    let err = enriched
        .document
        .page_mut(1)
        .unwrap()
        .set_include_in_output("page1_isolated_0", false)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidMergeGroup(_)));

    let export = enriched.export().unwrap();
    assert_eq!(export.translations.len(), 1);
    assert_eq!(export.translations[0].id, group);
    assert_eq!(export.translations[0].source, "Hello World");

    let dir = tempfile::tempdir().unwrap();
    export.write_to_dir(dir.path(), JsonFormat::Pretty).unwrap();
    let plan = plan_from_dir(dir.path(), &AliasTable::new(), &ReflowOptions::default()).unwrap();
    let first = plan.block("page1_isolated_0").unwrap();
    let second = plan.block("page1_bloc00").unwrap();
    assert_eq!(first.merge_group.as_deref(), Some(group.as_str()));
    assert_eq!(second.merge_group.as_deref(), Some(group.as_str()));
}

#[test]
fn test_excluded_isolated_block_cannot_be_merged() {
    let mut enriched = Blockmatch::new().enrich(stray_span_page()).unwrap();
    enriched
        .document
        .page_mut(1)
        .unwrap()
        .set_include_in_output("page1_isolated_0", false)
        .unwrap();

    let err = enriched
        .document
        .merge_blocks(&["page1_isolated_0", "page1_bloc00"])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidMergeGroup(_)));

    let export = enriched.export().unwrap();
    assert_eq!(export.translations.len(), 1);
    assert_eq!(export.translations[0].id, "page1_bloc00");
    assert_eq!(export.translations[0].source, "World");
}
