//! Integration tests for span-to-block matching.

use blockmatch::model::{MatchQuality, MatchSource};
use blockmatch::{
    enrich, BBox, BlockType, Blockmatch, Error, LayoutBlock, MatchOptions, PageInput, Span,
};

fn span(id: u32, text: &str, norm: BBox, font: &str) -> Span {
    Span::new(id, text, norm.scale(1000.0, 1000.0), norm).with_style(font, 10.0, 0)
}

/// A title, a two-line paragraph with a bold word, and a stray footer.
fn article() -> PageInput {
    PageInput::new(1000.0, 1000.0)
        .with_block(LayoutBlock::new("title", BBox::new(0.1, 0.05, 0.9, 0.1)))
        .with_block(
            LayoutBlock::new("text", BBox::new(0.1, 0.2, 0.9, 0.3))
                .with_content("The quick brown fox jumps"),
        )
        .with_span(span(0, "Report", BBox::new(0.1, 0.05, 0.3, 0.08), "Arial"))
        .with_span(span(1, "jumps", BBox::new(0.1, 0.24, 0.2, 0.26), "Arial"))
        .with_span(span(2, "The quick", BBox::new(0.1, 0.2, 0.3, 0.22), "Arial"))
        .with_span(span(3, "brown fox", BBox::new(0.31, 0.2, 0.5, 0.22), "Arial-Bold"))
        .with_span(span(4, "Page 1", BBox::new(0.45, 0.95, 0.55, 0.97), "Arial"))
}

// ==================== Assignment ====================

#[test]
fn test_spans_assigned_in_reading_order() {
    let doc = enrich(vec![article()], &MatchOptions::new().sequential()).unwrap();
    let page = doc.page(1).unwrap();

    let paragraph = page.block("page1_bloc01").unwrap();
    assert_eq!(paragraph.matching_spans, vec![2, 3, 1]);
    assert_eq!(paragraph.content, "The quick brown fox jumps");
    assert_eq!(paragraph.styled_content, "The quick <s1>brown fox</s1> jumps");
    assert_eq!(paragraph.match_source, MatchSource::Auto);
    assert_eq!(paragraph.block_type, BlockType::Paragraph);
}

#[test]
fn test_each_span_has_one_owner() {
    let doc = enrich(vec![article()], &MatchOptions::default()).unwrap();
    let page = doc.page(1).unwrap();

    for span in &page.spans {
        let owners = page
            .blocks
            .iter()
            .filter(|b| b.matching_spans.contains(&span.id))
            .count();
        assert_eq!(owners, 1, "span {} owned {} times", span.id, owners);
        assert_eq!(span.matched_to_block.as_deref(), page.owner_of(span.id));
    }
}

#[test]
fn test_leftover_span_becomes_isolated_block() {
    let doc = enrich(vec![article()], &MatchOptions::default()).unwrap();
    let page = doc.page(1).unwrap();

    let footer = page.block("page1_isolated_4").unwrap();
    assert_eq!(footer.block_type, BlockType::IsolatedSpan);
    assert_eq!(footer.content, "Page 1");
    assert!(footer.include_in_output);
    assert_eq!(page.span(4).unwrap().match_quality, MatchQuality::Unmatched);
}

#[test]
fn test_match_quality_recorded() {
    let doc = enrich(vec![article()], &MatchOptions::default()).unwrap();
    let page = doc.page(1).unwrap();
    assert_eq!(page.span(2).unwrap().match_quality, MatchQuality::Excellent);
    assert_eq!(page.span(0).unwrap().match_quality, MatchQuality::Excellent);
}

#[test]
fn test_tolerance_admits_overhanging_span() {
    let overhanging = || {
        PageInput::new(1000.0, 1000.0)
            .with_block(LayoutBlock::new("text", BBox::new(0.1, 0.1, 0.5, 0.2)))
            .with_span(span(0, "Edge", BBox::new(0.1, 0.1, 0.52, 0.12), "Arial"))
    };

    let strict = enrich(vec![overhanging()], &MatchOptions::new().with_tolerance(0.0)).unwrap();
    assert!(strict.page(1).unwrap().block("page1_bloc00").unwrap().is_empty());

    let loose = enrich(vec![overhanging()], &MatchOptions::new().with_tolerance(0.05)).unwrap();
    assert_eq!(
        loose.page(1).unwrap().block("page1_bloc00").unwrap().matching_spans,
        vec![0]
    );
}

// ==================== Documents ====================

#[test]
fn test_parallel_and_sequential_agree() {
    let pages = || vec![article(), article(), article()];
    let parallel = enrich(pages(), &MatchOptions::default()).unwrap();
    let sequential = enrich(pages(), &MatchOptions::new().sequential()).unwrap();

    assert_eq!(parallel.statistics(), sequential.statistics());
    for (a, b) in parallel.pages.iter().zip(&sequential.pages) {
        let ids_a: Vec<&str> = a.blocks.iter().map(|b| b.id.as_str()).collect();
        let ids_b: Vec<&str> = b.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }
}

#[test]
fn test_statistics() {
    let doc = enrich(vec![article()], &MatchOptions::default()).unwrap();
    let stats = doc.statistics();
    assert_eq!(stats.page_count, 1);
    assert_eq!(stats.span_count, 5);
    assert_eq!(stats.isolated_blocks, 1);
    assert_eq!(stats.matched_blocks, 2);
}

#[test]
fn test_pages_from_json() {
    let json = r#"[{
        "width": 1000, "height": 1000,
        "layout": [{"type": "text", "bbox": [0.1, 0.1, 0.9, 0.2], "content": "Hello"}],
        "spans": [{"id": 0, "text": "Hello",
                   "bbox_pixels": [100, 100, 200, 120],
                   "bbox_normalized": [0.1, 0.1, 0.2, 0.12],
                   "font_name": "Arial", "font_size": 10.0, "color": 0}]
    }]"#;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pages.json");
    std::fs::write(&path, json).unwrap();

    let enriched = Blockmatch::new().enrich_file(&path).unwrap();
    let block = enriched.document().find_block("page1_bloc00").unwrap().1;
    assert_eq!(block.content, "Hello");
}

#[test]
fn test_duplicate_span_ids_rejected_unless_lenient() {
    let input = || {
        PageInput::new(1000.0, 1000.0)
            .with_span(span(7, "one", BBox::new(0.1, 0.1, 0.2, 0.12), "Arial"))
            .with_span(span(7, "two", BBox::new(0.3, 0.1, 0.4, 0.12), "Arial"))
    };

    let strict = enrich(vec![input()], &MatchOptions::default());
    assert!(matches!(strict, Err(Error::InvalidInput(_))));

    let lenient = enrich(vec![input()], &MatchOptions::new().lenient()).unwrap();
    assert_eq!(lenient.page(1).unwrap().spans.len(), 1);
}
