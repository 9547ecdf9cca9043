//! Reading-order line grouping for matched spans.

use crate::model::Span;

/// Group spans into lines by their top edge.
///
/// Each span joins the first line whose anchor lies within `tolerance`
/// pixels; otherwise it starts a new line. Lines are returned top to bottom
/// with their spans left to right.
pub fn group_into_lines<'a>(spans: &[&'a Span], tolerance: f32) -> Vec<Vec<&'a Span>> {
    let mut lines: Vec<(f32, Vec<&'a Span>)> = Vec::new();

    for &span in spans {
        let y = span.bbox_pixels.y0;
        match lines
            .iter_mut()
            .find(|(anchor, _)| (y - *anchor).abs() <= tolerance)
        {
            Some((_, line)) => line.push(span),
            None => lines.push((y, vec![span])),
        }
    }

    lines.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    lines
        .into_iter()
        .map(|(_, mut line)| {
            line.sort_by(|a, b| {
                a.bbox_pixels
                    .x0
                    .partial_cmp(&b.bbox_pixels.x0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            line
        })
        .collect()
}

/// Spans in reading order.
pub fn reading_order<'a>(spans: &[&'a Span], tolerance: f32) -> Vec<&'a Span> {
    group_into_lines(spans, tolerance)
        .into_iter()
        .flatten()
        .collect()
}

/// Average distance between consecutive lines, divided by `font_size`.
///
/// Distances outside `(0, 3 * font_size)` are ignored (paragraph gaps,
/// overlapping runs). Returns `None` when nothing usable remains.
pub fn line_spacing_ratio(spans: &[&Span], tolerance: f32, font_size: f32) -> Option<f32> {
    if font_size <= 0.0 {
        return None;
    }
    let lines = group_into_lines(spans, tolerance);
    let tops: Vec<f32> = lines
        .iter()
        .filter_map(|line| line.first().map(|s| s.bbox_pixels.y0))
        .collect();

    let distances: Vec<f32> = tops
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0 && *d < font_size * 3.0)
        .collect();
    if distances.is_empty() {
        return None;
    }
    let average = distances.iter().sum::<f32>() / distances.len() as f32;
    Some(average / font_size)
}
