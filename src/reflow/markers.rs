//! Bullet markers inside list item content.

use std::sync::OnceLock;

use regex::Regex;

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[ \t]*([•◦▪▫‣⁃⁌⁍*○●])[ \t]").expect("valid list marker regex")
    })
}

/// Put every bullet item after the first on its own line.
///
/// A marker counts only when followed by a space, so `2*3` is left alone.
pub fn split_list_items(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for (n, caps) in marker_pattern().captures_iter(text).enumerate() {
        let (Some(whole), Some(marker)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let at_start = text[..whole.start()].trim().is_empty();
        if n == 0 && at_start {
            continue;
        }
        if text[..whole.start()].ends_with('\n') {
            continue;
        }
        out.push_str(text[last..whole.start()].trim_end_matches([' ', '\t']));
        out.push('\n');
        out.push_str(&text[marker.start()..whole.end()]);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Number of bullet markers in `text`.
pub fn count_markers(text: &str) -> usize {
    marker_pattern().find_iter(text).count()
}
