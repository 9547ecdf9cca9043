//! Length-proportional split of merged text.
//!
//! Used when blocks have no usable width to reflow against. Cuts are placed
//! on whitespace outside any `<...>` marker. A style run spanning a cut is
//! closed at the end of one part and reopened at the start of the next, so
//! every part carries balanced tags.

use crate::style::markup::{tokenize, Token};

/// Split `text` into one part per budget, sized by line budget share.
///
/// The last part takes whatever remains. Cuts snap forward to the nearest
/// whitespace with balanced `<`/`>` counts before it.
pub fn split_proportional(text: &str, budgets: &[u32]) -> Vec<String> {
    balance_parts(cut_proportional(text, budgets))
}

fn cut_proportional(text: &str, budgets: &[u32]) -> Vec<String> {
    if budgets.is_empty() {
        return Vec::new();
    }
    let chars: Vec<char> = text.trim().chars().collect();
    let mut remaining_lines: usize = budgets.iter().map(|b| (*b).max(1) as usize).sum();
    let mut start = 0;
    let mut parts = Vec::with_capacity(budgets.len());

    for (i, budget) in budgets.iter().enumerate() {
        if i + 1 == budgets.len() {
            parts.push(collect_trimmed(&chars[start..]));
            break;
        }
        let budget = (*budget).max(1) as usize;
        let remaining = chars.len() - start;
        let target = start + remaining * budget / remaining_lines;
        let cut = find_cut(&chars, start, target);
        parts.push(collect_trimmed(&chars[start..cut]));
        start = cut;
        remaining_lines -= budget;
    }
    parts
}

/// First clean cut at or after `target`; the end of text when none exists.
fn find_cut(chars: &[char], start: usize, target: usize) -> usize {
    let mut depth: i64 = chars[start..target.min(chars.len())]
        .iter()
        .map(|c| tag_delta(*c))
        .sum();

    for (pos, c) in chars.iter().enumerate().skip(target) {
        if c.is_whitespace() && depth == 0 {
            return pos;
        }
        depth += tag_delta(*c);
    }
    chars.len()
}

/// Close style runs left open at the end of a part and reopen them in the
/// next non-empty one. Tags never closed later in the text are left alone.
fn balance_parts(parts: Vec<String>) -> Vec<String> {
    let mut carried: Vec<String> = Vec::new();
    let mut balanced = Vec::with_capacity(parts.len());

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            balanced.push(String::new());
            continue;
        }
        let mut open = carried.clone();
        for token in tokenize(part) {
            match token {
                Token::Open(name) => open.push(name.to_string()),
                Token::Close(name) => {
                    if open.last().is_some_and(|top| top == name) {
                        open.pop();
                    }
                }
                _ => {}
            }
        }
        let rest = parts[i + 1..].join(" ");
        open.retain(|name| rest.contains(&format!("</{}>", name)));

        let mut text = String::with_capacity(part.len() + 8 * (carried.len() + open.len()));
        for name in &carried {
            text.push_str(&format!("<{}>", name));
        }
        text.push_str(part);
        for name in open.iter().rev() {
            text.push_str(&format!("</{}>", name));
        }
        balanced.push(text);
        carried = open;
    }
    balanced
}

fn tag_delta(c: char) -> i64 {
    match c {
        '<' => 1,
        '>' => -1,
        _ => 0,
    }
}

fn collect_trimmed(chars: &[char]) -> String {
    chars.iter().collect::<String>().trim().to_string()
}
