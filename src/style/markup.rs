//! Inline markup tokenizer.
//!
//! Block text carries three kinds of markers:
//!
//! - local style tags `<s1>…</s1>` (numbered per block),
//! - global style tags `<gs1>…</gs1>` (numbered per document),
//! - inline images `<svg id="alias"/>`.
//!
//! Anything else, including a stray `<`, is plain text.

use std::sync::OnceLock;

use regex::Regex;

/// One markup token, borrowing from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Plain text
    Text(&'a str),
    /// Opening style tag with its name (`s1`, `gs3`)
    Open(&'a str),
    /// Closing style tag with its name
    Close(&'a str),
    /// Inline image alias
    Image(&'a str),
}

fn markup_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<(/?)(g?s\d+)>|<svg\s+id="([^"]*)"\s*/>"#).expect("markup pattern is valid")
    })
}

/// Split text into markup tokens.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in markup_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            tokens.push(Token::Text(&text[last..whole.start()]));
        }
        if let Some(alias) = caps.get(3) {
            tokens.push(Token::Image(alias.as_str()));
        } else if let Some(name) = caps.get(2) {
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            if closing {
                tokens.push(Token::Close(name.as_str()));
            } else {
                tokens.push(Token::Open(name.as_str()));
            }
        }
        last = whole.end();
    }

    if last < text.len() {
        tokens.push(Token::Text(&text[last..]));
    }
    tokens
}

/// Pair opening and closing tags.
///
/// Returns, for every token, the index of its partner when the token is a
/// tag that closes (or is closed by) a tag of the same name on top of the
/// open stack. Overlapping or stray tags stay unpaired.
pub fn pair_tags(tokens: &[Token<'_>]) -> Vec<Option<usize>> {
    let mut partners = vec![None; tokens.len()];
    let mut stack: Vec<(usize, &str)> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open(name) => stack.push((i, *name)),
            Token::Close(name) => {
                if let Some(&(open, open_name)) = stack.last() {
                    if open_name == *name {
                        stack.pop();
                        partners[open] = Some(i);
                        partners[i] = Some(open);
                    }
                }
            }
            _ => {}
        }
    }
    partners
}

/// True when every tag has a partner and tags never overlap.
pub fn is_balanced(text: &str) -> bool {
    let tokens = tokenize(text);
    let partners = pair_tags(&tokens);
    tokens
        .iter()
        .zip(partners.iter())
        .all(|(token, partner)| match token {
            Token::Open(_) | Token::Close(_) => partner.is_some(),
            _ => true,
        })
}

/// Text with style tags and images removed.
pub fn strip_markup(text: &str) -> String {
    tokenize(text)
        .into_iter()
        .filter_map(|token| match token {
            Token::Text(t) => Some(t),
            _ => None,
        })
        .collect()
}

/// Image aliases referenced in the text, in order of first appearance.
pub fn image_aliases(text: &str) -> Vec<String> {
    let mut aliases: Vec<String> = Vec::new();
    for token in tokenize(text) {
        if let Token::Image(alias) = token {
            if !aliases.iter().any(|a| a == alias) {
                aliases.push(alias.to_string());
            }
        }
    }
    aliases
}

/// Markup for an inline image.
pub fn image_tag(alias: &str) -> String {
    format!("<svg id=\"{}\"/>", alias)
}

/// Collapse runs of whitespace into one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed() {
        let tokens = tokenize(r#"Hi <s1>bold</s1> and <svg id="logo"/> end"#);
        assert_eq!(
            tokens,
            vec![
                Token::Text("Hi "),
                Token::Open("s1"),
                Token::Text("bold"),
                Token::Close("s1"),
                Token::Text(" and "),
                Token::Image("logo"),
                Token::Text(" end"),
            ]
        );
    }

    #[test]
    fn test_tokenize_stray_angle_bracket() {
        let tokens = tokenize("a < b <gs2>c</gs2>");
        assert_eq!(tokens[0], Token::Text("a < b "));
        assert_eq!(tokens[1], Token::Open("gs2"));
    }

    #[test]
    fn test_tag_names_do_not_alias() {
        let tokens = tokenize("<s1>a</s1><s10>b</s10>");
        assert_eq!(tokens[0], Token::Open("s1"));
        assert_eq!(tokens[3], Token::Open("s10"));
        assert!(is_balanced("<s1>a</s1><s10>b</s10>"));
    }

    #[test]
    fn test_balance() {
        assert!(is_balanced("plain"));
        assert!(is_balanced("<gs1>a<gs2>b</gs2></gs1>"));
        assert!(is_balanced("<gs1>a</gs1> <gs1>b</gs1>"));
        assert!(!is_balanced("<gs1>a<gs2>b</gs1></gs2>"));
        assert!(!is_balanced("<gs1>a"));
        assert!(!is_balanced("a</gs1>"));
    }

    #[test]
    fn test_strip_and_aliases() {
        let text = r#"<gs1>A</gs1> <svg id="x"/> B <svg id="y" /> <svg id="x"/>"#;
        assert_eq!(collapse_whitespace(&strip_markup(text)), "A B");
        assert_eq!(image_aliases(text), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(image_tag("x"), r#"<svg id="x"/>"#);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
