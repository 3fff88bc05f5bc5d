//! Reply text cleaning
//!
//! Assistant answers embed file-search citations such as `【4:0†source】`.
//! They mean nothing to the reader and are removed before display.

use regex::Regex;

lazy_static::lazy_static! {
    /// One or more back-to-back citation markers: `【<int>:<int>†source】`
    static ref CITATION_REGEX: Regex = Regex::new(r"(?:【\d+:\d+†source】)+").unwrap();

    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Remove every citation marker.
///
/// A marker wedged between two words becomes a single space so the words stay apart.
/// Stripping repeats until no marker is left, since removing a nested marker can
/// join the text around it into a new one.
pub fn strip_citations(text: &str) -> String {
    let mut stripped = strip_citations_once(text);
    while CITATION_REGEX.is_match(&stripped) {
        stripped = strip_citations_once(&stripped);
    }
    stripped
}

fn strip_citations_once(text: &str) -> String {
    CITATION_REGEX
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let Some(m) = caps.get(0) else {
                return "";
            };
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            match (before, after) {
                (Some(b), Some(a)) if b.is_alphanumeric() && a.is_alphanumeric() => " ",
                _ => "",
            }
        })
        .into_owned()
}

/// Collapse whitespace runs to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}

/// Text as shown to the user.
pub fn clean_reply(text: &str) -> String {
    collapse_whitespace(&strip_citations(text))
}
