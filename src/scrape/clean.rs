//! HTML-to-text cleanup for ingested pages.

use std::sync::OnceLock;

use regex::Regex;

fn script_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap())
}

fn style_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Reduces raw HTML to plain text:
/// script and style elements are dropped with their contents, remaining
/// markup is replaced with spaces, common entities are decoded,
/// anything outside printable ASCII or whitespace is discarded, and
/// whitespace runs collapse to a single space.
pub fn clean_html(html: &str) -> String {
    let without_scripts = script_block_re().replace_all(html, " ");
    let without_styles = style_block_re().replace_all(&without_scripts, " ");
    let without_tags = tag_re().replace_all(&without_styles, " ");

    let decoded = decode_entities(&without_tags);
    let filtered: String = decoded
        .chars()
        .filter(|c| (' '..='~').contains(c) || c.is_whitespace())
        .collect();

    whitespace_re()
        .replace_all(&filtered, " ")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
