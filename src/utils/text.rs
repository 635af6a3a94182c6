//! String helpers for cleaning model output before it reaches a plain-text UI.

use regex::Regex;
use std::sync::LazyLock;

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!(pattern, error = %e, "Invalid text-cleaning pattern");
            None
        }
    }
}

static MARKDOWN_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"\[([^\]]+)\]\(([^\)]+)\)"));
static INLINE_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"\[([^\]]*?)\][\[\(]([^\]\)]*)[\]\)]"));
static ATX_HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?m)^[ \t]*#{1,6}[ \t]*([^\n]*?)(?:[ \t]+#+)?[ \t]*$"));
static STRONG_STAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"\*\*(\S(?:[^\n]*?\S)?)\*\*"));
static EM_STAR: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"\*(\S(?:[^\n]*?\S)?)\*"));
static STRONG_UNDERSCORE: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(^|\W)__(\S(?:[^\n]*?\S)?)__($|\W)"));
static EM_UNDERSCORE: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(^|\W)_(\S(?:[^\n]*?\S)?)_($|\W)"));
static HTML_TAG: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"<[^>]*?>"));

fn replace_all(re: &LazyLock<Option<Regex>>, text: &str, rep: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace_all(text, rep).into_owned(),
        None => text.to_string(),
    }
}

/// Replace `[title](url)` links with their title.
pub fn remove_markdown_links(text: &str) -> String {
    replace_all(&MARKDOWN_LINK, text, "${1}")
}

/// Strip inline links (kept as `title (url)`), ATX headers and emphasis markers.
pub fn strip_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let res = replace_all(&INLINE_LINK, text, "${1} (${2})");
    let res = replace_all(&ATX_HEADER, &res, "${1}");
    let res = replace_all(&STRONG_STAR, &res, "${1}");
    let res = replace_all(&EM_STAR, &res, "${1}");
    let res = replace_all(&STRONG_UNDERSCORE, &res, "${1}${2}${3}");
    replace_all(&EM_UNDERSCORE, &res, "${1}${2}${3}")
}

pub fn clean_html_tags(text: &str) -> String {
    replace_all(&HTML_TAG, text, "")
}

/// Unify line endings, turn `<br>` variants into newlines, trim, drop remaining tags.
pub fn normalize_text(text: &str) -> String {
    let text = text
        .replace("\r\n", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
        .replace("<br />", "\n");
    clean_html_tags(text.trim())
}

/// First pattern from `patterns` contained in `text`.
pub fn find_pattern_in_text<'a>(patterns: &[&'a str], text: &str) -> Option<&'a str> {
    patterns.iter().copied().find(|p| text.contains(p))
}
