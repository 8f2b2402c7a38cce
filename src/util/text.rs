use std::borrow::Cow;

/// Maximum summary length in characters before the ellipsis is appended.
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Ellipsis string appended to truncated summaries
const ELLIPSIS: &str = "...";

/// Inline tags recognized by [`normalize_summary`] and what they become.
///
/// Block-ish tags turn into a space so adjacent words stay separated;
/// emphasis tags vanish and keep their content.
const TAG_SUBSTITUTIONS: [(&str, &str); 7] = [
    ("<br>", " "),
    ("<p>", " "),
    ("</p>", " "),
    ("<strong>", ""),
    ("</strong>", ""),
    ("<em>", ""),
    ("</em>", ""),
];

/// Turns a raw feed description into a short plain-text summary.
///
/// Only the fixed tag set in `TAG_SUBSTITUTIONS` is recognized. Any other
/// markup passes through verbatim; escaping is the delivery layer's job.
///
/// Steps:
/// 1. Substitute the recognized tags
/// 2. Collapse every whitespace run (newlines included) to one space and trim
/// 3. Truncate to [`SUMMARY_MAX_CHARS`] characters, appending `...` when cut
///
/// # Examples
///
/// ```
/// use habr_relay::util::normalize_summary;
///
/// assert_eq!(normalize_summary("<p>A</p><strong>B</strong>"), "A B");
/// assert_eq!(normalize_summary("  two\n\nlines  "), "two lines");
/// ```
pub fn normalize_summary(raw: &str) -> String {
    let mut text = Cow::Borrowed(raw);
    for (tag, replacement) in TAG_SUBSTITUTIONS {
        if text.contains(tag) {
            text = Cow::Owned(text.replace(tag, replacement));
        }
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, SUMMARY_MAX_CHARS).into_owned()
}

/// Truncates a string to at most `max_chars` characters.
///
/// Counts Unicode scalar values, not bytes, so Cyrillic text is never cut
/// mid-codepoint. When truncation happens the result is `max_chars`
/// characters followed by `...`; otherwise the input is returned borrowed.
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        None => Cow::Borrowed(s),
        Some((cut, _)) => Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS)),
    }
}

/// Escapes text for Telegram's HTML parse mode.
///
/// Covers the five characters with meaning in HTML text and attribute
/// values. Returns borrowed input when nothing needs escaping.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}
