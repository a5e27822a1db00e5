//! Text helpers shared by the fetch, summarize and render stages.
//!
//! - Character-safe truncation for prompts and log previews
//! - HTML-to-text stripping for provider article bodies
//! - HTML escaping for the email body
//! - File system validation for the optional JSON archive

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::fs as stdfs;
use std::io;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Keep at most `max_chars` characters of `input`, cutting on a char boundary.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Collapse every run of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Strip HTML markup from an article body and return readable plain text.
///
/// All tags are discarded, entities are decoded by the parser, and the
/// contents of `<script>` and `<style>` elements are dropped. Inline markup
/// joins with no separator; block elements are separated by a space so
/// paragraphs don't run together.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for node in fragment.root_element().descendants() {
        if node.value().as_element().is_some_and(|e| is_block(e.name())) {
            out.push(' ');
            continue;
        }
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style"))
        });
        if hidden {
            continue;
        }
        // Text following a closed block element starts a new run
        let after_block = node
            .prev_sibling()
            .and_then(|n| n.value().as_element().map(|e| is_block(e.name())))
            .unwrap_or(false);
        if after_block {
            out.push(' ');
        }
        out.push_str(text);
    }

    collapse_whitespace(&out)
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "br"
            | "div"
            | "li"
            | "ul"
            | "ol"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "tr"
            | "td"
            | "th"
            | "blockquote"
            | "figure"
            | "figcaption"
    )
}

/// Escape text for embedding in HTML element content or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    // Sync probe write keeps the error surface simple
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("⚽⚽⚽", 1), "⚽");
    }

    #[test]
    fn test_strip_html_discards_tags() {
        let html = "<p>Arsenal <strong>beat</strong> Spurs.</p>\n\n<p>It was   close.</p>";
        assert_eq!(strip_html(html), "Arsenal beat Spurs. It was close.");
    }

    #[test]
    fn test_strip_html_keeps_inline_markup_joined() {
        assert_eq!(strip_html("<p>foot<em>ball</em> match</p>"), "football match");
        assert_eq!(
            strip_html("<p><a href=\"https://example.com\">Arsenal</a>'s win</p>"),
            "Arsenal's win"
        );
        assert_eq!(strip_html("<p>Arsenal <b>won</b>.</p><p>Again.</p>"), "Arsenal won. Again.");
    }

    #[test]
    fn test_strip_html_separates_blocks() {
        assert_eq!(strip_html("<h2>Result</h2><p>2-1</p>"), "Result 2-1");
        assert_eq!(strip_html("line one<br>line two"), "line one line two");
        assert_eq!(strip_html("<div>Top</div>tail"), "Top tail");
        assert_eq!(strip_html("<ul><li>Kane</li><li>Saka</li></ul>"), "Kane Saka");
    }

    #[test]
    fn test_strip_html_drops_scripts_and_decodes_entities() {
        let html = "<script>alert('x')</script><style>p{}</style><p>Fish &amp; chips</p>";
        assert_eq!(strip_html(html), "Fish & chips");
    }

    #[test]
    fn test_strip_html_plain_text_passthrough() {
        assert_eq!(strip_html("Just text"), "Just text");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>\"x\" & 'y'</script>"),
            "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let path = nested.to_str().unwrap();
        ensure_writable_dir(path).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
