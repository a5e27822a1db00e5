//! Email body rendering.
//!
//! Both variants share the same layout: a header block, then one block per
//! summary with its title, summary text and link. An empty digest renders
//! a "no news" placeholder instead of an empty section.
//!
//! Rendering is pure: the same digest always produces the same bytes.

use crate::models::SummaryRecord;
use crate::utils::escape_html;
use clap::ValueEnum;
use std::fmt::Write;

pub const SUBJECT: &str = "Your AI Sports News Roundup";
pub const HEADING: &str = "🏟️ Your AI-Powered Sports News Roundup";
pub const NO_NEWS: &str = "No sports news today.";

/// Body format of the outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BodyFormat {
    Plain,
    Html,
}

impl BodyFormat {
    pub fn render(self, digest: &[SummaryRecord]) -> String {
        match self {
            BodyFormat::Plain => render_plain(digest),
            BodyFormat::Html => render_html(digest),
        }
    }
}

/// Render the digest as plain text.
pub fn render_plain(digest: &[SummaryRecord]) -> String {
    let mut body = String::new();
    writeln!(body, "{HEADING}\n").unwrap();

    if digest.is_empty() {
        writeln!(body, "{NO_NEWS}").unwrap();
        return body;
    }

    for record in digest {
        writeln!(body, "🏈 Title: {}", record.title).unwrap();
        writeln!(body, "📝 Summary: {}", record.summary).unwrap();
        writeln!(body, "🔗 Read more: {}\n", record.url).unwrap();
    }
    body
}

/// Render the digest as an HTML document.
///
/// Titles, summaries and links are escaped, so record content can't inject
/// markup.
pub fn render_html(digest: &[SummaryRecord]) -> String {
    let mut body = String::new();
    writeln!(body, "<!DOCTYPE html>").unwrap();
    writeln!(body, "<html>").unwrap();
    writeln!(body, "<head><meta charset=\"utf-8\"><title>{SUBJECT}</title></head>").unwrap();
    writeln!(
        body,
        "<body style=\"font-family: Arial, Helvetica, sans-serif; max-width: 640px;\">"
    )
    .unwrap();
    writeln!(body, "<h1>{HEADING}</h1>").unwrap();

    if digest.is_empty() {
        writeln!(body, "<div class=\"placeholder\"><p>{NO_NEWS}</p></div>").unwrap();
    }

    for record in digest {
        writeln!(body, "<div class=\"article\">").unwrap();
        writeln!(body, "<h2>{}</h2>", escape_html(&record.title)).unwrap();
        writeln!(body, "<p>{}</p>", escape_html(&record.summary)).unwrap();
        writeln!(
            body,
            "<p><a href=\"{}\">Read more</a></p>",
            escape_html(&record.url)
        )
        .unwrap();
        writeln!(body, "</div>").unwrap();
    }

    writeln!(body, "</body>").unwrap();
    writeln!(body, "</html>").unwrap();
    body
}
