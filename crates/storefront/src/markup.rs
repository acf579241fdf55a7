//! Rich-text mini-markup for product descriptions.
//!
//! Descriptions are plain text with embedded media directives:
//!
//! ```text
//! Intro paragraph
//! [[image:https://cdn.example.com/a.png]]
//! More text
//! [[video:https://cdn.example.com/b.mp4]]
//! ```
//!
//! Text between directives is kept verbatim (whitespace and line breaks are
//! rendered with `white-space: pre-wrap`). Empty text produces no segment.

use std::sync::LazyLock;

use regex::Regex;

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(image|video):([^\]]+)\]\]").expect("Invalid regex"));

/// One piece of a parsed description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Paragraph(String),
    Image(String),
    Video(String),
}

impl Segment {
    #[must_use]
    pub const fn is_paragraph(&self) -> bool {
        matches!(self, Self::Paragraph(_))
    }

    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    #[must_use]
    pub const fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }

    /// Paragraph text or media URL.
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::Paragraph(s) | Self::Image(s) | Self::Video(s) => s,
        }
    }
}

/// Split `text` into paragraph and media segments.
#[must_use]
pub fn parse(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in DIRECTIVE_RE.captures_iter(text) {
        let (Some(whole), Some(kind), Some(url)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        push_text(&mut segments, text.get(last..whole.start()).unwrap_or_default());

        let url = url.as_str().trim().to_string();
        segments.push(if kind.as_str() == "video" {
            Segment::Video(url)
        } else {
            Segment::Image(url)
        });
        last = whole.end();
    }

    push_text(&mut segments, text.get(last..).unwrap_or_default());
    segments
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.trim().is_empty() {
        segments.push(Segment::Paragraph(text.to_string()));
    }
}
