//! Normalized content model consumed by the layout stage.

use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod normalize;
mod urls;

pub use normalize::{MAX_CONTENT_CHARS, normalize_note};
pub use urls::{is_media_url, shorten_url};

/// Role tag for a run of runes; selects the draw color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    #[default]
    Normal,
    Link,
    Mention,
    Hashtag,
}

/// A classified rune range inside a [`TextLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub range: Range<usize>,
    pub kind: SpanKind,
}

/// Effective classification of a single rune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuneClass {
    pub kind: SpanKind,
    pub emoji: bool,
    pub highlighted: bool,
}

/// One line of text with its span classifications and overlays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextLine {
    runes: Vec<char>,
    spans: Vec<Span>,
    emoji: Vec<bool>,
    highlighted: Vec<bool>,
}

impl TextLine {
    /// Plain text with every rune classified `Normal`; emoji are detected.
    pub fn plain(text: &str) -> Self {
        let mut line = TextLineBuilder::default();
        line.push(text, SpanKind::Normal, false);
        line.finish()
    }

    /// The whole text classified as a single link.
    pub fn link(text: &str) -> Self {
        let mut line = TextLineBuilder::default();
        line.push(text, SpanKind::Link, false);
        line.finish()
    }

    pub fn runes(&self) -> &[char] {
        &self.runes
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.runes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runes.is_empty()
    }

    pub fn text(&self) -> String {
        self.runes.iter().collect()
    }

    /// Classification of the rune at `index`.
    pub fn class_at(&self, index: usize) -> RuneClass {
        let kind = self
            .span_at(index)
            .map_or(SpanKind::Normal, |span| span.kind);
        RuneClass {
            kind,
            emoji: self.emoji.get(index).copied().unwrap_or(false),
            highlighted: self.highlighted.get(index).copied().unwrap_or(false),
        }
    }

    /// The classified span covering `index`, if any.
    pub fn span_at(&self, index: usize) -> Option<&Span> {
        self.spans.iter().find(|span| span.range.contains(&index))
    }

    /// Keeps only the first `len` runes, clipping spans that cross the cut.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.runes.len() {
            return;
        }
        self.runes.truncate(len);
        self.emoji.truncate(len);
        self.highlighted.truncate(len);
        self.spans.retain(|span| span.range.start < len);
        for span in &mut self.spans {
            span.range.end = span.range.end.min(len);
        }
    }

    /// Marks `range` as highlighted.
    pub fn highlight(&mut self, range: Range<usize>) {
        let end = range.end.min(self.highlighted.len());
        for flag in &mut self.highlighted[range.start.min(end)..end] {
            *flag = true;
        }
    }
}

/// Accumulates classified segments into a [`TextLine`].
#[derive(Debug, Default)]
pub struct TextLineBuilder {
    line: TextLine,
}

impl TextLineBuilder {
    pub fn push(&mut self, text: &str, kind: SpanKind, highlighted: bool) -> &mut Self {
        let start = self.line.runes.len();
        for ch in text.chars() {
            self.line.runes.push(ch);
            self.line.emoji.push(is_emoji(ch));
            self.line.highlighted.push(highlighted);
        }
        let end = self.line.runes.len();
        if kind != SpanKind::Normal && end > start {
            self.line.spans.push(Span {
                range: start..end,
                kind,
            });
        }
        self
    }

    pub fn finish(self) -> TextLine {
        self.line
    }
}

/// One unit of vertical content flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paragraph {
    Text(TextLine),
    Blank,
    Media(MediaRef),
}

impl Paragraph {
    pub fn is_media(&self) -> bool {
        matches!(self, Paragraph::Media(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Paragraph::Blank)
    }

    /// Rune count contributed to content density.
    pub fn rune_count(&self) -> usize {
        match self {
            Paragraph::Text(line) => line.len(),
            Paragraph::Blank => 0,
            Paragraph::Media(media) => media.url.chars().count(),
        }
    }
}

/// Address of an embedded image inside the paragraph flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
}

impl MediaRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Text stand-in used when the image cannot be drawn.
    pub fn fallback_line(&self) -> TextLine {
        TextLine::link(&self.url)
    }
}

/// Where an author's avatar comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Remote(String),
    Inline(Vec<u8>),
}

/// Author identity shown in the bottom bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorBadge {
    pub display_name: String,
    pub avatar: Option<Avatar>,
    pub timestamp: DateTime<Utc>,
}

/// Fully normalized input for the note card path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCard {
    pub paragraphs: Vec<Paragraph>,
    pub author: AuthorBadge,
}

/// Whether `ch` is drawn from the emoji glyph source.
pub fn is_emoji(ch: char) -> bool {
    matches!(
        u32::from(ch),
        0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B50..=0x2B55 | 0x1F1E6..=0x1F1FF | 0xFE0F | 0x200D
    )
}
