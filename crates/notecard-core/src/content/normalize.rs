//! Raw note text to paragraph flow.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::urls::{is_media_url, shorten_url};
use super::{MediaRef, Paragraph, SpanKind, TextLineBuilder};

/// Content beyond this many characters is dropped before layout.
pub const MAX_CONTENT_CHARS: usize = 650;

/// Prefix drawn in front of quoted lines.
const QUOTE_BLOCK: &str = "| ";

static MULTI_NEWLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n+").expect("newline pattern is valid"));

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("code pattern is valid"));

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<url>https?://[^\s]+)",
        r"|(?P<mention>nostr:n(?:pub|profile)1[0-9a-z]+|@[\p{L}\p{N}_][\p{L}\p{N}_.\-]*)",
        r"|(?P<tag>#[\p{L}\p{N}_]+)",
    ))
    .expect("token pattern is valid")
});

/// Turns raw note text into classified paragraphs ready for layout.
pub fn normalize_note(raw: &str) -> Vec<Paragraph> {
    let cleaned = clean_whitespace(raw);
    let mut budget = MAX_CONTENT_CHARS;
    let mut paragraphs = Vec::new();

    for (index, line) in cleaned.split('\n').enumerate() {
        if index > 0 {
            // the newline itself counts against the budget
            if budget == 0 {
                break;
            }
            budget -= 1;
        }

        let paragraph = classify_line(line);
        let cost = paragraph.rune_count();
        if cost <= budget {
            budget -= cost;
            paragraphs.push(paragraph);
            continue;
        }

        if let Paragraph::Text(mut text) = paragraph {
            text.truncate(budget);
            if !text.is_empty() {
                paragraphs.push(Paragraph::Text(text));
            }
        }
        break;
    }

    paragraphs
}

fn clean_whitespace(raw: &str) -> String {
    let content = raw.replace("\r\n", "\n");
    let content = MULTI_NEWLINE_RE.replace_all(&content, "\n\n");
    let content = content.replace('\t', "  ").replace('\r', "");
    content.trim_matches('\n').to_string()
}

fn classify_line(line: &str) -> Paragraph {
    if line.is_empty() {
        return Paragraph::Blank;
    }
    if is_media_url(line) {
        return Paragraph::Media(MediaRef::new(line.trim()));
    }

    let mut builder = TextLineBuilder::default();
    if let Some(quoted) = line.strip_prefix('>') {
        builder.push(QUOTE_BLOCK, SpanKind::Normal, true);
        classify_inline(quoted.trim_start(), &mut builder, true);
    } else {
        classify_inline(line, &mut builder, false);
    }
    Paragraph::Text(builder.finish())
}

/// Splits out backtick code spans, which are highlighted and never tokenized.
fn classify_inline(text: &str, builder: &mut TextLineBuilder, highlighted: bool) {
    let mut cursor = 0;
    for caps in CODE_RE.captures_iter(text) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        classify_tokens(&text[cursor..whole.start()], builder, highlighted);
        builder.push(code.as_str(), SpanKind::Normal, true);
        cursor = whole.end();
    }
    classify_tokens(&text[cursor..], builder, highlighted);
}

fn classify_tokens(text: &str, builder: &mut TextLineBuilder, highlighted: bool) {
    let mut cursor = 0;
    for caps in TOKEN_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        // `a@b.com` and `C#` are not mentions or hashtags
        let glued = text[..whole.start()]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);
        let kind = token_kind(&caps);
        if glued && kind != SpanKind::Link {
            continue;
        }

        let token = trim_trailing_punctuation(whole.as_str(), kind);
        builder.push(&text[cursor..whole.start()], SpanKind::Normal, highlighted);
        if kind == SpanKind::Link {
            builder.push(&shorten_url(token), kind, highlighted);
        } else {
            builder.push(token, kind, highlighted);
        }
        cursor = whole.start() + token.len();
    }
    builder.push(&text[cursor..], SpanKind::Normal, highlighted);
}

fn token_kind(caps: &Captures<'_>) -> SpanKind {
    if caps.name("url").is_some() {
        SpanKind::Link
    } else if caps.name("mention").is_some() {
        SpanKind::Mention
    } else {
        SpanKind::Hashtag
    }
}

fn trim_trailing_punctuation(token: &str, kind: SpanKind) -> &str {
    match kind {
        SpanKind::Link => token.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '"', '\'']),
        SpanKind::Mention => token.trim_end_matches(['.', '-']),
        SpanKind::Hashtag | SpanKind::Normal => token,
    }
}
