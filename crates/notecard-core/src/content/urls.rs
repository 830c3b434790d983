use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static MEDIA_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://\S+\.(?:png|jpe?g|gif|webp)(?:\?\S*)?$")
        .expect("media url pattern is valid")
});

/// Display budget for a shortened link, not counting the ellipsis.
const SHORT_URL_CHARS: usize = 26;

/// Whether `text` is a lone address of an embeddable image.
pub fn is_media_url(text: &str) -> bool {
    MEDIA_URL_RE.is_match(text.trim())
}

/// Shortens a link for display: scheme and `www.` dropped, long tails cut.
///
/// Media links are returned untouched because they still need fetching.
pub fn shorten_url(raw: &str) -> String {
    if is_media_url(raw) {
        return raw.to_string();
    }
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return raw.to_string();
    };

    let host = host.strip_prefix("www.").unwrap_or(host);
    let mut display = host.to_string();
    let path = parsed.path().trim_end_matches('/');
    display.push_str(path);
    if let Some(query) = parsed.query() {
        display.push('?');
        display.push_str(query);
    }

    if display.chars().count() > SHORT_URL_CHARS {
        let mut cut: String = display.chars().take(SHORT_URL_CHARS).collect();
        cut.push('…');
        cut
    } else {
        display
    }
}
