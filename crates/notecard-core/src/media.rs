//! Remote image fetching for embedded media and avatars.
//!
//! Every fetch is bounded by its own timeout and returns a `Result` that the
//! caller pattern-matches into "draw" or "fall back". Nothing here retries.

use std::future::Future;
use std::time::Duration;

use image::RgbaImage;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::config::FetchConfig;
use crate::content::Avatar;
use crate::error::{FetchError, RenderError};
use crate::images::decode_image;

/// Loads a decoded image from an address.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<RgbaImage, FetchError>> + Send;
}

/// HTTP(S) fetcher with a per-request timeout and body size cap.
#[derive(Clone)]
pub struct HttpImageFetcher {
    http: reqwest::Client,
    timeout: Duration,
    max_bytes: u64,
}

impl HttpImageFetcher {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            timeout: config.timeout(),
            max_bytes: config.max_bytes,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(FetchError::TooLarge { limit: self.max_bytes });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(FetchError::TooLarge { limit: self.max_bytes });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Request(err)
        }
    }
}

impl std::fmt::Debug for HttpImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageFetcher")
            .field("timeout", &self.timeout)
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<RgbaImage, FetchError> {
        let parsed = parse_remote_url(url)?;
        let body = self.download(parsed).await?;
        sniff_image(&body)?;
        decode_image(&body).map_err(FetchError::Decode)
    }
}

fn parse_remote_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|e| FetchError::Address(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::Address(format!("scheme {other} is not fetched"))),
    }
}

/// Rejects bodies whose magic bytes are not a known image format.
fn sniff_image(body: &[u8]) -> Result<(), FetchError> {
    if infer::is_image(body) {
        return Ok(());
    }
    let kind = infer::get(body).map_or("unknown", |t| t.mime_type());
    Err(FetchError::NotAnImage(kind.to_string()))
}

/// Runs one fetch unless the render is cancelled first.
///
/// The outer error means "stop rendering"; the inner one is the fetch's own
/// outcome, which the caller recovers from.
pub async fn fetch_at_boundary<F: ImageFetcher>(
    fetcher: &F,
    url: &str,
    cancel: &CancellationToken,
) -> Result<Result<RgbaImage, FetchError>, RenderError> {
    if cancel.is_cancelled() {
        return Err(RenderError::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(RenderError::Cancelled),
        fetched = fetcher.fetch(url) => Ok(fetched),
    }
}

/// Resolves an avatar to a bitmap; any failure omits it.
pub async fn load_avatar<F: ImageFetcher>(
    fetcher: &F,
    avatar: Option<&Avatar>,
    cancel: &CancellationToken,
) -> Result<Option<RgbaImage>, RenderError> {
    let loaded = match avatar {
        None => return Ok(None),
        Some(Avatar::Inline(bytes)) => decode_image(bytes).map_err(FetchError::Decode),
        Some(Avatar::Remote(url)) => fetch_at_boundary(fetcher, url, cancel).await?,
    };

    match loaded {
        Ok(image) => Ok(Some(image)),
        Err(err) => {
            debug!(error = %err, "avatar omitted");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::encode_png;

    struct Never;

    impl ImageFetcher for Never {
        async fn fetch(&self, _url: &str) -> Result<RgbaImage, FetchError> {
            std::future::pending().await
        }
    }

    struct Missing;

    impl ImageFetcher for Missing {
        async fn fetch(&self, _url: &str) -> Result<RgbaImage, FetchError> {
            Err(FetchError::Status(404))
        }
    }

    #[test]
    fn test_only_http_schemes_are_fetched() {
        assert!(parse_remote_url("https://example.com/a.png").is_ok());
        assert!(parse_remote_url("http://example.com/a.png").is_ok());
        assert!(matches!(parse_remote_url("file:///etc/passwd"), Err(FetchError::Address(_))));
        assert!(matches!(parse_remote_url("not a url"), Err(FetchError::Address(_))));
    }

    #[test]
    fn test_sniff_rejects_html() {
        let err = sniff_image(b"<!doctype html><html></html>").unwrap_err();
        assert!(matches!(err, FetchError::NotAnImage(_)));
        let png = encode_png(&RgbaImage::new(2, 2)).unwrap();
        assert!(sniff_image(&png).is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_fetch() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = fetch_at_boundary(&Never, "https://example.com/a.png", &cancel).await;
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_fetch() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let result = fetch_at_boundary(&Never, "https://example.com/a.png", &cancel).await;
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    #[tokio::test]
    async fn test_inline_avatar_decodes_without_fetching() {
        let png = encode_png(&RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 255]))).unwrap();
        let avatar = Avatar::Inline(png);
        let loaded = load_avatar(&Never, Some(&avatar), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(loaded.map(|img| img.dimensions()), Some((4, 4)));
    }

    #[tokio::test]
    async fn test_failed_remote_avatar_is_omitted() {
        let avatar = Avatar::Remote("https://example.com/me.jpg".to_string());
        let loaded = load_avatar(&Missing, Some(&avatar), &CancellationToken::new())
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_broken_inline_avatar_is_omitted() {
        let avatar = Avatar::Inline(b"garbage".to_vec());
        let loaded = load_avatar(&Never, Some(&avatar), &CancellationToken::new())
            .await
            .unwrap();
        assert!(loaded.is_none());
    }
}
