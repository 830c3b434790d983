//! HTTP surface: `GET /preview-image/{reference}`.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use notecard_core::{PreviewRenderer, PreviewStyle};
use notecard_core::assets::Assets;
use notecard_core::config::Config;
use notecard_core::media::{HttpImageFetcher, ImageFetcher};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::moderation::Denylist;
use crate::pipeline::render_document;
use crate::source::ContentSource;

/// Extensions accepted after the reference and ignored.
const FAKE_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// Everything a request handler needs, shared read-only across requests.
pub struct AppState<S, F = HttpImageFetcher> {
    pub renderer: PreviewRenderer<F>,
    pub source: S,
    pub denylist: Denylist,
    pub cache_max_age_secs: u64,
    pub brand: String,
}

impl<S: ContentSource> AppState<S> {
    /// Builds the state from config with the HTTP image fetcher.
    pub fn from_config(config: &Config, source: S) -> Result<Self> {
        let fetcher = HttpImageFetcher::new(&config.fetch).context("build image fetcher")?;
        Self::with_fetcher(config, source, fetcher)
    }
}

impl<S: ContentSource, F: ImageFetcher> AppState<S, F> {
    /// Builds the state around any fetcher, parsing the embedded assets once.
    pub fn with_fetcher(config: &Config, source: S, fetcher: F) -> Result<Self> {
        let assets = Assets::embedded().context("load embedded assets")?;
        Ok(Self {
            renderer: PreviewRenderer::new(Arc::new(assets), fetcher),
            source,
            denylist: Denylist::from_config(&config.moderation),
            cache_max_age_secs: config.server.cache_max_age_secs,
            brand: config.scorecard.brand.clone(),
        })
    }
}

pub fn router<S, F>(state: Arc<AppState<S, F>>) -> Router
where
    S: ContentSource + 'static,
    F: ImageFetcher + 'static,
{
    Router::new()
        .route("/preview-image/{reference}", get(preview_image::<S, F>))
        .with_state(state)
}

/// Serves until Ctrl-C, then drains in-flight requests.
pub async fn serve<S, F>(listener: TcpListener, state: Arc<AppState<S, F>>) -> Result<()>
where
    S: ContentSource + 'static,
    F: ImageFetcher + 'static,
{
    let addr = listener.local_addr().context("read listener address")?;
    info!(%addr, "preview server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("serve preview requests")
}

async fn wait_for_shutdown() {
    tokio::signal::ctrl_c().await.ok();
    info!("shutdown requested");
}

#[derive(Debug, Default, Deserialize)]
struct PreviewQuery {
    style: Option<String>,
}

fn strip_fake_extension(reference: &str) -> &str {
    FAKE_EXTENSIONS
        .iter()
        .find_map(|ext| reference.strip_suffix(ext))
        .unwrap_or(reference)
}

/// Query parameter first, then the crawler's user agent.
fn negotiate_style(query: &PreviewQuery, headers: &HeaderMap) -> PreviewStyle {
    if let Some(token) = query.style.as_deref() {
        return PreviewStyle::from_token(Some(token));
    }
    headers
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .and_then(PreviewStyle::from_user_agent)
        .unwrap_or_default()
}

fn plain_text(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

async fn preview_image<S: ContentSource, F: ImageFetcher>(
    State(state): State<Arc<AppState<S, F>>>,
    Path(reference): Path<String>,
    Query(query): Query<PreviewQuery>,
    headers: HeaderMap,
) -> Response {
    let reference = strip_fake_extension(&reference);
    let style = negotiate_style(&query, &headers);

    if state.denylist.is_reference_banned(reference) {
        return plain_text(StatusCode::NOT_FOUND, "content is not allowed".to_string());
    }
    let document = match state.source.resolve(reference).await {
        Ok(Some(document)) => document,
        Ok(None) => {
            return plain_text(StatusCode::NOT_FOUND, format!("content not found: {reference}"));
        }
        Err(err) => {
            let detail = format!("{err:#}");
            warn!(reference, error = %detail, "content lookup failed");
            return plain_text(StatusCode::NOT_FOUND, format!("error fetching content: {err}"));
        }
    };
    if !state.denylist.allows(reference, &document) {
        return plain_text(StatusCode::NOT_FOUND, "content is not allowed".to_string());
    }

    // a dropped handler (client gone) cancels any fetch still in flight
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let rendered = render_document(&state.renderer, &document, style, &state.brand, &cancel).await;
    let result = match rendered {
        Ok(result) => result,
        Err(err) => {
            warn!(reference, style = style.display_name(), error = %err, "render failed");
            return plain_text(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error rendering image: {err}"),
            );
        }
    };

    let overflowed = result.overflowed;
    let png = match result.into_png().await {
        Ok(png) => png,
        Err(err) => {
            warn!(reference, error = %err, "encode failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cache_control = format!("public, max-age={}", state.cache_max_age_secs);
    let cache_control = HeaderValue::from_str(&cache_control)
        .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=604800"));
    info!(
        reference,
        style = style.display_name(),
        overflowed,
        bytes = png.len(),
        "rendered preview"
    );
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CACHE_CONTROL, cache_control),
        ],
        png,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_extensions_are_stripped() {
        assert_eq!(strip_fake_extension("abc.png"), "abc");
        assert_eq!(strip_fake_extension("abc.jpeg"), "abc");
        assert_eq!(strip_fake_extension("abc.jpg"), "abc");
        assert_eq!(strip_fake_extension("abc.gif"), "abc.gif");
        assert_eq!(strip_fake_extension("abc"), "abc");
    }

    #[test]
    fn test_query_style_beats_user_agent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("TelegramBot (like TwitterBot)"),
        );

        let query = PreviewQuery {
            style: Some("FACEBOOK".to_string()),
        };
        assert_eq!(negotiate_style(&query, &headers), PreviewStyle::Facebook);
        assert_eq!(
            negotiate_style(&PreviewQuery::default(), &headers),
            PreviewStyle::Telegram,
        );
        assert_eq!(
            negotiate_style(&PreviewQuery::default(), &HeaderMap::new()),
            PreviewStyle::Default
        );
    }
}
