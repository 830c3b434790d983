//! Public render entry points.
//!
//! Each entry point is wrapped in a fault barrier: a panic anywhere in the
//! pipeline becomes [`RenderError::Panicked`] instead of unwinding into the caller.
//! Fetches are awaited on the calling task; compositing, the scorecard template
//! and PNG encoding run on the blocking pool.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::assets::Assets;
use crate::compose::{RenderResult, compose_note};
use crate::content::{AuthorBadge, NoteCard};
use crate::error::RenderError;
use crate::layout::{FlowMetrics, layout_flow};
use crate::media::{ImageFetcher, load_avatar};
use crate::scorecard::{ScorecardModel, draw_scorecard};
use crate::sizing::effective_font_size;
use crate::style::PreviewStyle;
use crate::text::Palette;

/// Renders preview cards against shared, read-only assets.
///
/// Cheap to share behind an `Arc`; renders never mutate it.
pub struct PreviewRenderer<F> {
    assets: Arc<Assets>,
    fetcher: F,
}

impl<F: ImageFetcher> PreviewRenderer<F> {
    pub fn new(assets: Arc<Assets>, fetcher: F) -> Self {
        Self { assets, fetcher }
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    /// Renders a note card in the given style.
    ///
    /// # Errors
    /// Returns an error if drawing panics or `cancel` fires at a fetch boundary.
    pub async fn render_note(
        &self,
        note: &NoteCard,
        style: PreviewStyle,
        cancel: &CancellationToken,
    ) -> Result<RenderResult, RenderError> {
        AssertUnwindSafe(self.draw_note(note, style, cancel))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(fault("note card", &*payload)))
    }

    async fn draw_note(
        &self,
        note: &NoteCard,
        style: PreviewStyle,
        cancel: &CancellationToken,
    ) -> Result<RenderResult, RenderError> {
        let profile = style.profile();
        let region = profile.text_region_height();
        let font_size = effective_font_size(&note.paragraphs, profile.font_size, region);
        debug!(style = style.display_name(), font_size, "laying out note");

        let metrics = FlowMetrics::new(font_size, profile.text_width(), region);
        let layer = layout_flow(
            &note.paragraphs,
            metrics,
            self.assets.font(),
            &Palette::NOTE,
            &self.fetcher,
            cancel,
        )
        .await?;

        let avatar = load_avatar(&self.fetcher, note.author.avatar.as_ref(), cancel).await?;

        let assets = Arc::clone(&self.assets);
        let author = note.author.clone();
        run_blocking("note card", move || {
            compose_note(&profile, &assets, &layer, &author, avatar.as_ref())
        })
        .await
    }

    /// Renders the fixed-template scorecard.
    ///
    /// # Errors
    /// Returns an error if drawing panics.
    pub async fn render_scorecard(
        &self,
        card: &ScorecardModel,
        author: &AuthorBadge,
        brand: &str,
    ) -> Result<RenderResult, RenderError> {
        let assets = Arc::clone(&self.assets);
        let card = card.clone();
        let player = author.display_name.clone();
        let timestamp = author.timestamp;
        let brand = brand.to_string();
        run_blocking("scorecard", move || {
            let font = assets.font();
            Ok(draw_scorecard(font, &card, &player, &timestamp, &brand))
        })
        .await
    }
}

/// Runs synchronous drawing work on the blocking pool.
///
/// A panic inside `job` comes back as [`RenderError::Panicked`] naming `what`.
///
/// # Errors
/// Returns the job's own error, or a fault if it panicked or was aborted.
pub async fn run_blocking<T, J>(what: &'static str, job: J) -> Result<T, RenderError>
where
    T: Send + 'static,
    J: FnOnce() -> Result<T, RenderError> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(fault(what, &*err.into_panic())),
        // only happens while the runtime shuts down
        Err(_) => Err(RenderError::Cancelled),
    }
}

fn fault(what: &'static str, payload: &(dyn Any + Send)) -> RenderError {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    warn!(what, panic = message, "render fault caught");
    RenderError::Panicked { what }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use image::RgbaImage;

    use super::*;
    use crate::compose::BAR_BACKGROUND;
    use crate::content::{Avatar, MediaRef, Paragraph, TextLine};
    use crate::error::FetchError;

    struct Offline;

    impl ImageFetcher for Offline {
        async fn fetch(&self, _url: &str) -> Result<RgbaImage, FetchError> {
            Err(FetchError::Status(404))
        }
    }

    struct Exploding;

    impl ImageFetcher for Exploding {
        async fn fetch(&self, _url: &str) -> Result<RgbaImage, FetchError> {
            panic!("decoder blew up")
        }
    }

    fn note(paragraphs: Vec<Paragraph>) -> NoteCard {
        NoteCard {
            paragraphs,
            author: AuthorBadge {
                display_name: "fiatjaf".to_string(),
                avatar: None,
                timestamp: Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap(),
            },
        }
    }

    fn renderer<F: ImageFetcher>(fetcher: F) -> PreviewRenderer<F> {
        PreviewRenderer::new(Arc::new(Assets::embedded().unwrap()), fetcher)
    }

    #[tokio::test]
    async fn test_note_matches_style_geometry() {
        let renderer = renderer(Offline);
        let note = note(vec![Paragraph::Text(TextLine::plain("gm"))]);
        for style in [PreviewStyle::Default, PreviewStyle::Facebook] {
            let result = renderer
                .render_note(&note, style, &CancellationToken::new())
                .await
                .unwrap();
            let profile = style.profile();
            assert_eq!(result.image.dimensions(), (profile.width, profile.height));
            assert!(!result.overflowed);
        }
    }

    #[tokio::test]
    async fn test_long_note_reports_overflow() {
        let renderer = renderer(Offline);
        let paragraphs = (0..5)
            .map(|_| Paragraph::Text(TextLine::plain(&"lorem ipsum dolor sit amet ".repeat(6))))
            .collect();
        let result = renderer
            .render_note(
                &note(paragraphs),
                PreviewStyle::Twitter,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(result.overflowed);
    }

    #[tokio::test]
    async fn test_panic_becomes_render_error() {
        let renderer = renderer(Exploding);
        let note = note(vec![Paragraph::Media(MediaRef::new("https://x.example/a.png"))]);
        let err = renderer
            .render_note(&note, PreviewStyle::Default, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Panicked { what: "note card" }));
    }

    #[tokio::test]
    async fn test_cancelled_render_stops() {
        let renderer = renderer(Offline);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let note = note(vec![Paragraph::Media(MediaRef::new("https://x.example/a.png"))]);
        let err = renderer
            .render_note(&note, PreviewStyle::Default, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Cancelled));
    }

    #[tokio::test]
    async fn test_scorecard_entry_point() {
        let renderer = renderer(Offline);
        let author = note(Vec::new()).author;
        let card = ScorecardModel {
            value: 72,
            reference_total: 72,
            ..ScorecardModel::default()
        };
        let result = renderer
            .render_scorecard(&card, &author, "gambit.golf")
            .await
            .unwrap();
        assert_eq!(result.image.dimensions(), (1200, 630));
    }

    #[tokio::test]
    async fn test_remote_avatar_failure_leaves_bar_empty() {
        let renderer = renderer(Offline);
        let mut note = note(vec![Paragraph::Text(TextLine::plain("gm"))]);
        note.author.avatar = Some(Avatar::Remote("https://x.example/me.jpg".to_string()));

        let result = renderer
            .render_note(&note, PreviewStyle::Default, &CancellationToken::new())
            .await
            .unwrap();

        let profile = PreviewStyle::Default.profile();
        let side = profile.bar_height - 20;
        let cx = profile.padding_left + side / 2;
        let cy = profile.bar_top() + 10 + side / 2;
        let center = result.image.get_pixel(cx, cy);
        assert_eq!(center, &BAR_BACKGROUND);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_blocking_jobs_leave_the_runtime_thread() {
        let runtime_thread = std::thread::current().id();
        let job_thread = run_blocking("thread id", || Ok(std::thread::current().id()))
            .await
            .unwrap();
        assert_ne!(job_thread, runtime_thread);
    }

    #[tokio::test]
    async fn test_blocking_panic_becomes_render_error() {
        let err = run_blocking::<(), _>("png encoding", || panic!("encoder blew up"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Panicked { what: "png encoding" }));
    }
}
