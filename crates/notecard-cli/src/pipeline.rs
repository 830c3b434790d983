//! Document to bitmap, shared by the server and the `render` command.

use notecard_core::content::{NoteCard, normalize_note};
use notecard_core::media::ImageFetcher;
use notecard_core::{PreviewRenderer, PreviewStyle, RenderError, RenderResult};
use tokio_util::sync::CancellationToken;

use crate::source::{ContentBody, ContentDocument};

/// Renders a document through the path its kind selects.
///
/// The style only applies to notes; scorecards have one fixed layout.
pub async fn render_document<F: ImageFetcher>(
    renderer: &PreviewRenderer<F>,
    document: &ContentDocument,
    style: PreviewStyle,
    brand: &str,
    cancel: &CancellationToken,
) -> Result<RenderResult, RenderError> {
    match &document.body {
        ContentBody::Note { content } => {
            let note = NoteCard {
                paragraphs: normalize_note(content),
                author: document.author_badge(),
            };
            renderer.render_note(&note, style, cancel).await
        }
        ContentBody::Scorecard { scorecard } => {
            renderer
                .render_scorecard(scorecard, &document.author_badge(), brand)
                .await
        }
    }
}
