//! `notecard render`: one document to one PNG, offline from the server.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use notecard::logging;
use notecard::pipeline::render_document;
use notecard::source::ContentDocument;
use notecard_core::assets::Assets;
use notecard_core::config::Config;
use notecard_core::media::HttpImageFetcher;
use notecard_core::{PreviewRenderer, PreviewStyle};
use tokio_util::sync::CancellationToken;

pub async fn run(config: &Config, input: &Path, output: &Path, style: Option<&str>) -> Result<()> {
    let _log_guard = logging::init(&config.logging)?;

    let raw = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("read {}", input.display()))?;
    let document = ContentDocument::from_json(&raw)
        .with_context(|| format!("load {}", input.display()))?;

    let assets = Assets::embedded().context("load embedded assets")?;
    let fetcher = HttpImageFetcher::new(&config.fetch).context("build image fetcher")?;
    let renderer = PreviewRenderer::new(Arc::new(assets), fetcher);

    let style = PreviewStyle::from_token(style);
    let result = render_document(
        &renderer,
        &document,
        style,
        &config.scorecard.brand,
        &CancellationToken::new(),
    )
    .await
    .context("render preview")?;
    let (width, height) = result.image.dimensions();
    let overflowed = result.overflowed;
    let png = result.into_png().await.context("encode preview")?;

    tokio::fs::write(output, &png)
        .await
        .with_context(|| format!("write {}", output.display()))?;

    println!("Wrote {} ({width}x{height})", output.display());
    if overflowed {
        println!("Content did not fit; the card fades out at the bottom.");
    }
    Ok(())
}
