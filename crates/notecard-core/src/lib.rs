//! Core notecard library: adaptive layout, compositing and the scorecard template.

pub mod assets;
pub mod compose;
pub mod config;
pub mod content;
pub mod error;
pub mod images;
pub mod layout;
pub mod media;
pub mod paint;
pub mod renderer;
pub mod scorecard;
pub mod sizing;
pub mod style;
pub mod text;

pub use compose::RenderResult;
pub use error::{FetchError, RenderError};
pub use renderer::PreviewRenderer;
pub use style::{PreviewStyle, StyleProfile};
