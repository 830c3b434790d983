//! notecard service: content resolution, moderation and the HTTP preview surface.

pub mod logging;
pub mod moderation;
pub mod pipeline;
pub mod server;
pub mod source;
