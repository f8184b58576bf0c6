//! Render request composition and output formats

pub mod composer;
pub mod output;

pub use composer::{compose, RenderRequest, RequestComposer, HEAD_PREVIEW_ANIMATION, HEAD_PREVIEW_SCALE};
pub use output::{download_filename, AnimatedFormat, OutputFormat, OutputMode};
