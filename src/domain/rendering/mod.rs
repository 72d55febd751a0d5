//! Rendering domain — the Renderer Adapter's (C6) binary artifact.

mod rendered_document;

pub use rendered_document::{RenderStatus, RenderedBlockCounts, RenderedDocument};
