//! Battle map render library
//!
//! Renderer abstraction and a tiny-skia software renderer used for PNG
//! export.

mod export;
mod glyphs;
mod renderer;
mod software;

pub use export::{ExportOptions, PngRenderResult, encode_png, export_json, export_png, render_png};
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
pub use software::{SoftwareRenderer, to_rgba8};
pub use tiny_skia::Pixmap;
