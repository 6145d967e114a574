//! vellum - an SVG rendering back-end for flattened PDF operator
//! streams.
//!
//! Given a viewport and a page's typed operator list, the interpreter
//! reproduces the page as a single standalone SVG tree: paths, text
//! runs with per-glyph placement, images and stencil masks, gradients,
//! and recursively rendered tiling patterns.

pub mod api;
pub mod dom;
pub mod error;
pub mod format;
pub mod image;
pub mod interp;
pub mod model;
pub mod ops;
pub mod store;
pub mod utils;

pub use api::{render_page, render_pages, PageTask};
pub use error::{RenderError, Result};
pub use interp::{IdCounters, RenderOptions, SvgPageInterpreter};
