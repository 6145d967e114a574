//! Value types shared between the operator stream and the interpreter.

pub mod objects;
pub mod state;

pub use objects::{FontObject, Glyph, ImageData, ImageKind, TextItem, Viewport};
pub use state::GraphicState;
