//! Graphics state snapshots for the save/restore stack.

use std::sync::Arc;

use crate::dom::NodeId;
use crate::model::FontObject;
use crate::utils::{Matrix, PathSegment, FONT_IDENTITY_MATRIX, MATRIX_IDENTITY};

/// Text rendering modes, PDF Reference table 5.3. Bits 0-1 select
/// fill/stroke/both/invisible; bit 2 adds clip-path semantics.
pub mod text_rendering_mode {
    pub const FILL: i32 = 0;
    pub const STROKE: i32 = 1;
    pub const FILL_STROKE: i32 = 2;
    pub const INVISIBLE: i32 = 3;
    pub const FILL_STROKE_MASK: i32 = 3;
    pub const ADD_TO_PATH: i32 = 7;
}

/// Line cap styles indexed by the PDF integer code.
pub const LINE_CAP_STYLES: [&str; 3] = ["butt", "round", "square"];

/// Line join styles indexed by the PDF integer code.
pub const LINE_JOIN_STYLES: [&str; 3] = ["miter", "round", "bevel"];

/// Default fill/stroke color; attributes equal to it are elided where
/// the output default already matches.
pub const DEFAULT_COLOR: &str = "#000000";

/// One level of graphics state.
///
/// `save` pushes a clone of this record; every mutation afterwards
/// replaces a field of the working copy, so a later `restore` observes
/// the state exactly as it was at the matching `save`.
#[derive(Debug, Clone)]
pub struct GraphicState {
    /// Current user-space point, tracked across text and path operators.
    pub x: f64,
    pub y: f64,
    /// Text line origin, advanced by `moveText`.
    pub line_x: f64,
    pub line_y: f64,

    // Font state.
    pub font: Option<Arc<FontObject>>,
    pub font_matrix: Matrix,
    pub font_size: f64,
    pub font_size_scale: f64,
    pub font_family: String,
    pub font_weight: &'static str,
    pub font_style: &'static str,
    /// +1 normally, -1 after a negative font size.
    pub font_direction: f64,

    // Text state.
    pub text_matrix: Matrix,
    pub line_matrix: Matrix,
    pub text_matrix_scale: f64,
    pub leading: f64,
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// Stored as a decimal factor, not a percentage.
    pub text_h_scale: f64,
    pub text_rise: f64,
    pub text_rendering_mode: i32,

    // In-progress text nodes.
    pub tspan: Option<NodeId>,
    pub txt_element: Option<NodeId>,
    pub xcoords: Vec<f64>,
    pub ycoords: Vec<f64>,

    // Style.
    pub fill_color: String,
    pub stroke_color: String,
    pub fill_alpha: f64,
    pub stroke_alpha: f64,
    pub line_width: f64,
    pub line_cap: &'static str,
    pub line_join: &'static str,
    pub miter_limit: f64,
    pub dash_array: Vec<f64>,
    pub dash_phase: f64,

    // Path state.
    /// The `<path>` node currently being assembled.
    pub path: Option<NodeId>,
    /// User-space segments mirroring the path data, for bounds checks.
    pub path_segments: Vec<PathSegment>,
    /// The node the next fill/stroke decorates.
    pub element: Option<NodeId>,
    pub mask_id: String,
}

impl GraphicState {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            line_x: 0.0,
            line_y: 0.0,
            font: None,
            font_matrix: FONT_IDENTITY_MATRIX,
            font_size: 0.0,
            font_size_scale: 1.0,
            font_family: String::new(),
            font_weight: "normal",
            font_style: "normal",
            font_direction: 1.0,
            text_matrix: MATRIX_IDENTITY,
            line_matrix: MATRIX_IDENTITY,
            text_matrix_scale: 1.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_h_scale: 1.0,
            text_rise: 0.0,
            text_rendering_mode: text_rendering_mode::FILL,
            tspan: None,
            txt_element: None,
            xcoords: Vec::new(),
            ycoords: Vec::new(),
            fill_color: DEFAULT_COLOR.to_string(),
            stroke_color: DEFAULT_COLOR.to_string(),
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            line_width: 1.0,
            line_cap: "butt",
            line_join: "miter",
            miter_limit: 10.0,
            dash_array: Vec::new(),
            dash_phase: 0.0,
            path: None,
            path_segments: Vec::new(),
            element: None,
            mask_id: String::new(),
        }
    }
}

impl Default for GraphicState {
    fn default() -> Self {
        Self::new()
    }
}
