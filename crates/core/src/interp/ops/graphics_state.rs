//! Line style, alpha, and graphics-state-dictionary operators.

use log::warn;

use crate::format::make_hex_color;
use crate::interp::SvgPageInterpreter;
use crate::model::state::{LINE_CAP_STYLES, LINE_JOIN_STYLES};
use crate::ops::OpArg;

impl<'a> SvgPageInterpreter<'a> {
    /// Sets the stroke line width. Non-positive widths keep the last
    /// valid value.
    pub fn set_line_width(&mut self, width: f64) {
        if width > 0.0 {
            self.current.line_width = width;
        }
    }

    /// Sets the line cap style from its PDF integer code.
    pub fn set_line_cap(&mut self, style: i64) {
        if let Some(cap) = LINE_CAP_STYLES.get(style as usize) {
            self.current.line_cap = cap;
        }
    }

    /// Sets the line join style from its PDF integer code.
    pub fn set_line_join(&mut self, style: i64) {
        if let Some(join) = LINE_JOIN_STYLES.get(style as usize) {
            self.current.line_join = join;
        }
    }

    pub fn set_miter_limit(&mut self, limit: f64) {
        self.current.miter_limit = limit;
    }

    pub fn set_dash(&mut self, dash_array: Vec<f64>, dash_phase: f64) {
        self.current.dash_array = dash_array;
        self.current.dash_phase = dash_phase;
    }

    /// Rendering intents do not affect naive RGB output.
    pub fn set_rendering_intent(&mut self) {}

    /// Flatness tolerance has no SVG counterpart.
    pub fn set_flatness(&mut self) {}

    pub fn set_stroke_alpha(&mut self, alpha: f64) {
        self.current.stroke_alpha = alpha;
    }

    pub fn set_fill_alpha(&mut self, alpha: f64) {
        self.current.fill_alpha = alpha;
    }

    pub fn set_stroke_rgb_color(&mut self, r: f64, g: f64, b: f64) {
        self.current.stroke_color = make_hex_color(r, g, b);
    }

    /// Sets the fill color. Also resets the pending tspan and the
    /// per-glyph coordinate buffers so a color change splits text runs.
    pub fn set_fill_rgb_color(&mut self, r: f64, g: f64, b: f64) {
        self.current.fill_color = make_hex_color(r, g, b);
        let tspan = self.doc.create_element("tspan");
        self.current.tspan = Some(tspan);
        self.current.xcoords.clear();
        self.current.ycoords.clear();
    }

    /// Applies a list of (key, value) pairs from an ExtGState
    /// dictionary. Unknown keys are logged and skipped.
    pub fn set_g_state(&mut self, states: &[OpArg]) {
        for entry in states {
            let Some(pair) = entry.as_array() else {
                continue;
            };
            let Some(key) = pair.first().and_then(OpArg::as_str) else {
                continue;
            };
            let value = pair.get(1);
            match key {
                "LW" => {
                    if let Some(w) = value.and_then(OpArg::as_num) {
                        self.set_line_width(w);
                    }
                }
                "LC" => {
                    if let Some(style) = value.and_then(OpArg::as_int) {
                        self.set_line_cap(style);
                    }
                }
                "LJ" => {
                    if let Some(style) = value.and_then(OpArg::as_int) {
                        self.set_line_join(style);
                    }
                }
                "ML" => {
                    if let Some(limit) = value.and_then(OpArg::as_num) {
                        self.set_miter_limit(limit);
                    }
                }
                "D" => {
                    // Value is [[dashes...], phase].
                    if let Some(items) = value.and_then(OpArg::as_array) {
                        let dashes = items.first().and_then(OpArg::as_num_vec);
                        let phase = items.get(1).and_then(OpArg::as_num);
                        if let (Some(dashes), Some(phase)) = (dashes, phase) {
                            self.set_dash(dashes, phase);
                        }
                    }
                }
                "RI" => self.set_rendering_intent(),
                "FL" => self.set_flatness(),
                "Font" => {
                    // Value is [loadedName, size].
                    if let Some(items) = value.and_then(OpArg::as_array) {
                        let name = items.first().and_then(OpArg::as_str);
                        let size = items.get(1).and_then(OpArg::as_num);
                        if let (Some(name), Some(size)) = (name, size) {
                            let name = name.to_string();
                            self.set_font(&name, size);
                        }
                    }
                }
                "CA" => {
                    if let Some(alpha) = value.and_then(OpArg::as_num) {
                        self.set_stroke_alpha(alpha);
                    }
                }
                "ca" => {
                    if let Some(alpha) = value.and_then(OpArg::as_num) {
                        self.set_fill_alpha(alpha);
                    }
                }
                _ => warn!("unknown graphics state parameter: {key}"),
            }
        }
    }
}
