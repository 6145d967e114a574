//! Path construction and painting operators.
//!
//! `constructPath` assembles SVG path data from an inner opcode
//! sub-sequence; the paint operators decorate the pending node and
//! commit it through `end_path`, which also suppresses page-sized
//! overlay rectangles.

use log::debug;

use crate::format::pf;
use crate::interp::SvgPageInterpreter;
use crate::ops::OpCode;
use crate::utils::{mult_matrix, path_bbox, PathSegment};

impl<'a> SvgPageInterpreter<'a> {
    /// Builds path data from the inner opcode sequence, maintaining the
    /// current point across sub-paths.
    ///
    /// A sub-sequence that does not open with `rectangle` or `moveTo`
    /// continues the pending path node instead of starting a new one,
    /// preserving multi-sub-path merges before a single paint.
    pub fn construct_path(&mut self, sub_ops: &[OpCode], coords: &[f64]) {
        let mut x = self.current.x;
        let mut y = self.current.y;
        let mut d: Vec<String> = Vec::new();
        let mut segments: Vec<PathSegment> = Vec::new();
        let mut j = 0;

        // Operand under-runs read as zero, like a malformed stream.
        let coord = |i: usize| coords.get(i).copied().unwrap_or(0.0);

        for &op in sub_ops {
            match op {
                OpCode::Rectangle => {
                    x = coord(j);
                    y = coord(j + 1);
                    let width = coord(j + 2);
                    let height = coord(j + 3);
                    j += 4;
                    let xw = x + width;
                    let yh = y + height;
                    d.extend([
                        "M".into(),
                        pf(x),
                        pf(y),
                        "L".into(),
                        pf(xw),
                        pf(y),
                        "L".into(),
                        pf(xw),
                        pf(yh),
                        "L".into(),
                        pf(x),
                        pf(yh),
                        "Z".into(),
                    ]);
                    segments.push(PathSegment::MoveTo(x, y));
                    segments.push(PathSegment::LineTo(xw, y));
                    segments.push(PathSegment::LineTo(xw, yh));
                    segments.push(PathSegment::LineTo(x, yh));
                    segments.push(PathSegment::ClosePath);
                }
                OpCode::MoveTo => {
                    x = coord(j);
                    y = coord(j + 1);
                    j += 2;
                    d.extend(["M".into(), pf(x), pf(y)]);
                    segments.push(PathSegment::MoveTo(x, y));
                }
                OpCode::LineTo => {
                    x = coord(j);
                    y = coord(j + 1);
                    j += 2;
                    d.extend(["L".into(), pf(x), pf(y)]);
                    segments.push(PathSegment::LineTo(x, y));
                }
                OpCode::CurveTo => {
                    let (x1, y1) = (coord(j), coord(j + 1));
                    let (x2, y2) = (coord(j + 2), coord(j + 3));
                    x = coord(j + 4);
                    y = coord(j + 5);
                    j += 6;
                    d.extend([
                        "C".into(),
                        pf(x1),
                        pf(y1),
                        pf(x2),
                        pf(y2),
                        pf(x),
                        pf(y),
                    ]);
                    segments.push(PathSegment::CurveTo(x1, y1, x2, y2, x, y));
                }
                OpCode::CurveTo2 => {
                    // First control point is the current point.
                    let (x2, y2) = (coord(j), coord(j + 1));
                    let (x3, y3) = (coord(j + 2), coord(j + 3));
                    d.extend([
                        "C".into(),
                        pf(x),
                        pf(y),
                        pf(x2),
                        pf(y2),
                        pf(x3),
                        pf(y3),
                    ]);
                    segments.push(PathSegment::CurveTo(x, y, x2, y2, x3, y3));
                    x = x3;
                    y = y3;
                    j += 4;
                }
                OpCode::CurveTo3 => {
                    // Second control point coincides with the endpoint.
                    let (x1, y1) = (coord(j), coord(j + 1));
                    x = coord(j + 2);
                    y = coord(j + 3);
                    j += 4;
                    d.extend([
                        "C".into(),
                        pf(x1),
                        pf(y1),
                        pf(x),
                        pf(y),
                        pf(x),
                        pf(y),
                    ]);
                    segments.push(PathSegment::CurveTo(x1, y1, x, y, x, y));
                }
                OpCode::ClosePath => {
                    d.push("Z".into());
                    segments.push(PathSegment::ClosePath);
                }
                _ => {}
            }
        }

        let d = d.join(" ");
        let continues = !sub_ops.is_empty()
            && !matches!(sub_ops[0], OpCode::Rectangle | OpCode::MoveTo);

        let path = match self.current.path {
            Some(path) if continues => {
                let prev = self.doc.get_attr(path, "d").unwrap_or("").to_string();
                let joined = if prev.is_empty() {
                    d
                } else {
                    format!("{prev} {d}")
                };
                self.doc.set_attr(path, "d", joined);
                path
            }
            _ => {
                let path = self.doc.create_element("path");
                self.doc.set_attr(path, "d", d);
                self.current.path = Some(path);
                self.current.path_segments.clear();
                path
            }
        };

        self.doc.set_attr(path, "fill", "none");
        self.current.element = Some(path);
        self.current.path_segments.extend(segments);
        self.current.x = x;
        self.current.y = y;
    }

    /// Appends a `Z` to the pending path data.
    pub fn close_path(&mut self) {
        if let Some(path) = self.current.path {
            let prev = self.doc.get_attr(path, "d").unwrap_or("").to_string();
            self.doc.set_attr(path, "d", format!("{prev} Z"));
            self.current.path_segments.push(PathSegment::ClosePath);
        }
    }

    /// Commits the pending path into the current transform group, or
    /// drops it when it is a page-sized overlay.
    ///
    /// The overlay heuristic: transform the path through the viewport's
    /// base transform composed with the CTM; if the resulting bounds
    /// cover the whole viewport to within one unit on every side and the
    /// node carries fill or stroke, it is a background rectangle that
    /// would occlude everything already emitted.
    pub fn end_path(&mut self) {
        let Some(path) = self.current.path.take() else {
            return;
        };

        let device = mult_matrix(self.transform_matrix, self.viewport.transform);
        let suppress = match path_bbox(&self.current.path_segments, device) {
            Some((x0, y0, x1, y1)) => {
                x0 <= 1.0
                    && y0 <= 1.0
                    && x1 >= self.viewport.width - 1.0
                    && y1 >= self.viewport.height - 1.0
                    && self.has_paint(path)
            }
            None => false,
        };
        self.current.path_segments.clear();

        if suppress {
            debug!("dropping viewport-covering overlay path");
            return;
        }

        let group = self.ensure_transform_group();
        self.doc.append(group, path);
    }

    fn has_paint(&self, path: crate::dom::NodeId) -> bool {
        let filled = self
            .doc
            .get_attr(path, "fill")
            .is_some_and(|fill| fill != "none");
        filled || self.doc.get_attr(path, "stroke").is_some()
    }

    // ========================================================================
    // Painting
    // ========================================================================

    pub fn fill(&mut self) {
        if let Some(element) = self.current.element {
            let fill_color = self.current.fill_color.clone();
            let fill_alpha = self.current.fill_alpha;
            self.doc.set_attr(element, "fill", fill_color);
            self.doc.set_attr(element, "fill-opacity", pf(fill_alpha));
            self.end_path();
        }
    }

    pub fn stroke(&mut self) {
        if let Some(element) = self.current.element {
            self.set_stroke_attributes(element, 1.0);
            self.doc.set_attr(element, "fill", "none");
            self.end_path();
        }
    }

    pub fn eo_fill(&mut self) {
        if let Some(element) = self.current.element {
            self.doc.set_attr(element, "fill-rule", "evenodd");
        }
        self.fill();
    }

    /// Stroke first: it forces `fill="none"`, which `fill` then
    /// overwrites.
    pub fn fill_stroke(&mut self) {
        self.stroke();
        self.fill();
    }

    pub fn eo_fill_stroke(&mut self) {
        if let Some(element) = self.current.element {
            self.doc.set_attr(element, "fill-rule", "evenodd");
        }
        self.fill_stroke();
    }

    pub fn close_stroke(&mut self) {
        self.close_path();
        self.stroke();
    }

    pub fn close_fill_stroke(&mut self) {
        self.close_path();
        self.fill_stroke();
    }

    pub fn close_eo_fill_stroke(&mut self) {
        self.close_path();
        self.eo_fill_stroke();
    }

    /// Writes the stroke presentation attributes onto `element`.
    /// `line_width_scale` compensates for the text matrix when stroking
    /// glyph outlines.
    pub(crate) fn set_stroke_attributes(
        &mut self,
        element: crate::dom::NodeId,
        line_width_scale: f64,
    ) {
        let stroke_color = self.current.stroke_color.clone();
        let stroke_alpha = self.current.stroke_alpha;
        let miter_limit = self.current.miter_limit;
        let line_cap = self.current.line_cap;
        let line_join = self.current.line_join;
        let line_width = self.current.line_width;
        let dash_phase = self.current.dash_phase;
        let mut dash_array = self.current.dash_array.clone();
        if line_width_scale != 1.0 && !dash_array.is_empty() {
            for value in &mut dash_array {
                *value *= line_width_scale;
            }
        }

        self.doc.set_attr(element, "stroke", stroke_color);
        self.doc.set_attr(element, "stroke-opacity", pf(stroke_alpha));
        self.doc
            .set_attr(element, "stroke-miterlimit", pf(miter_limit));
        self.doc.set_attr(element, "stroke-linecap", line_cap);
        self.doc.set_attr(element, "stroke-linejoin", line_join);
        self.doc.set_attr(
            element,
            "stroke-width",
            format!("{}px", pf(line_width_scale * line_width)),
        );
        self.doc.set_attr(
            element,
            "stroke-dasharray",
            dash_array
                .iter()
                .map(|v| pf(*v))
                .collect::<Vec<_>>()
                .join(" "),
        );
        self.doc.set_attr(
            element,
            "stroke-dashoffset",
            format!("{}px", pf(line_width_scale * dash_phase)),
        );
    }
}
