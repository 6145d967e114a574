//! Gradient and tiling pattern synthesis, plus form XObjects.
//!
//! Shadings become `<linearGradient>`/`<radialGradient>` nodes under
//! `defs`; tiling patterns re-enter the interpreter on their nested
//! operator list with the output canvas and transform swapped out for
//! the duration.

use log::warn;

use crate::error::{RenderError, Result};
use crate::format::{make_hex_color, pf};
use crate::interp::SvgPageInterpreter;
use crate::ops::{op_list_to_tree, OpArg};
use crate::utils::{
    apply_matrix_pt, apply_matrix_rect, invert_matrix, mult_matrix, normalize_rect,
    singular_values, MATRIX_IDENTITY,
};

impl<'a> SvgPageInterpreter<'a> {
    /// `setStrokeColorN`: pattern-valued stroke color.
    pub fn set_stroke_color_n(&mut self, args: &[OpArg]) -> Result<()> {
        if let Some(color) = self.make_color_n_pattern(args)? {
            self.current.stroke_color = color;
        }
        Ok(())
    }

    /// `setFillColorN`: pattern-valued fill color.
    pub fn set_fill_color_n(&mut self, args: &[OpArg]) -> Result<()> {
        if let Some(color) = self.make_color_n_pattern(args)? {
            self.current.fill_color = color;
        }
        Ok(())
    }

    /// `shadingFill`: synthesizes the gradient, then covers the visible
    /// region (the viewport mapped back through the CTM) with a rect
    /// referencing it.
    pub fn shading_fill(&mut self, args: &[OpArg]) -> Result<()> {
        let Some(ir) = args.first().and_then(OpArg::as_array) else {
            return Ok(());
        };
        let Some(fill) = self.make_shading_pattern(ir)? else {
            return Ok(());
        };

        let device = mult_matrix(self.transform_matrix, self.viewport.transform);
        let Some(inverse) = invert_matrix(device) else {
            warn!("shadingFill: singular transform; skipping");
            return Ok(());
        };
        let (x0, y0, x1, y1) = apply_matrix_rect(
            inverse,
            (0.0, 0.0, self.viewport.width, self.viewport.height),
        );

        let rect = self.doc.create_element("rect");
        self.doc.set_attr(rect, "x", pf(x0));
        self.doc.set_attr(rect, "y", pf(y0));
        self.doc.set_attr(rect, "width", pf(x1 - x0));
        self.doc.set_attr(rect, "height", pf(y1 - y0));
        self.doc.set_attr(rect, "fill", fill);
        let group = self.ensure_transform_group();
        self.doc.append(group, rect);
        Ok(())
    }

    /// Dispatches a pattern IR to the tiling or shading synthesizer.
    fn make_color_n_pattern(&mut self, args: &[OpArg]) -> Result<Option<String>> {
        if args.first().and_then(OpArg::as_str) == Some("TilingPattern") {
            return self.make_tiling_pattern(args).map(Some);
        }
        self.make_shading_pattern(args)
    }

    /// Builds a gradient node in `defs` and returns its `url(#...)`
    /// reference.
    ///
    /// Mesh shadings are not supported and yield no color; a `Dummy`
    /// shading renders as a sentinel color; anything else is an input
    /// error.
    pub(crate) fn make_shading_pattern(&mut self, args: &[OpArg]) -> Result<Option<String>> {
        match args.first().and_then(OpArg::as_str) {
            Some("RadialAxial") => {
                let shading_id = self.counters.next_shading_id();
                let subtype = args.get(1).and_then(OpArg::as_str).unwrap_or("");
                let color_stops = args.get(3).and_then(OpArg::as_array).unwrap_or(&[]);
                let p0 = args.get(4).and_then(OpArg::as_point).unwrap_or((0.0, 0.0));
                let p1 = args.get(5).and_then(OpArg::as_point).unwrap_or((0.0, 0.0));
                let r0 = Self::arg_num(args, 6).unwrap_or(0.0);
                let r1 = Self::arg_num(args, 7).unwrap_or(0.0);

                let gradient = match subtype {
                    "axial" => {
                        let gradient = self.doc.create_element("linearGradient");
                        self.doc.set_attr(gradient, "id", shading_id.clone());
                        self.doc
                            .set_attr(gradient, "gradientUnits", "userSpaceOnUse");
                        self.doc.set_attr(gradient, "x1", pf(p0.0));
                        self.doc.set_attr(gradient, "y1", pf(p0.1));
                        self.doc.set_attr(gradient, "x2", pf(p1.0));
                        self.doc.set_attr(gradient, "y2", pf(p1.1));
                        gradient
                    }
                    "radial" => {
                        let gradient = self.doc.create_element("radialGradient");
                        self.doc.set_attr(gradient, "id", shading_id.clone());
                        self.doc
                            .set_attr(gradient, "gradientUnits", "userSpaceOnUse");
                        self.doc.set_attr(gradient, "cx", pf(p1.0));
                        self.doc.set_attr(gradient, "cy", pf(p1.1));
                        self.doc.set_attr(gradient, "r", pf(r1));
                        self.doc.set_attr(gradient, "fx", pf(p0.0));
                        self.doc.set_attr(gradient, "fy", pf(p0.1));
                        self.doc.set_attr(gradient, "fr", pf(r0));
                        gradient
                    }
                    other => {
                        return Err(RenderError::UnknownShadingType(format!(
                            "RadialAxial:{other}"
                        )))
                    }
                };

                let stops: Vec<(f64, String)> = color_stops
                    .iter()
                    .filter_map(|stop| {
                        let pair = stop.as_array()?;
                        let offset = pair.first().and_then(OpArg::as_num)?;
                        let color = pair.get(1).and_then(OpArg::as_str)?;
                        Some((offset, color.to_string()))
                    })
                    .collect();
                for (offset, color) in stops {
                    let stop = self.doc.create_element("stop");
                    self.doc.set_attr(stop, "offset", pf(offset));
                    self.doc.set_attr(stop, "stop-color", color);
                    self.doc.append(gradient, stop);
                }

                self.doc.append(self.defs, gradient);
                Ok(Some(format!("url(#{shading_id})")))
            }
            Some("Mesh") => {
                warn!("pattern Mesh is not supported yet");
                Ok(None)
            }
            Some("Dummy") => Ok(Some("hotpink".to_string())),
            other => Err(RenderError::UnknownShadingType(
                other.unwrap_or("<missing>").to_string(),
            )),
        }
    }

    /// Builds a `<pattern>` in `defs` by recursively rendering the
    /// nested operator list into a detached sub-canvas, then adopting
    /// its content. The output parent, CTM, and fill/stroke colors are
    /// swapped for the recursion and restored on every exit path.
    ///
    /// IR layout: `[_, color, ops, matrix, bbox, xstep, ystep,
    /// paintType]`; the color only applies to uncolored patterns
    /// (paintType 2).
    pub(crate) fn make_tiling_pattern(&mut self, args: &[OpArg]) -> Result<String> {
        let color = args.get(1).and_then(OpArg::as_num_vec);
        let ops = args.get(2).and_then(OpArg::as_ops).cloned();
        let matrix = args
            .get(3)
            .and_then(OpArg::as_matrix)
            .unwrap_or(MATRIX_IDENTITY);
        let bbox = args.get(4).and_then(OpArg::as_rect).unwrap_or_default();
        let xstep = Self::arg_num(args, 5).unwrap_or(0.0);
        let ystep = Self::arg_num(args, 6).unwrap_or(0.0);
        let paint_type = Self::arg_int(args, 7).unwrap_or(1);

        let tiling_id = self.counters.next_shading_id();

        let (x0, y0, x1, y1) = bbox;
        let c0 = apply_matrix_pt(matrix, (x0, y0));
        let c1 = apply_matrix_pt(matrix, (x1, y1));
        let (tx0, ty0, tx1, ty1) = normalize_rect((c0.0, c0.1, c1.0, c1.1));
        let (xscale, yscale) = singular_values(matrix);
        let txstep = xstep * xscale;
        let tystep = ystep * yscale;

        let tiling = self.doc.create_element("pattern");
        self.doc.set_attr(tiling, "id", tiling_id.clone());
        self.doc.set_attr(tiling, "patternUnits", "userSpaceOnUse");
        self.doc.set_attr(tiling, "width", pf(txstep));
        self.doc.set_attr(tiling, "height", pf(tystep));
        self.doc.set_attr(tiling, "x", pf(tx0));
        self.doc.set_attr(tiling, "y", pf(ty0));

        // Swap the canvas for the recursion; restore before propagating
        // any error so a failed pattern never corrupts page state.
        let saved_svg = self.svg;
        let saved_matrix = self.transform_matrix;
        let saved_fill = self.current.fill_color.clone();
        let saved_stroke = self.current.stroke_color.clone();
        // The caller's transform group stays attached; the recursion
        // starts with none so its content lands on the sub-canvas.
        let saved_tgrp = self.tgrp.take();

        let result = (|| -> Result<()> {
            let canvas = self.doc.create_svg(tx1 - tx0, ty1 - ty0, true)?;
            self.svg = canvas;
            self.transform_matrix = matrix;
            if paint_type == 2 {
                let components = color.unwrap_or_default();
                let css = make_hex_color(
                    components.first().copied().unwrap_or(0.0),
                    components.get(1).copied().unwrap_or(0.0),
                    components.get(2).copied().unwrap_or(0.0),
                );
                self.current.fill_color = css.clone();
                self.current.stroke_color = css;
            }
            if let Some(ops) = ops {
                let tree = op_list_to_tree(&ops);
                self.execute_op_tree(&tree)?;
            }
            self.end_transform_group();
            if let Some(child) = self.doc.take_first_child(canvas) {
                self.doc.append(tiling, child);
            }
            Ok(())
        })();

        self.svg = saved_svg;
        self.transform_matrix = saved_matrix;
        self.current.fill_color = saved_fill;
        self.current.stroke_color = saved_stroke;
        self.tgrp = saved_tgrp;
        result?;

        self.doc.append(self.defs, tiling);
        Ok(format!("url(#{tiling_id})"))
    }

    // ========================================================================
    // Form XObjects
    // ========================================================================

    /// Composes the form's matrix into the CTM. The upstream producer
    /// emits the surrounding save/restore pair; no implicit save here.
    pub fn paint_form_x_object_begin(&mut self, args: &[OpArg]) {
        if let Some(matrix) = args.first().and_then(OpArg::as_matrix) {
            self.transform(matrix);
        }
        // args[1], the form bbox, is accepted but not clipped against.
    }

    pub fn paint_form_x_object_end(&mut self) {}
}
