//! The SVG page interpreter.
//!
//! A stateful machine that walks the flattened operator tree, maintains
//! the PDF-style graphics state stacks, and appends SVG nodes to the
//! output document. Save/restore levels map onto the transform-group
//! lifecycle: content is emitted into a lazily created `<g>` carrying
//! the current CTM, and the group is torn down whenever the CTM changes.

use std::collections::HashSet;
use std::sync::Arc;

use log::warn;

use crate::dom::{NodeId, SvgDocument};
use crate::error::{RenderError, Result};
use crate::format::pm;
use crate::model::{GraphicState, Viewport};
use crate::ops::{OpArg, OpCode, OpTreeNode};
use crate::store::{self, ObjectStore, StoreObject};
use crate::utils::{mult_matrix, Matrix, MATRIX_IDENTITY};

use super::{IdCounters, RenderOptions};

/// Interprets one page's operator tree into an SVG document.
pub struct SvgPageInterpreter<'a> {
    /// Working graphics state; save pushes a clone of it.
    pub(crate) current: GraphicState,
    /// CTM accumulated since page start, excluding the viewport's base
    /// transform.
    pub(crate) transform_matrix: Matrix,
    pub(crate) transform_stack: Vec<Matrix>,
    pub(crate) extra_stack: Vec<GraphicState>,
    pub(crate) doc: SvgDocument,
    /// Current output parent: the root group, or a pattern sub-canvas
    /// during tiling.
    pub(crate) svg: NodeId,
    pub(crate) defs: NodeId,
    /// The current transform group, created lazily on first emission.
    pub(crate) tgrp: Option<NodeId>,
    pub(crate) viewport: Viewport,
    pub(crate) common_objs: &'a ObjectStore,
    pub(crate) page_objs: &'a ObjectStore,
    pub(crate) counters: &'a IdCounters,
    pub(crate) options: RenderOptions,
    pub(crate) embedded_fonts: HashSet<String>,
    pub(crate) css_style: Option<NodeId>,
}

impl<'a> SvgPageInterpreter<'a> {
    /// Creates an interpreter with a fresh root SVG: one `<defs>` and
    /// one root `<g>` carrying the viewport transform.
    pub fn new(
        viewport: Viewport,
        common_objs: &'a ObjectStore,
        page_objs: &'a ObjectStore,
        options: RenderOptions,
        counters: &'a IdCounters,
    ) -> Result<Self> {
        let mut doc = SvgDocument::new();
        let root = doc.create_svg(viewport.width, viewport.height, false)?;
        doc.set_root(root);

        let defs = doc.create_element("defs");
        doc.append(root, defs);

        let root_group = doc.create_element("g");
        doc.set_attr(root_group, "transform", pm(viewport.transform));
        doc.append(root, root_group);

        Ok(Self {
            current: GraphicState::new(),
            transform_matrix: MATRIX_IDENTITY,
            transform_stack: Vec::new(),
            extra_stack: Vec::new(),
            doc,
            svg: root_group,
            defs,
            tgrp: None,
            viewport,
            common_objs,
            page_objs,
            counters,
            options,
            embedded_fonts: HashSet::new(),
            css_style: None,
        })
    }

    /// Consumes the interpreter, yielding the finished document.
    pub fn into_document(self) -> SvgDocument {
        self.doc
    }

    pub fn document(&self) -> &SvgDocument {
        &self.doc
    }

    pub fn current(&self) -> &GraphicState {
        &self.current
    }

    pub fn transform_matrix(&self) -> Matrix {
        self.transform_matrix
    }

    /// Depths of the paired CTM and graphics-state stacks.
    pub fn stack_depths(&self) -> (usize, usize) {
        (self.transform_stack.len(), self.extra_stack.len())
    }

    pub fn defs_node(&self) -> NodeId {
        self.defs
    }

    pub fn output_parent(&self) -> NodeId {
        self.svg
    }

    pub fn transform_group(&self) -> Option<NodeId> {
        self.tgrp
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Executes a flattened operator tree in stream order. `Group`
    /// nodes are evaluated depth-first inside a save/restore pair.
    pub fn execute_op_tree(&mut self, nodes: &[OpTreeNode]) -> Result<()> {
        for node in nodes {
            let args = node.args.as_slice();
            match node.op {
                // Dependencies are preloaded by the driver's barrier.
                OpCode::Dependency => {}

                // Graphics state.
                OpCode::Save => self.save(),
                OpCode::Restore => self.restore()?,
                OpCode::Transform => {
                    if let Some(m) = Self::arg_matrix6(args) {
                        self.transform(m);
                    }
                }
                OpCode::SetLineWidth => {
                    if let Some(w) = Self::arg_num(args, 0) {
                        self.set_line_width(w);
                    }
                }
                OpCode::SetLineCap => {
                    if let Some(style) = Self::arg_int(args, 0) {
                        self.set_line_cap(style);
                    }
                }
                OpCode::SetLineJoin => {
                    if let Some(style) = Self::arg_int(args, 0) {
                        self.set_line_join(style);
                    }
                }
                OpCode::SetMiterLimit => {
                    if let Some(limit) = Self::arg_num(args, 0) {
                        self.set_miter_limit(limit);
                    }
                }
                OpCode::SetDash => {
                    let dashes = args.first().and_then(OpArg::as_num_vec);
                    let phase = Self::arg_num(args, 1);
                    if let (Some(dashes), Some(phase)) = (dashes, phase) {
                        self.set_dash(dashes, phase);
                    }
                }
                OpCode::SetRenderingIntent => self.set_rendering_intent(),
                OpCode::SetFlatness => self.set_flatness(),
                OpCode::SetGState => {
                    if let Some(states) = args.first().and_then(OpArg::as_array) {
                        self.set_g_state(states);
                    }
                }

                // Path construction and painting.
                OpCode::ConstructPath => {
                    let sub_ops: Option<Vec<OpCode>> =
                        args.first().and_then(OpArg::as_array).map(|items| {
                            items
                                .iter()
                                .filter_map(|v| {
                                    v.as_int().and_then(|id| OpCode::from_id(id as u16))
                                })
                                .collect()
                        });
                    let coords = args.get(1).and_then(OpArg::as_num_vec);
                    if let (Some(sub_ops), Some(coords)) = (sub_ops, coords) {
                        self.construct_path(&sub_ops, &coords);
                    }
                }
                OpCode::ClosePath => self.close_path(),
                OpCode::Stroke => self.stroke(),
                OpCode::CloseStroke => self.close_stroke(),
                OpCode::Fill => self.fill(),
                OpCode::EoFill => self.eo_fill(),
                OpCode::FillStroke => self.fill_stroke(),
                OpCode::EoFillStroke => self.eo_fill_stroke(),
                OpCode::CloseFillStroke => self.close_fill_stroke(),
                OpCode::CloseEoFillStroke => self.close_eo_fill_stroke(),
                OpCode::EndPath => self.end_path(),

                // Clipping is not rendered; the operators are accepted.
                OpCode::Clip | OpCode::EoClip => {}

                // Text.
                OpCode::BeginText => self.begin_text(),
                OpCode::EndText => self.end_text(),
                OpCode::SetCharSpacing => {
                    if let Some(v) = Self::arg_num(args, 0) {
                        self.set_char_spacing(v);
                    }
                }
                OpCode::SetWordSpacing => {
                    if let Some(v) = Self::arg_num(args, 0) {
                        self.set_word_spacing(v);
                    }
                }
                OpCode::SetHScale => {
                    if let Some(v) = Self::arg_num(args, 0) {
                        self.set_h_scale(v);
                    }
                }
                OpCode::SetLeading => {
                    if let Some(v) = Self::arg_num(args, 0) {
                        self.set_leading(v);
                    }
                }
                OpCode::SetFont => {
                    if let (Some(name), Some(size)) =
                        (Self::arg_str(args, 0), Self::arg_num(args, 1))
                    {
                        self.set_font(name, size);
                    }
                }
                OpCode::SetTextRenderingMode => {
                    if let Some(mode) = Self::arg_int(args, 0) {
                        self.set_text_rendering_mode(mode as i32);
                    }
                }
                OpCode::SetTextRise => {
                    if let Some(v) = Self::arg_num(args, 0) {
                        self.set_text_rise(v);
                    }
                }
                OpCode::MoveText => {
                    if let (Some(x), Some(y)) = (Self::arg_num(args, 0), Self::arg_num(args, 1)) {
                        self.move_text(x, y);
                    }
                }
                OpCode::SetLeadingMoveText => {
                    if let (Some(x), Some(y)) = (Self::arg_num(args, 0), Self::arg_num(args, 1)) {
                        self.set_leading_move_text(x, y);
                    }
                }
                OpCode::SetTextMatrix => {
                    if let Some(m) = Self::arg_matrix6(args) {
                        self.set_text_matrix(m);
                    }
                }
                OpCode::NextLine => self.next_line(),
                OpCode::ShowText => {
                    if let Some(glyphs) = args.first().and_then(OpArg::as_glyphs) {
                        self.show_text(glyphs);
                    }
                }
                OpCode::NextLineShowText => {
                    if let Some(glyphs) = args.first().and_then(OpArg::as_glyphs) {
                        self.next_line();
                        self.show_text(glyphs);
                    }
                }
                OpCode::NextLineSetSpacingShowText => {
                    let word = Self::arg_num(args, 0);
                    let char_sp = Self::arg_num(args, 1);
                    let glyphs = args.get(2).and_then(OpArg::as_glyphs);
                    if let (Some(word), Some(char_sp), Some(glyphs)) = (word, char_sp, glyphs) {
                        self.set_word_spacing(word);
                        self.set_char_spacing(char_sp);
                        self.next_line();
                        self.show_text(glyphs);
                    }
                }

                // Color.
                OpCode::SetStrokeRgbColor => {
                    if let Some([r, g, b]) = Self::arg_rgb(args) {
                        self.set_stroke_rgb_color(r, g, b);
                    }
                }
                OpCode::SetFillRgbColor => {
                    if let Some([r, g, b]) = Self::arg_rgb(args) {
                        self.set_fill_rgb_color(r, g, b);
                    }
                }
                OpCode::SetStrokeColorN => self.set_stroke_color_n(args)?,
                OpCode::SetFillColorN => self.set_fill_color_n(args)?,
                OpCode::ShadingFill => self.shading_fill(args)?,

                // Images.
                OpCode::PaintSolidColorImageMask => self.paint_solid_color_image_mask(),
                OpCode::PaintImageXObject => {
                    if let Some(id) = Self::arg_str(args, 0) {
                        self.paint_image_x_object(id)?;
                    }
                }
                OpCode::PaintInlineImageXObject => {
                    if let Some(image) = args.first().and_then(OpArg::as_image) {
                        self.paint_inline_image_x_object(image, None)?;
                    }
                }
                OpCode::PaintImageMaskXObject => {
                    if let Some(image) = args.first().and_then(OpArg::as_image) {
                        self.paint_image_mask_x_object(image)?;
                    }
                }

                // Form XObjects.
                OpCode::PaintFormXObjectBegin => self.paint_form_x_object_begin(args),
                OpCode::PaintFormXObjectEnd => self.paint_form_x_object_end(),

                // Marked content and compatibility sections carry no
                // rendering semantics.
                OpCode::MarkPoint
                | OpCode::MarkPointProps
                | OpCode::BeginMarkedContent
                | OpCode::BeginMarkedContentProps
                | OpCode::EndMarkedContent
                | OpCode::BeginCompat
                | OpCode::EndCompat => {}

                OpCode::Group => self.group(&node.items)?,

                other => warn!("unimplemented operator: {}", other.name()),
            }
        }
        Ok(())
    }

    /// Evaluates a flattened save..restore range depth-first.
    fn group(&mut self, items: &[OpTreeNode]) -> Result<()> {
        self.save();
        self.execute_op_tree(items)?;
        self.restore()
    }

    // ========================================================================
    // Save / restore / transform
    // ========================================================================

    /// Pushes the CTM and a snapshot of the graphics state.
    pub fn save(&mut self) {
        self.transform_stack.push(self.transform_matrix);
        self.extra_stack.push(self.current.clone());
    }

    /// Pops both stacks and tears down the current transform group.
    pub fn restore(&mut self) -> Result<()> {
        let matrix = self
            .transform_stack
            .pop()
            .ok_or(RenderError::StackUnderflow("restore"))?;
        let state = self
            .extra_stack
            .pop()
            .ok_or(RenderError::StackUnderflow("restore"))?;
        self.transform_matrix = matrix;
        self.current = state;
        self.end_transform_group();
        Ok(())
    }

    /// Right-composes a matrix onto the CTM. The next emission then
    /// opens a fresh transform group at the new CTM.
    pub fn transform(&mut self, m: Matrix) {
        self.transform_matrix = mult_matrix(m, self.transform_matrix);
        self.end_transform_group();
    }

    /// Returns the transform group for the current CTM, creating and
    /// attaching it on first use.
    pub(crate) fn ensure_transform_group(&mut self) -> NodeId {
        if let Some(id) = self.tgrp {
            return id;
        }
        let group = self.doc.create_element("g");
        self.doc
            .set_attr(group, "transform", pm(self.transform_matrix));
        self.doc.append(self.svg, group);
        self.tgrp = Some(group);
        group
    }

    /// Drops the cached transform group, removing it from the output if
    /// nothing was emitted into it.
    pub(crate) fn end_transform_group(&mut self) {
        if let Some(id) = self.tgrp.take() {
            if self.doc.child_count(id) == 0 {
                self.doc.remove_child(self.svg, id);
            }
        }
    }

    // ========================================================================
    // Object resolution
    // ========================================================================

    /// Resolves an object id against the store its prefix selects.
    pub(crate) fn resolve_object(&self, id: &str) -> Option<Arc<StoreObject>> {
        store::lookup(id, self.common_objs, self.page_objs)
    }

    // ========================================================================
    // Operand helpers
    // ========================================================================

    pub(crate) fn arg_num(args: &[OpArg], index: usize) -> Option<f64> {
        args.get(index).and_then(OpArg::as_num)
    }

    pub(crate) fn arg_int(args: &[OpArg], index: usize) -> Option<i64> {
        args.get(index).and_then(OpArg::as_int)
    }

    pub(crate) fn arg_str(args: &[OpArg], index: usize) -> Option<&str> {
        args.get(index).and_then(OpArg::as_str)
    }

    /// Six scalar operands as a matrix.
    pub(crate) fn arg_matrix6(args: &[OpArg]) -> Option<Matrix> {
        Some((
            Self::arg_num(args, 0)?,
            Self::arg_num(args, 1)?,
            Self::arg_num(args, 2)?,
            Self::arg_num(args, 3)?,
            Self::arg_num(args, 4)?,
            Self::arg_num(args, 5)?,
        ))
    }

    /// Three scalar operands as RGB components.
    pub(crate) fn arg_rgb(args: &[OpArg]) -> Option<[f64; 3]> {
        Some([
            Self::arg_num(args, 0)?,
            Self::arg_num(args, 1)?,
            Self::arg_num(args, 2)?,
        ])
    }
}
