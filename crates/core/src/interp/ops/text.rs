//! Text state and text showing operators.
//!
//! Glyph placement accumulates per-character advances in text space;
//! the pending `<tspan>` collects glyph characters and coordinate lists
//! and is attached to a `<text>` only when a `showText` completes.

use log::warn;

use crate::format::{pf, pm};
use crate::interp::SvgPageInterpreter;
use crate::model::state::{text_rendering_mode, DEFAULT_COLOR};
use crate::model::{FontObject, TextItem};
use crate::store::StoreObject;
use crate::utils::{Matrix, FONT_IDENTITY_MATRIX, MATRIX_IDENTITY};

impl<'a> SvgPageInterpreter<'a> {
    /// Resets text and line matrices and opens a fresh text block.
    pub fn begin_text(&mut self) {
        let tspan = self.doc.create_element("tspan");
        let txt = self.doc.create_element("text");

        let current = &mut self.current;
        current.text_matrix = MATRIX_IDENTITY;
        current.line_matrix = MATRIX_IDENTITY;
        current.text_matrix_scale = 1.0;
        current.x = 0.0;
        current.y = 0.0;
        current.line_x = 0.0;
        current.line_y = 0.0;
        current.xcoords.clear();
        current.ycoords.clear();
        current.tspan = Some(tspan);
        current.txt_element = Some(txt);
    }

    /// Accepted no-op: the pending text was already committed by
    /// `showText`, and clip-path rendering modes are out of scope.
    pub fn end_text(&mut self) {}

    pub fn set_char_spacing(&mut self, spacing: f64) {
        self.current.char_spacing = spacing;
    }

    pub fn set_word_spacing(&mut self, spacing: f64) {
        self.current.word_spacing = spacing;
    }

    /// Stores the horizontal scale as a decimal factor.
    pub fn set_h_scale(&mut self, scale: f64) {
        self.current.text_h_scale = scale / 100.0;
    }

    /// Leading is stored negated; `next_line` feeds it straight back to
    /// `move_text`.
    pub fn set_leading(&mut self, leading: f64) {
        self.current.leading = -leading;
    }

    pub fn set_text_rise(&mut self, rise: f64) {
        self.current.text_rise = rise;
    }

    pub fn set_text_rendering_mode(&mut self, mode: i32) {
        self.current.text_rendering_mode = mode;
    }

    /// Advances the text line origin and opens a fresh tspan.
    pub fn move_text(&mut self, x: f64, y: f64) {
        let tspan = self.doc.create_element("tspan");
        let current = &mut self.current;
        current.line_x += x;
        current.line_y += y;
        current.x = current.line_x;
        current.y = current.line_y;
        current.xcoords.clear();
        current.ycoords.clear();
        current.tspan = Some(tspan);
    }

    pub fn set_leading_move_text(&mut self, x: f64, y: f64) {
        self.set_leading(-y);
        self.move_text(x, y);
    }

    /// Stores the text matrix and zeroes the text and line origins.
    pub fn set_text_matrix(&mut self, m: Matrix) {
        let tspan = self.doc.create_element("tspan");
        let current = &mut self.current;
        current.text_matrix = m;
        current.line_matrix = m;
        current.text_matrix_scale = m.0.hypot(m.1);
        current.x = 0.0;
        current.line_x = 0.0;
        current.y = 0.0;
        current.line_y = 0.0;
        current.xcoords.clear();
        current.ycoords.clear();
        current.tspan = Some(tspan);
    }

    pub fn next_line(&mut self) {
        self.move_text(0.0, self.current.leading);
    }

    /// Resolves a font from the document-wide store and derives the
    /// style state from its flags. A negative size flips the writing
    /// direction.
    pub fn set_font(&mut self, name: &str, size: f64) {
        let font = match self.common_objs.get(name).as_deref() {
            Some(StoreObject::Font(font)) => std::sync::Arc::new(font.clone()),
            Some(_) => {
                warn!("setFont: object {name} is not a font");
                return;
            }
            None => {
                warn!("setFont: font {name} is not available");
                return;
            }
        };

        if self.options.embed_fonts
            && !font.missing_file
            && !self.embedded_fonts.contains(&font.loaded_name)
        {
            self.add_font_style(&font);
            self.embedded_fonts.insert(font.loaded_name.clone());
        }

        let weight = if font.black {
            "900"
        } else if font.bold {
            "bold"
        } else {
            "normal"
        };
        let style = if font.italic { "italic" } else { "normal" };

        let mut size = size;
        let direction = if size < 0.0 {
            size = -size;
            -1.0
        } else {
            1.0
        };

        let tspan = self.doc.create_element("tspan");
        let current = &mut self.current;
        current.font_matrix = font.font_matrix.unwrap_or(FONT_IDENTITY_MATRIX);
        current.font_direction = direction;
        current.font_size = size;
        current.font_family = font.loaded_name.clone();
        current.font_weight = weight;
        current.font_style = style;
        current.font = Some(font);
        current.tspan = Some(tspan);
        current.xcoords.clear();
        current.ycoords.clear();
    }

    /// Emits an `@font-face` rule with the font's data URL into the
    /// shared `<style>` under `defs`.
    fn add_font_style(&mut self, font: &FontObject) {
        let Some(data) = font.data.as_ref() else {
            warn!(
                "no font data available for {}; cannot embed",
                font.loaded_name
            );
            return;
        };
        let url = crate::image::font_data_url(data, font.mimetype.as_deref());

        let style = match self.css_style {
            Some(style) => style,
            None => {
                let style = self.doc.create_element("style");
                self.doc.set_attr(style, "type", "text/css");
                self.doc.append(self.defs, style);
                self.css_style = Some(style);
                style
            }
        };
        self.doc.append_text(
            style,
            &format!(
                "@font-face {{ font-family: \"{}\"; src: url({}); }}\n",
                font.loaded_name, url
            ),
        );
    }

    /// Places a glyph run into the pending tspan and commits the
    /// enclosing `<text>` to the current transform group.
    pub fn show_text(&mut self, glyphs: &[TextItem]) {
        let Some(font) = self.current.font.clone() else {
            warn!("showText: no font selected");
            return;
        };
        let font_size = self.current.font_size;
        if font_size == 0.0 {
            return;
        }

        let font_size_scale = self.current.font_size_scale;
        let char_spacing = self.current.char_spacing;
        let word_spacing = self.current.word_spacing;
        let font_direction = self.current.font_direction;
        let text_h_scale = self.current.text_h_scale * font_direction;
        let vertical = font.vertical;
        let spacing_dir: f64 = if vertical { 1.0 } else { -1.0 };
        let default_vmetrics = font.default_vmetrics;
        let width_advance_scale = font_size * self.current.font_matrix.0;

        let tspan = match self.current.tspan {
            Some(tspan) => tspan,
            None => {
                let tspan = self.doc.create_element("tspan");
                self.current.tspan = Some(tspan);
                tspan
            }
        };

        let mut x = 0.0;
        for item in glyphs {
            match item {
                TextItem::WordBreak => {
                    x += font_direction * word_spacing;
                }
                TextItem::Adjust(amount) => {
                    x += spacing_dir * amount * font_size / 1000.0;
                }
                TextItem::Glyph(glyph) => {
                    let spacing =
                        if glyph.is_space { word_spacing } else { 0.0 } + char_spacing;
                    let mut width = glyph.width;
                    let scaled_x;
                    let mut scaled_y = 0.0;

                    if vertical {
                        let vmetric = glyph.vmetric.or(default_vmetrics);
                        let vx = match vmetric {
                            Some(v) => v[1],
                            None => width * 0.5,
                        };
                        let vx = -vx * width_advance_scale;
                        let vy = vmetric.map_or(0.0, |v| v[2]) * width_advance_scale;
                        if let Some(v) = vmetric {
                            width = -v[0];
                        }
                        scaled_x = vx / font_size_scale;
                        scaled_y = (x + vy) / font_size_scale;
                    } else {
                        scaled_x = x / font_size_scale;
                    }

                    if glyph.is_in_font || font.missing_file {
                        self.current.xcoords.push(self.current.x + scaled_x);
                        if vertical {
                            self.current.ycoords.push(-self.current.y + scaled_y);
                        }
                        self.doc.append_text(tspan, &glyph.font_char);
                    }
                    // Glyphs outside the font are dropped but still
                    // advance the pen.

                    let char_width = if vertical {
                        width * width_advance_scale - spacing * font_direction
                    } else {
                        width * width_advance_scale + spacing * font_direction
                    };
                    x += char_width;
                }
            }
        }

        let xcoords = self
            .current
            .xcoords
            .iter()
            .map(|v| pf(*v))
            .collect::<Vec<_>>()
            .join(" ");
        self.doc.set_attr(tspan, "x", xcoords);
        if vertical {
            let ycoords = self
                .current
                .ycoords
                .iter()
                .map(|v| pf(*v))
                .collect::<Vec<_>>()
                .join(" ");
            self.doc.set_attr(tspan, "y", ycoords);
        } else {
            self.doc.set_attr(tspan, "y", pf(-self.current.y));
        }

        if vertical {
            self.current.y -= x;
        } else {
            self.current.x += x * text_h_scale;
        }

        let font_family = self.current.font_family.clone();
        self.doc.set_attr(tspan, "font-family", font_family);
        self.doc
            .set_attr(tspan, "font-size", format!("{}px", pf(font_size)));
        if self.current.font_style != "normal" {
            self.doc
                .set_attr(tspan, "font-style", self.current.font_style);
        }
        if self.current.font_weight != "normal" {
            self.doc
                .set_attr(tspan, "font-weight", self.current.font_weight);
        }

        let fill_stroke_mode =
            self.current.text_rendering_mode & text_rendering_mode::FILL_STROKE_MASK;
        if fill_stroke_mode == text_rendering_mode::FILL
            || fill_stroke_mode == text_rendering_mode::FILL_STROKE
        {
            if self.current.fill_color != DEFAULT_COLOR {
                let fill = self.current.fill_color.clone();
                self.doc.set_attr(tspan, "fill", fill);
            }
            if self.current.fill_alpha < 1.0 {
                self.doc
                    .set_attr(tspan, "fill-opacity", pf(self.current.fill_alpha));
            }
        } else if self.current.text_rendering_mode == text_rendering_mode::ADD_TO_PATH {
            // A clip-path-only mode: the glyphs exist for geometry, not
            // for display.
            self.doc.set_attr(tspan, "fill", "transparent");
        } else {
            self.doc.set_attr(tspan, "fill", "none");
        }
        if fill_stroke_mode == text_rendering_mode::STROKE
            || fill_stroke_mode == text_rendering_mode::FILL_STROKE
        {
            let scale = if self.current.text_matrix_scale == 0.0 {
                1.0
            } else {
                1.0 / self.current.text_matrix_scale
            };
            self.set_stroke_attributes(tspan, scale);
        }

        let mut text_matrix = self.current.text_matrix;
        if self.current.text_rise != 0.0 {
            text_matrix.5 += self.current.text_rise;
        }

        let txt = match self.current.txt_element {
            Some(txt) => txt,
            None => {
                let txt = self.doc.create_element("text");
                self.current.txt_element = Some(txt);
                txt
            }
        };
        self.doc.set_attr(
            txt,
            "transform",
            format!("{} scale({}, -1)", pm(text_matrix), pf(text_h_scale)),
        );
        self.doc
            .set_attr_ns(txt, crate::dom::XML_NS, "xml:space", "preserve");
        self.doc.append(txt, tspan);
        let group = self.ensure_transform_group();
        self.doc.append(group, txt);
    }
}
