//! Image painting operators.

use log::warn;

use crate::dom::{NodeId, XLINK_NS};
use crate::error::Result;
use crate::format::pf;
use crate::image::encode_png;
use crate::interp::SvgPageInterpreter;
use crate::model::ImageData;
use crate::store::StoreObject;

impl<'a> SvgPageInterpreter<'a> {
    /// Emits a 1x1 rect in the current fill color; the transform group
    /// stretches it over the masked region.
    pub fn paint_solid_color_image_mask(&mut self) {
        let fill_color = self.current.fill_color.clone();
        let rect = self.doc.create_element("rect");
        self.doc.set_attr(rect, "x", "0");
        self.doc.set_attr(rect, "y", "0");
        self.doc.set_attr(rect, "width", "1px");
        self.doc.set_attr(rect, "height", "1px");
        self.doc.set_attr(rect, "fill", fill_color);
        let group = self.ensure_transform_group();
        self.doc.append(group, rect);
    }

    /// Resolves a preloaded image object and paints it. An object that
    /// never arrived is skipped with a warning; the dependency barrier
    /// should have preloaded it.
    pub fn paint_image_x_object(&mut self, obj_id: &str) -> Result<()> {
        match self.resolve_object(obj_id).as_deref() {
            Some(StoreObject::Image(image)) => {
                let image = image.clone();
                self.paint_inline_image_x_object(&image, None)
            }
            Some(_) => {
                warn!("paintImageXObject: object {obj_id} is not an image");
                Ok(())
            }
            None => {
                warn!("dependent image {obj_id} is not ready yet");
                Ok(())
            }
        }
    }

    /// Encodes the pixels as a PNG data URL and creates the `<image>`
    /// element, flipped into the PDF's bottom-up coordinate space.
    /// Appends to `mask` when given, else to the transform group.
    pub fn paint_inline_image_x_object(
        &mut self,
        image: &ImageData,
        mask: Option<NodeId>,
    ) -> Result<()> {
        let width = image.width as f64;
        let height = image.height as f64;
        let href = encode_png(image, mask.is_some())?;

        let node = self.doc.create_element("image");
        self.doc.set_attr_ns(node, XLINK_NS, "xlink:href", href);
        self.doc.set_attr(node, "x", "0");
        self.doc.set_attr(node, "y", pf(-height));
        self.doc.set_attr(node, "width", format!("{}px", pf(width)));
        self.doc.set_attr(node, "height", format!("{}px", pf(height)));
        self.doc.set_attr(
            node,
            "transform",
            format!("scale({} {})", pf(1.0 / width), pf(-1.0 / height)),
        );

        match mask {
            Some(mask) => self.doc.append(mask, node),
            None => {
                let group = self.ensure_transform_group();
                self.doc.append(group, node);
            }
        }
        Ok(())
    }

    /// Builds a `<mask>` in `defs` containing the stencil image, and a
    /// rect in the current fill color that references it.
    pub fn paint_image_mask_x_object(&mut self, image: &ImageData) -> Result<()> {
        if image.bitmap {
            warn!("paintImageMaskXObject: bitmap-backed masks are unsupported; skipping");
            return Ok(());
        }

        let fill_color = self.current.fill_color.clone();
        let mask_id = self.counters.next_mask_id();
        self.current.mask_id = mask_id.clone();

        let mask = self.doc.create_element("mask");
        self.doc.set_attr(mask, "id", mask_id.clone());

        let rect = self.doc.create_element("rect");
        self.doc.set_attr(rect, "x", "0");
        self.doc.set_attr(rect, "y", "0");
        self.doc.set_attr(rect, "width", pf(image.width as f64));
        self.doc.set_attr(rect, "height", pf(image.height as f64));
        self.doc.set_attr(rect, "fill", fill_color);
        self.doc.set_attr(rect, "mask", format!("url(#{mask_id})"));

        self.doc.append(self.defs, mask);
        let group = self.ensure_transform_group();
        self.doc.append(group, rect);

        self.paint_inline_image_x_object(image, Some(mask))
    }
}
