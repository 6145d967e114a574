//! PNG emission for `<image>` hrefs.
//!
//! Decoded pixel data is re-encoded as a PNG and embedded as a
//! `data:` URI, the only URL scheme a standalone SVG document can carry.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{RenderError, Result};
use crate::model::{ImageData, ImageKind};

/// Encodes image data as a `data:image/png;base64,...` URL.
///
/// 1-bpp data used as an image mask is bit-inverted: a set sample in a
/// PDF mask means "do not paint", while a white mask pixel in SVG means
/// "show".
pub fn encode_png(image: &ImageData, is_mask: bool) -> Result<String> {
    if image.bitmap {
        return Err(RenderError::UnsupportedBitmapImage);
    }

    let (color, depth) = match image.kind {
        ImageKind::Gray1bpp => (png::ColorType::Grayscale, png::BitDepth::One),
        ImageKind::Rgb24bpp => (png::ColorType::Rgb, png::BitDepth::Eight),
        ImageKind::Rgba32bpp => (png::ColorType::Rgba, png::BitDepth::Eight),
    };

    let pixels = if image.kind == ImageKind::Gray1bpp && is_mask {
        image.data.iter().map(|b| !b).collect()
    } else {
        image.data.to_vec()
    };

    let mut encoded = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut encoded, image.width, image.height);
        encoder.set_color(color);
        encoder.set_depth(depth);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&pixels)?;
    }

    Ok(format!("data:image/png;base64,{}", BASE64.encode(&encoded)))
}

/// Builds a `data:` URL for an embedded font program.
pub fn font_data_url(data: &[u8], mimetype: Option<&str>) -> String {
    format!(
        "data:{};base64,{}",
        mimetype.unwrap_or("font/opentype"),
        BASE64.encode(data)
    )
}
