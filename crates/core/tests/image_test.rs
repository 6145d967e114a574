//! PNG encoding and image operator tests.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;

use vellum_core::image::encode_png;
use vellum_core::interp::{IdCounters, RenderOptions, SvgPageInterpreter};
use vellum_core::model::{ImageData, ImageKind, Viewport};
use vellum_core::ops::{op_list_to_tree, OpArg, OpCode, OperatorList};
use vellum_core::store::{ObjectStore, StoreObject};
use vellum_core::utils::MATRIX_IDENTITY;
use vellum_core::RenderError;

fn rgb_image(width: u32, height: u32) -> ImageData {
    let data = vec![0x20u8; (width * height * 3) as usize];
    ImageData {
        width,
        height,
        kind: ImageKind::Rgb24bpp,
        data: Bytes::from(data),
        bitmap: false,
    }
}

fn decode_data_uri(url: &str) -> (png::OutputInfo, Vec<u8>) {
    let encoded = url
        .strip_prefix("data:image/png;base64,")
        .expect("data URI prefix");
    let bytes = BASE64.decode(encoded).unwrap();
    let decoder = png::Decoder::new(bytes.as_slice());
    let mut reader = decoder.read_info().unwrap();
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).unwrap();
    buf.truncate(info.buffer_size());
    (info, buf)
}

// ============================================================================
// encode_png
// ============================================================================

#[test]
fn test_encode_rgb() {
    let url = encode_png(&rgb_image(4, 2), false).unwrap();
    let (info, buf) = decode_data_uri(&url);
    assert_eq!((info.width, info.height), (4, 2));
    assert_eq!(info.color_type, png::ColorType::Rgb);
    assert!(buf.iter().all(|&b| b == 0x20));
}

#[test]
fn test_encode_rgba() {
    let image = ImageData {
        width: 2,
        height: 2,
        kind: ImageKind::Rgba32bpp,
        data: Bytes::from(vec![0xffu8; 16]),
        bitmap: false,
    };
    let url = encode_png(&image, false).unwrap();
    let (info, _) = decode_data_uri(&url);
    assert_eq!(info.color_type, png::ColorType::Rgba);
    assert_eq!(info.bit_depth, png::BitDepth::Eight);
}

#[test]
fn test_encode_gray_1bpp() {
    // 8x1, alternating bits.
    let image = ImageData {
        width: 8,
        height: 1,
        kind: ImageKind::Gray1bpp,
        data: Bytes::from(vec![0b1010_1010u8]),
        bitmap: false,
    };
    let url = encode_png(&image, false).unwrap();
    let (info, buf) = decode_data_uri(&url);
    assert_eq!(info.color_type, png::ColorType::Grayscale);
    assert_eq!(info.bit_depth, png::BitDepth::One);
    assert_eq!(buf[0], 0b1010_1010);
}

#[test]
fn test_encode_mask_inverts_bits() {
    let image = ImageData {
        width: 8,
        height: 1,
        kind: ImageKind::Gray1bpp,
        data: Bytes::from(vec![0b1111_0000u8]),
        bitmap: false,
    };
    let url = encode_png(&image, true).unwrap();
    let (_, buf) = decode_data_uri(&url);
    assert_eq!(buf[0], 0b0000_1111);
}

#[test]
fn test_encode_rejects_bitmap() {
    let mut image = rgb_image(1, 1);
    image.bitmap = true;
    assert!(matches!(
        encode_png(&image, false),
        Err(RenderError::UnsupportedBitmapImage)
    ));
}

// ============================================================================
// Image operators
// ============================================================================

fn interpreter<'a>(
    common: &'a ObjectStore,
    page: &'a ObjectStore,
    counters: &'a IdCounters,
) -> SvgPageInterpreter<'a> {
    SvgPageInterpreter::new(
        Viewport::new(100.0, 100.0, MATRIX_IDENTITY),
        common,
        page,
        RenderOptions::default(),
        counters,
    )
    .unwrap()
}

#[test]
fn test_paint_inline_image() {
    let common = ObjectStore::new();
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    let mut list = OperatorList::new();
    list.push(
        OpCode::PaintInlineImageXObject,
        vec![OpArg::Image(rgb_image(16, 8))],
    );
    interp.execute_op_tree(&op_list_to_tree(&list)).unwrap();

    let doc = interp.into_document();
    let root = doc.root().unwrap();
    let image = doc.find_descendant(root, "image").unwrap();
    assert!(doc
        .get_attr(image, "xlink:href")
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(doc.get_attr(image, "x"), Some("0"));
    assert_eq!(doc.get_attr(image, "y"), Some("-8"));
    assert_eq!(doc.get_attr(image, "width"), Some("16px"));
    assert_eq!(doc.get_attr(image, "height"), Some("8px"));
    assert_eq!(
        doc.get_attr(image, "transform"),
        Some("scale(0.0625 -0.125)")
    );
}

#[test]
fn test_paint_image_x_object_resolves_store() {
    let common = ObjectStore::new();
    let mut page = ObjectStore::new();
    page.insert("img_1", StoreObject::Image(rgb_image(4, 4)));
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    let mut list = OperatorList::new();
    list.push(
        OpCode::PaintImageXObject,
        vec![OpArg::Str("img_1".to_string())],
    );
    interp.execute_op_tree(&op_list_to_tree(&list)).unwrap();

    let doc = interp.into_document();
    assert!(doc.to_svg_string().contains("<image "));
}

#[test]
fn test_missing_image_is_skipped_with_warning() {
    let common = ObjectStore::new();
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    let mut list = OperatorList::new();
    list.push(
        OpCode::PaintImageXObject,
        vec![OpArg::Str("img_gone".to_string())],
    );
    // Skipped, not fatal.
    interp.execute_op_tree(&op_list_to_tree(&list)).unwrap();
    let doc = interp.into_document();
    assert!(!doc.to_svg_string().contains("<image"));
}

#[test]
fn test_image_mask_builds_defs_mask_and_rect() {
    let common = ObjectStore::new();
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    let stencil = ImageData {
        width: 8,
        height: 8,
        kind: ImageKind::Gray1bpp,
        data: Bytes::from(vec![0xffu8; 8]),
        bitmap: false,
    };
    let mut list = OperatorList::new();
    list.push(
        OpCode::SetFillRgbColor,
        vec![OpArg::Num(0.0), OpArg::Num(128.0), OpArg::Num(0.0)],
    );
    list.push(OpCode::PaintImageMaskXObject, vec![OpArg::Image(stencil)]);
    interp.execute_op_tree(&op_list_to_tree(&list)).unwrap();

    let doc = interp.into_document();
    let root = doc.root().unwrap();
    let defs = doc.children(root)[0];
    let mask = doc.find_descendant(defs, "mask").unwrap();
    assert_eq!(doc.get_attr(mask, "id"), Some("mask0"));
    // The stencil image lives inside the mask.
    assert!(doc.find_descendant(mask, "image").is_some());

    let rect = doc.find_descendant(root, "rect").unwrap();
    assert_eq!(doc.get_attr(rect, "fill"), Some("#008000"));
    assert_eq!(doc.get_attr(rect, "mask"), Some("url(#mask0)"));
    assert_eq!(doc.get_attr(rect, "width"), Some("8"));
}

#[test]
fn test_bitmap_mask_is_skipped() {
    let common = ObjectStore::new();
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    let mut stencil = rgb_image(2, 2);
    stencil.bitmap = true;
    let mut list = OperatorList::new();
    list.push(OpCode::PaintImageMaskXObject, vec![OpArg::Image(stencil)]);
    interp.execute_op_tree(&op_list_to_tree(&list)).unwrap();

    let doc = interp.into_document();
    assert!(!doc.to_svg_string().contains("<mask"));
}

#[test]
fn test_solid_color_image_mask() {
    let common = ObjectStore::new();
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    let mut list = OperatorList::new();
    list.push(
        OpCode::SetFillRgbColor,
        vec![OpArg::Num(255.0), OpArg::Num(255.0), OpArg::Num(0.0)],
    );
    list.push(OpCode::PaintSolidColorImageMask, vec![]);
    interp.execute_op_tree(&op_list_to_tree(&list)).unwrap();

    let doc = interp.into_document();
    let root = doc.root().unwrap();
    let rect = doc.find_descendant(root, "rect").unwrap();
    assert_eq!(doc.get_attr(rect, "width"), Some("1px"));
    assert_eq!(doc.get_attr(rect, "height"), Some("1px"));
    assert_eq!(doc.get_attr(rect, "fill"), Some("#ffff00"));
}
