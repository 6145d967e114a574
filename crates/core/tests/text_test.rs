//! Text emission tests: state machine conventions, glyph placement,
//! and vertical writing.

use vellum_core::dom::{NodeId, SvgDocument};
use vellum_core::interp::{IdCounters, RenderOptions, SvgPageInterpreter};
use vellum_core::model::{FontObject, Glyph, TextItem, Viewport};
use vellum_core::ops::{op_list_to_tree, OpArg, OpCode, OperatorList};
use vellum_core::store::{ObjectStore, StoreObject};
use vellum_core::utils::MATRIX_IDENTITY;

fn font_store(font: FontObject) -> ObjectStore {
    let mut store = ObjectStore::new();
    let name = font.loaded_name.clone();
    store.insert(name, StoreObject::Font(font));
    store
}

fn simple_font(name: &str) -> FontObject {
    FontObject {
        loaded_name: name.to_string(),
        ..FontObject::default()
    }
}

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

fn find_first(doc: &SvgDocument, name: &str) -> Option<NodeId> {
    doc.find_descendant(doc.root()?, name)
}

// ============================================================================
// Boundary behaviors
// ============================================================================

#[test]
fn test_negative_font_size_flips_direction() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.set_font("g_f1", -10.0);
    assert_eq!(interp.current().font_size, 10.0);
    assert_eq!(interp.current().font_direction, -1.0);

    interp.set_font("g_f1", 12.0);
    assert_eq!(interp.current().font_size, 12.0);
    assert_eq!(interp.current().font_direction, 1.0);
}

#[test]
fn test_h_scale_is_stored_as_decimal() {
    let common = ObjectStore::new();
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.set_h_scale(50.0);
    assert_eq!(interp.current().text_h_scale, 0.5);
}

#[test]
fn test_leading_sign_convention() {
    let common = ObjectStore::new();
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_leading(12.0);
    assert_eq!(interp.current().leading, -12.0);

    // nextLine feeds the stored (negated) value straight to moveText.
    interp.next_line();
    assert_eq!(interp.current().y, -12.0);
    interp.next_line();
    assert_eq!(interp.current().y, -24.0);
}

#[test]
fn test_set_leading_move_text() {
    let common = ObjectStore::new();
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    // TD with ty = -14 sets the line advance to move down again.
    interp.set_leading_move_text(0.0, -14.0);
    assert_eq!(interp.current().leading, -14.0);
    assert_eq!(interp.current().y, -14.0);
    interp.next_line();
    assert_eq!(interp.current().y, -28.0);
}

#[test]
fn test_set_text_matrix_resets_origins() {
    let common = ObjectStore::new();
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.move_text(7.0, 9.0);
    interp.set_text_matrix((3.0, 4.0, 0.0, 1.0, 10.0, 20.0));
    assert_eq!(interp.current().x, 0.0);
    assert_eq!(interp.current().y, 0.0);
    assert_eq!(interp.current().text_matrix, (3.0, 4.0, 0.0, 1.0, 10.0, 20.0));
    // hypot(3, 4)
    assert_eq!(interp.current().text_matrix_scale, 5.0);
}

// ============================================================================
// Horizontal text
// ============================================================================

fn glyph(ch: &str, width: f64) -> TextItem {
    TextItem::Glyph(Glyph {
        font_char: ch.to_string(),
        is_space: false,
        is_in_font: true,
        width,
        vmetric: None,
    })
}

#[test]
fn test_show_text_horizontal_advances() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_f1", 10.0);
    interp.show_text(&[glyph("A", 500.0), glyph("B", 500.0)]);

    // Each glyph advances 500 * 10 * 0.001 = 5 units.
    assert!((interp.current().x - 10.0).abs() < 1e-9);

    let doc = interp.into_document();
    let tspan = find_first(&doc, "tspan").unwrap();
    assert_eq!(doc.text(tspan), "AB");
    assert_eq!(doc.get_attr(tspan, "x"), Some("0 5"));
    assert_eq!(doc.get_attr(tspan, "y"), Some("0"));
    assert_eq!(doc.get_attr(tspan, "font-family"), Some("g_f1"));
    assert_eq!(doc.get_attr(tspan, "font-size"), Some("10px"));

    let text = find_first(&doc, "text").unwrap();
    assert_eq!(doc.get_attr(text, "transform"), Some(" scale(1, -1)"));
    assert_eq!(doc.get_attr(text, "xml:space"), Some("preserve"));
}

#[test]
fn test_show_text_word_break_and_adjustment() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_f1", 10.0);
    interp.set_word_spacing(2.0);
    // Horizontal positioning adjustments move against the pen.
    interp.show_text(&[
        glyph("A", 500.0),
        TextItem::Adjust(1000.0),
        glyph("B", 500.0),
        TextItem::WordBreak,
    ]);

    // 5 (glyph) - 10 (adjust) + 5 (glyph) + 2 (word break) = 2.
    assert!((interp.current().x - 2.0).abs() < 1e-9);
}

#[test]
fn test_glyphs_outside_font_advance_but_do_not_render() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_f1", 10.0);
    interp.show_text(&[
        TextItem::Glyph(Glyph {
            font_char: "X".to_string(),
            is_space: false,
            is_in_font: false,
            width: 500.0,
            vmetric: None,
        }),
        glyph("B", 500.0),
    ]);

    assert!((interp.current().x - 10.0).abs() < 1e-9);
    let doc = interp.into_document();
    let tspan = find_first(&doc, "tspan").unwrap();
    assert_eq!(doc.text(tspan), "B");
    // Only the rendered glyph contributed a coordinate.
    assert_eq!(doc.get_attr(tspan, "x"), Some("5"));
}

#[test]
fn test_char_spacing_applies_per_glyph() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_f1", 10.0);
    interp.set_char_spacing(1.5);
    interp.show_text(&[glyph("A", 500.0), glyph("B", 500.0)]);

    assert!((interp.current().x - 13.0).abs() < 1e-9);
}

#[test]
fn test_text_rise_offsets_transform() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_f1", 10.0);
    interp.set_text_matrix((1.0, 0.0, 0.0, 1.0, 0.0, 50.0));
    interp.set_text_rise(5.0);
    interp.show_text(&[glyph("A", 500.0)]);

    let doc = interp.into_document();
    let text = find_first(&doc, "text").unwrap();
    assert_eq!(
        doc.get_attr(text, "transform"),
        Some("translate(0 55) scale(1, -1)")
    );
}

#[test]
fn test_invisible_rendering_mode() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_f1", 10.0);
    interp.set_text_rendering_mode(3);
    interp.show_text(&[glyph("A", 500.0)]);

    let doc = interp.into_document();
    let tspan = find_first(&doc, "tspan").unwrap();
    assert_eq!(doc.get_attr(tspan, "fill"), Some("none"));
}

#[test]
fn test_stroke_rendering_mode_scales_line_width() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_f1", 10.0);
    interp.set_line_width(4.0);
    // Text matrix scale 2 halves the effective stroke width.
    interp.set_text_matrix((2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
    interp.set_text_rendering_mode(1);
    interp.show_text(&[glyph("A", 500.0)]);

    let doc = interp.into_document();
    let tspan = find_first(&doc, "tspan").unwrap();
    assert_eq!(doc.get_attr(tspan, "stroke"), Some("#000000"));
    assert_eq!(doc.get_attr(tspan, "stroke-width"), Some("2px"));
    assert_eq!(doc.get_attr(tspan, "fill"), Some("none"));
}

// ============================================================================
// S4: vertical writing
// ============================================================================

#[test]
fn test_vertical_glyph_placement() {
    let mut font = simple_font("g_fv");
    font.vertical = true;
    let common = font_store(font);
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_fv", 12.0);
    interp.show_text(&[TextItem::Glyph(Glyph {
        font_char: "\u{3042}".to_string(),
        is_space: false,
        is_in_font: true,
        width: 1000.0,
        vmetric: Some([1000.0, 500.0, 880.0]),
    })]);

    let doc = interp.document();
    let tspan = find_first(doc, "tspan").unwrap();
    // vx = -(500 * 0.012) = -6; vy = 880 * 0.012 = 10.56.
    assert_eq!(doc.get_attr(tspan, "x"), Some("-6"));
    assert_eq!(doc.get_attr(tspan, "y"), Some("10.56"));

    // Effective width is -vmetric[0]; the pen moved down by
    // -(width * widthAdvanceScale) = 12.
    assert!((interp.current().y - 12.0).abs() < 1e-9);
}

#[test]
fn test_vertical_glyph_uses_font_default_vmetrics() {
    // A glyph without its own metrics takes the font-level fallback
    // for the origin, offset, and advance alike.
    let mut font = simple_font("g_fv");
    font.vertical = true;
    font.default_vmetrics = Some([1000.0, 500.0, 880.0]);
    let common = font_store(font);
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_fv", 12.0);
    interp.show_text(&[TextItem::Glyph(Glyph {
        font_char: "\u{4e00}".to_string(),
        is_space: false,
        is_in_font: true,
        width: 1000.0,
        vmetric: None,
    })]);

    let doc = interp.document();
    let tspan = find_first(doc, "tspan").unwrap();
    assert_eq!(doc.get_attr(tspan, "x"), Some("-6"));
    assert_eq!(doc.get_attr(tspan, "y"), Some("10.56"));
    assert!((interp.current().y - 12.0).abs() < 1e-9);
}

// ============================================================================
// Fill color side effect
// ============================================================================

#[test]
fn test_set_fill_color_resets_pending_tspan() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_f1", 10.0);
    interp.show_text(&[glyph("A", 500.0)]);
    let first_tspan = interp.current().tspan;

    interp.set_fill_rgb_color(0.0, 0.0, 255.0);
    assert_ne!(interp.current().tspan, first_tspan);
    assert!(interp.current().xcoords.is_empty());

    interp.show_text(&[glyph("B", 500.0)]);
    let doc = interp.into_document();
    let root = doc.root().unwrap();
    let text = doc.find_descendant(root, "text").unwrap();
    // Both runs hang off the same <text>, in separate tspans.
    assert_eq!(doc.child_count(text), 2);
    let second = doc.children(text)[1];
    assert_eq!(doc.get_attr(second, "fill"), Some("#0000ff"));
}

// ============================================================================
// Font embedding
// ============================================================================

#[test]
fn test_embed_fonts_emits_font_face() {
    let mut font = simple_font("g_f1");
    font.data = Some(bytes::Bytes::from_static(b"\x00\x01\x00\x00fake"));
    font.mimetype = Some("font/ttf".to_string());
    let common = font_store(font);
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = SvgPageInterpreter::new(
        Viewport::new(100.0, 100.0, MATRIX_IDENTITY),
        &common,
        &page,
        RenderOptions { embed_fonts: true },
        &counters,
    )
    .unwrap();

    interp.begin_text();
    interp.set_font("g_f1", 10.0);
    // A second selection of the same font must not duplicate the rule.
    interp.set_font("g_f1", 12.0);

    let doc = interp.into_document();
    let style = find_first(&doc, "style").unwrap();
    assert_eq!(doc.get_attr(style, "type"), Some("text/css"));
    let css = doc.text(style);
    assert_eq!(css.matches("@font-face").count(), 1);
    assert!(css.contains("font-family: \"g_f1\""));
    assert!(css.contains("src: url(data:font/ttf;base64,"));
}

#[test]
fn test_embed_fonts_off_by_default() {
    let mut font = simple_font("g_f1");
    font.data = Some(bytes::Bytes::from_static(b"fake"));
    let common = font_store(font);
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    interp.begin_text();
    interp.set_font("g_f1", 10.0);

    let doc = interp.into_document();
    assert!(find_first(&doc, "style").is_none());
}

// ============================================================================
// showText through the operator stream
// ============================================================================

#[test]
fn test_show_text_via_operator_list() {
    let common = font_store(simple_font("g_f1"));
    let page = ObjectStore::new();
    let counters = IdCounters::new();
    let mut interp = interpreter(&common, &page, &counters);

    let mut list = OperatorList::new();
    list.push(OpCode::BeginText, vec![]);
    list.push(
        OpCode::SetFont,
        vec![OpArg::Str("g_f1".to_string()), OpArg::Num(10.0)],
    );
    list.push(OpCode::MoveText, vec![OpArg::Num(20.0), OpArg::Num(30.0)]);
    list.push(
        OpCode::ShowText,
        vec![OpArg::Glyphs(vec![glyph("H", 500.0), glyph("i", 250.0)])],
    );
    list.push(OpCode::EndText, vec![]);
    interp.execute_op_tree(&op_list_to_tree(&list)).unwrap();

    let doc = interp.into_document();
    let tspan = find_first(&doc, "tspan").unwrap();
    assert_eq!(doc.text(tspan), "Hi");
    assert_eq!(doc.get_attr(tspan, "x"), Some("20 25"));
    assert_eq!(doc.get_attr(tspan, "y"), Some("-30"));
}
