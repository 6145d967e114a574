//! Driver facade tests: root document shape, the dependency barrier,
//! and per-page failure isolation.

use bytes::Bytes;

use vellum_core::model::{ImageData, ImageKind, Viewport};
use vellum_core::ops::{OpArg, OpCode, OperatorList};
use vellum_core::store::{ObjectStore, StoreObject};
use vellum_core::utils::MATRIX_IDENTITY;
use vellum_core::{render_page, render_pages, IdCounters, PageTask, RenderError, RenderOptions};

fn empty_page(width: f64, height: f64) -> (OperatorList, Viewport) {
    (OperatorList::new(), Viewport::new(width, height, MATRIX_IDENTITY))
}

#[test]
fn test_root_document_shape() {
    let (list, viewport) = empty_page(612.0, 792.0);
    let doc = render_page(
        &list,
        &viewport,
        &ObjectStore::new(),
        &ObjectStore::new(),
        RenderOptions::default(),
        &IdCounters::new(),
    )
    .unwrap();

    let svg = doc.to_svg_string();
    assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(svg.contains("xmlns:xlink=\"http://www.w3.org/1999/xlink\""));
    assert!(svg.contains("version=\"1.1\""));
    assert!(svg.contains("width=\"612px\""));
    assert!(svg.contains("height=\"792px\""));
    assert!(svg.contains("preserveAspectRatio=\"none\""));
    assert!(svg.contains("viewBox=\"0 0 612 792\""));

    // One defs and one root group.
    let root = doc.root().unwrap();
    let children = doc.children(root);
    assert_eq!(children.len(), 2);
    assert_eq!(doc.name(children[0]), "defs");
    assert_eq!(doc.name(children[1]), "g");
}

#[test]
fn test_root_group_carries_viewport_transform() {
    let list = OperatorList::new();
    let viewport = Viewport::new(100.0, 200.0, (1.0, 0.0, 0.0, -1.0, 0.0, 200.0));
    let doc = render_page(
        &list,
        &viewport,
        &ObjectStore::new(),
        &ObjectStore::new(),
        RenderOptions::default(),
        &IdCounters::new(),
    )
    .unwrap();

    let root = doc.root().unwrap();
    let group = doc.children(root)[1];
    assert_eq!(
        doc.get_attr(group, "transform"),
        Some("matrix(1 0 0 -1 0 200)")
    );
}

#[test]
fn test_invalid_viewport_dimensions() {
    let (list, _) = empty_page(0.0, 0.0);
    let result = render_page(
        &list,
        &Viewport::new(0.0, 100.0, MATRIX_IDENTITY),
        &ObjectStore::new(),
        &ObjectStore::new(),
        RenderOptions::default(),
        &IdCounters::new(),
    );
    assert!(matches!(
        result,
        Err(RenderError::InvalidDimensions { .. })
    ));
}

// ============================================================================
// Dependency barrier
// ============================================================================

#[test]
fn test_missing_dependency_fails_before_interpretation() {
    let mut list = OperatorList::new();
    list.push(
        OpCode::Dependency,
        vec![OpArg::Array(vec![OpArg::Str("img_1".to_string())])],
    );

    let result = render_page(
        &list,
        &Viewport::new(100.0, 100.0, MATRIX_IDENTITY),
        &ObjectStore::new(),
        &ObjectStore::new(),
        RenderOptions::default(),
        &IdCounters::new(),
    );
    match result {
        Err(RenderError::MissingDependency(id)) => assert_eq!(id, "img_1"),
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

#[test]
fn test_satisfied_dependency_renders() {
    let mut list = OperatorList::new();
    list.push(
        OpCode::Dependency,
        vec![OpArg::Array(vec![
            OpArg::Str("img_1".to_string()),
            OpArg::Str("g_font".to_string()),
        ])],
    );

    let mut common = ObjectStore::new();
    common.insert(
        "g_font",
        StoreObject::Font(vellum_core::model::FontObject {
            loaded_name: "g_font".to_string(),
            ..Default::default()
        }),
    );
    let mut page = ObjectStore::new();
    page.insert(
        "img_1",
        StoreObject::Image(ImageData {
            width: 1,
            height: 1,
            kind: ImageKind::Rgb24bpp,
            data: Bytes::from(vec![0u8; 3]),
            bitmap: false,
        }),
    );

    let result = render_page(
        &list,
        &Viewport::new(100.0, 100.0, MATRIX_IDENTITY),
        &common,
        &page,
        RenderOptions::default(),
        &IdCounters::new(),
    );
    assert!(result.is_ok());
}

// ============================================================================
// Multi-page rendering
// ============================================================================

#[test]
fn test_failed_page_does_not_stop_siblings() {
    let mut bad = OperatorList::new();
    bad.push(
        OpCode::SetFillColorN,
        vec![OpArg::Str("Conical".to_string())],
    );
    let good = OperatorList::new();

    let tasks = vec![
        PageTask {
            operator_list: bad,
            viewport: Viewport::new(100.0, 100.0, MATRIX_IDENTITY),
            objects: ObjectStore::new(),
        },
        PageTask {
            operator_list: good,
            viewport: Viewport::new(100.0, 100.0, MATRIX_IDENTITY),
            objects: ObjectStore::new(),
        },
    ];

    let results = render_pages(
        &tasks,
        &ObjectStore::new(),
        RenderOptions::default(),
        &IdCounters::new(),
    );
    assert_eq!(results.len(), 2);
    assert!(results[0].is_err());
    assert!(results[1].is_ok());
}

#[test]
fn test_defs_ids_are_unique_across_pages() {
    let counters = IdCounters::new();
    let make_list = || {
        let mut list = OperatorList::new();
        list.push(
            OpCode::ShadingFill,
            vec![OpArg::Array(vec![
                OpArg::Str("RadialAxial".to_string()),
                OpArg::Str("axial".to_string()),
                OpArg::Null,
                OpArg::Array(vec![]),
                OpArg::Array(vec![OpArg::Num(0.0), OpArg::Num(0.0)]),
                OpArg::Array(vec![OpArg::Num(1.0), OpArg::Num(0.0)]),
            ])],
        );
        list
    };

    let viewport = Viewport::new(10.0, 10.0, MATRIX_IDENTITY);
    let first = render_page(
        &make_list(),
        &viewport,
        &ObjectStore::new(),
        &ObjectStore::new(),
        RenderOptions::default(),
        &counters,
    )
    .unwrap();
    let second = render_page(
        &make_list(),
        &viewport,
        &ObjectStore::new(),
        &ObjectStore::new(),
        RenderOptions::default(),
        &counters,
    )
    .unwrap();

    assert!(first.to_svg_string().contains("id=\"shading0\""));
    assert!(second.to_svg_string().contains("id=\"shading1\""));
}
