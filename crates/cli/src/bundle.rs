//! The serialized page bundle the upstream operator producer emits.
//!
//! A bundle is a JSON document holding the document-wide object table
//! and, per page, the viewport and the two parallel operator arrays.
//! This module converts it into the core's typed operator model;
//! unknown opcodes and malformed operands are dropped with a warning so
//! one bad operator never takes the page down.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use log::warn;
use serde::Deserialize;
use serde_json::Value;

use vellum_core::error::{RenderError, Result};
use vellum_core::model::{FontObject, Glyph, ImageData, ImageKind, TextItem, Viewport};
use vellum_core::ops::{OpArg, OpCode, OperatorList};
use vellum_core::store::{ObjectStore, StoreObject};
use vellum_core::PageTask;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSpec {
    #[serde(default)]
    pub common_objects: HashMap<String, ObjectSpec>,
    pub pages: Vec<PageSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    pub width: f64,
    pub height: f64,
    /// Base device transform; defaults to the usual y-flip.
    #[serde(default)]
    pub transform: Option<[f64; 6]>,
    pub fn_array: Vec<u16>,
    pub args_array: Vec<Value>,
    #[serde(default)]
    pub objects: HashMap<String, ObjectSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObjectSpec {
    Font(FontSpec),
    Image(ImageSpec),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub loaded_name: String,
    #[serde(default)]
    pub font_matrix: Option<[f64; 6]>,
    #[serde(default)]
    pub vertical: bool,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub black: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub default_v_metrics: Option<[f64; 3]>,
    #[serde(default)]
    pub missing_file: bool,
    /// Base64-encoded font program.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    pub width: u32,
    pub height: u32,
    pub kind: u8,
    /// Base64-encoded packed pixel rows.
    pub data: String,
    #[serde(default)]
    pub bitmap: bool,
}

/// Parses a bundle and converts it into render tasks plus the shared
/// document-wide store.
pub fn parse_document(text: &str) -> Result<(ObjectStore, Vec<PageTask>)> {
    let spec: DocumentSpec =
        serde_json::from_str(text).map_err(|err| RenderError::Bundle(err.to_string()))?;

    let mut common_objs = ObjectStore::new();
    for (id, obj) in spec.common_objects {
        common_objs.insert(id, convert_object(obj)?);
    }

    let mut tasks = Vec::with_capacity(spec.pages.len());
    for page in spec.pages {
        tasks.push(convert_page(page)?);
    }
    Ok((common_objs, tasks))
}

fn convert_page(page: PageSpec) -> Result<PageTask> {
    if page.fn_array.len() != page.args_array.len() {
        return Err(RenderError::Bundle(format!(
            "fnArray has {} entries but argsArray has {}",
            page.fn_array.len(),
            page.args_array.len()
        )));
    }

    let transform = page
        .transform
        .map(|[a, b, c, d, e, f]| (a, b, c, d, e, f))
        .unwrap_or((1.0, 0.0, 0.0, -1.0, 0.0, page.height));
    let viewport = Viewport::new(page.width, page.height, transform);

    let mut objects = ObjectStore::new();
    for (id, obj) in page.objects {
        objects.insert(id, convert_object(obj)?);
    }

    let operator_list = convert_operator_list(&page.fn_array, &page.args_array);
    Ok(PageTask {
        operator_list,
        viewport,
        objects,
    })
}

fn convert_operator_list(fn_array: &[u16], args_array: &[Value]) -> OperatorList {
    let mut list = OperatorList::new();
    for (id, args) in fn_array.iter().zip(args_array) {
        let Some(op) = OpCode::from_id(*id) else {
            warn!("unknown opcode id {id}; skipping");
            continue;
        };
        let values: &[Value] = match args {
            Value::Array(items) => items,
            Value::Null => &[],
            other => {
                warn!("argsArray entry for {} is not an array: {other}", op.name());
                continue;
            }
        };
        list.push(op, convert_args(op, values));
    }
    list
}

/// Converts one operator's raw argument values. Glyph runs and image
/// payloads are positional per opcode; everything else converts
/// structurally.
fn convert_args(op: OpCode, values: &[Value]) -> Vec<OpArg> {
    match op {
        OpCode::ShowText | OpCode::NextLineShowText => values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if i == 0 {
                    convert_glyph_run(v)
                } else {
                    convert_value(v)
                }
            })
            .collect(),
        OpCode::NextLineSetSpacingShowText => values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if i == 2 {
                    convert_glyph_run(v)
                } else {
                    convert_value(v)
                }
            })
            .collect(),
        _ => values.iter().map(convert_value).collect(),
    }
}

fn convert_glyph_run(value: &Value) -> OpArg {
    let Value::Array(items) = value else {
        warn!("glyph run is not an array");
        return OpArg::Glyphs(Vec::new());
    };
    let glyphs = items
        .iter()
        .map(|item| match item {
            Value::Null => TextItem::WordBreak,
            Value::Number(n) => TextItem::Adjust(n.as_f64().unwrap_or(0.0)),
            Value::Object(map) => TextItem::Glyph(Glyph {
                font_char: map
                    .get("fontChar")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                is_space: map.get("isSpace").and_then(Value::as_bool).unwrap_or(false),
                is_in_font: map
                    .get("isInFont")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                width: map.get("width").and_then(Value::as_f64).unwrap_or(0.0),
                vmetric: map.get("vmetric").and_then(|v| {
                    let arr = v.as_array()?;
                    Some([
                        arr.first()?.as_f64()?,
                        arr.get(1)?.as_f64()?,
                        arr.get(2)?.as_f64()?,
                    ])
                }),
            }),
            other => {
                warn!("unrecognized glyph entry: {other}");
                TextItem::WordBreak
            }
        })
        .collect();
    OpArg::Glyphs(glyphs)
}

fn convert_value(value: &Value) -> OpArg {
    match value {
        Value::Null => OpArg::Null,
        Value::Bool(b) => OpArg::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                OpArg::Int(i)
            } else {
                OpArg::Num(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => OpArg::Str(s.clone()),
        Value::Array(items) => OpArg::Array(items.iter().map(convert_value).collect()),
        Value::Object(map) => {
            // Nested operator list (tiling pattern content).
            if map.contains_key("fnArray") {
                let fn_array: Vec<u16> = map
                    .get("fnArray")
                    .and_then(Value::as_array)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|v| v.as_u64().map(|id| id as u16))
                            .collect()
                    })
                    .unwrap_or_default();
                let empty = Vec::new();
                let args_array = map
                    .get("argsArray")
                    .and_then(Value::as_array)
                    .unwrap_or(&empty);
                return OpArg::Ops(convert_operator_list(&fn_array, args_array));
            }
            // Inline image payload.
            if map.contains_key("kind") && map.contains_key("data") {
                match convert_image_value(map) {
                    Ok(image) => return OpArg::Image(image),
                    Err(err) => {
                        warn!("bad inline image payload: {err}");
                        return OpArg::Null;
                    }
                }
            }
            warn!("unrecognized operand object");
            OpArg::Null
        }
    }
}

fn convert_image_value(map: &serde_json::Map<String, Value>) -> Result<ImageData> {
    let width = map
        .get("width")
        .and_then(Value::as_u64)
        .ok_or_else(|| RenderError::Bundle("image missing width".into()))? as u32;
    let height = map
        .get("height")
        .and_then(Value::as_u64)
        .ok_or_else(|| RenderError::Bundle("image missing height".into()))? as u32;
    let kind_id = map
        .get("kind")
        .and_then(Value::as_u64)
        .ok_or_else(|| RenderError::Bundle("image missing kind".into()))? as u8;
    let kind = ImageKind::from_id(kind_id)
        .ok_or_else(|| RenderError::Bundle(format!("unknown image kind {kind_id}")))?;
    let data = map
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| RenderError::Bundle("image missing data".into()))?;
    let data = BASE64
        .decode(data)
        .map_err(|err| RenderError::Bundle(format!("image data is not base64: {err}")))?;
    Ok(ImageData {
        width,
        height,
        kind,
        data: Bytes::from(data),
        bitmap: map
            .get("bitmap")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn convert_object(spec: ObjectSpec) -> Result<StoreObject> {
    match spec {
        ObjectSpec::Font(font) => {
            let data = match font.data {
                Some(encoded) => Some(Bytes::from(BASE64.decode(encoded).map_err(|err| {
                    RenderError::Bundle(format!("font data is not base64: {err}"))
                })?)),
                None => None,
            };
            Ok(StoreObject::Font(FontObject {
                loaded_name: font.loaded_name,
                font_matrix: font.font_matrix.map(|[a, b, c, d, e, f]| (a, b, c, d, e, f)),
                vertical: font.vertical,
                bold: font.bold,
                black: font.black,
                italic: font.italic,
                default_vmetrics: font.default_v_metrics,
                missing_file: font.missing_file,
                data,
                mimetype: font.mimetype,
            }))
        }
        ObjectSpec::Image(image) => {
            let kind = ImageKind::from_id(image.kind).ok_or_else(|| {
                RenderError::Bundle(format!("unknown image kind {}", image.kind))
            })?;
            let data = BASE64
                .decode(image.data)
                .map_err(|err| RenderError::Bundle(format!("image data is not base64: {err}")))?;
            Ok(StoreObject::Image(ImageData {
                width: image.width,
                height: image.height,
                kind,
                data: Bytes::from(data),
                bitmap: image.bitmap,
            }))
        }
    }
}
