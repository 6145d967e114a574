//! Operator stream model: stable opcode ids, operand values, the
//! parallel-array operator list, and the save/restore flattener.
//!
//! Opcode ids are part of the external interface and are never
//! renumbered. Id 1 is `dependency`; id 92 is the synthetic `group`
//! emitted only by the flattener.

use log::warn;

use crate::model::{ImageData, TextItem};
use crate::utils::Matrix;

/// Opcode ids for the flattened operator stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum OpCode {
    Dependency = 1,
    SetLineWidth = 2,
    SetLineCap = 3,
    SetLineJoin = 4,
    SetMiterLimit = 5,
    SetDash = 6,
    SetRenderingIntent = 7,
    SetFlatness = 8,
    SetGState = 9,
    Save = 10,
    Restore = 11,
    Transform = 12,
    MoveTo = 13,
    LineTo = 14,
    CurveTo = 15,
    CurveTo2 = 16,
    CurveTo3 = 17,
    ClosePath = 18,
    Rectangle = 19,
    Stroke = 20,
    CloseStroke = 21,
    Fill = 22,
    EoFill = 23,
    FillStroke = 24,
    EoFillStroke = 25,
    CloseFillStroke = 26,
    CloseEoFillStroke = 27,
    EndPath = 28,
    Clip = 29,
    EoClip = 30,
    BeginText = 31,
    EndText = 32,
    SetCharSpacing = 33,
    SetWordSpacing = 34,
    SetHScale = 35,
    SetLeading = 36,
    SetFont = 37,
    SetTextRenderingMode = 38,
    SetTextRise = 39,
    MoveText = 40,
    SetLeadingMoveText = 41,
    SetTextMatrix = 42,
    NextLine = 43,
    ShowText = 44,
    ShowSpacedText = 45,
    NextLineShowText = 46,
    NextLineSetSpacingShowText = 47,
    SetCharWidth = 48,
    SetCharWidthAndBounds = 49,
    SetStrokeColorSpace = 50,
    SetFillColorSpace = 51,
    SetStrokeColor = 52,
    SetStrokeColorN = 53,
    SetFillColor = 54,
    SetFillColorN = 55,
    SetStrokeGray = 56,
    SetFillGray = 57,
    SetStrokeRgbColor = 58,
    SetFillRgbColor = 59,
    SetStrokeCmykColor = 60,
    SetFillCmykColor = 61,
    ShadingFill = 62,
    BeginInlineImage = 63,
    BeginImageData = 64,
    EndInlineImage = 65,
    PaintXObject = 66,
    MarkPoint = 67,
    MarkPointProps = 68,
    BeginMarkedContent = 69,
    BeginMarkedContentProps = 70,
    EndMarkedContent = 71,
    BeginCompat = 72,
    EndCompat = 73,
    PaintFormXObjectBegin = 74,
    PaintFormXObjectEnd = 75,
    BeginGroup = 76,
    EndGroup = 77,
    PaintJpegXObject = 82,
    PaintImageMaskXObject = 83,
    PaintImageMaskXObjectGroup = 84,
    PaintImageXObject = 85,
    PaintInlineImageXObject = 86,
    PaintInlineImageXObjectGroup = 87,
    PaintImageXObjectRepeat = 88,
    PaintImageMaskXObjectRepeat = 89,
    PaintSolidColorImageMask = 90,
    ConstructPath = 91,
    /// Synthetic: a flattened save..restore range with its children.
    Group = 92,
}

impl OpCode {
    /// Resolves a stable numeric id to its opcode.
    pub fn from_id(id: u16) -> Option<Self> {
        use OpCode::*;
        Some(match id {
            1 => Dependency,
            2 => SetLineWidth,
            3 => SetLineCap,
            4 => SetLineJoin,
            5 => SetMiterLimit,
            6 => SetDash,
            7 => SetRenderingIntent,
            8 => SetFlatness,
            9 => SetGState,
            10 => Save,
            11 => Restore,
            12 => Transform,
            13 => MoveTo,
            14 => LineTo,
            15 => CurveTo,
            16 => CurveTo2,
            17 => CurveTo3,
            18 => ClosePath,
            19 => Rectangle,
            20 => Stroke,
            21 => CloseStroke,
            22 => Fill,
            23 => EoFill,
            24 => FillStroke,
            25 => EoFillStroke,
            26 => CloseFillStroke,
            27 => CloseEoFillStroke,
            28 => EndPath,
            29 => Clip,
            30 => EoClip,
            31 => BeginText,
            32 => EndText,
            33 => SetCharSpacing,
            34 => SetWordSpacing,
            35 => SetHScale,
            36 => SetLeading,
            37 => SetFont,
            38 => SetTextRenderingMode,
            39 => SetTextRise,
            40 => MoveText,
            41 => SetLeadingMoveText,
            42 => SetTextMatrix,
            43 => NextLine,
            44 => ShowText,
            45 => ShowSpacedText,
            46 => NextLineShowText,
            47 => NextLineSetSpacingShowText,
            48 => SetCharWidth,
            49 => SetCharWidthAndBounds,
            50 => SetStrokeColorSpace,
            51 => SetFillColorSpace,
            52 => SetStrokeColor,
            53 => SetStrokeColorN,
            54 => SetFillColor,
            55 => SetFillColorN,
            56 => SetStrokeGray,
            57 => SetFillGray,
            58 => SetStrokeRgbColor,
            59 => SetFillRgbColor,
            60 => SetStrokeCmykColor,
            61 => SetFillCmykColor,
            62 => ShadingFill,
            63 => BeginInlineImage,
            64 => BeginImageData,
            65 => EndInlineImage,
            66 => PaintXObject,
            67 => MarkPoint,
            68 => MarkPointProps,
            69 => BeginMarkedContent,
            70 => BeginMarkedContentProps,
            71 => EndMarkedContent,
            72 => BeginCompat,
            73 => EndCompat,
            74 => PaintFormXObjectBegin,
            75 => PaintFormXObjectEnd,
            76 => BeginGroup,
            77 => EndGroup,
            82 => PaintJpegXObject,
            83 => PaintImageMaskXObject,
            84 => PaintImageMaskXObjectGroup,
            85 => PaintImageXObject,
            86 => PaintInlineImageXObject,
            87 => PaintInlineImageXObjectGroup,
            88 => PaintImageXObjectRepeat,
            89 => PaintImageMaskXObjectRepeat,
            90 => PaintSolidColorImageMask,
            91 => ConstructPath,
            92 => Group,
            _ => return None,
        })
    }

    /// The opcode's stable numeric id.
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Operator name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Dependency => "dependency",
            OpCode::SetLineWidth => "setLineWidth",
            OpCode::SetLineCap => "setLineCap",
            OpCode::SetLineJoin => "setLineJoin",
            OpCode::SetMiterLimit => "setMiterLimit",
            OpCode::SetDash => "setDash",
            OpCode::SetRenderingIntent => "setRenderingIntent",
            OpCode::SetFlatness => "setFlatness",
            OpCode::SetGState => "setGState",
            OpCode::Save => "save",
            OpCode::Restore => "restore",
            OpCode::Transform => "transform",
            OpCode::MoveTo => "moveTo",
            OpCode::LineTo => "lineTo",
            OpCode::CurveTo => "curveTo",
            OpCode::CurveTo2 => "curveTo2",
            OpCode::CurveTo3 => "curveTo3",
            OpCode::ClosePath => "closePath",
            OpCode::Rectangle => "rectangle",
            OpCode::Stroke => "stroke",
            OpCode::CloseStroke => "closeStroke",
            OpCode::Fill => "fill",
            OpCode::EoFill => "eoFill",
            OpCode::FillStroke => "fillStroke",
            OpCode::EoFillStroke => "eoFillStroke",
            OpCode::CloseFillStroke => "closeFillStroke",
            OpCode::CloseEoFillStroke => "closeEOFillStroke",
            OpCode::EndPath => "endPath",
            OpCode::Clip => "clip",
            OpCode::EoClip => "eoClip",
            OpCode::BeginText => "beginText",
            OpCode::EndText => "endText",
            OpCode::SetCharSpacing => "setCharSpacing",
            OpCode::SetWordSpacing => "setWordSpacing",
            OpCode::SetHScale => "setHScale",
            OpCode::SetLeading => "setLeading",
            OpCode::SetFont => "setFont",
            OpCode::SetTextRenderingMode => "setTextRenderingMode",
            OpCode::SetTextRise => "setTextRise",
            OpCode::MoveText => "moveText",
            OpCode::SetLeadingMoveText => "setLeadingMoveText",
            OpCode::SetTextMatrix => "setTextMatrix",
            OpCode::NextLine => "nextLine",
            OpCode::ShowText => "showText",
            OpCode::ShowSpacedText => "showSpacedText",
            OpCode::NextLineShowText => "nextLineShowText",
            OpCode::NextLineSetSpacingShowText => "nextLineSetSpacingShowText",
            OpCode::SetCharWidth => "setCharWidth",
            OpCode::SetCharWidthAndBounds => "setCharWidthAndBounds",
            OpCode::SetStrokeColorSpace => "setStrokeColorSpace",
            OpCode::SetFillColorSpace => "setFillColorSpace",
            OpCode::SetStrokeColor => "setStrokeColor",
            OpCode::SetStrokeColorN => "setStrokeColorN",
            OpCode::SetFillColor => "setFillColor",
            OpCode::SetFillColorN => "setFillColorN",
            OpCode::SetStrokeGray => "setStrokeGray",
            OpCode::SetFillGray => "setFillGray",
            OpCode::SetStrokeRgbColor => "setStrokeRGBColor",
            OpCode::SetFillRgbColor => "setFillRGBColor",
            OpCode::SetStrokeCmykColor => "setStrokeCMYKColor",
            OpCode::SetFillCmykColor => "setFillCMYKColor",
            OpCode::ShadingFill => "shadingFill",
            OpCode::BeginInlineImage => "beginInlineImage",
            OpCode::BeginImageData => "beginImageData",
            OpCode::EndInlineImage => "endInlineImage",
            OpCode::PaintXObject => "paintXObject",
            OpCode::MarkPoint => "markPoint",
            OpCode::MarkPointProps => "markPointProps",
            OpCode::BeginMarkedContent => "beginMarkedContent",
            OpCode::BeginMarkedContentProps => "beginMarkedContentProps",
            OpCode::EndMarkedContent => "endMarkedContent",
            OpCode::BeginCompat => "beginCompat",
            OpCode::EndCompat => "endCompat",
            OpCode::PaintFormXObjectBegin => "paintFormXObjectBegin",
            OpCode::PaintFormXObjectEnd => "paintFormXObjectEnd",
            OpCode::BeginGroup => "beginGroup",
            OpCode::EndGroup => "endGroup",
            OpCode::PaintJpegXObject => "paintJpegXObject",
            OpCode::PaintImageMaskXObject => "paintImageMaskXObject",
            OpCode::PaintImageMaskXObjectGroup => "paintImageMaskXObjectGroup",
            OpCode::PaintImageXObject => "paintImageXObject",
            OpCode::PaintInlineImageXObject => "paintInlineImageXObject",
            OpCode::PaintInlineImageXObjectGroup => "paintInlineImageXObjectGroup",
            OpCode::PaintImageXObjectRepeat => "paintImageXObjectRepeat",
            OpCode::PaintImageMaskXObjectRepeat => "paintImageMaskXObjectRepeat",
            OpCode::PaintSolidColorImageMask => "paintSolidColorImageMask",
            OpCode::ConstructPath => "constructPath",
            OpCode::Group => "group",
        }
    }
}

/// Operand value for one slot of an operator's argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum OpArg {
    Null,
    Num(f64),
    Int(i64),
    Bool(bool),
    Str(String),
    Array(Vec<OpArg>),
    /// `showText` payload.
    Glyphs(Vec<TextItem>),
    /// Decoded inline image payload.
    Image(ImageData),
    /// A nested operator list (tiling pattern content).
    Ops(OperatorList),
}

impl OpArg {
    pub fn as_num(&self) -> Option<f64> {
        match self {
            OpArg::Num(n) => Some(*n),
            OpArg::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OpArg::Int(n) => Some(*n),
            OpArg::Num(n) => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OpArg::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[OpArg]> {
        match self {
            OpArg::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_glyphs(&self) -> Option<&[TextItem]> {
        match self {
            OpArg::Glyphs(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            OpArg::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_ops(&self) -> Option<&OperatorList> {
        match self {
            OpArg::Ops(list) => Some(list),
            _ => None,
        }
    }

    /// Interprets an `Array` of numbers as an f64 vector.
    pub fn as_num_vec(&self) -> Option<Vec<f64>> {
        let items = self.as_array()?;
        items.iter().map(OpArg::as_num).collect()
    }

    /// Interprets a 6-element numeric array as a matrix.
    pub fn as_matrix(&self) -> Option<Matrix> {
        let v = self.as_num_vec()?;
        if v.len() != 6 {
            return None;
        }
        Some((v[0], v[1], v[2], v[3], v[4], v[5]))
    }

    /// Interprets a 2-element numeric array as a point.
    pub fn as_point(&self) -> Option<(f64, f64)> {
        let v = self.as_num_vec()?;
        if v.len() != 2 {
            return None;
        }
        Some((v[0], v[1]))
    }

    /// Interprets a 4-element numeric array as a rectangle.
    pub fn as_rect(&self) -> Option<(f64, f64, f64, f64)> {
        let v = self.as_num_vec()?;
        if v.len() != 4 {
            return None;
        }
        Some((v[0], v[1], v[2], v[3]))
    }
}

/// A page's flattened operator stream as two parallel arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorList {
    pub fn_array: Vec<OpCode>,
    pub args_array: Vec<Vec<OpArg>>,
}

impl OperatorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: OpCode, args: Vec<OpArg>) {
        self.fn_array.push(op);
        self.args_array.push(args);
    }

    pub fn len(&self) -> usize {
        self.fn_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fn_array.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OpCode, &[OpArg])> {
        self.fn_array
            .iter()
            .zip(&self.args_array)
            .map(|(op, args)| (*op, args.as_slice()))
    }
}

/// One node of the flattened operator tree.
#[derive(Debug, Clone)]
pub struct OpTreeNode {
    pub op: OpCode,
    pub args: Vec<OpArg>,
    /// Children of a `Group` node; empty otherwise.
    pub items: Vec<OpTreeNode>,
}

impl OpTreeNode {
    fn leaf(op: OpCode, args: Vec<OpArg>) -> Self {
        Self {
            op,
            args,
            items: Vec::new(),
        }
    }

    fn group(items: Vec<OpTreeNode>) -> Self {
        Self {
            op: OpCode::Group,
            args: Vec::new(),
            items,
        }
    }
}

/// Converts the flat operator list into a tree in which every balanced
/// `save..restore` range becomes a `Group` node. The markers themselves
/// do not appear in the output.
///
/// The upstream producer emits balanced streams; this is tolerant
/// anyway: an unmatched `restore` is ignored with a warning and trailing
/// `save`s leave their groups open.
pub fn op_list_to_tree(list: &OperatorList) -> Vec<OpTreeNode> {
    let mut current: Vec<OpTreeNode> = Vec::new();
    let mut stack: Vec<Vec<OpTreeNode>> = Vec::new();

    for (op, args) in list.iter() {
        match op {
            OpCode::Save => {
                stack.push(std::mem::take(&mut current));
            }
            OpCode::Restore => match stack.pop() {
                Some(mut parent) => {
                    parent.push(OpTreeNode::group(std::mem::take(&mut current)));
                    current = parent;
                }
                None => warn!("restore without matching save; ignoring"),
            },
            _ => current.push(OpTreeNode::leaf(op, args.to_vec())),
        }
    }

    // Close any groups a truncated stream left open.
    while let Some(mut parent) = stack.pop() {
        parent.push(OpTreeNode::group(std::mem::take(&mut current)));
        current = parent;
    }

    current
}
