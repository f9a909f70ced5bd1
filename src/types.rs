//! Engine-level enumerations of pipeline state. The native tokens they map
//! to live in the backends.

use std::fmt;

/// Specify the value used for depth and stencil buffer comparisons.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Comparison {
    /// Never passes.
    Never,
    /// Passes if the incoming value is less than the stored value.
    Less,
    /// Passes if the incoming value is less than or equal to the stored value.
    LessOrEqual,
    /// Passes if the incoming value is greater than the stored value.
    Greater,
    /// Passes if the incoming value is greater than or equal to the stored value.
    GreaterOrEqual,
    /// Passes if the incoming value is equal to the stored value.
    Equal,
    /// Passes if the incoming value is not equal to the stored value.
    NotEqual,
    /// Always passes.
    Always,
}

/// Specifies how incoming RGBA values (source) and the RGBA in framebuffer
/// (destination) are combined.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Equation {
    /// Adds source and destination. Source and destination are multiplied
    /// by blending parameters before addition.
    Add,
    /// Subtracts destination from source. Source and destination are
    /// multiplied by blending parameters before subtraction.
    Subtract,
    /// Subtracts source from destination. Source and destination are
    /// multiplied by blending parameters before subtraction.
    ReverseSubtract,
    /// Component-wise minimum, factors are ignored.
    Min,
    /// Component-wise maximum, factors are ignored.
    Max,
}

/// Blend values.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum BlendValue {
    SourceColor,
    SourceAlpha,
    DestinationColor,
    DestinationAlpha,
    ConstantColor,
    ConstantAlpha,
}

/// Blend factors.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    Value(BlendValue),
    OneMinusValue(BlendValue),
    SourceAlphaSaturate,
}

/// Actions taken on the stencil buffer by the stencil test.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

/// Specify whether front- or back-facing polygons can be culled.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum CullFace {
    Nothing,
    Front,
    Back,
    FrontAndBack,
}

/// Define front- and back-facing polygons.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum FrontFaceOrder {
    Clockwise,
    CounterClockwise,
}

/// Selects one side of a polygon for two-sided state like stencil.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Face {
    Front,
    Back,
}

/// Selects how polygons are rasterized.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum PolygonMode {
    Point,
    Line,
    Fill,
}

/// Logical pixel operation applied between the incoming and stored color.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum LogicOp {
    Clear,
    And,
    AndReverse,
    Copy,
    AndInverted,
    Noop,
    Xor,
    Or,
    Nor,
    Equiv,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
}

/// Server-side capabilities toggled with enable/disable.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Capability {
    Blend,
    ColorLogicOp,
    CullFace,
    DepthTest,
    Dither,
    LineSmooth,
    Multisample,
    PolygonOffsetFill,
    PolygonOffsetLine,
    PolygonOffsetPoint,
    ProgramPointSize,
    SampleAlphaToCoverage,
    SampleCoverage,
    ScissorTest,
    StencilTest,
}

/// Color buffers that could be selected for reading or drawing.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum BufferId {
    None,
    Front,
    Back,
    Color(u8),
}

/// Buffers to clear.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

impl ClearMask {
    #[inline]
    pub fn is_empty(self) -> bool {
        !(self.color || self.depth || self.stencil)
    }
}

/// The result of a framebuffer completeness check.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum FramebufferStatus {
    Complete,
    Undefined,
    IncompleteAttachment,
    MissingAttachment,
    IncompleteDimensions,
    IncompleteDrawBuffer,
    IncompleteReadBuffer,
    IncompleteMultisample,
    Unsupported,
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let desc = match *self {
            FramebufferStatus::Complete => "complete",
            FramebufferStatus::Undefined => "the default framebuffer does not exist",
            FramebufferStatus::IncompleteAttachment => {
                "not all attachment points are framebuffer attachment complete"
            }
            FramebufferStatus::MissingAttachment => "no images are attached to the framebuffer",
            FramebufferStatus::IncompleteDimensions => {
                "the attached images do not have the same dimensions"
            }
            FramebufferStatus::IncompleteDrawBuffer => {
                "a draw buffer names an attachment point without an image"
            }
            FramebufferStatus::IncompleteReadBuffer => {
                "the read buffer names an attachment point without an image"
            }
            FramebufferStatus::IncompleteMultisample => {
                "the attached images do not share the same number of samples"
            }
            FramebufferStatus::Unsupported => {
                "the combination of internal formats violates implementation restrictions"
            }
        };

        write!(f, "{}", desc)
    }
}

/// The kind of a texture object. A texture gets its kind once on creation.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum TextureTarget {
    Texture2D,
    Texture2DArray,
    Texture3D,
    CubeMap,
}

impl TextureTarget {
    /// Returns true if attaching this kind of texture needs a layer (or face).
    #[inline]
    pub fn is_layered(self) -> bool {
        self != TextureTarget::Texture2D
    }
}

/// Pixel storage formats of textures and render buffers.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum TextureFormat {
    R8,
    RG8,
    RGB8,
    RGBA8,
    R32F,
    RGBA16F,
    RGBA32F,
    Depth16,
    Depth24,
    Depth32F,
    Depth24Stencil8,
    Stencil8,
}

impl TextureFormat {
    /// Size in bytes of one pixel.
    pub fn size(self) -> usize {
        match self {
            TextureFormat::R8 | TextureFormat::Stencil8 => 1,
            TextureFormat::RG8 | TextureFormat::Depth16 => 2,
            TextureFormat::RGB8 | TextureFormat::Depth24 => 3,
            TextureFormat::RGBA8
            | TextureFormat::R32F
            | TextureFormat::Depth32F
            | TextureFormat::Depth24Stencil8 => 4,
            TextureFormat::RGBA16F => 8,
            TextureFormat::RGBA32F => 16,
        }
    }

    pub fn is_color(self) -> bool {
        !self.has_depth() && !self.has_stencil()
    }

    pub fn has_depth(self) -> bool {
        match self {
            TextureFormat::Depth16
            | TextureFormat::Depth24
            | TextureFormat::Depth32F
            | TextureFormat::Depth24Stencil8 => true,
            _ => false,
        }
    }

    pub fn has_stencil(self) -> bool {
        match self {
            TextureFormat::Depth24Stencil8 | TextureFormat::Stencil8 => true,
            _ => false,
        }
    }
}

/// Minifying filter of a sampler.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

/// Magnifying filter of a sampler.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum MagFilter {
    Nearest,
    Linear,
}

/// Sets the wrap parameter for texture coordinates.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum TextureWrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
    MirrorClampToEdge,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

/// Binding targets of buffer objects.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BufferTarget {
    Array,
    ElementArray,
    Uniform,
}

/// Hint abouts the intended update strategy of the data.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum BufferHint {
    /// The resource is initialized with data and cannot be changed later.
    Immutable,
    /// The resource is updated by the CPU in each frame.
    Stream,
    /// The resource is updated by the CPU infrequently.
    Dynamic,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum VertexFormat {
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Float,
}

impl VertexFormat {
    pub fn size(self) -> u8 {
        match self {
            VertexFormat::Byte | VertexFormat::UByte => 1,
            VertexFormat::Short | VertexFormat::UShort => 2,
            VertexFormat::Int | VertexFormat::UInt | VertexFormat::Float => 4,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    pub fn stride(self) -> usize {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Primitive {
    /// Number of primitives assembled out of `indices` vertices.
    pub fn assemble(self, indices: u32) -> u32 {
        match self {
            Primitive::Points => indices,
            Primitive::Lines => indices / 2,
            Primitive::LineStrip => indices.saturating_sub(1),
            Primitive::Triangles => indices / 3,
            Primitive::TriangleStrip | Primitive::TriangleFan => indices.saturating_sub(2),
        }
    }
}
