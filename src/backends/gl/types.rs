use gl;
use gl::types::*;

use crate::framebuffer::AttachmentPoint;
use crate::program::UniformType;
use crate::types::*;

impl From<BufferHint> for GLenum {
    fn from(hint: BufferHint) -> Self {
        match hint {
            BufferHint::Immutable => gl::STATIC_DRAW,
            BufferHint::Stream => gl::STREAM_DRAW,
            BufferHint::Dynamic => gl::DYNAMIC_DRAW,
        }
    }
}

impl From<BufferTarget> for GLenum {
    fn from(target: BufferTarget) -> Self {
        match target {
            BufferTarget::Array => gl::ARRAY_BUFFER,
            BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
            BufferTarget::Uniform => gl::UNIFORM_BUFFER,
        }
    }
}

impl From<Comparison> for GLenum {
    fn from(cmp: Comparison) -> Self {
        match cmp {
            Comparison::Never => gl::NEVER,
            Comparison::Less => gl::LESS,
            Comparison::LessOrEqual => gl::LEQUAL,
            Comparison::Greater => gl::GREATER,
            Comparison::GreaterOrEqual => gl::GEQUAL,
            Comparison::Equal => gl::EQUAL,
            Comparison::NotEqual => gl::NOTEQUAL,
            Comparison::Always => gl::ALWAYS,
        }
    }
}

impl From<Equation> for GLenum {
    fn from(eq: Equation) -> Self {
        match eq {
            Equation::Add => gl::FUNC_ADD,
            Equation::Subtract => gl::FUNC_SUBTRACT,
            Equation::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
            Equation::Min => gl::MIN,
            Equation::Max => gl::MAX,
        }
    }
}

impl From<BlendFactor> for GLenum {
    fn from(factor: BlendFactor) -> Self {
        match factor {
            BlendFactor::Zero => gl::ZERO,
            BlendFactor::One => gl::ONE,
            BlendFactor::SourceAlphaSaturate => gl::SRC_ALPHA_SATURATE,
            BlendFactor::Value(BlendValue::SourceColor) => gl::SRC_COLOR,
            BlendFactor::Value(BlendValue::SourceAlpha) => gl::SRC_ALPHA,
            BlendFactor::Value(BlendValue::DestinationColor) => gl::DST_COLOR,
            BlendFactor::Value(BlendValue::DestinationAlpha) => gl::DST_ALPHA,
            BlendFactor::Value(BlendValue::ConstantColor) => gl::CONSTANT_COLOR,
            BlendFactor::Value(BlendValue::ConstantAlpha) => gl::CONSTANT_ALPHA,
            BlendFactor::OneMinusValue(BlendValue::SourceColor) => gl::ONE_MINUS_SRC_COLOR,
            BlendFactor::OneMinusValue(BlendValue::SourceAlpha) => gl::ONE_MINUS_SRC_ALPHA,
            BlendFactor::OneMinusValue(BlendValue::DestinationColor) => gl::ONE_MINUS_DST_COLOR,
            BlendFactor::OneMinusValue(BlendValue::DestinationAlpha) => gl::ONE_MINUS_DST_ALPHA,
            BlendFactor::OneMinusValue(BlendValue::ConstantColor) => gl::ONE_MINUS_CONSTANT_COLOR,
            BlendFactor::OneMinusValue(BlendValue::ConstantAlpha) => gl::ONE_MINUS_CONSTANT_ALPHA,
        }
    }
}

impl From<StencilOp> for GLenum {
    fn from(op: StencilOp) -> Self {
        match op {
            StencilOp::Keep => gl::KEEP,
            StencilOp::Zero => gl::ZERO,
            StencilOp::Replace => gl::REPLACE,
            StencilOp::Increment => gl::INCR,
            StencilOp::IncrementWrap => gl::INCR_WRAP,
            StencilOp::Decrement => gl::DECR,
            StencilOp::DecrementWrap => gl::DECR_WRAP,
            StencilOp::Invert => gl::INVERT,
        }
    }
}

impl From<CullFace> for GLenum {
    fn from(face: CullFace) -> Self {
        match face {
            // Culling is disabled instead.
            CullFace::Nothing | CullFace::Back => gl::BACK,
            CullFace::Front => gl::FRONT,
            CullFace::FrontAndBack => gl::FRONT_AND_BACK,
        }
    }
}

impl From<FrontFaceOrder> for GLenum {
    fn from(order: FrontFaceOrder) -> Self {
        match order {
            FrontFaceOrder::Clockwise => gl::CW,
            FrontFaceOrder::CounterClockwise => gl::CCW,
        }
    }
}

impl From<Face> for GLenum {
    fn from(face: Face) -> Self {
        match face {
            Face::Front => gl::FRONT,
            Face::Back => gl::BACK,
        }
    }
}

impl From<PolygonMode> for GLenum {
    fn from(mode: PolygonMode) -> Self {
        match mode {
            PolygonMode::Point => gl::POINT,
            PolygonMode::Line => gl::LINE,
            PolygonMode::Fill => gl::FILL,
        }
    }
}

impl From<LogicOp> for GLenum {
    fn from(op: LogicOp) -> Self {
        match op {
            LogicOp::Clear => gl::CLEAR,
            LogicOp::And => gl::AND,
            LogicOp::AndReverse => gl::AND_REVERSE,
            LogicOp::Copy => gl::COPY,
            LogicOp::AndInverted => gl::AND_INVERTED,
            LogicOp::Noop => gl::NOOP,
            LogicOp::Xor => gl::XOR,
            LogicOp::Or => gl::OR,
            LogicOp::Nor => gl::NOR,
            LogicOp::Equiv => gl::EQUIV,
            LogicOp::Invert => gl::INVERT,
            LogicOp::OrReverse => gl::OR_REVERSE,
            LogicOp::CopyInverted => gl::COPY_INVERTED,
            LogicOp::OrInverted => gl::OR_INVERTED,
            LogicOp::Nand => gl::NAND,
            LogicOp::Set => gl::SET,
        }
    }
}

impl From<Capability> for GLenum {
    fn from(cap: Capability) -> Self {
        match cap {
            Capability::Blend => gl::BLEND,
            Capability::ColorLogicOp => gl::COLOR_LOGIC_OP,
            Capability::CullFace => gl::CULL_FACE,
            Capability::DepthTest => gl::DEPTH_TEST,
            Capability::Dither => gl::DITHER,
            Capability::LineSmooth => gl::LINE_SMOOTH,
            Capability::Multisample => gl::MULTISAMPLE,
            Capability::PolygonOffsetFill => gl::POLYGON_OFFSET_FILL,
            Capability::PolygonOffsetLine => gl::POLYGON_OFFSET_LINE,
            Capability::PolygonOffsetPoint => gl::POLYGON_OFFSET_POINT,
            Capability::ProgramPointSize => gl::PROGRAM_POINT_SIZE,
            Capability::SampleAlphaToCoverage => gl::SAMPLE_ALPHA_TO_COVERAGE,
            Capability::SampleCoverage => gl::SAMPLE_COVERAGE,
            Capability::ScissorTest => gl::SCISSOR_TEST,
            Capability::StencilTest => gl::STENCIL_TEST,
        }
    }
}

impl From<BufferId> for GLenum {
    fn from(buffer: BufferId) -> Self {
        match buffer {
            BufferId::None => gl::NONE,
            BufferId::Front => gl::FRONT,
            BufferId::Back => gl::BACK,
            BufferId::Color(i) => gl::COLOR_ATTACHMENT0 + GLenum::from(i),
        }
    }
}

impl From<AttachmentPoint> for GLenum {
    fn from(point: AttachmentPoint) -> Self {
        match point {
            AttachmentPoint::Color(i) => gl::COLOR_ATTACHMENT0 + GLenum::from(i),
            AttachmentPoint::Depth => gl::DEPTH_ATTACHMENT,
            AttachmentPoint::Stencil => gl::STENCIL_ATTACHMENT,
        }
    }
}

impl From<TextureTarget> for GLenum {
    fn from(target: TextureTarget) -> Self {
        match target {
            TextureTarget::Texture2D => gl::TEXTURE_2D,
            TextureTarget::Texture2DArray => gl::TEXTURE_2D_ARRAY,
            TextureTarget::Texture3D => gl::TEXTURE_3D,
            TextureTarget::CubeMap => gl::TEXTURE_CUBE_MAP,
        }
    }
}

impl From<MinFilter> for GLenum {
    fn from(filter: MinFilter) -> Self {
        match filter {
            MinFilter::Nearest => gl::NEAREST,
            MinFilter::Linear => gl::LINEAR,
            MinFilter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
            MinFilter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
            MinFilter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
            MinFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl From<MagFilter> for GLenum {
    fn from(filter: MagFilter) -> Self {
        match filter {
            MagFilter::Nearest => gl::NEAREST,
            MagFilter::Linear => gl::LINEAR,
        }
    }
}

impl From<TextureWrap> for GLenum {
    fn from(wrap: TextureWrap) -> Self {
        match wrap {
            TextureWrap::Repeat => gl::REPEAT,
            TextureWrap::MirroredRepeat => gl::MIRRORED_REPEAT,
            TextureWrap::ClampToEdge => gl::CLAMP_TO_EDGE,
            TextureWrap::ClampToBorder => gl::CLAMP_TO_BORDER,
            TextureWrap::MirrorClampToEdge => gl::MIRROR_CLAMP_TO_EDGE,
        }
    }
}

impl From<ShaderStage> for GLenum {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::TessControl => gl::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => gl::TESS_EVALUATION_SHADER,
            ShaderStage::Geometry => gl::GEOMETRY_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
            ShaderStage::Compute => gl::COMPUTE_SHADER,
        }
    }
}

impl From<VertexFormat> for GLenum {
    fn from(format: VertexFormat) -> Self {
        match format {
            VertexFormat::Byte => gl::BYTE,
            VertexFormat::UByte => gl::UNSIGNED_BYTE,
            VertexFormat::Short => gl::SHORT,
            VertexFormat::UShort => gl::UNSIGNED_SHORT,
            VertexFormat::Int => gl::INT,
            VertexFormat::UInt => gl::UNSIGNED_INT,
            VertexFormat::Float => gl::FLOAT,
        }
    }
}

impl From<Primitive> for GLenum {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Points => gl::POINTS,
            Primitive::Lines => gl::LINES,
            Primitive::LineStrip => gl::LINE_STRIP,
            Primitive::Triangles => gl::TRIANGLES,
            Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
            Primitive::TriangleFan => gl::TRIANGLE_FAN,
        }
    }
}

impl From<IndexFormat> for GLenum {
    fn from(format: IndexFormat) -> Self {
        match format {
            IndexFormat::U16 => gl::UNSIGNED_SHORT,
            IndexFormat::U32 => gl::UNSIGNED_INT,
        }
    }
}

/// Internal format, pixel format and pixel type of a texture format.
pub fn texture_format(format: TextureFormat) -> (GLenum, GLenum, GLenum) {
    match format {
        TextureFormat::R8 => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
        TextureFormat::RG8 => (gl::RG8, gl::RG, gl::UNSIGNED_BYTE),
        TextureFormat::RGB8 => (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
        TextureFormat::RGBA8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
        TextureFormat::R32F => (gl::R32F, gl::RED, gl::FLOAT),
        TextureFormat::RGBA16F => (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT),
        TextureFormat::RGBA32F => (gl::RGBA32F, gl::RGBA, gl::FLOAT),
        TextureFormat::Depth16 => (
            gl::DEPTH_COMPONENT16,
            gl::DEPTH_COMPONENT,
            gl::UNSIGNED_SHORT,
        ),
        TextureFormat::Depth24 => (gl::DEPTH_COMPONENT24, gl::DEPTH_COMPONENT, gl::UNSIGNED_INT),
        TextureFormat::Depth32F => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
        TextureFormat::Depth24Stencil8 => (
            gl::DEPTH24_STENCIL8,
            gl::DEPTH_STENCIL,
            gl::UNSIGNED_INT_24_8,
        ),
        TextureFormat::Stencil8 => (gl::STENCIL_INDEX8, gl::STENCIL_INDEX, gl::UNSIGNED_BYTE),
    }
}

pub fn framebuffer_status(status: GLenum) -> FramebufferStatus {
    match status {
        gl::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
        gl::FRAMEBUFFER_UNDEFINED => FramebufferStatus::Undefined,
        gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
        gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
        gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
        gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => FramebufferStatus::IncompleteReadBuffer,
        gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
        // Desktop GL dropped the dimensions status, ES still reports it.
        0x8CD9 => FramebufferStatus::IncompleteDimensions,
        _ => FramebufferStatus::Unsupported,
    }
}

/// Describes a native error code.
pub fn error_desc(code: GLenum) -> Option<&'static str> {
    match code {
        gl::NO_ERROR => None,
        gl::INVALID_ENUM => {
            Some("an unacceptable value is specified for an enumerated argument")
        }
        gl::INVALID_VALUE => Some("a numeric argument is out of range"),
        gl::INVALID_OPERATION => {
            Some("the specified operation is not allowed in the current state")
        }
        gl::INVALID_FRAMEBUFFER_OPERATION => Some("the framebuffer object is not complete"),
        gl::OUT_OF_MEMORY => Some("there is not enough memory left to execute the command"),
        gl::STACK_UNDERFLOW => Some("an internal stack would underflow"),
        gl::STACK_OVERFLOW => Some("an internal stack would overflow"),
        _ => Some("unknown error"),
    }
}

const UNIFORM_TYPES: &[(GLenum, &str)] = &[
    (gl::FLOAT, "float"),
    (gl::FLOAT_VEC2, "vec2"),
    (gl::FLOAT_VEC3, "vec3"),
    (gl::FLOAT_VEC4, "vec4"),
    (gl::DOUBLE, "double"),
    (gl::DOUBLE_VEC2, "dvec2"),
    (gl::DOUBLE_VEC3, "dvec3"),
    (gl::DOUBLE_VEC4, "dvec4"),
    (gl::INT, "int"),
    (gl::INT_VEC2, "ivec2"),
    (gl::INT_VEC3, "ivec3"),
    (gl::INT_VEC4, "ivec4"),
    (gl::UNSIGNED_INT, "uint"),
    (gl::UNSIGNED_INT_VEC2, "uvec2"),
    (gl::UNSIGNED_INT_VEC3, "uvec3"),
    (gl::UNSIGNED_INT_VEC4, "uvec4"),
    (gl::BOOL, "bool"),
    (gl::BOOL_VEC2, "bvec2"),
    (gl::BOOL_VEC3, "bvec3"),
    (gl::BOOL_VEC4, "bvec4"),
    (gl::FLOAT_MAT2, "mat2"),
    (gl::FLOAT_MAT3, "mat3"),
    (gl::FLOAT_MAT4, "mat4"),
    (gl::FLOAT_MAT2x3, "mat2x3"),
    (gl::FLOAT_MAT2x4, "mat2x4"),
    (gl::FLOAT_MAT3x2, "mat3x2"),
    (gl::FLOAT_MAT3x4, "mat3x4"),
    (gl::FLOAT_MAT4x2, "mat4x2"),
    (gl::FLOAT_MAT4x3, "mat4x3"),
    (gl::DOUBLE_MAT2, "dmat2"),
    (gl::DOUBLE_MAT3, "dmat3"),
    (gl::DOUBLE_MAT4, "dmat4"),
    (gl::DOUBLE_MAT2x3, "dmat2x3"),
    (gl::DOUBLE_MAT2x4, "dmat2x4"),
    (gl::DOUBLE_MAT3x2, "dmat3x2"),
    (gl::DOUBLE_MAT3x4, "dmat3x4"),
    (gl::DOUBLE_MAT4x2, "dmat4x2"),
    (gl::DOUBLE_MAT4x3, "dmat4x3"),
    (gl::SAMPLER_1D, "sampler1D"),
    (gl::SAMPLER_2D, "sampler2D"),
    (gl::SAMPLER_3D, "sampler3D"),
    (gl::SAMPLER_CUBE, "samplerCube"),
    (gl::SAMPLER_1D_SHADOW, "sampler1DShadow"),
    (gl::SAMPLER_2D_SHADOW, "sampler2DShadow"),
    (gl::SAMPLER_1D_ARRAY, "sampler1DArray"),
    (gl::SAMPLER_2D_ARRAY, "sampler2DArray"),
    (gl::SAMPLER_CUBE_MAP_ARRAY, "samplerCubeArray"),
    (gl::SAMPLER_1D_ARRAY_SHADOW, "sampler1DArrayShadow"),
    (gl::SAMPLER_2D_ARRAY_SHADOW, "sampler2DArrayShadow"),
    (gl::SAMPLER_CUBE_SHADOW, "samplerCubeShadow"),
    (gl::SAMPLER_CUBE_MAP_ARRAY_SHADOW, "samplerCubeArrayShadow"),
    (gl::SAMPLER_2D_RECT, "sampler2DRect"),
    (gl::SAMPLER_2D_RECT_SHADOW, "sampler2DRectShadow"),
    (gl::SAMPLER_BUFFER, "samplerBuffer"),
    (gl::SAMPLER_2D_MULTISAMPLE, "sampler2DMS"),
    (gl::SAMPLER_2D_MULTISAMPLE_ARRAY, "sampler2DMSArray"),
    (gl::INT_SAMPLER_1D, "isampler1D"),
    (gl::INT_SAMPLER_2D, "isampler2D"),
    (gl::INT_SAMPLER_3D, "isampler3D"),
    (gl::INT_SAMPLER_CUBE, "isamplerCube"),
    (gl::INT_SAMPLER_1D_ARRAY, "isampler1DArray"),
    (gl::INT_SAMPLER_2D_ARRAY, "isampler2DArray"),
    (gl::INT_SAMPLER_CUBE_MAP_ARRAY, "isamplerCubeArray"),
    (gl::INT_SAMPLER_2D_RECT, "isampler2DRect"),
    (gl::INT_SAMPLER_BUFFER, "isamplerBuffer"),
    (gl::INT_SAMPLER_2D_MULTISAMPLE, "isampler2DMS"),
    (gl::INT_SAMPLER_2D_MULTISAMPLE_ARRAY, "isampler2DMSArray"),
    (gl::UNSIGNED_INT_SAMPLER_1D, "usampler1D"),
    (gl::UNSIGNED_INT_SAMPLER_2D, "usampler2D"),
    (gl::UNSIGNED_INT_SAMPLER_3D, "usampler3D"),
    (gl::UNSIGNED_INT_SAMPLER_CUBE, "usamplerCube"),
    (gl::UNSIGNED_INT_SAMPLER_1D_ARRAY, "usampler1DArray"),
    (gl::UNSIGNED_INT_SAMPLER_2D_ARRAY, "usampler2DArray"),
    (gl::UNSIGNED_INT_SAMPLER_CUBE_MAP_ARRAY, "usamplerCubeArray"),
    (gl::UNSIGNED_INT_SAMPLER_2D_RECT, "usampler2DRect"),
    (gl::UNSIGNED_INT_SAMPLER_BUFFER, "usamplerBuffer"),
    (gl::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE, "usampler2DMS"),
    (gl::UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE_ARRAY, "usampler2DMSArray"),
];

/// Translates the type reported by uniform introspection. Image and atomic
/// counter types have no counterpart.
pub fn uniform_type(ty: GLenum) -> Option<UniformType> {
    UNIFORM_TYPES
        .iter()
        .find(|v| v.0 == ty)
        .and_then(|v| UniformType::from_glsl(v.1))
}
