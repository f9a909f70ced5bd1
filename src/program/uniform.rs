//! Typed uniforms of a linked program.
//!
//! Every GLSL type is described by one `UniformType` (scalar kind, rows and
//! columns, or a sampler kind), and every value by one `UniformValue` holding
//! the tightly packed, column-major components.

use std::fmt;

use cgmath::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};
use smallvec::SmallVec;

use crate::errors::{Error, Result};
use crate::texture::TextureHandle;

/// The component type of a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Float,
    Double,
    Int,
    UInt,
    Bool,
}

impl ScalarKind {
    /// Size in bytes of one component inside a uniform buffer.
    #[inline]
    pub fn size(self) -> usize {
        match self {
            ScalarKind::Double => 8,
            _ => 4,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ScalarKind::Float => "",
            ScalarKind::Double => "d",
            ScalarKind::Int => "i",
            ScalarKind::UInt => "u",
            ScalarKind::Bool => "b",
        }
    }
}

/// The dimensionality of a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerDim {
    D1,
    D2,
    D3,
    Cube,
    D1Array,
    D2Array,
    CubeArray,
    D2Rect,
    Buffer,
    D2Multisample,
    D2MultisampleArray,
}

const SAMPLER_DIMS: [(SamplerDim, &str); 11] = [
    (SamplerDim::D1, "1D"),
    (SamplerDim::D2, "2D"),
    (SamplerDim::D3, "3D"),
    (SamplerDim::Cube, "Cube"),
    (SamplerDim::D1Array, "1DArray"),
    (SamplerDim::D2Array, "2DArray"),
    (SamplerDim::CubeArray, "CubeArray"),
    (SamplerDim::D2Rect, "2DRect"),
    (SamplerDim::Buffer, "Buffer"),
    (SamplerDim::D2Multisample, "2DMS"),
    (SamplerDim::D2MultisampleArray, "2DMSArray"),
];

/// A sampler type, `isampler2DArray` is `{ dim: D2Array, kind: Int, shadow: false }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerType {
    pub dim: SamplerDim,
    /// One of `Float`, `Int` or `UInt`.
    pub kind: ScalarKind,
    pub shadow: bool,
}

/// The shape of a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// A vector of 1 to 4 components, scalars are 1-vectors.
    Vector(ScalarKind, u8),
    /// A matrix with `cols` columns of `rows` components. Only `Float` and
    /// `Double` matrices exist.
    Matrix(ScalarKind, u8, u8),
    Sampler(SamplerType),
}

impl UniformType {
    /// Number of components of one element.
    pub fn components(self) -> usize {
        match self {
            UniformType::Vector(_, n) => n as usize,
            UniformType::Matrix(_, c, r) => (c * r) as usize,
            UniformType::Sampler(_) => 1,
        }
    }

    /// The component type. Samplers are written as integer texture units.
    pub fn scalar(self) -> ScalarKind {
        match self {
            UniformType::Vector(kind, _) | UniformType::Matrix(kind, _, _) => kind,
            UniformType::Sampler(_) => ScalarKind::Int,
        }
    }

    #[inline]
    pub fn is_sampler(self) -> bool {
        match self {
            UniformType::Sampler(_) => true,
            _ => false,
        }
    }

    /// Parses a GLSL type name like `vec3`, `dmat4x2` or `usampler2DArray`.
    pub fn from_glsl(name: &str) -> Option<UniformType> {
        match name {
            "float" => return Some(UniformType::Vector(ScalarKind::Float, 1)),
            "double" => return Some(UniformType::Vector(ScalarKind::Double, 1)),
            "int" => return Some(UniformType::Vector(ScalarKind::Int, 1)),
            "uint" => return Some(UniformType::Vector(ScalarKind::UInt, 1)),
            "bool" => return Some(UniformType::Vector(ScalarKind::Bool, 1)),
            _ => {}
        }

        let (kind, rest) = match name.as_bytes().first()? {
            b'd' => (ScalarKind::Double, &name[1..]),
            b'i' => (ScalarKind::Int, &name[1..]),
            b'u' => (ScalarKind::UInt, &name[1..]),
            b'b' => (ScalarKind::Bool, &name[1..]),
            _ => (ScalarKind::Float, name),
        };

        if rest.starts_with("vec") {
            let n = dimension(&rest[3..])?;
            return Some(UniformType::Vector(kind, n));
        }

        if rest.starts_with("mat") {
            if kind != ScalarKind::Float && kind != ScalarKind::Double {
                return None;
            }

            let shape = &rest[3..];
            let (c, r) = match shape.find('x') {
                Some(i) => (dimension(&shape[..i])?, dimension(&shape[i + 1..])?),
                None => {
                    let n = dimension(shape)?;
                    (n, n)
                }
            };

            if c < 2 || r < 2 {
                return None;
            }

            return Some(UniformType::Matrix(kind, c, r));
        }

        if rest.starts_with("sampler") {
            if kind == ScalarKind::Double || kind == ScalarKind::Bool {
                return None;
            }

            let mut dim = &rest[7..];
            let shadow = dim.ends_with("Shadow");
            if shadow {
                if kind != ScalarKind::Float {
                    return None;
                }

                dim = &dim[..dim.len() - 6];
            }

            let dim = SAMPLER_DIMS.iter().find(|v| v.1 == dim)?.0;
            return Some(UniformType::Sampler(SamplerType { dim, kind, shadow }));
        }

        None
    }
}

fn dimension(v: &str) -> Option<u8> {
    match v {
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            UniformType::Vector(kind, 1) => {
                let name = match kind {
                    ScalarKind::Float => "float",
                    ScalarKind::Double => "double",
                    ScalarKind::Int => "int",
                    ScalarKind::UInt => "uint",
                    ScalarKind::Bool => "bool",
                };
                write!(f, "{}", name)
            }
            UniformType::Vector(kind, n) => write!(f, "{}vec{}", kind.prefix(), n),
            UniformType::Matrix(kind, c, r) if c == r => write!(f, "{}mat{}", kind.prefix(), c),
            UniformType::Matrix(kind, c, r) => write!(f, "{}mat{}x{}", kind.prefix(), c, r),
            UniformType::Sampler(v) => {
                let dim = SAMPLER_DIMS
                    .iter()
                    .find(|d| d.0 == v.dim)
                    .map(|d| d.1)
                    .unwrap_or("");
                let shadow = if v.shadow { "Shadow" } else { "" };
                write!(f, "{}sampler{}{}", v.kind.prefix(), dim, shadow)
            }
        }
    }
}

/// Packed components of a uniform value.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformData {
    F32(SmallVec<[f32; 16]>),
    F64(SmallVec<[f64; 16]>),
    I32(SmallVec<[i32; 16]>),
    U32(SmallVec<[u32; 16]>),
}

impl UniformData {
    pub fn len(&self) -> usize {
        match *self {
            UniformData::F32(ref v) => v.len(),
            UniformData::F64(ref v) => v.len(),
            UniformData::I32(ref v) => v.len(),
            UniformData::U32(ref v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matches(&self, kind: ScalarKind) -> bool {
        match (self, kind) {
            (UniformData::F32(_), ScalarKind::Float) => true,
            (UniformData::F64(_), ScalarKind::Double) => true,
            (UniformData::I32(_), ScalarKind::Int) => true,
            (UniformData::I32(_), ScalarKind::Bool) => true,
            (UniformData::U32(_), ScalarKind::UInt) => true,
            _ => false,
        }
    }

    /// Writes the `i`-th component in native byte order.
    fn write_component(&self, i: usize, out: &mut [u8]) {
        match *self {
            UniformData::F32(ref v) => out[..4].copy_from_slice(&v[i].to_ne_bytes()),
            UniformData::F64(ref v) => out[..8].copy_from_slice(&v[i].to_ne_bytes()),
            UniformData::I32(ref v) => out[..4].copy_from_slice(&v[i].to_ne_bytes()),
            UniformData::U32(ref v) => out[..4].copy_from_slice(&v[i].to_ne_bytes()),
        }
    }
}

/// A value of one uniform. Matrices are stored column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformValue {
    ty: UniformType,
    data: UniformData,
}

impl UniformValue {
    /// Creates a value of type `ty`, the number and kind of components must
    /// match it. Booleans are passed as `I32`.
    pub fn new(ty: UniformType, data: UniformData) -> Result<Self> {
        if ty.is_sampler() || !data.matches(ty.scalar()) || data.len() != ty.components() {
            return Err(Error::UniformMismatch(
                "value".into(),
                ty.to_string(),
                format!("{:?}", data),
            ));
        }

        Ok(UniformValue { ty, data })
    }

    #[inline]
    pub fn ty(&self) -> UniformType {
        self.ty
    }

    #[inline]
    pub fn data(&self) -> &UniformData {
        &self.data
    }

    /// Encodes this value into a uniform buffer region starting at `offset`.
    ///
    /// Matrices are laid out as arrays of column (or row, if `row_major`)
    /// vectors, `matrix_stride` bytes apart.
    pub fn encode(&self, buf: &mut [u8], offset: usize, matrix_stride: usize, row_major: bool) {
        let size = self.ty.scalar().size();
        match self.ty {
            UniformType::Matrix(_, cols, rows) => {
                let (cols, rows) = (cols as usize, rows as usize);
                for c in 0..cols {
                    for r in 0..rows {
                        let pos = if row_major {
                            offset + r * matrix_stride + c * size
                        } else {
                            offset + c * matrix_stride + r * size
                        };

                        self.data.write_component(c * rows + r, &mut buf[pos..]);
                    }
                }
            }
            _ => {
                for i in 0..self.data.len() {
                    self.data.write_component(i, &mut buf[offset + i * size..]);
                }
            }
        }
    }

    /// Byte range touched by `encode` with the same layout arguments.
    pub fn encoded_len(&self, matrix_stride: usize, row_major: bool) -> usize {
        let size = self.ty.scalar().size();
        match self.ty {
            UniformType::Matrix(_, cols, rows) => {
                let (major, minor) = if row_major {
                    (rows as usize, cols as usize)
                } else {
                    (cols as usize, rows as usize)
                };

                (major - 1) * matrix_stride + minor * size
            }
            _ => self.data.len() * size,
        }
    }
}

macro_rules! impl_uniform_value {
    ($ty:ty, $kind:ident, $variant:ident, $n:expr, |$v:ident| $conv:expr) => {
        impl From<$ty> for UniformValue {
            fn from($v: $ty) -> Self {
                UniformValue {
                    ty: UniformType::Vector(ScalarKind::$kind, $n),
                    data: UniformData::$variant($conv),
                }
            }
        }
    };
}

impl_uniform_value!(f32, Float, F32, 1, |v| SmallVec::from_slice(&[v]));
impl_uniform_value!([f32; 2], Float, F32, 2, |v| SmallVec::from_slice(&v));
impl_uniform_value!([f32; 3], Float, F32, 3, |v| SmallVec::from_slice(&v));
impl_uniform_value!([f32; 4], Float, F32, 4, |v| SmallVec::from_slice(&v));
impl_uniform_value!(Vector2<f32>, Float, F32, 2, |v| SmallVec::from_slice(&[v.x, v.y]));
impl_uniform_value!(Vector3<f32>, Float, F32, 3, |v| SmallVec::from_slice(&[
    v.x, v.y, v.z
]));
impl_uniform_value!(Vector4<f32>, Float, F32, 4, |v| SmallVec::from_slice(&[
    v.x, v.y, v.z, v.w
]));
impl_uniform_value!(f64, Double, F64, 1, |v| SmallVec::from_slice(&[v]));
impl_uniform_value!([f64; 2], Double, F64, 2, |v| SmallVec::from_slice(&v));
impl_uniform_value!([f64; 3], Double, F64, 3, |v| SmallVec::from_slice(&v));
impl_uniform_value!([f64; 4], Double, F64, 4, |v| SmallVec::from_slice(&v));
impl_uniform_value!(i32, Int, I32, 1, |v| SmallVec::from_slice(&[v]));
impl_uniform_value!([i32; 2], Int, I32, 2, |v| SmallVec::from_slice(&v));
impl_uniform_value!([i32; 3], Int, I32, 3, |v| SmallVec::from_slice(&v));
impl_uniform_value!([i32; 4], Int, I32, 4, |v| SmallVec::from_slice(&v));
impl_uniform_value!(u32, UInt, U32, 1, |v| SmallVec::from_slice(&[v]));
impl_uniform_value!([u32; 2], UInt, U32, 2, |v| SmallVec::from_slice(&v));
impl_uniform_value!([u32; 3], UInt, U32, 3, |v| SmallVec::from_slice(&v));
impl_uniform_value!([u32; 4], UInt, U32, 4, |v| SmallVec::from_slice(&v));
impl_uniform_value!(bool, Bool, I32, 1, |v| SmallVec::from_slice(&[v as i32]));
impl_uniform_value!([bool; 2], Bool, I32, 2, |v| v.iter().map(|&b| b as i32).collect());
impl_uniform_value!([bool; 3], Bool, I32, 3, |v| v.iter().map(|&b| b as i32).collect());
impl_uniform_value!([bool; 4], Bool, I32, 4, |v| v.iter().map(|&b| b as i32).collect());

macro_rules! impl_uniform_matrix {
    ($ty:ty, $n:expr, $arr:ty) => {
        impl From<$ty> for UniformValue {
            fn from(v: $ty) -> Self {
                let columns: &$arr = v.as_ref();
                UniformValue {
                    ty: UniformType::Matrix(ScalarKind::Float, $n, $n),
                    data: UniformData::F32(columns.iter().flat_map(|c| c.iter().cloned()).collect()),
                }
            }
        }
    };
}

impl_uniform_matrix!(Matrix2<f32>, 2, [[f32; 2]; 2]);
impl_uniform_matrix!(Matrix3<f32>, 3, [[f32; 3]; 3]);
impl_uniform_matrix!(Matrix4<f32>, 4, [[f32; 4]; 4]);

/// Identifies a uniform inside its program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformId(pub(crate) usize);

/// Where writes into a uniform go. Decided once at reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformLocation {
    /// A free-standing uniform written to the driver.
    Loose(i32),
    /// A member of the `block`-th uniform block of the program.
    Block {
        block: usize,
        offset: usize,
        matrix_stride: usize,
        row_major: bool,
    },
}

/// A host-side proxy of one active uniform (or one element of an array).
#[derive(Debug, Clone)]
pub struct Uniform {
    name: String,
    ty: UniformType,
    location: UniformLocation,
    pub(crate) value: Option<UniformValue>,
    pub(crate) dirty: bool,
    pub(crate) texture: Option<(TextureHandle, u32)>,
    pub(crate) unit: Option<usize>,
}

impl Uniform {
    pub(crate) fn new(name: String, ty: UniformType, location: UniformLocation) -> Self {
        Uniform {
            name,
            ty,
            location,
            value: None,
            dirty: false,
            texture: None,
            unit: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> UniformType {
        self.ty
    }

    #[inline]
    pub fn location(&self) -> UniformLocation {
        self.location
    }

    /// The index of the block holding this uniform inside its program.
    pub fn block(&self) -> Option<usize> {
        match self.location {
            UniformLocation::Block { block, .. } => Some(block),
            UniformLocation::Loose(_) => None,
        }
    }

    /// The last value written through this free-standing uniform.
    #[inline]
    pub fn value(&self) -> Option<&UniformValue> {
        self.value.as_ref()
    }

    /// The texture and native sampler object of a sampler uniform.
    #[inline]
    pub fn texture(&self) -> Option<(TextureHandle, u32)> {
        self.texture
    }

    /// The texture unit this sampler uniform was last pointed at.
    #[inline]
    pub fn unit(&self) -> Option<usize> {
        self.unit
    }

    /// Checks that `value` could be written into this uniform.
    pub(crate) fn accept(&self, value: &UniformValue) -> Result<()> {
        if self.ty.is_sampler() || value.ty() != self.ty {
            return Err(Error::UniformMismatch(
                self.name.clone(),
                self.ty.to_string(),
                value.ty().to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn glsl_names() {
        let names = [
            "float",
            "vec3",
            "dvec2",
            "ivec4",
            "uint",
            "bvec3",
            "mat4",
            "mat2x3",
            "dmat3x4",
            "sampler2D",
            "isampler2DArray",
            "usamplerCube",
            "sampler2DShadow",
            "samplerCubeArrayShadow",
            "sampler2DMSArray",
        ];

        for name in names.iter() {
            let ty = UniformType::from_glsl(name).unwrap();
            assert_eq!(&ty.to_string(), name);
        }

        assert_eq!(
            UniformType::from_glsl("mat3x2"),
            Some(UniformType::Matrix(ScalarKind::Float, 3, 2))
        );

        assert_eq!(UniformType::from_glsl("imat4"), None);
        assert_eq!(UniformType::from_glsl("isampler2DShadow"), None);
        assert_eq!(UniformType::from_glsl("vec5"), None);
        assert_eq!(UniformType::from_glsl("Light"), None);
    }

    #[test]
    fn value_shapes() {
        let v: UniformValue = Matrix4::<f32>::from_scale(2.0).into();
        assert_eq!(v.ty(), UniformType::Matrix(ScalarKind::Float, 4, 4));
        assert_eq!(v.data().len(), 16);

        let v: UniformValue = [true, false].into();
        assert_eq!(v.ty(), UniformType::Vector(ScalarKind::Bool, 2));
        assert_eq!(v.data(), &UniformData::I32(SmallVec::from_slice(&[1, 0])));

        let ty = UniformType::Vector(ScalarKind::Float, 3);
        assert!(UniformValue::new(ty, UniformData::F32(SmallVec::from_slice(&[1.0; 3]))).is_ok());
        assert!(UniformValue::new(ty, UniformData::F32(SmallVec::from_slice(&[1.0; 2]))).is_err());
        assert!(UniformValue::new(ty, UniformData::I32(SmallVec::from_slice(&[1; 3]))).is_err());
    }

    fn read_f32(buf: &[u8], offset: usize) -> f32 {
        let mut v = [0u8; 4];
        v.copy_from_slice(&buf[offset..offset + 4]);
        f32::from_ne_bytes(v)
    }

    #[test]
    fn encode_matrix() {
        // mat2x3: 2 columns of 3 rows, column-major data.
        let ty = UniformType::Matrix(ScalarKind::Float, 2, 3);
        let data = SmallVec::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let v = UniformValue::new(ty, UniformData::F32(data)).unwrap();

        let mut buf = vec![0u8; 64];
        v.encode(&mut buf, 16, 16, false);
        assert_eq!(read_f32(&buf, 16), 1.0);
        assert_eq!(read_f32(&buf, 24), 3.0);
        assert_eq!(read_f32(&buf, 32), 4.0);
        assert_eq!(read_f32(&buf, 40), 6.0);
        assert_eq!(v.encoded_len(16, false), 16 + 12);

        let mut buf = vec![0u8; 64];
        v.encode(&mut buf, 0, 16, true);
        assert_eq!(read_f32(&buf, 0), 1.0);
        assert_eq!(read_f32(&buf, 4), 4.0);
        assert_eq!(read_f32(&buf, 16), 2.0);
        assert_eq!(read_f32(&buf, 36), 6.0);
        assert_eq!(v.encoded_len(16, true), 32 + 8);
    }

    #[test]
    fn encode_vector() {
        let v: UniformValue = [0.5f32, 1.5, 2.5].into();
        let mut buf = vec![0u8; 16];
        v.encode(&mut buf, 4, 0, false);
        assert_eq!(read_f32(&buf, 4), 0.5);
        assert_eq!(read_f32(&buf, 12), 2.5);
        assert_eq!(v.encoded_len(0, false), 12);
    }
}
