//! Vertex and index buffers, and how their contents are fed to programs.

use crate::errors::{Error, Result};
use crate::types::{BufferHint, IndexFormat, Primitive, VertexFormat};

impl_handle!(MeshHandle);

/// Maximum number of elements in one vertex.
pub const MAX_VERTEX_ELEMENTS: usize = 12;

/// One element of a vertex, bound to the program input with the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexElement {
    pub name: String,
    /// The data type of each component of this element.
    pub format: VertexFormat,
    /// The number of components, 1 to 4.
    pub size: u8,
    /// Whether fixed-point data values should be normalized.
    pub normalized: bool,
    /// Byte offset of this element inside the vertex.
    pub offset: u32,
}

/// `VertexLayout` defines how a single vertex structure looks like.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexLayout {
    stride: u32,
    elements: Vec<VertexElement>,
}

impl VertexLayout {
    #[inline]
    pub fn build() -> VertexLayoutBuilder {
        VertexLayoutBuilder::default()
    }

    /// Stride of single vertex structure.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[inline]
    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&VertexElement> {
        self.elements.iter().find(|v| v.name == name)
    }
}

/// Helper structure to build a vertex layout. Elements are packed tightly in
/// declaration order, redeclaring a name replaces the former element.
#[derive(Default)]
pub struct VertexLayoutBuilder(Vec<VertexElement>);

impl VertexLayoutBuilder {
    pub fn with<T: Into<String>>(
        &mut self,
        name: T,
        format: VertexFormat,
        size: u8,
        normalized: bool,
    ) -> &mut Self {
        let element = VertexElement {
            name: name.into(),
            format,
            size,
            normalized,
            offset: 0,
        };

        match self.0.iter().position(|v| v.name == element.name) {
            Some(i) => self.0[i] = element,
            None => self.0.push(element),
        }

        self
    }

    pub fn finish(&mut self) -> Result<VertexLayout> {
        if self.0.len() > MAX_VERTEX_ELEMENTS {
            return Err(Error::OutOfBounds);
        }

        let mut stride = 0;
        for v in &mut self.0 {
            if v.size == 0 || v.size > 4 {
                return Err(Error::InvalidOperation(format!(
                    "vertex element {} with {} components",
                    v.name, v.size
                )));
            }

            v.offset = stride;
            stride += u32::from(v.size) * u32::from(v.format.size());
        }

        Ok(VertexLayout {
            stride,
            elements: self.0.clone(),
        })
    }
}

/// The setup parameters of mesh object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshParams {
    pub hint: BufferHint,
    pub layout: VertexLayout,
    pub index_format: IndexFormat,
    /// How the input vertex data is used to assemble primitives.
    pub primitive: Primitive,
    pub num_vertices: u32,
    pub num_indices: u32,
}

impl Default for MeshParams {
    fn default() -> Self {
        MeshParams {
            hint: BufferHint::Immutable,
            layout: VertexLayout::default(),
            index_format: IndexFormat::U16,
            primitive: Primitive::Triangles,
            num_vertices: 0,
            num_indices: 0,
        }
    }
}

impl MeshParams {
    #[inline]
    pub fn vertex_buffer_len(&self) -> usize {
        self.num_vertices as usize * self.layout.stride() as usize
    }

    #[inline]
    pub fn index_buffer_len(&self) -> usize {
        self.num_indices as usize * self.index_format.stride()
    }
}

/// The range of indices to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshIndex {
    /// Every index of the mesh.
    All,
    /// `len` indices starting from `from`.
    Ptr(u32, u32),
}

impl MeshIndex {
    /// Resolves into a start and a count, checking the bounds.
    pub fn range(self, num_indices: u32) -> Result<(u32, u32)> {
        match self {
            MeshIndex::All => Ok((0, num_indices)),
            MeshIndex::Ptr(from, len) if from.checked_add(len).map_or(false, |v| v <= num_indices) => {
                Ok((from, len))
            }
            MeshIndex::Ptr(_, _) => Err(Error::OutOfBounds),
        }
    }
}

/// Vertex and index buffer objects of a mesh.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vbo: u32,
    pub(crate) ibo: u32,
    pub(crate) params: MeshParams,
}

impl Mesh {
    #[inline]
    pub fn params(&self) -> &MeshParams {
        &self.params
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout() {
        let layout = VertexLayout::build()
            .with("a_position", VertexFormat::Byte, 1, false)
            .with("a_uv", VertexFormat::Float, 2, true)
            .with("a_position", VertexFormat::Float, 3, false)
            .finish()
            .unwrap();

        assert_eq!(layout.stride(), 20);
        assert_eq!(layout.element("a_position").unwrap().offset, 0);
        assert_eq!(layout.element("a_uv").unwrap().offset, 12);
        assert_eq!(layout.element("a_normal"), None);

        assert!(VertexLayout::build()
            .with("a_position", VertexFormat::Float, 5, false)
            .finish()
            .is_err());
    }

    #[test]
    fn index_range() {
        assert_eq!(MeshIndex::All.range(6).unwrap(), (0, 6));
        assert_eq!(MeshIndex::Ptr(3, 3).range(6).unwrap(), (3, 3));
        assert!(MeshIndex::Ptr(3, 4).range(6).is_err());
        assert!(MeshIndex::Ptr(::std::u32::MAX, 2).range(6).is_err());
    }
}
