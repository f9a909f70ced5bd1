//! Textures, render buffers and the texture units they get bound to.

pub mod unit;

pub use self::unit::{TextureUnit, TextureUnitManager};

use std::collections::HashSet;

use cgmath::{Vector2, Vector3};
use smallvec::SmallVec;

use crate::errors::{Error, Result};
use crate::program::ProgramHandle;
use crate::types::{TextureFormat, TextureTarget};

impl_handle!(TextureHandle);
impl_handle!(RenderBufferHandle);

/// The immutable description of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureParams {
    pub target: TextureTarget,
    pub format: TextureFormat,
    /// Width, height and depth (layers of arrays, always 6 for cube maps).
    pub dimensions: Vector3<u32>,
    /// Number of mip levels.
    pub levels: u32,
}

impl Default for TextureParams {
    fn default() -> Self {
        TextureParams {
            target: TextureTarget::Texture2D,
            format: TextureFormat::RGBA8,
            dimensions: Vector3::new(0, 0, 1),
            levels: 1,
        }
    }
}

impl TextureParams {
    pub fn validate(&self) -> Result<()> {
        let d = self.dimensions;
        if d.x == 0 || d.y == 0 || d.z == 0 || self.levels == 0 {
            return Err(Error::InvalidOperation(format!(
                "texture dimensions {:?} with {} levels",
                d, self.levels
            )));
        }

        let extent = if self.target == TextureTarget::Texture3D {
            d.x.max(d.y).max(d.z)
        } else {
            d.x.max(d.y)
        };

        if self.levels > 32 - extent.leading_zeros() {
            return Err(Error::InvalidOperation(format!(
                "{} levels exceed the mip chain of {:?}",
                self.levels, d
            )));
        }

        match self.target {
            TextureTarget::Texture2D if d.z != 1 => Err(Error::InvalidOperation(
                "2D textures have exactly one layer".into(),
            )),
            TextureTarget::CubeMap if d.z != 6 || d.x != d.y => Err(Error::InvalidOperation(
                "cube maps have six square faces".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Dimensions of the mip `level`.
    pub fn level_dimensions(&self, level: u32) -> Vector3<u32> {
        let d = self.dimensions;
        let mip = |v: u32| v.checked_shr(level).unwrap_or(0).max(1);
        let z = if self.target == TextureTarget::Texture3D {
            mip(d.z)
        } else {
            d.z
        };

        Vector3::new(mip(d.x), mip(d.y), z)
    }
}

/// A texture object. Its unit occupancy and its users are maintained by the
/// context.
#[derive(Debug)]
pub struct Texture {
    pub(crate) id: u32,
    pub(crate) params: TextureParams,
    /// Units this texture is bound to, together with the sampler on that unit.
    pub(crate) units: SmallVec<[(u32, usize); 4]>,
    /// Programs sampling this texture.
    pub(crate) users: HashSet<ProgramHandle>,
}

impl Texture {
    pub(crate) fn new(id: u32, params: TextureParams) -> Self {
        Texture {
            id,
            params,
            units: SmallVec::new(),
            users: HashSet::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn params(&self) -> &TextureParams {
        &self.params
    }

    /// The unit this texture currently occupies together with `sampler`.
    pub fn unit(&self, sampler: u32) -> Option<usize> {
        self.units
            .iter()
            .find(|v| v.0 == sampler)
            .map(|v| v.1)
    }

    /// Every unit this texture currently occupies.
    pub fn units<'a>(&'a self) -> impl Iterator<Item = usize> + 'a {
        self.units.iter().map(|v| v.1)
    }

    #[inline]
    pub fn is_used_by(&self, program: ProgramHandle) -> bool {
        self.users.contains(&program)
    }

    pub(crate) fn forget_unit(&mut self, unit: usize) {
        self.units.retain(|v| v.1 != unit);
    }
}

/// A render buffer object, only usable as a framebuffer attachment.
#[derive(Debug, Clone, Copy)]
pub struct RenderBuffer {
    pub(crate) id: u32,
    pub(crate) format: TextureFormat,
    pub(crate) dimensions: Vector2<u32>,
}

impl RenderBuffer {
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    #[inline]
    pub fn dimensions(&self) -> Vector2<u32> {
        self.dimensions
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn params() {
        let mut params = TextureParams::default();
        assert!(params.validate().is_err());

        params.dimensions = Vector3::new(64, 32, 1);
        params.levels = 3;
        assert!(params.validate().is_ok());
        assert_eq!(params.level_dimensions(2), Vector3::new(16, 8, 1));
        assert_eq!(params.level_dimensions(9), Vector3::new(1, 1, 1));
        assert_eq!(params.level_dimensions(40), Vector3::new(1, 1, 1));

        params.levels = 7;
        assert!(params.validate().is_ok());
        params.levels = 8;
        assert!(params.validate().is_err());
        params.levels = 3;

        params.target = TextureTarget::CubeMap;
        assert!(params.validate().is_err());
        params.dimensions = Vector3::new(32, 32, 6);
        assert!(params.validate().is_ok());
        assert_eq!(params.level_dimensions(1), Vector3::new(16, 16, 6));
    }
}
