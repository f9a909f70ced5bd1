//! Immutable sampling parameters and their de-duplicated native objects.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::backends::Device;
use crate::types::{Comparison, MagFilter, MinFilter, TextureWrap};

/// Color used for texels outside the texture with `TextureWrap::ClampToBorder`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum BorderColor {
    /// Normalized integer components.
    Int([i32; 4]),
    Float([f32; 4]),
    /// Non-normalized components of signed integer textures.
    SignedInt([i32; 4]),
    /// Non-normalized components of unsigned integer textures.
    UnsignedInt([u32; 4]),
}

impl BorderColor {
    fn tag(&self) -> u8 {
        match *self {
            BorderColor::Int(_) => 0,
            BorderColor::Float(_) => 1,
            BorderColor::SignedInt(_) => 2,
            BorderColor::UnsignedInt(_) => 3,
        }
    }
}

impl Default for BorderColor {
    fn default() -> Self {
        BorderColor::Float([0.0; 4])
    }
}

impl Ord for BorderColor {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (BorderColor::Int(a), BorderColor::Int(b)) => a.cmp(b),
            (BorderColor::SignedInt(a), BorderColor::SignedInt(b)) => a.cmp(b),
            (BorderColor::UnsignedInt(a), BorderColor::UnsignedInt(b)) => a.cmp(b),
            (BorderColor::Float(a), BorderColor::Float(b)) => cmp_floats(a, b),
            _ => self.tag().cmp(&other.tag()),
        }
    }
}

impl PartialOrd for BorderColor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BorderColor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BorderColor {}

fn cmp_floats(a: &[f32], b: &[f32]) -> Ordering {
    for (lhs, rhs) in a.iter().zip(b.iter()) {
        match lhs.total_cmp(rhs) {
            Ordering::Equal => continue,
            v => return v,
        }
    }

    a.len().cmp(&b.len())
}

/// Texture sampling parameters.
///
/// Equality and ordering are total over every field (floats compare by their
/// IEEE total order), so equal parameters always share one native sampler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerParams {
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
    /// Wrap modes of the S, T and R coordinates.
    pub wrap: [TextureWrap; 3],
    pub min_lod: f32,
    pub max_lod: f32,
    pub lod_bias: f32,
    /// Depth comparison of shadow samplers.
    pub compare: Option<Comparison>,
    pub max_anisotropy: f32,
    pub border: BorderColor,
}

impl Default for SamplerParams {
    fn default() -> Self {
        SamplerParams {
            min_filter: MinFilter::NearestMipmapLinear,
            mag_filter: MagFilter::Linear,
            wrap: [TextureWrap::Repeat; 3],
            min_lod: -1000.0,
            max_lod: 1000.0,
            lod_bias: 0.0,
            compare: None,
            max_anisotropy: 1.0,
            border: BorderColor::default(),
        }
    }
}

impl SamplerParams {
    /// Linear filtering without mipmaps, clamped to the edges.
    pub fn linear() -> Self {
        SamplerParams {
            min_filter: MinFilter::Linear,
            mag_filter: MagFilter::Linear,
            wrap: [TextureWrap::ClampToEdge; 3],
            ..Default::default()
        }
    }

    /// Nearest filtering without mipmaps, clamped to the edges.
    pub fn nearest() -> Self {
        SamplerParams {
            min_filter: MinFilter::Nearest,
            mag_filter: MagFilter::Nearest,
            wrap: [TextureWrap::ClampToEdge; 3],
            ..Default::default()
        }
    }
}

impl Ord for SamplerParams {
    fn cmp(&self, other: &Self) -> Ordering {
        self.min_filter
            .cmp(&other.min_filter)
            .then(self.mag_filter.cmp(&other.mag_filter))
            .then(self.wrap.cmp(&other.wrap))
            .then(cmp_floats(
                &[self.min_lod, self.max_lod, self.lod_bias, self.max_anisotropy],
                &[
                    other.min_lod,
                    other.max_lod,
                    other.lod_bias,
                    other.max_anisotropy,
                ],
            ))
            .then(self.compare.cmp(&other.compare))
            .then(self.border.cmp(&other.border))
    }
}

impl PartialOrd for SamplerParams {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SamplerParams {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SamplerParams {}

/// A reference to a shared native sampler object. Obtained from and given back
/// to the `Context`; dropping it without `delete_sampler` leaks the reference.
#[derive(Debug, PartialEq, Eq)]
pub struct Sampler {
    params: SamplerParams,
    id: u32,
}

impl Sampler {
    #[inline]
    pub fn params(&self) -> &SamplerParams {
        &self.params
    }

    /// The shared native sampler object.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }
}

#[derive(Debug)]
struct SharedSampler {
    id: u32,
    refs: usize,
}

/// Native sampler objects shared between equal parameter sets.
#[derive(Debug, Default)]
pub struct SamplerRegistry {
    samplers: BTreeMap<SamplerParams, SharedSampler>,
}

impl SamplerRegistry {
    pub fn new() -> Self {
        SamplerRegistry::default()
    }

    /// Takes a reference of the native sampler of `params`, creating it on the
    /// first request.
    pub fn acquire(&mut self, device: &mut dyn Device, params: SamplerParams) -> Sampler {
        let shared = self.samplers.entry(params).or_insert_with(|| SharedSampler {
            id: device.create_sampler(&params),
            refs: 0,
        });

        shared.refs += 1;
        if shared.refs > 1 {
            debug!("Shares sampler {} ({} references).", shared.id, shared.refs);
        }

        Sampler {
            params,
            id: shared.id,
        }
    }

    /// Gives back a reference. Returns the native id if this was the last one
    /// and the native object has been deleted.
    pub fn release(&mut self, device: &mut dyn Device, sampler: Sampler) -> Option<u32> {
        let remove = match self.samplers.get_mut(&sampler.params) {
            Some(shared) => {
                shared.refs -= 1;
                shared.refs == 0
            }
            None => false,
        };

        if remove {
            self.samplers.remove(&sampler.params);
            device.delete_sampler(sampler.id);
            Some(sampler.id)
        } else {
            None
        }
    }

    /// Number of references to the native sampler of `params`.
    pub fn references(&self, params: &SamplerParams) -> usize {
        self.samplers.get(params).map(|v| v.refs).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backends::headless::HeadlessDevice;

    #[test]
    fn total_order() {
        let a = SamplerParams::default();
        let mut b = a;
        assert_eq!(a, b);

        b.lod_bias = -0.0;
        assert!(a != b);
        assert_eq!(a.cmp(&b), b.cmp(&a).reverse());

        b.lod_bias = std::f32::NAN;
        assert_eq!(b, b);

        let mut c = a;
        c.border = BorderColor::Int([0; 4]);
        assert!(c < a);

        c.border = BorderColor::UnsignedInt([0; 4]);
        assert!(c > a);
    }

    #[test]
    fn dedup() {
        let mut device = HeadlessDevice::new();
        let mut registry = SamplerRegistry::new();

        let s1 = registry.acquire(&mut device, SamplerParams::linear());
        let s2 = registry.acquire(&mut device, SamplerParams::linear());
        let s3 = registry.acquire(&mut device, SamplerParams::nearest());
        assert_eq!(s1.id(), s2.id());
        assert!(s1.id() != s3.id());
        assert_eq!(registry.references(&SamplerParams::linear()), 2);

        assert_eq!(registry.release(&mut device, s1), None);
        let id = s2.id();
        assert_eq!(registry.release(&mut device, s2), Some(id));
        assert_eq!(registry.references(&SamplerParams::linear()), 0);
        assert_eq!(registry.len(), 1);
    }
}
