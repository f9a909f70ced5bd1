//! A finite pool of texture units shared by every texture and program of one
//! context, with least-recently-bound eviction.
//!
//! Units holding a texture sampled by the program we are binding for are
//! pinned, they are never picked for eviction on behalf of that program.

use crate::backends::Device;
use crate::errors::{Error, Result};
use crate::program::ProgramHandle;
use crate::types::TextureTarget;
use crate::utils::prelude::ObjectPool;

use super::{Texture, TextureHandle};

/// One hardware texture binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureUnit {
    index: usize,
    sampler: u32,
    texture: Option<TextureHandle>,
    target: Option<TextureTarget>,
    last_binding: u64,
}

impl TextureUnit {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The native sampler object bound to this unit, `0` if none.
    #[inline]
    pub fn sampler(&self) -> u32 {
        self.sampler
    }

    #[inline]
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// The logical time of the last bind into this unit.
    #[inline]
    pub fn last_binding(&self) -> u64 {
        self.last_binding
    }
}

pub struct TextureUnitManager {
    units: Vec<TextureUnit>,
    clock: u64,
    active: Option<usize>,
}

impl TextureUnitManager {
    pub fn new(len: usize) -> Self {
        let units = (0..len)
            .map(|index| TextureUnit {
                index,
                sampler: 0,
                texture: None,
                target: None,
                last_binding: 0,
            })
            .collect();

        TextureUnitManager {
            units,
            clock: 0,
            active: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[inline]
    pub fn units(&self) -> &[TextureUnit] {
        &self.units
    }

    #[inline]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Finds a unit to bind a texture into for `consumer`. Returns an empty
    /// unit if there is one, or else the least recently bound unit whose
    /// texture is not sampled by `consumer`.
    pub fn find_free(
        &self,
        consumer: Option<ProgramHandle>,
        textures: &ObjectPool<TextureHandle, Texture>,
    ) -> Result<usize> {
        if let Some(unit) = self.units.iter().find(|v| v.texture.is_none()) {
            return Ok(unit.index);
        }

        let pinned = |unit: &TextureUnit| match (consumer, unit.texture) {
            (Some(consumer), Some(texture)) => textures
                .get(texture)
                .map(|v| v.is_used_by(consumer))
                .unwrap_or(false),
            _ => false,
        };

        self.units
            .iter()
            .filter(|v| !pinned(v))
            .min_by_key(|v| v.last_binding)
            .map(|v| v.index)
            .ok_or_else(|| {
                let name = consumer
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "nobody".into());
                Error::TextureUnitsExhausted(self.units.len(), name)
            })
    }

    /// Makes `unit` the active texture unit.
    pub fn activate(&mut self, device: &mut dyn Device, unit: usize) {
        if self.active != Some(unit) {
            device.active_texture(unit as u32);
            self.active = Some(unit);
        }
    }

    /// Binds `sampler` and `texture` into `unit`. The binding time of the unit
    /// is refreshed even if nothing changes.
    pub fn bind(
        &mut self,
        device: &mut dyn Device,
        textures: &mut ObjectPool<TextureHandle, Texture>,
        unit: usize,
        sampler: u32,
        texture: Option<TextureHandle>,
    ) -> Result<()> {
        if unit >= self.units.len() {
            return Err(Error::OutOfBounds);
        }

        let incoming = match texture {
            Some(handle) => {
                let v = textures
                    .get(handle)
                    .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;
                Some((v.id, v.params.target))
            }
            None => None,
        };

        self.clock += 1;
        let clock = self.clock;
        self.units[unit].last_binding = clock;

        if self.units[unit].sampler != sampler {
            device.bind_sampler(unit as u32, sampler);
            self.units[unit].sampler = sampler;
        }

        let current = self.units[unit];
        if current.texture != texture {
            if let Some(evicted) = current.texture {
                debug!("Evicts {} from texture unit {}.", evicted, unit);
                if let Some(v) = textures.get_mut(evicted) {
                    v.forget_unit(unit);
                }
            }

            self.activate(device, unit);

            if let Some(target) = current.target {
                if incoming.map(|v| v.1) != Some(target) {
                    device.bind_texture(target, 0);
                }
            }

            if let Some((id, target)) = incoming {
                device.bind_texture(target, id);
            }

            self.units[unit].texture = texture;
            self.units[unit].target = incoming.map(|v| v.1);
        }

        if let Some(v) = texture.and_then(|handle| textures.get_mut(handle)) {
            v.forget_unit(unit);
            v.units.push((sampler, unit));
        }

        Ok(())
    }

    /// Forgets a texture which is about to be deleted. Deleting a texture
    /// unbinds it natively from every unit.
    pub fn release_texture(&mut self, texture: TextureHandle) {
        for unit in &mut self.units {
            if unit.texture == Some(texture) {
                unit.texture = None;
                unit.target = None;
            }
        }
    }

    /// Forgets a sampler object which has been deleted natively.
    pub fn release_sampler(&mut self, textures: &mut ObjectPool<TextureHandle, Texture>, id: u32) {
        for unit in &mut self.units {
            if unit.sampler == id {
                unit.sampler = 0;

                if let Some(v) = unit.texture.and_then(|handle| textures.get_mut(handle)) {
                    v.forget_unit(unit.index);
                    v.units.push((0, unit.index));
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backends::headless::HeadlessDevice;
    use crate::texture::TextureParams;
    use cgmath::Vector3;

    fn texture(textures: &mut ObjectPool<TextureHandle, Texture>, id: u32) -> TextureHandle {
        let params = TextureParams {
            dimensions: Vector3::new(4, 4, 1),
            ..Default::default()
        };

        textures.create(Texture::new(id, params))
    }

    #[test]
    fn bind_and_evict() {
        let mut device = HeadlessDevice::new();
        let probe = device.probe();
        let mut textures = ObjectPool::new();
        let mut manager = TextureUnitManager::new(2);

        let t1 = texture(&mut textures, 1);
        let t2 = texture(&mut textures, 2);
        let t3 = texture(&mut textures, 3);

        assert_eq!(manager.find_free(None, &textures).unwrap(), 0);
        manager.bind(&mut device, &mut textures, 0, 7, Some(t1)).unwrap();
        assert_eq!(manager.find_free(None, &textures).unwrap(), 1);
        manager.bind(&mut device, &mut textures, 1, 7, Some(t2)).unwrap();
        assert_eq!(textures.get(t1).unwrap().unit(7), Some(0));

        // Refreshing unit 0 makes unit 1 the least recently bound one.
        manager.bind(&mut device, &mut textures, 0, 7, Some(t1)).unwrap();
        assert_eq!(probe.count("bind_texture"), 2);
        assert_eq!(probe.count("bind_sampler"), 2);
        assert_eq!(manager.find_free(None, &textures).unwrap(), 1);

        manager.bind(&mut device, &mut textures, 1, 7, Some(t3)).unwrap();
        assert_eq!(textures.get(t2).unwrap().unit(7), None);
        assert_eq!(textures.get(t3).unwrap().unit(7), Some(1));
        assert_eq!(manager.units()[1].texture(), Some(t3));
        assert_eq!(manager.clock(), 4);

        manager.bind(&mut device, &mut textures, 1, 0, None).unwrap();
        assert_eq!(textures.get(t3).unwrap().units().count(), 0);
        assert_eq!(probe.bound_texture(1), 0);
    }

    #[test]
    fn pinned() {
        let mut textures = ObjectPool::new();
        let mut device = HeadlessDevice::new();
        let mut manager = TextureUnitManager::new(2);
        let program = ProgramHandle::default();

        let t1 = texture(&mut textures, 1);
        let t2 = texture(&mut textures, 2);
        manager.bind(&mut device, &mut textures, 0, 0, Some(t1)).unwrap();
        manager.bind(&mut device, &mut textures, 1, 0, Some(t2)).unwrap();

        textures.get_mut(t1).unwrap().users.insert(program);
        assert_eq!(manager.find_free(Some(program), &textures).unwrap(), 1);

        textures.get_mut(t2).unwrap().users.insert(program);
        match manager.find_free(Some(program), &textures) {
            Err(Error::TextureUnitsExhausted(2, _)) => {}
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(manager.find_free(None, &textures).unwrap(), 0);
    }
}
