//! Uniform blocks and the buffers backing them.
//!
//! Blocks with the same name, byte size and member count are assumed to be
//! the same declaration shared by several programs, so they are backed by one
//! buffer object and one binding point.

use std::collections::{BinaryHeap, HashMap};
use std::cmp::Reverse;

use crate::backends::Device;
use crate::errors::{Error, Result};
use crate::types::{BufferHint, BufferTarget};

use super::uniform::UniformValue;

/// The identity of a shared uniform block buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockKey {
    pub name: String,
    pub size: usize,
    pub members: usize,
}

/// A uniform block of one program.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    pub(crate) index: u32,
    pub(crate) key: BlockKey,
}

impl UniformBlock {
    #[inline]
    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Byte size of the block.
    #[inline]
    pub fn size(&self) -> usize {
        self.key.size
    }

    /// Index of this block inside the native program.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn key(&self) -> &BlockKey {
        &self.key
    }
}

#[derive(Debug)]
struct BlockBuffer {
    id: u32,
    binding: u32,
    data: Vec<u8>,
    // Byte range written since the last flush.
    dirty: Option<(usize, usize)>,
    refs: usize,
}

/// Shared buffers of uniform blocks, with the binding points assigned to them.
pub struct BlockBufferRegistry {
    buffers: HashMap<BlockKey, BlockBuffer>,
    frees: BinaryHeap<Reverse<u32>>,
    next_binding: u32,
    max_bindings: u32,
    bound: Vec<u32>,
}

impl BlockBufferRegistry {
    pub fn new(max_bindings: usize) -> Self {
        BlockBufferRegistry {
            buffers: HashMap::new(),
            frees: BinaryHeap::new(),
            next_binding: 0,
            max_bindings: max_bindings as u32,
            bound: vec![0; max_bindings],
        }
    }

    /// Takes a reference of the buffer of `key`, creating it if needed. Returns
    /// true if the buffer was created by this call.
    pub fn acquire(&mut self, device: &mut dyn Device, key: &BlockKey) -> Result<bool> {
        if let Some(buffer) = self.buffers.get_mut(key) {
            buffer.refs += 1;
            debug!(
                "Shares uniform block buffer {} of {:?} ({} users).",
                buffer.id, key, buffer.refs
            );
            return Ok(false);
        }

        let binding = if let Some(Reverse(binding)) = self.frees.pop() {
            binding
        } else if self.next_binding < self.max_bindings {
            self.next_binding += 1;
            self.next_binding - 1
        } else {
            return Err(Error::Requirement(format!(
                "more than {} uniform buffer bindings",
                self.max_bindings
            )));
        };

        let data = vec![0; key.size];
        let id = device.create_buffer(BufferTarget::Uniform, BufferHint::Dynamic, key.size, Some(&data[..]));
        debug!("Creates uniform block buffer {} of {:?} at binding {}.", id, key, binding);

        self.buffers.insert(
            key.clone(),
            BlockBuffer {
                id,
                binding,
                data,
                dirty: None,
                refs: 1,
            },
        );

        Ok(true)
    }

    /// Drops a reference of the buffer of `key`, deleting it with the last one.
    pub fn release(&mut self, device: &mut dyn Device, key: &BlockKey) {
        let remove = match self.buffers.get_mut(key) {
            Some(buffer) => {
                buffer.refs -= 1;
                buffer.refs == 0
            }
            None => false,
        };

        if remove {
            if let Some(buffer) = self.buffers.remove(key) {
                debug!("Deletes uniform block buffer {} of {:?}.", buffer.id, key);
                device.delete_buffer(buffer.id);

                let slot = buffer.binding as usize;
                if self.bound[slot] == buffer.id {
                    self.bound[slot] = 0;
                }

                self.frees.push(Reverse(buffer.binding));
            }
        }
    }

    /// The binding point assigned to the buffer of `key`.
    pub fn binding(&self, key: &BlockKey) -> Option<u32> {
        self.buffers.get(key).map(|v| v.binding)
    }

    /// The native name of the buffer of `key`.
    pub fn buffer(&self, key: &BlockKey) -> Option<u32> {
        self.buffers.get(key).map(|v| v.id)
    }

    /// Host copy of the buffer contents.
    pub fn data(&self, key: &BlockKey) -> Option<&[u8]> {
        self.buffers.get(key).map(|v| &v.data[..])
    }

    pub fn users(&self, key: &BlockKey) -> usize {
        self.buffers.get(key).map(|v| v.refs).unwrap_or(0)
    }

    /// Returns true if the buffer has been written since its last flush.
    pub fn is_dirty(&self, key: &BlockKey) -> bool {
        self.buffers.get(key).map(|v| v.dirty.is_some()).unwrap_or(false)
    }

    /// Writes a member value into the host copy and marks the range dirty.
    pub fn write(
        &mut self,
        key: &BlockKey,
        offset: usize,
        matrix_stride: usize,
        row_major: bool,
        value: &UniformValue,
    ) -> Result<()> {
        let buffer = self
            .buffers
            .get_mut(key)
            .ok_or_else(|| Error::InvalidHandle(format!("Uniform block {:?}", key)))?;

        let len = value.encoded_len(matrix_stride, row_major);
        if offset + len > buffer.data.len() {
            return Err(Error::OutOfBounds);
        }

        value.encode(&mut buffer.data, offset, matrix_stride, row_major);

        let end = offset + len;
        buffer.dirty = Some(match buffer.dirty {
            Some((from, to)) => (from.min(offset), to.max(end)),
            None => (offset, end),
        });

        Ok(())
    }

    /// Uploads the dirty range of the buffer of `key`. Returns true if anything
    /// has been uploaded.
    pub fn flush(&mut self, device: &mut dyn Device, key: &BlockKey) -> bool {
        if let Some(buffer) = self.buffers.get_mut(key) {
            if let Some((from, to)) = buffer.dirty.take() {
                device.update_buffer(BufferTarget::Uniform, buffer.id, from, &buffer.data[from..to]);
                return true;
            }
        }

        false
    }

    /// Binds the buffer of `key` to its binding point unless already there.
    pub fn bind(&mut self, device: &mut dyn Device, key: &BlockKey) {
        if let Some(buffer) = self.buffers.get(key) {
            let slot = buffer.binding as usize;
            if self.bound[slot] != buffer.id {
                device.bind_buffer_base(BufferTarget::Uniform, buffer.binding, buffer.id);
                self.bound[slot] = buffer.id;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backends::headless::HeadlessDevice;

    fn key(name: &str) -> BlockKey {
        BlockKey {
            name: name.into(),
            size: 32,
            members: 2,
        }
    }

    #[test]
    fn share_and_release() {
        let mut device = HeadlessDevice::new();
        let probe = device.probe();
        let mut registry = BlockBufferRegistry::new(2);

        assert!(registry.acquire(&mut device, &key("Camera")).unwrap());
        assert!(!registry.acquire(&mut device, &key("Camera")).unwrap());
        assert_eq!(registry.users(&key("Camera")), 2);
        assert_eq!(probe.count("create_buffer"), 1);

        assert!(registry.acquire(&mut device, &key("Light")).unwrap());
        assert_eq!(registry.binding(&key("Camera")), Some(0));
        assert_eq!(registry.binding(&key("Light")), Some(1));
        assert!(registry.acquire(&mut device, &key("Fog")).is_err());

        registry.release(&mut device, &key("Camera"));
        assert_eq!(probe.count("delete_buffer"), 0);
        registry.release(&mut device, &key("Camera"));
        assert_eq!(probe.count("delete_buffer"), 1);
        assert_eq!(registry.buffer(&key("Camera")), None);

        // The binding point of a released buffer gets recycled.
        assert!(registry.acquire(&mut device, &key("Fog")).unwrap());
        assert_eq!(registry.binding(&key("Fog")), Some(0));
    }

    #[test]
    fn flush_dirty_range() {
        let mut device = HeadlessDevice::new();
        let probe = device.probe();
        let mut registry = BlockBufferRegistry::new(4);
        let k = key("Camera");
        registry.acquire(&mut device, &k).unwrap();

        assert!(!registry.flush(&mut device, &k));
        registry.write(&k, 16, 0, false, &1.0f32.into()).unwrap();
        registry.write(&k, 4, 0, false, &2.0f32.into()).unwrap();
        assert!(registry.is_dirty(&k));
        assert!(registry.write(&k, 24, 0, false, &[1.0f32; 4].into()).is_err());

        assert!(registry.flush(&mut device, &k));
        assert!(!registry.is_dirty(&k));
        assert_eq!(probe.count("update_buffer"), 1);

        let id = registry.buffer(&k).unwrap();
        assert_eq!(probe.buffer_data(id).unwrap(), registry.data(&k).unwrap().to_vec());
        assert!(!registry.flush(&mut device, &k));

        registry.bind(&mut device, &k);
        registry.bind(&mut device, &k);
        assert_eq!(probe.count("bind_buffer_base"), 1);
    }
}
