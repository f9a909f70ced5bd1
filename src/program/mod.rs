//! Linked shader programs and their reflected uniforms.
//!
//! A program is reflected once, right after linking. Every active uniform
//! becomes a `Uniform`, arrays are expanded into one uniform per element named
//! `name[i]`, and the plain `name` refers to the first element. Whether a
//! uniform is free-standing or a member of a uniform block is decided here and
//! never changes afterwards.

pub mod block;
pub mod module;
pub mod uniform;

pub use self::block::{BlockBufferRegistry, BlockKey, UniformBlock};
pub use self::module::{ModuleRegistry, ShaderSource};
pub use self::uniform::*;

use std::collections::HashMap;

use crate::backends::Device;

impl_handle!(ProgramHandle);

/// The host-side proxy of a linked program.
#[derive(Debug)]
pub struct Program {
    pub(crate) id: u32,
    pub(crate) uniforms: Vec<Uniform>,
    pub(crate) blocks: Vec<UniformBlock>,
    names: HashMap<String, UniformId>,
    samplers: Vec<UniformId>,
    // Loose uniforms waiting for the program to be activated.
    pub(crate) pending: bool,
}

impl Program {
    /// Builds the proxy of the linked native program `id`.
    pub(crate) fn reflect(device: &mut dyn Device, id: u32) -> Program {
        let mut program = Program {
            id,
            uniforms: Vec::new(),
            blocks: Vec::new(),
            names: HashMap::new(),
            samplers: Vec::new(),
            pending: false,
        };

        let mut indices = HashMap::new();
        for v in device.active_uniform_blocks(id) {
            indices.insert(v.index, program.blocks.len());
            program.blocks.push(UniformBlock {
                index: v.index,
                key: BlockKey {
                    name: v.name,
                    size: v.size,
                    members: v.members,
                },
            });
        }

        for v in device.active_uniforms(id) {
            let block = match v.block {
                Some(index) => match indices.get(&index) {
                    Some(&block) => Some(block),
                    None => {
                        warn!("Uniform {} refers to unknown block {}.", v.name, index);
                        continue;
                    }
                },
                None => None,
            };

            for i in 0..v.size.max(1) {
                let name = if v.size > 1 {
                    format!("{}[{}]", v.name, i)
                } else {
                    v.name.clone()
                };

                let location = match block {
                    Some(block) => UniformLocation::Block {
                        block,
                        offset: v.offset + i * v.array_stride,
                        matrix_stride: v.matrix_stride,
                        row_major: v.row_major,
                    },
                    None => match device.uniform_location(id, &name) {
                        Some(location) => UniformLocation::Loose(location),
                        None => continue,
                    },
                };

                let handle = UniformId(program.uniforms.len());
                if v.ty.is_sampler() {
                    program.samplers.push(handle);
                }

                if v.size > 1 && i == 0 {
                    program.names.insert(v.name.clone(), handle);
                }

                program.names.insert(name.clone(), handle);
                program.uniforms.push(Uniform::new(name, v.ty, location));
            }
        }

        program
    }

    /// The native program object.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Looks up a uniform by name. Returns `None` for names the linker did not
    /// keep, which is perfectly legal for optimized-out uniforms.
    #[inline]
    pub fn uniform(&self, name: &str) -> Option<UniformId> {
        self.names.get(name).cloned()
    }

    #[inline]
    pub fn uniform_at(&self, id: UniformId) -> Option<&Uniform> {
        self.uniforms.get(id.0)
    }

    #[inline]
    pub fn uniforms(&self) -> &[Uniform] {
        &self.uniforms
    }

    #[inline]
    pub fn blocks(&self) -> &[UniformBlock] {
        &self.blocks
    }

    pub fn block(&self, name: &str) -> Option<&UniformBlock> {
        self.blocks.iter().find(|v| v.name() == name)
    }

    /// Iterates over the sampler uniforms.
    pub fn samplers<'a>(&'a self) -> impl Iterator<Item = UniformId> + 'a {
        self.samplers.iter().cloned()
    }
}
