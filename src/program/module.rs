//! Compiled shader stages, shared between programs.

use std::collections::{HashMap, HashSet};

use crate::backends::Device;
use crate::errors::{Error, Result};
use crate::types::ShaderStage;

use super::uniform::UniformValue;
use super::ProgramHandle;

/// The source of one shader stage, plus the initial values of the uniforms it
/// declares.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub source: String,
    pub defaults: Vec<(String, UniformValue)>,
}

impl ShaderSource {
    pub fn new<T: Into<String>>(stage: ShaderStage, source: T) -> Self {
        ShaderSource {
            stage,
            source: source.into(),
            defaults: Vec::new(),
        }
    }

    /// Declares the initial value of uniform `name`.
    pub fn with_default<T1, T2>(mut self, name: T1, value: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<UniformValue>,
    {
        self.defaults.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug)]
struct ShaderModule {
    id: u32,
    owners: HashSet<ProgramHandle>,
}

/// Native shader objects keyed by their stage and source.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<(ShaderStage, String), ShaderModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    /// Returns the native shader compiled from `src`, compiling it unless an
    /// identical stage has been compiled before. The returned shader is not
    /// owned by anyone until `retain` is called.
    pub fn compile(&mut self, device: &mut dyn Device, src: &ShaderSource) -> Result<u32> {
        let key = (src.stage, src.source.clone());
        if let Some(module) = self.modules.get(&key) {
            debug!(
                "Shares {:?} shader {} with {} programs.",
                src.stage,
                module.id,
                module.owners.len()
            );
            return Ok(module.id);
        }

        let id = device
            .compile_shader(src.stage, &src.source)
            .map_err(Error::CompileFailure)?;

        self.modules.insert(
            key,
            ShaderModule {
                id,
                owners: HashSet::new(),
            },
        );

        Ok(id)
    }

    /// Records `program` as an owner of the shader compiled from `src`.
    pub fn retain(&mut self, src: &ShaderSource, program: ProgramHandle) {
        if let Some(module) = self.modules.get_mut(&(src.stage, src.source.clone())) {
            module.owners.insert(program);
        }
    }

    /// Drops `program` from the owners of every module, deleting the native
    /// shaders nobody owns anymore.
    pub fn release(&mut self, device: &mut dyn Device, program: Option<ProgramHandle>) {
        let mut removes = Vec::new();
        for (key, module) in &mut self.modules {
            if let Some(handle) = program {
                module.owners.remove(&handle);
            }

            if module.owners.is_empty() {
                removes.push(key.clone());
            }
        }

        for key in removes {
            if let Some(module) = self.modules.remove(&key) {
                debug!("Deletes {:?} shader {}.", key.0, module.id);
                device.delete_shader(module.id);
            }
        }
    }

    /// Number of live native shaders.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
