//! The explicit registry of one native graphics context.
//!
//! A `Context` owns the device and every object created through it, plus the
//! state the native context is known to be in: the bound framebuffer and the
//! parameters applied to it, the program in use, the texture units, shared
//! samplers and shared uniform block buffers.
//!
//! Nothing reaches the driver until it is needed. A draw goes through
//! `activate_framebuffer` (binding, parameter diffing, attachments, draw
//! buffers), then `activate_program` (program, sampler units, uniform blocks,
//! deferred uniforms), then the vertex array of the mesh, and only then issues
//! the native draw call.

use std::collections::HashMap;

use cgmath::{Vector2, Vector3};

use crate::backends::headless::HeadlessDevice;
use crate::backends::{AttribPointer, Capabilities, Device};
use crate::errors::{Error, Result};
use crate::framebuffer::{
    AppliedParameters, Attachment, AttachmentPoint, FrameBuffer, FrameBufferHandle, Generations,
};
use crate::mesh::{Mesh, MeshHandle, MeshIndex, MeshParams};
use crate::program::{
    BlockBufferRegistry, ModuleRegistry, Program, ProgramHandle, ShaderSource, UniformId,
    UniformLocation, UniformValue,
};
use crate::sampler::{Sampler, SamplerParams, SamplerRegistry};
use crate::settings::{ContextSettings, MAX_TEXTURE_UNITS};
use crate::texture::{
    RenderBuffer, RenderBufferHandle, Texture, TextureHandle, TextureParams, TextureUnitManager,
};
use crate::types::*;
use crate::utils::prelude::ObjectPool;

pub struct Context {
    device: Box<dyn Device>,
    settings: ContextSettings,
    capabilities: Capabilities,
    generations: Generations,

    framebuffers: ObjectPool<FrameBufferHandle, FrameBuffer>,
    default_framebuffer: FrameBufferHandle,
    current_framebuffer: Option<FrameBufferHandle>,
    applied: AppliedParameters,
    renderbuffers: ObjectPool<RenderBufferHandle, RenderBuffer>,

    textures: ObjectPool<TextureHandle, Texture>,
    units: TextureUnitManager,
    samplers: SamplerRegistry,

    modules: ModuleRegistry,
    programs: ObjectPool<ProgramHandle, Program>,
    blocks: BlockBufferRegistry,
    current_program: Option<ProgramHandle>,

    meshes: ObjectPool<MeshHandle, Mesh>,
    vertex_arrays: HashMap<(ProgramHandle, MeshHandle), u32>,
    current_vertex_array: u32,
}

impl Context {
    /// Creates a context on top of `device`, which must stand for a native
    /// context that is current on this thread.
    pub fn new(device: Box<dyn Device>, settings: ContextSettings) -> Result<Self> {
        let capabilities = device.capabilities();
        let units = capabilities
            .max_texture_units
            .min(settings.max_texture_units)
            .min(MAX_TEXTURE_UNITS);

        if units == 0 {
            return Err(Error::Requirement("texture units".into()));
        }

        info!(
            "Creates graphics context of {:?} with {} texture units, {} uniform buffer bindings \
             and {} draw buffers (blending per buffer: {}, writes into programs: {}).",
            capabilities.version,
            units,
            capabilities.max_uniform_buffer_bindings,
            capabilities.max_draw_buffers,
            capabilities.draw_buffers_blend,
            capabilities.program_uniforms
        );

        let blocks = BlockBufferRegistry::new(capabilities.max_uniform_buffer_bindings);
        let generations = Generations::new();
        let mut framebuffers = ObjectPool::new();
        let default = FrameBuffer::new(0, true, settings.dimensions, &generations);
        let default_framebuffer = framebuffers.create(default);

        Ok(Context {
            device,
            settings,
            capabilities,
            generations,

            framebuffers,
            default_framebuffer,
            current_framebuffer: None,
            applied: AppliedParameters::default(),
            renderbuffers: ObjectPool::new(),

            textures: ObjectPool::new(),
            units: TextureUnitManager::new(units),
            samplers: SamplerRegistry::new(),

            modules: ModuleRegistry::new(),
            programs: ObjectPool::new(),
            blocks,
            current_program: None,

            meshes: ObjectPool::new(),
            vertex_arrays: HashMap::new(),
            current_vertex_array: 0,
        })
    }

    /// Creates a context without any native context behind it.
    pub fn headless(settings: ContextSettings) -> Result<Self> {
        Context::new(Box::new(HeadlessDevice::new()), settings)
    }

    #[inline]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[inline]
    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    #[inline]
    pub fn texture_units(&self) -> &TextureUnitManager {
        &self.units
    }

    /// The parameters known to be applied to the bound framebuffer.
    #[inline]
    pub fn applied_parameters(&self) -> &AppliedParameters {
        &self.applied
    }

    #[inline]
    pub fn current_framebuffer(&self) -> Option<FrameBufferHandle> {
        self.current_framebuffer
    }

    #[inline]
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    /// Polls native errors. They are caller bugs, so they are asserted in
    /// debug builds and logged otherwise.
    fn check(&mut self, op: &str) {
        if !self.settings.check_errors {
            return;
        }

        while let Some(err) = self.device.poll_error() {
            error!("Native error while {}: {}.", op, err);
            debug_assert!(false, "native error while {}: {}", op, err);
        }
    }
}

// Framebuffers and render buffers.
impl Context {
    /// The on-screen framebuffer.
    #[inline]
    pub fn default_framebuffer(&self) -> FrameBufferHandle {
        self.default_framebuffer
    }

    pub fn framebuffer(&self, handle: FrameBufferHandle) -> Result<&FrameBuffer> {
        self.framebuffers
            .get(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))
    }

    pub fn framebuffer_mut(&mut self, handle: FrameBufferHandle) -> Result<&mut FrameBuffer> {
        self.framebuffers
            .get_mut(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))
    }

    /// Creates an off-screen framebuffer. Its viewport covers `dimensions`.
    pub fn create_framebuffer(&mut self, dimensions: Vector2<u32>) -> FrameBufferHandle {
        let id = self.device.create_framebuffer();
        let fb = FrameBuffer::new(id, false, dimensions, &self.generations);
        self.check("creating framebuffer");
        self.framebuffers.create(fb)
    }

    pub fn delete_framebuffer(&mut self, handle: FrameBufferHandle) -> Result<()> {
        if handle == self.default_framebuffer {
            return Err(Error::InvalidOperation(
                "the default framebuffer lives as long as the context".into(),
            ));
        }

        let fb = self
            .framebuffers
            .free(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

        // Deleting the bound framebuffer falls back to the default one natively.
        if self.current_framebuffer == Some(handle) {
            self.current_framebuffer = None;
            self.applied.reset();
        }

        self.device.delete_framebuffer(fb.id);
        self.check("deleting framebuffer");
        Ok(())
    }

    pub fn create_renderbuffer(
        &mut self,
        format: TextureFormat,
        dimensions: Vector2<u32>,
    ) -> Result<RenderBufferHandle> {
        if dimensions.x == 0 || dimensions.y == 0 {
            return Err(Error::InvalidOperation(format!(
                "render buffer dimensions {:?}",
                dimensions
            )));
        }

        let id = self.device.create_renderbuffer(format, dimensions);
        self.check("creating render buffer");
        Ok(self.renderbuffers.create(RenderBuffer {
            id,
            format,
            dimensions,
        }))
    }

    pub fn renderbuffer(&self, handle: RenderBufferHandle) -> Result<&RenderBuffer> {
        self.renderbuffers
            .get(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))
    }

    /// Deletes a render buffer, detaching it from every framebuffer.
    pub fn delete_renderbuffer(&mut self, handle: RenderBufferHandle) -> Result<()> {
        let rb = self
            .renderbuffers
            .free(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

        for (_, fb) in self.framebuffers.iter_mut() {
            fb.forget_render_buffer(handle);
        }

        self.device.delete_renderbuffer(rb.id);
        self.check("deleting render buffer");
        Ok(())
    }

    /// Makes `handle` the bound framebuffer and brings the native state in
    /// line with it.
    pub fn activate_framebuffer(&mut self, handle: FrameBufferHandle) -> Result<()> {
        let fb = self
            .framebuffers
            .get_mut(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

        let mut parameters_changed = fb.parameters_changed;
        if self.current_framebuffer != Some(handle) {
            self.device.bind_framebuffer(fb.id);
            self.current_framebuffer = Some(handle);

            // The native context keeps no generations, everything is unknown.
            self.applied.reset();
            parameters_changed = true;
        }

        if parameters_changed {
            let n = fb
                .parameters()
                .apply(&mut self.applied, &mut *self.device, &self.capabilities)?;
            trace!("Applies {} parameter groups of {}.", n, handle);
            fb.parameters_changed = false;
        }

        if !fb.is_default() && fb.attachments_changed {
            for (slot, &point) in AttachmentPoint::all().iter().enumerate() {
                match fb.attachments()[slot] {
                    None => self.device.detach(point),
                    Some(Attachment::RenderBuffer(h)) => {
                        let rb = self
                            .renderbuffers
                            .get(h)
                            .ok_or_else(|| Error::InvalidHandle(h.to_string()))?;
                        self.device.attach_renderbuffer(point, rb.id);
                    }
                    Some(Attachment::Texture {
                        texture,
                        level,
                        layer,
                    }) => {
                        let t = self
                            .textures
                            .get(texture)
                            .ok_or_else(|| Error::InvalidHandle(texture.to_string()))?;
                        let target = t.params.target;
                        self.device.attach_texture(point, target, t.id, level, layer);
                    }
                }
            }

            let status = self.device.check_framebuffer_status();
            if status != FramebufferStatus::Complete {
                return Err(Error::FramebufferIncomplete(status));
            }

            fb.attachments_changed = false;
        }

        if fb.read_draw_changed {
            self.device.read_buffer(fb.read_buffer());
            self.device.draw_buffers(fb.draw_buffers());
            fb.read_draw_changed = false;
        }

        Ok(())
    }

    /// Clears the selected buffers of a framebuffer.
    pub fn clear(
        &mut self,
        handle: FrameBufferHandle,
        color: bool,
        depth: bool,
        stencil: bool,
    ) -> Result<()> {
        self.activate_framebuffer(handle)?;

        let mask = ClearMask {
            color,
            depth,
            stencil,
        };

        if !mask.is_empty() {
            self.device.clear(mask);
        }

        self.check("clearing");
        Ok(())
    }

    /// Reads a rectangle of pixels from the read buffer of a framebuffer.
    pub fn read_pixels(
        &mut self,
        handle: FrameBufferHandle,
        position: Vector2<i32>,
        size: Vector2<u32>,
        format: TextureFormat,
    ) -> Result<Vec<u8>> {
        self.activate_framebuffer(handle)?;

        let mut out = vec![0; size.x as usize * size.y as usize * format.size()];
        self.device.read_pixels(position, size, format, &mut out);
        self.check("reading pixels");
        Ok(out)
    }
}

// Textures and samplers.
impl Context {
    /// Creates a texture with storage for every level, and optionally fills
    /// its first level with `data`.
    pub fn create_texture(
        &mut self,
        params: TextureParams,
        data: Option<&[u8]>,
    ) -> Result<TextureHandle> {
        params.validate()?;

        let d = params.dimensions;
        let len = d.x as usize * d.y as usize * d.z as usize * params.format.size();
        if data.map_or(false, |v| v.len() != len) {
            return Err(Error::OutOfBounds);
        }

        let id = self.device.create_texture();
        let handle = self.textures.create(Texture::new(id, params));

        if let Err(err) = self.bind_for_upload(handle) {
            self.textures.free(handle);
            self.device.delete_texture(id);
            return Err(err);
        }

        self.device
            .texture_storage(params.target, params.format, d, params.levels);

        if let Some(data) = data {
            let offset = Vector3::new(0, 0, 0);
            self.device
                .texture_sub_image(params.target, 0, offset, d, params.format, data);
        }

        self.check("creating texture");
        Ok(handle)
    }

    /// Uploads a box of pixels into a level of a texture.
    pub fn update_texture(
        &mut self,
        handle: TextureHandle,
        level: u32,
        offset: Vector3<u32>,
        size: Vector3<u32>,
        data: &[u8],
    ) -> Result<()> {
        let params = *self.texture(handle)?.params();
        if level >= params.levels {
            return Err(Error::OutOfBounds);
        }

        let d = params.level_dimensions(level);
        let fits = |o: u32, s: u32, d: u32| o.checked_add(s).map_or(false, |end| end <= d);
        if !fits(offset.x, size.x, d.x) || !fits(offset.y, size.y, d.y) || !fits(offset.z, size.z, d.z) {
            return Err(Error::OutOfBounds);
        }

        let len = size.x as usize * size.y as usize * size.z as usize * params.format.size();
        if data.len() != len {
            return Err(Error::OutOfBounds);
        }

        self.bind_for_upload(handle)?;
        self.device
            .texture_sub_image(params.target, level, offset, size, params.format, data);
        self.check("updating texture");
        Ok(())
    }

    pub fn texture(&self, handle: TextureHandle) -> Result<&Texture> {
        self.textures
            .get(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))
    }

    /// Deletes a texture, removing it from every sampler uniform, framebuffer
    /// and texture unit first.
    pub fn delete_texture(&mut self, handle: TextureHandle) -> Result<()> {
        let texture = self
            .textures
            .free(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

        for (_, program) in self.programs.iter_mut() {
            for u in &mut program.uniforms {
                if u.texture.map(|v| v.0) == Some(handle) {
                    u.texture = None;
                    u.unit = None;
                }
            }
        }

        for (_, fb) in self.framebuffers.iter_mut() {
            fb.forget_texture(handle);
        }

        self.units.release_texture(handle);
        self.device.delete_texture(texture.id);
        self.check("deleting texture");
        Ok(())
    }

    /// Takes a reference of the shared sampler object of `params`.
    pub fn create_sampler(&mut self, params: SamplerParams) -> Sampler {
        let sampler = self.samplers.acquire(&mut *self.device, params);
        self.check("creating sampler");
        sampler
    }

    /// Number of live references to the sampler object of `params`.
    pub fn sampler_references(&self, params: &SamplerParams) -> usize {
        self.samplers.references(params)
    }

    /// Gives back a sampler reference. The native object goes away with the
    /// last one, and sampler uniforms using it fall back to the sampling
    /// state of their textures.
    pub fn delete_sampler(&mut self, sampler: Sampler) {
        if let Some(id) = self.samplers.release(&mut *self.device, sampler) {
            self.units.release_sampler(&mut self.textures, id);

            for (_, program) in self.programs.iter_mut() {
                for u in &mut program.uniforms {
                    if let Some((texture, sampler)) = u.texture {
                        if sampler == id {
                            u.texture = Some((texture, 0));
                        }
                    }
                }
            }
        }

        self.check("deleting sampler");
    }

    /// Binds `texture` with `sampler` into some unit on behalf of `consumer`,
    /// reusing the unit it already occupies with that sampler.
    fn bind_texture_unit(
        &mut self,
        texture: TextureHandle,
        sampler: u32,
        consumer: Option<ProgramHandle>,
    ) -> Result<usize> {
        let unit = self.texture(texture)?.unit(sampler);
        let unit = match unit {
            Some(unit) => unit,
            None => self.units.find_free(consumer, &self.textures)?,
        };

        self.units
            .bind(&mut *self.device, &mut self.textures, unit, sampler, Some(texture))?;
        Ok(unit)
    }

    /// Binds a texture into the active unit for uploads, without evicting any
    /// texture of the program in use.
    fn bind_for_upload(&mut self, texture: TextureHandle) -> Result<()> {
        let unit = self.texture(texture)?.units().next();
        let unit = match unit {
            Some(unit) => unit,
            None => {
                let unit = self.units.find_free(self.current_program, &self.textures)?;
                let sampler = self.units.units()[unit].sampler();
                self.units
                    .bind(&mut *self.device, &mut self.textures, unit, sampler, Some(texture))?;
                unit
            }
        };

        self.units.activate(&mut *self.device, unit);
        Ok(())
    }
}

// Programs and uniforms.
impl Context {
    /// Compiles, links and reflects a program. Uniforms declared with initial
    /// values in `sources` get them, except members of uniform blocks whose
    /// buffer is already shared with another program.
    pub fn create_program(&mut self, sources: &[ShaderSource]) -> Result<ProgramHandle> {
        if sources.is_empty() {
            return Err(Error::InvalidOperation("linking a program without shaders".into()));
        }

        let mut shaders = Vec::with_capacity(sources.len());
        for src in sources {
            match self.modules.compile(&mut *self.device, src) {
                Ok(id) => shaders.push(id),
                Err(err) => {
                    self.modules.release(&mut *self.device, None);
                    return Err(err);
                }
            }
        }

        let id = match self.device.link_program(&shaders) {
            Ok(id) => id,
            Err(log) => {
                self.modules.release(&mut *self.device, None);
                return Err(Error::LinkFailure(log));
            }
        };

        let program = Program::reflect(&mut *self.device, id);

        let mut created = Vec::with_capacity(program.blocks.len());
        for (i, block) in program.blocks.iter().enumerate() {
            match self.blocks.acquire(&mut *self.device, block.key()) {
                Ok(v) => created.push(v),
                Err(err) => {
                    for block in &program.blocks[..i] {
                        self.blocks.release(&mut *self.device, block.key());
                    }

                    self.device.delete_program(id);
                    self.modules.release(&mut *self.device, None);
                    return Err(err);
                }
            }

            if let Some(binding) = self.blocks.binding(block.key()) {
                self.device.uniform_block_binding(id, block.index(), binding);
            }
        }

        let handle = self.programs.create(program);
        for src in sources {
            self.modules.retain(src, handle);
        }

        for src in sources {
            for &(ref name, ref value) in &src.defaults {
                let (uniform, block) = {
                    let program = self.program(handle)?;
                    match program.uniform(name) {
                        Some(id) => (id, program.uniforms[id.0].block()),
                        None => {
                            debug!("Skips default of {}, which is not active in {}.", name, handle);
                            continue;
                        }
                    }
                };

                if block.map_or(true, |v| created[v]) {
                    if let Err(err) = self.set_uniform(handle, uniform, value.clone()) {
                        warn!("Skips default of {}: {}", name, err);
                    }
                }
            }
        }

        self.check("creating program");
        Ok(handle)
    }

    pub fn program(&self, handle: ProgramHandle) -> Result<&Program> {
        self.programs
            .get(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))
    }

    /// Looks up a uniform of `program` by name.
    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Result<Option<UniformId>> {
        Ok(self.program(program)?.uniform(name))
    }

    /// Deletes a program, and the shaders no other program shares.
    pub fn delete_program(&mut self, handle: ProgramHandle) -> Result<()> {
        let program = self
            .programs
            .free(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

        if self.current_program == Some(handle) {
            self.device.use_program(0);
            self.current_program = None;
        }

        for u in &program.uniforms {
            if let Some((texture, _)) = u.texture {
                if let Some(t) = self.textures.get_mut(texture) {
                    t.users.remove(&handle);
                }
            }
        }

        for block in &program.blocks {
            self.blocks.release(&mut *self.device, block.key());
        }

        self.device.delete_program(program.id);
        self.modules.release(&mut *self.device, Some(handle));

        let vaos: Vec<_> = self
            .vertex_arrays
            .keys()
            .filter(|v| v.0 == handle)
            .cloned()
            .collect();

        for key in vaos {
            if let Some(vao) = self.vertex_arrays.remove(&key) {
                self.delete_vertex_array(vao);
            }
        }

        self.check("deleting program");
        Ok(())
    }

    /// Writes a value into a uniform.
    ///
    /// Free-standing uniforms are written into the driver right away if the
    /// program is in use or the device writes into programs directly, and
    /// when the program gets activated otherwise. Block members are written
    /// into the shared block buffer, which is flushed when any program using
    /// it is activated.
    pub fn set_uniform<T>(&mut self, handle: ProgramHandle, uniform: UniformId, value: T) -> Result<()>
    where
        T: Into<UniformValue>,
    {
        let value = value.into();
        let current = self.current_program == Some(handle);
        let direct = self.capabilities.program_uniforms && !self.settings.deferred_uniforms;

        let program = self
            .programs
            .get_mut(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

        let u = program
            .uniforms
            .get_mut(uniform.0)
            .ok_or(Error::OutOfBounds)?;
        u.accept(&value)?;

        match u.location() {
            UniformLocation::Loose(location) => {
                if current {
                    self.device.write_uniform(None, location, &value);
                    u.dirty = false;
                } else if direct {
                    self.device.write_uniform(Some(program.id), location, &value);
                    u.dirty = false;
                } else {
                    u.dirty = true;
                }

                let dirty = u.dirty;
                u.value = Some(value);
                program.pending |= dirty;
            }
            UniformLocation::Block {
                block,
                offset,
                matrix_stride,
                row_major,
            } => {
                let key = program.blocks[block].key();
                self.blocks
                    .write(key, offset, matrix_stride, row_major, &value)?;
            }
        }

        self.check("writing uniform");
        Ok(())
    }

    /// Writes a value into the uniform `name`. Returns false if the program
    /// has no such uniform.
    pub fn set_uniform_by_name<T>(&mut self, handle: ProgramHandle, name: &str, value: T) -> Result<bool>
    where
        T: Into<UniformValue>,
    {
        match self.uniform(handle, name)? {
            Some(uniform) => self.set_uniform(handle, uniform, value).map(|_| true),
            None => Ok(false),
        }
    }

    /// Points a sampler uniform at a texture, sampled with `sampler` or with
    /// the sampling state of the texture itself.
    pub fn set_texture(
        &mut self,
        handle: ProgramHandle,
        uniform: UniformId,
        texture: Option<TextureHandle>,
        sampler: Option<&Sampler>,
    ) -> Result<()> {
        if let Some(texture) = texture {
            self.texture(texture)?;
        }

        let binding = texture.map(|v| (v, sampler.map_or(0, |s| s.id())));
        let previous = {
            let program = self
                .programs
                .get_mut(handle)
                .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

            let u = program
                .uniforms
                .get_mut(uniform.0)
                .ok_or(Error::OutOfBounds)?;

            if !u.ty().is_sampler() {
                return Err(Error::UniformMismatch(
                    u.name().into(),
                    u.ty().to_string(),
                    "texture".into(),
                ));
            }

            ::std::mem::replace(&mut u.texture, binding)
        };

        if let Some((texture, _)) = previous {
            self.refresh_users(handle, texture);
        }

        if let Some((texture, _)) = binding {
            self.refresh_users(handle, texture);
        }

        if self.current_program == Some(handle) {
            self.bind_sampler_uniform(handle, uniform)?;
        }

        self.check("binding texture");
        Ok(())
    }

    fn refresh_users(&mut self, handle: ProgramHandle, texture: TextureHandle) {
        let used = self
            .programs
            .get(handle)
            .map(|p| p.uniforms.iter().any(|u| u.texture.map(|v| v.0) == Some(texture)))
            .unwrap_or(false);

        if let Some(t) = self.textures.get_mut(texture) {
            if used {
                t.users.insert(handle);
            } else {
                t.users.remove(&handle);
            }
        }
    }

    /// Binds the texture of a sampler uniform of the program in use into a
    /// unit, and points the uniform at that unit.
    fn bind_sampler_uniform(&mut self, handle: ProgramHandle, uniform: UniformId) -> Result<()> {
        let (binding, location, last) = {
            let u = self
                .program(handle)?
                .uniform_at(uniform)
                .ok_or(Error::OutOfBounds)?;
            (u.texture(), u.location(), u.unit())
        };

        let (texture, sampler) = match binding {
            Some(v) => v,
            None => return Ok(()),
        };

        let unit = self.bind_texture_unit(texture, sampler, Some(handle))?;
        if last != Some(unit) {
            if let UniformLocation::Loose(location) = location {
                self.device
                    .write_uniform(None, location, &UniformValue::from(unit as i32));
            }

            if let Some(u) = self
                .programs
                .get_mut(handle)
                .and_then(|p| p.uniforms.get_mut(uniform.0))
            {
                u.unit = Some(unit);
            }
        }

        Ok(())
    }

    /// Makes `handle` the program in use, binds the textures of its sampler
    /// uniforms and its uniform block buffers, and flushes every write made
    /// while it was not in use.
    pub fn activate_program(&mut self, handle: ProgramHandle) -> Result<()> {
        if self.current_program != Some(handle) {
            let (id, samplers) = {
                let program = self.program(handle)?;
                (program.id, program.samplers().collect::<Vec<_>>())
            };

            self.device.use_program(id);
            self.current_program = Some(handle);

            // A half-bound program must not count as in use.
            if let Err(err) = self.bind_program_resources(handle, samplers) {
                self.device.use_program(0);
                self.current_program = None;
                return Err(err);
            }
        }

        let program = self
            .programs
            .get_mut(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

        if program.pending {
            for u in program.uniforms.iter_mut().filter(|v| v.dirty) {
                if let (UniformLocation::Loose(location), Some(value)) = (u.location(), u.value()) {
                    self.device.write_uniform(None, location, value);
                }

                u.dirty = false;
            }

            program.pending = false;
        }

        for block in &program.blocks {
            if self.blocks.flush(&mut *self.device, block.key()) {
                trace!("Flushes uniform block {} of {}.", block.name(), handle);
            }
        }

        Ok(())
    }

    fn bind_program_resources(&mut self, handle: ProgramHandle, samplers: Vec<UniformId>) -> Result<()> {
        for uniform in samplers {
            self.bind_sampler_uniform(handle, uniform)?;
        }

        let program = self
            .programs
            .get(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

        for block in &program.blocks {
            self.blocks.bind(&mut *self.device, block.key());
        }

        Ok(())
    }

    /// Host copy of the buffer behind the uniform block `name` of a program.
    pub fn uniform_block_data(&self, handle: ProgramHandle, name: &str) -> Result<Option<&[u8]>> {
        let program = self.program(handle)?;
        Ok(program.block(name).and_then(|v| self.blocks.data(v.key())))
    }

    /// The native buffer object behind the uniform block `name` of a program.
    pub fn uniform_block_buffer(&self, handle: ProgramHandle, name: &str) -> Result<Option<u32>> {
        let program = self.program(handle)?;
        Ok(program.block(name).and_then(|v| self.blocks.buffer(v.key())))
    }

    /// Number of live native shader objects.
    pub fn shader_modules(&self) -> usize {
        self.modules.len()
    }
}

// Meshes and draws.
impl Context {
    pub fn create_mesh(
        &mut self,
        params: MeshParams,
        vertices: Option<&[u8]>,
        indices: Option<&[u8]>,
    ) -> Result<MeshHandle> {
        let (vlen, ilen) = (params.vertex_buffer_len(), params.index_buffer_len());
        if vlen == 0
            || vertices.map_or(false, |v| v.len() > vlen)
            || indices.map_or(false, |v| v.len() > ilen)
        {
            return Err(Error::OutOfBounds);
        }

        self.unbind_vertex_array();
        let vbo = self
            .device
            .create_buffer(BufferTarget::Array, params.hint, vlen, vertices);

        let ibo = if ilen > 0 {
            self.device
                .create_buffer(BufferTarget::ElementArray, params.hint, ilen, indices)
        } else {
            0
        };

        self.check("creating mesh");
        Ok(self.meshes.create(Mesh { vbo, ibo, params }))
    }

    pub fn mesh(&self, handle: MeshHandle) -> Result<&Mesh> {
        self.meshes
            .get(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))
    }

    /// Writes vertices starting from the `offset`-th byte.
    pub fn update_vertex_buffer(&mut self, handle: MeshHandle, offset: usize, data: &[u8]) -> Result<()> {
        let (vbo, len) = {
            let mesh = self.updatable_mesh(handle)?;
            (mesh.vbo, mesh.params.vertex_buffer_len())
        };

        if offset + data.len() > len {
            return Err(Error::OutOfBounds);
        }

        self.unbind_vertex_array();
        self.device.update_buffer(BufferTarget::Array, vbo, offset, data);
        self.check("updating vertex buffer");
        Ok(())
    }

    /// Writes indices starting from the `offset`-th byte.
    pub fn update_index_buffer(&mut self, handle: MeshHandle, offset: usize, data: &[u8]) -> Result<()> {
        let (ibo, len) = {
            let mesh = self.updatable_mesh(handle)?;
            (mesh.ibo, mesh.params.index_buffer_len())
        };

        if ibo == 0 || offset + data.len() > len {
            return Err(Error::OutOfBounds);
        }

        self.unbind_vertex_array();
        self.device
            .update_buffer(BufferTarget::ElementArray, ibo, offset, data);
        self.check("updating index buffer");
        Ok(())
    }

    fn updatable_mesh(&self, handle: MeshHandle) -> Result<&Mesh> {
        let mesh = self.mesh(handle)?;
        if mesh.params.hint == BufferHint::Immutable {
            return Err(Error::InvalidOperation(format!("updating immutable {}", handle)));
        }

        Ok(mesh)
    }

    pub fn delete_mesh(&mut self, handle: MeshHandle) -> Result<()> {
        let mesh = self
            .meshes
            .free(handle)
            .ok_or_else(|| Error::InvalidHandle(handle.to_string()))?;

        let vaos: Vec<_> = self
            .vertex_arrays
            .keys()
            .filter(|v| v.1 == handle)
            .cloned()
            .collect();

        for key in vaos {
            if let Some(vao) = self.vertex_arrays.remove(&key) {
                self.delete_vertex_array(vao);
            }
        }

        self.device.delete_buffer(mesh.vbo);
        if mesh.ibo != 0 {
            self.device.delete_buffer(mesh.ibo);
        }

        self.check("deleting mesh");
        Ok(())
    }

    fn unbind_vertex_array(&mut self) {
        if self.current_vertex_array != 0 {
            self.device.bind_vertex_array(0);
            self.current_vertex_array = 0;
        }
    }

    fn delete_vertex_array(&mut self, vao: u32) {
        if self.current_vertex_array == vao {
            self.current_vertex_array = 0;
        }

        self.device.delete_vertex_array(vao);
    }

    /// Binds the vertex array feeding `mesh` into `program`, creating it on
    /// first use.
    fn bind_mesh(&mut self, program: ProgramHandle, mesh: MeshHandle) -> Result<()> {
        let vao = match self.vertex_arrays.get(&(program, mesh)) {
            Some(&vao) => vao,
            None => {
                let p = self
                    .programs
                    .get(program)
                    .ok_or_else(|| Error::InvalidHandle(program.to_string()))?;
                let m = self
                    .meshes
                    .get(mesh)
                    .ok_or_else(|| Error::InvalidHandle(mesh.to_string()))?;

                let vao = self.device.create_vertex_array();
                self.device.bind_vertex_array(vao);
                self.device.bind_buffer(BufferTarget::Array, m.vbo);

                let layout = &m.params.layout;
                for element in layout.elements() {
                    match self.device.attribute_location(p.id, &element.name) {
                        Some(location) => self.device.vertex_attrib_pointer(AttribPointer {
                            location,
                            size: element.size,
                            format: element.format,
                            normalized: element.normalized,
                            stride: layout.stride(),
                            offset: element.offset,
                        }),
                        None => trace!("{} has no input {}.", program, element.name),
                    }
                }

                if m.ibo != 0 {
                    self.device.bind_buffer(BufferTarget::ElementArray, m.ibo);
                }

                self.vertex_arrays.insert((program, mesh), vao);
                self.current_vertex_array = vao;
                vao
            }
        };

        if self.current_vertex_array != vao {
            self.device.bind_vertex_array(vao);
            self.current_vertex_array = vao;
        }

        Ok(())
    }

    /// Draws a range of `mesh` with `program` into a framebuffer. Returns the
    /// number of assembled primitives.
    pub fn draw(
        &mut self,
        fb: FrameBufferHandle,
        program: ProgramHandle,
        mesh: MeshHandle,
        index: MeshIndex,
    ) -> Result<u32> {
        let (from, len, indexed, params) = {
            let m = self.mesh(mesh)?;
            let p = &m.params;
            if m.ibo != 0 {
                let (from, len) = index.range(p.num_indices)?;
                (from, len, true, (p.primitive, p.index_format))
            } else {
                let (from, len) = index.range(p.num_vertices)?;
                (from, len, false, (p.primitive, p.index_format))
            }
        };

        self.activate_framebuffer(fb)?;
        self.activate_program(program)?;
        self.bind_mesh(program, mesh)?;

        let (primitive, format) = params;
        if indexed {
            let offset = from as usize * format.stride();
            self.device.draw_elements(primitive, len, format, offset);
        } else {
            self.device.draw_arrays(primitive, from, len);
        }

        self.check("drawing");
        Ok(primitive.assemble(len))
    }
}
