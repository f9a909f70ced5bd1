//! A device without any driver behind it.
//!
//! It records every call, emulates object names, framebuffer completeness,
//! buffer contents, uniform storage and program reflection, so everything on
//! top of the `Device` trait runs unchanged. `HeadlessProbe` shares the state
//! and lets tests look inside.

pub mod reflect;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use cgmath::{Vector2, Vector3};

use crate::framebuffer::AttachmentPoint;
use crate::program::UniformValue;
use crate::sampler::SamplerParams;
use crate::types::*;

use self::reflect::{Declarations, Interface};
use super::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Image {
    format: TextureFormat,
    dimensions: Vector2<u32>,
}

#[derive(Debug, Clone, Copy)]
struct TextureObject {
    target: Option<TextureTarget>,
    format: TextureFormat,
    dimensions: Vector3<u32>,
}

#[derive(Debug, Default)]
struct FramebufferObject {
    attachments: HashMap<AttachmentPoint, Image>,
    color: [f32; 4],
}

#[derive(Debug)]
struct ProgramObject {
    interface: Interface,
    values: HashMap<i32, UniformValue>,
    bindings: HashMap<u32, u32>,
}

#[derive(Debug, Default)]
struct State {
    capabilities: Capabilities,
    calls: Vec<(&'static str, String)>,
    errors: VecDeque<String>,
    next_id: u32,

    enabled: HashSet<(Capability, Option<u32>)>,
    clear_color: [f32; 4],

    framebuffer: u32,
    framebuffers: HashMap<u32, FramebufferObject>,
    renderbuffers: HashMap<u32, Image>,

    active_unit: u32,
    textures: HashMap<u32, TextureObject>,
    units: HashMap<(u32, TextureTarget), u32>,
    samplers: HashMap<u32, SamplerParams>,
    unit_samplers: HashMap<u32, u32>,

    buffers: HashMap<u32, Vec<u8>>,
    bound_buffers: HashMap<BufferTarget, u32>,
    buffer_bases: HashMap<u32, u32>,

    shaders: HashMap<u32, (ShaderStage, Declarations)>,
    programs: HashMap<u32, ProgramObject>,
    program: u32,

    vertex_arrays: HashSet<u32>,
    vertex_array: u32,
    draws: u32,
}

impl State {
    fn create(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn error<T: Into<String>>(&mut self, desc: T) {
        self.errors.push_back(desc.into());
    }
}

/// Inspects the state of a `HeadlessDevice`, even after the device has been
/// moved into a context.
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Rc<RefCell<State>>,
}

impl HeadlessProbe {
    /// Number of recorded calls to the device method `name`.
    pub fn count(&self, name: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|v| v.0 == name)
            .count()
    }

    /// Every recorded call as `name(arguments)`, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .map(|v| format!("{}({})", v.0, v.1))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Queues a native error, returned by the next poll.
    pub fn inject_error<T: Into<String>>(&self, desc: T) {
        self.state.borrow_mut().error(desc);
    }

    pub fn buffer_data(&self, id: u32) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&id).cloned()
    }

    /// The buffer bound to the uniform buffer binding point `binding`.
    pub fn uniform_buffer_binding(&self, binding: u32) -> u32 {
        self.state
            .borrow()
            .buffer_bases
            .get(&binding)
            .cloned()
            .unwrap_or(0)
    }

    /// The value stored in the loose uniform `name` of `program`.
    pub fn uniform(&self, program: u32, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let program = state.programs.get(&program)?;
        let location = program.interface.locations.get(name)?;
        program.values.get(location).cloned()
    }

    pub fn is_enabled(&self, cap: Capability) -> bool {
        self.state.borrow().enabled.contains(&(cap, None))
    }

    /// The texture bound to `unit`, whatever its target.
    pub fn bound_texture(&self, unit: u32) -> u32 {
        self.state
            .borrow()
            .units
            .iter()
            .find(|(k, v)| k.0 == unit && **v != 0)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    pub fn bound_sampler(&self, unit: u32) -> u32 {
        self.state
            .borrow()
            .unit_samplers
            .get(&unit)
            .cloned()
            .unwrap_or(0)
    }

    pub fn current_program(&self) -> u32 {
        self.state.borrow().program
    }

    pub fn current_framebuffer(&self) -> u32 {
        self.state.borrow().framebuffer
    }

    /// Number of live objects of each kind, (textures, samplers, buffers,
    /// shaders, programs).
    pub fn live_objects(&self) -> (usize, usize, usize, usize, usize) {
        let state = self.state.borrow();
        (
            state.textures.len(),
            state.samplers.len(),
            state.buffers.len(),
            state.shaders.len(),
            state.programs.len(),
        )
    }

    /// Number of live framebuffer and render buffer objects.
    pub fn live_targets(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.framebuffers.len() - 1, state.renderbuffers.len())
    }

    pub fn draws(&self) -> u32 {
        self.state.borrow().draws
    }
}

/// A call-recording device with no native context.
pub struct HeadlessDevice {
    state: Rc<RefCell<State>>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        HeadlessDevice::new()
    }
}

impl HeadlessDevice {
    pub fn new() -> Self {
        HeadlessDevice::with_capabilities(Capabilities::default())
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        let mut state = State::default();
        state.capabilities = capabilities;
        state.framebuffers.insert(0, FramebufferObject::default());

        HeadlessDevice {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: self.state.clone(),
        }
    }

    #[inline]
    fn record<T: Into<String>>(&self, name: &'static str, args: T) -> ::std::cell::RefMut<State> {
        let mut state = self.state.borrow_mut();
        state.calls.push((name, args.into()));
        state
    }
}

fn framebuffer_status(fb: &FramebufferObject) -> FramebufferStatus {
    if fb.attachments.is_empty() {
        return FramebufferStatus::MissingAttachment;
    }

    for (point, image) in &fb.attachments {
        let valid = match *point {
            AttachmentPoint::Color(_) => image.format.is_color(),
            AttachmentPoint::Depth => image.format.has_depth(),
            AttachmentPoint::Stencil => image.format.has_stencil(),
        };

        if !valid || image.dimensions.x == 0 || image.dimensions.y == 0 {
            return FramebufferStatus::IncompleteAttachment;
        }
    }

    let mut iter = fb.attachments.values();
    if let Some(first) = iter.next() {
        if iter.any(|v| v.dimensions != first.dimensions) {
            return FramebufferStatus::IncompleteDimensions;
        }
    }

    FramebufferStatus::Complete
}

impl Device for HeadlessDevice {
    fn capabilities(&self) -> Capabilities {
        self.state.borrow().capabilities
    }

    fn poll_error(&mut self) -> Option<String> {
        self.state.borrow_mut().errors.pop_front()
    }

    fn enable(&mut self, cap: Capability, enable: bool) {
        let mut state = self.record("enable", format!("{:?}, {}", cap, enable));
        // The indexed states follow the global one.
        state.enabled.retain(|v| v.0 != cap);
        if enable {
            state.enabled.insert((cap, None));
        }
    }

    fn enable_indexed(&mut self, cap: Capability, index: u32, enable: bool) {
        let mut state = self.record("enable_indexed", format!("{:?}, {}, {}", cap, index, enable));
        if enable {
            state.enabled.insert((cap, Some(index)));
        } else {
            state.enabled.remove(&(cap, Some(index)));
        }
    }

    fn viewport(&mut self, position: Vector2<i32>, size: Vector2<u32>) {
        self.record("viewport", format!("{:?}, {:?}", position, size));
    }

    fn depth_range(&mut self, near: f64, far: f64) {
        self.record("depth_range", format!("{}, {}", near, far));
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.record("clear_color", format!("{:?}", color)).clear_color = color;
    }

    fn clear_depth(&mut self, depth: f64) {
        self.record("clear_depth", depth.to_string());
    }

    fn clear_stencil(&mut self, stencil: i32) {
        self.record("clear_stencil", stencil.to_string());
    }

    fn point_size(&mut self, size: f32) {
        self.record("point_size", size.to_string());
    }

    fn line_width(&mut self, width: f32) {
        self.record("line_width", width.to_string());
    }

    fn cull_face(&mut self, face: CullFace) {
        self.record("cull_face", format!("{:?}", face));
    }

    fn front_face(&mut self, order: FrontFaceOrder) {
        self.record("front_face", format!("{:?}", order));
    }

    fn polygon_mode(&mut self, mode: PolygonMode) {
        self.record("polygon_mode", format!("{:?}", mode));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.record("polygon_offset", format!("{}, {}", factor, units));
    }

    fn sample_coverage(&mut self, value: f32, invert: bool) {
        self.record("sample_coverage", format!("{}, {}", value, invert));
    }

    fn scissor(&mut self, position: Vector2<i32>, size: Vector2<u32>) {
        self.record("scissor", format!("{:?}, {:?}", position, size));
    }

    fn stencil_func(&mut self, face: Face, func: Comparison, reference: i32, mask: u32) {
        let args = format!("{:?}, {:?}, {}, {:#x}", face, func, reference, mask);
        self.record("stencil_func", args);
    }

    fn stencil_op(&mut self, face: Face, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        let args = format!("{:?}, {:?}, {:?}, {:?}", face, fail, depth_fail, pass);
        self.record("stencil_op", args);
    }

    fn stencil_mask(&mut self, face: Face, mask: u32) {
        self.record("stencil_mask", format!("{:?}, {:#x}", face, mask));
    }

    fn depth_func(&mut self, func: Comparison) {
        self.record("depth_func", format!("{:?}", func));
    }

    fn depth_mask(&mut self, write: bool) {
        self.record("depth_mask", write.to_string());
    }

    fn blend_func(&mut self, buffer: Option<u32>, factors: BlendFactors) {
        self.record("blend_func", format!("{:?}, {:?}", buffer, factors));
    }

    fn blend_equation(&mut self, buffer: Option<u32>, rgb: Equation, alpha: Equation) {
        let args = format!("{:?}, {:?}, {:?}", buffer, rgb, alpha);
        self.record("blend_equation", args);
    }

    fn blend_color(&mut self, color: [f32; 4]) {
        self.record("blend_color", format!("{:?}", color));
    }

    fn logic_op(&mut self, op: LogicOp) {
        self.record("logic_op", format!("{:?}", op));
    }

    fn color_mask(&mut self, buffer: Option<u32>, mask: [bool; 4]) {
        self.record("color_mask", format!("{:?}, {:?}", buffer, mask));
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut state = self.record("clear", format!("{:?}", mask));
        if mask.color {
            let (id, color) = (state.framebuffer, state.clear_color);
            if let Some(fb) = state.framebuffers.get_mut(&id) {
                fb.color = color;
            }
        }
    }

    fn create_framebuffer(&mut self) -> u32 {
        let mut state = self.record("create_framebuffer", "");
        let id = state.create();
        state.framebuffers.insert(id, FramebufferObject::default());
        id
    }

    fn delete_framebuffer(&mut self, id: u32) {
        let mut state = self.record("delete_framebuffer", id.to_string());
        state.framebuffers.remove(&id);
        if state.framebuffer == id {
            state.framebuffer = 0;
        }
    }

    fn bind_framebuffer(&mut self, id: u32) {
        let mut state = self.record("bind_framebuffer", id.to_string());
        if state.framebuffers.contains_key(&id) {
            state.framebuffer = id;
        } else {
            state.error("GL_INVALID_OPERATION: unknown framebuffer");
        }
    }

    fn attach_renderbuffer(&mut self, point: AttachmentPoint, id: u32) {
        let mut guard = self.record("attach_renderbuffer", format!("{:?}, {}", point, id));
        let state = &mut *guard;
        let image = state.renderbuffers.get(&id).cloned();

        match (image, state.framebuffers.get_mut(&state.framebuffer)) {
            (Some(image), Some(fb)) => {
                fb.attachments.insert(point, image);
            }
            _ => state
                .errors
                .push_back("GL_INVALID_OPERATION: unknown renderbuffer".into()),
        }
    }

    fn attach_texture(
        &mut self,
        point: AttachmentPoint,
        target: TextureTarget,
        id: u32,
        level: u32,
        layer: u32,
    ) {
        let args = format!("{:?}, {:?}, {}, {}, {}", point, target, id, level, layer);
        let mut guard = self.record("attach_texture", args);
        let state = &mut *guard;
        let texture = state.textures.get(&id).cloned();

        match (texture, state.framebuffers.get_mut(&state.framebuffer)) {
            (Some(texture), Some(fb)) if texture.target.is_some() => {
                let image = Image {
                    format: texture.format,
                    dimensions: Vector2::new(
                        (texture.dimensions.x >> level).max(1),
                        (texture.dimensions.y >> level).max(1),
                    ),
                };

                fb.attachments.insert(point, image);
            }
            _ => state
                .errors
                .push_back("GL_INVALID_OPERATION: unknown texture".into()),
        }
    }

    fn detach(&mut self, point: AttachmentPoint) {
        let mut state = self.record("detach", format!("{:?}", point));
        let fb = state.framebuffer;
        if let Some(fb) = state.framebuffers.get_mut(&fb) {
            fb.attachments.remove(&point);
        }
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        let state = self.record("check_framebuffer_status", "");
        if state.framebuffer == 0 {
            return FramebufferStatus::Complete;
        }

        match state.framebuffers.get(&state.framebuffer) {
            Some(fb) => framebuffer_status(fb),
            None => FramebufferStatus::Undefined,
        }
    }

    fn read_buffer(&mut self, buffer: BufferId) {
        self.record("read_buffer", format!("{:?}", buffer));
    }

    fn draw_buffers(&mut self, buffers: &[BufferId]) {
        self.record("draw_buffers", format!("{:?}", buffers));
    }

    fn read_pixels(
        &mut self,
        position: Vector2<i32>,
        size: Vector2<u32>,
        format: TextureFormat,
        out: &mut [u8],
    ) {
        let args = format!("{:?}, {:?}, {:?}", position, size, format);
        let state = self.record("read_pixels", args);
        let color = state
            .framebuffers
            .get(&state.framebuffer)
            .map(|v| v.color)
            .unwrap_or([0.0; 4]);

        let pixel: Vec<u8> = match format {
            TextureFormat::RGBA8 => color.iter().map(|v| (v * 255.0).round() as u8).collect(),
            TextureFormat::RGB8 => color[..3].iter().map(|v| (v * 255.0).round() as u8).collect(),
            _ => vec![0; format.size()],
        };

        for chunk in out.chunks_mut(pixel.len()) {
            let len = chunk.len();
            chunk.copy_from_slice(&pixel[..len]);
        }
    }

    fn create_renderbuffer(&mut self, format: TextureFormat, dimensions: Vector2<u32>) -> u32 {
        let args = format!("{:?}, {:?}", format, dimensions);
        let mut state = self.record("create_renderbuffer", args);
        let id = state.create();
        state.renderbuffers.insert(id, Image { format, dimensions });
        id
    }

    fn delete_renderbuffer(&mut self, id: u32) {
        let mut state = self.record("delete_renderbuffer", id.to_string());
        state.renderbuffers.remove(&id);
    }

    fn create_texture(&mut self) -> u32 {
        let mut state = self.record("create_texture", "");
        let id = state.create();
        let texture = TextureObject {
            target: None,
            format: TextureFormat::RGBA8,
            dimensions: Vector3::new(0, 0, 0),
        };

        state.textures.insert(id, texture);
        id
    }

    fn delete_texture(&mut self, id: u32) {
        let mut state = self.record("delete_texture", id.to_string());
        state.textures.remove(&id);
        for v in state.units.values_mut() {
            if *v == id {
                *v = 0;
            }
        }
    }

    fn active_texture(&mut self, unit: u32) {
        self.record("active_texture", unit.to_string()).active_unit = unit;
    }

    fn bind_texture(&mut self, target: TextureTarget, id: u32) {
        let mut state = self.record("bind_texture", format!("{:?}, {}", target, id));
        if id != 0 {
            let error = match state.textures.get_mut(&id) {
                Some(texture) => match texture.target {
                    None => {
                        texture.target = Some(target);
                        None
                    }
                    Some(v) if v != target => Some("GL_INVALID_OPERATION: texture target mismatch"),
                    _ => None,
                },
                None => Some("GL_INVALID_OPERATION: unknown texture"),
            };

            if let Some(error) = error {
                state.error(error);
                return;
            }
        }

        let unit = state.active_unit;
        state.units.insert((unit, target), id);
    }

    fn texture_storage(
        &mut self,
        target: TextureTarget,
        format: TextureFormat,
        dimensions: Vector3<u32>,
        levels: u32,
    ) {
        let args = format!("{:?}, {:?}, {:?}, {}", target, format, dimensions, levels);
        let mut state = self.record("texture_storage", args);
        let key = (state.active_unit, target);
        let id = state.units.get(&key).cloned().unwrap_or(0);

        let bound = match state.textures.get_mut(&id) {
            Some(texture) => {
                texture.format = format;
                texture.dimensions = dimensions;
                true
            }
            None => false,
        };

        if !bound {
            state.error("GL_INVALID_OPERATION: no texture bound");
        }
    }

    fn texture_sub_image(
        &mut self,
        target: TextureTarget,
        level: u32,
        offset: Vector3<u32>,
        size: Vector3<u32>,
        format: TextureFormat,
        bytes: &[u8],
    ) {
        let args = format!(
            "{:?}, {}, {:?}, {:?}, {:?}, {} bytes",
            target,
            level,
            offset,
            size,
            format,
            bytes.len()
        );

        let mut state = self.record("texture_sub_image", args);
        let key = (state.active_unit, target);
        if state.units.get(&key).cloned().unwrap_or(0) == 0 {
            state.error("GL_INVALID_OPERATION: no texture bound");
        }
    }

    fn create_sampler(&mut self, params: &SamplerParams) -> u32 {
        let mut state = self.record("create_sampler", format!("{:?}", params));
        let id = state.create();
        state.samplers.insert(id, *params);
        id
    }

    fn delete_sampler(&mut self, id: u32) {
        let mut state = self.record("delete_sampler", id.to_string());
        state.samplers.remove(&id);
        for v in state.unit_samplers.values_mut() {
            if *v == id {
                *v = 0;
            }
        }
    }

    fn bind_sampler(&mut self, unit: u32, id: u32) {
        let mut state = self.record("bind_sampler", format!("{}, {}", unit, id));
        state.unit_samplers.insert(unit, id);
    }

    fn create_buffer(
        &mut self,
        target: BufferTarget,
        hint: BufferHint,
        size: usize,
        bytes: Option<&[u8]>,
    ) -> u32 {
        let args = format!("{:?}, {:?}, {}", target, hint, size);
        let mut state = self.record("create_buffer", args);
        let id = state.create();

        let mut data = vec![0; size];
        if let Some(bytes) = bytes {
            let len = bytes.len().min(size);
            data[..len].copy_from_slice(&bytes[..len]);
        }

        state.buffers.insert(id, data);
        id
    }

    fn update_buffer(&mut self, target: BufferTarget, id: u32, offset: usize, bytes: &[u8]) {
        let args = format!("{:?}, {}, {}, {} bytes", target, id, offset, bytes.len());
        let mut state = self.record("update_buffer", args);

        let ok = match state.buffers.get_mut(&id) {
            Some(data) if offset + bytes.len() <= data.len() => {
                data[offset..offset + bytes.len()].copy_from_slice(bytes);
                true
            }
            _ => false,
        };

        if !ok {
            state.error("GL_INVALID_VALUE: buffer update out of range");
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, id: u32) {
        let mut state = self.record("bind_buffer", format!("{:?}, {}", target, id));
        state.bound_buffers.insert(target, id);
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, binding: u32, id: u32) {
        let args = format!("{:?}, {}, {}", target, binding, id);
        let mut state = self.record("bind_buffer_base", args);
        state.buffer_bases.insert(binding, id);
    }

    fn delete_buffer(&mut self, id: u32) {
        let mut state = self.record("delete_buffer", id.to_string());
        state.buffers.remove(&id);
        state.buffer_bases.retain(|_, v| *v != id);
        state.bound_buffers.retain(|_, v| *v != id);
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<u32, String> {
        let mut state = self.record("compile_shader", format!("{:?}", stage));
        let decls = reflect::scan(stage, source)?;
        let id = state.create();
        state.shaders.insert(id, (stage, decls));
        Ok(id)
    }

    fn delete_shader(&mut self, id: u32) {
        let mut state = self.record("delete_shader", id.to_string());
        state.shaders.remove(&id);
    }

    fn link_program(&mut self, shaders: &[u32]) -> Result<u32, String> {
        let mut state = self.record("link_program", format!("{:?}", shaders));

        let interface = {
            let mut stages = Vec::new();
            for id in shaders {
                match state.shaders.get(id) {
                    Some(&(stage, ref decls)) => stages.push((stage, decls)),
                    None => return Err(format!("ERROR: shader {} does not exist", id)),
                }
            }

            reflect::link(&stages)?
        };

        let id = state.create();
        let program = ProgramObject {
            interface,
            values: HashMap::new(),
            bindings: HashMap::new(),
        };

        state.programs.insert(id, program);
        Ok(id)
    }

    fn delete_program(&mut self, id: u32) {
        let mut state = self.record("delete_program", id.to_string());
        state.programs.remove(&id);
    }

    fn use_program(&mut self, id: u32) {
        let mut state = self.record("use_program", id.to_string());
        if id == 0 || state.programs.contains_key(&id) {
            state.program = id;
        } else {
            state.error("GL_INVALID_VALUE: unknown program");
        }
    }

    fn active_uniforms(&mut self, program: u32) -> Vec<ActiveUniform> {
        let state = self.record("active_uniforms", program.to_string());
        state
            .programs
            .get(&program)
            .map(|v| v.interface.uniforms.clone())
            .unwrap_or_default()
    }

    fn active_uniform_blocks(&mut self, program: u32) -> Vec<ActiveUniformBlock> {
        let state = self.record("active_uniform_blocks", program.to_string());
        state
            .programs
            .get(&program)
            .map(|v| v.interface.blocks.clone())
            .unwrap_or_default()
    }

    fn uniform_location(&mut self, program: u32, name: &str) -> Option<i32> {
        let state = self.record("uniform_location", format!("{}, {}", program, name));
        let program = state.programs.get(&program)?;
        program.interface.locations.get(name).cloned()
    }

    fn attribute_location(&mut self, program: u32, name: &str) -> Option<u32> {
        let state = self.record("attribute_location", format!("{}, {}", program, name));
        let program = state.programs.get(&program)?;
        program.interface.attributes.get(name).cloned()
    }

    fn uniform_block_binding(&mut self, program: u32, block: u32, binding: u32) {
        let args = format!("{}, {}, {}", program, block, binding);
        let mut state = self.record("uniform_block_binding", args);
        if let Some(program) = state.programs.get_mut(&program) {
            program.bindings.insert(block, binding);
        }
    }

    fn write_uniform(&mut self, program: Option<u32>, location: i32, value: &UniformValue) {
        let args = format!("{:?}, {}, {:?}", program, location, value);
        let mut state = self.record("write_uniform", args);
        let id = program.unwrap_or(state.program);

        let written = match state.programs.get_mut(&id) {
            Some(program) => {
                program.values.insert(location, value.clone());
                true
            }
            None => false,
        };

        if !written {
            state.error("GL_INVALID_OPERATION: no program to write uniforms into");
        }
    }

    fn create_vertex_array(&mut self) -> u32 {
        let mut state = self.record("create_vertex_array", "");
        let id = state.create();
        state.vertex_arrays.insert(id);
        id
    }

    fn delete_vertex_array(&mut self, id: u32) {
        let mut state = self.record("delete_vertex_array", id.to_string());
        state.vertex_arrays.remove(&id);
        if state.vertex_array == id {
            state.vertex_array = 0;
        }
    }

    fn bind_vertex_array(&mut self, id: u32) {
        self.record("bind_vertex_array", id.to_string()).vertex_array = id;
    }

    fn vertex_attrib_pointer(&mut self, attrib: AttribPointer) {
        self.record("vertex_attrib_pointer", format!("{:?}", attrib));
    }

    fn draw_elements(&mut self, primitive: Primitive, count: u32, format: IndexFormat, offset: usize) {
        let args = format!("{:?}, {}, {:?}, {}", primitive, count, format, offset);
        self.record("draw_elements", args).draws += 1;
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        let args = format!("{:?}, {}, {}", primitive, first, count);
        self.record("draw_arrays", args).draws += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn completeness() {
        let mut device = HeadlessDevice::new();
        let fb = device.create_framebuffer();
        device.bind_framebuffer(fb);
        assert_eq!(device.check_framebuffer_status(), FramebufferStatus::MissingAttachment);

        let color = device.create_renderbuffer(TextureFormat::RGBA8, Vector2::new(4, 4));
        let depth = device.create_renderbuffer(TextureFormat::Depth24, Vector2::new(8, 8));
        device.attach_renderbuffer(AttachmentPoint::Color(0), color);
        assert_eq!(device.check_framebuffer_status(), FramebufferStatus::Complete);

        device.attach_renderbuffer(AttachmentPoint::Depth, depth);
        assert_eq!(device.check_framebuffer_status(), FramebufferStatus::IncompleteDimensions);

        device.attach_renderbuffer(AttachmentPoint::Stencil, color);
        assert_eq!(device.check_framebuffer_status(), FramebufferStatus::IncompleteAttachment);
        assert!(device.poll_error().is_none());
    }

    #[test]
    fn uniforms() {
        let mut device = HeadlessDevice::new();
        let probe = device.probe();

        let vs = device
            .compile_shader(ShaderStage::Vertex, "uniform vec4 tint; void main() {}")
            .unwrap();
        let program = device.link_program(&[vs]).unwrap();
        let location = device.uniform_location(program, "tint").unwrap();

        device.write_uniform(None, location, &[1.0f32; 4].into());
        assert!(device.poll_error().is_some());

        device.write_uniform(Some(program), location, &[1.0f32; 4].into());
        assert_eq!(probe.uniform(program, "tint"), Some([1.0f32; 4].into()));
        assert_eq!(probe.count("write_uniform"), 2);
    }
}
