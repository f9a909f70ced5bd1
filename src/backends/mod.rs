//! The backend of the state layer, which should be responsible for only one
//! thing: forwarding calls to the native graphics API of one context.
//!
//! Nothing in here caches or diffs; everything above the `Device` trait
//! assumes every call reaches the driver.

pub mod capabilities;
pub mod headless;

#[cfg(not(target_arch = "wasm32"))]
pub mod gl;

use cgmath::{Vector2, Vector3};

use crate::framebuffer::AttachmentPoint;
use crate::program::{UniformType, UniformValue};
use crate::sampler::SamplerParams;
use crate::types::*;

pub use self::capabilities::{Capabilities, Version};

/// An active uniform of a linked program, as reported by introspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveUniform {
    /// The name without any trailing `[0]`.
    pub name: String,
    pub ty: UniformType,
    /// Number of array elements, 1 for non-arrays.
    pub size: usize,
    /// Index of the uniform block holding this uniform.
    pub block: Option<u32>,
    pub offset: usize,
    pub array_stride: usize,
    pub matrix_stride: usize,
    pub row_major: bool,
}

/// An active uniform block of a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniformBlock {
    pub index: u32,
    pub name: String,
    /// Minimum byte size of the buffer backing this block.
    pub size: usize,
    /// Number of active uniforms inside this block.
    pub members: usize,
}

/// Describes one vertex attribute pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribPointer {
    pub location: u32,
    pub size: u8,
    pub format: VertexFormat,
    pub normalized: bool,
    pub stride: u32,
    pub offset: u32,
}

/// Source and destination factors of the RGB and alpha channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendFactors {
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

/// The native graphics API surface of one context. Object names are plain
/// `u32`s with `0` meaning "none", exactly like the native API.
///
/// Calls that address "the bound object" (`texture_storage`, `attach_*`,
/// `check_framebuffer_status`...) act on whatever was bound last through this
/// device.
pub trait Device {
    fn capabilities(&self) -> Capabilities;

    /// Returns the description of a pending native error, if any.
    fn poll_error(&mut self) -> Option<String>;

    fn enable(&mut self, cap: Capability, enable: bool);
    fn enable_indexed(&mut self, cap: Capability, index: u32, enable: bool);

    fn viewport(&mut self, position: Vector2<i32>, size: Vector2<u32>);
    fn depth_range(&mut self, near: f64, far: f64);
    fn clear_color(&mut self, color: [f32; 4]);
    fn clear_depth(&mut self, depth: f64);
    fn clear_stencil(&mut self, stencil: i32);
    fn point_size(&mut self, size: f32);
    fn line_width(&mut self, width: f32);
    fn cull_face(&mut self, face: CullFace);
    fn front_face(&mut self, order: FrontFaceOrder);
    fn polygon_mode(&mut self, mode: PolygonMode);
    fn polygon_offset(&mut self, factor: f32, units: f32);
    fn sample_coverage(&mut self, value: f32, invert: bool);
    fn scissor(&mut self, position: Vector2<i32>, size: Vector2<u32>);
    fn stencil_func(&mut self, face: Face, func: Comparison, reference: i32, mask: u32);
    fn stencil_op(&mut self, face: Face, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp);
    fn stencil_mask(&mut self, face: Face, mask: u32);
    fn depth_func(&mut self, func: Comparison);
    fn depth_mask(&mut self, write: bool);
    /// Blend factors of every draw buffer, or only of `buffer`.
    fn blend_func(&mut self, buffer: Option<u32>, factors: BlendFactors);
    /// RGB and alpha equations of every draw buffer, or only of `buffer`.
    fn blend_equation(&mut self, buffer: Option<u32>, rgb: Equation, alpha: Equation);
    fn blend_color(&mut self, color: [f32; 4]);
    fn logic_op(&mut self, op: LogicOp);
    fn color_mask(&mut self, buffer: Option<u32>, mask: [bool; 4]);
    fn clear(&mut self, mask: ClearMask);

    fn create_framebuffer(&mut self) -> u32;
    fn delete_framebuffer(&mut self, id: u32);
    fn bind_framebuffer(&mut self, id: u32);
    fn attach_renderbuffer(&mut self, point: AttachmentPoint, id: u32);
    fn attach_texture(
        &mut self,
        point: AttachmentPoint,
        target: TextureTarget,
        id: u32,
        level: u32,
        layer: u32,
    );
    fn detach(&mut self, point: AttachmentPoint);
    fn check_framebuffer_status(&mut self) -> FramebufferStatus;
    fn read_buffer(&mut self, buffer: BufferId);
    fn draw_buffers(&mut self, buffers: &[BufferId]);
    fn read_pixels(
        &mut self,
        position: Vector2<i32>,
        size: Vector2<u32>,
        format: TextureFormat,
        out: &mut [u8],
    );

    fn create_renderbuffer(&mut self, format: TextureFormat, dimensions: Vector2<u32>) -> u32;
    fn delete_renderbuffer(&mut self, id: u32);

    fn create_texture(&mut self) -> u32;
    fn delete_texture(&mut self, id: u32);
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: TextureTarget, id: u32);
    /// Allocates the storage of the texture bound to `target` on the active unit.
    fn texture_storage(
        &mut self,
        target: TextureTarget,
        format: TextureFormat,
        dimensions: Vector3<u32>,
        levels: u32,
    );
    fn texture_sub_image(
        &mut self,
        target: TextureTarget,
        level: u32,
        offset: Vector3<u32>,
        size: Vector3<u32>,
        format: TextureFormat,
        bytes: &[u8],
    );

    fn create_sampler(&mut self, params: &SamplerParams) -> u32;
    fn delete_sampler(&mut self, id: u32);
    fn bind_sampler(&mut self, unit: u32, id: u32);

    fn create_buffer(
        &mut self,
        target: BufferTarget,
        hint: BufferHint,
        size: usize,
        bytes: Option<&[u8]>,
    ) -> u32;
    fn update_buffer(&mut self, target: BufferTarget, id: u32, offset: usize, bytes: &[u8]);
    fn bind_buffer(&mut self, target: BufferTarget, id: u32);
    fn bind_buffer_base(&mut self, target: BufferTarget, binding: u32, id: u32);
    fn delete_buffer(&mut self, id: u32);

    /// Compiles a shader object, returning the info log on failure.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<u32, String>;
    fn delete_shader(&mut self, id: u32);
    /// Creates a program from compiled shaders and links it, returning the info
    /// log on failure. The shaders are detached again before returning.
    fn link_program(&mut self, shaders: &[u32]) -> Result<u32, String>;
    fn delete_program(&mut self, id: u32);
    fn use_program(&mut self, id: u32);
    fn active_uniforms(&mut self, program: u32) -> Vec<ActiveUniform>;
    fn active_uniform_blocks(&mut self, program: u32) -> Vec<ActiveUniformBlock>;
    fn uniform_location(&mut self, program: u32, name: &str) -> Option<i32>;
    fn attribute_location(&mut self, program: u32, name: &str) -> Option<u32>;
    fn uniform_block_binding(&mut self, program: u32, block: u32, binding: u32);
    /// Writes a loose uniform, into `program` directly if given or into the
    /// program in use otherwise.
    fn write_uniform(&mut self, program: Option<u32>, location: i32, value: &UniformValue);

    fn create_vertex_array(&mut self) -> u32;
    fn delete_vertex_array(&mut self, id: u32);
    fn bind_vertex_array(&mut self, id: u32);
    fn vertex_attrib_pointer(&mut self, attrib: AttribPointer);
    fn draw_elements(&mut self, primitive: Primitive, count: u32, format: IndexFormat, offset: usize);
    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32);
}
