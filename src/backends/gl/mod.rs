//! The OpenGL backend, a thin `Device` over the `gl` function pointers.

pub mod capabilities;
pub mod types;

use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;

use cgmath::{Vector2, Vector3};
use gl;
use gl::types::*;

use crate::errors::Result;
use crate::framebuffer::AttachmentPoint;
use crate::program::{UniformData, UniformType, UniformValue};
use crate::sampler::{BorderColor, SamplerParams};
use crate::types::*;

use super::{
    ActiveUniform, ActiveUniformBlock, AttribPointer, BlendFactors, Capabilities, Device,
};

use self::capabilities::Extensions;

const TEXTURE_MAX_ANISOTROPY: GLenum = 0x84FE;

pub struct GLDevice {
    capabilities: Capabilities,
    extensions: Extensions,
}

impl GLDevice {
    /// Wraps the current OpenGL context.
    ///
    /// # Safety
    ///
    /// The context must be current on this thread for as long as the device
    /// lives, and its functions loaded with `gl::load_with`.
    pub unsafe fn new() -> Result<Self> {
        let (capabilities, extensions) = capabilities::parse()?;
        info!("GLDevice {:#?}", capabilities);
        capabilities::check(&capabilities, &extensions)?;

        // Rows of RGB8 pixels are not 4-byte aligned.
        gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
        gl::PixelStorei(gl::PACK_ALIGNMENT, 1);

        Ok(GLDevice {
            capabilities,
            extensions,
        })
    }

    #[inline]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

#[inline]
fn boolean(v: bool) -> GLboolean {
    if v {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

#[inline]
fn bytes_ptr(bytes: &[u8]) -> *const c_void {
    if bytes.is_empty() {
        ptr::null()
    } else {
        bytes.as_ptr() as *const c_void
    }
}

fn c_string(name: &str) -> Option<CString> {
    CString::new(name.as_bytes()).ok()
}

unsafe fn info_log(id: GLuint, shader: bool) -> String {
    let mut len = 0;
    if shader {
        gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut len);
    } else {
        gl::GetProgramiv(id, gl::INFO_LOG_LENGTH, &mut len);
    }

    if len <= 0 {
        return String::new();
    }

    let mut buf = vec![0u8; len as usize];
    let mut written = 0;
    if shader {
        gl::GetShaderInfoLog(id, len, &mut written, buf.as_mut_ptr() as *mut GLchar);
    } else {
        gl::GetProgramInfoLog(id, len, &mut written, buf.as_mut_ptr() as *mut GLchar);
    }

    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

// Calls the `glProgramUniform*` flavour when writing into a program which
// is not in use.
macro_rules! select {
    ($program:expr, $plain:path, $direct:path, $($arg:expr),*) => {
        match $program {
            Some(program) => $direct(program, $($arg),*),
            None => $plain($($arg),*),
        }
    };
}

unsafe fn write_uniform(program: Option<GLuint>, location: GLint, value: &UniformValue) {
    let ty = value.ty();
    let count = (value.data().len() / ty.components().max(1)).max(1) as GLsizei;
    let t = gl::FALSE;

    match (ty, value.data()) {
        (UniformType::Vector(_, 1), &UniformData::F32(ref v)) => {
            select!(program, gl::Uniform1fv, gl::ProgramUniform1fv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 2), &UniformData::F32(ref v)) => {
            select!(program, gl::Uniform2fv, gl::ProgramUniform2fv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 3), &UniformData::F32(ref v)) => {
            select!(program, gl::Uniform3fv, gl::ProgramUniform3fv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 4), &UniformData::F32(ref v)) => {
            select!(program, gl::Uniform4fv, gl::ProgramUniform4fv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 1), &UniformData::F64(ref v)) => {
            select!(program, gl::Uniform1dv, gl::ProgramUniform1dv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 2), &UniformData::F64(ref v)) => {
            select!(program, gl::Uniform2dv, gl::ProgramUniform2dv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 3), &UniformData::F64(ref v)) => {
            select!(program, gl::Uniform3dv, gl::ProgramUniform3dv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 4), &UniformData::F64(ref v)) => {
            select!(program, gl::Uniform4dv, gl::ProgramUniform4dv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 1), &UniformData::I32(ref v)) => {
            select!(program, gl::Uniform1iv, gl::ProgramUniform1iv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 2), &UniformData::I32(ref v)) => {
            select!(program, gl::Uniform2iv, gl::ProgramUniform2iv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 3), &UniformData::I32(ref v)) => {
            select!(program, gl::Uniform3iv, gl::ProgramUniform3iv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 4), &UniformData::I32(ref v)) => {
            select!(program, gl::Uniform4iv, gl::ProgramUniform4iv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 1), &UniformData::U32(ref v)) => {
            select!(program, gl::Uniform1uiv, gl::ProgramUniform1uiv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 2), &UniformData::U32(ref v)) => {
            select!(program, gl::Uniform2uiv, gl::ProgramUniform2uiv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 3), &UniformData::U32(ref v)) => {
            select!(program, gl::Uniform3uiv, gl::ProgramUniform3uiv, location, count, v.as_ptr())
        }
        (UniformType::Vector(_, 4), &UniformData::U32(ref v)) => {
            select!(program, gl::Uniform4uiv, gl::ProgramUniform4uiv, location, count, v.as_ptr())
        }
        (UniformType::Matrix(_, c, r), &UniformData::F32(ref v)) => {
            let v = v.as_ptr();
            match (c, r) {
                (2, 2) => select!(program, gl::UniformMatrix2fv, gl::ProgramUniformMatrix2fv, location, count, t, v),
                (3, 3) => select!(program, gl::UniformMatrix3fv, gl::ProgramUniformMatrix3fv, location, count, t, v),
                (4, 4) => select!(program, gl::UniformMatrix4fv, gl::ProgramUniformMatrix4fv, location, count, t, v),
                (2, 3) => select!(program, gl::UniformMatrix2x3fv, gl::ProgramUniformMatrix2x3fv, location, count, t, v),
                (2, 4) => select!(program, gl::UniformMatrix2x4fv, gl::ProgramUniformMatrix2x4fv, location, count, t, v),
                (3, 2) => select!(program, gl::UniformMatrix3x2fv, gl::ProgramUniformMatrix3x2fv, location, count, t, v),
                (3, 4) => select!(program, gl::UniformMatrix3x4fv, gl::ProgramUniformMatrix3x4fv, location, count, t, v),
                (4, 2) => select!(program, gl::UniformMatrix4x2fv, gl::ProgramUniformMatrix4x2fv, location, count, t, v),
                (4, 3) => select!(program, gl::UniformMatrix4x3fv, gl::ProgramUniformMatrix4x3fv, location, count, t, v),
                _ => warn!("Skips write of unsupported uniform type {}.", ty),
            }
        }
        (UniformType::Matrix(_, c, r), &UniformData::F64(ref v)) => {
            let v = v.as_ptr();
            match (c, r) {
                (2, 2) => select!(program, gl::UniformMatrix2dv, gl::ProgramUniformMatrix2dv, location, count, t, v),
                (3, 3) => select!(program, gl::UniformMatrix3dv, gl::ProgramUniformMatrix3dv, location, count, t, v),
                (4, 4) => select!(program, gl::UniformMatrix4dv, gl::ProgramUniformMatrix4dv, location, count, t, v),
                (2, 3) => select!(program, gl::UniformMatrix2x3dv, gl::ProgramUniformMatrix2x3dv, location, count, t, v),
                (2, 4) => select!(program, gl::UniformMatrix2x4dv, gl::ProgramUniformMatrix2x4dv, location, count, t, v),
                (3, 2) => select!(program, gl::UniformMatrix3x2dv, gl::ProgramUniformMatrix3x2dv, location, count, t, v),
                (3, 4) => select!(program, gl::UniformMatrix3x4dv, gl::ProgramUniformMatrix3x4dv, location, count, t, v),
                (4, 2) => select!(program, gl::UniformMatrix4x2dv, gl::ProgramUniformMatrix4x2dv, location, count, t, v),
                (4, 3) => select!(program, gl::UniformMatrix4x3dv, gl::ProgramUniformMatrix4x3dv, location, count, t, v),
                _ => warn!("Skips write of unsupported uniform type {}.", ty),
            }
        }
        _ => warn!("Skips write of unsupported uniform type {}.", ty),
    }
}

impl Device for GLDevice {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn poll_error(&mut self) -> Option<String> {
        let code = unsafe { gl::GetError() };
        types::error_desc(code).map(|v| format!("[GL] {} (0x{:X})", v, code))
    }

    fn enable(&mut self, cap: Capability, enable: bool) {
        unsafe {
            if enable {
                gl::Enable(cap.into());
            } else {
                gl::Disable(cap.into());
            }
        }
    }

    fn enable_indexed(&mut self, cap: Capability, index: u32, enable: bool) {
        unsafe {
            if enable {
                gl::Enablei(cap.into(), index);
            } else {
                gl::Disablei(cap.into(), index);
            }
        }
    }

    fn viewport(&mut self, position: Vector2<i32>, size: Vector2<u32>) {
        unsafe { gl::Viewport(position.x, position.y, size.x as GLsizei, size.y as GLsizei) }
    }

    fn depth_range(&mut self, near: f64, far: f64) {
        unsafe { gl::DepthRange(near, far) }
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        unsafe { gl::ClearColor(color[0], color[1], color[2], color[3]) }
    }

    fn clear_depth(&mut self, depth: f64) {
        unsafe { gl::ClearDepth(depth) }
    }

    fn clear_stencil(&mut self, stencil: i32) {
        unsafe { gl::ClearStencil(stencil) }
    }

    fn point_size(&mut self, size: f32) {
        unsafe { gl::PointSize(size) }
    }

    fn line_width(&mut self, width: f32) {
        unsafe { gl::LineWidth(width) }
    }

    fn cull_face(&mut self, face: CullFace) {
        unsafe { gl::CullFace(face.into()) }
    }

    fn front_face(&mut self, order: FrontFaceOrder) {
        unsafe { gl::FrontFace(order.into()) }
    }

    fn polygon_mode(&mut self, mode: PolygonMode) {
        unsafe { gl::PolygonMode(gl::FRONT_AND_BACK, mode.into()) }
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        unsafe { gl::PolygonOffset(factor, units) }
    }

    fn sample_coverage(&mut self, value: f32, invert: bool) {
        unsafe { gl::SampleCoverage(value, boolean(invert)) }
    }

    fn scissor(&mut self, position: Vector2<i32>, size: Vector2<u32>) {
        unsafe { gl::Scissor(position.x, position.y, size.x as GLsizei, size.y as GLsizei) }
    }

    fn stencil_func(&mut self, face: Face, func: Comparison, reference: i32, mask: u32) {
        unsafe { gl::StencilFuncSeparate(face.into(), func.into(), reference, mask) }
    }

    fn stencil_op(&mut self, face: Face, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        unsafe { gl::StencilOpSeparate(face.into(), fail.into(), depth_fail.into(), pass.into()) }
    }

    fn stencil_mask(&mut self, face: Face, mask: u32) {
        unsafe { gl::StencilMaskSeparate(face.into(), mask) }
    }

    fn depth_func(&mut self, func: Comparison) {
        unsafe { gl::DepthFunc(func.into()) }
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { gl::DepthMask(boolean(write)) }
    }

    fn blend_func(&mut self, buffer: Option<u32>, f: BlendFactors) {
        let (a, b, c, d) = (
            f.src_rgb.into(),
            f.dst_rgb.into(),
            f.src_alpha.into(),
            f.dst_alpha.into(),
        );

        unsafe {
            match buffer {
                Some(i) => gl::BlendFuncSeparatei(i, a, b, c, d),
                None => gl::BlendFuncSeparate(a, b, c, d),
            }
        }
    }

    fn blend_equation(&mut self, buffer: Option<u32>, rgb: Equation, alpha: Equation) {
        unsafe {
            match buffer {
                Some(i) => gl::BlendEquationSeparatei(i, rgb.into(), alpha.into()),
                None => gl::BlendEquationSeparate(rgb.into(), alpha.into()),
            }
        }
    }

    fn blend_color(&mut self, color: [f32; 4]) {
        unsafe { gl::BlendColor(color[0], color[1], color[2], color[3]) }
    }

    fn logic_op(&mut self, op: LogicOp) {
        unsafe { gl::LogicOp(op.into()) }
    }

    fn color_mask(&mut self, buffer: Option<u32>, m: [bool; 4]) {
        let (r, g, b, a) = (boolean(m[0]), boolean(m[1]), boolean(m[2]), boolean(m[3]));
        unsafe {
            match buffer {
                Some(i) => gl::ColorMaski(i, r, g, b, a),
                None => gl::ColorMask(r, g, b, a),
            }
        }
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.color {
            bits |= gl::COLOR_BUFFER_BIT;
        }

        if mask.depth {
            bits |= gl::DEPTH_BUFFER_BIT;
        }

        if mask.stencil {
            bits |= gl::STENCIL_BUFFER_BIT;
        }

        unsafe { gl::Clear(bits) }
    }

    fn create_framebuffer(&mut self) -> u32 {
        let mut id = 0;
        unsafe { gl::GenFramebuffers(1, &mut id) };
        id
    }

    fn delete_framebuffer(&mut self, id: u32) {
        unsafe { gl::DeleteFramebuffers(1, &id) }
    }

    fn bind_framebuffer(&mut self, id: u32) {
        unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, id) }
    }

    fn attach_renderbuffer(&mut self, point: AttachmentPoint, id: u32) {
        unsafe { gl::FramebufferRenderbuffer(gl::FRAMEBUFFER, point.into(), gl::RENDERBUFFER, id) }
    }

    fn attach_texture(
        &mut self,
        point: AttachmentPoint,
        target: TextureTarget,
        id: u32,
        level: u32,
        layer: u32,
    ) {
        let point = point.into();
        unsafe {
            match target {
                TextureTarget::Texture2D => {
                    gl::FramebufferTexture2D(gl::FRAMEBUFFER, point, gl::TEXTURE_2D, id, level as GLint)
                }
                TextureTarget::CubeMap => gl::FramebufferTexture2D(
                    gl::FRAMEBUFFER,
                    point,
                    gl::TEXTURE_CUBE_MAP_POSITIVE_X + layer,
                    id,
                    level as GLint,
                ),
                TextureTarget::Texture2DArray | TextureTarget::Texture3D => {
                    gl::FramebufferTextureLayer(
                        gl::FRAMEBUFFER,
                        point,
                        id,
                        level as GLint,
                        layer as GLint,
                    )
                }
            }
        }
    }

    fn detach(&mut self, point: AttachmentPoint) {
        unsafe { gl::FramebufferRenderbuffer(gl::FRAMEBUFFER, point.into(), gl::RENDERBUFFER, 0) }
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        types::framebuffer_status(unsafe { gl::CheckFramebufferStatus(gl::FRAMEBUFFER) })
    }

    fn read_buffer(&mut self, buffer: BufferId) {
        unsafe { gl::ReadBuffer(buffer.into()) }
    }

    fn draw_buffers(&mut self, buffers: &[BufferId]) {
        let buffers: Vec<GLenum> = buffers.iter().map(|&v| v.into()).collect();
        unsafe { gl::DrawBuffers(buffers.len() as GLsizei, buffers.as_ptr()) }
    }

    fn read_pixels(
        &mut self,
        position: Vector2<i32>,
        size: Vector2<u32>,
        format: TextureFormat,
        out: &mut [u8],
    ) {
        let (_, format, ty) = types::texture_format(format);
        unsafe {
            gl::ReadPixels(
                position.x,
                position.y,
                size.x as GLsizei,
                size.y as GLsizei,
                format,
                ty,
                out.as_mut_ptr() as *mut c_void,
            )
        }
    }

    fn create_renderbuffer(&mut self, format: TextureFormat, dimensions: Vector2<u32>) -> u32 {
        let (internal, _, _) = types::texture_format(format);
        let mut id = 0;
        unsafe {
            gl::GenRenderbuffers(1, &mut id);
            gl::BindRenderbuffer(gl::RENDERBUFFER, id);
            gl::RenderbufferStorage(
                gl::RENDERBUFFER,
                internal,
                dimensions.x as GLsizei,
                dimensions.y as GLsizei,
            );
            gl::BindRenderbuffer(gl::RENDERBUFFER, 0);
        }

        id
    }

    fn delete_renderbuffer(&mut self, id: u32) {
        unsafe { gl::DeleteRenderbuffers(1, &id) }
    }

    fn create_texture(&mut self) -> u32 {
        let mut id = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        id
    }

    fn delete_texture(&mut self, id: u32) {
        unsafe { gl::DeleteTextures(1, &id) }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) }
    }

    fn bind_texture(&mut self, target: TextureTarget, id: u32) {
        unsafe { gl::BindTexture(target.into(), id) }
    }

    fn texture_storage(
        &mut self,
        target: TextureTarget,
        format: TextureFormat,
        d: Vector3<u32>,
        levels: u32,
    ) {
        let (internal, _, _) = types::texture_format(format);
        let levels = levels as GLsizei;
        let (w, h, depth) = (d.x as GLsizei, d.y as GLsizei, d.z as GLsizei);

        unsafe {
            match target {
                TextureTarget::Texture2D | TextureTarget::CubeMap => {
                    gl::TexStorage2D(target.into(), levels, internal, w, h)
                }
                TextureTarget::Texture2DArray | TextureTarget::Texture3D => {
                    gl::TexStorage3D(target.into(), levels, internal, w, h, depth)
                }
            }
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
        let (_, pixel, ty) = types::texture_format(format);
        let level = level as GLint;
        let (x, y, z) = (offset.x as GLint, offset.y as GLint, offset.z as GLint);
        let (w, h, d) = (size.x as GLsizei, size.y as GLsizei, size.z as GLsizei);

        unsafe {
            match target {
                TextureTarget::Texture2D => {
                    gl::TexSubImage2D(gl::TEXTURE_2D, level, x, y, w, h, pixel, ty, bytes_ptr(bytes))
                }
                TextureTarget::CubeMap => {
                    let face = size.x as usize * size.y as usize * format.size();
                    for i in 0..size.z {
                        let from = i as usize * face;
                        let bytes = bytes.get(from..from + face).unwrap_or(&[]);
                        let target = gl::TEXTURE_CUBE_MAP_POSITIVE_X + offset.z + i;
                        gl::TexSubImage2D(target, level, x, y, w, h, pixel, ty, bytes_ptr(bytes));
                    }
                }
                TextureTarget::Texture2DArray | TextureTarget::Texture3D => gl::TexSubImage3D(
                    target.into(),
                    level,
                    x,
                    y,
                    z,
                    w,
                    h,
                    d,
                    pixel,
                    ty,
                    bytes_ptr(bytes),
                ),
            }
        }
    }

    fn create_sampler(&mut self, params: &SamplerParams) -> u32 {
        let mut id = 0;
        unsafe {
            gl::GenSamplers(1, &mut id);

            let min: GLenum = params.min_filter.into();
            let mag: GLenum = params.mag_filter.into();
            gl::SamplerParameteri(id, gl::TEXTURE_MIN_FILTER, min as GLint);
            gl::SamplerParameteri(id, gl::TEXTURE_MAG_FILTER, mag as GLint);

            let names = [gl::TEXTURE_WRAP_S, gl::TEXTURE_WRAP_T, gl::TEXTURE_WRAP_R];
            for (&name, &wrap) in names.iter().zip(params.wrap.iter()) {
                let wrap: GLenum = wrap.into();
                gl::SamplerParameteri(id, name, wrap as GLint);
            }

            gl::SamplerParameterf(id, gl::TEXTURE_MIN_LOD, params.min_lod);
            gl::SamplerParameterf(id, gl::TEXTURE_MAX_LOD, params.max_lod);
            gl::SamplerParameterf(id, gl::TEXTURE_LOD_BIAS, params.lod_bias);

            match params.compare {
                Some(func) => {
                    let func: GLenum = func.into();
                    let mode = gl::COMPARE_REF_TO_TEXTURE as GLint;
                    gl::SamplerParameteri(id, gl::TEXTURE_COMPARE_MODE, mode);
                    gl::SamplerParameteri(id, gl::TEXTURE_COMPARE_FUNC, func as GLint);
                }
                None => gl::SamplerParameteri(id, gl::TEXTURE_COMPARE_MODE, gl::NONE as GLint),
            }

            if self.extensions.gl_ext_texture_filter_anisotropic {
                gl::SamplerParameterf(id, TEXTURE_MAX_ANISOTROPY, params.max_anisotropy);
            }

            match params.border {
                BorderColor::Float(ref v) => {
                    gl::SamplerParameterfv(id, gl::TEXTURE_BORDER_COLOR, v.as_ptr())
                }
                BorderColor::Int(ref v) => {
                    gl::SamplerParameteriv(id, gl::TEXTURE_BORDER_COLOR, v.as_ptr())
                }
                BorderColor::SignedInt(ref v) => {
                    gl::SamplerParameterIiv(id, gl::TEXTURE_BORDER_COLOR, v.as_ptr())
                }
                BorderColor::UnsignedInt(ref v) => {
                    gl::SamplerParameterIuiv(id, gl::TEXTURE_BORDER_COLOR, v.as_ptr())
                }
            }
        }

        id
    }

    fn delete_sampler(&mut self, id: u32) {
        unsafe { gl::DeleteSamplers(1, &id) }
    }

    fn bind_sampler(&mut self, unit: u32, id: u32) {
        unsafe { gl::BindSampler(unit, id) }
    }

    fn create_buffer(
        &mut self,
        target: BufferTarget,
        hint: BufferHint,
        size: usize,
        bytes: Option<&[u8]>,
    ) -> u32 {
        let mut id = 0;
        unsafe {
            gl::GenBuffers(1, &mut id);
            gl::BindBuffer(target.into(), id);
            gl::BufferData(target.into(), size as GLsizeiptr, ptr::null(), hint.into());

            if let Some(bytes) = bytes {
                if !bytes.is_empty() {
                    let len = bytes.len().min(size) as GLsizeiptr;
                    gl::BufferSubData(target.into(), 0, len, bytes_ptr(bytes));
                }
            }
        }

        id
    }

    fn update_buffer(&mut self, target: BufferTarget, id: u32, offset: usize, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        unsafe {
            gl::BindBuffer(target.into(), id);
            gl::BufferSubData(
                target.into(),
                offset as GLintptr,
                bytes.len() as GLsizeiptr,
                bytes_ptr(bytes),
            );
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, id: u32) {
        unsafe { gl::BindBuffer(target.into(), id) }
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, binding: u32, id: u32) {
        unsafe { gl::BindBufferBase(target.into(), binding, id) }
    }

    fn delete_buffer(&mut self, id: u32) {
        unsafe { gl::DeleteBuffers(1, &id) }
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> ::std::result::Result<u32, String> {
        let src = c_string(source).ok_or_else(|| "source contains a nul byte".to_owned())?;

        unsafe {
            let shader = gl::CreateShader(stage.into());
            gl::ShaderSource(shader, 1, &src.as_ptr(), ptr::null());
            gl::CompileShader(shader);

            let mut status = GLint::from(gl::FALSE);
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);

            if status != GLint::from(gl::TRUE) {
                let log = info_log(shader, true);
                gl::DeleteShader(shader);
                return Err(log);
            }

            Ok(shader)
        }
    }

    fn delete_shader(&mut self, id: u32) {
        unsafe { gl::DeleteShader(id) }
    }

    fn link_program(&mut self, shaders: &[u32]) -> ::std::result::Result<u32, String> {
        unsafe {
            let program = gl::CreateProgram();
            for &shader in shaders {
                gl::AttachShader(program, shader);
            }

            gl::LinkProgram(program);

            for &shader in shaders {
                gl::DetachShader(program, shader);
            }

            let mut status = GLint::from(gl::FALSE);
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

            if status != GLint::from(gl::TRUE) {
                let log = info_log(program, false);
                gl::DeleteProgram(program);
                return Err(log);
            }

            Ok(program)
        }
    }

    fn delete_program(&mut self, id: u32) {
        unsafe { gl::DeleteProgram(id) }
    }

    fn use_program(&mut self, id: u32) {
        unsafe { gl::UseProgram(id) }
    }

    fn active_uniforms(&mut self, program: u32) -> Vec<ActiveUniform> {
        let mut uniforms = Vec::new();

        unsafe {
            let mut num = 0;
            let mut max_len = 0;
            gl::GetProgramiv(program, gl::ACTIVE_UNIFORMS, &mut num);
            gl::GetProgramiv(program, gl::ACTIVE_UNIFORM_MAX_LENGTH, &mut max_len);

            let mut buf = vec![0u8; max_len.max(1) as usize];
            for i in 0..num.max(0) as GLuint {
                let (mut len, mut size, mut ty) = (0, 0, 0);
                gl::GetActiveUniform(
                    program,
                    i,
                    buf.len() as GLsizei,
                    &mut len,
                    &mut size,
                    &mut ty,
                    buf.as_mut_ptr() as *mut GLchar,
                );

                let mut name = String::from_utf8_lossy(&buf[..len.max(0) as usize]).into_owned();
                if name.ends_with("[0]") {
                    let n = name.len() - 3;
                    name.truncate(n);
                }

                let ty = match types::uniform_type(ty) {
                    Some(ty) => ty,
                    None => {
                        warn!("Skips uniform {} of unsupported type 0x{:X}.", name, ty);
                        continue;
                    }
                };

                let query = |pname| {
                    let mut v = 0;
                    gl::GetActiveUniformsiv(program, 1, &i, pname, &mut v);
                    v
                };

                let block = query(gl::UNIFORM_BLOCK_INDEX);
                uniforms.push(ActiveUniform {
                    name,
                    ty,
                    size: size.max(1) as usize,
                    block: if block < 0 { None } else { Some(block as u32) },
                    offset: query(gl::UNIFORM_OFFSET).max(0) as usize,
                    array_stride: query(gl::UNIFORM_ARRAY_STRIDE).max(0) as usize,
                    matrix_stride: query(gl::UNIFORM_MATRIX_STRIDE).max(0) as usize,
                    row_major: query(gl::UNIFORM_IS_ROW_MAJOR) != 0,
                });
            }
        }

        uniforms
    }

    fn active_uniform_blocks(&mut self, program: u32) -> Vec<ActiveUniformBlock> {
        let mut blocks = Vec::new();

        unsafe {
            let mut num = 0;
            let mut max_len = 0;
            gl::GetProgramiv(program, gl::ACTIVE_UNIFORM_BLOCKS, &mut num);
            gl::GetProgramiv(
                program,
                gl::ACTIVE_UNIFORM_BLOCK_MAX_NAME_LENGTH,
                &mut max_len,
            );

            let mut buf = vec![0u8; max_len.max(1) as usize];
            for index in 0..num.max(0) as GLuint {
                let mut len = 0;
                gl::GetActiveUniformBlockName(
                    program,
                    index,
                    buf.len() as GLsizei,
                    &mut len,
                    buf.as_mut_ptr() as *mut GLchar,
                );

                let (mut size, mut members) = (0, 0);
                gl::GetActiveUniformBlockiv(program, index, gl::UNIFORM_BLOCK_DATA_SIZE, &mut size);
                gl::GetActiveUniformBlockiv(
                    program,
                    index,
                    gl::UNIFORM_BLOCK_ACTIVE_UNIFORMS,
                    &mut members,
                );

                blocks.push(ActiveUniformBlock {
                    index,
                    name: String::from_utf8_lossy(&buf[..len.max(0) as usize]).into_owned(),
                    size: size.max(0) as usize,
                    members: members.max(0) as usize,
                });
            }
        }

        blocks
    }

    fn uniform_location(&mut self, program: u32, name: &str) -> Option<i32> {
        let name = c_string(name)?;
        let location = unsafe { gl::GetUniformLocation(program, name.as_ptr()) };
        if location < 0 {
            None
        } else {
            Some(location)
        }
    }

    fn attribute_location(&mut self, program: u32, name: &str) -> Option<u32> {
        let name = c_string(name)?;
        let location = unsafe { gl::GetAttribLocation(program, name.as_ptr()) };
        if location < 0 {
            None
        } else {
            Some(location as u32)
        }
    }

    fn uniform_block_binding(&mut self, program: u32, block: u32, binding: u32) {
        unsafe { gl::UniformBlockBinding(program, block, binding) }
    }

    fn write_uniform(&mut self, program: Option<u32>, location: i32, value: &UniformValue) {
        unsafe { write_uniform(program, location, value) }
    }

    fn create_vertex_array(&mut self) -> u32 {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        id
    }

    fn delete_vertex_array(&mut self, id: u32) {
        unsafe { gl::DeleteVertexArrays(1, &id) }
    }

    fn bind_vertex_array(&mut self, id: u32) {
        unsafe { gl::BindVertexArray(id) }
    }

    fn vertex_attrib_pointer(&mut self, v: AttribPointer) {
        unsafe {
            gl::EnableVertexAttribArray(v.location);
            gl::VertexAttribPointer(
                v.location,
                GLint::from(v.size),
                v.format.into(),
                boolean(v.normalized),
                v.stride as GLsizei,
                v.offset as usize as *const c_void,
            );
        }
    }

    fn draw_elements(&mut self, primitive: Primitive, count: u32, format: IndexFormat, offset: usize) {
        unsafe {
            gl::DrawElements(
                primitive.into(),
                count as GLsizei,
                format.into(),
                offset as *const c_void,
            )
        }
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        unsafe { gl::DrawArrays(primitive.into(), first as GLint, count as GLsizei) }
    }
}
