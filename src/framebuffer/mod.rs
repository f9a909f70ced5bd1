//! Render targets, their attachments and their pipeline state.
//!
//! A framebuffer only records what it should look like. Everything reaches
//! the driver when the context activates it for a clear, a draw or a read.

pub mod parameters;

pub use self::parameters::{
    AppliedParameters, BlendState, ClearState, DepthState, Diff, DitherState, Generation,
    Generations, LineState, LogicState, MaskState, MultisampleState, Parameters, PointState,
    PolygonState, ScissorState, StencilFace, StencilState, Tracked, TransformState,
};

use cgmath::Vector2;
use smallvec::SmallVec;

use crate::backends::BlendFactors;
use crate::errors::{Error, Result};
use crate::texture::{RenderBufferHandle, TextureHandle};
use crate::types::*;

impl_handle!(FrameBufferHandle);

/// Number of color attachment points.
pub const MAX_COLOR_ATTACHMENTS: usize = 4;
/// Number of attachment points, colors plus depth and stencil.
pub const MAX_ATTACHMENTS: usize = MAX_COLOR_ATTACHMENTS + 2;
/// Number of simultaneous draw buffers.
pub const MAX_DRAW_BUFFERS: usize = 4;

/// Attachment points of a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    Color(u8),
    Depth,
    Stencil,
}

impl AttachmentPoint {
    /// Every attachment point, in slot order.
    pub fn all() -> [AttachmentPoint; MAX_ATTACHMENTS] {
        [
            AttachmentPoint::Color(0),
            AttachmentPoint::Color(1),
            AttachmentPoint::Color(2),
            AttachmentPoint::Color(3),
            AttachmentPoint::Depth,
            AttachmentPoint::Stencil,
        ]
    }

    pub fn slot(self) -> Result<usize> {
        match self {
            AttachmentPoint::Color(i) if (i as usize) < MAX_COLOR_ATTACHMENTS => Ok(i as usize),
            AttachmentPoint::Color(_) => Err(Error::OutOfBounds),
            AttachmentPoint::Depth => Ok(MAX_COLOR_ATTACHMENTS),
            AttachmentPoint::Stencil => Ok(MAX_COLOR_ATTACHMENTS + 1),
        }
    }
}

/// The image attached to an attachment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    RenderBuffer(RenderBufferHandle),
    /// A mip level of a texture, and the layer (or cube face) of layered ones.
    Texture {
        texture: TextureHandle,
        level: u32,
        layer: u32,
    },
}

impl From<RenderBufferHandle> for Attachment {
    fn from(handle: RenderBufferHandle) -> Self {
        Attachment::RenderBuffer(handle)
    }
}

impl From<TextureHandle> for Attachment {
    fn from(texture: TextureHandle) -> Self {
        Attachment::Texture {
            texture,
            level: 0,
            layer: 0,
        }
    }
}

/// A render target and its pipeline state.
#[derive(Debug)]
pub struct FrameBuffer {
    pub(crate) id: u32,
    default: bool,
    generations: Generations,
    parameters: Parameters,
    attachments: [Option<Attachment>; MAX_ATTACHMENTS],
    read_buffer: BufferId,
    draw_buffers: SmallVec<[BufferId; MAX_DRAW_BUFFERS]>,

    pub(crate) attachments_changed: bool,
    pub(crate) read_draw_changed: bool,
    pub(crate) parameters_changed: bool,
}

impl FrameBuffer {
    pub(crate) fn new(
        id: u32,
        default: bool,
        dimensions: Vector2<u32>,
        generations: &Generations,
    ) -> Self {
        let mut parameters = Parameters::new(generations);
        parameters.transform.update(generations).viewport_size = dimensions;

        let buffer = if default {
            BufferId::Back
        } else {
            BufferId::Color(0)
        };

        FrameBuffer {
            id,
            default,
            generations: generations.clone(),
            parameters,
            attachments: [None; MAX_ATTACHMENTS],
            read_buffer: buffer,
            draw_buffers: SmallVec::from_slice(&[buffer]),
            attachments_changed: !default,
            read_draw_changed: true,
            parameters_changed: true,
        }
    }

    /// The native framebuffer object, `0` for the default framebuffer.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns true if this is the on-screen framebuffer of the context.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.default
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[inline]
    pub fn attachment(&self, point: AttachmentPoint) -> Option<Attachment> {
        point.slot().ok().and_then(|v| self.attachments[v])
    }

    pub(crate) fn attachments(&self) -> &[Option<Attachment>; MAX_ATTACHMENTS] {
        &self.attachments
    }

    #[inline]
    pub fn read_buffer(&self) -> BufferId {
        self.read_buffer
    }

    #[inline]
    pub fn draw_buffers(&self) -> &[BufferId] {
        &self.draw_buffers
    }

    /// Attaches an image to `point`, or detaches it with `None`.
    pub fn set_attachment<T>(&mut self, point: AttachmentPoint, attachment: T) -> Result<()>
    where
        T: Into<Option<Attachment>>,
    {
        if self.default {
            return Err(Error::InvalidOperation(
                "the default framebuffer has no attachment points".into(),
            ));
        }

        let slot = point.slot()?;
        self.attachments[slot] = attachment.into();
        self.attachments_changed = true;
        Ok(())
    }

    /// Drops every attachment referring to `texture`.
    pub(crate) fn forget_texture(&mut self, texture: TextureHandle) {
        for v in self.attachments.iter_mut() {
            if let Some(Attachment::Texture { texture: t, .. }) = *v {
                if t == texture {
                    *v = None;
                    self.attachments_changed = true;
                }
            }
        }
    }

    pub(crate) fn forget_render_buffer(&mut self, handle: RenderBufferHandle) {
        for v in self.attachments.iter_mut() {
            if *v == Some(Attachment::RenderBuffer(handle)) {
                *v = None;
                self.attachments_changed = true;
            }
        }
    }

    pub fn set_read_buffer(&mut self, buffer: BufferId) {
        self.read_buffer = buffer;
        self.read_draw_changed = true;
    }

    /// Selects 1 to 4 buffers to draw into.
    pub fn set_draw_buffers(&mut self, buffers: &[BufferId]) -> Result<()> {
        if buffers.is_empty() || buffers.len() > MAX_DRAW_BUFFERS {
            return Err(Error::OutOfBounds);
        }

        self.draw_buffers = SmallVec::from_slice(buffers);
        self.read_draw_changed = true;
        Ok(())
    }

    fn params(&mut self) -> (&mut Parameters, &Generations) {
        self.parameters_changed = true;
        (&mut self.parameters, &self.generations)
    }

    pub fn set_viewport(&mut self, position: Vector2<i32>, size: Vector2<u32>) {
        let (p, g) = self.params();
        let v = p.transform.update(g);
        v.viewport_position = position;
        v.viewport_size = size;
    }

    pub fn set_depth_range(&mut self, near: f64, far: f64) {
        let (p, g) = self.params();
        p.transform.update(g).depth_range = (near, far);
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        let (p, g) = self.params();
        p.clear.update(g).color = color;
    }

    pub fn set_clear_depth(&mut self, depth: f64) {
        let (p, g) = self.params();
        p.clear.update(g).depth = depth;
    }

    pub fn set_clear_stencil(&mut self, stencil: i32) {
        let (p, g) = self.params();
        p.clear.update(g).stencil = stencil;
    }

    pub fn set_point_size(&mut self, size: f32) {
        let (p, g) = self.params();
        p.point.update(g).size = size;
    }

    /// Takes the point size from the program instead.
    pub fn set_program_point_size(&mut self, enable: bool) {
        let (p, g) = self.params();
        p.point.update(g).program_size = enable;
    }

    pub fn set_line_width(&mut self, width: f32) {
        let (p, g) = self.params();
        p.line.update(g).width = width;
    }

    pub fn set_line_smooth(&mut self, enable: bool) {
        let (p, g) = self.params();
        p.line.update(g).smooth = enable;
    }

    pub fn set_cull_face(&mut self, face: CullFace) {
        let (p, g) = self.params();
        p.polygon.update(g).cull_face = face;
    }

    pub fn set_front_face(&mut self, order: FrontFaceOrder) {
        let (p, g) = self.params();
        p.polygon.update(g).front_face = order;
    }

    pub fn set_polygon_mode(&mut self, mode: PolygonMode) {
        let (p, g) = self.params();
        p.polygon.update(g).mode = mode;
    }

    /// Sets the depth offset of filled polygons, lines and points. `None`
    /// disables it for all of them.
    pub fn set_polygon_offset(&mut self, offset: Option<(f32, f32)>) {
        let (p, g) = self.params();
        let v = p.polygon.update(g);
        match offset {
            Some(offset) => {
                v.offset = offset;
                v.offset_enable = [true; 3];
            }
            None => v.offset_enable = [false; 3],
        }
    }

    pub fn set_multisample(&mut self, enable: bool) {
        let (p, g) = self.params();
        p.multisample.update(g).enable = enable;
    }

    pub fn set_alpha_to_coverage(&mut self, enable: bool) {
        let (p, g) = self.params();
        p.multisample.update(g).alpha_to_coverage = enable;
    }

    pub fn set_sample_coverage(&mut self, coverage: Option<(f32, bool)>) {
        let (p, g) = self.params();
        p.multisample.update(g).coverage = coverage;
    }

    /// Sets the scissor box, `None` disables the scissor test.
    pub fn set_scissor(&mut self, rect: Option<(Vector2<i32>, Vector2<u32>)>) {
        let (p, g) = self.params();
        p.scissor.update(g).rect = rect;
    }

    pub fn set_stencil_test(&mut self, enable: bool) {
        let (p, g) = self.params();
        p.stencil.update(g).enable = enable;
    }

    /// Sets the stencil function of `face`, or of both faces if none.
    pub fn set_stencil_func(
        &mut self,
        face: Option<Face>,
        func: Comparison,
        reference: i32,
        mask: u32,
    ) {
        let (p, g) = self.params();
        let v = p.stencil.update(g);
        for s in stencil_faces(v, face) {
            s.func = func;
            s.reference = reference;
            s.mask = mask;
        }
    }

    /// Sets the stencil operations of `face`, or of both faces if none.
    pub fn set_stencil_op(
        &mut self,
        face: Option<Face>,
        fail: StencilOp,
        depth_fail: StencilOp,
        pass: StencilOp,
    ) {
        let (p, g) = self.params();
        let v = p.stencil.update(g);
        for s in stencil_faces(v, face) {
            s.fail = fail;
            s.depth_fail = depth_fail;
            s.pass = pass;
        }
    }

    pub fn set_depth_test(&mut self, enable: bool) {
        let (p, g) = self.params();
        p.depth.update(g).enable = enable;
    }

    pub fn set_depth_func(&mut self, func: Comparison) {
        let (p, g) = self.params();
        p.depth.update(g).func = func;
    }

    /// Enables blending of every draw buffer.
    pub fn set_blend(&mut self, enable: bool) {
        let (p, g) = self.params();
        let v = p.blend.update(g);
        v.enable = [enable; 4];
        v.multi_enable = false;
    }

    /// Enables blending of one draw buffer only.
    pub fn set_blend_indexed(&mut self, buffer: usize, enable: bool) -> Result<()> {
        if buffer >= MAX_DRAW_BUFFERS {
            return Err(Error::OutOfBounds);
        }

        let (p, g) = self.params();
        let v = p.blend.update(g);
        v.enable[buffer] = enable;
        v.multi_enable = true;
        Ok(())
    }

    /// Sets the blend factors and equations of every draw buffer.
    pub fn set_blend_func(&mut self, factors: BlendFactors, rgb: Equation, alpha: Equation) {
        let (p, g) = self.params();
        let v = p.blend.update(g);
        v.factors = [factors; 4];
        v.equations = [(rgb, alpha); 4];
        v.multi_equation = false;
    }

    /// Sets the blend factors and equations of one draw buffer only.
    pub fn set_blend_func_indexed(
        &mut self,
        buffer: usize,
        factors: BlendFactors,
        rgb: Equation,
        alpha: Equation,
    ) -> Result<()> {
        if buffer >= MAX_DRAW_BUFFERS {
            return Err(Error::OutOfBounds);
        }

        let (p, g) = self.params();
        let v = p.blend.update(g);
        v.factors[buffer] = factors;
        v.equations[buffer] = (rgb, alpha);
        v.multi_equation = true;
        Ok(())
    }

    pub fn set_blend_color(&mut self, color: [f32; 4]) {
        let (p, g) = self.params();
        p.blend.update(g).color = color;
    }

    pub fn set_dither(&mut self, enable: bool) {
        let (p, g) = self.params();
        p.dither.update(g).enable = enable;
    }

    /// Sets the logical pixel operation, `None` disables it.
    pub fn set_logic_op(&mut self, op: Option<LogicOp>) {
        let (p, g) = self.params();
        p.logic.update(g).op = op;
    }

    pub fn set_color_mask(&mut self, mask: [bool; 4]) {
        let (p, g) = self.params();
        let v = p.masks.update(g);
        v.color = [mask; 4];
        v.multi_color = false;
    }

    pub fn set_color_mask_indexed(&mut self, buffer: usize, mask: [bool; 4]) -> Result<()> {
        if buffer >= MAX_DRAW_BUFFERS {
            return Err(Error::OutOfBounds);
        }

        let (p, g) = self.params();
        let v = p.masks.update(g);
        v.color[buffer] = mask;
        v.multi_color = true;
        Ok(())
    }

    pub fn set_depth_mask(&mut self, write: bool) {
        let (p, g) = self.params();
        p.masks.update(g).depth = write;
    }

    /// Sets the stencil write mask of `face`, or of both faces if none.
    pub fn set_stencil_mask(&mut self, face: Option<Face>, mask: u32) {
        let (p, g) = self.params();
        let v = p.masks.update(g);
        match face {
            Some(Face::Front) => v.stencil[0] = mask,
            Some(Face::Back) => v.stencil[1] = mask,
            None => v.stencil = [mask; 2],
        }
    }
}

fn stencil_faces(v: &mut StencilState, face: Option<Face>) -> SmallVec<[&mut StencilFace; 2]> {
    let mut faces = SmallVec::new();
    match face {
        Some(Face::Front) => faces.push(&mut v.front),
        Some(Face::Back) => faces.push(&mut v.back),
        None => {
            faces.push(&mut v.front);
            faces.push(&mut v.back);
        }
    }

    faces
}
