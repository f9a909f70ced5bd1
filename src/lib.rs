//! # What is This?
//!
//! `glstate` is a thin object layer over the OpenGL state machine. It keeps a
//! versioned snapshot of the pipeline state of every framebuffer and applies
//! only the groups that changed, shares a finite pool of texture units between
//! textures and programs with LRU eviction, and reflects linked programs into
//! typed uniforms which write either straight to the driver or into uniform
//! buffers shared between programs.
//!
//! Every object lives inside a [`Context`](context/struct.Context.html), which
//! stands for one native graphics context. There are no global singletons, so
//! tests can spin up as many independent headless contexts as they like.
//!
//! ```rust,ignore
//! let mut ctx = Context::headless(ContextSettings::default())?;
//! let fb = ctx.default_framebuffer();
//! ctx.framebuffer_mut(fb)?.set_clear_color([1.0, 0.0, 0.0, 1.0]);
//! ctx.clear(fb, true, false, false)?;
//! ```

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub extern crate cgmath;
pub extern crate gl;

#[macro_use]
pub mod utils;

pub mod backends;
pub mod context;
pub mod errors;
pub mod framebuffer;
pub mod mesh;
pub mod program;
pub mod sampler;
pub mod settings;
pub mod texture;
pub mod types;

pub mod prelude {
    pub use crate::backends::headless::{HeadlessDevice, HeadlessProbe};
    pub use crate::backends::Device;
    pub use crate::context::Context;
    pub use crate::errors::{Error, Result};
    pub use crate::framebuffer::{
        Attachment, AttachmentPoint, FrameBuffer, FrameBufferHandle, Parameters,
    };
    pub use crate::mesh::{MeshHandle, MeshIndex, MeshParams, VertexElement, VertexLayout};
    pub use crate::program::{
        Program, ProgramHandle, ShaderSource, Uniform, UniformId, UniformValue,
    };
    pub use crate::sampler::{BorderColor, Sampler, SamplerParams};
    pub use crate::settings::ContextSettings;
    pub use crate::texture::{RenderBufferHandle, TextureHandle, TextureParams};
    pub use crate::types::*;
}
