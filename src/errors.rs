use crate::types::FramebufferStatus;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{} is invalid.", _0)]
    InvalidHandle(String),
    #[fail(display = "OpenGL implementation doesn\'t support {}.", _0)]
    Requirement(String),
    #[fail(display = "Failed to compile shader, errors: \n{}.", _0)]
    CompileFailure(String),
    #[fail(display = "Failed to link program, errors: \n{}.", _0)]
    LinkFailure(String),
    #[fail(display = "FrameBuffer is incomplete: {}.", _0)]
    FramebufferIncomplete(FramebufferStatus),
    #[fail(
        display = "All {} texture units are occupied by textures of {}, nothing to evict.",
        _0, _1
    )]
    TextureUnitsExhausted(usize, String),
    #[fail(display = "Uniform {} needs a {} instead of {}.", _0, _1, _2)]
    UniformMismatch(String, String, String),
    #[fail(display = "Invalid operation: {}.", _0)]
    InvalidOperation(String),
    #[fail(display = "Out of bounds.")]
    OutOfBounds,
}

pub type Result<T> = ::std::result::Result<T, Error>;
