//! Configuration of a graphics context.

use cgmath::Vector2;

/// Hard ceiling of texture units we are going to manage, whatever the driver
/// reports.
pub const MAX_TEXTURE_UNITS: usize = 64;

/// A structure containing configuration data for a `Context`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextSettings {
    /// Sets the size in pixels of the default (on-screen) framebuffer.
    pub dimensions: Vector2<u32>,
    /// Upper bound of texture units, the queried hardware count is clamped to it.
    pub max_texture_units: usize,
    /// Polls the native error code after state-changing calls.
    pub check_errors: bool,
    /// Always defers loose uniform writes until the program gets activated, even
    /// if the device could write into programs directly.
    pub deferred_uniforms: bool,
}

impl Default for ContextSettings {
    fn default() -> Self {
        ContextSettings {
            dimensions: Vector2::new(640, 320),
            max_texture_units: MAX_TEXTURE_UNITS,
            check_errors: cfg!(debug_assertions),
            deferred_uniforms: false,
        }
    }
}
