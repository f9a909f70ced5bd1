use std::ffi::CStr;

use gl;
use gl::types::*;

use crate::backends::capabilities::{Capabilities, Version};
use crate::errors::{Error, Result};

macro_rules! extensions {
    ($($string:expr => $field:ident,)+) => {
        /// The extensions this backend cares about.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
        }

        impl Extensions {
            /// Queries the extension strings of the current context.
            ///
            /// *Safety*: the context must be current on this thread.
            pub unsafe fn parse(version: Version) -> Extensions {
                let strings: Vec<String> = if version >= Version::GL(3, 0) || version >= Version::ES(3, 0) {
                    let mut num = 0;
                    gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut num);
                    (0..num)
                        .filter_map(|i| string(gl::GetStringi(gl::EXTENSIONS, i as GLuint)))
                        .collect()
                } else {
                    string(gl::GetString(gl::EXTENSIONS))
                        .map(|v| v.split(' ').map(|e| e.to_owned()).collect())
                        .unwrap_or_default()
                };

                let mut extensions = Extensions::default();
                for extension in strings {
                    match &extension[..] {
                        $(
                            $string => extensions.$field = true,
                        )+
                        _ => ()
                    }
                }

                extensions
            }
        }
    }
}

extensions! {
    "GL_ARB_uniform_buffer_object" => gl_arb_uniform_buffer_object,
    "GL_ARB_draw_buffers_blend" => gl_arb_draw_buffers_blend,
    "GL_ARB_separate_shader_objects" => gl_arb_separate_shader_objects,
    "GL_EXT_direct_state_access" => gl_ext_direct_state_access,
    "GL_ARB_texture_storage" => gl_arb_texture_storage,
    "GL_ARB_sampler_objects" => gl_arb_sampler_objects,
    "GL_ARB_vertex_array_object" => gl_arb_vertex_array_object,
    "GL_EXT_texture_filter_anisotropic" => gl_ext_texture_filter_anisotropic,
}

unsafe fn string(ptr: *const GLubyte) -> Option<String> {
    if ptr.is_null() {
        return None;
    }

    Some(CStr::from_ptr(ptr as *const _).to_string_lossy().into_owned())
}

unsafe fn integer(name: GLenum) -> usize {
    let mut v = 0;
    gl::GetIntegerv(name, &mut v);
    v.max(0) as usize
}

/// Queries the capabilities of the current context.
///
/// *Safety*: the context must be current on this thread and its functions
/// loaded with `gl::load_with`.
pub unsafe fn parse() -> Result<(Capabilities, Extensions)> {
    let desc = string(gl::GetString(gl::VERSION))
        .ok_or_else(|| Error::Requirement("a current OpenGL context".into()))?;

    let version = Version::from_str(&desc)
        .ok_or_else(|| Error::Requirement(format!("a known OpenGL version, not {}", desc)))?;

    let exts = Extensions::parse(version);

    let ubo = version >= Version::GL(3, 1)
        || version >= Version::ES(3, 0)
        || exts.gl_arb_uniform_buffer_object;

    let caps = Capabilities {
        version,
        max_texture_units: integer(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS),
        max_uniform_buffer_bindings: if ubo {
            integer(gl::MAX_UNIFORM_BUFFER_BINDINGS)
        } else {
            0
        },
        max_draw_buffers: integer(gl::MAX_DRAW_BUFFERS),
        draw_buffers_blend: version >= Version::GL(4, 0)
            || version >= Version::ES(3, 2)
            || exts.gl_arb_draw_buffers_blend,
        program_uniforms: version >= Version::GL(4, 1)
            || version >= Version::ES(3, 1)
            || exts.gl_arb_separate_shader_objects,
    };

    Ok((caps, exts))
}

/// Fails if the context lacks something this crate can not work without.
pub fn check(caps: &Capabilities, exts: &Extensions) -> Result<()> {
    if !(caps.version >= Version::GL(3, 3) || caps.version >= Version::ES(3, 0)) {
        return Err(Error::Requirement(format!(
            "OpenGL 3.3 or OpenGL ES 3.0, not {:?}",
            caps.version
        )));
    }

    if !(caps.version >= Version::GL(4, 2)
        || caps.version >= Version::ES(3, 0)
        || exts.gl_arb_texture_storage)
    {
        return Err(Error::Requirement("immutable texture storage".into()));
    }

    if caps.max_uniform_buffer_bindings == 0 {
        return Err(Error::Requirement("uniform buffer objects".into()));
    }

    Ok(())
}
