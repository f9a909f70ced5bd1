use std::cmp;

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

impl Version {
    /// Parses the string returned by `glGetString(GL_VERSION)`.
    pub fn from_str(desc: &str) -> Option<Version> {
        let (es, desc) = if desc.starts_with("OpenGL ES-") {
            // "OpenGL ES-CM 1.1", the profile name is followed by a space.
            (true, desc[10..].splitn(2, ' ').nth(1)?)
        } else if desc.starts_with("OpenGL ES ") {
            (true, &desc[10..])
        } else {
            (false, desc)
        };

        let desc = desc.split(' ').next()?;
        let mut iter = desc.split('.');
        let major = iter.next()?.parse().ok()?;
        let minor = iter.next()?.parse().ok()?;

        if es {
            Some(Version::ES(major, minor))
        } else {
            Some(Version::GL(major, minor))
        }
    }
}

/// Represents the capabilities of the context.
///
/// Contrary to the state, these values never change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    pub version: Version,
    /// Number of texture image units usable by one program.
    pub max_texture_units: usize,
    /// Number of available buffer bind points for uniform buffers.
    pub max_uniform_buffer_bindings: usize,
    /// Maximum number of simultaneous draw buffers.
    pub max_draw_buffers: usize,
    /// Blend state could be set per draw buffer (`glBlendFunci` and friends).
    pub draw_buffers_blend: bool,
    /// Uniforms could be written into a program which is not in use.
    pub program_uniforms: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            version: Version::GL(4, 5),
            max_texture_units: 16,
            max_uniform_buffer_bindings: 36,
            max_draw_buffers: 8,
            draw_buffers_blend: true,
            program_uniforms: true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!(
            Version::from_str("4.5.0 NVIDIA 390.77"),
            Some(Version::GL(4, 5))
        );

        assert_eq!(
            Version::from_str("OpenGL ES 3.2 Mesa 18.0.5"),
            Some(Version::ES(3, 2))
        );

        assert_eq!(Version::from_str("OpenGL ES-CM 1.1"), Some(Version::ES(1, 1)));
        assert_eq!(
            Version::from_str("OpenGL ES-CL 1.0 build 1466"),
            Some(Version::ES(1, 0))
        );
        assert_eq!(Version::from_str("OpenGL ES-CM"), None);
        assert_eq!(Version::from_str("garbage"), None);
    }

    #[test]
    fn compare() {
        assert!(Version::GL(4, 1) > Version::GL(3, 3));
        assert!(Version::GL(3, 3) >= Version::GL(3, 3));
        assert!(!(Version::GL(3, 0) >= Version::ES(3, 0)));
        assert!(!(Version::ES(3, 0) >= Version::GL(3, 0)));
    }
}
