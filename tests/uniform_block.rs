extern crate env_logger;
extern crate glstate;

use glstate::backends::Capabilities;
use glstate::cgmath::{Matrix4, Vector3};
use glstate::prelude::*;

const VS_A: &str = "
    layout(std140) uniform Camera {
        mat4 view;
        vec4 tint;
    };

    void main() {}
";

const VS_B: &str = "
    layout(std140) uniform Camera {
        mat4 view;
        vec4 tint;
    };

    uniform float u_fade;
    void main() {}
";

fn testbed() -> (Context, HeadlessProbe) {
    let _ = env_logger::try_init();
    let device = HeadlessDevice::new();
    let probe = device.probe();
    let ctx = Context::new(Box::new(device), ContextSettings::default()).unwrap();
    (ctx, probe)
}

fn f32_at(bytes: &[u8], offset: usize) -> f32 {
    let mut v = [0; 4];
    v.copy_from_slice(&bytes[offset..offset + 4]);
    f32::from_bits(u32::from_ne_bytes(v))
}

#[test]
fn shared_between_programs() {
    let (mut ctx, probe) = testbed();
    let a = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Vertex, VS_A)
            .with_default("tint", [0.5f32; 4])])
        .unwrap();
    let b = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Vertex, VS_B)
            .with_default("tint", [0.25f32; 4])])
        .unwrap();

    assert_eq!(probe.count("create_buffer"), 1);
    let buffer = ctx.uniform_block_buffer(a, "Camera").unwrap().unwrap();
    assert_eq!(ctx.uniform_block_buffer(b, "Camera").unwrap(), Some(buffer));
    assert_eq!(ctx.program(a).unwrap().block("Camera").unwrap().size(), 80);

    // Defaults only initialize buffers which have just been created.
    let data = ctx.uniform_block_data(b, "Camera").unwrap().unwrap();
    assert_eq!(data.len(), 80);
    assert_eq!(f32_at(data, 64), 0.5);

    // Nothing gets uploaded before a program using the block is activated.
    assert_eq!(f32_at(&probe.buffer_data(buffer).unwrap(), 64), 0.0);

    ctx.activate_program(b).unwrap();
    assert_eq!(f32_at(&probe.buffer_data(buffer).unwrap(), 64), 0.5);
    assert_eq!(probe.uniform_buffer_binding(0), buffer);

    // Writes through one program are visible through the other.
    ctx.set_uniform_by_name(a, "tint", [1.0f32, 0.0, 0.0, 1.0])
        .unwrap();
    let data = ctx.uniform_block_data(b, "Camera").unwrap().unwrap();
    assert_eq!(f32_at(data, 64), 1.0);
    assert_eq!(f32_at(data, 68), 0.0);
    assert_eq!(f32_at(&probe.buffer_data(buffer).unwrap(), 64), 0.5);

    probe.clear_calls();
    ctx.activate_program(b).unwrap();
    assert_eq!(probe.count("update_buffer"), 1);
    assert_eq!(probe.count("bind_buffer_base"), 0);
    assert_eq!(f32_at(&probe.buffer_data(buffer).unwrap(), 64), 1.0);

    probe.clear_calls();
    ctx.activate_program(a).unwrap();
    assert_eq!(probe.count("update_buffer"), 0);
}

#[test]
fn matrices() {
    let (mut ctx, _) = testbed();
    let program = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Vertex, VS_A)])
        .unwrap();

    let view = Matrix4::from_nonuniform_scale(2.0f32, 3.0, 4.0);
    assert!(ctx.set_uniform_by_name(program, "view", view).unwrap());

    let data = ctx.uniform_block_data(program, "Camera").unwrap().unwrap();
    assert_eq!(f32_at(data, 0), 2.0);
    assert_eq!(f32_at(data, 20), 3.0);
    assert_eq!(f32_at(data, 40), 4.0);
    assert_eq!(f32_at(data, 60), 1.0);

    match ctx.set_uniform_by_name(program, "tint", 1.0f32) {
        Err(Error::UniformMismatch(..)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn released_with_last_program() {
    let (mut ctx, probe) = testbed();
    let a = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Vertex, VS_A)])
        .unwrap();
    let b = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Vertex, VS_B)])
        .unwrap();
    ctx.activate_program(a).unwrap();

    ctx.delete_program(a).unwrap();
    assert_eq!(probe.count("delete_buffer"), 0);
    assert!(ctx.uniform_block_buffer(b, "Camera").unwrap().is_some());

    ctx.delete_program(b).unwrap();
    assert_eq!(probe.count("delete_buffer"), 1);
    assert_eq!(probe.live_objects().2, 0);

    // A fresh buffer is created, and bound again, for the next user.
    let c = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Vertex, VS_A)])
        .unwrap();
    ctx.activate_program(c).unwrap();
    let buffer = ctx.uniform_block_buffer(c, "Camera").unwrap().unwrap();
    assert_eq!(probe.uniform_buffer_binding(0), buffer);
}

#[test]
fn binding_points_exhausted() {
    let _ = env_logger::try_init();
    let caps = Capabilities {
        max_uniform_buffer_bindings: 1,
        ..Default::default()
    };

    let device = HeadlessDevice::with_capabilities(caps);
    let probe = device.probe();
    let mut ctx = Context::new(Box::new(device), ContextSettings::default()).unwrap();

    let vs = "
        layout(std140) uniform Camera { mat4 view; };
        layout(std140) uniform Light { vec4 color; };
        void main() {}
    ";

    match ctx.create_program(&[ShaderSource::new(ShaderStage::Vertex, vs)]) {
        Err(Error::Requirement(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(probe.live_objects().2, 0);
    assert_eq!(probe.live_objects().4, 0);
    assert_eq!(ctx.shader_modules(), 0);
}

#[test]
fn rebinds_after_failed_activation() {
    let _ = env_logger::try_init();
    let device = HeadlessDevice::new();
    let probe = device.probe();
    let settings = ContextSettings {
        max_texture_units: 1,
        ..Default::default()
    };
    let mut ctx = Context::new(Box::new(device), settings).unwrap();

    let fs = "
        layout(std140) uniform Camera { mat4 view; vec4 tint; };
        uniform sampler2D u_a, u_b;
        void main() {}
    ";

    let program = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Fragment, fs)])
        .unwrap();
    let buffer = ctx.uniform_block_buffer(program, "Camera").unwrap().unwrap();

    let params = TextureParams {
        dimensions: Vector3::new(2, 2, 1),
        ..Default::default()
    };

    for name in &["u_a", "u_b"] {
        let t = ctx.create_texture(params, None).unwrap();
        let uniform = ctx.uniform(program, name).unwrap().unwrap();
        ctx.set_texture(program, uniform, Some(t), None).unwrap();
    }

    match ctx.activate_program(program) {
        Err(Error::TextureUnitsExhausted(1, _)) => {}
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(ctx.current_program(), None);
    assert_eq!(probe.current_program(), 0);

    let uniform = ctx.uniform(program, "u_b").unwrap().unwrap();
    ctx.set_texture(program, uniform, None, None).unwrap();

    ctx.activate_program(program).unwrap();
    assert_eq!(ctx.current_program(), Some(program));
    assert_eq!(probe.current_program(), ctx.program(program).unwrap().id());
    assert_eq!(probe.uniform_buffer_binding(0), buffer);
}
