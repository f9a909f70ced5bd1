extern crate env_logger;
extern crate glstate;

use glstate::backends::Capabilities;
use glstate::cgmath::{Matrix4, Vector3};
use glstate::prelude::*;

const VS: &str = "
    layout(location = 0) in vec3 a_position;
    uniform mat4 u_mvp;
    void main() {}
";

const FS: &str = "
    uniform vec4 u_color;
    uniform float u_weights[3];
    uniform sampler2D u_a, u_b;
    void main() {}
";

fn testbed(settings: ContextSettings) -> (Context, HeadlessProbe) {
    let _ = env_logger::try_init();
    let device = HeadlessDevice::new();
    let probe = device.probe();
    (Context::new(Box::new(device), settings).unwrap(), probe)
}

fn sources() -> Vec<ShaderSource> {
    vec![
        ShaderSource::new(ShaderStage::Vertex, VS),
        ShaderSource::new(ShaderStage::Fragment, FS),
    ]
}

fn texture(ctx: &mut Context) -> TextureHandle {
    let params = TextureParams {
        dimensions: Vector3::new(2, 2, 1),
        ..Default::default()
    };

    ctx.create_texture(params, None).unwrap()
}

#[test]
fn reflection() {
    let (mut ctx, _) = testbed(ContextSettings::default());
    let program = ctx.create_program(&sources()).unwrap();
    let p = ctx.program(program).unwrap();

    assert!(p.uniform("u_mvp").is_some());
    assert!(p.uniform("u_color").is_some());
    assert_eq!(p.uniform("u_weights"), p.uniform("u_weights[0]"));
    assert!(p.uniform("u_weights[2]").is_some());
    assert!(p.uniform("u_weights[3]").is_none());
    assert_eq!(p.samplers().count(), 2);

    let mvp = p.uniform("u_mvp").unwrap();
    assert_eq!(p.uniform_at(mvp).unwrap().name(), "u_mvp");

    // Unknown names are legal, they might have been optimized out.
    assert_eq!(ctx.uniform(program, "u_nothing").unwrap(), None);
    assert_eq!(
        ctx.set_uniform_by_name(program, "u_nothing", 1.0f32).unwrap(),
        false
    );
}

#[test]
fn failures() {
    let (mut ctx, probe) = testbed(ContextSettings::default());

    match ctx.create_program(&[]) {
        Err(Error::InvalidOperation(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    let broken = [
        ShaderSource::new(ShaderStage::Vertex, VS),
        ShaderSource::new(ShaderStage::Fragment, "#error broken\nvoid main() {}"),
    ];

    match ctx.create_program(&broken) {
        Err(Error::CompileFailure(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    let unlinkable = [
        ShaderSource::new(ShaderStage::Vertex, VS),
        ShaderSource::new(ShaderStage::Fragment, "uniform vec4 u_color;"),
    ];

    match ctx.create_program(&unlinkable) {
        Err(Error::LinkFailure(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(ctx.shader_modules(), 0);
    assert_eq!(probe.live_objects().3, 0);
    assert_eq!(probe.live_objects().4, 0);
}

#[test]
fn type_mismatch() {
    let (mut ctx, _) = testbed(ContextSettings::default());
    let program = ctx.create_program(&sources()).unwrap();
    let color = ctx.uniform(program, "u_color").unwrap().unwrap();
    let sampler = ctx.uniform(program, "u_a").unwrap().unwrap();

    match ctx.set_uniform(program, color, 1.0f32) {
        Err(Error::UniformMismatch(..)) => {}
        other => panic!("unexpected {:?}", other),
    }

    match ctx.set_uniform(program, sampler, 0i32) {
        Err(Error::UniformMismatch(..)) => {}
        other => panic!("unexpected {:?}", other),
    }

    let t = texture(&mut ctx);
    match ctx.set_texture(program, color, Some(t), None) {
        Err(Error::UniformMismatch(..)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn immediate_writes() {
    let (mut ctx, probe) = testbed(ContextSettings::default());
    let program = ctx.create_program(&sources()).unwrap();
    let id = ctx.program(program).unwrap().id();
    let color = ctx.uniform(program, "u_color").unwrap().unwrap();

    let v = [1.0f32, 0.0, 0.0, 1.0];
    ctx.set_uniform(program, color, v).unwrap();
    assert_eq!(probe.current_program(), 0);
    assert_eq!(probe.uniform(id, "u_color"), Some(UniformValue::from(v)));

    let u = ctx.program(program).unwrap().uniform_at(color).unwrap();
    assert_eq!(u.value(), Some(&UniformValue::from(v)));

    ctx.set_uniform_by_name(program, "u_weights[2]", 0.5f32)
        .unwrap();
    assert_eq!(probe.uniform(id, "u_weights[2]"), Some(UniformValue::from(0.5f32)));

    let mvp = Matrix4::from_scale(2.0f32);
    ctx.set_uniform_by_name(program, "u_mvp", mvp).unwrap();
    assert_eq!(probe.uniform(id, "u_mvp"), Some(UniformValue::from(mvp)));
}

#[test]
fn deferred_writes() {
    let settings = ContextSettings {
        deferred_uniforms: true,
        ..Default::default()
    };

    let (mut ctx, probe) = testbed(settings);
    let program = ctx.create_program(&sources()).unwrap();
    let id = ctx.program(program).unwrap().id();
    let color = ctx.uniform(program, "u_color").unwrap().unwrap();

    probe.clear_calls();
    ctx.set_uniform(program, color, [0.0f32, 1.0, 0.0, 1.0])
        .unwrap();
    ctx.set_uniform(program, color, [0.0f32, 0.0, 1.0, 1.0])
        .unwrap();
    assert_eq!(probe.count("write_uniform"), 0);
    assert_eq!(probe.uniform(id, "u_color"), None);

    ctx.activate_program(program).unwrap();
    assert_eq!(probe.count("write_uniform"), 1);
    assert_eq!(
        probe.uniform(id, "u_color"),
        Some(UniformValue::from([0.0f32, 0.0, 1.0, 1.0]))
    );

    // Writes into the program in use go straight to the driver.
    ctx.set_uniform(program, color, [1.0f32; 4]).unwrap();
    assert_eq!(probe.count("write_uniform"), 2);

    probe.clear_calls();
    ctx.activate_program(program).unwrap();
    assert_eq!(probe.count("write_uniform"), 0);
}

#[test]
fn deferred_without_program_uniforms() {
    let _ = env_logger::try_init();
    let caps = Capabilities {
        program_uniforms: false,
        ..Default::default()
    };

    let device = HeadlessDevice::with_capabilities(caps);
    let probe = device.probe();
    let mut ctx = Context::new(Box::new(device), ContextSettings::default()).unwrap();

    let program = ctx.create_program(&sources()).unwrap();
    ctx.set_uniform_by_name(program, "u_color", [1.0f32; 4])
        .unwrap();
    assert_eq!(probe.count("write_uniform"), 0);

    ctx.activate_program(program).unwrap();
    assert_eq!(probe.count("write_uniform"), 1);
}

#[test]
fn defaults() {
    let (mut ctx, probe) = testbed(ContextSettings::default());
    let fs = ShaderSource::new(ShaderStage::Fragment, "uniform float u_scale; void main() {}")
        .with_default("u_scale", 2.0f32)
        .with_default("u_missing", 1.0f32);

    let program = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Vertex, VS), fs])
        .unwrap();
    let id = ctx.program(program).unwrap().id();
    assert_eq!(probe.uniform(id, "u_scale"), Some(UniformValue::from(2.0f32)));
}

#[test]
fn sampler_units() {
    let (mut ctx, probe) = testbed(ContextSettings::default());
    let program = ctx.create_program(&sources()).unwrap();
    let id = ctx.program(program).unwrap().id();

    let ta = texture(&mut ctx);
    let tb = texture(&mut ctx);
    for &(name, t) in &[("u_a", ta), ("u_b", tb)] {
        let uniform = ctx.uniform(program, name).unwrap().unwrap();
        ctx.set_texture(program, uniform, Some(t), None).unwrap();
    }

    ctx.activate_program(program).unwrap();

    for &(name, t) in &[("u_a", ta), ("u_b", tb)] {
        let unit = ctx.texture(t).unwrap().units().next().unwrap();
        assert_eq!(probe.uniform(id, name), Some(UniformValue::from(unit as i32)));
        assert_eq!(probe.bound_texture(unit as u32), ctx.texture(t).unwrap().id());
        assert!(ctx.texture(t).unwrap().is_used_by(program));
    }

    // Pointing both uniforms at one texture releases the other.
    let uniform = ctx.uniform(program, "u_b").unwrap().unwrap();
    ctx.set_texture(program, uniform, Some(ta), None).unwrap();
    assert!(!ctx.texture(tb).unwrap().is_used_by(program));
    assert_eq!(
        probe.uniform(id, "u_a"),
        probe.uniform(id, "u_b")
    );
}

#[test]
fn shared_modules() {
    let (mut ctx, probe) = testbed(ContextSettings::default());
    let a = ctx.create_program(&sources()).unwrap();
    let b = ctx
        .create_program(&[
            ShaderSource::new(ShaderStage::Vertex, VS),
            ShaderSource::new(ShaderStage::Fragment, "uniform vec3 u_tint; void main() {}"),
        ])
        .unwrap();

    assert_eq!(probe.count("compile_shader"), 3);
    assert_eq!(ctx.shader_modules(), 3);

    ctx.delete_program(a).unwrap();
    assert_eq!(ctx.shader_modules(), 2);
    assert_eq!(probe.count("delete_shader"), 1);

    ctx.delete_program(b).unwrap();
    assert_eq!(ctx.shader_modules(), 0);
    assert_eq!(probe.live_objects().3, 0);
    assert_eq!(probe.live_objects().4, 0);
}

#[test]
fn delete_program_in_use() {
    let (mut ctx, probe) = testbed(ContextSettings::default());
    let program = ctx.create_program(&sources()).unwrap();
    let t = texture(&mut ctx);
    let uniform = ctx.uniform(program, "u_a").unwrap().unwrap();
    ctx.set_texture(program, uniform, Some(t), None).unwrap();
    ctx.activate_program(program).unwrap();

    ctx.delete_program(program).unwrap();
    assert_eq!(probe.current_program(), 0);
    assert_eq!(ctx.current_program(), None);
    assert!(!ctx.texture(t).unwrap().is_used_by(program));
    assert!(ctx.program(program).is_err());

    match ctx.activate_program(program) {
        Err(Error::InvalidHandle(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}
