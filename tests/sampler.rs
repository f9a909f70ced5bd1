extern crate env_logger;
extern crate glstate;

use glstate::cgmath::Vector3;
use glstate::prelude::*;

fn testbed() -> (Context, HeadlessProbe) {
    let _ = env_logger::try_init();
    let device = HeadlessDevice::new();
    let probe = device.probe();
    let ctx = Context::new(Box::new(device), ContextSettings::default()).unwrap();
    (ctx, probe)
}

#[test]
fn shared_by_params() {
    let (mut ctx, probe) = testbed();

    let a = ctx.create_sampler(SamplerParams::linear());
    let b = ctx.create_sampler(SamplerParams::linear());
    assert_eq!(a.id(), b.id());
    assert_eq!(ctx.sampler_references(&SamplerParams::linear()), 2);
    assert_eq!(probe.count("create_sampler"), 1);

    let c = ctx.create_sampler(SamplerParams::nearest());
    assert!(c.id() != a.id());
    assert_eq!(probe.live_objects().1, 2);

    ctx.delete_sampler(a);
    assert_eq!(ctx.sampler_references(&SamplerParams::linear()), 1);
    assert_eq!(probe.count("delete_sampler"), 0);

    ctx.delete_sampler(b);
    assert_eq!(ctx.sampler_references(&SamplerParams::linear()), 0);
    assert_eq!(probe.count("delete_sampler"), 1);
    assert_eq!(probe.live_objects().1, 1);

    ctx.delete_sampler(c);
    assert_eq!(probe.live_objects().1, 0);
}

#[test]
fn nan_params_are_shared() {
    let (mut ctx, probe) = testbed();
    let params = SamplerParams {
        lod_bias: ::std::f32::NAN,
        ..Default::default()
    };

    let a = ctx.create_sampler(params);
    let b = ctx.create_sampler(params);
    assert_eq!(a.id(), b.id());
    assert_eq!(ctx.sampler_references(&params), 2);
    assert_eq!(probe.count("create_sampler"), 1);
}

#[test]
fn texture_with_sampler() {
    let (mut ctx, probe) = testbed();
    let fs = "uniform sampler2D u_texture; void main() {}";
    let program = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Fragment, fs)])
        .unwrap();
    let uniform = ctx.uniform(program, "u_texture").unwrap().unwrap();

    let params = TextureParams {
        dimensions: Vector3::new(2, 2, 1),
        ..Default::default()
    };

    let texture = ctx.create_texture(params, Some(&[0xff; 16][..])).unwrap();
    let sampler = ctx.create_sampler(SamplerParams::nearest());
    ctx.set_texture(program, uniform, Some(texture), Some(&sampler))
        .unwrap();
    ctx.activate_program(program).unwrap();

    let unit = ctx
        .program(program)
        .unwrap()
        .uniform_at(uniform)
        .unwrap()
        .unit()
        .unwrap();
    assert_eq!(ctx.texture(texture).unwrap().unit(sampler.id()), Some(unit));
    assert_eq!(probe.bound_sampler(unit as u32), sampler.id());
    assert_eq!(probe.bound_texture(unit as u32), ctx.texture(texture).unwrap().id());

    // The texture falls back to its own sampling state.
    let id = sampler.id();
    ctx.delete_sampler(sampler);
    assert_eq!(probe.bound_sampler(unit as u32), 0);
    assert_eq!(ctx.texture_units().units()[unit].sampler(), 0);
    assert_eq!(ctx.texture(texture).unwrap().unit(id), None);
    assert!(ctx.texture(texture).unwrap().units().any(|v| v == unit));

    let u = ctx.program(program).unwrap().uniform_at(uniform).unwrap();
    assert_eq!(u.texture(), Some((texture, 0)));
}
