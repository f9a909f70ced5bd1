extern crate env_logger;
extern crate glstate;

use glstate::backends::Capabilities;
use glstate::cgmath::{Vector2, Vector3};
use glstate::prelude::*;

fn testbed() -> (Context, HeadlessProbe) {
    let _ = env_logger::try_init();
    let device = HeadlessDevice::new();
    let probe = device.probe();
    let ctx = Context::new(Box::new(device), ContextSettings::default()).unwrap();
    (ctx, probe)
}

fn offscreen(ctx: &mut Context) -> FrameBufferHandle {
    let fb = ctx.create_framebuffer(Vector2::new(4, 4));
    let rb = ctx
        .create_renderbuffer(TextureFormat::RGBA8, Vector2::new(4, 4))
        .unwrap();

    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_attachment(AttachmentPoint::Color(0), Attachment::from(rb))
        .unwrap();
    fb
}

#[test]
fn generations() {
    let (mut ctx, _) = testbed();
    let fb = ctx.default_framebuffer();

    let (clear, depth) = {
        let p = ctx.framebuffer(fb).unwrap().parameters();
        (p.clear.generation(), p.depth.generation())
    };

    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_clear_color([1.0, 0.0, 0.0, 1.0]);

    let p = ctx.framebuffer(fb).unwrap().parameters();
    assert!(p.clear.generation() > clear);
    assert_eq!(p.depth.generation(), depth);
}

#[test]
fn applies_changed_groups_only() {
    let (mut ctx, probe) = testbed();
    let fb = ctx.default_framebuffer();

    ctx.clear(fb, true, false, false).unwrap();
    assert_eq!(probe.count("bind_framebuffer"), 1);
    assert_eq!(probe.count("clear_color"), 1);
    assert_eq!(probe.count("clear"), 1);

    probe.clear_calls();
    ctx.clear(fb, true, false, false).unwrap();
    assert_eq!(probe.count("bind_framebuffer"), 0);
    assert_eq!(probe.count("clear_color"), 0);
    assert_eq!(probe.count("clear"), 1);

    probe.clear_calls();
    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_clear_color([0.0, 1.0, 0.0, 1.0]);
    ctx.clear(fb, true, true, false).unwrap();
    assert_eq!(probe.count("clear_color"), 1);
    assert_eq!(probe.count("viewport"), 0);
    assert_eq!(probe.count("depth_func"), 0);

    // Setting the same value again still counts as a change.
    probe.clear_calls();
    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_clear_color([0.0, 1.0, 0.0, 1.0]);
    ctx.clear(fb, true, false, false).unwrap();
    assert_eq!(probe.count("clear_color"), 1);
}

#[test]
fn empty_clear() {
    let (mut ctx, probe) = testbed();
    let fb = ctx.default_framebuffer();

    ctx.clear(fb, false, false, false).unwrap();
    assert_eq!(probe.count("clear"), 0);
    assert_eq!(probe.count("bind_framebuffer"), 1);
}

#[test]
fn switching_reapplies_everything() {
    let (mut ctx, probe) = testbed();
    let a = ctx.default_framebuffer();
    let b = offscreen(&mut ctx);

    probe.clear_calls();
    ctx.activate_framebuffer(a).unwrap();
    ctx.activate_framebuffer(b).unwrap();
    ctx.activate_framebuffer(a).unwrap();

    assert_eq!(probe.count("bind_framebuffer"), 3);
    assert_eq!(probe.count("clear_color"), 3);
    assert_eq!(probe.count("check_framebuffer_status"), 1);
    assert_eq!(probe.current_framebuffer(), 0);
    assert_eq!(ctx.current_framebuffer(), Some(a));

    // Attachments were synchronized with the first activation of b.
    probe.clear_calls();
    ctx.activate_framebuffer(b).unwrap();
    assert_eq!(probe.count("attach_renderbuffer"), 0);
    assert_eq!(probe.count("check_framebuffer_status"), 0);
}

#[test]
fn clear_and_read_back() {
    let (mut ctx, _) = testbed();
    let fb = offscreen(&mut ctx);

    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_clear_color([1.0, 0.0, 0.0, 1.0]);
    ctx.clear(fb, true, false, false).unwrap();

    let pixels = ctx
        .read_pixels(fb, Vector2::new(0, 0), Vector2::new(2, 1), TextureFormat::RGBA8)
        .unwrap();
    assert_eq!(pixels, vec![255, 0, 0, 255, 255, 0, 0, 255]);
}

#[test]
fn incomplete() {
    let (mut ctx, _) = testbed();
    let fb = ctx.create_framebuffer(Vector2::new(4, 4));

    match ctx.activate_framebuffer(fb) {
        Err(Error::FramebufferIncomplete(FramebufferStatus::MissingAttachment)) => {}
        other => panic!("unexpected {:?}", other),
    }

    let color = ctx
        .create_renderbuffer(TextureFormat::RGBA8, Vector2::new(4, 4))
        .unwrap();
    let depth = ctx
        .create_renderbuffer(TextureFormat::Depth24Stencil8, Vector2::new(8, 8))
        .unwrap();

    {
        let v = ctx.framebuffer_mut(fb).unwrap();
        v.set_attachment(AttachmentPoint::Color(0), Attachment::from(color))
            .unwrap();
        v.set_attachment(AttachmentPoint::Depth, Attachment::from(depth))
            .unwrap();
    }

    match ctx.clear(fb, true, true, false) {
        Err(Error::FramebufferIncomplete(FramebufferStatus::IncompleteDimensions)) => {}
        other => panic!("unexpected {:?}", other),
    }

    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_attachment(AttachmentPoint::Depth, None::<Attachment>)
        .unwrap();
    ctx.clear(fb, true, false, false).unwrap();
}

#[test]
fn depth_and_stencil_sizes_disagree() {
    let (mut ctx, probe) = testbed();
    let fb = ctx.create_framebuffer(Vector2::new(8, 8));

    let params = TextureParams {
        format: TextureFormat::Depth24,
        dimensions: Vector3::new(8, 8, 1),
        ..Default::default()
    };

    let depth = ctx.create_texture(params, None).unwrap();
    let stencil = ctx
        .create_renderbuffer(TextureFormat::Stencil8, Vector2::new(4, 4))
        .unwrap();

    {
        let v = ctx.framebuffer_mut(fb).unwrap();
        v.set_attachment(AttachmentPoint::Depth, Attachment::from(depth))
            .unwrap();
        v.set_attachment(AttachmentPoint::Stencil, Attachment::from(stencil))
            .unwrap();
    }

    match ctx.clear(fb, false, true, true) {
        Err(Error::FramebufferIncomplete(FramebufferStatus::IncompleteDimensions)) => {}
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(probe.count("clear"), 0);
}

#[test]
fn texture_attachments() {
    let (mut ctx, probe) = testbed();
    let fb = ctx.create_framebuffer(Vector2::new(8, 8));

    let params = TextureParams {
        dimensions: Vector3::new(8, 8, 1),
        ..Default::default()
    };

    let texture = ctx.create_texture(params, None).unwrap();
    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_attachment(AttachmentPoint::Color(0), Attachment::from(texture))
        .unwrap();
    ctx.activate_framebuffer(fb).unwrap();
    assert_eq!(probe.count("attach_texture"), 1);

    ctx.delete_texture(texture).unwrap();
    assert_eq!(
        ctx.framebuffer(fb)
            .unwrap()
            .attachment(AttachmentPoint::Color(0)),
        None
    );
}

#[test]
fn deleting_renderbuffer_detaches_it() {
    let (mut ctx, probe) = testbed();
    let fb = ctx.create_framebuffer(Vector2::new(4, 4));
    let rb = ctx
        .create_renderbuffer(TextureFormat::RGBA8, Vector2::new(4, 4))
        .unwrap();

    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_attachment(AttachmentPoint::Color(0), Attachment::from(rb))
        .unwrap();
    ctx.activate_framebuffer(fb).unwrap();

    ctx.delete_renderbuffer(rb).unwrap();
    assert!(ctx.renderbuffer(rb).is_err());
    assert_eq!(
        ctx.framebuffer(fb)
            .unwrap()
            .attachment(AttachmentPoint::Color(0)),
        None
    );
    assert_eq!(probe.live_targets(), (1, 0));

    match ctx.activate_framebuffer(fb) {
        Err(Error::FramebufferIncomplete(FramebufferStatus::MissingAttachment)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn delete_framebuffers() {
    let (mut ctx, probe) = testbed();
    let default = ctx.default_framebuffer();

    match ctx.delete_framebuffer(default) {
        Err(Error::InvalidOperation(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    let fb = offscreen(&mut ctx);
    ctx.activate_framebuffer(fb).unwrap();
    ctx.delete_framebuffer(fb).unwrap();
    assert_eq!(ctx.current_framebuffer(), None);
    assert_eq!(probe.current_framebuffer(), 0);
    assert!(ctx.framebuffer(fb).is_err());

    match ctx.activate_framebuffer(fb) {
        Err(Error::InvalidHandle(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    // Nothing is assumed about the native state after the deletion.
    probe.clear_calls();
    ctx.activate_framebuffer(default).unwrap();
    assert_eq!(probe.count("bind_framebuffer"), 1);
    assert_eq!(probe.count("clear_color"), 1);
}

#[test]
fn draw_buffers() {
    let (mut ctx, probe) = testbed();
    let fb = offscreen(&mut ctx);
    ctx.activate_framebuffer(fb).unwrap();

    probe.clear_calls();
    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_draw_buffers(&[BufferId::Color(0), BufferId::None])
        .unwrap();
    ctx.activate_framebuffer(fb).unwrap();
    assert_eq!(probe.count("draw_buffers"), 1);
    assert_eq!(probe.count("read_buffer"), 1);

    probe.clear_calls();
    ctx.activate_framebuffer(fb).unwrap();
    assert_eq!(probe.count("draw_buffers"), 0);
}

#[test]
fn indexed_blending_requirement() {
    let _ = env_logger::try_init();
    let caps = Capabilities {
        draw_buffers_blend: false,
        ..Default::default()
    };

    let device = HeadlessDevice::with_capabilities(caps);
    let mut ctx = Context::new(Box::new(device), ContextSettings::default()).unwrap();
    let fb = ctx.default_framebuffer();

    ctx.framebuffer_mut(fb).unwrap().set_blend(true);
    ctx.clear(fb, true, false, false).unwrap();

    ctx.framebuffer_mut(fb)
        .unwrap()
        .set_blend_indexed(1, false)
        .unwrap();

    match ctx.clear(fb, true, false, false) {
        Err(Error::Requirement(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn enables_capabilities() {
    let (mut ctx, probe) = testbed();
    let fb = ctx.default_framebuffer();

    {
        let v = ctx.framebuffer_mut(fb).unwrap();
        v.set_depth_test(true);
        v.set_depth_func(Comparison::LessOrEqual);
        v.set_scissor(Some((Vector2::new(0, 0), Vector2::new(2, 2))));
    }

    ctx.activate_framebuffer(fb).unwrap();
    assert!(probe.is_enabled(Capability::DepthTest));
    assert!(probe.is_enabled(Capability::ScissorTest));
    assert!(!probe.is_enabled(Capability::StencilTest));

    ctx.framebuffer_mut(fb).unwrap().set_scissor(None);
    ctx.activate_framebuffer(fb).unwrap();
    assert!(!probe.is_enabled(Capability::ScissorTest));
}

#[cfg(debug_assertions)]
#[test]
#[should_panic]
fn native_errors() {
    let (mut ctx, probe) = testbed();
    let fb = ctx.default_framebuffer();

    probe.inject_error("GL_INVALID_ENUM");
    let _ = ctx.clear(fb, true, false, false);
}
