extern crate env_logger;
extern crate glstate;

use glstate::prelude::*;

const VS: &str = "
    layout(location = 0) in vec3 a_position;
    in vec2 a_uv;
    void main() {}
";

fn testbed() -> (Context, HeadlessProbe, ProgramHandle) {
    let _ = env_logger::try_init();
    let device = HeadlessDevice::new();
    let probe = device.probe();
    let mut ctx = Context::new(Box::new(device), ContextSettings::default()).unwrap();
    let program = ctx
        .create_program(&[ShaderSource::new(ShaderStage::Vertex, VS)])
        .unwrap();
    (ctx, probe, program)
}

fn params(hint: BufferHint, num_indices: u32) -> MeshParams {
    let layout = VertexLayout::build()
        .with("a_position", VertexFormat::Float, 3, false)
        .with("a_normal", VertexFormat::Byte, 4, true)
        .finish()
        .unwrap();

    MeshParams {
        hint,
        layout,
        num_vertices: 4,
        num_indices,
        ..Default::default()
    }
}

#[test]
fn indexed_draws() {
    let (mut ctx, probe, program) = testbed();
    let fb = ctx.default_framebuffer();

    let p = params(BufferHint::Immutable, 6);
    let vertices = vec![0; p.vertex_buffer_len()];
    let indices = [0u16, 1, 2, 2, 1, 3]
        .iter()
        .flat_map(|v| v.to_ne_bytes().to_vec())
        .collect::<Vec<_>>();
    let mesh = ctx.create_mesh(p, Some(&vertices[..]), Some(&indices[..])).unwrap();

    assert_eq!(ctx.draw(fb, program, mesh, MeshIndex::All).unwrap(), 2);
    assert_eq!(probe.draws(), 1);
    assert_eq!(probe.count("create_vertex_array"), 1);

    // Only elements the program consumes are fed.
    assert_eq!(probe.count("vertex_attrib_pointer"), 1);

    probe.clear_calls();
    assert_eq!(ctx.draw(fb, program, mesh, MeshIndex::Ptr(3, 3)).unwrap(), 1);
    assert_eq!(probe.count("create_vertex_array"), 0);
    assert_eq!(probe.count("bind_vertex_array"), 0);
    assert_eq!(probe.count("use_program"), 0);
    assert_eq!(probe.calls().last().unwrap(), "draw_elements(Triangles, 3, U16, 6)");

    match ctx.draw(fb, program, mesh, MeshIndex::Ptr(4, 3)) {
        Err(Error::OutOfBounds) => {}
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(probe.draws(), 2);
}

#[test]
fn array_draws() {
    let (mut ctx, probe, program) = testbed();
    let fb = ctx.default_framebuffer();

    let mut p = params(BufferHint::Dynamic, 0);
    p.primitive = Primitive::TriangleStrip;
    let mesh = ctx.create_mesh(p, None, None).unwrap();
    assert_eq!(probe.count("create_buffer"), 1);

    assert_eq!(ctx.draw(fb, program, mesh, MeshIndex::All).unwrap(), 2);
    assert_eq!(probe.calls().last().unwrap(), "draw_arrays(TriangleStrip, 0, 4)");
}

#[test]
fn vertex_arrays_per_program() {
    let (mut ctx, probe, a) = testbed();
    let b = ctx
        .create_program(&[ShaderSource::new(
            ShaderStage::Vertex,
            "in vec3 a_position; void main() {}",
        )])
        .unwrap();

    let fb = ctx.default_framebuffer();
    let mesh = ctx
        .create_mesh(params(BufferHint::Immutable, 0), None, None)
        .unwrap();

    ctx.draw(fb, a, mesh, MeshIndex::All).unwrap();
    ctx.draw(fb, b, mesh, MeshIndex::All).unwrap();
    ctx.draw(fb, a, mesh, MeshIndex::All).unwrap();
    assert_eq!(probe.count("create_vertex_array"), 2);

    ctx.delete_program(b).unwrap();
    assert_eq!(probe.count("delete_vertex_array"), 1);

    ctx.delete_mesh(mesh).unwrap();
    assert_eq!(probe.count("delete_vertex_array"), 2);
    assert_eq!(probe.live_objects().2, 0);

    match ctx.draw(fb, a, mesh, MeshIndex::All) {
        Err(Error::InvalidHandle(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn updates() {
    let (mut ctx, probe, _) = testbed();

    let immutable = ctx
        .create_mesh(params(BufferHint::Immutable, 6), None, None)
        .unwrap();
    match ctx.update_vertex_buffer(immutable, 0, &[0; 4]) {
        Err(Error::InvalidOperation(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    let p = params(BufferHint::Dynamic, 6);
    let len = p.vertex_buffer_len();
    let mesh = ctx.create_mesh(p, None, None).unwrap();

    ctx.update_vertex_buffer(mesh, len - 4, &[1, 2, 3, 4]).unwrap();
    ctx.update_index_buffer(mesh, 10, &[7, 7]).unwrap();
    assert_eq!(probe.count("update_buffer"), 2);

    match ctx.update_vertex_buffer(mesh, len - 3, &[1, 2, 3, 4]) {
        Err(Error::OutOfBounds) => {}
        other => panic!("unexpected {:?}", other),
    }

    match ctx.update_index_buffer(mesh, 12, &[7, 7]) {
        Err(Error::OutOfBounds) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn invalid_meshes() {
    let (mut ctx, _, _) = testbed();

    match ctx.create_mesh(params(BufferHint::Immutable, 0), Some(&[0; 1024][..]), None) {
        Err(Error::OutOfBounds) => {}
        other => panic!("unexpected {:?}", other),
    }

    let empty = MeshParams::default();
    match ctx.create_mesh(empty, None, None) {
        Err(Error::OutOfBounds) => {}
        other => panic!("unexpected {:?}", other),
    }
}
