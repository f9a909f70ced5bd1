//! The pipeline state snapshot of a framebuffer.
//!
//! State is split into groups, and every group carries the generation of its
//! last mutation. Generations are drawn from one counter per context, so two
//! groups with equal generations are always the same value. Applying a
//! snapshot compares generations only and re-emits the native calls of the
//! groups that differ, in a fixed order.

use std::cell::Cell;
use std::ops::Deref;
use std::rc::Rc;

use cgmath::Vector2;

use crate::backends::{BlendFactors, Capabilities, Device};
use crate::errors::{Error, Result};
use crate::types::*;

pub type Generation = u64;

/// The generation counter shared by every snapshot of one context.
#[derive(Debug, Clone, Default)]
pub struct Generations(Rc<Cell<Generation>>);

impl Generations {
    pub fn new() -> Self {
        Generations::default()
    }

    /// Returns a generation larger than any returned before.
    #[inline]
    pub fn next(&self) -> Generation {
        let v = self.0.get() + 1;
        self.0.set(v);
        v
    }
}

/// A value tagged with the generation of its last mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    value: T,
    generation: Generation,
}

/// The difference between a group and what has been applied before.
#[derive(Debug, PartialEq)]
pub enum Diff<'a, T: 'a> {
    Unchanged,
    Changed(&'a T),
}

impl<T> Tracked<T> {
    pub fn new(value: T, generations: &Generations) -> Self {
        Tracked {
            value,
            generation: generations.next(),
        }
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Gives mutable access to the value, bumping its generation.
    #[inline]
    pub fn update(&mut self, generations: &Generations) -> &mut T {
        self.generation = generations.next();
        &mut self.value
    }

    /// Compares against the applied value. An unknown applied value is always
    /// different.
    #[inline]
    pub fn diff(&self, applied: &Option<Tracked<T>>) -> Diff<T> {
        match *applied {
            Some(ref v) if v.generation == self.generation => Diff::Unchanged,
            _ => Diff::Changed(&self.value),
        }
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub viewport_position: Vector2<i32>,
    pub viewport_size: Vector2<u32>,
    pub depth_range: (f64, f64),
}

impl Default for TransformState {
    fn default() -> Self {
        TransformState {
            viewport_position: Vector2::new(0, 0),
            viewport_size: Vector2::new(0, 0),
            depth_range: (0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    pub color: [f32; 4],
    pub depth: f64,
    pub stencil: i32,
}

impl Default for ClearState {
    fn default() -> Self {
        ClearState {
            color: [0.0; 4],
            depth: 1.0,
            stencil: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointState {
    pub size: f32,
    /// Point size is taken from `gl_PointSize` of the program.
    pub program_size: bool,
}

impl Default for PointState {
    fn default() -> Self {
        PointState {
            size: 1.0,
            program_size: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineState {
    pub width: f32,
    pub smooth: bool,
}

impl Default for LineState {
    fn default() -> Self {
        LineState {
            width: 1.0,
            smooth: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonState {
    pub cull_face: CullFace,
    pub front_face: FrontFaceOrder,
    pub mode: PolygonMode,
    /// Factor and units of the depth offset.
    pub offset: (f32, f32),
    /// Enables the offset for filled, line and point polygons.
    pub offset_enable: [bool; 3],
}

impl Default for PolygonState {
    fn default() -> Self {
        PolygonState {
            cull_face: CullFace::Nothing,
            front_face: FrontFaceOrder::CounterClockwise,
            mode: PolygonMode::Fill,
            offset: (0.0, 0.0),
            offset_enable: [false; 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultisampleState {
    pub enable: bool,
    pub alpha_to_coverage: bool,
    /// Sample coverage value and its inversion.
    pub coverage: Option<(f32, bool)>,
}

impl Default for MultisampleState {
    fn default() -> Self {
        MultisampleState {
            enable: true,
            alpha_to_coverage: false,
            coverage: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScissorState {
    /// Position and size of the scissor box, the test is disabled if none.
    pub rect: Option<(Vector2<i32>, Vector2<u32>)>,
}

/// Stencil test and operations of one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilFace {
    pub func: Comparison,
    pub reference: i32,
    pub mask: u32,
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub pass: StencilOp,
}

impl Default for StencilFace {
    fn default() -> Self {
        StencilFace {
            func: Comparison::Always,
            reference: 0,
            mask: !0,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            pass: StencilOp::Keep,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StencilState {
    pub enable: bool,
    pub front: StencilFace,
    pub back: StencilFace,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthState {
    pub enable: bool,
    pub func: Comparison,
}

impl Default for DepthState {
    fn default() -> Self {
        DepthState {
            enable: false,
            func: Comparison::Less,
        }
    }
}

/// Blending of the draw buffers. Unless `multi_enable` (or `multi_equation`)
/// is set, only the first entry of `enable` (or of `factors` and
/// `equations`) is used, for every draw buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendState {
    pub enable: [bool; 4],
    pub multi_enable: bool,
    pub factors: [BlendFactors; 4],
    /// RGB and alpha equations.
    pub equations: [(Equation, Equation); 4],
    pub multi_equation: bool,
    pub color: [f32; 4],
}

impl Default for BlendState {
    fn default() -> Self {
        let factors = BlendFactors {
            src_rgb: BlendFactor::One,
            dst_rgb: BlendFactor::Zero,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
        };

        BlendState {
            enable: [false; 4],
            multi_enable: false,
            factors: [factors; 4],
            equations: [(Equation::Add, Equation::Add); 4],
            multi_equation: false,
            color: [0.0; 4],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DitherState {
    pub enable: bool,
}

impl Default for DitherState {
    fn default() -> Self {
        DitherState { enable: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogicState {
    /// The logical operation, disabled if none.
    pub op: Option<LogicOp>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskState {
    pub color: [[bool; 4]; 4],
    pub multi_color: bool,
    pub depth: bool,
    /// Stencil write masks of the front and back faces.
    pub stencil: [u32; 2],
}

impl Default for MaskState {
    fn default() -> Self {
        MaskState {
            color: [[true; 4]; 4],
            multi_color: false,
            depth: true,
            stencil: [!0; 2],
        }
    }
}

macro_rules! parameters {
    ($($field:ident: $ty:ty => $apply:ident,)*) => {
        /// The full pipeline state of a framebuffer.
        #[derive(Debug, Clone, PartialEq)]
        pub struct Parameters {
            $(pub $field: Tracked<$ty>,)*
        }

        /// What has been applied to the native context, group by group. `None`
        /// stands for unknown.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct AppliedParameters {
            $(pub $field: Option<Tracked<$ty>>,)*
        }

        impl Parameters {
            pub fn new(generations: &Generations) -> Self {
                Parameters {
                    $($field: Tracked::new(<$ty>::default(), generations),)*
                }
            }

            /// Emits the native calls of every group that differs from
            /// `applied`, and records them as applied. Returns the number of
            /// groups applied.
            pub fn apply(
                &self,
                applied: &mut AppliedParameters,
                device: &mut dyn Device,
                capabilities: &Capabilities,
            ) -> Result<usize> {
                let mut changes = 0;

                $(
                    if let Diff::Changed(v) = self.$field.diff(&applied.$field) {
                        trace!("Applies {} {:?}.", stringify!($field), v);
                        $apply(v, device, capabilities)?;
                        applied.$field = Some(self.$field.clone());
                        changes += 1;
                    }
                )*

                Ok(changes)
            }
        }
    };
}

parameters! {
    transform: TransformState => apply_transform,
    clear: ClearState => apply_clear,
    point: PointState => apply_point,
    line: LineState => apply_line,
    polygon: PolygonState => apply_polygon,
    multisample: MultisampleState => apply_multisample,
    scissor: ScissorState => apply_scissor,
    stencil: StencilState => apply_stencil,
    depth: DepthState => apply_depth,
    blend: BlendState => apply_blend,
    dither: DitherState => apply_dither,
    logic: LogicState => apply_logic,
    masks: MaskState => apply_masks,
}

impl AppliedParameters {
    /// Forgets everything, the next apply emits every group.
    pub fn reset(&mut self) {
        *self = AppliedParameters::default();
    }
}

fn apply_transform(v: &TransformState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    device.viewport(v.viewport_position, v.viewport_size);
    device.depth_range(v.depth_range.0, v.depth_range.1);
    Ok(())
}

fn apply_clear(v: &ClearState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    device.clear_color(v.color);
    device.clear_depth(v.depth);
    device.clear_stencil(v.stencil);
    Ok(())
}

fn apply_point(v: &PointState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    device.point_size(v.size);
    device.enable(Capability::ProgramPointSize, v.program_size);
    Ok(())
}

fn apply_line(v: &LineState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    device.line_width(v.width);
    device.enable(Capability::LineSmooth, v.smooth);
    Ok(())
}

fn apply_polygon(v: &PolygonState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    if v.cull_face != CullFace::Nothing {
        device.enable(Capability::CullFace, true);
        device.cull_face(v.cull_face);
    } else {
        device.enable(Capability::CullFace, false);
    }

    device.front_face(v.front_face);
    device.polygon_mode(v.mode);
    device.polygon_offset(v.offset.0, v.offset.1);
    device.enable(Capability::PolygonOffsetFill, v.offset_enable[0]);
    device.enable(Capability::PolygonOffsetLine, v.offset_enable[1]);
    device.enable(Capability::PolygonOffsetPoint, v.offset_enable[2]);
    Ok(())
}

fn apply_multisample(
    v: &MultisampleState,
    device: &mut dyn Device,
    _: &Capabilities,
) -> Result<()> {
    device.enable(Capability::Multisample, v.enable);
    device.enable(Capability::SampleAlphaToCoverage, v.alpha_to_coverage);

    if let Some((value, invert)) = v.coverage {
        device.enable(Capability::SampleCoverage, true);
        device.sample_coverage(value, invert);
    } else {
        device.enable(Capability::SampleCoverage, false);
    }

    Ok(())
}

fn apply_scissor(v: &ScissorState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    if let Some((position, size)) = v.rect {
        device.enable(Capability::ScissorTest, true);
        device.scissor(position, size);
    } else {
        device.enable(Capability::ScissorTest, false);
    }

    Ok(())
}

fn apply_stencil(v: &StencilState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    device.enable(Capability::StencilTest, v.enable);

    for &(face, ref s) in &[(Face::Front, v.front), (Face::Back, v.back)] {
        device.stencil_func(face, s.func, s.reference, s.mask);
        device.stencil_op(face, s.fail, s.depth_fail, s.pass);
    }

    Ok(())
}

fn apply_depth(v: &DepthState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    device.enable(Capability::DepthTest, v.enable);
    device.depth_func(v.func);
    Ok(())
}

fn apply_blend(v: &BlendState, device: &mut dyn Device, caps: &Capabilities) -> Result<()> {
    if (v.multi_enable || v.multi_equation) && !caps.draw_buffers_blend {
        return Err(Error::Requirement("blending per draw buffer".into()));
    }

    if v.multi_enable {
        for (i, &enable) in v.enable.iter().enumerate() {
            device.enable_indexed(Capability::Blend, i as u32, enable);
        }
    } else {
        device.enable(Capability::Blend, v.enable[0]);
    }

    if v.multi_equation {
        for i in 0..4 {
            device.blend_func(Some(i as u32), v.factors[i]);
            device.blend_equation(Some(i as u32), v.equations[i].0, v.equations[i].1);
        }
    } else {
        device.blend_func(None, v.factors[0]);
        device.blend_equation(None, v.equations[0].0, v.equations[0].1);
    }

    device.blend_color(v.color);
    Ok(())
}

fn apply_dither(v: &DitherState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    device.enable(Capability::Dither, v.enable);
    Ok(())
}

fn apply_logic(v: &LogicState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    if let Some(op) = v.op {
        device.enable(Capability::ColorLogicOp, true);
        device.logic_op(op);
    } else {
        device.enable(Capability::ColorLogicOp, false);
    }

    Ok(())
}

fn apply_masks(v: &MaskState, device: &mut dyn Device, _: &Capabilities) -> Result<()> {
    if v.multi_color {
        for (i, &mask) in v.color.iter().enumerate() {
            device.color_mask(Some(i as u32), mask);
        }
    } else {
        device.color_mask(None, v.color[0]);
    }

    device.depth_mask(v.depth);
    device.stencil_mask(Face::Front, v.stencil[0]);
    device.stencil_mask(Face::Back, v.stencil[1]);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backends::headless::HeadlessDevice;

    #[test]
    fn generations() {
        let generations = Generations::new();
        let mut params = Parameters::new(&generations);
        let last = params.clear.generation();

        params.clear.update(&generations).depth = 0.5;
        assert!(params.clear.generation() > last);
        assert!(params.clear.generation() > params.masks.generation());
        assert_eq!(params.clear.depth, 0.5);
    }

    #[test]
    fn apply_changes_only() {
        let generations = Generations::new();
        let mut device = HeadlessDevice::new();
        let probe = device.probe();
        let caps = device.capabilities();

        let mut params = Parameters::new(&generations);
        let mut applied = AppliedParameters::default();
        assert_eq!(params.apply(&mut applied, &mut device, &caps).unwrap(), 13);
        assert_eq!(params.apply(&mut applied, &mut device, &caps).unwrap(), 0);

        probe.clear_calls();
        params.depth.update(&generations).enable = true;
        assert_eq!(params.apply(&mut applied, &mut device, &caps).unwrap(), 1);
        assert_eq!(probe.count("depth_func"), 1);
        assert_eq!(probe.count("clear_color"), 0);
        assert_eq!(applied.depth.as_ref().map(|v| v.enable), Some(true));

        applied.reset();
        assert_eq!(params.apply(&mut applied, &mut device, &caps).unwrap(), 13);
    }

    #[test]
    fn blend_requirement() {
        let generations = Generations::new();
        let mut caps = Capabilities::default();
        caps.draw_buffers_blend = false;
        let mut device = HeadlessDevice::with_capabilities(caps);

        let mut params = Parameters::new(&generations);
        let mut applied = AppliedParameters::default();
        params.blend.update(&generations).multi_equation = true;

        match params.apply(&mut applied, &mut device, &caps) {
            Err(Error::Requirement(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        // Groups in front of the blending are applied already.
        assert!(applied.depth.is_some());
        assert!(applied.blend.is_none());
    }
}
