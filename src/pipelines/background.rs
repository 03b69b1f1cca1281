use crate::{
    error::PassError,
    pass::{Attribute, Blend, Cull, DrawPass, FixedFunction, PassSpec, SharedLayouts, Topology, UniformSource},
    pipelines::procedural_shader,
};

pub const LABEL: &str = "background";

/// A single triangle large enough to cover the whole viewport.
pub const TRIANGLE: [[f32; 2]; 3] = [[-4.0, -4.0], [-4.0, 4.0], [4.0, 0.0]];

pub fn spec() -> PassSpec {
    PassSpec {
        label: LABEL,
        shader: procedural_shader!("background.wgsl").to_string(),
        attributes: vec![Attribute::vec2("position", &TRIANGLE)],
        elements: vec![0, 1, 2],
        uniforms: vec![UniformSource::Frame],
        // drawn first and behind everything, so it neither tests nor writes depth
        state: FixedFunction {
            blend: Blend::Alpha,
            depth_test: false,
            depth_write: false,
            cull: Cull::None,
            topology: Topology::Triangles,
        },
        count: Some(3),
    }
}

pub fn mk_background_pass(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    layouts: SharedLayouts<'_>,
) -> Result<DrawPass, PassError> {
    DrawPass::configure(device, color_format, layouts, &spec())
}
