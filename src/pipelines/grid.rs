use crate::{
    error::PassError,
    pass::{Attribute, Blend, DrawPass, FixedFunction, PassSpec, SharedLayouts, UniformSource},
    pipelines::procedural_shader,
};

pub const LABEL: &str = "grid";

/// Constant parameters of the grid shader, bound at group 1.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridParams {
    /// Half-size of the quad in world units.
    pub extent: f32,
    /// World-space y of the ground plane, before scaling by `extent`.
    pub height: f32,
    /// Stripe frequency across the quad.
    pub density: f32,
    pub _padding: f32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            extent: 30.0,
            height: -0.2,
            density: 128.0,
            _padding: 0.0,
        }
    }
}

const QUAD: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
const CELLS: [[u32; 3]; 2] = [[0, 1, 2], [0, 2, 3]];

pub fn spec() -> PassSpec {
    spec_with(GridParams::default())
}

pub fn spec_with(params: GridParams) -> PassSpec {
    PassSpec {
        label: LABEL,
        shader: procedural_shader!("grid.wgsl").to_string(),
        attributes: vec![Attribute::vec2("position", &QUAD)],
        elements: CELLS.iter().flatten().copied().collect(),
        uniforms: vec![
            UniformSource::Frame,
            UniformSource::Constant {
                name: "grid_params",
                bytes: bytemuck::bytes_of(&params).to_vec(),
            },
        ],
        state: FixedFunction {
            blend: Blend::Alpha,
            ..Default::default()
        },
        count: None,
    }
}

pub fn mk_grid_pass(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    layouts: SharedLayouts<'_>,
) -> Result<DrawPass, PassError> {
    DrawPass::configure(device, color_format, layouts, &spec())
}
