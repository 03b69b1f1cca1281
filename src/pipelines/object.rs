use crate::{
    data_structures::mesh::MeshDescription,
    error::PassError,
    pass::{Attribute, Blend, Cull, DrawPass, FixedFunction, PassSpec, SharedLayouts, Topology, UniformSource},
};

pub const LABEL: &str = "object";

const SHADER: &str = concat!(include_str!("frame.wgsl"), include_str!("object.wgsl"));

/// Textured mesh drawn with per-invocation model matrix and texture.
pub fn spec(mesh: &MeshDescription) -> PassSpec {
    PassSpec {
        label: LABEL,
        shader: SHADER.to_string(),
        attributes: vec![
            Attribute {
                name: "position",
                components: 3,
                data: mesh.flat_positions(),
            },
            Attribute {
                name: "uv",
                components: 2,
                data: mesh.flat_uv(),
            },
        ],
        elements: mesh.indices(),
        uniforms: vec![UniformSource::Frame, UniformSource::Props],
        state: FixedFunction {
            blend: Blend::Alpha,
            depth_test: true,
            depth_write: true,
            cull: Cull::None,
            topology: Topology::Triangles,
        },
        count: None,
    }
}

pub fn mk_object_pass(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    layouts: SharedLayouts<'_>,
    mesh: &MeshDescription,
) -> Result<DrawPass, PassError> {
    DrawPass::configure(device, color_format, layouts, &spec(mesh))
}
