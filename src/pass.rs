//! Reusable draw passes.
//!
//! A [`PassSpec`] bundles everything one draw needs: a WGSL program with
//! `vs_main`/`fs_main` entry points, named vertex attributes, an index list,
//! the uniform groups the program reads and the complete fixed-function state.
//! [`DrawPass::configure`] validates the description, compiles the shader and builds
//! the GPU objects once. [`DrawPass::invoke`] records one draw into an open
//! render pass and may be called several times per frame.
//!
//! Bind group indices follow the order of [`PassSpec::uniforms`]. The frame
//! uniform and each constant take one group. [`UniformSource::Props`] takes
//! two: the model matrix (dynamic offset) followed by texture and sampler.

use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::{Texture, TextureBinding},
    error::{DrawError, PassError},
    frame::ObjectProps,
};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Size of one model matrix in the props buffer.
pub const MODEL_SIZE: u64 = std::mem::size_of::<[[f32; 4]; 4]>() as u64;

/// Property slots available to one pass per frame.
pub const PROPS_CAPACITY: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    /// Source overwrites the target.
    Replace,
    /// `src * src_alpha + dst * (1 - src_alpha)`.
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cull {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    TriangleStrip,
    Lines,
    LineStrip,
    Points,
}

impl Topology {
    /// Index count a complete primitive list must be a multiple of.
    fn multiple(self) -> u32 {
        match self {
            Topology::Triangles => 3,
            Topology::Lines => 2,
            Topology::TriangleStrip | Topology::LineStrip | Topology::Points => 1,
        }
    }

    fn is_strip(self) -> bool {
        matches!(self, Topology::TriangleStrip | Topology::LineStrip)
    }
}

/// Complete fixed-function state of a pass. Nothing is inherited from the
/// pass drawn before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFunction {
    pub blend: Blend,
    pub depth_test: bool,
    pub depth_write: bool,
    pub cull: Cull,
    pub topology: Topology,
}

impl Default for FixedFunction {
    fn default() -> Self {
        Self {
            blend: Blend::Replace,
            depth_test: true,
            depth_write: true,
            cull: Cull::None,
            topology: Topology::Triangles,
        }
    }
}

impl FixedFunction {
    pub fn blend_state(&self) -> wgpu::BlendState {
        match self.blend {
            Blend::Replace => wgpu::BlendState::REPLACE,
            Blend::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        }
    }

    pub fn primitive_state(&self) -> wgpu::PrimitiveState {
        let topology = match self.topology {
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
            Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Topology::Points => wgpu::PrimitiveTopology::PointList,
        };
        let cull_mode = match self.cull {
            Cull::None => None,
            Cull::Front => Some(wgpu::Face::Front),
            Cull::Back => Some(wgpu::Face::Back),
        };
        wgpu::PrimitiveState {
            topology,
            strip_index_format: self
                .topology
                .is_strip()
                .then_some(wgpu::IndexFormat::Uint32),
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }

    /// With the test disabled every fragment passes, but the write flag still
    /// applies.
    pub fn depth_stencil_state(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(self.depth_write),
            depth_compare: Some(if self.depth_test {
                wgpu::CompareFunction::LessEqual
            } else {
                wgpu::CompareFunction::Always
            }),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

/// One float vector attribute, bound at the location of its position in
/// [`PassSpec::attributes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: &'static str,
    pub components: u32,
    pub data: Vec<f32>,
}

impl Attribute {
    pub fn vec2(name: &'static str, values: &[[f32; 2]]) -> Self {
        Self {
            name,
            components: 2,
            data: values.iter().flatten().copied().collect(),
        }
    }

    pub fn vec3(name: &'static str, values: &[[f32; 3]]) -> Self {
        Self {
            name,
            components: 3,
            data: values.iter().flatten().copied().collect(),
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.data.len() as u32 / self.components.max(1)
    }

    fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            2 => wgpu::VertexFormat::Float32x2,
            _ => wgpu::VertexFormat::Float32x3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UniformSource {
    /// Per-frame `{ projection, view, time }`.
    Frame,
    /// Bytes fixed at configuration time.
    Constant { name: &'static str, bytes: Vec<u8> },
    /// Per-invocation model matrix and texture.
    Props,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassSpec {
    pub label: &'static str,
    pub shader: String,
    pub attributes: Vec<Attribute>,
    pub elements: Vec<u32>,
    pub uniforms: Vec<UniformSource>,
    pub state: FixedFunction,
    /// Number of elements drawn, all of them when `None`.
    pub count: Option<u32>,
}

impl PassSpec {
    fn geometry_error(&self, reason: impl Into<String>) -> PassError {
        PassError::Geometry {
            label: self.label.to_string(),
            reason: reason.into(),
        }
    }

    /// Checks geometry and uniform declarations. Returns the draw count.
    pub fn validate(&self) -> Result<u32, PassError> {
        let first = self
            .attributes
            .first()
            .ok_or_else(|| self.geometry_error("no vertex attributes"))?;
        let vertices = first.vertex_count();
        for attribute in &self.attributes {
            if !matches!(attribute.components, 2 | 3) {
                return Err(self.geometry_error(format!(
                    "attribute `{}` has {} components, expected 2 or 3",
                    attribute.name, attribute.components
                )));
            }
            if attribute.data.is_empty() || attribute.data.len() % attribute.components as usize != 0 {
                return Err(self.geometry_error(format!(
                    "attribute `{}` holds {} floats, not a whole number of vectors",
                    attribute.name,
                    attribute.data.len()
                )));
            }
            if attribute.vertex_count() != vertices {
                return Err(self.geometry_error(format!(
                    "attribute `{}` has {} vertices, `{}` has {}",
                    attribute.name,
                    attribute.vertex_count(),
                    first.name,
                    vertices
                )));
            }
        }

        if self.elements.is_empty() {
            return Err(self.geometry_error("no elements"));
        }
        if let Some(index) = self.elements.iter().find(|&&i| i >= vertices) {
            return Err(self.geometry_error(format!(
                "element {index} is out of range for {vertices} vertices"
            )));
        }

        let count = self.count.unwrap_or(self.elements.len() as u32);
        if count == 0 || count as usize > self.elements.len() {
            return Err(self.geometry_error(format!(
                "count {count} does not fit {} elements",
                self.elements.len()
            )));
        }
        if count % self.state.topology.multiple() != 0 {
            return Err(self.geometry_error(format!(
                "count {count} is not a whole number of {:?}",
                self.state.topology
            )));
        }

        let uniforms_error = |reason: &str| PassError::Uniforms {
            label: self.label.to_string(),
            reason: reason.to_string(),
        };
        let occurrences = |wanted: fn(&UniformSource) -> bool| {
            self.uniforms.iter().filter(|u| wanted(u)).count()
        };
        if occurrences(|u| matches!(u, UniformSource::Frame)) > 1 {
            return Err(uniforms_error("frame uniform bound twice"));
        }
        if occurrences(|u| matches!(u, UniformSource::Props)) > 1 {
            return Err(uniforms_error("props bound twice"));
        }
        for uniform in &self.uniforms {
            if let UniformSource::Constant { name, bytes } = uniform {
                if bytes.is_empty() || bytes.len() % 16 != 0 {
                    return Err(uniforms_error(&format!(
                        "constant `{name}` is {} bytes, expected a non-zero multiple of 16",
                        bytes.len()
                    )));
                }
            }
        }

        Ok(count)
    }

    pub fn needs_props(&self) -> bool {
        self.uniforms.contains(&UniformSource::Props)
    }
}

/// Parses and validates WGSL, requiring both pass entry points.
pub fn compile_shader(label: &str, source: &str) -> Result<naga::Module, PassError> {
    let error = |message: String| PassError::Shader {
        label: label.to_string(),
        message,
    };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| error(e.emit_to_string(source)))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| error(e.emit_to_string(source)))?;

    for (name, stage) in [
        (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    ] {
        if !module
            .entry_points
            .iter()
            .any(|ep| ep.name == name && ep.stage == stage)
        {
            return Err(error(format!("missing {stage:?} entry point `{name}`")));
        }
    }
    Ok(module)
}

/// Hands out distinct offsets into a props buffer within one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropSlots {
    stride: u64,
    capacity: u32,
    next: u32,
}

impl PropSlots {
    /// `alignment` is the device's `min_uniform_buffer_offset_alignment`.
    pub fn new(alignment: u32, capacity: u32) -> Self {
        let alignment = u64::from(alignment.max(1));
        Self {
            stride: MODEL_SIZE.div_ceil(alignment) * alignment,
            capacity,
            next: 0,
        }
    }

    pub fn claim(&mut self) -> Option<u64> {
        if self.next >= self.capacity {
            return None;
        }
        let offset = u64::from(self.next) * self.stride;
        self.next += 1;
        Some(offset)
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn buffer_size(&self) -> u64 {
        self.stride * u64::from(self.capacity)
    }
}

/// Layouts shared by every pass.
#[derive(Debug, Clone, Copy)]
pub struct SharedLayouts<'a> {
    pub frame: &'a wgpu::BindGroupLayout,
    pub texture: &'a wgpu::BindGroupLayout,
}

#[derive(Debug)]
struct ConstantBinding {
    group: u32,
    bind_group: wgpu::BindGroup,
    #[allow(unused)]
    buffer: wgpu::Buffer,
}

#[derive(Debug)]
struct PropsBinding {
    model_group: u32,
    texture_group: u32,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    slots: PropSlots,
}

/// A configured pass, ready to be invoked inside a render pass.
#[derive(Debug)]
pub struct DrawPass {
    label: &'static str,
    state: FixedFunction,
    pipeline: wgpu::RenderPipeline,
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    count: u32,
    frame_group: Option<u32>,
    constants: Vec<ConstantBinding>,
    props: Option<PropsBinding>,
}

impl DrawPass {
    pub fn configure(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        layouts: SharedLayouts<'_>,
        spec: &PassSpec,
    ) -> Result<Self, PassError> {
        let count = spec.validate()?;
        compile_shader(spec.label, &spec.shader)?;
        log::debug!("configuring pass `{}` with {count} elements", spec.label);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(spec.label),
            source: wgpu::ShaderSource::Wgsl(spec.shader.as_str().into()),
        });

        let vertex_buffers = spec
            .attributes
            .iter()
            .map(|attribute| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(attribute.name),
                    contents: bytemuck::cast_slice(&attribute.data),
                    usage: wgpu::BufferUsages::VERTEX,
                })
            })
            .collect();
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(spec.label),
            contents: bytemuck::cast_slice(&spec.elements),
            usage: wgpu::BufferUsages::INDEX,
        });

        let mut group_layouts: Vec<wgpu::BindGroupLayout> = Vec::new();
        let mut frame_group = None;
        let mut constants = Vec::new();
        let mut props = None;
        for uniform in &spec.uniforms {
            let group = group_layouts.len() as u32;
            match uniform {
                UniformSource::Frame => {
                    frame_group = Some(group);
                    group_layouts.push(layouts.frame.clone());
                }
                UniformSource::Constant { name, bytes } => {
                    let layout = uniform_layout(device, name, false, None);
                    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(*name),
                        contents: bytes,
                        usage: wgpu::BufferUsages::UNIFORM,
                    });
                    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout: &layout,
                        entries: &[wgpu::BindGroupEntry {
                            binding: 0,
                            resource: buffer.as_entire_binding(),
                        }],
                        label: Some(*name),
                    });
                    constants.push(ConstantBinding {
                        group,
                        bind_group,
                        buffer,
                    });
                    group_layouts.push(layout);
                }
                UniformSource::Props => {
                    let slots = PropSlots::new(
                        device.limits().min_uniform_buffer_offset_alignment,
                        PROPS_CAPACITY,
                    );
                    let layout = uniform_layout(device, "model", true, NonZeroU64::new(MODEL_SIZE));
                    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("model slots"),
                        size: slots.buffer_size(),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout: &layout,
                        entries: &[wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                                buffer: &buffer,
                                offset: 0,
                                size: NonZeroU64::new(MODEL_SIZE),
                            }),
                        }],
                        label: Some("model_bind_group"),
                    });
                    props = Some(PropsBinding {
                        model_group: group,
                        texture_group: group + 1,
                        buffer,
                        bind_group,
                        slots,
                    });
                    group_layouts.push(layout);
                    group_layouts.push(layouts.texture.clone());
                }
            }
        }

        let layout_refs: Vec<Option<&wgpu::BindGroupLayout>> =
            group_layouts.iter().map(Some).collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(spec.label),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = spec
            .attributes
            .iter()
            .enumerate()
            .map(|(location, attribute)| {
                [wgpu::VertexAttribute {
                    format: attribute.format(),
                    offset: 0,
                    shader_location: location as u32,
                }]
            })
            .collect();
        let vertex_layouts: Vec<wgpu::VertexBufferLayout> = spec
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(attribute, attrs)| wgpu::VertexBufferLayout {
                array_stride: u64::from(attribute.components) * std::mem::size_of::<f32>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = mk_render_pipeline(
            device,
            spec.label,
            &pipeline_layout,
            color_format,
            &spec.state,
            Some(Texture::DEPTH_FORMAT),
            &vertex_layouts,
            &shader,
        );

        Ok(Self {
            label: spec.label,
            state: spec.state,
            pipeline,
            vertex_buffers,
            index_buffer,
            count,
            frame_group,
            constants,
            props,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn state(&self) -> FixedFunction {
        self.state
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Recycles all property slots. Call once per frame before any invoke.
    pub fn begin_frame(&mut self) {
        if let Some(props) = &mut self.props {
            props.slots.reset();
        }
    }

    /// Records one draw. Passes that declare [`UniformSource::Props`] require
    /// `props`; each call claims its own slot in the model buffer.
    pub fn invoke(
        &mut self,
        queue: &wgpu::Queue,
        render_pass: &mut wgpu::RenderPass<'_>,
        frame_group: &wgpu::BindGroup,
        props: Option<&ObjectProps<'_, TextureBinding>>,
    ) -> Result<(), DrawError> {
        render_pass.set_pipeline(&self.pipeline);
        if let Some(group) = self.frame_group {
            render_pass.set_bind_group(group, frame_group, &[]);
        }
        for constant in &self.constants {
            render_pass.set_bind_group(constant.group, &constant.bind_group, &[]);
        }
        if let Some(binding) = &mut self.props {
            let props = props.ok_or_else(|| DrawError::MissingProps {
                label: self.label.to_string(),
            })?;
            let offset = binding.slots.claim().ok_or_else(|| DrawError::PropsExhausted {
                label: self.label.to_string(),
                capacity: binding.slots.capacity(),
            })?;
            let model: [[f32; 4]; 4] = props.model.into();
            queue.write_buffer(&binding.buffer, offset, bytemuck::bytes_of(&model));
            render_pass.set_bind_group(binding.model_group, &binding.bind_group, &[offset as u32]);
            render_pass.set_bind_group(binding.texture_group, &props.texture.bind_group, &[]);
        }
        for (slot, buffer) in self.vertex_buffers.iter().enumerate() {
            render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.count, 0, 0..1);
        Ok(())
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    has_dynamic_offset: bool,
    min_binding_size: Option<NonZeroU64>,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset,
                min_binding_size,
            },
            count: None,
        }],
        label: Some(label),
    })
}

#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    state: &FixedFunction,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(VERTEX_ENTRY),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(state.blend_state()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: state.primitive_state(),
        depth_stencil: depth_format.map(|format| state.depth_stencil_state(format)),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
