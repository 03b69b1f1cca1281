//! GPU side of a frame.
//!
//! [`FrameResources`] holds the frame uniform every pass binds at group 0.
//! [`Passes`] owns the three configured draw passes. [`GpuFrame`] implements
//! [`PassSink`] by recording the scheduler's draws into one render pass, and
//! [`render`] wraps a whole tick: acquire, record, submit, present.

use std::iter;

use bytemuck::Zeroable;
use instant::Duration;

use crate::{
    context::Context,
    data_structures::{mesh::MeshDescription, texture::TextureBinding},
    error::{DrawError, PassError},
    frame::{FrameScheduler, FrameState, ObjectProps, PassKind, PassSink},
    pass::{DrawPass, SharedLayouts},
    pipelines::{background::mk_background_pass, grid::mk_grid_pass, object::mk_object_pass},
};

/// CPU mirror of `FrameUniform` in `frame.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub time: f32,
    // WGSL rounds the struct up to its 16 byte alignment
    pub _padding: [f32; 3],
}

impl From<&FrameState> for FrameUniform {
    fn from(frame: &FrameState) -> Self {
        Self {
            projection: frame.projection.into(),
            view: frame.view.into(),
            time: frame.time,
            _padding: [0.0; 3],
        }
    }
}

#[derive(Debug)]
pub struct FrameResources {
    pub uniform: FrameUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl FrameResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = FrameUniform::zeroed();
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Buffer"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("frame_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("frame_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, frame: &FrameState) {
        self.uniform = frame.into();
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[derive(Debug)]
pub struct Passes {
    pub background: DrawPass,
    pub object: DrawPass,
    pub grid: DrawPass,
}

impl Passes {
    pub fn configure(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        layouts: SharedLayouts<'_>,
        mesh: &MeshDescription,
    ) -> Result<Self, PassError> {
        Ok(Self {
            background: mk_background_pass(device, color_format, layouts)?,
            object: mk_object_pass(device, color_format, layouts, mesh)?,
            grid: mk_grid_pass(device, color_format, layouts)?,
        })
    }

    pub fn get_mut(&mut self, kind: PassKind) -> &mut DrawPass {
        match kind {
            PassKind::Background => &mut self.background,
            PassKind::Object => &mut self.object,
            PassKind::Grid => &mut self.grid,
        }
    }

    pub fn begin_frame(&mut self) {
        self.background.begin_frame();
        self.object.begin_frame();
        self.grid.begin_frame();
    }
}

/// Records one frame into a single render pass over `target`.
pub struct GpuFrame<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    frame: &'a mut FrameResources,
    passes: &'a mut Passes,
    target: &'a wgpu::TextureView,
    depth: &'a wgpu::TextureView,
    clear_colour: wgpu::Color,
    // declared first so it drops before the encoder
    render_pass: Option<wgpu::RenderPass<'static>>,
    encoder: Option<wgpu::CommandEncoder>,
}

impl<'a> GpuFrame<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        frame: &'a mut FrameResources,
        passes: &'a mut Passes,
        target: &'a wgpu::TextureView,
        depth: &'a wgpu::TextureView,
        clear_colour: wgpu::Color,
    ) -> Self {
        Self {
            device,
            queue,
            frame,
            passes,
            target,
            depth,
            clear_colour,
            render_pass: None,
            encoder: None,
        }
    }

    /// Ends the render pass and submits the recorded commands. Does nothing if
    /// the frame was never begun.
    pub fn finish(mut self) -> Option<wgpu::SubmissionIndex> {
        // the pass must be dropped before its encoder can finish
        drop(self.render_pass.take());
        let encoder = self.encoder.take()?;
        Some(self.queue.submit(iter::once(encoder.finish())))
    }
}

impl PassSink<TextureBinding> for GpuFrame<'_> {
    type Error = DrawError;

    fn begin_frame(&mut self, frame: &FrameState) -> Result<(), DrawError> {
        self.frame.write(self.queue, frame);
        self.passes.begin_frame();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        let render_pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        self.render_pass = Some(render_pass);
        self.encoder = Some(encoder);
        Ok(())
    }

    fn invoke(
        &mut self,
        pass: PassKind,
        _frame: &FrameState,
        props: Option<&ObjectProps<'_, TextureBinding>>,
    ) -> Result<(), DrawError> {
        let render_pass = self.render_pass.as_mut().ok_or(DrawError::FrameNotBegun)?;
        self.passes
            .get_mut(pass)
            .invoke(self.queue, render_pass, &self.frame.bind_group, props)
    }
}

/// Outcome of acquiring the next surface texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Ready,
    Suboptimal,
    Timeout,
    Occluded,
    Outdated,
    Lost,
    Validation,
}

/// What a frame does with the surface it tried to acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceAction {
    Draw,
    /// Draw and present, then reconfigure for the next frame.
    DrawThenReconfigure,
    /// Nothing is drawn and the camera does not advance.
    Skip,
    ReconfigureAndSkip,
    Fail,
}

impl SurfaceState {
    pub fn action(self) -> SurfaceAction {
        match self {
            SurfaceState::Ready => SurfaceAction::Draw,
            SurfaceState::Suboptimal => SurfaceAction::DrawThenReconfigure,
            SurfaceState::Timeout | SurfaceState::Occluded => SurfaceAction::Skip,
            SurfaceState::Outdated | SurfaceState::Lost => SurfaceAction::ReconfigureAndSkip,
            SurfaceState::Validation => SurfaceAction::Fail,
        }
    }
}

fn acquire(surface: &wgpu::Surface<'_>) -> (SurfaceState, Option<wgpu::SurfaceTexture>) {
    match surface.get_current_texture() {
        wgpu::CurrentSurfaceTexture::Success(texture) => (SurfaceState::Ready, Some(texture)),
        wgpu::CurrentSurfaceTexture::Suboptimal(texture) => {
            (SurfaceState::Suboptimal, Some(texture))
        }
        wgpu::CurrentSurfaceTexture::Timeout { .. } => (SurfaceState::Timeout, None),
        wgpu::CurrentSurfaceTexture::Occluded { .. } => (SurfaceState::Occluded, None),
        wgpu::CurrentSurfaceTexture::Outdated { .. } => (SurfaceState::Outdated, None),
        wgpu::CurrentSurfaceTexture::Lost { .. } => (SurfaceState::Lost, None),
        wgpu::CurrentSurfaceTexture::Validation { .. } => (SurfaceState::Validation, None),
    }
}

/// Runs one scheduler tick against the window surface.
///
/// Returns `Ok(false)` while the scheduler is still waiting for assets or when
/// the surface had nothing to draw to; the surface is then left untouched,
/// apart from a reconfigure when it went stale.
pub fn render(
    ctx: &mut Context,
    passes: &mut Passes,
    scheduler: &mut FrameScheduler<TextureBinding>,
    time: f32,
    dt: Duration,
) -> Result<bool, DrawError> {
    if !scheduler.is_running() {
        return Ok(false);
    }

    let (state, output) = acquire(&ctx.surface);
    let output = match (state.action(), output) {
        (SurfaceAction::Draw | SurfaceAction::DrawThenReconfigure, Some(output)) => output,
        (SurfaceAction::Skip, _) => {
            log::debug!("surface {state:?}, skipping frame");
            return Ok(false);
        }
        (SurfaceAction::ReconfigureAndSkip, _) => {
            log::warn!("surface {state:?}, reconfiguring");
            ctx.reconfigure();
            return Ok(false);
        }
        _ => return Err(DrawError::Surface { state }),
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let Context {
        device,
        queue,
        depth_texture,
        camera,
        frame,
        clear_colour,
        ..
    } = ctx;
    let mut sink = GpuFrame::new(
        device,
        queue,
        frame,
        passes,
        &view,
        &depth_texture.view,
        *clear_colour,
    );
    let drawn = scheduler.tick(camera, time, dt, &mut sink)?;
    sink.finish();

    output.present();
    if state.action() == SurfaceAction::DrawThenReconfigure {
        ctx.reconfigure();
    }
    Ok(drawn)
}
