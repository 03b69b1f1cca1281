//! Frame orchestration.
//!
//! [`FrameScheduler`] decides what is drawn each tick and in which order. It
//! does not touch the GPU itself; draws go through a [`PassSink`], which the
//! renderer implements on top of `wgpu` and tests implement as a recorder.

use cgmath::{Matrix4, SquareMatrix, Vector3};
use instant::Duration;

use crate::camera::CameraController;

/// The passes a frame is composed of, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Background,
    Object,
    Grid,
}

/// Values every pass reads during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Seconds since the scheduler started running.
    pub time: f32,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl FrameState {
    pub fn from_camera(camera: &CameraController, time: f32) -> Self {
        Self {
            time,
            view: camera.view(),
            projection: camera.projection(),
        }
    }
}

/// Per-invocation properties of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectProps<'a, T> {
    pub model: Matrix4<f32>,
    pub texture: &'a T,
}

/// The single textured object of the scene.
#[derive(Debug, Clone)]
pub struct SceneObject<T> {
    model: Matrix4<f32>,
    texture: T,
}

impl<T> SceneObject<T> {
    pub const OFFSET: [f32; 3] = [-20.0, -1.0, -20.0];

    pub fn new(texture: T) -> Self {
        let mut object = Self {
            model: Matrix4::identity(),
            texture,
        };
        object.update();
        object
    }

    /// Recomputes the model matrix. The object does not move, so the result is
    /// the same translation every time.
    pub fn update(&mut self) {
        self.model = Matrix4::identity() * Matrix4::from_translation(Vector3::from(Self::OFFSET));
    }

    pub fn model(&self) -> Matrix4<f32> {
        self.model
    }

    pub fn texture(&self) -> &T {
        &self.texture
    }

    pub fn props(&self) -> ObjectProps<'_, T> {
        ObjectProps {
            model: self.model,
            texture: &self.texture,
        }
    }
}

/// Receives the draws of one frame.
pub trait PassSink<T> {
    type Error;

    /// Clears colour and depth and publishes `frame` to every pass.
    fn begin_frame(&mut self, frame: &FrameState) -> Result<(), Self::Error>;

    fn invoke(
        &mut self,
        pass: PassKind,
        frame: &FrameState,
        props: Option<&ObjectProps<'_, T>>,
    ) -> Result<(), Self::Error>;
}

#[derive(Debug)]
enum Phase<T> {
    AwaitingAssets,
    Running { object: SceneObject<T> },
}

/// `AwaitingAssets -> Running` state machine driving the frame loop.
#[derive(Debug)]
pub struct FrameScheduler<T> {
    phase: Phase<T>,
    frames: u64,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameScheduler<T> {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingAssets,
            frames: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    /// Leaves `AwaitingAssets` with the texture of the scene object. Returns
    /// `false` if the scheduler was already running.
    pub fn start(&mut self, texture: T) -> bool {
        if self.is_running() {
            log::warn!("frame scheduler started twice, ignoring");
            return false;
        }
        self.phase = Phase::Running {
            object: SceneObject::new(texture),
        };
        log::info!("assets ready, frame loop running");
        true
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn object(&self) -> Option<&SceneObject<T>> {
        match &self.phase {
            Phase::Running { object } => Some(object),
            Phase::AwaitingAssets => None,
        }
    }

    /// Runs one tick. Returns whether anything was drawn.
    ///
    /// The passes see the camera matrices left by the previous tick; the
    /// camera is advanced by `dt` only after the last pass.
    pub fn tick<S: PassSink<T>>(
        &mut self,
        camera: &mut CameraController,
        time: f32,
        dt: Duration,
        sink: &mut S,
    ) -> Result<bool, S::Error> {
        let Phase::Running { object } = &mut self.phase else {
            return Ok(false);
        };

        let frame = FrameState::from_camera(camera, time);
        sink.begin_frame(&frame)?;
        sink.invoke(PassKind::Background, &frame, None)?;

        object.update();
        sink.invoke(PassKind::Object, &frame, Some(&object.props()))?;
        sink.invoke(PassKind::Grid, &frame, None)?;

        camera.update(dt);
        self.frames += 1;
        Ok(true)
    }
}
