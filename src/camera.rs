//! Fly camera and its keyboard controller.
//!
//! The controller keeps a set of held keys and a damped velocity. Nothing moves
//! until [`CameraController::update`] is called, which integrates one step and
//! re-derives the view and projection matrices. Equal key histories and equal
//! `dt` sequences produce bit-identical matrices.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector2, Vector3, Zero, perspective};
use instant::Duration;
use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::config::CameraSettings;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;
// below this the damped velocity is snapped to rest
const REST_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    /// Horizontal right vector, unaffected by pitch.
    pub fn right(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(-sin_yaw, 0.0, cos_yaw)
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect(width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

/// Logical inputs the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    TurnLeft,
    TurnRight,
    LookUp,
    LookDown,
}

impl Key {
    const ALL: [Key; 10] = [
        Key::Forward,
        Key::Backward,
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::TurnLeft,
        Key::TurnRight,
        Key::LookUp,
        Key::LookDown,
    ];

    pub fn from_code(code: KeyCode) -> Option<Self> {
        let key = match code {
            KeyCode::KeyW => Key::Forward,
            KeyCode::KeyS => Key::Backward,
            KeyCode::KeyA => Key::Left,
            KeyCode::KeyD => Key::Right,
            KeyCode::Space => Key::Up,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Down,
            KeyCode::KeyQ | KeyCode::ArrowLeft => Key::TurnLeft,
            KeyCode::KeyE | KeyCode::ArrowRight => Key::TurnRight,
            KeyCode::ArrowUp => Key::LookUp,
            KeyCode::ArrowDown => Key::LookDown,
            _ => return None,
        };
        Some(key)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Owns the camera and turns held keys into motion.
#[derive(Debug, Clone)]
pub struct CameraController {
    camera: Camera,
    projection: Projection,
    held: [bool; Key::ALL.len()],
    /// Camera-local velocity: x right, y up, z forward.
    velocity: Vector3<f32>,
    /// Yaw and pitch rates in rad/s.
    angular: Vector2<f32>,
    speed: f32,
    turn_speed: f32,
    damping: f32,
    view: Matrix4<f32>,
    proj: Matrix4<f32>,
}

impl CameraController {
    pub fn new(width: u32, height: u32, settings: &CameraSettings) -> Self {
        let camera = Camera::new(
            settings.position,
            cgmath::Deg(settings.yaw),
            cgmath::Deg(settings.pitch),
        );
        let projection = Projection::new(
            width,
            height,
            cgmath::Deg(settings.fovy),
            settings.znear,
            settings.zfar,
        );
        Self {
            view: camera.calc_matrix(),
            proj: projection.calc_matrix(),
            camera,
            projection,
            held: [false; Key::ALL.len()],
            velocity: Vector3::zero(),
            angular: Vector2::zero(),
            speed: settings.speed,
            turn_speed: settings.turn_speed,
            // powf on a non-positive base would blow up the integration
            damping: settings.damping.clamp(f32::EPSILON, 1.0),
        }
    }

    /// Records a key transition. Returns whether the key state changed.
    pub fn process_key(&mut self, key: Key, pressed: bool) -> bool {
        let slot = &mut self.held[key.index()];
        let changed = *slot != pressed;
        *slot = pressed;
        changed
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held[key.index()]
    }

    pub fn release_all(&mut self) {
        self.held = [false; Key::ALL.len()];
    }

    /// Feeds a window event to the controller. Returns `true` if it was consumed.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match Key::from_code(*code) {
                Some(key) => {
                    self.process_key(key, *state == ElementState::Pressed);
                    true
                }
                None => false,
            },
            // keys released while unfocused never reach us
            WindowEvent::Focused(false) => {
                self.release_all();
                false
            }
            _ => false,
        }
    }

    fn axis(&self, positive: Key, negative: Key) -> f32 {
        self.is_held(positive) as i32 as f32 - self.is_held(negative) as i32 as f32
    }

    /// Advances the camera by `dt` and recomputes both matrices.
    pub fn update(&mut self, dt: Duration) {
        let dt = dt.as_secs_f32();

        let thrust = Vector3::new(
            self.axis(Key::Right, Key::Left),
            self.axis(Key::Up, Key::Down),
            self.axis(Key::Forward, Key::Backward),
        );
        let turn = Vector2::new(
            self.axis(Key::TurnRight, Key::TurnLeft),
            self.axis(Key::LookUp, Key::LookDown),
        );
        self.velocity += thrust * (self.speed * dt);
        self.angular += turn * (self.turn_speed * dt);

        let decay = self.damping.powf(dt);
        self.velocity *= decay;
        self.angular *= decay;
        if self.velocity.magnitude2() < REST_EPSILON * REST_EPSILON {
            self.velocity = Vector3::zero();
        }
        if self.angular.magnitude2() < REST_EPSILON * REST_EPSILON {
            self.angular = Vector2::zero();
        }

        self.camera.yaw += Rad(self.angular.x * dt);
        self.camera.pitch += Rad(self.angular.y * dt);
        self.camera.pitch = Rad(self.camera.pitch.0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));

        let step = self.camera.right() * self.velocity.x
            + Vector3::unit_y() * self.velocity.y
            + self.camera.forward() * self.velocity.z;
        self.camera.position += step * dt;

        self.view = self.camera.calc_matrix();
        self.proj = self.projection.calc_matrix();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.proj = self.projection.calc_matrix();
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.proj
    }
}
