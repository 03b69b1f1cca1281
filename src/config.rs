//! Runtime settings for the demo.
//!
//! Everything here is fixed at startup and handed to [`crate::run`]. There is
//! no config file; embedders tweak a [`DemoConfig`] in code.

use std::path::PathBuf;

/// Camera placement and motion tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub position: [f32; 3],
    /// Heading in degrees, measured from +x towards +z.
    pub yaw: f32,
    /// Elevation in degrees.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Acceleration applied while a movement key is held, in units/s².
    pub speed: f32,
    /// Angular acceleration applied while a look key is held, in rad/s².
    pub turn_speed: f32,
    /// Fraction of velocity kept after one second without input.
    pub damping: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            // looks down the diagonal towards the textured cube
            position: [0.0, 0.0, 0.0],
            yaw: -135.0,
            pitch: 0.0,
            fovy: 45.0,
            znear: 0.1,
            zfar: 1000.0,
            speed: 40.0,
            turn_speed: 6.0,
            damping: 0.02,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    /// Directory (native) or URL path segment (web) the manifest sources are
    /// resolved against.
    pub asset_root: PathBuf,
    pub clear_colour: wgpu::Color,
    pub camera: CameraSettings,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "gridlight".to_string(),
            asset_root: PathBuf::from("assets"),
            clear_colour: wgpu::Color::BLACK,
            camera: CameraSettings::default(),
        }
    }
}

impl DemoConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_clear_colour(mut self, colour: wgpu::Color) -> Self {
        self.clear_colour = colour;
        self
    }

    pub fn with_camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }
}
