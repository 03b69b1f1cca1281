//! gridlight
//!
//! A small real-time rendering demo on `wgpu` and `winit`. It loads a mesh and
//! a texture through an asynchronous asset manifest, then composites three
//! shader-driven passes each frame: a procedural noise sky, a glowing ground
//! grid and a textured cube, all seen through a keyboard-driven fly camera.
//! Runs natively and in the browser.
//!
//! High-level modules
//! - `app`: window, event loop and startup sequencing
//! - `assets`: the demo's fixed asset manifest
//! - `camera`: fly camera, projection and key handling
//! - `config`: startup settings
//! - `context`: GPU device, surface and shared layouts
//! - `data_structures`: mesh descriptions and textures
//! - `error`: failure classes
//! - `frame`: the per-frame scheduler, independent of the GPU
//! - `pass`: configurable draw passes and their fixed-function state
//! - `pipelines`: the background, grid and object passes
//! - `render`: records and submits a frame
//! - `resources`: raw asset retrieval and manifests
//!

pub mod app;
pub mod assets;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod frame;
pub mod pass;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use app::run;
pub use config::{CameraSettings, DemoConfig};
pub use error::{AssetLoadError, DrawError, PassError};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run(DemoConfig::default()).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{e:#}")))
}
