use std::path::{Path, PathBuf};

use cgmath::Matrix4;
use gridlight::frame::{FrameState, ObjectProps, PassKind, PassSink};

/// One draw as seen by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw<T> {
    pub frame_index: usize,
    pub pass: PassKind,
    pub frame: FrameState,
    pub model: Option<Matrix4<f32>>,
    pub texture: Option<T>,
}

/// A [`PassSink`] that remembers every frame and draw instead of touching a GPU.
#[derive(Debug)]
pub struct RecordingSink<T> {
    pub frames: Vec<FrameState>,
    pub draws: Vec<RecordedDraw<T>>,
    /// Fail every invoke of this pass.
    pub fail_on: Option<PassKind>,
}

impl<T> Default for RecordingSink<T> {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            draws: Vec::new(),
            fail_on: None,
        }
    }
}

impl<T: Clone> RecordingSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(pass: PassKind) -> Self {
        Self {
            fail_on: Some(pass),
            ..Self::default()
        }
    }

    pub fn passes(&self) -> Vec<PassKind> {
        self.draws.iter().map(|d| d.pass).collect()
    }

    pub fn draws_of(&self, pass: PassKind) -> Vec<&RecordedDraw<T>> {
        self.draws.iter().filter(|d| d.pass == pass).collect()
    }
}

impl<T: Clone> PassSink<T> for RecordingSink<T> {
    type Error = String;

    fn begin_frame(&mut self, frame: &FrameState) -> Result<(), String> {
        self.frames.push(*frame);
        Ok(())
    }

    fn invoke(
        &mut self,
        pass: PassKind,
        frame: &FrameState,
        props: Option<&ObjectProps<'_, T>>,
    ) -> Result<(), String> {
        if self.fail_on == Some(pass) {
            return Err(format!("{pass:?} failed"));
        }
        self.draws.push(RecordedDraw {
            frame_index: self.frames.len().saturating_sub(1),
            pass,
            frame: *frame,
            model: props.map(|p| p.model),
            texture: props.map(|p| p.texture.clone()),
        });
        Ok(())
    }
}

/// A scratch asset directory, removed again when dropped.
#[derive(Debug)]
pub struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(&format!("gridlight-{name}-"))
            .tempdir()
            .expect("Failed to create fixture directory");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, file: &str, contents: impl AsRef<[u8]>) -> &Self {
        std::fs::write(self.root().join(file), contents).expect("Failed to write fixture file");
        self
    }

    /// Writes a 2x2 RGBA PNG with a distinct colour per pixel.
    pub fn write_png_2x2(&self, file: &str) -> &Self {
        let img = image::RgbaImage::from_fn(2, 2, |x, y| {
            image::Rgba([(x * 255) as u8, (y * 255) as u8, 128, 255])
        });
        img.save_with_format(self.root().join(file), image::ImageFormat::Png)
            .expect("Failed to write fixture image");
        self
    }

    pub fn remove(&self, file: &str) {
        std::fs::remove_file(self.root().join(file)).expect("Failed to remove fixture file");
    }
}

/// Directory holding the assets shipped with the demo.
pub fn shipped_assets() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")
}
