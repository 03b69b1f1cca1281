//! The three passes of the demo.
//!
//! Each submodule exposes the [`PassSpec`](crate::pass::PassSpec) of its pass
//! and a `mk_*_pass` constructor. All shaders share `frame.wgsl`; the
//! procedural ones are prefixed with the `noise.wgsl` library.

pub mod background;
pub mod grid;
pub mod object;

/// Frame uniform declarations, then the noise library, then `$body`.
macro_rules! procedural_shader {
    ($body:literal) => {
        concat!(
            include_str!("frame.wgsl"),
            include_str!("noise.wgsl"),
            include_str!($body)
        )
    };
}
pub(crate) use procedural_shader;
