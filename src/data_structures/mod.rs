//! Scene data: mesh descriptions and GPU textures.
//!
//! - `mesh` holds the JSON mesh format the object pass draws
//! - `texture` wraps GPU textures, the depth attachment and texture bind groups

pub mod mesh;
pub mod texture;
