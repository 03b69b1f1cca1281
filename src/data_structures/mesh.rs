//! Indexed triangle meshes described in JSON.
//!
//! The format is the one `assets/cube.json` uses:
//!
//! ```json
//! { "positions": [[x, y, z], ...], "cells": [[a, b, c], ...], "uv": [[u, v], ...] }
//! ```

use anyhow::{Context as _, bail};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeshDescription {
    pub positions: Vec<[f32; 3]>,
    pub cells: Vec<[u32; 3]>,
    #[serde(default)]
    pub uv: Vec<[f32; 2]>,
}

impl MeshDescription {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let mesh: Self = serde_json::from_str(text).context("malformed mesh JSON")?;
        mesh.validate()?;
        Ok(mesh)
    }

    /// Checks that every cell references an existing vertex and that the uv
    /// channel, when present, covers every vertex.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.positions.is_empty() || self.cells.is_empty() {
            bail!("mesh has no geometry");
        }
        if !self.uv.is_empty() && self.uv.len() != self.positions.len() {
            bail!(
                "mesh has {} uv coordinates for {} positions",
                self.uv.len(),
                self.positions.len()
            );
        }
        let count = self.positions.len() as u32;
        if let Some(cell) = self.cells.iter().find(|c| c.iter().any(|&i| i >= count)) {
            bail!("cell {cell:?} indexes past the {count} vertices");
        }
        Ok(())
    }

    pub fn indices(&self) -> Vec<u32> {
        self.cells.iter().flatten().copied().collect()
    }

    pub fn flat_positions(&self) -> Vec<f32> {
        self.positions.iter().flatten().copied().collect()
    }

    /// Texture coordinates, zero-filled when the description carries none.
    pub fn flat_uv(&self) -> Vec<f32> {
        if self.uv.is_empty() {
            vec![0.0; self.positions.len() * 2]
        } else {
            self.uv.iter().flatten().copied().collect()
        }
    }
}
