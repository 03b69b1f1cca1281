//! The fixed asset set of the demo.

use std::path::PathBuf;

use crate::{
    context::InitContext,
    data_structures::{
        mesh::MeshDescription,
        texture::{Texture, TextureBinding},
    },
    error::AssetLoadError,
    resources::manifest::{AssetEntry, Assets, Manifest},
};

pub const CUBE: &str = "cube";
pub const CASTLE_TEXTURE: &str = "castleexternal";

#[derive(Debug, Clone)]
pub enum DemoAsset {
    Mesh(MeshDescription),
    Texture(TextureBinding),
}

/// `cube` (JSON mesh) and `castleexternal` (streamed, linearly filtered
/// texture), both resolved against `root`.
pub fn demo_manifest(root: impl Into<PathBuf>, init: InitContext) -> Manifest<DemoAsset> {
    Manifest::new(root)
        .with(
            CUBE,
            AssetEntry::text("cube.json", |text| {
                MeshDescription::from_json(text).map(DemoAsset::Mesh)
            }),
        )
        .with(
            CASTLE_TEXTURE,
            AssetEntry::image("castleexternal.png", move |bytes| {
                let texture = Texture::from_bytes(
                    &init.device,
                    &init.queue,
                    bytes,
                    CASTLE_TEXTURE,
                    wgpu::FilterMode::Linear,
                )?;
                texture.bind(&init.device, &init.texture_layout).map(DemoAsset::Texture)
            })
            .streamed(),
        )
}

/// The decoded demo assets, moved out of the loaded set.
#[derive(Debug)]
pub struct DemoAssets {
    pub cube: MeshDescription,
    pub texture: TextureBinding,
}

impl TryFrom<Assets<DemoAsset>> for DemoAssets {
    type Error = AssetLoadError;

    fn try_from(mut assets: Assets<DemoAsset>) -> Result<Self, Self::Error> {
        let cube = match assets.take(CUBE)? {
            DemoAsset::Mesh(mesh) => mesh,
            DemoAsset::Texture(_) => {
                return Err(AssetLoadError::WrongKind {
                    name: CUBE.to_string(),
                    expected: "mesh",
                });
            }
        };
        let texture = match assets.take(CASTLE_TEXTURE)? {
            DemoAsset::Texture(texture) => texture,
            DemoAsset::Mesh(_) => {
                return Err(AssetLoadError::WrongKind {
                    name: CASTLE_TEXTURE.to_string(),
                    expected: "texture",
                });
            }
        };
        Ok(Self { cube, texture })
    }
}
