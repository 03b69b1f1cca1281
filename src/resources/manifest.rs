//! Declarative asset manifests.
//!
//! A [`Manifest`] names every asset the demo needs together with where to find
//! it and how to decode it. [`Manifest::load`] fetches and decodes all entries
//! concurrently and resolves exactly once: either with every decoded value or
//! with the first failure. Partial results are never handed out.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::AssetLoadError,
    resources::{STREAM_CHUNK, load_binary, load_streamed, locate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Text,
    Image,
}

/// Turns the undecoded bytes of one entry into its value.
pub type Parser<T> = Arc<dyn Fn(&[u8]) -> anyhow::Result<T> + Send + Sync>;

pub struct AssetEntry<T> {
    kind: AssetKind,
    source: String,
    streamed: bool,
    parser: Parser<T>,
}

impl<T> Clone for AssetEntry<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            source: self.source.clone(),
            streamed: self.streamed,
            parser: self.parser.clone(),
        }
    }
}

impl<T> Debug for AssetEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetEntry")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("streamed", &self.streamed)
            .finish_non_exhaustive()
    }
}

impl<T> AssetEntry<T> {
    /// A UTF-8 text entry. Invalid UTF-8 is a decode failure.
    pub fn text<F>(source: impl Into<String>, parse: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            kind: AssetKind::Text,
            source: source.into(),
            streamed: false,
            parser: Arc::new(move |bytes: &[u8]| parse(std::str::from_utf8(bytes)?)),
        }
    }

    /// A binary image entry. The parser receives the encoded file contents.
    pub fn image<F>(source: impl Into<String>, parse: F) -> Self
    where
        F: Fn(&[u8]) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            kind: AssetKind::Image,
            source: source.into(),
            streamed: false,
            parser: Arc::new(parse),
        }
    }

    /// Read the source incrementally instead of in one request.
    pub fn streamed(mut self) -> Self {
        self.streamed = true;
        self
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_streamed(&self) -> bool {
        self.streamed
    }

    async fn retrieve(&self, root: &Path) -> anyhow::Result<Vec<u8>> {
        if self.streamed {
            load_streamed(root, &self.source, STREAM_CHUNK).await
        } else {
            load_binary(root, &self.source).await
        }
    }

    async fn load(&self, root: &Path, name: &str) -> Result<T, AssetLoadError> {
        log::debug!("loading asset `{name}` from {}", self.source);
        let raw = self
            .retrieve(root)
            .await
            .map_err(|cause| AssetLoadError::Retrieve {
                name: name.to_string(),
                source_path: locate(root, &self.source),
                cause,
            })?;
        let value = (self.parser)(&raw).map_err(|cause| AssetLoadError::Decode {
            name: name.to_string(),
            cause,
        })?;
        log::debug!("asset `{name}` ready");
        Ok(value)
    }
}

/// Named asset entries resolved against a common root.
#[derive(Debug, Clone)]
pub struct Manifest<T> {
    root: PathBuf,
    entries: BTreeMap<String, AssetEntry<T>>,
}

impl<T> Manifest<T> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, entry: AssetEntry<T>) -> Self {
        let name = name.into();
        if self.entries.insert(name.clone(), entry).is_some() {
            log::warn!("asset `{name}` declared twice, keeping the last entry");
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&AssetEntry<T>> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetches and decodes every entry concurrently.
    ///
    /// Resolves once with all values, or with the first error encountered. In
    /// the failure case nothing that was already decoded is returned.
    pub async fn load(self) -> Result<Assets<T>, AssetLoadError> {
        let Manifest { root, entries } = self;
        log::info!("loading {} assets from {}", entries.len(), root.display());

        let root = root.as_path();
        let pending = entries.into_iter().map(|(name, entry)| async move {
            let value = entry.load(root, &name).await?;
            Ok::<_, AssetLoadError>((name, value))
        });
        let loaded = futures::future::try_join_all(pending).await?;

        log::info!("all {} assets loaded", loaded.len());
        Ok(Assets {
            values: loaded.into_iter().collect(),
        })
    }
}

/// Decoded assets keyed by manifest name.
#[derive(Debug)]
pub struct Assets<T> {
    values: HashMap<String, T>,
}

impl<T> Assets<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.values.get(name)
    }

    /// Moves the named asset out of the set.
    pub fn take(&mut self, name: &str) -> Result<T, AssetLoadError> {
        self.values.remove(name).ok_or_else(|| AssetLoadError::Missing {
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
