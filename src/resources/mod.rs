//! Retrieval of raw asset bytes.
//!
//! Native builds read from a directory on disk through `tokio::fs`, web builds
//! fetch relative to the page origin with `reqwest`. Decoding lives in
//! [`manifest`]; this module only moves bytes.

use std::path::Path;

pub mod manifest;

/// Chunk size used when an entry is streamed.
pub const STREAM_CHUNK: usize = 16 * 1024;

#[cfg(target_arch = "wasm32")]
fn format_url(root: &Path, file_name: &str) -> anyhow::Result<reqwest::Url> {
    use anyhow::Context as _;

    let window = web_sys::window().context("no browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("cannot read page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, root.display()))?;
    Ok(base.join(file_name)?)
}

/// Human-readable location of `file_name`, used in error reports.
pub fn locate(root: &Path, file_name: &str) -> String {
    #[cfg(target_arch = "wasm32")]
    {
        format_url(root, file_name)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("{}/{}", root.display(), file_name))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        root.join(file_name).display().to_string()
    }
}

pub async fn load_binary(root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(root.join(file_name)).await?;

    Ok(data)
}

/// Reads `file_name` incrementally, `chunk` bytes at a time, into one buffer.
pub async fn load_streamed(root: &Path, file_name: &str, chunk: usize) -> anyhow::Result<Vec<u8>> {
    let chunk = chunk.max(1);

    // the browser fetch hands over the body in one piece
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        let body = reqwest::get(url).await?.error_for_status()?.bytes().await?;
        let mut data = Vec::with_capacity(body.len());
        for part in body.chunks(chunk) {
            data.extend_from_slice(part);
            log::trace!("{file_name}: {} bytes received", data.len());
        }
        data
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        use tokio::io::AsyncReadExt;

        let mut file = tokio::fs::File::open(root.join(file_name)).await?;
        let mut data = Vec::new();
        let mut buf = vec![0u8; chunk];
        loop {
            let read = file.read(&mut buf).await?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&buf[..read]);
            log::trace!("{file_name}: {} bytes read", data.len());
        }
        data
    };

    Ok(data)
}
