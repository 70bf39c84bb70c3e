use instant::{Duration, Instant};

use crate::resources::texture::{TextureId, TextureLoader};

/**
 * This module contains all logic for loading images from external files and
 * handing them back to the event loop once they're decoded.
 */
pub mod texture;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("no origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Directory assets are read from on native targets.
#[cfg(not(target_arch = "wasm32"))]
pub fn asset_root() -> std::path::PathBuf {
    std::env::var_os(crate::config::ASSET_ROOT_ENV)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::Path::new("./").join("assets"))
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = asset_root().join(file_name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?
    };

    Ok(data)
}

pub fn decode_image(bytes: &[u8]) -> anyhow::Result<image::RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Fetches and decodes `file_name`.
pub async fn load_image(file_name: &str) -> anyhow::Result<image::RgbaImage> {
    let bytes = load_binary(file_name).await?;
    decode_image(&bytes)
}

/// A finished (or failed) background texture load.
#[derive(Debug)]
pub struct LoadedTexture {
    pub id: TextureId,
    pub path: String,
    pub image: anyhow::Result<image::RgbaImage>,
    pub elapsed: Duration,
}

#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSend for T {}

/// Where finished loads are reported to, usually the event loop.
pub trait TextureSink: Clone + MaybeSend + 'static {
    fn deliver(&self, loaded: LoadedTexture);
}

/// [`TextureLoader`] running every request as its own background task.
///
/// Natively the tasks run on the tokio runtime, on the web they're spawned on
/// the browser's microtask queue. Nothing waits for them; the result is handed
/// to the [`TextureSink`].
pub struct AssetLoader<S: TextureSink> {
    sink: S,
    #[cfg(not(target_arch = "wasm32"))]
    runtime: tokio::runtime::Handle,
}

impl<S: TextureSink> AssetLoader<S> {
    pub fn new(
        sink: S,
        #[cfg(not(target_arch = "wasm32"))] runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            sink,
            #[cfg(not(target_arch = "wasm32"))]
            runtime,
        }
    }
}

impl<S: TextureSink> TextureLoader for AssetLoader<S> {
    fn request(&mut self, id: TextureId, path: &str) {
        let sink = self.sink.clone();
        let path = path.to_string();
        let task = async move {
            let started = Instant::now();
            let image = load_image(&path).await;
            sink.deliver(LoadedTexture {
                id,
                path,
                image,
                elapsed: started.elapsed(),
            });
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.runtime.spawn(task);
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(task);
        }
    }
}
