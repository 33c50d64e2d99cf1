//! Product image loading
//!
//! Images are downloaded in the background, written to the on-disk cache,
//! and decoded into textures on the UI thread the next time they are asked for.

use crate::constants::{IMAGE_FETCH_CONCURRENCY, USER_AGENT};
use eframe::egui;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ImageCache {
    dir: PathBuf,
    runtime: tokio::runtime::Handle,
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    textures: HashMap<String, Option<egui::TextureHandle>>,
    requested: HashSet<String>,
}

impl ImageCache {
    pub fn new(cache_dir: &Path, runtime: tokio::runtime::Handle, cancel: CancellationToken) -> Self {
        let dir = cache_dir.join("images");
        std::fs::create_dir_all(&dir).ok();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            dir,
            runtime,
            client,
            semaphore: Arc::new(Semaphore::new(IMAGE_FETCH_CONCURRENCY)),
            cancel,
            textures: HashMap::new(),
            requested: HashSet::new(),
        }
    }

    /// On-disk location for an image URL
    pub fn cache_path(&self, url: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        self.dir.join(format!("{:016x}.img", hasher.finish()))
    }

    /// Texture for `url` if it is available, starting a download otherwise.
    pub fn texture(&mut self, ctx: &egui::Context, url: &str) -> Option<egui::TextureHandle> {
        if let Some(cached) = self.textures.get(url) {
            return cached.clone();
        }

        let path = self.cache_path(url);
        if path.exists() {
            let texture = std::fs::read(&path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| image::load_from_memory(&bytes).map_err(|e| e.to_string()))
                .map_err(|e| debug!(error = %e, url, "Failed to decode product image"))
                .ok()
                .map(|img| {
                    let rgba = img.to_rgba8();
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    let pixels = rgba.into_raw();
                    ctx.load_texture(
                        url,
                        egui::ColorImage::from_rgba_unmultiplied(size, &pixels),
                        egui::TextureOptions::LINEAR,
                    )
                });
            self.textures.insert(url.to_string(), texture.clone());
            return texture;
        }

        self.request(ctx, url, path);
        None
    }

    /// Download once per URL; failures are not retried for the session.
    fn request(&mut self, ctx: &egui::Context, url: &str, dest: PathBuf) {
        if !self.requested.insert(url.to_string()) {
            return;
        }

        let client = self.client.clone();
        let semaphore = self.semaphore.clone();
        let token = self.cancel.clone();
        let ctx = ctx.clone();
        let url = url.to_string();

        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = async {
                    let _permit = semaphore.acquire().await.ok();
                    match download(&client, &url, &dest).await {
                        Ok(bytes) => {
                            debug!(url = %url, bytes, "Product image cached");
                            ctx.request_repaint();
                        }
                        Err(e) => debug!(url = %url, error = %e, "Product image download failed"),
                    }
                } => {}
            }
        });
    }

    #[cfg(test)]
    fn is_requested(&self, url: &str) -> bool {
        self.requested.contains(url)
    }
}

async fn download(client: &reqwest::Client, url: &str, dest: &Path) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let bytes = client.get(url).send().await?.error_for_status()?.bytes().await?;
    let tmp = dest.with_extension("part");
    std::fs::write(&tmp, &bytes)?;
    std::fs::rename(&tmp, dest)?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(dir: &Path, rt: &tokio::runtime::Runtime) -> ImageCache {
        ImageCache::new(dir, rt.handle().clone(), CancellationToken::new())
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn cache_paths_are_stable_per_url() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime();
        let images = cache(dir.path(), &rt);
        let a = images.cache_path("http://x/a.png");
        assert_eq!(a, images.cache_path("http://x/a.png"));
        assert_ne!(a, images.cache_path("http://x/b.png"));
        assert!(a.starts_with(dir.path().join("images")));
    }

    #[test]
    fn decodes_cached_file_into_texture() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime();
        let mut images = cache(dir.path(), &rt);
        let url = "http://x/i.png";
        image::RgbaImage::from_pixel(4, 3, image::Rgba([255, 0, 0, 255]))
            .save_with_format(images.cache_path(url), image::ImageFormat::Png)
            .unwrap();

        let ctx = egui::Context::default();
        let tex = images.texture(&ctx, url).expect("cached image should decode");
        assert_eq!(tex.size(), [4, 3]);
        assert!(!images.is_requested(url));
    }

    #[test]
    fn undecodable_file_is_remembered_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime();
        let mut images = cache(dir.path(), &rt);
        let url = "http://x/broken.png";
        std::fs::write(images.cache_path(url), b"not an image").unwrap();

        let ctx = egui::Context::default();
        assert!(images.texture(&ctx, url).is_none());
        // Cached as None: the file is not re-read.
        std::fs::remove_file(images.cache_path(url)).unwrap();
        assert!(images.texture(&ctx, url).is_none());
        assert!(!images.is_requested(url));
    }

    #[test]
    fn missing_image_is_requested_once() {
        let dir = tempfile::tempdir().unwrap();
        let rt = runtime();
        let token = CancellationToken::new();
        let mut images = ImageCache::new(dir.path(), rt.handle().clone(), token.clone());
        token.cancel();

        let ctx = egui::Context::default();
        let url = "http://127.0.0.1:9/none.png";
        assert!(images.texture(&ctx, url).is_none());
        assert!(images.is_requested(url));
        assert!(images.texture(&ctx, url).is_none());
        assert_eq!(images.requested.len(), 1);
    }
}
