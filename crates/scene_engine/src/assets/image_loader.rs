//! Image loading utilities for texture data
//!
//! Textures are PPM files (P3 ASCII or P6 binary) decoded to tightly packed RGB.
//! [`TextureCache`] is the material/texture resolver: it finds a texture by name
//! on the asset search paths and memoises the decoded pixels so every model that
//! names the same file shares one copy.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;

use crate::assets::AssetError;

/// Decoded image data ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGB pixel data, row-major from the top-left corner
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of color channels (always 3)
    pub channels: u8,
}

impl ImageData {
    /// Load a PPM image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();

        log::debug!("Loading image from: {:?}", path_ref);

        let bytes = std::fs::read(path_ref)?;
        let image = Self::from_ppm_bytes(&bytes)?;

        log::info!("Loaded image {}x{} from {:?}", image.width, image.height, path_ref);
        Ok(image)
    }

    /// Decode PPM bytes held in memory
    pub fn from_ppm_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Pnm)
            .map_err(|e| AssetError::Image(format!("Failed to decode PPM: {}", e)))?;

        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        Ok(Self {
            data: rgb_img.into_raw(),
            width,
            height,
            channels: 3,
        })
    }
}

/// Memoising texture resolver
#[derive(Debug, Default)]
pub struct TextureCache {
    search_paths: Vec<PathBuf>,
    textures: HashMap<String, Arc<ImageData>>,
}

impl TextureCache {
    /// Create a cache that resolves names against `search_paths`, in order
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            textures: HashMap::new(),
        }
    }

    /// Decoded pixels for `name`, loading them on first request.
    ///
    /// Failures are not cached, so a texture that appears later can still load.
    pub fn load(&mut self, name: &str) -> Result<Arc<ImageData>, AssetError> {
        if let Some(image) = self.textures.get(name) {
            return Ok(Arc::clone(image));
        }

        let path = self
            .resolve(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;
        let image = Arc::new(ImageData::from_file(&path)?);
        self.textures.insert(name.to_string(), Arc::clone(&image));
        Ok(image)
    }

    /// Register already decoded pixels under `name`
    pub fn insert(&mut self, name: impl Into<String>, image: ImageData) -> Arc<ImageData> {
        let image = Arc::new(image);
        self.textures.insert(name.into(), Arc::clone(&image));
        image
    }

    /// Whether `name` has been decoded already
    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    /// Number of cached textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// No textures cached yet
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let direct = PathBuf::from(name);
        if direct.is_absolute() {
            return direct.exists().then_some(direct);
        }
        self.search_paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.exists())
            .or_else(|| direct.exists().then_some(direct))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKER_P3: &[u8] = b"P3\n# 2x2 checker\n2 2\n255\n255 0 0  0 255 0\n0 0 255  255 255 255\n";

    #[test]
    fn test_decode_ascii_ppm() {
        let img = ImageData::from_ppm_bytes(CHECKER_P3).unwrap();
        assert_eq!((img.width, img.height, img.channels), (2, 2, 3));
        assert_eq!(img.data.len(), 12);
        assert_eq!(&img.data[0..3], &[255, 0, 0]);
        assert_eq!(&img.data[9..12], &[255, 255, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            ImageData::from_ppm_bytes(b"not an image"),
            Err(AssetError::Image(_))
        ));
    }

    #[test]
    fn test_cache_memoises_by_name() {
        let dir = std::env::temp_dir().join(format!("scene_engine_textures_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("checker.ppm"), CHECKER_P3).unwrap();

        let mut cache = TextureCache::new(vec![dir.clone()]);
        let first = cache.load("checker.ppm").unwrap();

        // Served from memory once decoded, even if the file goes away
        std::fs::remove_file(dir.join("checker.ppm")).unwrap();
        let second = cache.load("checker.ppm").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        assert!(matches!(cache.load("missing.ppm"), Err(AssetError::NotFound(_))));
        assert!(!cache.contains("missing.ppm"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
