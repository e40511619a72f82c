use crate::gpu::{GpuTextureHandle, SimulatedGpu};
use lading::loader::{Asset, AssetCache, AssetLoader, LoadRequest, LoaderResult};
use std::sync::Arc;
use type_uuid::TypeUuid;

/// RGBA8 pixels decoded off-thread, waiting to be uploaded
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    fn upload(
        self,
        gpu: &Arc<SimulatedGpu>,
    ) -> TextureAsset {
        let handle = gpu.create_texture(self.width, self.height, &self.pixels);
        TextureAsset {
            width: self.width,
            height: self.height,
            pixels: self.pixels,
            handle: Some(handle),
            gpu: gpu.clone(),
        }
    }
}

#[derive(TypeUuid)]
#[uuid = "5f1e0c3a-7b2d-4e8f-9a61-c4d3b2a1f0e9"]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    handle: Option<GpuTextureHandle>,
    gpu: Arc<SimulatedGpu>,
}

impl TextureAsset {
    pub fn handle(&self) -> Option<GpuTextureHandle> {
        self.handle
    }

    /// RGBA of one pixel
    pub fn pixel(
        &self,
        x: u32,
        y: u32,
    ) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = ((y * self.width + x) * 4) as usize;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(self.pixels.get(offset..offset + 4)?);
        Some(rgba)
    }
}

impl Asset for TextureAsset {
    fn dispose(&mut self) -> LoaderResult<()> {
        if let Some(handle) = self.handle.take() {
            if !self.gpu.destroy_texture(handle) {
                return Err(format!("texture {:?} was already destroyed", handle).into());
            }
        }
        Ok(())
    }
}

/// Decodes png and jpeg files with the `image` crate
pub struct TextureLoader {
    gpu: Arc<SimulatedGpu>,
}

impl TextureLoader {
    pub fn new(gpu: Arc<SimulatedGpu>) -> Self {
        TextureLoader { gpu }
    }
}

impl AssetLoader for TextureLoader {
    type Asset = TextureAsset;
    type Prepared = DecodedImage;

    #[profiling::function]
    fn load_async(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<DecodedImage> {
        let bytes = request.file.read_bytes()?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        log::debug!(
            "Decoded {} ({}x{})",
            request.name,
            image.width(),
            image.height()
        );
        Ok(DecodedImage {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        })
    }

    fn load_sync(
        &self,
        _cache: &AssetCache,
        _request: &LoadRequest,
        prepared: DecodedImage,
    ) -> LoaderResult<TextureAsset> {
        Ok(prepared.upload(&self.gpu))
    }
}

/// Loads `.rgba` files: a "width height" line followed by raw RGBA8 pixels
pub struct RawTextureLoader {
    gpu: Arc<SimulatedGpu>,
}

impl RawTextureLoader {
    pub const SUFFIX: &'static str = ".rgba";

    pub fn new(gpu: Arc<SimulatedGpu>) -> Self {
        RawTextureLoader { gpu }
    }

    pub fn parse(bytes: &[u8]) -> LoaderResult<DecodedImage> {
        let header_end = bytes
            .iter()
            .position(|x| *x == b'\n')
            .ok_or("raw texture has no header line")?;
        let header = std::str::from_utf8(&bytes[..header_end])?;
        let mut fields = header.split_whitespace().map(|x| x.parse::<u32>());
        let (width, height) = match (fields.next(), fields.next(), fields.next()) {
            (Some(width), Some(height), None) => (width?, height?),
            _ => return Err(format!("bad raw texture header {:?}", header).into()),
        };

        let pixels = &bytes[header_end + 1..];
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(format!(
                "raw texture is {}x{} but has {} bytes of pixels, expected {}",
                width,
                height,
                pixels.len(),
                expected
            )
            .into());
        }

        Ok(DecodedImage {
            width,
            height,
            pixels: pixels.to_vec(),
        })
    }
}

impl AssetLoader for RawTextureLoader {
    type Asset = TextureAsset;
    type Prepared = DecodedImage;

    fn load_async(
        &self,
        request: &LoadRequest,
    ) -> LoaderResult<DecodedImage> {
        Self::parse(&request.file.read_bytes()?)
    }

    fn load_sync(
        &self,
        _cache: &AssetCache,
        _request: &LoadRequest,
        prepared: DecodedImage,
    ) -> LoaderResult<TextureAsset> {
        Ok(prepared.upload(&self.gpu))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_raw_texture() {
        let mut bytes = b"2 1\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let image = RawTextureLoader::parse(&bytes).unwrap();
        assert_eq!((image.width, image.height), (2, 1));

        let gpu = SimulatedGpu::new();
        let texture = image.upload(&gpu);
        assert_eq!(texture.pixel(1, 0), Some([5, 6, 7, 8]));
        assert_eq!(texture.pixel(2, 0), None);
        assert_eq!(gpu.live_texture_bytes(), 8);
    }

    #[test]
    fn rejects_bad_raw_textures() {
        assert!(RawTextureLoader::parse(b"no newline").is_err());
        assert!(RawTextureLoader::parse(b"2 x\n").is_err());
        assert!(RawTextureLoader::parse(b"2 2 2\n").is_err());
        assert!(RawTextureLoader::parse(b"1 1\n123").is_err());
    }

    #[test]
    fn dispose_releases_gpu_texture() {
        let gpu = SimulatedGpu::new();
        let mut texture = DecodedImage {
            width: 1,
            height: 1,
            pixels: vec![0; 4],
        }
        .upload(&gpu);
        assert_eq!(gpu.live_texture_count(), 1);
        texture.dispose().unwrap();
        assert_eq!(gpu.live_texture_count(), 0);
        assert!(texture.handle().is_none());
        texture.dispose().unwrap();
    }
}
