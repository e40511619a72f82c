use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuTextureHandle(pub u64);

// Stands in for a graphics device. Textures must be created on the thread that pumps the asset
// manager, which is why texture loaders only "upload" in their finishing phase.
#[derive(Default)]
pub struct SimulatedGpu {
    next_handle: AtomicU64,
    // handle -> bytes uploaded
    live_textures: Mutex<BTreeMap<GpuTextureHandle, usize>>,
}

impl SimulatedGpu {
    pub fn new() -> Arc<Self> {
        Arc::new(SimulatedGpu::default())
    }

    pub fn create_texture(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> GpuTextureHandle {
        profiling::scope!("SimulatedGpu::create_texture");
        let handle = GpuTextureHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        log::trace!("create texture {:?} {}x{}", handle, width, height);
        self.live_textures.lock().insert(handle, pixels.len());
        handle
    }

    /// Returns false if the handle was already destroyed
    pub fn destroy_texture(
        &self,
        handle: GpuTextureHandle,
    ) -> bool {
        log::trace!("destroy texture {:?}", handle);
        self.live_textures.lock().remove(&handle).is_some()
    }

    pub fn live_texture_count(&self) -> usize {
        self.live_textures.lock().len()
    }

    pub fn live_texture_bytes(&self) -> usize {
        self.live_textures.lock().values().sum()
    }
}
