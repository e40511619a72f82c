pub mod atlas;
pub mod gpu;
pub mod text;
pub mod texture;

use lading::loader::AssetManager;
use std::sync::Arc;

/// Registers every loader in this crate. `.rgba` files go to the raw loader, other texture names to
/// the `image` based one.
pub fn register_demo_loaders(
    manager: &mut AssetManager,
    gpu: &Arc<gpu::SimulatedGpu>,
) {
    manager.register_loader(texture::TextureLoader::new(gpu.clone()));
    manager.register_loader_with_suffix(
        texture::RawTextureLoader::SUFFIX,
        texture::RawTextureLoader::new(gpu.clone()),
    );
    manager.register_loader(atlas::AtlasLoader);
    manager.register_loader(text::TextLoader);
}

#[cfg(test)]
mod test {
    use super::*;
    use atlas::AtlasAsset;
    use gpu::SimulatedGpu;
    use lading::loader::{AssetManagerConfig, AssetParameters, LoadError, LoadPhase};
    use std::path::Path;
    use text::{TextAsset, TextParameters};
    use texture::TextureAsset;

    fn write_png(
        path: &Path,
        width: u32,
        height: u32,
    ) {
        image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 128, 255]))
            .save(path)
            .unwrap();
    }

    fn write_rgba(
        path: &Path,
        width: u32,
        height: u32,
    ) {
        let mut bytes = format!("{} {}\n", width, height).into_bytes();
        bytes.resize(bytes.len() + (width * height * 4) as usize, 7);
        std::fs::write(path, bytes).unwrap();
    }

    fn create_manager(
        root: &Path,
        worker_thread_count: usize,
    ) -> (AssetManager, Arc<SimulatedGpu>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = AssetManagerConfig::default()
            .with_asset_root(root)
            .with_worker_thread_count(worker_thread_count)
            .with_require_existing_files(true);
        let mut manager = AssetManager::new(config).unwrap();
        let gpu = SimulatedGpu::new();
        register_demo_loaders(&mut manager, &gpu);
        (manager, gpu)
    }

    #[test]
    fn loads_atlas_with_mixed_pages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ui")).unwrap();
        write_png(&dir.path().join("ui/menu.png"), 64, 32);
        write_rgba(&dir.path().join("ui/icons.rgba"), 16, 16);
        std::fs::write(
            dir.path().join("ui/menu.atlas"),
            "page menu.png\npage icons.rgba\nregion button 0 0 0 64 16\nregion close 1 8 8 8 8\n",
        )
        .unwrap();

        let (mut manager, gpu) = create_manager(dir.path(), 2);
        manager.load::<AtlasAsset>("ui/menu.atlas").unwrap();
        manager.finish_loading().unwrap();

        {
            let atlas = manager.get::<AtlasAsset>("ui/menu.atlas").unwrap();
            let close = atlas.region("close").unwrap();
            assert_eq!(atlas.page_of(close).unwrap().texture, "ui/icons.rgba");
            assert_eq!(atlas.pages[0].width, 64);

            let menu = manager.get::<TextureAsset>("ui/menu.png").unwrap();
            assert_eq!(menu.pixel(0, 0), Some([255, 0, 128, 255]));
            let icons = manager.get::<TextureAsset>("ui/icons.rgba").unwrap();
            assert_eq!(icons.pixel(15, 15), Some([7, 7, 7, 7]));
        }
        assert_eq!(gpu.live_texture_count(), 2);
        assert_eq!(
            manager.dependencies("ui/menu.atlas"),
            vec!["ui/menu.png", "ui/icons.rgba"]
        );

        manager.unload("ui/menu.atlas").unwrap();
        assert_eq!(manager.loaded_count(), 0);
        assert_eq!(gpu.live_texture_count(), 0);
    }

    #[test]
    fn bad_region_releases_pages() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("small.png"), 4, 4);
        std::fs::write(
            dir.path().join("broken.atlas"),
            "page small.png\nregion huge 0 0 0 64 64\n",
        )
        .unwrap();

        let (mut manager, gpu) = create_manager(dir.path(), 0);
        manager.load::<AtlasAsset>("broken.atlas").unwrap();
        match manager.finish_loading() {
            Err(LoadError::LoaderExecution { name, phase, .. }) => {
                assert_eq!(name, "broken.atlas");
                assert_eq!(phase, LoadPhase::RunningSyncFinish);
            }
            _ => panic!("expected the atlas to fail"),
        }
        assert_eq!(manager.loaded_count(), 0);
        assert_eq!(gpu.live_texture_count(), 0);
    }

    #[test]
    fn missing_page_fails_the_atlas() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lonely.atlas"), "page nowhere.png\n").unwrap();

        let (mut manager, _gpu) = create_manager(dir.path(), 1);
        manager.load::<AtlasAsset>("lonely.atlas").unwrap();
        match manager.finish_loading() {
            Err(LoadError::DependencyLoad {
                dependency, source, ..
            }) => {
                assert_eq!(dependency, "nowhere.png");
                assert!(matches!(*source, LoadError::FileResolution { .. }));
            }
            _ => panic!("expected a missing dependency"),
        }
    }

    #[test]
    fn text_can_be_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("motd.txt"), "  hello  \n").unwrap();
        std::fs::write(dir.path().join("raw.txt"), "  hello  \n").unwrap();

        let (mut manager, _gpu) = create_manager(dir.path(), 0);
        manager
            .load_with_parameters::<TextAsset>(
                "motd.txt",
                AssetParameters::with_config(TextParameters { trim: true }),
            )
            .unwrap();
        manager.load::<TextAsset>("raw.txt").unwrap();
        manager.finish_loading().unwrap();

        assert_eq!(manager.get::<TextAsset>("motd.txt").unwrap().text, "hello");
        assert_eq!(manager.get::<TextAsset>("raw.txt").unwrap().text, "  hello  \n");
    }
}
