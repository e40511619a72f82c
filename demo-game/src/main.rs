use demo_types::atlas::AtlasAsset;
use demo_types::gpu::SimulatedGpu;
use demo_types::text::{TextAsset, TextParameters};
use demo_types::texture::TextureAsset;
use lading::loader::{AssetManager, AssetManagerConfig, AssetParameters};
use std::path::PathBuf;

pub fn config_path() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/lading.json"))
}

fn main() {
    // Setup logging
    env_logger::Builder::default()
        .write_style(env_logger::WriteStyle::Always)
        .filter_level(log::LevelFilter::Debug)
        .init();

    let config = AssetManagerConfig::read_from_path(&config_path()).unwrap();
    let mut manager = AssetManager::new(config).unwrap();
    let gpu = SimulatedGpu::new();
    demo_types::register_demo_loaders(&mut manager, &gpu);

    manager.set_error_listener(|descriptor, error| {
        log::error!("Could not load {}: {}", descriptor, error);
    });

    manager.load::<AtlasAsset>("ui/menu.atlas").unwrap();
    manager
        .load_with_parameters::<TextAsset>(
            "motd.txt",
            AssetParameters::with_config(TextParameters { trim: true }).on_loaded(
                |manager, name, _| {
                    if let Ok(motd) = manager.get::<TextAsset>(name) {
                        println!("Message of the day: {}", motd.text);
                    }
                },
            ),
        )
        .unwrap();
    // Already requested as a page of the atlas, this only adds a reference
    manager.load::<TextureAsset>("ui/menu.png").unwrap();

    loop {
        profiling::scope!("Main Loop");
        let finished = manager.pump().unwrap();
        println!("loading {:.0}%", manager.progress() * 100.0);
        if finished {
            break;
        }

        std::thread::sleep(std::time::Duration::from_millis(15));
    }

    if let Ok(atlas) = manager.get::<AtlasAsset>("ui/menu.atlas") {
        for region in &atlas.regions {
            let page = &atlas.pages[region.page];
            println!(
                "region {} is {}x{} on {}",
                region.name, region.width, region.height, page.texture
            );
        }
    }

    print!("{}", manager.diagnostics());
    println!(
        "{} textures on the gpu using {} bytes",
        gpu.live_texture_count(),
        gpu.live_texture_bytes()
    );

    manager.unload("ui/menu.atlas").unwrap();
    println!("after unloading the atlas:");
    print!("{}", manager.diagnostics());

    manager.clear();
    println!("{} textures left on the gpu", gpu.live_texture_count());
}
