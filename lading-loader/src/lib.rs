mod error;
pub use error::*;

mod asset_loader;
pub use asset_loader::*;

mod descriptor;
pub use descriptor::*;

mod file_resolver;
pub use file_resolver::*;

mod registry;
pub use registry::LoaderRegistry;

mod cache;
pub use cache::AssetCache;

mod dependency_graph;
pub use dependency_graph::DependencyGraph;

mod task;
pub use task::{LoadPhase, LoadTaskId};

mod worker_pool;

mod config;
pub use config::AssetManagerConfig;

mod manager;
pub use manager::{AssetManager, ErrorListener, LoadInfo};

pub use lading_base::{AssetTypeId, TypeUuid};
