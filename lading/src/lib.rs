#[cfg(feature = "lading-base")]
pub use lading_base as base;

#[cfg(feature = "lading-loader")]
pub use lading_loader as loader;
