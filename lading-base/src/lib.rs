pub mod hashing;

mod asset_type_id;
pub use asset_type_id::AssetTypeId;

mod ordered_set;
pub use ordered_set::OrderedSet;

pub use type_uuid::TypeUuid;
