use serde::{de, ser};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use type_uuid::TypeUuid;
use uuid::Uuid;

/// Identifies the runtime type of a loaded asset. Every asset type declares a UUID through
/// `#[derive(TypeUuid)]` and this is the key the registry and cache are partitioned by.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct AssetTypeId(pub Uuid);

impl AssetTypeId {
    pub const fn null() -> Self {
        AssetTypeId(Uuid::nil())
    }

    pub fn of<T: TypeUuid>() -> Self {
        AssetTypeId::from_bytes(T::UUID)
    }

    pub fn parse_str(input: &str) -> Result<Self, uuid::Error> {
        Ok(AssetTypeId(Uuid::parse_str(input)?))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    pub fn from_bytes(bytes: uuid::Bytes) -> Self {
        AssetTypeId(Uuid::from_bytes(bytes))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for AssetTypeId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_tuple("AssetTypeId").field(&self.0).finish()
    }
}

impl fmt::Display for AssetTypeId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for AssetTypeId {
    fn serialize<S: ser::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

struct AssetTypeIdVisitor;

impl<'a> de::Visitor<'a> for AssetTypeIdVisitor {
    type Value = AssetTypeId;

    fn expecting(
        &self,
        fmt: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(fmt, "a UUID-formatted string")
    }

    fn visit_str<E: de::Error>(
        self,
        s: &str,
    ) -> Result<Self::Value, E> {
        Uuid::from_str(s)
            .map(AssetTypeId)
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(s), &self))
    }
}

impl<'de> Deserialize<'de> for AssetTypeId {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_string(AssetTypeIdVisitor)
        } else {
            Ok(AssetTypeId(Uuid::deserialize(deserializer)?))
        }
    }
}
