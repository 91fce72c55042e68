// ABOUTME: Phantom-typed identifiers for remote resources.
// ABOUTME: Keeps service ids and the three store id kinds from being mixed up.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub enum ServiceMarker {}
pub enum ConfigStoreMarker {}
pub enum SecretStoreMarker {}
pub enum KvStoreMarker {}

/// An opaque identifier assigned by the control plane.
#[must_use = "ids reference remote resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The id with its marker dropped, for calls that accept any resource.
    pub fn erase(&self) -> ResourceId {
        ResourceId(self.value.clone())
    }
}

// T is a marker only, so none of these impls bound it.

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// A store id of any kind, as accepted by resource links.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type ServiceId = Id<ServiceMarker>;
pub type ConfigStoreId = Id<ConfigStoreMarker>;
pub type SecretStoreId = Id<SecretStoreMarker>;
pub type KvStoreId = Id<KvStoreMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_deserialize_from_plain_strings() {
        let id: ServiceId = serde_json::from_str("\"SU1Z0isxPaozGVKXdv0eY\"").unwrap();
        assert_eq!(id.as_str(), "SU1Z0isxPaozGVKXdv0eY");
        assert_eq!(id.to_string(), "SU1Z0isxPaozGVKXdv0eY");
    }

    #[test]
    fn erased_ids_keep_their_value() {
        let store = KvStoreId::new("kv-123");
        assert_eq!(store.erase().as_str(), "kv-123");
    }
}
