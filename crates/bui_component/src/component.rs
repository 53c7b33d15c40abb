//! Component ids and interface keys.
//!
//! ## Interface key identity
//!
//! [`InterfaceKey`] is derived from a stable **string name** using the FNV-1a
//! 64-bit hash. Client and server compute the same key for the same name
//! without exchanging a table, so applications can keep their keys in a
//! closed enum and convert with `From`.

use serde::{Deserialize, Serialize};

/// Network id of a component on an entity.
///
/// Unique within one entity's component set at a given time. The same id may
/// be reused on a later entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// Tag distinguishing the interface surfaces hosted by one entity.
///
/// `(EntityId, InterfaceKey)` identifies at most one live interface instance.
/// The key is a pure map key and carries no behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterfaceKey(pub u64);

impl InterfaceKey {
    /// Derive the key for a stable interface name.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(stable_hash(name))
    }
}

impl std::fmt::Display for InterfaceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({:#018x})", self.0)
    }
}

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// FNV-1a 64-bit hash of a name's UTF-8 bytes.
///
/// Language-neutral and deterministic; also used for payload type ids.
#[must_use]
pub const fn stable_hash(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum TestKey {
        Storage,
        Vending,
    }

    impl From<TestKey> for InterfaceKey {
        fn from(key: TestKey) -> Self {
            match key {
                TestKey::Storage => InterfaceKey::from_name("storage"),
                TestKey::Vending => InterfaceKey::from_name("vending"),
            }
        }
    }

    #[test]
    fn test_key_is_stable() {
        assert_eq!(
            InterfaceKey::from_name("storage"),
            InterfaceKey::from_name("storage")
        );
    }

    #[test]
    fn test_keys_differ_between_names() {
        let storage: InterfaceKey = TestKey::Storage.into();
        let vending: InterfaceKey = TestKey::Vending.into();
        assert_ne!(storage, vending);
    }

    #[test]
    fn test_fnv1a_known_vector() {
        // FNV-1a 64-bit of the empty string is the offset basis itself.
        assert_eq!(
            InterfaceKey::from_name(""),
            InterfaceKey(0xcbf2_9ce4_8422_2325)
        );
    }

    #[test]
    fn test_component_id_display() {
        assert_eq!(ComponentId(9).to_string(), "Component(9)");
    }
}
