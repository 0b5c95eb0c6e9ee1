//! Region-namespaced store keys
//!
//! Many logical caches can share one physical store. Every store key
//! carries the region of the cache that wrote it, and says whether it indexes
//! a primary key or a value-derived key.

use std::fmt;

/// Region used when a cache is built without an explicit one
pub const DEFAULT_REGION: &str = "DEFAULT";

/// Value-derived secondary key.
///
/// A persisted null value has no derived key but is still indexed, under
/// [`ValueKey::Null`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey<VK> {
    Null,
    Key(VK),
}

impl<VK> ValueKey<VK> {
    pub fn as_key(&self) -> Option<&VK> {
        match self {
            Self::Null => None,
            Self::Key(vk) => Some(vk),
        }
    }
}

/// Key stored in a [`BackingStore`](crate::BackingStore) on behalf of one cache region
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamespacedKey<K, VK> {
    /// Primary index entry: `region + key` → value slot
    Primary { region: String, key: K },
    /// Secondary index entry: `region + value key` → primary key slot
    Secondary { region: String, value_key: ValueKey<VK> },
}

impl<K, VK> NamespacedKey<K, VK> {
    pub fn primary(region: impl Into<String>, key: K) -> Self {
        Self::Primary { region: region.into(), key }
    }

    pub fn secondary(region: impl Into<String>, value_key: ValueKey<VK>) -> Self {
        Self::Secondary { region: region.into(), value_key }
    }

    pub fn region(&self) -> &str {
        match self {
            Self::Primary { region, .. } | Self::Secondary { region, .. } => region,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary { .. })
    }
}

impl<K: fmt::Debug, VK: fmt::Debug> fmt::Display for NamespacedKey<K, VK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary { region, key } => write!(f, "{region}.{key:?}"),
            Self::Secondary { region, value_key: ValueKey::Null } => {
                write!(f, "{region}.value(null)")
            }
            Self::Secondary { region, value_key: ValueKey::Key(vk) } => {
                write!(f, "{region}.value({vk:?})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_same_key_different_region_is_distinct() {
        let a: NamespacedKey<u64, String> = NamespacedKey::primary("A", 1);
        let b: NamespacedKey<u64, String> = NamespacedKey::primary("B", 1);
        assert_ne!(a, b);

        let set: HashSet<_> = [a.clone(), b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_primary_and_secondary_never_collide() {
        let primary: NamespacedKey<String, String> = NamespacedKey::primary("R", "x".to_string());
        let secondary: NamespacedKey<String, String> =
            NamespacedKey::secondary("R", ValueKey::Key("x".to_string()));
        assert_ne!(primary, secondary);
        assert!(primary.is_primary());
        assert!(!secondary.is_primary());
        assert_eq!(secondary.region(), "R");
    }

    #[test]
    fn test_display() {
        let key: NamespacedKey<u64, &str> = NamespacedKey::primary("ORDERS_REGION", 7);
        assert_eq!(key.to_string(), "ORDERS_REGION.7");

        let null: NamespacedKey<u64, &str> = NamespacedKey::secondary("R", ValueKey::Null);
        assert_eq!(null.to_string(), "R.value(null)");
    }
}
