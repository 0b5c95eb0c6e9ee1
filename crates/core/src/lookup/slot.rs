//! Slot values held in the backing store

/// What a store entry records about a namespaced key.
///
/// `Found`, `NullValue` and `NotFound` live under primary keys. `Key` and
/// `NotFound` live under secondary keys, pointing a value key back at its
/// primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSlot<K, V> {
    /// Entity exists with a value
    Found(V),
    /// Entity exists and its value is null
    NullValue,
    /// Lookup was resolved and the entity does not exist
    NotFound,
    /// Secondary index entry: the primary key owning the value
    Key(K),
}

impl<K, V> CacheSlot<K, V> {
    /// Slot recording a resolved value, null or not.
    pub fn from_value(value: Option<V>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::NullValue,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NullValue => "null value",
            Self::NotFound => "not found",
            Self::Key(_) => "key",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value() {
        assert_eq!(CacheSlot::<u8, &str>::from_value(Some("v")), CacheSlot::Found("v"));
        assert_eq!(CacheSlot::<u8, &str>::from_value(None), CacheSlot::NullValue);
        assert!(CacheSlot::<u8, &str>::NotFound.is_not_found());
    }
}
