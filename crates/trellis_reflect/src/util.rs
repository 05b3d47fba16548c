use core::any::TypeId;
use core::hash::{BuildHasherDefault, Hasher};

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map keyed by [`TypeId`].
///
/// `TypeId` is already a high-quality hash, so the map skips rehashing and
/// feeds the id's low 64 bits straight through.
pub type TypeIdMap<V> = hashbrown::HashMap<TypeId, V, BuildHasherDefault<TypeIdHasher>>;

/// A hasher that passes `TypeId` bytes through unchanged.
///
/// Only valid for `TypeId` keys; writing anything other than a `u64`/`u128`
/// means the key type leaked something else into the hasher.
#[derive(Default)]
pub struct TypeIdHasher {
    hash: u64,
}

impl Hasher for TypeIdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    #[inline]
    fn write_u64(&mut self, n: u64) {
        self.hash = n;
    }

    #[inline]
    fn write_u128(&mut self, n: u128) {
        self.hash = n as u64;
    }

    fn write(&mut self, bytes: &[u8]) {
        // `TypeId` hashes itself via `write_u64`/`write_u128` on every
        // supported toolchain; keep a correct fallback anyway.
        for &b in bytes {
            self.hash = self.hash.rotate_left(8) ^ u64::from(b);
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::TypeIdMap;
    use core::any::TypeId;

    #[test]
    fn insert_and_get() {
        let mut map: TypeIdMap<&'static str> = TypeIdMap::default();
        map.insert(TypeId::of::<u32>(), "u32");
        map.insert(TypeId::of::<String>(), "string");

        assert_eq!(map.get(&TypeId::of::<u32>()), Some(&"u32"));
        assert_eq!(map.get(&TypeId::of::<String>()), Some(&"string"));
        assert_eq!(map.get(&TypeId::of::<i64>()), None);
    }
}
