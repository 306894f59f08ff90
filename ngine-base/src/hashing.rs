/// Default hashmap for ngine. Opts-out of more expensive secure hash.
pub type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
/// Default hashset for ngine. Opts-out of more expensive secure hash.
pub type HashSet<T> = std::collections::HashSet<T, ahash::RandomState>;

/// 64-bit FNV-1a hash of a byte slice. This is the hash every name in the engine is keyed by, so
/// it must stay stable across builds and platforms.
pub const fn hash_bytes(bytes: &[u8]) -> u64 {
    const_fnv1a_hash::fnv1a_hash_64(bytes, None)
}

/// 64-bit FNV-1a hash of a string, usable in const context
pub const fn hash_str(s: &str) -> u64 {
    const_fnv1a_hash::fnv1a_hash_str_64(s)
}

// Both strings hash to 0x4eac0c95540867e4
#[cfg(test)]
pub(crate) const KNOWN_HASH_COLLISIONS: [&str; 2] =
    ["8yn0iYCKYHlIj4-BwPqk", "GReLUrM4wMqfg9yzV3KQ"];
