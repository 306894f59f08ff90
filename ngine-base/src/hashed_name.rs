use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::hashing::hash_str;

/// Decides how much of a name is compared once lengths and hashes agree
pub trait CollisionPolicy {
    const COMPARE_CONTENTS: bool;
}

/// Names are equal only if their bytes are equal
pub struct CollisionSafe;

impl CollisionPolicy for CollisionSafe {
    const COMPARE_CONTENTS: bool = true;
}

/// Names are equal if their lengths and hashes are equal. Faster, but two different strings with
/// the same hash compare equal.
pub struct CollisionUnsafe;

impl CollisionPolicy for CollisionUnsafe {
    const COMPARE_CONTENTS: bool = false;
}

/// A heap allocated string with a precomputed hash, not backed by a name table
pub struct HashedName<P: CollisionPolicy = CollisionSafe> {
    string: String,
    hash: u64,
    phantom_data: PhantomData<fn() -> P>,
}

pub type SafeName = HashedName<CollisionSafe>;
pub type UnsafeName = HashedName<CollisionUnsafe>;

impl<P: CollisionPolicy> HashedName<P> {
    pub fn new(s: &str) -> Self {
        HashedName {
            string: s.to_string(),
            hash: hash_str(s),
            phantom_data: Default::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.string
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.string.len()
    }

    pub fn is_empty(&self) -> bool {
        self.string.is_empty()
    }
}

impl<P: CollisionPolicy> Default for HashedName<P> {
    fn default() -> Self {
        HashedName::new("")
    }
}

impl<P: CollisionPolicy> Clone for HashedName<P> {
    fn clone(&self) -> Self {
        HashedName {
            string: self.string.clone(),
            hash: self.hash,
            phantom_data: Default::default(),
        }
    }
}

// The left hand side's policy decides
impl<P: CollisionPolicy, Q: CollisionPolicy> PartialEq<HashedName<Q>> for HashedName<P> {
    fn eq(
        &self,
        other: &HashedName<Q>,
    ) -> bool {
        self.string.len() == other.string.len()
            && self.hash == other.hash
            && (!P::COMPARE_CONTENTS || self.string == other.string)
    }
}

impl<P: CollisionPolicy> Eq for HashedName<P> {}

impl<P: CollisionPolicy> Hash for HashedName<P> {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        state.write_u64(self.hash);
    }
}

impl<P: CollisionPolicy> Debug for HashedName<P> {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_tuple("HashedName")
            .field(&self.string)
            .field(&format_args!("{:#018x}", self.hash))
            .finish()
    }
}

impl<P: CollisionPolicy> Display for HashedName<P> {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.string)
    }
}

impl<P: CollisionPolicy> From<&str> for HashedName<P> {
    fn from(s: &str) -> Self {
        HashedName::new(s)
    }
}

/// A hashed name stored in a fixed `N` byte buffer. Content longer than `N - 1` bytes is truncated
/// on a character boundary, and the hash covers the stored content only.
pub struct InlineName<const N: usize, P: CollisionPolicy = CollisionSafe> {
    bytes: [u8; N],
    len: usize,
    hash: u64,
    phantom_data: PhantomData<fn() -> P>,
}

impl<const N: usize, P: CollisionPolicy> InlineName<N, P> {
    pub const CAPACITY: usize = N.saturating_sub(1);

    pub fn new(s: &str) -> Self {
        let mut len = s.len().min(Self::CAPACITY);
        while !s.is_char_boundary(len) {
            len -= 1;
        }

        let mut bytes = [0; N];
        bytes[..len].copy_from_slice(&s.as_bytes()[..len]);

        InlineName {
            bytes,
            len,
            hash: hash_str(&s[..len]),
            phantom_data: Default::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        // Only ever filled from a &str cut on a char boundary
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize, P: CollisionPolicy> Default for InlineName<N, P> {
    fn default() -> Self {
        InlineName::new("")
    }
}

impl<const N: usize, P: CollisionPolicy> Clone for InlineName<N, P> {
    fn clone(&self) -> Self {
        InlineName {
            bytes: self.bytes,
            len: self.len,
            hash: self.hash,
            phantom_data: Default::default(),
        }
    }
}

impl<const N: usize, const M: usize, P: CollisionPolicy, Q: CollisionPolicy>
    PartialEq<InlineName<M, Q>> for InlineName<N, P>
{
    fn eq(
        &self,
        other: &InlineName<M, Q>,
    ) -> bool {
        N == M
            && self.len == other.len
            && self.hash == other.hash
            && (!P::COMPARE_CONTENTS || self.bytes[..self.len] == other.bytes[..other.len])
    }
}

impl<const N: usize, P: CollisionPolicy> Eq for InlineName<N, P> {}

impl<const N: usize, P: CollisionPolicy> Hash for InlineName<N, P> {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        state.write_u64(self.hash);
    }
}

impl<const N: usize, P: CollisionPolicy> Debug for InlineName<N, P> {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_tuple("InlineName")
            .field(&self.as_str())
            .field(&format_args!("{:#018x}", self.hash))
            .finish()
    }
}

impl<const N: usize, P: CollisionPolicy> Display for InlineName<N, P> {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hashing::KNOWN_HASH_COLLISIONS;

    #[test]
    fn safe_names_survive_collisions() {
        let a = SafeName::new(KNOWN_HASH_COLLISIONS[0]);
        let b = SafeName::new(KNOWN_HASH_COLLISIONS[1]);
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a, b);
        assert_eq!(a, SafeName::new(KNOWN_HASH_COLLISIONS[0]));
    }

    #[test]
    fn unsafe_names_trust_the_hash() {
        let a = UnsafeName::new(KNOWN_HASH_COLLISIONS[0]);
        let b = UnsafeName::new(KNOWN_HASH_COLLISIONS[1]);
        assert_eq!(a, b);
        assert_ne!(a, UnsafeName::new("hello world"));

        // The lhs policy is used when mixing policies
        let safe = SafeName::new(KNOWN_HASH_COLLISIONS[1]);
        assert!(a == safe);
        assert!(safe != a);
    }

    #[test]
    fn inline_names_truncate() {
        let name = InlineName::<8>::new("abcdefghij");
        assert_eq!(name.as_str(), "abcdefg");
        assert_eq!(name.len(), 7);
        assert_eq!(name.hash(), hash_str("abcdefg"));
        assert_eq!(name, InlineName::<8>::new("abcdefg"));
        assert_ne!(name, InlineName::<16>::new("abcdefg"));
    }

    #[test]
    fn inline_names_truncate_on_char_boundary() {
        // 'é' is two bytes and would straddle the cut
        let name = InlineName::<4, CollisionSafe>::new("abé");
        assert_eq!(name.as_str(), "ab");
    }

    #[test]
    fn inline_names_collision_policy() {
        let a = InlineName::<32, CollisionSafe>::new(KNOWN_HASH_COLLISIONS[0]);
        let b = InlineName::<32, CollisionSafe>::new(KNOWN_HASH_COLLISIONS[1]);
        assert_ne!(a, b);

        let a = InlineName::<32, CollisionUnsafe>::new(KNOWN_HASH_COLLISIONS[0]);
        let b = InlineName::<32, CollisionUnsafe>::new(KNOWN_HASH_COLLISIONS[1]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), KNOWN_HASH_COLLISIONS[0]);
    }

    #[test]
    fn empty_names_are_equal() {
        assert_eq!(SafeName::default(), SafeName::new(""));
        assert!(InlineName::<8>::default().is_empty());
    }
}
