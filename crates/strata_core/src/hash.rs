//! Deterministic content hashing.
//!
//! Class objects expose a `hash_value()` computed over every persisted field
//! so that editors and resource caches can detect content changes. The hash
//! must be stable across runs and platforms, which rules out
//! `std::hash::Hash` with a randomized hasher; values are instead folded one
//! at a time with [`hash_combine`] on top of xxh3.

use glam::{Vec2, Vec3, Vec4};
pub use xxhash_rust::xxh3::Xxh3;

use crate::color::Color4f;
use crate::interpolation::Interpolation;

/// Feed a value's stable byte representation into the hasher.
pub trait StableHash {
    fn stable_hash(&self, state: &mut Xxh3);
}

/// Combine `seed` with the hash of `value`.
#[must_use]
pub fn hash_combine<T: StableHash + ?Sized>(seed: u64, value: &T) -> u64 {
    let mut state = Xxh3::with_seed(seed);
    value.stable_hash(&mut state);
    state.digest()
}

macro_rules! impl_stable_hash_le {
    ($($ty:ty),*) => {
        $(
            impl StableHash for $ty {
                #[inline]
                fn stable_hash(&self, state: &mut Xxh3) {
                    state.update(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_stable_hash_le!(u8, u16, u32, u64, i32, i64);

impl StableHash for bool {
    fn stable_hash(&self, state: &mut Xxh3) {
        state.update(&[u8::from(*self)]);
    }
}

impl StableHash for f32 {
    fn stable_hash(&self, state: &mut Xxh3) {
        state.update(&self.to_bits().to_le_bytes());
    }
}

impl StableHash for str {
    fn stable_hash(&self, state: &mut Xxh3) {
        state.update(&(self.len() as u64).to_le_bytes());
        state.update(self.as_bytes());
    }
}

impl StableHash for String {
    fn stable_hash(&self, state: &mut Xxh3) {
        self.as_str().stable_hash(state);
    }
}

impl<T: StableHash + ?Sized> StableHash for &T {
    fn stable_hash(&self, state: &mut Xxh3) {
        (**self).stable_hash(state);
    }
}

impl<T: StableHash> StableHash for Option<T> {
    fn stable_hash(&self, state: &mut Xxh3) {
        match self {
            Some(v) => {
                state.update(&[1]);
                v.stable_hash(state);
            }
            None => state.update(&[0]),
        }
    }
}

impl StableHash for Vec2 {
    fn stable_hash(&self, state: &mut Xxh3) {
        self.x.stable_hash(state);
        self.y.stable_hash(state);
    }
}

impl StableHash for Vec3 {
    fn stable_hash(&self, state: &mut Xxh3) {
        self.x.stable_hash(state);
        self.y.stable_hash(state);
        self.z.stable_hash(state);
    }
}

impl StableHash for Vec4 {
    fn stable_hash(&self, state: &mut Xxh3) {
        self.x.stable_hash(state);
        self.y.stable_hash(state);
        self.z.stable_hash(state);
        self.w.stable_hash(state);
    }
}

impl StableHash for Color4f {
    fn stable_hash(&self, state: &mut Xxh3) {
        self.to_vec4().stable_hash(state);
    }
}

impl StableHash for Interpolation {
    fn stable_hash(&self, state: &mut Xxh3) {
        (*self as u32).stable_hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_sensitive() {
        let a = hash_combine(hash_combine(0, "a"), "b");
        let b = hash_combine(hash_combine(0, "b"), "a");
        assert_ne!(a, b);
    }

    #[test]
    fn deterministic() {
        assert_eq!(hash_combine(7, &1.5f32), hash_combine(7, &1.5f32));
        assert_ne!(hash_combine(7, &1.5f32), hash_combine(7, &-1.5f32));
    }

    #[test]
    fn string_boundaries_matter() {
        let a = hash_combine(hash_combine(0, "ab"), "c");
        let b = hash_combine(hash_combine(0, "a"), "bc");
        assert_ne!(a, b);
    }
}
