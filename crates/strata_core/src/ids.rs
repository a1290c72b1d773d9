//! Random identifiers for classes and instances.

use uuid::Uuid;

/// Default length of generated ids.
pub const ID_LENGTH: usize = 10;

/// A random alphanumeric string of `len` characters (at most 32).
#[must_use]
pub fn random_string(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(len);
    id
}

/// A fresh id of the default length.
#[inline]
#[must_use]
pub fn new_id() -> String {
    random_string(ID_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_sized() {
        let a = new_id();
        let b = new_id();
        assert_eq!(a.len(), ID_LENGTH);
        assert_ne!(a, b);
    }
}
