//! Serde support for `bitflags` types, stored as their raw `u32` bits.
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize)]
//! struct DrawableClass {
//!     #[serde(with = "strata_core::flags::bits")]
//!     flags: DrawableFlags,
//! }
//! ```

pub mod bits {
    use bitflags::Flags;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<F, S>(flags: &F, serializer: S) -> Result<S::Ok, S::Error>
    where
        F: Flags<Bits = u32>,
        S: Serializer,
    {
        serializer.serialize_u32(flags.bits())
    }

    /// Unknown bits are dropped.
    pub fn deserialize<'de, F, D>(deserializer: D) -> Result<F, D::Error>
    where
        F: Flags<Bits = u32>,
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(F::from_bits_truncate(bits))
    }
}
