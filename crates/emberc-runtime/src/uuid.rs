//! UUID generation backing the source language's `Uuid` namespace.
//!
//! Version-4 (random) UUIDs per RFC 4122, built on [`crate::random`]
//! rather than a dedicated crate — no `uuid`-family dependency appears
//! anywhere in this workspace's teacher lineage, and the format is
//! simple enough that reaching for one would add a dependency with no
//! counterpart in the corpus.

use crate::random::RandomState;

/// A 128-bit UUID, stored as its 16 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// Generates a version-4 (random) UUID using `rng`.
    pub fn v4(rng: &mut RandomState) -> Self {
        let mut bytes = [0u8; 16];
        for chunk in bytes.chunks_mut(8) {
            let word = (rng.int_range(0, i64::MAX) as u64).to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
        // Version 4: top nibble of byte 6 is 0100.
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        // Variant 1 (RFC 4122): top two bits of byte 8 are 10.
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        Uuid(bytes)
    }

    /// Generates a version-4 UUID using the process-wide default
    /// generator (`Random`'s once-guarded singleton).
    pub fn new_v4() -> Self {
        let mut rng = RandomState::from_time();
        Self::v4(&mut rng)
    }

    /// Canonical `8-4-4-4-12` lowercase hex string form.
    #[must_use]
    pub fn to_hyphenated_string(&self) -> String {
        let b = &self.0;
        format!(
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_sets_version_and_variant_bits() {
        let mut rng = RandomState::new(99);
        let id = Uuid::v4(&mut rng);
        assert_eq!(id.0[6] & 0xF0, 0x40);
        assert_eq!(id.0[8] & 0xC0, 0x80);
    }

    #[test]
    fn to_hyphenated_string_has_expected_shape() {
        let mut rng = RandomState::new(1);
        let id = Uuid::v4(&mut rng);
        let s = id.to_hyphenated_string();
        let parts: Vec<&str> = s.split('-').collect();
        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
    }

    #[test]
    fn same_seed_reproduces_same_uuid() {
        let mut a = RandomState::new(55);
        let mut b = RandomState::new(55);
        assert_eq!(Uuid::v4(&mut a), Uuid::v4(&mut b));
    }
}
