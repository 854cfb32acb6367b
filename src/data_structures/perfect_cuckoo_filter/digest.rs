// Copyright (c) 2025 Perfect Cuckoo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Key digest for the Perfect Cuckoo Filter.
//!
//! A key is reduced to a 32-bit CRC-32 checksum. The low `B` bits select the
//! primary bucket and the next `F` bits form the fingerprint. The alternate
//! bucket is the primary XOR a multiplicative scramble of the fingerprint, so
//! applying the mix twice returns to the starting bucket.

/// Odd multiplicative constant used to spread fingerprint bits across the
/// bucket index space.
#[allow(clippy::unreadable_literal)]
pub const ALT_BUCKET_MULTIPLIER: u32 = 0xCC9E2D51;

/// Computes the standard IEEE CRC-32 of `key` (reflected polynomial
/// 0xEDB88320, all-ones initial value, final complement).
pub fn crc32(key: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(key);
    hasher.finalize()
}

/// Bucket index and fingerprint derived from one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest {
    /// Primary bucket index
    pub bucket: u32,
    /// Fingerprint stored in place of the key
    pub fingerprint: u32,
}

/// Splits checksums into bucket/fingerprint fields for a fixed table geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDigester {
    bucket_bits: u32,
    fingerprint_bits: u32,
    bucket_mask: u32,
    fingerprint_mask: u32,
}

impl KeyDigester {
    /// Creates a digester for `bucket_bits` index bits and `fingerprint_bits`
    /// fingerprint bits. Callers validate that the two fit in 32 bits.
    pub fn new(bucket_bits: u32, fingerprint_bits: u32) -> Self {
        Self {
            bucket_bits,
            fingerprint_bits,
            bucket_mask: low_mask(bucket_bits),
            fingerprint_mask: low_mask(fingerprint_bits),
        }
    }

    /// Derives the primary bucket and fingerprint of `key`.
    pub fn digest(&self, key: &[u8]) -> Digest {
        let checksum = crc32(key);
        Digest {
            bucket: checksum & self.bucket_mask,
            fingerprint: checksum.checked_shr(self.bucket_bits).unwrap_or(0) & self.fingerprint_mask,
        }
    }

    /// The other home of `fingerprint` relative to `bucket`.
    ///
    /// `alt_bucket(alt_bucket(b, f), f) == b` for every `b` and `f`.
    #[inline]
    pub fn alt_bucket(&self, bucket: u32, fingerprint: u32) -> u32 {
        bucket ^ (fingerprint.wrapping_mul(ALT_BUCKET_MULTIPLIER) & self.bucket_mask)
    }

    /// Number of bucket index bits.
    pub fn bucket_bits(&self) -> u32 {
        self.bucket_bits
    }

    /// Number of fingerprint bits.
    pub fn fingerprint_bits(&self) -> u32 {
        self.fingerprint_bits
    }
}

fn low_mask(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Bit-at-a-time CRC-32, kept as the reference the table-driven crate is
    /// checked against.
    fn crc32_bitwise(key: &[u8]) -> u32 {
        const POLYNOMIAL: u32 = 0xEDB88320;
        let mut crc = u32::MAX;
        for &byte in key {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                crc = (crc >> 1) ^ if crc & 1 == 1 { POLYNOMIAL } else { 0 };
            }
        }
        !crc
    }

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_default_geometry_split() {
        let digester = KeyDigester::new(19, 13);
        let checksum = crc32(b"123456789");
        let digest = digester.digest(b"123456789");

        assert_eq!(digest.bucket, checksum & 0x7FFFF);
        assert_eq!(digest.fingerprint, checksum >> 19);
        assert!(digest.bucket < (1 << 19));
        assert!(digest.fingerprint < (1 << 13));
    }

    #[test]
    fn test_narrow_fingerprint_drops_high_bits() {
        let digester = KeyDigester::new(4, 6);
        let checksum = crc32(b"a:0");
        let digest = digester.digest(b"a:0");

        assert_eq!(digest.bucket, checksum & 0xF);
        assert_eq!(digest.fingerprint, (checksum >> 4) & 0x3F);
    }

    #[test]
    fn test_zero_bucket_bits() {
        let digester = KeyDigester::new(0, 8);
        let digest = digester.digest(b"only-one-bucket");
        assert_eq!(digest.bucket, 0);
        assert_eq!(digester.alt_bucket(0, digest.fingerprint), 0);
        assert_eq!(digest.fingerprint, crc32(b"only-one-bucket") & 0xFF);
    }

    #[test]
    fn test_alt_bucket_known_value() {
        let digester = KeyDigester::new(19, 13);
        let expected = 5 ^ (1u32.wrapping_mul(ALT_BUCKET_MULTIPLIER) & 0x7FFFF);
        assert_eq!(digester.alt_bucket(5, 1), expected);
        // Fingerprint zero maps every bucket onto itself.
        assert_eq!(digester.alt_bucket(1234, 0), 1234);
    }

    proptest! {
        #[test]
        fn prop_crc32_matches_bitwise(key in proptest::collection::vec(any::<u8>(), 0..128)) {
            prop_assert_eq!(crc32(&key), crc32_bitwise(&key));
        }

        #[test]
        fn prop_digest_is_deterministic(key in ".{0,64}") {
            let digester = KeyDigester::new(19, 13);
            prop_assert_eq!(digester.digest(key.as_bytes()), digester.digest(key.as_bytes()));
        }

        #[test]
        fn prop_alt_bucket_is_involution(
            bucket_bits in 0u32..=24,
            bucket in any::<u32>(),
            fingerprint in any::<u32>(),
        ) {
            let digester = KeyDigester::new(bucket_bits, 32 - bucket_bits);
            let bucket = bucket & low_mask(bucket_bits);
            let alt = digester.alt_bucket(bucket, fingerprint);
            prop_assert!(alt <= low_mask(bucket_bits));
            prop_assert_eq!(digester.alt_bucket(alt, fingerprint), bucket);
        }
    }
}
