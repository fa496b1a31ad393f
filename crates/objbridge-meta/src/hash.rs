//! Name hashing for Global Table bucket selection
//!
//! The metadata generator buckets entities with the host engine's 8-bit
//! string hash (a SuperFastHash variant truncated to 24 bits). Lookups must
//! reproduce it bit for bit.

const START_VALUE: u32 = 0x9E37_79B9;

/// Bits reserved by the engine's string implementation; the hash keeps the rest.
const FLAG_COUNT: u32 = 8;

/// Hash a name the way the Global Table was bucketed.
pub fn name_hash(name: &[u8]) -> u32 {
    let mut hash = START_VALUE;

    let mut pairs = name.chunks_exact(2);
    for pair in &mut pairs {
        hash = hash.wrapping_add(pair[0] as u32);
        let tmp = ((pair[1] as u32) << 11) ^ hash;
        hash = (hash << 16) ^ tmp;
        hash = hash.wrapping_add(hash >> 11);
    }

    if let [last] = pairs.remainder() {
        hash = hash.wrapping_add(*last as u32);
        hash ^= hash << 11;
        hash = hash.wrapping_add(hash >> 17);
    }

    // Avalanche
    hash ^= hash << 3;
    hash = hash.wrapping_add(hash >> 5);
    hash ^= hash << 2;
    hash = hash.wrapping_add(hash >> 15);
    hash ^= hash << 10;

    hash &= (1 << (32 - FLAG_COUNT)) - 1;

    // Zero is reserved for "not computed"
    if hash == 0 {
        hash = 0x80_0000;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        // Empty string matches the engine's precomputed empty-string hash.
        assert_eq!(name_hash(b""), 0xEC_889E);
        assert_eq!(name_hash(b"a"), 0x95_343B);
        assert_eq!(name_hash(b"ab"), 0x76_03E0);
        assert_eq!(name_hash(b"UIView"), 0xCD_ADB4);
        assert_eq!(name_hash(b"NSObject"), 0x79_0F83);
    }

    #[test]
    fn test_hash_fits_24_bits() {
        for name in ["", "a", "NSObject", "UIView", "initWithFrame:", "CGPointMake"] {
            let h = name_hash(name.as_bytes());
            assert!(h < (1 << 24), "{name} hashed to {h:#x}");
            assert_ne!(h, 0);
        }
    }

    #[test]
    fn test_hash_is_deterministic_and_discriminating() {
        assert_eq!(name_hash(b"NSString"), name_hash(b"NSString"));
        assert_ne!(name_hash(b"NSString"), name_hash(b"NSStrinh"));
        assert_ne!(name_hash(b"ab"), name_hash(b"ba"));
    }

    #[test]
    fn test_odd_and_even_lengths_differ() {
        assert_ne!(name_hash(b"abc"), name_hash(b"ab"));
    }
}
