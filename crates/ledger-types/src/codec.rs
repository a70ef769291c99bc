//! The canonical, deterministic binary codec for consensus-critical data.
//!
//! Thin wrappers around `parity-scale-codec` (SCALE) so every component that
//! serializes records, state entries, or synthesized transaction bytes uses
//! the exact same binary representation — consensus nodes must agree
//! byte-for-byte.

use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical byte representation.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Vec<u8> {
    v.encode()
}

/// Decodes a value from a canonical byte representation, failing fast on any
/// trailing or malformed bytes.
pub fn from_bytes_canonical<T: Decode>(bytes: &[u8]) -> Result<T, String> {
    T::decode_all(&mut &*bytes).map_err(|e| format!("canonical decode failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_scale_codec::{Decode, Encode};

    #[derive(Encode, Decode, Debug, PartialEq, Eq)]
    struct Sample {
        id: u32,
        tag: Vec<u8>,
    }

    #[test]
    fn roundtrips() {
        let s = Sample { id: 7, tag: vec![1, 2, 3] };
        let bytes = to_bytes_canonical(&s);
        assert_eq!(from_bytes_canonical::<Sample>(&bytes).unwrap(), s);
    }

    #[test]
    fn rejects_truncated_input() {
        let s = Sample { id: 7, tag: vec![1, 2, 3] };
        let mut bytes = to_bytes_canonical(&s);
        bytes.pop();
        assert!(from_bytes_canonical::<Sample>(&bytes).is_err());
    }
}
