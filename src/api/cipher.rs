//! Toy XOR payload scrambling.
//!
//! This is NOT cryptography. The key is tiled over the payload and XORed in,
//! so any known plaintext recovers the key. It exists to match the behaviour
//! of the paired data-plane program byte for byte.

use std::fmt;
use std::str::FromStr;

use super::error::KeyError;

/// Raw key material, parsed from a hex literal like `0x0123456789abcdef`.
#[derive(Clone, PartialEq, Eq)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn new(bytes: Vec<u8>) -> Result<Key, KeyError> {
        if bytes.is_empty() {
            return Err(KeyError::Empty);
        }
        Ok(Key(bytes))
    }

    pub(crate) fn from_nonempty(bytes: Vec<u8>) -> Key {
        debug_assert!(!bytes.is_empty());
        Key(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Repeats the key from offset zero until exactly `width` bytes are filled.
    pub fn tile(&self, width: usize) -> Vec<u8> {
        self.0.iter().copied().cycle().take(width).collect()
    }
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(literal: &str) -> Result<Key, KeyError> {
        let digits = literal
            .strip_prefix("0x")
            .or_else(|| literal.strip_prefix("0X"))
            .unwrap_or(literal);
        let bytes = hex::decode(digits).map_err(|err| match err {
            hex::FromHexError::OddLength => KeyError::OddLength { literal: literal.to_string() },
            _ => KeyError::InvalidDigit { literal: literal.to_string() },
        })?;
        Key::new(bytes)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// XORs `plain` against the key tiled to the same length.
///
/// Works byte-wise so the output is always as long as the input; leading
/// zero bytes survive.
pub fn scramble(plain: &[u8], key: &Key) -> Vec<u8> {
    plain
        .iter()
        .zip(key.tile(plain.len()))
        .map(|(byte, k)| byte ^ k)
        .collect()
}

/// Inverse of [`scramble`]. XOR is its own inverse, so this is the same operation.
pub fn descramble(cipher: &[u8], key: &Key) -> Vec<u8> {
    scramble(cipher, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn es_key() -> Key {
        "0x0123456789abcdef".parse().unwrap()
    }

    #[test]
    fn test_parse_key() {
        let key = es_key();
        assert_eq!(key.as_bytes(), &[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        assert_eq!(key.to_string(), "0x0123456789abcdef");

        let bare: Key = "CAFE".parse().unwrap();
        assert_eq!(bare.as_bytes(), &[0xca, 0xfe]);
        assert_eq!(bare.to_string(), "0xcafe");
    }

    #[test]
    fn test_parse_key_rejects_bad_literals() {
        assert_eq!("0x".parse::<Key>(), Err(KeyError::Empty));
        assert!(matches!("0x123".parse::<Key>(), Err(KeyError::OddLength { .. })));
        assert!(matches!("0xzz".parse::<Key>(), Err(KeyError::InvalidDigit { .. })));
        assert!(matches!("0x1g".parse::<Key>(), Err(KeyError::InvalidDigit { .. })));
        assert_eq!(
            "123".parse::<Key>(),
            Err(KeyError::OddLength { literal: "123".to_string() })
        );
        assert_eq!(Key::new(Vec::new()), Err(KeyError::Empty));
    }

    #[test]
    fn test_tile_by_width() {
        let key: Key = "0xaabbcc".parse().unwrap();
        assert_eq!(key.tile(7), vec![0xaa, 0xbb, 0xcc, 0xaa, 0xbb, 0xcc, 0xaa]);
        assert_eq!(key.tile(2), vec![0xaa, 0xbb]);
        assert!(key.tile(0).is_empty());
    }

    #[test]
    fn test_scramble_hi_width_eight() {
        let plain = b"HI      ";
        let key = es_key();
        let cipher = scramble(plain, &key);

        let expected: Vec<u8> = plain
            .iter()
            .zip([0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef])
            .map(|(p, k)| p ^ k)
            .collect();
        assert_eq!(cipher, expected);
        assert_eq!(cipher[0], b'H' ^ 0x01);
        assert_eq!(cipher[7], b' ' ^ 0xef);

        assert_eq!(descramble(&cipher, &key), plain.to_vec());
    }

    #[test]
    fn test_leading_zero_bytes_survive() {
        let key = es_key();
        // first byte XORs to zero
        let plain = [0x01, 0x00, 0x45];
        let cipher = scramble(&plain, &key);
        assert_eq!(cipher.len(), 3);
        assert_eq!(cipher[0], 0x00);
        assert_eq!(descramble(&cipher, &key), plain.to_vec());
    }

    #[test]
    fn test_involution_over_widths() {
        let key: Key = "0xcafeacce55c0ffee".parse().unwrap();
        for width in [0usize, 1, 7, 8, 9, 64] {
            let message: Vec<u8> = (0..width).map(|i| (i * 31 % 256) as u8).collect();
            let cipher = scramble(&message, &key);
            assert_eq!(cipher.len(), width);
            assert_eq!(descramble(&cipher, &key), message);
        }
    }
}
