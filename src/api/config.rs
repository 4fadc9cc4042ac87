use std::time::Duration;

use super::cipher::Key;

/// Private ethertype shared with the data-plane program.
pub const ETHERTYPE: u16 = 0x1234;
pub const TAG: [u8; 2] = *b"P4";
/// Width of the fixed data field, in bytes.
pub const DATA_WIDTH: usize = 64;
/// Address of the board running the P4 program.
pub const DEFAULT_DESTINATION: [u8; 6] = [0xe4, 0x5f, 0x01, 0x8d, 0xc8, 0x32];
pub const ENCRYPT_KEY: [u8; 8] = [0xca, 0xfe, 0xac, 0xce, 0x55, 0xc0, 0xff, 0xee];
pub const DECRYPT_KEY: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLayout {
    /// Data is space padded or truncated to exactly this many bytes.
    Fixed(usize),
    /// Data is the remainder of the frame, length agreed out of band.
    Variable,
}

/// Keys per exchange direction.
///
/// `encrypt` descrambles `$e` replies, `decrypt` scrambles `$d` requests.
/// Which literal belongs to which direction is a deployment decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionKeys {
    pub encrypt: Key,
    pub decrypt: Key,
}

impl Default for DirectionKeys {
    fn default() -> Self {
        DirectionKeys {
            encrypt: Key::from_nonempty(ENCRYPT_KEY.to_vec()),
            decrypt: Key::from_nonempty(DECRYPT_KEY.to_vec()),
        }
    }
}

/// Immutable protocol parameters, fixed for the lifetime of a shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    pub ethertype: u16,
    pub tag: [u8; 2],
    pub layout: DataLayout,
    pub destination: [u8; 6],
    pub source: [u8; 6],
    pub keys: DirectionKeys,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            ethertype: ETHERTYPE,
            tag: TAG,
            layout: DataLayout::Fixed(DATA_WIDTH),
            destination: DEFAULT_DESTINATION,
            source: [0; 6],
            keys: DirectionKeys::default(),
        }
    }
}

impl ProtocolConfig {
    pub fn with_source(mut self, source: [u8; 6]) -> Self {
        self.source = source;
        self
    }

    /// Smallest header record the codec accepts: tag + cmd (+ fixed data).
    pub fn min_record_len(&self) -> usize {
        match self.layout {
            DataLayout::Fixed(width) => 4 + width,
            DataLayout::Variable => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// How long to wait for the single reply.
    pub timeout: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
