use std::fmt;

use etherparse::{EtherType, Ethernet2Header};

use super::config::{DataLayout, ProtocolConfig};
use super::error::DecodeError;
use super::CommandCode;
use crate::utils::eth_utils::format_mac;

/// Pad byte for short fixed-width data fields.
pub const PAD: u8 = b' ';
/// Filler appended after a fixed-width header record on outgoing frames.
pub const FILLER: &[u8] = b" ";

/// An Ethernet II frame: header plus whatever follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub ethernet: Ethernet2Header,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(source: [u8; 6], destination: [u8; 6], ethertype: u16, payload: Vec<u8>) -> Frame {
        Frame {
            ethernet: Ethernet2Header {
                source,
                destination,
                ether_type: EtherType(ethertype),
            },
            payload,
        }
    }

    pub fn ethertype(&self) -> u16 {
        self.ethernet.ether_type.0
    }

    /// Parse a raw buffer as received from the link.
    pub fn parse(raw: &[u8]) -> Result<Frame, DecodeError> {
        let (ethernet, rest) = Ethernet2Header::from_slice(raw).map_err(|err| {
            DecodeError::Ethernet { message: err.to_string() }
        })?;
        Ok(Frame {
            ethernet,
            payload: rest.to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Ethernet2Header::LEN + self.payload.len());
        bytes.extend_from_slice(&self.ethernet.to_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "###[ Ethernet ]###")?;
        writeln!(f, "  dst       = {}", format_mac(&self.ethernet.destination))?;
        writeln!(f, "  src       = {}", format_mac(&self.ethernet.source))?;
        writeln!(f, "  type      = {:#06x}", self.ethertype())?;
        write!(f, "  payload   = {} bytes", self.payload.len())
    }
}

/// The secure header record carried after the Ethernet header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub tag: [u8; 2],
    /// Raw command bytes; replies may echo codes outside [`CommandCode`].
    pub cmd: [u8; 2],
    pub data: Vec<u8>,
}

impl HeaderRecord {
    pub fn command(&self) -> Option<CommandCode> {
        CommandCode::from_bytes(self.cmd)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + self.data.len());
        bytes.extend_from_slice(&self.tag);
        bytes.extend_from_slice(&self.cmd);
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

impl fmt::Display for HeaderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "###[ SecureHeader ]###")?;
        writeln!(f, "  tag       = {:?}", String::from_utf8_lossy(&self.tag))?;
        writeln!(f, "  cmd       = {:?}", String::from_utf8_lossy(&self.cmd))?;
        write!(f, "  data      = {:?}", String::from_utf8_lossy(&self.data))
    }
}

/// Encodes and decodes [`HeaderRecord`]s for one protocol configuration.
#[derive(Debug, Clone)]
pub struct SecureCodec {
    config: ProtocolConfig,
}

impl SecureCodec {
    pub fn new(config: ProtocolConfig) -> SecureCodec {
        SecureCodec { config }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Lays `data` into the data field according to the configured layout.
    ///
    /// Fixed layout pads with spaces or drops everything past the width.
    /// The drop is silent; messages longer than the width lose their tail.
    pub fn fit_data(&self, data: &[u8]) -> Vec<u8> {
        match self.config.layout {
            DataLayout::Fixed(width) => {
                let mut fitted = data[..data.len().min(width)].to_vec();
                fitted.resize(width, PAD);
                fitted
            }
            DataLayout::Variable => data.to_vec(),
        }
    }

    pub fn record(&self, cmd: CommandCode, data: &[u8]) -> HeaderRecord {
        HeaderRecord {
            tag: self.config.tag,
            cmd: cmd.as_bytes(),
            data: self.fit_data(data),
        }
    }

    /// Builds the complete outgoing frame for `cmd` carrying `data`.
    ///
    /// Variable-layout data runs to the end of the frame, so only fixed
    /// records get the filler.
    pub fn encode(&self, cmd: CommandCode, data: &[u8]) -> Frame {
        let mut payload = self.record(cmd, data).to_bytes();
        if let DataLayout::Fixed(_) = self.config.layout {
            payload.extend_from_slice(FILLER);
        }
        Frame::new(
            self.config.source,
            self.config.destination,
            self.config.ethertype,
            payload,
        )
    }

    /// Decodes a header record from the bytes following the Ethernet header.
    pub fn decode(&self, raw: &[u8]) -> Result<HeaderRecord, DecodeError> {
        let min = self.config.min_record_len();
        if raw.len() < min {
            return Err(DecodeError::TooShort { len: raw.len(), min });
        }
        if raw[0..2] != self.config.tag {
            return Err(DecodeError::BadTag {
                found: String::from_utf8_lossy(&raw[0..2]).into_owned(),
                expected: String::from_utf8_lossy(&self.config.tag).into_owned(),
            });
        }

        let data = match self.config.layout {
            DataLayout::Fixed(width) => raw[4..4 + width].to_vec(),
            DataLayout::Variable => raw[4..].to_vec(),
        };
        Ok(HeaderRecord {
            tag: [raw[0], raw[1]],
            cmd: [raw[2], raw[3]],
            data,
        })
    }

    pub fn decode_frame(&self, frame: &Frame) -> Result<HeaderRecord, DecodeError> {
        self.decode(&frame.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(layout: DataLayout) -> SecureCodec {
        SecureCodec::new(ProtocolConfig {
            layout,
            ..ProtocolConfig::default()
        })
    }

    #[test]
    fn test_encode_pads_with_spaces() {
        let codec = codec(DataLayout::Fixed(8));
        let frame = codec.encode(CommandCode::Reflect, b"HI");

        assert_eq!(frame.ethertype(), 0x1234);
        assert_eq!(frame.ethernet.destination, [0xe4, 0x5f, 0x01, 0x8d, 0xc8, 0x32]);
        assert_eq!(&frame.payload[..], b"P4$rHI       ");
    }

    #[test]
    fn test_encode_truncates_long_data() {
        let codec = codec(DataLayout::Fixed(4));
        let record = codec.record(CommandCode::Encrypt, b"Hello World!");
        assert_eq!(record.data, b"Hell".to_vec());

        let exact = codec.record(CommandCode::Encrypt, b"1234");
        assert_eq!(exact.data, b"1234".to_vec());
    }

    #[test]
    fn test_variable_layout_passes_data_through() {
        let codec = codec(DataLayout::Variable);
        let record = codec.record(CommandCode::Reflect, b"abc");
        assert_eq!(record.data, b"abc".to_vec());

        let decoded = codec.decode(b"P4$rabc def").unwrap();
        assert_eq!(decoded.data, b"abc def".to_vec());
        assert_eq!(codec.decode(b"P4$r").unwrap().data, Vec::<u8>::new());
    }

    #[test]
    fn test_variable_layout_round_trip() {
        let codec = codec(DataLayout::Variable);
        let frame = codec.encode(CommandCode::Reflect, b"ping");
        assert_eq!(&frame.payload[..], b"P4$rping");

        let record = codec.decode_frame(&frame).unwrap();
        assert_eq!(record.command(), Some(CommandCode::Reflect));
        assert_eq!(record.data, b"ping".to_vec());
    }

    #[test]
    fn test_decode_round_trip() {
        let codec = codec(DataLayout::Fixed(64));
        let frame = codec.encode(CommandCode::Decrypt, b"Hello World!");

        let parsed = Frame::parse(&frame.to_bytes()).unwrap();
        assert_eq!(parsed, frame);

        let record = codec.decode_frame(&parsed).unwrap();
        assert_eq!(&record.tag, b"P4");
        assert_eq!(record.command(), Some(CommandCode::Decrypt));
        assert_eq!(record.data.len(), 64);
        assert!(record.data.starts_with(b"Hello World!"));
        assert!(record.data[12..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn test_decode_rejects_bad_tag() {
        let codec = codec(DataLayout::Fixed(2));
        let err = codec.decode(b"P5$rhi").unwrap_err();
        assert!(matches!(err, DecodeError::BadTag { .. }));
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let fixed = codec(DataLayout::Fixed(8));
        assert_eq!(
            fixed.decode(b"P4$rHI"),
            Err(DecodeError::TooShort { len: 6, min: 12 })
        );
        assert!(matches!(
            codec(DataLayout::Variable).decode(b"P4$"),
            Err(DecodeError::TooShort { len: 3, min: 4 })
        ));
    }

    #[test]
    fn test_decode_ignores_trailing_padding() {
        let codec = codec(DataLayout::Fixed(2));
        let record = codec.decode(b"P4$ehi\0\0\0\0").unwrap();
        assert_eq!(record.data, b"hi".to_vec());
    }

    #[test]
    fn test_unknown_reply_command_is_kept_raw() {
        let codec = codec(DataLayout::Fixed(2));
        let record = codec.decode(b"P4$zhi").unwrap();
        assert_eq!(&record.cmd, b"$z");
        assert_eq!(record.command(), None);
    }

    #[test]
    fn test_frame_parse_short_buffer() {
        assert!(matches!(
            Frame::parse(&[0u8; 10]),
            Err(DecodeError::Ethernet { .. })
        ));
    }

    #[test]
    fn test_frame_summary() {
        let codec = codec(DataLayout::Fixed(2));
        let summary = codec.encode(CommandCode::Reflect, b"hi").to_string();
        assert!(summary.contains("dst       = e4:5f:01:8d:c8:32"));
        assert!(summary.contains("type      = 0x1234"));
    }
}
