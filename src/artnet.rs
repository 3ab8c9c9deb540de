// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Art-Net ArtDmx decoding.
//!
//! Packet layout:
//!
//! | Offset | Size | Field     | Encoding          |
//! |--------|------|-----------|-------------------|
//! | 0      | 8    | Signature | `"Art-Net\0"`     |
//! | 8      | 2    | OpCode    | little-endian u16 |
//! | 10     | 4    | ProtVer, Sequence, Physical (ignored) |
//! | 14     | 2    | Universe  | little-endian u16 |
//! | 16     | 2    | Length    | big-endian u16    |
//! | 18     | n    | DMX data  | raw bytes         |

/// The default UDP port for Art-Net.
pub const ARTNET_PORT: u16 = 6454;

/// The packet signature, including the trailing NUL.
pub const SIGNATURE: &[u8; 8] = b"Art-Net\0";

/// The ArtDmx opcode.
pub const OP_DMX: u16 = 0x5000;

/// Size of the ArtDmx header that precedes the DMX data.
pub const HEADER_SIZE: usize = 18;

/// A universe filter that matches every universe.
pub const ANY_UNIVERSE: i32 = -1;

/// Reasons an incoming datagram is not accepted as an ArtDmx frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Rejection {
    #[error("packet shorter than the 18 byte ArtDmx header")]
    TooShort,
    #[error("packet does not start with the Art-Net signature")]
    BadSignature,
    #[error("opcode {0:#06x} is not ArtDmx")]
    WrongOpcode(u16),
    #[error("universe {0} does not match the configured universe")]
    UniverseMismatch(u16),
    #[error("ArtDmx length field is zero")]
    EmptyPayload,
    #[error("ArtDmx declares {declared} bytes but only {available} are present")]
    Truncated { declared: usize, available: usize },
}

impl Rejection {
    /// Rejections that are expected on a shared Art-Net port and aren't worth reporting.
    pub fn is_routine(&self) -> bool {
        matches!(self, Rejection::WrongOpcode(_))
    }
}

/// A validated ArtDmx frame. The payload is copied out of the receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtDmxFrame {
    universe: u16,
    payload: Vec<u8>,
}

impl ArtDmxFrame {
    /// The universe the frame was addressed to.
    pub fn universe(&self) -> u16 {
        self.universe
    }

    /// The DMX channel data, exactly as long as the header declares. This is at least one
    /// byte and may exceed a universe; [crate::dmx::DmxBuffer] keeps the first 512.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the frame and returns the channel data.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Decodes an ArtDmx packet. A `universe_filter` of [ANY_UNIVERSE] accepts every universe,
/// any other value must match the packet's universe exactly.
pub fn decode(bytes: &[u8], universe_filter: i32) -> Result<ArtDmxFrame, Rejection> {
    if bytes.len() < HEADER_SIZE {
        return Err(Rejection::TooShort);
    }

    if &bytes[0..8] != SIGNATURE {
        return Err(Rejection::BadSignature);
    }

    let opcode = u16::from_le_bytes([bytes[8], bytes[9]]);
    if opcode != OP_DMX {
        return Err(Rejection::WrongOpcode(opcode));
    }

    let universe = u16::from_le_bytes([bytes[14], bytes[15]]);
    if universe_filter != ANY_UNIVERSE && i32::from(universe) != universe_filter {
        return Err(Rejection::UniverseMismatch(universe));
    }

    // The length is the only big-endian field in the header.
    let length = usize::from(u16::from_be_bytes([bytes[16], bytes[17]]));
    if length == 0 {
        return Err(Rejection::EmptyPayload);
    }

    let available = bytes.len() - HEADER_SIZE;
    if available < length {
        return Err(Rejection::Truncated {
            declared: length,
            available,
        });
    }

    Ok(ArtDmxFrame {
        universe,
        payload: bytes[HEADER_SIZE..HEADER_SIZE + length].to_vec(),
    })
}

#[cfg(test)]
mod test {
    use crate::testutil::artdmx_packet;

    use super::*;

    #[test]
    fn test_too_short() {
        for len in 0..HEADER_SIZE {
            let packet = vec![0u8; len];
            assert_eq!(Err(Rejection::TooShort), decode(&packet, ANY_UNIVERSE));
        }

        // Even a valid signature doesn't help if the header is cut off.
        let mut packet = artdmx_packet(0, &[1, 2, 3]);
        packet.truncate(HEADER_SIZE - 1);
        assert_eq!(Err(Rejection::TooShort), decode(&packet, ANY_UNIVERSE));
    }

    #[test]
    fn test_bad_signature() {
        let mut packet = artdmx_packet(0, &[1, 2, 3]);
        packet[7] = b'!';
        assert_eq!(Err(Rejection::BadSignature), decode(&packet, ANY_UNIVERSE));

        let mut packet = artdmx_packet(0, &[1, 2, 3]);
        packet[0] = b'a';
        assert_eq!(Err(Rejection::BadSignature), decode(&packet, ANY_UNIVERSE));
    }

    #[test]
    fn test_wrong_opcode() {
        // ArtPoll.
        let mut packet = artdmx_packet(0, &[1, 2, 3]);
        packet[8..10].copy_from_slice(&0x2000u16.to_le_bytes());
        let result = decode(&packet, ANY_UNIVERSE);
        assert_eq!(Err(Rejection::WrongOpcode(0x2000)), result);
        assert!(result.unwrap_err().is_routine());

        // The opcode is little-endian, so 0x0050 is not ArtDmx.
        let mut packet = artdmx_packet(0, &[1, 2, 3]);
        packet[8..10].copy_from_slice(&[0x50, 0x00]);
        assert_eq!(Err(Rejection::WrongOpcode(0x0050)), decode(&packet, ANY_UNIVERSE));
    }

    #[test]
    fn test_universe_filter() {
        let packet = artdmx_packet(5, &[1, 2, 3]);

        assert_eq!(5, decode(&packet, ANY_UNIVERSE).unwrap().universe());
        assert_eq!(5, decode(&packet, 5).unwrap().universe());
        assert_eq!(Err(Rejection::UniverseMismatch(5)), decode(&packet, 0));
        assert!(!Rejection::UniverseMismatch(5).is_routine());

        let packet = artdmx_packet(u16::MAX, &[1]);
        assert_eq!(u16::MAX, decode(&packet, 65535).unwrap().universe());
    }

    #[test]
    fn test_empty_payload() {
        let packet = artdmx_packet(0, &[]);
        assert_eq!(Err(Rejection::EmptyPayload), decode(&packet, ANY_UNIVERSE));
    }

    #[test]
    fn test_truncated() {
        let mut packet = artdmx_packet(0, &[1, 2, 3, 4]);
        packet.truncate(HEADER_SIZE + 2);
        assert_eq!(
            Err(Rejection::Truncated {
                declared: 4,
                available: 2
            }),
            decode(&packet, ANY_UNIVERSE)
        );
    }

    #[test]
    fn test_payload_is_exact_slice() {
        let data: Vec<u8> = (0..=255u8).chain(0..=255u8).collect();
        assert_eq!(512, data.len());

        for len in [1usize, 2, 3, 100, 511, 512] {
            let packet = artdmx_packet(0, &data[..len]);
            assert_eq!(HEADER_SIZE + len, packet.len());
            let frame = decode(&packet, ANY_UNIVERSE).unwrap();
            assert_eq!(&packet[HEADER_SIZE..HEADER_SIZE + len], frame.payload());
        }
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut packet = artdmx_packet(0, &[9, 8, 7]);
        packet.extend_from_slice(&[1, 1, 1, 1]);
        assert_eq!(vec![9, 8, 7], decode(&packet, ANY_UNIVERSE).unwrap().into_payload());
    }

    #[test]
    fn test_universe_little_endian_length_big_endian() {
        // Universe bytes 02 01 -> 0x0102 (258). Length bytes 00 04 -> 4.
        // Reading the length as little-endian would give 1024, which would be truncated,
        // and reading the universe as big-endian would give 513.
        let mut packet = Vec::new();
        packet.extend_from_slice(SIGNATURE);
        packet.extend_from_slice(&[0x00, 0x50]);
        packet.extend_from_slice(&[0x00, 0x0e, 0x00, 0x00]);
        packet.extend_from_slice(&[0x02, 0x01]);
        packet.extend_from_slice(&[0x00, 0x04]);
        packet.extend_from_slice(&[10, 20, 30, 40]);

        let frame = decode(&packet, 258).unwrap();
        assert_eq!(258, frame.universe());
        assert_eq!(&[10, 20, 30, 40], frame.payload());
        assert_eq!(Err(Rejection::UniverseMismatch(258)), decode(&packet, 513));
    }

    #[test]
    fn test_long_payload_is_not_clamped() {
        let data = vec![7u8; 600];
        let frame = decode(&artdmx_packet(0, &data), ANY_UNIVERSE).unwrap();
        assert_eq!(600, frame.payload().len());
    }

    #[test]
    fn test_payload_does_not_alias_input() {
        let mut packet = artdmx_packet(0, &[1, 2, 3]);
        let frame = decode(&packet, ANY_UNIVERSE).unwrap();
        packet[HEADER_SIZE] = 99;
        assert_eq!(&[1, 2, 3], frame.payload());
    }
}
