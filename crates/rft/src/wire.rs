// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet codec for the two on-wire header dialects.
//!
//! Both dialects carry the same logical packet - flag, 16-bit big-endian
//! sequence number, payload - but lay the header out differently:
//!
//! | Dialect | Message | Layout |
//! |---------|---------|--------|
//! | [`stop_wait`] | data | `seq:u16be, eof:u8(0/1)`, payload |
//! | [`stop_wait`] | ack | `seq:u16be` |
//! | [`windowed`] | data | `flag:u8(0=data, 255=eof), seq:u16be`, payload |
//! | [`windowed`] | ack | `flag:u8(=1), seq:u16be` |
//!
//! Decoding is strict: a datagram shorter than its header, an unknown flag
//! byte, or an oversized payload is a reported [`Error`](crate::Error), never
//! silently tolerated.

use crate::config::{
    DATA_HEADER_LEN, FLAG_ACK, FLAG_DATA, FLAG_EOF, MAX_PAYLOAD, STOP_WAIT_ACK_LEN,
    WINDOWED_ACK_LEN,
};
use crate::{Error, Result};

/// A decoded data packet, identical across dialects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    /// Wire sequence number.
    pub seq: u16,
    /// Marks the final packet of the transfer.
    pub eof: bool,
    /// Up to [`MAX_PAYLOAD`] bytes of file content.
    pub payload: Vec<u8>,
}

fn check_payload(len: usize) -> Result<()> {
    if len > MAX_PAYLOAD {
        return Err(Error::PayloadTooLarge(len));
    }
    Ok(())
}

/// Codec for the basic / stop-and-wait dialect.
pub mod stop_wait {
    use super::*;

    /// Encode a data packet: `seq:u16be, eof:u8`, payload.
    pub fn encode_data(pkt: &DataPacket) -> Vec<u8> {
        debug_assert!(pkt.payload.len() <= MAX_PAYLOAD);
        let mut buf = Vec::with_capacity(DATA_HEADER_LEN + pkt.payload.len());
        buf.extend_from_slice(&pkt.seq.to_be_bytes());
        buf.push(u8::from(pkt.eof));
        buf.extend_from_slice(&pkt.payload);
        buf
    }

    /// Decode a data packet, validating header length and the eof byte.
    pub fn decode_data(buf: &[u8]) -> Result<DataPacket> {
        if buf.len() < DATA_HEADER_LEN {
            return Err(Error::Truncated {
                kind: "data",
                expected: DATA_HEADER_LEN,
                got: buf.len(),
            });
        }
        let seq = u16::from_be_bytes([buf[0], buf[1]]);
        let eof = match buf[2] {
            0 => false,
            1 => true,
            flag => return Err(Error::InvalidFlag { kind: "data", flag }),
        };
        check_payload(buf.len() - DATA_HEADER_LEN)?;
        Ok(DataPacket {
            seq,
            eof,
            payload: buf[DATA_HEADER_LEN..].to_vec(),
        })
    }

    /// Encode an ack: bare `seq:u16be`.
    pub fn encode_ack(seq: u16) -> [u8; STOP_WAIT_ACK_LEN] {
        seq.to_be_bytes()
    }

    /// Decode an ack.
    pub fn decode_ack(buf: &[u8]) -> Result<u16> {
        if buf.len() < STOP_WAIT_ACK_LEN {
            return Err(Error::Truncated {
                kind: "ack",
                expected: STOP_WAIT_ACK_LEN,
                got: buf.len(),
            });
        }
        Ok(u16::from_be_bytes([buf[0], buf[1]]))
    }
}

/// Codec for the go-back-n / selective-repeat dialect.
pub mod windowed {
    use super::*;

    /// Encode a data packet: `flag:u8, seq:u16be`, payload.
    pub fn encode_data(pkt: &DataPacket) -> Vec<u8> {
        debug_assert!(pkt.payload.len() <= MAX_PAYLOAD);
        let mut buf = Vec::with_capacity(DATA_HEADER_LEN + pkt.payload.len());
        buf.push(if pkt.eof { FLAG_EOF } else { FLAG_DATA });
        buf.extend_from_slice(&pkt.seq.to_be_bytes());
        buf.extend_from_slice(&pkt.payload);
        buf
    }

    /// Decode a data packet, validating header length and the flag byte.
    pub fn decode_data(buf: &[u8]) -> Result<DataPacket> {
        if buf.len() < DATA_HEADER_LEN {
            return Err(Error::Truncated {
                kind: "data",
                expected: DATA_HEADER_LEN,
                got: buf.len(),
            });
        }
        let eof = match buf[0] {
            FLAG_DATA => false,
            FLAG_EOF => true,
            flag => return Err(Error::InvalidFlag { kind: "data", flag }),
        };
        let seq = u16::from_be_bytes([buf[1], buf[2]]);
        check_payload(buf.len() - DATA_HEADER_LEN)?;
        Ok(DataPacket {
            seq,
            eof,
            payload: buf[DATA_HEADER_LEN..].to_vec(),
        })
    }

    /// Encode an ack: `flag:u8(=1), seq:u16be`.
    pub fn encode_ack(seq: u16) -> [u8; WINDOWED_ACK_LEN] {
        let seq_bytes = seq.to_be_bytes();
        [FLAG_ACK, seq_bytes[0], seq_bytes[1]]
    }

    /// Decode an ack, validating the flag byte.
    pub fn decode_ack(buf: &[u8]) -> Result<u16> {
        if buf.len() < WINDOWED_ACK_LEN {
            return Err(Error::Truncated {
                kind: "ack",
                expected: WINDOWED_ACK_LEN,
                got: buf.len(),
            });
        }
        if buf[0] != FLAG_ACK {
            return Err(Error::InvalidFlag {
                kind: "ack",
                flag: buf[0],
            });
        }
        Ok(u16::from_be_bytes([buf[1], buf[2]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(seq: u16, eof: bool, len: usize) -> DataPacket {
        DataPacket {
            seq,
            eof,
            payload: (0..len).map(|i| (i % 251) as u8).collect(),
        }
    }

    #[test]
    fn test_stop_wait_data_layout() {
        let buf = stop_wait::encode_data(&sample(0x0102, true, 2));
        assert_eq!(&buf[..3], &[0x01, 0x02, 0x01]);
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_stop_wait_data_round_trip() {
        for (seq, eof, len) in [(0, false, 0), (65535, true, 1024), (904, false, 904)] {
            let pkt = sample(seq, eof, len);
            let decoded = stop_wait::decode_data(&stop_wait::encode_data(&pkt)).unwrap();
            assert_eq!(decoded, pkt);
        }
    }

    #[test]
    fn test_stop_wait_ack_round_trip() {
        for seq in [0u16, 1, 65535] {
            assert_eq!(stop_wait::decode_ack(&stop_wait::encode_ack(seq)).unwrap(), seq);
        }
    }

    #[test]
    fn test_stop_wait_truncated_data_rejected() {
        let err = stop_wait::decode_data(&[0x00, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                kind: "data",
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn test_stop_wait_bad_eof_byte_rejected() {
        let err = stop_wait::decode_data(&[0x00, 0x01, 0x07]).unwrap_err();
        assert!(matches!(err, Error::InvalidFlag { flag: 0x07, .. }));
    }

    #[test]
    fn test_stop_wait_truncated_ack_rejected() {
        assert!(stop_wait::decode_ack(&[0x05]).is_err());
        assert!(stop_wait::decode_ack(&[]).is_err());
    }

    #[test]
    fn test_windowed_data_layout() {
        let buf = windowed::encode_data(&sample(0x0102, false, 1));
        assert_eq!(&buf[..3], &[FLAG_DATA, 0x01, 0x02]);

        let buf = windowed::encode_data(&sample(4, true, 0));
        assert_eq!(&buf[..3], &[FLAG_EOF, 0x00, 0x04]);
    }

    #[test]
    fn test_windowed_data_round_trip() {
        for (seq, eof, len) in [(0, false, 1024), (4, true, 904), (65535, false, 0)] {
            let pkt = sample(seq, eof, len);
            let decoded = windowed::decode_data(&windowed::encode_data(&pkt)).unwrap();
            assert_eq!(decoded, pkt);
        }
    }

    #[test]
    fn test_windowed_unknown_data_flag_rejected() {
        let err = windowed::decode_data(&[0x02, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, Error::InvalidFlag { flag: 0x02, .. }));
    }

    #[test]
    fn test_windowed_ack_layout_and_round_trip() {
        let buf = windowed::encode_ack(0x0304);
        assert_eq!(buf, [FLAG_ACK, 0x03, 0x04]);
        assert_eq!(windowed::decode_ack(&buf).unwrap(), 0x0304);
    }

    #[test]
    fn test_windowed_ack_wrong_flag_rejected() {
        let err = windowed::decode_ack(&[FLAG_EOF, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, Error::InvalidFlag { kind: "ack", .. }));
    }

    #[test]
    fn test_windowed_ack_truncated_rejected() {
        assert!(windowed::decode_ack(&[FLAG_ACK, 0x00]).is_err());
    }
}
