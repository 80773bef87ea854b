// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Packet framing and CBOR helpers.
//!
//! Packet layout:
//!
//! ``MAGIC(4) || VERSION(2) || FLAGS(2) || LENGTH(4) || PAYLOAD || CHECKSUM(32)``
//!
//! * PAYLOAD is a CBOR [`RequestEnvelope`] (FLAGS = [`FLAG_REQUEST`]) or
//!   [`ResponseEnvelope`] (FLAGS = [`FLAG_RESPONSE`])
//! * CHECKSUM = blake3-256 over HEADER (first 12 bytes) || PAYLOAD

use std::io::{self, Read};

use blake3::Hasher;
use ciborium::Value;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{RequestEnvelope, ResponseEnvelope};

/// Protocol magic constant "MLNK".
pub const MAGIC: [u8; 4] = *b"MLNK";
/// Wire protocol version (big-endian u16).
pub const VERSION: u16 = 0x0001;
/// Flags value of a request packet.
pub const FLAG_REQUEST: u16 = 0x0000;
/// Flags value of a response packet.
pub const FLAG_RESPONSE: u16 = 0x0001;
/// Header length in bytes.
pub const HEADER_LEN: usize = 12;
/// Checksum length in bytes.
pub const CHECKSUM_LEN: usize = 32;
/// Default upper bound on a payload accepted from a peer.
pub const DEFAULT_MAX_PAYLOAD: usize = 8 * 1024 * 1024;

/// Framing and codec failures.
#[derive(Debug, Error)]
pub enum WireError {
    /// Fewer bytes than the header announces.
    #[error("incomplete packet: need {needed} bytes, have {have}")]
    Incomplete {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        have: usize,
    },
    /// Magic did not match [`MAGIC`].
    #[error("bad magic")]
    BadMagic,
    /// Version other than [`VERSION`].
    #[error("unsupported version {0}")]
    UnsupportedVersion(u16),
    /// Flags did not match the expected packet direction.
    #[error("unexpected flags {found:#06x} (expected {expected:#06x})")]
    UnexpectedFlags {
        /// Flags required.
        expected: u16,
        /// Flags found.
        found: u16,
    },
    /// blake3 checksum did not match.
    #[error("checksum mismatch")]
    ChecksumMismatch,
    /// Payload larger than the configured bound.
    #[error("payload of {len} bytes exceeds limit {max}")]
    PayloadTooLarge {
        /// Announced payload length.
        len: usize,
        /// Configured bound.
        max: usize,
    },
    /// CBOR encoding failed.
    #[error("encode: {0}")]
    Encode(String),
    /// CBOR decoding failed.
    #[error("decode: {0}")]
    Decode(String),
    /// Underlying stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Encode to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).map_err(|e| WireError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Decode from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    ciborium::de::from_reader(bytes).map_err(|e| WireError::Decode(e.to_string()))
}

/// Convert a message into a dynamic CBOR value.
pub fn to_value<T: Serialize>(value: &T) -> Result<Value, WireError> {
    Value::serialized(value).map_err(|e| WireError::Encode(e.to_string()))
}

/// Convert a dynamic CBOR value into a message.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, WireError> {
    value
        .deserialized()
        .map_err(|e| WireError::Decode(e.to_string()))
}

/// A full packet (header + payload + checksum).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Raw header.
    pub header: [u8; HEADER_LEN],
    /// CBOR payload bytes.
    pub payload: Vec<u8>,
    /// blake3 checksum over header||payload.
    pub checksum: [u8; CHECKSUM_LEN],
}

impl Packet {
    /// Build a packet around a CBOR payload.
    pub fn from_payload(flags: u16, payload: Vec<u8>) -> Result<Self, WireError> {
        let len = u32::try_from(payload.len()).map_err(|_| WireError::PayloadTooLarge {
            len: payload.len(),
            max: u32::MAX as usize,
        })?;
        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(&MAGIC);
        header[4..6].copy_from_slice(&VERSION.to_be_bytes());
        header[6..8].copy_from_slice(&flags.to_be_bytes());
        header[8..12].copy_from_slice(&len.to_be_bytes());

        let checksum = checksum(&header, &payload);
        Ok(Self {
            header,
            payload,
            checksum,
        })
    }

    /// Flags carried in the header.
    pub fn flags(&self) -> u16 {
        u16::from_be_bytes([self.header[6], self.header[7]])
    }

    /// Serialize the packet to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len() + CHECKSUM_LEN);
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.checksum);
        out
    }

    /// Parse one packet from the front of `bytes`, returning it and the
    /// number of bytes consumed.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), WireError> {
        let total = frame_len(bytes)?;
        if bytes.len() < total {
            return Err(WireError::Incomplete {
                needed: total,
                have: bytes.len(),
            });
        }
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&bytes[..HEADER_LEN]);
        let payload = bytes[HEADER_LEN..total - CHECKSUM_LEN].to_vec();
        let mut sum = [0u8; CHECKSUM_LEN];
        sum.copy_from_slice(&bytes[total - CHECKSUM_LEN..total]);

        if checksum(&header, &payload) != sum {
            return Err(WireError::ChecksumMismatch);
        }
        Ok((
            Self {
                header,
                payload,
                checksum: sum,
            },
            total,
        ))
    }
}

fn checksum(header: &[u8], payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Hasher::new();
    hasher.update(header);
    hasher.update(payload);
    *hasher.finalize().as_bytes()
}

/// Total packet length announced by a header, after validating magic and
/// version. `bytes` must hold at least the header.
pub fn frame_len(bytes: &[u8]) -> Result<usize, WireError> {
    if bytes.len() < HEADER_LEN {
        return Err(WireError::Incomplete {
            needed: HEADER_LEN,
            have: bytes.len(),
        });
    }
    if bytes[0..4] != MAGIC {
        return Err(WireError::BadMagic);
    }
    let version = u16::from_be_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }
    let len = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    Ok(HEADER_LEN + len + CHECKSUM_LEN)
}

fn encode_envelope<T: Serialize>(flags: u16, envelope: &T) -> Result<Vec<u8>, WireError> {
    Ok(Packet::from_payload(flags, to_cbor(envelope)?)?.to_bytes())
}

fn decode_envelope<T: DeserializeOwned>(
    expected_flags: u16,
    bytes: &[u8],
) -> Result<(T, usize), WireError> {
    let (packet, used) = Packet::parse(bytes)?;
    let found = packet.flags();
    if found != expected_flags {
        return Err(WireError::UnexpectedFlags {
            expected: expected_flags,
            found,
        });
    }
    Ok((from_cbor(&packet.payload)?, used))
}

/// Encode a request envelope into packet bytes.
pub fn encode_request(envelope: &RequestEnvelope) -> Result<Vec<u8>, WireError> {
    encode_envelope(FLAG_REQUEST, envelope)
}

/// Decode a request packet, returning the envelope and bytes consumed.
pub fn decode_request(bytes: &[u8]) -> Result<(RequestEnvelope, usize), WireError> {
    decode_envelope(FLAG_REQUEST, bytes)
}

/// Encode a response envelope into packet bytes.
pub fn encode_response(envelope: &ResponseEnvelope) -> Result<Vec<u8>, WireError> {
    encode_envelope(FLAG_RESPONSE, envelope)
}

/// Decode a response packet, returning the envelope and bytes consumed.
pub fn decode_response(bytes: &[u8]) -> Result<(ResponseEnvelope, usize), WireError> {
    decode_envelope(FLAG_RESPONSE, bytes)
}

/// Read one whole packet from a blocking stream.
///
/// Returns `Ok(None)` on a clean end of stream before the first header byte.
/// Payloads larger than `max_payload` are rejected before they are read.
pub fn read_frame<R: Read>(reader: &mut R, max_payload: usize) -> Result<Option<Vec<u8>>, WireError> {
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(WireError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed inside packet header",
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    let total = frame_len(&header)?;
    let payload_len = total - HEADER_LEN - CHECKSUM_LEN;
    if payload_len > max_payload {
        return Err(WireError::PayloadTooLarge {
            len: payload_len,
            max: max_payload,
        });
    }
    let mut frame = vec![0u8; total];
    frame[..HEADER_LEN].copy_from_slice(&header);
    reader.read_exact(&mut frame[HEADER_LEN..])?;
    Ok(Some(frame))
}

// --- Unit tests -----------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::Status;
    use hex::FromHex;

    fn request() -> RequestEnvelope {
        RequestEnvelope {
            method: "ApiItem/name".into(),
            call_id: 7,
            payload: Value::Text("payload".into()),
        }
    }

    #[test]
    fn header_layout_matches_vector() {
        let packet = Packet::from_payload(FLAG_RESPONSE, vec![0xa0]).unwrap();
        let expected = Vec::from_hex("4d4c4e4b0001000100000001").unwrap();
        assert_eq!(packet.header.to_vec(), expected);
        assert_eq!(packet.to_bytes().len(), HEADER_LEN + 1 + CHECKSUM_LEN);
    }

    #[test]
    fn request_packet_decodes_and_reports_consumed_bytes() {
        let mut bytes = encode_request(&request()).unwrap();
        let len = bytes.len();
        bytes.extend_from_slice(b"trailing");
        let (env, used) = decode_request(&bytes).unwrap();
        assert_eq!(env, request());
        assert_eq!(used, len);
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let mut bytes = encode_request(&request()).unwrap();
        bytes[HEADER_LEN + 2] ^= 0xff;
        assert!(matches!(
            decode_request(&bytes),
            Err(WireError::ChecksumMismatch)
        ));
    }

    #[test]
    fn response_packet_is_not_a_request() {
        let bytes = encode_response(&ResponseEnvelope {
            call_id: 1,
            status: Status::ok(),
            payload: Value::Null,
        })
        .unwrap();
        assert!(matches!(
            decode_request(&bytes),
            Err(WireError::UnexpectedFlags {
                expected: FLAG_REQUEST,
                found: FLAG_RESPONSE
            })
        ));
    }

    #[test]
    fn short_input_is_incomplete() {
        let bytes = encode_request(&request()).unwrap();
        assert!(matches!(
            decode_request(&bytes[..bytes.len() - 1]),
            Err(WireError::Incomplete { .. })
        ));
        assert!(matches!(frame_len(b"MLN"), Err(WireError::Incomplete { .. })));
        assert!(matches!(
            frame_len(b"NOPE\x00\x01\x00\x00\x00\x00\x00\x00"),
            Err(WireError::BadMagic)
        ));
    }

    #[test]
    fn read_frame_reads_back_to_back_packets() {
        let mut stream = encode_request(&request()).unwrap();
        let first_len = stream.len();
        stream.extend(encode_request(&request()).unwrap());
        let mut cursor = std::io::Cursor::new(stream);

        let first = read_frame(&mut cursor, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(first.len(), first_len);
        assert!(read_frame(&mut cursor, DEFAULT_MAX_PAYLOAD).unwrap().is_some());
        assert!(read_frame(&mut cursor, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn read_frame_rejects_oversized_payload() {
        let bytes = encode_request(&request()).unwrap();
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(matches!(
            read_frame(&mut cursor, 4),
            Err(WireError::PayloadTooLarge { max: 4, .. })
        ));
    }
}
