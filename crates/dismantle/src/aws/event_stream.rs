//! Incremental decoder for `application/vnd.amazon.eventstream` bodies.
//!
//! Each message on the wire is
//!
//! ```text
//! [total len: u32][headers len: u32][prelude crc: u32][headers][payload][message crc: u32]
//! ```
//!
//! Both CRCs are CRC-32 (IEEE). The prelude CRC covers the two length fields
//! and the message CRC covers everything before it. Network reads do not line
//! up with message boundaries, so bytes are buffered until a whole message is
//! available.
use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

const PRELUDE_LEN: usize = 12;
const CRC_LEN: usize = 4;
const MIN_MESSAGE_LEN: usize = PRELUDE_LEN + CRC_LEN;
const MAX_MESSAGE_LEN: usize = 16 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("invalid message length {0}")]
    InvalidLength(usize),

    #[error("headers length {headers} exceeds message length {total}")]
    HeadersTooLong { headers: usize, total: usize },

    #[error("truncated header block")]
    TruncatedHeader,

    #[error("unknown header value type {0}")]
    UnknownHeaderType(u8),

    #[error("header name is not valid UTF-8")]
    InvalidHeaderName,

    #[error("{part} checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch {
        part: &'static str,
        expected: u32,
        actual: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Bytes(Bytes),
    String(String),
    Timestamp(i64),
    Uuid([u8; 16]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub headers: Vec<(String, HeaderValue)>,
    pub payload: Bytes,
}

impl Frame {
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|(key, value)| match value {
            HeaderValue::String(s) if key == name => Some(s.as_str()),
            _ => None,
        })
    }

    /// `event`, `exception` or `error`
    pub fn message_type(&self) -> Option<&str> {
        self.header_str(":message-type")
    }

    pub fn event_type(&self) -> Option<&str> {
        self.header_str(":event-type")
    }
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// True when no partial message is pending.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Pop the next complete message, or `None` if more bytes are needed.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        if self.buffer.len() < PRELUDE_LEN {
            return Ok(None);
        }

        let total = read_u32(&self.buffer, 0) as usize;
        let headers_len = read_u32(&self.buffer, 4) as usize;
        verify_crc("prelude", &self.buffer[..8], read_u32(&self.buffer, 8))?;

        if !(MIN_MESSAGE_LEN..=MAX_MESSAGE_LEN).contains(&total) {
            return Err(FrameError::InvalidLength(total));
        }
        if headers_len > total - MIN_MESSAGE_LEN {
            return Err(FrameError::HeadersTooLong {
                headers: headers_len,
                total,
            });
        }
        if self.buffer.len() < total {
            return Ok(None);
        }

        let crc_at = total - CRC_LEN;
        verify_crc(
            "message",
            &self.buffer[..crc_at],
            read_u32(&self.buffer, crc_at),
        )?;

        let mut message = self.buffer.split_to(total).freeze();
        message.advance(PRELUDE_LEN);
        let header_block = message.split_to(headers_len);
        let payload = message.split_to(total - MIN_MESSAGE_LEN - headers_len);

        Ok(Some(Frame {
            headers: parse_headers(header_block)?,
            payload,
        }))
    }
}

fn read_u32(buffer: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buffer[at], buffer[at + 1], buffer[at + 2], buffer[at + 3]])
}

fn verify_crc(part: &'static str, data: &[u8], expected: u32) -> Result<(), FrameError> {
    let actual = crc32fast::hash(data);
    if actual != expected {
        return Err(FrameError::ChecksumMismatch {
            part,
            expected,
            actual,
        });
    }
    Ok(())
}

fn parse_headers(mut block: Bytes) -> Result<Vec<(String, HeaderValue)>, FrameError> {
    let mut headers = Vec::new();
    while block.has_remaining() {
        let name_len = take(&mut block, 1)?.get_u8() as usize;
        let name = String::from_utf8(take(&mut block, name_len)?.to_vec())
            .map_err(|_| FrameError::InvalidHeaderName)?;
        let value_type = take(&mut block, 1)?.get_u8();
        let value = match value_type {
            0 => HeaderValue::Bool(true),
            1 => HeaderValue::Bool(false),
            2 => HeaderValue::Byte(take(&mut block, 1)?.get_i8()),
            3 => HeaderValue::Short(take(&mut block, 2)?.get_i16()),
            4 => HeaderValue::Int(take(&mut block, 4)?.get_i32()),
            5 => HeaderValue::Long(take(&mut block, 8)?.get_i64()),
            6 => {
                let len = take(&mut block, 2)?.get_u16() as usize;
                HeaderValue::Bytes(take(&mut block, len)?)
            }
            7 => {
                let len = take(&mut block, 2)?.get_u16() as usize;
                let raw = take(&mut block, len)?;
                HeaderValue::String(String::from_utf8_lossy(&raw).into_owned())
            }
            8 => HeaderValue::Timestamp(take(&mut block, 8)?.get_i64()),
            9 => {
                let mut uuid = [0u8; 16];
                take(&mut block, 16)?.copy_to_slice(&mut uuid);
                HeaderValue::Uuid(uuid)
            }
            other => return Err(FrameError::UnknownHeaderType(other)),
        };
        headers.push((name, value));
    }
    Ok(headers)
}

fn take(block: &mut Bytes, len: usize) -> Result<Bytes, FrameError> {
    if block.remaining() < len {
        return Err(FrameError::TruncatedHeader);
    }
    Ok(block.split_to(len))
}

/// Encoder used by tests to produce wire frames.
#[cfg(test)]
pub(crate) fn encode_frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
    let mut header_block = Vec::new();
    for (name, value) in headers {
        header_block.push(name.len() as u8);
        header_block.extend_from_slice(name.as_bytes());
        header_block.push(7);
        header_block.extend_from_slice(&(value.len() as u16).to_be_bytes());
        header_block.extend_from_slice(value.as_bytes());
    }

    let mut frame = Vec::new();
    frame.extend_from_slice(&header_block);
    frame.extend_from_slice(payload);
    seal(frame, header_block.len())
}

/// Prepend a prelude to `body` (headers then payload) and append the message CRC.
#[cfg(test)]
pub(crate) fn seal(body: Vec<u8>, headers_len: usize) -> Vec<u8> {
    let total = MIN_MESSAGE_LEN + body.len();
    let mut frame = Vec::with_capacity(total);
    frame.extend_from_slice(&(total as u32).to_be_bytes());
    frame.extend_from_slice(&(headers_len as u32).to_be_bytes());
    let prelude_crc = crc32fast::hash(&frame);
    frame.extend_from_slice(&prelude_crc.to_be_bytes());
    frame.extend_from_slice(&body);
    let message_crc = crc32fast::hash(&frame);
    frame.extend_from_slice(&message_crc.to_be_bytes());
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_frame(payload: &str) -> Vec<u8> {
        encode_frame(
            &[
                (":message-type", "event"),
                (":event-type", "chunk"),
                (":content-type", "application/json"),
            ],
            payload.as_bytes(),
        )
    }

    #[test]
    fn test_decodes_single_frame() -> Result<(), FrameError> {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&chunk_frame(r#"{"bytes":"aGk="}"#));

        let frame = decoder.next_frame()?.expect("complete frame");
        assert_eq!(frame.message_type(), Some("event"));
        assert_eq!(frame.event_type(), Some("chunk"));
        assert_eq!(frame.payload.as_ref(), br#"{"bytes":"aGk="}"#);
        assert!(decoder.next_frame()?.is_none());
        assert!(decoder.is_empty());
        Ok(())
    }

    #[test]
    fn test_frames_split_across_reads() -> Result<(), FrameError> {
        let mut wire = chunk_frame("first");
        wire.extend(chunk_frame("second"));

        let mut decoder = FrameDecoder::new();
        let mut payloads = Vec::new();
        for byte in wire {
            decoder.extend(&[byte]);
            while let Some(frame) = decoder.next_frame()? {
                payloads.push(String::from_utf8(frame.payload.to_vec()).unwrap());
            }
        }

        assert_eq!(payloads, vec!["first", "second"]);
        assert!(decoder.is_empty());
        Ok(())
    }

    #[test]
    fn test_partial_frame_waits_for_more() -> Result<(), FrameError> {
        let wire = chunk_frame("payload");
        let mut decoder = FrameDecoder::new();
        decoder.extend(&wire[..wire.len() - 1]);
        assert!(decoder.next_frame()?.is_none());
        assert!(!decoder.is_empty());

        decoder.extend(&wire[wire.len() - 1..]);
        assert!(decoder.next_frame()?.is_some());
        Ok(())
    }

    fn prelude(total: u32, headers_len: u32) -> Vec<u8> {
        let mut wire = total.to_be_bytes().to_vec();
        wire.extend(headers_len.to_be_bytes());
        let crc = crc32fast::hash(&wire);
        wire.extend(crc.to_be_bytes());
        wire
    }

    #[test]
    fn test_rejects_impossible_lengths() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&prelude(4, 0));
        assert_eq!(decoder.next_frame(), Err(FrameError::InvalidLength(4)));

        let mut decoder = FrameDecoder::new();
        decoder.extend(&prelude(20, 10));
        assert_eq!(
            decoder.next_frame(),
            Err(FrameError::HeadersTooLong {
                headers: 10,
                total: 20
            })
        );
    }

    #[test]
    fn test_non_string_headers() -> Result<(), FrameError> {
        // bool, int32 and bytes headers
        let mut header_block = vec![1, b'a', 0];
        header_block.extend([1, b'b', 4, 0, 0, 0, 7]);
        header_block.extend([1, b'c', 6, 0, 2, 0xde, 0xad]);
        let headers_len = header_block.len();
        let wire = seal(header_block, headers_len);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&wire);
        let frame = decoder.next_frame()?.expect("complete frame");
        assert_eq!(
            frame.headers,
            vec![
                ("a".to_string(), HeaderValue::Bool(true)),
                ("b".to_string(), HeaderValue::Int(7)),
                (
                    "c".to_string(),
                    HeaderValue::Bytes(Bytes::from_static(&[0xde, 0xad]))
                ),
            ]
        );
        assert!(frame.payload.is_empty());
        Ok(())
    }

    #[test]
    fn test_corrupted_prelude_crc_is_rejected() {
        let mut wire = chunk_frame(r#"{"bytes":"aGk="}"#);
        wire[8..12].copy_from_slice(&[0xab; 4]);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&wire);
        assert!(matches!(
            decoder.next_frame(),
            Err(FrameError::ChecksumMismatch {
                part: "prelude",
                expected: 0xabababab,
                ..
            })
        ));
    }

    #[test]
    fn test_corrupted_message_crc_is_rejected() {
        let mut wire = chunk_frame(r#"{"bytes":"aGk="}"#);
        let end = wire.len();
        wire[end - 4..].copy_from_slice(&[0xcd; 4]);

        let mut decoder = FrameDecoder::new();
        decoder.extend(&wire);
        assert!(matches!(
            decoder.next_frame(),
            Err(FrameError::ChecksumMismatch { part: "message", .. })
        ));
    }

    #[test]
    fn test_corrupted_payload_is_rejected() {
        let mut wire = chunk_frame(r#"{"bytes":"aGk="}"#);
        let end = wire.len();
        wire[end - 6] ^= 0x01;

        let mut decoder = FrameDecoder::new();
        decoder.extend(&wire);
        assert!(matches!(
            decoder.next_frame(),
            Err(FrameError::ChecksumMismatch { part: "message", .. })
        ));
    }
}
