//! Gossip wire protocol
//!
//! Messages are JSON objects, one per line. `serde_json` escapes control
//! characters inside strings, so a serialized message never contains a raw
//! newline and `\n` can delimit frames.

use crate::error::{BlockchainError, Result};
use crate::network::Host;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Read};

/// Longest accepted frame, delimiter included
pub const MAX_FRAME_LEN: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireMessage {
    /// Handshake sent by the dialing side of every new link
    Welcome {
        #[serde(rename = "myPort")]
        my_port: u16,
        loopback: bool,
        #[serde(rename = "knownHosts")]
        known_hosts: Vec<Host>,
    },
    /// Free-text chat relayed between nodes
    Message {
        message: String,
        #[serde(rename = "myPort")]
        my_port: u16,
    },
}

impl WireMessage {
    /// Interpret a received payload. Unknown or missing `type` values are not
    /// ours to handle and yield `None`; a known type with a bad shape is logged.
    pub fn from_value(value: &Value) -> Option<WireMessage> {
        let kind = value.get("type")?.as_str()?;
        if kind != "welcome" && kind != "message" {
            return None;
        }
        match WireMessage::deserialize(value) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("Ignoring malformed {kind} message: {e}");
                None
            }
        }
    }
}

/// Serialize `payload` into one newline-terminated frame
pub fn encode_frame<T: Serialize>(payload: &T) -> Result<Vec<u8>> {
    let mut frame = serde_json::to_vec(payload)?;
    frame.push(b'\n');
    Ok(frame)
}

/// Parse one frame (without its delimiter) as a JSON document
pub fn decode_frame(frame: &[u8]) -> Result<Value> {
    serde_json::from_slice(frame)
        .map_err(|e| BlockchainError::Serialization(format!("Malformed frame: {e}")))
}

/// Reassembles newline-delimited frames from a byte stream, however the
/// stream happens to be chunked.
pub struct FrameReader<R> {
    reader: R,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Next frame without the trailing newline. `Ok(None)` on a clean end of
    /// stream; a trailing partial frame is logged and discarded. An oversized frame is an
    /// `InvalidData` error since the stream can no longer be resynchronised.
    pub fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            let mut frame = Vec::new();
            let read = (&mut self.reader)
                .take(MAX_FRAME_LEN)
                .read_until(b'\n', &mut frame)?;

            if read == 0 {
                return Ok(None);
            }
            if frame.last() != Some(&b'\n') {
                if read as u64 >= MAX_FRAME_LEN {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "frame exceeds maximum length",
                    ));
                }
                if !frame.iter().all(u8::is_ascii_whitespace) {
                    warn!("Stream ended inside a frame, dropping {read} trailing bytes");
                }
                return Ok(None);
            }

            frame.pop();
            if frame.last() == Some(&b'\r') {
                frame.pop();
            }
            if frame.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufReader, Cursor};

    /// Hands out at most `chunk` bytes per read, like a slow socket
    struct Trickle {
        data: Cursor<Vec<u8>>,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let len = buf.len().min(self.chunk);
            self.data.read(&mut buf[..len])
        }
    }

    #[test]
    fn test_welcome_wire_format() {
        let welcome = WireMessage::Welcome {
            my_port: 7001,
            loopback: false,
            known_hosts: vec![Host::new("127.0.0.1", 7002)],
        };
        assert_eq!(
            serde_json::to_value(&welcome).unwrap(),
            json!({
                "type": "welcome",
                "myPort": 7001,
                "loopback": false,
                "knownHosts": [{"host": "127.0.0.1", "port": 7002}],
            })
        );
    }

    #[test]
    fn test_from_value() {
        let chat = json!({"type": "message", "message": "hi", "myPort": 7001});
        assert_eq!(
            WireMessage::from_value(&chat),
            Some(WireMessage::Message {
                message: "hi".to_string(),
                my_port: 7001
            })
        );

        assert_eq!(WireMessage::from_value(&json!({"type": "block"})), None);
        assert_eq!(WireMessage::from_value(&json!({"message": "hi"})), None);
        assert_eq!(WireMessage::from_value(&json!({"type": "welcome"})), None);
    }

    #[test]
    fn test_encoded_frames_have_one_newline() {
        let frame = encode_frame(&WireMessage::Message {
            message: "line one\nline two".to_string(),
            my_port: 1,
        })
        .unwrap();
        assert_eq!(frame.iter().filter(|b| **b == b'\n').count(), 1);
        assert_eq!(frame.last(), Some(&b'\n'));
    }

    #[test]
    fn test_reassembles_split_and_merged_frames() {
        let mut bytes = encode_frame(&json!({"type": "message", "message": "a", "myPort": 1}))
            .unwrap();
        bytes.extend(encode_frame(&json!({"type": "message", "message": "b", "myPort": 1})).unwrap());
        bytes.extend(b"\n{\"partial\":");

        let trickle = Trickle {
            data: Cursor::new(bytes),
            chunk: 3,
        };
        let mut frames = FrameReader::new(BufReader::new(trickle));

        let first = decode_frame(&frames.next_frame().unwrap().unwrap()).unwrap();
        let second = decode_frame(&frames.next_frame().unwrap().unwrap()).unwrap();
        assert_eq!(first["message"], "a");
        assert_eq!(second["message"], "b");
        assert_eq!(frames.next_frame().unwrap(), None);
    }

    #[test]
    fn test_malformed_frame_does_not_stop_the_stream() {
        let input = b"{not json}\n{\"type\":\"message\",\"message\":\"ok\",\"myPort\":2}\n".to_vec();
        let mut frames = FrameReader::new(Cursor::new(input));

        assert!(decode_frame(&frames.next_frame().unwrap().unwrap()).is_err());
        let next = decode_frame(&frames.next_frame().unwrap().unwrap()).unwrap();
        assert_eq!(next["message"], "ok");
    }

    #[test]
    fn test_truncated_tail_ends_the_stream() {
        let mut input = encode_frame(&json!({"type": "message", "message": "ok", "myPort": 2}))
            .unwrap();
        input.extend(br#"{"type":"mess"#);
        let mut frames = FrameReader::new(Cursor::new(input));

        let complete = decode_frame(&frames.next_frame().unwrap().unwrap()).unwrap();
        assert_eq!(complete["message"], "ok");
        // The cut-off message is never handed out as a frame
        assert_eq!(frames.next_frame().unwrap(), None);
        assert_eq!(frames.next_frame().unwrap(), None);
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let input = vec![b'a'; MAX_FRAME_LEN as usize + 10];
        let mut frames = FrameReader::new(Cursor::new(input));
        let err = frames.next_frame().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
