//! Frame layout and payload encoding
//!
//! Every message is `[u32 big-endian length][payload]`. Requests carry an encoded
//! [`Invocation`]; replies to synchronous requests are `[is_null: u8][encoded result]`.

use super::error::ChannelError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

const REPLY_NULL: u8 = 1;
const REPLY_VALUE: u8 = 0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub is_sync: bool,
    pub method: String,
    pub args: Vec<Value>,
    pub timestamp_millis: i64,
}

impl Invocation {
    pub fn new(is_sync: bool, method: &str, args: Vec<Value>) -> Self {
        let timestamp_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        Self {
            is_sync,
            method: method.to_string(),
            args,
            timestamp_millis,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ChannelError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, ChannelError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), ChannelError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ChannelError::FrameTooLarge(payload.len()));
    }
    writer.write_u32::<BigEndian>(payload.len() as u32)?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame. End of stream before a length prefix is reported as
/// [`ChannelError::Closed`]; anywhere else it is an I/O error.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, ChannelError> {
    let len = match reader.read_u32::<BigEndian>() {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(ChannelError::Closed),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(ChannelError::FrameTooLarge(len));
    }
    let mut payload = vec![0; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

pub fn encode_reply(result: Option<&Value>) -> Result<Vec<u8>, ChannelError> {
    match result {
        None | Some(Value::Null) => Ok(vec![REPLY_NULL]),
        Some(value) => {
            let mut payload = vec![REPLY_VALUE];
            serde_json::to_writer(&mut payload, value)?;
            Ok(payload)
        }
    }
}

pub fn decode_reply(payload: &[u8]) -> Result<Option<Value>, ChannelError> {
    match payload.split_first() {
        Some((&REPLY_NULL, _)) => Ok(None),
        Some((_, body)) => Ok(Some(serde_json::from_slice(body)?)),
        None => Err(ChannelError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "empty reply frame",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn frame_has_big_endian_prefix() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"abc").expect("write");
        assert_eq!(buf, [0, 0, 0, 3, b'a', b'b', b'c']);
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor).expect("read"), b"abc");
        assert!(matches!(read_frame(&mut cursor), Err(ChannelError::Closed)));
    }

    #[test]
    fn oversized_and_truncated_frames() {
        let mut buf = Vec::new();
        buf.write_u32::<BigEndian>(MAX_FRAME_LEN as u32 + 1).expect("prefix");
        assert!(matches!(
            read_frame(&mut Cursor::new(buf)),
            Err(ChannelError::FrameTooLarge(_))
        ));

        let truncated = vec![0, 0, 0, 8, 1, 2];
        assert!(matches!(
            read_frame(&mut Cursor::new(truncated)),
            Err(ChannelError::Io(_))
        ));
    }

    #[test]
    fn replies_distinguish_null() {
        assert_eq!(decode_reply(&encode_reply(None).expect("encode")).expect("decode"), None);
        assert_eq!(
            decode_reply(&encode_reply(Some(&Value::Null)).expect("encode")).expect("decode"),
            None
        );
        let payload = encode_reply(Some(&json!({"ok": true}))).expect("encode");
        assert_eq!(payload[0], REPLY_VALUE);
        assert_eq!(decode_reply(&payload).expect("decode"), Some(json!({"ok": true})));
    }

    #[test]
    fn invocation_uses_camel_case_fields() {
        let invocation = Invocation::new(true, "backPressPage", vec![json!(3)]);
        let value: Value = serde_json::from_slice(&invocation.encode().expect("encode")).expect("json");
        assert_eq!(value["isSync"], json!(true));
        assert_eq!(value["method"], json!("backPressPage"));
        assert!(value["timestampMillis"].as_i64().is_some_and(|t| t > 0));
    }
}
