use bytes::{BufMut, Bytes, BytesMut};

use super::value::Value;

/// Encodes a value into its canonical bencode form.
///
/// Encoding is infallible: every [`Value`] has exactly one canonical encoding.
pub fn encode(value: &Value) -> Bytes {
    let mut buf = BytesMut::with_capacity(value.encoded_len());
    encode_into(value, &mut buf);
    buf.freeze()
}

/// Appends the canonical encoding of `value` to `buf`.
pub fn encode_into<B: BufMut>(value: &Value, buf: &mut B) {
    match value {
        Value::Integer(i) => {
            buf.put_u8(b'i');
            buf.put_slice(i.to_string().as_bytes());
            buf.put_u8(b'e');
        }
        Value::Bytes(b) => put_string(b, buf),
        Value::List(items) => {
            buf.put_u8(b'l');
            for item in items {
                encode_into(item, buf);
            }
            buf.put_u8(b'e');
        }
        Value::Dict(entries) => {
            buf.put_u8(b'd');
            for (key, val) in entries {
                put_string(key, buf);
                encode_into(val, buf);
            }
            buf.put_u8(b'e');
        }
    }
}

fn put_string<B: BufMut>(data: &[u8], buf: &mut B) {
    buf.put_slice(data.len().to_string().as_bytes());
    buf.put_u8(b':');
    buf.put_slice(data);
}
