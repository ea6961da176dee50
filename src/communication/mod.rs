//! Message catalogue
//!
//! Typed payload definitions for every bus topic, with explicit little-endian
//! byte codecs. The broker only moves `&[u8]`; these types are how modules
//! agree on what those bytes mean, and decoding is the copy that lets a
//! handler keep data past the publish call.
//!
//! Wire conventions: integers little-endian, booleans one byte (0/1), strings
//! length-prefixed with one byte and capped by their `heapless` capacity.
//! A decoder that runs out of bytes, or sees a length beyond capacity,
//! returns `None` and the message is dropped whole, never applied partially.

pub mod messages;

use crate::core::broker::{Message, MessageBus, Topic};
use heapless::{String, Vec};

/// Upper bound on any encoded payload (the schedule list response, 101 bytes,
/// is the largest)
pub const MAX_PAYLOAD: usize = 128;

/// A typed message payload bound to its topic.
pub trait Payload: Sized {
    /// The topic this payload travels on
    const TOPIC: Topic;

    /// Append the wire encoding to `buf`.
    ///
    /// Returns `None` if `buf` runs out of space (a sizing bug; all payloads
    /// fit [`MAX_PAYLOAD`]).
    fn encode(&self, buf: &mut Vec<u8, MAX_PAYLOAD>) -> Option<()>;

    /// Parse the wire encoding.
    ///
    /// Returns `None` on truncated or malformed input.
    fn decode(buf: &[u8]) -> Option<Self>;
}

/// Encode `payload` and publish it on its topic.
pub fn send<P: Payload>(bus: &MessageBus<'_>, payload: &P) {
    let mut buf: Vec<u8, MAX_PAYLOAD> = Vec::new();
    if payload.encode(&mut buf).is_none() {
        debug_assert!(false, "payload exceeds MAX_PAYLOAD");
        return;
    }
    bus.publish(&Message {
        topic: P::TOPIC,
        payload: &buf,
    });
}

// ============================================================================
// Codec helpers
// ============================================================================

pub(crate) fn get_u8(buf: &[u8], offset: &mut usize) -> Option<u8> {
    let b = *buf.get(*offset)?;
    *offset += 1;
    Some(b)
}

pub(crate) fn get_bool(buf: &[u8], offset: &mut usize) -> Option<bool> {
    get_u8(buf, offset).map(|b| b != 0)
}

pub(crate) fn get_u16(buf: &[u8], offset: &mut usize) -> Option<u16> {
    let bytes = buf.get(*offset..*offset + 2)?;
    *offset += 2;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn get_i32(buf: &[u8], offset: &mut usize) -> Option<i32> {
    let bytes = buf.get(*offset..*offset + 4)?;
    *offset += 4;
    Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn get_u64(buf: &[u8], offset: &mut usize) -> Option<u64> {
    let bytes = buf.get(*offset..*offset + 8)?;
    *offset += 8;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Some(u64::from_le_bytes(raw))
}

/// Length-prefixed string, rejecting lengths beyond the capacity `N`.
pub(crate) fn get_str<const N: usize>(buf: &[u8], offset: &mut usize) -> Option<String<N>> {
    let len = get_u8(buf, offset)? as usize;
    if len > N {
        return None;
    }
    let bytes = buf.get(*offset..*offset + len)?;
    *offset += len;
    let s = core::str::from_utf8(bytes).ok()?;
    let mut out = String::new();
    out.push_str(s).ok()?;
    Some(out)
}

pub(crate) fn put_bytes(buf: &mut Vec<u8, MAX_PAYLOAD>, bytes: &[u8]) -> Option<()> {
    buf.extend_from_slice(bytes).ok()
}

pub(crate) fn put_u8(buf: &mut Vec<u8, MAX_PAYLOAD>, v: u8) -> Option<()> {
    buf.push(v).ok().map(|_| ())
}

pub(crate) fn put_bool(buf: &mut Vec<u8, MAX_PAYLOAD>, v: bool) -> Option<()> {
    put_u8(buf, u8::from(v))
}

pub(crate) fn put_str(buf: &mut Vec<u8, MAX_PAYLOAD>, s: &str) -> Option<()> {
    put_u8(buf, s.len() as u8)?;
    put_bytes(buf, s.as_bytes())
}

/// Declare an empty request payload: a unit struct whose encoding is zero
/// bytes and whose decoding accepts anything.
macro_rules! empty_payload {
    ($(#[$meta:meta])* $name:ident, $topic:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name;

        impl $crate::communication::Payload for $name {
            const TOPIC: $crate::core::broker::Topic = $topic;

            fn encode(
                &self,
                _buf: &mut heapless::Vec<u8, { $crate::communication::MAX_PAYLOAD }>,
            ) -> Option<()> {
                Some(())
            }

            fn decode(_buf: &[u8]) -> Option<Self> {
                Some(Self)
            }
        }
    };
}

pub(crate) use empty_payload;
