//! Frame codec for the fixed 64 byte request and response frames.
//!
//! Both directions use big-endian encoding throughout and have no framing
//! delimiters or checksums - a frame is simply 64 bytes as delivered by the
//! transport.
//!
//! Request frame layout:
//!
//! | Offset | Size | Field     |
//! |--------|------|-----------|
//! | 0      | 2    | `command` |
//! | 2      | 2    | `count`   |
//! | 4      | 4    | `address` |
//! | 8      | 56   | `data[0..14]` |
//!
//! Response frames are sixteen 32-bit words.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

/// Size of both request and response frames in bytes
pub const FRAME_SIZE: usize = 64;

/// Number of 32-bit payload words carried by a request frame
pub const PAYLOAD_WORDS: usize = 14;

/// Number of 32-bit words in a response frame
pub const RESPONSE_WORDS: usize = FRAME_SIZE / 4;

const COMMAND_OFFSET: usize = 0;
const COUNT_OFFSET: usize = 2;
const ADDRESS_OFFSET: usize = 4;
const DATA_OFFSET: usize = 8;

/// Raw frame bytes, as moved between pipeline stages.
pub type RawFrame = [u8; FRAME_SIZE];

/// Write `value` big-endian at `offset`.
///
/// Caller guarantees `offset + 4 <= buf.len()`.
#[inline]
pub fn encode_word(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

/// Read a big-endian word from `offset`.
///
/// Caller guarantees `offset + 4 <= buf.len()`.
#[inline]
pub fn decode_word(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

#[inline]
fn decode_half(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Decoded request frame.
///
/// Decoding is total: every field is populated from any 64 bytes, whether or
/// not the opcode makes use of it.  Use [`crate::command::Command`] to get
/// at only the fields a given opcode uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestFrame {
    /// 16-bit opcode
    pub command: u16,
    /// Operation count - meaning depends on the opcode
    pub count: u16,
    /// Target address
    pub address: u32,
    /// Write payload words
    pub data: [u32; PAYLOAD_WORDS],
}

impl RequestFrame {
    /// Decode a request frame.  Never fails.
    pub fn decode(bytes: &RawFrame) -> Self {
        let mut data = [0u32; PAYLOAD_WORDS];
        for (idx, word) in data.iter_mut().enumerate() {
            *word = decode_word(bytes, DATA_OFFSET + idx * 4);
        }

        Self {
            command: decode_half(bytes, COMMAND_OFFSET),
            count: decode_half(bytes, COUNT_OFFSET),
            address: decode_word(bytes, ADDRESS_OFFSET),
            data,
        }
    }

    /// Encode into wire format.  Exact inverse of [`Self::decode()`].
    pub fn encode(&self) -> RawFrame {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[COMMAND_OFFSET..COMMAND_OFFSET + 2].copy_from_slice(&self.command.to_be_bytes());
        bytes[COUNT_OFFSET..COUNT_OFFSET + 2].copy_from_slice(&self.count.to_be_bytes());
        encode_word(&mut bytes, ADDRESS_OFFSET, self.address);
        for (idx, word) in self.data.iter().enumerate() {
            encode_word(&mut bytes, DATA_OFFSET + idx * 4, *word);
        }
        bytes
    }
}

/// Response frame - sixteen 32-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    words: [u32; RESPONSE_WORDS],
}

impl ResponseFrame {
    /// All words zero
    pub const fn zeroed() -> Self {
        Self::filled(0)
    }

    /// Every word set to `word`.  Used for the sentinel responses.
    pub const fn filled(word: u32) -> Self {
        Self {
            words: [word; RESPONSE_WORDS],
        }
    }

    /// All sixteen words, in wire order
    pub fn words(&self) -> &[u32; RESPONSE_WORDS] {
        &self.words
    }

    /// Get word `idx`.  Panics if `idx >= RESPONSE_WORDS`.
    pub fn word(&self, idx: usize) -> u32 {
        self.words[idx]
    }

    /// Set word `idx` to `value`.  Panics if `idx >= RESPONSE_WORDS`.
    pub fn set_word(&mut self, idx: usize, value: u32) {
        self.words[idx] = value;
    }

    /// Whether every word holds `word`
    pub fn is_filled_with(&self, word: u32) -> bool {
        self.words.iter().all(|w| *w == word)
    }

    /// Encode into wire format.  All 64 bytes are written.
    pub fn encode(&self) -> RawFrame {
        let mut bytes = [0u8; FRAME_SIZE];
        for (idx, word) in self.words.iter().enumerate() {
            encode_word(&mut bytes, idx * 4, *word);
        }
        bytes
    }

    /// Decode from wire format, typically on the host.
    pub fn decode(bytes: &RawFrame) -> Self {
        let mut words = [0u32; RESPONSE_WORDS];
        for (idx, word) in words.iter_mut().enumerate() {
            *word = decode_word(bytes, idx * 4);
        }
        Self { words }
    }
}

impl Default for ResponseFrame {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bytes() -> RawFrame {
        let mut bytes = [0u8; FRAME_SIZE];
        for (idx, byte) in bytes.iter_mut().enumerate() {
            *byte = idx as u8;
        }
        bytes
    }

    #[test]
    fn decode_is_big_endian() {
        let frame = RequestFrame::decode(&sample_bytes());
        assert_eq!(frame.command, 0x0001);
        assert_eq!(frame.count, 0x0203);
        assert_eq!(frame.address, 0x0405_0607);
        assert_eq!(frame.data[0], 0x0809_0A0B);
        assert_eq!(frame.data[13], 0x3C3D_3E3F);
    }

    #[test]
    fn decode_uses_every_byte() {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[63] = 0xA5;
        let frame = RequestFrame::decode(&bytes);
        assert_eq!(frame.data[PAYLOAD_WORDS - 1], 0xA5);
    }

    #[test]
    fn encode_inverts_decode() {
        let bytes = sample_bytes();
        assert_eq!(RequestFrame::decode(&bytes).encode(), bytes);
    }

    #[test]
    fn encode_word_writes_four_bytes() {
        let mut buf = [0u8; FRAME_SIZE];
        encode_word(&mut buf, 60, 0xDEAD_BEEF);
        assert_eq!(&buf[60..], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(buf[..60].iter().all(|b| *b == 0));
        assert_eq!(decode_word(&buf, 60), 0xDEAD_BEEF);
    }

    #[test]
    fn filled_response_repeats_word() {
        let rsp = ResponseFrame::filled(0x0101_0101);
        assert!(rsp.is_filled_with(0x0101_0101));
        assert!(rsp.encode().iter().all(|b| *b == 0x01));
    }
}
