//! Host side of the link - building request frames and interpreting the
//! responses.
//!
//! [`Request`] builds a valid [`RequestFrame`] for each supported command,
//! and [`Reply`] classifies a [`ResponseFrame`].  With the `async` feature,
//! `CommandClient` is an async client driving a
//! [`crate::transport::FrameLink`].
//!
//! The protocol cannot distinguish a command-error response from a
//! sequential read of 16 words that all happen to hold [`CMD_ERROR`].
//! Reads of fewer than 16 words are unambiguous, as the unread response
//! words are zero, so `CommandClient::read_words()` never asks for more
//! than [`READ_CHUNK_WORDS`] at a time.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#[cfg(feature = "async")]
pub mod futures;

#[cfg(feature = "async")]
pub use futures::CommandClient;

use crate::command::{
    CMD_ERROR, MAX_READ_COUNT, MAX_WRITE_COUNT, READ_SEQUENTIAL, READ_WORD, WRITE_OKAY,
    WRITE_SEQUENTIAL, WRITE_WORD,
};
use crate::frame::{RESPONSE_WORDS, RawFrame, RequestFrame, ResponseFrame};
use crate::{Error, Result};

/// Largest sequential read whose response can always be told apart from
/// the command-error response.
pub const READ_CHUNK_WORDS: usize = MAX_READ_COUNT - 1;

/// A command to send to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// Write one word
    WriteWord { address: u32, value: u32 },
    /// Read one word
    ReadWord { address: u32 },
    /// At most [`MAX_WRITE_COUNT`] values
    WriteSequential { address: u32, values: &'a [u32] },
    /// At most [`MAX_READ_COUNT`] words
    ReadSequential { address: u32, count: usize },
}

impl Request<'_> {
    /// Build the request frame.  Unused fields are zero.
    pub fn to_frame(&self) -> Result<RequestFrame> {
        let mut frame = RequestFrame::default();
        match *self {
            Request::WriteWord { address, value } => {
                frame.command = WRITE_WORD;
                frame.address = address;
                frame.data[0] = value;
            }
            Request::ReadWord { address } => {
                frame.command = READ_WORD;
                frame.address = address;
            }
            Request::WriteSequential { address, values } => {
                if values.len() > MAX_WRITE_COUNT {
                    return Err(Error::PayloadTooLarge);
                }
                frame.command = WRITE_SEQUENTIAL;
                frame.count = values.len() as u16;
                frame.address = address;
                frame.data[..values.len()].copy_from_slice(values);
            }
            Request::ReadSequential { address, count } => {
                if count > MAX_READ_COUNT {
                    return Err(Error::PayloadTooLarge);
                }
                frame.command = READ_SEQUENTIAL;
                frame.count = count as u16;
                frame.address = address;
            }
        }
        Ok(frame)
    }

    /// Build the request and encode it for the wire.
    pub fn encode(&self) -> Result<RawFrame> {
        Ok(self.to_frame()?.encode())
    }

    /// Number of response words carrying read data.  Zero for writes.
    pub fn expected_words(&self) -> usize {
        match *self {
            Request::WriteWord { .. } | Request::WriteSequential { .. } => 0,
            Request::ReadWord { .. } => 1,
            Request::ReadSequential { count, .. } => count,
        }
    }
}

/// Classification of a response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Every word is [`WRITE_OKAY`]
    WriteOkay,
    /// Every word is [`CMD_ERROR`]
    CommandError,
    /// Anything else - read data
    Data(ResponseFrame),
}

impl Reply {
    /// Classify `response` to a request expecting `expected_words` words of
    /// read data (see [`Request::expected_words()`]).
    ///
    /// Words beyond the expected data are zero in any data response, so
    /// when `expected_words` is less than 16 the sentinel responses are
    /// recognised exactly.  A 16 word read is ambiguous: a response filled
    /// with [`CMD_ERROR`] is treated as [`Reply::CommandError`], and one
    /// filled with [`WRITE_OKAY`] as data.
    ///
    /// Returns:
    /// - `WriteOkay`: Every word is [`WRITE_OKAY`]
    /// - `CommandError`: Every word is [`CMD_ERROR`]
    /// - `Data`: Anything else
    pub fn classify(response: &ResponseFrame, expected_words: usize) -> Self {
        if response.is_filled_with(CMD_ERROR) {
            Reply::CommandError
        } else if expected_words < RESPONSE_WORDS && response.is_filled_with(WRITE_OKAY) {
            Reply::WriteOkay
        } else {
            Reply::Data(*response)
        }
    }
}
