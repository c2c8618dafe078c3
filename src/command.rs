//! Opcodes, sentinels and the typed command view of a request frame.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use crate::frame::{PAYLOAD_WORDS, RESPONSE_WORDS, RequestFrame};

/// Single 32-bit write
pub const WRITE_WORD: u16 = 0x00D3;
/// Single 32-bit read
pub const READ_WORD: u16 = 0x00D4;
/// `count` consecutive 32-bit writes
pub const WRITE_SEQUENTIAL: u16 = 0x00D5;
/// `count` consecutive 32-bit reads
pub const READ_SEQUENTIAL: u16 = 0x00D6;

/// Sentinel filling every word of a successful write response
pub const WRITE_OKAY: u32 = 0x0101_0101;
/// Sentinel filling every word of a failed command response
pub const CMD_ERROR: u32 = 0xEEAA_5577;

/// Maximum words for [`Command::WriteSequential`] - the request payload
pub const MAX_WRITE_COUNT: usize = PAYLOAD_WORDS;
/// Maximum words for [`Command::ReadSequential`] - the response size
pub const MAX_READ_COUNT: usize = RESPONSE_WORDS;

/// A request frame narrowed to the fields its opcode actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    WriteWord {
        address: u32,
        value: u32,
    },
    ReadWord {
        address: u32,
    },
    WriteSequential {
        address: u32,
        values: &'a [u32],
    },
    ReadSequential {
        address: u32,
        count: usize,
    },
    /// Known sequential opcode with a count beyond frame capacity
    Invalid {
        opcode: u16,
        count: u16,
    },
    Unknown {
        opcode: u16,
    },
}

impl<'a> Command<'a> {
    /// Interpret a decoded request frame.
    ///
    /// Never fails.  An unrecognised opcode gives [`Command::Unknown`], and a
    /// sequential count too large for a frame gives [`Command::Invalid`].
    /// Sequential writes borrow their values from `frame`.
    pub fn from_frame(frame: &'a RequestFrame) -> Self {
        let count = frame.count as usize;
        match frame.command {
            WRITE_WORD => Command::WriteWord {
                address: frame.address,
                value: frame.data[0],
            },
            READ_WORD => Command::ReadWord {
                address: frame.address,
            },
            WRITE_SEQUENTIAL if count <= MAX_WRITE_COUNT => Command::WriteSequential {
                address: frame.address,
                values: &frame.data[..count],
            },
            READ_SEQUENTIAL if count <= MAX_READ_COUNT => Command::ReadSequential {
                address: frame.address,
                count,
            },
            opcode @ (WRITE_SEQUENTIAL | READ_SEQUENTIAL) => Command::Invalid {
                opcode,
                count: frame.count,
            },
            opcode => Command::Unknown { opcode },
        }
    }

    /// Opcode this command was decoded from
    pub fn opcode(&self) -> u16 {
        match self {
            Command::WriteWord { .. } => WRITE_WORD,
            Command::ReadWord { .. } => READ_WORD,
            Command::WriteSequential { .. } => WRITE_SEQUENTIAL,
            Command::ReadSequential { .. } => READ_SEQUENTIAL,
            Command::Invalid { opcode, .. } | Command::Unknown { opcode } => *opcode,
        }
    }
}
