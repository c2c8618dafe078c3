//! Fixed-size command frame protocol, giving a host remote 32-bit read and
//! write access to a target's memory map over a serial link.
//!
//! The host sends 64 byte request frames.  The target decodes each one,
//! performs the addressed memory operation and answers with a 64 byte
//! response frame.  On the target this runs as a small pipeline bridging
//! the transport's receive interrupt to a processing task, and on to a
//! transmit task, using single-slot handoff channels.
//!
//! `no_std`.  The `async` feature requires `alloc`.
//!
//! ## Wire Format
//!
//! Big-endian throughout, no delimiters, no checksum.  Frame boundaries are
//! defined by the transport reading and writing exactly 64 bytes at a time.
//!
//! Request frame:
//! - bytes 0-1: command (opcode)
//! - bytes 2-3: count, for the sequential commands
//! - bytes 4-7: address
//! - bytes 8-63: fourteen 32-bit data words
//!
//! Response frame: sixteen 32-bit words.
//!
//! | Command            | Opcode   | Response                                  |
//! |--------------------|----------|-------------------------------------------|
//! | Write word         | `0x00D3` | 16 x `WRITE_OKAY`                         |
//! | Read word          | `0x00D4` | word 0 = value, rest zero                 |
//! | Write sequential   | `0x00D5` | 16 x `WRITE_OKAY`                         |
//! | Read sequential    | `0x00D6` | words `0..count` = values, rest zero      |
//! | Anything else      |          | 16 x `CMD_ERROR`                          |
//!
//! `WRITE_OKAY` is `0x01010101` and `CMD_ERROR` is `0xEEAA5577`.  A
//! sequential count beyond the frame's capacity (14 words for writes, 16 for
//! reads), or a memory access the target rejects, also produces the
//! `CMD_ERROR` response.
//!
//! ## Target Architecture
//!
//! ```text
//! UART rx irq -> ReceiveStage -> [inbound] -> ProcessStage -> [outbound] -> TransmitStage -> UART tx
//!                                                                                 |
//!                                                                         CompletionCounter
//! ```
//!
//! Each handoff channel holds at most one frame.  The target assumes a
//! single outstanding transaction - if the host sends a second frame before
//! the first has been taken from the inbound channel, one of them is dropped.
//! With the default [`handoff::OverflowPolicy::Overwrite`] the older frame
//! is lost, with [`handoff::OverflowPolicy::KeepPending`] the newer one is.
//!
//! The outbound channel uses the same policy and never applies
//! backpressure, so the processing stage does not wait for the transmit
//! stage.  Under `Overwrite` a response still waiting to be transmitted is
//! replaced by the next one.  Drops in either direction are counted, see
//! [`handoff::HandoffStats`].
//!
//! **Target setup**:
//! 1. Bring up the UART and interrupt controller (not covered by this crate)
//! 2. Create a `static` [`pipeline::PipelineResources`]
//! 3. Call [`pipeline::ReceiveStage::on_inbound_ready()`] from the UART's
//!    "64 bytes received" handler
//! 4. Spawn [`pipeline::ProcessStage::run()`] and `TransmitStage::run()`
//!    (`async` feature) at the priorities given by a validated
//!    [`pipeline::PipelineConfig`], or call their `poll()` methods from a
//!    super-loop
//! 5. Optionally spawn a low priority [`notifier::CompletionObserver`]
//!
//! For a simpler single-task design, [`executor::handle_command()`] decodes,
//! executes and encodes a frame in one call.
//!
//! **Host setup**: implement [`transport::FrameLink`] and use
//! `client::CommandClient` (`async` feature), or build frames with
//! [`client::Request`].
//!
//! ## Modules
//!
//! - [`frame`] - Request/response frame codec
//! - [`command`] - Opcodes, sentinels and typed commands
//! - [`memory`] - Access to the target address space
//! - [`executor`] - Executes commands, producing responses
//! - [`handoff`] - Single-slot channel between pipeline stages
//! - [`transport`] - Transport traits for both ends of the link
//! - [`pipeline`] - Receive, process and transmit stages
//! - [`notifier`] - Completed transaction counter and observer
//! - [`client`] - Host side request building and async client
//!
//! ## Features
//!
//! Default features:
//! - `async` - Enable the async transmit stage, async transport traits and
//!   the async client (requires `alloc`).
//!
//! Compile with `--no-default-features` for a target using only the polled
//! pipeline stages.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#![cfg_attr(not(test), no_std)]

#[cfg(feature = "async")]
extern crate alloc;

pub mod client;
pub mod command;
pub mod executor;
pub mod frame;
pub mod handoff;
pub mod memory;
pub mod notifier;
pub mod pipeline;
pub mod transport;

/// Errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Address not 32-bit aligned
    NotAligned,
    /// Address outside the accessible memory
    OutOfRange,
    /// Count exceeds what a frame can carry
    PayloadTooLarge,
    /// Opcode not recognised
    UnknownCommand,
    /// Stage priorities outside the configured bounds
    InvalidPriority,
    /// Transport I/O error
    Io,
    /// Device answered with the command-error response
    CommandRejected,
    /// Device answered with an unexpected response
    UnexpectedReply,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::NotAligned => "address not aligned",
            Error::OutOfRange => "address out of range",
            Error::PayloadTooLarge => "count exceeds frame capacity",
            Error::UnknownCommand => "unknown command",
            Error::InvalidPriority => "invalid stage priority",
            Error::Io => "transport I/O error",
            Error::CommandRejected => "command rejected by device",
            Error::UnexpectedReply => "unexpected reply from device",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}

/// Type to represent the result of an operation
pub type Result<T> = core::result::Result<T, Error>;
