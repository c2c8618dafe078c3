//! Command executor - performs the memory operation a request frame asks for
//! and builds the response frame.
//!
//! The executor never fails outwardly.  Any problem with a command (unknown
//! opcode, count beyond frame capacity, a rejected memory access) results in
//! a response filled with [`CMD_ERROR`].  Successful writes return a response
//! filled with [`WRITE_OKAY`].  Reads return a zero-filled response with the
//! read words placed from word 0 onwards.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::command::{CMD_ERROR, Command, WRITE_OKAY};
use crate::frame::{RawFrame, RequestFrame, ResponseFrame};
use crate::memory::MemoryIo;
use crate::{Error, Result};

/// Execution statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecStats {
    /// Frames executed, whatever the outcome
    pub executed: u32,
    /// Frames answered with the command-error response
    pub errored: u32,
}

/// Executes commands against a [`MemoryIo`].
pub struct Executor<M: MemoryIo> {
    memory: M,
    stats: ExecStats,
}

impl<M: MemoryIo> Executor<M> {
    /// Create an executor owning `memory`, with zeroed statistics.
    pub fn new(memory: M) -> Self {
        Self {
            memory,
            stats: ExecStats::default(),
        }
    }

    /// Commands executed and errored so far
    pub fn stats(&self) -> ExecStats {
        self.stats
    }

    /// The memory commands are executed against
    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Execute a decoded request, always producing a full response.
    pub fn execute(&mut self, frame: &RequestFrame) -> ResponseFrame {
        let command = Command::from_frame(frame);
        self.stats.executed = self.stats.executed.wrapping_add(1);

        match self.dispatch(&command) {
            Ok(response) => response,
            Err(e) => {
                self.stats.errored = self.stats.errored.wrapping_add(1);
                debug!(
                    "Command {:#06X} at {:#010X} failed: {e:?}",
                    command.opcode(),
                    frame.address
                );
                ResponseFrame::filled(CMD_ERROR)
            }
        }
    }

    /// Decode, execute and encode in one step.
    pub fn handle(&mut self, rx: &RawFrame) -> RawFrame {
        let frame = RequestFrame::decode(rx);
        self.execute(&frame).encode()
    }

    fn dispatch(&mut self, command: &Command<'_>) -> Result<ResponseFrame> {
        match *command {
            Command::WriteWord { address, value } => {
                trace!("Write {value:#010X} to {address:#010X}");
                self.memory.write_u32(address, value)?;
                Ok(ResponseFrame::filled(WRITE_OKAY))
            }
            Command::ReadWord { address } => {
                let mut response = ResponseFrame::zeroed();
                response.set_word(0, self.memory.read_u32(address)?);
                trace!("Read {:#010X} from {address:#010X}", response.word(0));
                Ok(response)
            }
            Command::WriteSequential { address, values } => {
                trace!("Write {} words from {address:#010X}", values.len());
                let mut addr = address;
                for value in values {
                    self.memory.write_u32(addr, *value)?;
                    addr = addr.wrapping_add(4);
                }
                Ok(ResponseFrame::filled(WRITE_OKAY))
            }
            Command::ReadSequential { address, count } => {
                trace!("Read {count} words from {address:#010X}");
                let mut response = ResponseFrame::zeroed();
                let mut addr = address;
                for idx in 0..count {
                    response.set_word(idx, self.memory.read_u32(addr)?);
                    addr = addr.wrapping_add(4);
                }
                Ok(response)
            }
            Command::Invalid { opcode, count } => {
                warn!("Command {opcode:#06X} count {count} exceeds frame capacity");
                Err(Error::PayloadTooLarge)
            }
            Command::Unknown { opcode } => {
                debug!("Unknown command {opcode:#06X}");
                Err(Error::UnknownCommand)
            }
        }
    }
}

/// One-shot decode, execute and encode against `memory`.
///
/// This is the whole of the command handling for a single-task design,
/// where one task both reads from and writes to the transport.
pub fn handle_command<M: MemoryIo>(memory: M, rx: &RawFrame) -> RawFrame {
    Executor::new(memory).handle(rx)
}
