//! Transmit stage - writes each response to the transport.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use embassy_sync::blocking_mutex::raw::RawMutex;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::notifier::CompletionCounter;
use crate::pipeline::{FrameChannel, StageState};
#[cfg(feature = "async")]
use crate::transport::AsyncFrameWriter;
use crate::transport::FrameWriter;

/// Transmit statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransmitStats {
    /// Responses handed to the transport
    pub sent: u32,
    /// Responses the transport failed to send
    pub failed: u32,
}

/// Takes responses from the outbound channel and writes them to the
/// transport, optionally counting each completed cycle.
pub struct TransmitStage<'a, M: RawMutex> {
    outbound: &'a FrameChannel<M>,
    completions: Option<&'a CompletionCounter<M>>,
    stats: TransmitStats,
    state: StageState,
}

impl<'a, M: RawMutex> TransmitStage<'a, M> {
    pub fn new(outbound: &'a FrameChannel<M>) -> Self {
        Self {
            outbound,
            completions: None,
            stats: TransmitStats::default(),
            state: StageState::Idle,
        }
    }

    /// Count each successful transmission on `completions`.
    pub fn with_completions(mut self, completions: &'a CompletionCounter<M>) -> Self {
        self.completions = Some(completions);
        self
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn stats(&self) -> TransmitStats {
        self.stats
    }

    /// Send one response if one is pending.  Returns whether it did.
    pub fn poll<W: FrameWriter>(&mut self, writer: &mut W) -> bool {
        match self.outbound.try_receive() {
            Some(tx) => {
                self.state = StageState::Processing;
                let result = writer.send_exact(&tx);
                self.complete(result);
                true
            }
            None => false,
        }
    }

    /// Wait for a single response and send it.
    #[cfg(feature = "async")]
    pub async fn step<W: AsyncFrameWriter>(&mut self, writer: &mut W) {
        self.state = StageState::AwaitingFrame;
        let tx = self.outbound.receive().await;
        self.state = StageState::Processing;
        let result = writer.send_exact(&tx).await;
        self.complete(result);
    }

    /// Wait for and send responses forever.
    #[cfg(feature = "async")]
    pub async fn run<W: AsyncFrameWriter>(&mut self, writer: &mut W) {
        loop {
            self.step(writer).await;
        }
    }

    fn complete<E: core::fmt::Debug>(&mut self, result: Result<(), E>) {
        match result {
            Ok(()) => {
                self.stats.sent = self.stats.sent.wrapping_add(1);
                if let Some(completions) = self.completions {
                    let count = completions.increment();
                    trace!("Response {count} sent");
                }
            }
            Err(e) => {
                self.stats.failed = self.stats.failed.wrapping_add(1);
                error!("Response transmit failed: {e:?}");
            }
        }
        self.state = StageState::Idle;
    }
}
