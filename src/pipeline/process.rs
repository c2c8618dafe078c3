//! Processing stage - decodes and executes each inbound frame.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use embassy_sync::blocking_mutex::raw::RawMutex;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::executor::{ExecStats, Executor};
use crate::frame::RawFrame;
use crate::handoff::SendOutcome;
use crate::memory::MemoryIo;
use crate::pipeline::{FrameChannel, StageState};

/// Takes frames from the inbound channel, executes them against memory and
/// hands the responses to the outbound channel.
pub struct ProcessStage<'a, M: RawMutex, I: MemoryIo> {
    inbound: &'a FrameChannel<M>,
    outbound: &'a FrameChannel<M>,
    executor: Executor<I>,
    state: StageState,
}

impl<'a, M: RawMutex, I: MemoryIo> ProcessStage<'a, M, I> {
    pub fn new(inbound: &'a FrameChannel<M>, outbound: &'a FrameChannel<M>, memory: I) -> Self {
        Self {
            inbound,
            outbound,
            executor: Executor::new(memory),
            state: StageState::Idle,
        }
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn stats(&self) -> ExecStats {
        self.executor.stats()
    }

    pub fn executor(&self) -> &Executor<I> {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut Executor<I> {
        &mut self.executor
    }

    /// Process one frame if one is pending.  Returns whether it did.
    pub fn poll(&mut self) -> bool {
        match self.inbound.try_receive() {
            Some(rx) => {
                self.process(&rx);
                true
            }
            None => false,
        }
    }

    /// Wait for and process frames forever.
    pub async fn run(&mut self) {
        loop {
            self.step().await;
        }
    }

    /// Wait for and process a single frame.
    pub async fn step(&mut self) {
        self.state = StageState::AwaitingFrame;
        let rx = self.inbound.receive().await;
        self.process(&rx);
    }

    fn process(&mut self, rx: &RawFrame) {
        self.state = StageState::Processing;
        let tx = self.executor.handle(rx);
        match self.outbound.send(tx) {
            SendOutcome::Delivered => (),
            SendOutcome::Overwrote => debug!("Pending response overwritten"),
            SendOutcome::Rejected => debug!("Response dropped, previous still pending"),
        }
        self.state = StageState::Idle;
    }
}
