//! Receive stage - runs in the transport's inbound-data handler.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use embassy_sync::blocking_mutex::raw::RawMutex;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::frame::{FRAME_SIZE, RawFrame};
use crate::handoff::SendOutcome;
use crate::pipeline::FrameChannel;
use crate::transport::FrameReader;

/// Moves each received frame from the transport to the inbound channel.
///
/// Holds no state of its own, so can be called through a shared reference
/// from interrupt context.  Does no decoding - that is left to the
/// [`super::ProcessStage`], keeping interrupt latency short.
pub struct ReceiveStage<'a, M: RawMutex> {
    inbound: &'a FrameChannel<M>,
}

impl<'a, M: RawMutex> ReceiveStage<'a, M> {
    pub const fn new(inbound: &'a FrameChannel<M>) -> Self {
        Self { inbound }
    }

    /// Call once the transport reports a whole frame is ready.
    ///
    /// Returns how the frame was handed over, or `None` if the transport
    /// read failed and the frame was dropped.  Never blocks.
    pub fn on_inbound_ready<R: FrameReader>(&self, reader: &mut R) -> Option<SendOutcome> {
        let mut frame: RawFrame = [0; FRAME_SIZE];
        if let Err(e) = reader.receive_exact(&mut frame) {
            warn!("Inbound frame read failed: {e:?}");
            return None;
        }

        let outcome = self.inbound.send(frame);
        trace!("Inbound frame {outcome:?}");
        Some(outcome)
    }
}
