//! Receive, process and transmit stages, chained by two handoff channels.
//!
//! ```text
//! inbound ready ─▶ ReceiveStage ─▶ inbound ─▶ ProcessStage ─▶ outbound ─▶ TransmitStage ─▶ transport
//!   (interrupt)                   channel      (task)         channel       (task)            │
//!                                                                                              ▼
//!                                                                                   CompletionCounter
//! ```
//!
//! - [`ReceiveStage`] runs in the transport's inbound-data handler.  It
//!   copies the 64 byte frame out of the transport and hands it on, and
//!   never suspends.
//! - [`ProcessStage`] waits on the inbound channel, executes the command and
//!   hands the response to the outbound channel.
//! - [`TransmitStage`] waits on the outbound channel, writes the response to
//!   the transport and counts the completed cycle.
//!
//! The channels and counter live in [`PipelineResources`], which is created
//! once (typically as a `static`) and lent to each stage on construction.
//! The processing and transmit stages each offer a polled `poll()` for
//! super-loop targets and an async `run()` for use with an executor.
//!
//! [`PipelineConfig`] records the scheduling priorities the application
//! should use when spawning the stages, bounded by a ceiling so they never
//! preempt any hardware timing critical work in the same system.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

pub mod process;
pub mod receive;
pub mod transmit;

pub use process::ProcessStage;
pub use receive::ReceiveStage;
pub use transmit::{TransmitStage, TransmitStats};

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::frame::RawFrame;
use crate::handoff::{HandoffChannel, OverflowPolicy};
use crate::notifier::CompletionCounter;
use crate::{Error, Result};

/// Handoff channel carrying raw frames
pub type FrameChannel<M> = HandoffChannel<M, RawFrame>;

/// Scheduling priority - higher numbers are more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub u8);

/// Where a stage is within its loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    #[default]
    Idle,
    AwaitingFrame,
    Processing,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Priority of background work the stages must not be starved by
    pub background: Priority,
    /// Processing stage priority
    pub process: Priority,
    /// Transmit stage priority
    pub transmit: Priority,
    /// Highest priority either stage may use
    pub ceiling: Priority,
    /// Behaviour of both handoff channels when a frame is already pending
    pub overflow: OverflowPolicy,
}

impl PipelineConfig {
    /// Check that both stages sit above background work and at or below
    /// the ceiling.
    pub fn validate(&self) -> Result<()> {
        for stage in [self.process, self.transmit] {
            if stage <= self.background || stage > self.ceiling {
                return Err(Error::InvalidPriority);
            }
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            background: Priority(1),
            process: Priority(2),
            transmit: Priority(2),
            ceiling: Priority(2),
            overflow: OverflowPolicy::Overwrite,
        }
    }
}

/// The state shared between stages.
pub struct PipelineResources<M: RawMutex> {
    /// Receive stage to processing stage
    pub inbound: FrameChannel<M>,
    /// Processing stage to transmit stage
    pub outbound: FrameChannel<M>,
    /// Completed transactions
    pub completions: CompletionCounter<M>,
}

impl<M: RawMutex> PipelineResources<M> {
    /// Usable in a `static`.
    pub const fn new(overflow: OverflowPolicy) -> Self {
        Self {
            inbound: HandoffChannel::with_policy(overflow),
            outbound: HandoffChannel::with_policy(overflow),
            completions: CompletionCounter::new(),
        }
    }

    /// Validate `config` and create resources using its overflow policy.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.overflow))
    }

    /// Frames lost on either channel
    pub fn dropped_frames(&self) -> u32 {
        self.inbound
            .stats()
            .dropped()
            .wrapping_add(self.outbound.stats().dropped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(PipelineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn priorities_bounded_by_ceiling_and_background() {
        let config = PipelineConfig {
            transmit: Priority(3),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidPriority));

        let config = PipelineConfig {
            process: Priority(1),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidPriority));

        let config = PipelineConfig {
            background: Priority(0),
            process: Priority(3),
            transmit: Priority(2),
            ceiling: Priority(3),
            overflow: OverflowPolicy::KeepPending,
        };
        let resources =
            PipelineResources::<CriticalSectionRawMutex>::from_config(&config).unwrap();
        assert_eq!(resources.inbound.policy(), OverflowPolicy::KeepPending);
        assert_eq!(resources.dropped_frames(), 0);
    }
}
