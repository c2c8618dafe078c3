//! Single-slot handoff channel, moving one frame at a time between pipeline
//! stages.
//!
//! One channel is used per direction: inbound frames from the receive stage
//! to the processing stage, and response frames from the processing stage to
//! the transmit stage.  Only a single producer and single consumer are
//! expected per channel.
//!
//! [`HandoffChannel::send()`] never blocks, so it can be called from an
//! interrupt handler.  If a frame is still pending when another arrives, the
//! [`OverflowPolicy`] decides which survives:
//!
//! - [`OverflowPolicy::Overwrite`] (default) - the newer frame replaces the
//!   pending one, which is lost.
//! - [`OverflowPolicy::KeepPending`] - the newer frame is discarded.
//!
//! Either way the loss is silent to the host, but counted in
//! [`HandoffStats`].  Items are moved whole under the channel's mutex, so a
//! consumer never sees a mix of two frames.
//!
//! [`HandoffChannel::receive()`] waits indefinitely for an item.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::waitqueue::WakerRegistration;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// What to do when sending to a channel that already holds an item
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Replace the pending item with the new one
    #[default]
    Overwrite,
    /// Keep the pending item and discard the new one
    KeepPending,
}

/// Result of [`HandoffChannel::send()`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Slot was empty, item is now pending
    Delivered,
    /// Slot was full, the previously pending item was dropped
    Overwrote,
    /// Slot was full, the new item was dropped
    Rejected,
}

/// Channel counters.  All wrap on overflow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HandoffStats {
    /// Items placed into an empty slot
    pub delivered: u32,
    /// Pending items lost to a newer one
    pub overwritten: u32,
    /// New items discarded because one was pending
    pub rejected: u32,
}

impl HandoffStats {
    const fn new() -> Self {
        Self {
            delivered: 0,
            overwritten: 0,
            rejected: 0,
        }
    }

    /// Total items lost, whichever policy was in force
    pub fn dropped(&self) -> u32 {
        self.overwritten.wrapping_add(self.rejected)
    }
}

struct State<T> {
    slot: Option<T>,
    waker: WakerRegistration,
    stats: HandoffStats,
}

/// Single-slot handoff channel.
///
/// `M` is the raw mutex guarding the slot.  Use
/// `CriticalSectionRawMutex` when the producer runs in interrupt context.
pub struct HandoffChannel<M: RawMutex, T> {
    policy: OverflowPolicy,
    state: Mutex<M, RefCell<State<T>>>,
}

impl<M: RawMutex, T> HandoffChannel<M, T> {
    /// New channel with [`OverflowPolicy::Overwrite`].  Usable in a
    /// `static`.
    pub const fn new() -> Self {
        Self::with_policy(OverflowPolicy::Overwrite)
    }

    /// New channel with the given [`OverflowPolicy`].  Usable in a
    /// `static`.
    ///
    /// Arguments:
    /// - `policy`: What [`send()`](Self::send) does when an item is
    ///   already pending
    pub const fn with_policy(policy: OverflowPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(RefCell::new(State {
                slot: None,
                waker: WakerRegistration::new(),
                stats: HandoffStats::new(),
            })),
        }
    }

    /// The overflow policy this channel was created with
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Producer: hand over an item.  Never blocks.
    ///
    /// Returns:
    /// - `Delivered`: The slot was empty and now holds `item`
    /// - `Overwrote`: An item was pending and `item` replaced it
    /// - `Rejected`: An item was pending and `item` was discarded
    pub fn send(&self, item: T) -> SendOutcome {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let outcome = match (state.slot.is_some(), self.policy) {
                (false, _) => {
                    state.slot = Some(item);
                    state.stats.delivered = state.stats.delivered.wrapping_add(1);
                    SendOutcome::Delivered
                }
                (true, OverflowPolicy::Overwrite) => {
                    state.slot = Some(item);
                    state.stats.overwritten = state.stats.overwritten.wrapping_add(1);
                    SendOutcome::Overwrote
                }
                (true, OverflowPolicy::KeepPending) => {
                    state.stats.rejected = state.stats.rejected.wrapping_add(1);
                    SendOutcome::Rejected
                }
            };
            if outcome != SendOutcome::Rejected {
                state.waker.wake();
            }
            outcome
        })
    }

    /// Consumer: take the pending item, if any.
    pub fn try_receive(&self) -> Option<T> {
        self.state.lock(|state| state.borrow_mut().slot.take())
    }

    /// Consumer: wait for an item and take it.
    pub async fn receive(&self) -> T {
        poll_fn(|cx| {
            self.state.lock(|state| {
                let mut state = state.borrow_mut();
                match state.slot.take() {
                    Some(item) => Poll::Ready(item),
                    None => {
                        state.waker.register(cx.waker());
                        Poll::Pending
                    }
                }
            })
        })
        .await
    }

    /// Whether an item is waiting to be received
    pub fn is_pending(&self) -> bool {
        self.state.lock(|state| state.borrow().slot.is_some())
    }

    /// Snapshot of the channel's counters
    pub fn stats(&self) -> HandoffStats {
        self.state.lock(|state| state.borrow().stats)
    }
}

impl<M: RawMutex, T> Default for HandoffChannel<M, T> {
    fn default() -> Self {
        Self::new()
    }
}
