//! Completion notifier - counts finished request/response cycles.
//!
//! The transmit stage calls [`CompletionCounter::increment()`] once per
//! response successfully handed to the transport.  A low priority
//! [`CompletionObserver`] waits for the counter to change and reports it.
//!
//! The counter value itself is the notification, in the same way as an
//! incrementing task notification, so no completion is ever lost.  If the
//! observer is slow, several increments may be coalesced into one wake-up -
//! [`Completion::coalesced`] says how many were folded in.  The counter is
//! never reset and wraps at `u32::MAX`.

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

struct CounterState {
    count: u32,
    waker: WakerRegistration,
}

/// Process-wide count of completed transactions.  Single observer.
pub struct CompletionCounter<M: RawMutex> {
    state: Mutex<M, RefCell<CounterState>>,
}

impl<M: RawMutex> CompletionCounter<M> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(CounterState {
                count: 0,
                waker: WakerRegistration::new(),
            })),
        }
    }

    /// Count one completed cycle, returning the new value.
    pub fn increment(&self) -> u32 {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            state.count = state.count.wrapping_add(1);
            state.waker.wake();
            state.count
        })
    }

    pub fn value(&self) -> u32 {
        self.state.lock(|state| state.borrow().count)
    }

    /// Wait until the counter differs from `last_seen`, and return it.
    pub async fn wait_change(&self, last_seen: u32) -> u32 {
        poll_fn(|cx| {
            self.state.lock(|state| {
                let mut state = state.borrow_mut();
                if state.count != last_seen {
                    Poll::Ready(state.count)
                } else {
                    state.waker.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }
}

impl<M: RawMutex> Default for CompletionCounter<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// One observation of the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Counter value
    pub count: u32,
    /// Increments since the previous observation beyond the first
    pub coalesced: u32,
}

/// Low priority observer of a [`CompletionCounter`].
pub struct CompletionObserver<'a, M: RawMutex> {
    counter: &'a CompletionCounter<M>,
    last_seen: u32,
}

impl<'a, M: RawMutex> CompletionObserver<'a, M> {
    /// Observe `counter` from zero, so completions before the observer
    /// starts are still accounted for.
    pub fn new(counter: &'a CompletionCounter<M>) -> Self {
        Self {
            counter,
            last_seen: 0,
        }
    }

    /// Wait for the next change of the counter.
    pub async fn next(&mut self) -> Completion {
        let count = self.counter.wait_change(self.last_seen).await;
        let coalesced = count.wrapping_sub(self.last_seen).wrapping_sub(1);
        self.last_seen = count;
        Completion { count, coalesced }
    }

    /// Report every change of the counter, forever.
    pub async fn run(&mut self) {
        loop {
            let completion = self.next().await;
            info!("Transaction {} complete", completion.count);
            if completion.coalesced > 0 {
                debug!("{} further completions coalesced", completion.coalesced);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use futures::executor::block_on;

    #[test]
    fn observer_sees_each_increment() {
        let counter = CompletionCounter::<CriticalSectionRawMutex>::new();
        let mut observer = CompletionObserver::new(&counter);
        for expected in 1..=3 {
            assert_eq!(counter.increment(), expected);
            let completion = block_on(observer.next());
            assert_eq!(
                completion,
                Completion {
                    count: expected,
                    coalesced: 0
                }
            );
        }
    }

    #[test]
    fn slow_observer_is_told_about_coalescing() {
        let counter = CompletionCounter::<CriticalSectionRawMutex>::new();
        let mut observer = CompletionObserver::new(&counter);
        counter.increment();
        counter.increment();
        counter.increment();
        let completion = block_on(observer.next());
        assert_eq!(completion.count, 3);
        assert_eq!(completion.coalesced, 2);
        assert_eq!(counter.value(), 3);
    }

    #[test]
    fn observer_wakes_from_another_thread() {
        static COUNTER: CompletionCounter<CriticalSectionRawMutex> = CompletionCounter::new();
        let mut observer = CompletionObserver::new(&COUNTER);
        let handle = std::thread::spawn(|| {
            std::thread::sleep(std::time::Duration::from_millis(10));
            COUNTER.increment();
        });
        assert_eq!(block_on(observer.next()).count, 1);
        handle.join().unwrap();
    }
}
