//! Transport traits - the serial link (or similar) frames travel over.
//!
//! The transport moves frames in fixed 64 byte units.  There are no
//! delimiters or checksums on the wire, so frame boundaries are entirely
//! defined by the transport delivering exactly [`FRAME_SIZE`](crate::frame::FRAME_SIZE) bytes at a
//! time.
//!
//! Device side:
//! - [`FrameReader`] - called from the transport's "inbound data ready"
//!   handler, once per fully received frame.  Must not block.
//! - [`FrameWriter`] / `AsyncFrameWriter` (`async` feature) - used by the
//!   transmit stage to send the response.
//!
//! Host side:
//! - [`FrameLink`] - send a request and receive the response, used by
//!   `client::CommandClient`.
//!
//! Bringing up the underlying UART, interrupt controller, etc is left to
//! the application.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#[cfg(feature = "async")]
use alloc::boxed::Box;
#[cfg(feature = "async")]
use async_trait::async_trait;

use crate::frame::RawFrame;

/// Inbound side of the device transport.
pub trait FrameReader {
    /// The error type returned by read operations.
    ///
    /// This allows implementations to use their own error types
    /// (e.g. `std::io::Error` for a host serial port, or a HAL error).
    type Error: core::fmt::Debug;

    /// Copy exactly [`FRAME_SIZE`](crate::frame::FRAME_SIZE) received bytes into `buf`.
    ///
    /// Only called once the transport has signalled that a whole frame has
    /// arrived, typically from interrupt context, so must complete quickly.
    fn receive_exact(&mut self, buf: &mut RawFrame) -> Result<(), Self::Error>;
}

/// Outbound side of the device transport, blocking version.
pub trait FrameWriter {
    type Error: core::fmt::Debug;

    /// Transmit exactly [`FRAME_SIZE`](crate::frame::FRAME_SIZE) bytes.
    fn send_exact(&mut self, buf: &RawFrame) -> Result<(), Self::Error>;
}

/// Outbound side of the device transport, async version.
#[cfg(feature = "async")]
#[async_trait(?Send)]
pub trait AsyncFrameWriter {
    type Error: core::fmt::Debug;

    /// Transmit exactly [`FRAME_SIZE`](crate::frame::FRAME_SIZE) bytes.
    async fn send_exact(&mut self, buf: &RawFrame) -> Result<(), Self::Error>;
}

/// Host end of the link.
pub trait FrameLink {
    type Error: core::fmt::Debug;

    /// Send a request frame to the device.
    fn send_frame(
        &mut self,
        buf: &RawFrame,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Wait for the next response frame from the device.
    fn receive_frame(
        &mut self,
        buf: &mut RawFrame,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}
