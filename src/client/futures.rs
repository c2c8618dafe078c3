//! Asynchronous client - typically used by a Host.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::client::{READ_CHUNK_WORDS, Reply, Request};
use crate::command::MAX_WRITE_COUNT;
use crate::frame::{FRAME_SIZE, ResponseFrame};
use crate::transport::FrameLink;
use crate::{Error, Result};

/// Async client issuing memory access commands over a [`FrameLink`].
///
/// Only one request is ever outstanding - each call sends one frame and
/// waits for its response before returning, as the device only buffers a
/// single frame in each direction.
///
/// Example usage:
///
/// ```rust,ignore
/// use cmdframe_rpc::client::CommandClient;
///
/// let mut link = ...; // implement FrameLink, e.g. over a serial port
/// let mut client = CommandClient::new(&mut link);
/// client.write_word(0x4120_0000, 0x0000_000F).await?;
/// let value = client.read_word(0x4120_0008).await?;
/// ```
pub struct CommandClient<'a, L: FrameLink> {
    link: &'a mut L,
}

impl<'a, L: FrameLink> CommandClient<'a, L> {
    /// Create a client using `link`.  The link is borrowed for the life of
    /// the client.
    pub fn new(link: &'a mut L) -> Self {
        Self { link }
    }

    /// Send `request` and wait for its response.
    ///
    /// Returns:
    /// - `Ok(response)`: Response frame received from the device
    /// - `Err(Error::CommandRejected)`: Device answered with the
    ///   command-error response.  A 16 word [`Request::ReadSequential`] of
    ///   memory holding only [`CMD_ERROR`](crate::command::CMD_ERROR) also
    ///   lands here, see [`Reply::classify()`]
    /// - `Err(error)`: Request could not be built, or the link failed
    pub async fn request(&mut self, request: &Request<'_>) -> Result<ResponseFrame> {
        let tx = request.encode()?;
        debug!("Sending {request:?}");
        self.link.send_frame(&tx).await.map_err(|e| {
            warn!("Link send failed: {e:?}");
            Error::Io
        })?;

        let mut rx = [0u8; FRAME_SIZE];
        self.link.receive_frame(&mut rx).await.map_err(|e| {
            warn!("Link receive failed: {e:?}");
            Error::Io
        })?;

        let response = ResponseFrame::decode(&rx);
        match Reply::classify(&response, request.expected_words()) {
            Reply::CommandError => Err(Error::CommandRejected),
            _ => Ok(response),
        }
    }

    /// Write `value` to the word at `address`.
    pub async fn write_word(&mut self, address: u32, value: u32) -> Result<()> {
        let response = self.request(&Request::WriteWord { address, value }).await?;
        expect_write_okay(&response)
    }

    /// Read the word at `address`.
    pub async fn read_word(&mut self, address: u32) -> Result<u32> {
        let response = self.request(&Request::ReadWord { address }).await?;
        Ok(response.word(0))
    }

    /// Write `values` to consecutive words from `address`, splitting into as
    /// many requests as needed.
    pub async fn write_words(&mut self, address: u32, values: &[u32]) -> Result<()> {
        let mut addr = address;
        for chunk in values.chunks(MAX_WRITE_COUNT) {
            let response = self
                .request(&Request::WriteSequential {
                    address: addr,
                    values: chunk,
                })
                .await?;
            expect_write_okay(&response)?;
            addr = addr.wrapping_add(chunk.len() as u32 * 4);
        }
        Ok(())
    }

    /// Fill `buf` from consecutive words from `address`, splitting into as
    /// many requests as needed.
    ///
    /// Each request reads at most [`READ_CHUNK_WORDS`], so memory holding
    /// the command-error sentinel is still read back correctly.
    pub async fn read_words(&mut self, address: u32, buf: &mut [u32]) -> Result<()> {
        let mut addr = address;
        for chunk in buf.chunks_mut(READ_CHUNK_WORDS) {
            let response = self
                .request(&Request::ReadSequential {
                    address: addr,
                    count: chunk.len(),
                })
                .await?;
            chunk.copy_from_slice(&response.words()[..chunk.len()]);
            addr = addr.wrapping_add(chunk.len() as u32 * 4);
        }
        Ok(())
    }
}

fn expect_write_okay(response: &ResponseFrame) -> Result<()> {
    match Reply::classify(response, 0) {
        Reply::WriteOkay => Ok(()),
        Reply::CommandError => Err(Error::CommandRejected),
        Reply::Data(_) => Err(Error::UnexpectedReply),
    }
}
