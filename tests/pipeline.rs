//! End to end tests of the receive/process/transmit pipeline.

#![cfg(feature = "async")]

use core::pin::pin;
use std::cell::RefCell;

use async_trait::async_trait;
use cmdframe_rpc::command::{
    CMD_ERROR, READ_SEQUENTIAL, READ_WORD, WRITE_OKAY, WRITE_SEQUENTIAL, WRITE_WORD,
};
use cmdframe_rpc::frame::{RawFrame, RequestFrame, ResponseFrame};
use cmdframe_rpc::handoff::OverflowPolicy;
use cmdframe_rpc::memory::RamMemory;
use cmdframe_rpc::notifier::CompletionObserver;
use cmdframe_rpc::pipeline::{PipelineResources, ProcessStage, ReceiveStage, TransmitStage};
use cmdframe_rpc::transport::{AsyncFrameWriter, FrameReader, FrameWriter};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use futures::executor::block_on;
use futures::future::{join, select};

const BASE: u32 = 0x4120_0000;

type Resources = PipelineResources<CriticalSectionRawMutex>;

/// UART receive side holding the next frame to hand over.
struct UartRx(Option<RawFrame>);

impl FrameReader for UartRx {
    type Error = ();

    fn receive_exact(&mut self, buf: &mut RawFrame) -> Result<(), Self::Error> {
        *buf = self.0.take().ok_or(())?;
        Ok(())
    }
}

/// UART transmit side recording everything sent.
#[derive(Default)]
struct UartTx(RefCell<Vec<RawFrame>>);

/// Shared handle used by the async transmit stage.
struct TxHandle<'a>(&'a UartTx);

#[async_trait(?Send)]
impl<'a> AsyncFrameWriter for TxHandle<'a> {
    type Error = ();

    async fn send_exact(&mut self, buf: &RawFrame) -> Result<(), Self::Error> {
        self.0.0.borrow_mut().push(*buf);
        Ok(())
    }
}

impl FrameWriter for UartTx {
    type Error = ();

    fn send_exact(&mut self, buf: &RawFrame) -> Result<(), Self::Error> {
        self.0.get_mut().push(*buf);
        Ok(())
    }
}

fn request(command: u16, count: u16, address: u32, payload: &[u32]) -> RawFrame {
    let mut frame = RequestFrame {
        command,
        count,
        address,
        ..Default::default()
    };
    frame.data[..payload.len()].copy_from_slice(payload);
    frame.encode()
}

/// Run the async pipeline over `requests`, one transaction at a time,
/// returning the responses in the order they were transmitted.
fn run_transactions(requests: &[RawFrame]) -> Vec<ResponseFrame> {
    let resources = Resources::new(OverflowPolicy::Overwrite);
    let receive = ReceiveStage::new(&resources.inbound);
    let mut process = ProcessStage::new(
        &resources.inbound,
        &resources.outbound,
        RamMemory::<64>::new(BASE),
    );
    let mut transmit = TransmitStage::new(&resources.outbound).with_completions(&resources.completions);
    let mut observer = CompletionObserver::new(&resources.completions);
    let uart_tx = UartTx::default();
    let mut writer = TxHandle(&uart_tx);

    block_on(async {
        let host = pin!(async {
            for (idx, frame) in requests.iter().enumerate() {
                receive.on_inbound_ready(&mut UartRx(Some(*frame)));
                let completion = observer.next().await;
                assert_eq!(completion.count, idx as u32 + 1);
                assert_eq!(completion.coalesced, 0);
            }
        });
        let stages = pin!(join(process.run(), transmit.run(&mut writer)));
        select(host, stages).await;
    });

    assert_eq!(resources.dropped_frames(), 0);
    uart_tx
        .0
        .into_inner()
        .iter()
        .map(ResponseFrame::decode)
        .collect()
}

#[test]
fn write_then_read_word() {
    let responses = run_transactions(&[
        request(WRITE_WORD, 0, BASE + 0x10, &[0xDEAD_BEEF]),
        request(READ_WORD, 0, BASE + 0x10, &[]),
    ]);
    assert_eq!(responses.len(), 2);
    assert!(responses[0].is_filled_with(WRITE_OKAY));
    assert_eq!(responses[1].word(0), 0xDEAD_BEEF);
}

#[test]
fn sequential_write_then_read() {
    let responses = run_transactions(&[
        request(WRITE_SEQUENTIAL, 3, BASE, &[11, 22, 33]),
        request(READ_SEQUENTIAL, 2, BASE + 4, &[]),
        request(READ_WORD, 0, BASE + 8, &[]),
    ]);
    assert!(responses[0].is_filled_with(WRITE_OKAY));
    assert_eq!(&responses[1].words()[..3], &[22, 33, 0]);
    assert_eq!(responses[2].word(0), 33);
}

#[test]
fn responses_stay_in_order() {
    let mut requests = Vec::new();
    for n in 0..20u32 {
        requests.push(request(WRITE_WORD, 0, BASE + n * 4, &[n * 7]));
        requests.push(request(READ_WORD, 0, BASE + n * 4, &[]));
    }
    requests.push(request(0x00FF, 0, BASE, &[]));

    let responses = run_transactions(&requests);
    assert_eq!(responses.len(), 41);
    for n in 0..20usize {
        assert!(responses[n * 2].is_filled_with(WRITE_OKAY));
        let read = &responses[n * 2 + 1];
        assert_eq!(read.word(0), n as u32 * 7);
        assert!(read.words()[1..].iter().all(|w| *w == 0));
    }
    assert!(responses[40].is_filled_with(CMD_ERROR));
}

#[test]
fn errors_do_not_stop_the_pipeline() {
    let responses = run_transactions(&[
        request(0xBEEF, 0, BASE, &[]),
        request(WRITE_SEQUENTIAL, 200, BASE, &[]),
        request(READ_WORD, 0, BASE + 1, &[]),
        request(WRITE_WORD, 0, BASE, &[5]),
    ]);
    assert!(responses[0].is_filled_with(CMD_ERROR));
    assert!(responses[1].is_filled_with(CMD_ERROR));
    assert!(responses[2].is_filled_with(CMD_ERROR));
    assert!(responses[3].is_filled_with(WRITE_OKAY));
}

fn back_to_back(policy: OverflowPolicy) -> (RamMemory<8>, Vec<ResponseFrame>, u32) {
    let resources = Resources::new(policy);
    let receive = ReceiveStage::new(&resources.inbound);
    let mut process = ProcessStage::new(
        &resources.inbound,
        &resources.outbound,
        RamMemory::<8>::new(BASE),
    );
    let mut transmit = TransmitStage::new(&resources.outbound).with_completions(&resources.completions);
    let mut uart_tx = UartTx::default();

    // Second frame arrives before the first leaves the inbound channel.
    receive.on_inbound_ready(&mut UartRx(Some(request(WRITE_WORD, 0, BASE, &[0x1111_1111]))));
    receive.on_inbound_ready(&mut UartRx(Some(request(
        WRITE_WORD,
        0,
        BASE + 4,
        &[0x2222_2222],
    ))));

    while process.poll() || transmit.poll(&mut uart_tx) {}

    let responses = uart_tx.0.into_inner().iter().map(ResponseFrame::decode).collect();
    let dropped = resources.dropped_frames();
    (process.executor().memory().clone(), responses, dropped)
}

#[test]
fn overwrite_processes_only_newest_frame() {
    let (memory, responses, dropped) = back_to_back(OverflowPolicy::Overwrite);
    assert_eq!(memory.words()[..2], [0, 0x2222_2222]);
    assert_eq!(responses.len(), 1);
    assert!(responses[0].is_filled_with(WRITE_OKAY));
    assert_eq!(dropped, 1);
}

#[test]
fn keep_pending_processes_only_oldest_frame() {
    let (memory, responses, dropped) = back_to_back(OverflowPolicy::KeepPending);
    assert_eq!(memory.words()[..2], [0x1111_1111, 0]);
    assert_eq!(responses.len(), 1);
    assert_eq!(dropped, 1);
}

#[test]
fn frame_after_drain_queues_normally() {
    let resources = Resources::new(OverflowPolicy::Overwrite);
    let receive = ReceiveStage::new(&resources.inbound);
    let mut process = ProcessStage::new(
        &resources.inbound,
        &resources.outbound,
        RamMemory::<8>::new(BASE),
    );
    let mut transmit = TransmitStage::new(&resources.outbound);
    let mut uart_tx = UartTx::default();

    receive.on_inbound_ready(&mut UartRx(Some(request(WRITE_WORD, 0, BASE, &[1]))));
    assert!(process.poll());
    // Response still waiting for the transmit stage
    receive.on_inbound_ready(&mut UartRx(Some(request(READ_WORD, 0, BASE, &[]))));
    assert!(transmit.poll(&mut uart_tx));
    assert!(process.poll());
    assert!(transmit.poll(&mut uart_tx));

    let sent = uart_tx.0.into_inner();
    assert_eq!(sent.len(), 2);
    assert_eq!(ResponseFrame::decode(&sent[1]).word(0), 1);
    assert_eq!(resources.dropped_frames(), 0);
    assert_eq!(transmit.stats().sent, 2);
}
