//! In-memory link doubles for tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use pfxbrick_errors::{PfxResult, TransportError};

use crate::ble::{FRAME_END, GattLink, RxSink};
use crate::usb::HidReportIo;

/// Scripted HID report device. Clones share state.
#[derive(Clone, Default)]
pub struct MockReportIo {
    read_queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
    write_history: Arc<Mutex<Vec<Vec<u8>>>>,
    connected: Arc<Mutex<bool>>,
}

impl MockReportIo {
    pub fn new() -> Self {
        Self {
            connected: Arc::new(Mutex::new(true)),
            ..Self::default()
        }
    }

    pub fn queue_read(&self, data: Vec<u8>) {
        let mut queue = self.read_queue.lock();
        queue.push_back(data);
    }

    pub fn write_history(&self) -> Vec<Vec<u8>> {
        let history = self.write_history.lock();
        history.clone()
    }

    pub fn disconnect(&self) {
        let mut connected = self.connected.lock();
        *connected = false;
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }
}

impl HidReportIo for MockReportIo {
    fn write_report(&mut self, data: &[u8]) -> PfxResult<usize> {
        if !self.is_connected() {
            return Err(TransportError::Disconnected.into());
        }
        let mut history = self.write_history.lock();
        history.push(data.to_vec());
        Ok(data.len())
    }

    fn read_report(&mut self, buf: &mut [u8], _timeout_ms: i32) -> PfxResult<usize> {
        if !self.is_connected() {
            return Err(TransportError::Disconnected.into());
        }
        let mut queue = self.read_queue.lock();
        let Some(data) = queue.pop_front() else {
            return Ok(0);
        };
        let n = data.len().min(buf.len());
        if let (Some(dst), Some(src)) = (buf.get_mut(..n), data.get(..n)) {
            dst.copy_from_slice(src);
        }
        Ok(n)
    }
}

#[derive(Default)]
struct GattState {
    sink: Option<RxSink>,
    pending: Vec<u8>,
    chunks: Vec<Vec<u8>>,
    replies: VecDeque<Vec<Vec<u8>>>,
    connected: bool,
}

/// Scripted GATT link. Each complete request frame pops one queued reply,
/// delivered as one or more notification packets.
#[derive(Clone, Default)]
pub struct MockGattLink {
    state: Arc<Mutex<GattState>>,
}

impl MockGattLink {
    pub fn new() -> Self {
        let link = Self::default();
        link.lock().connected = true;
        link
    }

    fn lock(&self) -> MutexGuard<'_, GattState> {
        self.state.lock()
    }

    /// Queue a reply made of a single packet.
    pub fn queue_reply(&self, packet: Vec<u8>) {
        self.lock().replies.push_back(vec![packet]);
    }

    /// Queue a reply split over several packets.
    pub fn queue_packets(&self, packets: Vec<Vec<u8>>) {
        self.lock().replies.push_back(packets);
    }

    /// Deliver a packet now, outside any transaction.
    pub fn push_unsolicited(&self, packet: &[u8]) {
        let sink = self.lock().sink.clone();
        if let Some(sink) = sink {
            sink.deliver(packet);
        }
    }

    /// Every GATT write, in order.
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.lock().chunks.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Simulate the peripheral going away.
    pub fn drop_link(&self) {
        let sink = {
            let mut state = self.lock();
            state.connected = false;
            state.sink.clone()
        };
        if let Some(sink) = sink {
            sink.mark_disconnected();
        }
    }
}

#[async_trait]
impl GattLink for MockGattLink {
    async fn subscribe(&mut self, sink: RxSink) -> PfxResult<()> {
        self.lock().sink = Some(sink);
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> PfxResult<()> {
        let (sink, reply) = {
            let mut state = self.lock();
            if !state.connected {
                return Err(TransportError::Disconnected.into());
            }
            state.chunks.push(chunk.to_vec());
            state.pending.extend_from_slice(chunk);
            if !state.pending.ends_with(&FRAME_END) {
                return Ok(());
            }
            state.pending.clear();
            (state.sink.clone(), state.replies.pop_front())
        };
        if let (Some(sink), Some(packets)) = (sink, reply) {
            for p in packets {
                sink.deliver(&p);
            }
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> PfxResult<()> {
        self.lock().connected = false;
        Ok(())
    }
}
