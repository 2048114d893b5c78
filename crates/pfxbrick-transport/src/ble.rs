//! Bluetooth LE channel over a transparent-UART GATT service.
//!
//! Requests are wrapped as `[[[ request ]]]` (`0x5B` x3, `0x5D` x3) and
//! written in chunks of at most 20 bytes. Responses arrive as notifications
//! on the receive characteristic; the receive callback fills a single-slot
//! mailbox that the waiting transaction polls. Unsolicited notification
//! frames in the same packets are routed to subscribers and never land in
//! the mailbox.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use pfxbrick_errors::{PfxResult, TransportError};
use pfxbrick_hid_protocol::{opcode_name, strip_leading_notifications};
use tracing::{debug, error, info, trace, warn};

use crate::channel::{Concurrency, DeviceChannel, check_request, check_response};
use crate::config::TransportConfig;
use crate::device_info::BrickDeviceInfo;
use crate::notify::NotificationRouter;

pub const FRAME_START: [u8; 3] = [0x5B; 3];
pub const FRAME_END: [u8; 3] = [0x5D; 3];

/// Largest single GATT write.
pub const BLE_CHUNK_LEN: usize = 20;

/// Wrap a request in start/end delimiters.
pub fn frame_request(request: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(request.len() + FRAME_START.len() + FRAME_END.len());
    framed.extend_from_slice(&FRAME_START);
    framed.extend_from_slice(request);
    framed.extend_from_slice(&FRAME_END);
    framed
}

/// Receive side handed to the GATT link. Cloneable and callable from any
/// thread the BLE stack delivers on.
#[derive(Clone, Debug)]
pub struct RxSink {
    mailbox: Arc<Mutex<Option<Vec<u8>>>>,
    router: NotificationRouter,
    disconnected: Arc<AtomicBool>,
}

impl RxSink {
    fn new(router: NotificationRouter) -> Self {
        Self {
            mailbox: Arc::new(Mutex::new(None)),
            router,
            disconnected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle one received packet.
    pub fn deliver(&self, packet: &[u8]) {
        trace!(bytes = ?packet, "ble rx");
        self.router.dispatch_buffer(packet);
        let rest = strip_leading_notifications(packet);
        if !rest.is_empty() {
            let mut slot = self.mailbox.lock();
            if slot.is_some() {
                warn!("unclaimed BLE response overwritten");
            }
            *slot = Some(rest.to_vec());
        }
    }

    /// Record that the peripheral dropped the connection.
    pub fn mark_disconnected(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    fn take(&self) -> Option<Vec<u8>> {
        self.mailbox.lock().take()
    }
}

/// The GATT operations the channel needs from a BLE stack.
#[async_trait]
pub trait GattLink: Send {
    /// Start notifications on the receive characteristic, feeding `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Ble`] if the subscription fails.
    async fn subscribe(&mut self, sink: RxSink) -> PfxResult<()>;

    /// Write one chunk to the transmit characteristic.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Ble`] or [`TransportError::Disconnected`].
    async fn write_chunk(&mut self, chunk: &[u8]) -> PfxResult<()>;

    /// # Errors
    ///
    /// Returns [`TransportError::Ble`] if the stack reports a failure.
    async fn disconnect(&mut self) -> PfxResult<()>;
}

/// Suspending BLE channel.
pub struct BleChannel<L: GattLink> {
    link: L,
    sink: RxSink,
    router: NotificationRouter,
    info: BrickDeviceInfo,
    config: TransportConfig,
    open: bool,
}

impl<L: GattLink> BleChannel<L> {
    /// Subscribe to the link's receive path and return an open channel.
    ///
    /// # Errors
    ///
    /// Propagates subscription failures from the link.
    pub async fn open(mut link: L, info: BrickDeviceInfo, config: TransportConfig) -> PfxResult<Self> {
        let router = NotificationRouter::new();
        let sink = RxSink::new(router.clone());
        link.subscribe(sink.clone()).await?;
        info!(brick = %info.display_name(), "opened BLE session");
        Ok(Self {
            link,
            sink,
            router,
            info,
            config,
            open: true,
        })
    }

    async fn teardown(&mut self) {
        self.open = false;
        if let Err(e) = self.link.disconnect().await {
            warn!(error = %e, "BLE disconnect failed during teardown");
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

#[async_trait]
impl<L: GattLink> DeviceChannel for BleChannel<L> {
    fn concurrency(&self) -> Concurrency {
        Concurrency::Suspending
    }

    fn info(&self) -> &BrickDeviceInfo {
        &self.info
    }

    fn is_open(&self) -> bool {
        self.open && !self.sink.is_disconnected()
    }

    async fn transact(&mut self, request: &[u8]) -> PfxResult<Vec<u8>> {
        let opcode = check_request(request)?;
        if !self.open {
            return Err(TransportError::Closed.into());
        }
        if self.sink.is_disconnected() {
            warn!(brick = %self.info.path, "unexpected disconnection from PFx Brick");
            self.open = false;
            return Err(TransportError::Disconnected.into());
        }
        drop(self.sink.take());

        debug!(opcode = format_args!("{opcode:#04x}"), name = opcode_name(opcode), "ble request");
        let framed = frame_request(request);
        for chunk in framed.chunks(BLE_CHUNK_LEN) {
            trace!(bytes = ?chunk, "ble tx");
            self.link.write_chunk(chunk).await?;
        }

        let interval = self.config.ble_poll_interval();
        for _ in 0..self.config.ble_max_retries {
            if let Some(response) = self.sink.take() {
                check_response(opcode, &response)?;
                return Ok(response);
            }
            if self.sink.is_disconnected() {
                self.open = false;
                return Err(TransportError::Disconnected.into());
            }
            tokio::time::sleep(interval).await;
        }

        let waited_ms = self.config.ble_budget_ms();
        error!(brick = %self.info.path, waited_ms, "timeout waiting for response from PFx Brick");
        self.teardown().await;
        Err(TransportError::ResponseTimeout { waited_ms }.into())
    }

    async fn close(&mut self) -> PfxResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.router.clear_subscribers();
        self.link.disconnect().await?;
        info!(brick = %self.info.path, "connection closed with PFx Brick");
        Ok(())
    }

    fn notifications(&self) -> Option<NotificationRouter> {
        Some(self.router.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGattLink;
    use pfxbrick_errors::PfxError;
    use pfxbrick_hid_protocol::Notification;

    async fn open(link: &MockGattLink) -> PfxResult<BleChannel<MockGattLink>> {
        BleChannel::open(
            link.clone(),
            BrickDeviceInfo::ble("24:71:89:cc:09:05"),
            TransportConfig::default(),
        )
        .await
    }

    #[test]
    fn test_framing() {
        assert_eq!(
            frame_request(&[0x0C]),
            vec![0x5B, 0x5B, 0x5B, 0x0C, 0x5D, 0x5D, 0x5D]
        );
    }

    #[tokio::test]
    async fn test_long_request_is_chunked() -> Result<(), Box<dyn std::error::Error>> {
        let link = MockGattLink::new();
        link.queue_reply(vec![0x88, 0x00]);
        let mut ch = open(&link).await?;
        let request: Vec<u8> = std::iter::once(0x08).chain(0..18).collect();
        let res = ch.transact(&request).await?;
        assert_eq!(res, vec![0x88, 0x00]);
        let sizes: Vec<usize> = link.chunks().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![20, 5]);
        Ok(())
    }

    #[tokio::test]
    async fn test_notification_before_response_is_routed() -> Result<(), Box<dyn std::error::Error>> {
        let link = MockGattLink::new();
        link.queue_packets(vec![vec![0x7E, 0x02, 0x21], vec![0x8C, b'L', b'o']]);
        let mut ch = open(&link).await?;
        let router = ch.notifications().ok_or("no router")?;
        router.set_file_names([(0x21, "horn.wav".to_string())]);
        let mut rx = router.subscribe_channel();

        let res = ch.transact(&[0x0C]).await?;
        assert_eq!(res, vec![0x8C, b'L', b'o']);
        let event = rx.try_recv()?;
        assert_eq!(event.notification, Notification::AudioPlay { file_id: 0x21 });
        assert_eq!(event.file_name.as_deref(), Some("horn.wav"));
        Ok(())
    }

    #[tokio::test]
    async fn test_notification_prefix_in_same_packet() -> Result<(), Box<dyn std::error::Error>> {
        let link = MockGattLink::new();
        link.queue_reply(vec![0x7E, 0x08, 0x00, 0x81, 0x03, 0x39]);
        let mut ch = open(&link).await?;
        assert_eq!(ch.transact(&[0x01]).await?, vec![0x81, 0x03, 0x39]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_tears_down() -> Result<(), Box<dyn std::error::Error>> {
        let link = MockGattLink::new();
        let mut ch = open(&link).await?;
        let res = ch.transact(&[0x02]).await;
        assert!(matches!(
            res,
            Err(PfxError::Transport(TransportError::ResponseTimeout { waited_ms: 1000 }))
        ));
        assert!(!ch.is_open());
        assert!(!link.is_connected());
        assert!(matches!(
            ch.transact(&[0x02]).await,
            Err(PfxError::Transport(TransportError::Closed))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_unexpected_disconnect() -> Result<(), Box<dyn std::error::Error>> {
        let link = MockGattLink::new();
        let mut ch = open(&link).await?;
        link.drop_link();
        assert!(!ch.is_open());
        assert!(matches!(
            ch.transact(&[0x02]).await,
            Err(PfxError::Transport(TransportError::Disconnected))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_mismatched_tag_is_invalid() -> Result<(), Box<dyn std::error::Error>> {
        let link = MockGattLink::new();
        link.queue_reply(vec![0x83]);
        let mut ch = open(&link).await?;
        assert!(matches!(
            ch.transact(&[0x02]).await,
            Err(PfxError::Transport(TransportError::InvalidResponse { .. }))
        ));
        Ok(())
    }
}
