//! USB-HID channel.
//!
//! Each transaction writes one 65-byte output report (report id 0 followed
//! by the request, zero-padded) and reads 64-byte input reports until the
//! one tagged `opcode | 0x80` arrives or the read timeout is spent. Replies
//! to earlier, timed-out requests are dropped on the way.
//!
//! The hidapi calls block, so async callers run them on tokio's blocking
//! pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use pfxbrick_errors::{PfxResult, TransportError};
use pfxbrick_hid_protocol::{
    OUTPUT_REPORT_LEN, PFX_USB_PRODUCT_ID, PFX_USB_VENDOR_ID, REPLY_BIT, REPORT_LEN, opcode_name,
};
use tracing::{debug, info, trace};

use crate::channel::{Concurrency, DeviceChannel, check_request, check_response};
use crate::config::TransportConfig;
use crate::device_info::BrickDeviceInfo;

/// Raw report I/O, implemented for [`hidapi::HidDevice`] and for test mocks.
pub trait HidReportIo: Send + 'static {
    /// Write one output report (report id first).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Write`] on a failed write.
    fn write_report(&mut self, data: &[u8]) -> PfxResult<usize>;

    /// Read one input report into `buf`, waiting up to `timeout_ms`.
    /// Returns 0 on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Read`] on a failed read.
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> PfxResult<usize>;
}

impl HidReportIo for HidDevice {
    fn write_report(&mut self, data: &[u8]) -> PfxResult<usize> {
        self.write(data)
            .map_err(|e| TransportError::Write(e.to_string()).into())
    }

    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> PfxResult<usize> {
        self.read_timeout(buf, timeout_ms)
            .map_err(|e| TransportError::Read(e.to_string()).into())
    }
}

/// List every PFx Brick on the USB bus, one entry per serial number.
///
/// # Errors
///
/// Returns [`TransportError::Open`] if the HID subsystem cannot be initialised.
pub fn find_bricks() -> PfxResult<Vec<BrickDeviceInfo>> {
    let api = HidApi::new().map_err(|e| TransportError::Open(e.to_string()))?;
    Ok(enumerate(&api))
}

fn enumerate(api: &HidApi) -> Vec<BrickDeviceInfo> {
    let mut found: Vec<BrickDeviceInfo> = Vec::new();
    for dev in api.device_list() {
        if dev.vendor_id() != PFX_USB_VENDOR_ID || dev.product_id() != PFX_USB_PRODUCT_ID {
            continue;
        }
        let serial = dev.serial_number().map(str::to_string);
        if found.iter().any(|f| f.serial_number == serial) {
            continue;
        }
        let mut info = BrickDeviceInfo::usb(
            dev.vendor_id(),
            dev.product_id(),
            dev.path().to_string_lossy(),
        );
        info.serial_number = serial;
        info.manufacturer = dev.manufacturer_string().map(str::to_string);
        info.product_name = dev.product_string().map(str::to_string);
        found.push(info);
    }
    found
}

/// USB-HID channel. The device sits behind a shared lock so a transaction
/// can move onto a blocking worker thread.
pub struct UsbChannel<D: HidReportIo = HidDevice> {
    device: Option<Arc<Mutex<D>>>,
    info: BrickDeviceInfo,
    config: TransportConfig,
}

impl UsbChannel<HidDevice> {
    /// Open a brick by serial number. Without a serial number exactly one
    /// brick must be connected.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotFound`] if no brick (or no brick with the
    /// given serial) is connected or if several are and none was selected,
    /// and [`TransportError::Open`] if the device cannot be opened.
    pub fn open(serial: Option<&str>, config: TransportConfig) -> PfxResult<Self> {
        let api = HidApi::new().map_err(|e| TransportError::Open(e.to_string()))?;
        let bricks = enumerate(&api);
        let info = match serial {
            Some(sn) => bricks
                .into_iter()
                .find(|b| b.serial_number.as_deref() == Some(sn))
                .ok_or_else(|| {
                    TransportError::NotFound(format!("no PFx Brick with serial number {sn}"))
                })?,
            None => {
                let count = bricks.len();
                let mut it = bricks.into_iter();
                match (it.next(), count) {
                    (Some(only), 1) => only,
                    (None, _) => {
                        return Err(TransportError::NotFound(
                            "no PFx Bricks are connected".to_string(),
                        )
                        .into());
                    }
                    _ => {
                        return Err(TransportError::NotFound(format!(
                            "{count} PFx Bricks are connected, a serial number is required"
                        ))
                        .into());
                    }
                }
            }
        };
        let device = match info.serial_number.as_deref() {
            Some(sn) => api.open_serial(PFX_USB_VENDOR_ID, PFX_USB_PRODUCT_ID, sn),
            None => api.open(PFX_USB_VENDOR_ID, PFX_USB_PRODUCT_ID),
        }
        .map_err(|e| TransportError::Open(e.to_string()))?;
        info!(brick = %info.display_name(), "opened USB session");
        Ok(Self::new(device, info, config))
    }
}

impl<D: HidReportIo> UsbChannel<D> {
    pub fn new(device: D, info: BrickDeviceInfo, config: TransportConfig) -> Self {
        Self {
            device: Some(Arc::new(Mutex::new(device))),
            info,
            config,
        }
    }

    /// Run one transaction on the calling thread.
    ///
    /// # Errors
    ///
    /// See [`DeviceChannel::transact`].
    pub fn transact_blocking(&mut self, request: &[u8]) -> PfxResult<Vec<u8>> {
        let device = self.device.as_ref().ok_or(TransportError::Closed)?;
        let mut guard = device.lock();
        exchange(&mut *guard, request, &self.config)
    }
}

/// Write `request` and read reports until its reply arrives.
fn exchange<D: HidReportIo>(device: &mut D, request: &[u8], config: &TransportConfig) -> PfxResult<Vec<u8>> {
    let opcode = check_request(request)?;
    let waited_ms = config.usb_budget_ms();
    let started = Instant::now();
    let budget = Duration::from_millis(waited_ms);

    let mut report = [0u8; OUTPUT_REPORT_LEN];
    if let Some(dst) = report.get_mut(1..=request.len()) {
        dst.copy_from_slice(request);
    }
    debug!(opcode = format_args!("{opcode:#04x}"), name = opcode_name(opcode), "usb request");
    trace!(bytes = ?request, "usb tx");
    device.write_report(&report)?;

    let expected = opcode | REPLY_BIT;
    let mut buf = [0u8; REPORT_LEN];
    loop {
        let remaining = budget.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(TransportError::ResponseTimeout { waited_ms }.into());
        }
        let timeout_ms = i32::try_from(remaining.as_millis()).unwrap_or(i32::MAX).max(1);
        let n = device.read_report(&mut buf, timeout_ms)?;
        if n == 0 {
            return Err(TransportError::ResponseTimeout { waited_ms }.into());
        }
        let response = buf.get(..n).unwrap_or(&buf).to_vec();
        trace!(bytes = ?response, "usb rx");
        match response.first() {
            Some(&tag) if tag != expected && tag & REPLY_BIT != 0 => {
                debug!(
                    tag = format_args!("{tag:#04x}"),
                    expected = format_args!("{expected:#04x}"),
                    "dropping stale usb reply"
                );
            }
            _ => {
                check_response(opcode, &response)?;
                return Ok(response);
            }
        }
    }
}

#[async_trait]
impl<D: HidReportIo> DeviceChannel for UsbChannel<D> {
    fn concurrency(&self) -> Concurrency {
        Concurrency::Blocking
    }

    fn info(&self) -> &BrickDeviceInfo {
        &self.info
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }

    async fn transact(&mut self, request: &[u8]) -> PfxResult<Vec<u8>> {
        let device = Arc::clone(self.device.as_ref().ok_or(TransportError::Closed)?);
        let request = request.to_vec();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = device.lock();
            exchange(&mut *guard, &request, &config)
        })
        .await
        .map_err(|e| TransportError::Read(format!("USB worker failed: {e}")))?
    }

    async fn close(&mut self) -> PfxResult<()> {
        if self.device.take().is_some() {
            info!(brick = %self.info.display_name(), "closed USB session");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockReportIo;
    use pfxbrick_errors::PfxError;

    fn channel(io: MockReportIo) -> UsbChannel<MockReportIo> {
        UsbChannel::new(
            io,
            BrickDeviceInfo::usb(PFX_USB_VENDOR_ID, PFX_USB_PRODUCT_ID, "mock"),
            TransportConfig::default(),
        )
    }

    #[test]
    fn test_report_framing() -> Result<(), Box<dyn std::error::Error>> {
        let io = MockReportIo::new();
        io.queue_read(vec![0x81, 0x03, 0x39]);
        let mut ch = channel(io.clone());
        let res = ch.transact_blocking(&[0x01, 0xA5, 0x5A, 0x6E, 0x00])?;
        assert_eq!(res, vec![0x81, 0x03, 0x39]);
        let writes = io.write_history();
        assert_eq!(writes.len(), 1);
        let report = writes.first().ok_or("no write")?;
        assert_eq!(report.len(), OUTPUT_REPORT_LEN);
        assert_eq!(report.get(..6), Some(&[0x00, 0x01, 0xA5, 0x5A, 0x6E, 0x00][..]));
        Ok(())
    }

    #[test]
    fn test_timeout_and_mismatch() {
        let io = MockReportIo::new();
        let mut ch = channel(io.clone());
        assert!(matches!(
            ch.transact_blocking(&[0x03]),
            Err(PfxError::Transport(TransportError::ResponseTimeout { waited_ms: 1000 }))
        ));
        io.queue_read(vec![0x04]);
        assert!(matches!(
            ch.transact_blocking(&[0x03]),
            Err(PfxError::Transport(TransportError::InvalidResponse {
                expected: 0x83,
                actual: 0x04
            }))
        ));
    }

    #[test]
    fn test_late_reply_does_not_desync() -> Result<(), Box<dyn std::error::Error>> {
        let io = MockReportIo::new();
        let mut ch = channel(io.clone());
        assert!(ch.transact_blocking(&[0x03]).is_err());

        // The reply to 0x03 turns up after its transaction gave up.
        io.queue_read(vec![0x83, 0x00]);
        io.queue_read(vec![0x84, 0x01]);
        assert_eq!(ch.transact_blocking(&[0x04])?, vec![0x84, 0x01]);

        io.queue_read(vec![0x85, 0x02]);
        assert_eq!(ch.transact_blocking(&[0x05])?, vec![0x85, 0x02]);
        assert_eq!(io.write_history().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_async_transact_runs_off_the_runtime() -> Result<(), Box<dyn std::error::Error>> {
        let io = MockReportIo::new();
        io.queue_read(vec![0x82, 0x00]);
        io.queue_read(vec![0x8C, b'P']);
        let mut ch = channel(io.clone());
        assert_eq!(ch.transact(&[0x0C]).await?, vec![0x8C, b'P']);
        assert_eq!(io.write_history().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_channel_rejects() -> Result<(), Box<dyn std::error::Error>> {
        let mut ch = channel(MockReportIo::new());
        ch.close().await?;
        assert!(!ch.is_open());
        assert!(matches!(
            ch.transact(&[0x0C]).await,
            Err(PfxError::Transport(TransportError::Closed))
        ));
        Ok(())
    }
}
