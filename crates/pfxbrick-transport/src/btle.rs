//! `btleplug` backend for [`BleChannel`].

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::bleuuid::uuid_from_u16;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use pfxbrick_errors::{PfxError, PfxResult, TransportError};
use pfxbrick_hid_protocol::is_pfx_ble_name;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ble::{BleChannel, GattLink, RxSink};
use crate::config::TransportConfig;
use crate::device_info::BrickDeviceInfo;

/// Transparent UART service exposed by the brick's BLE module.
pub const UART_SERVICE_UUID: Uuid = Uuid::from_u128(0x4953_5343_fe7d_4ae5_8fa9_9faf_d205_e455);
/// Host-to-brick characteristic.
pub const UART_TX_UUID: Uuid = Uuid::from_u128(0x4953_5343_8841_43f4_a8d4_ecbe_3472_9bb3);
/// Brick-to-host characteristic.
pub const UART_RX_UUID: Uuid = Uuid::from_u128(0x4953_5343_1e4d_4bd9_ba61_23c6_4724_9616);

const DEVICE_INFO_SERVICE: u16 = 0x180A;
const SERIAL_NUMBER_CHAR: u16 = 0x2A25;

fn ble_err(e: btleplug::Error) -> PfxError {
    TransportError::Ble(e.to_string()).into()
}

/// A brick seen during a scan.
#[derive(Debug, Clone)]
pub struct BleCandidate {
    pub name: String,
    pub address: String,
    peripheral: Peripheral,
}

async fn first_adapter() -> PfxResult<Adapter> {
    let manager = Manager::new().await.map_err(ble_err)?;
    manager
        .adapters()
        .await
        .map_err(ble_err)?
        .into_iter()
        .next()
        .ok_or_else(|| TransportError::NotFound("no Bluetooth adapter available".to_string()).into())
}

/// Scan for advertising bricks for `duration`.
///
/// # Errors
///
/// Returns [`TransportError::Ble`] if the adapter cannot scan and
/// [`TransportError::NotFound`] if there is no adapter.
pub async fn scan(duration: Duration) -> PfxResult<Vec<BleCandidate>> {
    let central = first_adapter().await?;
    central
        .start_scan(ScanFilter::default())
        .await
        .map_err(ble_err)?;
    tokio::time::sleep(duration).await;
    let peripherals = central.peripherals().await.map_err(ble_err)?;
    if let Err(e) = central.stop_scan().await {
        warn!(error = %e, "failed to stop BLE scan");
    }

    let mut found = Vec::new();
    for p in peripherals {
        let name = p
            .properties()
            .await
            .map_err(ble_err)?
            .and_then(|props| props.local_name);
        if let Some(name) = name.filter(|n| is_pfx_ble_name(n)) {
            debug!(%name, address = %p.address(), "found PFx Brick");
            found.push(BleCandidate {
                name,
                address: p.address().to_string(),
                peripheral: p,
            });
        }
    }
    Ok(found)
}

/// Live GATT connection to one brick.
pub struct BtleplugLink {
    peripheral: Peripheral,
    tx: Characteristic,
    rx: Characteristic,
    pump: Option<JoinHandle<()>>,
}

impl BtleplugLink {
    /// Connect, discover services and locate the UART characteristics.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Ble`] on a GATT failure and
    /// [`TransportError::NotFound`] if the UART service is missing.
    pub async fn connect(peripheral: Peripheral) -> PfxResult<Self> {
        peripheral.connect().await.map_err(ble_err)?;
        peripheral.discover_services().await.map_err(ble_err)?;
        let chars = peripheral.characteristics();
        let find = |uuid: Uuid| {
            chars.iter().find(|c| c.uuid == uuid).cloned().ok_or_else(|| {
                PfxError::from(TransportError::NotFound(format!(
                    "characteristic {uuid} missing from PFx Brick"
                )))
            })
        };
        let tx = find(UART_TX_UUID)?;
        let rx = find(UART_RX_UUID)?;
        Ok(Self {
            peripheral,
            tx,
            rx,
            pump: None,
        })
    }

    /// Read the serial number from the Device Information service.
    pub async fn serial_number(&self) -> Option<String> {
        let serial_uuid = uuid_from_u16(SERIAL_NUMBER_CHAR);
        let device_info = uuid_from_u16(DEVICE_INFO_SERVICE);
        let chr = self
            .peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == serial_uuid && c.service_uuid == device_info)?;
        match self.peripheral.read(&chr).await {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).trim_end_matches('\0').to_string()),
            Err(e) => {
                warn!(error = %e, "could not read BLE serial number");
                None
            }
        }
    }
}

#[async_trait]
impl GattLink for BtleplugLink {
    async fn subscribe(&mut self, sink: RxSink) -> PfxResult<()> {
        self.peripheral.subscribe(&self.rx).await.map_err(ble_err)?;
        let mut stream = self.peripheral.notifications().await.map_err(ble_err)?;
        let rx_uuid = self.rx.uuid;
        self.pump = Some(tokio::spawn(async move {
            while let Some(n) = stream.next().await {
                if n.uuid == rx_uuid {
                    sink.deliver(&n.value);
                }
            }
            sink.mark_disconnected();
        }));
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> PfxResult<()> {
        self.peripheral
            .write(&self.tx, chunk, WriteType::WithoutResponse)
            .await
            .map_err(ble_err)
    }

    async fn disconnect(&mut self) -> PfxResult<()> {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Err(e) = self.peripheral.unsubscribe(&self.rx).await {
            debug!(error = %e, "unsubscribe failed");
        }
        self.peripheral.disconnect().await.map_err(ble_err)
    }
}

/// Scan for and connect to the brick whose name or address matches
/// `name_or_address`, or to the first brick found when it is `None`.
///
/// # Errors
///
/// Returns [`TransportError::NotFound`] if no matching brick advertises
/// within `scan_time`, and GATT errors from the connection.
pub async fn open_ble(
    name_or_address: Option<&str>,
    scan_time: Duration,
    config: TransportConfig,
) -> PfxResult<BleChannel<BtleplugLink>> {
    let candidates = scan(scan_time).await?;
    let chosen = candidates
        .into_iter()
        .find(|c| {
            name_or_address.is_none_or(|want| {
                c.name == want || c.address.eq_ignore_ascii_case(want)
            })
        })
        .ok_or_else(|| {
            TransportError::NotFound(match name_or_address {
                Some(want) => format!("no PFx Brick named or at {want}"),
                None => "no PFx Bricks found over Bluetooth".to_string(),
            })
        })?;

    let link = BtleplugLink::connect(chosen.peripheral).await?;
    let mut info = BrickDeviceInfo::ble(chosen.address).with_product_name(chosen.name);
    info.serial_number = link.serial_number().await;
    info!(brick = %info.display_name(), "connected over Bluetooth");
    BleChannel::open(link, info, config).await
}
