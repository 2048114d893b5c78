//! Request/response channels to a PFx Brick.
//!
//! [`UsbChannel`] talks to the brick over USB-HID with blocking reads.
//! [`BleChannel`] talks over a GATT UART service and suspends the caller
//! while waiting. Both implement [`DeviceChannel`]; session code is written
//! once against that trait.

#![deny(static_mut_refs)]

pub mod ble;
#[cfg(feature = "ble")]
pub mod btle;
pub mod channel;
pub mod config;
pub mod device_info;
pub mod mock;
pub mod notify;
pub mod usb;

pub use ble::{BLE_CHUNK_LEN, BleChannel, FRAME_END, FRAME_START, GattLink, RxSink, frame_request};
#[cfg(feature = "ble")]
pub use btle::{BleCandidate, BtleplugLink, open_ble, scan};
pub use channel::{Concurrency, DeviceChannel, check_request, check_response};
pub use config::TransportConfig;
pub use device_info::{BrickDeviceInfo, LinkKind};
pub use notify::{NotificationEvent, NotificationRouter};
pub use usb::{HidReportIo, UsbChannel, find_bricks};
