//! Host library for the PFx Brick.
//!
//! [`PfxBrick`] wraps any [`DeviceChannel`] and exposes the brick's command
//! set: identity and configuration, the event/action LUT, one-shot effects,
//! notifications and the file system.
//!
//! ```no_run
//! # async fn demo() -> pfxbrick::PfxResult<()> {
//! let mut brick = pfxbrick::open_usb(None, pfxbrick::TransportConfig::default()).await?;
//! println!("{}", brick.get_status().await?);
//! brick.refresh_file_dir().await?;
//! println!("{}", brick.file_dir());
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]

pub mod actions;
pub mod filedir;
pub mod files;
pub mod lut;
pub mod session;

pub use filedir::{FileDir, FileSpec};
pub use files::WriteMode;
pub use lut::{EffectKey, LutEntry, StartupPlacement, dump_coordinates, plan_startup_slot};
pub use session::PfxBrick;

pub use pfxbrick_errors::{PfxError, PfxResult};
pub use pfxbrick_hid_protocol as protocol;
pub use pfxbrick_transport::{
    BrickDeviceInfo, DeviceChannel, NotificationEvent, NotificationRouter, TransportConfig,
    UsbChannel, find_bricks,
};

/// Open the USB brick with serial number `serial` (or the only one
/// connected) and read its ICD revision.
///
/// # Errors
///
/// Returns a transport error if no brick can be opened or it does not answer.
pub async fn open_usb(serial: Option<&str>, config: TransportConfig) -> PfxResult<PfxBrick<UsbChannel>> {
    let channel = UsbChannel::open(serial, config)?;
    let mut brick = PfxBrick::new(channel);
    brick.get_icd_rev(true).await?;
    Ok(brick)
}

/// Scan for a brick by advertised name or address (or take the first one
/// found), connect, and read its ICD revision.
///
/// # Errors
///
/// Returns a transport error if no brick is found or the connection fails.
#[cfg(feature = "ble")]
pub async fn open_ble(
    name_or_address: Option<&str>,
    scan_time: std::time::Duration,
    config: TransportConfig,
) -> PfxResult<PfxBrick<pfxbrick_transport::BleChannel<pfxbrick_transport::BtleplugLink>>> {
    let channel = pfxbrick_transport::open_ble(name_or_address, scan_time, config).await?;
    let mut brick = PfxBrick::new(channel);
    brick.get_icd_rev(true).await?;
    Ok(brick)
}
