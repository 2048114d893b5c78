//! Opening a session with a brick

use anyhow::{Context, Result};
use clap::Args;
use pfxbrick::{BrickDeviceInfo, PfxBrick, TransportConfig, UsbChannel};
use pfxbrick_test_helpers::SimulatedBrick;
use tracing::{debug, warn};

#[cfg(feature = "ble")]
use pfxbrick_transport::{BleChannel, BtleplugLink};

/// How to reach the brick. Shared by every command that talks to one.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectArgs {
    /// Serial number of the USB brick to open (default: the only one connected)
    #[arg(long, global = true, env = "PFXCTL_SERIAL")]
    pub serial: Option<String>,

    /// Connect over Bluetooth LE to the brick with this name or address
    #[cfg(feature = "ble")]
    #[arg(long, global = true, env = "PFXCTL_BLE")]
    pub ble: Option<String>,

    /// Seconds to scan before giving up on a Bluetooth connection
    #[cfg(feature = "ble")]
    #[arg(long, global = true, default_value_t = 5)]
    pub scan_secs: u64,

    /// USB read timeout in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    pub timeout_ms: i32,

    /// Talk to an in-memory simulated brick (for testing)
    #[arg(long, global = true, env = "PFXCTL_SIMULATE", hide = true)]
    pub simulate: bool,
}

impl ConnectArgs {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            usb_read_timeout_ms: self.timeout_ms,
            ..TransportConfig::default()
        }
    }
}

/// An open session over one of the supported links.
pub enum Connection {
    Simulated(PfxBrick<SimulatedBrick>),
    Usb(PfxBrick<UsbChannel>),
    #[cfg(feature = "ble")]
    Ble(PfxBrick<BleChannel<BtleplugLink>>),
}

impl Connection {
    /// Open the brick selected by `args`: simulated, then Bluetooth when a
    /// name is given, otherwise USB.
    pub async fn open(args: &ConnectArgs) -> Result<Self> {
        if args.simulate {
            debug!("using simulated brick");
            return Ok(Self::Simulated(PfxBrick::new(SimulatedBrick::new())));
        }

        #[cfg(feature = "ble")]
        if let Some(target) = &args.ble {
            let want = (target != "any").then_some(target.as_str());
            let brick = pfxbrick::open_ble(
                want,
                std::time::Duration::from_secs(args.scan_secs),
                args.transport_config(),
            )
            .await
            .with_context(|| format!("connecting to {target} over Bluetooth"))?;
            return Ok(Self::Ble(brick));
        }

        let brick = pfxbrick::open_usb(args.serial.as_deref(), args.transport_config())
            .await
            .context("opening USB brick")?;
        Ok(Self::Usb(brick))
    }

    pub fn device_info(&self) -> &BrickDeviceInfo {
        match self {
            Self::Simulated(brick) => brick.device_info(),
            Self::Usb(brick) => brick.device_info(),
            #[cfg(feature = "ble")]
            Self::Ble(brick) => brick.device_info(),
        }
    }

    /// Close the session. Failures are logged, not returned; the command
    /// result has already been produced.
    pub async fn close(&mut self) {
        let result = match self {
            Self::Simulated(brick) => brick.close().await,
            Self::Usb(brick) => brick.close().await,
            #[cfg(feature = "ble")]
            Self::Ble(brick) => brick.close().await,
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to close brick session");
        }
    }
}

/// Bricks currently attached over USB.
pub fn list_usb() -> Result<Vec<BrickDeviceInfo>> {
    pfxbrick::find_bricks().context("enumerating USB devices")
}

/// Bricks advertising over Bluetooth LE, as `(name, address)` pairs.
#[cfg(feature = "ble")]
pub async fn scan_ble(secs: u64) -> Result<Vec<(String, String)>> {
    let found = pfxbrick_transport::scan(std::time::Duration::from_secs(secs))
        .await
        .context("scanning for Bluetooth bricks")?;
    Ok(found.into_iter().map(|c| (c.name, c.address)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_simulated() -> Result<()> {
        let args = ConnectArgs {
            simulate: true,
            ..ConnectArgs::default()
        };
        let mut conn = Connection::open(&args).await?;
        assert!(matches!(conn, Connection::Simulated(_)));
        assert_eq!(conn.device_info().path, "sim");
        conn.close().await;
        Ok(())
    }

    #[test]
    fn test_transport_config_uses_timeout() {
        let args = ConnectArgs {
            timeout_ms: 250,
            ..ConnectArgs::default()
        };
        let config = args.transport_config();
        assert_eq!(config.usb_read_timeout_ms, 250);
        assert_eq!(config.ble_max_retries, TransportConfig::default().ble_max_retries);
    }
}
