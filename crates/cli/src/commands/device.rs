//! Brick identity, lifecycle and monitoring commands

use std::time::Duration;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use pfxbrick::protocol::icd::notify;
use pfxbrick::{DeviceChannel, PfxBrick};
use serde_json::json;
use tokio::time::interval;

use crate::client;
use crate::output;

/// List bricks attached over USB
pub fn list(json: bool) -> Result<()> {
    let devices = client::list_usb()?;
    output::print_device_list(&devices, json);
    Ok(())
}

/// Scan for bricks over Bluetooth LE
#[cfg(feature = "ble")]
pub async fn scan(seconds: u64, json: bool) -> Result<()> {
    if !json {
        println!("Scanning for {seconds} s...");
    }
    let found = client::scan_ble(seconds).await?;
    if json {
        let bricks: Vec<_> = found
            .iter()
            .map(|(name, address)| json!({ "name": name, "address": address }))
            .collect();
        output::print_json("bricks", &bricks);
    } else if found.is_empty() {
        output::print_warning("No PFx Bricks found", false);
    } else {
        for (name, address) in found {
            println!("  {name}  {address}");
        }
    }
    Ok(())
}

pub async fn info<C: DeviceChannel>(brick: &mut PfxBrick<C>, json: bool) -> Result<()> {
    let status = brick.get_status().await.context("reading status")?;
    let icd = brick.get_icd_rev(true).await.context("reading ICD revision")?;
    let name = brick.get_name().await.context("reading brick name")?;
    output::print_info(&status, &icd, &name, json);
    Ok(())
}

pub async fn name<C: DeviceChannel>(brick: &mut PfxBrick<C>, new_name: Option<&str>, json: bool) -> Result<()> {
    match new_name {
        Some(new_name) => {
            brick.set_name(new_name).await.context("setting brick name")?;
            output::print_success(&format!("Brick renamed to {new_name}"), json);
        }
        None => {
            let name = brick.get_name().await.context("reading brick name")?;
            if json {
                output::print_json("name", &name);
            } else {
                println!("{name}");
            }
        }
    }
    Ok(())
}

pub async fn restart<C: DeviceChannel>(brick: &mut PfxBrick<C>, json: bool) -> Result<()> {
    brick.reboot().await.context("restarting brick")?;
    output::print_success("Brick restarting", json);
    Ok(())
}

/// Restore factory configuration. Files and the event table are kept.
pub async fn reset<C: DeviceChannel>(brick: &mut PfxBrick<C>, yes: bool, json: bool) -> Result<()> {
    if !yes
        && !json
        && !Confirm::new()
            .with_prompt("Restore factory default configuration?")
            .interact()?
    {
        output::print_warning("Reset cancelled", json);
        return Ok(());
    }
    brick
        .reset_factory_config()
        .await
        .context("restoring factory defaults")?;
    output::print_success("Factory default configuration restored", json);
    Ok(())
}

/// Poll the runtime state every `interval_ms` until `count` samples have
/// been printed or Ctrl+C is pressed.
pub async fn monitor<C: DeviceChannel>(
    brick: &mut PfxBrick<C>,
    interval_ms: u64,
    count: Option<u32>,
    notify: bool,
    json: bool,
) -> Result<()> {
    let mut notifications = None;
    if notify {
        match brick.notifications() {
            Some(router) => {
                let rx = router.subscribe_channel();
                brick
                    .set_notifications(notify::ALL_EVENTS)
                    .await
                    .context("enabling notifications")?;
                notifications = Some(rx);
            }
            None => output::print_warning("Notifications are only delivered over Bluetooth", json),
        }
    }
    if !json {
        println!("Monitoring brick state (Press Ctrl+C to stop)");
        println!();
    }

    let mut ticker = interval(Duration::from_millis(interval_ms.max(10)));
    let mut samples = 0u32;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(event) = async {
                match notifications.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                let file = event.file_name.unwrap_or_default();
                if json {
                    println!("{}", json!({ "notification": format!("{:?}", event.notification), "file": file }));
                } else {
                    println!("notification: {:?} {file}", event.notification);
                }
            }
            _ = ticker.tick() => {
                let state = brick.get_current_state().await.context("reading runtime state")?;
                output::print_state(&state, json);
                samples = samples.saturating_add(1);
                if count.is_some_and(|n| samples >= n) {
                    break;
                }
            }
        }
    }

    if notifications.is_some() {
        brick
            .disable_notifications()
            .await
            .context("disabling notifications")?;
    }
    Ok(())
}
