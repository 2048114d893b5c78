//! Event/action table and one-shot action commands

use anyhow::{Context, Result};
use dialoguer::Confirm;
use pfxbrick::protocol::address_description;
use pfxbrick::{DeviceChannel, PfxBrick};
use serde_json::json;

use crate::commands::{ActionCommands, EventCommands, LightOp};
use crate::output;

pub async fn execute_events<C: DeviceChannel>(brick: &mut PfxBrick<C>, cmd: &EventCommands, json: bool) -> Result<()> {
    match cmd {
        EventCommands::Dump { all } => {
            let entries = brick.dump_lut().await.context("reading event/action table")?;
            output::print_lut(&entries, *all, json);
        }
        EventCommands::Show { address } => {
            let action = brick
                .get_action_by_address(*address)
                .await
                .with_context(|| format!("reading action at 0x{address:02X}"))?;
            if json {
                output::print_json(
                    "event",
                    &json!({
                        "address": address,
                        "description": address_description(*address),
                        "action": action,
                    }),
                );
            } else {
                println!("[{address:02X}] {}", address_description(*address));
                println!("{}", action.to_script_str(None));
                println!("{action}");
            }
        }
        EventCommands::Clear { yes } => {
            if !yes
                && !json
                && !Confirm::new()
                    .with_prompt("Clear every entry of the event/action table?")
                    .interact()?
            {
                output::print_warning("Clear cancelled", json);
                return Ok(());
            }
            brick.clear_lut().await.context("clearing event/action table")?;
            output::print_success("Event/action table cleared", json);
        }
    }
    Ok(())
}

pub async fn execute_action<C: DeviceChannel>(brick: &mut PfxBrick<C>, cmd: &ActionCommands, json: bool) -> Result<()> {
    let done = match cmd {
        ActionCommands::Test { address } => {
            let action = brick
                .get_action_by_address(*address)
                .await
                .with_context(|| format!("reading action at 0x{address:02X}"))?;
            if action.is_empty() {
                output::print_warning(&format!("No action stored at 0x{address:02X}"), json);
                return Ok(());
            }
            brick.test_action(&action).await.context("executing action")?;
            format!("Executed action at 0x{address:02X}: {action}")
        }
        ActionCommands::Motor {
            channels,
            speed,
            duration,
        } => {
            brick
                .set_motor_speed(&channels.0, *speed, *duration)
                .await
                .context("setting motor speed")?;
            format!("Motors {channels} at speed {speed}")
        }
        ActionCommands::Stop { channels, estop } => {
            let result = if *estop {
                brick.estop_motor(&channels.0).await
            } else {
                brick.stop_motor(&channels.0).await
            };
            result.context("stopping motors")?;
            format!("Motors {channels} stopped")
        }
        ActionCommands::Light { op, channels } => {
            let result = match op {
                LightOp::On => brick.light_on(&channels.0).await,
                LightOp::Off => brick.light_off(&channels.0).await,
                LightOp::Toggle => brick.light_toggle(&channels.0).await,
            };
            result.context("switching lights")?;
            format!("Lights {channels} {op:?}")
        }
        ActionCommands::Brightness { channels, level } => {
            brick
                .set_brightness(&channels.0, *level)
                .await
                .context("setting brightness")?;
            format!("Lights {channels} at brightness {level}")
        }
        ActionCommands::Play { file, repeat } => {
            let result = if *repeat {
                brick.repeat_audio_file(file).await
            } else {
                brick.play_audio_file(file).await
            };
            result.with_context(|| format!("playing {file}"))?;
            format!("Playing {file}")
        }
        ActionCommands::StopAudio { file } => {
            brick
                .stop_audio_file(file)
                .await
                .with_context(|| format!("stopping {file}"))?;
            format!("Stopped {file}")
        }
        ActionCommands::Volume { level } => {
            brick.set_volume(*level).await.context("setting volume")?;
            format!("Volume set to {level}%")
        }
    };
    output::print_success(&done, json);
    Ok(())
}
