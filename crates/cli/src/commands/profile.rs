//! Sound profile commands

use std::path::Path;

use anyhow::{Context, Result};
use pfxbrick::protocol::BrickConfig;
use pfxbrick::{DeviceChannel, PfxBrick};
use pfxbrick_profile::{
    ProfileAssets, ProfileConfig, ProgramOptions, apply_to_config, empty_lut, export_script,
    fetch_from_brick, lut_program, program_brick, write_image,
};
use serde_json::json;
use tracing::warn;

use crate::commands::ProfileCommands;
use crate::error::CliError;
use crate::output;

/// Load and validate a profile, distinguishing a missing file from a bad one.
async fn load_profile(path: &Path) -> Result<ProfileConfig> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(CliError::ProfileNotFound(path.display().to_string()).into());
    }
    let profile = ProfileConfig::load(path)
        .await
        .with_context(|| format!("loading profile {}", path.display()))?;
    Ok(profile)
}

async fn load_assets(profile: &ProfileConfig) -> Result<ProfileAssets> {
    ProfileAssets::load(profile).await.with_context(|| {
        format!(
            "reading audio files from {}",
            profile.source_dir().display()
        )
    })
}

/// Profile commands that need no brick.
pub async fn execute_offline(cmd: &ProfileCommands, json: bool) -> Result<()> {
    match cmd {
        ProfileCommands::Check { profile, skip_audio } => check(profile, *skip_audio, json).await,
        ProfileCommands::Script { profile, output } => script(profile, output.as_deref(), json).await,
        ProfileCommands::Image { profile, output } => image(profile, output, json).await,
        ProfileCommands::Program { .. } | ProfileCommands::Fetch { .. } => Ok(()),
    }
}

pub async fn execute_on_brick<C: DeviceChannel>(
    brick: &mut PfxBrick<C>,
    cmd: &ProfileCommands,
    json: bool,
) -> Result<()> {
    match cmd {
        ProfileCommands::Program {
            profile,
            overwrite,
            script,
        } => {
            let options = ProgramOptions {
                overwrite: *overwrite,
                upload_script: *script,
            };
            program(brick, profile, options, json).await
        }
        ProfileCommands::Fetch { output } => fetch(brick, output.as_deref(), json).await,
        _ => execute_offline(cmd, json).await,
    }
}

async fn check(path: &Path, skip_audio: bool, json: bool) -> Result<()> {
    let profile = load_profile(path).await?;
    let files = profile.file_assignments();
    let program = lut_program(&profile).context("compiling event actions")?;
    let audio_bytes = if skip_audio {
        None
    } else {
        let assets = load_assets(&profile).await?;
        let total: usize = assets.files.iter().map(|f| f.data.len()).sum();
        Some(u32::try_from(total).unwrap_or(u32::MAX))
    };

    if json {
        output::print_json(
            "profile",
            &json!({
                "path": path.display().to_string(),
                "files": files.len(),
                "audio_bytes": audio_bytes,
                "startup_actions": program.startup.len(),
                "event_actions": program.events.len(),
            }),
        );
        return Ok(());
    }
    output::print_success(&format!("{} is valid", path.display()), false);
    println!("  Audio files     : {}", files.len());
    if let Some(bytes) = audio_bytes {
        println!("  Audio size      : {:.1} kB", f64::from(bytes) / 1000.0);
    }
    println!("  Startup actions : {}", program.startup.len());
    println!("  Event actions   : {}", program.events.len());
    Ok(())
}

async fn script(path: &Path, out: Option<&Path>, json: bool) -> Result<()> {
    let profile = load_profile(path).await?;
    let text = export_script(&profile);
    match out {
        Some(out) => {
            tokio::fs::write(out, &text)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            output::print_success(&format!("Script written to {}", out.display()), json);
        }
        None if json => output::print_json("script", &text),
        None => print!("{text}"),
    }
    Ok(())
}

/// Build an image offline: factory configuration plus the profile's
/// settings, and an empty event table plus the profile's actions.
async fn image(path: &Path, out: &Path, json: bool) -> Result<()> {
    let profile = load_profile(path).await?;
    let assets = load_assets(&profile).await?;

    let mut config = BrickConfig::default();
    apply_to_config(&profile, &mut config);
    let mut lut = empty_lut();
    let report = lut_program(&profile)
        .context("compiling event actions")?
        .apply_offline(&mut lut);
    for step in report.failures() {
        warn!(step = %step.label, "action left out of image");
    }

    let size = write_image(out, &profile, &config, &assets, &lut)
        .await
        .with_context(|| format!("writing image {}", out.display()))?;
    if json {
        output::print_json(
            "image",
            &json!({ "path": out.display().to_string(), "bytes": size, "report": report }),
        );
    } else {
        output::print_success(
            &format!("Image written to {} ({size} bytes)", out.display()),
            false,
        );
    }
    Ok(())
}

async fn program<C: DeviceChannel>(
    brick: &mut PfxBrick<C>,
    path: &Path,
    options: ProgramOptions,
    json: bool,
) -> Result<()> {
    let profile = load_profile(path).await?;
    let assets = load_assets(&profile).await?;
    let report = program_brick(brick, &profile, &assets, options)
        .await
        .context("programming brick")?;
    output::print_report(&report, json);

    let failed = report.failures().count();
    if failed > 0 {
        return Err(CliError::StepsFailed {
            failed,
            total: report.steps.len(),
        }
        .into());
    }
    Ok(())
}

async fn fetch<C: DeviceChannel>(brick: &mut PfxBrick<C>, out: Option<&Path>, json: bool) -> Result<()> {
    let profile = fetch_from_brick(brick).await.context("reading profile from brick")?;
    if json && out.is_none() {
        output::print_json("profile", &profile);
        return Ok(());
    }
    let yaml = profile.to_yaml_string()?;
    match out {
        Some(out) => {
            tokio::fs::write(out, &yaml)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            output::print_success(&format!("Profile written to {}", out.display()), json);
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
