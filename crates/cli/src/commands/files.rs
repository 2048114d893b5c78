//! File system commands

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use pfxbrick::{DeviceChannel, FileSpec, PfxBrick};

use crate::output;

fn spinner(message: String, json: bool) -> Result<Option<ProgressBar>> {
    if json {
        return Ok(None);
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(Some(pb))
}

fn confirm(prompt: &str, yes: bool, json: bool) -> Result<bool> {
    if yes || json {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).interact()?)
}

pub async fn dir<C: DeviceChannel>(brick: &mut PfxBrick<C>, json: bool) -> Result<()> {
    let dir = brick.refresh_file_dir().await.context("reading file directory")?;
    output::print_file_dir(dir, json);
    Ok(())
}

pub async fn put<C: DeviceChannel>(
    brick: &mut PfxBrick<C>,
    path: &Path,
    id: Option<u8>,
    name: Option<&str>,
    json: bool,
) -> Result<()> {
    let id = match id {
        Some(id) => id,
        None => brick
            .find_available_file_id()
            .await
            .context("finding a free file id")?,
    };
    let pb = spinner(format!("Uploading {} to 0x{id:02X}...", path.display()), json)?;
    let result = brick.put_file_from_path(id, path, name).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let entry = result.with_context(|| format!("uploading {}", path.display()))?;

    if json {
        output::print_json("file", &entry);
    } else {
        output::print_success(
            &format!(
                "Uploaded {} to 0x{:02X} ({} bytes, CRC32 {:08X})",
                entry.name, entry.id, entry.size, entry.crc32
            ),
            false,
        );
    }
    Ok(())
}

pub async fn get<C: DeviceChannel>(
    brick: &mut PfxBrick<C>,
    file: &FileSpec,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let id = brick.resolve_file(file).await.with_context(|| format!("looking up {file}"))?;
    let entry = brick.get_dir_entry(id).await.context("reading directory entry")?;
    let path = output.map_or_else(|| Path::new(&entry.name).to_path_buf(), Path::to_path_buf);

    let pb = spinner(format!("Downloading {}...", entry.name), json)?;
    let result = brick.get_file_to_path(&FileSpec::Id(id), &path).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let size = result.with_context(|| format!("downloading {file}"))?;

    output::print_success(
        &format!("Saved {} ({size} bytes) to {}", entry.name, path.display()),
        json,
    );
    Ok(())
}

pub async fn remove<C: DeviceChannel>(brick: &mut PfxBrick<C>, file: &FileSpec, yes: bool, json: bool) -> Result<()> {
    if !confirm(&format!("Remove {file} from the brick?"), yes, json)? {
        output::print_warning("Remove cancelled", json);
        return Ok(());
    }
    brick.remove_file(file).await.with_context(|| format!("removing {file}"))?;
    output::print_success(&format!("Removed {file}"), json);
    Ok(())
}

pub async fn rename<C: DeviceChannel>(brick: &mut PfxBrick<C>, file: &FileSpec, new_name: &str, json: bool) -> Result<()> {
    brick
        .rename_file(file, new_name)
        .await
        .with_context(|| format!("renaming {file}"))?;
    output::print_success(&format!("Renamed {file} to \"{new_name}\""), json);
    Ok(())
}

pub async fn format<C: DeviceChannel>(brick: &mut PfxBrick<C>, full: bool, yes: bool, json: bool) -> Result<()> {
    if !confirm("Erase every file on the brick?", yes, json)? {
        output::print_warning("Format cancelled", json);
        return Ok(());
    }
    let pb = spinner("Formatting file system...".to_string(), json)?;
    let result = brick.format_fs(!full).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    result.context("formatting file system")?;
    output::print_success("File system formatted", json);
    Ok(())
}

pub async fn run_script<C: DeviceChannel>(brick: &mut PfxBrick<C>, file: &FileSpec, json: bool) -> Result<()> {
    brick.run_script(file).await.with_context(|| format!("running {file}"))?;
    output::print_success(&format!("Running script {file}"), json);
    Ok(())
}

pub async fn stop_script<C: DeviceChannel>(brick: &mut PfxBrick<C>, json: bool) -> Result<()> {
    brick.stop_script().await.context("stopping script")?;
    output::print_success("Script stopped", json);
    Ok(())
}
