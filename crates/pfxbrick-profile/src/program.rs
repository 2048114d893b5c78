//! Program a connected brick with a profile.

use pfxbrick::{FileSpec, PfxBrick, PfxResult};
use pfxbrick_hid_protocol::DirEntry;
use pfxbrick_hid_protocol::icd::attr;
use pfxbrick_transport::DeviceChannel;
use tracing::{info, warn};

use crate::assets::{ProfileAssets, ProfileFile};
use crate::compiler::{CompileReport, apply_to_config, lut_program};
use crate::roles::SCRIPT_FILE_NAME;
use crate::schema::ProfileConfig;
use crate::script::export_script;

/// How [`program_brick`] treats what is already on the brick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgramOptions {
    /// Upload every file even when an identical copy is present.
    pub overwrite: bool,
    /// Also store the generated script as `startup.pfx`.
    pub upload_script: bool,
}

fn already_present(existing: Option<&DirEntry>, file: &ProfileFile) -> bool {
    existing.is_some_and(|e| {
        e.name == file.name()
            && usize::try_from(e.size).is_ok_and(|size| size == file.data.len())
            && e.crc32 == file.crc32()
    })
}

/// Record `result` as a step. Errors that leave the session unusable end
/// the run; anything else is reported and programming continues.
fn record<T>(report: &mut CompileReport, label: String, result: PfxResult<T>) -> PfxResult<()> {
    match result {
        Ok(_) => report.ok(label),
        Err(e) if e.requires_reconnect() => return Err(e),
        Err(e) => {
            warn!(step = %label, error = %e, "profile step failed");
            report.failed(label, e.to_string());
        }
    }
    Ok(())
}

async fn upload<C: DeviceChannel>(brick: &mut PfxBrick<C>, id: u8, name: &str, data: &[u8], attributes: u16) -> PfxResult<()> {
    brick.put_file(id, name, data).await?;
    if attributes != 0 {
        brick.set_file_attributes(&FileSpec::Id(id), attributes).await?;
    }
    Ok(())
}

/// Upload the profile's audio, apply its configuration and store its LUT
/// entries, optionally followed by the generated script.
///
/// Steps run in that order and are independent: a failed upload or a full
/// startup table is recorded in the report and the rest still run.
///
/// # Errors
///
/// Fails before touching the brick if the profile does not compile or the
/// directory cannot be read, and stops early on an error that needs a
/// reconnect.
pub async fn program_brick<C: DeviceChannel>(
    brick: &mut PfxBrick<C>,
    profile: &ProfileConfig,
    assets: &ProfileAssets,
    options: ProgramOptions,
) -> PfxResult<CompileReport> {
    let program = lut_program(profile)?;
    let dir = brick.refresh_file_dir().await?.clone();
    let mut report = CompileReport::default();

    for file in &assets.files {
        let label = format!("upload {} to 0x{:02X}", file.name(), file.file_id());
        if !options.overwrite && already_present(dir.get(file.file_id()), file) {
            report.skipped(label, "identical file on brick");
            continue;
        }
        let result = upload(brick, file.file_id(), file.name(), &file.data, file.attributes()).await;
        record(&mut report, label, result)?;
    }

    let mut config = brick.get_config().await?;
    if apply_to_config(profile, &mut config) {
        let result = brick.set_config(&config).await;
        record(&mut report, "configuration".into(), result)?;
    } else {
        report.skipped("configuration", "already set");
    }

    for entry in &program.startup {
        let result = brick.configure_startup_action(&entry.action, entry.key).await;
        let label = match &result {
            Ok(placement) => format!("{}: {placement}", entry.label),
            Err(_) => entry.label.clone(),
        };
        record(&mut report, label, result)?;
    }
    for entry in &program.events {
        let result = brick.set_action_by_address(entry.address, &entry.action).await;
        record(&mut report, format!("{} at 0x{:02X}", entry.label, entry.address), result)?;
    }

    if options.upload_script {
        let script = export_script(profile);
        let id = match brick.file_id_from_name(SCRIPT_FILE_NAME).await? {
            Some(id) => id,
            None => brick.find_available_file_id().await?,
        };
        let result = upload(brick, id, SCRIPT_FILE_NAME, script.as_bytes(), attr::PROFILE_SCRIPT).await;
        record(&mut report, format!("upload {SCRIPT_FILE_NAME} to 0x{id:02X}"), result)?;
    }

    info!(
        steps = report.steps.len(),
        failed = report.failures().count(),
        "profile programmed"
    );
    Ok(report)
}
