//! Profile programming, fetch and export against the simulated brick.

use std::collections::HashMap;

use pfxbrick::PfxBrick;
use pfxbrick::protocol::fx::sound;
use pfxbrick::protocol::icd::attr;
use pfxbrick::protocol::{Action, BrickConfig, STARTUP_ADDRESSES, ir_gesture_to_address};
use pfxbrick_profile::compiler::indexed_sound_action;
use pfxbrick_profile::wav::wav_bytes;
use pfxbrick_profile::{
    FileRole, IMAGE_MAGIC, ProfileAssets, ProfileConfig, ProgramOptions, StepStatus, build_image,
    empty_lut, fetch_from_brick, lut_program, program_brick,
};
use pfxbrick_test_helpers::SimulatedBrick;
use proptest::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const PROFILE: &str = r#"
volume: 70
motor_channel: a
accel: 5
notch_loops: [idle1.wav, idle2.wav]
startup: start.wav
other_sounds:
  - file: horn.wav
    trigger: speed ch 1 left button
stop:
  trigger: speed ch 1 right button
"#;

fn profile_and_assets() -> Result<(ProfileConfig, ProfileAssets), Box<dyn std::error::Error>> {
    let profile = ProfileConfig::from_yaml_str(PROFILE, "test.yml")?;
    let mut payloads = HashMap::new();
    for (name, fill) in [("idle1.wav", 1u8), ("idle2.wav", 2), ("start.wav", 3), ("horn.wav", 4)] {
        payloads.insert(name.to_string(), wav_bytes(22050, 16, &[fill; 90]));
    }
    let assets = ProfileAssets::from_memory(&profile, &payloads)?;
    Ok((profile, assets))
}

fn session(sim: &SimulatedBrick) -> PfxBrick<SimulatedBrick> {
    PfxBrick::new(sim.clone())
}

#[tokio::test]
async fn test_program_brick() -> TestResult {
    let (profile, assets) = profile_and_assets()?;
    let sim = SimulatedBrick::new();
    let mut brick = session(&sim);
    let options = ProgramOptions {
        overwrite: false,
        upload_script: true,
    };

    let report = program_brick(&mut brick, &profile, &assets, options).await?;
    assert!(report.is_success(), "{report}");

    let idle = sim.file(0xE1).ok_or("idle loop 2 missing")?;
    assert_eq!(idle.name, "idle2.wav");
    assert_eq!(idle.attributes, FileRole::IdleLoop(1).attributes());
    assert_eq!(idle.user_data1, 22050);
    assert_eq!(sim.file(0xEF).map(|f| f.attributes), Some(0x5C));
    assert_eq!(sim.file(0x01).map(|f| f.name), Some("horn.wav".to_string()));

    let config = brick.get_config().await?;
    assert_eq!(config.audio.default_volume, 70);
    assert_eq!(config.motors[0].accel, 5);
    assert_eq!(config.settings.notch_count, 2);

    assert_eq!(sim.lut_action(STARTUP_ADDRESSES[0]), Some(indexed_sound_action(&profile)));
    let horn = ir_gesture_to_address("speed ch 1 left button")?;
    assert_eq!(sim.lut_action(horn), Some(Action::play_audio_file(0x01)));
    let stop = ir_gesture_to_address("speed ch 1 right button")?;
    assert_eq!(sim.lut_action(stop), Some(Action::stop_motor(&[1], false)));

    let script = sim
        .file_ids()
        .into_iter()
        .filter_map(|id| sim.file(id))
        .find(|f| f.name == "startup.pfx")
        .ok_or("script missing")?;
    assert_eq!(script.attributes, attr::PROFILE_SCRIPT);
    assert!(String::from_utf8(script.data)?.contains("set file speed 2 = \"idle2.wav\""));
    Ok(())
}

#[tokio::test]
async fn test_second_run_skips_identical_files() -> TestResult {
    let (profile, assets) = profile_and_assets()?;
    let sim = SimulatedBrick::new();
    let mut brick = session(&sim);
    program_brick(&mut brick, &profile, &assets, ProgramOptions::default()).await?;

    let report = program_brick(&mut brick, &profile, &assets, ProgramOptions::default()).await?;
    let skipped = report
        .steps
        .iter()
        .filter(|s| matches!(s.status, StepStatus::Skipped(_)))
        .count();
    // Four files plus the unchanged configuration.
    assert_eq!(skipped, 5);
    assert!(
        report
            .steps
            .iter()
            .any(|s| s.label.starts_with("motor indexed sound: startup action already configured"))
    );

    let report = program_brick(
        &mut brick,
        &profile,
        &assets,
        ProgramOptions {
            overwrite: true,
            upload_script: false,
        },
    )
    .await?;
    assert_eq!(report.steps.iter().filter(|s| s.label.starts_with("upload")).count(), 4);
    assert!(report.steps.iter().filter(|s| s.label.starts_with("upload")).all(|s| s.status == StepStatus::Ok));
    Ok(())
}

#[tokio::test]
async fn test_full_startup_table_does_not_stop_programming() -> TestResult {
    let (profile, assets) = profile_and_assets()?;
    let sim = SimulatedBrick::new();
    for (n, address) in (1u8..).zip(STARTUP_ADDRESSES) {
        sim.set_lut_action(address, Action::light_on(&[n]));
    }
    let mut brick = session(&sim);

    let report = program_brick(&mut brick, &profile, &assets, ProgramOptions::default()).await?;

    let failures: Vec<&str> = report.failures().map(|s| s.label.as_str()).collect();
    assert_eq!(failures, ["motor indexed sound"]);
    let stop = ir_gesture_to_address("speed ch 1 right button")?;
    assert_eq!(sim.lut_action(stop), Some(Action::stop_motor(&[1], false)));
    assert_eq!(sim.lut_action(STARTUP_ADDRESSES[0]), Some(Action::light_on(&[1])));
    Ok(())
}

#[tokio::test]
async fn test_fetch_after_program() -> TestResult {
    let (profile, assets) = profile_and_assets()?;
    let sim = SimulatedBrick::new();
    let mut brick = session(&sim);
    program_brick(&mut brick, &profile, &assets, ProgramOptions::default()).await?;

    let fetched = fetch_from_brick(&mut brick).await?;
    assert_eq!(fetched.volume, Some(70));
    assert_eq!(fetched.acceleration, Some(5));
    assert_eq!(fetched.notch_levels, Some(2));
    assert_eq!(fetched.notch_loops, profile.notch_loops);
    assert_eq!(fetched.startup.as_deref(), Some("start.wav"));
    assert_eq!(fetched.skip_startup, Some(true));
    assert!(fetched.validate().is_ok());
    Ok(())
}

#[tokio::test]
async fn test_fetch_reads_motor_b_block() -> TestResult {
    let profile = ProfileConfig::from_yaml_str(
        r#"
motor_channel: b
acceleration: 6
deceleration: 3
vmin: 10
vmid: 120
vmax: 240
motor_invert: true
motor_pfmode: true
motor_low_torque: true
notch_loops: [idle1.wav, idle2.wav]
"#,
        "motor-b.yml",
    )?;
    let mut payloads = HashMap::new();
    payloads.insert("idle1.wav".to_string(), wav_bytes(22050, 16, &[1; 40]));
    payloads.insert("idle2.wav".to_string(), wav_bytes(22050, 16, &[2; 40]));
    let assets = ProfileAssets::from_memory(&profile, &payloads)?;
    let sim = SimulatedBrick::new();
    let mut brick = session(&sim);
    program_brick(&mut brick, &profile, &assets, ProgramOptions::default()).await?;

    let fetched = fetch_from_brick(&mut brick).await?;
    assert_eq!(fetched.motor_channel, profile.motor_channel);
    assert_eq!(fetched.acceleration, Some(6));
    assert_eq!(fetched.deceleration, Some(3));
    assert_eq!(
        (fetched.vmin, fetched.vmid, fetched.vmax),
        (Some(10), Some(120), Some(240))
    );
    assert_eq!(fetched.motor_invert, Some(true));
    assert_eq!(fetched.motor_pfmode, Some(true));
    assert_eq!(fetched.motor_low_torque, Some(true));
    assert!(fetched.validate().is_ok());
    Ok(())
}

#[tokio::test]
async fn test_load_from_disk_and_export() -> TestResult {
    let dir = tempfile::tempdir()?;
    let sounds = dir.path().join("sounds");
    tokio::fs::create_dir(&sounds).await?;
    for name in ["idle1.wav", "idle2.wav", "start.wav", "horn.wav"] {
        tokio::fs::write(sounds.join(name), wav_bytes(11025, 16, &[0x10; 32])).await?;
    }
    let yaml = format!("source: sounds\n{PROFILE}");
    let path = dir.path().join("profile.yml");
    tokio::fs::write(&path, yaml).await?;

    let profile = ProfileConfig::load(&path).await?;
    assert_eq!(profile.source_dir(), sounds.as_path());
    let assets = ProfileAssets::load(&profile).await?;
    assert_eq!(assets.files.len(), 4);
    assert_eq!(assets.get(0xE0).map(|f| f.format.sample_rate), Some(11025));

    let mut lut = empty_lut();
    assert!(lut_program(&profile)?.apply_offline(&mut lut).is_success());
    let image = build_image(&profile, &BrickConfig::default(), &assets, &lut)?;
    assert!(image.starts_with(IMAGE_MAGIC));

    tokio::fs::remove_file(sounds.join("horn.wav")).await?;
    assert!(ProfileAssets::load(&profile).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_gated_profile_program() -> TestResult {
    let profile = ProfileConfig::from_yaml_str(
        "motor_channel: b\ngated_notch1: [g1.wav, g2.wav]\ngated_gain: 80\n",
        "gated.yml",
    )?;
    let mut payloads = HashMap::new();
    payloads.insert("g1.wav".to_string(), wav_bytes(8000, 8, &[0x80; 16]));
    payloads.insert("g2.wav".to_string(), wav_bytes(8000, 8, &[0x81; 16]));
    let assets = ProfileAssets::from_memory(&profile, &payloads)?;
    let sim = SimulatedBrick::new();
    let mut brick = session(&sim);

    let report = program_brick(&mut brick, &profile, &assets, ProgramOptions::default()).await?;
    assert!(report.is_success(), "{report}");
    assert_eq!(sim.file(0xD1).map(|f| f.name), Some("L1g2.wav".to_string()));
    let gated = sim.lut_action(STARTUP_ADDRESSES[0]).ok_or("no startup action")?;
    assert_eq!(gated.sound_fx_id, sound::PLAY_GATED);
    assert_eq!(gated.sound_file_id, 0xD0);
    assert_eq!(gated.sound_param1, sound::MOTOR_CH_B | sound::SPEED_CURRENT);
    assert_eq!(gated.sound_param2, 80);

    let fetched = fetch_from_brick(&mut brick).await?;
    assert_eq!(fetched.gated_notch1, profile.gated_notch1);
    assert_eq!(fetched.gated_gain, Some(80));
    Ok(())
}

proptest! {
    #[test]
    fn prop_assignments_have_distinct_ids(
        idle in 0usize..=8,
        accel in 0usize..=7,
        decel in 0usize..=7,
        gated in proptest::collection::vec(0usize..=4, 4),
        effects in 0usize..=16,
    ) {
        let names = |prefix: &str, n: usize| -> Vec<String> {
            (0..n).map(|i| format!("{prefix}{i}.wav")).collect()
        };
        let mut profile = ProfileConfig {
            notch_loops: names("idle", idle),
            accel_loops: names("acc", accel),
            decel_loops: names("dec", decel),
            startup: Some("start.wav".into()),
            shutdown: Some("stop.wav".into()),
            bell: Some("bell.wav".into()),
            ..ProfileConfig::default()
        };
        profile.gated_notch1 = names("a", gated.first().copied().unwrap_or(0));
        profile.gated_notch2 = names("b", gated.get(1).copied().unwrap_or(0));
        profile.gated_notch3 = names("c", gated.get(2).copied().unwrap_or(0));
        profile.gated_notch4 = names("d", gated.get(3).copied().unwrap_or(0));
        profile.other_sounds = (0..effects)
            .map(|i| pfxbrick_profile::OtherSound {
                file: format!("fx{i}.wav"),
                probability: Some(10),
                trigger: None,
                repeat: false,
            })
            .collect();
        prop_assert!(profile.validate().is_ok());

        let files = profile.file_assignments();
        let mut ids: Vec<u8> = files.iter().map(|f| f.file_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), files.len());
        for file in &files {
            prop_assert_eq!(FileRole::from_dir_entry(&pfxbrick::protocol::DirEntry {
                id: file.file_id(),
                attributes: file.attributes(),
                ..Default::default()
            }).is_some(), !matches!(file.role, FileRole::Effect(_)));
        }
    }
}
