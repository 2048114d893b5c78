//! End-to-end session tests against the simulated brick.

use insta::assert_snapshot;
use pfxbrick::protocol::icd::notify;
use pfxbrick::protocol::{Action, Notification, opcodes};
use pfxbrick::{EffectKey, FileSpec, PfxBrick, PfxError, StartupPlacement};
use pfxbrick_errors::ValidationError;
use pfxbrick_errors::filesystem::codes;
use pfxbrick_test_helpers::SimulatedBrick;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn session(sim: &SimulatedBrick) -> PfxBrick<SimulatedBrick> {
    PfxBrick::new(sim.clone())
}

fn count_op(sim: &SimulatedBrick, op: u8) -> usize {
    sim.opcodes().into_iter().filter(|o| *o == op).count()
}

#[tokio::test]
async fn test_upload_is_verified_and_stored() -> TestResult {
    let sim = SimulatedBrick::new();
    let mut brick = session(&sim);
    let data: Vec<u8> = (0..=255u8).cycle().take(124).collect();

    let entry = brick.put_file(0x10, "horn.wav", &data).await?;

    assert_eq!(entry.id, 0x10);
    assert_eq!(entry.size, 124);
    assert_eq!(entry.crc32, crc32fast::hash(&data));
    assert_eq!(sim.file(0x10).map(|f| f.data), Some(data));
    assert_eq!(count_op(&sim, opcodes::FILE_WRITE_FAST), 2);
    assert_eq!(count_op(&sim, opcodes::FILE_WRITE), 0);
    assert!(brick.file_dir().has_file(0x10));
    Ok(())
}

#[tokio::test]
async fn test_older_firmware_uses_legacy_writes() -> TestResult {
    let sim = SimulatedBrick::new().with_icd_rev([0x03, 0x36]);
    let mut brick = session(&sim);
    let data = vec![0x5A; 124];

    brick.put_file(0x11, "bell.wav", &data).await?;

    assert_eq!(count_op(&sim, opcodes::FILE_WRITE), 3);
    assert_eq!(count_op(&sim, opcodes::FILE_WRITE_FAST), 0);
    assert_eq!(sim.file(0x11).map(|f| f.data.len()), Some(124));
    Ok(())
}

#[tokio::test]
async fn test_download_by_name() -> TestResult {
    let sim = SimulatedBrick::new();
    let data: Vec<u8> = (0..200u8).collect();
    sim.insert_file(0x21, "chuff.wav", &data, 0);
    let mut brick = session(&sim);

    let read = brick.get_file(&FileSpec::from("chuff.wav")).await?;

    assert_eq!(read, data);
    assert_eq!(count_op(&sim, opcodes::FILE_READ), 4);
    Ok(())
}

#[tokio::test]
async fn test_open_failure_aborts_upload() {
    let sim = SimulatedBrick::new();
    sim.fail_next(opcodes::FILE_OPEN, codes::FILE_SYSTEM_FULL);
    let mut brick = session(&sim);

    let result = brick.put_file(0x10, "horn.wav", &[1, 2, 3]).await;

    assert!(
        matches!(&result, Err(PfxError::FileSystem(e)) if e.code == codes::FILE_SYSTEM_FULL && e.op == "file open"),
        "{result:?}"
    );
    assert_eq!(count_op(&sim, opcodes::FILE_WRITE_FAST), 0);
    assert_eq!(count_op(&sim, opcodes::FILE_CLOSE), 0);
}

#[tokio::test]
async fn test_write_failure_stops_transfer() {
    let sim = SimulatedBrick::new();
    sim.fail_next(opcodes::FILE_WRITE_FAST, codes::FILE_ACCESS_DENIED);
    let mut brick = session(&sim);

    let result = brick.put_file(0x10, "horn.wav", &[7; 200]).await;

    assert!(matches!(result, Err(PfxError::FileSystem(e)) if e.code == codes::FILE_ACCESS_DENIED));
    assert_eq!(count_op(&sim, opcodes::FILE_WRITE_FAST), 1);
}

#[tokio::test]
async fn test_directory_listing() -> TestResult {
    let sim = SimulatedBrick::new().with_capacity(100_000);
    sim.insert_file(0x01, "horn.wav", &[0x55; 1500], 0x0000);
    sim.insert_file(0xE0, "idle.wav", &[0xAA; 2048], 0x0020);
    let mut brick = session(&sim);

    let listing = brick.refresh_file_dir().await?.to_string();

    assert_snapshot!(listing, @r"
    ID Name                       Size    Attr    User1    User2    CRC32
    01 horn.wav                    1.5 kB 0000 00000000 00000000 38CDB782
    E0 idle.wav                    2.0 kB 0020 00000000 00000000 7AC10820
    2 files, 3.5 kB used, 96.5 kB remaining
    ");
    assert_eq!(brick.file_dir().num_files, 2);
    Ok(())
}

#[tokio::test]
async fn test_rename_remove_and_free_id() -> TestResult {
    let sim = SimulatedBrick::new();
    sim.insert_file(0x00, "a.wav", &[1; 10], 0);
    sim.insert_file(0x01, "horn.wav", &[2; 10], 0);
    let mut brick = session(&sim);

    assert_eq!(brick.find_available_file_id().await?, 0x02);

    brick.rename_file(&FileSpec::Id(0x01), "toot.wav").await?;
    assert_eq!(brick.file_id_from_name("toot.wav").await?, Some(0x01));
    assert_eq!(brick.file_id_from_name("horn.wav").await?, None);

    brick.remove_file(&FileSpec::from("toot.wav")).await?;
    assert_eq!(sim.file_ids(), vec![0x00]);

    let again = brick.remove_file(&FileSpec::Id(0x01)).await;
    assert!(matches!(again, Err(PfxError::FileSystem(e)) if e.code == codes::FILE_NOT_FOUND));
    Ok(())
}

#[tokio::test]
async fn test_unknown_name_is_not_found() {
    let sim = SimulatedBrick::new();
    let mut brick = session(&sim);

    let result = brick.run_script(&FileSpec::from("boot.txt")).await;

    assert!(matches!(
        result,
        Err(PfxError::Validation(ValidationError::FileNotFound(name))) if name == "boot.txt"
    ));
}

#[tokio::test]
async fn test_run_and_stop_script() -> TestResult {
    let sim = SimulatedBrick::new();
    sim.insert_file(0x30, "boot.txt", b"play 1\n", 0);
    let mut brick = session(&sim);

    brick.run_script(&FileSpec::from("boot.txt")).await?;
    assert_eq!(sim.running_script(), Some(0x30));
    brick.stop_script().await?;
    assert_eq!(sim.running_script(), None);
    Ok(())
}

#[tokio::test]
async fn test_startup_action_lifecycle() -> TestResult {
    let sim = SimulatedBrick::new();
    let mut brick = session(&sim);
    let first = Action::play_audio_file(0x21);

    assert_eq!(
        brick.configure_startup_action(&first, EffectKey::of(&first)).await?,
        StartupPlacement::Allocated(0x3C)
    );
    assert_eq!(
        brick.configure_startup_action(&first, EffectKey::of(&first)).await?,
        StartupPlacement::Unchanged(0x3C)
    );

    let second = Action::play_audio_file(0x22);
    assert_eq!(
        brick.configure_startup_action(&second, EffectKey::of(&second)).await?,
        StartupPlacement::Updated(0x3C)
    );
    assert_eq!(sim.lut_action(0x3C), Some(second));

    let light = Action::light_on(&[1, 2]);
    assert_eq!(
        brick.configure_startup_action(&light, EffectKey::of(&light)).await?,
        StartupPlacement::Allocated(0x3D)
    );

    let third = Action::play_audio_file(0x23);
    assert_eq!(
        brick.configure_startup_action(&third, None).await?,
        StartupPlacement::Allocated(0x3E)
    );
    Ok(())
}

#[tokio::test]
async fn test_full_startup_table_is_left_untouched() {
    let sim = SimulatedBrick::new();
    let occupant = Action::light_on(&[3]);
    for address in 0x3C..=0x43 {
        sim.set_lut_action(address, occupant);
    }
    let mut brick = session(&sim);
    sim.clear_requests();

    let result = brick
        .configure_startup_action(&Action::play_audio_file(0x21), None)
        .await;

    assert!(matches!(result, Err(PfxError::Validation(ValidationError::LutFull))));
    assert_eq!(count_op(&sim, opcodes::SET_EVENT_ACTION), 0);
}

#[tokio::test]
async fn test_dump_and_clear_lut() -> TestResult {
    let sim = SimulatedBrick::new();
    let action = Action::light_on(&[1]);
    sim.set_lut_action(0x05, action);
    let mut brick = session(&sim);

    let dump = brick.dump_lut().await?;
    assert_eq!(dump.len(), 0x13 * 4);
    let row = dump.iter().find(|e| e.address == 0x05);
    assert_eq!(row.map(|e| (e.event_id, e.channel, e.action)), Some((0x01, 0x01, action)));

    brick.clear_lut().await?;
    assert_eq!(sim.lut_action(0x05), Some(Action::default()));
    Ok(())
}

#[tokio::test]
async fn test_audio_notifications_carry_file_names() -> TestResult {
    let sim = SimulatedBrick::over_ble();
    sim.insert_file(0x21, "horn.wav", &[0; 32], 0);
    let mut brick = session(&sim);
    let router = brick.notifications().ok_or("BLE session has no router")?;
    let mut rx = router.subscribe_channel();

    brick.set_notifications(notify::AUDIO_PLAY).await?;
    assert_eq!(sim.notification_mask(), notify::TO_BLE | notify::AUDIO_PLAY);

    sim.emit(Notification::AudioPlay { file_id: 0x21 });
    let event = rx.recv().await.ok_or("no notification delivered")?;
    assert_eq!(event.file_name.as_deref(), Some("horn.wav"));

    brick.disable_notifications().await?;
    assert_eq!(sim.notification_mask(), 0);
    Ok(())
}

#[tokio::test]
async fn test_rename_and_attributes_update_cached_directory() -> TestResult {
    let sim = SimulatedBrick::over_ble();
    sim.insert_file(0x21, "horn.wav", &[0; 32], 0);
    let mut brick = session(&sim);
    brick.refresh_file_dir().await?;
    let router = brick.notifications().ok_or("BLE session has no router")?;

    brick.rename_file(&FileSpec::Id(0x21), "toot.wav").await?;
    assert_eq!(brick.file_dir().get(0x21).map(|f| f.name.as_str()), Some("toot.wav"));
    assert!(brick.file_dir().get_by_name("horn.wav").is_none());
    assert_eq!(router.file_name(0x21).as_deref(), Some("toot.wav"));

    brick.set_file_attributes(&FileSpec::from("toot.wav"), 0x0042).await?;
    assert_eq!(brick.file_dir().get(0x21).map(|f| f.attributes), Some(0x0042));
    assert_eq!(sim.file(0x21).map(|f| f.attributes), Some(0x0042));

    brick.remove_file(&FileSpec::Id(0x21)).await?;
    assert!(brick.file_dir().get(0x21).is_none());
    assert_eq!(router.file_name(0x21), None);
    Ok(())
}

#[tokio::test]
async fn test_one_shot_effects() -> TestResult {
    let sim = SimulatedBrick::new();
    sim.insert_file(0x21, "horn.wav", &[0; 8], 0);
    let mut brick = session(&sim);

    brick.set_motor_speed(&[1], 50, None).await?;
    brick.set_volume(75).await?;
    brick.play_audio_file(&FileSpec::from("horn.wav")).await?;

    assert_eq!(
        sim.tested_actions(),
        vec![
            Action::set_motor_speed(&[1], 50, None),
            Action::set_volume(75),
            Action::play_audio_file(0x21),
        ]
    );
    assert_eq!(sim.lut_action(0x3C), Some(Action::default()));
    Ok(())
}

#[tokio::test]
async fn test_identity_round_trip() -> TestResult {
    let sim = SimulatedBrick::new();
    let mut brick = session(&sim);

    brick.set_name("Loco 7").await?;
    assert_eq!(brick.get_name().await?, "Loco 7");
    assert_eq!(sim.name(), "Loco 7");

    let rev = brick.get_icd_rev(true).await?;
    assert_eq!(rev.text, "3.39");
    assert_eq!(brick.write_mode().await?, pfxbrick::WriteMode::Fast);

    brick.reboot().await?;
    assert_eq!(sim.reboots(), 1);
    Ok(())
}
