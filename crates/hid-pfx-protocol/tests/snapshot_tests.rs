use insta::assert_snapshot;
use pfxbrick_hid_protocol::{
    Action, DirEntry, address_description, dir_listing_header, fx, ir_gesture_to_address,
};

// ── Script text ─────────────────────────────────────────────────────────────

#[test]
fn test_snapshot_motor_event_script() {
    let a = Action::set_motor_speed(&[1, 2], 50, None);
    assert_snapshot!(a.to_event_script_str(0x3C, None), @r"
    event 0x3C {
        motor [a, b] fx 0x7 159 0
    }
    ");
}

#[test]
fn test_snapshot_named_sound_event_script() {
    let a = Action::play_audio_file(0x21);
    assert_snapshot!(a.to_event_script_str(0x3D, Some("bell.wav")), @r#"
    event 0x3D {
        sound fx 4 "bell.wav" 0 0
    }
    "#);
}

#[test]
fn test_snapshot_combined_action_script() {
    let mut a = Action::light_on(&[1, 8]);
    a.sound_fx_id = fx::sound::PLAY_CONT;
    a.sound_file_id = 0xE0;
    assert_snapshot!(a.to_script_str(None), @r"
    light [1, 8] fx 0x01 0 0 0 1 0
    sound fx 5 224 0 0
    ");
}

#[test]
fn test_snapshot_empty_event_script() {
    assert_snapshot!(Action::new().to_event_script_str(0x40, None), @r"
    event 0x40 {
    }
    ");
}

// ── Directory listing ───────────────────────────────────────────────────────

#[test]
fn test_snapshot_dir_entry_line() {
    let e = DirEntry {
        id: 0xE0,
        size: 45_312,
        first_sector: 3,
        attributes: 0x0020,
        user_data1: 22_050,
        user_data2: 16,
        crc32: 0x1234_ABCD,
        name: "idle0.wav".to_string(),
    };
    assert_snapshot!(format!("{}\n{e}", dir_listing_header()), @r"
    ID Name                       Size    Attr    User1    User2    CRC32
    E0 idle0.wav                  45.3 kB 0020 00005622 00000010 1234ABCD
    ");
}

// ── Address descriptions ────────────────────────────────────────────────────

#[test]
fn test_snapshot_gesture_descriptions() -> Result<(), Box<dyn std::error::Error>> {
    let lines: Vec<String> = ["speed ch 1 left up", "joy ch 3 right ctr", "speed ch 4 both"]
        .into_iter()
        .map(|g| {
            ir_gesture_to_address(g)
                .map(|a| format!("{g} -> 0x{a:02X} {}", address_description(a)))
        })
        .collect::<Result<_, _>>()?;
    assert_snapshot!(lines.join("\n"), @r"
    speed ch 1 left up -> 0x0C Speed remote ch 1 left up
    joy ch 3 right ctr -> 0x32 Joystick ch 3 right centre
    speed ch 4 both -> 0x03 Speed remote ch 4 both buttons
    ");
    Ok(())
}
