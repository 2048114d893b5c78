//! Effect IDs carried inside an [`Action`](crate::Action) and their display
//! names.


/// Global command byte values.
pub mod command {
    pub const NONE: u8 = 0x00;
    pub const ALL_OFF: u8 = 0x01;
    pub const IR_LOCKOUT_ON: u8 = 0x02;
    pub const IR_LOCKOUT_OFF: u8 = 0x03;
    pub const IR_LOCK_TOGGLE: u8 = 0x04;
    pub const ALL_MOTORS_OFF: u8 = 0x05;
    pub const ALL_LIGHTS_OFF: u8 = 0x06;
    pub const ALL_AUDIO_OFF: u8 = 0x07;
    pub const RESTART: u8 = 0x08;
}

/// Motor action IDs live in the high nibble of `motor_action_id`; the low
/// nibble is the output mask.
pub mod motor {
    pub const ACTION_ID_MASK: u8 = 0xF0;
    pub const OUTPUT_MASK: u8 = 0x0F;
    pub const OUTPUT_A: u8 = 0x01;
    pub const OUTPUT_B: u8 = 0x02;
    pub const OUTPUT_C: u8 = 0x04;
    pub const OUTPUT_D: u8 = 0x08;

    pub const ESTOP: u8 = 0x00;
    pub const STOP: u8 = 0x10;
    pub const INC_SPD: u8 = 0x20;
    pub const DEC_SPD: u8 = 0x30;
    pub const INC_SPD_BI: u8 = 0x40;
    pub const DEC_SPD_BI: u8 = 0x50;
    pub const CHANGE_DIR: u8 = 0x60;
    pub const SET_SPD: u8 = 0x70;
    pub const SET_SPD_TIMED: u8 = 0x80;
    pub const OSCILLATE: u8 = 0x90;
    pub const OSCILLATE_BIDIR: u8 = 0xA0;
    pub const OSCILLATE_BIDIR_WAIT: u8 = 0xB0;
    pub const RANDOM: u8 = 0xC0;
    pub const RANDOM_BIDIR: u8 = 0xD0;
    pub const SOUND_MODULATED: u8 = 0xE0;
    pub const SET_SERVO: u8 = 0xF0;

    /// `motor_param1` bit selecting the 6-bit speed scale.
    pub const SPEED_HIRES: u8 = 0x80;
    /// `motor_param1` bit selecting reverse.
    pub const SPEED_REVERSE: u8 = 0x40;
    /// Mask of the 6-bit speed magnitude.
    pub const SPEED_MASK: u8 = 0x3F;
}

/// Light effect IDs. Bit 7 of `light_fx_id` selects a combo effect.
pub mod light {
    pub const COMBO_MASK: u8 = 0x80;
    pub const ID_MASK: u8 = 0x7F;

    pub const NONE: u8 = 0x00;
    pub const ON_OFF_TOGGLE: u8 = 0x01;
    pub const INC_BRIGHT: u8 = 0x02;
    pub const DEC_BRIGHT: u8 = 0x03;
    pub const SET_BRIGHT: u8 = 0x04;
    pub const FLASH50_P: u8 = 0x05;
    pub const FLASH50_N: u8 = 0x06;
    pub const STROBE_P: u8 = 0x07;
    pub const STROBE_N: u8 = 0x08;
    pub const GYRALITE_P: u8 = 0x09;
    pub const GYRALITE_N: u8 = 0x0A;
    pub const FLICKER: u8 = 0x0B;
    pub const RAND_BLINK: u8 = 0x0C;
    pub const PHOTON_TORP: u8 = 0x0D;
    pub const LASER_PULSE: u8 = 0x0E;
    pub const ENGINE_GLOW: u8 = 0x0F;
    pub const LIGHTHOUSE: u8 = 0x10;
    pub const BROKEN_LIGHT: u8 = 0x11;
    pub const STATUS_IND: u8 = 0x12;
    pub const SOUND_MOD: u8 = 0x13;
    pub const MOTOR_MOD: u8 = 0x14;

    pub const TRANSITION_TOGGLE: u8 = 0x00;
    pub const TRANSITION_ON: u8 = 0x01;
    pub const TRANSITION_OFF: u8 = 0x02;
}

/// Combination light effect IDs (stored with [`light::COMBO_MASK`] set).
pub mod combo {
    pub const NONE: u8 = 0x00;
    pub const LIN_SWEEP: u8 = 0x01;
    pub const BARGRAPH: u8 = 0x02;
    pub const KNIGHTRIDER: u8 = 0x03;
    pub const EMCY_TWSONIC: u8 = 0x04;
    pub const EMCY_WHELEN: u8 = 0x05;
    pub const TIMES_SQ: u8 = 0x06;
    pub const NOISE: u8 = 0x07;
    pub const TWINKLE_STAR: u8 = 0x08;
    pub const TRAFFIC_SIG: u8 = 0x09;
    pub const SOUND_BAR: u8 = 0x0A;
    pub const ALT_FLASH: u8 = 0x0B;
    pub const LAVA_LAMP: u8 = 0x0C;
    pub const LASER_CANNON: u8 = 0x0D;
    pub const RUNWAY: u8 = 0x0E;
    pub const FORMULA1: u8 = 0x0F;
    pub const DRAGSTER: u8 = 0x10;
}

/// Sound effect IDs.
pub mod sound {
    pub const NONE: u8 = 0x00;
    pub const INC_VOLUME: u8 = 0x01;
    pub const DEC_VOLUME: u8 = 0x02;
    pub const SET_VOLUME: u8 = 0x03;
    pub const PLAY_ONCE: u8 = 0x04;
    pub const PLAY_CONT: u8 = 0x05;
    pub const PLAY_NTIMES: u8 = 0x06;
    pub const STOP: u8 = 0x07;
    pub const STOP_ALL: u8 = 0x08;
    pub const PLAY_GATED: u8 = 0x09;
    pub const PLAY_DURATION: u8 = 0x0A;
    pub const SHUFFLE: u8 = 0x0B;
    pub const PLAY_IDX_MOTOR: u8 = 0x0C;
    pub const PLAY_RAND: u8 = 0x0D;

    /// `PLAY_IDX_MOTOR` / `PLAY_GATED` param1: follow motor channel B.
    pub const MOTOR_CH_B: u8 = 0x01;
    /// `PLAY_IDX_MOTOR` / `PLAY_GATED` param1: follow the current (not target) speed.
    pub const SPEED_CURRENT: u8 = 0x04;
    /// `PLAY_IDX_MOTOR` param2: play the startup sound.
    pub const IDX_STARTUP: u8 = 0x04;
    /// `PLAY_IDX_MOTOR` param2: skip the startup sound.
    pub const IDX_SKIP_STARTUP: u8 = 0x08;
}

/// Duration codes for timed motor actions, in seconds.
pub const DURATIONS: [f32; 16] = [
    0.0, 0.5, 1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 10.0, 20.0, 30.0, 60.0, 90.0, 120.0, 300.0,
];

/// Duration code nearest to `seconds`.
pub fn duration_code(seconds: f32) -> u8 {
    let mut best = 0u8;
    let mut best_err = f32::MAX;
    for (code, d) in (0u8..).zip(DURATIONS) {
        let err = (d - seconds).abs();
        if err < best_err {
            best = code;
            best_err = err;
        }
    }
    best
}

/// Name of a global command.
pub fn command_name(id: u8) -> Option<&'static str> {
    use command::*;
    Some(match id {
        NONE => "None",
        ALL_OFF => "All OFF",
        IR_LOCKOUT_ON => "IR Lockout ON",
        IR_LOCKOUT_OFF => "IR Lockout OFF",
        IR_LOCK_TOGGLE => "Toggle IR Lockout",
        ALL_MOTORS_OFF => "All Motors OFF",
        ALL_LIGHTS_OFF => "All Lights OFF",
        ALL_AUDIO_OFF => "All Audio OFF",
        RESTART => "Restart",
        _ => return None,
    })
}

/// Name of a motor action (high nibble).
pub fn motor_action_name(id: u8) -> &'static str {
    use motor::*;
    match id & ACTION_ID_MASK {
        ESTOP => "Emergency Stop",
        STOP => "Stop",
        INC_SPD => "Increase Speed",
        DEC_SPD => "Decrease Speed",
        INC_SPD_BI => "Increase Speed (bi-dir)",
        DEC_SPD_BI => "Decrease Speed (bi-dir)",
        CHANGE_DIR => "Change Direction",
        SET_SPD => "Set Speed",
        SET_SPD_TIMED => "Set Speed with Duration",
        OSCILLATE => "Oscillate",
        OSCILLATE_BIDIR => "Oscillate (bi-dir)",
        OSCILLATE_BIDIR_WAIT => "Oscillate (bi-dir) with wait",
        RANDOM => "Random",
        RANDOM_BIDIR => "Random (bi-dir)",
        SOUND_MODULATED => "Sound Modulated",
        _ => "Set Servo",
    }
}

/// Name of an individual light effect.
pub fn light_fx_name(id: u8) -> Option<&'static str> {
    use light::*;
    Some(match id {
        NONE => "None",
        ON_OFF_TOGGLE => "On/Off",
        INC_BRIGHT => "Increase Brightness",
        DEC_BRIGHT => "Decrease Brightness",
        SET_BRIGHT => "Set Brightness",
        FLASH50_P => "Flash 50%, positive",
        FLASH50_N => "Flash 50%, negative",
        STROBE_P => "Strobe Flasher, positive",
        STROBE_N => "Strobe Flasher, negative",
        GYRALITE_P => "Gyralite, positive",
        GYRALITE_N => "Gyralite, negative",
        FLICKER => "Flicker",
        RAND_BLINK => "Random Blink",
        PHOTON_TORP => "Photon Torpedo",
        LASER_PULSE => "Laser Pulse",
        ENGINE_GLOW => "Engine Glow",
        LIGHTHOUSE => "Light House",
        BROKEN_LIGHT => "Broken Light",
        STATUS_IND => "Status Indicator",
        SOUND_MOD => "Sound Modulated",
        MOTOR_MOD => "Motor Modulated",
        _ => return None,
    })
}

/// Name of a combination light effect.
pub fn combo_fx_name(id: u8) -> Option<&'static str> {
    use combo::*;
    Some(match id {
        NONE => "None",
        LIN_SWEEP => "Linear Sweep",
        BARGRAPH => "Bargraph",
        KNIGHTRIDER => "Knight Rider",
        EMCY_TWSONIC => "Twinsonic Style Flashers",
        EMCY_WHELEN => "Strobe Style Flashers",
        TIMES_SQ => "Times Square",
        NOISE => "Noise",
        TWINKLE_STAR => "Twinkling Stars",
        TRAFFIC_SIG => "Traffic Lights",
        SOUND_BAR => "Sound Bar",
        ALT_FLASH => "Alternating Flashers",
        LAVA_LAMP => "Lava Lamp",
        LASER_CANNON => "Laser Cannon",
        RUNWAY => "Runway Lights",
        FORMULA1 => "Formula 1 Start",
        DRAGSTER => "Dragster Start",
        _ => return None,
    })
}

/// Name of a sound effect.
pub fn sound_fx_name(id: u8) -> Option<&'static str> {
    use sound::*;
    Some(match id {
        NONE => "None",
        INC_VOLUME => "Increase Volume",
        DEC_VOLUME => "Decrease Volume",
        SET_VOLUME => "Set Volume",
        PLAY_ONCE => "Play Once",
        PLAY_CONT => "Play Continuously",
        PLAY_NTIMES => "Play N Times",
        STOP => "Stop Playback",
        STOP_ALL => "Stop All Playback",
        PLAY_GATED => "Play Gated Loops",
        PLAY_DURATION => "Play for Duration",
        SHUFFLE => "Shuffle Playback",
        PLAY_IDX_MOTOR => "Play Indexed by Motor Speed",
        PLAY_RAND => "Play Randomly",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_codes() {
        assert_eq!(duration_code(0.0), 0);
        assert_eq!(duration_code(0.5), 1);
        assert_eq!(duration_code(2.2), 4);
        assert_eq!(duration_code(75.0), 12);
        assert_eq!(duration_code(1000.0), 15);
    }

    #[test]
    fn test_names() {
        assert_eq!(command_name(command::RESTART), Some("Restart"));
        assert_eq!(command_name(0x42), None);
        assert_eq!(motor_action_name(motor::SET_SPD | 0x03), "Set Speed");
        assert_eq!(light_fx_name(light::ENGINE_GLOW), Some("Engine Glow"));
        assert_eq!(combo_fx_name(combo::KNIGHTRIDER), Some("Knight Rider"));
        assert_eq!(sound_fx_name(sound::PLAY_RAND), Some("Play Randomly"));
    }
}
