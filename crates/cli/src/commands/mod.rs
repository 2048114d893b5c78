//! Command implementations for pfxctl

pub mod device;
pub mod events;
pub mod files;
pub mod profile;

use core::fmt;
use std::convert::Infallible;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use pfxbrick::protocol::{EVT_LUT_MAX, ir_gesture_to_address};
use pfxbrick::{DeviceChannel, FileSpec, PfxBrick};

use crate::Commands;
use crate::client::Connection;

#[derive(Subcommand)]
pub enum EventCommands {
    /// Print the event/action table
    Dump {
        /// Include empty entries
        #[arg(short, long)]
        all: bool,
    },

    /// Show the action stored for one address or remote gesture
    Show {
        /// Address (e.g. 0x3C) or gesture (e.g. "speed ch 1 left button")
        #[arg(value_parser = parse_address)]
        address: u8,
    },

    /// Overwrite every event/action entry with the empty action
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ActionCommands {
    /// Execute the action stored for an address or remote gesture
    Test {
        /// Address (e.g. 0x3C) or gesture (e.g. "speed ch 1 left button")
        #[arg(value_parser = parse_address)]
        address: u8,
    },

    /// Run motors at a speed
    Motor {
        /// Motor channels, 1-based and comma separated
        #[arg(value_parser = parse_channels)]
        channels: Channels,
        /// Speed from -100 to 100
        #[arg(allow_negative_numbers = true)]
        speed: i32,
        /// Run for this many seconds
        #[arg(short, long)]
        duration: Option<f32>,
    },

    /// Stop motors
    Stop {
        #[arg(value_parser = parse_channels)]
        channels: Channels,
        /// Cut power without ramping down
        #[arg(long)]
        estop: bool,
    },

    /// Switch lights on, off or toggle them
    Light {
        #[arg(value_enum)]
        op: LightOp,
        /// Light channels, 1-based and comma separated
        #[arg(value_parser = parse_channels)]
        channels: Channels,
    },

    /// Set light brightness
    Brightness {
        #[arg(value_parser = parse_channels)]
        channels: Channels,
        level: u8,
    },

    /// Play an audio file
    Play {
        #[arg(value_parser = parse_file_spec)]
        file: FileSpec,
        /// Loop until stopped
        #[arg(short, long)]
        repeat: bool,
    },

    /// Stop an audio file
    StopAudio {
        #[arg(value_parser = parse_file_spec)]
        file: FileSpec,
    },

    /// Set the audio volume in percent
    Volume { level: i32 },
}

/// 1-based output channels, written `1,2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channels(pub Vec<u8>);

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list: Vec<String> = self.0.iter().map(u8::to_string).collect();
        f.write_str(&list.join(","))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LightOp {
    On,
    Off,
    Toggle,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Validate a profile and the audio files it names
    Check {
        /// Profile YAML file
        profile: PathBuf,
        /// Only check the YAML, not the audio files
        #[arg(long)]
        skip_audio: bool,
    },

    /// Print the startup script a profile compiles to
    Script {
        profile: PathBuf,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a .pfxconfig image
    Image {
        profile: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Upload a profile's audio, configuration and event actions
    Program {
        profile: PathBuf,
        /// Upload files even when an identical copy is present
        #[arg(long)]
        overwrite: bool,
        /// Also store the generated startup script
        #[arg(long)]
        script: bool,
    },

    /// Rebuild a profile from what is stored on the brick
    Fetch {
        /// Write the YAML to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl ProfileCommands {
    pub fn needs_brick(&self) -> bool {
        matches!(self, Self::Program { .. } | Self::Fetch { .. })
    }
}

/// `0x21` and `33` are ids; anything else is a name.
pub fn parse_file_spec(s: &str) -> Result<FileSpec, Infallible> {
    s.parse()
}

/// Decimal or `0x` hexadecimal byte.
pub fn parse_u8(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("'{s}' is not a byte value: {e}"))
}

pub fn parse_channels(s: &str) -> Result<Channels, String> {
    let channels = s
        .split(',')
        .map(|c| c.trim().parse::<u8>().map_err(|e| format!("bad channel '{c}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    if channels.contains(&0) {
        return Err("channels are numbered from 1".to_string());
    }
    Ok(Channels(channels))
}

/// LUT address given as a number or as a remote-control gesture.
pub fn parse_address(s: &str) -> Result<u8, String> {
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        let address = parse_u8(s)?;
        if address > EVT_LUT_MAX {
            return Err(format!("address 0x{address:02X} is past the end of the table (0x{EVT_LUT_MAX:02X})"));
        }
        return Ok(address);
    }
    ir_gesture_to_address(s).map_err(|e| e.to_string())
}

/// Run a brick command over whichever link `conn` holds.
pub async fn execute(conn: &mut Connection, command: &Commands, json: bool) -> Result<()> {
    match conn {
        Connection::Simulated(brick) => run(brick, command, json).await,
        Connection::Usb(brick) => run(brick, command, json).await,
        #[cfg(feature = "ble")]
        Connection::Ble(brick) => run(brick, command, json).await,
    }
}

async fn run<C: DeviceChannel>(brick: &mut PfxBrick<C>, command: &Commands, json: bool) -> Result<()> {
    match command {
        Commands::Info => device::info(brick, json).await,
        Commands::Name { name } => device::name(brick, name.as_deref(), json).await,
        Commands::Restart => device::restart(brick, json).await,
        Commands::Reset { yes } => device::reset(brick, *yes, json).await,
        Commands::Monitor {
            interval_ms,
            count,
            notify,
        } => device::monitor(brick, *interval_ms, *count, *notify, json).await,
        Commands::Dir => files::dir(brick, json).await,
        Commands::Put { path, id, name } => files::put(brick, path, *id, name.as_deref(), json).await,
        Commands::Get { file, output } => files::get(brick, file, output.as_deref(), json).await,
        Commands::Rm { file, yes } => files::remove(brick, file, *yes, json).await,
        Commands::Rename { file, new_name } => files::rename(brick, file, new_name, json).await,
        Commands::Format { full, yes } => files::format(brick, *full, *yes, json).await,
        Commands::Run { file } => files::run_script(brick, file, json).await,
        Commands::Stop => files::stop_script(brick, json).await,
        Commands::Events(cmd) => events::execute_events(brick, cmd, json).await,
        Commands::Action(cmd) => events::execute_action(brick, cmd, json).await,
        Commands::Profile(cmd) => profile::execute_on_brick(brick, cmd, json).await,
        Commands::List | Commands::Completion { .. } => Ok(()),
        #[cfg(feature = "ble")]
        Commands::Scan { .. } => Ok(()),
    }
}
