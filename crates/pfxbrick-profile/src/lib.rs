//! Sound profiles for the PFx Brick.
//!
//! A profile is a YAML document naming motor-indexed idle loops, transition
//! loops, gated loops, one-shot sounds and remote-control bindings. This
//! crate validates it and compiles it three ways:
//!
//! - into a [`LutProgram`] plus configuration changes, programmed over a live
//!   session with [`program_brick`];
//! - into `startup.pfx` script text with [`export_script`];
//! - into a `.pfxconfig` image with [`build_image`].
//!
//! [`fetch_from_brick`] goes the other way and rebuilds a profile from a
//! brick's directory, configuration and startup table.
//!
//! ```no_run
//! # async fn demo() -> pfxbrick::PfxResult<()> {
//! use pfxbrick_profile::{ProfileAssets, ProfileConfig, ProgramOptions, program_brick};
//!
//! let profile = ProfileConfig::load(std::path::Path::new("steam.yml")).await?;
//! let assets = ProfileAssets::load(&profile).await?;
//! let mut brick = pfxbrick::open_usb(None, pfxbrick::TransportConfig::default()).await?;
//! let report = program_brick(&mut brick, &profile, &assets, ProgramOptions::default()).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]

pub mod assets;
pub mod compiler;
pub mod fetch;
pub mod image;
pub mod program;
pub mod roles;
pub mod schema;
pub mod script;
pub mod validation;
pub mod wav;

pub use assets::{ProfileAssets, ProfileFile};
pub use compiler::{
    CompileReport, EventEntry, LUT_LEN, LutProgram, StartupEntry, StepOutcome, StepStatus,
    apply_to_config, empty_lut, lut_program,
};
pub use fetch::{fetch_from_brick, profile_from_brick};
pub use image::{IMAGE_MAGIC, build_image, write_image};
pub use program::{ProgramOptions, program_brick};
pub use roles::{FileRole, SCRIPT_FILE_NAME};
pub use schema::{
    FileAssignment, LightBinding, MotorChannel, OtherSound, ProfileConfig, RemoteBinding,
    SpeedSource, Triggers,
};
pub use script::export_script;
pub use validation::validate_profile;
pub use wav::WavFormat;
