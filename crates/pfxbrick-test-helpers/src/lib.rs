//! Shared test utilities for the PFx Brick crates.
//!
//! - [`brick`]: a simulated brick implementing `DeviceChannel`
//! - [`mod@must`]: unwrap helpers with `#[track_caller]`
//!
//! ```toml
//! [dev-dependencies]
//! pfxbrick-test-helpers = { workspace = true }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod brick;
pub mod must;

pub use brick::{SIM_CAPACITY, SIM_SERIAL, SimFile, SimulatedBrick};
pub use must::*;
