//! PFx Brick ICD: wire codec, command payloads, event/action records, LUT
//! addressing, and configuration blocks.
//!
//! This crate is I/O-free. It turns typed values into request payloads and
//! response payloads back into typed values; carrying bytes to a brick is the
//! job of `pfxbrick-transport`.

#![deny(static_mut_refs)]

pub mod action;
pub mod codec;
pub mod config;
pub mod events;
pub mod file;
pub mod fx;
pub mod icd;
pub mod ids;
pub mod notch;
pub mod notification;
pub mod report;
pub mod requests;
pub mod status;

// Flat re-exports so callers can use `pfxbrick_hid_protocol::Foo`.
pub use action::{
    ACTION_LEN, Action, LIGHT_CHANNELS, MOTOR_CHANNELS, decode_motor_speed, encode_motor_speed,
    light_mask, motor_mask,
};
pub use codec::{bcd_version_from_bytes, bcd_version_to_bytes, i8_from_wire, parse_version};
pub use config::{
    AudioConfig, BrickConfig, IMAGE_CONFIG_LEN, LightConfig, MotorConfig, Settings,
};
pub use events::{
    EVT_CHANNELS, EVT_ID_MAX, EVT_ID_TEST_EVENT, EVT_LUT_MAX, STARTUP_ADDRESSES, addr,
    address_description, address_to_evtch, event_ids, evtch_to_address, ir_gesture_to_address,
    ir_gesture_to_evtch, is_startup_address,
};
pub use file::{DirEntry, FreeSpace, decode_name, dir_listing_header};
pub use icd::{
    FILE_INVALID_ID, MSG_NOTIFICATION, OUTPUT_REPORT_LEN, PFX_AUDIO_FILES_MAX, REPLY_BIT,
    REPORT_LEN, attr, opcode_name, opcodes,
};
pub use ids::{PFX_USB_PRODUCT_ID, PFX_USB_VENDOR_ID, is_pfx_ble_name, product_ids};
pub use notch::{
    MAX_NOTCHES, NotchRange, StepAmount, bounds_from_notchcount, map_pct_to_motor_step,
    notch_from_speed, notch_ranges_from_bounds, validate_notch_table,
};
pub use notification::{Notification, scan_notifications, strip_leading_notifications};
pub use report::{RequestBuilder, ResponseReader};
pub use status::{BrickState, BrickStatus, IcdRevision, name_from_response};
