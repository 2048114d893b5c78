//! An in-memory PFx Brick that answers ICD requests.
//!
//! [`SimulatedBrick`] implements [`DeviceChannel`], so session code can be
//! exercised end to end without hardware. It keeps an event/action LUT, the
//! configuration block, the brick name and a flat file system whose CRC32
//! values are computed on close, the way the firmware does.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pfxbrick_errors::filesystem::codes;
use pfxbrick_errors::{PfxResult, TransportError};
use pfxbrick_hid_protocol::icd::{BRICK_NAME_LEN, FILE_NAME_LEN, SCRIPT_STOP_ID, dir_req, file_mode};
use pfxbrick_hid_protocol::{
    Action, EVT_CHANNELS, EVT_ID_MAX, FILE_INVALID_ID, Notification, REPLY_BIT,
    REPORT_LEN, decode_name, opcodes,
};
use pfxbrick_transport::{
    BrickDeviceInfo, Concurrency, DeviceChannel, NotificationRouter, check_request,
};
use tracing::debug;

/// Default flash size of the simulated brick.
pub const SIM_CAPACITY: u32 = 16 * 1024 * 1024;

/// Serial number reported by `GET_STATUS`.
pub const SIM_SERIAL: [u8; 4] = [0x12, 0x34, 0xAB, 0xCD];

const LUT_SLOTS: usize = (EVT_ID_MAX as usize + 1) * EVT_CHANNELS as usize;

/// A file stored on the simulated brick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimFile {
    pub name: String,
    pub data: Vec<u8>,
    pub attributes: u16,
    pub user_data1: u32,
    pub user_data2: u32,
    pub crc32: u32,
}

impl SimFile {
    fn finish(&mut self) {
        self.crc32 = crc32fast::hash(&self.data);
        if let Some((rate, bits)) = wav_format(&self.data) {
            self.user_data1 = rate;
            self.user_data2 = bits;
        }
    }
}

/// Sample rate and bit depth of a canonical RIFF/WAVE header.
fn wav_format(data: &[u8]) -> Option<(u32, u32)> {
    if data.get(0..4)? != b"RIFF" || data.get(8..12)? != b"WAVE" {
        return None;
    }
    let rate = u32::from_le_bytes(data.get(24..28)?.try_into().ok()?);
    let bits = u16::from_le_bytes(data.get(34..36)?.try_into().ok()?);
    Some((rate, u32::from(bits)))
}

#[derive(Debug)]
struct OpenFile {
    id: u8,
    mode: u8,
    cursor: usize,
}

#[derive(Debug)]
struct BrickModel {
    icd_rev: [u8; 2],
    name: String,
    config: Vec<u8>,
    lut: Vec<Action>,
    files: BTreeMap<u8, SimFile>,
    open_file: Option<OpenFile>,
    capacity: u32,
    notifications: u8,
    tested: Vec<Action>,
    running_script: Option<u8>,
    reboots: u32,
    factory_resets: u32,
    requests: Vec<Vec<u8>>,
    injected: Option<(u8, u8)>,
    connected: bool,
}

impl Default for BrickModel {
    fn default() -> Self {
        Self {
            icd_rev: [0x03, 0x39],
            name: "PFx Brick".to_string(),
            config: vec![0; REPORT_LEN - 1],
            lut: vec![Action::default(); LUT_SLOTS],
            files: BTreeMap::new(),
            open_file: None,
            capacity: SIM_CAPACITY,
            notifications: 0,
            tested: Vec::new(),
            running_script: None,
            reboots: 0,
            factory_resets: 0,
            requests: Vec::new(),
            injected: None,
            connected: true,
        }
    }
}

fn byte(req: &[u8], i: usize) -> u8 {
    req.get(i).copied().unwrap_or(0)
}

fn be_u16(req: &[u8], i: usize) -> u16 {
    u16::from_be_bytes([byte(req, i), byte(req, i.saturating_add(1))])
}

fn be_u32(req: &[u8], i: usize) -> u32 {
    u32::from_be_bytes([
        byte(req, i),
        byte(req, i.saturating_add(1)),
        byte(req, i.saturating_add(2)),
        byte(req, i.saturating_add(3)),
    ])
}

fn padded(text: &str, width: usize) -> Vec<u8> {
    let mut out: Vec<u8> = text.bytes().take(width).collect();
    out.resize(width, 0);
    out
}

impl BrickModel {
    fn bytes_used(&self) -> u32 {
        let used: usize = self.files.values().map(|f| f.data.len()).sum();
        u32::try_from(used).unwrap_or(u32::MAX)
    }

    fn bytes_left(&self) -> u32 {
        self.capacity.saturating_sub(self.bytes_used())
    }

    fn lut_index(event_id: u8, channel: u8) -> Option<usize> {
        if event_id > EVT_ID_MAX || channel >= EVT_CHANNELS {
            return None;
        }
        Some(usize::from(event_id) * usize::from(EVT_CHANNELS) + usize::from(channel))
    }

    fn handle(&mut self, req: &[u8]) -> Vec<u8> {
        let op = byte(req, 0);
        let tag = op | REPLY_BIT;
        let mut res = match op {
            opcodes::GET_ICD_REV => {
                let [hi, lo] = self.icd_rev;
                vec![tag, hi, lo]
            }
            opcodes::GET_STATUS => self.status(tag),
            opcodes::GET_CONFIG => {
                let mut out = vec![tag];
                out.extend_from_slice(&self.config);
                out
            }
            opcodes::SET_CONFIG => {
                self.config = req.get(1..).unwrap_or_default().to_vec();
                self.config.resize(REPORT_LEN - 1, 0);
                vec![tag]
            }
            opcodes::SET_FACTORY_DEFAULTS => {
                self.config = vec![0; REPORT_LEN - 1];
                self.factory_resets = self.factory_resets.saturating_add(1);
                vec![tag]
            }
            opcodes::REBOOT => {
                self.reboots = self.reboots.saturating_add(1);
                vec![tag]
            }
            opcodes::GET_EVENT_ACTION => {
                let action = Self::lut_index(byte(req, 1), byte(req, 2))
                    .and_then(|i| self.lut.get(i))
                    .copied()
                    .unwrap_or_default();
                let mut out = vec![tag];
                out.extend_from_slice(&action.to_bytes());
                out
            }
            opcodes::SET_EVENT_ACTION => {
                let action = Action::from_bytes(req.get(3..).unwrap_or_default()).unwrap_or_default();
                if let Some(slot) = Self::lut_index(byte(req, 1), byte(req, 2))
                    .and_then(|i| self.lut.get_mut(i))
                {
                    *slot = action;
                }
                vec![tag]
            }
            opcodes::TEST_ACTION => {
                if let Ok(a) = Action::from_bytes(req.get(1..).unwrap_or_default()) {
                    self.tested.push(a);
                }
                vec![tag]
            }
            opcodes::GET_NAME => {
                let mut out = vec![tag];
                out.extend_from_slice(&padded(&self.name, BRICK_NAME_LEN));
                out
            }
            opcodes::SET_NAME => {
                self.name = decode_name(req.get(1..=BRICK_NAME_LEN).unwrap_or_default());
                vec![tag]
            }
            opcodes::SET_NOTIFICATIONS => {
                self.notifications = byte(req, 1);
                vec![tag]
            }
            opcodes::GET_CURRENT_STATE => self.current_state(tag),
            opcodes::FILE_OPEN => vec![tag, self.file_open(req)],
            opcodes::FILE_CLOSE => vec![tag, self.file_close(byte(req, 1))],
            opcodes::FILE_READ => self.file_read(tag, byte(req, 1), byte(req, 2)),
            opcodes::FILE_WRITE => {
                let len = usize::from(byte(req, 2));
                let data = req.get(3..3usize.saturating_add(len)).unwrap_or_default();
                vec![tag, self.file_write(Some(byte(req, 1)), data)]
            }
            opcodes::FILE_WRITE_FAST => {
                let len = usize::from(byte(req, 1));
                let data = req.get(2..2usize.saturating_add(len)).unwrap_or_default();
                vec![tag, self.file_write(None, data)]
            }
            opcodes::FILE_DIR => self.file_dir(tag, req),
            opcodes::FILE_FORMAT_FS => {
                self.files.clear();
                self.open_file = None;
                vec![tag, 0]
            }
            opcodes::RUN_SCRIPT => {
                let id = byte(req, 1);
                if id == SCRIPT_STOP_ID {
                    self.running_script = None;
                    vec![tag, 0]
                } else if self.files.contains_key(&id) {
                    self.running_script = Some(id);
                    vec![tag, 0]
                } else {
                    vec![tag, codes::FILE_NOT_FOUND]
                }
            }
            _ => vec![tag],
        };
        res.resize(REPORT_LEN, 0);
        res
    }

    fn status(&self, tag: u8) -> Vec<u8> {
        let mut out = vec![tag, 0x00, 0x00, 0, 0, 0, 0, 0xA2, 0x16];
        out.extend_from_slice(&SIM_SERIAL);
        out.extend_from_slice(&padded("PFx Brick 16 MB", 24));
        out.extend_from_slice(&[0x01, 0x38, 0x00, 0x12]);
        out
    }

    fn current_state(&self, tag: u8) -> Vec<u8> {
        let mut out = vec![0u8; REPORT_LEN];
        if let Some(b) = out.get_mut(0) {
            *b = tag;
        }
        let brightness = self.config.last().copied().unwrap_or(0);
        let volume = self.config.get(self.config.len().saturating_sub(2)).copied().unwrap_or(0);
        if let Some(b) = out.get_mut(1) {
            *b = brightness;
        }
        if let Some(b) = out.get_mut(2) {
            *b = volume;
        }
        out
    }

    fn file_open(&mut self, req: &[u8]) -> u8 {
        let id = byte(req, 1);
        let mode = byte(req, 2);
        if self.open_file.is_some() {
            return codes::FILE_LOCKED_BUSY;
        }
        if mode & file_mode::WRITE != 0 {
            let size = be_u32(req, 3);
            if size > self.bytes_left() {
                return codes::FILE_SYSTEM_FULL;
            }
            let name = decode_name(req.get(7..7 + FILE_NAME_LEN).unwrap_or_default());
            let file = SimFile {
                name,
                data: Vec::with_capacity(usize::try_from(size).unwrap_or(0)),
                ..SimFile::default()
            };
            if mode & file_mode::CREATE != 0 || !self.files.contains_key(&id) {
                self.files.insert(id, file);
            }
        } else if !self.files.contains_key(&id) {
            return codes::FILE_NOT_FOUND;
        }
        self.open_file = Some(OpenFile {
            id,
            mode,
            cursor: 0,
        });
        0
    }

    fn file_write(&mut self, id: Option<u8>, data: &[u8]) -> u8 {
        let Some(open) = self.open_file.as_ref() else {
            return codes::FILE_INVALID;
        };
        if open.mode & file_mode::WRITE == 0 || id.is_some_and(|i| i != open.id) {
            return codes::FILE_ACCESS_DENIED;
        }
        let Some(file) = self.files.get_mut(&open.id) else {
            return codes::FILE_NOT_FOUND;
        };
        file.data.extend_from_slice(data);
        u8::try_from(data.len()).unwrap_or(0)
    }

    fn file_read(&mut self, tag: u8, id: u8, max_len: u8) -> Vec<u8> {
        let Some(open) = self.open_file.as_mut().filter(|o| o.id == id) else {
            return vec![tag, codes::FILE_INVALID];
        };
        let Some(file) = self.files.get(&id) else {
            return vec![tag, codes::FILE_NOT_FOUND];
        };
        let want = usize::from(max_len.min(62));
        let end = open.cursor.saturating_add(want).min(file.data.len());
        let chunk = file.data.get(open.cursor..end).unwrap_or_default();
        open.cursor = end;
        let mut out = vec![tag, u8::try_from(chunk.len()).unwrap_or(0)];
        out.extend_from_slice(chunk);
        out
    }

    fn file_close(&mut self, id: u8) -> u8 {
        match self.open_file.take() {
            Some(open) if open.id == id => {
                if open.mode & file_mode::WRITE != 0
                    && let Some(file) = self.files.get_mut(&id)
                {
                    file.finish();
                }
                0
            }
            other => {
                self.open_file = other;
                codes::FILE_INVALID
            }
        }
    }

    fn entry_bytes(&self, id: u8) -> Vec<u8> {
        let mut out = vec![id];
        match self.files.get(&id) {
            Some(f) => {
                out.extend_from_slice(&u32::try_from(f.data.len()).unwrap_or(u32::MAX).to_be_bytes());
                out.extend_from_slice(&0u16.to_be_bytes());
                out.extend_from_slice(&f.attributes.to_be_bytes());
                out.extend_from_slice(&f.user_data1.to_be_bytes());
                out.extend_from_slice(&f.user_data2.to_be_bytes());
                out.extend_from_slice(&f.crc32.to_be_bytes());
                out.extend_from_slice(&padded(&f.name, FILE_NAME_LEN));
            }
            None => out.resize(1 + 20 + FILE_NAME_LEN, 0),
        }
        out
    }

    fn file_dir(&mut self, tag: u8, req: &[u8]) -> Vec<u8> {
        let sub = byte(req, 1);
        let mut out = vec![tag, sub];
        match sub {
            dir_req::GET_DIR_ENTRY_IDX => {
                let index = usize::from(be_u16(req, 2));
                let id = index
                    .checked_sub(1)
                    .and_then(|i| self.files.keys().nth(i))
                    .copied()
                    .unwrap_or(FILE_INVALID_ID);
                out.push(0);
                out.extend_from_slice(&self.entry_bytes(id));
            }
            dir_req::GET_DIR_ENTRY_ID => {
                let id = byte(req, 2);
                if self.files.contains_key(&id) {
                    out.push(0);
                    out.extend_from_slice(&self.entry_bytes(id));
                } else {
                    out.push(codes::FILE_NOT_FOUND);
                }
            }
            dir_req::GET_FILE_COUNT => {
                out.push(0);
                let count = u16::try_from(self.files.len()).unwrap_or(u16::MAX);
                out.extend_from_slice(&count.to_be_bytes());
            }
            dir_req::GET_FREE_SPACE => {
                out.push(0);
                out.extend_from_slice(&self.bytes_left().to_be_bytes());
                out.extend_from_slice(&self.capacity.to_be_bytes());
            }
            dir_req::REMOVE_ID => {
                let status = if self.files.remove(&byte(req, 2)).is_some() {
                    0
                } else {
                    codes::FILE_NOT_FOUND
                };
                out.push(status);
            }
            dir_req::SET_NAME_ID => {
                let name = decode_name(req.get(3..3 + FILE_NAME_LEN).unwrap_or_default());
                let status = match self.files.get_mut(&byte(req, 2)) {
                    Some(f) => {
                        f.name = name;
                        0
                    }
                    None => codes::FILE_NOT_FOUND,
                };
                out.push(status);
            }
            dir_req::SET_ATTR_ID => {
                let attributes = be_u16(req, 3);
                let status = match self.files.get_mut(&byte(req, 2)) {
                    Some(f) => {
                        f.attributes = attributes;
                        0
                    }
                    None => codes::FILE_NOT_FOUND,
                };
                out.push(status);
            }
            dir_req::GET_NAMED_FILE_ID => {
                let len = usize::from(byte(req, 2));
                let name = String::from_utf8_lossy(req.get(3..3usize.saturating_add(len)).unwrap_or_default())
                    .into_owned();
                let id = self
                    .files
                    .iter()
                    .find(|(_, f)| f.name == name)
                    .map_or(FILE_INVALID_ID, |(id, _)| *id);
                out.push(id);
            }
            _ => out.push(codes::TRANSFER_INVALID),
        }
        out
    }
}

/// Simulated brick. Clones share the same device state.
#[derive(Clone)]
pub struct SimulatedBrick {
    model: Arc<Mutex<BrickModel>>,
    info: BrickDeviceInfo,
    router: Option<NotificationRouter>,
    open: bool,
}

impl Default for SimulatedBrick {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBrick {
    /// A brick reached over USB.
    pub fn new() -> Self {
        Self {
            model: Arc::new(Mutex::new(BrickModel::default())),
            info: BrickDeviceInfo::usb(
                pfxbrick_hid_protocol::PFX_USB_VENDOR_ID,
                pfxbrick_hid_protocol::PFX_USB_PRODUCT_ID,
                "sim",
            )
            .with_product_name("PFx Brick 16 MB")
            .with_serial("1234ABCD"),
            router: None,
            open: true,
        }
    }

    /// A brick reached over BLE, with a notification router.
    pub fn over_ble() -> Self {
        Self {
            info: BrickDeviceInfo::ble("sim-ble").with_product_name("PFx Brick 16 MB"),
            router: Some(NotificationRouter::new()),
            ..Self::new()
        }
    }

    /// Report a different ICD revision, e.g. `[0x03, 0x36]` for pre-fast-write firmware.
    pub fn with_icd_rev(self, rev: [u8; 2]) -> Self {
        self.model.lock().icd_rev = rev;
        self
    }

    pub fn with_capacity(self, capacity: u32) -> Self {
        self.model.lock().capacity = capacity;
        self
    }

    /// Store a file directly, bypassing the transfer protocol.
    pub fn insert_file(&self, id: u8, name: &str, data: &[u8], attributes: u16) {
        let mut file = SimFile {
            name: name.to_string(),
            data: data.to_vec(),
            attributes,
            ..SimFile::default()
        };
        file.finish();
        self.model.lock().files.insert(id, file);
    }

    pub fn file(&self, id: u8) -> Option<SimFile> {
        self.model.lock().files.get(&id).cloned()
    }

    pub fn file_ids(&self) -> Vec<u8> {
        self.model.lock().files.keys().copied().collect()
    }

    /// The LUT record at `address`.
    pub fn lut_action(&self, address: u8) -> Option<Action> {
        self.model.lock().lut.get(usize::from(address)).copied()
    }

    pub fn set_lut_action(&self, address: u8, action: Action) {
        if let Some(slot) = self.model.lock().lut.get_mut(usize::from(address)) {
            *slot = action;
        }
    }

    pub fn name(&self) -> String {
        self.model.lock().name.clone()
    }

    /// Raw configuration block (bytes 1-63 of `SET_CONFIG`).
    pub fn config_bytes(&self) -> Vec<u8> {
        self.model.lock().config.clone()
    }

    pub fn notification_mask(&self) -> u8 {
        self.model.lock().notifications
    }

    /// Actions sent with `TEST_ACTION`, oldest first.
    pub fn tested_actions(&self) -> Vec<Action> {
        self.model.lock().tested.clone()
    }

    pub fn running_script(&self) -> Option<u8> {
        self.model.lock().running_script
    }

    pub fn reboots(&self) -> u32 {
        self.model.lock().reboots
    }

    pub fn factory_resets(&self) -> u32 {
        self.model.lock().factory_resets
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.model.lock().requests.clone()
    }

    /// Opcodes of every request received.
    pub fn opcodes(&self) -> Vec<u8> {
        self.model
            .lock()
            .requests
            .iter()
            .filter_map(|r| r.first().copied())
            .collect()
    }

    pub fn clear_requests(&self) {
        self.model.lock().requests.clear();
    }

    /// Answer the next request with `opcode` using status `code` in byte 1.
    pub fn fail_next(&self, opcode: u8, code: u8) {
        self.model.lock().injected = Some((opcode, code));
    }

    /// Simulate the brick going away.
    pub fn disconnect(&self) {
        self.model.lock().connected = false;
    }

    /// Push a notification to subscribers, as the BLE receive path would.
    pub fn emit(&self, notification: Notification) {
        if let Some(router) = &self.router {
            router.dispatch(notification);
        }
    }
}

#[async_trait]
impl DeviceChannel for SimulatedBrick {
    fn concurrency(&self) -> Concurrency {
        if self.router.is_some() {
            Concurrency::Suspending
        } else {
            Concurrency::Blocking
        }
    }

    fn info(&self) -> &BrickDeviceInfo {
        &self.info
    }

    fn is_open(&self) -> bool {
        self.open && self.model.lock().connected
    }

    async fn transact(&mut self, request: &[u8]) -> PfxResult<Vec<u8>> {
        let opcode = check_request(request)?;
        if !self.open {
            return Err(TransportError::Closed.into());
        }
        let mut model = self.model.lock();
        if !model.connected {
            return Err(TransportError::Disconnected.into());
        }
        model.requests.push(request.to_vec());
        if let Some((op, code)) = model.injected
            && op == opcode
        {
            model.injected = None;
            debug!(opcode, code, "injected failure");
            let mut res = vec![opcode | REPLY_BIT, code];
            if opcode == opcodes::FILE_DIR {
                res = vec![opcode | REPLY_BIT, byte(request, 1), code];
            }
            res.resize(REPORT_LEN, 0);
            return Ok(res);
        }
        Ok(model.handle(request))
    }

    async fn close(&mut self) -> PfxResult<()> {
        self.open = false;
        Ok(())
    }

    fn notifications(&self) -> Option<NotificationRouter> {
        self.router.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::must;
    use pfxbrick_hid_protocol::requests;

    #[tokio::test]
    async fn test_lut_round_trip() {
        let mut sim = SimulatedBrick::new();
        let action = Action::play_audio_file(0x21);
        must(sim.transact(&must(requests::set_event_action(0x0F, 1, &action))).await);
        let res = must(sim.transact(&must(requests::get_event_action(0x0F, 1))).await);
        assert_eq!(must(Action::from_bytes(res.get(1..).unwrap_or_default())), action);
        assert_eq!(sim.lut_action(0x3D), Some(action));
    }

    #[tokio::test]
    async fn test_write_computes_crc() {
        let mut sim = SimulatedBrick::new();
        let data = b"hello brick";
        must(sim.transact(&requests::file_open_write(5, 11, "hi.txt")).await);
        must(sim.transact(&must(requests::file_write(5, data))).await);
        must(sim.transact(&requests::file_close(5)).await);
        let file = must_some_file(&sim, 5);
        assert_eq!(file.crc32, crc32fast::hash(data));
        assert_eq!(file.name, "hi.txt");
    }

    fn must_some_file(sim: &SimulatedBrick, id: u8) -> SimFile {
        crate::must_some(sim.file(id), "file missing")
    }

    #[test]
    fn test_wav_header_fills_user_data() {
        let mut header = Vec::new();
        header.extend_from_slice(b"RIFF");
        header.extend_from_slice(&[0; 4]);
        header.extend_from_slice(b"WAVEfmt ");
        header.extend_from_slice(&[16, 0, 0, 0, 1, 0, 1, 0]);
        header.extend_from_slice(&22050u32.to_le_bytes());
        header.extend_from_slice(&[0; 6]);
        header.extend_from_slice(&16u16.to_le_bytes());
        let sim = SimulatedBrick::new();
        sim.insert_file(0xE0, "idle.wav", &header, 0x20);
        let f = must_some_file(&sim, 0xE0);
        assert_eq!((f.user_data1, f.user_data2), (22050, 16));
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let mut sim = SimulatedBrick::new();
        sim.fail_next(opcodes::FILE_OPEN, codes::FILE_SYSTEM_FULL);
        let res = must(sim.transact(&requests::file_open_write(1, 10, "a")).await);
        assert_eq!(res.get(1), Some(&codes::FILE_SYSTEM_FULL));
        let res = must(sim.transact(&requests::file_open_write(1, 10, "a")).await);
        assert_eq!(res.get(1), Some(&0));
    }

    #[tokio::test]
    async fn test_disconnect() {
        let mut sim = SimulatedBrick::new();
        sim.disconnect();
        assert!(!sim.is_open());
        assert!(sim.transact(&requests::get_name()).await.is_err());
    }
}
