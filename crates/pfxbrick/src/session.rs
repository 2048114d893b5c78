//! A session with one brick over any [`DeviceChannel`].

use pfxbrick_errors::PfxResult;
use pfxbrick_hid_protocol::icd::notify;
use pfxbrick_hid_protocol::{
    Action, BrickConfig, BrickState, BrickStatus, IcdRevision, STARTUP_ADDRESSES,
    address_to_evtch, name_from_response, requests,
};
use pfxbrick_transport::{BrickDeviceInfo, DeviceChannel, NotificationRouter};
use tracing::{debug, info, warn};

use crate::filedir::FileDir;
use crate::lut::{EffectKey, LutEntry, StartupPlacement, dump_coordinates, plan_startup_slot};

/// Host-side handle to a PFx Brick.
///
/// Every method issues one or more transactions on the channel and returns
/// as soon as the brick answers. Cached values (`icd_rev`, `status`,
/// `config`, `name`, `file_dir`) are only as fresh as the last call that
/// fetched them.
pub struct PfxBrick<C: DeviceChannel> {
    pub(crate) channel: C,
    pub(crate) icd_rev: Option<IcdRevision>,
    pub(crate) status: Option<BrickStatus>,
    pub(crate) config: Option<BrickConfig>,
    pub(crate) name: Option<String>,
    pub(crate) file_dir: FileDir,
}

impl<C: DeviceChannel> PfxBrick<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            icd_rev: None,
            status: None,
            config: None,
            name: None,
            file_dir: FileDir::default(),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    pub fn device_info(&self) -> &BrickDeviceInfo {
        self.channel.info()
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    pub fn cached_status(&self) -> Option<&BrickStatus> {
        self.status.as_ref()
    }

    pub fn cached_config(&self) -> Option<&BrickConfig> {
        self.config.as_ref()
    }

    pub fn file_dir(&self) -> &FileDir {
        &self.file_dir
    }

    /// Notification router, present on BLE sessions.
    pub fn notifications(&self) -> Option<NotificationRouter> {
        self.channel.notifications()
    }

    /// Send a raw request and return the raw response.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn raw_transaction(&mut self, request: &[u8]) -> PfxResult<Vec<u8>> {
        self.channel.transact(request).await
    }

    /// # Errors
    ///
    /// Propagates transport errors from shutting the link down.
    pub async fn close(&mut self) -> PfxResult<()> {
        self.channel.close().await
    }

    /// Query the ICD revision. `silent` suppresses the status LED blink.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn get_icd_rev(&mut self, silent: bool) -> PfxResult<IcdRevision> {
        let res = self.channel.transact(&requests::get_icd_rev(silent)).await?;
        let rev = IcdRevision::from_response(&res)?;
        debug!(icd = %rev, "ICD revision");
        self.icd_rev = Some(rev.clone());
        Ok(rev)
    }

    /// Cached ICD revision, fetched silently on first use.
    pub(crate) async fn icd_rev(&mut self) -> PfxResult<IcdRevision> {
        match &self.icd_rev {
            Some(rev) => Ok(rev.clone()),
            None => self.get_icd_rev(true).await,
        }
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn get_status(&mut self) -> PfxResult<BrickStatus> {
        let res = self.channel.transact(&requests::get_status()).await?;
        let status = BrickStatus::from_response(&res)?;
        self.status = Some(status.clone());
        Ok(status)
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn get_config(&mut self) -> PfxResult<BrickConfig> {
        let res = self.channel.transact(&requests::get_config()).await?;
        let config = BrickConfig::from_response(&res)?;
        self.config = Some(config.clone());
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn set_config(&mut self, config: &BrickConfig) -> PfxResult<()> {
        self.channel.transact(&requests::set_config(config)).await?;
        self.config = Some(config.clone());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn reset_factory_config(&mut self) -> PfxResult<()> {
        info!("resetting configuration to factory defaults");
        self.channel.transact(&requests::set_factory_defaults()).await?;
        self.config = None;
        Ok(())
    }

    /// Restart the brick. The link usually drops afterwards.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the request cannot be sent.
    pub async fn reboot(&mut self) -> PfxResult<()> {
        info!("restarting PFx Brick");
        self.channel.transact(&requests::reboot()).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn get_name(&mut self) -> PfxResult<String> {
        let res = self.channel.transact(&requests::get_name()).await?;
        let name = name_from_response(&res)?;
        self.name = Some(name.clone());
        Ok(name)
    }

    /// # Errors
    ///
    /// Returns a validation error for names over 24 bytes.
    pub async fn set_name(&mut self, name: &str) -> PfxResult<()> {
        self.channel.transact(&requests::set_name(name)?).await?;
        self.name = Some(name.to_string());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation error for coordinates outside the LUT and a
    /// transport error if the brick does not answer correctly.
    pub async fn get_action(&mut self, event_id: u8, channel: u8) -> PfxResult<Action> {
        let res = self
            .channel
            .transact(&requests::get_event_action(event_id, channel)?)
            .await?;
        Action::from_bytes(res.get(1..).unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns a validation error for coordinates outside the LUT and a
    /// transport error if the brick does not answer correctly.
    pub async fn set_action(&mut self, event_id: u8, channel: u8, action: &Action) -> PfxResult<()> {
        self.channel
            .transact(&requests::set_event_action(event_id, channel, action)?)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a validation error for an address above `0x7F`.
    pub async fn get_action_by_address(&mut self, address: u8) -> PfxResult<Action> {
        let (event_id, channel) = address_to_evtch(address)?;
        self.get_action(event_id, channel).await
    }

    /// # Errors
    ///
    /// Returns a validation error for an address above `0x7F`.
    pub async fn set_action_by_address(&mut self, address: u8, action: &Action) -> PfxResult<()> {
        let (event_id, channel) = address_to_evtch(address)?;
        self.set_action(event_id, channel, action).await
    }

    /// Execute `action` immediately without storing it.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn test_action(&mut self, action: &Action) -> PfxResult<()> {
        self.channel.transact(&requests::test_action(action)).await?;
        Ok(())
    }

    /// Store `action` in one of the eight startup slots.
    ///
    /// An identical stored action is left alone; otherwise a slot holding
    /// the effect named by `key` is overwritten; otherwise the first empty
    /// slot is used. Pass `EffectKey::of(action)` to replace whatever slot
    /// drives the same effect, or `None` to only ever add.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::LutFull` if every slot holds an unrelated
    /// action; nothing is written in that case.
    pub async fn configure_startup_action(
        &mut self,
        action: &Action,
        key: Option<EffectKey>,
    ) -> PfxResult<StartupPlacement> {
        let mut slots = Vec::with_capacity(STARTUP_ADDRESSES.len());
        for address in STARTUP_ADDRESSES {
            slots.push((address, self.get_action_by_address(address).await?));
        }
        let placement = match plan_startup_slot(&slots, action, key) {
            Ok(p) => p,
            Err(e) => {
                warn!("no free startup slot for action, startup table is full");
                return Err(e);
            }
        };
        if placement.needs_write() {
            self.set_action_by_address(placement.address(), action).await?;
        }
        info!(%placement, "startup action");
        Ok(placement)
    }

    /// Read every LUT record for event ids `0..0x13`, four channels each.
    ///
    /// # Errors
    ///
    /// Stops at the first failed transaction.
    pub async fn dump_lut(&mut self) -> PfxResult<Vec<LutEntry>> {
        let mut entries = Vec::new();
        for (event_id, channel) in dump_coordinates() {
            let action = self.get_action(event_id, channel).await?;
            entries.push(LutEntry::new(event_id, channel, action)?);
        }
        Ok(entries)
    }

    /// Write the empty action over every slot covered by [`dump_lut`](Self::dump_lut).
    ///
    /// # Errors
    ///
    /// Stops at the first failed transaction.
    pub async fn clear_lut(&mut self) -> PfxResult<()> {
        let empty = Action::new();
        for (event_id, channel) in dump_coordinates() {
            self.set_action(event_id, channel, &empty).await?;
        }
        info!("event/action LUT cleared");
        Ok(())
    }

    /// Enable notification `events` (a mask of `notify` flags) on the BLE
    /// link. Audio notifications refresh the file directory first so that
    /// subscribers get file names.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn set_notifications(&mut self, events: u8) -> PfxResult<()> {
        if events & (notify::AUDIO_PLAY | notify::AUDIO_PLAY_DONE) != 0 {
            self.refresh_file_dir().await?;
        }
        self.channel
            .transact(&requests::set_notifications(notify::TO_BLE | events))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn disable_notifications(&mut self) -> PfxResult<()> {
        self.channel.transact(&requests::set_notifications(0)).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn get_current_state(&mut self) -> PfxResult<BrickState> {
        let res = self.channel.transact(&requests::get_current_state()).await?;
        BrickState::from_response(&res)
    }
}
