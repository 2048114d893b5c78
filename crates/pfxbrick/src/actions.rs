//! One-shot effects executed through `TEST_ACTION`.
//!
//! Nothing here touches the event/action LUT. Channel lists are 1-based
//! (motors `1..=4`, lights `1..=8`); out-of-range channels are ignored by the
//! mask encoders.

use pfxbrick_errors::PfxResult;
use pfxbrick_hid_protocol::Action;
use pfxbrick_transport::DeviceChannel;

use crate::filedir::FileSpec;
use crate::session::PfxBrick;

impl<C: DeviceChannel> PfxBrick<C> {
    /// Run motors at `speed` (-100..=100), optionally for `duration` seconds.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn set_motor_speed(&mut self, channels: &[u8], speed: i32, duration: Option<f32>) -> PfxResult<()> {
        self.test_action(&Action::set_motor_speed(channels, speed, duration)).await
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn stop_motor(&mut self, channels: &[u8]) -> PfxResult<()> {
        self.test_action(&Action::stop_motor(channels, false)).await
    }

    /// Emergency stop: cut motor power without ramping down.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn estop_motor(&mut self, channels: &[u8]) -> PfxResult<()> {
        self.test_action(&Action::stop_motor(channels, true)).await
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn light_on(&mut self, channels: &[u8]) -> PfxResult<()> {
        self.test_action(&Action::light_on(channels)).await
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn light_off(&mut self, channels: &[u8]) -> PfxResult<()> {
        self.test_action(&Action::light_off(channels)).await
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn light_toggle(&mut self, channels: &[u8]) -> PfxResult<()> {
        self.test_action(&Action::light_toggle(channels)).await
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn set_brightness(&mut self, channels: &[u8], brightness: u8) -> PfxResult<()> {
        self.test_action(&Action::set_brightness(channels, brightness)).await
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn light_fx(&mut self, channels: &[u8], fx_id: u8, params: [u8; 5]) -> PfxResult<()> {
        self.test_action(&Action::light_fx(channels, fx_id, params)).await
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn combo_light_fx(&mut self, fx_id: u8, params: [u8; 5]) -> PfxResult<()> {
        self.test_action(&Action::combo_light_fx(fx_id, params)).await
    }

    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn sound_fx(&mut self, fx_id: u8, params: [u8; 2], file_id: Option<u8>) -> PfxResult<()> {
        self.test_action(&Action::sound_fx(fx_id, params, file_id)).await
    }

    /// Play an audio file once. Names are resolved on the brick.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FileNotFound`](pfxbrick_errors::ValidationError::FileNotFound)
    /// for an unknown name.
    pub async fn play_audio_file(&mut self, file: &FileSpec) -> PfxResult<()> {
        let id = self.resolve_file(file).await?;
        self.test_action(&Action::play_audio_file(id)).await
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::FileNotFound`](pfxbrick_errors::ValidationError::FileNotFound)
    /// for an unknown name.
    pub async fn repeat_audio_file(&mut self, file: &FileSpec) -> PfxResult<()> {
        let id = self.resolve_file(file).await?;
        self.test_action(&Action::repeat_audio_file(id)).await
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::FileNotFound`](pfxbrick_errors::ValidationError::FileNotFound)
    /// for an unknown name.
    pub async fn stop_audio_file(&mut self, file: &FileSpec) -> PfxResult<()> {
        let id = self.resolve_file(file).await?;
        self.test_action(&Action::stop_audio_file(id)).await
    }

    /// Volume in percent, clamped to `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the brick does not answer correctly.
    pub async fn set_volume(&mut self, volume: i32) -> PfxResult<()> {
        self.test_action(&Action::set_volume(volume)).await
    }
}
