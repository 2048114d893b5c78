//! Transport tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeouts and retry budgets for both links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Blocking USB read timeout.
    pub usb_read_timeout_ms: i32,
    /// Interval between BLE mailbox polls.
    pub ble_poll_interval_ms: u64,
    /// BLE polls before a transaction times out.
    pub ble_max_retries: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            usb_read_timeout_ms: 1000,
            ble_poll_interval_ms: 10,
            ble_max_retries: 100,
        }
    }
}

impl TransportConfig {
    pub fn ble_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ble_poll_interval_ms)
    }

    /// Total BLE wait budget in milliseconds.
    pub fn ble_budget_ms(&self) -> u64 {
        self.ble_poll_interval_ms
            .saturating_mul(u64::from(self.ble_max_retries))
    }

    pub fn usb_budget_ms(&self) -> u64 {
        u64::try_from(self.usb_read_timeout_ms).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = TransportConfig::default();
        assert_eq!(c.usb_read_timeout_ms, 1000);
        assert_eq!(c.ble_poll_interval(), Duration::from_millis(10));
        assert_eq!(c.ble_budget_ms(), 1000);
    }
}
