//! Identity of a discovered or connected brick.

use serde::{Deserialize, Serialize};

/// Physical link a brick is reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    Usb,
    Ble,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickDeviceInfo {
    pub link: LinkKind,
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product_name: Option<String>,
    /// HID path for USB, peripheral address for BLE.
    pub path: String,
}

impl BrickDeviceInfo {
    pub fn usb(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
        Self {
            link: LinkKind::Usb,
            vendor_id,
            product_id,
            serial_number: None,
            manufacturer: None,
            product_name: None,
            path: path.into(),
        }
    }

    pub fn ble(address: impl Into<String>) -> Self {
        Self {
            link: LinkKind::Ble,
            vendor_id: 0,
            product_id: 0,
            serial_number: None,
            manufacturer: Some("Fx Bricks".to_string()),
            product_name: None,
            path: address.into(),
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> String {
        let name = self
            .product_name
            .clone()
            .or_else(|| self.manufacturer.clone())
            .unwrap_or_else(|| format!("{:04x}:{:04x}", self.vendor_id, self.product_id));
        match &self.serial_number {
            Some(sn) => format!("{name}, Serial No: {sn}"),
            None => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let bare = BrickDeviceInfo::usb(0x04D8, 0xEF74, "/dev/hidraw3");
        assert_eq!(bare.display_name(), "04d8:ef74");
        let named = bare
            .with_product_name("PFx Brick 16 MB")
            .with_serial("ABCD1234");
        assert_eq!(named.display_name(), "PFx Brick 16 MB, Serial No: ABCD1234");
        assert_eq!(BrickDeviceInfo::ble("24:71:89:cc:09:05").display_name(), "Fx Bricks");
    }
}
