//! PFx Brick USB and Bluetooth identifiers.
//!
//! The brick enumerates as a vendor-defined HID device using the Microchip
//! vendor ID. Over Bluetooth it exposes the Microchip "transparent UART"
//! GATT service: the host writes framed requests to the TX characteristic and
//! receives responses and unsolicited notifications on the RX characteristic.

#![deny(static_mut_refs)]

/// USB vendor ID (Microchip Technology).
pub const PFX_USB_VENDOR_ID: u16 = 0x04D8;

/// USB product ID of the PFx Brick.
pub const PFX_USB_PRODUCT_ID: u16 = 0xEF74;

/// Product IDs reported in the `GET_STATUS` response.
pub mod product_ids {
    /// PFx Brick 4 MB (16 light outputs, audio).
    pub const PFX_BRICK_4MB: u16 = 0xA204;
    /// PFx Brick 16 MB with Bluetooth.
    pub const PFX_BRICK_16MB: u16 = 0xA216;
}

/// Human-readable product name for a status product ID.
pub fn product_name(product_id: u16) -> Option<&'static str> {
    match product_id {
        product_ids::PFX_BRICK_4MB => Some("PFx Brick 4 MB"),
        product_ids::PFX_BRICK_16MB => Some("PFx Brick 16 MB"),
        _ => None,
    }
}

/// Advertised name prefix used to recognise bricks during a BLE scan.
pub const BLE_NAME_PREFIX: &str = "PFx";

/// Transparent UART service UUID.
pub const BLE_UART_SERVICE_UUID: &str = "49535343-fe7d-4ae5-8fa9-9fafd205e455";

/// Host to brick characteristic (write without response).
pub const BLE_UART_TX_UUID: &str = "49535343-8841-43f4-a8d4-ecbe34729bb3";

/// Brick to host characteristic (notify).
pub const BLE_UART_RX_UUID: &str = "49535343-1e4d-4bd9-ba61-23c647249616";

/// Whether an advertised BLE local name looks like a PFx Brick.
pub fn is_pfx_ble_name(name: &str) -> bool {
    name.starts_with(BLE_NAME_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_names() {
        assert_eq!(
            product_name(product_ids::PFX_BRICK_16MB),
            Some("PFx Brick 16 MB")
        );
        assert_eq!(product_name(0x0000), None);
    }

    #[test]
    fn test_ble_name_filter() {
        assert!(is_pfx_ble_name("PFx Brick 16 MB"));
        assert!(!is_pfx_ble_name("SBrick"));
    }
}
