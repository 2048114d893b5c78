//! Both links behave the same through the `DeviceChannel` trait.

use pfxbrick_errors::{PfxError, TransportError};
use pfxbrick_hid_protocol::{Notification, PFX_USB_PRODUCT_ID, PFX_USB_VENDOR_ID, requests};
use pfxbrick_transport::mock::{MockGattLink, MockReportIo};
use pfxbrick_transport::{
    BleChannel, BrickDeviceInfo, Concurrency, DeviceChannel, TransportConfig, UsbChannel,
};

async fn icd_rev(ch: &mut dyn DeviceChannel) -> Result<Vec<u8>, PfxError> {
    ch.transact(&requests::get_icd_rev(true)).await
}

#[tokio::test]
async fn test_same_exchange_over_both_links() -> Result<(), Box<dyn std::error::Error>> {
    let io = MockReportIo::new();
    io.queue_read(vec![0x81, 0x03, 0x39]);
    let mut usb = UsbChannel::new(
        io,
        BrickDeviceInfo::usb(PFX_USB_VENDOR_ID, PFX_USB_PRODUCT_ID, "mock"),
        TransportConfig::default(),
    );

    let link = MockGattLink::new();
    link.queue_reply(vec![0x81, 0x03, 0x39]);
    let mut ble = BleChannel::open(
        link,
        BrickDeviceInfo::ble("24:71:89:cc:09:05"),
        TransportConfig::default(),
    )
    .await?;

    assert_eq!(usb.concurrency(), Concurrency::Blocking);
    assert_eq!(ble.concurrency(), Concurrency::Suspending);
    assert_eq!(icd_rev(&mut usb).await?, icd_rev(&mut ble).await?);
    assert!(usb.notifications().is_none());
    assert!(ble.notifications().is_some());
    Ok(())
}

#[tokio::test]
async fn test_boxed_channel_delegates() -> Result<(), Box<dyn std::error::Error>> {
    let link = MockGattLink::new();
    link.queue_reply(vec![0x8C, b'B']);
    let ch = BleChannel::open(
        link.clone(),
        BrickDeviceInfo::ble("aa:bb"),
        TransportConfig::default(),
    )
    .await?;
    let mut boxed: Box<dyn DeviceChannel> = Box::new(ch);
    assert_eq!(boxed.transact(&requests::get_name()).await?, vec![0x8C, b'B']);
    boxed.close().await?;
    assert!(!link.is_connected());
    assert!(matches!(
        boxed.transact(&requests::get_name()).await,
        Err(PfxError::Transport(TransportError::Closed))
    ));
    Ok(())
}

#[tokio::test]
async fn test_unsolicited_notifications_between_transactions() -> Result<(), Box<dyn std::error::Error>>
{
    let link = MockGattLink::new();
    let ch = BleChannel::open(
        link.clone(),
        BrickDeviceInfo::ble("aa:bb"),
        TransportConfig::default(),
    )
    .await?;
    let mut rx = ch.notifications().ok_or("no router")?.subscribe_channel();
    link.push_unsolicited(&[0x7E, 0x04, 0x0A, 0x7E, 0x08, 0x00]);
    assert_eq!(rx.try_recv()?.notification, Notification::MotorASpeed(10));
    assert_eq!(rx.try_recv()?.notification, Notification::MotorAStop);
    assert!(rx.try_recv().is_err());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_is_discarded() -> Result<(), Box<dyn std::error::Error>> {
    let link = MockGattLink::new();
    let mut ch = BleChannel::open(
        link.clone(),
        BrickDeviceInfo::ble("aa:bb"),
        TransportConfig {
            ble_max_retries: 3,
            ..TransportConfig::default()
        },
    )
    .await?;
    link.push_unsolicited(&[0x82, 0x00]);
    link.queue_reply(vec![0x8C, b'X']);
    assert_eq!(ch.transact(&requests::get_name()).await?, vec![0x8C, b'X']);
    Ok(())
}

mod properties {
    use pfxbrick_hid_protocol::{OUTPUT_REPORT_LEN, PFX_USB_PRODUCT_ID, PFX_USB_VENDOR_ID};
    use pfxbrick_transport::mock::MockReportIo;
    use pfxbrick_transport::{
        BLE_CHUNK_LEN, BrickDeviceInfo, FRAME_END, FRAME_START, TransportConfig, UsbChannel,
        frame_request,
    };
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(200))]

        /// BLE chunks reassemble to start marker, request, end marker.
        #[test]
        fn prop_ble_chunks_reassemble(request in proptest::collection::vec(any::<u8>(), 1..=64)) {
            let framed = frame_request(&request);
            prop_assert_eq!(framed.len(), request.len() + FRAME_START.len() + FRAME_END.len());
            prop_assert!(framed.starts_with(&FRAME_START));
            prop_assert!(framed.ends_with(&FRAME_END));

            let chunks: Vec<&[u8]> = framed.chunks(BLE_CHUNK_LEN).collect();
            prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= BLE_CHUNK_LEN));
            prop_assert_eq!(chunks.concat(), framed);
        }

        /// A USB request of any legal length goes out as report id 0, the
        /// request, and zero padding.
        #[test]
        fn prop_usb_report_padding(
            opcode in 0x01u8..0x7F,
            payload in proptest::collection::vec(any::<u8>(), 0..=63),
        ) {
            let mut request = vec![opcode];
            request.extend_from_slice(&payload);
            let io = MockReportIo::new();
            io.queue_read(vec![opcode | 0x80]);
            let mut ch = UsbChannel::new(
                io.clone(),
                BrickDeviceInfo::usb(PFX_USB_VENDOR_ID, PFX_USB_PRODUCT_ID, "mock"),
                TransportConfig::default(),
            );
            let response = ch
                .transact_blocking(&request)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(response, vec![opcode | 0x80]);

            let writes = io.write_history();
            let report = writes.first().ok_or_else(|| TestCaseError::fail("no report written"))?;
            prop_assert_eq!(report.len(), OUTPUT_REPORT_LEN);
            prop_assert_eq!(report.first().copied(), Some(0u8));
            prop_assert_eq!(report.get(1..=request.len()), Some(request.as_slice()));
            let padding = report.get(request.len() + 1..).unwrap_or(&[]);
            prop_assert!(padding.iter().all(|&b| b == 0));
        }
    }
}
