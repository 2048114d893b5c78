//! The request/response capability every link implements.

use async_trait::async_trait;
use pfxbrick_errors::{PfxResult, TransportError};
use pfxbrick_hid_protocol::{REPLY_BIT, REPORT_LEN};

use crate::device_info::BrickDeviceInfo;
use crate::notify::NotificationRouter;

/// How a channel waits for its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// The calling thread blocks for the whole transaction (USB-HID).
    Blocking,
    /// The calling task is suspended while the response arrives (BLE).
    Suspending,
}

/// A half-duplex request/response channel to one brick.
///
/// Exactly one transaction may be outstanding; `&mut self` enforces that at
/// compile time for a single owner.
#[async_trait]
pub trait DeviceChannel: Send {
    fn concurrency(&self) -> Concurrency;

    fn info(&self) -> &BrickDeviceInfo;

    fn is_open(&self) -> bool;

    /// Send `request` and return the matching response.
    ///
    /// # Errors
    ///
    /// Returns a transport error for an oversized request, a timeout, a
    /// response whose tag is not `request[0] | 0x80`, or a dead link.
    async fn transact(&mut self, request: &[u8]) -> PfxResult<Vec<u8>>;

    /// # Errors
    ///
    /// Returns a transport error if the link fails to shut down cleanly.
    async fn close(&mut self) -> PfxResult<()>;

    /// Router for unsolicited notifications, if the link delivers them.
    fn notifications(&self) -> Option<NotificationRouter> {
        None
    }
}

#[async_trait]
impl<C: DeviceChannel + ?Sized> DeviceChannel for Box<C> {
    fn concurrency(&self) -> Concurrency {
        (**self).concurrency()
    }

    fn info(&self) -> &BrickDeviceInfo {
        (**self).info()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    async fn transact(&mut self, request: &[u8]) -> PfxResult<Vec<u8>> {
        (**self).transact(request).await
    }

    async fn close(&mut self) -> PfxResult<()> {
        (**self).close().await
    }

    fn notifications(&self) -> Option<NotificationRouter> {
        (**self).notifications()
    }
}

/// Validate a request before it goes on the wire and return its opcode.
///
/// # Errors
///
/// Returns [`TransportError::RequestTooLong`] for an empty request or one
/// longer than a report payload.
pub fn check_request(request: &[u8]) -> PfxResult<u8> {
    match request.first() {
        Some(&opcode) if request.len() <= REPORT_LEN => Ok(opcode),
        _ => Err(TransportError::RequestTooLong {
            len: request.len(),
            max: REPORT_LEN,
        }
        .into()),
    }
}

/// Check that a response answers `opcode`.
///
/// # Errors
///
/// Returns [`TransportError::InvalidResponse`] on a tag mismatch and
/// [`TransportError::ShortResponse`] for an empty response.
pub fn check_response(opcode: u8, response: &[u8]) -> PfxResult<()> {
    match response.first() {
        None => Err(TransportError::short_response(opcode, 1, 0).into()),
        Some(&tag) if tag == opcode | REPLY_BIT => Ok(()),
        Some(&tag) => Err(TransportError::invalid_response(opcode, tag).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfxbrick_errors::PfxError;

    #[test]
    fn test_request_limits() {
        assert_eq!(check_request(&[0x02]).ok(), Some(0x02));
        assert!(check_request(&[]).is_err());
        assert!(check_request(&[0u8; 64]).is_ok());
        assert!(matches!(
            check_request(&[0u8; 65]),
            Err(PfxError::Transport(TransportError::RequestTooLong { len: 65, max: 64 }))
        ));
    }

    #[test]
    fn test_response_tag() {
        assert!(check_response(0x01, &[0x81, 0x03, 0x39]).is_ok());
        assert!(matches!(
            check_response(0x01, &[0x82]),
            Err(PfxError::Transport(TransportError::InvalidResponse {
                expected: 0x81,
                actual: 0x82
            }))
        ));
        assert!(check_response(0x01, &[]).is_err());
    }
}
