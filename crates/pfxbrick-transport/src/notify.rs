//! Dispatch of unsolicited notifications to subscribers.
//!
//! Audio notifications carry a file id. The router resolves it to a name
//! through a file-name table the session refreshes from its directory cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use pfxbrick_hid_protocol::{Notification, scan_notifications};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// A decoded notification with its file name resolved, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub notification: Notification,
    pub file_name: Option<String>,
}

type Callback = Arc<dyn Fn(&NotificationEvent) + Send + Sync>;

#[derive(Default)]
struct RouterInner {
    callbacks: Vec<Callback>,
    senders: Vec<mpsc::UnboundedSender<NotificationEvent>>,
}

/// Cloneable handle shared by the receive path and the session.
#[derive(Clone, Default)]
pub struct NotificationRouter {
    inner: Arc<RwLock<RouterInner>>,
    file_names: Arc<RwLock<BTreeMap<u8, String>>>,
}

impl NotificationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked on the receive path.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        self.inner.write().callbacks.push(Arc::new(callback));
    }

    /// Register a channel receiving every notification.
    pub fn subscribe_channel(&self) -> mpsc::UnboundedReceiver<NotificationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().senders.push(tx);
        rx
    }

    pub fn clear_subscribers(&self) {
        let mut inner = self.inner.write();
        inner.callbacks.clear();
        inner.senders.clear();
    }

    /// Replace the id-to-name table used for audio notifications.
    pub fn set_file_names<I>(&self, names: I)
    where
        I: IntoIterator<Item = (u8, String)>,
    {
        let mut table = self.file_names.write();
        table.clear();
        table.extend(names);
    }

    pub fn file_name(&self, file_id: u8) -> Option<String> {
        self.file_names.read().get(&file_id).cloned()
    }

    pub fn dispatch(&self, notification: Notification) {
        let event = NotificationEvent {
            notification,
            file_name: notification.file_id().and_then(|id| self.file_name(id)),
        };
        debug!(?event, "notification");
        let callbacks: Vec<Callback> = {
            let mut inner = self.inner.write();
            inner.senders.retain(|tx| tx.send(event.clone()).is_ok());
            inner.callbacks.clone()
        };
        for cb in callbacks {
            cb(&event);
        }
    }

    /// Dispatch every notification frame found in a received buffer and
    /// return how many there were.
    pub fn dispatch_buffer(&self, buffer: &[u8]) -> usize {
        let found = scan_notifications(buffer);
        for (offset, n) in &found {
            trace!(offset, "notification frame");
            self.dispatch(*n);
        }
        found.len()
    }
}

impl core::fmt::Debug for NotificationRouter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("NotificationRouter")
            .field("callbacks", &inner.callbacks.len())
            .field("channels", &inner.senders.len())
            .field("file_names", &self.file_names.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_audio_names_resolved() {
        let router = NotificationRouter::new();
        router.set_file_names([(0x21, "bell.wav".to_string())]);
        let mut rx = router.subscribe_channel();
        router.dispatch(Notification::AudioPlay { file_id: 0x21 });
        router.dispatch(Notification::AudioPlayDone { file_id: 0x22 });
        let first = rx.try_recv().ok();
        let second = rx.try_recv().ok();
        assert_eq!(first.and_then(|e| e.file_name), Some("bell.wav".to_string()));
        assert_eq!(second.map(|e| e.file_name), Some(None));
    }

    #[test]
    fn test_buffer_dispatch_counts_frames() {
        let router = NotificationRouter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        router.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let n = router.dispatch_buffer(&[0x7E, 0x08, 0x00, 0x7E, 0x20, 0x00, 0x81]);
        assert_eq!(n, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropped_receivers_pruned() {
        let router = NotificationRouter::new();
        drop(router.subscribe_channel());
        router.dispatch(Notification::MotorAStop);
        assert!(format!("{router:?}").contains("channels: 0"));
    }
}
