// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;

use futures::stream::Stream;
use futures::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Pool-level notifications. Device events carry an object path, presentable
/// events carry a presentable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    DeviceAdded(String),
    DeviceRemoved(String),
    DeviceChanged(String),
    DeviceJobChanged(String),
    PresentableAdded(String),
    PresentableRemoved(String),
    PresentableChanged(String),
    PresentableJobChanged(String),
}

/// Notifications about a single presentable.
///
/// After `Removed` the presentable is gone from the pool and the stream ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentableEvent {
    Changed,
    JobChanged,
    Removed,
}

/// Stream of pool events, see `Pool::subscribe`.
pub struct PoolEventStream {
    receiver: mpsc::UnboundedReceiver<PoolEvent>,
}

impl PoolEventStream {
    /// Next already-queued event, if any.
    pub fn try_recv(&mut self) -> Option<PoolEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drain everything queued so far.
    pub fn drain(&mut self) -> Vec<PoolEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Stream for PoolEventStream {
    type Item = PoolEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Stream of events for one presentable, see `Pool::watch`.
pub struct PresentableEventStream {
    receiver: mpsc::UnboundedReceiver<PresentableEvent>,
}

impl PresentableEventStream {
    pub fn try_recv(&mut self) -> Option<PresentableEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn drain(&mut self) -> Vec<PresentableEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Stream for PresentableEventStream {
    type Item = PresentableEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// A notification queued while the pool state is locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notification {
    Pool(PoolEvent),
    Presentable(String, PresentableEvent),
}

/// Registered listeners. Senders whose receiver was dropped are pruned on
/// the next dispatch.
#[derive(Default)]
pub(crate) struct EventHub {
    subscribers: Vec<mpsc::UnboundedSender<PoolEvent>>,
    watchers: HashMap<String, Vec<mpsc::UnboundedSender<PresentableEvent>>>,
}

impl EventHub {
    pub(crate) fn subscribe(&mut self) -> PoolEventStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.push(sender);
        PoolEventStream { receiver }
    }

    pub(crate) fn watch(&mut self, id: &str) -> PresentableEventStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.watchers.entry(id.to_string()).or_default().push(sender);
        PresentableEventStream { receiver }
    }

    pub(crate) fn dispatch(&mut self, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::Pool(event) => {
                    self.subscribers
                        .retain(|sender| sender.send(event.clone()).is_ok());
                }
                Notification::Presentable(id, event) => {
                    let Some(senders) = self.watchers.get_mut(&id) else {
                        continue;
                    };
                    senders.retain(|sender| sender.send(event).is_ok());
                    if event == PresentableEvent::Removed || senders.is_empty() {
                        debug!("Dropping watchers for {id}");
                        self.watchers.remove(&id);
                    }
                }
            }
        }
    }
}
