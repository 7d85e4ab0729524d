//! Drag-and-drop events as scoped subscriptions.
//!
//! A [`DropSurface`] stands for the whole viewport: whatever emits drag
//! events (the interactive terminal loop, a test) sends them to the surface,
//! and the surface fans them out to every live [`DropSubscription`].
//!
//! Subscriptions are owned values. A component subscribes when it becomes
//! active and the subscription removes itself from the surface when dropped,
//! so no listener outlives its owner.

use crate::types::ImageFile;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

/// A drag gesture over the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    /// Items released over the surface, in the order the host listed them.
    Drop(Vec<ImageFile>),
}

type Listeners = Mutex<Vec<(u64, UnboundedSender<DragEvent>)>>;

/// Broadcast point for drag events.
#[derive(Default)]
pub struct DropSurface {
    listeners: Arc<Listeners>,
    next_id: AtomicU64,
}

impl DropSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start listening. Events emitted after this call are delivered until
    /// the returned subscription is dropped.
    pub fn subscribe(&self) -> DropSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, tx));
        }
        DropSubscription {
            id,
            events: rx,
            surface: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver `event` to every live subscription.
    pub fn emit(&self, event: DragEvent) {
        if let Ok(listeners) = self.listeners.lock() {
            for (_, tx) in listeners.iter() {
                // A closed receiver is a subscription mid-drop; it removes itself.
                let _ = tx.send(event.clone());
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// A live listener on a [`DropSurface`]. Unsubscribes on drop.
pub struct DropSubscription {
    id: u64,
    events: UnboundedReceiver<DragEvent>,
    surface: Weak<Listeners>,
}

impl DropSubscription {
    /// Wait for the next event. `None` once the surface is gone.
    pub async fn recv(&mut self) -> Option<DragEvent> {
        self.events.recv().await
    }

    /// Next already-delivered event, if any.
    pub fn try_recv(&mut self) -> Option<DragEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl Drop for DropSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.surface.upgrade() {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_reach_every_subscriber() {
        let surface = DropSurface::new();
        let mut a = surface.subscribe();
        let mut b = surface.subscribe();

        surface.emit(DragEvent::Enter);
        assert_eq!(a.try_recv(), Some(DragEvent::Enter));
        assert_eq!(b.try_recv(), Some(DragEvent::Enter));
        assert_eq!(a.try_recv(), None);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let surface = DropSurface::new();
        let sub = surface.subscribe();
        assert_eq!(surface.subscriber_count(), 1);
        drop(sub);
        assert_eq!(surface.subscriber_count(), 0);
        surface.emit(DragEvent::Over);
    }

    #[test]
    fn events_before_subscribe_are_not_seen() {
        let surface = DropSurface::new();
        surface.emit(DragEvent::Leave);
        let mut sub = surface.subscribe();
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn subscription_outliving_surface_is_harmless() {
        let surface = DropSurface::new();
        let mut sub = surface.subscribe();
        drop(surface);
        assert_eq!(sub.try_recv(), None);
        drop(sub);
    }

    #[tokio::test]
    async fn recv_waits_for_drop_payload() {
        let surface = DropSurface::new();
        let mut sub = surface.subscribe();
        let file = ImageFile::new("a.png", "image/png", vec![1]);
        surface.emit(DragEvent::Drop(vec![file.clone()]));
        assert_eq!(sub.recv().await, Some(DragEvent::Drop(vec![file])));
    }
}
