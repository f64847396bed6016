//! Event channel implementation using crossbeam-channel.
//!
//! Provides a thread-safe way to send events from scanner and copy
//! workers to whoever renders progress.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::Event;

/// Producer half handed to the scanner, the copier and every worker.
///
/// Cloning is cheap. Sending never fails: if nobody is listening the event
/// is dropped, so a run without a progress display behaves the same.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Deliver `event`, blocking only on a full bounded channel
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Consumer half, typically owned by the thread that drives the progress bar
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Next event, or `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Events until every sender has been dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Events queued and not yet received
    pub fn pending(&self) -> usize {
        self.inner.len()
    }
}

/// Constructors for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded pair; producers never wait on the consumer
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Pair holding at most `capacity` undelivered events
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
