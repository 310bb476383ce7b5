//! Scoped registration for source notifications

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, warn};

use super::{Source, SourceEvent};

/// What a subscriber observes when it waits on a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<E> {
    /// Data may be available
    Readable,
    /// No more data will arrive (also reported once every sender is gone)
    End,
    /// The source faulted
    Error(E),
    /// The subscriber fell behind and this many notifications were overwritten
    Missed(u64),
}

impl<E> From<SourceEvent<E>> for Notification<E> {
    fn from(event: SourceEvent<E>) -> Self {
        match event {
            SourceEvent::Readable => Notification::Readable,
            SourceEvent::End => Notification::End,
            SourceEvent::Error(err) => Notification::Error(err),
        }
    }
}

/// A live registration for a source's notifications
///
/// Holds one broadcast receiver. The registration lasts exactly as long as this
/// value: dropping it, or calling [`Subscription::release`], unsubscribes, so
/// every exit path of a consumer (including unwinding and a dropped future)
/// gives it back.
///
/// A subscription remembers when it fell behind, so [`Subscription::catch_up`]
/// can recover what the overwritten notifications carried from the source.
pub struct Subscription<E> {
    rx: broadcast::Receiver<SourceEvent<E>>,
    name: String,
    lagged: bool,
}

impl<E: Clone> Subscription<E> {
    /// Wrap a receiver obtained from a source's broadcast sender
    pub fn new(rx: broadcast::Receiver<SourceEvent<E>>, name: impl Into<String>) -> Self {
        let name = name.into();
        debug!(%name, "Subscription::new: subscribed");
        Self { rx, name, lagged: false }
    }

    /// Name of the source this subscription belongs to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the next notification
    pub async fn recv(&mut self) -> Notification<E> {
        match self.rx.recv().await {
            Ok(event) => event.into(),
            Err(RecvError::Lagged(missed)) => self.missed(missed),
            Err(RecvError::Closed) => {
                debug!(name = %self.name, "Subscription::recv: channel closed, treating as end");
                Notification::End
            }
        }
    }

    /// Take the next notification if one is already queued
    pub fn try_recv(&mut self) -> Option<Notification<E>> {
        match self.rx.try_recv() {
            Ok(event) => Some(event.into()),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Lagged(missed)) => Some(self.missed(missed)),
            Err(TryRecvError::Closed) => {
                debug!(name = %self.name, "Subscription::try_recv: channel closed, treating as end");
                Some(Notification::End)
            }
        }
    }

    /// Handle every notification already queued, without waiting
    ///
    /// Returns `Ok(true)` once the source has ended and `Err` for a fault,
    /// stopping at whichever comes first. If notifications were missed since
    /// the last call, the source's recorded fault and terminal state stand in
    /// for them.
    pub fn catch_up<S>(&mut self, source: &S) -> Result<bool, E>
    where
        S: Source<Error = E> + ?Sized,
    {
        while let Some(notification) = self.try_recv() {
            match notification {
                Notification::Readable | Notification::Missed(_) => {}
                Notification::End => return Ok(true),
                Notification::Error(err) => return Err(err),
            }
        }

        if !std::mem::take(&mut self.lagged) {
            return Ok(false);
        }
        if let Some(err) = source.fault() {
            debug!(name = %self.name, "Subscription::catch_up: recovered fault after lag");
            return Err(err);
        }
        Ok(source.is_terminated())
    }

    /// Unsubscribe now
    pub fn release(self) {
        drop(self);
    }

    fn missed(&mut self, missed: u64) -> Notification<E> {
        warn!(name = %self.name, missed, "Subscription::missed: lagged behind source");
        self.lagged = true;
        Notification::Missed(missed)
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        debug!(name = %self.name, "Subscription::drop: unsubscribed");
    }
}
