//! PassThrough - an in-memory source fed by its own handle

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::config::SourceConfig;
use crate::error::SourceError;

use super::{Source, SourceEvent, Subscription};

/// In-memory source: whatever is written to it can be read back in order
///
/// Handles are cheap to clone and all clones share one buffer, so a producer
/// can keep writing while a loop run reads through another handle.
///
/// `Readable` is broadcast when the buffer goes from empty to non-empty. `End`
/// is broadcast once, when the source has been ended and a read finds the
/// buffer drained (or immediately, if it is already empty when ended).
pub struct PassThrough<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    name: String,
    state: Mutex<State<T>>,
    events: broadcast::Sender<SourceEvent<SourceError>>,
}

struct State<T> {
    buffer: VecDeque<T>,
    ended: bool,
    end_emitted: bool,
    destroyed: bool,
    errored: Option<SourceError>,
}

impl<T> PassThrough<T> {
    /// Create a source with the default configuration
    pub fn new() -> Self {
        Self::with_config(SourceConfig::default())
    }

    /// Create a source from a configuration
    pub fn with_config(config: SourceConfig) -> Self {
        debug!(name = %config.name, capacity = config.notify_capacity, "PassThrough::with_config: called");
        let (events, _) = broadcast::channel(config.notify_capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                name: config.name,
                state: Mutex::new(State {
                    buffer: VecDeque::new(),
                    ended: false,
                    end_emitted: false,
                    destroyed: false,
                    errored: None,
                }),
                events,
            }),
        }
    }

    /// Name used in log lines
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Append a chunk
    pub fn write(&self, chunk: T) -> Result<(), SourceError> {
        let mut state = self.lock();
        if state.destroyed {
            return Err(SourceError::Destroyed);
        }
        if state.ended {
            warn!(name = %self.shared.name, "PassThrough::write: write after end");
            return Err(SourceError::WriteAfterEnd);
        }

        let was_empty = state.buffer.is_empty();
        state.buffer.push_back(chunk);
        trace!(name = %self.shared.name, buffered = state.buffer.len(), "PassThrough::write: buffered chunk");
        if was_empty {
            self.emit(SourceEvent::Readable);
        }
        Ok(())
    }

    /// Signal that nothing more will be written
    pub fn end(&self) {
        let mut state = self.lock();
        if state.ended || state.destroyed {
            return;
        }
        state.ended = true;
        debug!(name = %self.shared.name, buffered = state.buffer.len(), "PassThrough::end: ended");
        if state.buffer.is_empty() {
            self.emit_end(&mut state);
        }
    }

    /// Drop all buffered data and finish the source without a fault
    pub fn destroy(&self) {
        let mut state = self.lock();
        if !self.mark_destroyed(&mut state) {
            return;
        }
        if !state.end_emitted {
            self.emit_end(&mut state);
        }
    }

    /// Drop all buffered data and finish the source with a fault
    pub fn destroy_with(&self, err: SourceError) {
        let mut state = self.lock();
        if !self.mark_destroyed(&mut state) {
            return;
        }
        warn!(name = %self.shared.name, %err, "PassThrough::destroy_with: destroyed with fault");
        self.emit_fault(&mut state, err);
    }

    /// Report a fault to subscribers without changing the buffered data
    pub fn emit_error(&self, err: SourceError) {
        let mut state = self.lock();
        warn!(name = %self.shared.name, %err, "PassThrough::emit_error: called");
        self.emit_fault(&mut state, err);
    }

    /// Whether the source has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    /// Number of chunks waiting to be read
    pub fn buffered_len(&self) -> usize {
        self.lock().buffer.len()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.shared.events.receiver_count()
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_destroyed(&self, state: &mut State<T>) -> bool {
        if state.destroyed {
            return false;
        }
        state.destroyed = true;
        let dropped = state.buffer.len();
        state.buffer.clear();
        debug!(name = %self.shared.name, dropped, "PassThrough::mark_destroyed: destroyed");
        true
    }

    fn emit_end(&self, state: &mut State<T>) {
        state.end_emitted = true;
        self.emit(SourceEvent::End);
    }

    fn emit_fault(&self, state: &mut State<T>, err: SourceError) {
        state.errored = Some(err.clone());
        self.emit(SourceEvent::Error(err));
    }

    fn emit(&self, event: SourceEvent<SourceError>) {
        trace!(name = %self.shared.name, event_type = event.event_type(), "PassThrough::emit");
        // No subscribers is fine
        let _ = self.shared.events.send(event);
    }
}

impl<T> Source for PassThrough<T> {
    type Chunk = T;
    type Error = SourceError;

    fn read(&self) -> Option<T> {
        let mut state = self.lock();
        if state.destroyed {
            return None;
        }
        let chunk = state.buffer.pop_front();
        if chunk.is_none() && state.ended && !state.end_emitted {
            debug!(name = %self.shared.name, "PassThrough::read: drained after end");
            self.emit_end(&mut state);
        }
        chunk
    }

    fn unshift(&self, chunk: T) {
        let mut state = self.lock();
        if state.destroyed {
            debug!(name = %self.shared.name, "PassThrough::unshift: destroyed, dropping chunk");
            return;
        }
        if state.end_emitted {
            warn!(name = %self.shared.name, "PassThrough::unshift: unshift after end");
            self.emit_fault(&mut state, SourceError::UnshiftAfterEnd);
            return;
        }

        let was_empty = state.buffer.is_empty();
        state.buffer.push_front(chunk);
        trace!(name = %self.shared.name, buffered = state.buffer.len(), "PassThrough::unshift: requeued chunk");
        if was_empty {
            self.emit(SourceEvent::Readable);
        }
    }

    fn is_terminated(&self) -> bool {
        let state = self.lock();
        state.destroyed || state.end_emitted
    }

    fn fault(&self) -> Option<SourceError> {
        self.lock().errored.clone()
    }

    fn subscribe(&self) -> Subscription<SourceError> {
        Subscription::new(self.shared.events.subscribe(), self.shared.name.clone())
    }
}

impl<T> Clone for PassThrough<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for PassThrough<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Notification;

    #[test]
    fn test_read_in_write_order() {
        let src = PassThrough::new();
        src.write("a").unwrap();
        src.write("b").unwrap();

        assert_eq!(src.read(), Some("a"));
        assert_eq!(src.read(), Some("b"));
        assert_eq!(src.read(), None);
        assert!(!src.is_terminated());
    }

    #[test]
    fn test_unshift_goes_first() {
        let src = PassThrough::new();
        src.write(1).unwrap();
        src.write(2).unwrap();

        let first = src.read().unwrap();
        src.unshift(first * 10);

        assert_eq!(src.read(), Some(10));
        assert_eq!(src.read(), Some(2));
    }

    #[test]
    fn test_clones_share_buffer() {
        let writer = PassThrough::new();
        let reader = writer.clone();
        writer.write("shared").unwrap();

        assert_eq!(reader.buffered_len(), 1);
        assert_eq!(reader.read(), Some("shared"));
        assert_eq!(writer.buffered_len(), 0);
    }

    #[test]
    fn test_write_after_end_rejected() {
        let src = PassThrough::new();
        src.end();

        assert_eq!(src.write(1), Err(SourceError::WriteAfterEnd));
    }

    #[test]
    fn test_write_after_destroy_rejected() {
        let src = PassThrough::new();
        src.destroy();

        assert_eq!(src.write(1), Err(SourceError::Destroyed));
        assert!(src.is_destroyed());
    }

    #[test]
    fn test_terminated_only_after_drain() {
        let src = PassThrough::new();
        src.write("last").unwrap();
        src.end();
        assert!(!src.is_terminated());

        assert_eq!(src.read(), Some("last"));
        assert!(!src.is_terminated());

        assert_eq!(src.read(), None);
        assert!(src.is_terminated());
    }

    #[test]
    fn test_end_on_empty_terminates_immediately() {
        let src = PassThrough::<u8>::new();
        src.end();
        assert!(src.is_terminated());
    }

    #[test]
    fn test_destroy_drops_buffer() {
        let src = PassThrough::new();
        src.write(1).unwrap();
        src.write(2).unwrap();
        src.destroy();

        assert_eq!(src.buffered_len(), 0);
        assert_eq!(src.read(), None);
        assert!(src.is_terminated());
    }

    #[test]
    fn test_default_name() {
        let src = PassThrough::<u8>::default();
        assert_eq!(src.name(), "passthrough");

        let src = PassThrough::<u8>::with_config(SourceConfig::named("stdin"));
        assert_eq!(src.name(), "stdin");
    }

    #[tokio::test]
    async fn test_readable_only_on_empty_to_non_empty() {
        let src = PassThrough::new();
        let mut sub = src.subscribe();

        src.write(1).unwrap();
        src.write(2).unwrap();
        src.end();

        assert_eq!(sub.recv().await, Notification::Readable);
        assert_eq!(src.read(), Some(1));
        assert_eq!(src.read(), Some(2));
        assert_eq!(src.read(), None);
        assert_eq!(sub.recv().await, Notification::End);
    }

    #[tokio::test]
    async fn test_end_emitted_once() {
        let src = PassThrough::<u8>::new();
        let mut sub = src.subscribe();

        src.end();
        src.end();
        assert_eq!(src.read(), None);
        src.destroy();

        assert_eq!(sub.recv().await, Notification::End);
        src.emit_error(SourceError::fault("sentinel"));
        assert_eq!(sub.recv().await, Notification::Error(SourceError::fault("sentinel")));
    }

    #[tokio::test]
    async fn test_destroy_with_emits_fault() {
        let src = PassThrough::<u8>::new();
        let mut sub = src.subscribe();

        src.destroy_with(SourceError::fault("Oopsie!"));
        src.destroy_with(SourceError::fault("ignored"));

        assert_eq!(sub.recv().await, Notification::Error(SourceError::fault("Oopsie!")));
        assert!(src.is_terminated());
        assert_eq!(src.fault(), Some(SourceError::fault("Oopsie!")));
    }

    #[test]
    fn test_fault_keeps_latest() {
        let src = PassThrough::<u8>::new();
        assert_eq!(src.fault(), None);

        src.emit_error(SourceError::fault("first"));
        src.emit_error(SourceError::fault("second"));

        assert_eq!(src.fault(), Some(SourceError::fault("second")));
        assert!(!src.is_terminated());
    }

    #[tokio::test]
    async fn test_unshift_after_end_is_fault() {
        let src = PassThrough::new();
        let mut sub = src.subscribe();
        src.end();
        assert_eq!(sub.recv().await, Notification::End);

        src.unshift("late");

        assert_eq!(sub.recv().await, Notification::Error(SourceError::UnshiftAfterEnd));
        assert_eq!(src.buffered_len(), 0);
    }

    #[test]
    fn test_subscriber_count() {
        let src = PassThrough::<u8>::new();
        assert_eq!(src.subscriber_count(), 0);

        let sub = src.subscribe();
        assert_eq!(src.subscriber_count(), 1);

        drop(sub);
        assert_eq!(src.subscriber_count(), 0);
    }
}
