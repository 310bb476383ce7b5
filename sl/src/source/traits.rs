//! Source trait definition

use super::Subscription;

/// Notification a source broadcasts to its subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent<E> {
    /// Data may be available; a subscriber should call [`Source::read`] until it returns `None`
    Readable,
    /// No more data will ever arrive; fires at most once per source
    End,
    /// The source faulted
    Error(E),
}

impl<E> SourceEvent<E> {
    /// Get the event name (for logging)
    pub fn event_type(&self) -> &'static str {
        match self {
            SourceEvent::Readable => "Readable",
            SourceEvent::End => "End",
            SourceEvent::Error(_) => "Error",
        }
    }
}

/// An event-driven, pull-capable data source
///
/// Sources are shared: every method takes `&self` so a writer, the loop driver
/// and later readers can all hold handles to the same source. Implementations
/// must never block in `read`.
pub trait Source {
    /// One unit of data as the source produces it
    type Chunk;

    /// Fault type carried by [`SourceEvent::Error`]
    type Error: Clone;

    /// Pull the next buffered chunk, or `None` if nothing is available right now
    fn read(&self) -> Option<Self::Chunk>;

    /// Re-queue a chunk so it is delivered before anything else the source holds
    fn unshift(&self, chunk: Self::Chunk);

    /// Whether the source has finished for good (ended and drained, or destroyed)
    fn is_terminated(&self) -> bool;

    /// The latest fault the source reported, if any
    ///
    /// Lets a subscriber that missed notifications find out whether one of
    /// them was a fault.
    fn fault(&self) -> Option<Self::Error>;

    /// Register for notifications; dropping the returned handle unregisters
    fn subscribe(&self) -> Subscription<Self::Error>;
}
