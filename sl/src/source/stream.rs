//! Async stream view over a source

use futures::Stream;
use futures::stream;
use tracing::debug;

use super::{Notification, Source};

/// Read a source as a stream of chunks
///
/// Yields buffered chunks in order and waits for notifications once the source
/// runs dry. The stream ends when the source ends or is already terminated; a
/// fault is yielded once as `Err` and then the stream ends. Dropping the stream
/// unsubscribes but leaves the source untouched, so unread data stays available.
pub fn chunks<S: Source>(source: &S) -> impl Stream<Item = Result<S::Chunk, S::Error>> {
    let subscription = if source.is_terminated() {
        debug!("chunks: source already terminated");
        None
    } else {
        Some(source.subscribe())
    };

    stream::unfold((source, subscription), |(source, subscription)| async move {
        let Some(mut subscription) = subscription else {
            return None;
        };
        loop {
            match subscription.catch_up(source) {
                Ok(true) => return None,
                Ok(false) => {}
                Err(err) => return Some((Err(err), (source, None))),
            }
            if let Some(chunk) = source.read() {
                return Some((Ok(chunk), (source, Some(subscription))));
            }

            match subscription.recv().await {
                Notification::Readable | Notification::Missed(_) => {}
                Notification::End => return None,
                Notification::Error(err) => return Some((Err(err), (source, None))),
            }
        }
    })
}
