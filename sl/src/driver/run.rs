//! Run - one loop over a source, from first pull to settlement

use tracing::{debug, trace};

use crate::source::{Notification, Source, Subscription};

use super::Accumulate;

/// Outcome of draining what the source currently has buffered
enum Turn<A, C> {
    /// The source ran dry; wait for the next notification
    Drained(A),
    /// The source has ended
    Ended(A),
    /// The step function asked to stop
    Broke { acc: A, unconsumed: Option<C> },
}

/// A single loop run
///
/// The step function is only ever called from [`Run::pull`], which runs to
/// completion between two awaits, so steps never overlap and the accumulator
/// has exactly one writer. Settling consumes the run.
pub(crate) struct Run<'s, S: Source, F> {
    source: &'s S,
    step: F,
    subscription: Option<Subscription<S::Error>>,
    steps: u64,
}

impl<'s, S: Source, F> Run<'s, S, F> {
    /// Attach to `source`
    ///
    /// Subscribes right away, before any pull, so a fault raised between now
    /// and the first poll is still delivered. A terminated source gets no
    /// subscription and the run settles on its first poll.
    pub(crate) fn start(source: &'s S, step: F) -> Self {
        let subscription = if source.is_terminated() {
            debug!("Run::start: source already terminated");
            None
        } else {
            Some(source.subscribe())
        };

        Self {
            source,
            step,
            subscription,
            steps: 0,
        }
    }

    /// Drive the run until it settles
    pub(crate) async fn drive<A, E>(mut self, init: A) -> Result<A, E>
    where
        F: FnMut(S::Chunk, A) -> Result<Accumulate<A, S::Chunk>, E>,
        E: From<S::Error>,
    {
        let Some(mut subscription) = self.subscription.take() else {
            debug!("Run::drive: settling immediately");
            return Ok(init);
        };
        debug!(name = %subscription.name(), "Run::drive: started");

        let mut acc = init;
        loop {
            acc = match self.pull(&mut subscription, acc) {
                Ok(Turn::Drained(acc)) => acc,
                Ok(Turn::Ended(acc)) => {
                    self.settle(subscription, "end");
                    return Ok(acc);
                }
                Ok(Turn::Broke { acc, unconsumed }) => {
                    let source = self.source;
                    self.settle(subscription, "break");
                    if let Some(chunk) = unconsumed {
                        trace!("Run::drive: pushing back unconsumed data");
                        source.unshift(chunk);
                    }
                    return Ok(acc);
                }
                Err(err) => {
                    self.settle(subscription, "failed");
                    return Err(err);
                }
            };

            match subscription.recv().await {
                Notification::Readable | Notification::Missed(_) => {}
                Notification::End => {
                    self.settle(subscription, "end");
                    return Ok(acc);
                }
                Notification::Error(err) => {
                    self.settle(subscription, "fault");
                    return Err(err.into());
                }
            }
        }
    }

    /// Feed every chunk the source has right now to the step function
    ///
    /// Notifications already queued are handled before each chunk, so a fault
    /// or end the source signalled earlier wins over data still buffered.
    fn pull<A, E>(&mut self, subscription: &mut Subscription<S::Error>, mut acc: A) -> Result<Turn<A, S::Chunk>, E>
    where
        F: FnMut(S::Chunk, A) -> Result<Accumulate<A, S::Chunk>, E>,
        E: From<S::Error>,
    {
        loop {
            if subscription.catch_up(self.source)? {
                return Ok(Turn::Ended(acc));
            }
            let Some(chunk) = self.source.read() else {
                return Ok(Turn::Drained(acc));
            };

            self.steps += 1;
            trace!(step = self.steps, "Run::pull: invoking step");
            match (self.step)(chunk, acc)? {
                Accumulate::Continue(next) => acc = next,
                Accumulate::Break { acc, unconsumed } => return Ok(Turn::Broke { acc, unconsumed }),
            }
        }
    }

    fn settle(self, subscription: Subscription<S::Error>, outcome: &'static str) {
        subscription.release();
        debug!(outcome, steps = self.steps, "Run::settle: settled");
    }
}
