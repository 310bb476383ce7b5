//! Loop driver
//!
//! Bridges a notification-driven [`Source`] and a step function that wants to
//! see one chunk at a time. Both entry points share one run loop:
//!
//! - [`loop_stream`] - stateless; the step function only decides whether to go
//!   on, optionally supplying a result when it stops
//! - [`loop_stream_with`] - stateful; an accumulator is moved into every step
//!   and handed back in the verdict
//!
//! A run:
//!
//! 1. settles at once if the source is already terminated, without subscribing
//! 2. subscribes, then pulls everything already buffered
//! 3. on `Readable`, pulls until the source runs dry again; before each chunk
//!    it handles notifications already queued, so an earlier fault or end wins
//!    over buffered data
//! 4. on a `Break` verdict, unsubscribes, pushes the unconsumed data back onto the
//!    source and resolves
//! 5. on `End`, unsubscribes and resolves with the current accumulator
//! 6. on a source fault or a step error, unsubscribes and fails with that error
//!
//! The source is never destroyed. Dropping a run's future before it settles
//! drops its subscription, which is the only cancellation there is.

mod action;
mod run;

pub use action::{Accumulate, Action};

use std::future::Future;

use tracing::debug;

use crate::source::Source;

use run::Run;

/// Run a stateless loop over `source`
///
/// Resolves with `None` when the source ends or the step function stops
/// without a result, and with `Some(result)` when it stops via
/// [`Action::finish`]. Fails with the first source fault or step error.
///
/// The source is checked and subscribed to when this function is called; the
/// returned future does the pulling.
pub fn loop_stream<S, R, E, F>(source: &S, mut step: F) -> impl Future<Output = Result<Option<R>, E>>
where
    S: Source,
    E: From<S::Error>,
    F: FnMut(S::Chunk) -> Result<Action<S::Chunk, R>, E>,
{
    debug!("loop_stream: called");
    let run = Run::start(
        source,
        move |chunk: S::Chunk, acc: Option<R>| -> Result<Accumulate<Option<R>, S::Chunk>, E> {
            Ok(step(chunk)?.into_accumulate(acc))
        },
    );
    run.drive(None)
}

/// Run a stateful loop over `source`, starting from `init`
///
/// Resolves with the accumulator the step function handed back last: the one
/// carried by its `Break` verdict, or the latest `Continue` value if the source
/// ends first. An already terminated source resolves with `init` untouched.
/// Fails with the first source fault or step error; the accumulator is dropped.
///
/// As with [`loop_stream`], subscribing happens at call time.
pub fn loop_stream_with<S, A, E, F>(source: &S, init: A, step: F) -> impl Future<Output = Result<A, E>>
where
    S: Source,
    E: From<S::Error>,
    F: FnMut(S::Chunk, A) -> Result<Accumulate<A, S::Chunk>, E>,
{
    debug!("loop_stream_with: called");
    Run::start(source, step).drive(init)
}
