//! streamloop - drive a sequential consumer over an event-driven source
//!
//! A readable source pushes notifications ("data may be available", "no more
//! data", "fault") while a consumer wants to pull chunks one at a time and
//! decide after each one whether to keep going. The loop driver bridges the two:
//! it pulls every chunk the source has buffered, hands each to a step function,
//! and waits for the next notification only when the source runs dry.
//!
//! # Architecture
//!
//! ```text
//!   writer ──write/end/destroy──▶ ┌──────────────┐
//!                                 │    Source    │──broadcast──▶ Subscription
//!   step fn ◀──chunk── Run ──read─│ (PassThrough)│                   │
//!      │                 ▲        └──────────────┘                   │
//!      └──verdict────────┘              ▲                            │
//!                          Break ──unshift leftover──┘   Readable/End/Error
//!                                                                    ▼
//!                                                          Run wakes and pulls
//! ```
//!
//! A run stops on the first of: a `Break` verdict, the source's `End`, a
//! source fault, or a step failure. Stopping never destroys the source, so data
//! the run did not pull (and data it pushed back) stays readable for the next
//! consumer.
//!
//! # Example
//!
//! ```ignore
//! use streamloop::{Accumulate, PassThrough, SourceError, loop_stream_with};
//!
//! let numbers = PassThrough::new();
//! for n in [2, 1, 3, -1, 3] {
//!     numbers.write(n)?;
//! }
//!
//! let sum = loop_stream_with(&numbers, 0, |n, acc| {
//!     Ok::<_, SourceError>(if n == -1 { Accumulate::stop(acc) } else { Accumulate::Continue(acc + n) })
//! })
//! .await?;
//! assert_eq!(sum, 6);
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod source;

pub use config::SourceConfig;
pub use driver::{Accumulate, Action, loop_stream, loop_stream_with};
pub use error::SourceError;
pub use source::{Notification, PassThrough, Source, SourceEvent, Subscription, chunks};

/// Default capacity of a source's notification channel
pub const DEFAULT_NOTIFY_CAPACITY: usize = 64;
