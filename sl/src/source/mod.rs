//! Readable sources and their notification plumbing
//!
//! A [`Source`] is pull-capable (`read`, `unshift`) and announces changes over a
//! tokio broadcast channel. Each consumer holds its own [`Subscription`];
//! dropping it unsubscribes.

mod passthrough;
mod stream;
mod subscription;
mod traits;

pub use passthrough::PassThrough;
pub use stream::chunks;
pub use subscription::{Notification, Subscription};
pub use traits::{Source, SourceEvent};
