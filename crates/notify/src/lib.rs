//! Cross-thread notifications for the main event thread.
//!
//! Worker threads never touch engine state directly. They push a callback onto
//! a [`NotifyQueue`], optionally blocking until the main thread has run it, and
//! the queue pings the main thread awake through a [`Ping`] implementation.
//!
//! * [`SyncEvent`] / [`SyncEventPool`]: pooled one-shot signals used by blocking pushes
//! * [`NotifyQueue`]: FIFO queues (normal and safe) drained by [`NotifyQueue::dispatch`]
//! * [`WakeEvent`], [`PipePing`], [`FnPing`]: ways to break the main thread's wait
//! * [`RunOnMainThread`]: option word accepted by [`NotifyQueue::run_on_main_thread`]

mod error;
mod options;
mod ping;
mod queue;
mod sync_event;

pub use error::NotifyError;
pub use options::RunOnMainThread;
pub use ping::{FnPing, NoPing, Ping, PipePing, WakeEvent};
pub use queue::{NotifyCallback, NotifyMode, NotifyQueue, PushOptions, QueueDepth};
pub use sync_event::{SyncEvent, SyncEventPool};
