use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::{NotifyError, Ping, RunOnMainThread, SyncEvent, SyncEventPool};

/// How a required callback is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyMode {
	/// Normal dispatch: perform the action.
	Act,
	/// Shutdown: release resources only.
	FinalizeOnly,
}

/// Callback carried by one notification.
pub enum NotifyCallback {
	/// Runs only when dispatched normally; dropped unrun during shutdown.
	Plain(Box<dyn FnOnce() + Send>),
	/// Always runs, told whether to act or only clean up.
	Required(Box<dyn FnOnce(NotifyMode) + Send>),
}

impl NotifyCallback {
	pub fn plain(f: impl FnOnce() + Send + 'static) -> Self {
		Self::Plain(Box::new(f))
	}

	pub fn required(f: impl FnOnce(NotifyMode) + Send + 'static) -> Self {
		Self::Required(Box::new(f))
	}

	pub fn is_required(&self) -> bool {
		matches!(self, Self::Required(_))
	}

	/// Returns whether the callback acted, as opposed to only cleaning up or
	/// being dropped.
	fn invoke(self, mode: NotifyMode) -> bool {
		match (self, mode) {
			(Self::Plain(f), NotifyMode::Act) => f(),
			(Self::Plain(_), NotifyMode::FinalizeOnly) => return false,
			(Self::Required(f), mode) => f(mode),
		}
		mode == NotifyMode::Act
	}
}

impl std::fmt::Debug for NotifyCallback {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Plain(_) => f.write_str("NotifyCallback::Plain"),
			Self::Required(_) => f.write_str("NotifyCallback::Required"),
		}
	}
}

/// Flags for [`NotifyQueue::push`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOptions {
	/// Block the caller until the callback has run.
	pub block: bool,
	/// Queue on the safe queue, drained only at safe dispatch points.
	pub safe: bool,
}

impl PushOptions {
	/// Fire-and-forget on the normal queue.
	pub const POST: Self = Self { block: false, safe: false };
	/// Block on the normal queue.
	pub const SEND: Self = Self { block: true, safe: false };

	#[must_use]
	pub const fn safe(mut self, safe: bool) -> Self {
		self.safe = safe;
		self
	}
}

/// Snapshot of queue lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
	pub normal: usize,
	pub safe: usize,
}

impl QueueDepth {
	pub const fn total(self) -> usize {
		self.normal + self.safe
	}
}

struct Notification {
	callback: NotifyCallback,
	waiter: Option<Waiter>,
}

/// Handshake with a blocked pusher.
#[derive(Clone)]
struct Waiter {
	event: Arc<SyncEvent>,
	acted: Arc<AtomicBool>,
}

impl Waiter {
	/// Releases the pusher. The waiter, not the dispatcher, returns the event to the pool.
	fn complete(self, acted: bool) {
		self.acted.store(acted, Ordering::Release);
		self.event.trigger();
	}
}

#[derive(Default)]
struct QueueState {
	normal: VecDeque<Notification>,
	safe: VecDeque<Notification>,
	ping_sent: bool,
	shutting_down: bool,
}

/// Callbacks scheduled onto the main thread from any thread.
///
/// Single consumer: only the main thread calls [`dispatch`](Self::dispatch), which is what
/// makes the ping debounce sound.
pub struct NotifyQueue {
	state: Mutex<QueueState>,
	events: SyncEventPool,
	ping: Arc<dyn Ping>,
	main_thread: ThreadId,
	high_priority_ping: bool,
}

impl NotifyQueue {
	/// Creates a queue whose main thread is the calling thread.
	pub fn new(ping: Arc<dyn Ping>) -> Self {
		Self {
			state: Mutex::new(QueueState::default()),
			events: SyncEventPool::new(),
			ping,
			main_thread: thread::current().id(),
			high_priority_ping: false,
		}
	}

	#[must_use]
	pub fn with_main_thread(mut self, main_thread: ThreadId) -> Self {
		self.main_thread = main_thread;
		self
	}

	#[must_use]
	pub fn with_high_priority_ping(mut self, high_priority: bool) -> Self {
		self.high_priority_ping = high_priority;
		self
	}

	pub fn main_thread(&self) -> ThreadId {
		self.main_thread
	}

	pub fn is_main_thread(&self) -> bool {
		thread::current().id() == self.main_thread
	}

	pub fn is_shutting_down(&self) -> bool {
		self.state.lock().shutting_down
	}

	pub fn depth(&self) -> QueueDepth {
		let state = self.state.lock();
		QueueDepth {
			normal: state.normal.len(),
			safe: state.safe.len(),
		}
	}

	/// Pooled sync events, exposed for shutdown accounting.
	pub fn sync_events(&self) -> &SyncEventPool {
		&self.events
	}

	/// Schedules `callback` to run on the main thread.
	///
	/// A blocking push from the main thread runs the callback in place, unless it
	/// targets the safe queue, which the main thread could never drain while
	/// blocked. An `Err` means the callback did not act, including a blocked push
	/// released by [`finalize`](Self::finalize).
	pub fn push(&self, callback: NotifyCallback, options: PushOptions) -> Result<(), NotifyError> {
		if options.block && self.is_main_thread() {
			if options.safe {
				tracing::warn!("notify.push.safe_block_on_main");
				return Err(NotifyError::SafeBlockOnMainThread);
			}
			tracing::trace!(required = callback.is_required(), "notify.push.inline");
			callback.invoke(NotifyMode::Act);
			return Ok(());
		}

		let waiter = options.block.then(|| Waiter {
			event: self.events.create(),
			acted: Arc::new(AtomicBool::new(false)),
		});
		{
			let mut state = self.state.lock();
			if state.shutting_down {
				drop(state);
				if let Some(waiter) = waiter {
					self.events.destroy(waiter.event, true);
				}
				tracing::debug!("notify.push.rejected_shutdown");
				return Err(NotifyError::ShuttingDown);
			}
			let node = Notification {
				callback,
				waiter: waiter.clone(),
			};
			if options.safe {
				state.safe.push_back(node);
			} else {
				state.normal.push_back(node);
			}
		}
		tracing::trace!(block = options.block, safe = options.safe, "notify.push.queued");

		// Never ping while holding the lock: the platform wake may take its own locks.
		self.ping(self.high_priority_ping);

		if let Some(Waiter { event, acted }) = waiter {
			event.wait();
			let force = self.is_shutting_down();
			self.events.destroy(event, force);
			if !acted.load(Ordering::Acquire) {
				tracing::debug!("notify.push.released_by_finalize");
				return Err(NotifyError::ShuttingDown);
			}
		}
		Ok(())
	}

	/// Maps an external option word onto [`push`](Self::push).
	///
	/// [`RunOnMainThread::REQUIRED`] selects the required callback form; otherwise the
	/// callback is wrapped and only ever sees [`NotifyMode::Act`].
	pub fn run_on_main_thread(&self, f: impl FnOnce(NotifyMode) + Send + 'static, options: RunOnMainThread) -> Result<(), NotifyError> {
		if options.contains(RunOnMainThread::JUMP_TO) {
			if options != RunOnMainThread::JUMP_TO {
				return Err(NotifyError::Unsupported(options));
			}
			f(NotifyMode::Act);
			return Ok(());
		}
		if options.blocks() && options.is_safe() {
			return Err(NotifyError::Unsupported(options));
		}
		let callback = if options.is_required() {
			NotifyCallback::required(f)
		} else {
			NotifyCallback::plain(move || f(NotifyMode::Act))
		};
		self.push(
			callback,
			PushOptions {
				block: options.blocks(),
				safe: options.is_safe(),
			},
		)
	}

	/// Debounced wake of the main thread.
	///
	/// The pending marker is cleared only by [`dispatch`](Self::dispatch).
	pub fn ping(&self, high_priority: bool) {
		{
			let mut state = self.state.lock();
			if state.ping_sent {
				return;
			}
			state.ping_sent = true;
		}
		self.ping.ping(high_priority);
	}

	/// Runs every queued notification in FIFO order. Main thread only.
	///
	/// The safe queue is drained only when `drain_safe` is set. Returns whether
	/// anything ran.
	pub fn dispatch(&self, drain_safe: bool) -> bool {
		debug_assert!(self.is_main_thread(), "notifications are dispatched on the main thread");
		let mut dispatched = false;
		loop {
			let node = {
				let mut state = self.state.lock();
				state.ping_sent = false;
				let next = match state.normal.pop_front() {
					Some(node) => Some(node),
					None if drain_safe => state.safe.pop_front(),
					None => None,
				};
				match next {
					Some(node) => node,
					None => break,
				}
			};
			dispatched = true;
			let Notification { callback, waiter } = node;
			let acted = callback.invoke(NotifyMode::Act);
			if let Some(waiter) = waiter {
				waiter.complete(acted);
			}
		}
		dispatched
	}

	/// Shuts the queue down.
	///
	/// Required callbacks run in [`NotifyMode::FinalizeOnly`], plain callbacks are
	/// dropped, and every blocked pusher is released with
	/// [`NotifyError::ShuttingDown`]. Later pushes fail the same way.
	pub fn finalize(&self) {
		let pending: Vec<Notification> = {
			let mut guard = self.state.lock();
			let state = &mut *guard;
			state.shutting_down = true;
			state.ping_sent = false;
			state.normal.drain(..).chain(state.safe.drain(..)).collect()
		};
		tracing::debug!(pending = pending.len(), "notify.finalize");
		for Notification { callback, waiter } in pending {
			let acted = callback.invoke(NotifyMode::FinalizeOnly);
			if let Some(waiter) = waiter {
				waiter.complete(acted);
			}
		}
		self.events.clear();
	}
}

impl std::fmt::Debug for NotifyQueue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NotifyQueue")
			.field("depth", &self.depth())
			.field("main_thread", &self.main_thread)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests;
