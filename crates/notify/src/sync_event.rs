use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Blocking signal between one waiting thread and the thread that triggers it.
///
/// `wait` never returns before `trigger` has been called at least once since the
/// last `reset`.
#[derive(Debug, Default)]
pub struct SyncEvent {
	triggered: Mutex<bool>,
	cond: Condvar,
}

impl SyncEvent {
	/// Creates an untriggered event.
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks the event triggered and wakes the waiter. Idempotent.
	pub fn trigger(&self) {
		let mut triggered = self.triggered.lock();
		*triggered = true;
		self.cond.notify_all();
	}

	/// Clears the triggered flag.
	///
	/// Only the sole waiter calls this, after it has observed the trigger.
	pub fn reset(&self) {
		*self.triggered.lock() = false;
	}

	pub fn is_triggered(&self) -> bool {
		*self.triggered.lock()
	}

	/// Blocks until the event is triggered.
	pub fn wait(&self) {
		let mut triggered = self.triggered.lock();
		while !*triggered {
			self.cond.wait(&mut triggered);
		}
	}

	/// Blocks until the event is triggered or `timeout` elapses.
	///
	/// Returns whether the event was triggered.
	pub fn wait_timeout(&self, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;
		let mut triggered = self.triggered.lock();
		while !*triggered {
			if self.cond.wait_until(&mut triggered, deadline).timed_out() {
				break;
			}
		}
		*triggered
	}
}

/// Freelist of [`SyncEvent`]s so blocking pushes do not allocate per call.
#[derive(Debug, Default)]
pub struct SyncEventPool {
	free: Mutex<Vec<Arc<SyncEvent>>>,
}

impl SyncEventPool {
	pub fn new() -> Self {
		Self::default()
	}

	/// Takes an untriggered event from the freelist, allocating if it is empty.
	pub fn create(&self) -> Arc<SyncEvent> {
		if let Some(event) = self.free.lock().pop() {
			return event;
		}
		Arc::new(SyncEvent::new())
	}

	/// Returns an event to the freelist, or releases it outright when `force` is set.
	pub fn destroy(&self, event: Arc<SyncEvent>, force: bool) {
		if force {
			return;
		}
		event.reset();
		self.free.lock().push(event);
	}

	/// Releases every pooled event.
	pub fn clear(&self) {
		let released = std::mem::take(&mut *self.free.lock());
		tracing::trace!(count = released.len(), "notify.sync_events.clear");
	}

	/// Number of events parked on the freelist.
	pub fn pooled(&self) -> usize {
		self.free.lock().len()
	}
}
