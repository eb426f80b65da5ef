use std::io::{self, Write};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Wakes the main thread so it drains the notification queue.
///
/// The queue debounces calls, so an implementation sees at most one ping per
/// drain of the queue.
pub trait Ping: Send + Sync {
	fn ping(&self, high_priority: bool);
}

/// Wake object the main loop sleeps on between events.
#[derive(Debug, Default)]
pub struct WakeEvent {
	signalled: Mutex<bool>,
	cond: Condvar,
}

impl WakeEvent {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sleeps until pinged or until `timeout` elapses, consuming the signal.
	///
	/// Returns `true` when woken by a ping.
	pub fn wait_timeout(&self, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;
		let mut signalled = self.signalled.lock();
		while !*signalled {
			if self.cond.wait_until(&mut signalled, deadline).timed_out() {
				break;
			}
		}
		std::mem::replace(&mut *signalled, false)
	}

	pub fn is_signalled(&self) -> bool {
		*self.signalled.lock()
	}
}

impl Ping for WakeEvent {
	fn ping(&self, _high_priority: bool) {
		let mut signalled = self.signalled.lock();
		*signalled = true;
		self.cond.notify_one();
	}
}

/// Self-pipe waker: writes one byte per ping.
///
/// The read end is handed to the platform loop, which watches it alongside
/// its other descriptors and reads the bytes back before dispatching.
#[derive(Debug)]
pub struct PipePing {
	writer: Mutex<os_pipe::PipeWriter>,
}

impl PipePing {
	pub fn new() -> io::Result<(Self, os_pipe::PipeReader)> {
		let (reader, writer) = os_pipe::pipe()?;
		Ok((Self { writer: Mutex::new(writer) }, reader))
	}
}

impl Ping for PipePing {
	fn ping(&self, _high_priority: bool) {
		if let Err(error) = self.writer.lock().write_all(&[1]) {
			tracing::warn!(%error, "notify.ping.pipe_write_failed");
		}
	}
}

/// Waker backed by a platform "break the wait" call.
pub struct FnPing<F>(F);

impl<F> FnPing<F>
where
	F: Fn(bool) + Send + Sync,
{
	pub fn new(f: F) -> Self {
		Self(f)
	}
}

impl<F> Ping for FnPing<F>
where
	F: Fn(bool) + Send + Sync,
{
	fn ping(&self, high_priority: bool) {
		(self.0)(high_priority);
	}
}

/// Waker for loops that poll the queue on their own schedule.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPing;

impl Ping for NoPing {
	fn ping(&self, _high_priority: bool) {}
}

#[cfg(test)]
mod tests {
	use std::io::Read;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::thread;

	use super::*;

	#[test]
	fn wake_event_times_out_without_ping() {
		let wake = WakeEvent::new();
		let started = Instant::now();
		assert!(!wake.wait_timeout(Duration::from_millis(20)));
		assert!(started.elapsed() >= Duration::from_millis(20));
	}

	#[test]
	fn wake_event_ping_cuts_wait_short() {
		let wake = Arc::new(WakeEvent::new());
		let pinger = Arc::clone(&wake);
		let handle = thread::spawn(move || {
			thread::sleep(Duration::from_millis(10));
			pinger.ping(false);
		});
		let started = Instant::now();
		assert!(wake.wait_timeout(Duration::from_secs(5)));
		assert!(started.elapsed() < Duration::from_secs(5));
		assert!(!wake.is_signalled(), "waiting consumes the signal");
		handle.join().unwrap();
	}

	#[test]
	fn pipe_ping_writes_one_byte() {
		let (ping, mut reader) = PipePing::new().unwrap();
		ping.ping(true);
		let mut buf = [0u8; 1];
		reader.read_exact(&mut buf).unwrap();
		assert_eq!(buf, [1]);
	}

	#[test]
	fn fn_ping_forwards_priority() {
		let high = Arc::new(AtomicUsize::new(0));
		let seen = Arc::clone(&high);
		let ping = FnPing::new(move |high_priority| {
			if high_priority {
				seen.fetch_add(1, Ordering::SeqCst);
			}
		});
		ping.ping(true);
		ping.ping(false);
		assert_eq!(high.load(Ordering::SeqCst), 1);
	}
}
