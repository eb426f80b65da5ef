use std::time::Duration;

use crate::{Engine, ObjectId};

/// Active pointer tool. Disabled objects ignore user messages under `Browse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
	#[default]
	Browse,
	Pointer,
}

/// Services the engine needs from the windowing layer.
pub trait Host {
	/// Flushes pending screen output for the stack's window.
	fn flush(&mut self, _stack: ObjectId) {}

	/// Whether the user pressed the interrupt key since the last check.
	fn abort_requested(&mut self) -> bool {
		false
	}

	/// Writes a headless script error report.
	fn report_error(&mut self, text: &str) {
		eprintln!("{text}");
	}
}

/// Host with no window system.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {}

/// Event loop a handler can run nested waits on, such as a modal dialog.
///
/// Installed by the embedding runtime with [`Engine::set_event_loop`].
pub trait EventLoop {
	/// Services events against `engine` for up to `duration`. Returns whether
	/// anything was handled; with `any_event` it returns as soon as something was.
	fn wait(&self, engine: &mut Engine, duration: Duration, dispatching: bool, any_event: bool) -> bool;
}
