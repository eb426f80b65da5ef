use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cardstack_dispatch::{Engine, EventLoop, Name, ObjectId, Params, ScriptCompiler};
use cardstack_notify::{NotifyCallback, NotifyError, NotifyMode, NotifyQueue, Ping, PushOptions, RunOnMainThread, WakeEvent};
use parking_lot::Mutex;

use crate::{EventLoopConfig, RuntimeConfig};

/// Message posted from another thread, waiting to be sent on the main thread.
#[derive(Debug)]
struct RemoteMessage {
	target: ObjectId,
	name: Name,
	params: Params,
}

type Inbox = Arc<Mutex<VecDeque<RemoteMessage>>>;

/// Queue, wake event and inbox shared between the runtime and the engine's
/// nested waits.
struct LoopState {
	notify: Arc<NotifyQueue>,
	wake: Arc<WakeEvent>,
	inbox: Inbox,
	config: EventLoopConfig,
}

impl LoopState {
	/// Moves messages posted by other threads onto the engine's queue.
	fn deliver_inbox(&self, engine: &mut Engine) -> usize {
		let messages: Vec<RemoteMessage> = self.inbox.lock().drain(..).collect();
		let count = messages.len();
		for RemoteMessage { target, name, params } in messages {
			engine.post_message(target, name, params);
		}
		count
	}
}

impl EventLoop for LoopState {
	fn wait(&self, engine: &mut Engine, duration: Duration, dispatch: bool, any_event: bool) -> bool {
		let deadline = Instant::now() + duration;
		engine.enter_wait(dispatch);
		let mut handled = false;
		loop {
			let mut progressed = self.notify.dispatch(dispatch);
			if dispatch {
				progressed |= self.deliver_inbox(engine) > 0;
				progressed |= engine.dispatch_pending() > 0;
			}
			if engine.take_drain_request() {
				let reclaimed = engine.drain_deletions();
				tracing::trace!(count = reclaimed.len(), "runtime.reclaimed");
			}
			handled |= progressed;
			if (any_event && handled) || engine.is_exiting() {
				break;
			}
			let now = Instant::now();
			if now >= deadline {
				break;
			}
			self.wake.wait_timeout((deadline - now).min(self.config.max_sleep()));
		}
		engine.leave_wait(dispatch);
		handled
	}
}

/// The main thread's event loop state.
///
/// Create it on the thread that runs the loop: notifications pushed from that
/// thread run inline. Handlers reach the same loop through
/// [`ExecContext::wait`](cardstack_dispatch::ExecContext::wait).
pub struct Runtime {
	engine: Engine,
	state: Rc<LoopState>,
}

impl Runtime {
	pub fn new(config: &RuntimeConfig, compiler: impl ScriptCompiler + 'static) -> Self {
		let wake = Arc::new(WakeEvent::new());
		let ping: Arc<dyn Ping> = wake.clone();
		let notify = NotifyQueue::new(ping).with_high_priority_ping(config.event_loop.high_priority_ping);
		tracing::debug!(main_thread = ?notify.main_thread(), "runtime.created");
		let state = Rc::new(LoopState {
			notify: Arc::new(notify),
			wake,
			inbox: Inbox::default(),
			config: config.event_loop.clone(),
		});
		let mut engine = Engine::new(compiler).with_config(config.dispatch_config());
		engine.set_event_loop(state.clone());
		Self { engine, state }
	}

	/// Replaces the engine, keeping the queue and wake event.
	#[must_use]
	pub fn with_engine(mut self, mut engine: Engine) -> Self {
		engine.set_event_loop(self.state.clone());
		self.engine = engine;
		self
	}

	pub fn engine(&self) -> &Engine {
		&self.engine
	}

	pub fn engine_mut(&mut self) -> &mut Engine {
		&mut self.engine
	}

	pub fn notify(&self) -> &Arc<NotifyQueue> {
		&self.state.notify
	}

	/// Handle for posting into this runtime from other threads.
	pub fn remote(&self) -> RemoteHandle {
		RemoteHandle {
			notify: Arc::clone(&self.state.notify),
			inbox: Arc::clone(&self.state.inbox),
		}
	}

	/// Runs the event loop for up to `duration`.
	///
	/// Drains notifications, and when `dispatch` is set also sends posted
	/// messages and runs the safe queue. Returns early once something was
	/// handled if `any_event` is set. Deletions requested meanwhile are
	/// reclaimed before returning. Returns whether anything was handled.
	pub fn wait(&mut self, duration: Duration, dispatch: bool, any_event: bool) -> bool {
		self.state.wait(&mut self.engine, duration, dispatch, any_event)
	}

	/// Runs the loop until a handler marks the engine as exiting.
	pub fn run(&mut self) {
		tracing::info!("runtime.run");
		while !self.engine.is_exiting() {
			self.wait(self.state.config.max_sleep(), true, true);
		}
	}

	/// Releases every blocked worker and destroys all objects.
	pub fn shutdown(&mut self) {
		self.state.notify.finalize();
		self.state.inbox.lock().clear();
		let destroyed = self.engine.teardown();
		tracing::info!(objects = destroyed.len(), "runtime.shutdown");
	}
}

impl std::fmt::Debug for Runtime {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Runtime")
			.field("engine", &self.engine)
			.field("notify", &self.state.notify)
			.field("inbox", &self.state.inbox.lock().len())
			.finish_non_exhaustive()
	}
}

/// Cloneable, `Send` access to a [`Runtime`] from worker threads.
#[derive(Clone)]
pub struct RemoteHandle {
	notify: Arc<NotifyQueue>,
	inbox: Inbox,
}

impl RemoteHandle {
	/// Posts a message to an object. It is sent on the main thread during the
	/// next dispatching wait.
	pub fn post_message(&self, target: ObjectId, name: impl Into<Name>, params: Params) -> Result<(), NotifyError> {
		let inbox = Arc::clone(&self.inbox);
		let message = RemoteMessage {
			target,
			name: name.into(),
			params,
		};
		self.notify.push(
			NotifyCallback::plain(move || inbox.lock().push_back(message)),
			PushOptions::POST,
		)
	}

	/// Runs `f` on the main thread according to `options`.
	pub fn run_on_main_thread(
		&self,
		f: impl FnOnce(NotifyMode) + Send + 'static,
		options: RunOnMainThread,
	) -> Result<(), NotifyError> {
		self.notify.run_on_main_thread(f, options)
	}

	/// Queues `f` and blocks until the main thread has run it.
	pub fn send(&self, f: impl FnOnce() + Send + 'static) -> Result<(), NotifyError> {
		self.notify.push(NotifyCallback::plain(f), PushOptions::SEND)
	}
}

impl std::fmt::Debug for RemoteHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RemoteHandle").finish_non_exhaustive()
	}
}
