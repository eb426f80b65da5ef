//! Message dispatch over the object store.
//!
//! A message sent to an object is offered to the front scripts first, then to
//! the object itself ([`Engine::handle_self`]), its parent-script chain
//! ([`Engine::handle_parent`]) and finally its owners up to the stack
//! ([`Engine::handle`]).

mod context;

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use context::Frame;
pub use context::ExecContext;
use smallvec::smallvec;

use crate::object::{ObjectRecord, Script};
use crate::parent_script::{ParentScriptUse, ParentScripts};
use crate::{
	DispatchError, ErrorFrame, ErrorState, EventLoop, ExecStatus, Handler, HandlerList, HandlerType, HasHandlers, Host, Name, NullHost,
	ObjectFlags, ObjectId, ObjectKind, ObjectStore, Params, ScriptCompiler, ScriptError, Tool, Value, names,
};

/// Engine-wide dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
	/// Maximum nesting of handlers running for one object.
	pub max_script_depth: u32,
	/// Maximum nesting of handlers across all objects, bounding chains of sends.
	pub max_dispatch_depth: u32,
	/// Report script errors on the host's error stream instead of `errorDialog`.
	pub no_ui: bool,
	/// Prefix of headless error reports.
	pub program_name: String,
}

impl Default for DispatchConfig {
	fn default() -> Self {
		Self {
			max_script_depth: 255,
			max_dispatch_depth: 128,
			no_ui: false,
			program_name: String::from("cardstack"),
		}
	}
}

/// How [`Engine::message`] treats the default stack, target and result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageOptions {
	/// Make the target's stack the default stack while dispatching.
	pub change_default: bool,
	/// Sent explicitly by script rather than generated by the engine.
	pub send: bool,
	/// Debugger message; delivered even to disabled objects.
	pub debug: bool,
}

impl MessageOptions {
	/// Engine-generated message.
	pub const MESSAGE: Self = Self {
		change_default: true,
		send: false,
		debug: false,
	};
	/// Script `send`.
	pub const SEND: Self = Self {
		change_default: true,
		send: true,
		debug: false,
	};

	#[must_use]
	pub const fn change_default(mut self, change_default: bool) -> Self {
		self.change_default = change_default;
		self
	}

	#[must_use]
	pub const fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}
}

impl Default for MessageOptions {
	fn default() -> Self {
		Self::MESSAGE
	}
}

#[derive(Debug)]
struct PendingMessage {
	target: ObjectId,
	name: Name,
	params: Params,
}

/// Counts one level of handler execution until dropped.
struct DepthGuard(Rc<Cell<u32>>);

impl DepthGuard {
	fn enter(depth: &Rc<Cell<u32>>) -> Self {
		depth.set(depth.get() + 1);
		Self(Rc::clone(depth))
	}
}

impl Drop for DepthGuard {
	fn drop(&mut self) {
		self.0.set(self.0.get().saturating_sub(1));
	}
}

/// Owns the objects and routes messages between their scripts.
///
/// Single-threaded: other threads reach the engine through the runtime's
/// notification queue.
pub struct Engine {
	store: ObjectStore,
	parent_scripts: ParentScripts,
	front_scripts: Vec<ObjectId>,
	compiler: Box<dyn ScriptCompiler>,
	host: Box<dyn Host>,
	event_loop: Option<Rc<dyn EventLoop>>,
	config: DispatchConfig,
	dispatch_depth: Rc<Cell<u32>>,
	lock_messages: bool,
	exit_all: bool,
	exiting: bool,
	error_lock: u32,
	try_depth: u32,
	tool: Tool,
	default_stack: Option<ObjectId>,
	target: Option<ObjectId>,
	result: Value,
	errors: ErrorState,
	pending: VecDeque<PendingMessage>,
}

impl Engine {
	pub fn new(compiler: impl ScriptCompiler + 'static) -> Self {
		Self {
			store: ObjectStore::new(),
			parent_scripts: ParentScripts::default(),
			front_scripts: Vec::new(),
			compiler: Box::new(compiler),
			host: Box::new(NullHost),
			event_loop: None,
			config: DispatchConfig::default(),
			dispatch_depth: Rc::new(Cell::new(0)),
			lock_messages: false,
			exit_all: false,
			exiting: false,
			error_lock: 0,
			try_depth: 0,
			tool: Tool::default(),
			default_stack: None,
			target: None,
			result: Value::Empty,
			errors: ErrorState::default(),
			pending: VecDeque::new(),
		}
	}

	#[must_use]
	pub fn with_host(mut self, host: impl Host + 'static) -> Self {
		self.host = Box::new(host);
		self
	}

	#[must_use]
	pub fn with_config(mut self, config: DispatchConfig) -> Self {
		self.config = config;
		self
	}

	pub fn set_event_loop(&mut self, event_loop: Rc<dyn EventLoop>) {
		self.event_loop = Some(event_loop);
	}

	/// Runs a nested wait on the installed event loop.
	///
	/// Without one, the wait only brackets the deletion pools and, when
	/// `dispatching`, sends the messages posted so far.
	pub fn wait(&mut self, duration: Duration, dispatching: bool, any_event: bool) -> bool {
		if let Some(event_loop) = self.event_loop.clone() {
			return event_loop.wait(self, duration, dispatching, any_event);
		}
		self.enter_wait(dispatching);
		let handled = dispatching && self.dispatch_pending() > 0;
		self.leave_wait(dispatching);
		handled
	}

	pub fn config(&self) -> &DispatchConfig {
		&self.config
	}

	pub fn store(&self) -> &ObjectStore {
		&self.store
	}

	pub fn create_stack(&mut self, name: impl Into<String>) -> ObjectId {
		self.store.insert(ObjectKind::Stack, name.into(), None)
	}

	/// Creates an object owned by `owner`. Only stacks may be ownerless.
	pub fn create(&mut self, kind: ObjectKind, name: impl Into<String>, owner: Option<ObjectId>) -> Result<ObjectId, DispatchError> {
		match owner {
			None if kind != ObjectKind::Stack => Err(DispatchError::OwnerRequired(kind)),
			Some(owner) if !self.store.is_live(owner) => Err(DispatchError::UnknownObject(owner)),
			_ => Ok(self.store.insert(kind, name.into(), owner)),
		}
	}

	pub fn flags(&self, id: ObjectId) -> Option<ObjectFlags> {
		self.store.get(id).map(|record| record.flags)
	}

	pub fn set_flags(&mut self, id: ObjectId, flags: ObjectFlags, enabled: bool) -> Result<(), DispatchError> {
		let record = self.live_record(id)?;
		record.flags.set(flags, enabled);
		Ok(())
	}

	/// Replaces the object's script source. Compiled on first use.
	///
	/// Refused while a handler of the object is executing.
	pub fn set_script(&mut self, id: ObjectId, source: impl Into<String>) -> Result<(), DispatchError> {
		let source = source.into();
		self.replace_script(
			id,
			Script {
				source: (!source.is_empty()).then_some(source),
				..Script::default()
			},
		)
	}

	/// Installs an already compiled handler list as the object's script.
	pub fn set_handlers(&mut self, id: ObjectId, handlers: HandlerList) -> Result<(), DispatchError> {
		let has_handlers = handlers.has_handlers();
		self.replace_script(
			id,
			Script {
				handlers: Some(Rc::new(handlers)),
				has_handlers,
				..Script::default()
			},
		)
	}

	fn replace_script(&mut self, id: ObjectId, script: Script) -> Result<(), DispatchError> {
		let record = self.live_record(id)?;
		if record.depth.get() > 0 {
			return Err(DispatchError::ScriptLocked(id));
		}
		record.script = script;
		Ok(())
	}

	fn live_record(&mut self, id: ObjectId) -> Result<&mut ObjectRecord, DispatchError> {
		if !self.store.is_live(id) {
			return Err(DispatchError::UnknownObject(id));
		}
		self.store.get_mut(id).ok_or(DispatchError::UnknownObject(id))
	}

	/// Compiles the object's script. `force` retries a script that failed before.
	///
	/// Returns `false` if the script does not compile.
	pub fn parse_script(&mut self, id: ObjectId, force: bool) -> bool {
		if force {
			if let Some(record) = self.store.get_mut(id) {
				if record.script.source.is_some() {
					record.script.handlers = None;
				}
				record.script.dead = false;
				record.script.error = None;
			}
		}
		self.ensure_parsed(id);
		self.store.get(id).is_some_and(|record| !record.script.dead)
	}

	/// Compile failure of the object's current script, if any.
	pub fn script_error(&self, id: ObjectId) -> Option<&ScriptError> {
		self.store.get(id).and_then(|record| record.script.error.as_ref())
	}

	pub fn has_handlers(&mut self, id: ObjectId) -> HasHandlers {
		self.ensure_parsed(id);
		self.store.get(id).map_or(HasHandlers::empty(), |record| record.script.has_handlers)
	}

	fn ensure_parsed(&mut self, id: ObjectId) -> Option<Rc<HandlerList>> {
		let record = self.store.get_mut(id)?;
		let script = &mut record.script;
		if script.handlers.is_none() && !script.dead {
			if let Some(source) = script.source.as_deref() {
				match self.compiler.compile(source) {
					Ok(handlers) => {
						script.has_handlers = handlers.has_handlers();
						script.handlers = Some(Rc::new(handlers));
						tracing::trace!(%id, "dispatch.script_compiled");
					}
					Err(error) => {
						tracing::warn!(%id, %error, "dispatch.script_dead");
						script.dead = true;
						script.error = Some(error);
					}
				}
			}
		}
		script.handlers.clone()
	}

	/// Binds `provider`'s script as the object's parent script, or unbinds it.
	pub fn set_parent_script(&mut self, id: ObjectId, provider: Option<ObjectId>) -> Result<(), DispatchError> {
		if !self.store.is_live(id) {
			return Err(DispatchError::UnknownObject(id));
		}
		if let Some(provider) = provider.filter(|provider| !self.store.is_live(*provider)) {
			return Err(DispatchError::UnknownObject(provider));
		}
		self.parent_scripts.bind(id, provider)?;
		if let Some(record) = self.store.get_mut(id) {
			record.parent_script = None;
		}
		self.refresh_parent_scripts();
		Ok(())
	}

	pub fn parent_script(&self, id: ObjectId) -> Option<ObjectId> {
		self.parent_scripts.provider_of(id)
	}

	/// Rebuilds every use chain so changes deeper in a chain reach its users.
	fn refresh_parent_scripts(&mut self) {
		for id in self.parent_scripts.bound() {
			let chain = self.parent_scripts.use_chain(id);
			if let Some(record) = self.store.get_mut(id) {
				record.parent_script = chain;
			}
		}
	}

	/// Puts the object at the head of the front-script list.
	pub fn insert_front_script(&mut self, id: ObjectId) -> Result<(), DispatchError> {
		if !self.store.is_live(id) {
			return Err(DispatchError::UnknownObject(id));
		}
		self.front_scripts.retain(|script| *script != id);
		self.front_scripts.insert(0, id);
		Ok(())
	}

	pub fn remove_front_script(&mut self, id: ObjectId) -> bool {
		let before = self.front_scripts.len();
		self.front_scripts.retain(|script| *script != id);
		self.front_scripts.len() != before
	}

	pub fn front_scripts(&self) -> &[ObjectId] {
		&self.front_scripts
	}

	/// Delivers a message to `target`, reporting any script error it raises.
	pub fn message(&mut self, target: ObjectId, name: &Name, params: &[Value], options: MessageOptions) -> ExecStatus {
		let Some(record) = self.store.get(target) else {
			return ExecStatus::NotHandled;
		};
		let ignored_by_disabled =
			record.flags.contains(ObjectFlags::DISABLED) && self.tool == Tool::Browse && !options.send && !options.debug;
		if self.lock_messages
			|| self.exit_all
			|| self.exiting
			|| record.flags.contains(ObjectFlags::NO_MESSAGES)
			|| ignored_by_disabled
			|| !self.store.is_attached(target)
			|| !self.store.is_live(target)
		{
			tracing::trace!(%target, %name, "dispatch.message_skipped");
			return ExecStatus::NotHandled;
		}

		let stack = self.store.stack_of(target);
		if let Some(stack) = stack {
			self.host.flush(stack);
		}

		let old_stack = self.default_stack;
		let old_target = self.target;
		if options.change_default {
			self.default_stack = stack;
			self.target = Some(target);
		}

		let cookie = self.store.suspend_deletion(target);
		let mut status;
		if self.host.abort_requested() {
			self.errors.object = Some(target);
			self.errors.execution.push(ErrorFrame::new(0, 0, "execution interrupted"));
			status = ExecStatus::Error;
		} else {
			status = self.do_front_scripts(HandlerType::Message, name, params);
			if status.continues() {
				if self.store.is_live(target) {
					let before = status;
					status = self.handle(target, HandlerType::Message, name, params, Some(target));
					if before == ExecStatus::Pass && status == ExecStatus::NotHandled {
						status = ExecStatus::Pass;
					}
				} else {
					// A front script deleted the target.
					status = ExecStatus::Normal;
				}
			}
		}
		self.store.resume_deletion(target, cookie);

		if !options.send || !options.change_default || self.default_stack == stack {
			self.default_stack = old_stack;
		}
		self.target = old_target;
		tracing::trace!(%target, %name, ?status, send = options.send, "dispatch.message");

		if status == ExecStatus::Error && self.reporting_errors() {
			if self.config.no_ui {
				self.report_headless(target);
			} else if !options.send && !name.is(names::ERROR_DIALOG) {
				self.send_error(target);
			}
			return ExecStatus::Error;
		}
		if !options.send {
			self.result = Value::Empty;
		}
		status
	}

	/// `message` with script `send` semantics.
	pub fn send(&mut self, target: ObjectId, name: impl Into<Name>, params: &[Value]) -> ExecStatus {
		self.message(target, &name.into(), params, MessageOptions::SEND)
	}

	/// Resolves against the object, then its owners when `pass_from` is set.
	pub fn handle(
		&mut self,
		id: ObjectId,
		kind: HandlerType,
		name: &Name,
		params: &[Value],
		pass_from: Option<ObjectId>,
	) -> ExecStatus {
		let mut status = self.handle_self(id, kind, name, params);
		if pass_from.is_some() && status.continues() {
			if let Some(owner) = self.store.owner(id).filter(|owner| self.store.contains(*owner)) {
				let before = status;
				status = self.handle(owner, kind, name, params, Some(id));
				if before == ExecStatus::Pass && status == ExecStatus::NotHandled {
					status = ExecStatus::Pass;
				}
			}
		}
		if status == ExecStatus::Error && self.errors.object.is_none() {
			self.errors.object = Some(id);
		}
		status
	}

	/// Resolves against the object's own script and its parent scripts.
	///
	/// Message handlers are wrapped by `before` and `after` handlers of the
	/// parent-script chain; the wrappers only matter when they abort.
	pub fn handle_self(&mut self, id: ObjectId, kind: HandlerType, name: &Name, params: &[Value]) -> ExecStatus {
		let Some(depth) = self.store.get(id).map(|record| Rc::clone(&record.depth)) else {
			return ExecStatus::NotHandled;
		};
		if depth.get() >= self.config.max_script_depth || self.dispatch_depth.get() >= self.config.max_dispatch_depth {
			tracing::warn!(
				%id,
				object_depth = depth.get(),
				dispatch_depth = self.dispatch_depth.get(),
				"dispatch.recursion_limit"
			);
			self.errors.execution.push(ErrorFrame::new(0, 0, "recursion limit reached"));
			self.errors.object = Some(id);
			return ExecStatus::Error;
		}
		let _guard = DepthGuard::enter(&depth);
		let _nested = DepthGuard::enter(&self.dispatch_depth);

		let handlers = self.ensure_parsed(id);
		let inherits = self.store.get(id).is_some_and(|record| record.parent_script.is_some());
		let wrapped = kind == HandlerType::Message && inherits;

		if wrapped {
			let status = self.handle_parent(id, HandlerType::Before, name, params);
			if status.aborts() {
				return status;
			}
		}

		let mut main = ExecStatus::NotHandled;
		if let Some(handler) = handlers.as_deref().and_then(|list| list.find(kind, name)).filter(|handler| !handler.is_private()) {
			main = self.exec_handler(id, handler, params);
			if main == ExecStatus::Error {
				return main;
			}
		}

		if inherits && main.continues() {
			main = self.handle_parent(id, kind, name, params);
			if main == ExecStatus::Error {
				return main;
			}
		}

		if wrapped {
			let status = self.handle_parent(id, HandlerType::After, name, params);
			if status.aborts() {
				return status;
			}
		}
		main
	}

	/// Walks the object's parent-script uses, innermost first.
	///
	/// An unresolved provider ends the walk.
	pub fn handle_parent(&mut self, id: ObjectId, kind: HandlerType, name: &Name, params: &[Value]) -> ExecStatus {
		let mut status = ExecStatus::NotHandled;
		let mut cursor = self.store.get(id).and_then(|record| record.parent_script.clone());
		while let Some(current) = cursor {
			let Some(provider) = current.parent().object().filter(|provider| self.store.is_live(*provider)) else {
				break;
			};
			if let Some(handlers) = self.ensure_parsed(provider) {
				if let Some(handler) = handlers.find(kind, name).filter(|handler| !handler.is_private()) {
					status = self.exec_parent_handler(id, provider, handler, params, &current);
					if !status.continues() {
						return status;
					}
				}
			}
			cursor = current.super_use().cloned();
		}
		status
	}

	fn exec_handler(&mut self, id: ObjectId, handler: &Handler, params: &[Value]) -> ExecStatus {
		let status = self.run(handler, params, Frame::own(id));
		if status == ExecStatus::Error {
			let frame = ErrorFrame::object(self.store.long_name(id));
			self.errors.execution.push(frame);
		}
		status
	}

	/// Runs a provider's handler on behalf of `id`. Errors name the provider.
	fn exec_parent_handler(
		&mut self,
		id: ObjectId,
		provider: ObjectId,
		handler: &Handler,
		params: &[Value],
		parent_use: &Rc<ParentScriptUse>,
	) -> ExecStatus {
		let Some(depth) = self.store.get(provider).map(|record| Rc::clone(&record.depth)) else {
			return ExecStatus::NotHandled;
		};
		let _guard = DepthGuard::enter(&depth);
		let status = self.run(handler, params, Frame::inherited(id, provider, Rc::clone(parent_use)));
		if status == ExecStatus::Error {
			let frame = ErrorFrame::object(self.store.long_name(provider));
			self.errors.execution.push(frame);
		}
		status
	}

	fn run(&mut self, handler: &Handler, params: &[Value], frame: Frame) -> ExecStatus {
		tracing::trace!(me = %frame.me, kind = handler.kind().as_str(), name = %handler.name(), "dispatch.exec");
		let body = handler.body();
		let mut cx = ExecContext::new(self, frame);
		match body.exec(&mut cx, params) {
			// Leaving a handler early still handles the message.
			ExecStatus::Exit => ExecStatus::Normal,
			status => status,
		}
	}

	fn do_front_scripts(&mut self, kind: HandlerType, name: &Name, params: &[Value]) -> ExecStatus {
		let mut status = ExecStatus::NotHandled;
		for script in self.front_scripts.clone() {
			if !self.store.is_live(script) {
				continue;
			}
			let before = status;
			status = self.handle(script, kind, name, params, None);
			if !status.continues() {
				break;
			}
			if before == ExecStatus::Pass && status == ExecStatus::NotHandled {
				status = ExecStatus::Pass;
			}
		}
		status
	}

	fn reporting_errors(&self) -> bool {
		self.error_lock == 0 && self.try_depth == 0
	}

	fn report_headless(&mut self, target: ObjectId) {
		let (line, column) = self.errors.location();
		let object = self.errors.object.unwrap_or(target);
		let text = format!(
			"{}: Script execution error at line {line}, column {column} ({})",
			self.config.program_name,
			self.store.long_name(object)
		);
		tracing::error!(%object, line, column, "dispatch.script_error");
		self.host.report_error(&text);
		self.errors.clear();
	}

	/// Queues an `errorDialog` message for the pending error and clears it.
	fn send_error(&mut self, fallback: ObjectId) {
		let object = self.errors.object.unwrap_or(fallback);
		if !self.errors.parse.is_empty() {
			let frame = ErrorFrame::object(self.store.long_name(object));
			self.errors.parse.push(frame);
		}
		let params: Params = smallvec![Value::from(self.errors.execution_text()), Value::from(self.errors.parse_text())];
		self.errors.clear();
		tracing::debug!(%object, "dispatch.error_dialog_queued");
		self.post_message(object, names::ERROR_DIALOG, params);
	}

	/// Queues a message for [`dispatch_pending`](Self::dispatch_pending).
	pub fn post_message(&mut self, target: ObjectId, name: impl Into<Name>, params: Params) {
		self.pending.push_back(PendingMessage {
			target,
			name: name.into(),
			params,
		});
	}

	pub fn pending_messages(&self) -> usize {
		self.pending.len()
	}

	/// Sends the messages queued so far. Messages they queue wait for the next call.
	pub fn dispatch_pending(&mut self) -> usize {
		let mut sent = 0;
		for _ in 0..self.pending.len() {
			let Some(PendingMessage { target, name, params }) = self.pending.pop_front() else {
				break;
			};
			if !self.store.is_live(target) {
				tracing::trace!(%target, %name, "dispatch.pending_dropped");
				continue;
			}
			let status = self.message(target, &name, &params, MessageOptions::SEND);
			sent += 1;
			if status != ExecStatus::Error || self.config.no_ui {
				continue;
			}
			if name.is(names::ERROR_DIALOG) || !self.reporting_errors() {
				self.errors.clear();
			} else {
				self.send_error(target);
			}
		}
		sent
	}

	/// Requests deletion of the object and everything it owns.
	///
	/// The objects stay allocated until the deletion pools reclaim them.
	pub fn delete_object(&mut self, id: ObjectId) -> bool {
		self.store.delete(id)
	}

	/// Destroys deletions queued on the current pool.
	pub fn drain_deletions(&mut self) -> Vec<ObjectId> {
		let reclaimed = self.store.drain();
		self.forget(&reclaimed);
		reclaimed
	}

	/// Whether a deletion landed on the current pool since the last drain.
	pub fn take_drain_request(&mut self) -> bool {
		self.store.take_drain_request()
	}

	pub fn enter_wait(&mut self, dispatching: bool) -> Vec<ObjectId> {
		let reclaimed = self.store.enter_wait(dispatching);
		self.forget(&reclaimed);
		reclaimed
	}

	pub fn leave_wait(&mut self, dispatching: bool) -> Vec<ObjectId> {
		let reclaimed = self.store.leave_wait(dispatching);
		self.forget(&reclaimed);
		reclaimed
	}

	/// Stops nested waits from pushing deletion pools until [`thaw_deletions`](Self::thaw_deletions).
	pub fn freeze_deletions(&mut self) {
		self.store.freeze_pools();
	}

	pub fn thaw_deletions(&mut self) {
		self.store.thaw_pools();
	}

	/// Destroys every object and drops all queued messages.
	pub fn teardown(&mut self) -> Vec<ObjectId> {
		self.exiting = true;
		self.pending.clear();
		let reclaimed = self.store.teardown();
		self.forget(&reclaimed);
		reclaimed
	}

	fn forget(&mut self, destroyed: &[ObjectId]) {
		if destroyed.is_empty() {
			return;
		}
		for id in destroyed {
			for orphan in self.parent_scripts.forget(*id) {
				if let Some(record) = self.store.get_mut(orphan) {
					record.parent_script = None;
				}
			}
		}
		self.front_scripts.retain(|script| !destroyed.contains(script));
		for slot in [&mut self.default_stack, &mut self.target] {
			if slot.is_some_and(|id| destroyed.contains(&id)) {
				*slot = None;
			}
		}
		if self.errors.object.is_some_and(|id| destroyed.contains(&id)) {
			self.errors.object = None;
		}
		self.refresh_parent_scripts();
	}

	pub fn lock_messages(&mut self, locked: bool) {
		self.lock_messages = locked;
	}

	pub fn messages_locked(&self) -> bool {
		self.lock_messages
	}

	pub fn set_exit_all(&mut self, exit_all: bool) {
		self.exit_all = exit_all;
	}

	pub fn set_exiting(&mut self, exiting: bool) {
		self.exiting = exiting;
	}

	pub fn is_exiting(&self) -> bool {
		self.exiting
	}

	/// Suppresses error reports until the matching [`unlock_errors`](Self::unlock_errors).
	pub fn lock_errors(&mut self) {
		self.error_lock += 1;
	}

	pub fn unlock_errors(&mut self) {
		self.error_lock = self.error_lock.saturating_sub(1);
	}

	/// Enters a `try` block; errors are left for the script to catch.
	pub fn enter_try(&mut self) {
		self.try_depth += 1;
	}

	pub fn leave_try(&mut self) {
		self.try_depth = self.try_depth.saturating_sub(1);
	}

	pub fn tool(&self) -> Tool {
		self.tool
	}

	pub fn set_tool(&mut self, tool: Tool) {
		self.tool = tool;
	}

	pub fn default_stack(&self) -> Option<ObjectId> {
		self.default_stack
	}

	pub fn set_default_stack(&mut self, stack: Option<ObjectId>) {
		self.default_stack = stack;
	}

	/// Object the current message was originally sent to.
	pub fn target(&self) -> Option<ObjectId> {
		self.target
	}

	pub fn result(&self) -> &Value {
		&self.result
	}

	pub fn set_result(&mut self, value: impl Into<Value>) {
		self.result = value.into();
	}

	pub fn errors(&self) -> &ErrorState {
		&self.errors
	}

	pub fn errors_mut(&mut self) -> &mut ErrorState {
		&mut self.errors
	}
}

impl std::fmt::Debug for Engine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Engine")
			.field("store", &self.store)
			.field("front_scripts", &self.front_scripts)
			.field("pending", &self.pending.len())
			.field("default_stack", &self.default_stack)
			.field("target", &self.target)
			.field("event_loop", &self.event_loop.is_some())
			.finish_non_exhaustive()
	}
}
