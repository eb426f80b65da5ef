use std::rc::Rc;
use std::time::Duration;

use super::Engine;
use crate::parent_script::ParentScriptUse;
use crate::{ErrorFrame, ExecStatus, MessageOptions, Name, ObjectId, Params, Value};

/// Identity of a running handler.
pub(super) struct Frame {
	pub(super) me: ObjectId,
	owner: ObjectId,
	parent_use: Option<Rc<ParentScriptUse>>,
}

impl Frame {
	pub(super) fn own(me: ObjectId) -> Self {
		Self {
			me,
			owner: me,
			parent_use: None,
		}
	}

	pub(super) fn inherited(me: ObjectId, provider: ObjectId, parent_use: Rc<ParentScriptUse>) -> Self {
		Self {
			me,
			owner: provider,
			parent_use: Some(parent_use),
		}
	}
}

/// What a handler body sees of the engine while it runs.
pub struct ExecContext<'a> {
	engine: &'a mut Engine,
	frame: Frame,
}

impl<'a> ExecContext<'a> {
	pub(super) fn new(engine: &'a mut Engine, frame: Frame) -> Self {
		Self { engine, frame }
	}

	/// Object the handler runs for. A parent-script handler runs for the
	/// inheriting object, not the provider.
	pub fn me(&self) -> ObjectId {
		self.frame.me
	}

	/// Object whose script contains the running handler.
	pub fn handler_owner(&self) -> ObjectId {
		self.frame.owner
	}

	pub fn is_parent_handler(&self) -> bool {
		self.frame.parent_use.is_some()
	}

	pub fn parent_use(&self) -> Option<&Rc<ParentScriptUse>> {
		self.frame.parent_use.as_ref()
	}

	pub fn engine(&mut self) -> &mut Engine {
		self.engine
	}

	/// Object the current message was first sent to.
	pub fn target(&self) -> Option<ObjectId> {
		self.engine.target()
	}

	pub fn send(&mut self, target: ObjectId, name: impl Into<Name>, params: &[Value]) -> ExecStatus {
		self.engine.message(target, &name.into(), params, MessageOptions::SEND)
	}

	pub fn post(&mut self, target: ObjectId, name: impl Into<Name>, params: Params) {
		self.engine.post_message(target, name, params);
	}

	pub fn delete(&mut self, id: ObjectId) -> bool {
		self.engine.delete_object(id)
	}

	/// Runs a nested wait for the whole `duration`, as a modal dialog would.
	///
	/// Objects deleted meanwhile that were created outside the wait survive
	/// until it returns.
	pub fn wait(&mut self, duration: Duration, dispatching: bool) -> bool {
		self.engine.wait(duration, dispatching, false)
	}

	pub fn result(&self) -> &Value {
		self.engine.result()
	}

	pub fn set_result(&mut self, value: impl Into<Value>) {
		self.engine.set_result(value);
	}

	/// Records an execution error at the given position. Return the result
	/// from the handler to abort the dispatch.
	pub fn throw(&mut self, line: u32, column: u32, message: impl Into<String>) -> ExecStatus {
		self.engine.errors_mut().execution.push(ErrorFrame::new(line, column, message));
		ExecStatus::Error
	}
}
