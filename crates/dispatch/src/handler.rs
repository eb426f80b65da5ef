use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;

use crate::{ExecContext, ExecStatus, HandlerType, Name, Value, names};

/// Executable body of a handler.
///
/// Script execution itself lives outside this crate; compiled scripts hand the
/// engine one body per handler.
pub trait HandlerBody {
	fn exec(&self, cx: &mut ExecContext<'_>, params: &[Value]) -> ExecStatus;
}

impl<F> HandlerBody for F
where
	F: Fn(&mut ExecContext<'_>, &[Value]) -> ExecStatus,
{
	fn exec(&self, cx: &mut ExecContext<'_>, params: &[Value]) -> ExecStatus {
		self(cx, params)
	}
}

/// One named handler in a script.
#[derive(Clone)]
pub struct Handler {
	kind: HandlerType,
	name: Name,
	private: bool,
	body: Rc<dyn HandlerBody>,
}

impl Handler {
	pub fn new<F>(kind: HandlerType, name: impl Into<Name>, body: F) -> Self
	where
		F: Fn(&mut ExecContext<'_>, &[Value]) -> ExecStatus + 'static,
	{
		Self::from_body(kind, name, Rc::new(body))
	}

	pub fn from_body(kind: HandlerType, name: impl Into<Name>, body: Rc<dyn HandlerBody>) -> Self {
		Self {
			kind,
			name: name.into(),
			private: false,
			body,
		}
	}

	pub fn message<F>(name: impl Into<Name>, body: F) -> Self
	where
		F: Fn(&mut ExecContext<'_>, &[Value]) -> ExecStatus + 'static,
	{
		Self::new(HandlerType::Message, name, body)
	}

	/// Private handlers are only reachable from their own script.
	#[must_use]
	pub fn private(mut self) -> Self {
		self.private = true;
		self
	}

	pub fn kind(&self) -> HandlerType {
		self.kind
	}

	pub fn name(&self) -> &Name {
		&self.name
	}

	pub fn is_private(&self) -> bool {
		self.private
	}

	pub(crate) fn body(&self) -> Rc<dyn HandlerBody> {
		Rc::clone(&self.body)
	}
}

impl fmt::Debug for Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handler")
			.field("kind", &self.kind)
			.field("name", &self.name)
			.field("private", &self.private)
			.finish_non_exhaustive()
	}
}

bitflags! {
	/// Summary of well-known message handlers present in a script.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct HasHandlers: u32 {
		const MOUSE_DOWN = 1 << 0;
		const MOUSE_UP = 1 << 1;
		const MOUSE_STILL_DOWN = 1 << 2;
		const MOUSE_WITHIN = 1 << 3;
		const MOUSE_MOVE = 1 << 4;
		const IDLE = 1 << 5;
		const KEY_DOWN = 1 << 6;
	}
}

impl HasHandlers {
	fn for_message(name: &Name) -> Self {
		const TABLE: &[(&str, HasHandlers)] = &[
			(names::MOUSE_DOWN, HasHandlers::MOUSE_DOWN),
			(names::MOUSE_UP, HasHandlers::MOUSE_UP),
			(names::MOUSE_STILL_DOWN, HasHandlers::MOUSE_STILL_DOWN),
			(names::MOUSE_WITHIN, HasHandlers::MOUSE_WITHIN),
			(names::MOUSE_MOVE, HasHandlers::MOUSE_MOVE),
			(names::IDLE, HasHandlers::IDLE),
			(names::KEY_DOWN, HasHandlers::KEY_DOWN),
		];
		TABLE
			.iter()
			.find(|(known, _)| name.is(known))
			.map_or(Self::empty(), |(_, flag)| *flag)
	}
}

/// Compiled handlers of one script, keyed by type and name.
#[derive(Clone, Default)]
pub struct HandlerList {
	handlers: HashMap<(HandlerType, Name), Handler>,
}

impl HandlerList {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, handler: Handler) -> Self {
		self.insert(handler);
		self
	}

	/// Adds a handler, replacing any with the same type and name.
	pub fn insert(&mut self, handler: Handler) {
		self.handlers.insert((handler.kind, handler.name.clone()), handler);
	}

	/// Finds a handler regardless of visibility.
	pub fn find(&self, kind: HandlerType, name: &Name) -> Option<&Handler> {
		self.handlers.get(&(kind, name.clone()))
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}

	pub fn has_handlers(&self) -> HasHandlers {
		self.handlers
			.values()
			.filter(|handler| handler.kind == HandlerType::Message)
			.fold(HasHandlers::empty(), |acc, handler| acc | HasHandlers::for_message(&handler.name))
	}
}

impl fmt::Debug for HandlerList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.handlers.keys()).finish()
	}
}

/// Failure to compile a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("script error at line {line}, column {column}: {message}")]
pub struct ScriptError {
	pub line: u32,
	pub column: u32,
	pub message: String,
}

impl ScriptError {
	pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
		Self {
			line,
			column,
			message: message.into(),
		}
	}
}

/// Turns script source into a handler list.
pub trait ScriptCompiler {
	fn compile(&self, source: &str) -> Result<HandlerList, ScriptError>;
}

/// Compiler over pre-built handler lists registered under a script name.
///
/// Hosts that compile scripts elsewhere register the result here and set each
/// object's script to the registered name.
#[derive(Default)]
pub struct ScriptLibrary {
	scripts: HashMap<String, HandlerList>,
}

impl ScriptLibrary {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, source: impl Into<String>, handlers: HandlerList) {
		self.scripts.insert(source.into(), handlers);
	}

	#[must_use]
	pub fn with(mut self, source: impl Into<String>, handlers: HandlerList) -> Self {
		self.register(source, handlers);
		self
	}
}

impl ScriptCompiler for ScriptLibrary {
	fn compile(&self, source: &str) -> Result<HandlerList, ScriptError> {
		self.scripts
			.get(source)
			.cloned()
			.ok_or_else(|| ScriptError::new(1, 1, format!("no compiled script named {source:?}")))
	}
}
