/// Outcome of dispatching a message to a handler, object, or chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecStatus {
	/// Handled; stop searching.
	Normal,
	/// No matching handler anywhere searched so far.
	NotHandled,
	/// A handler ran and deferred to the next resolution step.
	Pass,
	/// Fatal error; abort the whole dispatch chain.
	Error,
	/// Terminate the entire current script execution.
	ExitAll,
	/// Leave the current handler. The message counts as handled.
	Exit,
}

impl ExecStatus {
	/// Whether resolution should continue to the next step.
	pub const fn continues(self) -> bool {
		matches!(self, Self::Pass | Self::NotHandled)
	}

	/// Whether a before/after wrapper result stops the dispatch.
	pub const fn aborts(self) -> bool {
		matches!(self, Self::Error | Self::ExitAll)
	}
}

/// Kind of handler a message resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandlerType {
	Message,
	Function,
	GetProp,
	SetProp,
	/// Runs ahead of the object's own message handler. Parent scripts only.
	Before,
	/// Runs after the object's own message handler. Parent scripts only.
	After,
}

impl HandlerType {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Message => "message",
			Self::Function => "function",
			Self::GetProp => "getprop",
			Self::SetProp => "setprop",
			Self::Before => "before",
			Self::After => "after",
		}
	}
}
