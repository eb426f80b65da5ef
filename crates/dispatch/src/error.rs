use std::fmt;

use thiserror::Error;

use crate::{ObjectId, ObjectKind};

/// Failures of engine API calls made by the host, as opposed to script errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
	#[error("object {0} does not exist or has been deleted")]
	UnknownObject(ObjectId),
	#[error("cannot change the script of {0} while it is executing")]
	ScriptLocked(ObjectId),
	#[error("parent script {provider} would make {object} inherit from itself")]
	BehaviorCycle { object: ObjectId, provider: ObjectId },
	#[error("a {} must be created with an owner", .0.as_str())]
	OwnerRequired(ObjectKind),
}

/// One entry of an error trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFrame {
	pub line: u32,
	pub column: u32,
	pub message: String,
}

impl ErrorFrame {
	pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
		Self {
			line,
			column,
			message: message.into(),
		}
	}

	pub(crate) fn object(long_name: String) -> Self {
		Self::new(0, 0, format!("object {long_name}"))
	}
}

impl fmt::Display for ErrorFrame {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{},{},{}", self.line, self.column, self.message)
	}
}

/// Pending script error: the object blamed and the execution and parse traces.
///
/// Filled while a failing dispatch unwinds and cleared once reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
	pub object: Option<ObjectId>,
	pub execution: Vec<ErrorFrame>,
	pub parse: Vec<ErrorFrame>,
}

impl ErrorState {
	pub fn is_empty(&self) -> bool {
		self.object.is_none() && self.execution.is_empty() && self.parse.is_empty()
	}

	/// Position of the innermost located execution frame, `(0, 0)` if none.
	pub fn location(&self) -> (u32, u32) {
		self.execution
			.iter()
			.find(|frame| frame.line != 0)
			.map_or((0, 0), |frame| (frame.line, frame.column))
	}

	pub fn execution_text(&self) -> String {
		join(&self.execution)
	}

	pub fn parse_text(&self) -> String {
		join(&self.parse)
	}

	pub fn clear(&mut self) {
		*self = Self::default();
	}
}

fn join(frames: &[ErrorFrame]) -> String {
	frames.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}
