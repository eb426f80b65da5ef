use std::fmt;

/// Script value passed as a message parameter or stored as the result.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
	#[default]
	Empty,
	Text(String),
	Number(f64),
	Bool(bool),
}

impl Value {
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Empty => true,
			Self::Text(text) => text.is_empty(),
			_ => false,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => Ok(()),
			Self::Text(text) => f.write_str(text),
			Self::Number(n) => write!(f, "{n}"),
			Self::Bool(b) => write!(f, "{b}"),
		}
	}
}

impl From<&str> for Value {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for Value {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Self::Number(n)
	}
}

impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Self::Number(f64::from(n))
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

/// Parameter list for one message.
pub type Params = smallvec::SmallVec<[Value; 4]>;
