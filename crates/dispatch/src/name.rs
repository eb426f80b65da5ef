use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Message or handler name. Compares and hashes ASCII case-insensitively.
#[derive(Clone)]
pub struct Name(Arc<str>);

impl Name {
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is(&self, other: &str) -> bool {
		self.0.eq_ignore_ascii_case(other)
	}
}

impl PartialEq for Name {
	fn eq(&self, other: &Self) -> bool {
		self.0.eq_ignore_ascii_case(&other.0)
	}
}

impl Eq for Name {}

impl Hash for Name {
	fn hash<H: Hasher>(&self, state: &mut H) {
		for byte in self.0.bytes() {
			state.write_u8(byte.to_ascii_lowercase());
		}
		state.write_u8(0xff);
	}
}

impl From<&str> for Name {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl From<String> for Name {
	fn from(name: String) -> Self {
		Self(Arc::from(name))
	}
}

impl fmt::Display for Name {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Debug for Name {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", &*self.0)
	}
}

/// Well-known engine messages.
pub mod names {
	pub const ERROR_DIALOG: &str = "errorDialog";
	pub const MOUSE_DOWN: &str = "mouseDown";
	pub const MOUSE_UP: &str = "mouseUp";
	pub const MOUSE_STILL_DOWN: &str = "mouseStillDown";
	pub const MOUSE_WITHIN: &str = "mouseWithin";
	pub const MOUSE_MOVE: &str = "mouseMove";
	pub const IDLE: &str = "idle";
	pub const KEY_DOWN: &str = "keyDown";
}
