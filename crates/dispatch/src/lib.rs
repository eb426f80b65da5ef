//! Object message dispatch.
//!
//! Objects form an ownership tree of stacks, cards and controls. Each may carry
//! a script (a [`HandlerList`]) and inherit handlers from parent scripts. The
//! [`Engine`] resolves a message against front scripts, the object, its parent
//! scripts and its owners, and reports script errors.
//!
//! Object lifetime goes through the deferred-deletion pools of
//! [`cardstack_deletion`]: a deleted object stays allocated until no handler
//! that could still observe it is on the stack.

mod engine;
mod error;
mod handler;
mod host;
mod name;
mod object;
mod parent_script;
mod status;
mod value;

pub use engine::{DispatchConfig, Engine, ExecContext, MessageOptions};
pub use error::{DispatchError, ErrorFrame, ErrorState};
pub use handler::{Handler, HandlerBody, HandlerList, HasHandlers, ScriptCompiler, ScriptError, ScriptLibrary};
pub use host::{EventLoop, Host, NullHost, Tool};
pub use name::{Name, names};
pub use object::{ObjectFlags, ObjectId, ObjectKind, ObjectStore};
pub use parent_script::{ParentScript, ParentScriptUse};
pub use status::{ExecStatus, HandlerType};
pub use value::{Params, Value};
