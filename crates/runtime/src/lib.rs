//! Main-thread runtime.
//!
//! Owns the dispatch [`Engine`](cardstack_dispatch::Engine) and the
//! cross-thread [`NotifyQueue`](cardstack_notify::NotifyQueue), and runs the
//! wait loop that drains notifications, sends queued messages and reclaims
//! deleted objects.

pub mod config;
pub mod logging;
mod runtime;

pub use config::{ConfigError, DispatchSection, EventLoopConfig, LoggingConfig, RuntimeConfig};
pub use runtime::{RemoteHandle, Runtime};
