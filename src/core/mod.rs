//! Core plumbing - callback bus, callback arguments, message timer
//!
//! These modules know nothing about pixels and can be used on their own.

pub mod args;
pub mod event_bus;
pub mod timer;

// Re-exports for convenience
pub use args::{Arg, CallbackArgs, KwArgs};
pub use event_bus::{Callback, EventBus, Outcome};
pub use timer::{DeadlineTimer, MessageTimer};
