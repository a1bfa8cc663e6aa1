//! Presence controller: a reducer-driven state machine for the Discord
//! companion connection, plus the dispatch layer that performs companion
//! calls around state transitions.

pub mod actions;
mod controller;
pub mod reducer;
mod session;

pub use actions::{create_action, Action, ActionKind, UnknownActionKind};
pub use companion_ipc::{CompanionApi, CompanionEvent};
pub use controller::{Controller, DispatchError};
pub use reducer::{reduce, ControllerState};
pub use session::{HostSignal, Session};

#[cfg(test)]
#[path = "tests/mock.rs"]
mod mock;
