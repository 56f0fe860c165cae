//! # Nova Session
//!
//! Session controller and streaming reducer for the Nova chat client.
//!
//! [`ChatSession`] runs one conversation: it appends user turns, drives the
//! transport, reveals replies through the [`Typewriter`] at a readable pace,
//! renders failures as in-chat error messages, and persists completed
//! exchanges to the store. Front ends subscribe to [`SessionEvent`]s to know
//! when to redraw.

pub mod error;
pub mod events;
pub mod session;
pub mod typewriter;

pub use error::{SessionError, SessionResult};
pub use events::SessionEvent;
pub use session::{ChatSession, HistoryLoad, Phase};
pub use typewriter::Typewriter;
