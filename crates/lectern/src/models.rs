//! These models represent the objects passed around by the orchestrator
//!
//! Messages and tool invocation requests mirror the chat-completions wire format closely,
//! because the message sequence is sent verbatim to the completion endpoint on every round.
//! Citations are the UI-facing pointers that tools leave behind after a successful call.
pub mod citation;
pub mod message;
pub mod role;
pub mod tool;
