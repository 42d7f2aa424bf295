//! Chat turns: quota accounting, the turn service around the triage pipeline,
//! and the conversation endpoints.
//! The model is reached only through the CompletionService in AppState.

pub mod handlers;
pub mod quota;
pub mod service;
