//! Core domain types and utilities for the travel assistant.
//!
//! This crate provides the identifiers and error handling foundation shared by
//! the conversation engine, the model gateway and the binary.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{MessageId, ParseIdError, SessionId, UserId};
