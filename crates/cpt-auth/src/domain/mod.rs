//! # Domain Layer
//!
//! Envelope encoding, signing composition, verification and the account
//! binding state machine. No I/O: the transport is reached through
//! [`crate::ports::outbound::Transport`].

pub mod binding;
pub mod callback;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod request;
pub mod trust_anchor;
pub mod verifier;
