//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that callers of the client use
//! - **Outbound (Driven)**: the HTTP transport this subsystem needs

pub mod inbound;
pub mod outbound;
