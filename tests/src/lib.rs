//! # CPT Test Suite
//!
//! Cross-crate scenarios driven against a scripted in-memory server.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── server.rs     # Scripted server implementing `Transport`
//!     ├── requests.rs   # Signed and unsigned calls as the server sees them
//!     ├── handshake.rs  # Account binding end to end
//!     └── callbacks.rs  # Inbound notification authentication
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cpt-tests
//!
//! # By scenario
//! cargo test -p cpt-tests integration::handshake::
//! ```

#![allow(dead_code)]

pub mod integration;
