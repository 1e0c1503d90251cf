//! # Integration Scenarios
//!
//! Every scenario talks to [`server::ScriptedServer`], which checks the
//! client's headers and signatures the way the real API does and signs its
//! acknowledgments with a test-only trust anchor key.


mod handshake;
mod requests;
