//! # Outbound Ports (Driven Ports / SPI)
//!
//! The HTTP transport is an external collaborator. It receives a fully built
//! [`OutboundRequest`] and returns the raw response body; retries, timeouts
//! and connection pooling are its business.

use crate::domain::entities::OutboundRequest;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by the transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established or was dropped
    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-success HTTP status without a usable JSON body
    #[error("HTTP status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body as received
        body: String,
    },

    /// The call did not complete in time
    #[error("Request timed out")]
    Timeout,
}

/// Performs one HTTP call.
///
/// GET requests carry `params` in the query string, POST requests as a form
/// body. Headers are sent verbatim.
pub trait Transport: Send + Sync {
    /// Execute `request` and return the response body.
    ///
    /// # Errors
    /// * `TransportError::Connection` - no response was received
    /// * `TransportError::Status` - the server answered with a non-JSON error page
    /// * `TransportError::Timeout` - deadline exceeded
    fn execute(&self, request: &OutboundRequest) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &OutboundRequest) -> Result<String, TransportError> {
        (**self).execute(request)
    }
}
