//! Error types for the page client.

/// Errors that can occur when loading a storefront page.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be sent or the body could not be read
    /// (network error, timeout, TLS failure).
    #[error("Request failed")]
    RequestFailed,
    /// The URL handed to the client could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// The storefront returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
}
