use thiserror::Error;

/// Errors surfaced by the interceptor's core library.
///
/// The TLS ClientHello parser never constructs a variant here — a malformed
/// or truncated record is represented as `None`, not an `Err`, so its
/// totality is enforced by the type system rather than by convention.
#[derive(Error, Debug)]
pub enum TgveilError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to split TCP segment: {0}")]
    Split(String),

    #[error("kernel intercept driver error: {0}")]
    Driver(String),

    #[error("target IP list refresh failed: {0}")]
    Refresh(String),
}

pub type Result<T> = std::result::Result<T, TgveilError>;
