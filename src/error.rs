//! Stable error codes for the store and config errors.

/// Machine-readable classification for an error, surfaced to the host.
pub trait ErrorCode: std::fmt::Display {
    /// Stable `E_…` identifier.
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same call could succeed.
    fn retryable(&self) -> bool {
        false
    }
}
