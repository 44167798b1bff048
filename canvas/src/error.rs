//! Stable error codes shared by every error enum in the crate.

/// Machine-readable classification for an error, surfaced to the host.
pub trait ErrorCode: std::fmt::Display {
    /// Stable `E_…` identifier.
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same call could succeed.
    fn retryable(&self) -> bool {
        false
    }
}
