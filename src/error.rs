//! Error types for the switcher.

/// Top-level error type for the scene-switching system.
#[derive(Debug, thiserror::Error)]
pub enum SwitcherError {
    /// Configuration error. Fatal at startup; the process must not run
    /// with an inconsistent schedule.
    #[error("config error: {0}")]
    Config(String),

    /// Schedule compilation or timer error.
    #[error("schedule error: {0}")]
    Schedule(String),

    /// OBS connection, handshake, or request error.
    #[error("OBS error: {0}")]
    Obs(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SwitcherError>;
