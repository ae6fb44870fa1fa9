//! Error types for the autosplitter

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, AutosplitterError>;

/// Errors surfaced by the autosplitter.
///
/// None of these are fatal to the host: attach failures are retried on the
/// next tick, resolution failures leave the splitter "not ready" until the
/// process is re-attached, and read failures only degrade a single tick.
#[derive(Debug, Error)]
pub enum AutosplitterError {
    #[error("no process found matching {0:?}")]
    ProcessNotFound(Vec<String>),

    #[error("failed to open process {pid} for reading")]
    ProcessOpenFailed { pid: u32 },

    #[error("address resolution failed: {0}")]
    AddressResolutionFailed(String),

    #[error("memory read failed at 0x{address:X}")]
    MemoryReadFailed { address: usize },

    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    #[error("failed to read config file {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to parse split list JSON")]
    SplitListParse(#[from] serde_json::Error),

    #[error("autosplitter is already running")]
    AlreadyRunning,

    #[error("failed to spawn {name} thread")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl AutosplitterError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(message.into())
    }

    /// Shorthand for a resolution error
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::AddressResolutionFailed(message.into())
    }

    /// Whether the error is expected to clear up on a later tick
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProcessNotFound(_) | Self::ProcessOpenFailed { .. } | Self::MemoryReadFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AutosplitterError::MemoryReadFailed { address: 0x1F00 };
        assert_eq!(err.to_string(), "memory read failed at 0x1F00");

        let err = AutosplitterError::config("unknown split category 'Foo'");
        assert!(err.to_string().contains("unknown split category"));
    }

    #[test]
    fn test_retryable() {
        assert!(AutosplitterError::ProcessNotFound(vec!["DeathsDoor".into()]).is_retryable());
        assert!(AutosplitterError::MemoryReadFailed { address: 0 }.is_retryable());
        assert!(!AutosplitterError::resolution("class not found").is_retryable());
        assert!(!AutosplitterError::config("bad").is_retryable());
    }

    #[test]
    fn test_thread_spawn_keeps_io_source() {
        use std::error::Error as _;

        let err = AutosplitterError::ThreadSpawn {
            name: "autosplitter",
            source: std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads left"),
        };
        assert_eq!(err.to_string(), "failed to spawn autosplitter thread");
        assert_eq!(err.source().map(|s| s.to_string()), Some("no threads left".to_string()));
        assert!(!err.is_retryable());
        assert!(!matches!(err, AutosplitterError::ConfigurationInvalid(_)));
    }
}
