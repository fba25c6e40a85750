use std::path::PathBuf;
use std::time::Duration;

/// Limits applied to every download made by a [`Processor`](crate::Processor).
///
/// # Examples
///
/// ```
/// use hoard_fetch::ProcessorOptions;
/// use std::time::Duration;
///
/// let options = ProcessorOptions::default()
///     .max_bytes(5 * 1024 * 1024)
///     .timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// Directory housing temporary files. Created if missing.
    ///
    /// Default: the OS temporary directory
    pub temp_dir: PathBuf,

    /// Largest accepted payload, in bytes. One byte more is a validation
    /// failure.
    ///
    /// Default: 10 MiB
    pub max_bytes: u64,

    /// Wall-clock budget for connect, response and body read together.
    ///
    /// Default: 30s
    pub timeout: Duration,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ProcessorOptions {
    #[must_use]
    pub fn temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    #[must_use]
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
