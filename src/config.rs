use crate::constants;
use std::path::{Path, PathBuf};

/// Controls where decoded part contents are buffered.
///
/// Every part starts out in memory. Once a part grows past the memory
/// threshold its contents are moved into an anonymous temporary file, which is
/// removed as soon as the part is dropped.
///
/// # Examples
///
/// ```
/// use formspool::SpoolConfig;
///
/// let config = SpoolConfig::new()
///     .memory_threshold(64 * 1024)
///     .spill_dir(std::env::temp_dir());
/// # drop(config);
/// ```
#[derive(Debug, Clone)]
pub struct SpoolConfig {
    pub(crate) memory_threshold: usize,
    pub(crate) spill_dir: Option<PathBuf>,
}

impl SpoolConfig {
    /// Creates a default config which keeps up to 1 MiB of each part in
    /// memory and spills into the system temp directory.
    pub fn new() -> SpoolConfig {
        SpoolConfig::default()
    }

    /// Sets the number of bytes a part may hold in memory before it spills to
    /// disk. `0` spills every non-empty part.
    pub fn memory_threshold(mut self, limit: usize) -> SpoolConfig {
        self.memory_threshold = limit;
        self
    }

    /// Sets the directory spilled parts are written to.
    pub fn spill_dir<P: Into<PathBuf>>(mut self, dir: P) -> SpoolConfig {
        self.spill_dir = Some(dir.into());
        self
    }

    pub(crate) fn spill_dir_path(&self) -> Option<&Path> {
        self.spill_dir.as_deref()
    }
}

impl Default for SpoolConfig {
    fn default() -> Self {
        SpoolConfig {
            memory_threshold: constants::DEFAULT_MEMORY_THRESHOLD,
            spill_dir: None,
        }
    }
}
