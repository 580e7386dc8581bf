//! Default storage folder lookup

use std::path::PathBuf;

use crate::host::StorageFolder;

/// Directory name created under the platform data directory
pub const STORAGE_DIR_NAME: &str = "framegrab";

/// Platform data directory, e.g. `~/.local/share/framegrab` on Linux
///
/// Falls back to the system temporary directory when the platform has no
/// data directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemStorage;

impl SystemStorage {
    pub fn new() -> Self {
        Self
    }
}

impl StorageFolder for SystemStorage {
    fn storage_folder(&self) -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(STORAGE_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_folder_ends_with_crate_dir() {
        let folder = SystemStorage::new().storage_folder();
        assert!(folder.ends_with(STORAGE_DIR_NAME));
        assert!(folder.is_absolute());
    }
}
