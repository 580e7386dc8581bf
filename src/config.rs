//! Screenshot output configuration
//!
//! Configuration is read from a JSON file; every field is optional.
//!
//! ```json
//! {
//!   "directory": "/tmp/shots/",
//!   "base_name": "MyGame",
//!   "quality": 90
//! }
//! ```

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    capture::NamingScheme,
    error::{CaptureError, CaptureResult},
    util::encode::DEFAULT_QUALITY,
};

/// Output settings for screenshot files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenshotConfig {
    /// Directory prefix, including the trailing separator. Empty means the
    /// current directory; absent means the system storage folder.
    pub directory: Option<String>,
    /// Base file name. Absent means the application's type name.
    pub base_name: Option<String>,
    /// PNG compression effort, 0-100
    pub quality:   u8,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            directory: None,
            base_name: None,
            quality:   DEFAULT_QUALITY,
        }
    }
}

impl ScreenshotConfig {
    /// Parses and validates a JSON configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use framegrab::config::ScreenshotConfig;
    ///
    /// let config = ScreenshotConfig::from_json(r#"{"base_name": "Game"}"#).unwrap();
    /// assert_eq!(config.base_name.as_deref(), Some("Game"));
    /// assert_eq!(config.quality, 80);
    /// ```
    pub fn from_json(json: &str) -> CaptureResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| CaptureError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file
    pub fn from_json_file(path: &Path) -> CaptureResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks value ranges
    pub fn validate(&self) -> CaptureResult<()> {
        if self.quality > 100 {
            return Err(CaptureError::InvalidConfig {
                reason: format!("quality {} exceeds maximum 100", self.quality),
            });
        }
        Ok(())
    }

    /// Naming scheme described by this configuration
    pub fn naming_scheme(&self) -> NamingScheme {
        let mut scheme = NamingScheme::with_file_path(self.directory.clone());
        if let Some(name) = &self.base_name {
            scheme.set_shot_name(name.clone());
        }
        scheme
    }

    /// JSON schema of the configuration file
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ScreenshotConfig)
    }
}
