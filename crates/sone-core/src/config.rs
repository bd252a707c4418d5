//! Configuration loading
//!
//! Configuration comes from an optional TOML file with environment
//! overrides on top. Environment keys use the `SONE_` prefix and `__`
//! between nested keys:
//!
//! ```text
//! SONE_INSERTER__INSERTION_DELAY_SECS=30
//! SONE_LOGGING__PROFILE=production
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::logging_facility::Profile;

/// Poll interval of the reference plugin
pub const DEFAULT_INSERTION_DELAY_SECS: u64 = 60;

/// Document served when a Sone's key is requested without a path
pub const DEFAULT_DOCUMENT: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoneConfig {
    pub inserter: InserterSection,
    pub logging: LoggingSection,
    pub store: StoreSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InserterSection {
    /// Seconds between the end of one insert check and the next
    pub insertion_delay_secs: u64,
    pub default_document: String,
}

impl Default for InserterSection {
    fn default() -> Self {
        Self {
            insertion_delay_secs: DEFAULT_INSERTION_DELAY_SECS,
            default_document: DEFAULT_DOCUMENT.to_string(),
        }
    }
}

impl InserterSection {
    pub fn insertion_delay(&self) -> Duration {
        Duration::from_secs(self.insertion_delay_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Root directory of the local datastore
    pub root: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".sone/datastore"),
        }
    }
}

impl SoneConfig {
    /// Load configuration from an optional file plus `SONE_*` variables
    ///
    /// # Errors
    ///
    /// Returns `SoneError::Configuration` if the file is given but missing
    /// or malformed, or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("SONE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse a TOML document, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
