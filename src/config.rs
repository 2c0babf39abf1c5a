//! Configuration types, loaded from an optional TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::manifest::TargetLayout;
use crate::resolution::ResolutionTable;

/// Settings that shape downloaded files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Extension appended to every downloaded video, without the dot.
    pub video_extension: String,
    /// Encoding heights to accept in addition to the built-in table.
    pub extra_heights: Vec<u32>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            video_extension: "mp4".to_string(),
            extra_heights: Vec::new(),
        }
    }
}

impl DownloadConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the extension for downloaded videos.
    #[must_use]
    pub fn with_video_extension(mut self, ext: impl Into<String>) -> Self {
        self.video_extension = ext.into();
        self
    }

    /// Sets additional selectable heights.
    #[must_use]
    pub fn with_extra_heights(mut self, heights: Vec<u32>) -> Self {
        self.extra_heights = heights;
        self
    }

    /// Builds the resolution table: built-in heights plus the extras.
    #[must_use]
    pub fn resolution_table(&self) -> ResolutionTable {
        ResolutionTable::new().with_heights(self.extra_heights.iter().copied())
    }
}

/// HTTP endpoint and timeout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Embed endpoint; the video identifier is appended.
    pub embed_base_url: String,
    /// Seconds allowed to establish a connection.
    pub connect_timeout_secs: u64,
    /// Seconds a body read may stall before the transfer fails.
    pub read_timeout_secs: u64,
    /// Seconds allowed for a whole catalog request.
    pub catalog_timeout_secs: u64,
    /// Custom `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            embed_base_url: "https://fast.wistia.net/embed/iframe/".to_string(),
            connect_timeout_secs: 30,
            read_timeout_secs: 60,
            catalog_timeout_secs: 30,
            user_agent: None,
        }
    }
}

/// Where manifests are read from and videos are written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory scanned for `*.json` manifests.
    pub manifest_dir: PathBuf,
    /// Root under which course directories are created.
    pub output_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            manifest_dir: PathBuf::from("./jsons"),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Download configuration.
    pub download: DownloadConfig,
    /// Network configuration.
    pub network: NetworkConfig,
    /// Path configuration.
    pub paths: PathConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the config file, `<config_dir>/wisty/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wisty").join("config.toml"))
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid configuration.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        let text = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&text)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Overrides the read and catalog timeouts.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.network.read_timeout_secs = secs;
        self.network.catalog_timeout_secs = secs;
        self
    }

    /// Returns the download target layout for these settings.
    #[must_use]
    pub fn layout(&self) -> TargetLayout {
        TargetLayout::new(&self.paths.output_dir, &self.download.video_extension)
    }

    fn validate(&self) -> Result<()> {
        let ext = &self.download.video_extension;
        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            return Err(Error::Config(format!(
                "video_extension must be a bare extension, got {ext:?}"
            )));
        }
        if self.network.connect_timeout_secs == 0
            || self.network.read_timeout_secs == 0
            || self.network.catalog_timeout_secs == 0
        {
            return Err(Error::Config("timeouts must be at least one second".into()));
        }
        Ok(())
    }
}
