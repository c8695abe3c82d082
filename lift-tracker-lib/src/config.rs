//src/config.rs
use comfy_table::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use tracing::warn;

const CONFIG_FILE_NAME: &str = "config.toml";
pub(crate) const APP_DIR: &str = "lift-tracker";
const CONFIG_ENV_VAR: &str = "LIFT_TRACKER_CONFIG_DIR"; // Environment variable name

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not determine configuration directory.")]
    CannotDetermineConfigDir,
    #[error("I/O error accessing config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config data (TOML): {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid color name: {0}")]
    InvalidColor(String),
}

/// Only picks the weight label; values are never converted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric, // kg
    Imperial, // lbs
}

impl Units {
    pub const fn weight_label(self) -> &'static str {
        match self {
            Self::Metric => "kg",
            Self::Imperial => "lbs",
        }
    }
}

/// Colors a table header can take. Names parse case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum HeaderColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Grey,
}

impl From<HeaderColor> for Color {
    fn from(value: HeaderColor) -> Self {
        match value {
            HeaderColor::Red => Self::Red,
            HeaderColor::Green => Self::Green,
            HeaderColor::Yellow => Self::Yellow,
            HeaderColor::Blue => Self::Blue,
            HeaderColor::Magenta => Self::Magenta,
            HeaderColor::Cyan => Self::Cyan,
            HeaderColor::White => Self::White,
            HeaderColor::Grey => Self::Grey,
        }
    }
}

/// Parses a header color name such as "cyan".
/// # Errors
/// `Error::InvalidColor`, listing the accepted names.
pub fn parse_color(name: &str) -> Result<HeaderColor, Error> {
    name.trim().parse::<HeaderColor>().map_err(|_| {
        let accepted: Vec<String> = HeaderColor::iter().map(|c| c.to_string()).collect();
        Error::InvalidColor(format!("'{}' (expected one of {})", name, accepted.join(", ")))
    })
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Theme {
    pub header_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_color: "Green".to_string(),
        }
    }
}

impl Theme {
    /// Header color for tables, falling back to green on a bad name.
    pub fn header_color(&self) -> Color {
        match parse_color(&self.header_color) {
            Ok(color) => color.into(),
            Err(e) => {
                warn!("{e}; using Green");
                Color::Green
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)] // Missing keys fall back to defaults
pub struct Config {
    pub units: Units,
    /// Merge duplicate exercises each time the service starts.
    pub cleanup_duplicates_on_startup: bool,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            units: Units::default(),
            cleanup_duplicates_on_startup: true,
            theme: Theme::default(),
        }
    }
}

/// Determines the path to the configuration file, creating its directory.
/// # Errors
/// `CannotDetermineConfigDir` or `Io`.
pub fn get_config_path() -> Result<PathBuf, Error> {
    let dir = match std::env::var_os(CONFIG_ENV_VAR) {
        Some(overridden) => PathBuf::from(overridden),
        None => dirs::config_dir()
            .ok_or(Error::CannotDetermineConfigDir)?
            .join(APP_DIR),
    };
    fs::create_dir_all(&dir)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Loads the configuration, writing a default file first if none exists.
/// # Errors
/// `Io`, `TomlParse` or `TomlSerialize`.
pub fn load(config_path: &Path) -> Result<Config, Error> {
    if config_path.exists() {
        let config_content = fs::read_to_string(config_path)?;
        Ok(toml::from_str(&config_content)?)
    } else {
        let default_config = Config::default();
        save(config_path, &default_config)?;
        Ok(default_config)
    }
}

/// Saves the configuration to the TOML file.
/// # Errors
/// `Io` or `TomlSerialize`.
pub fn save(config_path: &Path, config: &Config) -> Result<(), Error> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    let config_content = toml::to_string_pretty(config)?;
    fs::write(config_path, config_content)?;
    Ok(())
}
