use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};


#[derive(Debug)]
pub enum Error {
    Io { path: PathBuf, error: io::Error },
    Toml { path: PathBuf, error: toml::de::Error },
    InvalidFontSize { font_size: f32 },
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, error }
                => write!(f, "failed to read config from {}: {}", path.display(), error),
            Self::Toml { path, error }
                => write!(f, "failed to parse config from {}: {}", path.display(), error),
            Self::InvalidFontSize { font_size }
                => write!(f, "font size must be a finite non-negative number, not {}", font_size),
        }
    }
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { error, .. } => Some(error),
            Self::Toml { error, .. } => Some(error),
            Self::InvalidFontSize { .. } => None,
        }
    }
}


/// Settings that apply to every field of a run.
///
/// The configuration is fixed before the first descriptor is processed.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, PartialOrd, Serialize)]
#[serde(default)]
pub struct Config {
    /// Text color for fields that do not specify their own.
    pub default_text_color: Option<String>,

    /// Background color for fields that do not specify their own.
    pub default_background_color: Option<String>,

    pub appearance: Appearance,
}
impl Config {
    /// Replaces the default colors with the ones given on the command line, if any.
    pub fn with_default_colors(mut self, text_color: Option<String>, background_color: Option<String>) -> Self {
        if text_color.is_some() {
            self.default_text_color = text_color;
        }
        if background_color.is_some() {
            self.default_background_color = background_color;
        }
        self
    }
}


#[derive(Clone, Debug, Deserialize, PartialEq, PartialOrd, Serialize)]
#[serde(default)]
pub struct Appearance {
    /// Font size for variable text fields; 0 lets the viewer auto-size the text.
    pub font_size: f32,

    /// Whether viewers are asked to regenerate field appearances.
    pub need_appearances: bool,
}
impl Default for Appearance {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            need_appearances: true,
        }
    }
}


pub(crate) fn parse_config(config_string: &str, config_path: &Path) -> Result<Config, Error> {
    let config: Config = toml::from_str(config_string)
        .map_err(|error| Error::Toml { path: config_path.to_owned(), error })?;
    let font_size = config.appearance.font_size;
    if !font_size.is_finite() || font_size < 0.0 {
        return Err(Error::InvalidFontSize { font_size });
    }
    Ok(config)
}


/// Reads the configuration file; failures are left to the caller to report.
pub(crate) fn load_config(config_path: &Path) -> Result<Config, Error> {
    let config_string = std::fs::read_to_string(config_path)
        .map_err(|error| Error::Io { path: config_path.to_owned(), error })?;
    parse_config(&config_string, config_path)
}
