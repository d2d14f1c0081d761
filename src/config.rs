//! Startup configuration.
//!
//! Settings come from an optional TOML file; the Spotify credentials can also
//! be supplied (and are usually supplied) through the environment.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{
    display::{Orientation, RefreshMode},
    error::ConfigError,
};

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "NOWPLAYING_CONFIG";
/// Config file read when [`CONFIG_PATH_VAR`] is unset, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "nowplaying.toml";

pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";
pub const REFRESH_TOKEN_VAR: &str = "SPOTIFY_REFRESH_TOKEN";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Delay between two polls.
    pub poll_interval_secs: u64,
    /// Directory font and bitmap paths are resolved against.
    pub assets_dir: PathBuf,
    pub spotify: SpotifyConfig,
    pub display: DisplayConfig,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            assets_dir: PathBuf::from("assets"),
            spotify: SpotifyConfig::default(),
            display: DisplayConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_url: String,
    pub currently_playing_url: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            token_url: "https://accounts.spotify.com/api/token".into(),
            currently_playing_url: "https://api.spotify.com/v1/me/player/currently-playing".into(),
        }
    }
}

// Keeps credentials out of logs.
impl fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_url", &self.token_url)
            .field("currently_playing_url", &self.currently_playing_url)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Panel width in its native portrait orientation.
    pub native_width: u32,
    pub native_height: u32,
    pub landscape: bool,
    pub rotate_180: bool,
    pub refresh: RefreshMode,
    /// Where the PNG panel stand-in writes frames.
    pub output_path: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            native_width: 122,
            native_height: 250,
            landscape: true,
            rotate_180: true,
            refresh: RefreshMode::Full,
            output_path: PathBuf::from("frame.png"),
        }
    }
}

impl DisplayConfig {
    pub fn native_size(&self) -> [u32; 2] {
        [self.native_width, self.native_height]
    }

    pub fn orientation(&self) -> Orientation {
        Orientation {
            landscape: self.landscape,
            rotate_180: self.rotate_180,
        }
    }
}

/// Placement of the now-playing screen elements, in canvas pixels.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Gap above the title, also kept free below the artist line.
    pub margin_top: i32,
    /// Wrap width for title and artist.
    pub text_max_width: f32,
    /// Height kept free under the title for the artist line.
    pub artist_reserve: f32,
    /// Gap between the title block and the artist.
    pub artist_gap: i32,
    /// Top-left corner of the album art.
    pub art_position: [i32; 2],
    pub line_spacing: f32,
    pub title_font: PathBuf,
    /// Installed family used for the title when `title_font` is missing.
    pub title_fallback_family: String,
    /// Title sizes to try, largest first.
    pub title_sizes: Vec<f32>,
    pub artist_font: PathBuf,
    pub artist_fallback_family: String,
    pub artist_sizes: Vec<f32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_top: 10,
            text_max_width: 120.0,
            artist_reserve: 16.0,
            artist_gap: 10,
            art_position: [128, 0],
            line_spacing: 0.0,
            title_font: PathBuf::from("libre_baskerville_bold.ttf"),
            title_fallback_family: "DejaVu Serif".into(),
            title_sizes: vec![24.0, 18.0, 16.0],
            artist_font: PathBuf::from("inter.ttf"),
            artist_fallback_family: "DejaVu Sans".into(),
            artist_sizes: vec![16.0],
        }
    }
}

impl Config {
    /// Reads the config file named by the environment (or the default file
    /// if present) and applies credential overrides from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with the file path and environment supplied by the
    /// caller.
    pub fn load_with(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    log::debug!("No {DEFAULT_CONFIG_PATH}, using built-in defaults.");
                    Self::default()
                }
            }
        };

        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents, path)
    }

    /// Parses TOML; `origin` is only used in error messages.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Replaces credentials with non-empty environment values.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let overrides = [
            (CLIENT_ID_VAR, &mut self.spotify.client_id),
            (CLIENT_SECRET_VAR, &mut self.spotify.client_secret),
            (REFRESH_TOKEN_VAR, &mut self.spotify.refresh_token),
        ];

        for (key, slot) in overrides {
            if let Some(value) = env(key).filter(|value| !value.trim().is_empty()) {
                *slot = value.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spotify.client_id.is_empty() {
            return Err(ConfigError::Missing(CLIENT_ID_VAR));
        }
        if self.spotify.client_secret.is_empty() {
            return Err(ConfigError::Missing(CLIENT_SECRET_VAR));
        }
        if self.spotify.refresh_token.is_empty() {
            return Err(ConfigError::Missing(REFRESH_TOKEN_VAR));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "poll_interval_secs",
                reason: "must be at least one second".into(),
            });
        }

        let sizes = [
            ("layout.title_sizes", &self.layout.title_sizes),
            ("layout.artist_sizes", &self.layout.artist_sizes),
        ];
        for (key, sizes) in sizes {
            if sizes.is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "needs at least one size".into(),
                });
            }
            if sizes.iter().any(|size| !size.is_finite() || *size <= 0.0) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("sizes must be positive, got {sizes:?}"),
                });
            }
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
