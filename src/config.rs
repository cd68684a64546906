use std::path::PathBuf;

use dirs::home_dir;
use log::error;

use crate::map::editor::MapStyle;

/// Merged configuration: environment wins over the config file, which wins
/// over the built-in defaults.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
  pub config_path: Option<PathBuf>,
  /// Base URL of the hosted document store. None means offline mode with an
  /// in-memory store.
  pub store_url: Option<String>,
  /// Map-provider access token, read from process configuration and never
  /// hard-coded.
  pub map_token: Option<String>,
  #[serde(default)]
  pub style: MapStyle,
}

impl Config {
  #[must_use]
  pub fn new() -> Self {
    let from_env = Self::from_env();
    let from_file = Self::from_file();
    let default = Self::default();

    let mut merged = from_env;
    if let Some(from_file) = &from_file {
      merged = merged.merge(from_file);
    }
    merged = merged.merge(&default);

    if merged.config_path.is_some() && from_file.is_none() {
      merged.init_cfg_file();
    }

    merged
  }

  fn from_env() -> Self {
    Self {
      config_path: std::env::var("MAPMARK_CONFIG").ok().map(PathBuf::from),
      store_url: std::env::var("MAPMARK_STORE_URL").ok(),
      map_token: std::env::var("MAPMARK_TOKEN").ok(),
      style: MapStyle::default(),
    }
  }

  fn merge(mut self, other: &Self) -> Self {
    self.config_path = self.config_path.or(other.config_path.clone());
    self.store_url = self.store_url.or(other.store_url.clone());
    self.map_token = self.map_token.or(other.map_token.clone());
    if self.style == MapStyle::default() {
      self.style = other.style;
    }
    self
  }

  fn from_file() -> Option<Self> {
    let config_path = std::env::var("MAPMARK_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("mapmark")))?;
    let config_path = config_path.join("config.json");

    serde_json::from_str(&std::fs::read_to_string(&config_path).ok()?)
      .inspect_err(|e| error!("Failed to read config file: {e}"))
      .ok()?
  }

  fn init_cfg_file(&self) {
    if let Some(path) = &self.config_path {
      if !path.exists() {
        let _ = std::fs::create_dir_all(path).inspect_err(|e| {
          error!("Failed to create config directory: {e}");
        });
      }

      let path = path.join("config.json");
      if !path.exists() {
        match serde_json::to_string_pretty(self) {
          Ok(config) => {
            let _ = std::fs::write(path, config).inspect_err(|e| {
              error!("Failed to write config file: {e}");
            });
          }
          Err(e) => error!("Failed to serialize config: {e}"),
        }
      }
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      config_path: home_dir().map(|p| p.join(".config").join("mapmark")),
      store_url: None,
      map_token: None,
      style: MapStyle::default(),
    }
  }
}
