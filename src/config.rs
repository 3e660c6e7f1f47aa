use crate::reader::RenderOptions;
use crate::reader::pdf::DEFAULT_DPI;
use crate::view::FitMode;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_NAME: &str = "folio";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub library_path: String,
    pub theme: String,
    pub render_dpi: u32,
    pub default_fit_mode: FitMode,
    pub remember_position: bool,
    pub recent_limit: usize,
    pub history_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_path: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .to_string_lossy()
                .to_string(),
            theme: "default".to_string(),
            render_dpi: DEFAULT_DPI,
            default_fit_mode: FitMode::Page,
            remember_position: true,
            recent_limit: 20,
            history_path: data_dir().join("history.db").to_string_lossy().to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `folio.toml` from the config dir, then `folio.toml` in the working
    /// directory, then `FOLIO_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let user_file = config_dir().join(CONFIG_NAME);
        let s = Config::builder()
            .add_source(File::with_name(&user_file.to_string_lossy()).required(false))
            .add_source(File::with_name(CONFIG_NAME).required(false))
            .add_source(Environment::with_prefix("FOLIO").try_parsing(true))
            .build()?;
        s.try_deserialize()
    }

    pub fn save(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let dir = config_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.toml", CONFIG_NAME));
        std::fs::write(&path, toml::to_string(self)?)?;
        Ok(path)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::with_dpi(self.render_dpi)
    }

    /// Explicit zoom is a per-session choice, so only fit modes are honoured here.
    pub fn default_fit(&self) -> FitMode {
        match self.default_fit_mode {
            FitMode::Custom => FitMode::Page,
            mode => mode,
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_NAME)
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_NAME)
}
