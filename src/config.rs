use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::geometry::{Insets, PlacementRules, Size};

fn default_url() -> String {
    "http://127.0.0.1:11434/api/generate".to_string()
}

fn default_model() -> String {
    "qwen2.5-coder:3b".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_width() -> u32 {
    400
}

fn default_min_width() -> u32 {
    300
}

fn default_min_height() -> u32 {
    200
}

fn default_margin() -> u32 {
    40
}

fn default_edge_thickness() -> u32 {
    15
}

fn default_always_on_top() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub style: StyleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    /// Full URL of the generate endpoint.
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Overall request timeout. Unset means the request may run as long as the model needs.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_min_width")]
    pub min_width: u32,
    #[serde(default = "default_min_height")]
    pub min_height: u32,
    /// Gap kept above and below the window inside the usable screen height.
    #[serde(default = "default_margin")]
    pub margin: u32,
    #[serde(default = "default_edge_thickness")]
    pub edge_thickness: u32,
    #[serde(default = "default_always_on_top")]
    pub always_on_top: bool,
    /// Screen insets (panels, docks) the host cannot report on its own.
    #[serde(default)]
    pub insets: InsetsConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct InsetsConfig {
    #[serde(default)]
    pub top: u32,
    #[serde(default)]
    pub right: u32,
    #[serde(default)]
    pub bottom: u32,
    #[serde(default)]
    pub left: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StyleConfig {
    pub font_family: String,
    pub base_size: u16,
    pub user_bubble: [u8; 3],
    pub assistant_bubble: [u8; 3],
    pub error_bubble: [u8; 3],
    pub text_color: [u8; 3],
    pub code_background: [u8; 3],
    pub link_color: [u8; 3],
    /// Margin on the side a bubble is pushed away from.
    pub wide_margin: u16,
    /// Margin on the side a bubble is anchored to.
    pub narrow_margin: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfig {
            url: default_url(),
            model: default_model(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: None,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: default_width(),
            min_width: default_min_width(),
            min_height: default_min_height(),
            margin: default_margin(),
            edge_thickness: default_edge_thickness(),
            always_on_top: default_always_on_top(),
            insets: InsetsConfig::default(),
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        StyleConfig {
            font_family: "JetBrains Mono".to_string(),
            base_size: 14,
            user_bubble: [0x2b, 0x4a, 0x7a],
            assistant_bubble: [0x2a, 0x2d, 0x3a],
            error_bubble: [0x6b, 0x2a, 0x2a],
            text_color: [0xe6, 0xe6, 0xe6],
            code_background: [0x1a, 0x1b, 0x26],
            link_color: [0x7a, 0xa2, 0xf7],
            wide_margin: 48,
            narrow_margin: 8,
        }
    }
}

impl WindowConfig {
    pub fn min_size(&self) -> Size {
        Size::new(self.min_width as i32, self.min_height as i32)
    }

    pub fn placement_rules(&self) -> PlacementRules {
        PlacementRules {
            width: self.width as i32,
            margin: self.margin as i32,
            min_size: self.min_size(),
        }
    }

    pub fn screen_insets(&self) -> Insets {
        Insets {
            top: self.insets.top as i32,
            right: self.insets.right as i32,
            bottom: self.insets.bottom as i32,
            left: self.insets.left as i32,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Config::default();
        }

        match fs::read_to_string(&config_path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("error parsing {}: {}. Using defaults.", config_path.display(), e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("error reading {}: {}. Using defaults.", config_path.display(), e);
                Config::default()
            }
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_config_dir() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/side-chat")
        } else {
            PathBuf::from(".")
        }
    }
}
