use crate::assets::AssetLoader;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub render: RenderConfig,
    pub fonts: FontConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// Bearer token for protected endpoints. Without one, every protected
    /// request is rejected.
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            api_token: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Conversions in flight at once
    pub max_concurrency: usize,

    /// Pool capacity; `None` means `max_concurrency`
    pub pool_size: Option<usize>,

    pub max_batch_items: usize,

    pub render_timeout_secs: u64,

    /// Create every pool resource at startup
    pub precreate: bool,

    /// Render a sample once at startup
    pub warmup: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 2,
            pool_size: None,
            max_batch_items: 50,
            render_timeout_secs: 30,
            precreate: true,
            warmup: true,
        }
    }
}

/// Logical font names mapped to font files
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FontConfig {
    /// Logical name used when a request names no font or an unknown one
    pub default: String,

    /// Font files above this size are skipped at startup
    pub max_font_bytes: u64,

    pub faces: BTreeMap<String, PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        let faces = [
            ("antique", "GenEiAntiqueNv5-M.ttf"),
            ("gothic", "GenEiMGothic2-Regular.ttf"),
            ("mincho", "GenEiChikugoMin3-R.ttf"),
        ]
        .into_iter()
        .map(|(name, file)| (name.to_string(), PathBuf::from(file)))
        .collect();

        Self {
            default: "antique".to_string(),
            max_font_bytes: 32 * 1024 * 1024,
            faces,
        }
    }
}

/// Parameters the render context is started with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub pool_size: usize,
    pub max_concurrency: usize,
    pub render_timeout: Duration,
    pub precreate: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        RenderConfig::default().pool_settings()
    }
}

impl RenderConfig {
    pub fn pool_settings(&self) -> PoolSettings {
        let max_concurrency = self.max_concurrency.max(1);
        PoolSettings {
            pool_size: self.pool_size.unwrap_or(max_concurrency).max(1),
            max_concurrency,
            render_timeout: Duration::from_secs(self.render_timeout_secs.max(1)),
            precreate: self.precreate,
        }
    }
}

impl AppConfig {
    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        match loader.read_config_string() {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    let config: Self = config;
                    tracing::info!(
                        max_concurrency = config.render.max_concurrency,
                        fonts = config.fonts.faces.len(),
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in the binary.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("API_TOKEN").filter(|t| !t.is_empty()) {
            self.server.api_token = Some(token);
        }
        if let Some(addr) = lookup("BIND_ADDR").filter(|a| !a.is_empty()) {
            self.server.bind_addr = addr;
        }

        let render = &mut self.render;
        if let Some(v) = parse_var(&lookup, "MAX_CONCURRENCY") {
            render.max_concurrency = v;
        }
        if let Some(v) = parse_var(&lookup, "PAGE_POOL_SIZE") {
            render.pool_size = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "MAX_BATCH_ITEMS") {
            render.max_batch_items = v;
        }
        if let Some(v) = parse_var(&lookup, "RENDER_TIMEOUT_SECS") {
            render.render_timeout_secs = v;
        }
        if let Some(v) = bool_var(&lookup, "PRECREATE_PAGES") {
            render.precreate = v;
        }
        if let Some(v) = bool_var(&lookup, "WARMUP_RENDER_ON_STARTUP") {
            render.warmup = v;
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring invalid environment override");
            None
        }
    }
}

fn bool_var(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    let raw = lookup(name)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(var = name, value = %raw, "Ignoring invalid environment override");
            None
        }
    }
}
