//! Asset loading with an embedded default config
//!
//! - If `CONFIG_FILE` is NOT set: use the embedded `config.yaml`
//! - If `CONFIG_FILE` IS set and the file exists: use it
//! - If `CONFIG_FILE` IS set but missing: fall back to the embedded default
//!
//! Font files are never embedded; they are read from the fonts directory
//! (`FONTS_DIR`, default `./fonts`).

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Embedded default config
#[derive(RustEmbed)]
#[folder = "."]
#[include = "config.yaml"]
struct EmbeddedConfig;

const DEFAULT_FONTS_DIR: &str = "./fonts";

/// Asset loader with optional filesystem overrides
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    /// External fonts directory (from FONTS_DIR env var)
    fonts_dir: Option<PathBuf>,
    /// External config file path (from CONFIG_FILE env var)
    config_file: Option<PathBuf>,
}

impl AssetLoader {
    /// Paths should be `Some` only if the corresponding env var was set.
    pub fn new(fonts_dir: Option<PathBuf>, config_file: Option<PathBuf>) -> Self {
        Self {
            fonts_dir,
            config_file,
        }
    }

    pub fn fonts_dir(&self) -> PathBuf {
        self.fonts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FONTS_DIR))
    }

    /// Resolve a configured font file. Absolute paths are kept as is.
    pub fn font_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.fonts_dir().join(file)
        }
    }

    /// Read a font file, refusing files larger than `max_bytes`.
    pub fn read_font(&self, path: &Path, max_bytes: u64) -> io::Result<Vec<u8>> {
        let size = fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("font file is {size} bytes, limit is {max_bytes}"),
            ));
        }
        tracing::trace!(path = %path.display(), size, "Loading font from filesystem");
        fs::read(path)
    }

    /// Read the config file
    ///
    /// If an external path is configured and exists, uses that.
    /// Otherwise falls back to embedded config.
    pub fn read_config(&self) -> io::Result<Cow<'static, [u8]>> {
        if let Some(ref path) = self.config_file {
            if path.exists() {
                tracing::trace!(path = %path.display(), "Loading config from filesystem");
                return Ok(Cow::Owned(fs::read(path)?));
            }
            tracing::warn!(path = %path.display(), "Config file not found, using embedded default");
        }

        EmbeddedConfig::get("config.yaml")
            .map(|f| {
                tracing::trace!("Loading config from embedded assets");
                f.data
            })
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Embedded config.yaml not found"))
    }

    /// Read config as a UTF-8 string
    pub fn read_config_string(&self) -> io::Result<String> {
        let bytes = self.read_config()?;
        String::from_utf8(bytes.into_owned()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// The embedded default config, for display
    pub fn embedded_config() -> Option<String> {
        EmbeddedConfig::get("config.yaml").map(|f| String::from_utf8_lossy(&f.data).into_owned())
    }
}
