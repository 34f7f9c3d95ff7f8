//! Logical font names resolved to loaded font faces.

use crate::assets::AssetLoader;
use crate::models::FontConfig;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Identity of the font a render used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFont {
    /// Logical name, e.g. `antique`
    pub name: String,
    /// Font file, when one was loaded
    pub path: Option<PathBuf>,
    /// Family name read from the font file
    pub family: Option<String>,
}

pub struct FontCatalog {
    faces: BTreeMap<String, ResolvedFont>,
    default_name: String,
}

impl FontCatalog {
    /// Load every configured face into `db`, then the system fonts.
    ///
    /// Missing or oversized files are logged and left out of the catalog.
    pub fn load(config: &FontConfig, loader: &AssetLoader, db: &mut fontdb::Database) -> Self {
        let mut faces = BTreeMap::new();

        for (name, file) in &config.faces {
            let path = loader.font_path(file);
            if !path.exists() {
                tracing::error!(font = %name, path = %path.display(), "Font file not found");
                continue;
            }

            let data = match loader.read_font(&path, config.max_font_bytes) {
                Ok(data) => data,
                Err(e) => {
                    tracing::error!(font = %name, path = %path.display(), error = %e, "Skipping font file");
                    continue;
                }
            };

            let ids = db.load_font_source(fontdb::Source::Binary(Arc::new(data)));
            let family = ids
                .first()
                .and_then(|id| db.face(*id))
                .and_then(|face| face.families.first())
                .map(|(family, _)| family.clone());
            if family.is_none() {
                tracing::error!(font = %name, path = %path.display(), "Font file contains no usable face");
                continue;
            }

            tracing::info!(font = %name, family = ?family, "Preloaded font");
            faces.insert(
                name.clone(),
                ResolvedFont {
                    name: name.clone(),
                    path: Some(path),
                    family,
                },
            );
        }

        db.load_system_fonts();
        tracing::info!(
            loaded = faces.len(),
            configured = config.faces.len(),
            total_faces = db.len(),
            "Font catalog ready"
        );

        Self {
            faces,
            default_name: config.default.clone(),
        }
    }

    /// A catalog with no loaded faces; every name resolves to `default_name`.
    pub fn empty(default_name: impl Into<String>) -> Self {
        Self {
            faces: BTreeMap::new(),
            default_name: default_name.into(),
        }
    }

    pub fn with_face(mut self, font: ResolvedFont) -> Self {
        self.faces.insert(font.name.clone(), font);
        self
    }

    /// Resolve a requested logical name, falling back to the default.
    pub fn resolve(&self, requested: Option<&str>) -> ResolvedFont {
        if let Some(name) = requested {
            let key = name.trim().to_lowercase();
            if let Some(font) = self.faces.get(&key) {
                return font.clone();
            }
            if key != self.default_name {
                tracing::error!(requested = %name, fallback = %self.default_name, "Unknown or unavailable font, using default");
            }
        }

        self.faces
            .get(&self.default_name)
            .cloned()
            .unwrap_or_else(|| ResolvedFont {
                name: self.default_name.clone(),
                path: None,
                family: None,
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.faces.keys().map(String::as_str)
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }
}
