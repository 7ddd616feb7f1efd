/// Settings discovery.
///
/// The preprocessor consults every stripping settings asset in scope. How
/// they are found is up to the provider: `AssetSettingsProvider` scans the
/// asset database by type, `StaticSettingsProvider` serves a fixed list.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::host::{load_collection, lock, AssetDatabase, SharedAssetDatabase, SETTINGS_ASSET_TYPE};
use crate::strip::settings::{StrippingSettings, StrippingSettingsDesc};
use crate::variant::VariantCollection;

const SOURCE: &str = "stripping::Settings";

/// Source of the stripping settings in scope
pub trait SettingsProvider: Send + Sync {
    /// Every settings asset to consult, in discovery order
    fn stripping_settings(&self) -> Result<Vec<Arc<StrippingSettings>>>;
}

// ===== STATIC =====

/// Provider over an explicit list of settings
#[derive(Default)]
pub struct StaticSettingsProvider {
    settings: Vec<Arc<StrippingSettings>>,
}

impl StaticSettingsProvider {
    pub fn new(settings: Vec<Arc<StrippingSettings>>) -> Self {
        Self { settings }
    }

    pub fn with_settings(mut self, settings: StrippingSettings) -> Self {
        self.settings.push(Arc::new(settings));
        self
    }
}

impl SettingsProvider for StaticSettingsProvider {
    fn stripping_settings(&self) -> Result<Vec<Arc<StrippingSettings>>> {
        Ok(self.settings.clone())
    }
}

// ===== ASSET DATABASE =====

/// Provider discovering settings documents in the asset database
///
/// Each call rescans the project, so settings and collections edited between
/// compilation batches are picked up. Collections referenced by several
/// passes are loaded once per call. A settings asset that cannot be read is
/// logged and skipped; its passes then strip nothing.
pub struct AssetSettingsProvider {
    assets: SharedAssetDatabase,
}

impl AssetSettingsProvider {
    pub fn new(assets: SharedAssetDatabase) -> Self {
        Self { assets }
    }

    fn load_settings(
        assets: &dyn AssetDatabase,
        path: &Path,
        cache: &mut FxHashMap<PathBuf, Arc<VariantCollection>>,
    ) -> Result<StrippingSettings> {
        let document = assets.load_document(path)?;
        let mut desc: StrippingSettingsDesc = serde_json::from_value(document)
            .map_err(|e| Error::InvalidSettings(format!("'{}': {}", path.display(), e)))?;

        if desc.name.is_empty() {
            desc.name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string();
        }

        StrippingSettings::from_desc(desc, &mut |collection_path: &Path| {
            if let Some(collection) = cache.get(collection_path) {
                return Ok(collection.clone());
            }
            let collection = Arc::new(load_collection(assets, collection_path)?);
            cache.insert(collection_path.to_path_buf(), collection.clone());
            Ok(collection)
        })
    }
}

impl SettingsProvider for AssetSettingsProvider {
    fn stripping_settings(&self) -> Result<Vec<Arc<StrippingSettings>>> {
        let assets = lock(&self.assets, "AssetDatabase")?;
        let paths = assets.find_assets_of_type(SETTINGS_ASSET_TYPE)?;

        let mut cache = FxHashMap::default();
        let mut settings = Vec::with_capacity(paths.len());
        for path in &paths {
            match Self::load_settings(&*assets, path, &mut cache) {
                Ok(loaded) => settings.push(Arc::new(loaded)),
                Err(e) => {
                    crate::strip_error!(
                        SOURCE,
                        "Skipping stripping settings '{}': {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        crate::strip_debug!(
            SOURCE,
            "Discovered {} stripping settings asset(s), {} collection(s)",
            settings.len(),
            cache.len()
        );
        Ok(settings)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
